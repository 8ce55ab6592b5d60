use crate::config::Config;
use crate::model::{validate_due_date, Column, Task, TaskDraft, TaskId};
use crate::projector::{
    calendar_view, kanban_view, list_view, stats, today, CalendarDay, CalendarMonth, ListFilter,
};
use crate::storage::{locate_slot, project_slot_location, FileSlot, Slot, SlotLocation};
use crate::store::{LoadOrigin, TaskStore};
use crate::ui;
use anyhow::{anyhow, Context, Result};
use chrono::Datelike;
use std::env;
use std::path::PathBuf;
use tracing::info;

/// Options shared by every command.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub config: Config,
    pub store_override: Option<PathBuf>,
}

pub fn init(settings: &Settings) -> Result<()> {
    let cwd = env::current_dir()?;
    let location = match &settings.store_override {
        Some(path) => SlotLocation::explicit(path),
        None => project_slot_location(&cwd)?,
    };
    let slot = location.slot();
    if slot.read()?.is_some() {
        println!("Task file already exists at {}", location.path.display());
        return Ok(());
    }
    let mut store = TaskStore::seeded(slot);
    store.save()?;
    info!(path = %location.path.display(), "initialized task file");
    println!(
        "Initialized task file at {} with {} sample tasks",
        location.path.display(),
        store.len()
    );
    Ok(())
}

pub fn list(
    settings: &Settings,
    status: Option<String>,
    priority: Option<String>,
    search: Option<String>,
) -> Result<()> {
    let (store, location) = open_store(settings)?;
    let filter = ListFilter {
        status: status.as_deref().map(str::parse).transpose()?,
        priority: priority.as_deref().map(str::parse).transpose()?,
        query: search.unwrap_or_default(),
    };
    print_header(&store, &location);
    let tasks = list_view(store.tasks(), &filter);
    if tasks.is_empty() {
        println!("  (no tasks)");
    }
    for task in tasks {
        print_task(task);
    }
    Ok(())
}

pub fn add(
    settings: &Settings,
    title: String,
    assignee: String,
    description: Option<String>,
    priority: String,
    due: Option<String>,
    status: String,
) -> Result<()> {
    let (mut store, _) = open_store(settings)?;
    let draft = TaskDraft {
        title,
        description: description.unwrap_or_default(),
        assignee,
        priority: priority.parse()?,
        due_date: validate_due_date(due.as_deref().unwrap_or_default())?,
        status: status.parse()?,
    };
    draft.validate()?;
    let id = store.create(draft).context("adding task")?;
    let column = store.get(id).map(Task::column).unwrap_or(Column::Todo);
    println!("Added task {} to {}", id, column);
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn edit(
    settings: &Settings,
    id: TaskId,
    title: Option<String>,
    description: Option<String>,
    assignee: Option<String>,
    priority: Option<String>,
    due: Option<String>,
    clear_due: bool,
    status: Option<String>,
) -> Result<()> {
    let (mut store, _) = open_store(settings)?;
    let task = store
        .get(id)
        .ok_or_else(|| anyhow!("task {} not found", id))?;
    let mut draft = TaskDraft::from_task(task);
    if let Some(t) = title {
        draft.title = t;
    }
    if let Some(d) = description {
        draft.description = d;
    }
    if let Some(a) = assignee {
        draft.assignee = a;
    }
    if let Some(p) = priority {
        draft.priority = p.parse()?;
    }
    if clear_due {
        draft.due_date.clear();
    }
    if let Some(d) = due {
        draft.due_date = validate_due_date(&d)?;
    }
    if let Some(s) = status {
        draft.status = s.parse()?;
    }
    draft.validate()?;
    store
        .update(id, draft)
        .with_context(|| format!("updating task {}", id))?;
    println!("Updated task {}", id);
    Ok(())
}

pub fn toggle(settings: &Settings, id: TaskId) -> Result<()> {
    let (mut store, _) = open_store(settings)?;
    let status = store
        .toggle_complete(id)
        .with_context(|| format!("toggling task {}", id))?;
    println!("Task {} is now {}", id, status);
    Ok(())
}

pub fn move_task(settings: &Settings, id: TaskId, column: String) -> Result<()> {
    let (mut store, _) = open_store(settings)?;
    let column: Column = column.parse()?;
    let moved = store
        .move_to_column(id, column)
        .with_context(|| format!("moving task {} to {}", id, column))?;
    if moved {
        println!("Moved task {} to {} ({})", id, column, column.status());
    } else {
        println!("Task {} is already in {}", id, column);
    }
    Ok(())
}

pub fn delete(settings: &Settings, id: TaskId) -> Result<()> {
    let (mut store, _) = open_store(settings)?;
    if store.delete(id).with_context(|| format!("deleting task {}", id))? {
        println!("Deleted task {}", id);
    } else {
        println!("No task with id {}", id);
    }
    Ok(())
}

pub fn board(settings: &Settings) -> Result<()> {
    let (store, location) = open_store(settings)?;
    print_header(&store, &location);
    for column in kanban_view(store.tasks()).columns {
        println!("{} [{}] ({})", column.column.title(), column.column, column.count());
        if column.tasks.is_empty() {
            println!("  (empty)");
        }
        for task in column.tasks {
            print_task(task);
        }
        println!();
    }
    Ok(())
}

pub fn calendar(settings: &Settings, month: Option<String>) -> Result<()> {
    let (store, _) = open_store(settings)?;
    let month = match month {
        Some(raw) => raw.parse::<CalendarMonth>().map_err(|e| anyhow!(e))?,
        None => CalendarMonth::containing(today()),
    };
    let grid = calendar_view(store.tasks(), month);
    println!("{:^35}", grid.month.title());
    println!(" Mo   Tu   We   Th   Fr   Sa   Su");
    for week in &grid.weeks {
        let row = week
            .iter()
            .map(|cell| day_cell(cell.as_ref()))
            .collect::<String>();
        println!("{}", row.trim_end());
    }
    println!();
    for day in grid.days().filter(|d| !d.tasks.is_empty()) {
        let chips = day
            .visible()
            .iter()
            .map(|t| format!("[{}] {}", t.assignee.initials, t.title))
            .collect::<Vec<_>>()
            .join("  |  ");
        if day.overflow() > 0 {
            println!("{}  {}  +{} more", day.key, chips, day.overflow());
        } else {
            println!("{}  {}", day.key, chips);
        }
    }
    Ok(())
}

pub fn show_stats(settings: &Settings) -> Result<()> {
    let (store, location) = open_store(settings)?;
    print_header(&store, &location);
    let s = stats(store.tasks(), today());
    println!("  total        {}", s.total);
    println!("  pending      {}", s.pending);
    println!("  in progress  {}", s.in_progress);
    println!("  completed    {}", s.completed);
    println!("  overdue      {}", s.overdue);
    Ok(())
}

pub fn tui(settings: &Settings) -> Result<()> {
    let (store, location) = open_store(settings)?;
    ui::run(store, location, settings.config.default_view)
}

pub fn resolve_location(settings: &Settings) -> Result<SlotLocation> {
    if let Some(path) = &settings.store_override {
        return Ok(SlotLocation::explicit(path));
    }
    if let Some(path) = &settings.config.storage_path {
        return Ok(SlotLocation::explicit(path));
    }
    let cwd = env::current_dir()?;
    locate_slot(&cwd)
}

fn open_store(settings: &Settings) -> Result<(TaskStore<FileSlot>, SlotLocation)> {
    let location = resolve_location(settings)?;
    let store = TaskStore::load(location.slot());
    match store.origin() {
        LoadOrigin::SeededCorrupt => eprintln!(
            "warning: could not read {}; showing sample tasks",
            location.path.display()
        ),
        LoadOrigin::Salvaged { skipped } => eprintln!(
            "warning: skipped {} unreadable task(s) in {}; they will be dropped on the next change",
            skipped,
            location.path.display()
        ),
        LoadOrigin::Stored | LoadOrigin::SeededEmpty => {}
    }
    Ok((store, location))
}

/// Five-column grid cell: day number, then `*N` when tasks are due.
/// Counts above nine show as `*+`.
fn day_cell(day: Option<&CalendarDay<'_>>) -> String {
    match day {
        Some(day) => {
            let marker = match day.tasks.len() {
                0 => "  ".to_string(),
                n @ 1..=9 => format!("*{}", n),
                _ => "*+".to_string(),
            };
            format!("{:>2}{} ", day.date.day(), marker)
        }
        None => "     ".to_string(),
    }
}

fn print_header(store: &TaskStore<FileSlot>, location: &SlotLocation) {
    println!(
        "Tasks: {} ({}, {})",
        store.len(),
        location.scope.label(),
        location.path.display()
    );
}

fn print_task(task: &Task) {
    let check = if task.completed() { "x" } else { " " };
    println!(
        "  [{}] {}: {}  ({}, {}, {})",
        check,
        task.id,
        task.title,
        task.assignee.name,
        task.priority,
        task.status
    );
    if !task.description.is_empty() {
        println!("      {}", task.description);
    }
    if !task.due_date.is_empty() {
        println!("      due: {}", task.due_date);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Assignee, Priority, Status};
    use chrono::NaiveDate;

    fn task(id: TaskId) -> Task {
        Task {
            id,
            title: format!("Task {}", id),
            description: String::new(),
            assignee: Assignee::from_name("Kim Lo"),
            priority: Priority::Medium,
            due_date: "2024-04-15".to_string(),
            status: Status::Todo,
        }
    }

    #[test]
    fn day_cells_stay_five_wide() {
        let tasks: Vec<Task> = (1..=12).map(task).collect();
        let date = NaiveDate::from_ymd_opt(2024, 4, 15).expect("date");
        let day = |n: usize| CalendarDay {
            date,
            key: "2024-04-15".to_string(),
            tasks: tasks.iter().take(n).collect(),
        };

        assert_eq!(day_cell(Some(&day(0))), "15   ");
        assert_eq!(day_cell(Some(&day(3))), "15*3 ");
        assert_eq!(day_cell(Some(&day(9))), "15*9 ");
        assert_eq!(day_cell(Some(&day(12))), "15*+ ");
        assert_eq!(day_cell(None), "     ");
    }
}
