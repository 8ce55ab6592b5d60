use crate::config::ViewKind;
use crate::drag::{DragController, DropOutcome};
use crate::form::{FieldValue, FormField, FormMode, TaskForm};
use crate::model::{Column, Priority, Status, Task, TaskId, DUE_DATE_FORMAT};
use crate::projector::{
    calendar_view, kanban_view, list_view, stats, today, CalendarDay, CalendarMonth, ListFilter,
};
use crate::storage::{FileSlot, Slot, SlotLocation};
use crate::store::{LoadOrigin, StoreError, TaskStore};
use anyhow::Result;
use chrono::{Datelike, Duration as ChronoDuration, NaiveDate};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::{Alignment, Color, Modifier, Rect, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Terminal;
use std::io::{stdout, Stdout};
use std::time::{Duration, Instant};
use tracing::{error, info};

/// Rows taken by one kanban card, borders included.
const CARD_HEIGHT: u16 = 5;

pub fn run(store: TaskStore<FileSlot>, location: SlotLocation, view: ViewKind) -> Result<()> {
    let mut terminal = setup_terminal()?;
    let mut app = App::new(store, location, view);
    info!(view = view.label(), "starting board");
    let result = app.event_loop(&mut terminal);
    teardown_terminal(&mut terminal)?;
    result
}

struct App<S: Slot> {
    store: TaskStore<S>,
    location: SlotLocation,
    view: ViewKind,
    mode: Mode,
    form: TaskForm,
    drag: DragController,
    list: ListViewState,
    calendar: CalendarState,
    kanban: KanbanState,
    last_save: Instant,
    status: String,
}

enum Mode {
    Normal,
    Form,
    Search(FieldValue),
    ConfirmDelete { id: TaskId },
}

struct ListViewState {
    selected: usize,
    offset: usize,
    filter: ListFilter,
}

struct CalendarState {
    month: CalendarMonth,
    cursor: NaiveDate,
    /// Which of the cursor day's tasks is selected.
    row: usize,
}

struct KanbanState {
    column: usize,
    row: usize,
    offsets: [usize; 3],
    /// Column areas from the last draw, used to hit-test the mouse.
    areas: [Rect; 3],
}

impl CalendarState {
    fn new(today: NaiveDate) -> Self {
        CalendarState {
            month: CalendarMonth::containing(today),
            cursor: today,
            row: 0,
        }
    }

    fn shift_days(&mut self, days: i64) {
        if let Some(date) = self.cursor.checked_add_signed(ChronoDuration::days(days)) {
            self.cursor = date;
            self.month = CalendarMonth::containing(date);
            self.row = 0;
        }
    }

    fn show_month(&mut self, month: CalendarMonth) {
        self.month = month;
        let day = self.cursor.day().min(month.days());
        self.cursor = NaiveDate::from_ymd_opt(month.year(), month.month(), day)
            .unwrap_or_else(|| month.first_day());
        self.row = 0;
    }
}

impl KanbanState {
    fn column_at(&self, x: u16, y: u16) -> Option<Column> {
        self.areas
            .iter()
            .position(|area| contains(area, x, y))
            .and_then(Column::from_index)
    }

    /// Card index under the pointer inside `column`, before bounds checks.
    fn row_at(&self, column: Column, y: u16) -> Option<usize> {
        let area = self.areas[column.index()];
        let top = area.y + 1;
        if y < top || y + 1 >= area.y + area.height {
            return None;
        }
        Some(self.offsets[column.index()] + ((y - top) / CARD_HEIGHT) as usize)
    }
}

impl<S: Slot> App<S> {
    fn new(store: TaskStore<S>, location: SlotLocation, view: ViewKind) -> Self {
        let status = match store.origin() {
            LoadOrigin::Salvaged { skipped } => format!(
                "Loaded {} tasks from {}, skipped {} unreadable",
                store.len(),
                location.path.display(),
                skipped
            ),
            LoadOrigin::SeededCorrupt => format!(
                "Could not read {}; showing sample tasks",
                location.path.display()
            ),
            LoadOrigin::Stored | LoadOrigin::SeededEmpty => {
                format!("Loaded {} tasks from {}", store.len(), location.path.display())
            }
        };
        App {
            store,
            location,
            view,
            mode: Mode::Normal,
            form: TaskForm::new(),
            drag: DragController::new(),
            list: ListViewState {
                selected: 0,
                offset: 0,
                filter: ListFilter::default(),
            },
            calendar: CalendarState::new(today()),
            kanban: KanbanState {
                column: 0,
                row: 0,
                offsets: [0; 3],
                areas: [Rect::default(); 3],
            },
            last_save: Instant::now(),
            status,
        }
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        loop {
            terminal.draw(|f| self.draw(f))?;
            if event::poll(Duration::from_millis(200))? {
                match event::read()? {
                    Event::Key(key) => {
                        if key.kind != KeyEventKind::Press {
                            continue;
                        }
                        if self.handle_key(key) {
                            break;
                        }
                    }
                    Event::Mouse(mouse) => self.handle_mouse(mouse),
                    _ => {}
                }
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) -> bool {
        match self.mode {
            Mode::Normal => return self.handle_normal_key(key),
            Mode::Form => self.handle_form_key(key),
            Mode::Search(_) => self.handle_search_key(key),
            Mode::ConfirmDelete { id } => self.handle_confirm_key(id, key),
        }
        false
    }

    fn handle_normal_key(&mut self, key: KeyEvent) -> bool {
        if self.drag.is_dragging() {
            self.handle_drag_key(key);
            return false;
        }
        match key.code {
            KeyCode::Char('q') => return true,
            KeyCode::Char('1') => self.set_view(ViewKind::List),
            KeyCode::Char('2') => self.set_view(ViewKind::Calendar),
            KeyCode::Char('3') => self.set_view(ViewKind::Kanban),
            KeyCode::Char('n') => {
                self.form.open_new();
                self.mode = Mode::Form;
                self.status =
                    "New task (Tab/Shift-Tab move, ←→ pick, Ctrl+Enter save, Esc cancel)".into();
            }
            KeyCode::Char('e') => match self.current_task().cloned() {
                Some(task) => {
                    self.form.open_edit(&task);
                    self.mode = Mode::Form;
                    self.status = format!("Editing {}", task.title);
                }
                None => self.status = "No task selected to edit".into(),
            },
            KeyCode::Char('d') => match self.current_task().map(|t| t.id) {
                Some(id) => {
                    self.mode = Mode::ConfirmDelete { id };
                    self.status = "Delete task? (y to confirm, n/Esc to cancel)".into();
                }
                None => self.status = "No task selected to delete".into(),
            },
            KeyCode::Char('x') => self.toggle_current(),
            _ => match self.view {
                ViewKind::List => self.handle_list_key(key),
                ViewKind::Calendar => self.handle_calendar_key(key),
                ViewKind::Kanban => self.handle_kanban_key(key),
            },
        }
        false
    }

    fn handle_list_key(&mut self, key: KeyEvent) {
        let len = self.visible_list_len();
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.list.selected = self.list.selected.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.list.selected + 1 < len {
                    self.list.selected += 1;
                }
            }
            KeyCode::Char(' ') => self.toggle_current(),
            KeyCode::Char('/') => {
                self.mode = Mode::Search(FieldValue::new(&self.list.filter.query));
                self.status = "Search (Enter apply, Esc clear)".into();
            }
            KeyCode::Char('f') => {
                self.list.filter.status = match self.list.filter.status {
                    None => Some(Status::Todo),
                    Some(Status::Todo) => Some(Status::InProgress),
                    Some(Status::InProgress) => Some(Status::Done),
                    Some(Status::Done) => None,
                };
                self.list.selected = 0;
                self.status = match self.list.filter.status {
                    Some(s) => format!("Showing {} tasks", s),
                    None => "Showing all tasks".into(),
                };
            }
            KeyCode::Char('p') => {
                self.list.filter.priority = match self.list.filter.priority {
                    None => Some(Priority::High),
                    Some(Priority::High) => Some(Priority::Medium),
                    Some(Priority::Medium) => Some(Priority::Low),
                    Some(Priority::Low) => None,
                };
                self.list.selected = 0;
            }
            _ => {}
        }
    }

    fn handle_calendar_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Left | KeyCode::Char('h') => self.calendar.shift_days(-1),
            KeyCode::Right | KeyCode::Char('l') => self.calendar.shift_days(1),
            KeyCode::Up | KeyCode::Char('k') => self.calendar.shift_days(-7),
            KeyCode::Down | KeyCode::Char('j') => self.calendar.shift_days(7),
            KeyCode::Char('[') => self.calendar.show_month(self.calendar.month.prev()),
            KeyCode::Char(']') => self.calendar.show_month(self.calendar.month.next()),
            KeyCode::Char('t') => self.calendar = CalendarState::new(today()),
            KeyCode::Tab | KeyCode::BackTab => {
                let len = self.calendar_tasks().len();
                if len > 0 {
                    self.calendar.row = if key.code == KeyCode::Tab {
                        (self.calendar.row + 1) % len
                    } else {
                        (self.calendar.row + len - 1) % len
                    };
                }
            }
            _ => {}
        }
    }

    fn handle_kanban_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Left | KeyCode::Char('h') => {
                if self.kanban.column > 0 {
                    self.kanban.column -= 1;
                    self.kanban.row = 0;
                }
            }
            KeyCode::Right | KeyCode::Char('l') => {
                if self.kanban.column + 1 < Column::ALL.len() {
                    self.kanban.column += 1;
                    self.kanban.row = 0;
                }
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.kanban.row = self.kanban.row.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.kanban.row + 1 < self.kanban_column_len(self.kanban.column) {
                    self.kanban.row += 1;
                }
            }
            KeyCode::Char('g') | KeyCode::Char(' ') => {
                if let Some((id, column)) = self.current_task().map(|t| (t.id, t.column())) {
                    self.drag.drag_start(id, column);
                    self.status = "Dragging (←→ choose column, g/Enter drop, Esc cancel)".into();
                }
            }
            _ => {}
        }
    }

    fn handle_drag_key(&mut self, key: KeyEvent) {
        let hover = self
            .drag
            .hover()
            .unwrap_or_else(|| selected_column(self.kanban.column));
        match key.code {
            KeyCode::Left | KeyCode::Char('h') => {
                let target = Column::from_index(hover.index().saturating_sub(1)).unwrap_or(hover);
                self.drag.drag_over(target);
            }
            KeyCode::Right | KeyCode::Char('l') => {
                let target = Column::from_index(hover.index() + 1).unwrap_or(hover);
                self.drag.drag_over(target);
            }
            KeyCode::Char('g') | KeyCode::Char(' ') | KeyCode::Enter => self.drop_on(hover),
            KeyCode::Esc => {
                self.drag.drag_end();
                self.status = "Drag canceled".into();
            }
            _ => {}
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        if self.view != ViewKind::Kanban || !matches!(self.mode, Mode::Normal) {
            return;
        }
        let (x, y) = (mouse.column, mouse.row);
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                let Some(column) = self.kanban.column_at(x, y) else {
                    return;
                };
                let Some(row) = self.kanban.row_at(column, y) else {
                    return;
                };
                if row >= self.kanban_column_len(column.index()) {
                    return;
                }
                self.kanban.column = column.index();
                self.kanban.row = row;
                if let Some(id) = self.current_task().map(|t| t.id) {
                    self.drag.drag_start(id, column);
                }
            }
            MouseEventKind::Drag(MouseButton::Left) => match self.kanban.column_at(x, y) {
                Some(column) => {
                    self.drag.drag_over(column);
                }
                None => self.drag.drag_leave(),
            },
            MouseEventKind::Up(MouseButton::Left) => {
                if !self.drag.is_dragging() {
                    return;
                }
                match self.kanban.column_at(x, y) {
                    Some(column) => self.drop_on(column),
                    None => self.drag.drag_end(),
                }
            }
            _ => {}
        }
    }

    fn drop_on(&mut self, column: Column) {
        match self.drag.drop(column, &mut self.store) {
            Ok(DropOutcome::Moved { task, to }) => {
                self.saved(format!("Moved to {} ({})", to.title(), to.status()));
                self.kanban.column = to.index();
                self.kanban.row = self
                    .kanban_tasks(to.index())
                    .iter()
                    .position(|t| t.id == task)
                    .unwrap_or(0);
            }
            Ok(DropOutcome::Unchanged) | Ok(DropOutcome::NotDragging) => {
                self.status = "Dropped in place".into();
            }
            Err(err) => self.store_failed(err),
        }
        self.ensure_bounds();
    }

    fn handle_form_key(&mut self, key: KeyEvent) {
        let form = &mut self.form;
        match key.code {
            KeyCode::Esc => {
                form.close();
                self.mode = Mode::Normal;
                self.status = "Canceled".into();
            }
            KeyCode::Tab => form.next_field(),
            KeyCode::BackTab => form.prev_field(),
            KeyCode::Left => match form.active_text_mut() {
                Some(field) => field.move_left(),
                None => form.cycle_choice(false),
            },
            KeyCode::Right => match form.active_text_mut() {
                Some(field) => field.move_right(),
                None => form.cycle_choice(true),
            },
            KeyCode::Up => {
                if let Some(field) = form.active_text_mut() {
                    field.move_up();
                }
            }
            KeyCode::Down => {
                if let Some(field) = form.active_text_mut() {
                    field.move_down();
                }
            }
            KeyCode::Enter => {
                let control = key.modifiers.contains(KeyModifiers::CONTROL);
                if form.field == FormField::Description && !control {
                    if let Some(field) = form.active_text_mut() {
                        field.insert_char('\n');
                    }
                } else {
                    self.submit_form();
                }
            }
            KeyCode::Backspace => {
                if let Some(field) = form.active_text_mut() {
                    field.backspace();
                }
            }
            KeyCode::Char(c) => {
                if key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
                {
                    return;
                }
                match form.active_text_mut() {
                    Some(field) => field.insert_char(c),
                    None if c == ' ' => form.cycle_choice(true),
                    None => {}
                }
            }
            _ => {}
        }
    }

    fn submit_form(&mut self) {
        if !self.form.can_submit() {
            self.status = "Title and assignee are required".into();
            return;
        }
        let mode = self.form.mode();
        match self.form.submit(&mut self.store) {
            Ok(Some(id)) => {
                let verb = match mode {
                    Some(FormMode::Edit(_)) => "Updated",
                    _ => "Created",
                };
                self.saved(format!("{} task {}", verb, id));
            }
            Ok(None) => {}
            Err(StoreError::Board(err)) => {
                self.status = format!("Could not save: {}", err);
                return;
            }
            Err(err) => self.store_failed(err),
        }
        if !self.form.is_open() {
            self.mode = Mode::Normal;
        }
        self.ensure_bounds();
    }

    fn handle_search_key(&mut self, key: KeyEvent) {
        let Mode::Search(field) = &mut self.mode else {
            return;
        };
        match key.code {
            KeyCode::Enter => {
                self.list.filter.query = field.value.trim().to_string();
                self.list.selected = 0;
                self.status = format!("{} matching tasks", self.visible_list_len());
                self.mode = Mode::Normal;
            }
            KeyCode::Esc => {
                self.list.filter.query.clear();
                self.status = "Search cleared".into();
                self.mode = Mode::Normal;
            }
            KeyCode::Left => field.move_left(),
            KeyCode::Right => field.move_right(),
            KeyCode::Backspace => field.backspace(),
            KeyCode::Char(c) => field.insert_char(c),
            _ => {}
        }
    }

    fn handle_confirm_key(&mut self, id: TaskId, key: KeyEvent) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Enter => {
                match self.store.delete(id) {
                    Ok(true) => self.saved(format!("Deleted task {}", id)),
                    Ok(false) => self.status = format!("Task {} was already gone", id),
                    Err(err) => self.store_failed(err),
                }
                self.mode = Mode::Normal;
                self.ensure_bounds();
            }
            KeyCode::Char('n') | KeyCode::Esc => {
                self.status = "Delete canceled".into();
                self.mode = Mode::Normal;
            }
            _ => {}
        }
    }

    fn toggle_current(&mut self) {
        let Some(id) = self.current_task().map(|t| t.id) else {
            self.status = "No task selected".into();
            return;
        };
        match self.store.toggle_complete(id) {
            Ok(status) => self.saved(format!("Marked {}", status)),
            Err(err) => self.store_failed(err),
        }
        self.ensure_bounds();
    }

    fn set_view(&mut self, view: ViewKind) {
        if self.view != view {
            self.view = view;
            self.status = format!("Switched to {} view", view.label());
        }
        self.ensure_bounds();
    }

    fn saved(&mut self, message: String) {
        self.last_save = Instant::now();
        self.status = message;
    }

    /// A rejected command or a write that did not reach the slot. The board
    /// keeps running on the in-memory tasks either way.
    fn store_failed(&mut self, err: StoreError) {
        match &err {
            StoreError::Board(_) => {}
            _ => error!(error = %err, "task change not persisted"),
        }
        self.status = match err {
            StoreError::Board(inner) => format!("Failed: {}", inner),
            other => format!("Not saved: {}", other),
        };
    }

    fn visible_list(&self) -> Vec<&Task> {
        list_view(self.store.tasks(), &self.list.filter)
    }

    fn visible_list_len(&self) -> usize {
        self.visible_list().len()
    }

    fn kanban_tasks(&self, column_idx: usize) -> Vec<&Task> {
        let board = kanban_view(self.store.tasks());
        board.columns[column_idx.min(2)].tasks.clone()
    }

    fn kanban_column_len(&self, column_idx: usize) -> usize {
        self.kanban_tasks(column_idx).len()
    }

    fn current_task(&self) -> Option<&Task> {
        match self.view {
            ViewKind::List => self.visible_list().get(self.list.selected).copied(),
            ViewKind::Kanban => self
                .kanban_tasks(self.kanban.column)
                .get(self.kanban.row)
                .copied(),
            ViewKind::Calendar => self.calendar_tasks().get(self.calendar.row).copied(),
        }
    }

    /// Tasks due on the calendar cursor date, in store order.
    fn calendar_tasks(&self) -> Vec<&Task> {
        let key = self.calendar.cursor.format(DUE_DATE_FORMAT).to_string();
        self.store
            .tasks()
            .iter()
            .filter(|t| t.due_date == key)
            .collect()
    }

    fn ensure_bounds(&mut self) {
        let list_len = self.visible_list_len();
        self.list.selected = self.list.selected.min(list_len.saturating_sub(1));
        let column_len = self.kanban_column_len(self.kanban.column);
        self.kanban.row = self.kanban.row.min(column_len.saturating_sub(1));
        let day_len = self.calendar_tasks().len();
        self.calendar.row = self.calendar.row.min(day_len.saturating_sub(1));
    }

    fn draw(&mut self, f: &mut ratatui::Frame<'_>) {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(8),
                Constraint::Length(4),
            ])
            .split(f.size());

        self.draw_header(f, layout[0]);
        match self.view {
            ViewKind::List => self.draw_list(f, layout[1]),
            ViewKind::Calendar => self.draw_calendar(f, layout[1]),
            ViewKind::Kanban => self.draw_kanban(f, layout[1]),
        }
        self.draw_footer(f, layout[2]);

        match &self.mode {
            Mode::Form => self.draw_form(f),
            Mode::ConfirmDelete { id } => self.draw_confirm(f, *id),
            Mode::Search(field) => self.draw_search(f, field),
            Mode::Normal => {}
        }
    }

    fn draw_header(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let counts = stats(self.store.tasks(), today());
        let title = Line::from(vec![
            Span::styled(
                "clienthub ",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                self.location.scope.label(),
                Style::default().fg(Color::Green),
            ),
            Span::raw("  •  "),
            Span::styled(
                self.store.slot().describe(),
                Style::default().fg(Color::DarkGray),
            ),
            Span::raw("  •  "),
            Span::styled(
                format!("saved {}", format_elapsed(self.last_save)),
                Style::default().fg(Color::Gray),
            ),
            Span::raw("  •  "),
            Span::styled(
                format!(
                    "{} tasks, {} done, {} overdue",
                    counts.total, counts.completed, counts.overdue
                ),
                Style::default().fg(Color::LightYellow),
            ),
            Span::raw("  •  "),
            Span::styled(
                format!("view {}", self.view.label().to_lowercase()),
                Style::default().fg(Color::Magenta),
            ),
        ]);
        let block = Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(Color::DarkGray));
        let paragraph = Paragraph::new(title)
            .alignment(Alignment::Center)
            .block(block);
        f.render_widget(paragraph, area);
    }

    fn draw_list(&mut self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let tasks = list_view(self.store.tasks(), &self.list.filter);
        let viewport = area.height.saturating_sub(2) as usize;
        let selected = self.list.selected.min(tasks.len().saturating_sub(1));
        let offset = adjust_offset(selected, self.list.offset, viewport, 1, tasks.len());
        let mut state = ListState::default();
        *state.offset_mut() = offset;
        if !tasks.is_empty() {
            state.select(Some(selected));
        }

        let items = if tasks.is_empty() {
            vec![ListItem::new("No tasks")]
        } else {
            tasks.iter().map(|task| list_item(task)).collect()
        };
        let mut title = format!("Tasks ({})", tasks.len());
        if !self.list.filter.is_empty() {
            title.push_str(&filter_summary(&self.list.filter));
        }
        let block = Block::default()
            .title(Span::styled(
                title,
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));
        let list = List::new(items).block(block).highlight_style(
            Style::default()
                .bg(Color::LightCyan)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        );
        f.render_stateful_widget(list, area, &mut state);
        self.list.offset = offset;
    }

    fn draw_calendar(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let grid = calendar_view(self.store.tasks(), self.calendar.month);
        let outer = Block::default()
            .title(Span::styled(
                grid.month.title(),
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray));
        let inner = outer.inner(area);
        f.render_widget(outer, area);

        let mut row_constraints = vec![Constraint::Length(1)];
        row_constraints.extend(
            grid.weeks
                .iter()
                .map(|_| Constraint::Ratio(1, grid.weeks.len().max(1) as u32)),
        );
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints(row_constraints)
            .split(inner);
        let day_columns = || {
            Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Ratio(1, 7); 7])
        };

        let headings = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];
        for (cell, heading) in day_columns().split(rows[0]).iter().zip(headings) {
            let label = Paragraph::new(heading)
                .alignment(Alignment::Center)
                .style(Style::default().fg(Color::Gray));
            f.render_widget(label, *cell);
        }

        let today = today();
        for (week_idx, week) in grid.weeks.iter().enumerate() {
            let cells = day_columns().split(rows[week_idx + 1]);
            for (cell_area, day) in cells.iter().zip(week.iter()) {
                if let Some(day) = day {
                    let selected = (day.date == self.calendar.cursor).then_some(self.calendar.row);
                    f.render_widget(calendar_cell(day, selected, day.date == today), *cell_area);
                }
            }
        }
    }

    fn draw_kanban(&mut self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Ratio(1, 3); 3])
            .split(area);
        let board = kanban_view(self.store.tasks());
        let dragged = self.drag.dragged();
        let hover = self.drag.hover();

        for (idx, column) in board.columns.iter().enumerate() {
            self.kanban.areas[idx] = chunks[idx];
            let accent = color_for_column(column.column);
            let card_width = chunks[idx].width.saturating_sub(2);
            let items = column
                .tasks
                .iter()
                .enumerate()
                .map(|(row, task)| {
                    card_item(
                        task,
                        card_width,
                        idx == self.kanban.column && row == self.kanban.row,
                        dragged == Some(task.id),
                    )
                })
                .collect::<Vec<_>>();

            let viewport = (chunks[idx].height.saturating_sub(2) / CARD_HEIGHT) as usize;
            let mut state = ListState::default();
            let mut offset = self.kanban.offsets[idx];
            if idx == self.kanban.column {
                offset = adjust_offset(self.kanban.row, offset, viewport, 0, items.len());
                state.select(Some(self.kanban.row));
            } else {
                offset = offset.min(items.len().saturating_sub(1));
            }
            *state.offset_mut() = offset;
            self.kanban.offsets[idx] = offset;

            let drop_target = hover == Some(column.column);
            let title = format!("{} ({})", column.column.title(), column.count());
            let border = if drop_target {
                Style::default()
                    .fg(Color::LightYellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(accent)
            };
            let block = Block::default()
                .title(Span::styled(
                    title,
                    Style::default()
                        .fg(accent)
                        .add_modifier(if idx == self.kanban.column {
                            Modifier::BOLD | Modifier::UNDERLINED
                        } else {
                            Modifier::BOLD
                        }),
                ))
                .borders(Borders::ALL)
                .border_style(border)
                .style(Style::default().bg(Color::Rgb(16, 18, 24)));
            let list = List::new(items).block(block);
            f.render_stateful_widget(list, chunks[idx], &mut state);
        }
    }

    fn draw_footer(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(2), Constraint::Length(2)])
            .split(area);

        let help_bar = Paragraph::new(self.footer_help_line())
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::TOP)
                    .border_style(Style::default().fg(Color::DarkGray)),
            );
        f.render_widget(help_bar, rows[0]);

        let bottom = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(rows[1]);
        let status = Paragraph::new(self.status.clone())
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::TOP)
                    .border_style(Style::default().fg(Color::DarkGray)),
            );
        f.render_widget(status, bottom[0]);

        let detail = match self.current_task() {
            Some(task) => task_detail(task),
            None => Line::from("No task selected"),
        };
        let detail = Paragraph::new(detail).wrap(Wrap { trim: true }).block(
            Block::default()
                .borders(Borders::TOP)
                .border_style(Style::default().fg(Color::DarkGray))
                .title("Selected"),
        );
        f.render_widget(detail, bottom[1]);
    }

    fn footer_help_line(&self) -> Line<'static> {
        let key = |k: &'static str, color: Color| Span::styled(k, Style::default().fg(color));
        let mut spans = vec![
            key("1", Color::LightCyan),
            Span::raw(" list  "),
            key("2", Color::LightCyan),
            Span::raw(" calendar  "),
            key("3", Color::LightCyan),
            Span::raw(" kanban  "),
        ];
        match self.view {
            ViewKind::List => spans.extend([
                key("↑↓ / j k", Color::LightCyan),
                Span::raw(" move  "),
                key("x/space", Color::LightGreen),
                Span::raw(" done  "),
                key("/", Color::LightYellow),
                Span::raw(" search  "),
                key("f p", Color::LightYellow),
                Span::raw(" filter  "),
            ]),
            ViewKind::Calendar => spans.extend([
                key("←↑↓→", Color::LightCyan),
                Span::raw(" day  "),
                key("[ ]", Color::LightCyan),
                Span::raw(" month  "),
                key("t", Color::LightYellow),
                Span::raw(" today  "),
                key("Tab", Color::LightGreen),
                Span::raw(" task  "),
                key("x", Color::LightGreen),
                Span::raw(" done  "),
            ]),
            ViewKind::Kanban => spans.extend([
                key("←↑↓→ / h j k l", Color::LightCyan),
                Span::raw(" move  "),
                key("g / mouse", Color::LightGreen),
                Span::raw(" drag  "),
                key("x", Color::LightGreen),
                Span::raw(" done  "),
            ]),
        }
        spans.extend([
            key("n", Color::LightMagenta),
            Span::raw(" new  "),
            key("e", Color::LightYellow),
            Span::raw(" edit  "),
            key("d", Color::LightRed),
            Span::raw(" delete  "),
            key("q", Color::LightRed),
            Span::raw(" quit"),
        ]);
        Line::from(spans)
    }

    fn draw_form(&self, f: &mut ratatui::Frame<'_>) {
        let area = centered_rect(70, 70, f.size());
        let form = &self.form;
        let mut fields = Vec::new();
        fields.extend(field_lines("Title", &form.title, form.field == FormField::Title));
        fields.extend(field_lines(
            "Description",
            &form.description,
            form.field == FormField::Description,
        ));
        fields.extend(field_lines(
            "Assignee",
            &form.assignee,
            form.field == FormField::Assignee,
        ));
        fields.push(choice_line(
            "Priority",
            form.priority.label(),
            form.field == FormField::Priority,
        ));
        fields.extend(field_lines(
            "Due (YYYY-MM-DD)",
            &form.due_date,
            form.field == FormField::DueDate,
        ));
        fields.push(choice_line(
            "Status",
            form.status.label(),
            form.field == FormField::Status,
        ));
        fields.push(Line::from(""));
        let submit_style = if form.can_submit() {
            Style::default().fg(Color::LightGreen)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        fields.push(Line::from(vec![
            Span::styled("Ctrl+Enter save", submit_style),
            Span::styled(
                " • Esc cancel • Tab/Shift-Tab move • ←→ pick • Enter adds newline in Description",
                Style::default().fg(Color::Gray),
            ),
        ]));
        let title = match form.mode() {
            Some(FormMode::Edit(_)) => "Edit Task",
            _ => "New Task",
        };
        let dialog = Paragraph::new(fields)
            .block(
                Block::default()
                    .title(Span::styled(
                        title,
                        Style::default()
                            .fg(Color::Cyan)
                            .add_modifier(Modifier::BOLD),
                    ))
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Cyan)),
            )
            .wrap(Wrap { trim: true });
        f.render_widget(Clear, area);
        f.render_widget(dialog, area);
    }

    fn draw_search(&self, f: &mut ratatui::Frame<'_>, field: &FieldValue) {
        let area = centered_rect(50, 20, f.size());
        let dialog = Paragraph::new(field_lines("Search", field, true)).block(
            Block::default()
                .title("Search tasks")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::LightYellow)),
        );
        f.render_widget(Clear, area);
        f.render_widget(dialog, area);
    }

    fn draw_confirm(&self, f: &mut ratatui::Frame<'_>, id: TaskId) {
        let area = centered_rect(50, 30, f.size());
        let title = self
            .store
            .get(id)
            .map(|t| t.title.clone())
            .unwrap_or_else(|| id.to_string());
        let body = vec![
            Line::from(Span::styled(
                format!("Delete \"{}\"?", title),
                Style::default()
                    .fg(Color::LightRed)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from("Press y to confirm, n or Esc to cancel"),
        ];
        let dialog = Paragraph::new(body).alignment(Alignment::Center).block(
            Block::default()
                .title(Span::styled(
                    "Confirm Delete",
                    Style::default()
                        .fg(Color::LightRed)
                        .add_modifier(Modifier::BOLD),
                ))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::LightRed)),
        );
        f.render_widget(Clear, area);
        f.render_widget(dialog, area);
    }
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn teardown_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableMouseCapture,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;
    Ok(())
}

fn selected_column(idx: usize) -> Column {
    Column::from_index(idx).unwrap_or(Column::Todo)
}

fn contains(area: &Rect, x: u16, y: u16) -> bool {
    x >= area.x && x < area.x + area.width && y >= area.y && y < area.y + area.height
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

fn color_for_column(column: Column) -> Color {
    match column {
        Column::Todo => Color::Cyan,
        Column::InProgress => Color::LightMagenta,
        Column::Done => Color::LightGreen,
    }
}

fn color_for_priority(priority: Priority) -> Color {
    match priority {
        Priority::Low => Color::Gray,
        Priority::Medium => Color::LightYellow,
        Priority::High => Color::LightRed,
    }
}

/// First visible row that keeps `selected` at least `margin` rows away
/// from either edge of the viewport.
fn adjust_offset(
    selected: usize,
    offset: usize,
    viewport: usize,
    margin: usize,
    len: usize,
) -> usize {
    if viewport == 0 || len <= viewport {
        return 0;
    }
    let margin = margin.min((viewport - 1) / 2);
    let last = len - viewport;
    let lowest = (selected + margin + 1).saturating_sub(viewport).min(last);
    let highest = selected.saturating_sub(margin).min(last);
    offset.max(lowest).min(highest)
}

fn truncate_text(text: &str, max: usize) -> String {
    if max == 0 {
        return String::new();
    }
    if text.chars().count() <= max {
        return text.to_string();
    }
    let keep = max.saturating_sub(3);
    let mut out: String = text.chars().take(keep).collect();
    out.push_str(&".".repeat(max - keep));
    out
}

fn filter_summary(filter: &ListFilter) -> String {
    let mut parts = Vec::new();
    if let Some(status) = filter.status {
        parts.push(status.label().to_string());
    }
    if let Some(priority) = filter.priority {
        parts.push(format!("{} priority", priority));
    }
    if !filter.query.is_empty() {
        parts.push(format!("\"{}\"", filter.query));
    }
    format!(" • {}", parts.join(", "))
}

fn list_item(task: &Task) -> ListItem<'static> {
    let check = if task.completed() { "[x]" } else { "[ ]" };
    let mut title_style = Style::default().fg(Color::White).add_modifier(Modifier::BOLD);
    if task.completed() {
        title_style = title_style.add_modifier(Modifier::CROSSED_OUT | Modifier::DIM);
    }
    let mut spans = vec![
        Span::styled(format!("{} ", check), Style::default().fg(Color::LightGreen)),
        Span::styled(truncate_text(&task.title, 40), title_style),
        Span::raw("  "),
        Span::styled(
            format!("({})", task.assignee.initials),
            Style::default().fg(Color::LightBlue),
        ),
        Span::raw("  "),
        Span::styled(
            task.priority.label(),
            Style::default().fg(color_for_priority(task.priority)),
        ),
        Span::raw("  "),
        Span::styled(
            task.status.label(),
            Style::default().fg(color_for_column(task.column())),
        ),
    ];
    if !task.due_date.is_empty() {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            format!("due {}", task.due_date),
            Style::default().fg(Color::LightYellow),
        ));
    }
    ListItem::new(Line::from(spans)).style(Style::default().fg(Color::Gray))
}

/// `selected` carries the highlighted task row when this is the cursor day.
fn calendar_cell(
    day: &CalendarDay<'_>,
    selected: Option<usize>,
    is_today: bool,
) -> Paragraph<'static> {
    let mut lines = vec![Line::from(Span::styled(
        format!("{:>2}", day.date.day()),
        Style::default()
            .fg(if is_today {
                Color::LightCyan
            } else {
                Color::Gray
            })
            .add_modifier(Modifier::BOLD),
    ))];
    let visible = day.visible();
    for (row, task) in visible.iter().enumerate() {
        let mut style = Style::default().fg(color_for_priority(task.priority));
        if selected == Some(row) {
            style = style.add_modifier(Modifier::REVERSED);
        }
        lines.push(Line::from(Span::styled(
            format!("{} {}", task.assignee.initials, task.title),
            style,
        )));
    }
    if day.overflow() > 0 {
        let mut style = Style::default().fg(Color::DarkGray);
        if selected.is_some_and(|row| row >= visible.len()) {
            style = style.fg(Color::Gray).add_modifier(Modifier::REVERSED);
        }
        lines.push(Line::from(Span::styled(
            format!("+{} more", day.overflow()),
            style,
        )));
    }
    let border = if selected.is_some() {
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border),
    )
}

fn card_item(task: &Task, width: u16, selected: bool, dragged: bool) -> ListItem<'static> {
    let inner_width = width.saturating_sub(4).max(10) as usize;
    let border_char = if dragged {
        "~"
    } else if selected {
        "="
    } else {
        "-"
    };
    let top = format!("+{}+", border_char.repeat(inner_width));
    let title = truncate_text(&task.title, inner_width);
    let meta = truncate_text(
        &format!("{} • {}", task.assignee.initials, task.priority),
        inner_width,
    );
    let due = if task.due_date.is_empty() {
        String::new()
    } else {
        truncate_text(&format!("due {}", task.due_date), inner_width)
    };
    let lines = vec![
        Line::raw(top.clone()),
        Line::raw(format!("| {:width$} |", title, width = inner_width)),
        Line::raw(format!("| {:width$} |", meta, width = inner_width)),
        Line::raw(format!("| {:width$} |", due, width = inner_width)),
        Line::raw(top),
    ];
    let style = if dragged {
        Style::default()
            .bg(Color::Rgb(60, 52, 20))
            .fg(Color::LightYellow)
            .add_modifier(Modifier::BOLD)
    } else if selected {
        Style::default()
            .bg(Color::Rgb(252, 214, 112))
            .fg(Color::Black)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().bg(Color::Rgb(22, 24, 30)).fg(Color::Gray)
    };
    ListItem::new(lines).style(style)
}

fn field_lines(label: &str, field: &FieldValue, active: bool) -> Vec<Line<'static>> {
    let label_style = Style::default()
        .fg(Color::Gray)
        .add_modifier(Modifier::BOLD | Modifier::DIM);
    let value_style = Style::default().fg(if active { Color::Cyan } else { Color::White });
    let prefix = format!("{}: ", label);
    let spacer = " ".repeat(prefix.chars().count());
    let text = if active {
        field.with_caret()
    } else {
        field.value.clone()
    };
    text.split('\n')
        .enumerate()
        .map(|(idx, line)| {
            Line::from(vec![
                Span::styled(
                    if idx == 0 {
                        prefix.clone()
                    } else {
                        spacer.clone()
                    },
                    label_style,
                ),
                Span::styled(line.to_string(), value_style),
            ])
        })
        .collect()
}

fn choice_line(label: &str, value: &str, active: bool) -> Line<'static> {
    let label_style = Style::default()
        .fg(Color::Gray)
        .add_modifier(Modifier::BOLD | Modifier::DIM);
    let text = if active {
        format!("◀ {} ▶", value)
    } else {
        value.to_string()
    };
    Line::from(vec![
        Span::styled(format!("{}: ", label), label_style),
        Span::styled(
            text,
            Style::default().fg(if active { Color::Cyan } else { Color::White }),
        ),
    ])
}

fn task_detail(task: &Task) -> Line<'static> {
    let mut spans = vec![
        Span::styled(
            task.title.clone(),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(
            task.assignee.name.clone(),
            Style::default().fg(Color::LightBlue),
        ),
    ];
    if !task.due_date.is_empty() {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            task.due_date.clone(),
            Style::default().fg(Color::LightRed),
        ));
    }
    if !task.description.is_empty() {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            task.description.clone(),
            Style::default().fg(Color::Gray).add_modifier(Modifier::DIM),
        ));
    }
    Line::from(spans)
}

fn format_elapsed(last: Instant) -> String {
    match last.elapsed().as_secs() {
        0..=4 => "just now".to_string(),
        secs @ 5..=59 => format!("{}s ago", secs),
        secs @ 60..=3599 => format!("{}m ago", secs / 60),
        secs => format!("{}h ago", secs / 3600),
    }
}
