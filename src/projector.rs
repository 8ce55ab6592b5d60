//! Read-only views derived from the task collection. Nothing here mutates
//! the store; every projection is recomputed from the current slice.

use crate::model::{Column, Priority, Status, Task, DUE_DATE_FORMAT};
use chrono::{Datelike, Local, NaiveDate};
use std::fmt;
use std::str::FromStr;

/// Task chips shown in one calendar cell before collapsing into "+N more".
pub const CALENDAR_CHIP_LIMIT: usize = 2;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    pub query: String,
}

impl ListFilter {
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.priority.is_none() && self.query.trim().is_empty()
    }

    pub fn matches(&self, task: &Task) -> bool {
        if self.status.is_some_and(|s| s != task.status) {
            return false;
        }
        if self.priority.is_some_and(|p| p != task.priority) {
            return false;
        }
        let query = self.query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        task.title.to_lowercase().contains(&query)
            || task.description.to_lowercase().contains(&query)
            || task.assignee.name.to_lowercase().contains(&query)
    }
}

/// Tasks in store order, narrowed by `filter`.
pub fn list_view<'a>(tasks: &'a [Task], filter: &ListFilter) -> Vec<&'a Task> {
    tasks.iter().filter(|t| filter.matches(t)).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct CalendarMonth {
    year: i32,
    month: u32,
}

impl CalendarMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|_| CalendarMonth { year, month })
    }

    pub fn containing(date: NaiveDate) -> Self {
        CalendarMonth {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn days(&self) -> u32 {
        days_in_month(self.year, self.month)
    }

    pub fn next(&self) -> Self {
        if self.month == 12 {
            CalendarMonth {
                year: self.year + 1,
                month: 1,
            }
        } else {
            CalendarMonth {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    pub fn prev(&self) -> Self {
        if self.month == 1 {
            CalendarMonth {
                year: self.year - 1,
                month: 12,
            }
        } else {
            CalendarMonth {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    pub fn title(&self) -> String {
        self.first_day().format("%B %Y").to_string()
    }
}

impl fmt::Display for CalendarMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for CalendarMonth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, month) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| format!("invalid month (use YYYY-MM): {}", s))?;
        let year = year
            .parse::<i32>()
            .map_err(|_| format!("invalid year: {}", year))?;
        let month = month
            .parse::<u32>()
            .map_err(|_| format!("invalid month: {}", month))?;
        CalendarMonth::new(year, month).ok_or_else(|| format!("invalid month (use YYYY-MM): {}", s))
    }
}

#[derive(Debug, Clone)]
pub struct CalendarDay<'a> {
    pub date: NaiveDate,
    /// `YYYY-MM-DD`; tasks match on exact string equality with `due_date`.
    pub key: String,
    pub tasks: Vec<&'a Task>,
}

impl<'a> CalendarDay<'a> {
    pub fn visible(&self) -> &[&'a Task] {
        &self.tasks[..self.tasks.len().min(CALENDAR_CHIP_LIMIT)]
    }

    pub fn overflow(&self) -> usize {
        self.tasks.len().saturating_sub(CALENDAR_CHIP_LIMIT)
    }
}

/// One displayed month as Monday-first week rows. Cells outside the month
/// are `None`.
#[derive(Debug, Clone)]
pub struct CalendarGrid<'a> {
    pub month: CalendarMonth,
    pub weeks: Vec<[Option<CalendarDay<'a>>; 7]>,
}

impl<'a> CalendarGrid<'a> {
    pub fn days(&self) -> impl Iterator<Item = &CalendarDay<'a>> {
        self.weeks.iter().flat_map(|week| week.iter().flatten())
    }

    pub fn day(&self, day: u32) -> Option<&CalendarDay<'a>> {
        self.days().find(|d| d.date.day() == day)
    }
}

pub fn calendar_view(tasks: &[Task], month: CalendarMonth) -> CalendarGrid<'_> {
    let first = month.first_day();
    let days = month.days() as i64;
    let lead = first.weekday().num_days_from_monday() as i64;
    let mut weeks = Vec::new();
    let mut cell: i64 = -lead;
    while cell < days {
        let week: [Option<CalendarDay<'_>>; 7] = std::array::from_fn(|col| {
            let day = cell + col as i64;
            if day < 0 || day >= days {
                return None;
            }
            let date = first + chrono::Duration::days(day);
            let key = date.format(DUE_DATE_FORMAT).to_string();
            let matching = tasks.iter().filter(|t| t.due_date == key).collect();
            Some(CalendarDay {
                date,
                key,
                tasks: matching,
            })
        });
        weeks.push(week);
        cell += 7;
    }
    CalendarGrid { month, weeks }
}

#[derive(Debug, Clone)]
pub struct KanbanColumn<'a> {
    pub column: Column,
    pub tasks: Vec<&'a Task>,
}

impl KanbanColumn<'_> {
    pub fn count(&self) -> usize {
        self.tasks.len()
    }
}

#[derive(Debug, Clone)]
pub struct KanbanBoard<'a> {
    pub columns: [KanbanColumn<'a>; 3],
}

impl<'a> KanbanBoard<'a> {
    pub fn column(&self, column: Column) -> &KanbanColumn<'a> {
        &self.columns[column.index()]
    }
}

/// Groups tasks into the three fixed columns, keeping store order inside
/// each column.
pub fn kanban_view(tasks: &[Task]) -> KanbanBoard<'_> {
    let columns = Column::ALL.map(|column| KanbanColumn {
        column,
        tasks: tasks.iter().filter(|t| t.column() == column).collect(),
    });
    KanbanBoard { columns }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskStats {
    pub total: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub overdue: usize,
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn stats(tasks: &[Task], today: NaiveDate) -> TaskStats {
    let mut out = TaskStats {
        total: tasks.len(),
        ..TaskStats::default()
    };
    for task in tasks {
        match task.status {
            Status::Todo => out.pending += 1,
            Status::InProgress => out.in_progress += 1,
            Status::Done => out.completed += 1,
        }
        if !task.completed() && task.due().is_some_and(|d| d < today) {
            out.overdue += 1;
        }
    }
    out
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    next.and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .unwrap_or(28)
}
