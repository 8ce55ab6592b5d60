use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type TaskId = i64;

pub const DUE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Workflow state of a task. `completed` and the kanban column are derived
/// from this value and never stored independently in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Todo,
    InProgress,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Column {
    Todo,
    InProgress,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Priority {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignee {
    pub name: String,
    pub initials: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StoredTask", into = "StoredTask")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub description: String,
    pub assignee: Assignee,
    pub priority: Priority,
    /// ISO `YYYY-MM-DD`, empty when the task has no due date.
    pub due_date: String,
    pub status: Status,
}

/// Field values collected by the task form before a task exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub assignee: String,
    pub priority: Priority,
    pub due_date: String,
    pub status: Status,
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum BoardError {
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),
    #[error("unknown column: {0} (expected todo, in-progress or done)")]
    UnknownColumn(String),
    #[error("unknown status: {0} (expected Pending, In Progress or Completed)")]
    UnknownStatus(String),
    #[error("unknown priority: {0} (expected low, medium or high)")]
    UnknownPriority(String),
    #[error("invalid due date (use YYYY-MM-DD): {0}")]
    InvalidDueDate(String),
    #[error("title is required")]
    MissingTitle,
    #[error("assignee is required")]
    MissingAssignee,
    #[error("no task ids left after {0}")]
    IdsExhausted(TaskId),
}

impl Status {
    pub const ALL: [Status; 3] = [Status::Todo, Status::InProgress, Status::Done];

    pub fn label(self) -> &'static str {
        match self {
            Status::Todo => "Pending",
            Status::InProgress => "In Progress",
            Status::Done => "Completed",
        }
    }

    pub fn completed(self) -> bool {
        self == Status::Done
    }

    pub fn column(self) -> Column {
        match self {
            Status::Todo => Column::Todo,
            Status::InProgress => Column::InProgress,
            Status::Done => Column::Done,
        }
    }

    /// State a checkbox toggle lands in. Anything not done becomes done;
    /// done goes back to pending, never to in-progress.
    pub fn toggled(self) -> Status {
        if self.completed() {
            Status::Todo
        } else {
            Status::Done
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Status {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Status::Todo),
            "in progress" | "in-progress" => Ok(Status::InProgress),
            "completed" => Ok(Status::Done),
            _ => Err(BoardError::UnknownStatus(s.to_string())),
        }
    }
}

impl Column {
    pub const ALL: [Column; 3] = [Column::Todo, Column::InProgress, Column::Done];

    pub fn id(self) -> &'static str {
        match self {
            Column::Todo => "todo",
            Column::InProgress => "in-progress",
            Column::Done => "done",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Column::Todo => "To Do",
            Column::InProgress => "In Progress",
            Column::Done => "Done",
        }
    }

    pub fn status(self) -> Status {
        match self {
            Column::Todo => Status::Todo,
            Column::InProgress => Status::InProgress,
            Column::Done => Status::Done,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Column::Todo => 0,
            Column::InProgress => 1,
            Column::Done => 2,
        }
    }

    pub fn from_index(idx: usize) -> Option<Column> {
        Column::ALL.get(idx).copied()
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Column {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "todo" => Ok(Column::Todo),
            "in-progress" => Ok(Column::InProgress),
            "done" => Ok(Column::Done),
            other => Err(BoardError::UnknownColumn(other.to_string())),
        }
    }
}

impl Priority {
    pub fn label(self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Priority {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            _ => Err(BoardError::UnknownPriority(s.to_string())),
        }
    }
}

impl Assignee {
    pub fn from_name(name: &str) -> Self {
        let name = name.trim().to_string();
        let initials = initials_of(&name);
        Assignee { name, initials }
    }
}

pub fn initials_of(name: &str) -> String {
    name.split_whitespace()
        .filter_map(|word| word.chars().next())
        .flat_map(char::to_uppercase)
        .collect()
}

/// Checks a due date input; the empty string means "no due date".
pub fn validate_due_date(input: &str) -> Result<String, BoardError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(String::new());
    }
    NaiveDate::parse_from_str(trimmed, DUE_DATE_FORMAT)
        .map(|d| d.format(DUE_DATE_FORMAT).to_string())
        .map_err(|_| BoardError::InvalidDueDate(trimmed.to_string()))
}

impl Task {
    pub fn from_draft(id: TaskId, draft: TaskDraft) -> Self {
        Task {
            id,
            title: draft.title.trim().to_string(),
            description: draft.description,
            assignee: Assignee::from_name(&draft.assignee),
            priority: draft.priority,
            due_date: draft.due_date,
            status: draft.status,
        }
    }

    pub fn completed(&self) -> bool {
        self.status.completed()
    }

    pub fn column(&self) -> Column {
        self.status.column()
    }

    pub fn due(&self) -> Option<NaiveDate> {
        if self.due_date.is_empty() {
            return None;
        }
        NaiveDate::parse_from_str(&self.due_date, DUE_DATE_FORMAT).ok()
    }
}

impl TaskDraft {
    pub fn new(title: impl Into<String>, assignee: impl Into<String>) -> Self {
        TaskDraft {
            title: title.into(),
            description: String::new(),
            assignee: assignee.into(),
            priority: Priority::Medium,
            due_date: String::new(),
            status: Status::Todo,
        }
    }

    pub fn from_task(task: &Task) -> Self {
        TaskDraft {
            title: task.title.clone(),
            description: task.description.clone(),
            assignee: task.assignee.name.clone(),
            priority: task.priority,
            due_date: task.due_date.clone(),
            status: task.status,
        }
    }

    pub fn validate(&self) -> Result<(), BoardError> {
        if self.title.trim().is_empty() {
            return Err(BoardError::MissingTitle);
        }
        if self.assignee.trim().is_empty() {
            return Err(BoardError::MissingAssignee);
        }
        validate_due_date(&self.due_date)?;
        Ok(())
    }
}

/// On-disk shape of a task. `completed` and `column` are written for
/// readers of the raw slot but `status` is the field trusted on load.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredTask {
    id: TaskId,
    title: String,
    #[serde(default)]
    description: String,
    assignee: Assignee,
    priority: Priority,
    #[serde(default)]
    due_date: String,
    status: String,
    completed: bool,
    column: Column,
}

impl From<Task> for StoredTask {
    fn from(task: Task) -> Self {
        StoredTask {
            id: task.id,
            completed: task.completed(),
            column: task.column(),
            status: task.status.label().to_string(),
            title: task.title,
            description: task.description,
            assignee: task.assignee,
            priority: task.priority,
            due_date: task.due_date,
        }
    }
}

impl TryFrom<StoredTask> for Task {
    type Error = BoardError;

    fn try_from(stored: StoredTask) -> Result<Self, Self::Error> {
        let status: Status = stored.status.parse()?;
        if status.column() != stored.column || status.completed() != stored.completed {
            tracing::warn!(
                id = stored.id,
                status = %stored.status,
                column = %stored.column,
                completed = stored.completed,
                "stored task fields disagree; keeping status"
            );
        }
        Ok(Task {
            id: stored.id,
            title: stored.title,
            description: stored.description,
            assignee: stored.assignee,
            priority: stored.priority,
            due_date: stored.due_date,
            status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_and_column_map_both_ways() {
        for status in Status::ALL {
            assert_eq!(status.column().status(), status);
            assert_eq!(status.completed(), status.column() == Column::Done);
        }
    }

    #[test]
    fn initials_take_first_letter_of_each_word() {
        assert_eq!(initials_of("ada lovelace"), "AL");
        assert_eq!(initials_of("  Grace   Brewster Hopper "), "GBH");
        assert_eq!(initials_of("cher"), "C");
        assert_eq!(initials_of(""), "");
    }

    #[test]
    fn priority_parses_lowercase_input() {
        assert_eq!("high".parse::<Priority>(), Ok(Priority::High));
        assert_eq!("Medium".parse::<Priority>(), Ok(Priority::Medium));
        assert!("urgent".parse::<Priority>().is_err());
    }

    #[test]
    fn toggle_never_lands_in_progress() {
        assert_eq!(Status::Todo.toggled(), Status::Done);
        assert_eq!(Status::InProgress.toggled(), Status::Done);
        assert_eq!(Status::Done.toggled(), Status::Todo);
    }

    #[test]
    fn wire_shape_carries_derived_fields() {
        let task = Task::from_draft(
            7,
            TaskDraft {
                status: Status::InProgress,
                due_date: "2024-03-05".into(),
                ..TaskDraft::new("Draft proposal", "Sam Lee")
            },
        );
        let value = serde_json::to_value(&task).expect("serialize");
        assert_eq!(value["status"], "In Progress");
        assert_eq!(value["column"], "in-progress");
        assert_eq!(value["completed"], false);
        assert_eq!(value["dueDate"], "2024-03-05");
        assert_eq!(value["priority"], "Medium");
        assert_eq!(value["assignee"]["initials"], "SL");
    }

    #[test]
    fn status_wins_when_stored_fields_disagree() {
        let raw = r#"{"id":1,"title":"t","description":"","assignee":{"name":"A","initials":"A"},
            "priority":"Low","dueDate":"","status":"Completed","completed":false,"column":"todo"}"#;
        let task: Task = serde_json::from_str(raw).expect("parse");
        assert_eq!(task.status, Status::Done);
        assert_eq!(task.column(), Column::Done);
    }

    #[test]
    fn draft_validation_requires_title_and_assignee() {
        assert_eq!(
            TaskDraft::new("  ", "Ann").validate(),
            Err(BoardError::MissingTitle)
        );
        assert_eq!(
            TaskDraft::new("Call", " ").validate(),
            Err(BoardError::MissingAssignee)
        );
        let bad_date = TaskDraft {
            due_date: "05/03/2024".into(),
            ..TaskDraft::new("Call", "Ann")
        };
        assert!(matches!(
            bad_date.validate(),
            Err(BoardError::InvalidDueDate(_))
        ));
    }
}
