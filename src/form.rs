use crate::model::{Priority, Status, Task, TaskDraft, TaskId};
use crate::storage::Slot;
use crate::store::{StoreError, TaskStore};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(TaskId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Title,
    Description,
    Assignee,
    Priority,
    DueDate,
    Status,
}

impl FormField {
    const ORDER: [FormField; 6] = [
        FormField::Title,
        FormField::Description,
        FormField::Assignee,
        FormField::Priority,
        FormField::DueDate,
        FormField::Status,
    ];

    fn position(self) -> usize {
        FormField::ORDER
            .iter()
            .position(|f| *f == self)
            .unwrap_or(0)
    }
}

/// A text input with a byte-offset caret.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldValue {
    pub value: String,
    cursor: usize,
}

impl FieldValue {
    pub fn new(value: &str) -> Self {
        FieldValue {
            value: value.to_string(),
            cursor: value.len(),
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn move_left(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor = prev_char_boundary(self.cursor, &self.value);
    }

    pub fn move_right(&mut self) {
        if self.cursor >= self.value.len() {
            return;
        }
        self.cursor = next_char_boundary(self.cursor, &self.value);
    }

    pub fn move_up(&mut self) {
        let (line_starts, line_idx, col) = line_state(&self.value, self.cursor);
        if line_idx == 0 {
            return;
        }
        let target_start = line_starts[line_idx - 1];
        self.cursor = index_at_col(&self.value, target_start, col);
    }

    pub fn move_down(&mut self) {
        let (line_starts, line_idx, col) = line_state(&self.value, self.cursor);
        if line_idx + 1 >= line_starts.len() {
            return;
        }
        let target_start = line_starts[line_idx + 1];
        self.cursor = index_at_col(&self.value, target_start, col);
    }

    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let prev = prev_char_boundary(self.cursor, &self.value);
        self.value.drain(prev..self.cursor);
        self.cursor = prev;
    }

    pub fn insert_char(&mut self, ch: char) {
        self.value.insert(self.cursor, ch);
        self.cursor += ch.len_utf8();
    }

    pub fn with_caret(&self) -> String {
        let mut text = self.value.clone();
        text.insert_str(self.cursor, "▌");
        text
    }
}

/// Draft state behind the new/edit task modal.
#[derive(Debug, Clone)]
pub struct TaskForm {
    mode: Option<FormMode>,
    pub title: FieldValue,
    pub description: FieldValue,
    pub assignee: FieldValue,
    pub due_date: FieldValue,
    pub priority: Priority,
    pub status: Status,
    pub field: FormField,
}

impl Default for TaskForm {
    fn default() -> Self {
        TaskForm::new()
    }
}

impl TaskForm {
    pub fn new() -> Self {
        TaskForm {
            mode: None,
            title: FieldValue::default(),
            description: FieldValue::default(),
            assignee: FieldValue::default(),
            due_date: FieldValue::default(),
            priority: Priority::Medium,
            status: Status::Todo,
            field: FormField::Title,
        }
    }

    pub fn is_open(&self) -> bool {
        self.mode.is_some()
    }

    pub fn mode(&self) -> Option<FormMode> {
        self.mode
    }

    pub fn open_new(&mut self) {
        self.reset();
        self.mode = Some(FormMode::Create);
    }

    pub fn open_edit(&mut self, task: &Task) {
        self.title = FieldValue::new(&task.title);
        self.description = FieldValue::new(&task.description);
        self.assignee = FieldValue::new(&task.assignee.name);
        self.due_date = FieldValue::new(&task.due_date);
        self.priority = task.priority;
        self.status = task.status;
        self.field = FormField::Title;
        self.mode = Some(FormMode::Edit(task.id));
    }

    /// Closes the modal and discards the draft.
    pub fn close(&mut self) {
        self.reset();
    }

    pub fn reset(&mut self) {
        *self = TaskForm::new();
    }

    /// Submit is disabled until title and assignee are filled in.
    pub fn can_submit(&self) -> bool {
        self.is_open()
            && !self.title.value.trim().is_empty()
            && !self.assignee.value.trim().is_empty()
    }

    pub fn draft(&self) -> TaskDraft {
        TaskDraft {
            title: self.title.value.trim().to_string(),
            description: self.description.value.trim().to_string(),
            assignee: self.assignee.value.trim().to_string(),
            priority: self.priority,
            due_date: self.due_date.value.trim().to_string(),
            status: self.status,
        }
    }

    /// Hands the draft to the store. Returns `Ok(None)` when submission is
    /// blocked. Once the store has accepted the change the form resets and
    /// closes, even if the write to the slot then failed.
    pub fn submit<S: Slot>(&mut self, store: &mut TaskStore<S>) -> Result<Option<TaskId>, StoreError> {
        let mode = match self.mode {
            Some(mode) if self.can_submit() => mode,
            _ => return Ok(None),
        };
        let draft = self.draft();
        draft.validate()?;
        let result = match mode {
            FormMode::Create => store.create(draft),
            FormMode::Edit(id) => store.update(id, draft).map(|_| id),
        };
        match result {
            Err(StoreError::Board(err)) => Err(StoreError::Board(err)),
            other => {
                debug!(?mode, "task form submitted");
                self.reset();
                other.map(Some)
            }
        }
    }

    pub fn next_field(&mut self) {
        let idx = (self.field.position() + 1) % FormField::ORDER.len();
        self.field = FormField::ORDER[idx];
    }

    pub fn prev_field(&mut self) {
        let len = FormField::ORDER.len();
        let idx = (self.field.position() + len - 1) % len;
        self.field = FormField::ORDER[idx];
    }

    /// Text input under focus, `None` on the priority and status pickers.
    pub fn active_text_mut(&mut self) -> Option<&mut FieldValue> {
        match self.field {
            FormField::Title => Some(&mut self.title),
            FormField::Description => Some(&mut self.description),
            FormField::Assignee => Some(&mut self.assignee),
            FormField::DueDate => Some(&mut self.due_date),
            FormField::Priority | FormField::Status => None,
        }
    }

    /// Steps the focused picker through its options.
    pub fn cycle_choice(&mut self, forward: bool) {
        match self.field {
            FormField::Priority => {
                let order = [Priority::Low, Priority::Medium, Priority::High];
                self.priority = step(&order, self.priority, forward);
            }
            FormField::Status => {
                self.status = step(&Status::ALL, self.status, forward);
            }
            _ => {}
        }
    }
}

fn step<T: Copy + PartialEq>(options: &[T], current: T, forward: bool) -> T {
    let len = options.len();
    let idx = options.iter().position(|o| *o == current).unwrap_or(0);
    let next = if forward {
        (idx + 1) % len
    } else {
        (idx + len - 1) % len
    };
    options[next]
}

fn prev_char_boundary(cursor: usize, text: &str) -> usize {
    if cursor == 0 {
        return 0;
    }
    let mut prev = 0;
    for (idx, _) in text.char_indices() {
        if idx >= cursor {
            break;
        }
        prev = idx;
    }
    prev
}

fn next_char_boundary(cursor: usize, text: &str) -> usize {
    for (idx, ch) in text.char_indices() {
        if idx > cursor {
            return idx;
        }
        if idx == cursor {
            return cursor + ch.len_utf8();
        }
    }
    text.len()
}

fn line_state(text: &str, cursor: usize) -> (Vec<usize>, usize, usize) {
    let mut starts = vec![0];
    for (idx, ch) in text.char_indices() {
        if ch == '\n' {
            starts.push(idx + 1);
        }
    }
    let line_idx = starts
        .iter()
        .rposition(|start| *start <= cursor)
        .unwrap_or(0);
    let col = text[starts[line_idx]..cursor].chars().count();
    (starts, line_idx, col)
}

fn index_at_col(text: &str, start: usize, target_col: usize) -> usize {
    let slice = &text[start..];
    let limit = slice.find('\n').unwrap_or(slice.len());
    slice[..limit]
        .char_indices()
        .nth(target_col)
        .map(|(idx, _)| start + idx)
        .unwrap_or(start + limit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Column;
    use crate::storage::MemorySlot;

    fn type_into(field: &mut FieldValue, text: &str) {
        for ch in text.chars() {
            field.insert_char(ch);
        }
    }

    fn empty_store() -> TaskStore<MemorySlot> {
        TaskStore::load(MemorySlot::with_contents("[]"))
    }

    #[test]
    fn submit_blocked_without_title_or_assignee() {
        let mut store = empty_store();
        let mut form = TaskForm::new();
        form.open_new();
        type_into(&mut form.title, "Quarterly report");
        assert!(!form.can_submit());
        assert_eq!(form.submit(&mut store).expect("submit"), None);
        assert!(form.is_open());
        assert!(store.is_empty());
        assert_eq!(store.slot().writes, 0);
    }

    #[test]
    fn submit_creates_then_resets_and_closes() {
        let mut store = empty_store();
        let mut form = TaskForm::new();
        form.open_new();
        type_into(&mut form.title, "Kickoff deck");
        type_into(&mut form.assignee, "maria de souza");
        form.field = FormField::Status;
        form.cycle_choice(true);
        form.field = FormField::Priority;
        form.cycle_choice(true);

        let id = form.submit(&mut store).expect("submit").expect("created");
        assert!(!form.is_open());
        assert!(form.title.value.is_empty());

        let task = store.get(id).expect("task");
        assert_eq!(task.status, Status::InProgress);
        assert_eq!(task.column(), Column::InProgress);
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.assignee.initials, "MDS");
    }

    #[test]
    fn bad_due_date_keeps_form_open() {
        let mut store = empty_store();
        let mut form = TaskForm::new();
        form.open_new();
        type_into(&mut form.title, "Renewal");
        type_into(&mut form.assignee, "Ann");
        type_into(&mut form.due_date, "next week");
        assert!(form.submit(&mut store).is_err());
        assert!(form.is_open());
        assert!(store.is_empty());
    }

    #[test]
    fn edit_updates_existing_task() {
        let mut store = empty_store();
        let id = store
            .create(TaskDraft::new("Draft", "Ann"))
            .expect("create");
        let mut form = TaskForm::new();
        form.open_edit(store.get(id).expect("task"));
        assert_eq!(form.mode(), Some(FormMode::Edit(id)));
        type_into(&mut form.title, " v2");
        assert_eq!(form.submit(&mut store).expect("submit"), Some(id));
        assert_eq!(store.get(id).expect("task").title, "Draft v2");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn closed_form_never_submits() {
        let mut store = empty_store();
        let mut form = TaskForm::new();
        type_into(&mut form.title, "x");
        type_into(&mut form.assignee, "y");
        assert_eq!(form.submit(&mut store).expect("submit"), None);
        assert!(store.is_empty());
    }

    #[test]
    fn field_focus_cycles_both_ways() {
        let mut form = TaskForm::new();
        form.prev_field();
        assert_eq!(form.field, FormField::Status);
        form.next_field();
        form.next_field();
        assert_eq!(form.field, FormField::Description);
    }

    #[test]
    fn caret_moves_across_lines_and_multibyte_chars() {
        let mut field = FieldValue::new("ab\ncdé");
        field.move_left();
        assert_eq!(field.cursor(), 5);
        field.move_up();
        assert_eq!(field.cursor(), 2);
        field.backspace();
        assert_eq!(field.value, "a\ncdé");
        field.move_down();
        assert_eq!(field.cursor(), 3);
        field.move_right();
        field.move_right();
        assert_eq!(field.cursor(), field.value.len());
    }
}
