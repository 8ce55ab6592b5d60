use crate::model::{BoardError, Column, Status, Task, TaskDraft, TaskId};
use crate::seed::seed_tasks;
use crate::storage::{Slot, SlotError};
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, info, warn};

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Board(#[from] BoardError),
    #[error("serializing tasks: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("failed to persist tasks to {slot}: {source}")]
    Persist { slot: String, source: SlotError },
}

/// Where the collection held by a freshly loaded store came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOrigin {
    Stored,
    /// Valid JSON, but `skipped` records could not be read as tasks and
    /// were dropped. They are gone from the slot after the next write.
    Salvaged { skipped: usize },
    SeededEmpty,
    SeededCorrupt,
}

/// Canonical task collection plus the slot it is mirrored to.
///
/// Mutations are applied in memory first and then the whole collection is
/// written to the slot. A failed write leaves the in-memory collection
/// ahead of the slot until the next successful write; the failure is
/// returned so the caller can decide whether to report it.
#[derive(Debug)]
pub struct TaskStore<S: Slot> {
    tasks: Vec<Task>,
    slot: S,
    last_id: TaskId,
    origin: LoadOrigin,
}

impl<S: Slot> TaskStore<S> {
    /// Reads the slot, falling back to the seed set when it is empty or
    /// not JSON at all. Records of the wrong shape are skipped one by one.
    /// Loading never writes.
    pub fn load(slot: S) -> Self {
        let (tasks, origin) = match slot.read() {
            Ok(Some(raw)) => match decode(&raw) {
                Ok(Decoded { tasks, skipped: 0 }) => (tasks, LoadOrigin::Stored),
                Ok(Decoded { tasks, skipped }) => {
                    warn!(slot = %slot.describe(), skipped, kept = tasks.len(), "dropped unreadable task records");
                    (tasks, LoadOrigin::Salvaged { skipped })
                }
                Err(err) => {
                    warn!(slot = %slot.describe(), error = %err, "stored tasks are not JSON; using seed set");
                    (seed_tasks(), LoadOrigin::SeededCorrupt)
                }
            },
            Ok(None) => {
                debug!(slot = %slot.describe(), "slot empty; using seed set");
                (seed_tasks(), LoadOrigin::SeededEmpty)
            }
            Err(err) => {
                warn!(slot = %slot.describe(), error = %err, "slot unreadable; using seed set");
                (seed_tasks(), LoadOrigin::SeededCorrupt)
            }
        };
        info!(slot = %slot.describe(), count = tasks.len(), ?origin, "loaded tasks");
        TaskStore::with_tasks(slot, tasks, origin)
    }

    /// Store holding the seed set, not yet written.
    pub fn seeded(slot: S) -> Self {
        TaskStore::with_tasks(slot, seed_tasks(), LoadOrigin::SeededEmpty)
    }

    fn with_tasks(slot: S, tasks: Vec<Task>, origin: LoadOrigin) -> Self {
        let last_id = tasks.iter().map(|t| t.id).max().unwrap_or(0);
        TaskStore {
            tasks,
            slot,
            last_id,
            origin,
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn origin(&self) -> LoadOrigin {
        self.origin
    }

    pub fn slot(&self) -> &S {
        &self.slot
    }

    pub fn slot_mut(&mut self) -> &mut S {
        &mut self.slot
    }

    pub fn into_slot(self) -> S {
        self.slot
    }

    pub fn create(&mut self, draft: TaskDraft) -> Result<TaskId, StoreError> {
        self.create_at(draft, Utc::now())
    }

    /// Appends a task built from `draft`. The id is the creation time in
    /// milliseconds, bumped past any id already issued.
    pub fn create_at(&mut self, draft: TaskDraft, now: DateTime<Utc>) -> Result<TaskId, StoreError> {
        let next = self
            .last_id
            .checked_add(1)
            .ok_or(BoardError::IdsExhausted(self.last_id))?;
        let id = now.timestamp_millis().max(next);
        self.last_id = id;
        let task = Task::from_draft(id, draft);
        debug!(id, title = %task.title, column = %task.column(), "creating task");
        self.tasks.push(task);
        self.save()?;
        Ok(id)
    }

    pub fn update(&mut self, id: TaskId, draft: TaskDraft) -> Result<(), StoreError> {
        let task = self.task_mut(id)?;
        let updated = Task::from_draft(id, draft);
        debug!(id, from = %task.status, to = %updated.status, "updating task");
        *task = updated;
        self.save()
    }

    /// Flips completion: anything open becomes Completed/done, a completed
    /// task goes back to Pending/todo. Returns the new status.
    pub fn toggle_complete(&mut self, id: TaskId) -> Result<Status, StoreError> {
        let task = self.task_mut(id)?;
        task.status = task.status.toggled();
        let status = task.status;
        debug!(id, %status, "toggled task");
        self.save()?;
        Ok(status)
    }

    /// Returns `false` without writing when the task already sits in
    /// `column`.
    pub fn move_to_column(&mut self, id: TaskId, column: Column) -> Result<bool, StoreError> {
        let task = self.task_mut(id)?;
        if task.column() == column {
            return Ok(false);
        }
        let from = task.column();
        task.status = column.status();
        debug!(id, %from, to = %column, "moved task");
        self.save()?;
        Ok(true)
    }

    /// Removing an unknown id is a no-op and does not write.
    pub fn delete(&mut self, id: TaskId) -> Result<bool, StoreError> {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        if self.tasks.len() == before {
            return Ok(false);
        }
        debug!(id, "deleted task");
        self.save()?;
        Ok(true)
    }

    pub fn save(&mut self) -> Result<(), StoreError> {
        let encoded = serde_json::to_string_pretty(&self.tasks)?;
        self.slot
            .write(&encoded)
            .map_err(|source| StoreError::Persist {
                slot: self.slot.describe(),
                source,
            })?;
        debug!(count = self.tasks.len(), "persisted tasks");
        Ok(())
    }

    fn task_mut(&mut self, id: TaskId) -> Result<&mut Task, BoardError> {
        self.tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(BoardError::TaskNotFound(id))
    }
}

/// Tasks read back from a slot, plus how many records were unusable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub tasks: Vec<Task>,
    pub skipped: usize,
}

/// Fails only when `raw` is not JSON. A non-array value counts as one
/// skipped record.
pub fn decode(raw: &str) -> Result<Decoded, serde_json::Error> {
    let records = match serde_json::from_str::<Value>(raw)? {
        Value::Array(records) => records,
        _ => {
            warn!("stored value is not a task array");
            return Ok(Decoded {
                tasks: Vec::new(),
                skipped: 1,
            });
        }
    };
    let mut decoded = Decoded {
        tasks: Vec::with_capacity(records.len()),
        skipped: 0,
    };
    for (index, record) in records.into_iter().enumerate() {
        match serde_json::from_value::<Task>(record) {
            Ok(task) => decoded.tasks.push(task),
            Err(err) => {
                warn!(index, error = %err, "skipping unreadable task record");
                decoded.skipped += 1;
            }
        }
    }
    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Priority;
    use crate::storage::MemorySlot;
    use chrono::TimeZone;

    fn empty_store() -> TaskStore<MemorySlot> {
        TaskStore::load(MemorySlot::with_contents("[]"))
    }

    fn at(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).single().expect("valid timestamp")
    }

    #[test]
    fn create_derives_column_from_status() {
        let mut store = empty_store();
        let draft = TaskDraft {
            status: Status::InProgress,
            ..TaskDraft::new("Build dashboard", "Jo Park")
        };
        let id = store.create(draft).expect("create");
        let task = store.get(id).expect("task exists");
        assert_eq!(task.column(), Column::InProgress);
        assert_eq!(task.status.label(), "In Progress");
        assert!(!task.completed());
        assert_eq!(task.assignee.initials, "JP");
    }

    #[test]
    fn ids_are_not_reused_within_the_same_millisecond() {
        let mut store = empty_store();
        let a = store
            .create_at(TaskDraft::new("a", "x"), at(1_000))
            .expect("a");
        let b = store
            .create_at(TaskDraft::new("b", "x"), at(1_000))
            .expect("b");
        store.delete(b).expect("delete");
        let c = store
            .create_at(TaskDraft::new("c", "x"), at(900))
            .expect("c");
        assert_eq!(a, 1_000);
        assert_eq!(b, 1_001);
        assert_eq!(c, 1_002);
    }

    #[test]
    fn create_refuses_once_ids_run_out() {
        let top = Task::from_draft(TaskId::MAX, TaskDraft::new("Last", "Bo"));
        let raw = serde_json::to_string(&vec![top]).expect("encode");
        let mut store = TaskStore::load(MemorySlot::with_contents(raw));
        assert_eq!(store.origin(), LoadOrigin::Stored);

        let result = store.create(TaskDraft::new("next", "Bo"));
        assert!(matches!(
            result,
            Err(StoreError::Board(BoardError::IdsExhausted(TaskId::MAX)))
        ));
        assert_eq!(store.len(), 1);
        assert_eq!(store.slot().writes, 0);
    }

    #[test]
    fn toggle_complete_forces_both_fixed_states() {
        let mut store = empty_store();
        let id = store
            .create(TaskDraft {
                status: Status::InProgress,
                ..TaskDraft::new("Review", "Lee")
            })
            .expect("create");

        assert_eq!(store.toggle_complete(id).expect("toggle"), Status::Done);
        let task = store.get(id).expect("task");
        assert!(task.completed());
        assert_eq!(task.column(), Column::Done);

        assert_eq!(store.toggle_complete(id).expect("toggle"), Status::Todo);
        assert_eq!(store.get(id).expect("task").column(), Column::Todo);
    }

    #[test]
    fn move_to_same_column_does_not_write() {
        let mut store = empty_store();
        let id = store.create(TaskDraft::new("Ship", "Ana")).expect("create");
        let writes = store.slot().writes;

        assert!(store.move_to_column(id, Column::Done).expect("move"));
        assert!(!store.move_to_column(id, Column::Done).expect("move again"));
        assert!(!store.move_to_column(id, Column::Done).expect("and again"));
        assert_eq!(store.slot().writes, writes + 1);
        assert_eq!(store.get(id).expect("task").status, Status::Done);
    }

    #[test]
    fn unknown_ids() {
        let mut store = empty_store();
        assert!(matches!(
            store.toggle_complete(42),
            Err(StoreError::Board(BoardError::TaskNotFound(42)))
        ));
        assert!(matches!(
            store.move_to_column(42, Column::Done),
            Err(StoreError::Board(BoardError::TaskNotFound(42)))
        ));
        assert!(!store.delete(42).expect("delete is a no-op"));
        assert_eq!(store.slot().writes, 0);
    }

    #[test]
    fn update_replaces_fields_and_keeps_id() {
        let mut store = empty_store();
        let id = store.create(TaskDraft::new("Old", "Ann Bell")).expect("create");
        let draft = TaskDraft {
            priority: Priority::High,
            status: Status::Done,
            due_date: "2024-02-01".into(),
            ..TaskDraft::new("New", "Cy Dunn")
        };
        store.update(id, draft).expect("update");
        let task = store.get(id).expect("task");
        assert_eq!(task.title, "New");
        assert_eq!(task.assignee.initials, "CD");
        assert_eq!(task.column(), Column::Done);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn write_failure_is_surfaced_and_memory_runs_ahead() {
        let mut store = empty_store();
        store.slot_mut().fail_writes = true;
        let result = store.create(TaskDraft::new("Unsaved", "Ann"));
        assert!(matches!(result, Err(StoreError::Persist { .. })));
        assert_eq!(store.len(), 1);
        assert_eq!(store.slot().contents.as_deref(), Some("[]"));

        store.slot_mut().fail_writes = false;
        store.save().expect("retry");
        let reloaded = TaskStore::load(store.into_slot());
        assert_eq!(reloaded.len(), 1);
    }

    #[test]
    fn invalid_json_falls_back_to_seed() {
        let store = TaskStore::load(MemorySlot::with_contents("{not json"));
        assert_eq!(store.origin(), LoadOrigin::SeededCorrupt);
        assert_eq!(store.tasks(), seed_tasks().as_slice());
    }

    #[test]
    fn wrong_shape_is_not_replaced_by_seed() {
        let store = TaskStore::load(MemorySlot::with_contents("{\"tasks\": []}"));
        assert_eq!(store.origin(), LoadOrigin::Salvaged { skipped: 1 });
        assert!(store.is_empty());

        let decoded = decode("[1, \"two\"]").expect("valid json");
        assert_eq!(decoded.skipped, 2);
        assert!(decoded.tasks.is_empty());
    }

    #[test]
    fn empty_slot_falls_back_to_seed_but_empty_array_does_not() {
        let seeded = TaskStore::load(MemorySlot::new());
        assert_eq!(seeded.origin(), LoadOrigin::SeededEmpty);
        assert_eq!(seeded.len(), seed_tasks().len());

        let empty = TaskStore::load(MemorySlot::with_contents("[]"));
        assert_eq!(empty.origin(), LoadOrigin::Stored);
        assert!(empty.is_empty());
    }

    #[test]
    fn round_trip_preserves_order_and_fields() {
        let mut store = TaskStore::load(MemorySlot::new());
        store.move_to_column(3, Column::InProgress).expect("move");
        store.create(TaskDraft::new("Extra", "Zed")).expect("create");
        let before = store.tasks().to_vec();

        let reloaded = TaskStore::load(store.into_slot());
        assert_eq!(reloaded.origin(), LoadOrigin::Stored);
        assert_eq!(reloaded.tasks(), before.as_slice());
    }
}
