use crate::model::{Column, TaskId};
use crate::storage::Slot;
use crate::store::{StoreError, TaskStore};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragState {
    Idle,
    Dragging {
        task: TaskId,
        hover: Option<Column>,
    },
}

/// Answer to a drag-over. Columns always accept a dragged card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropEffect {
    Move,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropOutcome {
    Moved { task: TaskId, to: Column },
    Unchanged,
    NotDragging,
}

/// Turns drag gestures over the kanban board into store moves.
/// `idle -> dragging` on drag-start, back to idle on drop or drag-end.
#[derive(Debug, Clone)]
pub struct DragController {
    state: DragState,
}

impl Default for DragController {
    fn default() -> Self {
        DragController::new()
    }
}

impl DragController {
    pub fn new() -> Self {
        DragController {
            state: DragState::Idle,
        }
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    pub fn dragged(&self) -> Option<TaskId> {
        match self.state {
            DragState::Dragging { task, .. } => Some(task),
            DragState::Idle => None,
        }
    }

    pub fn hover(&self) -> Option<Column> {
        match self.state {
            DragState::Dragging { hover, .. } => hover,
            DragState::Idle => None,
        }
    }

    /// Records the card being dragged, hovering over the column it was
    /// picked up from. The store is not touched.
    pub fn drag_start(&mut self, task: TaskId, origin: Column) {
        debug!(task, %origin, "drag start");
        self.state = DragState::Dragging {
            task,
            hover: Some(origin),
        };
    }

    pub fn drag_over(&mut self, column: Column) -> DropEffect {
        match &mut self.state {
            DragState::Dragging { hover, .. } => {
                *hover = Some(column);
                DropEffect::Move
            }
            DragState::Idle => DropEffect::None,
        }
    }

    /// Pointer left every column while dragging.
    pub fn drag_leave(&mut self) {
        if let DragState::Dragging { hover, .. } = &mut self.state {
            *hover = None;
        }
    }

    /// Drops onto `column`. The dragged reference is cleared whatever the
    /// outcome, including when the store rejects the move.
    pub fn drop<S: Slot>(
        &mut self,
        column: Column,
        store: &mut TaskStore<S>,
    ) -> Result<DropOutcome, StoreError> {
        let state = std::mem::replace(&mut self.state, DragState::Idle);
        let task = match state {
            DragState::Dragging { task, .. } => task,
            DragState::Idle => return Ok(DropOutcome::NotDragging),
        };
        let current = match store.get(task) {
            Some(t) => t.column(),
            None => {
                debug!(task, "dragged task vanished before drop");
                return Ok(DropOutcome::Unchanged);
            }
        };
        if current == column {
            debug!(task, %column, "dropped on own column");
            return Ok(DropOutcome::Unchanged);
        }
        store.move_to_column(task, column)?;
        Ok(DropOutcome::Moved { task, to: column })
    }

    /// Gesture ended without a drop target.
    pub fn drag_end(&mut self) {
        if let DragState::Dragging { task, .. } = self.state {
            debug!(task, "drag ended without drop");
        }
        self.state = DragState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Status, TaskDraft};
    use crate::storage::MemorySlot;

    fn store_with_todo() -> (TaskStore<MemorySlot>, TaskId) {
        let mut store = TaskStore::load(MemorySlot::with_contents("[]"));
        let id = store.create(TaskDraft::new("Drag me", "Ola")).expect("create");
        (store, id)
    }

    #[test]
    fn drag_todo_to_done_then_done_to_done() {
        let (mut store, id) = store_with_todo();
        let mut drag = DragController::new();

        drag.drag_start(id, Column::Todo);
        assert_eq!(drag.drag_over(Column::Done), DropEffect::Move);
        assert_eq!(drag.hover(), Some(Column::Done));
        let outcome = drag.drop(Column::Done, &mut store).expect("drop");
        assert_eq!(outcome, DropOutcome::Moved { task: id, to: Column::Done });
        assert_eq!(drag.state(), DragState::Idle);

        let task = store.get(id).expect("task").clone();
        assert_eq!(task.column(), Column::Done);
        assert_eq!(task.status, Status::Done);

        let writes = store.slot().writes;
        drag.drag_start(id, Column::Done);
        assert_eq!(
            drag.drop(Column::Done, &mut store).expect("drop"),
            DropOutcome::Unchanged
        );
        assert!(!drag.is_dragging());
        assert_eq!(store.get(id), Some(&task));
        assert_eq!(store.slot().writes, writes);
    }

    #[test]
    fn drag_over_while_idle_is_refused() {
        let mut drag = DragController::new();
        assert_eq!(drag.drag_over(Column::Todo), DropEffect::None);
        assert_eq!(drag.hover(), None);
    }

    #[test]
    fn drop_without_drag_does_nothing() {
        let (mut store, id) = store_with_todo();
        let mut drag = DragController::new();
        assert_eq!(
            drag.drop(Column::Done, &mut store).expect("drop"),
            DropOutcome::NotDragging
        );
        assert_eq!(store.get(id).expect("task").column(), Column::Todo);
    }

    #[test]
    fn drag_end_outside_columns_clears_reference() {
        let (mut store, id) = store_with_todo();
        let mut drag = DragController::new();
        drag.drag_start(id, Column::Todo);
        drag.drag_leave();
        assert_eq!(drag.hover(), None);
        drag.drag_end();
        assert_eq!(drag.dragged(), None);
        assert_eq!(store.get(id).expect("task").column(), Column::Todo);
        assert_eq!(
            drag.drop(Column::Done, &mut store).expect("drop"),
            DropOutcome::NotDragging
        );
    }

    #[test]
    fn failed_write_still_clears_reference() {
        let (mut store, id) = store_with_todo();
        store.slot_mut().fail_writes = true;
        let mut drag = DragController::new();
        drag.drag_start(id, Column::Todo);
        assert!(drag.drop(Column::InProgress, &mut store).is_err());
        assert_eq!(drag.state(), DragState::Idle);
        assert_eq!(store.get(id).expect("task").column(), Column::InProgress);
    }
}
