//! Keeps the local mirrors of the two collections in step with the remote
//! store.
//!
//! Every mutation goes to the remote store first and is followed by a full
//! re-fetch, so the mirrors show whatever the store actually holds. The one
//! exception is creation, which appends the created record straight away;
//! the next refresh overwrites it like everything else.

use crate::remote::{RemoteCollection, TransportError};
use crate::todo::{ArchivedTodo, NewArchivedTodo, NewTodo, RecordId, Todo};
use log::{debug, info, warn};
use std::fmt;

/// Which of the two lists an item belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListKind {
    Active,
    Archived,
}

/// The remote step an operation was at when it failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RemoteOp {
    ListActive,
    ListArchived,
    CreateActive,
    CreateArchived,
    DeleteActive,
    DeleteArchived,
}

impl fmt::Display for RemoteOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RemoteOp::ListActive => "Loading todos",
            RemoteOp::ListArchived => "Loading completed todos",
            RemoteOp::CreateActive => "Saving todo",
            RemoteOp::CreateArchived => "Archiving todo",
            RemoteOp::DeleteActive => "Deleting todo",
            RemoteOp::DeleteArchived => "Deleting completed todo",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("an answer is required")]
    EmptyAnswer,
    #[error("a question number is required")]
    EmptyQuestionNumber,
}

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{op} failed: {source}")]
    Transport {
        op: RemoteOp,
        #[source]
        source: TransportError,
    },
}

impl SyncError {
    pub fn is_validation(&self) -> bool {
        matches!(self, SyncError::Validation(_))
    }
}

fn transport(op: RemoteOp) -> impl FnOnce(TransportError) -> SyncError {
    move |source| SyncError::Transport { op, source }
}

/// In-memory copies of both remote collections.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Mirrors {
    pub todos: Vec<Todo>,
    pub done_todos: Vec<ArchivedTodo>,
}

/// Guard for destructive actions.
pub trait Confirm {
    fn confirm(&mut self, prompt: &str) -> bool;
}

impl<F: FnMut(&str) -> bool> Confirm for F {
    fn confirm(&mut self, prompt: &str) -> bool {
        self(prompt)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Deletion {
    Deleted,
    Declined,
}

pub struct SyncEngine<A, D> {
    active: A,
    archived: D,
}

impl<A, D> SyncEngine<A, D>
where
    A: RemoteCollection<Record = Todo, Draft = NewTodo>,
    D: RemoteCollection<Record = ArchivedTodo, Draft = NewArchivedTodo>,
{
    pub fn new(active: A, archived: D) -> Self {
        Self { active, archived }
    }

    pub fn active(&self) -> &A {
        &self.active
    }

    pub fn archived(&self) -> &D {
        &self.archived
    }

    /// Replaces the active mirror. On failure the mirror is left as it was.
    pub fn refresh_active(&self, mirrors: &mut Mirrors) -> Result<(), SyncError> {
        let todos = self.active.list().map_err(transport(RemoteOp::ListActive))?;
        debug!("{}: {} records", self.active.name(), todos.len());
        mirrors.todos = todos;
        Ok(())
    }

    /// Replaces the archived mirror. On failure the mirror is left as it was.
    pub fn refresh_archived(&self, mirrors: &mut Mirrors) -> Result<(), SyncError> {
        let done = self
            .archived
            .list()
            .map_err(transport(RemoteOp::ListArchived))?;
        debug!("{}: {} records", self.archived.name(), done.len());
        mirrors.done_todos = done;
        Ok(())
    }

    /// Refreshes both mirrors. Both are always attempted; the first failure
    /// is returned.
    pub fn refresh_all(&self, mirrors: &mut Mirrors) -> Result<(), SyncError> {
        let active = self.refresh_active(mirrors);
        let archived = self.refresh_archived(mirrors);
        active.and(archived)
    }

    /// Creates a todo whose question is its own answer and appends the
    /// stored record to the active mirror without waiting for a refresh.
    pub fn add_todo(
        &self,
        mirrors: &mut Mirrors,
        answer: &str,
        question_number: &str,
    ) -> Result<Todo, SyncError> {
        if answer.trim().is_empty() {
            return Err(ValidationError::EmptyAnswer.into());
        }
        if question_number.trim().is_empty() {
            return Err(ValidationError::EmptyQuestionNumber.into());
        }

        let draft = NewTodo::new(answer, question_number);
        let created = self
            .active
            .create(&draft)
            .map_err(transport(RemoteOp::CreateActive))?;
        info!("created todo {} (#{})", created.id, created.question_number);
        mirrors.todos.push(created.clone());
        Ok(created)
    }

    /// Deletes one record from the given list once `confirm` agrees, then
    /// refreshes both mirrors.
    pub fn delete_todo<C: Confirm>(
        &self,
        mirrors: &mut Mirrors,
        id: &RecordId,
        list: ListKind,
        mut confirm: C,
    ) -> Result<Deletion, SyncError> {
        if !confirm.confirm("Delete this item?") {
            debug!("deletion of {} declined", id);
            return Ok(Deletion::Declined);
        }

        match list {
            ListKind::Active => self
                .active
                .delete(id)
                .map_err(transport(RemoteOp::DeleteActive))?,
            ListKind::Archived => self
                .archived
                .delete(id)
                .map_err(transport(RemoteOp::DeleteArchived))?,
        }
        info!("deleted {} from {:?} list", id, list);

        self.refresh_all(mirrors)?;
        Ok(Deletion::Deleted)
    }

    /// Moves a todo to the archive: create the archived copy, then delete
    /// the active record. Nothing is rolled back, so if the delete fails the item
    /// shows up in both lists after the refresh.
    pub fn complete_todo(
        &self,
        mirrors: &mut Mirrors,
        todo: &Todo,
    ) -> Result<ArchivedTodo, SyncError> {
        let moved = self.copy_then_delete(todo);
        let refreshed = self.refresh_all(mirrors);
        match moved {
            Ok(archived) => {
                refreshed?;
                info!("completed todo {} as {}", todo.id, archived.id);
                Ok(archived)
            }
            Err(e) => {
                if let Err(re) = refreshed {
                    warn!("refresh after failed completion of {}: {}", todo.id, re);
                }
                Err(e)
            }
        }
    }

    fn copy_then_delete(&self, todo: &Todo) -> Result<ArchivedTodo, SyncError> {
        let archived = self
            .archived
            .create(&NewArchivedTodo::from(todo))
            .map_err(transport(RemoteOp::CreateArchived))?;
        if let Err(e) = self.active.delete(&todo.id) {
            warn!(
                "todo {} archived as {} but could not be removed from {}",
                todo.id,
                archived.id,
                self.active.name()
            );
            return Err(transport(RemoteOp::DeleteActive)(e));
        }
        Ok(archived)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryCollection;

    fn stores() -> (MemoryCollection<Todo>, MemoryCollection<ArchivedTodo>) {
        (
            MemoryCollection::new("active", 1),
            MemoryCollection::new("archived", 1000),
        )
    }

    fn yes(_: &str) -> bool {
        true
    }

    #[test]
    fn add_then_refresh_yields_exactly_one_new_record() {
        let (active, archived) = stores();
        active.seed(NewTodo::new("existing", "0"));
        let engine = SyncEngine::new(&active, &archived);
        let mut m = Mirrors::default();
        engine.refresh_all(&mut m).unwrap();

        engine.add_todo(&mut m, "Learn *X*", "7").unwrap();
        engine.refresh_active(&mut m).unwrap();

        assert_eq!(m.todos.len(), 2);
        let new = &m.todos[1];
        assert_eq!(new.answer, "Learn *X*");
        assert_eq!(new.question_number, "7");
        assert_eq!(new.question.as_deref(), Some("Learn *X*"));
    }

    #[test]
    fn blank_fields_make_no_remote_calls() {
        let (active, archived) = stores();
        let engine = SyncEngine::new(&active, &archived);
        let mut m = Mirrors::default();

        let err = engine.add_todo(&mut m, "", "1").unwrap_err();
        assert!(matches!(err, SyncError::Validation(ValidationError::EmptyAnswer)));
        let err = engine.add_todo(&mut m, "answer", "  ").unwrap_err();
        assert!(matches!(
            err,
            SyncError::Validation(ValidationError::EmptyQuestionNumber)
        ));

        assert_eq!(active.calls(), 0);
        assert_eq!(archived.calls(), 0);
        assert_eq!(m, Mirrors::default());
    }

    #[test]
    fn created_todo_is_visible_before_any_refresh() {
        let (active, archived) = stores();
        let engine = SyncEngine::new(&active, &archived);
        let mut m = Mirrors::default();

        let created = engine.add_todo(&mut m, "Learn X", "1").unwrap();

        assert_eq!(m.todos, vec![created]);
        assert_eq!(active.state().lists, 0);
    }

    #[test]
    fn failed_create_appends_nothing() {
        let (active, archived) = stores();
        active.state_mut().fail_create = true;
        let engine = SyncEngine::new(&active, &archived);
        let mut m = Mirrors::default();

        let err = engine.add_todo(&mut m, "Learn X", "1").unwrap_err();
        assert!(matches!(
            err,
            SyncError::Transport { op: RemoteOp::CreateActive, .. }
        ));
        assert!(m.todos.is_empty());
    }

    #[test]
    fn optimistic_record_is_replaced_by_refresh() {
        let (active, archived) = stores();
        let engine = SyncEngine::new(&active, &archived);
        let mut m = Mirrors::default();

        engine.add_todo(&mut m, "Learn X", "1").unwrap();
        // someone else removed it in the meantime
        active.state_mut().records.clear();
        engine.refresh_active(&mut m).unwrap();

        assert!(m.todos.is_empty());
    }

    #[test]
    fn complete_moves_todo_to_archive_with_new_id() {
        let (active, archived) = stores();
        let todo = active.seed(NewTodo::new("Learn X", "3"));
        let engine = SyncEngine::new(&active, &archived);
        let mut m = Mirrors::default();
        engine.refresh_all(&mut m).unwrap();

        let done = engine.complete_todo(&mut m, &todo).unwrap();

        assert!(m.todos.is_empty());
        assert_eq!(m.done_todos, vec![done.clone()]);
        assert_eq!(done.answer, "Learn X");
        assert_eq!(done.question_number, "3");
        assert!(done.archived);
        assert_ne!(done.id, todo.id);
    }

    #[test]
    fn complete_with_failed_delete_leaves_a_duplicate() {
        let (active, archived) = stores();
        let todo = active.seed(NewTodo::new("Learn X", "3"));
        active.state_mut().fail_delete = true;
        let engine = SyncEngine::new(&active, &archived);
        let mut m = Mirrors::default();

        let err = engine.complete_todo(&mut m, &todo).unwrap_err();

        assert!(matches!(
            err,
            SyncError::Transport { op: RemoteOp::DeleteActive, .. }
        ));
        assert_eq!(m.todos, vec![todo.clone()]);
        assert_eq!(m.done_todos.len(), 1);
        assert_eq!(m.done_todos[0].answer, todo.answer);
        assert_eq!(m.done_todos[0].question_number, todo.question_number);
    }

    #[test]
    fn complete_with_failed_create_never_deletes() {
        let (active, archived) = stores();
        let todo = active.seed(NewTodo::new("Learn X", "3"));
        archived.state_mut().fail_create = true;
        let engine = SyncEngine::new(&active, &archived);
        let mut m = Mirrors::default();

        let err = engine.complete_todo(&mut m, &todo).unwrap_err();

        assert!(matches!(
            err,
            SyncError::Transport { op: RemoteOp::CreateArchived, .. }
        ));
        assert_eq!(active.state().deletes, 0);
        // mirrors still refreshed after the failure
        assert_eq!(m.todos, vec![todo]);
        assert!(m.done_todos.is_empty());
    }

    #[test]
    fn completing_an_already_deleted_todo_duplicates_and_reports() {
        let (active, archived) = stores();
        let todo = active.seed(NewTodo::new("gone", "9"));
        let engine = SyncEngine::new(&active, &archived);
        let mut m = Mirrors::default();
        engine.refresh_all(&mut m).unwrap();

        engine
            .delete_todo(&mut m, &todo.id, ListKind::Active, yes)
            .unwrap();
        let err = engine.complete_todo(&mut m, &todo).unwrap_err();

        assert!(matches!(
            err,
            SyncError::Transport { op: RemoteOp::DeleteActive, .. }
        ));
        assert!(m.todos.is_empty());
        assert_eq!(m.done_todos.len(), 1);
    }

    #[test]
    fn declined_deletion_is_a_no_op() {
        let (active, archived) = stores();
        let todo = active.seed(NewTodo::new("keep me", "1"));
        let engine = SyncEngine::new(&active, &archived);
        let mut m = Mirrors::default();
        engine.refresh_all(&mut m).unwrap();
        let before = m.clone();
        let calls = active.calls() + archived.calls();

        let mut asked = None;
        let outcome = engine
            .delete_todo(&mut m, &todo.id, ListKind::Active, |prompt: &str| {
                asked = Some(prompt.to_string());
                false
            })
            .unwrap();

        assert_eq!(outcome, Deletion::Declined);
        assert!(asked.is_some());
        assert_eq!(m, before);
        assert_eq!(active.calls() + archived.calls(), calls);
    }

    #[test]
    fn deleting_archived_item_leaves_active_mirror_untouched() {
        let (active, archived) = stores();
        active.seed(NewTodo::new("one", "1"));
        active.seed(NewTodo::new("two", "2"));
        let old = archived.seed(NewArchivedTodo {
            answer: "old".into(),
            question_number: "0".into(),
            archived: true,
        });
        let engine = SyncEngine::new(&active, &archived);
        let mut m = Mirrors::default();
        engine.refresh_all(&mut m).unwrap();
        let active_before = m.todos.clone();

        let outcome = engine
            .delete_todo(&mut m, &old.id, ListKind::Archived, yes)
            .unwrap();

        assert_eq!(outcome, Deletion::Deleted);
        assert!(m.done_todos.is_empty());
        assert_eq!(m.todos, active_before);
        assert_eq!(active.state().deletes, 0);
        // both lists re-fetched even though only one changed
        assert_eq!(active.state().lists, 2);
        assert_eq!(archived.state().lists, 2);
    }

    #[test]
    fn failed_delete_keeps_mirrors() {
        let (active, archived) = stores();
        let todo = active.seed(NewTodo::new("stuck", "1"));
        let engine = SyncEngine::new(&active, &archived);
        let mut m = Mirrors::default();
        engine.refresh_all(&mut m).unwrap();
        let before = m.clone();
        active.state_mut().fail_delete = true;

        let err = engine
            .delete_todo(&mut m, &todo.id, ListKind::Active, yes)
            .unwrap_err();

        assert!(matches!(
            err,
            SyncError::Transport { op: RemoteOp::DeleteActive, .. }
        ));
        assert_eq!(m, before);
        assert_eq!(active.state().lists, 1);
    }

    #[test]
    fn failed_refresh_keeps_previous_mirror() {
        let (active, archived) = stores();
        active.seed(NewTodo::new("one", "1"));
        let engine = SyncEngine::new(&active, &archived);
        let mut m = Mirrors::default();
        engine.refresh_all(&mut m).unwrap();
        let before = m.clone();

        active.seed(NewTodo::new("two", "2"));
        active.state_mut().fail_list = true;
        archived.seed(NewArchivedTodo {
            answer: "a".into(),
            question_number: "1".into(),
            archived: true,
        });

        let err = engine.refresh_all(&mut m).unwrap_err();
        assert!(matches!(
            err,
            SyncError::Transport { op: RemoteOp::ListActive, .. }
        ));
        assert_eq!(m.todos, before.todos);
        // the other list is still attempted
        assert_eq!(m.done_todos.len(), 1);
    }

    #[test]
    fn error_messages_name_the_failing_step() {
        let (active, archived) = stores();
        archived.state_mut().fail_list = true;
        let engine = SyncEngine::new(&active, &archived);
        let err = engine.refresh_archived(&mut Mirrors::default()).unwrap_err();
        assert!(err.to_string().starts_with("Loading completed todos failed"));
        assert!(!err.is_validation());
    }
}
