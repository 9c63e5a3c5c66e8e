// In-memory stand-in for a remote collection, for engine and app tests.

use crate::remote::{RemoteCollection, TransportError};
use crate::todo::{ArchivedTodo, NewArchivedTodo, NewTodo, RecordId, Todo};
use std::cell::{Ref, RefCell, RefMut};

/// Records that can be built the way a store builds them from a posted body.
pub trait Stored: Clone {
    type Draft;

    fn id(&self) -> &RecordId;
    fn from_draft(draft: &Self::Draft, id: RecordId) -> Self;
}

impl Stored for Todo {
    type Draft = NewTodo;

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn from_draft(draft: &NewTodo, id: RecordId) -> Self {
        Todo {
            id,
            question: Some(draft.question.clone()),
            question_number: draft.question_number.clone(),
            answer: draft.answer.clone(),
        }
    }
}

impl Stored for ArchivedTodo {
    type Draft = NewArchivedTodo;

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn from_draft(draft: &NewArchivedTodo, id: RecordId) -> Self {
        ArchivedTodo {
            id,
            question: None,
            question_number: draft.question_number.clone(),
            answer: draft.answer.clone(),
            archived: draft.archived,
        }
    }
}

pub struct MemoryState<R> {
    pub records: Vec<R>,
    next_id: u64,
    pub lists: usize,
    pub creates: usize,
    pub deletes: usize,
    pub fail_list: bool,
    pub fail_create: bool,
    pub fail_delete: bool,
}

pub struct MemoryCollection<R> {
    name: &'static str,
    state: RefCell<MemoryState<R>>,
}

impl<R: Stored> MemoryCollection<R> {
    /// Ids are handed out counting up from `first_id`.
    pub fn new(name: &'static str, first_id: u64) -> Self {
        Self {
            name,
            state: RefCell::new(MemoryState {
                records: Vec::new(),
                next_id: first_id,
                lists: 0,
                creates: 0,
                deletes: 0,
                fail_list: false,
                fail_create: false,
                fail_delete: false,
            }),
        }
    }

    /// Stores a record directly, without counting it as a call.
    pub fn seed(&self, draft: R::Draft) -> R {
        let mut st = self.state.borrow_mut();
        let id = RecordId::new(st.next_id.to_string());
        st.next_id += 1;
        let record = R::from_draft(&draft, id);
        st.records.push(record.clone());
        record
    }

    pub fn state(&self) -> Ref<'_, MemoryState<R>> {
        self.state.borrow()
    }

    pub fn state_mut(&self) -> RefMut<'_, MemoryState<R>> {
        self.state.borrow_mut()
    }

    /// Remote calls made so far.
    pub fn calls(&self) -> usize {
        let st = self.state.borrow();
        st.lists + st.creates + st.deletes
    }

    fn failure(&self, method: &'static str, status: u16) -> TransportError {
        TransportError::Status {
            method,
            url: format!("memory://{}", self.name),
            status,
            body: "injected failure".to_string(),
        }
    }
}

impl<R: Stored> RemoteCollection for MemoryCollection<R> {
    type Record = R;
    type Draft = R::Draft;

    fn name(&self) -> &str {
        self.name
    }

    fn list(&self) -> Result<Vec<R>, TransportError> {
        let mut st = self.state.borrow_mut();
        st.lists += 1;
        if st.fail_list {
            return Err(self.failure("GET", 500));
        }
        Ok(st.records.clone())
    }

    fn create(&self, draft: &R::Draft) -> Result<R, TransportError> {
        let mut st = self.state.borrow_mut();
        st.creates += 1;
        if st.fail_create {
            return Err(self.failure("POST", 500));
        }
        let id = RecordId::new(st.next_id.to_string());
        st.next_id += 1;
        let record = R::from_draft(draft, id);
        st.records.push(record.clone());
        Ok(record)
    }

    fn delete(&self, id: &RecordId) -> Result<(), TransportError> {
        let mut st = self.state.borrow_mut();
        st.deletes += 1;
        if st.fail_delete {
            return Err(self.failure("DELETE", 500));
        }
        let before = st.records.len();
        st.records.retain(|r| r.id() != id);
        if st.records.len() == before {
            return Err(self.failure("DELETE", 404));
        }
        Ok(())
    }
}
