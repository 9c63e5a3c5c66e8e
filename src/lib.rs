//! Two-list todo tracker: an active list and an archive, both mirrored from
//! a remote collection store.

pub mod app;
pub mod config;
pub mod filter;
pub mod logging;
pub mod markup;
pub mod remote;
pub mod sync;
pub mod todo;

#[cfg(test)]
pub(crate) mod testing;

pub use filter::{Searchable, filter};
pub use markup::{Segment, segments};
pub use remote::{RemoteClient, RemoteCollection, TransportError};
pub use sync::{Deletion, ListKind, Mirrors, SyncEngine, SyncError, ValidationError};
pub use todo::{ArchivedTodo, NewArchivedTodo, NewTodo, RecordId, Todo};
