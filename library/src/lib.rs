//! Timeline clip model with reversible time-warp editing.
//!
//! [`TimelineModel`] owns every clip and track. Edits are requested against it
//! and extend an undo/redo pair of [`Fun`] actions that an [`UndoStack`] can
//! replay later.

pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod observer;
pub mod timeline;
pub mod undo;

pub use cli::run;
pub use config::{ConsistencyChecks, TimelineConfig};
pub use error::{LibraryError, Result};
pub use model::{BinModel, ClipId, ClipModel, Producer, ProducerId, ProducerLookup, TrackId};
pub use observer::{RecordingObserver, TimelineObserver};
pub use timeline::TimelineModel;
pub use undo::{Fun, UndoStack, noop};
