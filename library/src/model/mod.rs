pub mod clip;
pub mod producer;
pub mod track;

pub use clip::{ClipModel, ClipSnapshot, MAX_FRAMES, WarpedBounds, warped_length};
pub use producer::{BinModel, Producer, ProducerLookup};
pub use track::TrackModel;

/// Identifier of a clip inside a [`crate::timeline::TimelineModel`].
pub type ClipId = usize;
/// Identifier of a track inside a [`crate::timeline::TimelineModel`].
pub type TrackId = usize;
/// Identifier of a bin entry (the source a clip plays).
pub type ProducerId = uuid::Uuid;
