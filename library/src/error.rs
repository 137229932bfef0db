use thiserror::Error;

use crate::model::{ClipId, ProducerId, TrackId};

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("Clip with ID {0} not found")]
    UnknownClip(ClipId),
    #[error("Track with ID {0} not found")]
    UnknownTrack(TrackId),
    #[error("Producer {0} not found in bin")]
    UnknownProducer(ProducerId),
    #[error("Invalid speed: {0} (must be positive and keep the clip within the frame range)")]
    InvalidSpeed(f64),
    #[error("Speed {speed} is too high for clip {clip_id} with playtime {playtime}")]
    SpeedTooHigh {
        clip_id: ClipId,
        speed: f64,
        playtime: i64,
    },
    #[error("Clip {clip_id} does not fit on track {track_id} at position {position}")]
    PlacementConflict {
        clip_id: ClipId,
        track_id: TrackId,
        position: i64,
    },
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Invalid state: {0}")]
    InvalidState(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Config parsing error: {0}")]
    Config(#[from] toml::de::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LibraryError {
    /// Whether the caller can simply report the rejection and carry on.
    ///
    /// `InvalidState` means the model was already corrupted before the call.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            LibraryError::UnknownClip(_)
                | LibraryError::UnknownTrack(_)
                | LibraryError::UnknownProducer(_)
                | LibraryError::InvalidSpeed(_)
                | LibraryError::SpeedTooHigh { .. }
                | LibraryError::PlacementConflict { .. }
                | LibraryError::InvalidArgument(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, LibraryError>;
