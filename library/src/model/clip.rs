use log::error;
use serde::{Deserialize, Serialize};

use super::{ClipId, Producer, ProducerId, TrackId};
use crate::error::{LibraryError, Result};

/// Slack used when flooring a warped source length, so that `50 / 0.1`
/// landing a hair below 500 still yields 500 frames.
const WARP_LENGTH_TOLERANCE: f64 = 1e-6;

/// Upper bound for clip lengths, frame offsets and timeline positions.
pub const MAX_FRAMES: i64 = 1 << 40;

/// A placed or unplaced instance of a producer.
///
/// `in_frame`/`out_frame` are expressed in the frame units of the producer
/// as played at `speed`, so the playtime is simply `out - in + 1`.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct ClipModel {
    id: ClipId,
    producer_id: ProducerId,
    /// Native length of the producer, in unwarped frames.
    native_length: i64,
    in_frame: i64,
    out_frame: i64,
    #[serde(default = "default_speed")]
    speed: f64,
    #[serde(default)]
    track_id: Option<TrackId>,
    #[serde(default)]
    position: i64,
    #[serde(default)]
    pub(crate) endless_resize: bool,
}

/// In/out/speed state captured for undo.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Debug)]
pub struct ClipSnapshot {
    pub in_frame: i64,
    pub out_frame: i64,
    pub speed: f64,
}

/// Result of planning a speed change, computed before anything is mutated.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct WarpedBounds {
    pub in_frame: i64,
    pub out_frame: i64,
    pub speed: f64,
}

impl WarpedBounds {
    pub fn playtime(&self) -> i64 {
        self.out_frame - self.in_frame + 1
    }
}

impl ClipModel {
    /// Create an orphan clip spanning the whole producer at normal speed.
    pub fn new(id: ClipId, producer: &Producer, endless_resize: bool) -> Result<Self> {
        if producer.length < 1 || producer.length > MAX_FRAMES {
            return Err(LibraryError::InvalidArgument(format!(
                "Producer {} has an unusable length {}",
                producer.id, producer.length
            )));
        }
        Ok(Self {
            id,
            producer_id: producer.id,
            native_length: producer.length,
            in_frame: 0,
            out_frame: producer.length - 1,
            speed: default_speed(),
            track_id: None,
            position: 0,
            endless_resize: endless_resize || producer.endless,
        })
    }

    pub fn id(&self) -> ClipId {
        self.id
    }

    pub fn producer_id(&self) -> ProducerId {
        self.producer_id
    }

    pub fn native_length(&self) -> i64 {
        self.native_length
    }

    pub fn get_in(&self) -> i64 {
        self.in_frame
    }

    pub fn get_out(&self) -> i64 {
        self.out_frame
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn track_id(&self) -> Option<TrackId> {
        self.track_id
    }

    pub fn position(&self) -> i64 {
        self.position
    }

    pub fn is_endless(&self) -> bool {
        self.endless_resize
    }

    /// Number of frames the clip occupies on the timeline.
    pub fn playtime(&self) -> Result<i64> {
        if self.in_frame > self.out_frame {
            error!(
                "Clip {} has in {} past out {}",
                self.id, self.in_frame, self.out_frame
            );
            return Err(LibraryError::InvalidState(format!(
                "clip {} has in point {} after out point {}",
                self.id, self.in_frame, self.out_frame
            )));
        }
        Ok(self.out_frame - self.in_frame + 1)
    }

    /// Length the producer plays for at the current speed (at least one
    /// frame), `None` when the clip may be stretched without limit.
    pub fn max_duration(&self) -> Option<i64> {
        if self.endless_resize {
            None
        } else {
            Some(warped_length(self.native_length, self.speed).max(1))
        }
    }

    pub fn snapshot(&self) -> ClipSnapshot {
        ClipSnapshot {
            in_frame: self.in_frame,
            out_frame: self.out_frame,
            speed: self.speed,
        }
    }

    pub(crate) fn restore(&mut self, snapshot: ClipSnapshot) {
        self.set_in_out(snapshot.in_frame, snapshot.out_frame);
        self.speed = snapshot.speed;
    }

    /// Caller guarantees `out >= in`.
    pub(crate) fn set_in_out(&mut self, in_frame: i64, out_frame: i64) {
        debug_assert!(
            out_frame >= in_frame,
            "clip {} would have playtime below one frame",
            self.id
        );
        self.in_frame = in_frame;
        self.out_frame = out_frame;
    }

    pub(crate) fn set_placement(&mut self, track_id: Option<TrackId>, position: i64) {
        self.track_id = track_id;
        self.position = position;
    }

    /// Compute the in/out a speed change would produce without touching the clip.
    ///
    /// The requested playtime is `round(playtime * speed / new_speed)`. Bounded
    /// clips are further capped to the warped producer length, and the rescaled
    /// in point is pulled back when it would leave fewer frames than that.
    /// Anything under one frame is rejected, as is a warp that would not fit
    /// in [`MAX_FRAMES`].
    pub fn plan_time_warp(&self, new_speed: f64) -> Result<WarpedBounds> {
        if !new_speed.is_finite() || new_speed <= 0.0 {
            return Err(LibraryError::InvalidSpeed(new_speed));
        }
        let playtime = self.playtime()?;
        let ratio = self.speed / new_speed;

        let requested = (playtime as f64 * ratio).round();
        if requested < 1.0 {
            return Err(LibraryError::SpeedTooHigh {
                clip_id: self.id,
                speed: new_speed,
                playtime,
            });
        }
        let scaled_in = (self.in_frame as f64 * ratio).round();
        if scaled_in + requested > MAX_FRAMES as f64 {
            return Err(LibraryError::InvalidSpeed(new_speed));
        }

        let mut in_frame = scaled_in as i64;
        let mut new_playtime = requested as i64;
        if !self.endless_resize {
            let available = warped_length(self.native_length, new_speed).max(1);
            new_playtime = new_playtime.min(available);
            in_frame = in_frame.min(available - new_playtime);
        }

        Ok(WarpedBounds {
            in_frame,
            out_frame: in_frame + new_playtime - 1,
            speed: new_speed,
        })
    }

    pub(crate) fn apply_bounds(&mut self, bounds: WarpedBounds) {
        self.set_in_out(bounds.in_frame, bounds.out_frame);
        self.speed = bounds.speed;
    }
}

/// Frames a producer of `native_length` lasts when played at `speed`.
pub fn warped_length(native_length: i64, speed: f64) -> i64 {
    (native_length as f64 / speed + WARP_LENGTH_TOLERANCE).floor() as i64
}

const fn default_speed() -> f64 {
    1.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounded_clip(length: i64) -> ClipModel {
        ClipModel::new(0, &Producer::new("blue", length), false).unwrap()
    }

    #[test]
    fn test_new_clip_spans_producer() {
        let clip = bounded_clip(50);
        assert_eq!(clip.get_in(), 0);
        assert_eq!(clip.get_out(), 49);
        assert_eq!(clip.playtime().unwrap(), 50);
        assert_eq!(clip.speed(), 1.0);
        assert_eq!(clip.track_id(), None);
        assert_eq!(clip.max_duration(), Some(50));
    }

    #[test]
    fn test_empty_producer_is_rejected() {
        let result = ClipModel::new(0, &Producer::new("empty", 0), false);
        assert!(matches!(result, Err(LibraryError::InvalidArgument(_))));
    }

    #[test]
    fn test_endless_producer_forces_endless_resize() {
        let clip = ClipModel::new(0, &Producer::endless("red", 20), false).unwrap();
        assert!(clip.is_endless());
        assert_eq!(clip.max_duration(), None);
    }

    #[test]
    fn test_plan_slow_motion() {
        let clip = bounded_clip(50);
        let bounds = clip.plan_time_warp(0.5).unwrap();
        assert_eq!(bounds.in_frame, 0);
        assert_eq!(bounds.playtime(), 100);
        assert_eq!(bounds.speed, 0.5);
    }

    #[test]
    fn test_plan_truncates_to_warped_producer() {
        // round(7 / 1.2) would be 6, but the producer only lasts 5 frames.
        let clip = bounded_clip(7);
        assert_eq!(clip.plan_time_warp(1.2).unwrap().playtime(), 5);

        let mut endless = bounded_clip(7);
        endless.endless_resize = true;
        assert_eq!(endless.plan_time_warp(1.2).unwrap().playtime(), 6);
    }

    #[test]
    fn test_plan_rescales_in_point() {
        let mut clip = bounded_clip(100);
        clip.set_in_out(20, 39);
        let bounds = clip.plan_time_warp(2.0).unwrap();
        assert_eq!(bounds.in_frame, 10);
        assert_eq!(bounds.out_frame, 19);
    }

    #[test]
    fn test_plan_rejects_invalid_speed() {
        let clip = bounded_clip(10);
        for speed in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                clip.plan_time_warp(speed),
                Err(LibraryError::InvalidSpeed(_))
            ));
        }
    }

    #[test]
    fn test_plan_boundary() {
        let clip = bounded_clip(40);
        assert_eq!(clip.plan_time_warp(40.0).unwrap().playtime(), 1);
        assert!(matches!(
            clip.plan_time_warp(400.0),
            Err(LibraryError::SpeedTooHigh { playtime: 40, .. })
        ));
    }

    #[test]
    fn test_plan_pulls_back_trimmed_in_point() {
        let mut clip = bounded_clip(10);
        clip.set_in_out(9, 9);
        let bounds = clip.plan_time_warp(1.5).unwrap();
        assert_eq!(bounds.playtime(), 1);
        assert_eq!(bounds.in_frame, 5);
        assert!(bounds.out_frame < warped_length(10, 1.5));
    }

    #[test]
    fn test_plan_keeps_one_frame_of_short_source() {
        // One source frame at 1.5x lasts under a frame but still plays once.
        let clip = bounded_clip(1);
        let bounds = clip.plan_time_warp(1.5).unwrap();
        assert_eq!((bounds.in_frame, bounds.out_frame), (0, 0));
    }

    #[test]
    fn test_plan_rejects_out_of_range_warp() {
        let clip = bounded_clip(10);
        assert!(matches!(
            clip.plan_time_warp(1e-300),
            Err(LibraryError::InvalidSpeed(_))
        ));

        let mut endless = bounded_clip(10);
        endless.endless_resize = true;
        endless.set_in_out(4, 9);
        assert!(matches!(
            endless.plan_time_warp(f64::MIN_POSITIVE),
            Err(LibraryError::InvalidSpeed(_))
        ));
    }

    #[test]
    fn test_playtime_reports_invalid_state() {
        let mut clip = bounded_clip(10);
        clip.in_frame = 8;
        clip.out_frame = 2;
        assert!(matches!(clip.playtime(), Err(LibraryError::InvalidState(_))));
    }

    #[test]
    fn test_snapshot_restore_is_exact() {
        let mut clip = bounded_clip(30);
        let before = clip.snapshot();
        clip.apply_bounds(clip.plan_time_warp(0.3).unwrap());
        assert_ne!(clip.snapshot(), before);
        clip.restore(before);
        assert_eq!(clip.snapshot(), before);
        assert_eq!(clip.speed(), 1.0);
    }

    #[test]
    fn test_warped_length() {
        assert_eq!(warped_length(50, 0.1), 500);
        assert_eq!(warped_length(7, 1.2), 5);
        assert_eq!(warped_length(33, 33.0), 1);
    }
}
