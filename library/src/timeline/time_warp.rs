use log::{debug, warn};

use super::{TimelineModel, notifier};
use crate::error::{LibraryError, Result};
use crate::model::{ClipId, MAX_FRAMES};
use crate::undo::{Fun, noop, push_back};

impl TimelineModel {
    /// Change the playback speed of a clip, and with it its duration.
    ///
    /// The new playtime is `round(playtime * old_speed / speed)`, capped to the
    /// warped producer length for bounded clips. Requests that would leave less
    /// than one frame fail with [`LibraryError::SpeedTooHigh`].
    ///
    /// For a placed clip that grows into its right neighbour, `keep_placement`
    /// decides between rejecting with [`LibraryError::PlacementConflict`] and
    /// shifting every later clip on the track by the overlap. Orphan clips skip
    /// placement entirely.
    ///
    /// On failure nothing is modified and `undo`/`redo` are left as they were.
    /// On success they are extended so that `undo` restores the exact prior
    /// in/out/speed and positions, and `redo` recomputes the warp.
    pub fn request_clip_time_warp(
        &mut self,
        clip_id: ClipId,
        speed: f64,
        keep_placement: bool,
        announce: bool,
        undo: &mut Fun,
        redo: &mut Fun,
    ) -> Result<()> {
        let result = self.try_clip_time_warp(clip_id, speed, keep_placement, announce, undo, redo);
        if let Err(e) = &result {
            warn!("Time warp of clip {} to speed {} rejected: {}", clip_id, speed, e);
        }
        result
    }

    fn try_clip_time_warp(
        &mut self,
        clip_id: ClipId,
        speed: f64,
        keep_placement: bool,
        announce: bool,
        undo: &mut Fun,
        redo: &mut Fun,
    ) -> Result<()> {
        let clip = self.clip_ref(clip_id)?;
        let old_speed = clip.speed();
        let old_playtime = clip.playtime()?;
        let snapshot = clip.snapshot();
        let bounds = clip.plan_time_warp(speed)?;
        let new_playtime = bounds.playtime();

        // Later clips that have to make room, and by how much.
        let mut displaced = None;
        if let Some(track_id) = clip.track_id() {
            let position = clip.position();
            if position + new_playtime > MAX_FRAMES {
                return Err(LibraryError::InvalidSpeed(speed));
            }
            let track = self.track_ref(track_id)?;
            if let Some((next_position, _)) = track.next_after(position) {
                let overlap = position + new_playtime - next_position;
                if overlap > 0 {
                    if keep_placement {
                        return Err(LibraryError::PlacementConflict {
                            clip_id,
                            track_id,
                            position,
                        });
                    }
                    let later: Vec<ClipId> = track
                        .clips_after(position)
                        .into_iter()
                        .map(|(_, id)| id)
                        .collect();
                    if let Some(&last) = later.last() {
                        let last = self.clip_ref(last)?;
                        if last.position() + last.playtime()? + overlap > MAX_FRAMES {
                            return Err(LibraryError::PlacementConflict {
                                clip_id,
                                track_id,
                                position,
                            });
                        }
                    }
                    displaced = Some((track_id, later, overlap));
                }
            }
        }

        let mut local_undo = noop();
        let mut local_redo = noop();
        if let Some((track_id, later, overlap)) = displaced {
            let restore = later.clone();
            self.apply_step(
                Box::new(move |tl: &mut TimelineModel| tl.shift_clips(track_id, &later, overlap)),
                Box::new(move |tl: &mut TimelineModel| {
                    tl.shift_clips(track_id, &restore, -overlap)
                }),
                &mut local_undo,
                &mut local_redo,
            )?;
        }
        self.apply_step(
            Box::new(move |tl: &mut TimelineModel| tl.warp_clip(clip_id, speed)),
            Box::new(move |tl: &mut TimelineModel| tl.restore_clip(clip_id, snapshot)),
            &mut local_undo,
            &mut local_redo,
        )?;
        if announce {
            push_back(notifier(clip_id), &mut local_undo);
            push_back(notifier(clip_id), &mut local_redo);
            self.notify_clip_changed(clip_id);
        }

        debug!(
            "Clip {} warped: speed {} -> {}, playtime {} -> {}",
            clip_id, old_speed, speed, old_playtime, new_playtime
        );
        self.commit(local_undo, local_redo, undo, redo);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::config::TimelineConfig;
    use crate::error::LibraryError;
    use crate::model::{BinModel, Producer};
    use crate::timeline::TimelineModel;
    use crate::undo::noop;

    #[test]
    fn test_failed_warp_leaves_actions_untouched() {
        let mut bin = BinModel::new();
        let producer = bin.add_producer(Producer::new("blue", 10));
        let mut timeline = TimelineModel::new(TimelineConfig::default());
        let clip = timeline.construct_clip(&bin, producer, None).unwrap();

        let mut undo = noop();
        let mut redo = noop();
        let result =
            timeline.request_clip_time_warp(clip, 100.0, false, false, &mut undo, &mut redo);
        assert!(matches!(result, Err(LibraryError::SpeedTooHigh { .. })));

        // The pair is still the identity.
        assert!(redo(&mut timeline));
        assert_eq!(timeline.clip_speed(clip).unwrap(), 1.0);
        assert_eq!(timeline.clip_playtime(clip).unwrap(), 10);
    }

    #[test]
    fn test_unknown_clip() {
        let mut timeline = TimelineModel::default();
        let mut undo = noop();
        let mut redo = noop();
        assert!(matches!(
            timeline.request_clip_time_warp(7, 2.0, true, false, &mut undo, &mut redo),
            Err(LibraryError::UnknownClip(7))
        ));
    }
}
