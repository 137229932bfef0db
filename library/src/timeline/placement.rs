use log::{debug, warn};

use super::{TimelineModel, notifier};
use crate::error::{LibraryError, Result};
use crate::model::{
    ClipId, ClipModel, MAX_FRAMES, ProducerId, ProducerLookup, TrackId, TrackModel,
};
use crate::undo::{Fun, noop, push_back};

/// Track, placement and trimming edits.
impl TimelineModel {
    /// Insert a new empty track at `index` (appended when `None`).
    pub fn request_track_insertion(
        &mut self,
        index: Option<usize>,
        undo: &mut Fun,
        redo: &mut Fun,
    ) -> Result<TrackId> {
        let index = index.unwrap_or(self.tracks.len());
        if index > self.tracks.len() {
            return Err(LibraryError::InvalidArgument(format!(
                "Track index {} out of range ({} tracks)",
                index,
                self.tracks.len()
            )));
        }
        let track_id = self.next_id;
        self.next_id += 1;

        let mut local_undo = noop();
        let mut local_redo = noop();
        self.apply_step(
            Box::new(move |tl: &mut TimelineModel| {
                tl.insert_track(index, TrackModel::new(track_id))
            }),
            Box::new(move |tl: &mut TimelineModel| tl.take_track(track_id)),
            &mut local_undo,
            &mut local_redo,
        )?;
        debug!("Inserted track {} at index {}", track_id, index);
        self.commit(local_undo, local_redo, undo, redo);
        Ok(track_id)
    }

    /// Remove an empty track.
    pub fn request_track_deletion(
        &mut self,
        track_id: TrackId,
        undo: &mut Fun,
        redo: &mut Fun,
    ) -> Result<()> {
        let index = self
            .track_index(track_id)
            .ok_or(LibraryError::UnknownTrack(track_id))?;
        if !self.tracks[index].is_empty() {
            return Err(LibraryError::InvalidArgument(format!(
                "Track {} still holds {} clips",
                track_id,
                self.tracks[index].len()
            )));
        }

        let mut local_undo = noop();
        let mut local_redo = noop();
        self.apply_step(
            Box::new(move |tl: &mut TimelineModel| tl.take_track(track_id)),
            Box::new(move |tl: &mut TimelineModel| {
                tl.insert_track(index, TrackModel::new(track_id))
            }),
            &mut local_undo,
            &mut local_redo,
        )?;
        debug!("Removed track {}", track_id);
        self.commit(local_undo, local_redo, undo, redo);
        Ok(())
    }

    /// Place a clip at `position` on `track_id`. An orphan gets placed, a placed
    /// clip is moved (possibly across tracks).
    pub fn request_clip_move(
        &mut self,
        clip_id: ClipId,
        track_id: TrackId,
        position: i64,
        undo: &mut Fun,
        redo: &mut Fun,
    ) -> Result<()> {
        let result = self.try_clip_move(clip_id, track_id, position, undo, redo);
        if let Err(e) = &result {
            warn!("Move of clip {} rejected: {}", clip_id, e);
        }
        result
    }

    fn try_clip_move(
        &mut self,
        clip_id: ClipId,
        track_id: TrackId,
        position: i64,
        undo: &mut Fun,
        redo: &mut Fun,
    ) -> Result<()> {
        let clip = self.clip_ref(clip_id)?;
        let playtime = clip.playtime()?;
        let previous = clip.track_id().map(|t| (t, clip.position()));
        self.track_ref(track_id)?;
        if position < 0 || position > MAX_FRAMES - playtime {
            return Err(LibraryError::InvalidArgument(format!(
                "Clip position {} is out of range",
                position
            )));
        }
        if previous == Some((track_id, position)) {
            return Ok(());
        }
        if !self.range_is_free(track_id, position, position + playtime, Some(clip_id))? {
            return Err(LibraryError::PlacementConflict {
                clip_id,
                track_id,
                position,
            });
        }

        let mut local_undo = noop();
        let mut local_redo = noop();
        if let Some((old_track, old_position)) = previous {
            self.apply_step(
                Box::new(move |tl: &mut TimelineModel| tl.unplace_clip(clip_id)),
                Box::new(move |tl: &mut TimelineModel| {
                    tl.place_clip(clip_id, old_track, old_position)
                }),
                &mut local_undo,
                &mut local_redo,
            )?;
        }
        self.apply_step(
            Box::new(move |tl: &mut TimelineModel| tl.place_clip(clip_id, track_id, position)),
            Box::new(move |tl: &mut TimelineModel| tl.unplace_clip(clip_id)),
            &mut local_undo,
            &mut local_redo,
        )?;
        push_back(notifier(clip_id), &mut local_undo);
        push_back(notifier(clip_id), &mut local_redo);
        self.notify_clip_changed(clip_id);

        debug!(
            "Moved clip {} from {:?} to track {} at {}",
            clip_id, previous, track_id, position
        );
        self.commit(local_undo, local_redo, undo, redo);
        Ok(())
    }

    /// Take a clip off its track; it stays in the registry as an orphan.
    pub fn request_clip_removal(
        &mut self,
        clip_id: ClipId,
        undo: &mut Fun,
        redo: &mut Fun,
    ) -> Result<()> {
        let clip = self.clip_ref(clip_id)?;
        let Some(track_id) = clip.track_id() else {
            return Err(LibraryError::InvalidArgument(format!(
                "Clip {} is not on a track",
                clip_id
            )));
        };
        let position = clip.position();

        let mut local_undo = noop();
        let mut local_redo = noop();
        self.apply_step(
            Box::new(move |tl: &mut TimelineModel| tl.unplace_clip(clip_id)),
            Box::new(move |tl: &mut TimelineModel| tl.place_clip(clip_id, track_id, position)),
            &mut local_undo,
            &mut local_redo,
        )?;
        debug!("Removed clip {} from track {}", clip_id, track_id);
        self.commit(local_undo, local_redo, undo, redo);
        Ok(())
    }

    /// Construct a clip and place it, as one undoable edit.
    pub fn request_clip_insertion(
        &mut self,
        bin: &dyn ProducerLookup,
        producer_id: ProducerId,
        track_id: TrackId,
        position: i64,
        undo: &mut Fun,
        redo: &mut Fun,
    ) -> Result<ClipId> {
        let producer = bin
            .producer(producer_id)
            .ok_or(LibraryError::UnknownProducer(producer_id))?;
        let clip = ClipModel::new(self.next_id, producer, self.config.endless_resize)?;
        let clip_id = clip.id();
        let playtime = clip.playtime()?;
        self.track_ref(track_id)?;
        if position < 0 || position > MAX_FRAMES - playtime {
            return Err(LibraryError::InvalidArgument(format!(
                "Clip position {} is out of range",
                position
            )));
        }
        if !self.range_is_free(track_id, position, position + playtime, None)? {
            return Err(LibraryError::PlacementConflict {
                clip_id,
                track_id,
                position,
            });
        }
        self.next_id += 1;

        let mut local_undo = noop();
        let mut local_redo = noop();
        self.apply_step(
            Box::new(move |tl: &mut TimelineModel| tl.insert_clip_model(clip.clone())),
            Box::new(move |tl: &mut TimelineModel| tl.take_clip(clip_id).is_some()),
            &mut local_undo,
            &mut local_redo,
        )?;
        self.apply_step(
            Box::new(move |tl: &mut TimelineModel| tl.place_clip(clip_id, track_id, position)),
            Box::new(move |tl: &mut TimelineModel| tl.unplace_clip(clip_id)),
            &mut local_undo,
            &mut local_redo,
        )?;
        debug!(
            "Inserted clip {} on track {} at {}",
            clip_id, track_id, position
        );
        self.commit(local_undo, local_redo, undo, redo);
        Ok(clip_id)
    }

    /// Remove a clip from the registry. Undo brings it back with the same id.
    pub fn request_clip_deletion(
        &mut self,
        clip_id: ClipId,
        undo: &mut Fun,
        redo: &mut Fun,
    ) -> Result<()> {
        let clip = self.clip_ref(clip_id)?;
        let placement = clip.track_id().map(|t| (t, clip.position()));
        let mut orphan = clip.clone();
        orphan.set_placement(None, 0);

        let mut local_undo = noop();
        let mut local_redo = noop();
        if let Some((track_id, position)) = placement {
            self.apply_step(
                Box::new(move |tl: &mut TimelineModel| tl.unplace_clip(clip_id)),
                Box::new(move |tl: &mut TimelineModel| tl.place_clip(clip_id, track_id, position)),
                &mut local_undo,
                &mut local_redo,
            )?;
        }
        self.apply_step(
            Box::new(move |tl: &mut TimelineModel| tl.take_clip(clip_id).is_some()),
            Box::new(move |tl: &mut TimelineModel| tl.insert_clip_model(orphan.clone())),
            &mut local_undo,
            &mut local_redo,
        )?;
        debug!("Deleted clip {}", clip_id);
        self.commit(local_undo, local_redo, undo, redo);
        Ok(())
    }

    /// Trim a clip to `size` frames, keeping its right edge (`from_right ==
    /// false`) or its left edge (`from_right == true`) in place.
    pub fn request_clip_resize(
        &mut self,
        clip_id: ClipId,
        size: i64,
        from_right: bool,
        undo: &mut Fun,
        redo: &mut Fun,
    ) -> Result<()> {
        let result = self.try_clip_resize(clip_id, size, from_right, undo, redo);
        if let Err(e) = &result {
            warn!("Resize of clip {} rejected: {}", clip_id, e);
        }
        result
    }

    fn try_clip_resize(
        &mut self,
        clip_id: ClipId,
        size: i64,
        from_right: bool,
        undo: &mut Fun,
        redo: &mut Fun,
    ) -> Result<()> {
        if !(1..=MAX_FRAMES).contains(&size) {
            return Err(LibraryError::InvalidArgument(format!(
                "Clip size must be between one frame and {}, got {}",
                MAX_FRAMES, size
            )));
        }
        let clip = self.clip_ref(clip_id)?;
        let playtime = clip.playtime()?;
        let snapshot = clip.snapshot();
        let placement = clip.track_id().map(|t| (t, clip.position()));
        let (in_frame, out_frame) = if from_right {
            (clip.get_in(), clip.get_in() + size - 1)
        } else {
            (clip.get_out() - size + 1, clip.get_out())
        };
        let exceeds_source = clip.max_duration().is_some_and(|max| out_frame >= max);
        if in_frame < 0 || exceeds_source {
            return Err(LibraryError::InvalidArgument(format!(
                "Clip {} cannot be resized to {} frames",
                clip_id, size
            )));
        }
        if size == playtime {
            return Ok(());
        }
        let new_placement = placement.map(|(track_id, position)| {
            let new_position = if from_right {
                position
            } else {
                position + playtime - size
            };
            (track_id, new_position)
        });
        if let Some((track_id, position)) = new_placement {
            let end = position + size;
            if position < 0 || !self.range_is_free(track_id, position, end, Some(clip_id))? {
                return Err(LibraryError::PlacementConflict {
                    clip_id,
                    track_id,
                    position,
                });
            }
        }

        let mut local_undo = noop();
        let mut local_redo = noop();
        if let Some((track_id, position)) = placement {
            self.apply_step(
                Box::new(move |tl: &mut TimelineModel| tl.unplace_clip(clip_id)),
                Box::new(move |tl: &mut TimelineModel| tl.place_clip(clip_id, track_id, position)),
                &mut local_undo,
                &mut local_redo,
            )?;
        }
        let mut resized = snapshot;
        resized.in_frame = in_frame;
        resized.out_frame = out_frame;
        self.apply_step(
            Box::new(move |tl: &mut TimelineModel| tl.restore_clip(clip_id, resized)),
            Box::new(move |tl: &mut TimelineModel| tl.restore_clip(clip_id, snapshot)),
            &mut local_undo,
            &mut local_redo,
        )?;
        if let Some((track_id, position)) = new_placement {
            self.apply_step(
                Box::new(move |tl: &mut TimelineModel| tl.place_clip(clip_id, track_id, position)),
                Box::new(move |tl: &mut TimelineModel| tl.unplace_clip(clip_id)),
                &mut local_undo,
                &mut local_redo,
            )?;
        }
        push_back(notifier(clip_id), &mut local_undo);
        push_back(notifier(clip_id), &mut local_redo);
        self.notify_clip_changed(clip_id);

        debug!(
            "Resized clip {}: playtime {} -> {}",
            clip_id, playtime, size
        );
        self.commit(local_undo, local_redo, undo, redo);
        Ok(())
    }
}
