//! The timeline registry: sole owner of clips and tracks.
//!
//! Mutations go through `request_*` methods which validate first, then apply
//! the edit and extend the caller's undo/redo pair. The `pub(crate)`
//! primitives below are what those actions replay; they return false instead
//! of failing so they can be chained inside a [`Fun`].

mod consistency;
mod placement;
mod time_warp;

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use log::{debug, error};

use crate::config::TimelineConfig;
use crate::error::{LibraryError, Result};
use crate::model::{
    ClipId, ClipModel, ClipSnapshot, ProducerId, ProducerLookup, TrackId, TrackModel,
};
use crate::observer::TimelineObserver;
use crate::undo::{Fun, update_undo_redo};

pub struct TimelineModel {
    config: TimelineConfig,
    clips: BTreeMap<ClipId, ClipModel>,
    /// Ordered top to bottom.
    tracks: Vec<TrackModel>,
    /// Shared by clips and tracks; ids are never reused.
    next_id: usize,
    observer: Option<Rc<dyn TimelineObserver>>,
}

impl fmt::Debug for TimelineModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimelineModel")
            .field("clips", &self.clips)
            .field("tracks", &self.tracks)
            .field("next_id", &self.next_id)
            .finish_non_exhaustive()
    }
}

impl Default for TimelineModel {
    fn default() -> Self {
        Self::new(TimelineConfig::default())
    }
}

impl TimelineModel {
    pub fn new(config: TimelineConfig) -> Self {
        Self {
            config,
            clips: BTreeMap::new(),
            tracks: Vec::new(),
            next_id: 0,
            observer: None,
        }
    }

    pub fn config(&self) -> &TimelineConfig {
        &self.config
    }

    pub fn set_observer(&mut self, observer: Rc<dyn TimelineObserver>) {
        self.observer = Some(observer);
    }

    /// Create an orphan clip playing the whole producer, then place it if
    /// `placement` is given. Construction itself is not recorded for undo.
    pub fn construct_clip(
        &mut self,
        bin: &dyn ProducerLookup,
        producer_id: ProducerId,
        placement: Option<(TrackId, i64)>,
    ) -> Result<ClipId> {
        let producer = bin
            .producer(producer_id)
            .ok_or(LibraryError::UnknownProducer(producer_id))?;
        let id = self.next_id;
        let clip = ClipModel::new(id, producer, self.config.endless_resize)?;
        self.next_id += 1;
        self.clips.insert(id, clip);
        debug!("Constructed clip {} from producer {}", id, producer_id);

        if let Some((track_id, position)) = placement {
            let mut undo = crate::undo::noop();
            let mut redo = crate::undo::noop();
            if let Err(e) = self.request_clip_move(id, track_id, position, &mut undo, &mut redo) {
                self.clips.remove(&id);
                return Err(e);
            }
        }
        Ok(id)
    }

    /// Switch between bounded and endless resizing. Not an undoable edit.
    pub fn set_clip_endless_resize(&mut self, clip_id: ClipId, endless: bool) -> Result<()> {
        let clip = self
            .clips
            .get_mut(&clip_id)
            .ok_or(LibraryError::UnknownClip(clip_id))?;
        clip.endless_resize = endless;
        Ok(())
    }

    // --- Queries ---

    pub fn clip(&self, clip_id: ClipId) -> Option<&ClipModel> {
        self.clips.get(&clip_id)
    }

    pub fn contains_clip(&self, clip_id: ClipId) -> bool {
        self.clips.contains_key(&clip_id)
    }

    pub fn clip_count(&self) -> usize {
        self.clips.len()
    }

    pub fn clip_ids(&self) -> Vec<ClipId> {
        self.clips.keys().copied().collect()
    }

    pub fn clip_playtime(&self, clip_id: ClipId) -> Result<i64> {
        self.clip_ref(clip_id)?.playtime()
    }

    pub fn clip_speed(&self, clip_id: ClipId) -> Result<f64> {
        Ok(self.clip_ref(clip_id)?.speed())
    }

    /// `None` for orphan clips.
    pub fn clip_track_id(&self, clip_id: ClipId) -> Result<Option<TrackId>> {
        Ok(self.clip_ref(clip_id)?.track_id())
    }

    /// `None` for orphan clips.
    pub fn clip_position(&self, clip_id: ClipId) -> Result<Option<i64>> {
        let clip = self.clip_ref(clip_id)?;
        Ok(clip.track_id().map(|_| clip.position()))
    }

    pub fn clip_in(&self, clip_id: ClipId) -> Result<i64> {
        Ok(self.clip_ref(clip_id)?.get_in())
    }

    pub fn clip_out(&self, clip_id: ClipId) -> Result<i64> {
        Ok(self.clip_ref(clip_id)?.get_out())
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    pub fn track_ids(&self) -> Vec<TrackId> {
        self.tracks.iter().map(TrackModel::id).collect()
    }

    pub fn contains_track(&self, track_id: TrackId) -> bool {
        self.track_index(track_id).is_some()
    }

    /// Clip ids on a track in timeline order.
    pub fn track_clip_ids(&self, track_id: TrackId) -> Result<Vec<ClipId>> {
        Ok(self.track_ref(track_id)?.clip_ids())
    }

    fn clip_ref(&self, clip_id: ClipId) -> Result<&ClipModel> {
        self.clips
            .get(&clip_id)
            .ok_or(LibraryError::UnknownClip(clip_id))
    }

    fn track_index(&self, track_id: TrackId) -> Option<usize> {
        self.tracks.iter().position(|t| t.id() == track_id)
    }

    fn track_ref(&self, track_id: TrackId) -> Result<&TrackModel> {
        self.tracks
            .iter()
            .find(|t| t.id() == track_id)
            .ok_or(LibraryError::UnknownTrack(track_id))
    }

    fn track_mut(&mut self, track_id: TrackId) -> Option<&mut TrackModel> {
        self.tracks.iter_mut().find(|t| t.id() == track_id)
    }

    /// Whether `[start, end)` on the track is free of clips other than `ignore`.
    fn range_is_free(
        &self,
        track_id: TrackId,
        start: i64,
        end: i64,
        ignore: Option<ClipId>,
    ) -> Result<bool> {
        for (position, id) in self.track_ref(track_id)?.clips() {
            if Some(id) == ignore {
                continue;
            }
            let clip_end = position.saturating_add(self.clip_ref(id)?.playtime()?);
            if position < end && start < clip_end {
                return Ok(false);
            }
        }
        Ok(true)
    }

    // --- Primitives replayed by undo/redo actions ---

    pub(crate) fn place_clip(&mut self, clip_id: ClipId, track_id: TrackId, position: i64) -> bool {
        match self.clips.get(&clip_id) {
            Some(clip) if clip.track_id().is_none() => {}
            _ => return false,
        }
        let Some(track) = self.track_mut(track_id) else {
            return false;
        };
        if !track.insert(position, clip_id) {
            return false;
        }
        if let Some(clip) = self.clips.get_mut(&clip_id) {
            clip.set_placement(Some(track_id), position);
        }
        true
    }

    pub(crate) fn unplace_clip(&mut self, clip_id: ClipId) -> bool {
        let Some((track_id, position)) = self
            .clips
            .get(&clip_id)
            .and_then(|c| c.track_id().map(|t| (t, c.position())))
        else {
            return false;
        };
        let Some(track) = self.track_mut(track_id) else {
            return false;
        };
        if !track.remove(position, clip_id) {
            return false;
        }
        if let Some(clip) = self.clips.get_mut(&clip_id) {
            clip.set_placement(None, 0);
        }
        true
    }

    /// Move every clip in `clip_ids` (all on `track_id`) by `delta` frames.
    pub(crate) fn shift_clips(
        &mut self,
        track_id: TrackId,
        clip_ids: &[ClipId],
        delta: i64,
    ) -> bool {
        let mut positions = Vec::with_capacity(clip_ids.len());
        for id in clip_ids {
            match self.clips.get(id) {
                Some(clip) if clip.track_id() == Some(track_id) => {
                    positions.push((*id, clip.position()))
                }
                _ => return false,
            }
        }
        let Some(track) = self.track_mut(track_id) else {
            return false;
        };
        for (id, position) in &positions {
            if !track.remove(*position, *id) {
                return false;
            }
        }
        for (id, position) in &positions {
            if !track.insert(position + delta, *id) {
                return false;
            }
        }
        for (id, position) in positions {
            if let Some(clip) = self.clips.get_mut(&id) {
                clip.set_placement(Some(track_id), position + delta);
            }
        }
        true
    }

    pub(crate) fn restore_clip(&mut self, clip_id: ClipId, snapshot: ClipSnapshot) -> bool {
        match self.clips.get_mut(&clip_id) {
            Some(clip) => {
                clip.restore(snapshot);
                true
            }
            None => false,
        }
    }

    /// Recompute the warp from the current state and apply it.
    pub(crate) fn warp_clip(&mut self, clip_id: ClipId, speed: f64) -> bool {
        let Some(clip) = self.clips.get_mut(&clip_id) else {
            return false;
        };
        match clip.plan_time_warp(speed) {
            Ok(bounds) => {
                clip.apply_bounds(bounds);
                true
            }
            Err(e) => {
                debug!("Replaying warp of clip {} failed: {}", clip_id, e);
                false
            }
        }
    }

    /// Only orphan clips can enter or leave the registry.
    pub(crate) fn insert_clip_model(&mut self, clip: ClipModel) -> bool {
        if clip.track_id().is_some() || self.clips.contains_key(&clip.id()) {
            return false;
        }
        self.clips.insert(clip.id(), clip);
        true
    }

    pub(crate) fn take_clip(&mut self, clip_id: ClipId) -> Option<ClipModel> {
        match self.clips.get(&clip_id) {
            Some(clip) if clip.track_id().is_none() => self.clips.remove(&clip_id),
            _ => None,
        }
    }

    pub(crate) fn insert_track(&mut self, index: usize, track: TrackModel) -> bool {
        if self.contains_track(track.id()) {
            return false;
        }
        let index = index.min(self.tracks.len());
        self.tracks.insert(index, track);
        true
    }

    /// Only empty tracks can be removed.
    pub(crate) fn take_track(&mut self, track_id: TrackId) -> bool {
        match self.track_index(track_id) {
            Some(index) if self.tracks[index].is_empty() => {
                self.tracks.remove(index);
                true
            }
            _ => false,
        }
    }

    pub(crate) fn notify_clip_changed(&self, clip_id: ClipId) {
        if let Some(observer) = &self.observer {
            observer.clip_changed(clip_id);
        }
    }

    // --- Transaction helpers ---

    /// Run `operation`; on success record it into the local pair, otherwise
    /// roll back what the local pair already did.
    fn apply_step(
        &mut self,
        operation: Fun,
        reverse: Fun,
        local_undo: &mut Fun,
        local_redo: &mut Fun,
    ) -> Result<()> {
        if operation(self) {
            update_undo_redo(operation, reverse, local_undo, local_redo);
            Ok(())
        } else {
            if !local_undo(self) {
                error!("Rolling back a failed edit also failed");
            }
            Err(LibraryError::InvalidState(
                "validated edit could not be applied".to_string(),
            ))
        }
    }

    /// Hand the finished local pair to the caller and verify the model.
    fn commit(&mut self, local_undo: Fun, local_redo: Fun, undo: &mut Fun, redo: &mut Fun) {
        update_undo_redo(local_redo, local_undo, undo, redo);
        if self.config.consistency_checks.enabled() {
            let consistent = self.check_consistency();
            debug_assert!(consistent, "timeline is inconsistent after an edit");
        }
    }
}

/// An action that only notifies the observer about `clip_id`.
fn notifier(clip_id: ClipId) -> Fun {
    Box::new(move |timeline: &mut TimelineModel| {
        timeline.notify_clip_changed(clip_id);
        true
    })
}
