use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{ClipId, TrackId};

/// A track only records which clip starts where; lengths live on the clips.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct TrackModel {
    id: TrackId,
    #[serde(default)]
    clips: BTreeMap<i64, ClipId>,
}

impl TrackModel {
    pub fn new(id: TrackId) -> Self {
        Self {
            id,
            clips: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> TrackId {
        self.id
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    /// `(position, clip)` pairs in timeline order.
    pub fn clips(&self) -> impl Iterator<Item = (i64, ClipId)> + '_ {
        self.clips.iter().map(|(pos, id)| (*pos, *id))
    }

    pub fn clip_ids(&self) -> Vec<ClipId> {
        self.clips.values().copied().collect()
    }

    pub fn clip_at(&self, position: i64) -> Option<ClipId> {
        self.clips.get(&position).copied()
    }

    pub fn position_of(&self, clip_id: ClipId) -> Option<i64> {
        self.clips
            .iter()
            .find(|(_, id)| **id == clip_id)
            .map(|(pos, _)| *pos)
    }

    /// First clip starting strictly after `position`.
    pub fn next_after(&self, position: i64) -> Option<(i64, ClipId)> {
        self.clips
            .range(position + 1..)
            .next()
            .map(|(pos, id)| (*pos, *id))
    }

    /// Clips starting strictly after `position`, in order.
    pub fn clips_after(&self, position: i64) -> Vec<(i64, ClipId)> {
        self.clips
            .range(position + 1..)
            .map(|(pos, id)| (*pos, *id))
            .collect()
    }

    /// Returns false if another clip already starts at `position`.
    pub(crate) fn insert(&mut self, position: i64, clip_id: ClipId) -> bool {
        if self.clips.contains_key(&position) {
            return false;
        }
        self.clips.insert(position, clip_id);
        true
    }

    /// Remove the clip starting at `position`, if it is `clip_id`.
    pub(crate) fn remove(&mut self, position: i64, clip_id: ClipId) -> bool {
        if self.clip_at(position) == Some(clip_id) {
            self.clips.remove(&position);
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_lookup() {
        let mut track = TrackModel::new(1);
        assert!(track.insert(10, 4));
        assert!(track.insert(0, 3));
        assert!(!track.insert(10, 5));

        assert_eq!(track.clip_ids(), vec![3, 4]);
        assert_eq!(track.position_of(4), Some(10));
        assert_eq!(track.next_after(0), Some((10, 4)));
        assert_eq!(track.next_after(10), None);
        assert_eq!(track.clips_after(-1).len(), 2);
    }

    #[test]
    fn test_remove_checks_owner() {
        let mut track = TrackModel::new(1);
        track.insert(5, 2);
        assert!(!track.remove(5, 3));
        assert!(track.remove(5, 2));
        assert!(track.is_empty());
    }
}
