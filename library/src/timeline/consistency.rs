use std::collections::{HashMap, HashSet};

use log::error;

use super::TimelineModel;
use crate::model::ClipId;

impl TimelineModel {
    /// Walk every clip and track and verify the structural invariants.
    /// Each violation is logged at error level.
    pub fn check_consistency(&self) -> bool {
        let violations = self.consistency_violations();
        for violation in &violations {
            error!("Timeline inconsistency: {}", violation);
        }
        violations.is_empty()
    }

    /// Human readable description of every broken invariant.
    pub fn consistency_violations(&self) -> Vec<String> {
        let mut violations = Vec::new();

        // How many times each clip id is referenced from tracks.
        let mut appearances: HashMap<ClipId, usize> = HashMap::new();
        let mut track_ids = HashSet::new();

        for track in &self.tracks {
            if !track_ids.insert(track.id()) {
                violations.push(format!("track id {} is used twice", track.id()));
            }
            if track.id() >= self.next_id {
                violations.push(format!("track id {} was never allocated", track.id()));
            }

            let mut previous_end: Option<(ClipId, i64)> = None;
            for (position, clip_id) in track.clips() {
                *appearances.entry(clip_id).or_default() += 1;
                let Some(clip) = self.clips.get(&clip_id) else {
                    violations.push(format!(
                        "track {} references unknown clip {}",
                        track.id(),
                        clip_id
                    ));
                    continue;
                };
                if clip.track_id() != Some(track.id()) || clip.position() != position {
                    violations.push(format!(
                        "clip {} is listed on track {} at {} but records {:?} at {}",
                        clip_id,
                        track.id(),
                        position,
                        clip.track_id(),
                        clip.position()
                    ));
                }
                if position < 0 {
                    violations.push(format!("clip {} has negative position {}", clip_id, position));
                }
                if let Some((previous_id, end)) = previous_end {
                    if position < end {
                        violations.push(format!(
                            "clip {} overlaps clip {} on track {}",
                            clip_id,
                            previous_id,
                            track.id()
                        ));
                    }
                }
                let playtime = clip.playtime().unwrap_or(0);
                previous_end = Some((clip_id, position.saturating_add(playtime)));
            }
        }

        for (id, clip) in &self.clips {
            if *id != clip.id() {
                violations.push(format!("clip {} is stored under id {}", clip.id(), id));
            }
            if *id >= self.next_id {
                violations.push(format!("clip id {} was never allocated", id));
            }
            if track_ids.contains(id) {
                violations.push(format!("id {} is used by both a clip and a track", id));
            }
            match clip.playtime() {
                Ok(playtime) if playtime >= 1 => {}
                Ok(playtime) => violations.push(format!("clip {} has playtime {}", id, playtime)),
                Err(e) => violations.push(e.to_string()),
            }
            if clip.get_in() < 0 {
                violations.push(format!("clip {} has negative in point", id));
            }
            if !clip.speed().is_finite() || clip.speed() <= 0.0 {
                violations.push(format!("clip {} has invalid speed {}", id, clip.speed()));
            }

            let count = appearances.get(id).copied().unwrap_or(0);
            match clip.track_id() {
                Some(track_id) => {
                    if !track_ids.contains(&track_id) {
                        violations.push(format!("clip {} is on unknown track {}", id, track_id));
                    } else if count != 1 {
                        violations.push(format!(
                            "clip {} appears {} times in track lists",
                            id, count
                        ));
                    }
                }
                None if count > 0 => {
                    violations.push(format!("orphan clip {} is listed on a track", id));
                }
                None => {}
            }
        }

        violations
    }
}

#[cfg(test)]
mod tests {
    use crate::config::TimelineConfig;
    use crate::model::{BinModel, Producer};
    use crate::timeline::TimelineModel;
    use crate::undo::noop;

    fn timeline_with_two_clips() -> (TimelineModel, usize, usize, usize) {
        let mut bin = BinModel::new();
        let producer = bin.add_producer(Producer::new("blue", 10));
        let mut timeline = TimelineModel::new(TimelineConfig::default());
        let mut undo = noop();
        let mut redo = noop();
        let track = timeline
            .request_track_insertion(None, &mut undo, &mut redo)
            .unwrap();
        let first = timeline
            .construct_clip(&bin, producer, Some((track, 0)))
            .unwrap();
        let second = timeline
            .construct_clip(&bin, producer, Some((track, 10)))
            .unwrap();
        (timeline, track, first, second)
    }

    #[test]
    fn test_consistent_after_construction() {
        let (timeline, _, _, _) = timeline_with_two_clips();
        assert!(timeline.check_consistency());
        assert!(timeline.consistency_violations().is_empty());
    }

    #[test]
    fn test_detects_overlap() {
        let (mut timeline, _, first, _) = timeline_with_two_clips();
        // Grow the first clip by hand so it runs into the second one.
        timeline.clips.get_mut(&first).unwrap().set_in_out(0, 14);
        assert!(!timeline.check_consistency());
        let violations = timeline.consistency_violations();
        assert_eq!(violations.len(), 1);
        assert!(violations[0].contains("overlaps"));
    }

    #[test]
    fn test_detects_dangling_track_entry() {
        let (mut timeline, _, _, second) = timeline_with_two_clips();
        timeline.clips.remove(&second);
        assert!(!timeline.check_consistency());
    }

    #[test]
    fn test_detects_orphan_listed_on_track() {
        let (mut timeline, _, first, _) = timeline_with_two_clips();
        timeline.clips.get_mut(&first).unwrap().set_placement(None, 0);
        let violations = timeline.consistency_violations();
        assert!(violations.iter().any(|v| v.contains("orphan clip")));
    }
}
