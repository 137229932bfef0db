//! Session history on top of the undo/redo pairs.

use clip_timeline::{
    BinModel, ClipId, Fun, Producer, TimelineConfig, TimelineModel, UndoStack, noop,
};

fn setup() -> (TimelineModel, ClipId) {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut bin = BinModel::new();
    let producer = bin.add_producer(Producer::new("blue", 50));
    let mut timeline = TimelineModel::new(TimelineConfig::default());
    let clip = timeline.construct_clip(&bin, producer, None).unwrap();
    (timeline, clip)
}

fn warp(history: &mut UndoStack, timeline: &mut TimelineModel, clip: ClipId, speed: f64) {
    let mut undo = noop();
    let mut redo = noop();
    timeline
        .request_clip_time_warp(clip, speed, true, false, &mut undo, &mut redo)
        .unwrap();
    history.push(format!("speed {}", speed), undo, redo);
}

#[test]
fn test_undo_redo_walks_history() {
    let (mut timeline, clip) = setup();
    let mut history = UndoStack::default();
    assert!(!history.can_undo());
    assert!(!history.undo(&mut timeline));

    warp(&mut history, &mut timeline, clip, 0.5);
    warp(&mut history, &mut timeline, clip, 2.0);
    assert_eq!(history.len(), 2);
    assert_eq!(history.undo_label(), Some("speed 2"));
    assert_eq!(timeline.clip_playtime(clip).unwrap(), 25);

    assert!(history.undo(&mut timeline));
    assert_eq!(timeline.clip_playtime(clip).unwrap(), 100);
    assert_eq!(history.redo_label(), Some("speed 2"));

    assert!(history.undo(&mut timeline));
    assert_eq!(timeline.clip_playtime(clip).unwrap(), 50);
    assert_eq!(timeline.clip_speed(clip).unwrap(), 1.0);
    assert!(history.is_empty());

    assert!(history.redo(&mut timeline));
    assert!(history.redo(&mut timeline));
    assert_eq!(timeline.clip_playtime(clip).unwrap(), 25);
    assert!(!history.can_redo());
    assert!(!history.redo(&mut timeline));
    assert!(timeline.check_consistency());
}

#[test]
fn test_push_clears_redo_branch() {
    let (mut timeline, clip) = setup();
    let mut history = UndoStack::default();
    warp(&mut history, &mut timeline, clip, 0.5);
    assert!(history.undo(&mut timeline));
    assert!(history.can_redo());

    warp(&mut history, &mut timeline, clip, 5.0);
    assert!(!history.can_redo());
    assert_eq!(timeline.clip_playtime(clip).unwrap(), 10);
}

#[test]
fn test_limit_drops_oldest() {
    let (mut timeline, clip) = setup();
    let mut history = UndoStack::new(2);
    warp(&mut history, &mut timeline, clip, 0.5);
    warp(&mut history, &mut timeline, clip, 1.0);
    warp(&mut history, &mut timeline, clip, 2.0);
    assert_eq!(history.len(), 2);

    assert!(history.undo(&mut timeline));
    assert!(history.undo(&mut timeline));
    assert!(!history.can_undo());
    // The 0.5 edit fell off, so the clip stays slowed down.
    assert_eq!(timeline.clip_speed(clip).unwrap(), 0.5);
    assert_eq!(timeline.clip_playtime(clip).unwrap(), 100);
}

#[test]
fn test_failed_undo_keeps_entry() {
    let (mut timeline, _) = setup();
    let mut history = UndoStack::default();
    let failing: Fun = Box::new(|_: &mut TimelineModel| false);
    history.push("broken", failing, noop());

    assert!(!history.undo(&mut timeline));
    assert_eq!(history.undo_label(), Some("broken"));
    assert!(!history.can_redo());

    history.clear();
    assert!(history.is_empty());
}
