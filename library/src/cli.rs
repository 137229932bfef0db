//! `clip-timeline <native-length> <speed>...`
//!
//! Warps a single orphan clip through each speed in turn, recording every
//! edit on an [`UndoStack`], then unwinds the history.

use env_logger::Env;
use log::{info, warn};
use serde::Serialize;

use crate::config::{TimelineConfig, config_path};
use crate::error::{LibraryError, Result};
use crate::model::{BinModel, Producer};
use crate::timeline::TimelineModel;
use crate::undo::{UndoStack, noop};

const USAGE: &str = "usage: clip-timeline <native-length> <speed>...";

#[derive(Serialize, Clone, PartialEq, Debug)]
pub struct WarpReport {
    pub speed: f64,
    pub accepted: bool,
    pub playtime: i64,
    pub seconds: f64,
}

#[derive(Serialize, Clone, PartialEq, Debug)]
pub struct SessionReport {
    pub native_length: i64,
    pub steps: Vec<WarpReport>,
    /// Playtime after undoing every accepted step.
    pub restored_playtime: i64,
    pub restored_speed: f64,
}

pub fn run(args: Vec<String>) -> Result<()> {
    let config = load_config_and_init_logger();

    let (native_length, speeds) = parse_args(&args)?;
    let report = simulate(config, native_length, &speeds)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// The config picks the default log filter, so it is read first and only
/// reported on once the logger is up.
fn load_config_and_init_logger() -> TimelineConfig {
    let path = config_path();
    let loaded = match &path {
        Some(path) => TimelineConfig::load_optional(path),
        None => Ok(None),
    };
    let log_level = match &loaded {
        Ok(Some(config)) => config.log_level.clone(),
        _ => TimelineConfig::default().log_level,
    };
    // Ignore the error when a logger is already installed.
    let env = Env::default().default_filter_or(log_level);
    let _ = env_logger::Builder::from_env(env).try_init();

    match path {
        Some(path) => TimelineConfig::or_default(&path, loaded),
        None => TimelineConfig::default(),
    }
}

pub fn parse_args(args: &[String]) -> Result<(i64, Vec<f64>)> {
    let [_, length, speeds @ ..] = args else {
        return Err(LibraryError::InvalidArgument(USAGE.to_string()));
    };
    if speeds.is_empty() {
        return Err(LibraryError::InvalidArgument(USAGE.to_string()));
    }
    let native_length = length
        .parse::<i64>()
        .map_err(|e| LibraryError::InvalidArgument(format!("bad length '{}': {}", length, e)))?;
    let speeds = speeds
        .iter()
        .map(|s| {
            s.parse::<f64>()
                .map_err(|e| LibraryError::InvalidArgument(format!("bad speed '{}': {}", s, e)))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok((native_length, speeds))
}

pub fn simulate(
    config: TimelineConfig,
    native_length: i64,
    speeds: &[f64],
) -> Result<SessionReport> {
    let mut bin = BinModel::new();
    let producer = bin.add_producer(Producer::new("source", native_length));
    let mut history = UndoStack::new(config.undo_limit);
    let mut timeline = TimelineModel::new(config);
    let clip = timeline.construct_clip(&bin, producer, None)?;

    let mut steps = Vec::with_capacity(speeds.len());
    for &speed in speeds {
        let mut undo = noop();
        let mut redo = noop();
        let result = timeline.request_clip_time_warp(clip, speed, true, true, &mut undo, &mut redo);
        let accepted = match result {
            Ok(()) => {
                history.push(format!("Change speed to {}", speed), undo, redo);
                true
            }
            Err(e) if e.is_recoverable() => false,
            Err(e) => return Err(e),
        };
        let playtime = timeline.clip_playtime(clip)?;
        let seconds = timeline.config().frames_to_seconds(playtime);
        if accepted {
            info!("Speed {}: {} frames ({:.2}s)", speed, playtime, seconds);
        }
        steps.push(WarpReport {
            speed,
            accepted,
            playtime,
            seconds,
        });
    }

    while history.can_undo() {
        if !history.undo(&mut timeline) {
            warn!("Stopped unwinding at '{}'", history.undo_label().unwrap_or_default());
            break;
        }
    }

    Ok(SessionReport {
        native_length,
        steps,
        restored_playtime: timeline.clip_playtime(clip)?,
        restored_speed: timeline.clip_speed(clip)?,
    })
}
