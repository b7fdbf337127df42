//! Sensor sources.
//!
//! A [`HandTracker`] yields one [`TrackingFrame`] per display frame and
//! `None` once the source is exhausted (end of a recording, device
//! unplugged).  A [`HeadTracker`] yields the latest headset pose.
//!
//! [`ReplayTracker`] plays back a recording stored as newline-delimited JSON,
//! one frame per line.  Lines that fail to parse are played back as invalid
//! frames so the session sees the same gap a flaky sensor would produce.

use std::collections::VecDeque;
use std::fs;
use std::path::Path;

use plastey_types::{HeadPose, PlasteyError, TrackingFrame};
use tracing::{info, warn};

pub trait HandTracker {
    fn next_frame(&mut self) -> Option<TrackingFrame>;
}

pub trait HeadTracker {
    fn pose(&mut self) -> Option<HeadPose>;
}

/// Plays back recorded tracking frames.
#[derive(Debug, Default)]
pub struct ReplayTracker {
    frames: VecDeque<TrackingFrame>,
}

impl ReplayTracker {
    pub fn from_frames(frames: impl IntoIterator<Item = TrackingFrame>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }

    /// Parse a newline-delimited JSON recording.  Blank lines are skipped.
    pub fn parse(recording: &str) -> Self {
        let frames = recording
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(n, line)| {
                serde_json::from_str(line).unwrap_or_else(|e| {
                    warn!(line = n + 1, error = %e, "unreadable frame in recording");
                    TrackingFrame::invalid()
                })
            });
        Self::from_frames(frames)
    }

    /// Load a recording from disk.
    ///
    /// # Errors
    ///
    /// Returns [`PlasteyError::Tracker`] if the file cannot be read.
    pub fn open(path: &Path) -> Result<Self, PlasteyError> {
        let raw = fs::read_to_string(path)
            .map_err(|e| PlasteyError::Tracker(format!("Failed to read {}: {}", path.display(), e)))?;
        let tracker = Self::parse(&raw);
        info!(path = %path.display(), frames = tracker.remaining(), "recording loaded");
        Ok(tracker)
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl HandTracker for ReplayTracker {
    fn next_frame(&mut self) -> Option<TrackingFrame> {
        self.frames.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const RECORDING: &str = r#"
{"hands":[{"side":"left","palm":{"x":0.0,"y":150.0,"z":0.0},"tips":[{"x":0.0,"y":0.0,"z":0.0},{"x":0.0,"y":0.0,"z":0.0},{"x":0.0,"y":0.0,"z":0.0},{"x":0.0,"y":0.0,"z":0.0},{"x":0.0,"y":0.0,"z":0.0}]}]}
{"valid":false}
not json
"#;

    #[test]
    fn replays_frames_in_order() {
        let mut tracker = ReplayTracker::parse(RECORDING);
        assert_eq!(tracker.remaining(), 3);

        let first = tracker.next_frame().unwrap();
        assert!(first.valid);
        assert_eq!(first.hands.len(), 1);
        assert!(!tracker.next_frame().unwrap().valid);
    }

    #[test]
    fn garbage_lines_become_invalid_frames() {
        let mut tracker = ReplayTracker::parse(RECORDING);
        tracker.next_frame();
        tracker.next_frame();
        assert!(!tracker.next_frame().unwrap().valid);
        assert!(tracker.next_frame().is_none());
    }

    #[test]
    fn open_reads_file() {
        let mut file = tempfile::NamedTempFile::new().expect("tmp file");
        file.write_all(RECORDING.as_bytes()).expect("write");
        let tracker = ReplayTracker::open(file.path()).expect("open");
        assert_eq!(tracker.remaining(), 3);
    }

    #[test]
    fn open_missing_file_fails() {
        let err = ReplayTracker::open(Path::new("/nonexistent/recording.jsonl")).unwrap_err();
        assert!(matches!(err, PlasteyError::Tracker(_)));
    }
}
