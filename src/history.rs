//! Bounded history of joint angle samples.
//!
//! Keeps the most recent samples of every tracked joint in one ring buffer so
//! per-session storage stays constant however long the session runs, and
//! provides window statistics over it.

use crate::geometry::{JointAngleSample, JointId};
use serde::Serialize;
use std::collections::VecDeque;

/// Timestamped joint angle sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub timestamp_ms: u64,
    pub sample: JointAngleSample,
}

/// Ring buffer of recent joint angle samples
#[derive(Debug, Clone)]
pub struct AngleHistory {
    capacity: usize,
    entries: VecDeque<HistoryEntry>,
}

impl AngleHistory {
    /// Create a history holding at most `capacity` samples
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    /// Append a sample, evicting the oldest when full
    pub fn push(&mut self, timestamp_ms: u64, sample: JointAngleSample) {
        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(HistoryEntry { timestamp_ms, sample });
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest first
    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    /// Most recent sample of `joint`
    #[must_use]
    pub fn latest(&self, joint: JointId) -> Option<&HistoryEntry> {
        self.entries.iter().rev().find(|entry| entry.sample.joint == joint)
    }

    /// Statistics over the retained samples of `joint`
    #[must_use]
    pub fn statistics(&self, joint: JointId) -> Option<Statistics> {
        let values: Vec<f32> = self
            .entries
            .iter()
            .filter(|entry| entry.sample.joint == joint)
            .map(|entry| entry.sample.degrees)
            .collect();
        Self::calculate_stats(&values)
    }

    /// Statistics of the angular speed (degrees per second) between consecutive samples of `joint`
    #[must_use]
    #[allow(clippy::cast_precision_loss)] // Sample spacing in ms
    pub fn angular_speed(&self, joint: JointId) -> Option<Statistics> {
        let mut samples = self.entries.iter().filter(|entry| entry.sample.joint == joint);
        let mut previous = samples.next()?;
        let mut speeds = Vec::new();
        for entry in samples {
            let elapsed_ms = entry.timestamp_ms.saturating_sub(previous.timestamp_ms);
            if elapsed_ms > 0 {
                let change = (entry.sample.degrees - previous.sample.degrees).abs();
                speeds.push(change * 1000.0 / elapsed_ms as f32);
            }
            previous = entry;
        }
        Self::calculate_stats(&speeds)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Calculate statistics for a data window
    #[allow(clippy::cast_precision_loss)] // Window lengths are bounded by the capacity
    fn calculate_stats(data: &[f32]) -> Option<Statistics> {
        if data.is_empty() {
            return None;
        }

        let n = data.len() as f32;
        let mean = data.iter().sum::<f32>() / n;

        let variance = data.iter().map(|x| (x - mean).powi(2)).sum::<f32>() / n;

        let std_dev = variance.sqrt();

        let min = data.iter().copied().fold(f32::INFINITY, f32::min);
        let max = data.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let range = max - min;

        Some(Statistics {
            mean,
            std_dev,
            min,
            max,
            range,
        })
    }
}

/// Statistical summary of a data window
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Statistics {
    /// Mean value of the data
    pub mean: f32,
    /// Standard deviation of the data
    pub std_dev: f32,
    /// Minimum value in the window
    pub min: f32,
    /// Maximum value in the window
    pub max: f32,
    /// Range (max - min) of the data
    pub range: f32,
}
