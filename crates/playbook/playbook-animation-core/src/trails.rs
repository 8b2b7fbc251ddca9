//! Rolling per-player position history for renderers.
//!
//! Session-local and never persisted. Recording a frame older than the oldest retained
//! sample (a restart or loop wrap) drops every trail.

use std::collections::VecDeque;

use hashbrown::HashMap;

use crate::geometry::Position;
use crate::sampling::AnimationFrame;
use crate::sequence::AnimationSettings;

#[derive(Clone, Debug)]
pub struct PlayerTrails {
    capacity: usize,
    enabled: bool,
    stamps: VecDeque<f64>,
    trails: HashMap<String, VecDeque<Position>>,
}

impl PlayerTrails {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            enabled: capacity > 0,
            stamps: VecDeque::with_capacity(capacity),
            trails: HashMap::new(),
        }
    }

    pub fn from_settings(settings: &AnimationSettings) -> Self {
        let mut trails = Self::new(settings.trail_length);
        trails.enabled &= settings.show_trails;
        trails
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Timestamp of the oldest retained sample.
    pub fn oldest(&self) -> Option<f64> {
        self.stamps.front().copied()
    }

    pub fn record(&mut self, frame: &AnimationFrame) {
        if !self.enabled {
            return;
        }
        if self.oldest().is_some_and(|t| frame.timestamp < t) {
            log::trace!("trail reset at {}ms", frame.timestamp);
            self.clear();
        }
        push_bounded(&mut self.stamps, frame.timestamp, self.capacity);
        for p in &frame.players {
            let trail = self.trails.entry(p.id.clone()).or_default();
            push_bounded(trail, p.position(), self.capacity);
        }
    }

    /// Oldest first.
    pub fn trail(&self, player_id: &str) -> Option<&VecDeque<Position>> {
        self.trails.get(player_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &VecDeque<Position>)> {
        self.trails.iter().map(|(id, t)| (id.as_str(), t))
    }

    pub fn clear(&mut self) {
        self.stamps.clear();
        self.trails.clear();
    }
}

fn push_bounded<T>(buf: &mut VecDeque<T>, value: T, capacity: usize) {
    if buf.len() == capacity {
        buf.pop_front();
    }
    buf.push_back(value);
}
