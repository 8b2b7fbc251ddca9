//! Playback transport.
//!
//! The transport is a small record plus the legal transitions over it. It never fails:
//! out-of-range input is clamped or wrapped so an interactive view keeps moving.

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::keyframes::{keyframe_near, next_keyframe, previous_keyframe, Keyframe};
use crate::sampling::{frame_at, AnimationFrame};
use crate::sequence::{AnimationSequence, AnimationSettings};

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

impl Direction {
    #[inline]
    fn sign(self) -> f64 {
        match self {
            Direction::Forward => 1.0,
            Direction::Backward => -1.0,
        }
    }
}

/// Per-session transport state. Never persisted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationPlayback {
    pub is_playing: bool,
    /// Milliseconds.
    pub current_time: f64,
    pub playback_speed: f64,
    pub direction: Direction,
    #[serde(rename = "loop")]
    pub looping: bool,
}

impl Default for AnimationPlayback {
    fn default() -> Self {
        Self {
            is_playing: false,
            current_time: 0.0,
            playback_speed: 1.0,
            direction: Direction::Forward,
            looping: false,
        }
    }
}

impl AnimationPlayback {
    pub fn from_settings(settings: &AnimationSettings) -> Self {
        Self {
            is_playing: settings.auto_play,
            looping: settings.looping,
            ..Self::default()
        }
    }
}

/// Host-issued transport commands.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum TransportCommand {
    Play,
    Pause,
    Toggle,
    Restart,
    Seek { time: f64 },
    SetSpeed { speed: f64 },
    SetLoop { looping: bool },
    SetDirection { direction: Direction },
    PreviousKeyframe,
    NextKeyframe,
}

/// Boundary crossings reported by a step.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum TransportEvent {
    /// Clamped at a boundary without looping; playback stopped.
    Ended { time: f64 },
    /// Wrapped to the opposite boundary.
    Looped { time: f64 },
}

#[derive(Clone, Debug)]
pub struct PlaybackController {
    state: AnimationPlayback,
    duration_ms: f64,
    tick_ms: f64,
    snap_ms: f64,
}

impl PlaybackController {
    pub fn new(duration_ms: f64, settings: &AnimationSettings, cfg: &EngineConfig) -> Self {
        let duration_ms = if duration_ms.is_finite() {
            duration_ms.max(0.0)
        } else {
            0.0
        };
        Self {
            state: AnimationPlayback::from_settings(settings),
            duration_ms,
            tick_ms: cfg.tick_interval_ms(),
            snap_ms: cfg.keyframe_snap_ms,
        }
    }

    pub fn for_sequence(sequence: &AnimationSequence, cfg: &EngineConfig) -> Self {
        Self::new(sequence.duration, &sequence.settings, cfg)
    }

    pub fn state(&self) -> &AnimationPlayback {
        &self.state
    }

    pub fn duration(&self) -> f64 {
        self.duration_ms
    }

    pub fn current_time(&self) -> f64 {
        self.state.current_time
    }

    pub fn is_playing(&self) -> bool {
        self.state.is_playing
    }

    pub fn play(&mut self) {
        self.state.is_playing = true;
    }

    pub fn pause(&mut self) {
        self.state.is_playing = false;
    }

    pub fn toggle(&mut self) {
        self.state.is_playing = !self.state.is_playing;
    }

    /// Seek to 0 and pause.
    pub fn restart(&mut self) {
        self.seek(0.0);
        self.pause();
    }

    /// Clamp into `[0, duration]`. Does not touch `is_playing`.
    pub fn seek(&mut self, t: f64) {
        if t.is_nan() {
            log::warn!("ignoring seek to NaN");
            return;
        }
        self.state.current_time = t.clamp(0.0, self.duration_ms);
    }

    pub fn set_speed(&mut self, speed: f64) {
        if !speed.is_finite() || speed <= 0.0 {
            log::warn!("ignoring non-positive playback speed {speed}");
            return;
        }
        self.state.playback_speed = speed;
    }

    pub fn set_loop(&mut self, looping: bool) {
        self.state.looping = looping;
    }

    pub fn set_direction(&mut self, direction: Direction) {
        self.state.direction = direction;
    }

    /// One fixed-rate step.
    pub fn tick(&mut self) -> Option<TransportEvent> {
        self.advance(self.tick_ms)
    }

    /// Step by a host-measured wall-clock delta. No-op while paused.
    pub fn advance(&mut self, dt_ms: f64) -> Option<TransportEvent> {
        if !self.state.is_playing || !dt_ms.is_finite() || dt_ms <= 0.0 {
            return None;
        }
        let step = dt_ms * self.state.playback_speed * self.state.direction.sign();
        let next = self.state.current_time + step;
        let end = self.duration_ms;

        let crossed_end = self.state.direction == Direction::Forward && next >= end;
        let crossed_start = self.state.direction == Direction::Backward && next <= 0.0;

        if self.state.looping {
            if crossed_end {
                self.state.current_time = 0.0;
                return Some(TransportEvent::Looped { time: 0.0 });
            }
            if next < 0.0 {
                self.state.current_time = end;
                return Some(TransportEvent::Looped { time: end });
            }
        } else if crossed_end || crossed_start {
            let time = if crossed_end { end } else { 0.0 };
            self.state.current_time = time;
            self.state.is_playing = false;
            return Some(TransportEvent::Ended { time });
        }
        self.state.current_time = next.clamp(0.0, end);
        None
    }

    /// Seek to the latest keyframe strictly before now. Returns whether time moved.
    pub fn previous_keyframe(&mut self, keyframes: &[Keyframe]) -> bool {
        match previous_keyframe(keyframes, self.state.current_time) {
            Some(kf) => {
                let t = kf.timestamp;
                self.seek(t);
                true
            }
            None => false,
        }
    }

    pub fn next_keyframe(&mut self, keyframes: &[Keyframe]) -> bool {
        match next_keyframe(keyframes, self.state.current_time) {
            Some(kf) => {
                let t = kf.timestamp;
                self.seek(t);
                true
            }
            None => false,
        }
    }

    pub fn current_frame<'a>(&self, frames: &'a [AnimationFrame]) -> Option<&'a AnimationFrame> {
        frame_at(frames, self.state.current_time)
    }

    /// Nearest keyframe, or `None` inside the snap dead zone.
    pub fn current_keyframe<'a>(&self, keyframes: &'a [Keyframe]) -> Option<&'a Keyframe> {
        keyframe_near(keyframes, self.state.current_time, self.snap_ms)
    }

    pub fn apply(&mut self, cmd: TransportCommand, keyframes: &[Keyframe]) {
        match cmd {
            TransportCommand::Play => self.play(),
            TransportCommand::Pause => self.pause(),
            TransportCommand::Toggle => self.toggle(),
            TransportCommand::Restart => self.restart(),
            TransportCommand::Seek { time } => self.seek(time),
            TransportCommand::SetSpeed { speed } => self.set_speed(speed),
            TransportCommand::SetLoop { looping } => self.set_loop(looping),
            TransportCommand::SetDirection { direction } => self.set_direction(direction),
            TransportCommand::PreviousKeyframe => {
                self.previous_keyframe(keyframes);
            }
            TransportCommand::NextKeyframe => {
                self.next_keyframe(keyframes);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyframes::KeyframeType;

    fn controller(duration: f64, looping: bool) -> PlaybackController {
        let settings = AnimationSettings {
            auto_play: true,
            looping,
            ..AnimationSettings::default()
        };
        PlaybackController::new(duration, &settings, &EngineConfig::default())
    }

    #[test]
    fn tick_advances_one_sixtieth_of_a_second() {
        let mut c = controller(10_000.0, false);
        assert_eq!(c.tick(), None);
        assert!((c.current_time() - 1000.0 / 60.0).abs() < 1e-9);
        c.set_speed(2.0);
        c.tick();
        assert!((c.current_time() - 3000.0 / 60.0).abs() < 1e-9);
    }

    #[test]
    fn loop_wraps_and_keeps_playing() {
        let mut c = controller(10_000.0, true);
        c.seek(9_995.0);
        assert_eq!(c.tick(), Some(TransportEvent::Looped { time: 0.0 }));
        assert_eq!(c.current_time(), 0.0);
        assert!(c.is_playing());
    }

    #[test]
    fn non_loop_clamps_and_stops() {
        let mut c = controller(10_000.0, false);
        c.seek(9_995.0);
        assert_eq!(c.tick(), Some(TransportEvent::Ended { time: 10_000.0 }));
        assert_eq!(c.current_time(), 10_000.0);
        assert!(!c.is_playing());
        // Paused: ticking is a no-op.
        assert_eq!(c.tick(), None);
        assert_eq!(c.current_time(), 10_000.0);
    }

    #[test]
    fn backward_wraps_to_end() {
        let mut c = controller(10_000.0, true);
        c.set_direction(Direction::Backward);
        c.seek(5.0);
        assert_eq!(c.tick(), Some(TransportEvent::Looped { time: 10_000.0 }));
        assert_eq!(c.current_time(), 10_000.0);

        let mut once = controller(10_000.0, false);
        once.set_direction(Direction::Backward);
        once.seek(5.0);
        assert_eq!(once.tick(), Some(TransportEvent::Ended { time: 0.0 }));
        assert!(!once.is_playing());
    }

    #[test]
    fn seek_clamps_without_touching_play_state() {
        let mut c = controller(4000.0, false);
        c.seek(-50.0);
        assert_eq!(c.current_time(), 0.0);
        c.seek(9000.0);
        assert_eq!(c.current_time(), 4000.0);
        assert!(c.is_playing());
    }

    #[test]
    fn restart_rewinds_and_pauses() {
        let mut c = controller(4000.0, false);
        c.seek(2500.0);
        c.apply(TransportCommand::Restart, &[]);
        assert_eq!(c.current_time(), 0.0);
        assert!(!c.is_playing());
        c.apply(TransportCommand::Toggle, &[]);
        assert!(c.is_playing());
    }

    #[test]
    fn non_positive_speed_is_ignored() {
        let mut c = controller(4000.0, false);
        c.set_speed(0.0);
        c.set_speed(-1.0);
        assert_eq!(c.state().playback_speed, 1.0);
        c.set_speed(0.25);
        assert_eq!(c.state().playback_speed, 0.25);
    }

    #[test]
    fn keyframe_navigation_is_strict() {
        let kfs = vec![
            Keyframe::new("start", 0.0, "Start", KeyframeType::Pause),
            Keyframe::new("action-a", 1000.0, "Cut", KeyframeType::Action),
            Keyframe::new("end", 10_000.0, "End", KeyframeType::Pause),
        ];
        let mut c = controller(10_000.0, false);
        c.seek(1000.0);
        c.apply(TransportCommand::NextKeyframe, &kfs);
        assert_eq!(c.current_time(), 10_000.0);
        assert!(!c.next_keyframe(&kfs));
        c.apply(TransportCommand::PreviousKeyframe, &kfs);
        assert_eq!(c.current_time(), 1000.0);
        assert!(c.previous_keyframe(&kfs));
        assert_eq!(c.current_time(), 0.0);
        assert!(!c.previous_keyframe(&kfs));
    }

    #[test]
    fn current_keyframe_respects_dead_zone() {
        let kfs = vec![
            Keyframe::new("start", 0.0, "Start", KeyframeType::Pause),
            Keyframe::new("end", 5000.0, "End", KeyframeType::Pause),
        ];
        let mut c = controller(5000.0, false);
        c.seek(4600.0);
        assert_eq!(c.current_keyframe(&kfs).map(|k| k.id.as_str()), Some("end"));
        c.seek(4000.0);
        assert!(c.current_keyframe(&kfs).is_none());
    }

    #[test]
    fn from_settings_seeds_state() {
        let pb = AnimationPlayback::from_settings(&AnimationSettings::default());
        assert!(!pb.is_playing);
        assert!(!pb.looping);
        assert_eq!(pb.playback_speed, 1.0);
        let json = serde_json::to_value(&pb).unwrap();
        assert_eq!(json["direction"], "forward");
        assert_eq!(json["isPlaying"], false);
    }
}
