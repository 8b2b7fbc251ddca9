//! Engine configuration: court geometry, duration bounds, pacing and transport constants.

use serde::{Deserialize, Serialize};

use crate::error::AnimationError;
use crate::geometry::Position;

/// Logical court size plus the inset that synthesized motion must respect.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Court {
    pub width: f64,
    pub height: f64,
    /// Synthesized positions stay at least this far from every edge.
    pub margin: f64,
}

impl Court {
    /// Clamp a position into `[margin, width - margin] x [margin, height - margin]`.
    pub fn clamp(&self, p: Position) -> Position {
        let max_x = (self.width - self.margin).max(self.margin);
        let max_y = (self.height - self.margin).max(self.margin);
        Position::new(p.x.clamp(self.margin, max_x), p.y.clamp(self.margin, max_y))
    }

    /// Rim position: centered on the baseline at the top of the court.
    pub fn basket(&self) -> Position {
        Position::new(self.width / 2.0, self.margin)
    }
}

impl Default for Court {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            margin: 50.0,
        }
    }
}

/// Timeline pacing: how a duration is carved into setup, action and settle time.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Pacing {
    /// Leading share of the duration before the first action window.
    pub setup_fraction: f64,
    /// Share of the duration divided evenly among action windows.
    pub action_fraction: f64,
    /// Delay between consecutive players in synthesized motion.
    pub demo_stagger_ms: f64,
    /// Upper bound on a single synthesized movement.
    pub demo_move_ms: f64,
    /// Synthesized movement never runs past this share of the duration.
    pub demo_end_fraction: f64,
    /// Per-axis displacement bound for players without a known role.
    pub demo_jitter: f64,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            setup_fraction: 0.1,
            action_fraction: 0.8,
            demo_stagger_ms: 500.0,
            demo_move_ms: 2000.0,
            demo_end_fraction: 0.8,
            demo_jitter: 50.0,
        }
    }
}

/// Configuration shared by generation, validation and playback.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    pub court: Court,
    pub pacing: Pacing,
    pub min_duration_ms: f64,
    pub max_duration_ms: f64,
    pub min_fps: f64,
    pub max_fps: f64,
    /// Transport tick rate, independent of the sampled fps.
    pub tick_hz: f64,
    /// Maximum distance at which a keyframe is reported as current.
    pub keyframe_snap_ms: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            court: Court::default(),
            pacing: Pacing::default(),
            min_duration_ms: 1000.0,
            max_duration_ms: 30000.0,
            min_fps: 1.0,
            max_fps: 120.0,
            tick_hz: 60.0,
            keyframe_snap_ms: 500.0,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a config document; absent fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, AnimationError> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check the bounds generation and playback rely on.
    pub fn validate(&self) -> Result<(), AnimationError> {
        let p = &self.pacing;
        let fraction = |v: f64| v.is_finite() && (0.0..=1.0).contains(&v);
        let bad = AnimationError::invalid_setting;

        if !fraction(p.setup_fraction) {
            return Err(bad("pacing.setupFraction", "must be in [0, 1]"));
        }
        // Action windows must end inside the duration.
        if !fraction(p.action_fraction) || p.setup_fraction + p.action_fraction > 1.0 {
            return Err(bad(
                "pacing.actionFraction",
                "must be in [0, 1] with setupFraction + actionFraction <= 1",
            ));
        }
        if !fraction(p.demo_end_fraction) || p.demo_end_fraction == 0.0 {
            return Err(bad("pacing.demoEndFraction", "must be in (0, 1]"));
        }
        for (field, v) in [
            ("pacing.demoStaggerMs", p.demo_stagger_ms),
            ("pacing.demoMoveMs", p.demo_move_ms),
            ("pacing.demoJitter", p.demo_jitter),
            ("keyframeSnapMs", self.keyframe_snap_ms),
        ] {
            if !v.is_finite() || v < 0.0 {
                return Err(bad(field, "must be a non-negative number"));
            }
        }
        if !self.tick_hz.is_finite() || self.tick_hz <= 0.0 {
            return Err(bad("tickHz", "must be positive"));
        }
        if !(self.min_duration_ms.is_finite() && self.max_duration_ms.is_finite())
            || self.min_duration_ms < 0.0
            || self.min_duration_ms > self.max_duration_ms
        {
            return Err(bad(
                "minDurationMs",
                "must be non-negative and not above maxDurationMs",
            ));
        }
        if !(self.min_fps.is_finite() && self.max_fps.is_finite())
            || self.min_fps <= 0.0
            || self.min_fps > self.max_fps
        {
            return Err(bad("minFps", "must be positive and not above maxFps"));
        }
        let c = &self.court;
        if !(c.width.is_finite() && c.height.is_finite() && c.margin.is_finite())
            || c.margin < 0.0
            || c.width <= 2.0 * c.margin
            || c.height <= 2.0 * c.margin
        {
            return Err(bad("court", "width and height must exceed twice the margin"));
        }
        Ok(())
    }

    /// Milliseconds advanced by one transport tick at speed 1.
    #[inline]
    pub fn tick_interval_ms(&self) -> f64 {
        1000.0 / self.tick_hz
    }

    /// Reject durations outside `[min_duration_ms, max_duration_ms]`.
    pub fn validate_duration(&self, duration_ms: f64) -> Result<(), AnimationError> {
        if !duration_ms.is_finite()
            || duration_ms < self.min_duration_ms
            || duration_ms > self.max_duration_ms
        {
            return Err(AnimationError::DurationOutOfRange {
                duration_ms,
                min_ms: self.min_duration_ms,
                max_ms: self.max_duration_ms,
            });
        }
        Ok(())
    }
}
