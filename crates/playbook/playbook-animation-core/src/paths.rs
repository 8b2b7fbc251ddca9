//! Movement path builder.
//!
//! Turns diagram actions into time-bounded, per-player interpolation segments. Only
//! `cut` actions move players. When nothing in the diagram produces motion, every
//! player receives a short role-based demo movement so the animation is never static.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::diagram::{ActionType, Diagram, Player, Role};
use crate::error::AnimationError;
use crate::geometry::{Position, Velocity};
use crate::timing::{action_windows, TimeWindow};

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterpolationType {
    #[default]
    Linear,
    Curve,
    Sprint,
    Jog,
}

impl InterpolationType {
    /// Map window progress to path progress.
    /// Only linear pacing is defined; other kinds are carried for the editor and sample linearly.
    #[inline]
    pub fn apply(&self, progress: f64) -> f64 {
        match self {
            Self::Linear | Self::Curve | Self::Sprint | Self::Jog => progress,
        }
    }
}

/// A single player's movement between two positions over `[start_time, end_time]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementPath {
    pub player_id: String,
    pub start_time: f64,
    pub end_time: f64,
    pub start_position: Position,
    pub end_position: Position,
    pub interpolation_type: InterpolationType,
    /// Court units per second.
    pub speed: f64,
}

impl MovementPath {
    /// Linear path from `start` to `end` over `window`.
    pub fn linear(
        player_id: impl Into<String>,
        window: TimeWindow,
        start: Position,
        end: Position,
    ) -> Self {
        let secs = window.duration_ms() / 1000.0;
        let speed = if secs > 0.0 { start.distance(end) / secs } else { 0.0 };
        Self {
            player_id: player_id.into(),
            start_time: window.start_ms,
            end_time: window.end_ms,
            start_position: start,
            end_position: end,
            interpolation_type: InterpolationType::Linear,
            speed,
        }
    }

    #[inline]
    pub fn window(&self) -> TimeWindow {
        TimeWindow::new(self.start_time, self.end_time)
    }

    #[inline]
    pub fn covers(&self, t: f64) -> bool {
        self.window().contains(t)
    }

    /// Never extrapolates: before the window it returns `start_position`, after it `end_position`.
    pub fn position_at(&self, t: f64) -> Position {
        let p = self.interpolation_type.apply(self.window().progress(t));
        self.start_position.lerp(self.end_position, p)
    }

    pub fn velocity(&self) -> Velocity {
        Velocity::between(self.start_position, self.end_position, self.end_time - self.start_time)
    }
}

/// Build movement paths for `diagram` over `duration_ms`.
///
/// Each resolvable `cut` yields one linear path across its action window. Actions of
/// other kinds, or cuts whose player or target cannot be resolved, yield nothing.
pub fn build_movement_paths(
    diagram: &Diagram,
    duration_ms: f64,
    cfg: &EngineConfig,
) -> Vec<MovementPath> {
    let windows = action_windows(diagram.actions.len(), duration_ms, &cfg.pacing);
    let mut paths = Vec::new();

    for (action, window) in diagram.actions.iter().zip(windows) {
        if action.kind != ActionType::Cut {
            continue;
        }
        let Some(player) = action.from.player_id.as_deref().and_then(|id| diagram.player(id)) else {
            log::warn!(
                "cut '{}' references unknown player {:?}; no movement generated",
                action.id,
                action.from.player_id
            );
            continue;
        };
        let Some(target) = action.to.coordinates() else {
            log::debug!("cut '{}' has no target coordinates; no movement generated", action.id);
            continue;
        };
        if window.duration_ms() <= 0.0 {
            continue;
        }
        paths.push(MovementPath::linear(player.id.clone(), window, player.position(), target));
    }

    if paths.is_empty() && !diagram.players.is_empty() {
        paths = demo_paths(&diagram.players, duration_ms, cfg);
        log::debug!("no derivable movement; synthesized {} demo paths", paths.len());
    }
    paths
}

/// Staggered role-based motion for diagrams with nothing to animate.
fn demo_paths(players: &[Player], duration_ms: f64, cfg: &EngineConfig) -> Vec<MovementPath> {
    let pacing = &cfg.pacing;
    let limit = duration_ms * pacing.demo_end_fraction;
    let mut paths = Vec::with_capacity(players.len());

    for (i, player) in players.iter().enumerate() {
        let start_time = i as f64 * pacing.demo_stagger_ms;
        let end_time = (start_time + pacing.demo_move_ms).min(limit);
        if end_time <= start_time {
            // Later players would start after the motion cut-off.
            break;
        }
        let from = player.position();
        let to = cfg.court.clamp(demo_target(player, cfg));
        paths.push(MovementPath::linear(
            player.id.clone(),
            TimeWindow::new(start_time, end_time),
            from,
            to,
        ));
    }
    paths
}

const DRIVE_DISTANCE: f64 = 120.0;

fn demo_target(player: &Player, cfg: &EngineConfig) -> Position {
    let from = player.position();
    match Role::from_label(&player.label) {
        Some(Role::PointGuard) => {
            let basket = cfg.court.basket();
            let dist = from.distance(basket);
            if dist <= f64::EPSILON {
                from
            } else {
                from.lerp(basket, DRIVE_DISTANCE / dist)
            }
        }
        Some(Role::ShootingGuard) => from.offset(80.0, -60.0),
        Some(Role::SmallForward) => from.offset(-80.0, -60.0),
        Some(Role::PowerForward) => from.offset(-30.0, -80.0),
        Some(Role::Center) => from.offset(30.0, -50.0),
        None => {
            let (dx, dy) = jitter(&player.id, cfg.pacing.demo_jitter);
            from.offset(dx, dy)
        }
    }
}

/// Deterministic per-player displacement in `[-radius, radius]` on each axis.
fn jitter(player_id: &str, radius: f64) -> (f64, f64) {
    let h = stable_hash64(0x706c_6179, player_id);
    let unit = |bits: u64| (bits & 0xffff) as f64 / 65535.0 * 2.0 - 1.0;
    (unit(h) * radius, unit(h >> 16) * radius)
}

fn stable_hash64(seed: u64, s: &str) -> u64 {
    // FNV-1a 64, seeded.
    let mut h = 0xcbf2_9ce4_8422_2325u64 ^ seed;
    for &b in s.as_bytes() {
        h ^= u64::from(b);
        h = h.wrapping_mul(0x0000_0100_0000_01B3);
    }
    h
}

/// Check that every path has positive length and that no player has two overlapping paths.
pub fn validate_paths(paths: &[MovementPath]) -> Result<(), AnimationError> {
    let index = PathIndex::new(paths);
    for list in index.by_player.values() {
        for p in list {
            if !(p.start_time < p.end_time) {
                return Err(AnimationError::InvalidTimestamp {
                    field: format!("movementPath[{}].endTime", p.player_id),
                    value: p.end_time,
                });
            }
        }
        for pair in list.windows(2) {
            if pair[0].window().overlaps(&pair[1].window()) {
                return Err(AnimationError::InvalidTimestamp {
                    field: format!("movementPath[{}].startTime", pair[1].player_id),
                    value: pair[1].start_time,
                });
            }
        }
    }
    Ok(())
}

/// Paths grouped by player and sorted by start time.
#[derive(Debug, Default)]
pub struct PathIndex<'a> {
    by_player: HashMap<&'a str, Vec<&'a MovementPath>>,
}

impl<'a> PathIndex<'a> {
    pub fn new(paths: &'a [MovementPath]) -> Self {
        let mut by_player: HashMap<&str, Vec<&MovementPath>> = HashMap::new();
        for p in paths {
            by_player.entry(p.player_id.as_str()).or_default().push(p);
        }
        for list in by_player.values_mut() {
            list.sort_by(|a, b| a.start_time.total_cmp(&b.start_time));
        }
        Self { by_player }
    }

    /// Path active at `t`; on a shared boundary the later-starting path wins.
    pub fn active(&self, player_id: &str, t: f64) -> Option<&'a MovementPath> {
        self.by_player
            .get(player_id)?
            .iter()
            .rev()
            .find(|p| p.covers(t))
            .copied()
    }

    /// Position of `player` at `t` and the path driving it, if any.
    ///
    /// Between or after paths the player holds the end of the most recent finished path;
    /// before any path it stays at its diagram position.
    pub fn position(&self, player: &Player, t: f64) -> (Position, Option<&'a MovementPath>) {
        if let Some(path) = self.active(&player.id, t) {
            return (path.position_at(t), Some(path));
        }
        let held = self
            .by_player
            .get(player.id.as_str())
            .and_then(|list| list.iter().rev().find(|p| p.end_time < t));
        match held {
            Some(p) => (p.end_position, None),
            None => (player.position(), None),
        }
    }
}
