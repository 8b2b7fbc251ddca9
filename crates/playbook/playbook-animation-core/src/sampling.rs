//! Frame sampler: dense, uniformly spaced snapshots of the timeline.
//!
//! A frame is a pure function of `(diagram, paths, timestamp, duration)`. Frames are
//! regenerated wholesale and never patched, so sampling the same inputs twice yields
//! identical output.

use serde::{Deserialize, Serialize};

use crate::config::Pacing;
use crate::diagram::{Diagram, Endpoint, PlayAction, Player};
use crate::geometry::{Position, Velocity};
use crate::paths::{MovementPath, PathIndex};
use crate::timing::{action_windows, nearest_index, TimeWindow};

/// A diagram player plus rendering-only state at one instant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimatedPlayer {
    pub id: String,
    pub label: String,
    pub x: f64,
    pub y: f64,
    /// Heading in degrees while moving.
    pub rotation: f64,
    pub scale: f64,
    pub opacity: f64,
    /// Set while a movement path drives this player.
    pub highlight: bool,
    pub velocity: Velocity,
}

impl AnimatedPlayer {
    /// Static player with rendering fields at their defaults.
    pub fn at_rest(player: &Player, position: Position) -> Self {
        Self {
            id: player.id.clone(),
            label: player.label.clone(),
            x: position.x,
            y: position.y,
            rotation: 0.0,
            scale: 1.0,
            opacity: 1.0,
            highlight: false,
            velocity: Velocity::ZERO,
        }
    }

    fn moving(player: &Player, position: Position, path: &MovementPath, highlight: bool) -> Self {
        Self {
            rotation: path.start_position.heading_to(path.end_position),
            highlight,
            velocity: path.velocity(),
            ..Self::at_rest(player, position)
        }
    }

    #[inline]
    pub fn position(&self) -> Position {
        Position::new(self.x, self.y)
    }
}

/// An action visible at a frame's timestamp, with its endpoints already resolved.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveAction {
    #[serde(flatten)]
    pub action: PlayAction,
    /// Fraction of the action window elapsed, in [0, 1].
    pub progress: f64,
    pub from_player: Option<AnimatedPlayer>,
    pub to_player: Option<AnimatedPlayer>,
    pub from_position: Option<Position>,
    pub to_position: Option<Position>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnimationFrame {
    pub timestamp: f64,
    pub players: Vec<AnimatedPlayer>,
    pub actions: Vec<ActiveAction>,
}

impl AnimationFrame {
    pub fn player(&self, id: &str) -> Option<&AnimatedPlayer> {
        self.players.iter().find(|p| p.id == id)
    }
}

/// `floor(duration / 1000 * fps) + 1`; zero when `fps` is unusable.
pub fn frame_count(duration_ms: f64, fps: f64) -> usize {
    if !fps.is_finite() || fps <= 0.0 || !duration_ms.is_finite() {
        return 0;
    }
    (duration_ms.max(0.0) / 1000.0 * fps).floor() as usize + 1
}

/// Sample `duration_ms` at `fps`, inclusive of both 0 and `duration_ms`.
pub fn sample_frames(
    diagram: &Diagram,
    paths: &[MovementPath],
    duration_ms: f64,
    fps: f64,
    pacing: &Pacing,
) -> Vec<AnimationFrame> {
    FrameSampler::new(diagram, paths, duration_ms, pacing).sample(duration_ms, fps)
}

/// Reusable sampler over one `(diagram, paths, duration)` triple.
pub struct FrameSampler<'a> {
    diagram: &'a Diagram,
    index: PathIndex<'a>,
    windows: Vec<TimeWindow>,
    highlight_moving: bool,
}

impl<'a> FrameSampler<'a> {
    pub fn new(
        diagram: &'a Diagram,
        paths: &'a [MovementPath],
        duration_ms: f64,
        pacing: &Pacing,
    ) -> Self {
        Self {
            diagram,
            index: PathIndex::new(paths),
            windows: action_windows(diagram.actions.len(), duration_ms, pacing),
            highlight_moving: true,
        }
    }

    /// Whether players driven by a path are flagged `highlight`. On by default.
    pub fn highlight_moving(mut self, on: bool) -> Self {
        self.highlight_moving = on;
        self
    }

    /// Frames over `[0, duration_ms]` at `fps`, last one pinned to `duration_ms`.
    pub fn sample(&self, duration_ms: f64, fps: f64) -> Vec<AnimationFrame> {
        let count = frame_count(duration_ms, fps);
        if count == 0 {
            log::warn!("cannot sample at fps={fps}, duration={duration_ms}ms");
            return Vec::new();
        }
        let last = count - 1;
        (0..count)
            .map(|i| {
                // Integer-first keeps stamps exact where fps divides evenly.
                let t = if i == last && last > 0 {
                    duration_ms
                } else {
                    (i as f64 * 1000.0 / fps).min(duration_ms)
                };
                self.frame(t)
            })
            .collect()
    }

    /// Snapshot at `t`.
    pub fn frame(&self, t: f64) -> AnimationFrame {
        let players: Vec<AnimatedPlayer> = self
            .diagram
            .players
            .iter()
            .map(|p| match self.index.position(p, t) {
                (pos, Some(path)) => {
                    AnimatedPlayer::moving(p, pos, path, self.highlight_moving)
                }
                (pos, None) => AnimatedPlayer::at_rest(p, pos),
            })
            .collect();

        let actions = self
            .diagram
            .actions
            .iter()
            .zip(&self.windows)
            .filter(|(_, w)| w.contains(t))
            .filter_map(|(action, w)| resolve_action(action, w.progress(t), &players))
            .collect();

        AnimationFrame {
            timestamp: t,
            players,
            actions,
        }
    }
}

/// Resolve endpoints against this frame's players.
/// A reference to a missing player hides the action rather than failing the frame.
fn resolve_action(
    action: &PlayAction,
    progress: f64,
    players: &[AnimatedPlayer],
) -> Option<ActiveAction> {
    let lookup = |end: &Endpoint| -> Result<Option<AnimatedPlayer>, ()> {
        match end.player_id.as_deref() {
            None => Ok(None),
            Some(id) => players.iter().find(|p| p.id == id).cloned().map(Some).ok_or(()),
        }
    };
    let (Ok(from_player), Ok(to_player)) = (lookup(&action.from), lookup(&action.to)) else {
        return None;
    };
    let from_position = action
        .from
        .coordinates()
        .or_else(|| from_player.as_ref().map(AnimatedPlayer::position));
    let to_position = action
        .to
        .coordinates()
        .or_else(|| to_player.as_ref().map(AnimatedPlayer::position));

    Some(ActiveAction {
        action: action.clone(),
        progress,
        from_player,
        to_player,
        from_position,
        to_position,
    })
}

/// Frame with the timestamp closest to `t`. `frames` must be sorted by timestamp.
pub fn frame_at(frames: &[AnimationFrame], t: f64) -> Option<&AnimationFrame> {
    nearest_index(frames, t, |f| f.timestamp).map(|i| &frames[i])
}
