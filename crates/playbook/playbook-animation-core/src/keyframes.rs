//! Keyframe extraction and lookup.
//!
//! Keyframes mark narrative time (start, each action, end). They are derived from the
//! diagram alone and exist even for actions that produced no movement.

use serde::{Deserialize, Serialize};

use crate::config::Pacing;
use crate::diagram::{Diagram, PlayAction};
use crate::timing::{action_windows, nearest_index};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyframeType {
    Movement,
    Action,
    Highlight,
    Pause,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub id: String,
    pub timestamp: f64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: KeyframeType,
}

impl Keyframe {
    pub fn new(
        id: impl Into<String>,
        timestamp: f64,
        name: impl Into<String>,
        kind: KeyframeType,
    ) -> Self {
        Self {
            id: id.into(),
            timestamp,
            name: name.into(),
            description: None,
            kind,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Keyframes for `diagram`: `start` at 0, one per action at its window start and `end`
/// at `duration_ms`. Sorted by timestamp ascending.
pub fn build_keyframes(diagram: &Diagram, duration_ms: f64, pacing: &Pacing) -> Vec<Keyframe> {
    let windows = action_windows(diagram.actions.len(), duration_ms, pacing);
    let mut keyframes = Vec::with_capacity(diagram.actions.len() + 2);

    keyframes.push(
        Keyframe::new("start", 0.0, "Start", KeyframeType::Pause)
            .with_description("Initial positions"),
    );
    for (action, window) in diagram.actions.iter().zip(&windows) {
        keyframes.push(
            Keyframe::new(
                format!("action-{}", action.id),
                window.start_ms,
                action.kind.title(),
                KeyframeType::Action,
            )
            .with_description(describe(diagram, action)),
        );
    }
    keyframes.push(
        Keyframe::new("end", duration_ms, "End", KeyframeType::Pause)
            .with_description("Play complete"),
    );

    // Stable: keeps start before any action at the same instant.
    keyframes.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
    keyframes
}

fn describe(diagram: &Diagram, action: &PlayAction) -> String {
    let label = |id: &Option<String>| {
        id.as_deref()
            .and_then(|id| diagram.player(id))
            .map(|p| p.label.clone())
    };
    match (label(&action.from.player_id), label(&action.to.player_id)) {
        (Some(from), Some(to)) => format!("{} from {from} to {to}", action.kind.title()),
        (Some(from), None) => format!("{} by {from}", action.kind.title()),
        _ => action.kind.title().to_string(),
    }
}

/// Nearest keyframe to `t`, reported only within `snap_ms`.
pub fn keyframe_near(keyframes: &[Keyframe], t: f64, snap_ms: f64) -> Option<&Keyframe> {
    let idx = nearest_index(keyframes, t, |k| k.timestamp)?;
    let kf = &keyframes[idx];
    ((kf.timestamp - t).abs() <= snap_ms).then_some(kf)
}

/// Latest keyframe strictly before `t`.
pub fn previous_keyframe(keyframes: &[Keyframe], t: f64) -> Option<&Keyframe> {
    keyframes
        .iter()
        .filter(|k| k.timestamp < t)
        .max_by(|a, b| a.timestamp.total_cmp(&b.timestamp))
}

/// Earliest keyframe strictly after `t`.
pub fn next_keyframe(keyframes: &[Keyframe], t: f64) -> Option<&Keyframe> {
    keyframes
        .iter()
        .filter(|k| k.timestamp > t)
        .min_by(|a, b| a.timestamp.total_cmp(&b.timestamp))
}
