//! Static play diagram: players on the court plus the ordered actions between them.
//!
//! The diagram is supplied by the editor and never mutated by the engine. Actions may
//! reference players that no longer exist; generation skips those instead of failing.

use serde::{Deserialize, Serialize};

use crate::error::AnimationError;
use crate::geometry::Position;

/// A player marker as placed in the editor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: String,
    pub label: String,
    pub x: f64,
    pub y: f64,
}

impl Player {
    pub fn new(id: impl Into<String>, label: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            x,
            y,
        }
    }

    #[inline]
    pub fn position(&self) -> Position {
        Position::new(self.x, self.y)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    Pass,
    Cut,
    Screen,
    Dribble,
    Shot,
}

impl ActionType {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Cut => "cut",
            Self::Screen => "screen",
            Self::Dribble => "dribble",
            Self::Shot => "shot",
        }
    }

    /// Display form used for keyframe names ("Cut", "Pass", ...).
    pub fn title(&self) -> &'static str {
        match self {
            Self::Pass => "Pass",
            Self::Cut => "Cut",
            Self::Screen => "Screen",
            Self::Dribble => "Dribble",
            Self::Shot => "Shot",
        }
    }
}

/// One end of an action: a player reference, raw coordinates, or both.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
}

impl Endpoint {
    pub fn player(id: impl Into<String>) -> Self {
        Self {
            player_id: Some(id.into()),
            ..Self::default()
        }
    }

    pub fn point(x: f64, y: f64) -> Self {
        Self {
            player_id: None,
            x: Some(x),
            y: Some(y),
        }
    }

    pub fn player_at(id: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            player_id: Some(id.into()),
            x: Some(x),
            y: Some(y),
        }
    }

    /// Explicit coordinates, only when both axes are present.
    pub fn coordinates(&self) -> Option<Position> {
        match (self.x, self.y) {
            (Some(x), Some(y)) => Some(Position::new(x, y)),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayAction {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ActionType,
    pub from: Endpoint,
    pub to: Endpoint,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence: Option<u32>,
}

impl PlayAction {
    pub fn new(id: impl Into<String>, kind: ActionType, from: Endpoint, to: Endpoint) -> Self {
        Self {
            id: id.into(),
            kind,
            from,
            to,
            style: None,
            sequence: None,
        }
    }
}

/// Players and actions as authored. Action order is the narrative order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagram {
    #[serde(default)]
    pub players: Vec<Player>,
    #[serde(default)]
    pub actions: Vec<PlayAction>,
}

impl Diagram {
    pub fn new(players: Vec<Player>, actions: Vec<PlayAction>) -> Self {
        Self { players, actions }
    }

    pub fn player(&self, id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    /// Reject coordinates that would poison interpolation (NaN/inf).
    pub fn validate_basic(&self) -> Result<(), AnimationError> {
        for p in &self.players {
            if !p.position().is_finite() {
                return Err(AnimationError::malformed(format!(
                    "player '{}' has non-finite coordinates",
                    p.id
                )));
            }
        }
        for a in &self.actions {
            for (side, end) in [("from", &a.from), ("to", &a.to)] {
                let bad = [end.x, end.y].iter().flatten().any(|v| !v.is_finite());
                if bad {
                    return Err(AnimationError::malformed(format!(
                        "action '{}' has non-finite `{side}` coordinates",
                        a.id
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Parse the editor's diagram JSON (`players[]`, `actions[]`) and validate coordinates.
pub fn parse_diagram_json(s: &str) -> Result<Diagram, AnimationError> {
    let diagram: Diagram = serde_json::from_str(s)?;
    diagram.validate_basic()?;
    Ok(diagram)
}

/// Court role inferred from a player's label.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Role {
    PointGuard,
    ShootingGuard,
    SmallForward,
    PowerForward,
    Center,
}

impl Role {
    /// Accepts position numbers (`"1"`..`"5"`) and abbreviations, case-insensitively.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_uppercase().as_str() {
            "1" | "PG" => Some(Self::PointGuard),
            "2" | "SG" => Some(Self::ShootingGuard),
            "3" | "SF" => Some(Self::SmallForward),
            "4" | "PF" => Some(Self::PowerForward),
            "5" | "C" => Some(Self::Center),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_editor_json() {
        let json = r#"{
            "players": [{ "id": "p1", "label": "1", "x": 400, "y": 350 }],
            "actions": [{
                "id": "a1", "type": "cut",
                "from": { "playerId": "p1" },
                "to": { "x": 400, "y": 150 },
                "style": "dashed"
            }]
        }"#;
        let d = parse_diagram_json(json).unwrap();
        assert_eq!(d.players.len(), 1);
        assert_eq!(d.actions[0].kind, ActionType::Cut);
        assert_eq!(d.actions[0].from.player_id.as_deref(), Some("p1"));
        assert_eq!(d.actions[0].to.coordinates(), Some(Position::new(400.0, 150.0)));
        assert_eq!(d.actions[0].style.as_deref(), Some("dashed"));
    }

    #[test]
    fn missing_lists_default_to_empty() {
        let d = parse_diagram_json("{}").unwrap();
        assert!(d.players.is_empty());
        assert!(d.actions.is_empty());
    }

    #[test]
    fn unknown_action_type_is_a_serialization_error() {
        let json = r#"{ "actions": [{ "id": "a", "type": "alley-oop", "from": {}, "to": {} }] }"#;
        let err = parse_diagram_json(json).unwrap_err();
        assert_eq!(err.category(), "serialization");
    }

    #[test]
    fn half_specified_endpoint_has_no_coordinates() {
        let end = Endpoint {
            player_id: None,
            x: Some(10.0),
            y: None,
        };
        assert_eq!(end.coordinates(), None);
    }

    #[test]
    fn role_lookup() {
        assert_eq!(Role::from_label("1"), Some(Role::PointGuard));
        assert_eq!(Role::from_label(" sf "), Some(Role::SmallForward));
        assert_eq!(Role::from_label("C"), Some(Role::Center));
        assert_eq!(Role::from_label("X"), None);
    }

    #[test]
    fn non_finite_coordinates_are_rejected() {
        let d = Diagram::new(vec![Player::new("p", "1", f64::NAN, 0.0)], vec![]);
        assert!(d.validate_basic().unwrap_err().is_validation());
    }
}
