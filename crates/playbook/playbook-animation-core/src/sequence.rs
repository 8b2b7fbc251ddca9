//! Animation sequence aggregate: settings, generated timeline and patches.

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::diagram::Diagram;
use crate::error::AnimationError;
use crate::ids::{PlayId, SequenceId};
use crate::keyframes::{build_keyframes, Keyframe};
use crate::paths::{build_movement_paths, MovementPath};
use crate::sampling::{AnimationFrame, FrameSampler};

/// Per-sequence presentation settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnimationSettings {
    pub fps: f64,
    pub auto_play: bool,
    #[serde(rename = "loop")]
    pub looping: bool,
    pub show_trails: bool,
    pub trail_length: usize,
    pub highlight_active_player: bool,
    /// Milliseconds.
    pub transition_duration: f64,
}

impl Default for AnimationSettings {
    fn default() -> Self {
        Self {
            fps: 30.0,
            auto_play: false,
            looping: false,
            show_trails: true,
            trail_length: 5,
            highlight_active_player: true,
            transition_duration: 300.0,
        }
    }
}

impl AnimationSettings {
    pub fn validate(&self, cfg: &EngineConfig) -> Result<(), AnimationError> {
        if !self.fps.is_finite() || self.fps < cfg.min_fps || self.fps > cfg.max_fps {
            return Err(AnimationError::invalid_setting(
                "fps",
                format!("{} is outside [{}, {}]", self.fps, cfg.min_fps, cfg.max_fps),
            ));
        }
        if self.show_trails && self.trail_length == 0 {
            return Err(AnimationError::invalid_setting(
                "trailLength",
                "must be at least 1 when trails are shown",
            ));
        }
        if !self.transition_duration.is_finite() || self.transition_duration < 0.0 {
            return Err(AnimationError::invalid_setting(
                "transitionDuration",
                "must be a non-negative number of milliseconds",
            ));
        }
        Ok(())
    }
}

/// Output of one generation pass over a diagram.
#[derive(Clone, Debug, PartialEq)]
pub struct GeneratedTimeline {
    pub movement_paths: Vec<MovementPath>,
    pub keyframes: Vec<Keyframe>,
    pub frames: Vec<AnimationFrame>,
}

/// Run path building, keyframe extraction and frame sampling at `fps` with default settings.
///
/// Pure: identical inputs produce identical output.
pub fn generate_timeline(
    diagram: &Diagram,
    duration_ms: f64,
    fps: f64,
    cfg: &EngineConfig,
) -> GeneratedTimeline {
    let settings = AnimationSettings {
        fps,
        ..AnimationSettings::default()
    };
    generate_with_settings(diagram, duration_ms, &settings, cfg)
}

/// As [`generate_timeline`], sampling with `settings.fps` and
/// `settings.highlight_active_player`.
pub fn generate_with_settings(
    diagram: &Diagram,
    duration_ms: f64,
    settings: &AnimationSettings,
    cfg: &EngineConfig,
) -> GeneratedTimeline {
    let movement_paths = build_movement_paths(diagram, duration_ms, cfg);
    let keyframes = build_keyframes(diagram, duration_ms, &cfg.pacing);
    let frames = FrameSampler::new(diagram, &movement_paths, duration_ms, &cfg.pacing)
        .highlight_moving(settings.highlight_active_player)
        .sample(duration_ms, settings.fps);
    log::debug!(
        "generated timeline: {} paths, {} keyframes, {} frames over {}ms",
        movement_paths.len(),
        keyframes.len(),
        frames.len(),
        duration_ms
    );
    GeneratedTimeline {
        movement_paths,
        keyframes,
        frames,
    }
}

/// A named, stored animation of one play.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationSequence {
    pub id: SequenceId,
    pub play_id: PlayId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Milliseconds.
    pub duration: f64,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub movement_paths: Vec<MovementPath>,
    pub frames: Vec<AnimationFrame>,
    pub keyframes: Vec<Keyframe>,
    pub settings: AnimationSettings,
}

impl AnimationSequence {
    /// Validate inputs and generate a fresh sequence from `diagram`.
    pub fn generate(
        play_id: PlayId,
        diagram: &Diagram,
        name: impl Into<String>,
        duration_ms: f64,
        settings: AnimationSettings,
        cfg: &EngineConfig,
    ) -> Result<Self, AnimationError> {
        cfg.validate_duration(duration_ms)?;
        settings.validate(cfg)?;
        diagram.validate_basic()?;

        let timeline = generate_with_settings(diagram, duration_ms, &settings, cfg);
        Ok(Self {
            id: SequenceId::new(),
            play_id,
            name: name.into(),
            description: None,
            duration: duration_ms,
            is_default: false,
            movement_paths: timeline.movement_paths,
            frames: timeline.frames,
            keyframes: timeline.keyframes,
            settings,
        })
    }

    /// Replace paths, frames and keyframes with a fresh generation at the current
    /// duration and fps.
    pub fn regenerate(
        &mut self,
        diagram: &Diagram,
        cfg: &EngineConfig,
    ) -> Result<(), AnimationError> {
        cfg.validate_duration(self.duration)?;
        self.settings.validate(cfg)?;
        diagram.validate_basic()?;
        let timeline = generate_with_settings(diagram, self.duration, &self.settings, cfg);
        self.movement_paths = timeline.movement_paths;
        self.frames = timeline.frames;
        self.keyframes = timeline.keyframes;
        Ok(())
    }

    /// Apply a field-level patch. Frames are not regenerated when `duration` changes.
    pub fn apply_patch(
        &mut self,
        patch: SequencePatch,
        cfg: &EngineConfig,
    ) -> Result<(), AnimationError> {
        patch.validate(cfg)?;
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
        }
        if let Some(duration) = patch.duration {
            self.duration = duration;
        }
        if let Some(frames) = patch.frames {
            self.frames = frames;
        }
        if let Some(mut keyframes) = patch.keyframes {
            keyframes.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
            self.keyframes = keyframes;
        }
        if let Some(settings) = patch.settings {
            self.settings = settings;
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, AnimationError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, AnimationError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Request to create a sequence for a play.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSequenceRequest {
    pub play_id: PlayId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Milliseconds.
    pub duration: f64,
    #[serde(default)]
    pub settings: Option<AnimationSettings>,
    /// `None` makes the sequence default only if the play has none yet.
    #[serde(default)]
    pub is_default: Option<bool>,
}

impl CreateSequenceRequest {
    pub fn new(play_id: impl Into<PlayId>, name: impl Into<String>, duration_ms: f64) -> Self {
        Self {
            play_id: play_id.into(),
            name: name.into(),
            description: None,
            duration: duration_ms,
            settings: None,
            is_default: None,
        }
    }
}

/// Field-level replacement; absent fields are left untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SequencePatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub duration: Option<f64>,
    pub frames: Option<Vec<AnimationFrame>>,
    pub keyframes: Option<Vec<Keyframe>>,
    pub settings: Option<AnimationSettings>,
}

impl SequencePatch {
    pub fn validate(&self, cfg: &EngineConfig) -> Result<(), AnimationError> {
        if let Some(duration) = self.duration {
            cfg.validate_duration(duration)?;
        }
        if let Some(settings) = &self.settings {
            settings.validate(cfg)?;
        }
        if let Some(keyframes) = &self.keyframes {
            for kf in keyframes {
                if !kf.timestamp.is_finite() || kf.timestamp < 0.0 {
                    return Err(AnimationError::InvalidTimestamp {
                        field: format!("keyframes[{}].timestamp", kf.id),
                        value: kf.timestamp,
                    });
                }
            }
        }
        if let Some(frames) = &self.frames {
            // Frame lookup is a binary search, so stamps must ascend.
            let mut prev = f64::NEG_INFINITY;
            for (i, f) in frames.iter().enumerate() {
                if !f.timestamp.is_finite() || f.timestamp < 0.0 || f.timestamp < prev {
                    return Err(AnimationError::InvalidTimestamp {
                        field: format!("frames[{i}].timestamp"),
                        value: f.timestamp,
                    });
                }
                prev = f.timestamp;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagram::Player;

    fn lone_player() -> Diagram {
        Diagram::new(vec![Player::new("p1", "1", 400.0, 300.0)], vec![])
    }

    #[test]
    fn settings_defaults() {
        let s = AnimationSettings::default();
        assert_eq!(s.fps, 30.0);
        assert!(s.show_trails);
        assert_eq!(s.trail_length, 5);
        assert!(!s.looping);
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["loop"], false);
        assert_eq!(json["trailLength"], 5);
    }

    #[test]
    fn settings_validation_names_the_field() {
        let cfg = EngineConfig::default();
        let bad = AnimationSettings {
            fps: 0.0,
            ..AnimationSettings::default()
        };
        match bad.validate(&cfg) {
            Err(AnimationError::InvalidSetting { field, .. }) => assert_eq!(field, "fps"),
            other => panic!("unexpected {other:?}"),
        }
        let no_trail = AnimationSettings {
            trail_length: 0,
            ..AnimationSettings::default()
        };
        assert!(no_trail.validate(&cfg).is_err());
    }

    #[test]
    fn generate_rejects_out_of_range_duration() {
        let err = AnimationSequence::generate(
            "play".into(),
            &lone_player(),
            "Too long",
            45_000.0,
            AnimationSettings::default(),
            &EngineConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, AnimationError::DurationOutOfRange { .. }));
    }

    #[test]
    fn duration_patch_keeps_stale_frames() {
        let cfg = EngineConfig::default();
        let mut seq = AnimationSequence::generate(
            "play".into(),
            &lone_player(),
            "Demo",
            10_000.0,
            AnimationSettings::default(),
            &cfg,
        )
        .unwrap();
        let frames_before = seq.frames.clone();
        seq.apply_patch(
            SequencePatch {
                duration: Some(5000.0),
                ..SequencePatch::default()
            },
            &cfg,
        )
        .unwrap();
        assert_eq!(seq.duration, 5000.0);
        assert_eq!(seq.frames, frames_before);

        seq.regenerate(&lone_player(), &cfg).unwrap();
        assert_eq!(seq.frames.len(), 151);
        assert_eq!(seq.keyframes.last().map(|k| k.timestamp), Some(5000.0));
    }

    #[test]
    fn patch_rejects_negative_keyframe() {
        let patch = SequencePatch {
            keyframes: Some(vec![Keyframe::new(
                "k",
                -1.0,
                "Bad",
                crate::keyframes::KeyframeType::Highlight,
            )]),
            ..SequencePatch::default()
        };
        assert!(matches!(
            patch.validate(&EngineConfig::default()),
            Err(AnimationError::InvalidTimestamp { .. })
        ));
    }

    #[test]
    fn patch_rejects_out_of_order_frames() {
        let cfg = EngineConfig::default();
        let mut seq = AnimationSequence::generate(
            "play".into(),
            &lone_player(),
            "Demo",
            2000.0,
            AnimationSettings::default(),
            &cfg,
        )
        .unwrap();
        let before = seq.frames.clone();
        let mut reversed = seq.frames.clone();
        reversed.reverse();
        let err = seq
            .apply_patch(
                SequencePatch {
                    frames: Some(reversed),
                    ..SequencePatch::default()
                },
                &cfg,
            )
            .unwrap_err();
        match err {
            AnimationError::InvalidTimestamp { field, .. } => {
                assert_eq!(field, "frames[1].timestamp")
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(seq.frames, before);
        let nearest = crate::sampling::frame_at(&seq.frames, 1000.0);
        assert_eq!(nearest.map(|f| f.timestamp), Some(1000.0));

        // A subset in ascending order is fine.
        let subset: Vec<_> = before.iter().step_by(2).cloned().collect();
        seq.apply_patch(
            SequencePatch {
                frames: Some(subset),
                ..SequencePatch::default()
            },
            &cfg,
        )
        .unwrap();
    }

    #[test]
    fn highlight_setting_reaches_frames() {
        let cfg = EngineConfig::default();
        let highlighted = |on: bool| {
            let settings = AnimationSettings {
                highlight_active_player: on,
                ..AnimationSettings::default()
            };
            let seq = AnimationSequence::generate(
                "play".into(),
                &lone_player(),
                "Demo",
                4000.0,
                settings,
                &cfg,
            )
            .unwrap();
            // The lone point guard's demo drive runs over [0, 2000].
            let frame = crate::sampling::frame_at(&seq.frames, 1000.0).unwrap();
            frame.player("p1").unwrap().highlight
        };
        assert!(highlighted(true));
        assert!(!highlighted(false));
    }

    #[test]
    fn json_round_trip_preserves_timeline() {
        let seq = AnimationSequence::generate(
            "play".into(),
            &lone_player(),
            "Demo",
            2000.0,
            AnimationSettings::default(),
            &EngineConfig::default(),
        )
        .unwrap();
        let back = AnimationSequence::from_json(&seq.to_json().unwrap()).unwrap();
        assert_eq!(back, seq);
    }
}
