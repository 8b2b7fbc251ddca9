//! Playbook animation core
//!
//! Turns a static play diagram (players and actions) into a timed animation: movement
//! paths, narrative keyframes and densely sampled frames, plus the transport that plays
//! them back. Generation is pure; persistence and diagram lookup are injected through
//! the ports in [`store`].

pub mod config;
pub mod diagram;
pub mod error;
pub mod geometry;
pub mod ids;
pub mod keyframes;
pub mod paths;
pub mod playback;
pub mod sampling;
pub mod sequence;
pub mod store;
pub mod timing;
pub mod trails;

// Re-exports for hosts
pub use config::{Court, EngineConfig, Pacing};
pub use diagram::{parse_diagram_json, ActionType, Diagram, Endpoint, PlayAction, Player, Role};
pub use error::AnimationError;
pub use geometry::{Position, Velocity};
pub use ids::{PlayId, SequenceId};
pub use keyframes::{
    build_keyframes, keyframe_near, next_keyframe, previous_keyframe, Keyframe, KeyframeType,
};
pub use paths::{build_movement_paths, validate_paths, InterpolationType, MovementPath, PathIndex};
pub use playback::{
    AnimationPlayback, Direction, PlaybackController, TransportCommand, TransportEvent,
};
pub use sampling::{
    frame_at, frame_count, sample_frames, ActiveAction, AnimatedPlayer, AnimationFrame,
    FrameSampler,
};
pub use sequence::{
    generate_timeline, generate_with_settings, AnimationSequence, AnimationSettings,
    CreateSequenceRequest, GeneratedTimeline, SequencePatch,
};
pub use store::{
    DiagramSource, MemoryDiagramSource, MemorySequenceStore, SequenceLibrary, SequenceStore,
};
pub use timing::{action_windows, nearest_index, TimeWindow};
pub use trails::PlayerTrails;

pub type Result<T> = std::result::Result<T, AnimationError>;
