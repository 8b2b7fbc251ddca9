use playbook_animation_core::{
    parse_diagram_json, AnimationSequence, AnimationSettings, Direction, EngineConfig,
    PlaybackController, PlayerTrails, TransportCommand, TransportEvent,
};
use playbook_test_fixtures::diagrams;

fn sequence(looping: bool) -> (AnimationSequence, EngineConfig) {
    let cfg = EngineConfig::default();
    let diagram = parse_diagram_json(&diagrams::json("five-out-cut").unwrap()).unwrap();
    let settings = AnimationSettings {
        auto_play: true,
        looping,
        ..AnimationSettings::default()
    };
    let seq =
        AnimationSequence::generate("five-out".into(), &diagram, "Cut", 10_000.0, settings, &cfg)
            .unwrap();
    (seq, cfg)
}

#[test]
fn plays_through_to_the_end_and_stops() {
    let (seq, cfg) = sequence(false);
    let mut c = PlaybackController::for_sequence(&seq, &cfg);
    assert!(c.is_playing());

    let mut ticks = 0;
    let event = loop {
        ticks += 1;
        if let Some(ev) = c.tick() {
            break ev;
        }
        assert!(ticks < 1000, "transport never ended");
    };
    assert_eq!(event, TransportEvent::Ended { time: 10_000.0 });
    // 600 ideal steps of 1000/60 ms, give or take accumulated rounding.
    assert!((600..=601).contains(&ticks), "ended after {ticks} ticks");
    assert!(!c.is_playing());
    assert_eq!(c.current_frame(&seq.frames).map(|f| f.timestamp), Some(10_000.0));
    assert_eq!(c.current_keyframe(&seq.keyframes).map(|k| k.id.as_str()), Some("end"));
}

#[test]
fn looping_wraps_near_zero() {
    let (seq, cfg) = sequence(true);
    let mut c = PlaybackController::for_sequence(&seq, &cfg);
    c.seek(seq.duration - 1.0);
    assert_eq!(c.tick(), Some(TransportEvent::Looped { time: 0.0 }));
    assert!(c.is_playing());
    assert!(c.current_time() < 1.0);
}

#[test]
fn variable_deltas_resolve_to_nearest_frame() {
    let (seq, cfg) = sequence(false);
    let mut c = PlaybackController::for_sequence(&seq, &cfg);
    for dt in [7.0, 13.5, 21.25, 3.0] {
        c.advance(dt);
        let frame = c.current_frame(&seq.frames).unwrap();
        assert!((frame.timestamp - c.current_time()).abs() <= 1000.0 / 60.0);
    }
}

#[test]
fn commands_drive_the_transport() {
    let (seq, cfg) = sequence(false);
    let mut c = PlaybackController::for_sequence(&seq, &cfg);
    let kfs = &seq.keyframes;

    c.apply(TransportCommand::Pause, kfs);
    c.apply(TransportCommand::Seek { time: 4_000.0 }, kfs);
    c.apply(TransportCommand::NextKeyframe, kfs);
    assert_eq!(c.current_time(), 10_000.0);
    c.apply(TransportCommand::PreviousKeyframe, kfs);
    assert_eq!(c.current_time(), 1_000.0);
    assert_eq!(c.current_keyframe(kfs).map(|k| k.name.as_str()), Some("Cut"));

    c.apply(TransportCommand::SetSpeed { speed: 0.5 }, kfs);
    c.apply(TransportCommand::SetDirection { direction: Direction::Backward }, kfs);
    c.apply(TransportCommand::Play, kfs);
    c.tick();
    assert!((c.current_time() - (1_000.0 - 500.0 / 60.0)).abs() < 1e-9);

    c.apply(TransportCommand::Restart, kfs);
    assert_eq!(c.current_time(), 0.0);
    assert!(!c.is_playing());
}

#[test]
fn commands_deserialize_from_host_json() {
    let cmd: TransportCommand = serde_json::from_str(r#"{"Seek":{"time":1200.0}}"#).unwrap();
    assert_eq!(cmd, TransportCommand::Seek { time: 1200.0 });
    let cmd: TransportCommand = serde_json::from_str(r#""Toggle""#).unwrap();
    assert_eq!(cmd, TransportCommand::Toggle);
}

#[test]
fn trails_follow_playback_and_reset_on_loop() {
    let (seq, cfg) = sequence(true);
    let mut c = PlaybackController::for_sequence(&seq, &cfg);
    let mut trails = PlayerTrails::from_settings(&seq.settings);
    c.seek(4_900.0);
    for _ in 0..10 {
        c.tick();
        trails.record(c.current_frame(&seq.frames).unwrap());
    }
    let p1 = trails.trail("P1").unwrap();
    assert_eq!(p1.len(), seq.settings.trail_length);
    assert!(p1.iter().zip(p1.iter().skip(1)).all(|(a, b)| b.y <= a.y));

    c.seek(seq.duration - 1.0);
    c.tick();
    trails.record(c.current_frame(&seq.frames).unwrap());
    assert_eq!(trails.trail("P1").map(|t| t.len()), Some(1));
}
