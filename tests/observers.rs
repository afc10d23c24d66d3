use std::cell::RefCell;
use std::rc::Rc;

use forest_survival::audio::{attach_audio, cue_for, Cue, RecordingSink};
use forest_survival::events::{topics, EventBus, Payload};
use forest_survival::input::InputCommand;
use forest_survival::systems::diagnostics::{DiagnosticsLog, DIAGNOSTIC_HISTORY};
use pretty_assertions::assert_eq;
use speculoos::prelude::*;

mod common;

use common::{bare_engine, new_game, Failing, DT};

#[test]
fn test_cue_mapping() {
    assert_eq!(cue_for(topics::PLAYER_JUMPED), Some(Cue::Jump));
    assert_eq!(cue_for(topics::SHIELD_BLOCKED), Some(Cue::Block));
    assert_eq!(cue_for(topics::NEW_BEST_SCORE), Some(Cue::NewBest));
    assert_eq!(cue_for(topics::SCORE_UPDATED), None);
    assert_eq!(cue_for("SOMETHING_ELSE"), None);
}

#[test]
fn test_audio_follows_gameplay_and_mutes_while_paused() {
    let mut game = new_game();
    let sink = Rc::new(RefCell::new(RecordingSink::default()));
    attach_audio(game.bus(), Rc::clone(&sink));

    game.tick(&[InputCommand::MenuSelect], DT);
    game.tick(&[InputCommand::Jump], DT);
    game.tick(&[InputCommand::PauseToggle], DT);
    game.bus().publish(topics::LEVEL_UP, Payload::new());
    game.tick(&[InputCommand::PauseToggle], DT);
    game.bus().publish(topics::LEVEL_UP, Payload::new());

    let played = sink.borrow().played.clone();
    assert_that(&played.first().copied()).is_equal_to(Some(Cue::Start));
    assert_that(&played.contains(&Cue::Jump)).is_true();
    assert_that(&played.iter().filter(|&&c| c == Cue::LevelUp).count()).is_equal_to(1);
    assert_that(&sink.borrow().muted).is_false();
}

#[test]
fn test_audio_detaches_by_owner() {
    let bus = EventBus::new();
    let sink = Rc::new(RefCell::new(RecordingSink::default()));
    let ids = attach_audio(&bus, Rc::clone(&sink));

    assert_that(&ids.len()).is_equal_to(11);
    assert_that(&bus.unsubscribe_owner("audio")).is_equal_to(11);
    bus.publish(topics::PLAYER_DIED, Payload::new());
    assert_that(&sink.borrow().played.is_empty()).is_true();
}

#[test]
fn test_diagnostics_capture_subsystem_faults() {
    let mut engine = bare_engine(2);
    let log = DiagnosticsLog::new();
    log.attach(engine.bus());
    let calls = Rc::new(std::cell::Cell::new(0));

    engine.register("sensor", Failing::new(&calls), 0).unwrap();
    engine.initialize();
    for _ in 0..4 {
        engine.run_frame(DT);
    }

    assert_that(&log.count(topics::SYSTEM_ERROR)).is_equal_to(2);
    assert_that(&log.count(topics::SUBSYSTEM_FAILED)).is_equal_to(1);

    let records: Vec<_> = log
        .snapshot()
        .into_iter()
        .filter(|r| r.topic != topics::PERFORMANCE_WARNING)
        .collect();
    assert_eq!(records[0].topic, topics::SYSTEM_ERROR);
    assert_that(&records[0].detail).contains("subsystem=sensor");
    assert_that(&records[0].detail).contains("status=degraded");
    assert_eq!(records.last().unwrap().topic, topics::SUBSYSTEM_FAILED);
}

#[test]
fn test_diagnostics_keep_only_recent_history() {
    let bus = EventBus::new();
    let log = DiagnosticsLog::new();
    log.attach(&bus);

    for i in 0..(DIAGNOSTIC_HISTORY as u64 + 10) {
        bus.publish(topics::PERFORMANCE_WARNING, Payload::new().with("sample", i));
    }
    bus.publish(topics::SCORE_UPDATED, Payload::new());

    assert_that(&log.len()).is_equal_to(DIAGNOSTIC_HISTORY);
    assert_eq!(log.snapshot()[0].detail, "sample=10");
    assert_that(&log.count(topics::SCORE_UPDATED)).is_equal_to(0);
}

#[test]
fn test_diagnostics_clones_share_history() {
    let bus = EventBus::new();
    let log = DiagnosticsLog::new();
    let view = log.clone();
    log.attach(&bus);

    bus.publish(topics::MEMORY_THRESHOLD_EXCEEDED, Payload::new().with("bytes", 10u64));

    assert_that(&view.is_empty()).is_false();
    assert_eq!(view.snapshot()[0].source, "engine");
}
