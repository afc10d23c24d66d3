//! Sound cues driven by gameplay events.
//!
//! The engine never plays audio itself. It maps bus topics to [`Cue`]s and hands them
//! to an [`AudioSink`], which owns the actual device (or nothing, when headless).

use std::cell::RefCell;
use std::rc::Rc;

use strum_macros::{Display, EnumIter, IntoStaticStr};
use tracing::{debug, trace};

use crate::events::{topics, EventBus, SubscriptionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Cue {
    Start,
    Jump,
    Hurt,
    Death,
    Block,
    LevelUp,
    Warning,
    Throw,
    NewBest,
}

/// Which cue, if any, a topic plays.
pub fn cue_for(topic: &str) -> Option<Cue> {
    let cue = match topic {
        topics::GAME_STARTED => Cue::Start,
        topics::PLAYER_JUMPED => Cue::Jump,
        topics::PLAYER_DAMAGED => Cue::Hurt,
        topics::PLAYER_DIED => Cue::Death,
        topics::SHIELD_BLOCKED => Cue::Block,
        topics::LEVEL_UP => Cue::LevelUp,
        topics::WIZARD_WARNING => Cue::Warning,
        topics::PROJECTILE_FIRED => Cue::Throw,
        topics::NEW_BEST_SCORE => Cue::NewBest,
        _ => return None,
    };
    Some(cue)
}

/// Plays cues. Implementations decide what "playing" means.
pub trait AudioSink {
    fn play(&mut self, cue: Cue) -> anyhow::Result<()>;

    fn set_muted(&mut self, _muted: bool) {}
}

/// Remembers every cue instead of playing it.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub played: Vec<Cue>,
    pub muted: bool,
}

impl AudioSink for RecordingSink {
    fn play(&mut self, cue: Cue) -> anyhow::Result<()> {
        if !self.muted {
            self.played.push(cue);
        }
        Ok(())
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }
}

/// Headless sink: cues only show up in the log.
#[derive(Debug, Default)]
pub struct LoggingSink {
    muted: bool,
    played: u64,
}

impl LoggingSink {
    pub fn played(&self) -> u64 {
        self.played
    }
}

impl AudioSink for LoggingSink {
    fn play(&mut self, cue: Cue) -> anyhow::Result<()> {
        if !self.muted {
            self.played += 1;
            debug!(%cue, "Cue");
        }
        Ok(())
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }
}

/// Subscribes `sink` to every topic that has a cue, pausing it with the game.
pub fn attach_audio<S: AudioSink + 'static>(bus: &EventBus, sink: Rc<RefCell<S>>) -> Vec<SubscriptionId> {
    let cued = [
        topics::GAME_STARTED,
        topics::PLAYER_JUMPED,
        topics::PLAYER_DAMAGED,
        topics::PLAYER_DIED,
        topics::SHIELD_BLOCKED,
        topics::LEVEL_UP,
        topics::WIZARD_WARNING,
        topics::PROJECTILE_FIRED,
        topics::NEW_BEST_SCORE,
    ];

    let mut ids: Vec<SubscriptionId> = cued
        .iter()
        .filter_map(|topic| cue_for(topic).map(|cue| (*topic, cue)))
        .map(|(topic, cue)| {
            let sink = Rc::clone(&sink);
            bus.subscribe(topic, "audio", move |_| {
                trace!(%cue, "Playing cue");
                sink.borrow_mut().play(cue)
            })
        })
        .collect();

    for (topic, muted) in [(topics::GAME_PAUSED, true), (topics::GAME_RESUMED, false)] {
        let sink = Rc::clone(&sink);
        ids.push(bus.subscribe(topic, "audio", move |_| {
            sink.borrow_mut().set_muted(muted);
            Ok(())
        }));
    }
    ids
}
