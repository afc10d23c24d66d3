#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use forest_survival::config::Config;
use forest_survival::engine::{Engine, RecoveryPolicy, Subsystem};
use forest_survival::entity::World;
use forest_survival::events::{Event, EventBus};
use forest_survival::game::context::SimContext;
use forest_survival::game::state::{GameMode, GameplayStateMachine, Trigger};
use forest_survival::game::Game;
use forest_survival::input::InputCommand;
use forest_survival::persist::MemoryStore;
use forest_survival::systems::profiling::{NoMemoryProbe, PerformanceMonitor, Thresholds};

/// One tick at the default rate.
pub const DT: f32 = 1.0 / 60.0;

/// Collects every event published on a set of topics.
#[derive(Clone, Default)]
pub struct Recorder {
    events: Rc<RefCell<Vec<Event>>>,
}

impl Recorder {
    pub fn attach(bus: &EventBus, topics: &[&str]) -> Self {
        let recorder = Self::default();
        for topic in topics {
            let events = Rc::clone(&recorder.events);
            bus.subscribe(topic, "recorder", move |event| {
                events.borrow_mut().push(event.clone());
                Ok(())
            });
        }
        recorder
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.borrow().clone()
    }

    pub fn topics(&self) -> Vec<String> {
        self.events.borrow().iter().map(|e| e.topic.clone()).collect()
    }

    pub fn count(&self, topic: &str) -> usize {
        self.events.borrow().iter().filter(|e| e.topic == topic).count()
    }

    pub fn last(&self, topic: &str) -> Option<Event> {
        self.events.borrow().iter().rev().find(|e| e.topic == topic).cloned()
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }
}

/// Shared log of hook calls, in call order.
pub type CallLog = Rc<RefCell<Vec<String>>>;

pub fn call_log() -> CallLog {
    Rc::new(RefCell::new(Vec::new()))
}

/// Logs its name on every update and `shutdown:<name>` on shutdown.
pub struct Probe {
    pub name: &'static str,
    pub log: CallLog,
    pub gameplay: bool,
}

impl Probe {
    /// Runs in every mode.
    pub fn new(name: &'static str, log: &CallLog) -> Self {
        Self {
            name,
            log: Rc::clone(log),
            gameplay: false,
        }
    }

    /// Runs only while playing.
    pub fn gameplay(name: &'static str, log: &CallLog) -> Self {
        Self {
            gameplay: true,
            ..Self::new(name, log)
        }
    }
}

impl Subsystem for Probe {
    fn update(&mut self, _ctx: &mut SimContext, _dt: f32) -> anyhow::Result<()> {
        self.log.borrow_mut().push(self.name.to_string());
        Ok(())
    }

    fn shutdown(&mut self, _ctx: &mut SimContext) -> anyhow::Result<()> {
        self.log.borrow_mut().push(format!("shutdown:{}", self.name));
        Ok(())
    }

    fn gameplay_only(&self) -> bool {
        self.gameplay
    }
}

/// Fails every update.
pub struct Failing {
    pub calls: Rc<Cell<u32>>,
}

impl Failing {
    pub fn new(calls: &Rc<Cell<u32>>) -> Self {
        Self { calls: Rc::clone(calls) }
    }
}

impl Subsystem for Failing {
    fn update(&mut self, _ctx: &mut SimContext, _dt: f32) -> anyhow::Result<()> {
        self.calls.set(self.calls.get() + 1);
        anyhow::bail!("sensor offline")
    }

    fn gameplay_only(&self) -> bool {
        false
    }
}

/// Fails the first `failures` updates, then succeeds.
pub struct Flaky {
    pub failures: u32,
}

impl Subsystem for Flaky {
    fn update(&mut self, _ctx: &mut SimContext, _dt: f32) -> anyhow::Result<()> {
        if self.failures > 0 {
            self.failures -= 1;
            anyhow::bail!("transient fault");
        }
        Ok(())
    }

    fn gameplay_only(&self) -> bool {
        false
    }
}

/// Panics on every update.
pub struct Panicking;

impl Subsystem for Panicking {
    fn update(&mut self, _ctx: &mut SimContext, _dt: f32) -> anyhow::Result<()> {
        panic!("index out of range");
    }

    fn gameplay_only(&self) -> bool {
        false
    }
}

/// Defaults with a fixed seed, no memory sampling and no persistence.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.gameplay.seed = Some(7);
    config.performance.memory_sample_interval = 0;
    config
}

/// An engine with nothing registered, sitting in the menu.
pub fn bare_engine(retry_budget: u32) -> Engine {
    let bus = EventBus::new();
    let ctx = SimContext::new(bus.clone(), 7, 3);
    let monitor = PerformanceMonitor::new(Thresholds::for_tick_rate(60), Box::new(NoMemoryProbe), 0);
    Engine::new(bus, ctx, RecoveryPolicy { retry_budget }, monitor)
}

/// Moves a bare engine into `Playing` so gameplay subsystems run.
pub fn start_playing(engine: &mut Engine) {
    GameplayStateMachine::new().apply(engine.context_mut(), Trigger::Start);
}

pub fn new_game() -> Game {
    new_game_with_store(Rc::new(MemoryStore::new(0)))
}

pub fn new_game_with_store(store: Rc<MemoryStore>) -> Game {
    Game::with_parts(&test_config(), Box::new(NoMemoryProbe), Some(Box::new(store))).expect("game should build")
}

/// A game that has left the menu.
pub fn playing_game() -> Game {
    let mut game = new_game();
    game.tick(&[InputCommand::MenuSelect], DT);
    assert_eq!(game.mode(), GameMode::Playing);
    game
}

/// A game that has left the menu, with only the player on the road.
pub fn empty_playing_game(health: u8) -> Game {
    let mut game = playing_game();
    game.context_mut().world = World::empty(health);
    game
}

/// Ticks with no input.
pub fn idle(game: &mut Game, ticks: usize) {
    for _ in 0..ticks {
        game.tick(&[], DT);
    }
}
