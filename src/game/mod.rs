//! This module contains the main game logic and state.

use tracing::{info, warn};

use crate::config::Config;
use crate::engine::{CycleReport, Engine};
use crate::entity::World;
use crate::error::GameResult;
use crate::events::{topics, EventBus, Payload};
use crate::input::InputCommand;
use crate::persist::{BestScoreStore, JsonFileStore};
use crate::systems::profiling::{MemoryProbe, PerformanceMonitor};
use crate::systems::render::{NullSink, RenderSubsystem};
use crate::systems::{CollisionResolver, DifficultyController, WorldSystem};

use self::context::SimContext;
use self::state::{GameMode, GameplayStateMachine, Trigger};

pub mod context;
pub mod state;

/// Registry names and priorities of the built-in gameplay subsystems.
pub const WORLD: (&str, i32) = ("world", 10);
pub const COLLISION: (&str, i32) = ("collision", 20);
pub const DIFFICULTY: (&str, i32) = ("difficulty", 30);
pub const RENDER: (&str, i32) = ("render", 100);

/// The `Game` struct is the main entry point for the simulation.
///
/// It owns the engine (and through it the simulation context), the mode state machine
/// and the best score, and advances all of them once per tick.
pub struct Game {
    engine: Engine,
    state: GameplayStateMachine,
    store: Option<Box<dyn BestScoreStore>>,
    best_score: u64,
}

impl Game {
    /// Builds a game from configuration, using the platform memory probe and the
    /// configured best-score file.
    pub fn new(config: &Config) -> GameResult<Self> {
        let store = config
            .storage
            .best_score_path
            .as_ref()
            .map(|path| Box::new(JsonFileStore::new(path)) as Box<dyn BestScoreStore>);
        Self::with_parts(config, crate::platform::memory_probe(), store)
    }

    pub fn with_parts(
        config: &Config,
        probe: Box<dyn MemoryProbe>,
        store: Option<Box<dyn BestScoreStore>>,
    ) -> GameResult<Self> {
        let seed = config.gameplay.seed.unwrap_or_else(crate::platform::time_seed);
        info!(seed, tick_rate = config.engine.target_tick_rate, "Creating game");

        let bus = EventBus::new();
        let ctx = SimContext::new(bus.clone(), seed, config.gameplay.starting_health);
        let monitor = PerformanceMonitor::new(
            config.performance.thresholds(config.engine.target_tick_rate),
            probe,
            config.performance.memory_sample_interval,
        );
        let mut engine = Engine::new(bus, ctx, config.engine.policy(), monitor);

        engine.register(WORLD.0, WorldSystem::new(), WORLD.1)?;
        engine.register(COLLISION.0, CollisionResolver::new(), COLLISION.1)?;
        engine.register(DIFFICULTY.0, DifficultyController, DIFFICULTY.1)?;
        engine.register(RENDER.0, RenderSubsystem::new(NullSink::default()), RENDER.1)?;
        engine.initialize();

        let best_score = match store.as_ref().map(|s| s.load()) {
            Some(Ok(best)) => best,
            Some(Err(error)) => {
                warn!(%error, "Could not load best score");
                0
            }
            None => 0,
        };

        Ok(Self {
            engine,
            state: GameplayStateMachine::new(),
            store,
            best_score,
        })
    }

    /// Advances the game by one tick. Returns `false` once a quit has been requested.
    pub fn tick(&mut self, input: &[InputCommand], dt: f32) -> bool {
        self.step(input, dt);
        !self.state.quit_requested()
    }

    /// Advances the game by one tick and hands back what the scheduler did.
    ///
    /// Control commands are applied to the mode machine first, the rest are handed to the
    /// subsystems.
    pub fn step(&mut self, input: &[InputCommand], dt: f32) -> CycleReport {
        for trigger in input.iter().copied().filter_map(Trigger::from_input) {
            self.transition(trigger);
        }

        let ctx = self.engine.context_mut();
        ctx.input = input.iter().copied().filter(|c| !c.is_control()).collect();
        ctx.advance_clock(dt);

        let report = self.engine.run_frame(dt);

        for trigger in self.engine.context_mut().take_triggers() {
            self.transition(trigger);
        }
        self.engine.context_mut().input.clear();
        report
    }

    fn transition(&mut self, trigger: Trigger) {
        let Some(transition) = self.state.apply(self.engine.context_mut(), trigger) else {
            return;
        };

        match transition.to {
            GameMode::GameOver => self.record_best_score(),
            GameMode::Menu => self.engine.context_mut().reset_run(),
            _ => {}
        }
    }

    fn record_best_score(&mut self) {
        let score = self.score();
        if score <= self.best_score {
            return;
        }

        let previous = self.best_score;
        self.best_score = score;
        info!(score, previous, "New best score");

        if let Some(store) = &self.store {
            if let Err(error) = store.save(score) {
                warn!(%error, "Could not save best score");
            }
        }
        self.engine.bus().publish(
            topics::NEW_BEST_SCORE,
            Payload::new().with("score", score).with("previous", previous),
        );
    }

    pub fn mode(&self) -> GameMode {
        self.engine.context().mode()
    }

    pub fn quit_requested(&self) -> bool {
        self.state.quit_requested()
    }

    pub fn score(&self) -> u64 {
        self.engine.context().score()
    }

    pub fn best_score(&self) -> u64 {
        self.best_score
    }

    pub fn health(&self) -> u8 {
        self.engine.context().health()
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.engine.context().elapsed_secs()
    }

    pub fn world(&self) -> &World {
        &self.engine.context().world
    }

    pub fn bus(&self) -> &EventBus {
        self.engine.bus()
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }

    pub fn context(&self) -> &SimContext {
        self.engine.context()
    }

    pub fn context_mut(&mut self) -> &mut SimContext {
        self.engine.context_mut()
    }

    /// Shuts every subsystem down.
    pub fn shutdown(&mut self) {
        self.engine.shutdown();
    }
}
