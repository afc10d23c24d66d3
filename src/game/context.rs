use rand::rngs::SmallRng;
use rand::SeedableRng;
use smallvec::SmallVec;

use crate::engine::{RegistryChange, Subsystem};
use crate::entity::World;
use crate::events::{EventBus, Payload, ENGINE_SOURCE};
use crate::game::state::{GameMode, Trigger};
use crate::input::FrameInput;
use crate::systems::difficulty::DifficultyState;

/// Simulation state handed to every subsystem call.
///
/// Owns the game mode, the play clock, the world and the difficulty progress. Nothing
/// in the simulation reads ambient globals; it all flows through here.
pub struct SimContext {
    bus: EventBus,
    mode: GameMode,
    /// Seconds spent in `Playing` since the run started.
    elapsed: f64,
    pub world: World,
    pub difficulty: DifficultyState,
    /// Commands for the current tick.
    pub input: FrameInput,
    pub rng: SmallRng,
    starting_health: u8,
    source: String,
    triggers: SmallVec<[Trigger; 2]>,
    pending: Vec<RegistryChange>,
}

impl SimContext {
    pub fn new(bus: EventBus, seed: u64, starting_health: u8) -> Self {
        let mut rng = SmallRng::seed_from_u64(seed);
        let world = World::new(starting_health, &mut rng);
        Self {
            bus,
            mode: GameMode::Menu,
            elapsed: 0.0,
            world,
            difficulty: DifficultyState::default(),
            input: FrameInput::new(),
            rng,
            starting_health,
            source: ENGINE_SOURCE.to_string(),
            triggers: SmallVec::new(),
            pending: Vec::new(),
        }
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Publishes on behalf of the subsystem currently being updated.
    pub fn publish(&self, topic: &str, payload: Payload) -> usize {
        self.bus.publish_from(&self.source, topic, payload)
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub(crate) fn set_mode(&mut self, mode: GameMode) {
        self.mode = mode;
    }

    /// Name of the subsystem currently running, or the engine between subsystems.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub(crate) fn set_source(&mut self, source: &str) {
        self.source.clear();
        self.source.push_str(source);
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Elapsed play time in whole seconds.
    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed as u64
    }

    /// Advances the play clock. The clock only moves while playing.
    pub(crate) fn advance_clock(&mut self, dt: f32) {
        if self.mode.is_simulating() {
            self.elapsed += f64::from(dt);
        }
    }

    pub fn score(&self) -> u64 {
        self.world.player.score()
    }

    pub fn health(&self) -> u8 {
        self.world.player.health()
    }

    /// Asks the state machine for a mode change once the current cycle finishes.
    pub fn raise(&mut self, trigger: Trigger) {
        if !self.triggers.contains(&trigger) {
            self.triggers.push(trigger);
        }
    }

    pub(crate) fn take_triggers(&mut self) -> SmallVec<[Trigger; 2]> {
        std::mem::take(&mut self.triggers)
    }

    /// Queues a registration to be applied at the next frame boundary.
    pub fn defer_register(&mut self, name: &str, instance: Box<dyn Subsystem>, priority: i32) {
        self.pending.push(RegistryChange::Register {
            name: name.to_string(),
            instance,
            priority,
        });
    }

    /// Queues an unregistration to be applied at the next frame boundary.
    pub fn defer_unregister(&mut self, name: &str) {
        self.pending.push(RegistryChange::Unregister(name.to_string()));
    }

    pub(crate) fn take_pending(&mut self) -> Vec<RegistryChange> {
        std::mem::take(&mut self.pending)
    }

    /// Puts the run back to its starting state: fresh scene, score, clock and difficulty.
    pub(crate) fn reset_run(&mut self) {
        self.world = World::new(self.starting_health, &mut self.rng);
        self.difficulty = DifficultyState::default();
        self.elapsed = 0.0;
        self.input.clear();
        self.triggers.clear();
    }
}
