//! Applies player input and advances every entity on the road.

use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::engine::Subsystem;
use crate::entity::enemy::{EnemyTick, WorldEvent};
use crate::events::{topics, Payload};
use crate::game::context::SimContext;
use crate::input::InputCommand;

/// Moves the player and the enemies, and reports what happened on the bus.
#[derive(Debug, Default)]
pub struct WorldSystem {
    last_score: u64,
}

impl WorldSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies this tick's commands to the player. Returns the number of movement steps.
    fn apply_input(ctx: &mut SimContext) -> u32 {
        let mut steps = 0;
        let commands = ctx.input.clone();

        for command in commands {
            let player = &mut ctx.world.player;
            match command {
                InputCommand::Move => {
                    if player.is_alive() {
                        player.step();
                        steps += 1;
                    }
                }
                InputCommand::Jump => {
                    if player.jump() {
                        trace!("Player jumped");
                        ctx.publish(topics::PLAYER_JUMPED, Payload::new());
                    }
                }
                InputCommand::DuckToggle => {
                    let was_ducking = player.is_ducking();
                    player.toggle_duck();
                    let ducking = player.is_ducking();
                    if ducking != was_ducking {
                        ctx.publish(topics::PLAYER_DUCKED, Payload::new().with("ducking", ducking));
                    }
                }
                InputCommand::ShieldToggle | InputCommand::ShieldSet(_) | InputCommand::ShieldCycle => {
                    let before = player.shield;
                    match command {
                        InputCommand::ShieldToggle => player.toggle_shield(),
                        InputCommand::ShieldSet(tier) => player.set_shield(tier),
                        _ => player.cycle_shield(),
                    }
                    let shield = player.shield;
                    if shield != before {
                        debug!(active = shield.active, position = %shield.position, "Shield changed");
                        ctx.publish(
                            topics::SHIELD_CHANGED,
                            Payload::new()
                                .with("active", shield.active)
                                .with("position", shield.position.to_string()),
                        );
                    }
                }
                _ => {}
            }
        }
        steps
    }
}

impl Subsystem for WorldSystem {
    fn init(&mut self, ctx: &mut SimContext) -> anyhow::Result<()> {
        self.last_score = ctx.score();
        Ok(())
    }

    fn update(&mut self, ctx: &mut SimContext, dt: f32) -> anyhow::Result<()> {
        let steps = Self::apply_input(ctx);

        let score = ctx.score();
        if score != self.last_score {
            self.last_score = score;
            ctx.publish(
                topics::SCORE_UPDATED,
                Payload::new()
                    .with("score", score)
                    .with("distance", ctx.world.player.distance()),
            );
        }

        ctx.world.player.update(dt);

        let mut events = SmallVec::<[WorldEvent; 4]>::new();
        let multiplier = ctx.difficulty.multiplier();
        let level = ctx.difficulty.level();
        let cadence = ctx.difficulty.cadence();
        let allowed = ctx.difficulty.allowed();
        let mut tick = EnemyTick {
            dt,
            steps,
            multiplier,
            level,
            cadence,
            allowed,
            rng: &mut ctx.rng,
            events: &mut events,
        };
        for enemy in ctx.world.enemies.iter_mut() {
            enemy.update(&mut tick);
        }

        for event in events {
            match event {
                WorldEvent::WizardWarning { delay } => {
                    debug!(delay, "Wizard incoming");
                    ctx.publish(topics::WIZARD_WARNING, Payload::new().with("delay", delay));
                }
                WorldEvent::NinjaPhase { from, to } => {
                    debug!(%from, %to, "Ninja phase changed");
                    let from: &'static str = from.into();
                    let to: &'static str = to.into();
                    ctx.publish(
                        topics::NINJA_PHASE_CHANGED,
                        Payload::new().with("from", from).with("phase", to).with("score", score),
                    );
                }
                WorldEvent::ProjectileFired { tier } => {
                    ctx.publish(topics::PROJECTILE_FIRED, Payload::new().with("tier", tier.to_string()));
                }
            }
        }

        if ctx.world.remove_finished() > 0 {
            ctx.difficulty.end_encounter(score);
            debug!(score, next = ctx.difficulty.next_encounter_score(), "Ninja encounter over");
        }

        Ok(())
    }
}
