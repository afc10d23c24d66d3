//! Input sources feeding the per-tick command buffer.

use smallvec::{smallvec, SmallVec};

use crate::constants::{ninja, player, wizard, SCROLL_PER_STEP, TARGET_TICK_RATE};
use crate::entity::enemy::Enemy;
use crate::entity::ninja::NinjaPhase;
use crate::game::context::SimContext;
use crate::game::state::GameMode;

pub mod commands;

pub use commands::InputCommand;

/// Commands collected for a single tick.
pub type FrameInput = SmallVec<[InputCommand; 4]>;

/// Anything that can produce the commands for the next tick.
pub trait InputSource {
    fn poll(&mut self, ctx: &SimContext) -> FrameInput;
}

/// Seconds into a jump at which the player is highest.
const JUMP_APEX: f32 = -player::JUMP_VELOCITY / player::GRAVITY;
/// Lead time before a wizard reaches the player at which to start ducking.
const DUCK_LEAD: f32 = 0.15;

/// Plays the game without a human: keeps moving, jumps ground hazards, ducks wizards
/// and raises the shield at the tier of the nearest incoming projectile.
#[derive(Debug, Default)]
pub struct Autopilot {
    /// Restart automatically after a game over instead of quitting.
    pub restart: bool,
}

impl Autopilot {
    pub fn new(restart: bool) -> Self {
        Self { restart }
    }

    fn steer(&self, ctx: &SimContext, input: &mut FrameInput) {
        let world = &ctx.world;
        let player = &world.player;
        let front = player.bounding_box().right();
        let tick_rate = TARGET_TICK_RATE as f32;
        let ground_speed = SCROLL_PER_STEP * ctx.difficulty.multiplier() * tick_rate;

        let mut jump = false;
        let mut duck = false;
        for enemy in &world.enemies {
            let Some(hitbox) = enemy.hitbox() else { continue };
            let gap = hitbox.left() - front;
            if gap < 0.0 {
                continue;
            }
            let span = hitbox.size.x + player::SIZE.x;

            match enemy {
                Enemy::Crocodile(_) | Enemy::DangerTree(_) => {
                    jump |= (gap + span / 2.0) / ground_speed <= JUMP_APEX;
                }
                Enemy::Ninja(n) if matches!(n.phase(), NinjaPhase::Melee { .. }) => {
                    let speed = ground_speed + ninja::MELEE_SPEED;
                    jump |= (gap + span / 2.0) / speed <= JUMP_APEX;
                }
                Enemy::Wizard(_) => {
                    let level = usize::from(ctx.difficulty.level().clamp(1, 3) - 1);
                    let speed = ground_speed + wizard::SPEEDS[level];
                    duck |= gap / speed <= DUCK_LEAD;
                }
                _ => {}
            }
        }

        if duck && !player.is_ducking() && !player.is_airborne() {
            input.push(InputCommand::DuckToggle);
        } else if jump && !player.is_airborne() && !player.is_ducking() {
            input.push(InputCommand::Jump);
        }

        let incoming = world
            .ninja()
            .and_then(|n| n.projectiles().iter().filter(|p| p.x >= player.position.x).min_by(|a, b| a.x.total_cmp(&b.x)));
        if let Some(projectile) = incoming {
            if player.shield.position != projectile.tier {
                input.push(InputCommand::ShieldSet(projectile.tier));
            }
            if !player.shield.active {
                input.push(InputCommand::ShieldToggle);
            }
        }
    }
}

impl InputSource for Autopilot {
    fn poll(&mut self, ctx: &SimContext) -> FrameInput {
        match ctx.mode() {
            GameMode::Menu => smallvec![InputCommand::MenuSelect],
            GameMode::GameOver if self.restart => smallvec![InputCommand::Restart],
            GameMode::GameOver => smallvec![InputCommand::Quit],
            GameMode::Paused => smallvec![InputCommand::PauseToggle],
            GameMode::Playing => {
                let mut input: FrameInput = smallvec![InputCommand::Move];
                self.steer(ctx, &mut input);
                input
            }
        }
    }
}
