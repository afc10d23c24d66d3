use glam::Vec2;

use crate::constants::{player, GROUND_Y};
use crate::entity::animation::Animation;
use crate::entity::collision::{Rect, Shield, Tier};

/// Running cycle used while the player is advancing.
const RUN_FRAMES: [f32; 4] = [0.1, 0.1, 0.1, 0.1];

/// Result of a hazard reaching the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitOutcome {
    /// Health dropped by one and the grace period started.
    Damaged { health: u8 },
    /// The hit took the last point of health.
    Killed,
    /// The grace period from an earlier hit is still running.
    Ignored,
}

/// The player-controlled runner.
///
/// The player stays at a fixed screen x; `position` is the bottom-left anchor and only
/// its y component changes (jumping). Forward progress is tracked as distance steps.
#[derive(Debug, Clone)]
pub struct Player {
    pub position: Vec2,
    pub velocity: Vec2,
    airborne: bool,
    duck_timer: f32,
    pub shield: Shield,
    health: u8,
    invincibility: f32,
    distance: u64,
    moved_this_tick: bool,
    animation: Animation,
}

impl Player {
    pub fn new(health: u8) -> Self {
        Self {
            position: Vec2::new(player::X, GROUND_Y),
            velocity: Vec2::ZERO,
            airborne: false,
            duck_timer: 0.0,
            shield: Shield::default(),
            health: health.min(player::MAX_HEALTH),
            invincibility: 0.0,
            distance: 0,
            moved_this_tick: false,
            animation: Animation::new(&RUN_FRAMES),
        }
    }

    /// Starts a jump. Only possible from the ground.
    pub fn jump(&mut self) -> bool {
        if self.airborne || !self.is_alive() {
            return false;
        }
        self.airborne = true;
        self.velocity.y = player::JUMP_VELOCITY;
        self.duck_timer = 0.0;
        true
    }

    /// Starts a duck/slide, or cuts the current one short when already ducking.
    pub fn toggle_duck(&mut self) -> bool {
        if self.airborne || !self.is_alive() {
            return false;
        }
        if self.is_ducking() {
            self.duck_timer = 0.0;
            false
        } else {
            self.duck_timer = player::DUCK_DURATION;
            true
        }
    }

    /// Advances one movement step. Returns the new distance.
    pub fn step(&mut self) -> u64 {
        self.distance += 1;
        self.moved_this_tick = true;
        self.distance
    }

    pub fn toggle_shield(&mut self) {
        self.shield.toggle();
    }

    pub fn set_shield(&mut self, tier: Tier) {
        self.shield.set(tier);
    }

    pub fn cycle_shield(&mut self) {
        self.shield.cycle();
    }

    /// Integrates jump kinematics and counts down the duck and grace timers.
    pub fn update(&mut self, dt: f32) {
        if self.airborne {
            self.position.y += self.velocity.y * dt;
            self.velocity.y += player::GRAVITY * dt;

            if self.position.y >= GROUND_Y {
                self.position.y = GROUND_Y;
                self.velocity.y = 0.0;
                self.airborne = false;
            }
        }

        self.duck_timer = (self.duck_timer - dt).max(0.0);
        self.invincibility = (self.invincibility - dt).max(0.0);

        if self.moved_this_tick {
            self.animation.tick(dt);
        } else {
            self.animation.restart();
        }
        self.moved_this_tick = false;
    }

    /// Applies a qualifying hit, respecting the grace period.
    pub fn apply_hit(&mut self) -> HitOutcome {
        if self.is_invincible() || !self.is_alive() {
            return HitOutcome::Ignored;
        }

        self.health -= 1;
        self.invincibility = player::INVINCIBILITY;
        if self.health == 0 {
            self.shield.active = false;
            HitOutcome::Killed
        } else {
            HitOutcome::Damaged { health: self.health }
        }
    }

    /// Collision box; ducking keeps the feet planted and lowers the top edge.
    pub fn bounding_box(&self) -> Rect {
        let height = if self.is_ducking() {
            player::DUCK_HEIGHT
        } else {
            player::SIZE.y
        };
        Rect::from_bottom_left(self.position.x, self.position.y, Vec2::new(player::SIZE.x, height))
    }

    pub fn health(&self) -> u8 {
        self.health
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    pub fn is_airborne(&self) -> bool {
        self.airborne
    }

    pub fn is_ducking(&self) -> bool {
        self.duck_timer > 0.0
    }

    pub fn is_invincible(&self) -> bool {
        self.invincibility > 0.0
    }

    pub fn invincibility_remaining(&self) -> f32 {
        self.invincibility
    }

    pub fn distance(&self) -> u64 {
        self.distance
    }

    /// One point per ten movement steps.
    pub fn score(&self) -> u64 {
        self.distance / player::STEPS_PER_POINT
    }

    pub fn animation_frame(&self) -> u8 {
        self.animation.current_frame()
    }
}
