//! The ninja boss encounter.
//!
//! The ninja walks in from beyond the screen edge, stops at range to throw a fixed
//! number of projectiles, then charges the player with periodic jump attacks. The
//! encounter resolves once it has passed fully behind the player.

use glam::Vec2;
use rand::Rng;
use strum_macros::{Display, IntoStaticStr};

use crate::constants::{ninja, player, projectile, GROUND_Y, SCREEN_WIDTH};
use crate::entity::animation::Animation;
use crate::entity::collision::{Rect, Tier};
use crate::entity::enemy::{EnemyTick, WorldEvent};
use crate::systems::render::{RenderItem, Sprite};

/// Phase names without their timers, for events and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum NinjaPhaseKind {
    Approaching,
    Ranged,
    Melee,
    Resolved,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NinjaPhase {
    /// Closing in from off-screen.
    Approaching,
    /// Holding position and throwing on a fixed cadence.
    Ranged { fired: u8, cooldown: f32 },
    /// Charging the player, jumping whenever the attack timer runs out.
    Melee { attack_cooldown: f32 },
    /// Passed the player; the encounter is over.
    Resolved,
}

impl NinjaPhase {
    pub fn kind(&self) -> NinjaPhaseKind {
        match self {
            NinjaPhase::Approaching => NinjaPhaseKind::Approaching,
            NinjaPhase::Ranged { .. } => NinjaPhaseKind::Ranged,
            NinjaPhase::Melee { .. } => NinjaPhaseKind::Melee,
            NinjaPhase::Resolved => NinjaPhaseKind::Resolved,
        }
    }
}

/// A thrown star travelling left at one of the three tiers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projectile {
    pub tier: Tier,
    pub x: f32,
    pub speed: f32,
}

impl Projectile {
    pub fn new(tier: Tier, x: f32) -> Self {
        Self {
            tier,
            x,
            speed: projectile::SPEED,
        }
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(Vec2::new(self.x, self.tier.projectile_top()), projectile::SIZE)
    }
}

#[derive(Debug, Clone)]
pub struct Ninja {
    pub x: f32,
    bottom: f32,
    vertical_velocity: f32,
    phase: NinjaPhase,
    projectiles: Vec<Projectile>,
    animation: Animation,
}

impl Default for Ninja {
    fn default() -> Self {
        Self::new()
    }
}

impl Ninja {
    /// A fresh encounter starting beyond the right screen edge.
    pub fn new() -> Self {
        Self::at(SCREEN_WIDTH + ninja::SPAWN_OFFSET, NinjaPhase::Approaching)
    }

    pub fn at(x: f32, phase: NinjaPhase) -> Self {
        Self {
            x,
            bottom: GROUND_Y,
            vertical_velocity: 0.0,
            phase,
            projectiles: Vec::with_capacity(usize::from(ninja::PROJECTILES_PER_ENCOUNTER)),
            animation: Animation::new(&ninja::FRAMES),
        }
    }

    pub fn phase(&self) -> NinjaPhase {
        self.phase
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self.phase, NinjaPhase::Resolved)
    }

    pub fn is_airborne(&self) -> bool {
        self.bottom < GROUND_Y
    }

    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    /// Removes a projectile that hit or was blocked.
    pub fn take_projectile(&mut self, index: usize) -> Option<Projectile> {
        (index < self.projectiles.len()).then(|| self.projectiles.remove(index))
    }

    /// Throws a projectile from the ninja's current position.
    pub fn throw(&mut self, tier: Tier) {
        self.projectiles.push(Projectile::new(tier, self.x));
    }

    pub fn hitbox(&self) -> Option<Rect> {
        (!self.is_resolved()).then(|| Rect::from_bottom_left(self.x, self.bottom, ninja::SIZE))
    }

    pub(crate) fn update(&mut self, tick: &mut EnemyTick) {
        let dt = tick.dt;
        let scroll = tick.scroll();
        let before = self.phase.kind();

        for projectile in self.projectiles.iter_mut() {
            projectile.x -= projectile.speed * dt + scroll;
        }
        self.projectiles.retain(|p| p.x + projectile::SIZE.x > 0.0);

        self.phase = match self.phase {
            NinjaPhase::Approaching => {
                self.x -= ninja::APPROACH_SPEED * dt + scroll;
                if self.x <= ninja::RANGED_X {
                    self.x = ninja::RANGED_X;
                    NinjaPhase::Ranged { fired: 0, cooldown: 0.0 }
                } else {
                    NinjaPhase::Approaching
                }
            }
            NinjaPhase::Ranged { fired, cooldown } => {
                let cooldown = cooldown - dt;
                if fired < ninja::PROJECTILES_PER_ENCOUNTER && cooldown <= 0.0 {
                    let tier = Tier::from_index(tick.rng.random_range(0..3));
                    self.throw(tier);
                    tick.events.push(WorldEvent::ProjectileFired { tier });
                    NinjaPhase::Ranged {
                        fired: fired + 1,
                        cooldown: ninja::FIRE_INTERVAL * tick.cadence,
                    }
                } else if fired >= ninja::PROJECTILES_PER_ENCOUNTER && self.projectiles.is_empty() {
                    NinjaPhase::Melee {
                        attack_cooldown: ninja::MELEE_ATTACK_INTERVAL * tick.cadence,
                    }
                } else {
                    NinjaPhase::Ranged { fired, cooldown }
                }
            }
            NinjaPhase::Melee { attack_cooldown } => {
                self.x -= ninja::MELEE_SPEED * dt + scroll;

                let mut attack_cooldown = attack_cooldown - dt;
                if attack_cooldown <= 0.0 && !self.is_airborne() {
                    self.vertical_velocity = ninja::JUMP_VELOCITY;
                    attack_cooldown = ninja::MELEE_ATTACK_INTERVAL * tick.cadence;
                }

                if self.x + ninja::SIZE.x < player::X {
                    NinjaPhase::Resolved
                } else {
                    NinjaPhase::Melee { attack_cooldown }
                }
            }
            NinjaPhase::Resolved => NinjaPhase::Resolved,
        };

        if self.vertical_velocity != 0.0 || self.is_airborne() {
            self.bottom += self.vertical_velocity * dt;
            self.vertical_velocity += player::GRAVITY * dt;
            if self.bottom >= GROUND_Y {
                self.bottom = GROUND_Y;
                self.vertical_velocity = 0.0;
            }
        }

        self.animation.tick(dt);

        let after = self.phase.kind();
        if before != after {
            tick.events.push(WorldEvent::NinjaPhase { from: before, to: after });
        }
    }

    pub(crate) fn render_items(&self, out: &mut Vec<RenderItem>) {
        if let Some(bounds) = self.hitbox() {
            let sprite = if self.is_airborne() { Sprite::NinjaAttack } else { Sprite::Ninja };
            out.push(RenderItem::new(sprite, self.animation.current_frame(), bounds));
        }
        out.extend(
            self.projectiles
                .iter()
                .map(|p| RenderItem::new(Sprite::Projectile, p.tier.index() as u8, p.bounds())),
        );
    }
}
