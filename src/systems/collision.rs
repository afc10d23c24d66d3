//! Player-versus-hazard collision and the shield rules.

use std::fmt;

use tracing::{debug, info};

use crate::engine::Subsystem;
use crate::entity::collision::Tier;
use crate::entity::enemy::EnemyKind;
use crate::entity::player::{HitOutcome, Player};
use crate::events::{topics, Payload};
use crate::game::context::SimContext;
use crate::game::state::Trigger;

/// Something that reached the player this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hazard {
    /// An enemy's own body. Shields never block these.
    Body(EnemyKind),
    Projectile(Tier),
}

impl fmt::Display for Hazard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Hazard::Body(kind) => write!(f, "{kind}"),
            Hazard::Projectile(_) => f.write_str("projectile"),
        }
    }
}

/// What a single contact did to the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Contact {
    Blocked { tier: Tier },
    Damaged { health: u8 },
    Killed,
    /// Absorbed by the grace period of an earlier hit.
    Ignored,
}

/// Applies the shield and damage rules for one overlapping hazard.
///
/// A projectile is blocked only by an active shield at its exact tier. Everything else
/// goes through the player's hit handling, which honours the grace period.
pub fn resolve_hazard(player: &mut Player, hazard: Hazard) -> Contact {
    if let Hazard::Projectile(tier) = hazard {
        if player.is_alive() && player.shield.blocks(tier) {
            return Contact::Blocked { tier };
        }
    }

    match player.apply_hit() {
        HitOutcome::Damaged { health } => Contact::Damaged { health },
        HitOutcome::Killed => Contact::Killed,
        HitOutcome::Ignored => Contact::Ignored,
    }
}

/// Tests every active hazard against the player's box once per tick.
#[derive(Debug, Default)]
pub struct CollisionResolver;

impl CollisionResolver {
    pub fn new() -> Self {
        Self
    }

    fn report(ctx: &mut SimContext, hazard: Hazard, contact: Contact) {
        match contact {
            Contact::Blocked { tier } => {
                debug!(%tier, "Projectile blocked");
                ctx.publish(topics::SHIELD_BLOCKED, Payload::new().with("tier", tier.to_string()));
            }
            Contact::Damaged { health } => {
                info!(%hazard, health, "Player damaged");
                ctx.publish(
                    topics::PLAYER_DAMAGED,
                    Payload::new()
                        .with("health", health)
                        .with("hazard", hazard.to_string())
                        .with("invincibility", ctx.world.player.invincibility_remaining()),
                );
            }
            Contact::Killed => {
                let score = ctx.score();
                info!(%hazard, score, "Player died");
                ctx.publish(
                    topics::PLAYER_DAMAGED,
                    Payload::new().with("health", 0u8).with("hazard", hazard.to_string()),
                );
                ctx.publish(
                    topics::PLAYER_DIED,
                    Payload::new()
                        .with("score", score)
                        .with("elapsed", ctx.elapsed_secs())
                        .with("hazard", hazard.to_string()),
                );
                ctx.raise(Trigger::PlayerDied);
            }
            Contact::Ignored => {}
        }
    }
}

impl Subsystem for CollisionResolver {
    fn dependencies(&self) -> &[&'static str] {
        &["world"]
    }

    fn update(&mut self, ctx: &mut SimContext, _dt: f32) -> anyhow::Result<()> {
        if !ctx.world.player.is_alive() {
            return Ok(());
        }
        let player_box = ctx.world.player.bounding_box();

        for index in 0..ctx.world.enemies.len() {
            let enemy = &ctx.world.enemies[index];
            let Some(hitbox) = enemy.hitbox() else {
                continue;
            };
            if !hitbox.overlaps(&player_box) {
                continue;
            }

            let hazard = Hazard::Body(enemy.kind());
            let contact = resolve_hazard(&mut ctx.world.player, hazard);
            if matches!(contact, Contact::Damaged { .. } | Contact::Killed) {
                ctx.world.enemies[index].on_player_hit(&mut ctx.rng);
            }
            Self::report(ctx, hazard, contact);
            if contact == Contact::Killed {
                return Ok(());
            }
        }

        let hits: Vec<(usize, Tier)> = ctx
            .world
            .ninja()
            .map(|ninja| {
                ninja
                    .projectiles()
                    .iter()
                    .enumerate()
                    .filter(|(_, p)| p.bounds().overlaps(&player_box))
                    .map(|(index, p)| (index, p.tier))
                    .collect()
            })
            .unwrap_or_default();

        // Highest index first so earlier indices stay valid while removing.
        for (index, tier) in hits.into_iter().rev() {
            if let Some(ninja) = ctx.world.ninja_mut() {
                ninja.take_projectile(index);
            }
            let hazard = Hazard::Projectile(tier);
            let contact = resolve_hazard(&mut ctx.world.player, hazard);
            Self::report(ctx, hazard, contact);
            if contact == Contact::Killed {
                break;
            }
        }

        Ok(())
    }
}
