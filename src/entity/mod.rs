//! Everything that lives on the scrolling road: the player, enemies and the ninja's projectiles.

pub mod animation;
pub mod collision;
pub mod enemy;
pub mod ninja;
pub mod player;

use rand::rngs::SmallRng;
use rand::Rng;

use crate::constants::{crocodile, danger_tree, owl_tree, SCREEN_WIDTH};
use crate::entity::enemy::{Crocodile, DangerTree, Enemy, EnemyKind, OwlTree, Wizard};
use crate::entity::ninja::Ninja;
use crate::entity::player::Player;
use crate::systems::render::{RenderItem, Sprite};

/// The simulated scene.
#[derive(Debug, Clone)]
pub struct World {
    pub player: Player,
    pub enemies: Vec<Enemy>,
}

impl World {
    /// The fixed opening scene: a danger tree, an owl tree, a crocodile and a dormant wizard.
    pub fn new(health: u8, rng: &mut SmallRng) -> Self {
        Self {
            player: Player::new(health),
            enemies: vec![
                Enemy::OwlTree(OwlTree::new(owl_tree::START_X)),
                Enemy::DangerTree(DangerTree::new(danger_tree::START_X)),
                Enemy::Crocodile(Crocodile::new(
                    SCREEN_WIDTH + rng.random_range(0.0..crocodile::RESPAWN_SPREAD),
                )),
                Enemy::Wizard(Wizard::new()),
            ],
        }
    }

    /// A scene containing only the player.
    pub fn empty(health: u8) -> Self {
        Self {
            player: Player::new(health),
            enemies: Vec::new(),
        }
    }

    pub fn spawn(&mut self, enemy: Enemy) {
        self.enemies.push(enemy);
    }

    pub fn ninja(&self) -> Option<&Ninja> {
        self.enemies.iter().find_map(|e| match e {
            Enemy::Ninja(ninja) => Some(ninja),
            _ => None,
        })
    }

    pub fn ninja_mut(&mut self) -> Option<&mut Ninja> {
        self.enemies.iter_mut().find_map(|e| match e {
            Enemy::Ninja(ninja) => Some(ninja),
            _ => None,
        })
    }

    pub fn count(&self, kind: EnemyKind) -> usize {
        self.enemies.iter().filter(|e| e.kind() == kind).count()
    }

    /// Drops enemies that are done (a resolved ninja). Returns how many were removed.
    pub fn remove_finished(&mut self) -> usize {
        let before = self.enemies.len();
        self.enemies.retain(|e| !e.is_finished());
        before - self.enemies.len()
    }

    /// Per-entity snapshot for the renderer, back to front.
    pub fn render_items(&self) -> Vec<RenderItem> {
        let mut items = Vec::with_capacity(self.enemies.len() + 4);
        for enemy in &self.enemies {
            enemy.render_items(&mut items);
        }

        let player = &self.player;
        let sprite = if !player.is_alive() {
            Sprite::PlayerDown
        } else if player.is_airborne() {
            Sprite::PlayerJumping
        } else if player.is_ducking() {
            Sprite::PlayerDucking
        } else {
            Sprite::PlayerRunning
        };
        let bounds = player.bounding_box();
        items.push(RenderItem::new(sprite, player.animation_frame(), bounds));

        if let Some(tier) = player.shield.state() {
            items.push(RenderItem::new(Sprite::Shield, tier.index() as u8, bounds));
        }
        items
    }
}
