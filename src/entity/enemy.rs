use bitflags::bitflags;
use rand::rngs::SmallRng;
use rand::Rng;
use smallvec::SmallVec;
use strum_macros::{Display, EnumIter, IntoStaticStr};

use crate::constants::{
    crocodile, danger_tree, owl_tree, wizard, GROUND_Y, SCREEN_WIDTH, SCROLL_PER_STEP, TREE_SCROLL_PER_STEP,
};
use crate::entity::animation::Animation;
use crate::entity::collision::{Rect, Tier};
use crate::entity::ninja::{Ninja, NinjaPhaseKind};
use crate::systems::render::{RenderItem, Sprite};

bitflags! {
    /// Enemy kinds currently allowed to be in play.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SpawnMask: u8 {
        const DANGER_TREE = 1 << 0;
        const OWL_TREE = 1 << 1;
        const WIZARD = 1 << 2;
        const CROCODILE = 1 << 3;
        const NINJA = 1 << 4;

        /// Everything the ninja suppresses while its encounter is running.
        const REGULAR = Self::DANGER_TREE.bits() | Self::WIZARD.bits() | Self::CROCODILE.bits();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum EnemyKind {
    DangerTree,
    OwlTree,
    Wizard,
    Crocodile,
    Ninja,
}

impl EnemyKind {
    pub fn mask(self) -> SpawnMask {
        match self {
            EnemyKind::DangerTree => SpawnMask::DANGER_TREE,
            EnemyKind::OwlTree => SpawnMask::OWL_TREE,
            EnemyKind::Wizard => SpawnMask::WIZARD,
            EnemyKind::Crocodile => SpawnMask::CROCODILE,
            EnemyKind::Ninja => SpawnMask::NINJA,
        }
    }
}

/// Something an enemy wants the rest of the game to know about. Entities never touch
/// game state directly; the world subsystem turns these into bus events.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WorldEvent {
    WizardWarning { delay: f32 },
    NinjaPhase { from: NinjaPhaseKind, to: NinjaPhaseKind },
    ProjectileFired { tier: Tier },
}

/// Everything an enemy needs to advance by one tick.
pub struct EnemyTick<'a> {
    pub dt: f32,
    /// Movement steps the player took this tick.
    pub steps: u32,
    pub multiplier: f32,
    /// 1-based difficulty level.
    pub level: u8,
    /// Scale applied to attack cadences (1.0 means unchanged).
    pub cadence: f32,
    pub allowed: SpawnMask,
    pub rng: &'a mut SmallRng,
    pub events: &'a mut SmallVec<[WorldEvent; 4]>,
}

impl EnemyTick<'_> {
    /// Ground scroll this tick.
    pub fn scroll(&self) -> f32 {
        self.steps as f32 * SCROLL_PER_STEP * self.multiplier
    }

    pub fn tree_scroll(&self) -> f32 {
        self.steps as f32 * TREE_SCROLL_PER_STEP * self.multiplier
    }

    pub fn allows(&self, kind: EnemyKind) -> bool {
        self.allowed.contains(kind.mask())
    }
}

fn respawn_x(rng: &mut SmallRng, spread: f32) -> f32 {
    SCREEN_WIDTH + rng.random_range(0.0..spread)
}

/// Ground-level thorn tree with a four frame loop. Plain collision, nothing else.
#[derive(Debug, Clone)]
pub struct DangerTree {
    pub x: f32,
    parked: bool,
    animation: Animation,
}

impl DangerTree {
    pub fn new(x: f32) -> Self {
        Self {
            x,
            parked: false,
            animation: Animation::new(&danger_tree::FRAMES),
        }
    }

    fn update(&mut self, tick: &mut EnemyTick) {
        self.animation.tick(tick.dt);
        if !tick.allows(EnemyKind::DangerTree) {
            self.parked = true;
            return;
        }
        if self.parked {
            self.recycle(tick.rng);
        }

        self.x -= tick.tree_scroll();
        if self.x + danger_tree::SIZE.x <= 0.0 {
            self.recycle(tick.rng);
        }
    }

    fn recycle(&mut self, rng: &mut SmallRng) {
        self.x = respawn_x(rng, danger_tree::RESPAWN_SPREAD);
        self.parked = false;
    }

    fn hitbox(&self) -> Option<Rect> {
        (!self.parked).then(|| Rect::from_bottom_left(self.x, GROUND_Y, danger_tree::SIZE))
    }
}

/// Scenery. Animates and scrolls but never collides.
#[derive(Debug, Clone)]
pub struct OwlTree {
    pub x: f32,
    animation: Animation,
}

impl OwlTree {
    pub fn new(x: f32) -> Self {
        Self {
            x,
            animation: Animation::new(&owl_tree::FRAMES),
        }
    }

    fn update(&mut self, tick: &mut EnemyTick) {
        self.animation.tick(tick.dt);
        self.x -= tick.tree_scroll();
        if self.x + owl_tree::SIZE.x <= 0.0 {
            self.x = respawn_x(tick.rng, owl_tree::RESPAWN_SPREAD);
        }
    }

    fn bounds(&self) -> Rect {
        Rect::from_bottom_left(self.x, GROUND_Y, owl_tree::SIZE)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WizardState {
    /// Not scheduled; waiting for spawning to be allowed.
    Dormant,
    /// Warned about and counting down to its appearance.
    Incoming { remaining: f32 },
    Flying,
}

/// Flies across at head height. Only a duck gets under it.
#[derive(Debug, Clone)]
pub struct Wizard {
    pub x: f32,
    state: WizardState,
    animation: Animation,
}

impl Default for Wizard {
    fn default() -> Self {
        Self::new()
    }
}

impl Wizard {
    pub fn new() -> Self {
        Self {
            x: SCREEN_WIDTH,
            state: WizardState::Dormant,
            animation: Animation::new(&wizard::FRAMES),
        }
    }

    /// A wizard already on its way, for tests and scripted scenes.
    pub fn flying(x: f32) -> Self {
        Self {
            x,
            state: WizardState::Flying,
            ..Self::new()
        }
    }

    pub fn state(&self) -> WizardState {
        self.state
    }

    fn update(&mut self, tick: &mut EnemyTick) {
        if !tick.allows(EnemyKind::Wizard) {
            self.state = WizardState::Dormant;
            return;
        }

        match self.state {
            WizardState::Dormant => self.schedule(tick),
            WizardState::Incoming { remaining } => {
                let remaining = remaining - tick.dt;
                if remaining <= 0.0 {
                    self.x = SCREEN_WIDTH;
                    self.animation.restart();
                    self.state = WizardState::Flying;
                } else {
                    self.state = WizardState::Incoming { remaining };
                }
            }
            WizardState::Flying => {
                let speed = wizard::SPEEDS[usize::from(tick.level.clamp(1, 3) - 1)];
                self.x -= speed * tick.dt + tick.scroll();
                self.animation.tick(tick.dt);
                if self.x + wizard::SIZE.x <= 0.0 {
                    self.schedule(tick);
                }
            }
        }
    }

    fn schedule(&mut self, tick: &mut EnemyTick) {
        let delay = tick.rng.random_range(wizard::DELAY_MIN..=wizard::DELAY_MAX);
        self.state = WizardState::Incoming { remaining: delay };
        tick.events.push(WorldEvent::WizardWarning { delay });
    }

    fn hitbox(&self) -> Option<Rect> {
        matches!(self.state, WizardState::Flying)
            .then(|| Rect::from_bottom_left(self.x, wizard::FLIGHT_BOTTOM, wizard::SIZE))
    }
}

/// Ground-level hazard. Only a jump clears it; it is recycled rather than destroyed.
#[derive(Debug, Clone)]
pub struct Crocodile {
    pub x: f32,
    parked: bool,
    animation: Animation,
}

impl Crocodile {
    pub fn new(x: f32) -> Self {
        Self {
            x,
            parked: false,
            animation: Animation::new(&crocodile::FRAMES),
        }
    }

    fn update(&mut self, tick: &mut EnemyTick) {
        self.animation.tick(tick.dt);
        if !tick.allows(EnemyKind::Crocodile) {
            self.parked = true;
            return;
        }
        if self.parked {
            self.reposition(tick.rng);
        }

        self.x -= tick.scroll();
        if self.x + crocodile::SIZE.x <= 0.0 {
            self.reposition(tick.rng);
        }
    }

    fn reposition(&mut self, rng: &mut SmallRng) {
        self.x = respawn_x(rng, crocodile::RESPAWN_SPREAD);
        self.parked = false;
    }

    fn hitbox(&self) -> Option<Rect> {
        (!self.parked).then(|| Rect::from_bottom_left(self.x, crocodile::BOTTOM, crocodile::SIZE))
    }
}

/// Closed set of everything that shares the road with the player.
#[derive(Debug, Clone)]
pub enum Enemy {
    DangerTree(DangerTree),
    OwlTree(OwlTree),
    Wizard(Wizard),
    Crocodile(Crocodile),
    Ninja(Ninja),
}

impl Enemy {
    pub fn kind(&self) -> EnemyKind {
        match self {
            Enemy::DangerTree(_) => EnemyKind::DangerTree,
            Enemy::OwlTree(_) => EnemyKind::OwlTree,
            Enemy::Wizard(_) => EnemyKind::Wizard,
            Enemy::Crocodile(_) => EnemyKind::Crocodile,
            Enemy::Ninja(_) => EnemyKind::Ninja,
        }
    }

    pub fn update(&mut self, tick: &mut EnemyTick) {
        match self {
            Enemy::DangerTree(tree) => tree.update(tick),
            Enemy::OwlTree(tree) => tree.update(tick),
            Enemy::Wizard(wizard) => wizard.update(tick),
            Enemy::Crocodile(crocodile) => crocodile.update(tick),
            Enemy::Ninja(ninja) => ninja.update(tick),
        }
    }

    /// The body's collision box, if it can currently hurt the player.
    /// Decorative enemies never have one.
    pub fn hitbox(&self) -> Option<Rect> {
        match self {
            Enemy::DangerTree(tree) => tree.hitbox(),
            Enemy::OwlTree(_) => None,
            Enemy::Wizard(wizard) => wizard.hitbox(),
            Enemy::Crocodile(crocodile) => crocodile.hitbox(),
            Enemy::Ninja(ninja) => ninja.hitbox(),
        }
    }

    /// Clears the hazard out of the player's way after it dealt damage.
    pub fn on_player_hit(&mut self, rng: &mut SmallRng) {
        match self {
            Enemy::DangerTree(tree) => tree.recycle(rng),
            Enemy::Wizard(wizard) => wizard.state = WizardState::Dormant,
            Enemy::Crocodile(crocodile) => crocodile.reposition(rng),
            Enemy::OwlTree(_) | Enemy::Ninja(_) => {}
        }
    }

    /// Whether the enemy is done and should be removed from the world.
    pub fn is_finished(&self) -> bool {
        match self {
            Enemy::Ninja(ninja) => ninja.is_resolved(),
            _ => false,
        }
    }

    /// Renderer view of this enemy and anything it owns.
    pub fn render_items(&self, out: &mut Vec<RenderItem>) {
        match self {
            Enemy::DangerTree(tree) => {
                if let Some(bounds) = tree.hitbox() {
                    out.push(RenderItem::new(Sprite::DangerTree, tree.animation.current_frame(), bounds));
                }
            }
            Enemy::OwlTree(tree) => {
                out.push(RenderItem::new(Sprite::OwlTree, tree.animation.current_frame(), tree.bounds()));
            }
            Enemy::Wizard(wizard) => {
                if let Some(bounds) = wizard.hitbox() {
                    out.push(RenderItem::new(Sprite::Wizard, wizard.animation.current_frame(), bounds));
                }
            }
            Enemy::Crocodile(crocodile) => {
                if let Some(bounds) = crocodile.hitbox() {
                    out.push(RenderItem::new(Sprite::Crocodile, crocodile.animation.current_frame(), bounds));
                }
            }
            Enemy::Ninja(ninja) => ninja.render_items(out),
        }
    }
}
