//! Hands a per-tick snapshot of the scene to whatever draws it.

use glam::Vec2;
use strum_macros::{Display, EnumIter, IntoStaticStr};

use crate::engine::Subsystem;
use crate::entity::collision::Rect;
use crate::game::context::SimContext;
use crate::game::state::GameMode;

/// Every drawable the scene can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Sprite {
    PlayerRunning,
    PlayerJumping,
    PlayerDucking,
    PlayerDown,
    Shield,
    DangerTree,
    OwlTree,
    Wizard,
    Crocodile,
    Ninja,
    NinjaAttack,
    Projectile,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderItem {
    pub sprite: Sprite,
    pub frame: u8,
    /// Top-left corner in screen space.
    pub position: Vec2,
    pub bounds: Rect,
}

impl RenderItem {
    pub fn new(sprite: Sprite, frame: u8, bounds: Rect) -> Self {
        Self {
            sprite,
            frame,
            position: bounds.min,
            bounds,
        }
    }
}

/// What a sink receives each frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub mode: GameMode,
    pub score: u64,
    pub health: u8,
    pub elapsed_secs: u64,
    pub items: Vec<RenderItem>,
}

/// Receives frames. Drawing itself happens outside the engine.
pub trait RenderSink {
    fn present(&mut self, frame: &Frame) -> anyhow::Result<()>;
}

/// Discards every frame; used when running headless.
#[derive(Debug, Default)]
pub struct NullSink {
    presented: u64,
}

impl NullSink {
    pub fn presented(&self) -> u64 {
        self.presented
    }
}

impl RenderSink for NullSink {
    fn present(&mut self, _frame: &Frame) -> anyhow::Result<()> {
        self.presented += 1;
        Ok(())
    }
}

/// Builds a [`Frame`] from the context and passes it to the sink. Runs in every mode so
/// menus and the pause screen still get drawn.
pub struct RenderSubsystem<S: RenderSink> {
    sink: S,
}

impl<S: RenderSink> RenderSubsystem<S> {
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}

impl<S: RenderSink> Subsystem for RenderSubsystem<S> {
    fn update(&mut self, ctx: &mut SimContext, _dt: f32) -> anyhow::Result<()> {
        let frame = Frame {
            mode: ctx.mode(),
            score: ctx.score(),
            health: ctx.health(),
            elapsed_secs: ctx.elapsed_secs(),
            items: ctx.world.render_items(),
        };
        self.sink.present(&frame)
    }

    fn gameplay_only(&self) -> bool {
        false
    }
}
