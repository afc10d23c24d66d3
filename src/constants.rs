//! This module contains all the constants used in the game.

use std::time::Duration;

/// Target tick rate of the fixed-cadence loop.
pub const TARGET_TICK_RATE: u32 = 60;

/// Width of the visible playfield, in pixels.
pub const SCREEN_WIDTH: f32 = 1300.0;
/// The ground plane. Entities standing on the ground have their bottom edge here.
pub const GROUND_Y: f32 = 670.0;

pub mod player {
    use glam::Vec2;

    /// The player never moves horizontally on screen; the world scrolls past instead.
    pub const X: f32 = 200.0;
    pub const SIZE: Vec2 = Vec2::new(90.0, 170.0);
    /// Collision height while ducking/sliding.
    pub const DUCK_HEIGHT: f32 = 70.0;
    /// Seconds a duck/slide lasts once started.
    pub const DUCK_DURATION: f32 = 0.5;
    /// Initial vertical velocity of a jump, in px/s (negative is up).
    pub const JUMP_VELOCITY: f32 = -1800.0;
    pub const GRAVITY: f32 = 7200.0;
    pub const MAX_HEALTH: u8 = 3;
    /// Seconds during which further hits are ignored after taking damage.
    pub const INVINCIBILITY: f32 = 1.0;
    /// Movement steps per score point.
    pub const STEPS_PER_POINT: u64 = 10;
}

/// World scroll per movement step, before the level multiplier.
pub const SCROLL_PER_STEP: f32 = 13.0;
/// Background trees scroll slightly slower than the ground.
pub const TREE_SCROLL_PER_STEP: f32 = 10.0;

pub mod danger_tree {
    use glam::Vec2;

    pub const SIZE: Vec2 = Vec2::new(100.0, 60.0);
    /// Four frames over a six second cycle.
    pub const FRAMES: [f32; 4] = [1.5, 1.5, 1.5, 1.5];
    pub const START_X: f32 = 1700.0;
    pub const RESPAWN_SPREAD: f32 = 1300.0;
}

pub mod owl_tree {
    use glam::Vec2;

    pub const SIZE: Vec2 = Vec2::new(200.0, 400.0);
    /// Eyes open, then a short blink.
    pub const FRAMES: [f32; 2] = [1.7, 0.3];
    pub const START_X: f32 = 900.0;
    pub const RESPAWN_SPREAD: f32 = 200.0;
}

pub mod wizard {
    use glam::Vec2;

    pub const SIZE: Vec2 = Vec2::new(120.0, 210.0);
    /// Bottom edge of the flight path. Only a ducking player passes underneath.
    pub const FLIGHT_BOTTOM: f32 = 590.0;
    /// Own flight speed per level, in px/s.
    pub const SPEEDS: [f32; 3] = [600.0, 1080.0, 1200.0];
    /// Delay window between the warning and the appearance, in seconds.
    pub const DELAY_MIN: f32 = 5.0;
    pub const DELAY_MAX: f32 = 8.0;
    pub const FRAMES: [f32; 2] = [0.2, 0.2];
}

pub mod crocodile {
    use glam::Vec2;

    pub const SIZE: Vec2 = Vec2::new(150.0, 80.0);
    pub const BOTTOM: f32 = 700.0;
    pub const RESPAWN_SPREAD: f32 = 1000.0;
    pub const FRAMES: [f32; 2] = [0.25, 0.25];
}

pub mod ninja {
    use glam::Vec2;

    pub const SIZE: Vec2 = Vec2::new(80.0, 150.0);
    /// Distance beyond the right screen edge at which an encounter starts.
    pub const SPAWN_OFFSET: f32 = 500.0;
    /// The ninja stops approaching and starts throwing once it reaches this x.
    pub const RANGED_X: f32 = 1100.0;
    pub const APPROACH_SPEED: f32 = 480.0;
    pub const FIRE_INTERVAL: f32 = 0.42;
    pub const PROJECTILES_PER_ENCOUNTER: u8 = 6;
    pub const MELEE_SPEED: f32 = 480.0;
    pub const MELEE_ATTACK_INTERVAL: f32 = 1.0;
    pub const JUMP_VELOCITY: f32 = -840.0;
    pub const FRAMES: [f32; 2] = [0.15, 0.15];
}

pub mod projectile {
    use glam::Vec2;

    pub const SIZE: Vec2 = Vec2::new(40.0, 40.0);
    pub const SPEED: f32 = 900.0;
    /// Top edge of a projectile for each tier: top, middle, bottom.
    pub const TIER_TOPS: [f32; 3] = [480.0, 540.0, 610.0];
}

pub mod difficulty {
    /// Score at which the first ninja encounter is spawned.
    pub const FIRST_ENCOUNTER_SCORE: u64 = 150;
    /// Score gap between a resolved encounter and the next one.
    pub const ENCOUNTER_INTERVAL: u64 = 150;
}

/// Size of the rolling window kept for every performance metric.
pub const METRIC_WINDOW_SIZE: usize = 60;

/// Default per-subsystem update threshold.
pub const SUBSYSTEM_THRESHOLD: Duration = Duration::from_millis(2);
