//! Score-driven difficulty: speed multiplier, attack cadence and spawn gating.

use smallvec::SmallVec;
use tracing::{debug, info};

use crate::constants::difficulty::{ENCOUNTER_INTERVAL, FIRST_ENCOUNTER_SCORE};
use crate::engine::Subsystem;
use crate::entity::enemy::{Enemy, SpawnMask};
use crate::entity::ninja::{Ninja, NinjaPhaseKind};
use crate::events::{topics, Payload};
use crate::game::context::SimContext;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Level {
    pub number: u8,
    /// Lowest score belonging to this level.
    pub min_score: u64,
    pub multiplier: f32,
    /// Scale applied to enemy attack intervals.
    pub cadence: f32,
    pub spawns: SpawnMask,
}

pub const LEVELS: [Level; 3] = [
    Level {
        number: 1,
        min_score: 0,
        multiplier: 1.0,
        cadence: 1.0,
        spawns: SpawnMask::all().difference(SpawnMask::NINJA),
    },
    Level {
        number: 2,
        min_score: 100,
        multiplier: 2.0,
        cadence: 1.0,
        spawns: SpawnMask::all(),
    },
    Level {
        number: 3,
        min_score: 200,
        multiplier: 3.0,
        cadence: 0.6,
        spawns: SpawnMask::all(),
    },
];

/// The level a given score belongs to.
pub fn level_for_score(score: u64) -> &'static Level {
    LEVELS
        .iter()
        .rev()
        .find(|level| score >= level.min_score)
        .unwrap_or(&LEVELS[0])
}

/// Difficulty progress for the current run.
#[derive(Debug, Clone, PartialEq)]
pub struct DifficultyState {
    level: u8,
    encounter_active: bool,
    next_encounter: u64,
}

impl Default for DifficultyState {
    fn default() -> Self {
        Self {
            level: 1,
            encounter_active: false,
            next_encounter: FIRST_ENCOUNTER_SCORE,
        }
    }
}

impl DifficultyState {
    pub fn level(&self) -> u8 {
        self.level
    }

    pub fn current(&self) -> &'static Level {
        &LEVELS[usize::from(self.level - 1)]
    }

    pub fn multiplier(&self) -> f32 {
        self.current().multiplier
    }

    pub fn cadence(&self) -> f32 {
        self.current().cadence
    }

    /// Enemy kinds allowed right now. A running boss encounter suppresses the regulars.
    pub fn allowed(&self) -> SpawnMask {
        let mut mask = self.current().spawns;
        if self.encounter_active {
            mask.remove(SpawnMask::REGULAR);
        }
        mask
    }

    pub fn encounter_active(&self) -> bool {
        self.encounter_active
    }

    pub fn next_encounter_score(&self) -> u64 {
        self.next_encounter
    }

    pub fn begin_encounter(&mut self) {
        self.encounter_active = true;
    }

    /// Re-enables regular spawns and schedules the next encounter.
    pub fn end_encounter(&mut self, score: u64) {
        self.encounter_active = false;
        self.next_encounter = score + ENCOUNTER_INTERVAL;
    }

    /// Raises the level to match `score` and returns every level newly reached.
    /// Levels never go down, so each one is reported at most once per run.
    pub fn advance(&mut self, score: u64) -> SmallVec<[u8; 2]> {
        let target = level_for_score(score).number;
        let reached = (self.level + 1..=target).collect();
        self.level = self.level.max(target);
        reached
    }
}

/// Publishes level-ups and starts ninja encounters.
#[derive(Debug, Default)]
pub struct DifficultyController;

impl Subsystem for DifficultyController {
    fn update(&mut self, ctx: &mut SimContext, _dt: f32) -> anyhow::Result<()> {
        let score = ctx.score();

        for level in ctx.difficulty.advance(score) {
            let multiplier = LEVELS[usize::from(level - 1)].multiplier;
            info!(level, score, multiplier, "Level up");
            ctx.publish(
                topics::LEVEL_UP,
                Payload::new()
                    .with("level", level)
                    .with("score", score)
                    .with("multiplier", multiplier),
            );
        }

        let difficulty = &ctx.difficulty;
        let due = difficulty.allowed().contains(SpawnMask::NINJA)
            && !difficulty.encounter_active()
            && score >= difficulty.next_encounter_score();
        if due && ctx.world.ninja().is_none() {
            debug!(score, "Starting ninja encounter");
            ctx.world.spawn(Enemy::Ninja(Ninja::new()));
            ctx.difficulty.begin_encounter();
            let to: &'static str = NinjaPhaseKind::Approaching.into();
            ctx.publish(topics::NINJA_PHASE_CHANGED, Payload::new().with("phase", to).with("score", score));
        }

        Ok(())
    }
}
