//! Top-level game mode and the transitions between modes.

use strum_macros::{Display, EnumIter, IntoStaticStr};
use tracing::{debug, info};

use crate::events::{topics, Payload};
use crate::game::context::SimContext;
use crate::input::InputCommand;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum GameMode {
    #[default]
    Menu,
    Playing,
    Paused,
    GameOver,
}

impl GameMode {
    /// Whether gameplay subsystems advance in this mode.
    pub fn is_simulating(self) -> bool {
        matches!(self, GameMode::Playing)
    }
}

/// Explicit requests that may move the game to another mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Trigger {
    Start,
    PauseToggle,
    PlayerDied,
    Restart,
    Quit,
}

impl Trigger {
    pub fn from_input(command: InputCommand) -> Option<Self> {
        match command {
            InputCommand::MenuSelect => Some(Trigger::Start),
            InputCommand::PauseToggle => Some(Trigger::PauseToggle),
            InputCommand::Restart => Some(Trigger::Restart),
            InputCommand::Quit => Some(Trigger::Quit),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: GameMode,
    pub to: GameMode,
    pub trigger: Trigger,
}

/// The transition table. Anything not listed leaves the mode unchanged.
pub fn next_mode(mode: GameMode, trigger: Trigger) -> Option<GameMode> {
    match (mode, trigger) {
        (GameMode::Menu, Trigger::Start) => Some(GameMode::Playing),
        (GameMode::Playing, Trigger::PauseToggle) => Some(GameMode::Paused),
        (GameMode::Paused, Trigger::PauseToggle) => Some(GameMode::Playing),
        (GameMode::Playing, Trigger::PlayerDied) => Some(GameMode::GameOver),
        (GameMode::GameOver, Trigger::Restart) => Some(GameMode::Menu),
        _ => None,
    }
}

/// Sole writer of the game mode held by the simulation context.
#[derive(Debug, Default)]
pub struct GameplayStateMachine {
    quit: bool,
}

impl GameplayStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Quitting is possible from any mode and ends the loop rather than changing mode.
    pub fn quit_requested(&self) -> bool {
        self.quit
    }

    /// Applies `trigger`, publishing the matching event when the mode changes.
    pub fn apply(&mut self, ctx: &mut SimContext, trigger: Trigger) -> Option<Transition> {
        let from = ctx.mode();

        if trigger == Trigger::Quit {
            if !self.quit {
                info!(mode = %from, "Quit requested");
                self.quit = true;
                ctx.bus().publish(topics::QUIT_REQUESTED, Payload::new().with("mode", from.to_string()));
            }
            return None;
        }

        let Some(to) = next_mode(from, trigger) else {
            debug!(mode = %from, %trigger, "Trigger ignored in current mode");
            return None;
        };

        ctx.set_mode(to);
        info!(%from, %to, %trigger, "Game mode changed");

        let topic = match (from, to) {
            (GameMode::Menu, GameMode::Playing) => topics::GAME_STARTED,
            (GameMode::Playing, GameMode::Paused) => topics::GAME_PAUSED,
            (GameMode::Paused, GameMode::Playing) => topics::GAME_RESUMED,
            (_, GameMode::GameOver) => topics::GAME_OVER,
            _ => topics::GAME_RESET,
        };
        ctx.bus().publish(
            topic,
            Payload::new()
                .with("from", from.to_string())
                .with("to", to.to_string())
                .with("elapsed", ctx.elapsed())
                .with("score", ctx.score()),
        );

        Some(Transition { from, to, trigger })
    }
}
