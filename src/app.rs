use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::audio::{attach_audio, LoggingSink};
use crate::config::Config;
use crate::error::GameResult;
use crate::formatter;
use crate::game::Game;
use crate::input::InputSource;
use crate::platform;
use crate::systems::diagnostics::DiagnosticsLog;

/// Drives the game at a fixed tick rate, feeding it commands from an input source.
pub struct App {
    pub game: Game,
    diagnostics: DiagnosticsLog,
    audio: Rc<RefCell<LoggingSink>>,
    input: Box<dyn InputSource>,
    loop_time: Duration,
    /// Stop after this many ticks; `None` runs until a quit is requested.
    max_ticks: Option<u64>,
    /// Sleep out the rest of each tick instead of running as fast as possible.
    realtime: bool,
    ticks: u64,
}

impl App {
    pub fn new(config: &Config, input: Box<dyn InputSource>) -> GameResult<Self> {
        info!("Initializing application");
        let game = Game::new(config)?;

        let diagnostics = DiagnosticsLog::new();
        diagnostics.attach(game.bus());
        let audio = Rc::new(RefCell::new(LoggingSink::default()));
        attach_audio(game.bus(), Rc::clone(&audio));

        Ok(Self {
            game,
            diagnostics,
            audio,
            input,
            loop_time: config.engine.tick_duration(),
            max_ticks: None,
            realtime: true,
            ticks: 0,
        })
    }

    pub fn with_max_ticks(mut self, max_ticks: Option<u64>) -> Self {
        self.max_ticks = max_ticks;
        self
    }

    pub fn with_realtime(mut self, realtime: bool) -> Self {
        self.realtime = realtime;
        self
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Engine health events seen so far.
    pub fn diagnostics(&self) -> &DiagnosticsLog {
        &self.diagnostics
    }

    pub fn cues_played(&self) -> u64 {
        self.audio.borrow().played()
    }

    /// Executes a single tick with a fixed delta time, then sleeps for whatever is left
    /// of the tick when running in real time.
    ///
    /// Returns `true` if the loop should keep going.
    pub fn run(&mut self) -> bool {
        let start = Instant::now();
        let dt = self.loop_time.as_secs_f32();

        formatter::increment_tick();
        self.ticks += 1;

        let commands = self.input.poll(self.game.context());
        let keep_going = self.game.tick(&commands, dt);
        if !keep_going {
            info!(ticks = self.ticks, "Quit requested, stopping");
            return false;
        }
        if self.max_ticks.is_some_and(|max| self.ticks >= max) {
            debug!(ticks = self.ticks, "Tick limit reached");
            return false;
        }

        if self.realtime {
            let elapsed = start.elapsed();
            if elapsed < self.loop_time {
                platform::sleep(self.loop_time - elapsed, true);
            } else {
                warn!(behind = ?(elapsed - self.loop_time), "Game loop behind schedule");
            }
        }
        true
    }
}
