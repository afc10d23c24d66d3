#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(coverage_nightly, coverage(off))]

use clap::Parser;
use tracing::{info, warn};

use forest_survival::app::App;
use forest_survival::cli::Args;
use forest_survival::config::Config;
use forest_survival::formatter;
use forest_survival::input::Autopilot;

/// Runs the simulation headless with the autopilot and prints a summary at the end.
pub fn main() -> anyhow::Result<()> {
    formatter::init_tracing()?;
    let args = Args::parse();

    let (mut config, errors) = Config::load(args.config.as_deref());
    for error in &errors {
        warn!(%error, "Configuration section replaced by defaults");
    }
    if args.seed.is_some() {
        config.gameplay.seed = args.seed;
    }

    let mut app = App::new(&config, Box::new(Autopilot::new(args.restart)))?
        .with_max_ticks(args.ticks)
        .with_realtime(!args.fast);

    info!(tick_rate = config.engine.target_tick_rate, max_ticks = ?args.ticks, "Starting game loop");
    while app.run() {}

    let game = &app.game;
    for line in game.engine().monitor().report() {
        println!("{line}");
    }
    println!(
        "ticks: {}  mode: {}  score: {}  best: {}  health: {}  time: {}s",
        app.ticks(),
        game.mode(),
        game.score(),
        game.best_score(),
        game.health(),
        game.elapsed_secs()
    );
    for record in app.diagnostics().snapshot() {
        println!("{:>8.3}s {} [{}] {}", record.timestamp.as_secs_f64(), record.topic, record.source, record.detail);
    }
    info!(cues = app.cues_played(), faults = game.bus().fault_count(), "Run finished");

    app.game.shutdown();
    Ok(())
}
