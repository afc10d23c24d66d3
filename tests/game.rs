use std::rc::Rc;

use forest_survival::entity::enemy::{Crocodile, Enemy};
use forest_survival::events::topics;
use forest_survival::game::state::{next_mode, GameMode, Trigger};
use forest_survival::input::{Autopilot, InputCommand, InputSource};
use forest_survival::persist::{BestScoreStore, MemoryStore};
use pretty_assertions::assert_eq;
use speculoos::prelude::*;
use strum::IntoEnumIterator;

mod common;

use common::{call_log, empty_playing_game, idle, new_game, new_game_with_store, playing_game, Probe, Recorder, DT};

const TEN_STEPS: [InputCommand; 10] = [InputCommand::Move; 10];

#[test]
fn test_transition_table() {
    let cases = [
        (GameMode::Menu, Trigger::Start, Some(GameMode::Playing)),
        (GameMode::Playing, Trigger::PauseToggle, Some(GameMode::Paused)),
        (GameMode::Paused, Trigger::PauseToggle, Some(GameMode::Playing)),
        (GameMode::Playing, Trigger::PlayerDied, Some(GameMode::GameOver)),
        (GameMode::GameOver, Trigger::Restart, Some(GameMode::Menu)),
        (GameMode::Menu, Trigger::PauseToggle, None),
        (GameMode::Paused, Trigger::PlayerDied, None),
        (GameMode::GameOver, Trigger::PauseToggle, None),
        (GameMode::Playing, Trigger::Restart, None),
    ];

    for (mode, trigger, expected) in cases {
        assert_eq!(next_mode(mode, trigger), expected, "{mode} + {trigger}");
    }
    for mode in GameMode::iter() {
        assert_eq!(next_mode(mode, Trigger::Quit), None);
    }
}

#[test]
fn test_new_game_waits_in_menu() {
    let mut game = new_game();

    assert_eq!(game.mode(), GameMode::Menu);
    assert_eq!(
        game.engine().update_order(),
        vec!["world", "collision", "difficulty", "render"]
    );

    idle(&mut game, 30);
    assert_eq!(game.mode(), GameMode::Menu);
    assert_that(&game.context().elapsed()).is_equal_to(0.0);
}

#[test]
fn test_menu_select_starts_the_game() {
    let mut game = new_game();
    let recorder = Recorder::attach(game.bus(), &[topics::GAME_STARTED]);

    game.tick(&[InputCommand::MenuSelect], DT);

    assert_eq!(game.mode(), GameMode::Playing);
    let started = recorder.last(topics::GAME_STARTED).unwrap();
    assert_eq!(started.payload.get_text("from"), Some("menu"));
    assert_eq!(started.payload.get_text("to"), Some("playing"));
}

#[test]
fn test_pause_freezes_clock_and_world() {
    let mut game = playing_game();
    let recorder = Recorder::attach(game.bus(), &[topics::GAME_PAUSED, topics::GAME_RESUMED]);
    idle(&mut game, 29);

    game.tick(&[InputCommand::PauseToggle], DT);
    assert_eq!(game.mode(), GameMode::Paused);
    let frozen = game.context().elapsed();
    assert_that(&frozen).is_greater_than(0.0);

    for _ in 0..100 {
        game.tick(&[InputCommand::Move], DT);
    }
    assert_that(&game.context().elapsed()).is_equal_to(frozen);
    assert_that(&game.world().player.distance()).is_equal_to(0);

    game.tick(&[InputCommand::PauseToggle], DT);
    assert_eq!(game.mode(), GameMode::Playing);
    assert_that(&game.context().elapsed()).is_greater_than(frozen);
    assert_eq!(recorder.topics(), vec![topics::GAME_PAUSED, topics::GAME_RESUMED]);
}

#[test]
fn test_moving_scores_one_point_per_ten_steps() {
    let mut game = empty_playing_game(3);
    let recorder = Recorder::attach(game.bus(), &[topics::SCORE_UPDATED]);

    for _ in 0..25 {
        game.tick(&[InputCommand::Move], DT);
    }

    assert_that(&game.world().player.distance()).is_equal_to(25);
    assert_that(&game.score()).is_equal_to(2);
    assert_that(&recorder.count(topics::SCORE_UPDATED)).is_equal_to(2);
}

#[test]
fn test_crossing_a_level_boundary_levels_up_once() {
    let mut game = empty_playing_game(3);
    let recorder = Recorder::attach(game.bus(), &[topics::LEVEL_UP]);

    for _ in 0..950 {
        game.context_mut().world.player.step();
    }
    assert_that(&game.score()).is_equal_to(95);
    game.tick(&[], DT);
    assert_that(&recorder.count(topics::LEVEL_UP)).is_equal_to(0);

    for _ in 0..10 {
        game.tick(&TEN_STEPS, DT);
    }

    assert_that(&game.score()).is_equal_to(105);
    assert_that(&recorder.count(topics::LEVEL_UP)).is_equal_to(1);
    assert_that(&game.context().difficulty.level()).is_equal_to(2);
    assert_that(&game.context().difficulty.multiplier()).is_equal_to(2.0);

    let level_up = recorder.last(topics::LEVEL_UP).unwrap();
    assert_eq!(level_up.payload.get_int("level"), Some(2));
    assert_eq!(level_up.payload.get_float("multiplier"), Some(2.0));
}

#[test]
fn test_jumping_multiple_levels_reports_each_level() {
    let mut game = empty_playing_game(3);
    let recorder = Recorder::attach(game.bus(), &[topics::LEVEL_UP]);

    for _ in 0..2100 {
        game.context_mut().world.player.step();
    }
    game.tick(&[], DT);

    let levels: Vec<_> = recorder
        .events()
        .iter()
        .filter_map(|e| e.payload.get_int("level"))
        .collect();
    assert_eq!(levels, vec![2, 3]);

    let multipliers: Vec<_> = recorder
        .events()
        .iter()
        .filter_map(|e| e.payload.get_float("multiplier"))
        .collect();
    assert_eq!(multipliers, vec![2.0, 3.0]);
}

#[test]
fn test_ninja_encounter_starts_at_threshold() {
    let mut game = empty_playing_game(3);
    let recorder = Recorder::attach(game.bus(), &[topics::NINJA_PHASE_CHANGED]);

    for _ in 0..1500 {
        game.context_mut().world.player.step();
    }
    game.tick(&[], DT);

    assert_that(&game.world().ninja().is_some()).is_true();
    assert_that(&game.context().difficulty.encounter_active()).is_true();
    assert_eq!(
        recorder.last(topics::NINJA_PHASE_CHANGED).unwrap().payload.get_text("phase"),
        Some("approaching")
    );

    idle(&mut game, 5);
    assert_that(&game.world().enemies.len()).is_equal_to(1);
}

#[test]
fn test_death_ends_the_run_and_halts_gameplay() {
    let mut game = empty_playing_game(1);
    let recorder = Recorder::attach(game.bus(), &[topics::PLAYER_DIED, topics::GAME_OVER]);
    let log = call_log();
    game.engine_mut()
        .register("observer", Probe::gameplay("observer", &log), 50)
        .unwrap();
    game.context_mut().world.spawn(Enemy::Crocodile(Crocodile::new(220.0)));

    game.tick(&[InputCommand::Move], DT);

    assert_eq!(game.mode(), GameMode::GameOver);
    assert_that(&game.health()).is_equal_to(0);
    assert_eq!(recorder.topics(), vec![topics::PLAYER_DIED, topics::GAME_OVER]);

    let runs = log.borrow().len();
    let elapsed = game.context().elapsed();
    for _ in 0..30 {
        game.tick(&[InputCommand::Move, InputCommand::Jump], DT);
    }
    assert_that(&log.borrow().len()).is_equal_to(runs);
    assert_that(&game.context().elapsed()).is_equal_to(elapsed);
    assert_that(&game.world().player.distance()).is_equal_to(1);
}

#[test]
fn test_restart_returns_to_menu_with_a_fresh_run() {
    let mut game = empty_playing_game(1);
    let recorder = Recorder::attach(game.bus(), &[topics::GAME_RESET]);
    for _ in 0..300 {
        game.context_mut().world.player.step();
    }
    game.context_mut().world.spawn(Enemy::Crocodile(Crocodile::new(220.0)));
    game.tick(&[], DT);
    assert_eq!(game.mode(), GameMode::GameOver);

    game.tick(&[InputCommand::Restart], DT);

    assert_eq!(game.mode(), GameMode::Menu);
    assert_that(&recorder.count(topics::GAME_RESET)).is_equal_to(1);
    assert_that(&game.score()).is_equal_to(0);
    assert_that(&game.health()).is_equal_to(3);
    assert_that(&game.context().elapsed()).is_equal_to(0.0);
    assert_that(&game.context().difficulty.level()).is_equal_to(1);
    assert_that(&game.world().enemies.len()).is_equal_to(4);

    game.tick(&[InputCommand::MenuSelect], DT);
    assert_eq!(game.mode(), GameMode::Playing);
}

#[test]
fn test_best_score_is_saved_when_beaten() {
    let store = Rc::new(MemoryStore::new(20));
    let mut game = new_game_with_store(Rc::clone(&store));
    assert_that(&game.best_score()).is_equal_to(20);
    let recorder = Recorder::attach(game.bus(), &[topics::NEW_BEST_SCORE]);

    game.tick(&[InputCommand::MenuSelect], DT);
    game.context_mut().world = forest_survival::entity::World::empty(1);
    for _ in 0..350 {
        game.context_mut().world.player.step();
    }
    game.context_mut().world.spawn(Enemy::Crocodile(Crocodile::new(220.0)));
    game.tick(&[], DT);

    assert_eq!(game.mode(), GameMode::GameOver);
    assert_that(&game.best_score()).is_equal_to(35);
    assert_that(&store.load().unwrap()).is_equal_to(35);

    let event = recorder.last(topics::NEW_BEST_SCORE).unwrap();
    assert_eq!(event.payload.get_int("score"), Some(35));
    assert_eq!(event.payload.get_int("previous"), Some(20));
}

#[test]
fn test_lower_score_keeps_the_best() {
    let store = Rc::new(MemoryStore::new(500));
    let mut game = new_game_with_store(Rc::clone(&store));
    let recorder = Recorder::attach(game.bus(), &[topics::NEW_BEST_SCORE]);

    game.tick(&[InputCommand::MenuSelect], DT);
    game.context_mut().world = forest_survival::entity::World::empty(1);
    game.context_mut().world.spawn(Enemy::Crocodile(Crocodile::new(220.0)));
    game.tick(&[], DT);

    assert_eq!(game.mode(), GameMode::GameOver);
    assert_that(&game.best_score()).is_equal_to(500);
    assert_that(&store.load().unwrap()).is_equal_to(500);
    assert_that(&recorder.count(topics::NEW_BEST_SCORE)).is_equal_to(0);
}

#[test]
fn test_quit_stops_the_loop_from_any_mode() {
    for setup in 0..3 {
        let mut game = new_game();
        if setup >= 1 {
            game.tick(&[InputCommand::MenuSelect], DT);
        }
        if setup == 2 {
            game.tick(&[InputCommand::PauseToggle], DT);
        }
        let mode = game.mode();

        let keep_going = game.tick(&[InputCommand::Quit], DT);

        assert_that(&keep_going).is_false();
        assert_that(&game.quit_requested()).is_true();
        assert_eq!(game.mode(), mode);
    }
}

#[test]
fn test_subsystems_publish_under_their_own_name() {
    let mut game = playing_game();
    let recorder = Recorder::attach(game.bus(), &[topics::PLAYER_JUMPED, topics::SHIELD_CHANGED]);

    game.tick(&[InputCommand::Jump, InputCommand::ShieldCycle], DT);

    let events = recorder.events();
    assert_that(&events).has_length(2);
    for event in events {
        assert_eq!(event.source, "world");
    }
    assert_that(&game.world().player.is_airborne()).is_true();
}

#[test]
fn test_wizard_is_announced_before_it_flies() {
    let mut game = new_game();
    let recorder = Recorder::attach(game.bus(), &[topics::WIZARD_WARNING]);

    game.tick(&[InputCommand::MenuSelect], DT);

    let warning = recorder.last(topics::WIZARD_WARNING).unwrap();
    let delay = warning.payload.get_float("delay").unwrap();
    assert_that(&delay).is_greater_than_or_equal_to(5.0);
    assert_that(&delay).is_less_than_or_equal_to(8.0);

    idle(&mut game, 60);
    assert_that(&recorder.count(topics::WIZARD_WARNING)).is_equal_to(1);
}

#[test]
fn test_autopilot_plays_from_the_menu() {
    let mut game = new_game();
    let mut pilot = Autopilot::new(false);

    for _ in 0..60 {
        let input = pilot.poll(game.context());
        assert_that(&game.tick(&input, DT)).is_true();
    }

    assert_eq!(game.mode(), GameMode::Playing);
    assert_that(&game.world().player.distance()).is_equal_to(59);
    assert_that(&game.score()).is_equal_to(5);
}
