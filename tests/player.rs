use forest_survival::constants::{player, GROUND_Y};
use forest_survival::entity::animation::Animation;
use forest_survival::entity::collision::Tier;
use forest_survival::entity::enemy::SpawnMask;
use forest_survival::entity::player::{HitOutcome, Player};
use forest_survival::systems::difficulty::{level_for_score, DifficultyState};
use pretty_assertions::assert_eq;
use speculoos::prelude::*;

mod common;

use common::DT;

#[test]
fn test_jump_returns_to_the_ground() {
    let mut player = Player::new(3);

    assert_that(&player.jump()).is_true();
    assert_that(&player.jump()).is_false();

    let mut highest = GROUND_Y;
    let mut ticks = 0;
    while player.is_airborne() && ticks < 120 {
        player.update(DT);
        highest = highest.min(player.position.y);
        ticks += 1;
    }

    assert_that(&player.is_airborne()).is_false();
    assert_that(&player.position.y).is_equal_to(GROUND_Y);
    assert_that(&highest).is_less_than(GROUND_Y - 150.0);
    assert_that(&ticks).is_less_than(60);
}

#[test]
fn test_duck_shrinks_the_box_for_a_while() {
    let mut player = Player::new(3);
    let standing = player.bounding_box();

    assert_that(&player.toggle_duck()).is_true();
    let ducking = player.bounding_box();
    assert_that(&ducking.bottom()).is_equal_to(standing.bottom());
    assert_that(&ducking.size.y).is_equal_to(player::DUCK_HEIGHT);

    for _ in 0..40 {
        player.update(DT);
    }
    assert_that(&player.is_ducking()).is_false();
}

#[test]
fn test_duck_toggle_cuts_the_slide_short() {
    let mut player = Player::new(3);

    player.toggle_duck();
    assert_that(&player.toggle_duck()).is_false();
    assert_that(&player.is_ducking()).is_false();
}

#[test]
fn test_no_ducking_in_the_air() {
    let mut player = Player::new(3);
    player.jump();

    assert_that(&player.toggle_duck()).is_false();
    assert_that(&player.is_ducking()).is_false();
}

#[test]
fn test_shield_controls() {
    let mut player = Player::new(3);
    assert_that(&player.shield.state()).is_none();

    player.toggle_shield();
    assert_that(&player.shield.state()).is_equal_to(Some(Tier::Middle));

    player.cycle_shield();
    player.cycle_shield();
    assert_that(&player.shield.state()).is_equal_to(Some(Tier::Top));

    player.set_shield(Tier::Bottom);
    player.toggle_shield();
    assert_that(&player.shield.state()).is_none();
    assert_eq!(player.shield.position, Tier::Bottom);
}

#[test]
fn test_death_drops_the_shield() {
    let mut player = Player::new(1);
    player.toggle_shield();

    assert_eq!(player.apply_hit(), HitOutcome::Killed);
    assert_that(&player.shield.active).is_false();
    assert_that(&player.jump()).is_false();
}

#[test]
fn test_starting_health_is_capped() {
    assert_that(&Player::new(9).health()).is_equal_to(player::MAX_HEALTH);
}

#[test]
fn test_animation_frame_is_independent_of_tick_size() {
    const FRAMES: [f32; 3] = [0.1, 0.2, 0.3];
    let mut coarse = Animation::new(&FRAMES);
    let mut fine = Animation::new(&FRAMES);

    coarse.tick(0.25);
    for _ in 0..5 {
        fine.tick(0.05);
    }

    assert_that(&coarse.current_frame()).is_equal_to(1);
    assert_that(&fine.current_frame()).is_equal_to(1);
    assert_that(&coarse.frame_at(0.65)).is_equal_to(0);
}

#[test]
fn test_levels_by_score() {
    assert_that(&level_for_score(0).number).is_equal_to(1);
    assert_that(&level_for_score(99).number).is_equal_to(1);
    assert_that(&level_for_score(100).number).is_equal_to(2);
    assert_that(&level_for_score(199).number).is_equal_to(2);
    assert_that(&level_for_score(5_000).number).is_equal_to(3);
}

#[test]
fn test_levels_never_go_down() {
    let mut state = DifficultyState::default();

    assert_eq!(state.advance(150).to_vec(), vec![2]);
    assert_that(&state.advance(150).is_empty()).is_true();
    assert_that(&state.advance(0).is_empty()).is_true();
    assert_that(&state.level()).is_equal_to(2);
}

#[test]
fn test_encounter_suppresses_regular_spawns() {
    let mut state = DifficultyState::default();
    assert_that(&state.allowed().contains(SpawnMask::NINJA)).is_false();

    state.advance(150);
    state.begin_encounter();
    let allowed = state.allowed();
    assert_that(&allowed.contains(SpawnMask::NINJA)).is_true();
    assert_that(&allowed.intersects(SpawnMask::REGULAR)).is_false();
    assert_that(&allowed.contains(SpawnMask::OWL_TREE)).is_true();

    state.end_encounter(180);
    assert_that(&state.next_encounter_score()).is_equal_to(330);
    assert_that(&state.allowed().contains(SpawnMask::CROCODILE)).is_true();
}
