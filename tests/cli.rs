use std::path::Path;

use clap::Parser;
use forest_survival::cli::Args;
use pretty_assertions::assert_eq;
use speculoos::prelude::*;

#[test]
fn test_no_flags_leaves_everything_to_config() {
    let args = Args::try_parse_from(["forest-survival"]).unwrap();

    assert_that(&args.ticks).is_none();
    assert_that(&args.config).is_none();
    assert_that(&args.seed).is_none();
    assert_that(&args.fast).is_false();
    assert_that(&args.restart).is_false();
}

#[test]
fn test_long_and_short_flags() {
    let args = Args::try_parse_from([
        "forest-survival",
        "--ticks",
        "2000",
        "-c",
        "runs/night.toml",
        "-s",
        "7",
        "--fast",
        "--restart",
    ])
    .unwrap();

    assert_that(&args.ticks).is_equal_to(Some(2000));
    assert_eq!(args.config.as_deref(), Some(Path::new("runs/night.toml")));
    assert_that(&args.seed).is_equal_to(Some(7));
    assert_that(&args.fast).is_true();
    assert_that(&args.restart).is_true();
}

#[test]
fn test_bad_values_are_rejected() {
    assert_that(&Args::try_parse_from(["forest-survival", "--ticks", "lots"]).is_err()).is_true();
    assert_that(&Args::try_parse_from(["forest-survival", "--seed"]).is_err()).is_true();
    assert_that(&Args::try_parse_from(["forest-survival", "--turbo"]).is_err()).is_true();
}
