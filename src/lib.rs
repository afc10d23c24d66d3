//! Forest Survival simulation core.
//!
//! The crate is split into the orchestration engine (registry, scheduler, event bus,
//! performance monitor) and the gameplay simulation that runs on top of it.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

#[cfg_attr(coverage_nightly, coverage(off))]
pub mod app;
#[cfg_attr(coverage_nightly, coverage(off))]
pub mod formatter;
#[cfg_attr(coverage_nightly, coverage(off))]
pub mod platform;

pub mod audio;
pub mod cli;
pub mod config;
pub mod constants;
pub mod engine;
pub mod entity;
pub mod error;
pub mod events;
pub mod game;
pub mod input;
pub mod persist;
pub mod systems;
