// src/core/mod.rs

pub mod alignment;
pub mod commons;
pub mod config_loader;
pub mod error;
pub mod expansion;
pub mod launch_options;
pub mod markers;
pub mod modifiers;
pub mod paths;
pub mod plan_executor;
pub mod planner;
pub mod printf;
pub mod references;
pub mod slices;
pub mod sources;
pub mod specifier_parser;
