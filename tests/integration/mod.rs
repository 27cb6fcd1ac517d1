//! Integration test module for extbuild
//!
//! Tests are grouped by lifecycle command.

pub mod build;
pub mod common;
pub mod config;
