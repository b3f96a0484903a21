//! `jobwatch` library crate.
//!
//! Configuration, argument parsing, and text rendering for the terminal
//! front-end. The binary entrypoint lives in `main.rs`.

pub mod cli;
pub mod config;
pub mod render;
