//! CLI module for the imgcurate tool

#[path = "main.rs"]
mod main_impl;

pub use main_impl::{main, Cli, Command};
