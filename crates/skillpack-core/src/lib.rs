//! Configuration loading and application bootstrap for skillpack.

pub mod bootstrap;
pub mod config;
