//! Tells a farmer which mandi pays the most for a load once transport is
//! paid for.

pub mod app;
pub mod config;
pub mod domain;
pub mod infra;
pub mod util;

pub use app::{Advice, Advisor};
pub use config::{AdvisorConfig, ConfigError};
