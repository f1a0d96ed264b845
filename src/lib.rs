//! Library crate for health-aggregator, exposing modules for binaries and tests.

pub mod checks;
pub mod config;
pub mod dao;
pub mod dto;
pub mod error;
pub mod routes;
pub mod services;
pub mod state;
