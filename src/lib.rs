//! Per-region grid balancing: sample storage, a scalar minimizer, an
//! append-only result cache and the command routing shared by the HTTP,
//! CLI and chat front-ends.

pub mod access;
pub mod analysis;
pub mod api;
pub mod command;
pub mod config;
pub mod controller;
pub mod domain;
pub mod error;
pub mod ingest;
pub mod optimizer;
pub mod repo;
pub mod telemetry;

pub use error::{GridError, GridResult};
