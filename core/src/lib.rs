//! Plan execution engine and dependency-graph analysis.

pub mod api;
pub mod capability;
pub mod config;
pub mod error;
pub mod graph;
pub mod plan;
pub mod planning;
pub mod review;
pub mod scheduler;
