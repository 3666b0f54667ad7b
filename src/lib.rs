//! Weekly class timetable generation.
//!
//! Subjects are placed into day/period slots greedily: each slot draws a
//! subject that still has weekly quota and does not repeat the neighbouring
//! period, with a configurable fallback when only a repeat would use up the
//! remaining quota. A strict wrapper regenerates until no subject sits in two
//! consecutive periods, within a bounded number of attempts.
//!
//! # Modules
//!
//! - **`solver`**: `generate`, `generate_strict`, `is_valid` and the request
//!   level `solve`
//! - **`policy`**: fallback and slot-order parameters
//! - **`data`**: subjects, config, timetable grid, request/response types
//! - **`validation`**: request checks producing a `TimetableConfig`
//! - **`stats`**: per-subject usage, free slots and unmet soft constraints
//! - **`config`** / **`server`**: the JSON HTTP service

pub mod config;
pub mod data;
pub mod policy;
pub mod server;
pub mod solver;
pub mod stats;
pub mod validation;
