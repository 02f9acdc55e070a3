//! Train search server.
//!
//! Answers: "which trains run from around here to around there?" Station
//! codes are widened to every nearby station, and results can be narrowed
//! by ticket class and by departure/arrival time of day.

pub mod catalog;
pub mod config;
pub mod domain;
pub mod geo;
pub mod search;
pub mod web;
