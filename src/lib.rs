//! Avatar proxy library
//!
//! Resolves numeric user identifiers to avatar image URLs, shielding the
//! upstream directory service with an in-memory TTL cache and per-client
//! fixed-window admission control.

pub mod avatar_url;
pub mod cache;
pub mod config;
pub mod errors;
pub mod models;
pub mod rate_limit;
pub mod services;
pub mod upstream;
pub mod utils;
pub mod web;
