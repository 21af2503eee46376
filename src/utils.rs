//! Common utilities shared across the application

pub mod time;
