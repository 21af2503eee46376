//! Business logic services

pub mod resolver;

pub use resolver::AvatarResolver;
