//! Core System Infrastructure
//!
//! Provides the pieces every application shares that are not tied to a
//! particular peripheral: error types and static configuration.

pub mod config;
pub mod error;
