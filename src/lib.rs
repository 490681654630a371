//! Library crate for game-reviews-back, exposing modules for binaries and integration tests.

/// Configuration file and environment loading.
pub mod config;
/// Entities and storage backends.
pub mod dao;
mod dto;
mod error;
/// HTTP routes and handlers.
pub mod routes;
/// Business logic sitting between routes and storage.
pub mod services;
/// Shared application state.
pub mod state;
