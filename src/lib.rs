//! Bearer-token authentication layer for axum services
//!
//! Issues HS256 tokens after a successful signin and gates routes with one of
//! three dispatch policies: open, required or optional authentication.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod telemetry;
