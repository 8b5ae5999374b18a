//! Business logic services layer

pub mod signin_service;

pub use signin_service::SigninService;
