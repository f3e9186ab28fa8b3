pub mod auth;

pub use auth::{AUTH_COOKIE, RequireLogin};
