pub mod api;
pub mod config;
pub mod error;
pub mod google_oauth;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod secrets;
pub mod service;
pub mod types;

pub use error::RecordsError;
pub use google_oauth::{AuthorizedSession, SessionProvider, authenticate};
pub use secrets::{Secrets, SecretsSource, load_credentials};
pub use service::SheetReader;
