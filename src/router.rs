use crate::api::SheetsApi;
use crate::config::Config;
use crate::google_oauth::SessionProvider;
use crate::handlers::{self, players, session, war_records};
use crate::secrets::Secrets;
use crate::service::SheetReader;
use axum::{
    Router,
    extract::FromRef,
    routing::{get, post},
};
use axum_extra::extract::cookie::Key;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub secrets: Arc<Secrets>,
    pub sessions: Arc<SessionProvider>,
    pub reader: SheetReader,
    pub insecure_cookie: bool,
    cookie_key: Key,
}

impl AppState {
    pub fn new(secrets: Secrets, client: reqwest::Client, cfg: &Config) -> Self {
        // Validation guarantees at least 32 characters, so at least 32 bytes.
        let cookie_key = Key::derive_from(secrets.app.cookie_encryption_key.as_bytes());
        let sessions = SessionProvider::new(Arc::new(secrets.service_account.clone()), client);
        Self {
            secrets: Arc::new(secrets),
            sessions: Arc::new(sessions),
            reader: SheetReader::new(SheetsApi::new(cfg.sheets_api_base.clone())),
            insecure_cookie: cfg.insecure_cookie,
            cookie_key,
        }
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

pub fn records_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(handlers::healthz))
        .route("/login", post(session::login))
        .route("/logout", post(session::logout))
        .route("/war-records", get(war_records::list))
        .route("/war-records.csv", get(war_records::export_csv))
        .route("/war-records/decks", get(war_records::decks))
        .route("/war-records/analysis", get(war_records::analysis))
        .route("/players", get(players::players))
        .route("/players/results", get(players::results))
        .route("/players/merged", get(players::merged))
        .with_state(state)
}
