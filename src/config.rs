use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::LazyLock;
use url::Url;

/// OAuth scope requested for the service-account token. Reads only.
pub const SHEETS_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets.readonly";

/// JWT bearer grant used to trade a signed assertion for an access token.
pub const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Environment variable carrying the whole secrets TOML document.
pub const INLINE_SECRETS_ENV: &str = "WAIC_SECRETS_TOML";

pub static SHEETS_API_BASE: LazyLock<Url> = LazyLock::new(|| {
    Url::parse("https://sheets.googleapis.com/v4/").expect("valid Sheets API base url")
});

/// Process configuration. Layered as defaults, then `waic.toml`, then `WAIC_*` env.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub listen_addr: String,
    pub loglevel: String,
    /// Secrets TOML file; ignored when `WAIC_SECRETS_TOML` is set.
    pub secrets_path: PathBuf,
    pub proxy: Option<Url>,
    /// Drop the `Secure` flag on the login cookie (plain-http local runs).
    pub insecure_cookie: bool,
    pub sheets_api_base: Url,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8000".to_string(),
            loglevel: "info".to_string(),
            secrets_path: PathBuf::from(".streamlit/secrets.toml"),
            proxy: None,
            insecure_cookie: false,
            sheets_api_base: SHEETS_API_BASE.clone(),
        }
    }
}

impl Config {
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file("waic.toml"))
            .merge(Env::prefixed("WAIC_").ignore(&["secrets_toml"]))
    }

    pub fn load() -> Result<Self, figment::Error> {
        Self::figment().extract()
    }
}

pub static CONFIG: LazyLock<Config> =
    LazyLock::new(|| Config::load().expect("FATAL: invalid waic configuration"));
