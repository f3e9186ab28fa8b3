use mimalloc::MiMalloc;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use waic_records::secrets::{Secrets, SecretsSource};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cfg = &waic_records::config::CONFIG;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cfg.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(false),
        )
        .init();

    let source = SecretsSource::resolve(cfg);
    info!(
        listen_addr = %cfg.listen_addr,
        proxy = %cfg.proxy.as_ref().map(|u| u.as_str()).unwrap_or("<none>"),
        loglevel = %cfg.loglevel,
        sheets_api_base = %cfg.sheets_api_base,
        secrets = %source_label(&source),
    );

    let secrets = Secrets::load(&source).inspect_err(|e| {
        error!(error = %e, "failed to load secrets");
    })?;

    let client = waic_records::google_oauth::build_http_client(cfg)?;
    let state = waic_records::router::AppState::new(secrets, client, cfg);
    let app = waic_records::router::records_router(state);

    let listener = TcpListener::bind(&cfg.listen_addr).await?;
    info!("HTTP server listening on {}", cfg.listen_addr);
    axum::serve(listener, app).await?;
    Ok(())
}

fn source_label(source: &SecretsSource) -> String {
    match source {
        SecretsSource::File(path) => path.display().to_string(),
        SecretsSource::Inline(_) => "<inline>".to_string(),
    }
}
