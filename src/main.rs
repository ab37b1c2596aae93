use std::sync::{Arc, Mutex};
use std::time::Duration;

use quaylog::api::{api_router, AppContext};
use quaylog::config::{self, ServerConfig};
use quaylog::db::{fail_stale_processing, open_database, ChangeKind, ChangeNotifier, Table};
use quaylog::pipeline::{DocumentProcessor, ExtractionAgent, HttpCompletionClient, PromptSet};
use quaylog::storage::LocalFileStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    quaylog::init_tracing();
    let settings = ServerConfig::from_env();

    std::fs::create_dir_all(config::storage_dir())?;
    let conn = open_database(&config::database_path())?;
    let db = Arc::new(Mutex::new(conn));
    let notifier = ChangeNotifier::new();

    // reqwest's blocking client must be built off the async runtime
    let client_settings = settings.clone();
    let client = tokio::task::spawn_blocking(move || {
        HttpCompletionClient::new(
            &client_settings.completion_base_url,
            client_settings.completion_api_key.clone(),
            &client_settings.completion_model,
            client_settings.completion_timeout_secs,
        )
    })
    .await??;
    let defaults = PromptSet::default();
    let prompts = PromptSet {
        transcribe_system: std::env::var("QUAYLOG_TRANSCRIBE_SYSTEM")
            .unwrap_or(defaults.transcribe_system),
        parse_system: std::env::var("QUAYLOG_PARSE_SYSTEM").unwrap_or(defaults.parse_system),
    };
    let processor = Arc::new(DocumentProcessor::new(
        ExtractionAgent::new(Box::new(client)).with_prompts(prompts),
        Box::new(LocalFileStore::new(config::storage_dir())),
        db.clone(),
        notifier.clone(),
    ));

    let ctx = AppContext::new(db.clone(), processor, notifier.clone());

    spawn_stale_sweep(
        db,
        notifier,
        settings.stale_processing_secs,
        settings.stale_sweep_interval_secs,
    );

    let app = api_router(ctx);
    let listener = tokio::net::TcpListener::bind(&settings.bind_addr).await?;
    tracing::info!(
        addr = %settings.bind_addr,
        version = config::APP_VERSION,
        "Quaylog listening"
    );
    axum::serve(listener, app).await?;
    Ok(())
}

/// Periodically fail documents stuck in `processing`, covering runs that
/// died without reaching a terminal status.
fn spawn_stale_sweep(
    db: Arc<Mutex<rusqlite::Connection>>,
    notifier: ChangeNotifier,
    max_age_secs: i64,
    interval_secs: u64,
) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
        ticker.tick().await; // first tick fires immediately
        loop {
            ticker.tick().await;
            let sweep_db = db.clone();
            let swept = tokio::task::spawn_blocking(move || {
                let conn = sweep_db.lock().ok()?;
                fail_stale_processing(&conn, max_age_secs).ok()
            })
            .await
            .ok()
            .flatten()
            .unwrap_or_default();

            for id in swept {
                tracing::warn!(document_id = %id, "Stale processing run marked failed");
                notifier.publish(Table::Documents, ChangeKind::Updated, Some(id));
            }
        }
    });
}
