use sautii_server::config::ServerConfig;
use sautii_server::{build_router, AppState};
use sautii_storage::{snapshot, InMemoryStore, IssueStore};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = ServerConfig::from_env()?;

    let mem = InMemoryStore::new();
    if let Some(path) = &cfg.seed_path {
        match snapshot::read_issues(path) {
            Ok((issues, manifest)) => {
                for issue in issues {
                    mem.load(issue);
                }
                info!(
                    path = %manifest.path,
                    issues = manifest.issues,
                    skipped = manifest.skipped,
                    "seed loaded"
                );
            }
            Err(e) => {
                warn!("seed load from {} failed: {}, starting empty", path.display(), e);
            }
        }
    }
    let store: Arc<dyn IssueStore> = Arc::new(mem);
    let app = build_router(AppState::new(store));

    info!("http listening on {}", cfg.http_addr);
    match &cfg.tls {
        Some(tls) => {
            let config =
                axum_server::tls_rustls::RustlsConfig::from_pem_file(&tls.cert, &tls.key).await?;
            axum_server::bind_rustls(cfg.http_addr, config)
                .serve(app.into_make_service())
                .await?;
        }
        None => {
            axum_server::bind(cfg.http_addr)
                .serve(app.into_make_service())
                .await?;
        }
    }
    Ok(())
}
