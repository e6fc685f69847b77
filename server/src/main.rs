mod app;
mod config;
mod routes;
mod state;

use std::path::Path;

use tokio::signal;
use tracing_subscriber::EnvFilter;

use crate::state::AppState;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let registry = match territory_shared::try_registry() {
        Ok(registry) => registry,
        Err(e) => {
            tracing::error!(error = %e, "built-in region registry failed to build");
            return;
        }
    };

    let state = AppState::new();
    tracing::info!(
        regions = registry.len(),
        max_records = state.max_records,
        "Region registry loaded"
    );

    if let Some(seed) = config::seed_file() {
        load_seed(&state, &seed).await;
    }

    let app = app::build_app(state);

    let addr = format!("0.0.0.0:{}", config::server_port());
    tracing::info!("Territory map server listening on {addr}");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, %addr, "failed to bind TCP listener");
            return;
        }
    };
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "server failed");
    }

    tracing::info!("Server shut down gracefully");
}

/// Failures leave the server running with an empty record set.
async fn load_seed(state: &AppState, path: &Path) {
    let body = match tokio::fs::read(path).await {
        Ok(body) => body,
        Err(e) => {
            tracing::error!(error = %e, path = %path.display(), "failed to read seed file");
            return;
        }
    };
    let records = match routes::api::parse_records(&body) {
        Ok(records) => records,
        Err(e) => {
            tracing::error!(error = %e, path = %path.display(), "seed file is not a record array");
            return;
        }
    };
    if records.len() > state.max_records {
        tracing::warn!(
            records = records.len(),
            max_records = state.max_records,
            "seed file exceeds the record limit, starting empty"
        );
        return;
    }

    let summary = state.replace_records(records).await;
    tracing::info!(
        records = summary.records,
        ignored = summary.ignored,
        path = %path.display(),
        "Seed records loaded"
    );
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        let mut sigterm = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(sigterm) => sigterm,
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                return;
            }
        };
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::load_seed;
    use crate::state::AppState;

    #[tokio::test]
    async fn seed_file_populates_records() {
        let path = std::env::temp_dir().join(format!("territory-seed-{}.json", std::process::id()));
        tokio::fs::write(&path, br#"[{"_zip":"33301"},{"_zip":"33480"},{"_zip":"11111"}]"#)
            .await
            .expect("write seed file");

        let state = AppState::with_max_records(10);
        load_seed(&state, &path).await;
        let _ = tokio::fs::remove_file(&path).await;

        let snapshot = state.snapshot.read().await;
        assert_eq!(snapshot.records.len(), 3);
        assert_eq!(snapshot.report.ignored, 1);
    }

    #[tokio::test]
    async fn missing_or_invalid_seed_leaves_state_empty() {
        let state = AppState::with_max_records(10);
        load_seed(&state, std::path::Path::new("/nonexistent/territory-seed.json")).await;
        assert_eq!(state.snapshot.read().await.seq, 0);

        let path =
            std::env::temp_dir().join(format!("territory-seed-bad-{}.json", std::process::id()));
        tokio::fs::write(&path, b"{\"not\":\"an array\"}")
            .await
            .expect("write seed file");
        load_seed(&state, &path).await;
        let _ = tokio::fs::remove_file(&path).await;
        assert_eq!(state.snapshot.read().await.seq, 0);
    }
}
