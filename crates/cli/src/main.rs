//! `jobwatch` -- terminal front-end for the migration status panel.
//!
//! Starts migration jobs on the backend, polls their status until none is
//! running, and keeps a local history that survives restarts.
//!
//! # Environment variables
//!
//! | Variable                | Required | Default     | Description                          |
//! |-------------------------|----------|-------------|--------------------------------------|
//! | `MIGRATION_BACKEND_URL` | yes*     | --          | Backend base URL (*not for `history`) |
//! | `JOBWATCH_STATE_DIR`    | no       | `.jobwatch` | Directory for the persisted history  |
//! | `POLL_INTERVAL_SECS`    | no       | `3`         | Seconds between status checks        |
//! | `REQUEST_TIMEOUT_SECS`  | no       | unset       | Per-request timeout                  |
//! | `APP_ID`                | no       | `jobwatch`  | Application id sent when signing     |
//! | `APP_SIGNING_SECRET`    | no       | unset       | Enables HMAC request signing         |

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use jobwatch_cli::cli::{Cli, Command};
use jobwatch_cli::config::PanelConfig;
use jobwatch_cli::render;
use jobwatch_client::{HmacSigner, MigrationApi, RequestSigner, UnsignedRequests};
use jobwatch_core::{Notification, NotificationKind};
use jobwatch_panel::{NotificationBus, PanelController, TokioScheduler};
use jobwatch_store::{FileStore, KeyValueStore, MigrationHistory};

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "jobwatch=info,jobwatch_panel=info,jobwatch_store=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = match PanelConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(config.state_dir.clone()));
    let history = MigrationHistory::new(store);

    if !cli.command.needs_backend() {
        print!("{}", render::format_history(&history.load()));
        return ExitCode::SUCCESS;
    }

    let backend_url = match config.require_backend_url() {
        Ok(url) => url,
        Err(e) => {
            tracing::error!(error = %e, "Cannot contact the migration backend");
            return ExitCode::FAILURE;
        }
    };

    let signer: Arc<dyn RequestSigner> = match &config.signing_secret {
        Some(secret) => Arc::new(HmacSigner::new(config.app_id.clone(), secret.clone())),
        None => Arc::new(UnsignedRequests),
    };

    let api = match MigrationApi::new(backend_url, config.request_timeout, signer) {
        Ok(api) => api,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build backend client");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(
        backend_url = %api.base_url(),
        state_dir = %config.state_dir.display(),
        poll_interval_secs = config.poll_interval.as_secs(),
        signed = config.signing_secret.is_some(),
        "Starting jobwatch",
    );

    let bus = Arc::new(NotificationBus::default());
    let printer = tokio::spawn(print_notifications(bus.subscribe()));

    let panel = PanelController::new(
        Arc::new(api),
        history,
        bus.clone(),
        Arc::new(TokioScheduler),
        config.poll_interval,
    );

    let exit = run(&panel, &cli.command).await;

    panel.shutdown();
    let records = panel.snapshot().records;
    // The printer ends once every sender is gone.
    drop(panel);
    drop(bus);
    let _ = printer.await;

    print!("{}", render::format_history(&records));
    exit
}

async fn run(panel: &PanelController, command: &Command) -> ExitCode {
    panel.initialize().await;

    if *command == Command::Start {
        if let Err(e) = panel.start_migration().await {
            tracing::error!(error = %e, "Migration was not started");
            return ExitCode::FAILURE;
        }
    }

    tokio::select! {
        _ = panel.wait_until_idle() => ExitCode::SUCCESS,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted, running migrations keep going on the backend");
            ExitCode::from(130)
        }
    }
}

async fn print_notifications(mut rx: tokio::sync::broadcast::Receiver<Notification>) {
    loop {
        match rx.recv().await {
            Ok(notification) => match notification.kind {
                NotificationKind::Success => println!("{notification}"),
                NotificationKind::Failure => eprintln!("{notification}"),
            },
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Notification printer lagged");
            }
            Err(RecvError::Closed) => break,
        }
    }
}
