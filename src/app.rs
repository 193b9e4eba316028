use actix_web::web;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::domain::error::{AppError, Result};
use crate::infrastructure::api_client::{HttpApiClient, QaBackend};
use crate::infrastructure::config::AppConfig;
use crate::interfaces::http::{self, add_log, HttpState};
use crate::interfaces::stub_backend;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    ViewServer,
    /// Canned fixtures, or the routes of the given JSON file.
    StubBackend { routes: Option<PathBuf> },
}

impl Mode {
    pub fn from_args<I: IntoIterator<Item = String>>(args: I) -> Result<Self> {
        let mut args = args.into_iter();
        match args.next().as_deref() {
            None => Ok(Mode::ViewServer),
            Some("stub-backend") => Ok(Mode::StubBackend {
                routes: args.next().map(PathBuf::from),
            }),
            Some(other) => Err(AppError::ValidationError(format!(
                "Unknown mode '{}'. Usage: qa-dashboard [stub-backend [routes.json]]",
                other
            ))),
        }
    }
}

/// `RUST_LOG` wins over the configured filter. Safe to call more than once.
fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

async fn serve_views(config: AppConfig) -> Result<()> {
    let client = HttpApiClient::from_config(&config)?;
    let logs = Arc::new(Mutex::new(Vec::new()));
    add_log(
        &logs,
        "INFO",
        "App",
        &format!("Using QA backend at {}", client.base_url()),
    );
    let state = web::Data::new(HttpState::new(
        QaBackend::new(Arc::new(client)),
        &config,
        logs,
    ));

    http::start_server(state.clone(), &config.listen_host, config.listen_port)?.await?;
    state.health.dispose();
    Ok(())
}

async fn serve_stub(config: AppConfig, routes: Option<PathBuf>) -> Result<()> {
    let routes = match routes {
        Some(path) => {
            let routes = stub_backend::load_routes(&path)?;
            info!(path = %path.display(), routes = routes.len(), "Loaded stub routes");
            routes
        }
        None => stub_backend::default_fixture_routes(),
    };
    stub_backend::run_stub(config.stub_port, routes).await?;
    Ok(())
}

pub fn run() {
    let config = AppConfig::load();
    init_tracing(
        config
            .as_ref()
            .map(|config| config.log_filter.as_str())
            .unwrap_or("info"),
    );

    let outcome = config.and_then(|config| {
        let mode = Mode::from_args(std::env::args().skip(1))?;
        info!(?mode, backend = %config.api_base_url, "Starting qa-dashboard");
        actix_web::rt::System::new().block_on(async move {
            match mode {
                Mode::ViewServer => serve_views(config).await,
                Mode::StubBackend { routes } => serve_stub(config, routes).await,
            }
        })
    });

    if let Err(err) = outcome {
        error!(kind = err.kind(), error = %err, "qa-dashboard stopped");
        std::process::exit(1);
    }
}
