use crate::config::Config;
use crate::error::{server_error, Error};
use crate::shutdown;
use crate::web::{router, AppState};
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Initialize logging with environment-based configuration
pub fn init_logging() -> miette::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| server_error(&format!("Failed to set up logging: {}", e)))?;

    Ok(())
}

/// Load and validate the application config
pub fn load_config() -> miette::Result<Config> {
    match Config::load() {
        Ok(config) => Ok(config),
        Err(e) => {
            error!("Failed to load configuration: {:?}", e);
            Err(e.into())
        }
    }
}

/// Bind the listener and serve until a shutdown signal arrives
pub async fn start_server(config: Config) -> miette::Result<()> {
    let address = config.bind_address();

    if config.is_online() {
        info!("Using model {}", config.openai_model);
    } else {
        info!("No OPENAI_API_KEY set, events are generated offline");
    }

    let app = router(AppState::new(config));

    let listener = TcpListener::bind(&address).await.map_err(Error::from)?;
    info!("Listening on {}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown::wait_for_signal())
        .await
        .map_err(|e| server_error(&format!("Server error: {}", e)))?;

    info!("Server stopped");
    Ok(())
}
