mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use planty_api::auth::AppStateInner;
use planty_api::token::TokenService;
use planty_bus::{ColorPublisher, LogPublisher, RosbridgeConfig, RosbridgePublisher};
use planty_db::Database;
use planty_vision::{CameraAnalyzer, OpenAiConfig, OpenAiVision, PlantAnalyzer};

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "planty=debug,planty_api=debug,planty_bus=info,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;
    if config.uses_placeholder_secret() {
        warn!("PLANTY_JWT_SECRET is unset or a placeholder; tokens are forgeable");
    }

    let db = Arc::new(Database::open(&config.db_path)?);
    let tokens = TokenService::new(
        &config.jwt_secret,
        chrono::Duration::minutes(config.token_ttl_minutes),
    );
    info!("Session tokens valid for {} minutes", config.token_ttl_minutes);

    let rosbridge = config.rosbridge_url.as_ref().map(|url| {
        let mut bus = RosbridgeConfig::new(url.clone());
        bus.topic = config.led_topic.clone();
        Arc::new(RosbridgePublisher::spawn(bus))
    });
    let publisher: Arc<dyn ColorPublisher> = match &rosbridge {
        Some(rosbridge) => rosbridge.clone(),
        None => {
            info!("PLANTY_ROSBRIDGE_URL not set; LED commands will only be logged");
            Arc::new(LogPublisher)
        }
    };

    let analyzer = build_analyzer(&config)?;

    let state = AppStateInner::new(db, tokens, publisher, analyzer);
    let app = planty_api::router::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Planty server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(rosbridge) = rosbridge {
        rosbridge.shutdown().await;
    }
    info!("Shutdown complete");
    Ok(())
}

fn build_analyzer(config: &Config) -> anyhow::Result<Option<Arc<dyn PlantAnalyzer>>> {
    let (Some(camera_url), Some(api_key)) = (&config.camera_url, &config.openai_api_key) else {
        info!("Camera URL or OPENAI_API_KEY not set; plant analysis runs are disabled");
        return Ok(None);
    };

    let client = reqwest::Client::builder().build()?;
    let mut openai = OpenAiConfig::new(api_key.clone());
    openai.model = config.vision_model.clone();

    let vision = OpenAiVision::new(client.clone(), openai);
    info!("Plant analysis enabled (camera {}, model {})", camera_url, config.vision_model);
    Ok(Some(Arc::new(CameraAnalyzer::new(client, camera_url.clone(), vision))))
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(s) => s,
                Err(e) => {
                    warn!("Failed to install SIGTERM handler: {}", e);
                    ctrl_c.await.ok();
                    return;
                }
            };
        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
