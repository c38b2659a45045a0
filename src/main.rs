use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{AppState, router};
use appointment_core::config::core_config_from_env_values;

/// Main entry point for the appointment service
///
/// Resolves the engine configuration once, then serves the REST API with Swagger UI.
///
/// # Environment Variables
/// - `APPOINTMENT_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `APPOINTMENT_DAY_START`: first slot start, `HH:MM` (default: "09:00")
/// - `APPOINTMENT_DAY_END`: last slot start, `HH:MM` (default: "17:00")
/// - `APPOINTMENT_REMINDER_TEMPLATE`: reminder template with `{date}` / `{time}` placeholders
/// - `APPOINTMENT_MISSING_ID_POLICY`: `ignore` or `reject` (default: "ignore")
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - any configuration value is invalid,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("appointments_run=info".parse()?)
                .add_directive("appointment_core=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = core_config_from_env_values(
        std::env::var("APPOINTMENT_DAY_START").ok(),
        std::env::var("APPOINTMENT_DAY_END").ok(),
        std::env::var("APPOINTMENT_REMINDER_TEMPLATE").ok(),
        std::env::var("APPOINTMENT_MISSING_ID_POLICY").ok(),
    )?;
    tracing::info!(
        day_start = %cfg.day_start(),
        day_end = %cfg.day_end(),
        missing_id_policy = ?cfg.missing_id_policy(),
        "resolved core configuration"
    );

    let addr = std::env::var("APPOINTMENT_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    tracing::info!("++ Starting appointment REST API on {}", addr);

    let app = router(AppState::new(Arc::new(cfg)));
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
