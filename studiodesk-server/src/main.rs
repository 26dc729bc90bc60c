//! Studio Desk server binary

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use studiodesk_server::{
    routes, AppState, Config, ConsoleEmailSender, EmailSender, PasswordHasher, SessionGate,
    SmtpEmailSender, SqliteStore,
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "studiodesk_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // A missing session secret stops the server here
    let config = Config::from_env()?;
    tracing::info!(?config, "Loaded configuration");

    let store = Arc::new(
        SqliteStore::open(&config.database_url)
            .with_context(|| format!("opening database {}", config.database_url))?,
    );
    tracing::info!(path = %config.database_url, "Opened database");

    let email_sender: Box<dyn EmailSender> = match config.smtp.clone() {
        Some(smtp) => {
            tracing::info!(host = %smtp.host, "Sending email via SMTP");
            Box::new(SmtpEmailSender::new(smtp).map_err(anyhow::Error::msg)?)
        }
        None => {
            tracing::warn!("No email relay configured; emails will be logged");
            Box::new(ConsoleEmailSender::new())
        }
    };

    let gate = SessionGate::new(&config.session_secret, config.secure_cookies())?;

    let state = Arc::new(AppState::new(
        Arc::clone(&store),
        Arc::clone(&store),
        store,
        email_sender,
        gate,
        PasswordHasher::new(config.bcrypt_cost),
        config.base_url.clone(),
    ));

    let app = routes::create_router_with_static_path(state, &config.static_dir);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Studio Desk listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
