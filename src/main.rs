// src/main.rs

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use chem_lms::config::Config;
use chem_lms::routes;
use chem_lms::state::AppState;
use chem_lms::store::PgStore;
use chem_lms::utils::hash::hash_password;
use dotenvy::dotenv;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file (if present)
    dotenv().ok();

    let config = Config::from_env();

    let file_appender = tracing_appender::rolling::daily("logs", "chem-lms.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    // Database may still be starting up alongside us
    let mut retry_count = 0;
    let pool = loop {
        match PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await
        {
            Ok(pool) => break pool,
            Err(e) => {
                retry_count += 1;
                if retry_count > 5 {
                    tracing::error!("Failed to connect to database after 5 retries: {}", e);
                    return Err(e.into());
                }
                tracing::warn!(
                    "Database not ready, retrying in 2s... (Attempt {})",
                    retry_count
                );
                tokio::time::sleep(Duration::from_secs(2)).await;
            }
        }
    };

    tracing::info!("Database connected...");

    tracing::info!("Running migrations...");
    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Migrations applied successfully.");

    if let Err(e) = seed_teacher(&pool, &config).await {
        tracing::error!("Failed to seed teacher account: {:?}", e);
    }

    let state = AppState {
        pool: pool.clone(),
        config: config.clone(),
        store: Arc::new(PgStore::new(pool)),
    };

    let app = routes::create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Creates the initial teacher account when TEACHER_USERNAME and
/// TEACHER_PASSWORD are set and no such teacher exists yet.
async fn seed_teacher(pool: &PgPool, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    if let (Some(username), Some(password)) = (&config.teacher_username, &config.teacher_password)
    {
        let existing: Option<(i64,)> = sqlx::query_as("SELECT id FROM teachers WHERE username = $1")
            .bind(username)
            .fetch_optional(pool)
            .await?;

        if existing.is_none() {
            tracing::info!("Seeding teacher account: {}", username);
            let hashed_password = hash_password(password)?;

            sqlx::query("INSERT INTO teachers (username, password, name) VALUES ($1, $2, $1)")
                .bind(username)
                .bind(hashed_password)
                .execute(pool)
                .await?;
            tracing::info!("Teacher account created successfully.");
        }
    }
    Ok(())
}
