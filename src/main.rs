use anyhow::Context;
use word_memory::api::{app_router, ApiState};
use word_memory::config::Config;
use word_memory::db::Db;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env();
    let db = Db::connect(&config)
        .await
        .with_context(|| format!("failed to open progress store at {}", config.database_url))?;

    let state = ApiState::new(db, config.session_batch_size).with_session_ttl(config.session_ttl);
    let app = app_router(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    log::info!("word-memory listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        log::error!("failed to listen for shutdown signal: {}", err);
    }
}
