use leadboard_shared::{config::Config, AppState};
use lambda_http::{run, service_fn, Error, Request};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod http_handler;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .without_time()
        .init();

    // Resolve config and clients once at cold start
    let config = Config::from_env()?;
    let http = reqwest::Client::builder().build()?;
    let state = AppState::new(config, http);
    tracing::info!(
        "manage-users ready (project: {}, role table: {})",
        state.config.supabase_url.host_str().unwrap_or("unknown"),
        state.config.role_table
    );

    run(service_fn(move |event: Request| {
        let state = Arc::clone(&state);
        async move { http_handler::function_handler(event, state).await }
    }))
    .await
}
