use lambda_http::{run, service_fn, tracing, Error, Request};
use relay_shared::config::RelayConfig;
use relay_shared::AppState;
use std::sync::Arc;

mod http_handler;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing::init_default_subscriber();

    // Validate connection settings once at startup; a misconfigured
    // deployment fails here instead of on the first upload.
    let config = RelayConfig::from_env()?;
    let state = AppState::new(config);

    run(service_fn(move |event: Request| {
        let state = Arc::clone(&state);
        async move { http_handler::function_handler(event, state).await }
    }))
    .await
}
