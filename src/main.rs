use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use prompt_relay::llm::Provider;
use prompt_relay::{Config, Relay, Request, Server, api};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::parse();
    let providers = config.providers()?;

    for provider in Provider::ALL {
        if providers.is_configured(provider) {
            info!(%provider, model = provider.model(), "provider enabled");
        } else {
            warn!(%provider, "API key not set, provider disabled");
        }
    }

    let relay = Arc::new(Relay::new(providers));
    let router = Arc::new(api::router(relay, config.cors()));

    let server = Server::bind(config.bind_addr())
        .await?
        .max_request_size(config.max_body_bytes);

    server
        .run_until(
            move |req: Request| {
                let router = Arc::clone(&router);
                async move { router.route(req).await }
            },
            async {
                if let Err(err) = tokio::signal::ctrl_c().await {
                    warn!(error = %err, "failed to listen for ctrl-c");
                    std::future::pending::<()>().await;
                }
            },
        )
        .await?;

    info!("server stopped");
    Ok(())
}
