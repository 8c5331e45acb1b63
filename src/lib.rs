pub mod assistant;
pub mod cli;
pub mod models;
pub mod relay;
pub mod server;

use assistant::openai::OpenAIAssistantClient;
use cli::Args;
use log::info;
use relay::Relay;
use server::Server;
use std::error::Error;
use std::sync::Arc;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("Server Address: {}", args.server_addr);
    info!("Assistant ID: {}", args.assistant_id);
    if let Some(base_url) = &args.openai_base_url {
        info!("Assistant API Base URL: {}", base_url);
    }
    info!("Poll Interval (ms): {}", args.poll_interval_ms);
    info!("Sync Timeout (s): {}", args.sync_timeout_secs);
    info!("Stream Max Polls: {}", args.stream_max_polls);
    info!("TLS Enabled: {}", args.enable_tls);
    info!("-------------------------");

    let client = OpenAIAssistantClient::new(
        &args.openai_api_key,
        args.assistant_id.clone(),
        args.openai_base_url.clone(),
    )?;
    let relay = Arc::new(Relay::new(Arc::new(client), args.relay_config()));

    let addr = args.server_addr.clone();
    let server = Server::new(addr, relay, args);
    server.run().await?;

    Ok(())
}
