use crate::relay::RelayConfig;
use clap::Parser;
use std::time::Duration;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Host address and port for the server to listen on.
    #[arg(long, env = "SERVER_ADDR", default_value = "127.0.0.1:4000")]
    pub server_addr: String,

    /// API key for the hosted assistant service.
    #[arg(long, env = "OPENAI_API_KEY")]
    pub openai_api_key: String,

    /// Identifier of the assistant that answers every question.
    #[arg(long, env = "ASSISTANT_ID")]
    pub assistant_id: String,

    /// Override the assistant service base URL (e.g. to point at a proxy).
    #[arg(long, env = "OPENAI_BASE_URL")]
    pub openai_base_url: Option<String>,

    /// Milliseconds between run status polls.
    #[arg(long, env = "POLL_INTERVAL_MS", default_value = "1000")]
    pub poll_interval_ms: u64,

    /// Total seconds a synchronous ask may wait for a terminal run status.
    #[arg(long, env = "SYNC_TIMEOUT_SECS", default_value = "60")]
    pub sync_timeout_secs: u64,

    /// Maximum status polls per streaming request before giving up.
    #[arg(long, env = "STREAM_MAX_POLLS", default_value = "600")]
    pub stream_max_polls: u32,

    /// Optional path to the TLS certificate file (PEM format) for enabling HTTPS. Requires --tls-key-path.
    #[arg(long, env = "TLS_CERT_PATH")]
    pub tls_cert_path: Option<String>,

    /// Optional path to the TLS private key file (PEM format) for enabling HTTPS. Requires --tls-cert-path.
    #[arg(long, env = "TLS_KEY_PATH")]
    pub tls_key_path: Option<String>,

    #[arg(long, env = "ENABLE_TLS", default_value = "false")]
    pub enable_tls: bool,
}

impl Args {
    pub fn relay_config(&self) -> RelayConfig {
        RelayConfig {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            sync_timeout: Duration::from_secs(self.sync_timeout_secs),
            stream_poll_cap: self.stream_max_polls,
        }
    }
}
