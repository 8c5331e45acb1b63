pub mod api;

use crate::cli::Args;
use crate::relay::Relay;
use log::{error, info};
use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;

pub struct Server {
    addr: String,
    relay: Arc<Relay>,
    args: Args,
}

impl Server {
    pub fn new(addr: String, relay: Arc<Relay>, args: Args) -> Self {
        Self { addr, relay, args }
    }

    pub async fn run(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let addr = self.addr.parse::<SocketAddr>()?;
        let app = api::router(self.relay.clone());

        if self.args.enable_tls
            && self.args.tls_cert_path.is_some()
            && self.args.tls_key_path.is_some()
        {
            let cert_path = self.args.tls_cert_path.as_ref().ok_or("missing TLS cert path")?;
            let key_path = self.args.tls_key_path.as_ref().ok_or("missing TLS key path")?;

            let tls_config =
                axum_server::tls_rustls::RustlsConfig::from_pem_file(cert_path, key_path).await?;

            info!("Starting HTTPS server on: https://{}", addr);
            axum_server::bind_rustls(addr, tls_config)
                .serve(app.into_make_service())
                .await?;
        } else {
            info!("Starting HTTP server on: http://{}", addr);
            let listener = match tokio::net::TcpListener::bind(addr).await {
                Ok(listener) => listener,
                Err(e) => {
                    error!(
                        "Failed to bind HTTP server to {}: {}. Try a different port.",
                        addr, e
                    );
                    return Err(Box::new(e));
                }
            };
            axum::serve(listener, app.into_make_service()).await?;
        }

        Ok(())
    }
}
