//! Serve command handler.
//!
//! Runs the HTTP gateway until interrupted.

use clap::Args;
use ward_core::{config::AppConfig, AppResult};

/// Run the HTTP gateway
#[derive(Args, Debug)]
pub struct ServeCommand {
    /// Address to bind (overrides server.host)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind (overrides server.port)
    #[arg(short, long)]
    pub port: Option<u16>,
}

impl ServeCommand {
    /// Execute the serve command.
    pub async fn execute(&self, mut config: AppConfig) -> AppResult<()> {
        if let Some(ref host) = self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }

        config.validate()?;

        tracing::info!(
            "Starting gateway on {} (store: {}, tenant: {})",
            config.server.bind_addr(),
            config.store.backend,
            config.store.tenant
        );

        ward_server::serve(&config).await
    }
}
