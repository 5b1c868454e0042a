use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use dashit_filter::{OfftargetClient, OfftargetConfig, OfftargetServer};

///
/// A launched off-target server and a client talking to it.
///
/// Dropping the session kills the server.
///
pub struct OfftargetSession {
    pub server: OfftargetServer,
    pub client: OfftargetClient,
}

impl OfftargetSession {
    ///
    /// Launch `offtarget` on `sites_file`, arrange for Ctrl-C to kill it
    /// and wait until it answers queries.
    ///
    pub fn start(sites_file: &Path, config: &OfftargetConfig) -> Result<Self> {
        let mut server = OfftargetServer::launch(sites_file)
            .with_context(|| format!("launching off-target server on {}", sites_file.display()))?;
        server
            .kill_on_interrupt()
            .context("installing interrupt handler for the off-target server")?;

        let probe_client = OfftargetClient::new(config.startup());
        server
            .wait_ready(&probe_client)
            .context("waiting for the off-target server to start")?;

        Ok(OfftargetSession {
            server,
            client: OfftargetClient::new(config.clone()),
        })
    }

    pub fn shutdown(self) -> Result<()> {
        info!("Done with off-target server, shutting it down");
        self.server
            .shutdown()
            .context("shutting down the off-target server")
    }
}
