use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{error, info, warn};

use crate::errors::{OfftargetError, OfftargetResult};
use crate::offtarget::OfftargetClient;

pub const OFFTARGET_PROGRAM: &str = "offtarget";

///
/// A running `offtarget` server, loaded with a file of off-target sites.
///
/// The process is killed when the handle is shut down, dropped, or (after
/// [OfftargetServer::kill_on_interrupt]) when the process receives Ctrl-C
/// or SIGTERM.
///
pub struct OfftargetServer {
    child: Arc<Mutex<Child>>,
    pid: u32,
    sites_file: PathBuf,
}

fn lock(child: &Mutex<Child>) -> MutexGuard<'_, Child> {
    child.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl OfftargetServer {
    ///
    /// Start `offtarget` from `PATH` serving `sites_file`.
    ///
    pub fn launch(sites_file: &Path) -> OfftargetResult<Self> {
        Self::launch_program(OFFTARGET_PROGRAM, &[] as &[&str], sites_file)
    }

    ///
    /// Start `program` with `HOST=file://<absolute sites_file>` in its
    /// environment and check that it is still running.
    ///
    pub fn launch_program<S: AsRef<OsStr>>(
        program: &str,
        args: &[S],
        sites_file: &Path,
    ) -> OfftargetResult<Self> {
        let sites_file = sites_file.canonicalize().map_err(|e| {
            OfftargetError::Launch(format!("{}: {}", sites_file.display(), e))
        })?;
        let host = format!("file://{}", sites_file.display());
        info!("Launching {} with HOST = {}", program, host);

        let child = Command::new(program)
            .args(args)
            .env("HOST", &host)
            .stdin(Stdio::null())
            .spawn()
            .map_err(|e| {
                OfftargetError::Launch(format!(
                    "{} ({}). Is {} in your PATH? Is {} an off-target sites file generated by crispr_sites?",
                    program,
                    e,
                    program,
                    sites_file.display()
                ))
            })?;

        let mut server = OfftargetServer {
            pid: child.id(),
            child: Arc::new(Mutex::new(child)),
            sites_file,
        };
        server.is_alive()?;
        Ok(server)
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn sites_file(&self) -> &Path {
        &self.sites_file
    }

    ///
    /// `Ok` while the process is running, [OfftargetError::ServerExited]
    /// once it has stopped.
    ///
    pub fn is_alive(&mut self) -> OfftargetResult<()> {
        match lock(&self.child).try_wait()? {
            None => Ok(()),
            Some(status) => {
                error!("off-target server exited unexpectedly with {}", status);
                Err(OfftargetError::ServerExited(status.code()))
            }
        }
    }

    ///
    /// Block until the server answers a probe query through `client`.
    /// Fails with [OfftargetError::ServerExited] as soon as the process
    /// is found dead between retries.
    ///
    pub fn wait_ready(&mut self, client: &OfftargetClient) -> OfftargetResult<()> {
        self.is_alive()?;
        info!(
            "Poking off-target server. Timeout {} seconds.",
            client.config().timeout_secs
        );
        if let Err(e) = client.probe_while(|| self.is_alive()) {
            // a dead server explains the failure better than the timeout
            self.is_alive()?;
            return Err(e);
        }
        info!("Off-target server is alive.");
        Ok(())
    }

    ///
    /// Kill the server and exit with status 1 on Ctrl-C or SIGTERM.
    ///
    /// Only one interrupt handler can be installed per process.
    ///
    pub fn kill_on_interrupt(&self) -> OfftargetResult<()> {
        let child = Arc::clone(&self.child);
        ctrlc::set_handler(move || {
            warn!("Killing off-target server");
            let mut child = lock(&child);
            let _ = child.kill();
            let _ = child.wait();
            std::process::exit(1);
        })
        .map_err(|e| OfftargetError::Interrupt(e.to_string()))
    }

    pub fn shutdown(self) -> OfftargetResult<()> {
        let mut child = lock(&self.child);
        if child.try_wait()?.is_none() {
            info!("Shutting down off-target server (pid {})", self.pid);
            child.kill()?;
            child.wait()?;
        }
        Ok(())
    }
}

impl Drop for OfftargetServer {
    fn drop(&mut self) {
        let mut child = lock(&self.child);
        if let Ok(None) = child.try_wait() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}
