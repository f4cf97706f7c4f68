//! Entries that live only as long as the `qh tmp` process.

use crate::error::{QhError, Result};
use crate::hosts::HostsStore;
use crate::resolver::Resolve;
use std::io;
use tokio::runtime::{Builder, Runtime};

#[cfg(unix)]
type Listener = tokio::signal::unix::Signal;
#[cfg(windows)]
type Listener = tokio::signal::windows::CtrlC;

/// Something a temporary entry can block on until it should be taken down.
pub trait Interrupt {
    fn wait(self) -> Result<()>;
}

/// A domain pinned to an address until the process is interrupted.
///
/// # Lifecycle
///
/// 1. The entry is added to the map. On failure nothing else happens.
/// 2. The interrupt listener is installed, then the file is saved, so an
///    interrupt can never land between the entry reaching disk and the
///    listener existing. A failed save drops the listener unused.
/// 3. The listener blocks until an interrupt arrives.
/// 4. The entry is removed and the file saved again. A failure here is
///    logged, never returned, so the process can still exit.
///
/// ```rust,ignore
/// use qh::{HostsStore, SystemResolver, TemporaryEntry, temp::InterruptListener};
///
/// let mut store = HostsStore::load("/etc/hosts")?;
/// TemporaryEntry::new("api.test", "127.0.0.1").hold(&mut store, &SystemResolver, InterruptListener::install)?;
/// ```
#[derive(Debug, Clone)]
pub struct TemporaryEntry {
    domain: String,
    target: String,
}

impl TemporaryEntry {
    #[must_use]
    pub fn new(domain: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            target: target.into(),
        }
    }

    #[must_use]
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Installs the entry, blocks on the listener from `listen`, then
    /// removes the entry.
    ///
    /// Returns once the entry has been taken down again (or the attempt to do
    /// so has been logged).
    ///
    /// # Errors
    ///
    /// Errors from the add, from `listen`, from the first save, or from the
    /// wait itself. When the wait fails the entry is still removed before the
    /// error is returned.
    pub fn hold<R, F, I>(&self, store: &mut HostsStore, resolver: &R, listen: F) -> Result<()>
    where
        R: Resolve + ?Sized,
        F: FnOnce() -> Result<I>,
        I: Interrupt,
    {
        let address = store.add(&self.domain, &self.target, resolver)?;
        let listener = listen()?;
        store.save()?;
        tracing::info!(
            domain = %self.domain,
            address = %address,
            "Temporary entry installed, interrupt to remove"
        );

        let waited = listener.wait();
        match &waited {
            Ok(()) => tracing::debug!(domain = %self.domain, "Interrupt received"),
            Err(e) => tracing::warn!(domain = %self.domain, error = %e, "Stopped waiting for interrupt"),
        }

        self.release(store);
        waited
    }

    fn release(&self, store: &mut HostsStore) {
        store.remove(&self.domain);
        match store.save() {
            Ok(()) => tracing::info!(domain = %self.domain, "Temporary entry removed"),
            Err(e) => tracing::error!(
                domain = %self.domain,
                error = %e,
                "Failed to remove temporary entry from hosts file"
            ),
        }
    }
}

/// Ctrl-C / `SIGINT` subscription, live from [`install`](Self::install) on.
///
/// Interrupts delivered between `install` and [`wait`](Interrupt::wait) are
/// not lost: `wait` returns immediately for them.
pub struct InterruptListener {
    runtime: Runtime,
    listener: Listener,
}

impl InterruptListener {
    /// # Errors
    ///
    /// Returns [`QhError::Signal`] if the runtime or the handler cannot be set up.
    pub fn install() -> Result<Self> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(QhError::Signal)?;
        let listener = {
            let _guard = runtime.enter();
            subscribe().map_err(QhError::Signal)?
        };
        tracing::debug!("Interrupt listener installed");
        Ok(Self { runtime, listener })
    }
}

impl Interrupt for InterruptListener {
    fn wait(mut self) -> Result<()> {
        match self.runtime.block_on(self.listener.recv()) {
            Some(()) => Ok(()),
            None => Err(QhError::Signal(io::Error::other("interrupt stream closed"))),
        }
    }
}

#[cfg(unix)]
fn subscribe() -> io::Result<Listener> {
    use tokio::signal::unix::{signal, SignalKind};
    signal(SignalKind::interrupt())
}

#[cfg(windows)]
fn subscribe() -> io::Result<Listener> {
    tokio::signal::windows::ctrl_c()
}
