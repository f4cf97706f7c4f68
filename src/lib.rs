//! # qh
//!
//! Quick edits to the hosts file without disturbing what is already there.
//!
//! qh owns a single block of the file, delimited by `# qh start` and
//! `# qh end`. Entries are added to and removed from that block; every
//! other line is written back as it was read.
//!
//! ```rust,ignore
//! use qh::{HostsStore, SystemResolver};
//!
//! let mut store = HostsStore::load("/etc/hosts")?;
//! store.add("api.test", "127.0.0.1", &SystemResolver)?;
//! store.save()?;
//!
//! store.remove("api.test");
//! store.save()?;
//! ```
//!
//! Writing `/etc/hosts` requires root.

pub mod error;
pub mod hosts;
pub mod resolver;
pub mod temp;

pub use error::{QhError, Result};
pub use hosts::{Entry, HostsMap, HostsStore, END_MARKER, START_MARKER};
pub use resolver::{Resolve, SystemResolver};
pub use temp::{Interrupt, InterruptListener, TemporaryEntry};
