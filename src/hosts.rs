//! Loading, editing and saving the qh-managed block of a hosts file.
//!
//! Only the lines between the markers belong to qh. Everything else in the
//! file (the foreign region) is carried through a save as-is:
//!
//! ```text
//! 127.0.0.1 localhost
//!
//! # qh start
//! 10.0.0.1 api.test web.test
//! # qh end
//! ```

use crate::error::{QhError, Result};
use crate::resolver::Resolve;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Opens the managed block.
pub const START_MARKER: &str = "# qh start";

/// Closes the managed block.
pub const END_MARKER: &str = "# qh end";

/// Address to names. Keyed by a `BTreeMap` so saves are ordered by address.
pub type HostsMap = BTreeMap<String, Vec<String>>;

/// One line of the managed block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    pub address: String,
    pub names: Vec<String>,
}

/// An in-memory copy of a hosts file.
///
/// Nothing is written back until [`save`](Self::save) is called.
#[derive(Debug, Clone)]
pub struct HostsStore {
    path: PathBuf,
    foreign: Vec<String>,
    hosts: HostsMap,
}

impl HostsStore {
    /// Reads and splits the file at `path`.
    ///
    /// A file without markers is entirely foreign and yields an empty map.
    ///
    /// # Errors
    ///
    /// Returns [`QhError::Io`] if the file cannot be read.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = fs::read_to_string(&path).map_err(|e| QhError::io(&path, e))?;
        let store = Self::from_content(path, &content);

        tracing::debug!(
            path = %store.path.display(),
            foreign_lines = store.foreign.len(),
            addresses = store.hosts.len(),
            "Loaded hosts file"
        );
        Ok(store)
    }

    /// Builds a store from already-read content; `path` is where
    /// [`save`](Self::save) will write.
    #[must_use]
    pub fn from_content(path: impl Into<PathBuf>, content: &str) -> Self {
        let (foreign, managed) = split_managed(content);
        Self {
            path: path.into(),
            foreign,
            hosts: parse_entries(&managed),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lines outside the managed block.
    #[must_use]
    pub fn foreign(&self) -> &[String] {
        &self.foreign
    }

    #[must_use]
    pub const fn hosts(&self) -> &HostsMap {
        &self.hosts
    }

    /// Managed entries in save order.
    #[must_use]
    pub fn entries(&self) -> Vec<Entry> {
        self.hosts
            .iter()
            .map(|(address, names)| Entry {
                address: address.clone(),
                names: names.clone(),
            })
            .collect()
    }

    /// Points `domain` at whatever `target` resolves to.
    ///
    /// A domain lives under one address only: an existing mapping for it
    /// (compared case-insensitively) is dropped first. Returns the address
    /// that was written.
    ///
    /// # Errors
    ///
    /// [`QhError::InvalidName`] if `domain` cannot be stored as a single
    /// name, or [`QhError::Resolution`] if `target` has no usable address.
    /// The map is left untouched on error.
    pub fn add<R: Resolve + ?Sized>(
        &mut self,
        domain: &str,
        target: &str,
        resolver: &R,
    ) -> Result<String> {
        validate_name(domain)?;
        let address = resolver.resolve(target)?;

        if !self.lookup(domain).is_empty() {
            tracing::debug!(domain = %domain, "Domain already present, replacing");
            self.remove(domain);
        }

        self.hosts
            .entry(address.clone())
            .or_default()
            .push(domain.to_string());

        tracing::info!(domain = %domain, address = %address, "Added host entry");
        Ok(address)
    }

    /// Drops every occurrence of `domain`, and any address left without names.
    ///
    /// Returns whether anything was removed. An absent domain is not an error.
    pub fn remove(&mut self, domain: &str) -> bool {
        let mut removed = false;
        self.hosts.retain(|_, names| {
            let before = names.len();
            names.retain(|name| !same_name(name, domain));
            removed |= names.len() != before;
            !names.is_empty()
        });

        if removed {
            tracing::info!(domain = %domain, "Removed host entry");
        } else {
            tracing::debug!(domain = %domain, "Domain not found in managed block");
        }
        removed
    }

    /// Addresses that carry `domain`, matched case-insensitively.
    #[must_use]
    pub fn lookup(&self, domain: &str) -> Vec<String> {
        self.hosts
            .iter()
            .filter(|(_, names)| names.iter().any(|name| same_name(name, domain)))
            .map(|(address, _)| address.clone())
            .collect()
    }

    /// Names stored under `address`.
    #[must_use]
    pub fn reverse_lookup(&self, address: &str) -> Vec<String> {
        self.hosts.get(address).cloned().unwrap_or_default()
    }

    /// Renders the file: the foreign region, then the managed block if any
    /// entries remain. An empty map writes no markers at all.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in &self.foreign {
            out.push_str(line);
            out.push('\n');
        }

        if self.hosts.is_empty() {
            return out;
        }

        // Foreign text is always followed by "\n\n" before the marker.
        if self.foreign.is_empty() {
            out.push('\n');
        }
        out.push('\n');
        out.push_str(START_MARKER);
        out.push('\n');
        for (address, names) in &self.hosts {
            out.push_str(address);
            for name in names {
                out.push(' ');
                out.push_str(name);
            }
            out.push('\n');
        }
        out.push_str(END_MARKER);
        out.push('\n');
        out
    }

    /// Overwrites the file at [`path`](Self::path) with [`render`](Self::render).
    ///
    /// # Errors
    ///
    /// Returns [`QhError::Io`] if the file cannot be written.
    pub fn save(&self) -> Result<()> {
        fs::write(&self.path, self.render()).map_err(|e| QhError::io(&self.path, e))?;
        tracing::debug!(
            path = %self.path.display(),
            addresses = self.hosts.len(),
            "Saved hosts file"
        );
        Ok(())
    }
}

/// Splits file content into foreign lines and the managed block's text.
///
/// Lines are trimmed and tabs become spaces. A start marker without an end
/// marker runs to the end of the file. Blank lines at either end of the
/// foreign region are dropped.
#[must_use]
pub fn split_managed(content: &str) -> (Vec<String>, String) {
    let mut foreign = Vec::new();
    let mut managed = Vec::new();
    let mut in_block = false;

    for raw in content.lines() {
        let line = normalize_line(raw);
        if line.starts_with(START_MARKER) {
            in_block = true;
        } else if line.starts_with(END_MARKER) {
            in_block = false;
        } else if in_block {
            managed.push(line);
        } else {
            foreign.push(line);
        }
    }

    while foreign.last().is_some_and(String::is_empty) {
        foreign.pop();
    }
    let leading = foreign.iter().take_while(|l| l.is_empty()).count();
    foreign.drain(..leading);

    (foreign, managed.join("\n"))
}

/// Parses `<address> <name>...` lines into a map.
///
/// Blank lines, `#`/`;` comments and lines without any name are skipped.
/// Repeated addresses accumulate their names in line order.
#[must_use]
pub fn parse_entries(text: &str) -> HostsMap {
    let mut hosts = HostsMap::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with(['#', ';']) {
            continue;
        }
        let Some((address, rest)) = line.split_once(char::is_whitespace) else {
            continue;
        };
        let names: Vec<String> = rest.split_whitespace().map(str::to_string).collect();
        if names.is_empty() {
            continue;
        }
        hosts.entry(address.to_string()).or_default().extend(names);
    }
    hosts
}

fn normalize_line(raw: &str) -> String {
    raw.trim_matches(|c: char| matches!(c, ' ' | '\t' | '\r')).replace('\t', " ")
}

fn same_name(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

/// A name must survive a save/load cycle as exactly one name.
fn validate_name(domain: &str) -> Result<()> {
    if domain.is_empty() || domain.contains(char::is_whitespace) || domain.starts_with(['#', ';'])
    {
        return Err(QhError::InvalidName(domain.to_string()));
    }
    Ok(())
}
