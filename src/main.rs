use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, Subcommand};
use qh::{HostsStore, InterruptListener, QhError, SystemResolver, TemporaryEntry};
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[cfg(windows)]
const DEFAULT_HOSTS_FILE: &str = r"C:\Windows\System32\drivers\etc\hosts";
#[cfg(not(windows))]
const DEFAULT_HOSTS_FILE: &str = "/etc/hosts";

#[derive(Parser)]
#[command(name = "qh")]
#[command(version)]
#[command(about = "Quickly add, remove, or temporarily pin entries in the hosts file", long_about = None)]
struct Cli {
    /// Hosts file to edit
    #[arg(long = "hosts", global = true, env = "QH_HOSTS_FILE", default_value = DEFAULT_HOSTS_FILE)]
    hosts_file: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "QH_LOG_LEVEL", default_value = "info")]
    log_level: Level,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Point a domain at an address (or at whatever another domain resolves to)
    Add {
        domain: String,
        /// IP address or domain to resolve
        address: String,
    },
    /// Remove a domain from the managed block
    #[command(alias = "remove")]
    Rm { domain: String },
    /// Add a domain until interrupted with Ctrl-C
    #[command(alias = "temp")]
    Tmp {
        domain: String,
        /// IP address or domain to resolve
        address: String,
    },
    /// List managed entries
    #[command(alias = "ls")]
    List {
        /// Only show entries with an address or name containing this text
        #[arg(short, long)]
        filter: Option<String>,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the addresses for a domain, or the names for an address
    Lookup { query: String },
    /// `qh <domain> <address>` behaves like `qh tmp <domain> <address>`
    #[command(external_subcommand)]
    Pair(Vec<String>),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("failed to install logger: {e}");
    }

    let Some(command) = cli.command else {
        if let Err(e) = Cli::command().print_help() {
            tracing::error!(error = %e, "Failed to print help");
            return ExitCode::FAILURE;
        }
        return ExitCode::SUCCESS;
    };

    match run(&cli.hosts_file, command) {
        Ok(code) => code,
        Err(e) => {
            if e.is_permission_denied() {
                tracing::error!(error = %e, "Permission denied, try running with sudo");
            } else {
                tracing::error!(error = %e, "qh failed");
            }
            ExitCode::FAILURE
        }
    }
}

fn run(hosts_file: &Path, command: Commands) -> Result<ExitCode, QhError> {
    let mut store = HostsStore::load(hosts_file)?;

    match command {
        Commands::Add { domain, address } => {
            store.add(&domain, &address, &SystemResolver)?;
            store.save()?;
        }

        Commands::Rm { domain } => {
            store.remove(&domain);
            store.save()?;
        }

        Commands::Tmp { domain, address } => return hold(&mut store, domain, address),

        Commands::Pair(args) => {
            let Ok([domain, address]) = <[String; 2]>::try_from(args) else {
                Cli::command()
                    .error(ErrorKind::WrongNumberOfValues, "usage: qh <domain> <address>")
                    .exit();
            };
            return hold(&mut store, domain, address);
        }

        Commands::List { filter, json } => {
            let entries: Vec<_> = store
                .entries()
                .into_iter()
                .filter(|entry| {
                    filter.as_deref().map_or(true, |pattern| {
                        entry.address.contains(pattern)
                            || entry.names.iter().any(|name| name.contains(pattern))
                    })
                })
                .collect();

            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else {
                for entry in entries {
                    println!("{} {}", entry.address, entry.names.join(" "));
                }
            }
        }

        Commands::Lookup { query } => {
            let results = if query.parse::<IpAddr>().is_ok() {
                store.reverse_lookup(&query)
            } else {
                store.lookup(&query)
            };
            for result in results {
                println!("{result}");
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Runs the temporary entry to completion. Reaching the end means we were
/// interrupted, which always exits non-zero.
fn hold(store: &mut HostsStore, domain: String, address: String) -> Result<ExitCode, QhError> {
    TemporaryEntry::new(domain, address).hold(store, &SystemResolver, InterruptListener::install)?;
    Ok(ExitCode::FAILURE)
}
