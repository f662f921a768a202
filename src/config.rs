//! Command-line configuration.
//!
//! The listening port may also come from `PORT`; nothing else is read from
//! the environment.

use clap::Parser;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

/// In-memory key/value store with per-key lock reservations.
#[derive(Parser, Debug, Clone)]
#[command(name = "reservation-store")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Address to listen on.
    #[arg(long, default_value = "0.0.0.0")]
    pub host: IpAddr,

    /// Port to listen on.
    #[arg(long, env = "PORT", default_value_t = 9999)]
    pub port: u16,

    /// Give up waiting for a held lock after this many milliseconds.
    /// Waits indefinitely when omitted.
    #[arg(long, value_name = "MS")]
    pub lock_timeout_ms: Option<u64>,

    /// Seconds between store stats log lines (0 disables).
    #[arg(long, value_name = "SECS", default_value_t = 30)]
    pub stats_interval_secs: u64,

    /// Seconds to let in-flight requests finish after Ctrl+C before exiting.
    #[arg(long, value_name = "SECS", default_value_t = 10)]
    pub shutdown_grace_secs: u64,

    /// Enable debug logging.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn lock_timeout(&self) -> Option<Duration> {
        self.lock_timeout_ms.map(Duration::from_millis)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }

    pub fn stats_interval(&self) -> Option<Duration> {
        (self.stats_interval_secs > 0).then(|| Duration::from_secs(self.stats_interval_secs))
    }
}
