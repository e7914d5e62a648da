use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use clap::{Parser, ValueEnum};
use tracing::Level;

use crate::error::VpnconfError;

/// Update the routes of an OpenVPN configuration.
///
/// Some internet services filter access based on egress. This rewrites the
/// route section of an OpenVPN client configuration so that the latest
/// published ranges for those services go through the tunnel.
#[derive(Parser, Clone, Debug)]
#[command(name = "vpnconf", version)]
pub struct Options {
    /// Log level.
    #[clap(
        long,
        value_enum,
        ignore_case = true,
        default_value = "warning",
        env = "VPNCONF_LOG_LEVEL"
    )]
    pub log_level: LogLevel,

    /// Update the configuration file in place.
    #[clap(long, short)]
    pub in_place: bool,

    /// Exclude IPv4 addresses from the output.
    #[clap(long, conflicts_with = "no_ipv6")]
    pub no_ipv4: bool,

    /// Exclude IPv6 addresses from the output.
    #[clap(long)]
    pub no_ipv6: bool,

    /// Additional file containing hostnames or CIDRs, may be repeated.
    #[clap(long = "extra-routes", short = 'e', value_name = "FILE")]
    pub extra_routes: Vec<PathBuf>,

    /// Endpoint list instance.
    #[clap(long, default_value = "Worldwide", env = "VPNCONF_INSTANCE")]
    pub instance: String,

    /// DNS server for extra route hostnames [default: system resolver].
    #[clap(long, short, env = "VPNCONF_UPSTREAM")]
    pub upstream: Option<SocketAddr>,

    /// OpenVPN configuration file, or "-" for standard input.
    pub filename: ConfigSource,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    pub fn as_tracing(self) -> Level {
        match self {
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warning => Level::WARN,
            LogLevel::Error | LogLevel::Critical => Level::ERROR,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigSource {
    Stdin,
    File(PathBuf),
}

impl FromStr for ConfigSource {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "" => Err("configuration filename must not be empty".to_string()),
            "-" => Ok(ConfigSource::Stdin),
            path => Ok(ConfigSource::File(PathBuf::from(path))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Destination {
    InPlace(PathBuf),
    Stdout,
}

/// Validated run configuration.
#[derive(Clone, Debug)]
pub struct Settings {
    pub log_level: LogLevel,
    pub source: ConfigSource,
    pub destination: Destination,
    pub no_ipv4: bool,
    pub no_ipv6: bool,
    pub extra_routes: Vec<PathBuf>,
    pub instance: String,
    pub upstream: Option<SocketAddr>,
}

impl Options {
    pub fn into_settings(self) -> Result<Settings, VpnconfError> {
        let destination = match (self.in_place, &self.filename) {
            (false, _) => Destination::Stdout,
            (true, ConfigSource::File(path)) => Destination::InPlace(path.clone()),
            (true, ConfigSource::Stdin) => {
                return Err(VpnconfError::InvalidArguments(
                    "--in-place cannot be used when reading from standard input".to_string(),
                ))
            }
        };
        if self.instance.trim().is_empty() {
            return Err(VpnconfError::InvalidArguments(
                "--instance must not be empty".to_string(),
            ));
        }

        Ok(Settings {
            log_level: self.log_level,
            source: self.filename,
            destination,
            no_ipv4: self.no_ipv4,
            no_ipv6: self.no_ipv6,
            extra_routes: self.extra_routes,
            instance: self.instance,
            upstream: self.upstream,
        })
    }
}
