use std::error::Error as StdError;
use std::io;
use std::path::PathBuf;

use hickory_client::op::ResponseCode;
use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VpnconfError {
    #[error("bad request status code: {0}")]
    Request(StatusCode),

    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("malformed endpoint list: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed endpoint address {0:?}")]
    MalformedEndpoint(String),

    #[error("couldn't access {}: {source}", path.display())]
    FileAccess { path: PathBuf, source: io::Error },

    #[error("dns query for {name} failed: {source}")]
    Dns {
        name: String,
        source: Box<dyn StdError + Send + Sync>,
    },

    #[error("couldn't read system dns configuration: {0}")]
    ResolverConfig(String),

    #[error("dns server answered {code} for {name}")]
    DnsResponse { name: String, code: ResponseCode },

    #[error("could not resolve the following hostnames: {}", .0.join(", "))]
    Unresolved(Vec<String>),

    #[error("{0}")]
    InvalidArguments(String),
}

impl VpnconfError {
    pub fn file_access(path: impl Into<PathBuf>, source: io::Error) -> Self {
        VpnconfError::FileAccess {
            path: path.into(),
            source,
        }
    }
}
