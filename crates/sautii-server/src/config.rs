use anyhow::Context;
use std::net::SocketAddr;
use std::path::PathBuf;

pub const DEFAULT_HTTP_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Clone, PartialEq)]
pub struct TlsPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

/// Startup settings, read once from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub http_addr: SocketAddr,
    /// JSONL (optionally `.zst`) issues preloaded into the store.
    pub seed_path: Option<PathBuf>,
    /// HTTPS when both cert and key are set.
    pub tls: Option<TlsPaths>,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let get = |k: &str| get(k).filter(|v| !v.trim().is_empty());
        let addr = get("SAUTII_HTTP_ADDR").unwrap_or_else(|| DEFAULT_HTTP_ADDR.to_string());
        let http_addr = addr
            .parse::<SocketAddr>()
            .with_context(|| format!("SAUTII_HTTP_ADDR is not a socket address: {addr}"))?;
        let tls = match (get("TLS_CERT_PATH"), get("TLS_KEY_PATH")) {
            (Some(cert), Some(key)) => Some(TlsPaths {
                cert: cert.into(),
                key: key.into(),
            }),
            _ => None,
        };
        Ok(Self {
            http_addr,
            seed_path: get("SAUTII_SEED_PATH").map(PathBuf::from),
            tls,
        })
    }
}
