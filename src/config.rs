//! Server settings and the command-line interface that produces them.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;

/// Settings the server needs at startup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    bind: SocketAddr,
    model_path: PathBuf,
    require_feature_names: bool,
}

impl ServerConfig {
    /// Constructs a new server configuration.
    pub fn new(bind: SocketAddr, model_path: PathBuf, require_feature_names: bool) -> Self {
        Self {
            bind,
            model_path,
            require_feature_names,
        }
    }

    /// Address the HTTP listener binds to.
    pub fn bind(&self) -> SocketAddr {
        self.bind
    }

    /// Location of the model artifact.
    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    /// Whether the artifact must declare its feature names.
    pub fn require_feature_names(&self) -> bool {
        self.require_feature_names
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 5000)),
            model_path: PathBuf::from("model.json"),
            require_feature_names: false,
        }
    }
}

/// Command-line interface for the churn prediction server.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "churnform-server",
    about = "Serves the customer churn prediction form"
)]
pub struct Cli {
    /// Address to bind the HTTP server to (host:port)
    #[arg(long, env = "CHURNFORM_BIND", default_value = "127.0.0.1:5000")]
    pub bind: String,

    /// Path to the JSON model artifact
    #[arg(long, env = "CHURNFORM_MODEL", default_value = "model.json")]
    pub model: PathBuf,

    /// Refuse artifacts that do not declare their feature names
    #[arg(long, env = "CHURNFORM_REQUIRE_FEATURE_NAMES", default_value_t = false)]
    pub require_feature_names: bool,

    /// Log filter directive (e.g. `info`, `churnform=debug`)
    #[arg(long, env = "CHURNFORM_LOG", default_value = "info")]
    pub log_filter: String,
}

impl Cli {
    /// Converts the parsed CLI into a `ServerConfig`.
    pub fn build_config(&self) -> Result<ServerConfig> {
        let bind: SocketAddr = self
            .bind
            .parse()
            .with_context(|| format!("invalid bind address {}", self.bind))?;
        Ok(ServerConfig::new(
            bind,
            self.model.clone(),
            self.require_feature_names,
        ))
    }
}
