//! Service configuration, read from CLI flags and the environment

use crate::error::SourceKind;
use crate::profile::ViewportProfile;
use crate::{EngineConfig, DESKTOP_USER_AGENT};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Runtime configuration for the screenshot service
#[derive(Debug, Clone, Parser)]
#[command(name = "rfshot", version, about = "Render HTML/CSS or a URL to a PNG screenshot over HTTP")]
pub struct ServiceConfig {
    /// Address to listen on
    #[arg(long, env = "RFSHOT_BIND", default_value = "0.0.0.0:3000")]
    pub bind: SocketAddr,

    /// Secret that callers must send as `apiKey`
    #[arg(long, env = "RFSHOT_API_KEY", hide_env_values = true)]
    pub api_key: String,

    /// Chrome/Chromium binary; auto-detected when omitted
    #[arg(long, env = "CHROME_PATH")]
    pub chrome_path: Option<PathBuf>,

    /// Launch Chrome without its sandbox (needed in most containers)
    #[arg(long, env = "RFSHOT_NO_SANDBOX")]
    pub no_sandbox: bool,

    /// Navigation timeout for URL captures
    #[arg(long, default_value_t = 30_000)]
    pub url_timeout_ms: u64,

    /// Load timeout for inline markup
    #[arg(long, default_value_t = 15_000)]
    pub markup_timeout_ms: u64,

    /// Pause after a URL has loaded so transitions can settle
    #[arg(long, default_value_t = 2_000)]
    pub url_settle_ms: u64,

    /// Pause after markup has loaded so transitions can settle
    #[arg(long, default_value_t = 1_000)]
    pub markup_settle_ms: u64,

    /// Reject markup that fails the structural lint
    #[arg(long, env = "RFSHOT_STRICT_MARKUP")]
    pub strict_markup: bool,
}

impl ServiceConfig {
    /// Defaults with the given credential, for embedding and tests
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 3000)),
            api_key: api_key.into(),
            chrome_path: None,
            no_sandbox: false,
            url_timeout_ms: 30_000,
            markup_timeout_ms: 15_000,
            url_settle_ms: 2_000,
            markup_settle_ms: 1_000,
            strict_markup: false,
        }
    }

    /// Per-request engine configuration for the given source and profile
    pub fn engine_config(&self, kind: SourceKind, viewport: ViewportProfile) -> EngineConfig {
        let (timeout_ms, settle_ms) = match kind {
            SourceKind::Url => (self.url_timeout_ms, self.url_settle_ms),
            SourceKind::Markup => (self.markup_timeout_ms, self.markup_settle_ms),
        };
        EngineConfig {
            user_agent: DESKTOP_USER_AGENT.to_string(),
            viewport,
            timeout_ms,
            settle_ms,
            chrome_path: self.chrome_path.clone(),
            sandbox: !self.no_sandbox,
        }
    }
}
