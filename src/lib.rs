//! RFox Screenshot Service
//!
//! An HTTP service that turns raw HTML/CSS or a live URL into a full-page PNG
//! screenshot using a headless browser.
//!
//! # Features
//!
//! - **CDP Backend** (default): Drives headless Chrome via the DevTools Protocol
//! - **Device presets**: desktop, tablet and mobile viewports at three quality levels
//! - **Scoped browsers**: every request launches its own browser and releases it
//!   on every exit path
//!
//! # Example
//!
//! ```no_run
//! use rfshot::{pipeline, request::RenderRequest, ServiceConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ServiceConfig::with_api_key("secret");
//! let request: RenderRequest = serde_json::from_value(serde_json::json!({
//!     "code": "<h1>Hello</h1>",
//!     "apiKey": "secret"
//! }))?;
//! let validated = request.validate(&config.api_key, config.strict_markup)?;
//! let shot = pipeline::render(&rfshot::cdp::CdpLauncher, &config, validated)?;
//! std::fs::write("hello.png", &shot.png)?;
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;

pub mod error;
pub use error::{Error, Result, SourceKind};

pub mod config;
pub use config::ServiceConfig;

pub mod markup;
pub mod pipeline;
pub mod profile;
pub mod request;
pub mod server;

#[cfg(feature = "cdp")]
pub mod cdp;

pub use profile::{Device, Quality, ViewportProfile};

/// User agent sent for every render, regardless of the emulated device
pub const DESKTOP_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36";

/// Configuration for a single browser engine instance
///
/// One of these is built per request from the [`ServiceConfig`] and the
/// resolved [`ViewportProfile`].
///
/// # Examples
///
/// ```
/// let cfg = rfshot::EngineConfig::default();
/// assert_eq!(cfg.viewport.width, 1920);
/// assert!(cfg.sandbox);
/// ```
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// User agent string to send with requests
    pub user_agent: String,
    /// Viewport size, density and touch emulation
    pub viewport: ViewportProfile,
    /// Deadline for a whole page load in milliseconds. The CDP backend also
    /// drops a browser connection that stays silent for this long.
    pub timeout_ms: u64,
    /// Pause after load so CSS transitions can finish. Keep it below
    /// `timeout_ms`.
    pub settle_ms: u64,
    /// Browser binary; `None` lets the backend locate one
    pub chrome_path: Option<PathBuf>,
    /// Whether to keep the browser sandbox enabled
    pub sandbox: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            user_agent: DESKTOP_USER_AGENT.to_string(),
            viewport: ViewportProfile::default(),
            timeout_ms: 30000,
            settle_ms: 1000,
            chrome_path: None,
            sandbox: true,
        }
    }
}

/// A rendered page
#[derive(Debug, Clone)]
pub struct Screenshot {
    /// PNG-encoded image bytes
    pub png: Vec<u8>,
    /// What was loaded to produce the image
    pub source_kind: SourceKind,
}

impl Screenshot {
    pub fn len(&self) -> usize {
        self.png.len()
    }

    pub fn is_empty(&self) -> bool {
        self.png.is_empty()
    }
}

/// Core trait for a launched browser engine
///
/// An engine owns one browser instance and one page. It is used by a single
/// request and released with [`Engine::close`].
pub trait Engine {
    /// Navigate to a URL and wait for the page to be ready
    fn load_url(&mut self, url: &str) -> Result<()>;

    /// Load an HTML document as the page content
    fn load_html(&mut self, html: &str) -> Result<()>;

    /// Capture the whole document (not just the viewport) as a PNG image
    fn render_png(&self) -> Result<Vec<u8>>;

    /// Close the engine and clean up resources
    fn close(self) -> Result<()>;
}

/// Acquires engines. Implementations must be shareable across requests; the
/// engines they produce never are.
pub trait Launcher: Send + Sync + 'static {
    type Engine: Engine;

    /// Launch a browser configured per `config` and open a page in it
    fn launch(&self, config: EngineConfig) -> Result<Self::Engine>;
}
