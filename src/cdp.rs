//! Chrome DevTools Protocol adapter implementation

use crate::{Engine, EngineConfig, Error, Launcher, Result, SourceKind, ViewportProfile};
use base64::Engine as Base64Engine;
use headless_chrome::browser::tab::Tab;
use headless_chrome::protocol::cdp::{Emulation, Page};
use headless_chrome::{Browser, LaunchOptions};
use log::{debug, warn};
use serde::Deserialize;
use serde_json::{json, Value};
use std::ffi::OsStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Chrome refuses to rasterize surfaces much taller than this (CSS pixels)
pub const MAX_CAPTURE_HEIGHT: f64 = 16_384.0;

const EXTENT_SCRIPT: &str = r#"
(function() {
    const d = document.documentElement;
    const b = document.body;
    return JSON.stringify({
        width: Math.max(d ? d.scrollWidth : 0, b ? b.scrollWidth : 0),
        height: Math.max(d ? d.scrollHeight : 0, b ? b.scrollHeight : 0)
    });
})()
"#;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
struct PageExtent {
    width: f64,
    height: f64,
}

/// Chrome command-line switches for the given viewport profile
pub fn launch_args(viewport: &ViewportProfile) -> Vec<String> {
    let mut args = vec![
        format!("--force-device-scale-factor={}", viewport.pixel_density),
        "--hide-scrollbars".to_string(),
        "--disable-gpu".to_string(),
        "--disable-dev-shm-usage".to_string(),
        "--disable-extensions".to_string(),
        "--no-first-run".to_string(),
    ];
    if viewport.touch {
        args.push("--touch-events=enabled".to_string());
    }
    args
}

/// Parameters for `Emulation.setDeviceMetricsOverride`
///
/// Touch profiles are emulated as mobile devices so that the page's
/// `<meta name="viewport">` is honoured.
pub fn device_metrics(viewport: &ViewportProfile) -> Value {
    json!({
        "width": viewport.width,
        "height": viewport.height,
        "deviceScaleFactor": viewport.pixel_density,
        "mobile": viewport.touch,
    })
}

/// Never shorter than the viewport, never taller than [`MAX_CAPTURE_HEIGHT`]
fn clamp_extent(measured: PageExtent, viewport: &ViewportProfile) -> PageExtent {
    let height = measured.height.max(f64::from(viewport.height));
    if height > MAX_CAPTURE_HEIGHT {
        warn!("page is {}px tall; capture clamped to {}px", height, MAX_CAPTURE_HEIGHT);
    }
    PageExtent {
        width: measured.width.max(f64::from(viewport.width)),
        height: height.min(MAX_CAPTURE_HEIGHT),
    }
}

/// Time left before `deadline`, or `None` once it has passed
fn remaining(deadline: Instant) -> Option<Duration> {
    deadline
        .checked_duration_since(Instant::now())
        .filter(|left| !left.is_zero())
}

/// Build a `data:` URL that makes the browser load `html` as the document
pub fn html_data_url(html: &str) -> String {
    format!(
        "data:text/html;charset=utf-8;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(html)
    )
}

/// CDP-based headless engine implementation (uses the `headless_chrome` crate)
///
/// This adapter launches a headless Chrome instance, manages a single tab,
/// and provides the `Engine` trait implementation over it. Dropping it kills
/// the browser process.
pub struct CdpEngine {
    browser: Browser,
    tab: Arc<Tab>,
    config: EngineConfig,
}

impl CdpEngine {
    /// Launch Chrome with the viewport, density and user agent from `config`
    pub fn launch(config: EngineConfig) -> Result<Self> {
        let args = launch_args(&config.viewport);
        let os_args: Vec<&OsStr> = args.iter().map(OsStr::new).collect();

        // Every CDP call, Page.navigate included, waits at most the idle timeout
        let launch_options = LaunchOptions::default_builder()
            .headless(true)
            .sandbox(config.sandbox)
            .window_size(Some((config.viewport.width, config.viewport.height)))
            .path(config.chrome_path.clone())
            .ignore_certificate_errors(true)
            .idle_browser_timeout(Duration::from_millis(config.timeout_ms))
            .args(os_args)
            .build()
            .map_err(|e| Error::Initialization(format!("Failed to build launch options: {}", e)))?;

        let browser = Browser::new(launch_options)
            .map_err(|e| Error::Initialization(format!("Failed to launch browser: {}", e)))?;

        let tab = browser
            .new_tab()
            .map_err(|e| Error::Initialization(format!("Failed to create tab: {}", e)))?;

        tab.set_user_agent(&config.user_agent, None, None)
            .map_err(|e| Error::Initialization(format!("Failed to set user agent: {}", e)))?;

        let metrics: Emulation::SetDeviceMetricsOverride =
            serde_json::from_value(device_metrics(&config.viewport))
                .map_err(|e| Error::Initialization(format!("Invalid device metrics: {}", e)))?;
        tab.call_method(metrics)
            .map_err(|e| Error::Initialization(format!("Failed to emulate device: {}", e)))?;

        tab.set_default_timeout(Duration::from_millis(config.timeout_ms));

        debug!(
            "launched chrome {}x{} dpr={} touch={}",
            config.viewport.width, config.viewport.height, config.viewport.pixel_density, config.viewport.touch
        );

        Ok(Self { browser, tab, config })
    }

    /// Load `target` within a single `timeout_ms` deadline, then settle
    fn navigate(&self, target: &str, kind: SourceKind) -> Result<()> {
        let deadline = Instant::now() + Duration::from_millis(self.config.timeout_ms);
        let load_error = |e: anyhow::Error| Error::ContentLoad {
            source_kind: kind,
            reason: e.to_string(),
        };

        self.tab.navigate_to(target).map_err(load_error)?;

        let left = remaining(deadline).ok_or_else(|| Error::ContentLoad {
            source_kind: kind,
            reason: format!("Navigation timed out after {}ms", self.config.timeout_ms),
        })?;
        self.tab.set_default_timeout(left);
        self.tab.wait_until_navigated().map_err(load_error)?;

        // Let transitions and late layout settle
        std::thread::sleep(Duration::from_millis(self.config.settle_ms));
        Ok(())
    }

    fn page_extent(&self) -> Result<PageExtent> {
        let eval = self
            .tab
            .evaluate(EXTENT_SCRIPT, false)
            .map_err(|e| Error::Render(format!("Failed to measure page: {}", e)))?;

        let raw = eval
            .value
            .as_ref()
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::Render("No value returned from page measurement".into()))?;

        let extent: PageExtent = serde_json::from_str(raw)
            .map_err(|e| Error::Render(format!("Malformed page measurement: {}", e)))?;

        Ok(clamp_extent(extent, &self.config.viewport))
    }
}

impl Engine for CdpEngine {
    fn load_url(&mut self, url: &str) -> Result<()> {
        self.navigate(url, SourceKind::Url)
    }

    fn load_html(&mut self, html: &str) -> Result<()> {
        self.navigate(&html_data_url(html), SourceKind::Markup)
    }

    fn render_png(&self) -> Result<Vec<u8>> {
        let extent = self.page_extent()?;
        let clip = Page::Viewport {
            x: 0.0,
            y: 0.0,
            width: extent.width,
            height: extent.height,
            scale: 1.0,
        };

        // PNG is lossless, so the profile's compression level is not sent
        let screenshot = self
            .tab
            .call_method(Page::CaptureScreenshot {
                format: Some(Page::CaptureScreenshotFormatOption::Png),
                quality: None,
                clip: Some(clip),
                from_surface: Some(true),
                capture_beyond_viewport: Some(true),
                optimize_for_speed: None,
            })
            .map_err(|e| Error::Render(format!("Screenshot failed: {}", e)))?;

        base64::engine::general_purpose::STANDARD
            .decode(screenshot.data)
            .map_err(|e| Error::Render(format!("Screenshot data was not base64: {}", e)))
    }

    fn close(self) -> Result<()> {
        // Dropping the browser terminates the child process
        drop(self.tab);
        drop(self.browser);
        Ok(())
    }
}

/// Launches one [`CdpEngine`] per request
#[derive(Debug, Clone, Copy, Default)]
pub struct CdpLauncher;

impl Launcher for CdpLauncher {
    type Engine = CdpEngine;

    fn launch(&self, config: EngineConfig) -> Result<CdpEngine> {
        CdpEngine::launch(config)
    }
}
