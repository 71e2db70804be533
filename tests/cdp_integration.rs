#![cfg(feature = "cdp")]
//! Integration tests for the Chrome backend

use rfshot::cdp::{CdpEngine, CdpLauncher};
use rfshot::request::RenderRequest;
use rfshot::{pipeline, Engine, EngineConfig, Error, Launcher, ServiceConfig, SourceKind};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::{Duration, Instant};
use tiny_http::{Response, Server};

static INIT: Once = Once::new();

/// Start a simple test HTTP server
fn start_test_server() -> String {
    INIT.call_once(|| {
        std::thread::spawn(|| {
            let server = Server::http("127.0.0.1:18090").unwrap();
            for request in server.incoming_requests() {
                let path = request.url().to_string();
                let response = match path.as_str() {
                    "/" => Response::from_string(
                        r#"<!DOCTYPE html>
<html>
<head><title>Test Page</title></head>
<body>
<h1>Hello from Test Server</h1>
<div style="height: 3000px; background: linear-gradient(red, blue)"></div>
</body>
</html>"#,
                    )
                    .with_header(
                        "Content-Type: text/html; charset=utf-8"
                            .parse::<tiny_http::Header>()
                            .unwrap(),
                    ),
                    _ => Response::from_string("Not Found").with_status_code(404),
                };
                let _ = request.respond(response);
            }
        });
        // Give the server time to start
        std::thread::sleep(std::time::Duration::from_millis(100));
    });

    "http://127.0.0.1:18090".to_string()
}

fn test_config() -> EngineConfig {
    EngineConfig {
        sandbox: false,
        settle_ms: 100,
        timeout_ms: 5000,
        ..Default::default()
    }
}

/// Chrome launcher that records when the browser came up and how often it was closed
#[derive(Default)]
struct ObservedLauncher {
    launched_at: Mutex<Option<Instant>>,
    closed: Arc<AtomicUsize>,
}

struct ObservedEngine {
    inner: CdpEngine,
    closed: Arc<AtomicUsize>,
}

impl Engine for ObservedEngine {
    fn load_url(&mut self, url: &str) -> rfshot::Result<()> {
        self.inner.load_url(url)
    }

    fn load_html(&mut self, html: &str) -> rfshot::Result<()> {
        self.inner.load_html(html)
    }

    fn render_png(&self) -> rfshot::Result<Vec<u8>> {
        self.inner.render_png()
    }

    fn close(self) -> rfshot::Result<()> {
        let result = self.inner.close();
        self.closed.fetch_add(1, Ordering::SeqCst);
        result
    }
}

impl Launcher for ObservedLauncher {
    type Engine = ObservedEngine;

    fn launch(&self, config: EngineConfig) -> rfshot::Result<ObservedEngine> {
        let inner = CdpLauncher.launch(config)?;
        *self.launched_at.lock().unwrap() = Some(Instant::now());
        Ok(ObservedEngine {
            inner,
            closed: Arc::clone(&self.closed),
        })
    }
}

fn request(body: serde_json::Value) -> RenderRequest {
    serde_json::from_value(body).unwrap()
}

/// Read width and height from the IHDR chunk
fn png_dimensions(png: &[u8]) -> (u32, u32) {
    let w = u32::from_be_bytes([png[16], png[17], png[18], png[19]]);
    let h = u32::from_be_bytes([png[20], png[21], png[22], png[23]]);
    (w, h)
}

#[test]
#[ignore] // Requires Chrome to be installed
fn test_full_page_screenshot_of_url() {
    let base_url = start_test_server();

    let mut engine = CdpEngine::launch(test_config()).expect("Failed to create engine");
    engine.load_url(&base_url).expect("Failed to load URL");
    let png_data = engine.render_png().expect("Failed to render PNG");
    engine.close().unwrap();

    // PNG files start with these magic bytes
    assert_eq!(&png_data[0..8], b"\x89PNG\r\n\x1a\n");
    let (width, height) = png_dimensions(&png_data);
    // Default profile renders at 2x; the page is taller than the viewport
    assert_eq!(width, 1920 * 2);
    assert!(height > 1080 * 2, "expected full-page capture, got height {}", height);
}

#[test]
#[ignore] // Requires Chrome to be installed
fn test_markup_renders() {
    let mut engine = CdpEngine::launch(test_config()).expect("Failed to create engine");
    engine
        .load_html("<!DOCTYPE html><html><head></head><body><h1>Hi</h1></body></html>")
        .expect("Failed to load markup");
    let png_data = engine.render_png().expect("Failed to render PNG");
    engine.close().unwrap();

    assert!(png_data.len() > 100, "PNG data seems too small");
    assert_eq!(&png_data[0..8], b"\x89PNG\r\n\x1a\n");
}

#[test]
#[ignore] // Requires Chrome to be installed
fn test_pipeline_against_unreachable_host() {
    let mut config = ServiceConfig::with_api_key("k");
    config.no_sandbox = true;
    config.url_timeout_ms = 3000;
    config.url_settle_ms = 0;

    // 10.255.255.1 is non-routable, so the connection hangs until timeout
    let validated = request(json!({ "url": "http://10.255.255.1/", "apiKey": "k" }))
        .validate("k", false)
        .unwrap();

    let launcher = ObservedLauncher::default();
    let err = pipeline::render(&launcher, &config, validated).unwrap_err();
    let finished = Instant::now();

    assert!(matches!(err, Error::ContentLoad { source_kind: SourceKind::Url, .. }), "{:?}", err);
    assert_eq!(launcher.closed.load(Ordering::SeqCst), 1, "browser was not released");

    let launched_at = launcher.launched_at.lock().unwrap().expect("browser launched");
    let load_time = finished - launched_at;
    let bound = Duration::from_millis(config.url_timeout_ms) + Duration::from_secs(2);
    assert!(load_time < bound, "load took {:?}, timeout is {}ms", load_time, config.url_timeout_ms);
}

#[test]
#[ignore] // Requires Chrome to be installed
fn test_pipeline_mobile_profile() {
    let mut config = ServiceConfig::with_api_key("k");
    config.no_sandbox = true;
    config.markup_settle_ms = 0;

    let validated = request(json!({
        "code": "<p>tiny</p>",
        "apiKey": "k",
        "device": "mobile",
        "quality": "low"
    }))
    .validate("k", false)
    .unwrap();
    let shot = pipeline::render(&CdpLauncher, &config, validated).expect("render");
    assert_eq!(png_dimensions(&shot.png).0, 375);
}
