//! The render pipeline: acquire an engine, load, capture, release.

use crate::request::{ContentSource, ValidatedRequest};
use crate::{Engine, Error, Launcher, Result, Screenshot, ServiceConfig, SourceKind};
use log::{info, warn};
use std::time::Instant;

/// Owns an engine for the duration of one render and closes it when dropped.
///
/// Every early return and unwind out of [`render`] goes through `Drop`, so a
/// launched browser never outlives its request.
pub struct EngineGuard<E: Engine> {
    engine: Option<E>,
}

impl<E: Engine> EngineGuard<E> {
    pub fn new(engine: E) -> Self {
        Self { engine: Some(engine) }
    }

    fn engine_mut(&mut self) -> Result<&mut E> {
        self.engine
            .as_mut()
            .ok_or_else(|| Error::Internal("engine already released".into()))
    }

    /// Close the engine now and report the outcome
    pub fn release(mut self) -> Result<()> {
        match self.engine.take() {
            Some(engine) => engine.close(),
            None => Ok(()),
        }
    }
}

impl<E: Engine> Drop for EngineGuard<E> {
    fn drop(&mut self) {
        if let Some(engine) = self.engine.take() {
            if let Err(e) = engine.close() {
                warn!("Failed to close browser engine: {}", e);
            }
        }
    }
}

fn as_content_load(kind: SourceKind, err: Error) -> Error {
    match err {
        err @ Error::ContentLoad { .. } => err,
        other => Error::ContentLoad {
            source_kind: kind,
            reason: other.to_string(),
        },
    }
}

/// Render a validated request to a PNG with an engine from `launcher`.
///
/// This blocks for up to the configured load timeout plus the settle delay.
pub fn render<L: Launcher>(launcher: &L, config: &ServiceConfig, request: ValidatedRequest) -> Result<Screenshot> {
    let started = Instant::now();
    let profile = request.profile();
    let kind = request.source.kind();

    let engine = launcher.launch(config.engine_config(kind, profile)).map_err(|e| match e {
        e @ Error::Initialization(_) => e,
        other => Error::Initialization(other.to_string()),
    })?;
    let mut guard = EngineGuard::new(engine);

    let loaded = match &request.source {
        ContentSource::Url(url) => guard.engine_mut()?.load_url(url.as_str()),
        ContentSource::Markup(html) => guard.engine_mut()?.load_html(html),
    };
    loaded.map_err(|e| as_content_load(kind, e))?;

    let png = guard.engine_mut()?.render_png()?;
    if png.is_empty() {
        return Err(Error::Render("browser returned an empty image".into()));
    }

    if let Err(e) = guard.release() {
        warn!("Failed to close browser engine after capture: {}", e);
    }

    info!(
        "rendered {} as {} {}x{}@{} ({} bytes, compression {}) in {:?}",
        kind,
        request.device.as_str(),
        profile.width,
        profile.height,
        profile.pixel_density,
        png.len(),
        profile.compression,
        started.elapsed()
    );

    Ok(Screenshot { png, source_kind: kind })
}
