//! Render request body and its validation

use crate::error::{Error, Result, SourceKind};
use crate::markup;
use crate::profile::{Device, Quality, ViewportProfile};
use serde::Deserialize;
use serde_json::Value;
use url::Url;

/// URL schemes the service is willing to navigate to
pub const ALLOWED_SCHEMES: &[&str] = &["http", "https", "file"];

/// JSON body accepted by the render endpoint
///
/// Every field accepts any JSON value so that a missing or mistyped field
/// still reaches the authorization check instead of failing deserialization.
/// Type errors in `url` and `code` are reported by [`RenderRequest::validate`]
/// once the credential has matched. For `device` and `quality`, anything that
/// is not a known preset name resolves to the default preset.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderRequest {
    pub url: Option<Value>,
    pub code: Option<Value>,
    pub api_key: Option<Value>,
    pub device: Option<Value>,
    pub quality: Option<Value>,
}

/// What the browser should load
#[derive(Debug, Clone, PartialEq)]
pub enum ContentSource {
    Url(Url),
    /// A complete HTML document, already wrapped if it arrived as a fragment
    Markup(String),
}

impl ContentSource {
    pub fn kind(&self) -> SourceKind {
        match self {
            ContentSource::Url(_) => SourceKind::Url,
            ContentSource::Markup(_) => SourceKind::Markup,
        }
    }
}

/// A request that passed authorization and validation
#[derive(Debug, Clone)]
pub struct ValidatedRequest {
    pub source: ContentSource,
    pub device: Device,
    pub quality: Quality,
}

impl ValidatedRequest {
    pub fn profile(&self) -> ViewportProfile {
        ViewportProfile::resolve(self.device, self.quality)
    }
}

fn preset_name(value: Option<&Value>) -> &str {
    value.and_then(Value::as_str).unwrap_or_default()
}

/// `null` and absent mean the same thing; any other non-string is `message`
fn text_field<'a>(value: Option<&'a Value>, message: &str) -> Result<Option<&'a str>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) => Ok(Some(text.as_str())),
        Some(_) => Err(Error::validation(message)),
    }
}

fn parse_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim()).map_err(|_| Error::validation("Invalid URL format"))?;
    if !ALLOWED_SCHEMES.contains(&url.scheme()) {
        return Err(Error::validation("Invalid URL format"));
    }
    Ok(url)
}

impl RenderRequest {
    pub fn device(&self) -> Device {
        Device::from_name(preset_name(self.device.as_ref()))
    }

    pub fn quality(&self) -> Quality {
        Quality::from_name(preset_name(self.quality.as_ref()))
    }

    /// Check the credential, then resolve the content source.
    ///
    /// With `strict_markup` set, markup that fails [`markup::lint`] is
    /// rejected with the findings as details.
    pub fn validate(self, api_key: &str, strict_markup: bool) -> Result<ValidatedRequest> {
        if self.api_key.as_ref().and_then(Value::as_str) != Some(api_key) {
            return Err(Error::Unauthorized);
        }

        let device = self.device();
        let quality = self.quality();

        let url = text_field(self.url.as_ref(), "Invalid URL format")?
            .map(str::trim)
            .filter(|u| !u.is_empty());
        let code = text_field(self.code.as_ref(), "HTML/CSS code must be a string")?
            .filter(|c| !c.trim().is_empty());

        let source = match (url, code) {
            (Some(raw), _) => ContentSource::Url(parse_url(raw)?),
            (None, Some(code)) => {
                let document = markup::wrap_fragment(code);
                let findings = markup::lint(&document);
                if !findings.is_empty() {
                    if strict_markup {
                        return Err(Error::Validation {
                            message: "Code validation failed".to_string(),
                            details: findings,
                        });
                    }
                    log::debug!("markup lint reported {} finding(s): {:?}", findings.len(), findings);
                }
                ContentSource::Markup(document)
            }
            (None, None) => return Err(Error::validation("URL or HTML/CSS code is required")),
        };

        Ok(ValidatedRequest { source, device, quality })
    }
}
