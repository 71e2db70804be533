//! Device and quality presets
//!
//! Requests name a device class and a quality level; both resolve through
//! static tables into a [`ViewportProfile`]. Lookups are lenient: anything
//! unrecognized falls back to the default preset instead of failing.

/// Emulated device class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Device {
    #[default]
    Desktop,
    Tablet,
    Mobile,
}

/// Output quality level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Quality {
    Low,
    Medium,
    #[default]
    High,
}

/// Viewport size and touch emulation for one device class
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceMetrics {
    pub width: u32,
    pub height: u32,
    pub touch: bool,
}

/// Compression and pixel density for one quality level
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualitySetting {
    /// Encoder quality in percent. Only lossy formats honour it.
    pub compression: u8,
    pub pixel_density: f64,
}

const DESKTOP: DeviceMetrics = DeviceMetrics { width: 1920, height: 1080, touch: false };
const TABLET: DeviceMetrics = DeviceMetrics { width: 768, height: 1024, touch: true };
const MOBILE: DeviceMetrics = DeviceMetrics { width: 375, height: 667, touch: true };

const HIGH: QualitySetting = QualitySetting { compression: 100, pixel_density: 2.0 };
const MEDIUM: QualitySetting = QualitySetting { compression: 80, pixel_density: 1.5 };
const LOW: QualitySetting = QualitySetting { compression: 60, pixel_density: 1.0 };

impl Device {
    /// Lenient lookup by name; unknown names give [`Device::Desktop`]
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "tablet" => Device::Tablet,
            "mobile" => Device::Mobile,
            _ => Device::Desktop,
        }
    }

    pub fn metrics(self) -> DeviceMetrics {
        match self {
            Device::Desktop => DESKTOP,
            Device::Tablet => TABLET,
            Device::Mobile => MOBILE,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Device::Desktop => "desktop",
            Device::Tablet => "tablet",
            Device::Mobile => "mobile",
        }
    }
}

impl Quality {
    /// Lenient lookup by name; unknown names give [`Quality::High`]
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "low" => Quality::Low,
            "medium" => Quality::Medium,
            _ => Quality::High,
        }
    }

    pub fn setting(self) -> QualitySetting {
        match self {
            Quality::Low => LOW,
            Quality::Medium => MEDIUM,
            Quality::High => HIGH,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Quality::Low => "low",
            Quality::Medium => "medium",
            Quality::High => "high",
        }
    }
}

/// Everything the browser needs to know about the emulated screen
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportProfile {
    pub width: u32,
    pub height: u32,
    /// deviceScaleFactor applied when rasterizing
    pub pixel_density: f64,
    pub touch: bool,
    pub compression: u8,
}

impl ViewportProfile {
    /// Combine a device and a quality level. The device gives the viewport
    /// size and touch flag, the quality level gives the density.
    pub fn resolve(device: Device, quality: Quality) -> Self {
        let metrics = device.metrics();
        let setting = quality.setting();
        Self {
            width: metrics.width,
            height: metrics.height,
            pixel_density: setting.pixel_density,
            touch: metrics.touch,
            compression: setting.compression,
        }
    }
}

impl Default for ViewportProfile {
    fn default() -> Self {
        Self::resolve(Device::default(), Quality::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_profile_is_desktop_high() {
        let p = ViewportProfile::default();
        assert_eq!((p.width, p.height), (1920, 1080));
        assert_eq!(p.pixel_density, 2.0);
        assert!(!p.touch);
        assert_eq!(p.compression, 100);
    }

    #[test]
    fn mobile_low_combines_both_tables() {
        let p = ViewportProfile::resolve(Device::Mobile, Quality::Low);
        assert_eq!((p.width, p.height), (375, 667));
        assert_eq!(p.pixel_density, 1.0);
        assert!(p.touch);
        assert_eq!(p.compression, 60);
    }

    #[test]
    fn tablet_medium() {
        let p = ViewportProfile::resolve(Device::Tablet, Quality::Medium);
        assert_eq!((p.width, p.height), (768, 1024));
        assert_eq!(p.pixel_density, 1.5);
        assert_eq!(p.compression, 80);
    }

    #[test]
    fn unknown_names_fall_back() {
        assert_eq!(Device::from_name("smartwatch"), Device::Desktop);
        assert_eq!(Device::from_name(""), Device::Desktop);
        assert_eq!(Quality::from_name("ultra"), Quality::High);
        assert_eq!(Device::from_name(" Mobile "), Device::Mobile);
        assert_eq!(Quality::from_name("LOW"), Quality::Low);
    }
}
