//! Settings applied to a camera device when it is opened.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A frame resolution in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Resolution {
    /// Creates a new resolution.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for Resolution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .split_once(|c| c == 'x' || c == 'X')
            .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {s:?}"))?;
        let width = w.trim().parse().map_err(|_| format!("bad width in {s:?}"))?;
        let height = h
            .trim()
            .parse()
            .map_err(|_| format!("bad height in {s:?}"))?;
        Ok(Self { width, height })
    }
}

/// Settings handed to a device when opening a session.
///
/// Autofocus and auto-exposure are requested for USB-type cameras; whether
/// the device honors them is up to the backend driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenSettings {
    /// Device index on the host (e.g. `/dev/videoN`).
    pub device_id: u32,
    /// Requested capture resolution.
    pub resolution: Resolution,
    /// Requested frame rate, if the role pins one.
    pub fps: Option<u32>,
    /// Ask the device to enable autofocus.
    pub auto_focus: bool,
    /// Ask the device to enable auto-exposure.
    pub auto_exposure: bool,
}

impl OpenSettings {
    /// Creates settings for the given device and resolution, with no frame
    /// rate pin and no auto controls.
    pub fn new(device_id: u32, resolution: Resolution) -> Self {
        Self {
            device_id,
            resolution,
            fps: None,
            auto_focus: false,
            auto_exposure: false,
        }
    }

    /// Validates the settings.
    pub fn validate(&self) -> Result<(), String> {
        if self.resolution.width == 0 || self.resolution.height == 0 {
            return Err("invalid frame dimensions".into());
        }
        if let Some(fps) = self.fps {
            if fps == 0 || fps > 120 {
                return Err("invalid frame rate (must be 1-120 fps)".into());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_parse_and_display() {
        let res: Resolution = "1280x720".parse().unwrap();
        assert_eq!(res, Resolution::new(1280, 720));
        assert_eq!(res.to_string(), "1280x720");
    }

    #[test]
    fn test_resolution_parse_rejects_garbage() {
        assert!("1280".parse::<Resolution>().is_err());
        assert!("x720".parse::<Resolution>().is_err());
        assert!("axb".parse::<Resolution>().is_err());
    }

    #[test]
    fn test_settings_validate() {
        let mut settings = OpenSettings::new(0, Resolution::new(1280, 720));
        assert!(settings.validate().is_ok());

        settings.resolution = Resolution::new(0, 720);
        assert!(settings.validate().is_err());

        settings.resolution = Resolution::new(1280, 720);
        settings.fps = Some(500);
        assert!(settings.validate().is_err());
    }
}
