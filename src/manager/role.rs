//! Camera roles and their per-role defaults.
//!
//! A role is a logical camera slot on the rig, mapped to exactly one
//! physical device. The device ids and resolutions below mirror the rig's
//! wiring: the integrated USB camera on device 0 (sometimes enumerated as
//! 1), the CSI camera on the Pi's first port, the 2K Redeagle on device 4
//! and the 4K Redeagle on device 2.

use crate::capture::{OpenSettings, Resolution};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// JPEG quality used for the high-resolution roles' streams.
pub const HIGH_RES_STREAM_QUALITY: u8 = 85;

/// A logical camera slot on the rig.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum CameraRole {
    /// Integrated USB webcam.
    Usb,
    /// Raspberry Pi CSI camera.
    RPi,
    /// 2K USB camera (Redeagle).
    TwoK,
    /// 4K USB camera (Redeagle).
    FourK,
}

impl CameraRole {
    /// All roles, in catalog order.
    pub const ALL: [CameraRole; 4] = [
        CameraRole::Usb,
        CameraRole::RPi,
        CameraRole::TwoK,
        CameraRole::FourK,
    ];

    /// Default device index for this role.
    pub fn default_device(self) -> u32 {
        match self {
            CameraRole::Usb => 0,
            CameraRole::RPi => 0,
            CameraRole::TwoK => 4,
            CameraRole::FourK => 2,
        }
    }

    /// Alternate device index tried once when the default fails to open.
    ///
    /// Only the USB role has one: the integrated camera shows up as device
    /// 0 or 1 depending on enumeration order.
    pub fn fallback_device(self) -> Option<u32> {
        match self {
            CameraRole::Usb => Some(1),
            _ => None,
        }
    }

    /// Default resolution for live streaming.
    pub fn stream_resolution(self) -> Resolution {
        match self {
            CameraRole::Usb => Resolution::new(1280, 720),
            CameraRole::RPi => Resolution::new(1080, 720),
            CameraRole::TwoK => Resolution::new(1920, 1080),
            // Streamed below native to keep the preview responsive.
            CameraRole::FourK => Resolution::new(1280, 720),
        }
    }

    /// Default resolution for one-shot still captures.
    pub fn still_resolution(self) -> Resolution {
        match self {
            CameraRole::Usb => Resolution::new(1280, 720),
            CameraRole::RPi => Resolution::new(1080, 720),
            CameraRole::TwoK => Resolution::new(2560, 1440),
            CameraRole::FourK => Resolution::new(2592, 1944),
        }
    }

    /// JPEG quality for this role's stream; `None` uses the encoder default.
    pub fn jpeg_quality(self) -> Option<u8> {
        match self {
            CameraRole::TwoK | CameraRole::FourK => Some(HIGH_RES_STREAM_QUALITY),
            _ => None,
        }
    }

    /// Whether this role is a USB-type camera (autofocus and auto-exposure
    /// are requested on open).
    pub fn is_usb_type(self) -> bool {
        !matches!(self, CameraRole::RPi)
    }

    /// Frame rate pinned for this role, if any.
    pub fn pinned_fps(self) -> Option<u32> {
        match self {
            CameraRole::RPi => Some(15),
            _ => None,
        }
    }

    /// Open settings for the given device and resolution, with the role's
    /// auto-control and frame-rate defaults applied.
    pub fn open_settings(self, device_id: u32, resolution: Resolution) -> OpenSettings {
        OpenSettings {
            device_id,
            resolution,
            fps: self.pinned_fps(),
            auto_focus: self.is_usb_type(),
            auto_exposure: self.is_usb_type(),
        }
    }
}

impl fmt::Display for CameraRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CameraRole::Usb => "usb",
            CameraRole::RPi => "rpi",
            CameraRole::TwoK => "2k",
            CameraRole::FourK => "4k",
        };
        f.write_str(name)
    }
}

impl FromStr for CameraRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "usb" => Ok(CameraRole::Usb),
            "rpi" | "csi" => Ok(CameraRole::RPi),
            "2k" | "two_k" => Ok(CameraRole::TwoK),
            "4k" | "four_k" => Ok(CameraRole::FourK),
            other => Err(format!("unknown camera role {other:?}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip_names() {
        for role in CameraRole::ALL {
            let parsed: CameraRole = role.to_string().parse().unwrap();
            assert_eq!(parsed, role);
        }
    }

    #[test]
    fn test_only_usb_has_fallback() {
        assert_eq!(CameraRole::Usb.fallback_device(), Some(1));
        assert_eq!(CameraRole::RPi.fallback_device(), None);
        assert_eq!(CameraRole::TwoK.fallback_device(), None);
        assert_eq!(CameraRole::FourK.fallback_device(), None);
    }

    #[test]
    fn test_high_res_roles_pin_quality() {
        assert_eq!(CameraRole::TwoK.jpeg_quality(), Some(85));
        assert_eq!(CameraRole::FourK.jpeg_quality(), Some(85));
        assert_eq!(CameraRole::Usb.jpeg_quality(), None);
        assert_eq!(CameraRole::RPi.jpeg_quality(), None);
    }

    #[test]
    fn test_open_settings_auto_controls() {
        let usb = CameraRole::Usb.open_settings(0, CameraRole::Usb.stream_resolution());
        assert!(usb.auto_focus && usb.auto_exposure);

        let rpi = CameraRole::RPi.open_settings(0, CameraRole::RPi.stream_resolution());
        assert!(!rpi.auto_focus && !rpi.auto_exposure);
        assert_eq!(rpi.fps, Some(15));
    }
}
