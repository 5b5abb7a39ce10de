//! Static catalog of the rig's cameras.
//!
//! A fixed mapping from role to descriptor, not a live device probe. The
//! entries describe the rig as wired; `status` is the fixed string
//! "available".

use super::CameraRole;
use crate::capture::Resolution;
use serde::Serialize;
use std::collections::BTreeMap;

/// Human-readable description of one camera slot.
#[derive(Debug, Clone, Serialize)]
pub struct CameraDescriptor {
    /// Camera name/model.
    pub name: &'static str,
    /// Device path on the host.
    pub device: &'static str,
    /// Connection type.
    pub kind: &'static str,
    /// Maximum supported resolution.
    pub max_resolution: Resolution,
    /// Fixed status string.
    pub status: &'static str,
}

/// Returns the static catalog of cameras on the rig.
pub fn available_cameras() -> BTreeMap<CameraRole, CameraDescriptor> {
    let mut cameras = BTreeMap::new();
    cameras.insert(
        CameraRole::Usb,
        CameraDescriptor {
            name: "Integrated Camera",
            device: "/dev/video0",
            kind: "USB",
            max_resolution: Resolution::new(1280, 720),
            status: "available",
        },
    );
    cameras.insert(
        CameraRole::RPi,
        CameraDescriptor {
            name: "Raspberry Pi CSI Camera",
            device: "/dev/video-csi0",
            kind: "CSI",
            max_resolution: Resolution::new(1920, 1080),
            status: "available",
        },
    );
    cameras.insert(
        CameraRole::TwoK,
        CameraDescriptor {
            name: "2K USB Camera (Redeagle)",
            device: "/dev/video4",
            kind: "USB",
            max_resolution: Resolution::new(2560, 1440),
            status: "available",
        },
    );
    cameras.insert(
        CameraRole::FourK,
        CameraDescriptor {
            name: "4K USB Camera (Redeagle)",
            device: "/dev/video2",
            kind: "USB",
            max_resolution: Resolution::new(2592, 1944),
            status: "available",
        },
    );
    cameras
}
