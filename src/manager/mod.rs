//! The camera manager: one handle per role, lifecycle and capture.
//!
//! Holds at most one open device session per [`CameraRole`] in a single
//! role-indexed map. Handles are created lazily on the first stream request
//! or by an explicit [`CameraManager::initialize`] call, and released by the
//! idempotent [`CameraManager::stop`]. Every public operation catches errors
//! at this boundary and converts them to a logged message plus a sentinel
//! return value (`false` / `None`); callers decide on return values, never
//! on log output.

mod catalog;
mod role;

pub use catalog::{available_cameras, CameraDescriptor};
pub use role::{CameraRole, HIGH_RES_STREAM_QUALITY};

use crate::capture::{DeviceFactory, Resolution, VideoDevice};
use crate::config::RigConfig;
use crate::stream::{encode_jpeg, MjpegStream};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Hardware settle delays applied around device lifecycle operations.
#[derive(Debug, Clone, Copy)]
pub struct Timing {
    /// Wait after a successful open, so exposure and focus stabilize.
    pub warmup: Duration,
    /// Wait before the single read of a still capture.
    pub settle: Duration,
    /// Wait after releasing a device, so the driver lets go cleanly.
    pub shutdown: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            warmup: Duration::from_secs(2),
            settle: Duration::from_secs(1),
            shutdown: Duration::from_secs(1),
        }
    }
}

impl Timing {
    /// No delays. For tests and callers that manage settling themselves.
    pub const fn immediate() -> Self {
        Self {
            warmup: Duration::ZERO,
            settle: Duration::ZERO,
            shutdown: Duration::ZERO,
        }
    }
}

/// Manages the rig's camera handles, one per role.
///
/// Single logical thread of control: no internal locking, no fan-out. A
/// stream mutably borrows its role's slot, so one streaming consumer per
/// role is enforced by the borrow checker. The manager never auto-releases
/// a handle when a stream consumer goes away; pair stream teardown with an
/// explicit [`stop`](Self::stop).
pub struct CameraManager {
    factory: Box<dyn DeviceFactory>,
    slots: HashMap<CameraRole, Box<dyn VideoDevice>>,
    overrides: RigConfig,
    timing: Timing,
    last_image: Option<PathBuf>,
}

impl CameraManager {
    /// Creates a manager with default role settings and hardware delays.
    pub fn new(factory: impl DeviceFactory + 'static) -> Self {
        Self::with_config(factory, RigConfig::default())
    }

    /// Creates a manager with per-role overrides and delays from a config.
    pub fn with_config(factory: impl DeviceFactory + 'static, config: RigConfig) -> Self {
        let timing = Timing::from(&config.timing);
        Self {
            factory: Box::new(factory),
            slots: HashMap::new(),
            overrides: config,
            timing,
            last_image: None,
        }
    }

    /// Replaces the settle delays. Mostly useful in tests.
    pub fn with_timing(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }

    fn device_for(&self, role: CameraRole) -> u32 {
        self.overrides
            .roles
            .for_role(role)
            .device_id
            .unwrap_or_else(|| role.default_device())
    }

    fn stream_resolution_for(&self, role: CameraRole) -> Resolution {
        self.overrides
            .roles
            .for_role(role)
            .stream_resolution
            .unwrap_or_else(|| role.stream_resolution())
    }

    fn still_resolution_for(&self, role: CameraRole) -> Resolution {
        self.overrides
            .roles
            .for_role(role)
            .still_resolution
            .unwrap_or_else(|| role.still_resolution())
    }

    /// Opens and configures the device for a role.
    ///
    /// Any existing handle is torn down first (defined teardown, never a
    /// silent leak). The USB role falls back once to its alternate device
    /// id when the default fails to open. On success the manager waits for
    /// the hardware to settle before returning. Returns `false` on any
    /// failure and leaves the slot empty.
    pub fn initialize(
        &mut self,
        role: CameraRole,
        device_id: Option<u32>,
        resolution: Option<Resolution>,
    ) -> bool {
        if self.slots.contains_key(&role) {
            self.stop(role);
        }

        let requested = device_id.unwrap_or_else(|| self.device_for(role));
        let resolution = resolution.unwrap_or_else(|| self.stream_resolution_for(role));
        info!(%role, device_id = requested, %resolution, "initializing camera");

        let mut device = self.factory.create();
        if let Err(e) = device.open(&role.open_settings(requested, resolution)) {
            warn!(%role, device_id = requested, error = %e, "could not open device");

            // One-time fallback, only when the role's default id was asked for.
            let fallback = role
                .fallback_device()
                .filter(|_| requested == role.default_device());
            let Some(alternate) = fallback else {
                return false;
            };

            info!(%role, device_id = alternate, "trying alternate device");
            if let Err(e) = device.open(&role.open_settings(alternate, resolution)) {
                warn!(%role, device_id = alternate, error = %e, "alternate device failed");
                return false;
            }
            info!(%role, device_id = alternate, "using alternate device");
        }

        // Let exposure and focus settle before handing the device out.
        std::thread::sleep(self.timing.warmup);
        self.slots.insert(role, device);
        info!(%role, %resolution, "camera initialized");
        true
    }

    /// Returns a pull-based MJPEG multipart stream for a role.
    ///
    /// Initializes the role with its streaming defaults if no handle
    /// exists; if initialization fails, the returned iterator yields zero
    /// chunks. The stream is infinite otherwise and ends only on a fatal
    /// device error.
    pub fn stream(&mut self, role: CameraRole) -> MjpegStream<'_> {
        if !self.slots.contains_key(&role) {
            self.initialize(role, None, None);
        }
        match self.slots.get_mut(&role) {
            Some(device) => MjpegStream::open(device, role),
            None => {
                warn!(%role, "camera is not initialized, stream is empty");
                MjpegStream::empty(role)
            }
        }
    }

    /// Captures a single still image to `path`.
    ///
    /// Opens a short-lived handle at the still resolution, reads one frame,
    /// releases the handle and writes the JPEG. Refused while the role has
    /// an active streaming handle: double-opening one physical device is
    /// driver-dependent, so concurrent access is disallowed rather than
    /// inherited as ambiguity. Returns the path on success, `None` on any
    /// failure (nothing is written in that case).
    pub fn capture_still(
        &mut self,
        role: CameraRole,
        path: impl Into<PathBuf>,
        resolution: Option<Resolution>,
    ) -> Option<PathBuf> {
        let path = path.into();

        if self.slots.contains_key(&role) {
            warn!(%role, "still capture refused while role is streaming, stop it first");
            return None;
        }

        let resolution = resolution.unwrap_or_else(|| self.still_resolution_for(role));
        let device_id = self.device_for(role);
        info!(%role, device_id, %resolution, path = %path.display(), "capturing still image");

        let mut device = self.factory.create();
        if let Err(e) = device.open(&role.open_settings(device_id, resolution)) {
            warn!(%role, device_id, error = %e, "could not open device for still capture");
            return None;
        }

        // Short settle so exposure adapts before the one frame we keep.
        std::thread::sleep(self.timing.settle);
        let frame = device.read_frame();
        device.close();

        let frame = match frame {
            Ok(frame) => frame,
            Err(e) => {
                warn!(%role, error = %e, "still capture read failed");
                return None;
            }
        };

        let jpeg = match encode_jpeg(&frame, role.jpeg_quality()) {
            Ok(jpeg) => jpeg,
            Err(e) => {
                warn!(%role, error = %e, "still capture encode failed");
                return None;
            }
        };

        if let Err(e) = std::fs::write(&path, &jpeg) {
            warn!(%role, path = %path.display(), error = %e, "could not write still image");
            return None;
        }

        info!(%role, path = %path.display(), width = frame.width(), height = frame.height(), "still image saved");
        self.last_image = Some(path.clone());
        Some(path)
    }

    /// Releases the handle for a role, if any. Idempotent.
    ///
    /// The slot is cleared unconditionally; backends log their own release
    /// problems but the role always ends up closed.
    pub fn stop(&mut self, role: CameraRole) {
        match self.slots.remove(&role) {
            Some(mut device) => {
                device.close();
                std::thread::sleep(self.timing.shutdown);
                info!(%role, "camera stopped");
            }
            None => info!(%role, "no camera to stop"),
        }
    }

    /// Deletes an image file.
    ///
    /// With `path`, deletes that file and remembers it; without, deletes
    /// the most recently captured still. I/O errors are logged, never
    /// propagated.
    pub fn remove_image(&mut self, path: Option<&Path>) {
        if let Some(path) = path {
            self.last_image = Some(path.to_path_buf());
        }
        match &self.last_image {
            Some(path) => match std::fs::remove_file(path) {
                Ok(()) => info!(path = %path.display(), "image removed"),
                Err(e) => warn!(path = %path.display(), error = %e, "could not remove image"),
            },
            None => info!("no image to remove"),
        }
    }

    /// The static catalog of the rig's cameras. Not a live probe.
    pub fn list_available_cameras(&self) -> BTreeMap<CameraRole, CameraDescriptor> {
        available_cameras()
    }

    /// Whether a role currently holds an open handle.
    pub fn is_active(&self, role: CameraRole) -> bool {
        self.slots.contains_key(&role)
    }

    /// The device id a role's handle was opened on, if active.
    pub fn active_device(&self, role: CameraRole) -> Option<u32> {
        self.slots
            .get(&role)
            .and_then(|device| device.active_settings())
            .map(|settings| settings.device_id)
    }

    /// Path of the most recently captured still, if any.
    pub fn last_image(&self) -> Option<&Path> {
        self.last_image.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{MockDevice, MockFactory, MockRead};

    fn manager(factory: MockFactory) -> CameraManager {
        CameraManager::new(factory).with_timing(Timing::immediate())
    }

    fn temp_jpg(name: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join(format!("{name}.jpg"));
        (dir, path)
    }

    #[test]
    fn test_initialize_then_stop_is_idempotent() {
        for role in CameraRole::ALL {
            let mut manager = manager(MockFactory::new());

            assert!(manager.initialize(role, None, None));
            assert!(manager.is_active(role));

            manager.stop(role);
            assert!(!manager.is_active(role));

            // Stopping again is a no-op, not an error.
            manager.stop(role);
            assert!(!manager.is_active(role));
        }
    }

    #[test]
    fn test_initialize_failure_leaves_slot_empty() {
        let mut manager = manager(MockFactory::refusing_all());
        assert!(!manager.initialize(CameraRole::TwoK, None, None));
        assert!(!manager.is_active(CameraRole::TwoK));
    }

    #[test]
    fn test_usb_fallback_tried_exactly_once() {
        let factory = MockFactory::from_template(MockDevice::new().openable(&[1]));
        let attempts = factory.clone();
        let mut manager = manager(factory);

        assert!(manager.initialize(CameraRole::Usb, None, None));
        assert_eq!(manager.active_device(CameraRole::Usb), Some(1));
        assert_eq!(attempts.open_attempts(), vec![0, 1]);
    }

    #[test]
    fn test_usb_fallback_not_retried_further() {
        let factory = MockFactory::refusing_all();
        let attempts = factory.clone();
        let mut manager = manager(factory);

        assert!(!manager.initialize(CameraRole::Usb, None, None));
        // Default then the single alternate, nothing more.
        assert_eq!(attempts.open_attempts(), vec![0, 1]);
    }

    #[test]
    fn test_no_fallback_for_explicit_device_id() {
        let factory = MockFactory::refusing_all();
        let attempts = factory.clone();
        let mut manager = manager(factory);

        assert!(!manager.initialize(CameraRole::Usb, Some(7), None));
        assert_eq!(attempts.open_attempts(), vec![7]);
    }

    #[test]
    fn test_reinitialize_tears_down_first() {
        let mut manager = manager(MockFactory::new());

        assert!(manager.initialize(CameraRole::FourK, None, None));
        assert!(manager.initialize(CameraRole::FourK, Some(3), None));
        assert_eq!(manager.active_device(CameraRole::FourK), Some(3));
    }

    #[test]
    fn test_stream_with_open_failure_is_empty() {
        for role in CameraRole::ALL {
            let mut manager = manager(MockFactory::refusing_all());
            assert_eq!(manager.stream(role).count(), 0);
            assert!(!manager.is_active(role));
        }
    }

    #[test]
    fn test_stream_lazily_initializes() {
        let mut manager = manager(MockFactory::new());

        let first = manager.stream(CameraRole::Usb).next();
        assert!(first.is_some());
        assert!(manager.is_active(CameraRole::Usb));
    }

    #[test]
    fn test_stream_works_again_after_stop() {
        let mut manager = manager(MockFactory::new());

        assert!(manager.stream(CameraRole::TwoK).next().is_some());
        manager.stop(CameraRole::TwoK);
        assert!(!manager.is_active(CameraRole::TwoK));

        // Second stream re-initializes; the role is not stuck closed.
        assert!(manager.stream(CameraRole::TwoK).next().is_some());
        assert!(manager.is_active(CameraRole::TwoK));
    }

    #[test]
    fn test_capture_still_writes_jpeg_and_returns_path() {
        let mut manager = manager(MockFactory::new());
        let (_dir, path) = temp_jpg("still-ok");

        let result = manager.capture_still(CameraRole::FourK, &path, None);
        assert_eq!(result.as_deref(), Some(path.as_path()));
        assert_eq!(manager.last_image(), Some(path.as_path()));
        // The short-lived handle does not occupy the role's slot.
        assert!(!manager.is_active(CameraRole::FourK));

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_capture_still_open_failure_writes_nothing() {
        let mut manager = manager(MockFactory::refusing_all());
        let (_dir, path) = temp_jpg("still-fail");

        assert!(manager.capture_still(CameraRole::TwoK, &path, None).is_none());
        assert!(!path.exists());
    }

    #[test]
    fn test_capture_still_read_failure_writes_nothing() {
        let factory = MockFactory::from_template(MockDevice::new().with_script(&[MockRead::Fatal]));
        let mut manager = manager(factory);
        let (_dir, path) = temp_jpg("still-read-fail");

        assert!(manager.capture_still(CameraRole::Usb, &path, None).is_none());
        assert!(!path.exists());
    }

    #[test]
    fn test_capture_still_refused_while_streaming() {
        let mut manager = manager(MockFactory::new());
        let (_dir, path) = temp_jpg("still-busy");

        assert!(manager.initialize(CameraRole::TwoK, None, None));
        assert!(manager.capture_still(CameraRole::TwoK, &path, None).is_none());
        assert!(!path.exists());

        // The streaming handle is untouched.
        assert!(manager.is_active(CameraRole::TwoK));
    }

    #[test]
    fn test_remove_image_uses_remembered_path() {
        let mut manager = manager(MockFactory::new());
        let (_dir, path) = temp_jpg("remove-me");

        manager.capture_still(CameraRole::Usb, &path, None).unwrap();
        assert!(path.exists());

        manager.remove_image(None);
        assert!(!path.exists());
    }

    #[test]
    fn test_remove_image_missing_file_does_not_panic() {
        let mut manager = manager(MockFactory::new());
        manager.remove_image(Some(Path::new("/nonexistent/nowhere.jpg")));
        manager.remove_image(None);
    }

    #[test]
    fn test_catalog_exposed_through_manager() {
        let manager = manager(MockFactory::new());
        assert_eq!(manager.list_available_cameras().len(), CameraRole::ALL.len());
    }

    #[test]
    fn test_config_overrides_apply() {
        let toml = r#"
            [roles.usb]
            device_id = 9

            [timing]
            warmup_ms = 0
            settle_ms = 0
            shutdown_ms = 0
        "#;
        let config: RigConfig = toml::from_str(toml).unwrap();
        let mut manager = CameraManager::with_config(MockFactory::new(), config);

        assert!(manager.initialize(CameraRole::Usb, None, None));
        assert_eq!(manager.active_device(CameraRole::Usb), Some(9));
    }
}
