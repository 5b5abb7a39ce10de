//! Device abstraction for camera sessions.
//!
//! This module provides a trait-based abstraction over camera hardware,
//! allowing for both real camera input and mock implementations for testing.
//! A [`VideoDevice`] is one open session to one physical camera; the manager
//! obtains fresh, unopened devices from a [`DeviceFactory`].

use super::{Frame, OpenSettings};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors that can occur during device operations.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("could not open device {device_id}: {reason}")]
    OpenFailed { device_id: u32, reason: String },
    #[error("invalid device settings: {0}")]
    BadSettings(String),
    #[error("device not open")]
    NotOpen,
    #[error("failed to read frame: {0}")]
    ReadFailed(String),
    #[error("device lost: {0}")]
    Disconnected(String),
}

impl DeviceError {
    /// Whether this error ends a streaming session.
    ///
    /// Read failures are transient (the stream skips the frame and keeps
    /// trying); a lost or unopened device terminates the stream.
    pub fn is_fatal(&self) -> bool {
        matches!(self, DeviceError::NotOpen | DeviceError::Disconnected(_))
    }
}

/// One open session to a physical camera device.
///
/// This abstraction allows swapping between real camera hardware
/// and mock implementations for testing.
pub trait VideoDevice {
    /// Opens the device session with the given settings.
    fn open(&mut self, settings: &OpenSettings) -> Result<(), DeviceError>;

    /// Reads a single frame from the open session.
    fn read_frame(&mut self) -> Result<Frame, DeviceError>;

    /// Checks whether the session is currently open.
    fn is_open(&self) -> bool;

    /// Returns the settings the session was opened with, if open.
    fn active_settings(&self) -> Option<&OpenSettings>;

    /// Closes the session and releases the underlying device.
    ///
    /// Infallible at this boundary: backends log their own release errors
    /// and the session is considered closed regardless.
    fn close(&mut self);
}

/// Produces fresh, unopened devices.
///
/// The manager opens one device per role (plus short-lived devices for
/// still captures) through this seam, so tests can substitute mocks.
pub trait DeviceFactory {
    /// Creates a new, unopened device.
    fn create(&self) -> Box<dyn VideoDevice>;
}

/// Scripted outcome of one mock `read_frame` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockRead {
    /// Produce a synthetic frame.
    Frame,
    /// A transient read failure (streaming skips these).
    Transient,
    /// An unrecoverable device loss (streaming terminates).
    Fatal,
}

/// Mock device for testing that generates synthetic frames.
///
/// By default every device id opens and reads produce frames forever.
/// `openable` restricts which ids open; `script` fixes the sequence of read
/// outcomes, after which further reads report device loss.
#[derive(Debug, Clone, Default)]
pub struct MockDevice {
    openable: Option<Vec<u32>>,
    script: Option<VecDeque<MockRead>>,
    settings: Option<OpenSettings>,
    sequence: u64,
    open_log: Option<Arc<Mutex<Vec<u32>>>>,
}

impl MockDevice {
    /// Creates a mock that opens any device id and yields frames forever.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts which device ids open successfully.
    pub fn openable(mut self, ids: &[u32]) -> Self {
        self.openable = Some(ids.to_vec());
        self
    }

    /// Fixes the read outcomes; once exhausted, reads report device loss.
    pub fn with_script(mut self, script: &[MockRead]) -> Self {
        self.script = Some(script.iter().copied().collect());
        self
    }

    fn record_attempt(&self, device_id: u32) {
        if let Some(log) = &self.open_log {
            if let Ok(mut log) = log.lock() {
                log.push(device_id);
            }
        }
    }

    fn synthetic_frame(&mut self, w: u32, h: u32) -> Frame {
        // Deterministic gradient mixed with the sequence number, only
        // for exercising the encode path.
        let pixels: Vec<u8> = (0..(w as usize * h as usize * 3))
            .map(|i| ((i as u64 ^ self.sequence) % 256) as u8)
            .collect();

        self.sequence += 1;
        Frame::new(pixels, w, h, self.sequence)
    }
}

impl VideoDevice for MockDevice {
    fn open(&mut self, settings: &OpenSettings) -> Result<(), DeviceError> {
        settings.validate().map_err(DeviceError::BadSettings)?;
        self.record_attempt(settings.device_id);

        if let Some(ids) = &self.openable {
            if !ids.contains(&settings.device_id) {
                return Err(DeviceError::OpenFailed {
                    device_id: settings.device_id,
                    reason: "no such device".into(),
                });
            }
        }

        self.settings = Some(settings.clone());
        self.sequence = 0;
        tracing::info!(device_id = settings.device_id, "MockDevice opened");
        Ok(())
    }

    fn read_frame(&mut self) -> Result<Frame, DeviceError> {
        let (w, h) = match &self.settings {
            Some(s) => (s.resolution.width, s.resolution.height),
            None => return Err(DeviceError::NotOpen),
        };

        let outcome = match self.script.as_mut() {
            None => MockRead::Frame,
            // Script exhausted: the simulated device stays lost.
            Some(script) => script.pop_front().unwrap_or(MockRead::Fatal),
        };

        match outcome {
            MockRead::Frame => Ok(self.synthetic_frame(w, h)),
            MockRead::Transient => Err(DeviceError::ReadFailed("simulated read failure".into())),
            MockRead::Fatal => Err(DeviceError::Disconnected("simulated device loss".into())),
        }
    }

    fn is_open(&self) -> bool {
        self.settings.is_some()
    }

    fn active_settings(&self) -> Option<&OpenSettings> {
        self.settings.as_ref()
    }

    fn close(&mut self) {
        self.settings = None;
        tracing::info!("MockDevice closed");
    }
}

/// Factory handing out clones of a template [`MockDevice`].
///
/// Every device created through the factory records its open attempts in a
/// shared log, so tests can assert on fallback behavior.
#[derive(Debug, Clone)]
pub struct MockFactory {
    template: MockDevice,
    open_log: Arc<Mutex<Vec<u32>>>,
}

impl MockFactory {
    /// A factory whose devices open any id and yield frames forever.
    pub fn new() -> Self {
        Self::from_template(MockDevice::new())
    }

    /// A factory handing out clones of the given template device.
    pub fn from_template(template: MockDevice) -> Self {
        Self {
            template,
            open_log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A factory whose devices refuse to open any id.
    pub fn refusing_all() -> Self {
        Self::from_template(MockDevice::new().openable(&[]))
    }

    /// Every device id passed to `open`, in order, across all devices.
    pub fn open_attempts(&self) -> Vec<u32> {
        self.open_log.lock().map(|log| log.clone()).unwrap_or_default()
    }
}

impl Default for MockFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceFactory for MockFactory {
    fn create(&self) -> Box<dyn VideoDevice> {
        let mut device = self.template.clone();
        device.open_log = Some(Arc::clone(&self.open_log));
        Box::new(device)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::Resolution;

    fn settings(device_id: u32) -> OpenSettings {
        OpenSettings::new(device_id, Resolution::new(64, 48))
    }

    #[test]
    fn test_mock_device_lifecycle() {
        let mut device = MockDevice::new();

        assert!(!device.is_open());

        device.open(&settings(0)).unwrap();
        assert!(device.is_open());

        let frame = device.read_frame().unwrap();
        assert!(frame.is_valid());
        assert_eq!(frame.sequence(), 1);

        let frame2 = device.read_frame().unwrap();
        assert_eq!(frame2.sequence(), 2);

        device.close();
        assert!(!device.is_open());
    }

    #[test]
    fn test_read_without_open() {
        let mut device = MockDevice::new();
        assert!(matches!(device.read_frame(), Err(DeviceError::NotOpen)));
    }

    #[test]
    fn test_openable_restriction() {
        let mut device = MockDevice::new().openable(&[1]);
        assert!(matches!(
            device.open(&settings(0)),
            Err(DeviceError::OpenFailed { device_id: 0, .. })
        ));
        assert!(device.open(&settings(1)).is_ok());
    }

    #[test]
    fn test_scripted_reads() {
        let mut device = MockDevice::new()
            .with_script(&[MockRead::Frame, MockRead::Transient, MockRead::Fatal]);
        device.open(&settings(0)).unwrap();

        assert!(device.read_frame().is_ok());
        assert!(matches!(
            device.read_frame(),
            Err(DeviceError::ReadFailed(_))
        ));
        assert!(matches!(
            device.read_frame(),
            Err(DeviceError::Disconnected(_))
        ));
        // Script exhausted: stays lost.
        assert!(matches!(
            device.read_frame(),
            Err(DeviceError::Disconnected(_))
        ));
    }

    #[test]
    fn test_factory_records_open_attempts() {
        let factory = MockFactory::from_template(MockDevice::new().openable(&[1]));

        let mut first = factory.create();
        assert!(first.open(&settings(0)).is_err());

        let mut second = factory.create();
        assert!(second.open(&settings(1)).is_ok());

        assert_eq!(factory.open_attempts(), vec![0, 1]);
    }

    #[test]
    fn test_fatal_errors_classified() {
        assert!(DeviceError::NotOpen.is_fatal());
        assert!(DeviceError::Disconnected("gone".into()).is_fatal());
        assert!(!DeviceError::ReadFailed("blip".into()).is_fatal());
    }
}
