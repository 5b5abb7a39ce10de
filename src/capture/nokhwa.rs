//! Real camera backend built on `nokhwa`.
//!
//! Compiled only with the `camera` feature. Covers both USB webcams and the
//! RPi CSI camera through the platform's native capture API (V4L2 on the
//! rig itself).

use super::{DeviceError, DeviceFactory, Frame, OpenSettings, VideoDevice};
use nokhwa::{
    pixel_format::RgbFormat,
    utils::{
        CameraFormat, CameraIndex, ControlValueSetter, FrameFormat, KnownCameraControl,
        RequestedFormat, RequestedFormatType, Resolution as NokhwaResolution,
    },
    Camera,
};

const DEFAULT_FPS: u32 = 30;

/// A `nokhwa`-backed camera session.
#[derive(Default)]
pub struct NokhwaDevice {
    camera: Option<Camera>,
    settings: Option<OpenSettings>,
    sequence: u64,
}

impl NokhwaDevice {
    /// Creates an unopened device.
    pub fn new() -> Self {
        Self::default()
    }

    /// Best-effort toggle of a camera control; failures are expected on
    /// hardware that does not expose the control.
    fn try_enable_control(camera: &mut Camera, control: KnownCameraControl) {
        if let Err(e) = camera.set_camera_control(control, ControlValueSetter::Boolean(true)) {
            tracing::debug!(?control, error = %e, "camera control not applied");
        }
    }
}

impl VideoDevice for NokhwaDevice {
    fn open(&mut self, settings: &OpenSettings) -> Result<(), DeviceError> {
        settings.validate().map_err(DeviceError::BadSettings)?;

        let resolution =
            NokhwaResolution::new(settings.resolution.width, settings.resolution.height);
        let format = CameraFormat::new(
            resolution,
            FrameFormat::MJPEG,
            settings.fps.unwrap_or(DEFAULT_FPS),
        );
        let requested =
            RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(format));

        let mut camera = Camera::new(CameraIndex::Index(settings.device_id), requested)
            .map_err(|e| DeviceError::OpenFailed {
                device_id: settings.device_id,
                reason: e.to_string(),
            })?;

        camera.open_stream().map_err(|e| DeviceError::OpenFailed {
            device_id: settings.device_id,
            reason: e.to_string(),
        })?;

        if settings.auto_focus {
            Self::try_enable_control(&mut camera, KnownCameraControl::Focus);
        }
        if settings.auto_exposure {
            Self::try_enable_control(&mut camera, KnownCameraControl::Exposure);
        }

        tracing::info!(
            device_id = settings.device_id,
            resolution = %settings.resolution,
            "camera session opened"
        );

        self.camera = Some(camera);
        self.settings = Some(settings.clone());
        self.sequence = 0;
        Ok(())
    }

    fn read_frame(&mut self) -> Result<Frame, DeviceError> {
        let camera = self.camera.as_mut().ok_or(DeviceError::NotOpen)?;

        let buffer = camera
            .frame()
            .map_err(|e| DeviceError::ReadFailed(e.to_string()))?;
        let image = buffer
            .decode_image::<RgbFormat>()
            .map_err(|e| DeviceError::ReadFailed(e.to_string()))?;

        let (width, height) = (image.width(), image.height());
        self.sequence += 1;
        Ok(Frame::new(image.into_raw(), width, height, self.sequence))
    }

    fn is_open(&self) -> bool {
        self.camera.is_some()
    }

    fn active_settings(&self) -> Option<&OpenSettings> {
        self.settings.as_ref()
    }

    fn close(&mut self) {
        if let Some(mut camera) = self.camera.take() {
            if let Err(e) = camera.stop_stream() {
                tracing::warn!(error = %e, "failed to stop camera stream");
            }
        }
        self.settings = None;
    }
}

/// Factory handing out unopened [`NokhwaDevice`] sessions.
#[derive(Debug, Clone, Copy, Default)]
pub struct NokhwaFactory;

impl NokhwaFactory {
    /// Creates the factory.
    pub fn new() -> Self {
        Self
    }
}

impl DeviceFactory for NokhwaFactory {
    fn create(&self) -> Box<dyn VideoDevice> {
        Box::new(NokhwaDevice::new())
    }
}
