//! Camera device input and frame handling.
//!
//! This module provides the device abstraction the manager drives: a frame
//! type, per-session open settings, the [`VideoDevice`] / [`DeviceFactory`]
//! traits with mock implementations, and (behind the `camera` feature) a
//! `nokhwa`-backed implementation for real hardware.

mod device;
mod frame;
#[cfg(feature = "camera")]
mod nokhwa;
mod settings;

pub use device::{DeviceError, DeviceFactory, MockDevice, MockFactory, MockRead, VideoDevice};
pub use frame::Frame;
#[cfg(feature = "camera")]
pub use nokhwa::{NokhwaDevice, NokhwaFactory};
pub use settings::{OpenSettings, Resolution};
