//! Greenhouse Camera Manager
//!
//! Hardware-facing camera glue for a greenhouse monitoring rig: holds at
//! most one open handle per camera role (USB, RPi/CSI, 2K, 4K), produces
//! MJPEG multipart streams for live preview and one-shot still captures,
//! and tears handles down idempotently.
//!
//! # Architecture
//!
//! The flow is deliberately thin:
//!
//! ```text
//! manager (role → handle) → capture (device read) → stream (JPEG + multipart)
//! ```
//!
//! # Design Principles
//!
//! - **Errors stop at the boundary**: every public manager operation logs
//!   the failure and returns a sentinel (`false` / `None` / empty stream),
//!   never a panic or an error type
//! - **One handle per role**: enforced by the role-indexed map, not locks
//! - **One stream consumer per role**: the stream mutably borrows the
//!   role's slot, so the borrow checker enforces the contract
//! - **Lossy preview, lossless intent**: transient read failures are
//!   skipped during streaming; only device loss ends a stream
//!
//! # Example
//!
//! ```no_run
//! use greenhouse_cam::{
//!     capture::MockFactory,
//!     manager::{CameraManager, CameraRole, Timing},
//! };
//!
//! let mut manager = CameraManager::new(MockFactory::new()).with_timing(Timing::immediate());
//!
//! // Lazy initialization: the first stream request opens the device.
//! for chunk in manager.stream(CameraRole::Usb).take(3) {
//!     // hand the multipart chunk to the HTTP layer
//!     let _ = chunk;
//! }
//!
//! // One-shot high-resolution still, independent of the stream defaults.
//! manager.stop(CameraRole::Usb);
//! if let Some(path) = manager.capture_still(CameraRole::Usb, "plant.jpg", None) {
//!     println!("saved {}", path.display());
//! }
//! ```
//!
//! Real hardware capture lives behind the `camera` feature (a `nokhwa`
//! backend); the default build is mock-only and runs anywhere.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod capture;
pub mod config;
pub mod manager;
pub mod stream;

// Re-export commonly used types at crate root
pub use capture::{DeviceError, DeviceFactory, Frame, MockFactory, OpenSettings, Resolution, VideoDevice};
pub use config::RigConfig;
pub use manager::{available_cameras, CameraDescriptor, CameraManager, CameraRole, Timing};
pub use stream::{MjpegStream, BOUNDARY};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
