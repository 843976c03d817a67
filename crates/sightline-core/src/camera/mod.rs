//! Camera device contracts and lifecycle management.

pub mod device;
pub mod lifecycle;

pub use device::{
    AcquiredStream, AcquisitionError, AcquisitionErrorKind, CameraDevice, TrackEnded,
    VideoConstraints, VideoStream, VideoSurface,
};
pub use lifecycle::{CameraLifecycle, CameraNotice, CameraState, LossDisposition};
