//! Application layer for Sightline.
//!
//! Controllers own the client state record of each front end and drive it
//! through the core state machines and the interaction adapters. Handlers
//! mutate only the state they are handed; there is no module-level state.

pub mod camera_chat;
pub mod widget;

pub use camera_chat::{
    CameraChatController, CameraChatState, CameraSettings, RecoveryOutcome, SendOutcome,
};
pub use widget::{ChatWidgetController, RuntimeBinding, SubmitOutcome, WidgetState};
