//! Core domain for the Sightline chat clients.
//!
//! Everything in this crate is independent of any UI toolkit or transport:
//! chat log records, session identifiers, the camera lifecycle state machine,
//! frame capture, and the asynchronous exchange contract shared by both
//! clients.

pub mod camera;
pub mod capture;
pub mod config;
pub mod dialogue;
pub mod error;
pub mod exchange;
pub mod message;
pub mod session;

// Re-export common types
pub use error::{Result, SightlineError};
pub use exchange::{Exchange, SendGate, SendPermit};
pub use message::{ChatLog, ChatMessage, Sender};
pub use session::SessionId;
