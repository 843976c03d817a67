//! Network and device adapters for the Sightline clients.
//!
//! - [`BackendChatClient`]: the vision backend's `/chat` endpoint
//! - [`HttpDialogueRuntime`]: a dialogue runtime reachable over HTTP
//! - [`FileCamera`]: a camera device backed by an image file

pub mod backend_client;
pub mod dialogue_client;
pub mod file_camera;

pub use backend_client::BackendChatClient;
pub use dialogue_client::HttpDialogueRuntime;
pub use file_camera::FileCamera;
