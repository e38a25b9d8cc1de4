// Modelrun worker library
// Decision: The binary speaks JSON lines on stdio; the library is usable in-process

pub mod actions;
pub mod config;
pub mod handler;
pub mod process;

pub use actions::demo_registry;
pub use config::WorkerConfig;
pub use handler::{ChannelResponseHandler, SharedCancelHandler};
pub use process::{ModelProcess, ModelProcessHandle, WorkerError};
