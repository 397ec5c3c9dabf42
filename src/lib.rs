pub mod config;
pub mod dataset;
pub mod error;
pub mod feedback;
mod handlers;
pub mod models;
pub mod postprocess;
pub mod prompt;
pub mod service;
pub mod session;
pub mod synth;
pub mod transport;
pub mod voice;

pub use config::Config;
pub use error::{Result, TableTalkError};
pub use service::ChatService;
