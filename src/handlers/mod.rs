pub mod feedback;
pub mod query;
pub mod transcript;
pub mod upload;
/// Handler modules for the chat session operations
pub mod voice;

#[cfg(test)]
mod test_handlers;

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::config::Config;
use crate::feedback::FeedbackLog;
use crate::session::SessionState;
use crate::synth::Synthesizer;
use crate::voice::VoiceBridge;

// Re-export handler traits from submodules
pub use feedback::FeedbackHandler;
pub use query::QueryHandler;
pub use transcript::TranscriptHandler;
pub use upload::UploadHandler;
pub use voice::VoiceHandler;

/// Handler for chat session operations. Owns the session state; nothing else
/// in the crate mutates it.
pub struct ChatHandlers {
    pub(crate) session: RwLock<SessionState>,
    pub(crate) session_id: uuid::Uuid,
    pub(crate) synth: Arc<dyn Synthesizer>,
    pub(crate) voice: VoiceBridge,
    pub(crate) feedback: FeedbackLog,
    pub(crate) config: Arc<Config>,
}

impl ChatHandlers {
    pub fn new(synth: Arc<dyn Synthesizer>, voice: VoiceBridge, config: Arc<Config>) -> Self {
        Self {
            session: RwLock::new(SessionState::new(config.chat.max_history)),
            session_id: uuid::Uuid::new_v4(),
            synth,
            voice,
            feedback: FeedbackLog::new(config.feedback.log_path.clone()),
            config,
        }
    }
}
