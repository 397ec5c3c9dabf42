use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, TableTalkError};

#[derive(Debug, Deserialize)]
pub struct VoiceToggleParams {
    pub enabled: bool,
}

/// Response for a speech capture attempt. A failed capture carries an empty
/// transcript and a diagnostic; it is never an error.
#[derive(Debug, Serialize)]
pub struct ListenResponse {
    pub transcript: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

/// Trait for voice control operations
pub trait VoiceHandler {
    async fn set_voice(&self, params: VoiceToggleParams) -> Result<bool>;
    async fn stop_speaking(&self);
    async fn listen(&self) -> ListenResponse;
}

impl VoiceHandler for super::ChatHandlers {
    async fn set_voice(&self, params: VoiceToggleParams) -> Result<bool> {
        let mut session = self.session.write().await;
        session.set_voice_enabled(params.enabled);
        info!("Voice responses {}", if params.enabled { "enabled" } else { "disabled" });
        Ok(params.enabled)
    }

    async fn stop_speaking(&self) {
        self.voice.stop().await;
    }

    /// Blocking capture; classified failures are folded into the response so
    /// nothing propagates past this boundary
    async fn listen(&self) -> ListenResponse {
        match self.voice.listen().await {
            Ok(transcript) => {
                info!("Captured speech: {}", transcript);
                ListenResponse {
                    transcript,
                    notice: None,
                }
            }
            Err(e) => {
                warn!("Speech capture failed: {}", e);
                let notice = match &e {
                    TableTalkError::CaptureTimeout(secs) => {
                        format!("No speech detected within {secs} seconds.")
                    }
                    TableTalkError::UnrecognizedSpeech => {
                        "Could not understand audio.".to_string()
                    }
                    _ => "Speech recognition service unavailable.".to_string(),
                };
                ListenResponse {
                    transcript: String::new(),
                    notice: Some(notice),
                }
            }
        }
    }
}
