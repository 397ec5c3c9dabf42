use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::process::{Child, Command};
use tokio::sync::Mutex;

use crate::config::VoiceConfig;
use crate::error::{Result, TableTalkError};

/// Poll interval for the playback task's cooperative stop check
const PLAYBACK_POLL: Duration = Duration::from_millis(50);

/// Bridge to the operating system's speech engines, which are invoked through
/// configured commands and never implemented here. Playback is fire-and-forget
/// on a detached task; capture blocks the calling flow for up to the
/// configured timeout.
pub struct VoiceBridge {
    config: VoiceConfig,
    is_speaking: Arc<AtomicBool>,
    // In-flight playback child; a stop request takes and kills it, and the
    // playback task notices the empty slot on its next poll
    playback: Arc<Mutex<Option<Child>>>,
}

impl VoiceBridge {
    pub fn new(config: VoiceConfig) -> Self {
        Self {
            config,
            is_speaking: Arc::new(AtomicBool::new(false)),
            playback: Arc::new(Mutex::new(None)),
        }
    }

    pub fn is_speaking(&self) -> bool {
        self.is_speaking.load(Ordering::SeqCst)
    }

    /// Fire-and-forget playback of `text`. Failures are logged and swallowed;
    /// the caller is never blocked and never sees an error. Two rapid calls
    /// may race on the speaking flag; that is an accepted limitation.
    pub fn speak(&self, text: &str) {
        let Some(command) = self.config.tts_command.clone() else {
            tracing::debug!("No TTS command configured, skipping playback");
            return;
        };

        let text = text.to_string();
        let is_speaking = Arc::clone(&self.is_speaking);
        let playback = Arc::clone(&self.playback);

        tokio::spawn(async move {
            let child = match spawn_command(&command, &[&text]) {
                Ok(child) => child,
                Err(e) => {
                    tracing::warn!("Failed to start TTS playback: {}", e);
                    return;
                }
            };

            is_speaking.store(true, Ordering::SeqCst);
            {
                let mut slot = playback.lock().await;
                *slot = Some(child);
            }

            // Poll until playback finishes or a stop request empties the slot
            loop {
                tokio::time::sleep(PLAYBACK_POLL).await;
                let mut slot = playback.lock().await;
                match slot.as_mut() {
                    Some(child) => match child.try_wait() {
                        Ok(Some(_)) => {
                            *slot = None;
                            break;
                        }
                        Ok(None) => {}
                        Err(e) => {
                            tracing::warn!("TTS playback wait failed: {}", e);
                            *slot = None;
                            break;
                        }
                    },
                    None => break,
                }
            }
            is_speaking.store(false, Ordering::SeqCst);
        });
    }

    /// Interrupt in-flight playback if any, otherwise a no-op
    pub async fn stop(&self) {
        let child = {
            let mut slot = self.playback.lock().await;
            slot.take()
        };
        if let Some(mut child) = child {
            if let Err(e) = child.kill().await {
                tracing::warn!("Failed to stop TTS playback: {}", e);
            }
            tracing::info!("Stopped in-flight speech playback");
        }
        self.is_speaking.store(false, Ordering::SeqCst);
    }

    /// Blocking speech capture via the configured command. Returns the
    /// transcript, or a classified failure: unavailable (no command, spawn or
    /// exit failure), capture timeout, or unrecognized (empty transcript).
    pub async fn listen(&self) -> Result<String> {
        let Some(command) = self.config.stt_command.clone() else {
            return Err(TableTalkError::SpeechUnavailable(
                "no speech capture command configured".to_string(),
            ));
        };

        // Wait bound covers both waiting for speech to start and the
        // utterance itself
        let wait_bound = Duration::from_secs(
            self.config.listen_timeout_seconds + self.config.phrase_time_limit_seconds,
        );

        let child = spawn_command(&command, &[])
            .map_err(|e| TableTalkError::SpeechUnavailable(e.to_string()))?;

        let output = match tokio::time::timeout(wait_bound, child.wait_with_output()).await {
            Ok(result) => result.map_err(|e| TableTalkError::SpeechUnavailable(e.to_string()))?,
            Err(_) => {
                return Err(TableTalkError::CaptureTimeout(
                    self.config.listen_timeout_seconds,
                ));
            }
        };

        if !output.status.success() {
            return Err(TableTalkError::SpeechUnavailable(format!(
                "capture command exited with {}",
                output.status
            )));
        }

        let transcript = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if transcript.is_empty() {
            return Err(TableTalkError::UnrecognizedSpeech);
        }
        Ok(transcript)
    }
}

/// Split a configured command line into program and arguments, appending
/// `extra` arguments at the end
fn spawn_command(command: &str, extra: &[&str]) -> std::io::Result<Child> {
    let mut parts = command.split_whitespace();
    let program = parts.next().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty command line")
    })?;
    Command::new(program)
        .args(parts)
        .args(extra)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(tts: Option<&str>, stt: Option<&str>) -> VoiceConfig {
        VoiceConfig {
            tts_command: tts.map(|s| s.to_string()),
            stt_command: stt.map(|s| s.to_string()),
            listen_timeout_seconds: 1,
            phrase_time_limit_seconds: 0,
        }
    }

    #[tokio::test]
    async fn test_speak_without_command_is_noop() {
        let bridge = VoiceBridge::new(config(None, None));
        bridge.speak("hello");
        assert!(!bridge.is_speaking());
    }

    #[tokio::test]
    async fn test_speak_clears_flag_after_playback() {
        let bridge = VoiceBridge::new(config(Some("echo"), None));
        bridge.speak("hello");

        // Playback of `echo` finishes almost immediately; give the detached
        // task a couple of poll cycles to observe it
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(!bridge.is_speaking());
    }

    #[tokio::test]
    async fn test_stop_without_playback_is_noop() {
        let bridge = VoiceBridge::new(config(Some("echo"), None));
        bridge.stop().await;
        assert!(!bridge.is_speaking());
    }

    #[tokio::test]
    async fn test_stop_interrupts_playback() {
        // tail -f runs until killed and tolerates the appended text argument
        let bridge = VoiceBridge::new(config(Some("tail -f /dev/null"), None));
        bridge.speak("ignored");
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(bridge.is_speaking());

        bridge.stop().await;
        assert!(!bridge.is_speaking());
    }

    #[tokio::test]
    async fn test_listen_without_command_is_unavailable() {
        let bridge = VoiceBridge::new(config(None, None));
        let err = bridge.listen().await.unwrap_err();
        assert!(matches!(err, TableTalkError::SpeechUnavailable(_)));
    }

    #[tokio::test]
    async fn test_listen_returns_transcript() {
        let bridge = VoiceBridge::new(config(None, Some("echo plot a histogram of age")));
        let transcript = bridge.listen().await.unwrap();
        assert_eq!(transcript, "plot a histogram of age");
    }

    #[tokio::test]
    async fn test_listen_empty_output_is_unrecognized() {
        let bridge = VoiceBridge::new(config(None, Some("true")));
        let err = bridge.listen().await.unwrap_err();
        assert!(matches!(err, TableTalkError::UnrecognizedSpeech));
    }

    #[tokio::test]
    async fn test_listen_times_out() {
        let bridge = VoiceBridge::new(config(None, Some("sleep 30")));
        let err = bridge.listen().await.unwrap_err();
        assert!(matches!(err, TableTalkError::CaptureTimeout(1)));
    }

    #[tokio::test]
    async fn test_listen_failing_command_is_unavailable() {
        let bridge = VoiceBridge::new(config(None, Some("false")));
        let err = bridge.listen().await.unwrap_err();
        assert!(matches!(err, TableTalkError::SpeechUnavailable(_)));
    }
}
