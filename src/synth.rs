use async_trait::async_trait;
use std::sync::Arc;

use crate::dataset::Dataset;
use crate::error::{Result, TableTalkError};
use crate::models::{ChatMessage, ConversationTurn, InferenceRequest};
use crate::prompt;
use crate::transport::Transport;

/// Generation parameters are fixed per service instance; only the prompt
/// varies between requests.
pub struct ChatSynth {
    tx: Arc<dyn Transport>,
    model: String,
    max_tokens: i32,
    temperature: f32,
    preview_rows: usize,
}

impl ChatSynth {
    pub fn new(
        tx: Arc<dyn Transport>,
        model: String,
        max_tokens: i32,
        temperature: f32,
        preview_rows: usize,
    ) -> Self {
        Self {
            tx,
            model,
            max_tokens,
            temperature,
            preview_rows,
        }
    }
}

#[async_trait]
pub trait Synthesizer: Send + Sync {
    async fn answer(
        &self,
        dataset: Option<&Dataset>,
        history: &[ConversationTurn],
        question: &str,
    ) -> Result<String>;
}

#[async_trait]
impl Synthesizer for ChatSynth {
    async fn answer(
        &self,
        dataset: Option<&Dataset>,
        history: &[ConversationTurn],
        question: &str,
    ) -> Result<String> {
        tracing::info!("Requesting completion for question: {}", question);

        let prompt = prompt::build_prompt(dataset, history, question, self.preview_rows);

        let request = InferenceRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt,
            }],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let response = self.tx.chat(&request).await?;

        if let Some(choice) = response.choices.first() {
            Ok(choice.message.content.trim().to_string())
        } else {
            Err(TableTalkError::MalformedResponse(
                "inference endpoint returned empty choices".to_string(),
            ))
        }
    }
}
