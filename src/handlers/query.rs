use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::error::{Result, TableTalkError};
use crate::models::{AggregationTable, ChartData, ConversationTurn, Role};
use crate::postprocess;

#[derive(Debug, Deserialize)]
pub struct AskParams {
    pub question: String,
}

/// Response for one send action: the model's reply plus any chart or
/// aggregation the post-processor derived from the question
#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub reply: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart: Option<ChartData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregation: Option<AggregationTable>,
    pub voiced: bool,
}

/// Trait for the question/answer flow
pub trait QueryHandler {
    async fn ask(&self, params: AskParams) -> Result<AskResponse>;
}

impl QueryHandler for super::ChatHandlers {
    /// One full request/response cycle: validate, append the user turn, one
    /// inference call, append the assistant turn, post-process, optionally
    /// speak the reply.
    async fn ask(&self, params: AskParams) -> Result<AskResponse> {
        let question = params.question.trim().to_string();

        // Both rejections happen before any turn is appended or any request
        // is sent
        if question.is_empty() {
            return Err(TableTalkError::EmptyQuestion);
        }
        let mut session = self.session.write().await;
        if session.dataset().is_none() {
            return Err(TableTalkError::NoDataset);
        }

        info!(
            "Processing question for session '{}': {}",
            self.session_id, question
        );
        session.append(ConversationTurn::new(Role::User, question.clone()));

        // The just-appended user turn is passed separately as the current
        // question; the transcript covers everything before it
        let reply = {
            let turns = session.turns();
            let history = &turns[..turns.len() - 1];
            match self.synth.answer(session.dataset(), history, &question).await {
                Ok(reply) => reply,
                Err(e) => {
                    // Inference failures become the reply text; the session
                    // stays interactive and nothing is retried
                    error!("Inference call failed: {}", e);
                    format!("Error: Unable to process model response. Details: {e}")
                }
            }
        };

        session.append(ConversationTurn::new(Role::Assistant, reply.clone()));

        let (chart, aggregation) = match session.dataset() {
            Some(dataset) => (
                postprocess::detect_chart(&question, dataset),
                postprocess::detect_group_by(&question, dataset),
            ),
            None => (None, None),
        };

        let voiced = session.voice_enabled();
        if voiced {
            self.voice.speak(&reply);
        }

        Ok(AskResponse {
            reply,
            chart,
            aggregation,
            voiced,
        })
    }
}
