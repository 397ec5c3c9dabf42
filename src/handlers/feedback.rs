use serde::Deserialize;

use crate::error::Result;

#[derive(Debug, Deserialize)]
pub struct FeedbackParams {
    pub text: String,
}

/// Trait for feedback submissions
pub trait FeedbackHandler {
    async fn feedback(&self, params: FeedbackParams) -> Result<()>;
}

impl FeedbackHandler for super::ChatHandlers {
    async fn feedback(&self, params: FeedbackParams) -> Result<()> {
        self.feedback.record(&params.text).await
    }
}
