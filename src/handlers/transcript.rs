use tracing::info;

use crate::models::ConversationTurn;

/// Trait for conversation log operations
pub trait TranscriptHandler {
    async fn history(&self) -> Vec<ConversationTurn>;
    async fn export(&self) -> String;
    async fn clear(&self);
}

impl TranscriptHandler for super::ChatHandlers {
    async fn history(&self) -> Vec<ConversationTurn> {
        let session = self.session.read().await;
        session.turns().to_vec()
    }

    /// Plain-text transcript offered as a download, one line per stored turn
    async fn export(&self) -> String {
        let session = self.session.read().await;
        session.transcript()
    }

    async fn clear(&self) {
        let mut session = self.session.write().await;
        session.clear();
        info!("Chat cleared");
    }
}
