use serde::Serialize;
use tracing::info;

use crate::dataset::load_dataset;
use crate::error::{Result, TableTalkError};
use crate::models::DatasetSummary;

/// Response for a successful upload
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub summary: DatasetSummary,
}

/// Trait for dataset upload operations
pub trait UploadHandler {
    /// Parse an uploaded file, replace the session dataset and clear the chat
    async fn upload(&self, filename: &str, bytes: &[u8]) -> Result<UploadResponse>;

    /// Summary of the currently loaded dataset
    async fn dataset_summary(&self) -> Result<DatasetSummary>;

    /// Example questions derived from the current dataset's columns
    async fn suggestions(&self) -> Result<Vec<String>>;
}

impl UploadHandler for super::ChatHandlers {
    async fn upload(&self, filename: &str, bytes: &[u8]) -> Result<UploadResponse> {
        // Parse before touching the session: a failed upload must leave the
        // prior dataset and conversation untouched
        let dataset = load_dataset(filename, bytes, self.config.upload.max_file_bytes)?;
        let summary = dataset.summary();

        info!(
            "Loaded dataset '{}' for session {}: {} rows, {} columns",
            filename, self.session_id, summary.rows, summary.columns
        );

        let mut session = self.session.write().await;
        session.replace_dataset(dataset);

        Ok(UploadResponse {
            message: "New dataset uploaded. Chat cleared for new analysis.".to_string(),
            summary,
        })
    }

    async fn dataset_summary(&self) -> Result<DatasetSummary> {
        let session = self.session.read().await;
        let dataset = session.dataset().ok_or(TableTalkError::NoDataset)?;
        Ok(dataset.summary())
    }

    async fn suggestions(&self) -> Result<Vec<String>> {
        let session = self.session.read().await;
        let dataset = session.dataset().ok_or(TableTalkError::NoDataset)?;
        Ok(dataset.suggestions())
    }
}
