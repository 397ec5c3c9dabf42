use std::path::PathBuf;

use chrono::Utc;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

use crate::error::Result;

/// Append-only log of user feedback, one timestamped line per submission
pub struct FeedbackLog {
    path: PathBuf,
}

impl FeedbackLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Append one line for this submission. Newlines in the text are
    /// flattened so the one-line-per-submission property holds.
    pub async fn record(&self, text: &str) -> Result<()> {
        let timestamp = Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
        let line = format!("{}\t{}\n", timestamp, text.replace(['\n', '\r'], " "));

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        tracing::info!("Recorded feedback entry in {}", self.path.display());
        Ok(())
    }
}
