use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Speaker of a conversation turn
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "User"),
            Role::Assistant => write!(f, "Assistant"),
        }
    }
}

/// One message exchange unit in the session log
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ConversationTurn {
    pub role: Role,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl ConversationTurn {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

// Chat message format of the hosted inference endpoint
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

// Chat-completions request format
#[derive(Debug, Serialize, Clone)]
pub struct InferenceRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: i32,
}

// Chat-completions response format
#[derive(Debug, Deserialize)]
pub struct InferenceResponse {
    pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ChatMessage,
}

/// Inferred type of a dataset column
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Integer,
    Float,
    Boolean,
    Text,
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnType::Integer => write!(f, "integer"),
            ColumnType::Float => write!(f, "float"),
            ColumnType::Boolean => write!(f, "boolean"),
            ColumnType::Text => write!(f, "text"),
        }
    }
}

/// Per-column report in the dataset summary
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ColumnSummary {
    pub name: String,
    pub dtype: ColumnType,
    pub missing: usize,
}

/// Shape and per-column report for an uploaded dataset
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DatasetSummary {
    pub rows: usize,
    pub columns: usize,
    pub column_summaries: Vec<ColumnSummary>,
}

/// Kind of chart selected by the response post-processor
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Bar,
    Histogram,
}

/// Chart payload handed to the front-end for rendering. Bar charts carry one
/// label per distinct value; histograms carry one label per numeric bin.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChartData {
    pub kind: ChartKind,
    pub column: String,
    pub labels: Vec<String>,
    pub counts: Vec<usize>,
}

/// Supported aggregation functions for group-by queries
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AggFunc {
    Sum,
    Mean,
    Count,
    Min,
    Max,
}

impl AggFunc {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "sum" => Some(Self::Sum),
            "mean" => Some(Self::Mean),
            "count" => Some(Self::Count),
            "min" => Some(Self::Min),
            "max" => Some(Self::Max),
            _ => None,
        }
    }
}

impl std::fmt::Display for AggFunc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AggFunc::Sum => write!(f, "sum"),
            AggFunc::Mean => write!(f, "mean"),
            AggFunc::Count => write!(f, "count"),
            AggFunc::Min => write!(f, "min"),
            AggFunc::Max => write!(f, "max"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AggregationRow {
    pub group: String,
    pub value: f64,
}

/// Grouped aggregation result displayed as a table by the front-end
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AggregationTable {
    pub group_column: String,
    pub value_column: String,
    pub function: AggFunc,
    pub rows: Vec<AggregationRow>,
}
