use super::*;
use crate::config::Config;
use crate::models::{ChartKind, ChatMessage, Choice, InferenceResponse, Role};
use crate::synth::ChatSynth;
use crate::synth::tests::MockTransport;

use std::sync::Arc;

const SAMPLE_CSV: &[u8] =
    b"Category,Sales,Age\nfood,10,34\ntoys,20,28\nfood,30,41\ntoys,40,22\n";

fn replies(texts: &[&str]) -> Vec<InferenceResponse> {
    texts
        .iter()
        .map(|text| InferenceResponse {
            choices: vec![Choice {
                message: ChatMessage {
                    role: "assistant".to_string(),
                    content: text.to_string(),
                },
            }],
        })
        .collect()
}

/// Handlers wired to a mock transport and a temp feedback log
fn test_handlers(
    responses: Vec<InferenceResponse>,
    max_history: usize,
) -> (Arc<MockTransport>, ChatHandlers, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("tempdir should create");
    let mut config = Config::default();
    config.chat.max_history = max_history;
    config.feedback.log_path = dir
        .path()
        .join("feedback.log")
        .to_string_lossy()
        .into_owned();
    let config = Arc::new(config);

    let transport = Arc::new(MockTransport::new(responses));
    let synth = Arc::new(ChatSynth::new(
        transport.clone(),
        config.inference.model.clone(),
        config.inference.max_tokens,
        config.inference.temperature,
        config.upload.preview_rows,
    ));
    let voice = crate::voice::VoiceBridge::new(config.voice.clone());
    let handlers = ChatHandlers::new(synth, voice, config);
    (transport, handlers, dir)
}

#[tokio::test]
async fn test_upload_reports_exact_shape() {
    let (_, handlers, _dir) = test_handlers(vec![], 50);
    let response = handlers.upload("sales.csv", SAMPLE_CSV).await.unwrap();
    assert_eq!(response.summary.rows, 4);
    assert_eq!(response.summary.columns, 3);
}

#[tokio::test]
async fn test_reupload_clears_conversation() {
    let (_, handlers, _dir) = test_handlers(replies(&["Ten."]), 50);
    handlers.upload("sales.csv", SAMPLE_CSV).await.unwrap();
    handlers
        .ask(query::AskParams {
            question: "How many rows?".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(handlers.history().await.len(), 2);

    handlers.upload("sales.csv", SAMPLE_CSV).await.unwrap();
    assert!(handlers.history().await.is_empty());
}

#[tokio::test]
async fn test_failed_upload_leaves_session_untouched() {
    let (_, handlers, _dir) = test_handlers(replies(&["Ten."]), 50);
    handlers.upload("sales.csv", SAMPLE_CSV).await.unwrap();
    handlers
        .ask(query::AskParams {
            question: "How many rows?".to_string(),
        })
        .await
        .unwrap();

    let err = handlers.upload("sales.txt", SAMPLE_CSV).await.unwrap_err();
    assert!(matches!(
        err,
        crate::error::TableTalkError::UnsupportedExtension(_)
    ));
    // Prior dataset and turns survive the failed upload
    assert_eq!(handlers.history().await.len(), 2);
    assert!(handlers.dataset_summary().await.is_ok());
}

#[tokio::test]
async fn test_empty_question_sends_nothing_and_appends_nothing() {
    let (transport, handlers, _dir) = test_handlers(replies(&["unused"]), 50);
    handlers.upload("sales.csv", SAMPLE_CSV).await.unwrap();

    let err = handlers
        .ask(query::AskParams {
            question: "   \t  ".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, crate::error::TableTalkError::EmptyQuestion));
    assert_eq!(transport.request_count(), 0);
    assert!(handlers.history().await.is_empty());
}

#[tokio::test]
async fn test_question_without_dataset_is_rejected() {
    let (transport, handlers, _dir) = test_handlers(replies(&["unused"]), 50);
    let err = handlers
        .ask(query::AskParams {
            question: "How many rows?".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, crate::error::TableTalkError::NoDataset));
    assert_eq!(transport.request_count(), 0);
    assert!(handlers.history().await.is_empty());
}

#[tokio::test]
async fn test_ask_appends_user_and_assistant_turns() {
    let (transport, handlers, _dir) = test_handlers(replies(&["There are 4 rows."]), 50);
    handlers.upload("sales.csv", SAMPLE_CSV).await.unwrap();

    let response = handlers
        .ask(query::AskParams {
            question: "How many rows?".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(response.reply, "There are 4 rows.");
    assert_eq!(transport.request_count(), 1);

    let history = handlers.history().await;
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].role, Role::User);
    assert_eq!(history[0].text, "How many rows?");
    assert_eq!(history[1].role, Role::Assistant);
    assert_eq!(history[1].text, "There are 4 rows.");
}

#[tokio::test]
async fn test_history_never_exceeds_cap() {
    let texts: Vec<String> = (0..8).map(|n| format!("reply {n}")).collect();
    let refs: Vec<&str> = texts.iter().map(|s| s.as_str()).collect();
    let (_, handlers, _dir) = test_handlers(replies(&refs), 4);
    handlers.upload("sales.csv", SAMPLE_CSV).await.unwrap();

    for n in 0..8 {
        handlers
            .ask(query::AskParams {
                question: format!("question {n}"),
            })
            .await
            .unwrap();
        assert!(handlers.history().await.len() <= 4);
    }
}

#[tokio::test]
async fn test_histogram_question_selects_chart() {
    let (_, handlers, _dir) = test_handlers(replies(&["Here is the distribution."]), 50);
    handlers.upload("sales.csv", SAMPLE_CSV).await.unwrap();

    let response = handlers
        .ask(query::AskParams {
            question: "plot a histogram of Age".to_string(),
        })
        .await
        .unwrap();
    let chart = response.chart.expect("chart should be selected");
    assert_eq!(chart.kind, ChartKind::Histogram);
    assert_eq!(chart.column, "Age");
}

#[tokio::test]
async fn test_absent_column_selects_no_chart() {
    let (_, handlers, _dir) = test_handlers(replies(&["No such column."]), 50);
    handlers.upload("sales.csv", SAMPLE_CSV).await.unwrap();

    let response = handlers
        .ask(query::AskParams {
            question: "plot a histogram of Weight".to_string(),
        })
        .await
        .unwrap();
    assert!(response.chart.is_none());
}

#[tokio::test]
async fn test_group_by_question_builds_table() {
    let (_, handlers, _dir) = test_handlers(replies(&["Grouped."]), 50);
    handlers.upload("sales.csv", SAMPLE_CSV).await.unwrap();

    let response = handlers
        .ask(query::AskParams {
            question: "group by Category and Sales sum".to_string(),
        })
        .await
        .unwrap();
    let table = response.aggregation.expect("aggregation should be built");
    assert_eq!(table.rows.len(), 2);
}

#[tokio::test]
async fn test_inference_failure_becomes_inline_reply() {
    // Empty response vec makes the mock transport fail on the first call
    let (_, handlers, _dir) = test_handlers(vec![], 50);
    handlers.upload("sales.csv", SAMPLE_CSV).await.unwrap();

    let response = handlers
        .ask(query::AskParams {
            question: "How many rows?".to_string(),
        })
        .await
        .unwrap();
    assert!(
        response
            .reply
            .starts_with("Error: Unable to process model response.")
    );

    // The session stays interactive and the error reply is logged as a turn
    let history = handlers.history().await;
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].role, Role::Assistant);
    assert!(history[1].text.starts_with("Error:"));
}

#[tokio::test]
async fn test_export_line_count_matches_turns() {
    let (_, handlers, _dir) = test_handlers(replies(&["One.", "Two."]), 50);
    handlers.upload("sales.csv", SAMPLE_CSV).await.unwrap();

    for question in ["first question", "second question"] {
        handlers
            .ask(query::AskParams {
                question: question.to_string(),
            })
            .await
            .unwrap();
    }

    let transcript = handlers.export().await;
    assert_eq!(transcript.lines().count(), handlers.history().await.len());
}

#[tokio::test]
async fn test_clear_empties_history() {
    let (_, handlers, _dir) = test_handlers(replies(&["Hi."]), 50);
    handlers.upload("sales.csv", SAMPLE_CSV).await.unwrap();
    handlers
        .ask(query::AskParams {
            question: "hello".to_string(),
        })
        .await
        .unwrap();

    handlers.clear().await;
    assert!(handlers.history().await.is_empty());
}

#[tokio::test]
async fn test_feedback_appends_one_line_per_submission() {
    let (_, handlers, dir) = test_handlers(vec![], 50);
    handlers
        .feedback(feedback::FeedbackParams {
            text: "Very helpful".to_string(),
        })
        .await
        .unwrap();
    handlers
        .feedback(feedback::FeedbackParams {
            text: "Chart was wrong".to_string(),
        })
        .await
        .unwrap();

    let contents = std::fs::read_to_string(dir.path().join("feedback.log")).unwrap();
    assert_eq!(contents.lines().count(), 2);
}

#[tokio::test]
async fn test_summary_and_suggestions_require_dataset() {
    let (_, handlers, _dir) = test_handlers(vec![], 50);
    assert!(handlers.dataset_summary().await.is_err());
    assert!(handlers.suggestions().await.is_err());

    handlers.upload("sales.csv", SAMPLE_CSV).await.unwrap();
    assert!(handlers.dataset_summary().await.is_ok());
    let suggestions = handlers.suggestions().await.unwrap();
    assert!(suggestions[0].contains("Category"));
}

#[tokio::test]
async fn test_voice_toggle_is_session_scoped() {
    let (_, handlers, _dir) = test_handlers(vec![], 50);
    assert!(handlers.set_voice(voice::VoiceToggleParams { enabled: true }).await.unwrap());
    assert!(handlers.session.read().await.voice_enabled());
    assert!(!handlers.set_voice(voice::VoiceToggleParams { enabled: false }).await.unwrap());
    assert!(!handlers.session.read().await.voice_enabled());
}

#[tokio::test]
async fn test_listen_without_engine_reports_unavailable() {
    let (_, handlers, _dir) = test_handlers(vec![], 50);
    let response = handlers.listen().await;
    assert!(response.transcript.is_empty());
    assert_eq!(
        response.notice.as_deref(),
        Some("Speech recognition service unavailable.")
    );
}
