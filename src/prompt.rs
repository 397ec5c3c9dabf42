use crate::dataset::Dataset;
use crate::models::{ConversationTurn, Role};

/// Fixed instruction block appended to every prompt
const INSTRUCTIONS: &str = "Instructions:
- Provide a concise, accurate answer based only on the data.
- If a visualization is requested, suggest code to generate it.
- If unclear, ask for clarification.
- Do not assume or invent data.";

/// Build the full prompt for one send action: column list, row preview,
/// reconstructed dialogue and the current question. Deterministic for
/// identical inputs; the result is ephemeral and never stored.
pub fn build_prompt(
    dataset: Option<&Dataset>,
    history: &[ConversationTurn],
    question: &str,
    preview_rows: usize,
) -> String {
    let mut prompt = String::new();

    match dataset {
        Some(data) => {
            prompt.push_str(&format!(
                "You are an expert data analyst. You have access to a dataset with columns: {}.\n",
                data.column_names().join(", ")
            ));
            prompt.push_str(&format!(
                "Preview (first {} rows):\n{}\n",
                preview_rows,
                data.preview_text(preview_rows)
            ));
        }
        None => {
            prompt.push_str("You are an expert data analyst. No dataset is currently loaded.\n");
        }
    }

    prompt.push_str("\nPrevious conversation:\n");
    prompt.push_str(&transcript_pairs(history));

    prompt.push_str(&format!("\nCurrent question: {question}\n\n"));
    prompt.push_str(INSTRUCTIONS);

    prompt
}

/// Pair each user turn with the immediately following assistant turn,
/// oldest first. Unpaired trailing turns render with an empty counterpart.
fn transcript_pairs(history: &[ConversationTurn]) -> String {
    let mut lines = Vec::new();
    let mut i = 0;
    while i < history.len() {
        let turn = &history[i];
        if turn.role == Role::User {
            let reply = history
                .get(i + 1)
                .filter(|next| next.role == Role::Assistant)
                .map(|next| next.text.as_str())
                .unwrap_or("");
            lines.push(format!("User: {}\nAssistant: {}", turn.text, reply));
            i += 2;
        } else {
            // Assistant turn without a preceding user turn; skip it
            i += 1;
        }
    }
    lines.join("\n")
}
