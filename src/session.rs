use crate::dataset::Dataset;
use crate::models::ConversationTurn;

/// Session-scoped state: the conversation log, the current dataset and the
/// voice toggle. Lives for the duration of the interactive session; nothing
/// here is persisted. Only the service layer mutates it.
pub struct SessionState {
    turns: Vec<ConversationTurn>,
    max_history: usize,
    dataset: Option<Dataset>,
    voice_enabled: bool,
}

impl SessionState {
    pub fn new(max_history: usize) -> Self {
        Self {
            turns: Vec::new(),
            max_history,
            dataset: None,
            voice_enabled: false,
        }
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    /// Append a turn, then drop the oldest entries while over the cap.
    /// The log never exceeds the cap after this returns.
    pub fn append(&mut self, turn: ConversationTurn) {
        self.turns.push(turn);
        if self.turns.len() > self.max_history {
            let excess = self.turns.len() - self.max_history;
            self.turns.drain(..excess);
        }
    }

    /// Empty the conversation log
    pub fn clear(&mut self) {
        self.turns.clear();
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        self.dataset.as_ref()
    }

    /// Replace the dataset wholesale and clear the conversation; a new
    /// dataset invalidates all prior turns.
    pub fn replace_dataset(&mut self, dataset: Dataset) {
        self.dataset = Some(dataset);
        self.clear();
    }

    pub fn voice_enabled(&self) -> bool {
        self.voice_enabled
    }

    pub fn set_voice_enabled(&mut self, enabled: bool) {
        self.voice_enabled = enabled;
    }

    /// Plain-text transcript, one role-labeled timestamped line per turn.
    /// Embedded newlines are flattened so the line count always equals the
    /// turn count.
    pub fn transcript(&self) -> String {
        self.turns
            .iter()
            .map(|turn| {
                format!(
                    "{}: {} ({})",
                    turn.role,
                    turn.text.replace(['\n', '\r'], " "),
                    turn.timestamp.format("%H:%M")
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::load_dataset;
    use crate::models::Role;

    fn user_turn(n: usize) -> ConversationTurn {
        ConversationTurn::new(Role::User, format!("question {n}"))
    }

    #[test]
    fn test_append_respects_cap() {
        let mut session = SessionState::new(4);
        for n in 0..10 {
            session.append(user_turn(n));
            assert!(session.turns().len() <= 4);
        }
        // Oldest entries were dropped
        assert_eq!(session.turns()[0].text, "question 6");
        assert_eq!(session.turns()[3].text, "question 9");
    }

    #[test]
    fn test_clear_empties_log() {
        let mut session = SessionState::new(10);
        session.append(user_turn(0));
        session.append(user_turn(1));
        session.clear();
        assert!(session.turns().is_empty());
    }

    #[test]
    fn test_replace_dataset_clears_turns() {
        let mut session = SessionState::new(10);
        session.append(user_turn(0));

        let dataset = load_dataset("data.csv", b"A\n1\n", 1024).unwrap();
        session.replace_dataset(dataset);

        assert!(session.turns().is_empty());
        assert!(session.dataset().is_some());
    }

    #[test]
    fn test_transcript_line_count_matches_turns() {
        let mut session = SessionState::new(10);
        session.append(ConversationTurn::new(Role::User, "line one\nline two"));
        session.append(ConversationTurn::new(Role::Assistant, "reply"));

        let transcript = session.transcript();
        assert_eq!(transcript.lines().count(), 2);
        assert!(transcript.starts_with("User: line one line two ("));
        assert!(transcript.contains("\nAssistant: reply ("));
    }

    #[test]
    fn test_voice_flag_defaults_off() {
        let mut session = SessionState::new(10);
        assert!(!session.voice_enabled());
        session.set_voice_enabled(true);
        assert!(session.voice_enabled());
    }
}
