//! Session ids and per-session conversation history.

use rand::Rng;
use spur_types::ChatMessage;

const SESSION_ID_PREFIX: &str = "chat_session";
const SESSION_SUFFIX_LEN: usize = 7;

/// Synthesize a fresh session id: `chat_session_{unix_millis}_{7 base-36 chars}`.
///
/// Practically collision-free for correlating chat turns, but not a secret:
/// never use it as a security token.
pub fn generate_session_id() -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let mut rng = rand::thread_rng();
    let suffix: String = (0..SESSION_SUFFIX_LEN)
        .map(|_| std::char::from_digit(rng.gen_range(0..36), 36).unwrap_or('0'))
        .collect();

    format!("{}_{}_{}", SESSION_ID_PREFIX, millis, suffix)
}

/// Adopt `provided` when it is non-empty, otherwise synthesize a new id
pub fn get_or_create_session_id(provided: Option<&str>) -> String {
    match provided {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => generate_session_id(),
    }
}

/// Holds the session id of one conversation
#[derive(Debug, Clone)]
pub struct SessionManager {
    session_id: String,
}

impl SessionManager {
    pub fn new(provided: Option<&str>) -> Self {
        Self {
            session_id: get_or_create_session_id(provided),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Replace the id with a caller-supplied one. Empty ids are ignored.
    ///
    /// Returns whether the id changed.
    pub fn adopt(&mut self, provided: &str) -> bool {
        if provided.is_empty() || provided == self.session_id {
            return false;
        }
        self.session_id = provided.to_string();
        true
    }

    /// Start over with a freshly generated id
    pub fn renew(&mut self) -> &str {
        self.session_id = generate_session_id();
        &self.session_id
    }
}

/// Completed turns of the current session, oldest first
#[derive(Debug, Clone)]
pub struct Conversation {
    entries: Vec<ChatMessage>,
    limit: usize,
}

impl Conversation {
    pub fn new(limit: usize) -> Self {
        Self {
            entries: Vec::new(),
            limit,
        }
    }

    pub fn record_turn(&mut self, user_message: &str, reply: &ChatMessage) {
        self.entries.push(ChatMessage::user(user_message));
        self.entries.push(reply.clone());

        if self.entries.len() > self.limit {
            let excess = self.entries.len() - self.limit;
            self.entries.drain(..excess);
        }
    }

    pub fn entries(&self) -> &[ChatMessage] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spur_types::Role;

    #[test]
    fn test_generated_id_format() {
        let id = generate_session_id();
        let parts: Vec<&str> = id.rsplitn(2, '_').collect();
        let suffix = parts[0];
        let prefix = parts[1];

        assert_eq!(suffix.len(), SESSION_SUFFIX_LEN);
        assert!(suffix
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));

        let millis = prefix.trim_start_matches("chat_session_");
        assert!(millis.parse::<i64>().unwrap() > 0);
    }

    #[test]
    fn test_generated_ids_differ() {
        assert_ne!(generate_session_id(), generate_session_id());
    }

    #[test]
    fn test_provided_id_is_adopted() {
        assert_eq!(get_or_create_session_id(Some("resume-me")), "resume-me");
        assert!(get_or_create_session_id(Some("")).starts_with("chat_session_"));
        assert!(get_or_create_session_id(None).starts_with("chat_session_"));
    }

    #[test]
    fn test_session_manager_adopt() {
        let mut session = SessionManager::new(None);
        let original = session.session_id().to_string();

        assert!(!session.adopt(""));
        assert_eq!(session.session_id(), original);

        assert!(session.adopt("external"));
        assert_eq!(session.session_id(), "external");
        assert!(!session.adopt("external"));
    }

    #[test]
    fn test_conversation_keeps_most_recent_entries() {
        let mut conversation = Conversation::new(4);
        for turn in 0..3 {
            conversation.record_turn(
                &format!("question {turn}"),
                &ChatMessage::assistant(format!("answer {turn}")),
            );
        }

        assert_eq!(conversation.len(), 4);
        assert_eq!(conversation.entries()[0], ChatMessage::user("question 1"));
        assert_eq!(conversation.entries()[3].role, Role::Assistant);
        assert_eq!(conversation.entries()[3].message, "answer 2");
    }
}
