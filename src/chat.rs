//! Conversation manager for the assistant feature.
//!
//! An explicit two-state machine (Idle/Sending) owning the transcript.
//! The user message is appended optimistically before the network result
//! is known; failures land inside the transcript as a scripted assistant
//! reply rather than a separate error channel.

use crate::api::WellnessApi;
use crate::models::{ContentAnalysis, MusicAnalysis};
use crate::session::Session;
use anyhow::Result;
use serde::Serialize;
use tracing::debug;

/// Seed message every transcript starts with.
const GREETING: &str = "Hi! I'm MindWatch AI \u{1f9e0} I can analyze your mental wellness based on your Spotify and YouTube data. What would you like to know?";

/// Scripted reply appended when a send fails.
const FALLBACK_REPLY: &str = "Sorry, I had trouble connecting. Please try again!";

/// How many prior transcript entries accompany an outbound message.
const HISTORY_WINDOW: usize = 10;

/// How many starter prompts are ever shown.
const MAX_STARTERS: usize = 3;

/// Transcript role. The wire vocabulary differs: see [`Role::wire`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Total translation to the wire vocabulary: the model API calls the
    /// assistant side "model", while "user" passes through unchanged.
    pub fn wire(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "model",
        }
    }
}

/// One transcript entry. Immutable once appended.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

/// History entry as the backend expects it.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WireMessage {
    pub role: &'static str,
    pub content: String,
}

/// Outbound body for `POST /api/chat/message`.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub message: String,
    pub history: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spotify_data: Option<MusicAnalysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub youtube_data: Option<ContentAnalysis>,
}

/// Send state. A second send while one is outstanding is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatState {
    Idle,
    Sending,
}

/// Owns the transcript, the send state machine, and the starter prompts.
pub struct ConversationManager {
    messages: Vec<ChatMessage>,
    state: ChatState,
    starters: Vec<String>,
    /// Credential the starters were fetched (or attempted) for.
    starters_for: Option<String>,
}

impl Default for ConversationManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationManager {
    /// Fresh transcript seeded with exactly one assistant greeting.
    pub fn new() -> Self {
        Self {
            messages: vec![ChatMessage {
                role: Role::Assistant,
                content: GREETING.to_string(),
            }],
            state: ChatState::Idle,
            starters: Vec::new(),
            starters_for: None,
        }
    }

    /// Insertion-ordered transcript; append-only, never pruned.
    pub fn transcript(&self) -> &[ChatMessage] {
        &self.messages
    }

    #[allow(dead_code)] // Accessor for typing indicators
    pub fn state(&self) -> ChatState {
        self.state
    }

    /// Try to start a send.
    ///
    /// Returns `None` without touching any state when the text is
    /// empty/whitespace, a send is already outstanding, or the session has
    /// no credential. Otherwise the user message is appended optimistically,
    /// the state moves to Sending, and the outbound request is returned with
    /// the transcript as it stood before the append, truncated to the most
    /// recent [`HISTORY_WINDOW`] entries in wire vocabulary.
    pub fn begin_send(
        &mut self,
        text: &str,
        session: &Session,
        music: Option<&MusicAnalysis>,
        content: Option<&ContentAnalysis>,
    ) -> Option<ChatRequest> {
        let text = text.trim();
        if text.is_empty() || self.state == ChatState::Sending || session.token().is_none() {
            return None;
        }

        let start = self.messages.len().saturating_sub(HISTORY_WINDOW);
        let history = self.messages[start..]
            .iter()
            .map(|m| WireMessage {
                role: m.role.wire(),
                content: m.content.clone(),
            })
            .collect();

        self.messages.push(ChatMessage {
            role: Role::User,
            content: text.to_string(),
        });
        self.state = ChatState::Sending;

        Some(ChatRequest {
            message: text.to_string(),
            history,
            spotify_data: music.cloned(),
            youtube_data: content.cloned(),
        })
    }

    /// Finish the outstanding send.
    ///
    /// Success appends the returned assistant text; failure appends the
    /// fixed fallback reply. The Sending state is released on every path.
    pub fn complete_send(&mut self, result: Result<String>) {
        let content = match result {
            Ok(reply) => reply,
            Err(e) => {
                debug!("Chat send failed: {}", e);
                FALLBACK_REPLY.to_string()
            }
        };

        self.messages.push(ChatMessage {
            role: Role::Assistant,
            content,
        });
        self.state = ChatState::Idle;
    }

    /// Send one message end to end. Returns false when the send was
    /// refused (empty text, already sending, or no credential).
    pub async fn send_message<A: WellnessApi + ?Sized>(
        &mut self,
        text: &str,
        session: &Session,
        music: Option<&MusicAnalysis>,
        content: Option<&ContentAnalysis>,
        api: &A,
    ) -> bool {
        let Some(token) = session.token().map(str::to_string) else {
            return false;
        };
        let Some(request) = self.begin_send(text, session, music, content) else {
            return false;
        };

        let result = api.send_chat(&token, &request).await;
        self.complete_send(result);
        true
    }

    /// Fetch starter prompts once per session, keyed by the credential.
    /// A fetch failure is absorbed; it is not retried for this credential.
    pub async fn ensure_starters<A: WellnessApi + ?Sized>(&mut self, session: &Session, api: &A) {
        let Some(token) = session.token() else {
            return;
        };
        if self.starters_for.as_deref() == Some(token) {
            return;
        }

        self.starters_for = Some(token.to_string());
        match api.fetch_starters(token).await {
            Ok(starters) => self.starters = starters,
            Err(e) => debug!("Failed to fetch starters: {}", e),
        }
    }

    /// Starters to display: only while the transcript holds nothing but the
    /// seed greeting, and never more than [`MAX_STARTERS`].
    pub fn visible_starters(&self) -> &[String] {
        if self.messages.len() != 1 {
            return &[];
        }
        &self.starters[..self.starters.len().min(MAX_STARTERS)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    fn authed_session() -> Session {
        let mut session = Session::new();
        session.initialize("tok");
        session
    }

    #[test]
    fn test_seeded_with_one_greeting() {
        let chat = ConversationManager::new();
        assert_eq!(chat.transcript().len(), 1);
        assert_eq!(chat.transcript()[0].role, Role::Assistant);
        assert_eq!(chat.state(), ChatState::Idle);
    }

    #[test]
    fn test_empty_and_whitespace_are_noops() {
        let mut chat = ConversationManager::new();
        let session = authed_session();

        assert!(chat.begin_send("", &session, None, None).is_none());
        assert!(chat.begin_send("   ", &session, None, None).is_none());
        assert_eq!(chat.transcript().len(), 1);
        assert_eq!(chat.state(), ChatState::Idle);
    }

    #[test]
    fn test_no_token_is_noop() {
        let mut chat = ConversationManager::new();
        let session = Session::new();

        assert!(chat.begin_send("hello", &session, None, None).is_none());
        assert_eq!(chat.transcript().len(), 1);
    }

    #[test]
    fn test_optimistic_append_and_state_transition() {
        let mut chat = ConversationManager::new();
        let session = authed_session();

        let request = chat.begin_send("  hello  ", &session, None, None).unwrap();
        assert_eq!(request.message, "hello");
        assert_eq!(chat.state(), ChatState::Sending);
        assert_eq!(chat.transcript().len(), 2);
        assert_eq!(chat.transcript()[1].role, Role::User);
        assert_eq!(chat.transcript()[1].content, "hello");
        // History holds the transcript as it stood before the append.
        assert_eq!(request.history.len(), 1);
        assert_eq!(request.history[0].role, "model");
    }

    #[test]
    fn test_second_send_while_sending_is_noop() {
        let mut chat = ConversationManager::new();
        let session = authed_session();

        assert!(chat.begin_send("first", &session, None, None).is_some());
        assert!(chat.begin_send("second", &session, None, None).is_none());
        assert_eq!(chat.transcript().len(), 2);

        chat.complete_send(Ok("reply".to_string()));
        assert_eq!(chat.state(), ChatState::Idle);
        assert!(chat.begin_send("second", &session, None, None).is_some());
    }

    #[test]
    fn test_failure_lands_in_transcript() {
        let mut chat = ConversationManager::new();
        let session = authed_session();
        let before = chat.transcript().len();

        chat.begin_send("hello", &session, None, None).unwrap();
        chat.complete_send(Err(anyhow!("boom")));

        // Exactly two new entries: the user message and the fallback reply.
        assert_eq!(chat.transcript().len(), before + 2);
        let last = chat.transcript().last().unwrap();
        assert_eq!(last.role, Role::Assistant);
        assert_eq!(last.content, FALLBACK_REPLY);
        assert_eq!(chat.state(), ChatState::Idle);
    }

    #[test]
    fn test_history_window_and_role_translation() {
        let mut chat = ConversationManager::new();
        let session = authed_session();

        // 15 prior exchanges on top of the greeting.
        for i in 0..15 {
            chat.begin_send(&format!("question {i}"), &session, None, None)
                .unwrap();
            chat.complete_send(Ok(format!("answer {i}")));
        }
        assert_eq!(chat.transcript().len(), 31);

        let request = chat.begin_send("final", &session, None, None).unwrap();
        assert_eq!(request.history.len(), 10);
        assert!(request.history.iter().all(|m| m.role == "user" || m.role == "model"));
        // The most recent prior entry is the last answer, relabeled "model".
        let last = request.history.last().unwrap();
        assert_eq!(last.role, "model");
        assert_eq!(last.content, "answer 14");
    }

    #[test]
    fn test_wire_role_translation_is_total() {
        assert_eq!(Role::User.wire(), "user");
        assert_eq!(Role::Assistant.wire(), "model");
    }

    #[test]
    fn test_starters_shown_only_before_first_exchange() {
        let mut chat = ConversationManager::new();
        chat.starters = (1..=5).map(|i| format!("starter {i}")).collect();
        chat.starters_for = Some("tok".to_string());

        // Five returned, three shown.
        assert_eq!(chat.visible_starters().len(), 3);

        let session = authed_session();
        chat.begin_send("hello", &session, None, None).unwrap();
        chat.complete_send(Ok("reply".to_string()));
        assert_eq!(chat.transcript().len(), 3);
        assert!(chat.visible_starters().is_empty());
    }

    #[test]
    fn test_snapshots_attached_when_present() {
        let mut chat = ConversationManager::new();
        let session = authed_session();

        let music = MusicAnalysis {
            total_tracks_analyzed: 10,
            avg_valence: 0.7,
            avg_energy: 0.5,
            avg_tempo: 120.0,
            avg_danceability: 0.6,
            late_night_listening_ratio: 0.2,
            emotional_tone: "Upbeat".to_string(),
            recently_played: Vec::new(),
        };

        let request = chat
            .begin_send("how am I doing?", &session, Some(&music), None)
            .unwrap();
        assert!(request.spotify_data.is_some());
        assert!(request.youtube_data.is_none());

        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("spotify_data"));
        assert!(!json.contains("youtube_data"));
    }
}
