use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{Message, SearchResult};

pub type SessionHandle = Arc<RwLock<Session>>;

/// State behind one results page: transcript, current results and selection.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub id: Uuid,
    /// The query the session was started with
    pub query: String,
    pub created_at: DateTime<Utc>,
    pub messages: Vec<Message>,
    pub results: Vec<SearchResult>,
    pub selected: Vec<SearchResult>,
    pub is_loading: bool,
    /// Set when the last analysis asked a question instead of searching
    pub awaiting_clarification: bool,
    /// User-facing message from the last failed run, cleared when a new run starts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Every user turn in order, starting with `query`
    #[serde(skip)]
    turns: Vec<String>,
}

impl Session {
    pub fn new(query: impl Into<String>) -> Self {
        let query = query.into();
        Self {
            id: Uuid::new_v4(),
            turns: vec![query.clone()],
            query,
            created_at: Utc::now(),
            messages: Vec::new(),
            results: Vec::new(),
            selected: Vec::new(),
            is_loading: false,
            awaiting_clarification: false,
            error: None,
        }
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Drop transient loading entries from the transcript.
    pub fn clear_placeholders(&mut self) {
        self.messages.retain(|m| !m.is_searching);
    }

    pub fn add_turn(&mut self, text: impl Into<String>) {
        self.turns.push(text.into());
    }

    /// The original query plus every later user turn, one per paragraph.
    pub fn combined_context(&self) -> String {
        match self.turns.split_first() {
            Some((first, [])) => first.clone(),
            Some((first, rest)) => {
                let mut ctx = first.clone();
                for turn in rest {
                    ctx.push_str("\n\nAdditional context: ");
                    ctx.push_str(turn);
                }
                ctx
            }
            None => self.query.clone(),
        }
    }

    pub fn find_result(&self, title: &str) -> Option<&SearchResult> {
        self.results.iter().find(|r| r.title == title)
    }

    pub fn is_selected(&self, title: &str) -> bool {
        self.selected.iter().any(|r| r.title == title)
    }

    /// Add `result` to the selection, or remove it if its title is already
    /// selected. Returns whether it is selected afterwards.
    pub fn toggle_selection(&mut self, result: &SearchResult) -> bool {
        if self.is_selected(&result.title) {
            self.selected.retain(|r| r.title != result.title);
            false
        } else {
            self.selected.push(result.clone());
            true
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }
}

/// Marks a session busy for the lifetime of one pipeline run. Dropping it
/// clears the flag and any leftover placeholders, on success or failure.
pub struct LoadingGuard {
    handle: SessionHandle,
}

impl LoadingGuard {
    /// Returns `None` if the session is already loading.
    pub fn acquire(handle: &SessionHandle) -> Option<Self> {
        let mut session = handle.write();
        if session.is_loading {
            return None;
        }
        session.is_loading = true;
        Some(Self {
            handle: handle.clone(),
        })
    }
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        let mut session = self.handle.write();
        session.clear_placeholders();
        session.is_loading = false;
    }
}

/// In-memory session registry with a size cap; the oldest session is
/// evicted to make room.
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, SessionHandle>>,
    max_sessions: usize,
}

impl SessionStore {
    pub fn new(max_sessions: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_sessions: max_sessions.max(1),
        }
    }

    pub fn insert(&self, session: Session) -> SessionHandle {
        let id = session.id;
        let handle = Arc::new(RwLock::new(session));
        let mut sessions = self.sessions.write();

        while sessions.len() >= self.max_sessions {
            let oldest = sessions
                .iter()
                .min_by_key(|(_, s)| s.read().created_at)
                .map(|(id, _)| *id);
            match oldest {
                Some(oldest) => {
                    tracing::debug!("Evicting session {oldest}");
                    sessions.remove(&oldest);
                }
                None => break,
            }
        }

        sessions.insert(id, handle.clone());
        handle
    }

    pub fn get(&self, id: &Uuid) -> Option<SessionHandle> {
        self.sessions.read().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
