pub mod completion;

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Mutex, MutexGuard, PoisonError,
};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub use completion::{build_prompt, AssistConfig, AssistError, CompletionEndpoint, GeminiClient};

use super::workflow::Draft;

/// Assistant entries shorter than this are not offered for insertion.
pub const APPLY_MIN_CHARS: usize = 50;

pub const GREETING: &str = "Hi! I'm here to help you write amazing articles. You can ask me to:\n\
• Generate ideas for your topic\n\
• Improve your writing\n\
• Create outlines\n\
• Suggest better phrases\n\
• Help with grammar and style\n\n\
What would you like help with today?";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatEntry {
    pub role: Role,
    pub text: String,
}

impl ChatEntry {
    fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
        }
    }

    pub fn can_apply(&self) -> bool {
        self.role == Role::Assistant && self.text.chars().count() > APPLY_MIN_CHARS
    }
}

#[derive(Debug)]
pub enum SendOutcome {
    /// Blank message, or another request was still pending.
    Ignored,
    Replied,
    /// The failure was written into the transcript as an assistant entry.
    Failed(AssistError),
}

struct LoadingGuard<'a>(&'a AtomicBool);

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Chat transcript plus the one in-flight completion request.
pub struct AssistWidget<C> {
    endpoint: C,
    transcript: Mutex<Vec<ChatEntry>>,
    loading: AtomicBool,
}

impl<C: CompletionEndpoint> AssistWidget<C> {
    pub fn new(endpoint: C) -> Self {
        Self {
            endpoint,
            transcript: Mutex::new(vec![ChatEntry::assistant(GREETING)]),
            loading: AtomicBool::new(false),
        }
    }

    fn entries(&self) -> MutexGuard<'_, Vec<ChatEntry>> {
        self.transcript.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn transcript(&self) -> Vec<ChatEntry> {
        self.entries().clone()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    pub async fn send(&self, message: &str) -> SendOutcome {
        if message.trim().is_empty() {
            return SendOutcome::Ignored;
        }
        if self
            .loading
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("completion already pending; message dropped");
            return SendOutcome::Ignored;
        }
        let _guard = LoadingGuard(&self.loading);

        self.entries().push(ChatEntry::user(message));

        match self.endpoint.complete(&build_prompt(message)).await {
            Ok(text) => {
                self.entries().push(ChatEntry::assistant(text));
                SendOutcome::Replied
            }
            Err(err) => {
                warn!(error = %err, "writing assistant request failed");
                self.entries().push(ChatEntry::assistant(err.user_message()));
                SendOutcome::Failed(err)
            }
        }
    }

    pub fn clear(&self) {
        *self.entries() = vec![ChatEntry::assistant(GREETING)];
    }

    /// Pushes the entry's text into the draft body. Returns false for an unknown index.
    pub fn apply_to_editor(&self, index: usize, draft: &mut Draft) -> bool {
        let Some(entry) = self.entries().get(index).cloned() else {
            return false;
        };
        draft.apply_suggestion(&entry.text);
        true
    }
}
