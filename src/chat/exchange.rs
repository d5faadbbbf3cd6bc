//! Send-and-poll chat exchange.
//!
//! Submitting a message only tells the backend to start working; the reply
//! is discovered by polling the history until the last bubble is an
//! assistant message and the sent text is present as a user bubble. Each
//! send runs its own poll task. Loops are never cancelled, so overlapping
//! sends race and the last write to the view wins.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::state::{ChatView, ExchangePhase, PollConfig, PollOutcome, SharedView};
use crate::client::SupportBackend;
use crate::types::{
    ChatBubble, ChatSubmission, DeskError, Result, Role, same_conversation, to_bubbles,
};

/// Client-side chat state bound to one backend
pub struct ChatSession {
    backend: Arc<dyn SupportBackend>,
    view: SharedView,
    poll: PollConfig,
}

/// A submitted message whose reply is being polled for
pub struct PendingReply {
    pub bubble_id: String,
    handle: JoinHandle<PollOutcome>,
}

impl PendingReply {
    /// Wait for the poll loop to finish
    pub async fn wait(self) -> Result<PollOutcome> {
        Ok(self.handle.await?)
    }
}

impl ChatSession {
    pub fn new(backend: Arc<dyn SupportBackend>, poll: PollConfig) -> Self {
        Self {
            backend,
            view: Arc::new(RwLock::new(ChatView::default())),
            poll,
        }
    }

    /// Snapshot of the current view
    pub fn view(&self) -> ChatView {
        read_view(&self.view).clone()
    }

    pub fn messages(&self) -> Vec<ChatBubble> {
        read_view(&self.view).messages.clone()
    }

    pub fn is_waiting(&self) -> bool {
        read_view(&self.view).waiting
    }

    pub fn error(&self) -> Option<String> {
        read_view(&self.view).error.clone()
    }

    pub fn clear_error(&self) {
        write_view(&self.view).error = None;
    }

    /// Send a message and start polling for the reply.
    ///
    /// Blank input is rejected without touching the view or the network. A
    /// failed submit rolls back the optimistic bubble, sets the error banner
    /// and is returned as `Err`; with `poll_after_failed_submit` a poll loop
    /// is still started in the background.
    pub async fn send(&self, text: &str) -> Result<PendingReply> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(DeskError::validation("Message is empty"));
        }

        let bubble = ChatBubble::user(trimmed);
        let bubble_id = bubble.id.clone();
        {
            let mut view = write_view(&self.view);
            view.error = None;
            view.waiting = true;
            let mut next = view.messages.clone();
            next.push(bubble);
            view.messages = next;
        }

        debug!(phase = %ExchangePhase::Submitting, "Sending chat message");
        let submitted = self
            .backend
            .send_message(&ChatSubmission::user(trimmed))
            .await;

        match submitted {
            Ok(()) => {
                debug!(phase = %ExchangePhase::Submitted, "Chat message accepted");
                let handle = self.spawn_poll(trimmed.to_string());
                Ok(PendingReply { bubble_id, handle })
            }
            Err(e) => {
                warn!("Failed to send message: {}", e);
                debug!(phase = %ExchangePhase::SubmitFailed, "Rolling back optimistic bubble");
                {
                    let mut view = write_view(&self.view);
                    view.error = Some(e.user_message());
                    view.messages = view
                        .messages
                        .iter()
                        .filter(|m| m.id != bubble_id)
                        .cloned()
                        .collect();
                    view.waiting = false;
                }

                if self.poll.poll_after_failed_submit {
                    // Detached: dropping the handle leaves the task running
                    drop(self.spawn_poll(trimmed.to_string()));
                }
                Err(e)
            }
        }
    }

    fn spawn_poll(&self, sent: String) -> JoinHandle<PollOutcome> {
        tokio::spawn(poll_for_reply(
            Arc::clone(&self.backend),
            Arc::clone(&self.view),
            sent,
            self.poll.clone(),
        ))
    }

    /// Re-fetch history; the list is replaced only when it changed.
    /// Returns whether it changed. Errors are logged.
    pub async fn refresh_history(&self) -> bool {
        refresh_history(self.backend.as_ref(), &self.view).await
    }

    pub async fn clear_history(&self) -> Result<()> {
        self.backend.clear_history().await?;
        write_view(&self.view).messages = Vec::new();
        Ok(())
    }

    /// Refresh history every `interval` until the handle is aborted
    pub fn watch_history(&self, interval: Duration) -> JoinHandle<()> {
        let backend = Arc::clone(&self.backend);
        let view = Arc::clone(&self.view);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                refresh_history(backend.as_ref(), &view).await;
            }
        })
    }
}

/// The reply has arrived when the last bubble is from the assistant and the
/// sent text is in the conversation as a user bubble.
pub fn reply_arrived(bubbles: &[ChatBubble], sent: &str) -> bool {
    let last_is_assistant = bubbles.last().is_some_and(|b| b.role == Role::Assistant);
    let has_user_message = bubbles
        .iter()
        .any(|b| b.role == Role::User && b.text == sent);
    last_is_assistant && has_user_message
}

async fn poll_for_reply(
    backend: Arc<dyn SupportBackend>,
    view: SharedView,
    sent: String,
    config: PollConfig,
) -> PollOutcome {
    debug!(phase = %ExchangePhase::Polling, max_attempts = config.max_attempts, "Polling for reply");

    for attempt in 1..=config.max_attempts {
        tokio::time::sleep(config.interval).await;

        match backend.history().await {
            Ok(snapshot) => {
                let bubbles = to_bubbles(&snapshot);
                if reply_arrived(&bubbles, &sent) {
                    let mut current = write_view(&view);
                    current.messages = bubbles;
                    current.waiting = false;
                    debug!(phase = %ExchangePhase::Resolved, attempt, "Reply arrived");
                    return PollOutcome::Resolved { attempts: attempt };
                }
            }
            Err(e) => warn!("Error polling for response: {}", e),
        }
    }

    debug!(phase = %ExchangePhase::Exhausted, "No reply after {} attempts", config.max_attempts);
    write_view(&view).waiting = false;

    debug!(phase = %ExchangePhase::FinalRefresh, "Refreshing history");
    refresh_history(backend.as_ref(), &view).await;

    PollOutcome::Exhausted {
        attempts: config.max_attempts,
    }
}

async fn refresh_history(backend: &dyn SupportBackend, view: &RwLock<ChatView>) -> bool {
    let snapshot = match backend.history().await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            warn!("Failed to load chat history: {}", e);
            return false;
        }
    };

    let fresh = to_bubbles(&snapshot);
    let mut current = write_view(view);
    if same_conversation(&current.messages, &fresh) {
        return false;
    }
    current.messages = fresh;
    true
}

fn read_view(view: &RwLock<ChatView>) -> RwLockReadGuard<'_, ChatView> {
    view.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write_view(view: &RwLock<ChatView>) -> RwLockWriteGuard<'_, ChatView> {
    view.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overrides::{Overrides, RingStatus};
    use crate::types::{HistorySnapshot, SessionDetail, SessionId, SessionSummary};
    use async_trait::async_trait;
    use serde_json::{Map, Value, json};
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Backend replaying scripted history replies; the last entry repeats
    struct MockBackend {
        history: Mutex<VecDeque<Result<HistorySnapshot>>>,
        fallback: Mutex<HistorySnapshot>,
        send_failure: Option<(u16, String)>,
        history_calls: AtomicU32,
        send_calls: AtomicU32,
        clear_calls: AtomicU32,
    }

    impl MockBackend {
        fn new(fallback: Value) -> Self {
            Self {
                history: Mutex::new(VecDeque::new()),
                fallback: Mutex::new(HistorySnapshot::from_value(&fallback)),
                send_failure: None,
                history_calls: AtomicU32::new(0),
                send_calls: AtomicU32::new(0),
                clear_calls: AtomicU32::new(0),
            }
        }

        fn then(self, reply: Result<Value>) -> Self {
            self.history
                .lock()
                .unwrap()
                .push_back(reply.map(|v| HistorySnapshot::from_value(&v)));
            self
        }

        fn failing_send(mut self, status: u16, body: &str) -> Self {
            self.send_failure = Some((status, body.to_string()));
            self
        }

        fn set_fallback(&self, value: Value) {
            *self.fallback.lock().unwrap() = HistorySnapshot::from_value(&value);
        }

        fn history_calls(&self) -> u32 {
            self.history_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SupportBackend for MockBackend {
        async fn history(&self) -> Result<HistorySnapshot> {
            self.history_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(reply) = self.history.lock().unwrap().pop_front() {
                return reply;
            }
            Ok(self.fallback.lock().unwrap().clone())
        }

        async fn send_message(&self, _submission: &ChatSubmission) -> Result<()> {
            self.send_calls.fetch_add(1, Ordering::SeqCst);
            match &self.send_failure {
                Some((status, body)) => Err(DeskError::upstream(*status, body.clone())),
                None => Ok(()),
            }
        }

        async fn clear_history(&self) -> Result<()> {
            self.clear_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn list_sessions(&self) -> Result<Vec<SessionSummary>> {
            Ok(Vec::new())
        }

        async fn get_session(&self, _id: &SessionId) -> Result<SessionDetail> {
            Ok(SessionDetail::default())
        }

        async fn create_session(&self, body: Value) -> Result<Value> {
            Ok(body)
        }

        async fn delete_session(&self, _id: &SessionId) -> Result<()> {
            Ok(())
        }

        async fn load_overrides(&self) -> Result<Overrides> {
            Ok(Overrides::default())
        }

        async fn save_overrides(&self, _overrides: &Overrides) -> Result<bool> {
            Ok(true)
        }

        async fn set_context(&self, _context: &Map<String, Value>) -> Result<Value> {
            Ok(json!({}))
        }

        async fn get_context(&self) -> Result<Value> {
            Ok(json!({}))
        }

        async fn clear_context(&self) -> Result<Value> {
            Ok(json!({}))
        }

        async fn ring_status(&self) -> Result<Option<RingStatus>> {
            Ok(None)
        }

        async fn set_timezone(&self, _timezone: &str) -> Result<()> {
            Ok(())
        }

        fn name(&self) -> &str {
            "mock"
        }
    }

    fn fast_poll(max_attempts: u32) -> PollConfig {
        PollConfig {
            interval: Duration::from_millis(1),
            max_attempts,
            poll_after_failed_submit: true,
        }
    }

    fn user_only(text: &str) -> Value {
        json!({"messages": [{"role": "user", "content": text}]})
    }

    fn answered(text: &str, reply: &str) -> Value {
        json!({"messages": [
            {"role": "user", "content": text},
            {"role": "assistant", "content": reply}
        ]})
    }

    #[tokio::test]
    async fn test_resolves_when_reply_arrives() {
        let backend = Arc::new(
            MockBackend::new(answered("hi", "hello"))
                .then(Ok(user_only("hi")))
                .then(Ok(answered("hi", "hello"))),
        );
        let session = ChatSession::new(backend.clone(), fast_poll(30));

        let pending = session.send("  hi  ").await.unwrap();
        assert!(session.is_waiting());
        assert_eq!(session.messages().len(), 1);

        let outcome = pending.wait().await.unwrap();
        assert_eq!(outcome, PollOutcome::Resolved { attempts: 2 });
        assert!(!session.is_waiting());

        let messages = session.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].role, Role::Assistant);
        assert_eq!(messages[1].text, "hello");
    }

    #[tokio::test]
    async fn test_exhaustion_runs_one_final_refresh() {
        let backend = Arc::new(MockBackend::new(user_only("ring?")));
        let session = ChatSession::new(backend.clone(), fast_poll(3));

        let outcome = session.send("ring?").await.unwrap().wait().await.unwrap();
        assert_eq!(outcome, PollOutcome::Exhausted { attempts: 3 });
        assert_eq!(backend.history_calls(), 4);
        assert!(!session.is_waiting());
        assert_eq!(session.messages().len(), 1);
        assert!(session.error().is_none());
    }

    #[tokio::test]
    async fn test_poll_errors_do_not_stop_loop() {
        let backend = Arc::new(
            MockBackend::new(answered("hi", "hey"))
                .then(Err(DeskError::upstream(502, "bad gateway")))
                .then(Ok(answered("hi", "hey"))),
        );
        let session = ChatSession::new(backend, fast_poll(5));

        let outcome = session.send("hi").await.unwrap().wait().await.unwrap();
        assert_eq!(outcome, PollOutcome::Resolved { attempts: 2 });
        assert!(session.error().is_none());
    }

    #[tokio::test]
    async fn test_reply_must_follow_sent_text() {
        // Assistant is last but the sent text never shows up.
        let backend = Arc::new(MockBackend::new(answered("older question", "older answer")));
        let session = ChatSession::new(backend, fast_poll(2));

        let outcome = session.send("new question").await.unwrap().wait().await.unwrap();
        assert!(!outcome.is_resolved());
        // The final refresh still brings the list in line with the backend.
        assert_eq!(session.messages()[0].text, "older question");
    }

    #[tokio::test]
    async fn test_failed_submit_rolls_back() {
        let backend = Arc::new(
            MockBackend::new(json!({"messages": []})).failing_send(500, ""),
        );
        let mut poll = fast_poll(2);
        poll.poll_after_failed_submit = false;
        let session = ChatSession::new(backend.clone(), poll);

        let err = session.send("hello").await.err().unwrap();
        assert_eq!(err.status(), Some(500));
        assert_eq!(session.error().as_deref(), Some("Request failed (500)"));
        assert!(session.messages().is_empty());
        assert!(!session.is_waiting());

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(backend.history_calls(), 0);
    }

    #[tokio::test]
    async fn test_failed_submit_still_polls_by_default() {
        let backend = Arc::new(
            MockBackend::new(json!({"messages": []})).failing_send(503, "asleep"),
        );
        let session = ChatSession::new(backend.clone(), fast_poll(2));

        assert!(session.send("hello").await.is_err());
        assert_eq!(session.error().as_deref(), Some("asleep"));

        for _ in 0..100 {
            if backend.history_calls() >= 3 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        // Two attempts plus the final refresh
        assert_eq!(backend.history_calls(), 3);
        assert!(!session.is_waiting());
    }

    #[tokio::test]
    async fn test_blank_input_is_rejected_locally() {
        let backend = Arc::new(MockBackend::new(json!({})));
        let session = ChatSession::new(backend.clone(), fast_poll(1));

        let err = session.send("   ").await.err().unwrap();
        assert!(matches!(err, DeskError::Validation(_)));
        assert_eq!(backend.send_calls.load(Ordering::SeqCst), 0);
        assert_eq!(session.view(), ChatView::default());
    }

    #[tokio::test]
    async fn test_overlapping_sends_both_finish() {
        let backend = Arc::new(MockBackend::new(json!({"messages": [
            {"role": "user", "content": "first"},
            {"role": "assistant", "content": "one"},
            {"role": "user", "content": "second"},
            {"role": "assistant", "content": "two"}
        ]})));
        let session = ChatSession::new(backend, fast_poll(5));

        let a = session.send("first").await.unwrap();
        let b = session.send("second").await.unwrap();

        assert!(a.wait().await.unwrap().is_resolved());
        assert!(b.wait().await.unwrap().is_resolved());
        assert!(!session.is_waiting());
        assert_eq!(session.messages().len(), 4);
    }

    #[tokio::test]
    async fn test_refresh_keeps_list_when_unchanged() {
        let backend = Arc::new(MockBackend::new(answered("a", "b")));
        let session = ChatSession::new(backend.clone(), fast_poll(1));

        assert!(session.refresh_history().await);
        let ids: Vec<_> = session.messages().into_iter().map(|m| m.id).collect();

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert!(!session.refresh_history().await);
        let again: Vec<_> = session.messages().into_iter().map(|m| m.id).collect();
        assert_eq!(ids, again);

        backend.set_fallback(answered("a", "c"));
        assert!(session.refresh_history().await);
        assert_eq!(session.messages()[1].text, "c");
    }

    #[tokio::test]
    async fn test_clear_history_empties_view() {
        let backend = Arc::new(MockBackend::new(answered("a", "b")));
        let session = ChatSession::new(backend.clone(), fast_poll(1));
        session.refresh_history().await;

        session.clear_history().await.unwrap();
        assert!(session.messages().is_empty());
        assert_eq!(backend.clear_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_watch_history_refreshes_until_aborted() {
        let backend = Arc::new(MockBackend::new(answered("a", "b")));
        let session = ChatSession::new(backend.clone(), fast_poll(1));

        let handle = session.watch_history(Duration::from_millis(2));
        for _ in 0..100 {
            if backend.history_calls() >= 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        handle.abort();

        assert!(backend.history_calls() >= 2);
        assert_eq!(session.messages().len(), 2);
    }

    #[test]
    fn test_reply_arrived() {
        let bubbles = to_bubbles(&HistorySnapshot::from_value(&answered("hi", "yo")));
        assert!(reply_arrived(&bubbles, "hi"));
        assert!(!reply_arrived(&bubbles, "hello"));
        assert!(!reply_arrived(&bubbles[..1], "hi"));
    }
}
