//! The chat interaction controller.
//!
//! A [`ChatController`] owns the conversation and turns each piece of user
//! input into exactly one user message (appended immediately) and, later,
//! exactly one bot message (the backend's reply or a fallback text).

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use tokio::task::JoinHandle;

use crate::backend::Backend;
use crate::chat::config::{ChatConfig, FallbackMessage, InFlightPolicy};
use crate::error::{Error, Result};
use crate::observability::{
    CHAT_BUSY, CHAT_FALLBACKS, CHAT_IGNORED, CHAT_REPLIES, CHAT_STALE_REPLIES, CHAT_SUBMISSIONS,
    CHAT_TURN_DURATION, INFO_FETCH_ERRORS, INFO_FETCHES,
};
use crate::routing::{Endpoint, RoutingPolicy};
use crate::types::{ChatRequest, ChatbotInfo, Message, Role};

/// The ordered, append-only list of exchanged messages.
///
/// Clearing the conversation starts a new generation; replies to requests
/// made under an older generation are discarded instead of appended.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<Message>,
    generation: u64,
}

impl Conversation {
    /// Creates an empty conversation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message.
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// All messages in insertion order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// The most recent message.
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// The number of messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns true if nothing has been said yet.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// The current generation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Discards every message and starts a new generation.
    pub fn clear(&mut self) {
        self.messages.clear();
        self.generation = self.generation.wrapping_add(1);
    }
}

/// Whether the controller is waiting on the backend.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ControllerState {
    /// No request in flight.
    Idle,

    /// At least one request has not produced its bot message yet.
    AwaitingReply,
}

/// The outcome of [`ChatController::submit`].
#[derive(Debug)]
pub enum Submission {
    /// The input was empty or whitespace; nothing changed.
    Ignored,

    /// A reply is still pending and the policy forbids overlap; nothing changed.
    Busy,

    /// The user message was appended and a request is on its way.
    Pending(PendingReply),
}

impl Submission {
    /// Returns the pending reply, if a request was started.
    pub fn into_pending(self) -> Option<PendingReply> {
        match self {
            Submission::Pending(pending) => Some(pending),
            Submission::Ignored | Submission::Busy => None,
        }
    }

    /// Returns true if a request was started.
    pub fn is_pending(&self) -> bool {
        matches!(self, Submission::Pending(_))
    }
}

/// Handle to the bot message a submission will produce.
///
/// The bot message is appended by the background task whether or not the
/// handle is awaited. Dropping the handle does not cancel the request.
#[derive(Debug)]
pub struct PendingReply {
    endpoint: Endpoint,
    handle: JoinHandle<Message>,
}

impl PendingReply {
    /// The endpoint the request was sent to.
    pub fn endpoint(&self) -> Endpoint {
        self.endpoint
    }

    /// Returns true once the bot message has been produced.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for the bot message: the reply text, or the fallback text.
    ///
    /// # Errors
    ///
    /// Returns an abort error only if the background task was torn down
    /// before finishing, e.g. because the runtime shut down.
    pub async fn wait(self) -> Result<Message> {
        self.handle
            .await
            .map_err(|err| Error::abort(format!("reply task ended early: {err}")))
    }
}

/// Aggregated stats for a chat session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionStats {
    /// The number of messages in the conversation.
    pub message_count: usize,
    /// User messages in the conversation.
    pub user_messages: usize,
    /// Bot messages in the conversation.
    pub bot_messages: usize,
    /// Submissions that started a request.
    pub submitted: u64,
    /// Backend replies appended.
    pub replies: u64,
    /// Fallback messages appended.
    pub fallbacks: u64,
    /// Empty submissions ignored.
    pub ignored: u64,
    /// Submissions rejected while a reply was pending.
    pub rejected_busy: u64,
    /// Requests currently in flight.
    pub in_flight: usize,
    /// Current controller state.
    pub state: ControllerState,
    /// Current routing policy.
    pub routing: RoutingPolicy,
    /// Current in-flight policy.
    pub in_flight_policy: InFlightPolicy,
    /// Whether reference data has been fetched.
    pub info_loaded: bool,
}

#[derive(Debug, Default)]
struct Counters {
    submitted: AtomicU64,
    replies: AtomicU64,
    fallbacks: AtomicU64,
    ignored: AtomicU64,
    rejected_busy: AtomicU64,
}

/// Decrements the in-flight count when the request task finishes, even if
/// it panics.
struct InFlightGuard(Arc<AtomicUsize>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Owns the conversation and dispatches user input to a [`Backend`].
///
/// The conversation lives behind a mutex so that request tasks running on
/// the tokio runtime can append their bot messages; locks are never held
/// across an await point.
pub struct ChatController<B: Backend + 'static> {
    backend: Arc<B>,
    conversation: Arc<Mutex<Conversation>>,
    in_flight: Arc<AtomicUsize>,
    counters: Arc<Counters>,
    routing: Mutex<RoutingPolicy>,
    in_flight_policy: InFlightPolicy,
    fallback: FallbackMessage,
    info: Mutex<ChatbotInfo>,
    info_fetched: AtomicBool,
}

impl<B: Backend + 'static> ChatController<B> {
    /// Creates a controller that talks to `backend` using the routing,
    /// fallback and in-flight settings of `config`.
    pub fn new(backend: B, config: &ChatConfig) -> Self {
        Self::with_shared_backend(Arc::new(backend), config)
    }

    /// Creates a controller around a backend that is shared elsewhere.
    pub fn with_shared_backend(backend: Arc<B>, config: &ChatConfig) -> Self {
        Self {
            backend,
            conversation: Arc::new(Mutex::new(Conversation::new())),
            in_flight: Arc::new(AtomicUsize::new(0)),
            counters: Arc::new(Counters::default()),
            routing: Mutex::new(config.routing),
            in_flight_policy: config.in_flight,
            fallback: config.fallback,
            info: Mutex::new(ChatbotInfo::default()),
            info_fetched: AtomicBool::new(false),
        }
    }

    /// Submits a piece of user input.
    ///
    /// Whitespace-only input is ignored. Otherwise the user message is
    /// appended before this returns and a background task sends the request;
    /// that task appends the bot message when the backend answers or fails.
    ///
    /// Must be called from within a tokio runtime.
    pub fn submit(&self, text: &str) -> Submission {
        if text.trim().is_empty() {
            CHAT_IGNORED.click();
            self.counters.ignored.fetch_add(1, Ordering::Relaxed);
            tracing::debug!("ignoring empty input");
            return Submission::Ignored;
        }

        if !self.try_begin_request() {
            CHAT_BUSY.click();
            self.counters.rejected_busy.fetch_add(1, Ordering::Relaxed);
            tracing::debug!("rejecting input while a reply is pending");
            return Submission::Busy;
        }
        let guard = InFlightGuard(Arc::clone(&self.in_flight));

        let endpoint = self.routing().route(text);
        let generation = {
            let mut conversation = lock(&self.conversation);
            conversation.push(Message::user(text));
            conversation.generation()
        };
        CHAT_SUBMISSIONS.click();
        self.counters.submitted.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(%endpoint, "dispatching question");

        let backend = Arc::clone(&self.backend);
        let conversation = Arc::clone(&self.conversation);
        let counters = Arc::clone(&self.counters);
        let fallback = self.fallback;
        let request = ChatRequest::new(text);

        let handle = tokio::spawn(async move {
            let _guard = guard;
            let start = Instant::now();
            let message = match backend.send(endpoint, &request).await {
                Ok(reply) => {
                    CHAT_REPLIES.click();
                    counters.replies.fetch_add(1, Ordering::Relaxed);
                    Message::bot(reply.reply)
                }
                Err(err) => {
                    CHAT_FALLBACKS.click();
                    counters.fallbacks.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(%endpoint, error = %err, "backend request failed; showing fallback");
                    Message::bot(fallback.text())
                }
            };
            CHAT_TURN_DURATION.add(start.elapsed().as_secs_f64());

            let mut conversation = lock(&conversation);
            if conversation.generation() == generation {
                conversation.push(message.clone());
            } else {
                CHAT_STALE_REPLIES.click();
                tracing::debug!(%endpoint, "dropping reply for a cleared conversation");
            }
            message
        });

        Submission::Pending(PendingReply { endpoint, handle })
    }

    fn try_begin_request(&self) -> bool {
        match self.in_flight_policy {
            InFlightPolicy::Exclusive => self
                .in_flight
                .compare_exchange(0, 1, Ordering::AcqRel, Ordering::Acquire)
                .is_ok(),
            InFlightPolicy::Concurrent => {
                self.in_flight.fetch_add(1, Ordering::AcqRel);
                true
            }
        }
    }

    /// Fetches the reference data from `/info`.
    ///
    /// Only the first call contacts the backend. On failure the empty default
    /// shape is kept and the call is not repeated.
    pub async fn fetch_info(&self) -> ChatbotInfo {
        if self.info_fetched.swap(true, Ordering::AcqRel) {
            return self.info();
        }
        INFO_FETCHES.click();
        match self.backend.info().await {
            Ok(info) => {
                tracing::debug!(
                    foods = info.foods.len(),
                    states = info.states.len(),
                    "loaded reference data"
                );
                *lock(&self.info) = info.clone();
                info
            }
            Err(err) => {
                INFO_FETCH_ERRORS.click();
                tracing::warn!(error = %err, "could not load reference data");
                self.info()
            }
        }
    }

    /// The stored reference data (empty until [`fetch_info`](Self::fetch_info) succeeds).
    pub fn info(&self) -> ChatbotInfo {
        lock(&self.info).clone()
    }

    /// Returns true once [`fetch_info`](Self::fetch_info) has been called.
    pub fn info_fetched(&self) -> bool {
        self.info_fetched.load(Ordering::Acquire)
    }

    /// Whether a reply is pending.
    pub fn state(&self) -> ControllerState {
        if self.in_flight() == 0 {
            ControllerState::Idle
        } else {
            ControllerState::AwaitingReply
        }
    }

    /// The number of requests that have not produced their bot message yet.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    /// A snapshot of the conversation.
    pub fn messages(&self) -> Vec<Message> {
        lock(&self.conversation).messages().to_vec()
    }

    /// Messages appended at or after `index`.
    pub fn messages_since(&self, index: usize) -> Vec<Message> {
        let conversation = lock(&self.conversation);
        conversation
            .messages()
            .get(index..)
            .map(<[Message]>::to_vec)
            .unwrap_or_default()
    }

    /// The most recent message.
    pub fn last_message(&self) -> Option<Message> {
        lock(&self.conversation).last().cloned()
    }

    /// The number of messages in the conversation.
    pub fn message_count(&self) -> usize {
        lock(&self.conversation).len()
    }

    /// Discards the conversation. Replies still in flight will not be appended.
    pub fn clear(&self) {
        lock(&self.conversation).clear();
    }

    /// The current routing policy.
    pub fn routing(&self) -> RoutingPolicy {
        *lock(&self.routing)
    }

    /// Changes the routing policy for future submissions.
    pub fn set_routing(&self, routing: RoutingPolicy) {
        *lock(&self.routing) = routing;
    }

    /// The in-flight policy.
    pub fn in_flight_policy(&self) -> InFlightPolicy {
        self.in_flight_policy
    }

    /// The fallback message appended on failure.
    pub fn fallback(&self) -> FallbackMessage {
        self.fallback
    }

    /// The backend this controller talks to.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Returns the current session statistics snapshot.
    pub fn stats(&self) -> SessionStats {
        let (message_count, user_messages) = {
            let conversation = lock(&self.conversation);
            let users = conversation
                .messages()
                .iter()
                .filter(|m| m.role == Role::User)
                .count();
            (conversation.len(), users)
        };
        SessionStats {
            message_count,
            user_messages,
            bot_messages: message_count - user_messages,
            submitted: self.counters.submitted.load(Ordering::Relaxed),
            replies: self.counters.replies.load(Ordering::Relaxed),
            fallbacks: self.counters.fallbacks.load(Ordering::Relaxed),
            ignored: self.counters.ignored.load(Ordering::Relaxed),
            rejected_busy: self.counters.rejected_busy.load(Ordering::Relaxed),
            in_flight: self.in_flight(),
            state: self.state(),
            routing: self.routing(),
            in_flight_policy: self.in_flight_policy,
            info_loaded: self.info_fetched() && !lock(&self.info).is_empty(),
        }
    }
}

/// Locks a mutex, recovering the data if another thread panicked while
/// holding it. Every critical section here is a single push or read, so the
/// data is never left half-updated.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
