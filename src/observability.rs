use biometrics::{Collector, Counter, Moments};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("chopwise.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter = Counter::new("chopwise.client.request_errors");
pub(crate) static CLIENT_REQUEST_DURATION: Moments =
    Moments::new("chopwise.client.request_duration_seconds");

pub(crate) static CHAT_SUBMISSIONS: Counter = Counter::new("chopwise.chat.submissions");
pub(crate) static CHAT_IGNORED: Counter = Counter::new("chopwise.chat.ignored");
pub(crate) static CHAT_BUSY: Counter = Counter::new("chopwise.chat.busy");
pub(crate) static CHAT_REPLIES: Counter = Counter::new("chopwise.chat.replies");
pub(crate) static CHAT_FALLBACKS: Counter = Counter::new("chopwise.chat.fallbacks");
pub(crate) static CHAT_STALE_REPLIES: Counter = Counter::new("chopwise.chat.stale_replies");
pub(crate) static CHAT_TURN_DURATION: Moments =
    Moments::new("chopwise.chat.turn_duration_seconds");

pub(crate) static INFO_FETCHES: Counter = Counter::new("chopwise.info.fetches");
pub(crate) static INFO_FETCH_ERRORS: Counter = Counter::new("chopwise.info.fetch_errors");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: &Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_moments(&CLIENT_REQUEST_DURATION);

    collector.register_counter(&CHAT_SUBMISSIONS);
    collector.register_counter(&CHAT_IGNORED);
    collector.register_counter(&CHAT_BUSY);
    collector.register_counter(&CHAT_REPLIES);
    collector.register_counter(&CHAT_FALLBACKS);
    collector.register_counter(&CHAT_STALE_REPLIES);
    collector.register_moments(&CHAT_TURN_DURATION);

    collector.register_counter(&INFO_FETCHES);
    collector.register_counter(&INFO_FETCH_ERRORS);
}
