use biometrics::{Collector, Counter, Moments};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("notechat.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter = Counter::new("notechat.client.request_errors");
pub(crate) static CLIENT_REQUEST_DURATION: Moments =
    Moments::new("notechat.client.request_duration_seconds");

pub(crate) static ASK_REQUESTS: Counter = Counter::new("notechat.client.ask");
pub(crate) static UPLOAD_REQUESTS: Counter = Counter::new("notechat.client.upload_notes");
pub(crate) static VOICE_TO_TEXT_REQUESTS: Counter = Counter::new("notechat.client.voice_to_text");
pub(crate) static TEXT_TO_VOICE_REQUESTS: Counter = Counter::new("notechat.client.text_to_voice");

pub(crate) static SESSION_ALERTS: Counter = Counter::new("notechat.session.alerts");
pub(crate) static SESSION_ANSWERS: Counter = Counter::new("notechat.session.answers");
pub(crate) static SESSION_SEND_FAILURES: Counter = Counter::new("notechat.session.send_failures");
pub(crate) static SESSION_ADMIN_UPLOADS: Counter = Counter::new("notechat.session.admin_uploads");

pub(crate) static DISPATCH_ACTIONS: Counter = Counter::new("notechat.dispatch.actions");
pub(crate) static DISPATCH_FAILURES: Counter = Counter::new("notechat.dispatch.failures");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_moments(&CLIENT_REQUEST_DURATION);

    collector.register_counter(&ASK_REQUESTS);
    collector.register_counter(&UPLOAD_REQUESTS);
    collector.register_counter(&VOICE_TO_TEXT_REQUESTS);
    collector.register_counter(&TEXT_TO_VOICE_REQUESTS);

    collector.register_counter(&SESSION_ALERTS);
    collector.register_counter(&SESSION_ANSWERS);
    collector.register_counter(&SESSION_SEND_FAILURES);
    collector.register_counter(&SESSION_ADMIN_UPLOADS);

    collector.register_counter(&DISPATCH_ACTIONS);
    collector.register_counter(&DISPATCH_FAILURES);
}
