//! Messaging client: one-shot background subscription and per-message dispatch.

use crate::messaging::inbound::InboundMessage;
use std::sync::OnceLock;

/// Handler invoked once per delivered background message.
pub type BackgroundHandler = Box<dyn Fn(InboundMessage) + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum MessagingError {
    #[error("a background message handler is already registered")]
    HandlerAlreadyRegistered,
}

/// Proof of a registered background subscription. There is no unregister:
/// the subscription lives for the worker context's lifetime.
#[derive(Debug)]
pub struct Subscription {
    _private: (),
}

/// Messaging client obtained from an initialized [`crate::messaging::App`].
/// Holds at most one background handler; the unregistered → registered
/// transition is one-way.
pub struct Messaging {
    handler: OnceLock<BackgroundHandler>,
}

impl std::fmt::Debug for Messaging {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Messaging")
            .field("handler_registered", &self.has_handler())
            .finish()
    }
}

impl Messaging {
    pub(crate) fn new() -> Self {
        Self {
            handler: OnceLock::new(),
        }
    }

    /// Register the background message handler. Fails once a handler is set.
    pub fn on_background_message(
        &self,
        handler: BackgroundHandler,
    ) -> Result<Subscription, MessagingError> {
        self.handler
            .set(handler)
            .map_err(|_| MessagingError::HandlerAlreadyRegistered)?;
        Ok(Subscription { _private: () })
    }

    /// True once a handler has been registered.
    pub fn has_handler(&self) -> bool {
        self.handler.get().is_some()
    }

    /// Deliver one message: invokes the handler exactly once with the payload
    /// as received. Before registration, deliveries are dropped (no handler
    /// means nothing to observe them).
    pub fn deliver(&self, msg: InboundMessage) {
        match self.handler.get() {
            Some(handler) => handler(msg),
            None => log::debug!("no background handler registered, dropping message"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    fn recording_handler() -> (BackgroundHandler, Arc<Mutex<Vec<InboundMessage>>>) {
        let records = Arc::new(Mutex::new(Vec::new()));
        let sink = records.clone();
        let handler: BackgroundHandler = Box::new(move |msg| {
            sink.lock().expect("records lock").push(msg);
        });
        (handler, records)
    }

    #[test]
    fn one_record_per_delivery_in_order() {
        let messaging = Messaging::new();
        let (handler, records) = recording_handler();
        messaging.on_background_message(handler).expect("subscribe");

        for i in 0..5 {
            messaging.deliver(InboundMessage(json!({ "data": { "seq": i.to_string() } })));
        }

        let records = records.lock().expect("records lock");
        assert_eq!(records.len(), 5);
        for (i, rec) in records.iter().enumerate() {
            assert_eq!(
                rec.data().and_then(|d| d.get("seq")).and_then(|v| v.as_str()),
                Some(i.to_string().as_str())
            );
        }
    }

    #[test]
    fn record_is_the_payload_verbatim() {
        let messaging = Messaging::new();
        let (handler, records) = recording_handler();
        messaging.on_background_message(handler).expect("subscribe");

        let payload = json!({ "data": { "foo": "bar" } });
        messaging.deliver(InboundMessage(payload.clone()));

        let records = records.lock().expect("records lock");
        assert_eq!(records.as_slice(), &[InboundMessage(payload)]);
    }

    #[test]
    fn empty_payload_is_not_filtered() {
        let messaging = Messaging::new();
        let (handler, records) = recording_handler();
        messaging.on_background_message(handler).expect("subscribe");

        messaging.deliver(InboundMessage(json!({})));

        assert_eq!(records.lock().expect("records lock").len(), 1);
    }

    #[test]
    fn second_registration_is_rejected_and_first_keeps_receiving() {
        let messaging = Messaging::new();
        let (first, records) = recording_handler();
        messaging.on_background_message(first).expect("subscribe");

        let (second, other_records) = recording_handler();
        assert!(matches!(
            messaging.on_background_message(second),
            Err(MessagingError::HandlerAlreadyRegistered)
        ));

        messaging.deliver(InboundMessage(json!({ "data": { "k": "v" } })));
        assert_eq!(records.lock().expect("records lock").len(), 1);
        assert!(other_records.lock().expect("records lock").is_empty());
    }

    #[test]
    fn delivery_before_registration_is_dropped() {
        let messaging = Messaging::new();
        messaging.deliver(InboundMessage(json!({ "data": { "foo": "bar" } })));
        assert!(!messaging.has_handler());

        let (handler, records) = recording_handler();
        messaging.on_background_message(handler).expect("subscribe");
        assert!(records.lock().expect("records lock").is_empty());
    }
}
