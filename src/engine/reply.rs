// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde_json::json;

use crate::protocol::replies::{create_error_reply, create_successful_reply};
use crate::traits::{Publisher, ReplyCallback};

/// An execute request waiting for its outcome.
///
/// Consumed by [`succeed`](Self::succeed) or [`fail`](Self::fail), so each
/// request is answered once.
pub struct PendingReply {
    pub execution_count: u32,
    pub silent: bool,
    callback: ReplyCallback,
}

impl PendingReply {
    pub fn new(execution_count: u32, silent: bool, callback: ReplyCallback) -> Self {
        Self {
            execution_count,
            silent,
            callback,
        }
    }

    /// Publish `payload` as a `text/plain` result (unless silent or empty),
    /// then send the successful reply.
    pub fn succeed(self, publisher: Option<&dyn Publisher>, payload: &str) {
        if let Some(publisher) = publisher {
            if !self.silent && !payload.is_empty() {
                publisher.publish_execution_result(
                    self.execution_count,
                    json!({ "text/plain": payload }),
                    json!({}),
                );
            }
        }
        (self.callback)(create_successful_reply());
    }

    /// Publish `payload` as an execution error, then send the error reply.
    pub fn fail(self, publisher: Option<&dyn Publisher>, error_name: &str, payload: &str) {
        if let Some(publisher) = publisher {
            if !self.silent {
                publisher.publish_execution_error(error_name, payload, vec![payload.to_string()]);
            }
        }
        (self.callback)(create_error_reply(payload, error_name, vec![]));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct RecordingPublisher {
        events: Mutex<Vec<Value>>,
    }

    impl Publisher for RecordingPublisher {
        fn publish_execution_result(&self, execution_count: u32, data: Value, _metadata: Value) {
            self.events
                .lock()
                .unwrap()
                .push(json!({ "result": execution_count, "data": data }));
        }

        fn publish_execution_error(&self, ename: &str, evalue: &str, traceback: Vec<String>) {
            self.events
                .lock()
                .unwrap()
                .push(json!({ "ename": ename, "evalue": evalue, "traceback": traceback }));
        }
    }

    fn capture() -> (ReplyCallback, Arc<Mutex<Vec<Value>>>) {
        let replies = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&replies);
        let callback: ReplyCallback = Box::new(move |reply| sink.lock().unwrap().push(reply));
        (callback, replies)
    }

    #[test]
    fn success_publishes_plain_text() {
        let publisher = RecordingPublisher::default();
        let (callback, replies) = capture();

        PendingReply::new(2, false, callback).succeed(Some(&publisher), "43");

        let events = publisher.events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0]["result"], 2);
        assert_eq!(events[0]["data"]["text/plain"], "43");
        assert_eq!(replies.lock().unwrap()[0]["status"], "ok");
    }

    #[test]
    fn empty_success_publishes_nothing() {
        let publisher = RecordingPublisher::default();
        let (callback, replies) = capture();

        PendingReply::new(1, false, callback).succeed(Some(&publisher), "");

        assert!(publisher.events.lock().unwrap().is_empty());
        assert_eq!(replies.lock().unwrap().len(), 1);
    }

    #[test]
    fn silent_success_still_replies() {
        let publisher = RecordingPublisher::default();
        let (callback, replies) = capture();

        PendingReply::new(1, true, callback).succeed(Some(&publisher), "43");

        assert!(publisher.events.lock().unwrap().is_empty());
        assert_eq!(replies.lock().unwrap()[0]["status"], "ok");
    }

    #[test]
    fn failure_publishes_error_and_replies_with_error() {
        let publisher = RecordingPublisher::default();
        let (callback, replies) = capture();
        let payload = r#"{"messages":[{"severity":"error","data":"unknown identifier 'y'"}]}"#;

        PendingReply::new(3, false, callback).fail(Some(&publisher), "LeanError", payload);

        let events = publisher.events.lock().unwrap();
        assert_eq!(events[0]["ename"], "LeanError");
        assert_eq!(events[0]["evalue"], payload);
        assert_eq!(events[0]["traceback"][0], payload);

        let replies = replies.lock().unwrap();
        assert_eq!(replies[0]["status"], "error");
        assert_eq!(replies[0]["ename"], "LeanError");
        assert_eq!(replies[0]["evalue"], payload);
    }

    #[test]
    fn reply_without_publisher() {
        let (callback, replies) = capture();
        PendingReply::new(1, false, callback).fail(None, "LeanError", "boom");
        assert_eq!(replies.lock().unwrap()[0]["status"], "error");
    }
}
