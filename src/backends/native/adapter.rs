// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Interpreter adapter for the native topology.
//!
//! The protocol thread calls [`QueueingInterpreter`]; it never evaluates
//! anything. Execute requests become queued wire messages plus a pending
//! reply. The foreground thread drains the queue through the kernel handle
//! and answers through [`AdapterShared::send_result`] /
//! [`AdapterShared::send_error`], which complete the matching pending reply.

use parking_lot::Mutex;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::backends::native::queue::MessageQueue;
use crate::config::KernelInfoConfig;
use crate::engine::PendingReply;
use crate::observability::messages::queue::{
    RepliesAbandoned, ReplyDelivered, RequestEnqueued, ShutdownRequested, UnmatchedReply,
};
use crate::observability::messages::StructuredLog;
use crate::protocol::replies::{
    create_complete_reply, create_info_reply, create_inspect_reply, create_is_complete_reply,
};
use crate::protocol::QueuedRequest;
use crate::traits::{ExecuteRequestConfig, Interpreter, KernelPort, Publisher, ReplyCallback};

/// State shared by the adapter (protocol thread) and the handle (foreground thread).
pub struct AdapterShared {
    queue: MessageQueue,
    pending: Mutex<VecDeque<PendingReply>>,
    publisher: Mutex<Option<Arc<dyn Publisher>>>,
    stop: AtomicBool,
    error_name: String,
}

impl AdapterShared {
    pub fn new(error_name: impl Into<String>) -> Self {
        Self {
            queue: MessageQueue::new(),
            pending: Mutex::new(VecDeque::new()),
            publisher: Mutex::new(None),
            stop: AtomicBool::new(false),
            error_name: error_name.into(),
        }
    }

    /// Next queued wire message, waiting at most `timeout`.
    pub fn poll(&self, timeout: Duration) -> Option<String> {
        self.queue.pop_timeout(timeout)
    }

    pub fn send_result(&self, execution_count: u32, payload: &str) {
        if let Some(pending) = self.take_pending(execution_count) {
            pending.succeed(self.publisher().as_deref(), payload);
            self.delivered(execution_count, "ok");
        }
    }

    pub fn send_error(&self, execution_count: u32, payload: &str) {
        if let Some(pending) = self.take_pending(execution_count) {
            pending.fail(self.publisher().as_deref(), &self.error_name, payload);
            self.delivered(execution_count, "error");
        }
    }

    /// Whether a shutdown request has been received.
    pub fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    pub fn pending_replies(&self) -> usize {
        self.pending.lock().len()
    }

    /// Drop every unanswered reply callback. The protocol library decides
    /// what an abandoned request looks like to its client.
    pub fn abandon_pending(&self) -> usize {
        let abandoned: Vec<PendingReply> = self.pending.lock().drain(..).collect();
        if !abandoned.is_empty() {
            RepliesAbandoned {
                count: abandoned.len(),
            }
            .log();
        }
        abandoned.len()
    }

    pub fn queued_messages(&self) -> usize {
        self.queue.len()
    }

    fn publisher(&self) -> Option<Arc<dyn Publisher>> {
        self.publisher.lock().clone()
    }

    // Oldest pending reply for `execution_count`. The lock is released
    // before the reply callback runs.
    fn take_pending(&self, execution_count: u32) -> Option<PendingReply> {
        let mut pending = self.pending.lock();
        let taken = pending
            .iter()
            .position(|p| p.execution_count == execution_count)
            .and_then(|index| pending.remove(index));
        if taken.is_none() {
            UnmatchedReply { execution_count }.log();
        }
        taken
    }

    fn delivered(&self, execution_count: u32, status: &str) {
        ReplyDelivered {
            execution_count,
            status,
            still_pending: self.pending_replies(),
        }
        .log();
    }

    fn enqueue(&self, request: &QueuedRequest) {
        let depth = self.queue.push(request.encode());
        RequestEnqueued {
            kind: request.kind(),
            depth,
        }
        .log();
    }
}

/// Port straight off the shared state. [`KernelHandle`] adds the protocol
/// thread's liveness on top of this.
///
/// [`KernelHandle`]: crate::backends::native::KernelHandle
impl KernelPort for AdapterShared {
    fn poll(&self, timeout: Duration) -> Option<String> {
        AdapterShared::poll(self, timeout)
    }

    fn send_result(&self, execution_count: u32, payload: &str) {
        AdapterShared::send_result(self, execution_count, payload);
    }

    fn send_error(&self, execution_count: u32, payload: &str) {
        AdapterShared::send_error(self, execution_count, payload);
    }

    fn should_stop(&self) -> bool {
        self.stop_requested()
    }
}

/// The interpreter handed to the protocol library in the native topology.
pub struct QueueingInterpreter {
    shared: Arc<AdapterShared>,
    kernel_info: KernelInfoConfig,
}

impl QueueingInterpreter {
    pub fn new(shared: Arc<AdapterShared>, kernel_info: KernelInfoConfig) -> Self {
        Self {
            shared,
            kernel_info,
        }
    }
}

impl Interpreter for QueueingInterpreter {
    fn register_publisher(&mut self, publisher: Arc<dyn Publisher>) {
        *self.shared.publisher.lock() = Some(publisher);
    }

    fn configure(&mut self) {
        tracing::debug!("Queueing interpreter ready");
    }

    fn execute_request(
        &mut self,
        reply: ReplyCallback,
        execution_count: u32,
        code: &str,
        config: ExecuteRequestConfig,
        _user_expressions: Value,
    ) {
        // Register the reply before the request becomes visible to the
        // foreground thread.
        self.shared
            .pending
            .lock()
            .push_back(PendingReply::new(execution_count, config.silent, reply));

        self.shared.enqueue(&QueuedRequest::Execute {
            code: code.to_string(),
            execution_count,
        });
    }

    fn complete_request(&mut self, _code: &str, cursor_pos: usize) -> Value {
        create_complete_reply(Vec::new(), cursor_pos, cursor_pos)
    }

    fn inspect_request(&mut self, _code: &str, _cursor_pos: usize, _detail_level: u8) -> Value {
        create_inspect_reply(false)
    }

    fn is_complete_request(&mut self, _code: &str) -> Value {
        create_is_complete_reply("complete", "")
    }

    fn kernel_info_request(&mut self) -> Value {
        create_info_reply(&self.kernel_info)
    }

    fn shutdown_request(&mut self) {
        ShutdownRequested {
            pending_replies: self.shared.pending_replies(),
        }
        .log();
        self.shared.stop.store(true, Ordering::SeqCst);
        self.shared.enqueue(&QueuedRequest::Shutdown);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn adapter() -> (QueueingInterpreter, Arc<AdapterShared>) {
        let shared = Arc::new(AdapterShared::new("LeanError"));
        let interpreter = QueueingInterpreter::new(Arc::clone(&shared), KernelInfoConfig::default());
        (interpreter, shared)
    }

    fn recorder() -> (Arc<Mutex<Vec<Value>>>, impl Fn() -> ReplyCallback) {
        let replies = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&replies);
        let make = move || -> ReplyCallback {
            let sink = Arc::clone(&sink);
            Box::new(move |reply| sink.lock().push(reply))
        };
        (replies, make)
    }

    #[test]
    fn execute_only_enqueues() {
        let (mut interpreter, shared) = adapter();
        let (replies, reply) = recorder();

        interpreter.execute_request(reply(), 1, "def x := 42", ExecuteRequestConfig::default(), json!({}));

        assert!(replies.lock().is_empty());
        assert_eq!(shared.pending_replies(), 1);
        let raw = shared.poll(Duration::ZERO).unwrap();
        assert_eq!(
            QueuedRequest::decode(&raw),
            QueuedRequest::Execute {
                code: "def x := 42".to_string(),
                execution_count: 1
            }
        );
    }

    #[test]
    fn each_request_gets_its_own_reply() {
        let (mut interpreter, shared) = adapter();
        let (replies, reply) = recorder();

        interpreter.execute_request(reply(), 1, "a", ExecuteRequestConfig::default(), json!({}));
        interpreter.execute_request(reply(), 2, "b", ExecuteRequestConfig::default(), json!({}));

        shared.send_result(1, "first");
        shared.send_error(2, "second");

        let replies = replies.lock();
        assert_eq!(replies.len(), 2);
        assert_eq!(replies[0]["status"], "ok");
        assert_eq!(replies[1]["status"], "error");
        assert_eq!(replies[1]["ename"], "LeanError");
        assert_eq!(shared.pending_replies(), 0);
    }

    #[test]
    fn second_delivery_for_same_count_is_dropped() {
        let (mut interpreter, shared) = adapter();
        let (replies, reply) = recorder();

        interpreter.execute_request(reply(), 7, "x", ExecuteRequestConfig::default(), json!({}));
        shared.send_result(7, "");
        shared.send_error(7, "late");

        assert_eq!(replies.lock().len(), 1);
    }

    #[test]
    fn unknown_count_is_dropped() {
        let (_interpreter, shared) = adapter();
        shared.send_result(99, "nobody asked");
        assert_eq!(shared.pending_replies(), 0);
    }

    #[test]
    fn shutdown_sets_flag_and_queues_behind_pending_work() {
        let (mut interpreter, shared) = adapter();
        let (_replies, reply) = recorder();

        interpreter.execute_request(reply(), 1, "a", ExecuteRequestConfig::default(), json!({}));
        assert!(!shared.stop_requested());
        interpreter.shutdown_request();

        assert!(shared.stop_requested());
        assert_eq!(shared.queued_messages(), 2);
        let first = shared.poll(Duration::ZERO).unwrap();
        let second = shared.poll(Duration::ZERO).unwrap();
        assert!(matches!(QueuedRequest::decode(&first), QueuedRequest::Execute { .. }));
        assert_eq!(QueuedRequest::decode(&second), QueuedRequest::Shutdown);
    }

    #[test]
    fn abandoning_drops_callbacks_without_calling_them() {
        let (mut interpreter, shared) = adapter();
        let (replies, reply) = recorder();

        interpreter.execute_request(reply(), 1, "a", ExecuteRequestConfig::default(), json!({}));
        interpreter.execute_request(reply(), 2, "b", ExecuteRequestConfig::default(), json!({}));

        assert_eq!(shared.abandon_pending(), 2);
        assert_eq!(shared.pending_replies(), 0);
        assert!(replies.lock().is_empty());

        shared.send_result(1, "too late");
        assert!(replies.lock().is_empty());
    }

    #[test]
    fn placeholder_replies() {
        let (mut interpreter, _shared) = adapter();

        let complete = interpreter.complete_request("Nat.su", 6);
        assert_eq!(complete["matches"], json!([]));
        assert_eq!(complete["cursor_start"], 6);
        assert_eq!(complete["cursor_end"], 6);

        assert_eq!(interpreter.inspect_request("Nat", 1, 0)["found"], false);
        assert_eq!(interpreter.is_complete_request("def f :=")["status"], "complete");
        assert_eq!(
            interpreter.kernel_info_request()["implementation"],
            "xlean"
        );
    }
}
