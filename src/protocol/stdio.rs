// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Line-delimited JSON reference transport.
//!
//! The real notebook wire protocol (framing, signing, sockets, heartbeat)
//! belongs to the protocol library. This transport speaks the same message
//! types over one JSON object per line so the bridge can be driven end to
//! end from a pipe:
//!
//! ```text
//! > {"msg_type": "execute_request", "msg_id": "a1", "content": {"code": "#eval 1 + 1"}}
//! < {"msg_type": "execute_result", "content": {"execution_count": 1, "data": {"text/plain": "2"}, "metadata": {}}}
//! < {"msg_type": "execute_reply", "parent_msg_id": "a1", "content": {"status": "ok", "execution_count": 1, ...}}
//! ```
//!
//! The server runs on whatever thread calls [`ProtocolServer::run`], inside
//! its own current-thread tokio runtime. Publications and replies may come
//! from any thread; they are funnelled through an unbounded channel and
//! written by the server loop.

use serde::Deserialize;
use serde_json::{json, Value};
use std::io;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio_util::sync::CancellationToken;

use crate::config::consts::STDIO_TRANSPORT;
use crate::config::ConnectionDescriptor;
use crate::errors::{BridgeError, BridgeResult};
use crate::observability::messages::kernel::{RequestIgnored, TransportStopped};
use crate::observability::messages::StructuredLog;
use crate::protocol::replies::create_successful_reply;
use crate::traits::{
    ExecuteRequestConfig, Interpreter, ProtocolFactory, ProtocolServer, Publisher, ReplyCallback,
};

#[derive(Debug, Deserialize)]
struct InboundFrame {
    msg_type: String,
    #[serde(default)]
    msg_id: Option<String>,
    #[serde(default)]
    content: Value,
}

fn outbound_frame(msg_type: &str, parent: Option<&str>, content: Value) -> Value {
    let mut frame = json!({ "msg_type": msg_type, "content": content });
    if let Some(parent) = parent {
        frame["parent_msg_id"] = Value::String(parent.to_string());
    }
    frame
}

/// Publisher that forwards IOPub messages to the server loop.
struct ChannelPublisher {
    outbound: UnboundedSender<Value>,
}

impl Publisher for ChannelPublisher {
    fn publish_execution_result(&self, execution_count: u32, data: Value, metadata: Value) {
        let content = json!({
            "execution_count": execution_count,
            "data": data,
            "metadata": metadata,
        });
        let _ = self
            .outbound
            .send(outbound_frame("execute_result", None, content));
    }

    fn publish_execution_error(&self, ename: &str, evalue: &str, traceback: Vec<String>) {
        let content = json!({
            "ename": ename,
            "evalue": evalue,
            "traceback": traceback,
        });
        let _ = self.outbound.send(outbound_frame("error", None, content));
    }
}

/// Sends the `execute_reply` for one request, exactly once.
///
/// Dropping the slot unanswered sends an `abort` reply instead, so every
/// issued execute request produces one reply frame.
struct ReplySlot {
    outbound: UnboundedSender<Value>,
    parent_id: Option<String>,
    execution_count: u32,
    answered: bool,
}

impl ReplySlot {
    fn deliver(&mut self, mut reply: Value) {
        if !reply.is_object() {
            reply = create_successful_reply();
        }
        reply["execution_count"] = json!(self.execution_count);
        self.answered = true;
        let _ = self.outbound.send(outbound_frame(
            EXECUTE_REPLY,
            self.parent_id.as_deref(),
            reply,
        ));
    }
}

impl Drop for ReplySlot {
    fn drop(&mut self) {
        if !self.answered {
            RequestIgnored {
                msg_type: "execute_request",
                reason: "reply abandoned before evaluation finished",
            }
            .log();
            self.deliver(json!({ "status": "abort" }));
        }
    }
}

const EXECUTE_REPLY: &str = "execute_reply";

/// Request dispatch state, separate from the I/O halves.
struct Dispatcher<I> {
    interpreter: I,
    outbound: UnboundedSender<Value>,
    shutdown: CancellationToken,
    execution_count: u32,
    /// Execute requests handed to the interpreter so far.
    issued: usize,
}

impl<I: Interpreter> Dispatcher<I> {
    fn dispatch(&mut self, line: &str) {
        let frame: InboundFrame = match serde_json::from_str(line) {
            Ok(frame) => frame,
            Err(e) => {
                RequestIgnored {
                    msg_type: "<malformed>",
                    reason: &e.to_string(),
                }
                .log();
                return;
            }
        };
        let parent = frame.msg_id.as_deref();
        let content = &frame.content;

        match frame.msg_type.as_str() {
            "execute_request" => self.execute(parent, content),
            "kernel_info_request" => {
                let reply = self.interpreter.kernel_info_request();
                self.send("kernel_info_reply", parent, reply);
            }
            "complete_request" => {
                let reply = self
                    .interpreter
                    .complete_request(str_field(content, "code"), usize_field(content, "cursor_pos"));
                self.send("complete_reply", parent, reply);
            }
            "inspect_request" => {
                let detail_level = content
                    .get("detail_level")
                    .and_then(Value::as_u64)
                    .unwrap_or(0) as u8;
                let reply = self.interpreter.inspect_request(
                    str_field(content, "code"),
                    usize_field(content, "cursor_pos"),
                    detail_level,
                );
                self.send("inspect_reply", parent, reply);
            }
            "is_complete_request" => {
                let reply = self
                    .interpreter
                    .is_complete_request(str_field(content, "code"));
                self.send("is_complete_reply", parent, reply);
            }
            "shutdown_request" => {
                self.interpreter.shutdown_request();
                let restart = content
                    .get("restart")
                    .and_then(Value::as_bool)
                    .unwrap_or(false);
                self.send(
                    "shutdown_reply",
                    parent,
                    json!({ "status": "ok", "restart": restart }),
                );
                self.shutdown.cancel();
            }
            other => {
                RequestIgnored {
                    msg_type: other,
                    reason: "unsupported message type",
                }
                .log();
            }
        }
    }

    fn execute(&mut self, parent: Option<&str>, content: &Value) {
        let config = ExecuteRequestConfig {
            silent: bool_field(content, "silent", false),
            store_history: bool_field(content, "store_history", true),
            allow_stdin: bool_field(content, "allow_stdin", false),
        };
        if !config.silent {
            self.execution_count += 1;
        }
        let execution_count = self.execution_count;

        let mut slot = ReplySlot {
            outbound: self.outbound.clone(),
            parent_id: parent.map(str::to_string),
            execution_count,
            answered: false,
        };
        let reply: ReplyCallback = Box::new(move |reply: Value| slot.deliver(reply));
        self.issued += 1;

        let user_expressions = content
            .get("user_expressions")
            .cloned()
            .unwrap_or_else(|| json!({}));

        self.interpreter.execute_request(
            reply,
            execution_count,
            str_field(content, "code"),
            config,
            user_expressions,
        );
    }

    fn send(&self, msg_type: &str, parent: Option<&str>, content: Value) {
        let _ = self.outbound.send(outbound_frame(msg_type, parent, content));
    }
}

fn str_field<'a>(content: &'a Value, key: &str) -> &'a str {
    content.get(key).and_then(Value::as_str).unwrap_or("")
}

fn usize_field(content: &Value, key: &str) -> usize {
    content.get(key).and_then(Value::as_u64).unwrap_or(0) as usize
}

fn bool_field(content: &Value, key: &str, default: bool) -> bool {
    content.get(key).and_then(Value::as_bool).unwrap_or(default)
}

/// Write one frame. Returns 1 for an execute reply, else 0.
async fn write_frame<W: AsyncWrite + Unpin>(writer: &mut W, frame: &Value) -> io::Result<usize> {
    let mut line = frame.to_string();
    line.push('\n');
    writer.write_all(line.as_bytes()).await?;
    writer.flush().await?;
    Ok(usize::from(frame["msg_type"] == EXECUTE_REPLY))
}

/// Reference protocol server over any async line reader/writer pair.
pub struct StdioServer<I, R, W> {
    dispatcher: Dispatcher<I>,
    inbound: R,
    writer: W,
    outbound_rx: UnboundedReceiver<Value>,
}

impl<I, R, W> StdioServer<I, R, W>
where
    I: Interpreter,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Wire `interpreter` to this server: registers the publisher, then
    /// configures the interpreter.
    pub fn new(mut interpreter: I, inbound: R, writer: W) -> Self {
        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        interpreter.register_publisher(Arc::new(ChannelPublisher {
            outbound: outbound.clone(),
        }));
        interpreter.configure();

        Self {
            dispatcher: Dispatcher {
                interpreter,
                outbound,
                shutdown: CancellationToken::new(),
                execution_count: 0,
                issued: 0,
            },
            inbound,
            writer,
            outbound_rx,
        }
    }

    /// Token that stops the loop when cancelled. Cancelled by a shutdown request.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.dispatcher.shutdown.clone()
    }

    /// Serve until input ends or shutdown is requested, then keep writing
    /// until every execute request handed out so far has its reply.
    /// Returns the writer.
    pub async fn serve(self) -> io::Result<W> {
        let StdioServer {
            mut dispatcher,
            inbound,
            mut writer,
            mut outbound_rx,
        } = self;
        let shutdown = dispatcher.shutdown.clone();
        let mut lines = inbound.lines();
        let mut replied = 0;

        let reason = loop {
            tokio::select! {
                biased;
                Some(frame) = outbound_rx.recv() => {
                    replied += write_frame(&mut writer, &frame).await?;
                }
                _ = shutdown.cancelled() => break "shutdown requested",
                line = lines.next_line() => match line? {
                    Some(line) if line.trim().is_empty() => {}
                    Some(line) => dispatcher.dispatch(&line),
                    None => break "input closed",
                },
            }
        };

        // Input is no longer read; replies still come from the interpreter.
        while replied < dispatcher.issued {
            match outbound_rx.recv().await {
                Some(frame) => replied += write_frame(&mut writer, &frame).await?,
                None => break,
            }
        }
        while let Ok(frame) = outbound_rx.try_recv() {
            write_frame(&mut writer, &frame).await?;
        }
        TransportStopped { reason }.log();
        Ok(writer)
    }
}

impl<I, R, W> ProtocolServer for StdioServer<I, R, W>
where
    I: Interpreter + Send + 'static,
    R: AsyncBufRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    fn run(self: Box<Self>) -> BridgeResult<()> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(BridgeError::Transport)?;
        runtime
            .block_on(self.serve())
            .map(|_| ())
            .map_err(BridgeError::Transport)
    }
}

/// Factory serving the `stdio` transport on the process's stdin/stdout.
pub struct StdioProtocolFactory;

impl ProtocolFactory for StdioProtocolFactory {
    fn connect(
        &self,
        descriptor: &ConnectionDescriptor,
        interpreter: Box<dyn Interpreter + Send>,
    ) -> BridgeResult<Box<dyn ProtocolServer>> {
        if descriptor.transport != STDIO_TRANSPORT {
            return Err(BridgeError::UnsupportedTransport(descriptor.transport.clone()));
        }
        Ok(Box::new(StdioServer::new(
            interpreter,
            BufReader::new(tokio::io::stdin()),
            tokio::io::stdout(),
        )))
    }
}
