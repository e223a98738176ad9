// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The cross-runtime kernel handle.
//!
//! One `KernelHandle` owns everything the native topology needs: the
//! protocol thread running the protocol library's event loop, and the
//! shared queue/adapter state. The protocol library owns the adapter
//! itself; the handle keeps only a reference-counted view of its shared
//! state.
//!
//! There is no explicit destroy. Dropping the handle is the finalizer: it
//! joins the protocol thread, then releases the shared state. Across the C
//! ABI the embedding runtime's garbage collector triggers that drop through
//! [`xlean_kernel_finalize`](crate::backends::native::ffi::xlean_kernel_finalize).

use std::path::Path;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::backends::native::adapter::{AdapterShared, QueueingInterpreter};
use crate::config::{load_connection, BridgeConfig};
use crate::errors::{BridgeError, BridgeResult};
use crate::observability::messages::kernel::{
    KernelCreateFailed, KernelFinalized, ProtocolThreadStarted, ProtocolThreadStopped,
};
use crate::observability::messages::StructuredLog;
use crate::traits::{KernelPort, ProtocolFactory};

const PROTOCOL_THREAD_NAME: &str = "xlean-protocol";

pub struct KernelHandle {
    shared: Arc<AdapterShared>,
    protocol_thread: Option<JoinHandle<()>>,
}

impl KernelHandle {
    /// Build a handle from a connection file. Failures are logged and
    /// reported as `None`.
    pub fn create(
        connection_path: &Path,
        factory: &dyn ProtocolFactory,
        config: &BridgeConfig,
    ) -> Option<Self> {
        match Self::try_create(connection_path, factory, config) {
            Ok(handle) => Some(handle),
            Err(error) => {
                KernelCreateFailed {
                    connection_path: &connection_path.display().to_string(),
                    error: &error,
                }
                .log();
                None
            }
        }
    }

    /// Like [`create`](Self::create), but keeps the error.
    ///
    /// Spawns exactly one protocol thread, then pauses for
    /// `config.startup_wait()` so the server can begin listening. Nothing
    /// depends on that pause for correctness: requests that arrive later are
    /// queued the same way.
    pub fn try_create(
        connection_path: &Path,
        factory: &dyn ProtocolFactory,
        config: &BridgeConfig,
    ) -> BridgeResult<Self> {
        let descriptor = load_connection(connection_path)?;
        let shared = Arc::new(AdapterShared::new(config.error_name.clone()));
        let interpreter =
            QueueingInterpreter::new(Arc::clone(&shared), config.kernel_info.clone());
        let server = factory.connect(&descriptor, Box::new(interpreter))?;

        let protocol_thread = thread::Builder::new()
            .name(PROTOCOL_THREAD_NAME.to_string())
            .spawn(move || {
                let result = server.run();
                ProtocolThreadStopped {
                    error: result
                        .as_ref()
                        .err()
                        .map(|e| e as &dyn std::error::Error),
                }
                .log();
            })
            .map_err(BridgeError::ThreadSpawn)?;

        ProtocolThreadStarted {
            connection_path: &connection_path.display().to_string(),
            transport: &descriptor.transport,
        }
        .log();

        thread::sleep(config.startup_wait());

        Ok(Self {
            shared,
            protocol_thread: Some(protocol_thread),
        })
    }

    /// Whether the protocol thread has returned.
    pub fn protocol_finished(&self) -> bool {
        self.protocol_thread
            .as_ref()
            .map_or(true, |thread| thread.is_finished())
    }

    pub fn pending_replies(&self) -> usize {
        self.shared.pending_replies()
    }
}

impl KernelPort for KernelHandle {
    fn poll(&self, timeout: Duration) -> Option<String> {
        self.shared.poll(timeout)
    }

    fn send_result(&self, execution_count: u32, payload: &str) {
        self.shared.send_result(execution_count, payload);
    }

    fn send_error(&self, execution_count: u32, payload: &str) {
        self.shared.send_error(execution_count, payload);
    }

    /// True once shutdown was requested or the protocol thread has exited.
    fn should_stop(&self) -> bool {
        self.shared.should_stop() || self.protocol_finished()
    }
}

impl Drop for KernelHandle {
    fn drop(&mut self) {
        // Nobody will answer these any more; releasing them lets the
        // protocol server finish its own shutdown.
        self.shared.abandon_pending();
        let protocol_thread_joined = match self.protocol_thread.take() {
            Some(thread) => thread.join().is_ok(),
            None => true,
        };
        KernelFinalized {
            protocol_thread_joined,
        }
        .log();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::stub::{ScriptedProtocolFactory, ServerStep};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn connection_file(transport: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"transport": "{transport}"}}"#).unwrap();
        file
    }

    fn quick_config() -> BridgeConfig {
        BridgeConfig {
            startup_wait_ms: 0,
            poll_timeout_ms: 10,
            ..BridgeConfig::default()
        }
    }

    #[test]
    fn missing_connection_file_yields_none() {
        let factory = ScriptedProtocolFactory::new(vec![]);
        let handle = KernelHandle::create(
            Path::new("/nonexistent/kernel.json"),
            &factory,
            &quick_config(),
        );
        assert!(handle.is_none());
    }

    #[test]
    fn factory_rejection_yields_error() {
        let file = connection_file("tcp");
        let factory = ScriptedProtocolFactory::new(vec![]).accepting("stdio");

        let err = KernelHandle::try_create(file.path(), &factory, &quick_config())
            .err()
            .unwrap();
        assert!(matches!(err, BridgeError::UnsupportedTransport(t) if t == "tcp"));
    }

    #[test]
    fn requests_reach_the_queue_and_replies_reach_the_server() {
        let file = connection_file("stdio");
        let factory = ScriptedProtocolFactory::new(vec![
            ServerStep::execute("def x := 42"),
            ServerStep::WaitForReplies(1),
        ]);
        let replies = factory.replies();

        let handle = KernelHandle::try_create(file.path(), &factory, &quick_config()).unwrap();

        let raw = handle.poll(Duration::from_secs(5)).unwrap();
        assert!(raw.contains("def x := 42"));
        assert!(!handle.should_stop());
        handle.send_result(1, "");

        drop(handle);
        let replies = replies.lock().unwrap();
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].execution_count, 1);
        assert_eq!(replies[0].content["status"], "ok");
    }

    #[test]
    fn finished_protocol_thread_means_stop() {
        let file = connection_file("stdio");
        let factory = ScriptedProtocolFactory::new(vec![]);

        let handle = KernelHandle::try_create(file.path(), &factory, &quick_config()).unwrap();
        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while !handle.protocol_finished() && std::time::Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }

        assert!(handle.should_stop());
        assert_eq!(handle.poll(Duration::ZERO), None);
    }
}
