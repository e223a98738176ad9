use serde_json::Value;
use std::time::Duration;

use crate::config::ConnectionDescriptor;
use crate::errors::BridgeResult;
use crate::traits::interpreter::Interpreter;

/// IOPub side of the protocol library.
pub trait Publisher: Send + Sync {
    fn publish_execution_result(&self, execution_count: u32, data: Value, metadata: Value);

    fn publish_execution_error(&self, ename: &str, evalue: &str, traceback: Vec<String>);
}

/// The protocol library's event loop. `run` blocks until the loop ends.
pub trait ProtocolServer: Send {
    fn run(self: Box<Self>) -> BridgeResult<()>;
}

/// Builds a protocol server for a connection descriptor.
pub trait ProtocolFactory {
    fn connect(
        &self,
        descriptor: &ConnectionDescriptor,
        interpreter: Box<dyn Interpreter + Send>,
    ) -> BridgeResult<Box<dyn ProtocolServer>>;
}

/// What the foreground loop sees of the native handle.
pub trait KernelPort {
    /// Next queued wire message, waiting at most `timeout`.
    fn poll(&self, timeout: Duration) -> Option<String>;

    fn send_result(&self, execution_count: u32, payload: &str);

    fn send_error(&self, execution_count: u32, payload: &str);

    fn should_stop(&self) -> bool;
}

impl<P: KernelPort + ?Sized> KernelPort for &P {
    fn poll(&self, timeout: Duration) -> Option<String> {
        (**self).poll(timeout)
    }

    fn send_result(&self, execution_count: u32, payload: &str) {
        (**self).send_result(execution_count, payload)
    }

    fn send_error(&self, execution_count: u32, payload: &str) {
        (**self).send_error(execution_count, payload)
    }

    fn should_stop(&self) -> bool {
        (**self).should_stop()
    }
}
