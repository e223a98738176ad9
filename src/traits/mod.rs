pub mod evaluator;
pub mod interpreter;
pub mod protocol;

pub use evaluator::Evaluator;
pub use interpreter::{ExecuteRequestConfig, Interpreter, ReplyCallback};
pub use protocol::{KernelPort, ProtocolFactory, ProtocolServer, Publisher};
