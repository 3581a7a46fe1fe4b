//! Chat-style command handling: classify text, then run a registered operation.

pub mod executor;
pub mod registry;
pub mod router;

pub use executor::{CommandExecutor, CommandReply};
pub use registry::{Operation, OperationArgs, OperationOutput, OperationRegistry};
pub use router::{CommandRouter, Intent, RoutedCommand};
