//! Tooling layer: discovery of external tool executables, the registry the
//! model sees, and the invoker that runs calls under the safety policy.

mod discovery;
mod error;
mod interface;
mod invoker;
mod policy;
mod process;
mod registry;

pub use discovery::{FolderDiscovery, ToolDiscovery, register_discovered};
pub use error::ToolError;
pub use interface::{Tool, ToolDescriptor, ToolExecution};
pub use invoker::{CANCELLED_REASON, Invocation, ToolInvoker};
pub use policy::{is_destructive, is_privileged};
pub use process::{ProcessTool, TIMEOUT_EXIT_CODE};
pub use registry::ToolRegistry;
