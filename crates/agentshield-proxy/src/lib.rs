//! The two MCP transports AgentShield mediates (stdio and Streamable HTTP),
//! built on a shared message-handling core (see [`pipeline`]).

pub mod audit;
pub mod http;
pub mod message;
pub mod pipeline;
pub mod session;
pub mod stdio;

pub use audit::{now_rfc3339, AuditEntry, AuditSink, CallbackAuditSink, FileAuditSink, NullAuditSink};
pub use http::HttpProxy;
pub use pipeline::{process_incoming, process_outgoing};
pub use session::{SessionState, SharedSessionState};
pub use stdio::StdioProxy;
