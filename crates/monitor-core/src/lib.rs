//! Processed-session tracking and the batch pass that summarizes new interview
//! sessions. Everything outside this crate plugs in through [`ports`].

pub mod monitor;
pub mod paths;
pub mod ports;
pub mod session;
pub mod state;
pub mod workflows;

pub use monitor::{panic_message, MonitorPorts, PassReport, SessionMonitor, SessionOutcome};
pub use session::{ConversationSummary, Role, SessionId, Transcript, TranscriptEntry};
pub use state::{PersistedState, ProcessedSet, StateBackend, StateTracker};

// In-crate fakes for tests and local demos
pub mod mocks;
