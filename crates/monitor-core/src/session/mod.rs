pub mod id;
pub mod transcript;
pub mod summary;

pub use id::SessionId;
pub use transcript::{Transcript, TranscriptEntry, Role};
pub use summary::ConversationSummary;
