pub mod traits;
pub mod prompts;
pub mod providers;
pub mod extractors;
pub mod summarizer;
pub mod skills;

pub use traits::TextModel;
pub use summarizer::GeminiSummarizer;
pub use skills::SkillGenerator;

// Re-export providers
pub use providers::mock::MockModel;

// Re-export extractors
pub use extractors::json::{parse_summary, strip_json_fences, strip_markdown_fences};
