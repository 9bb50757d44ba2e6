pub mod fs;
pub mod gcs;
pub mod token;

pub use fs::FsBlobStore;
pub use gcs::GcsBlobStore;
pub use token::TokenSource;
