// ============================================================================
// TRANSCRIPT SERVICES
// ============================================================================
pub mod transcript_service;

pub use transcript_service::{FetchSettings, TranscriptService};
