//! # GenWeb Core
//!
//! Domain types, traits, and error definitions for the GenWeb relay.
//! This crate has **no HTTP or framework dependencies**. It defines the domain
//! model that the config, provider, and gateway crates implement against.
//!
//! ## Contents
//!
//! - [`agent`]: brand/site prompt fragments for a named agent
//! - [`prompt`]: composition of the final generation prompt
//! - [`provider`]: the streaming text-generation provider trait
//! - [`extract`]: incremental extraction of the fenced HTML block

pub mod agent;
pub mod error;
pub mod extract;
pub mod prompt;
pub mod provider;

// Re-export key types at crate root for ergonomics
pub use agent::AgentConfig;
pub use error::ProviderError;
pub use extract::{ExtractionOutcome, ExtractorState, HtmlBlockExtractor};
pub use prompt::compose;
pub use provider::{FragmentReceiver, GenerationRequest, GenerationStream, Provider};
