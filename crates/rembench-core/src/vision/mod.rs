//! Vision-model integration for image analysis and quality scoring.
//!
//! Provides a provider abstraction over multiple vision backends
//! (Replicate-hosted LLaVA, Google Gemini, Anthropic), with the backend
//! selected via configuration.

pub(crate) mod anthropic;
pub(crate) mod gemini;
pub(crate) mod provider;
pub(crate) mod replicate;

pub use provider::{ImageRef, VisionProvider, VisionProviderFactory, VisionRequest};
