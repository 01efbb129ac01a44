//! Gemini API key provider (Generative Language API).

pub mod api;
mod sse;

pub use api::{GeminiClient, GeminiConfig};
