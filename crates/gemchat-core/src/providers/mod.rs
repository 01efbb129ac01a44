//! LLM provider implementations.

pub mod gemini;
pub mod shared;

pub use shared::{
    ChatModel, ChatRequest, FragmentStream, ProviderError, ProviderErrorKind, ProviderResult,
    resolve_api_key, resolve_base_url,
};
