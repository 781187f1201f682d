//! Skald LLM — an OpenAI-compatible chat-completion client.
//!
//! One client serves both external contracts: it chooses actions as a
//! `ReasoningService` and writes turn prose as a `ProseGenerator`.

#![warn(missing_docs)]

pub mod client;
pub mod config;
pub mod prompt;
pub mod wire;

pub use client::ChatCompletionClient;
pub use config::LlmConfig;
