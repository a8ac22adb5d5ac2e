//! Language-model collaborator for clinic appointment booking.
//!
//! This crate owns the boundary to the conversational model: the
//! [`LanguageModel`] trait, the prompts that carry the clinic context, and the
//! strict line-oriented parser that turns a model reply into typed fields.
//! An OpenAI-compatible chat-completions client is available behind the
//! `http-client` feature.

pub mod client;
pub mod extraction;
#[cfg(feature = "http-client")]
pub mod http;
pub mod prompts;

pub use client::*;
pub use extraction::*;
#[cfg(feature = "http-client")]
pub use http::*;
pub use prompts::*;
