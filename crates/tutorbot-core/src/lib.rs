//! # TutorBot Core
//!
//! Runtime-agnostic logic for TutorBot: data models, word-window chunking,
//! the embedder trait and cosine scorer, the document store abstraction,
//! top-K retrieval, and tutoring prompt assembly.
//!
//! This crate makes no network calls and depends on no async runtime.
//! Concrete embedding and chat providers live in the `tutorbot` app crate.

pub mod chunk;
pub mod embedding;
pub mod models;
pub mod prompt;
pub mod retrieve;
pub mod store;
