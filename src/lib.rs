//! # TutorBot
//!
//! A small retrieval-augmented tutoring assistant.
//!
//! Students paste study material, which is split into overlapping word
//! windows and embedded; questions are answered by retrieving the closest
//! chunks and handing them to a chat model with a fixed tutoring prompt.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌─────────────┐   ┌──────────────┐
//! │  /ingest │──▶│ Chunk+Embed │──▶│ InMemoryStore│
//! └──────────┘   └─────────────┘   └──────┬───────┘
//!                                         │ top-K cosine
//! ┌──────────┐   ┌─────────────┐   ┌──────▼───────┐
//! │  /chat   │──▶│  Retrieve   │──▶│ Prompt + Chat│
//! └──────────┘   └─────────────┘   └──────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration and API key lookup |
//! | [`models`] | Request/response bodies |
//! | [`embedding`] | OpenAI-compatible embedding client |
//! | [`chat`] | Chat gateway and OpenAI-compatible client |
//! | [`tutor`] | Ingest and ask orchestration |
//! | [`server`] | HTTP server |
//!
//! Chunking, scoring, storage, retrieval, and prompt assembly live in the
//! `tutorbot-core` crate.

pub mod chat;
pub mod config;
pub mod embedding;
pub mod models;
pub mod server;
pub mod tutor;
