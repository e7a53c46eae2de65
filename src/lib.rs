//! # Docs Copilot
//!
//! A retrieval-augmented question answering CLI for Markdown
//! documentation.
//!
//! Docs Copilot scans a directory of Markdown files, splits them into
//! heading-bounded chunks, embeds the chunks into a persisted vector
//! index, and answers questions in an interactive loop grounded in the
//! retrieved chunks.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────┐   ┌───────────┐   ┌──────────────┐
//! │  Corpus  │──▶│ Markdown │──▶│  Vector    │──▶│ Answer loop  │
//! │  scanner │   │ chunker  │   │  index     │   │ (RAG prompt) │
//! └──────────┘   └──────────┘   └───────────┘   └──────────────┘
//!                                    ▲                 ▲
//!                              embeddings API      chat API
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! dcp index                     # build the vector index
//! dcp ask                       # interactive question loop
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`scan`] | Recursive corpus scanner |
//! | [`chunker`] | Markdown heading splitter |
//! | [`embedding`] | Embedding provider abstraction |
//! | [`chat`] | Chat-completion provider abstraction |
//! | [`rank`] | MMR diversity selection |
//! | [`store`] | Persisted vector index |
//! | [`index_cmd`] | Full-rebuild indexing orchestrator |
//! | [`ask_cmd`] | Interactive answer loop |
//! | [`prompt`] | Answer-grounding prompt template |

pub mod ask_cmd;
pub mod chat;
pub mod chunker;
pub mod config;
pub mod embedding;
pub mod index_cmd;
pub mod models;
pub mod prompt;
pub mod rank;
pub mod scan;
pub mod store;

#[cfg(test)]
mod testutil;
