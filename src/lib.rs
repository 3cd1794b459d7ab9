//! # Quarry
//!
//! A local-first document question answering pipeline.
//!
//! Quarry ingests text-bearing documents (`.pdf`, `.txt`, `.md`), splits
//! them into overlapping sentence-aware chunks, embeds the chunks via a
//! local Ollama-compatible service, stores the vectors in SQLite, and
//! answers natural-language questions grounded in the retrieved chunks,
//! with per-source citations.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────────────────┐   ┌──────────┐
//! │  Files   │──▶│  Pipeline             │──▶│  SQLite   │
//! │ pdf/txt/ │   │ Extract+Chunk+Embed  │   │ vectors  │
//! │   md     │   └──────────────────────┘   └────┬─────┘
//! └──────────┘                                   │
//!                 ┌──────────────────────┐       │
//!   question ────▶│  Pipeline             │◀──────┘
//!                 │ Retrieve+Prompt+Chat │──▶ answer + sources
//!                 └──────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! quarry ingest --folder docs        # chunk + embed + index documents
//! quarry ask "How is auth handled?"  # grounded answer with citations
//! quarry stats                       # what's indexed
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`extract`] | Extension-dispatched text extraction |
//! | [`chunk`] | Sentence-aware chunking with overlap |
//! | [`embedding`] | Embedding service client and vector helpers |
//! | [`store`] | SQLite-backed vector store adapter |
//! | [`prompt`] | Grounded prompt construction |
//! | [`llm`] | Streaming chat-completion client |
//! | [`pipeline`] | Ingestion and retrieval orchestration |
//! | [`error`] | Typed pipeline errors |
//! | [`stats`] | Index statistics |

pub mod chunk;
pub mod config;
pub mod embedding;
pub mod error;
pub mod extract;
pub mod llm;
pub mod models;
pub mod pipeline;
pub mod prompt;
pub mod stats;
pub mod store;
