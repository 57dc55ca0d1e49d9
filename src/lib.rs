//! faqmatch - a threshold-gated FAQ answering engine for flat Q&A files.
//!
//! faqmatch loads a directory of plain-text FAQ files (`Q:`/`A:` blocks, one
//! file per category), matches incoming questions against them with a
//! token-overlap relevance score, and accepts or rejects the best match
//! against a configurable threshold. Every decision carries a deterministic
//! reasoning trace. The engine is exposed over MCP (stdio) for desktop AI
//! hosts and through a one-shot CLI.
//!
//! # Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use faqmatch::{AnswerEngine, AnswerStatus, ContentStore};
//!
//! let store = Arc::new(ContentStore::open("./faq".as_ref()).unwrap());
//! let engine = AnswerEngine::new(store);
//!
//! let result = engine.answer("What payment methods do you accept?");
//! match result.status {
//!     AnswerStatus::Success => println!("{}", result.answer.unwrap()),
//!     _ => println!("{}", result.reasoning),
//! }
//! ```

pub mod analytics_db;
pub mod cli;
pub mod content;
pub mod data_dir;
pub mod engine;
pub mod error;
pub mod matching;
pub mod mcp;
pub mod reasoning;
pub mod scoring;
pub mod tokenize;

pub use analytics_db::AnalyticsDb;
pub use content::{ContentSnapshot, ContentStore, FaqFile, LoadReport, QaEntry};
pub use data_dir::DataDir;
pub use engine::{AnswerEngine, AnswerResult, AnswerStatus, InteractionRecord};
pub use error::{Error, Result};
pub use reasoning::{ReasoningStrategy, TemplateReasoner};
