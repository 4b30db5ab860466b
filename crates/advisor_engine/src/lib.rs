//! Guarded retrieval-augmented course recommendation engine.
//!
//! The pipeline: embed a student query, retrieve similar courses from the
//! vector index, classify confidence, inject the retrieved context into a
//! structured prompt, call the LLM gateway, parse and validate the output
//! against the catalog, and fall back to deterministic generic guidance
//! when confidence or validation fails.

pub mod context;
pub mod embedding;
pub mod fallback;
pub mod index;
pub mod llm;
pub mod parser;
pub mod pipeline;
pub mod prompt;
pub mod retriever;
pub mod store;
pub mod validator;

pub use embedding::{EmbeddingProvider, HttpEmbeddings};
pub use index::VectorIndex;
pub use llm::{HttpChatGateway, LlmGateway, ScriptedGateway};
pub use pipeline::AdvisorPipeline;
pub use retriever::Retriever;
pub use store::{CourseStore, JsonCourseStore};
pub use validator::{CourseValidator, OutputValidator};
