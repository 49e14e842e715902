//! StoreDesk daemon library - exposes the pipeline modules for the binary and tests.

pub mod config;
pub mod dispatcher;
pub mod fakes;
pub mod ollama;
pub mod orchestrator;
pub mod prompts;
pub mod rag_answerer;
pub mod router;
pub mod services;
pub mod shaping;
pub mod tools;
pub mod translator;
pub mod vector_store;
