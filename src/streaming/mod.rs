//! Text generation module
//!
//! The `TextGenerator` interface, the Ollama streaming backend with its
//! incremental NDJSON parser, and a scripted backend for tests.

pub mod client;
pub mod generator;
pub mod parser;
pub mod scripted;

// Re-export commonly used types
pub use client::{OllamaClient, SamplingOptions, DEFAULT_MODEL, DEFAULT_OLLAMA_URL};
pub use generator::{
    find_stop, truncate_at_stop, StopScanner, TextGenerator, TokenSink,
    DEFAULT_STOP_SEQUENCES, OBSERVATION_STOP,
};
pub use parser::{GenerateChunk, JsonParser, MAX_BUFFER_SIZE};
pub use scripted::ScriptedGenerator;
