//! LLM transport adapters: the window summarizer (OpenAI-compatible chat
//! completions, non-streaming) and the Ollama passthrough stream.

mod lines;
pub mod ollama;
pub mod summarizer;
pub mod traits;

pub use ollama::{OllamaChunk, OllamaClient};
pub use summarizer::OpenAiSummarizer;
pub use traits::{Summarizer, SummaryResult};
