//! # deepseek-client
//!
//! An async Rust client for the DeepSeek LLM HTTP API.
//!
//! ## Features
//! - Text completion (`generate`), chat completion (`chat`) and model listing
//! - Uniform API errors: `API Error <status> (<code>): <message>`
//! - Streaming responses as a pull-based stream of raw text lines
//! - Provider-specific request fields passed through untouched
//!
//! ## Example
//! ```no_run
//! use deepseek_client::{DeepSeekClient, GenerationOptions, Message};
//! use futures::StreamExt;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Reads DEEPSEEK_API_KEY
//!     let client = DeepSeekClient::from_env()?;
//!
//!     let messages = vec![Message::user("Hello!")];
//!     let reply = client.chat(&messages, GenerationOptions::new()).await?;
//!     println!("{:?}", reply.into_envelope());
//!
//!     let streaming = client
//!         .chat(&messages, GenerationOptions::new().with_stream(true))
//!         .await?;
//!     if let Some(handle) = streaming.into_stream() {
//!         let mut lines = client.consume_stream(handle);
//!         while let Some(line) = lines.next().await {
//!             println!("{}", line?);
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod http;
pub mod model;
pub mod options;
pub mod sse;
pub mod stream;

// Re-exports for convenience
pub use client::{ClientError, Completion, DeepSeekClient};
pub use model::{Envelope, Message, ModelDescriptor, Role};
pub use options::{ClientOptions, GenerationOptions};
pub use stream::{LineStream, StreamHandle};
