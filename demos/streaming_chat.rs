//! Streaming chat completion, printing content deltas as they arrive.
//!
//! Run with:
//! ```bash
//! export DEEPSEEK_API_KEY="your-api-key"
//! cargo run --example streaming_chat
//! ```

use std::io::Write;

use deepseek_client::sse::{delta_content, parse_sse_line, SseLine};
use deepseek_client::{DeepSeekClient, GenerationOptions, Message};
use futures::StreamExt;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let client = DeepSeekClient::from_env()?;

    let messages = vec![
        Message::system("You are a poet."),
        Message::user("Write a haiku about Rust programming."),
    ];
    let options = GenerationOptions::new().with_stream(true).with_max_tokens(200);

    let Some(handle) = client.chat(&messages, options).await?.into_stream() else {
        return Ok(());
    };
    let handle = handle.error_for_status().await?;

    let mut lines = client.consume_stream(handle);
    while let Some(line) = lines.next().await {
        match parse_sse_line(&line?) {
            SseLine::Data(data) => {
                if let Some(content) = delta_content(data) {
                    print!("{}", content);
                    std::io::stdout().flush()?;
                }
            }
            SseLine::Done => break,
            SseLine::Comment(_) | SseLine::Other(_) => {}
        }
    }
    println!();

    Ok(())
}
