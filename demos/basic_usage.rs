//! Basic chat completion.
//!
//! Run with:
//! ```bash
//! export DEEPSEEK_API_KEY="your-api-key"
//! RUST_LOG=deepseek_client=debug cargo run --example basic_usage
//! ```

use deepseek_client::{ClientError, DeepSeekClient, GenerationOptions, Message};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let client = DeepSeekClient::from_env()?;

    println!("Available models:");
    for model in client.list_models().await? {
        println!("  {}", model["id"].as_str().unwrap_or("?"));
    }

    let messages = vec![Message::user("Explain quantum computing in simple terms")];
    let options = GenerationOptions::new()
        .with_model("deepseek-chat")
        .with_temperature(0.7)
        .with_max_tokens(100);

    match client.chat(&messages, options).await {
        Ok(completion) => {
            let Some(envelope) = completion.into_envelope() else {
                return Ok(());
            };
            let content = envelope
                .get("choices")
                .and_then(|choices| choices.pointer("/0/message/content"))
                .and_then(|content| content.as_str())
                .unwrap_or_default();
            println!("\nResponse: {}", content);
        }
        Err(ClientError::Api { status, code, message }) => {
            eprintln!("\nServer rejected the request ({} {}): {}", status, code, message);
        }
        Err(e) => {
            eprintln!("\nError: {}", e);
            return Err(e.into());
        }
    }

    Ok(())
}
