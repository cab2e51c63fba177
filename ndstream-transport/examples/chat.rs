//! Stream a chat completion from a local Ollama server.
//!
//! Make sure Ollama is running locally and run:
//!   RUST_LOG=ndstream_transport=debug cargo run --example chat

use std::io::Write;

use ndstream_transport::{StreamTransport, TransportConfig};
use ndstream_types::{Callbacks, RequestOptions, StreamRequest};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let transport = StreamTransport::new(TransportConfig::default());
    let request = StreamRequest::new(
        RequestOptions::new("localhost", 11434).path("/api/chat"),
        serde_json::json!({
            "model": "llama3.2",
            "stream": true,
            "messages": [
                {"role": "user", "content": "Say hello in one sentence.", "language": "en"}
            ],
        }),
    );

    let mut callbacks = Callbacks::new(|event| {
        if let Some(text) = event
            .get("message")
            .and_then(|message| message.get("content"))
            .and_then(|content| content.as_str())
        {
            print!("{text}");
            let _ = std::io::stdout().flush();
        }
    })
    .on_error(|err| eprintln!("\nerror: {err}"))
    .on_end(|| println!());

    transport.execute(&request, &mut callbacks).await.into_result()?;
    Ok(())
}
