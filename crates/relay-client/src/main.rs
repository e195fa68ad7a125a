use anyhow::Result;
use clap::Parser;
use relay_client::{ChatPage, HttpStreamClient, MemoryDom, PageEvent, RouteOutcome, html_to_text};
use relay_common::{STREAM_ID_PREFIX, defaults};
use std::io::{self, Write};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for the Relay chat client
#[derive(Parser, Debug)]
#[command(name = "relay-chat", about = "Send a message to a relay server and print the streamed answer")]
struct Args {
    /// Base URL of the relay server
    #[clap(long, default_value = "http://127.0.0.1:3000")]
    url: String,

    /// Id of the element receiving new messages
    #[clap(long, default_value = defaults::DEFAULT_TARGET_ID)]
    target: String,

    /// Use the non-streaming endpoint
    #[clap(long)]
    no_stream: bool,

    /// Message to send, e.g. "/web-search"
    #[clap(required = true)]
    message: Vec<String>,
}

/// Print answer text as addressed frames replace it. Returns whether
/// anything was printed.
async fn print_answer(mut events: tokio::sync::broadcast::Receiver<PageEvent>) -> bool {
    let mut printed = String::new();
    let mut any = false;

    loop {
        match events.recv().await {
            Ok(PageEvent::FrameApplied {
                outcome: RouteOutcome::Replaced { id },
                content,
                ..
            }) if id.starts_with(STREAM_ID_PREFIX) => {
                let text = html_to_text(&content);
                let mut stdout = io::stdout();
                match text.strip_prefix(printed.as_str()) {
                    Some(rest) => {
                        let _ = write!(stdout, "{}", rest);
                    }
                    None => {
                        let _ = write!(stdout, "\n{}", text);
                    }
                }
                let _ = stdout.flush();
                printed = text;
                any = true;
            }
            Ok(PageEvent::Completed { frames, .. }) => debug!("Response complete after {} frames", frames),
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => warn!("Skipped {} page events", skipped),
            Err(RecvError::Closed) => break,
        }
    }

    if any {
        println!();
    }
    any
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let message = args.message.join(" ");
    let client = HttpStreamClient::new(&args.url);
    let mut page = ChatPage::new(MemoryDom::with_root(&args.target));
    let printer = tokio::spawn(print_answer(page.subscribe()));

    info!("Sending to {}: {}", client.base_url(), message);
    let result = if args.no_stream {
        client.chat_message(&mut page, &args.target, &message).await
    } else {
        client.stream_message(&mut page, &args.target, &message).await
    };

    let final_text = page.dom().text_content(&args.target).unwrap_or_default();
    drop(page);
    let streamed = printer.await.unwrap_or(false);

    let frames = result?;
    info!("Applied {} frame(s)", frames);
    if !streamed {
        println!("{}", final_text.trim());
    }

    Ok(())
}
