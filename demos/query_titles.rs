//! Query page info for several titles.
//!
//! All titles are submitted at once; the client merges them into a single
//! `action=query` call and every ticket resolves with the same response.
//!
//! Usage:
//!   cargo run --example query_titles -- "Gawr Gura" "Mori Calliope"
//!
//! Set `HOLOWIKI_REQUEST_INTERVAL_MS`, `HOLOWIKI_REQUEST_TIMEOUT_MS` or
//! `HOLOWIKI_ENDPOINT` to override defaults, and `RUST_LOG=holowiki=debug`
//! to watch the scheduler.

use anyhow::Context;
use holowiki::{QueryRequest, UserAgentOptions, WikiClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("info".parse()?),
        )
        .with_target(false)
        .try_init();

    let mut titles: Vec<String> = std::env::args().skip(1).collect();
    if titles.is_empty() {
        titles = vec!["Hololive Production".to_string()];
    }

    let client = WikiClient::builder()
        .user_agent(
            UserAgentOptions::new("holowiki demo bot", env!("CARGO_PKG_VERSION"))
                .with_contact(holowiki::HOST_LIBRARY.repository),
        )
        .env_overrides(true)
        .build()
        .context("invalid client configuration")?;

    println!("User-Agent: {}\n", client.user_agent());

    let mut tickets = Vec::new();
    for title in &titles {
        let ticket = client
            .submit(QueryRequest::new().prop(["info"]).titles([title]))
            .await;
        tickets.push((title.clone(), ticket));
    }

    for (title, ticket) in tickets {
        let response = ticket
            .await
            .with_context(|| format!("query for {title:?} failed"))?;
        println!(
            "{title}: batch {} ({} requests)",
            response.batch_id(),
            response.size()
        );
    }

    let snapshot = client.snapshot().await;
    println!("\n{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}
