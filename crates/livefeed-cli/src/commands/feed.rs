// Feed read command

use anyhow::{Context, Result};
use livefeed_core::{FeedReadPipeline, SubjectId};

use crate::output::{print_table_header, print_table_row, OutputFormat};
use crate::services::Services;

pub async fn run(
    services: &Services,
    output: OutputFormat,
    quiet: bool,
    subject_id: i64,
    reads: u32,
) -> Result<()> {
    execute(&services.feeds(), output, quiet, subject_id, reads).await
}

/// Read a feed through an existing pipeline
pub async fn execute(
    pipeline: &FeedReadPipeline,
    output: OutputFormat,
    quiet: bool,
    subject_id: i64,
    reads: u32,
) -> Result<()> {
    let subject_id = SubjectId(subject_id);

    // Later reads within the feed TTL are served from the cache
    let mut last = None;
    for _ in 0..reads.max(1) {
        let read = pipeline
            .get_feed(subject_id)
            .await
            .with_context(|| format!("Failed to read feed for subject {}", subject_id))?;
        tracing::info!(%subject_id, hit = read.hit, bytes = read.body.len(), "feed read");
        last = Some(read);
    }
    let Some(read) = last else {
        return Ok(());
    };

    if !output.is_text() {
        println!("{}", read.body);
        return Ok(());
    }

    let feed = read.feed().context("Cached feed is not valid JSON")?;
    if feed.is_empty() {
        if !quiet {
            println!("No events for subject {}", subject_id);
        }
        return Ok(());
    }

    print_table_header(&[("ID", 12), ("TYPE", 16), ("CREATED", 25), ("PAYLOAD", 40)]);
    for event in &feed.events {
        let payload = serde_json::to_string(&event.payload)?;
        print_table_row(&[
            (&event.id.to_string(), 12),
            (&event.event_type, 16),
            (&event.created_at.to_rfc3339(), 25),
            (&payload, 40),
        ]);
    }

    if !quiet {
        println!();
        println!(
            "{} event(s), served from {}",
            feed.len(),
            if read.hit { "cache" } else { "store" }
        );
    }
    Ok(())
}
