// Single event lookup command

use anyhow::{bail, Context, Result};
use livefeed_core::{EventId, IngestionPipeline};

use crate::output::{print_field, OutputFormat};
use crate::services::Services;

pub async fn run(services: &Services, output: OutputFormat, event_id: i64) -> Result<()> {
    let pipeline = services.ingestion(false).await?;
    execute(&pipeline, output, event_id).await
}

/// Look up an event through an existing pipeline
pub async fn execute(pipeline: &IngestionPipeline, output: OutputFormat, event_id: i64) -> Result<()> {
    let Some(event) = pipeline
        .get_event(EventId(event_id))
        .await
        .context("Failed to look up event")?
    else {
        bail!("Event {} not found", event_id);
    };

    if !output.is_text() {
        return output.print_value(&event);
    }

    print_field("Event", &event.id.to_string());
    print_field("Subject", &event.subject_id.to_string());
    print_field("Type", &event.event_type);
    print_field("Created", &event.created_at.to_rfc3339());
    print_field("Payload", &serde_json::to_string(&event.payload)?);
    Ok(())
}
