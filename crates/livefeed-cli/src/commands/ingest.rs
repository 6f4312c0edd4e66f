// Event ingestion command

use anyhow::{bail, Context, Result};
use livefeed_core::{payload_from_value, IngestOutcome, IngestionPipeline, Payload, SubjectId};
use serde_json::{json, Value};

use crate::output::{print_field, OutputFormat};
use crate::services::Services;

/// Parse a `--payload` argument; it must be a JSON object
pub fn parse_payload(raw: &str) -> Result<Payload> {
    let value: Value = serde_json::from_str(raw).context("Payload is not valid JSON")?;
    if !value.is_object() {
        bail!("Payload must be a JSON object");
    }
    Ok(payload_from_value(value))
}

pub async fn run(
    services: &Services,
    output: OutputFormat,
    quiet: bool,
    subject_id: i64,
    event_type: String,
    payload: &str,
) -> Result<()> {
    let pipeline = services.ingestion(true).await?;
    execute(&pipeline, output, quiet, subject_id, event_type, payload).await
}

/// Ingest one event through an existing pipeline
pub async fn execute(
    pipeline: &IngestionPipeline,
    output: OutputFormat,
    quiet: bool,
    subject_id: i64,
    event_type: String,
    payload: &str,
) -> Result<()> {
    let payload = parse_payload(payload)?;

    let outcome = pipeline
        .ingest(SubjectId(subject_id), event_type, payload)
        .await
        .context("Failed to ingest event")?;

    print_outcome(&outcome, output, quiet)
}

fn print_outcome(outcome: &IngestOutcome, output: OutputFormat, quiet: bool) -> Result<()> {
    if !output.is_text() {
        let warnings: Vec<String> = outcome.warnings.iter().map(ToString::to_string).collect();
        return output.print_value(&json!({
            "event": outcome.event,
            "published": outcome.published(),
            "warnings": warnings,
        }));
    }

    if quiet {
        println!("{}", outcome.event_id());
        return Ok(());
    }

    print_field("Event", &outcome.event_id().to_string());
    print_field("Subject", &outcome.event.subject_id.to_string());
    print_field("Type", &outcome.event.event_type);
    print_field("Created", &outcome.event.created_at.to_rfc3339());
    print_field("Published", if outcome.published() { "yes" } else { "no" });
    for warning in &outcome.warnings {
        print_field("Warning", &warning.to_string());
    }
    Ok(())
}
