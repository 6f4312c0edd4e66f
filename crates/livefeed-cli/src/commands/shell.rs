// Long-running command loop
//
// Reads one command per line from stdin and serves all of them through a single
// Services value, so the feed and event caches persist between requests:
//
//   ingest <subject_id> <event_type> [payload-json]
//   feed <subject_id>
//   event <event_id>
//   help
//   quit
//
// A failing command is reported on stderr and the loop continues.

use anyhow::{anyhow, bail, Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::commands::{event, feed, ingest};
use crate::output::OutputFormat;
use crate::services::Services;

const HELP: &str = "\
commands:
  ingest <subject_id> <event_type> [payload-json]
  feed <subject_id>
  event <event_id>
  help
  quit";

/// One parsed input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Ingest {
        subject_id: i64,
        event_type: String,
        payload: String,
    },
    Feed {
        subject_id: i64,
    },
    Event {
        event_id: i64,
    },
    Help,
    Quit,
}

fn parse_id(value: Option<&str>, what: &str) -> Result<i64> {
    let value = value.ok_or_else(|| anyhow!("missing {}", what))?;
    value
        .parse()
        .with_context(|| format!("{} must be an integer, got '{}'", what, value))
}

/// Parse a line; blank lines and `#` comments yield None.
///
/// The payload is the rest of the line after the event type, so it may contain spaces.
pub fn parse_line(line: &str) -> Result<Option<ShellCommand>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let (command, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim_start();

    let parsed = match command {
        "ingest" => {
            let mut parts = rest.splitn(3, char::is_whitespace);
            let subject_id = parse_id(parts.next().filter(|s| !s.is_empty()), "subject_id")?;
            let event_type = parts
                .next()
                .filter(|s| !s.is_empty())
                .ok_or_else(|| anyhow!("missing event_type"))?
                .to_string();
            let payload = parts.next().map(str::trim).filter(|s| !s.is_empty()).unwrap_or("{}");
            ShellCommand::Ingest {
                subject_id,
                event_type,
                payload: payload.to_string(),
            }
        }
        "feed" => ShellCommand::Feed {
            subject_id: parse_id(rest.split_whitespace().next(), "subject_id")?,
        },
        "event" => ShellCommand::Event {
            event_id: parse_id(rest.split_whitespace().next(), "event_id")?,
        },
        "help" => ShellCommand::Help,
        "quit" | "exit" => ShellCommand::Quit,
        other => bail!("unknown command '{}' (try 'help')", other),
    };

    Ok(Some(parsed))
}

pub async fn run(services: &Services, output: OutputFormat, quiet: bool) -> Result<()> {
    let ingestion = services.ingestion(true).await?;
    let feeds = services.feeds();

    if !quiet {
        eprintln!("{}", HELP);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        let command = match parse_line(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                eprintln!("error: {:#}", e);
                continue;
            }
        };

        let result = match command {
            ShellCommand::Ingest {
                subject_id,
                event_type,
                payload,
            } => ingest::execute(&ingestion, output, quiet, subject_id, event_type, &payload).await,
            ShellCommand::Feed { subject_id } => {
                feed::execute(&feeds, output, quiet, subject_id, 1).await
            }
            ShellCommand::Event { event_id } => event::execute(&ingestion, output, event_id).await,
            ShellCommand::Help => {
                println!("{}", HELP);
                Ok(())
            }
            ShellCommand::Quit => break,
        };

        if let Err(e) = result {
            eprintln!("error: {:#}", e);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ingest_keeps_payload_with_spaces() {
        let command = parse_line(r#"ingest 42 comment {"text": "nice one", "post": 7}"#)
            .unwrap()
            .unwrap();

        assert_eq!(
            command,
            ShellCommand::Ingest {
                subject_id: 42,
                event_type: "comment".to_string(),
                payload: r#"{"text": "nice one", "post": 7}"#.to_string(),
            }
        );
    }

    #[test]
    fn test_parse_ingest_defaults_payload() {
        let command = parse_line("ingest 1 like").unwrap().unwrap();
        assert!(matches!(command, ShellCommand::Ingest { ref payload, .. } if payload == "{}"));
    }

    #[test]
    fn test_parse_feed_and_event() {
        assert_eq!(
            parse_line("  feed 7 ").unwrap(),
            Some(ShellCommand::Feed { subject_id: 7 })
        );
        assert_eq!(
            parse_line("event 12").unwrap(),
            Some(ShellCommand::Event { event_id: 12 })
        );
        assert_eq!(parse_line("quit").unwrap(), Some(ShellCommand::Quit));
    }

    #[test]
    fn test_blank_and_comment_lines_are_skipped() {
        assert_eq!(parse_line("").unwrap(), None);
        assert_eq!(parse_line("   ").unwrap(), None);
        assert_eq!(parse_line("# warm the cache").unwrap(), None);
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_line("feed").is_err());
        assert!(parse_line("feed abc").is_err());
        assert!(parse_line("ingest 1").is_err());
        assert!(parse_line("delete 1").is_err());
    }
}
