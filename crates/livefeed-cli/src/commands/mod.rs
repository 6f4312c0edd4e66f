// CLI subcommands

pub mod event;
pub mod feed;
pub mod ingest;
pub mod migrate;
pub mod shell;
