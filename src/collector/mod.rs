mod ingest;
mod producer;

pub use ingest::{run_collection, CollectReport};
pub use producer::{Backoff, PostProducer, XTimelineClient};
