//! The Sonic client surface the engine drives.
//!
//! Sonic splits its protocol into three channel modes, each on its own
//! connection: ingest (write), search (read) and control (administration).
//! The engine holds one handle per mode and issues commands in the order it
//! receives them. Reconnects, timeouts and retries are the client's business.

use crate::{config::SonicConfig, error::Result};

/// Commands every channel mode understands.
pub trait Channel {
    /// Open the connection and authenticate with `password`.
    fn connect(&mut self, password: &str) -> Result<()>;

    /// Close the connection.
    fn quit(&mut self) -> Result<()>;

    fn ping(&mut self) -> Result<()>;
}

/// Write side: `PUSH`, `FLUSHO`, `FLUSHB`.
pub trait IngestChannel: Channel {
    /// Index `text` under `object`. `locale` is an ISO 639-3 code, or
    /// `none` to skip stopword removal.
    fn push(
        &mut self,
        collection: &str,
        bucket: &str,
        object: &str,
        text: &str,
        locale: Option<&str>,
    ) -> Result<()>;

    /// Remove one object from a bucket.
    fn flush(
        &mut self,
        collection: &str,
        bucket: &str,
        object: &str,
    ) -> Result<()>;

    /// Remove every object in a bucket.
    fn flush_bucket(&mut self, collection: &str, bucket: &str) -> Result<()>;
}

/// Read side: `QUERY`.
pub trait SearchChannel: Channel {
    /// Object identifiers matching `terms`, best first.
    ///
    /// Clients commonly report "no results" as a single empty string; the
    /// engine filters that out.
    fn query(
        &mut self,
        collection: &str,
        bucket: &str,
        terms: &str,
        limit: Option<usize>,
        offset: Option<usize>,
    ) -> Result<Vec<String>>;
}

/// Administration: `TRIGGER consolidate`.
pub trait ControlChannel: Channel {
    /// Ask Sonic to write pending index changes to disk.
    fn consolidate(&mut self) -> Result<()>;
}

/// Builds unconnected channel handles for a Sonic instance.
pub trait ChannelFactory {
    type Ingest: IngestChannel;
    type Search: SearchChannel;
    type Control: ControlChannel;

    fn ingest(&self, config: &SonicConfig) -> Result<Self::Ingest>;

    fn search(&self, config: &SonicConfig) -> Result<Self::Search>;

    fn control(&self, config: &SonicConfig) -> Result<Self::Control>;
}
