//! An in-process stand-in for a Sonic daemon.
//!
//! [`MemoryDaemon`] keeps a tiny term index and logs every command it
//! receives, which makes it useful both for embedding the engine without a
//! running Sonic and for asserting exactly what the engine sent.

use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use crate::{
    channel::{
        Channel,
        ChannelFactory,
        ControlChannel,
        IngestChannel,
        SearchChannel,
    },
    config::SonicConfig,
    error::{Error, Result},
};
use tracing::debug;

/// Default size of Sonic's receive buffer, in bytes.
pub const DEFAULT_BUFFER_SIZE: usize = 20_000;

/// Channel mode a handle was opened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Ingest,
    Search,
    Control,
}

/// A command as received by the daemon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Connect(Mode),
    Quit(Mode),
    Ping(Mode),
    Push {
        collection: String,
        bucket: String,
        object: String,
        text: String,
        locale: Option<String>,
    },
    Flush {
        collection: String,
        bucket: String,
        object: String,
    },
    FlushBucket {
        collection: String,
        bucket: String,
    },
    Query {
        collection: String,
        bucket: String,
        terms: String,
        limit: Option<usize>,
        offset: Option<usize>,
    },
    Consolidate,
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Self::Connect(_) => "connect",
            Self::Quit(_) => "quit",
            Self::Ping(_) => "ping",
            Self::Push { .. } => "push",
            Self::Flush { .. } => "flush",
            Self::FlushBucket { .. } => "flush_bucket",
            Self::Query { .. } => "query",
            Self::Consolidate => "consolidate",
        }
    }
}

#[derive(Debug)]
struct IndexedObject {
    terms: Vec<String>,
    seq: u64,
}

type BucketKey = (String, String);

#[derive(Debug, Default)]
struct State {
    buckets: HashMap<BucketKey, HashMap<String, IndexedObject>>,
    log: Vec<Command>,
    failing: HashSet<&'static str>,
    next_seq: u64,
    consolidated_seq: u64,
}

/// Shared daemon state. Clones refer to the same index.
#[derive(Debug, Clone)]
pub struct MemoryDaemon {
    state: Arc<Mutex<State>>,
    password: String,
    buffer_size: usize,
}

impl Default for MemoryDaemon {
    fn default() -> Self {
        Self::new(SonicConfig::default().password)
    }
}

impl MemoryDaemon {
    pub fn new(password: impl Into<String>) -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
            password: password.into(),
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }

    /// Reject pushes whose text is longer than `bytes`.
    pub fn with_buffer_size(mut self, bytes: usize) -> Self {
        self.buffer_size = bytes;
        self
    }

    /// Open an unconnected handle in the given mode.
    pub fn channel(&self, mode: Mode) -> MemoryChannel {
        MemoryChannel {
            daemon: self.clone(),
            mode,
            connected: false,
        }
    }

    pub fn factory(&self) -> MemoryFactory {
        MemoryFactory {
            daemon: self.clone(),
        }
    }

    /// Make every later command named `command` (e.g. `"push"`) fail.
    pub fn fail_on(&self, command: &'static str) {
        self.inspect().failing.insert(command);
    }

    pub fn commands(&self) -> Vec<Command> {
        self.inspect().log.clone()
    }

    pub fn clear_commands(&self) {
        self.inspect().log.clear();
    }

    pub fn contains(&self, collection: &str, bucket: &str, object: &str) -> bool {
        self.inspect()
            .buckets
            .get(&(collection.to_string(), bucket.to_string()))
            .is_some_and(|objects| objects.contains_key(object))
    }

    pub fn object_count(&self, collection: &str, bucket: &str) -> usize {
        self.inspect()
            .buckets
            .get(&(collection.to_string(), bucket.to_string()))
            .map_or(0, HashMap::len)
    }

    /// True when no push has happened since the last consolidation.
    pub fn is_consolidated(&self) -> bool {
        let state = self.inspect();
        state.consolidated_seq == state.next_seq
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| Error::Protocol("memory daemon state poisoned".into()))
    }

    fn inspect(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn execute(&self, command: Command) -> Result<Vec<String>> {
        let mut state = self.lock()?;
        let name = command.name();
        state.log.push(command.clone());

        if state.failing.contains(name) {
            return Err(Error::CommandFailed {
                command: name,
                reason: "rejected by daemon".into(),
            });
        }

        match command {
            Command::Connect(_) | Command::Quit(_) | Command::Ping(_) => {
                Ok(vec![])
            }
            Command::Push {
                collection,
                bucket,
                object,
                text,
                ..
            } => {
                if text.len() > self.buffer_size {
                    return Err(Error::InvalidArgument(format!(
                        "push of {} bytes exceeds the {} byte buffer",
                        text.len(),
                        self.buffer_size
                    )));
                }
                state.next_seq += 1;
                let seq = state.next_seq;
                state.buckets.entry((collection, bucket)).or_default().insert(
                    object,
                    IndexedObject {
                        terms: tokenize(&text),
                        seq,
                    },
                );
                Ok(vec![])
            }
            Command::Flush {
                collection,
                bucket,
                object,
            } => {
                if let Some(objects) = state.buckets.get_mut(&(collection, bucket))
                {
                    objects.remove(&object);
                }
                Ok(vec![])
            }
            Command::FlushBucket { collection, bucket } => {
                state.buckets.remove(&(collection, bucket));
                Ok(vec![])
            }
            Command::Query {
                collection,
                bucket,
                terms,
                limit,
                offset,
            } => Ok(run_query(
                state.buckets.get(&(collection, bucket)),
                &terms,
                limit,
                offset,
            )),
            Command::Consolidate => {
                state.consolidated_seq = state.next_seq;
                Ok(vec![])
            }
        }
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Every query term must match an indexed term; the last one may match as
/// a prefix. Most recently pushed objects rank first. An empty result is
/// reported as a single empty identifier.
fn run_query(
    objects: Option<&HashMap<String, IndexedObject>>,
    terms: &str,
    limit: Option<usize>,
    offset: Option<usize>,
) -> Vec<String> {
    let wanted = tokenize(terms);
    let mut matched: Vec<(&String, u64)> = match (objects, wanted.split_last())
    {
        (Some(objects), Some((last, exact))) => objects
            .iter()
            .filter(|(_, obj)| {
                exact.iter().all(|t| obj.terms.contains(t))
                    && obj.terms.iter().any(|t| t.starts_with(last.as_str()))
            })
            .map(|(id, obj)| (id, obj.seq))
            .collect(),
        _ => Vec::new(),
    };

    matched.sort_by(|a, b| b.1.cmp(&a.1));

    let ids: Vec<String> = matched
        .into_iter()
        .skip(offset.unwrap_or(0))
        .take(limit.unwrap_or(usize::MAX))
        .map(|(id, _)| id.clone())
        .collect();

    if ids.is_empty() { vec![String::new()] } else { ids }
}

/// A connection to a [`MemoryDaemon`] in one channel mode.
#[derive(Debug)]
pub struct MemoryChannel {
    daemon: MemoryDaemon,
    mode: Mode,
    connected: bool,
}

impl MemoryChannel {
    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    fn send(&self, command: Command) -> Result<Vec<String>> {
        if !self.connected {
            return Err(Error::NoConnection(format!(
                "{:?} channel is not connected",
                self.mode
            )));
        }
        self.daemon.execute(command)
    }

    fn require(&self, mode: Mode) -> Result<()> {
        if self.mode == mode {
            Ok(())
        } else {
            Err(Error::Protocol(format!(
                "command not allowed in {:?} mode",
                self.mode
            )))
        }
    }
}

impl Channel for MemoryChannel {
    fn connect(&mut self, password: &str) -> Result<()> {
        if password != self.daemon.password {
            return Err(Error::Authentication);
        }
        self.connected = true;
        if let Err(err) = self.send(Command::Connect(self.mode)) {
            self.connected = false;
            return Err(err);
        }
        Ok(())
    }

    fn quit(&mut self) -> Result<()> {
        self.send(Command::Quit(self.mode))?;
        self.connected = false;
        Ok(())
    }

    fn ping(&mut self) -> Result<()> {
        self.send(Command::Ping(self.mode)).map(drop)
    }
}

impl IngestChannel for MemoryChannel {
    fn push(
        &mut self,
        collection: &str,
        bucket: &str,
        object: &str,
        text: &str,
        locale: Option<&str>,
    ) -> Result<()> {
        self.require(Mode::Ingest)?;
        self.send(Command::Push {
            collection: collection.to_string(),
            bucket: bucket.to_string(),
            object: object.to_string(),
            text: text.to_string(),
            locale: locale.map(str::to_string),
        })
        .map(drop)
    }

    fn flush(
        &mut self,
        collection: &str,
        bucket: &str,
        object: &str,
    ) -> Result<()> {
        self.require(Mode::Ingest)?;
        self.send(Command::Flush {
            collection: collection.to_string(),
            bucket: bucket.to_string(),
            object: object.to_string(),
        })
        .map(drop)
    }

    fn flush_bucket(&mut self, collection: &str, bucket: &str) -> Result<()> {
        self.require(Mode::Ingest)?;
        self.send(Command::FlushBucket {
            collection: collection.to_string(),
            bucket: bucket.to_string(),
        })
        .map(drop)
    }
}

impl SearchChannel for MemoryChannel {
    fn query(
        &mut self,
        collection: &str,
        bucket: &str,
        terms: &str,
        limit: Option<usize>,
        offset: Option<usize>,
    ) -> Result<Vec<String>> {
        self.require(Mode::Search)?;
        self.send(Command::Query {
            collection: collection.to_string(),
            bucket: bucket.to_string(),
            terms: terms.to_string(),
            limit,
            offset,
        })
    }
}

impl ControlChannel for MemoryChannel {
    fn consolidate(&mut self) -> Result<()> {
        self.require(Mode::Control)?;
        self.send(Command::Consolidate).map(drop)
    }
}

/// Hands out unconnected [`MemoryChannel`]s for one daemon.
#[derive(Debug, Clone)]
pub struct MemoryFactory {
    daemon: MemoryDaemon,
}

impl ChannelFactory for MemoryFactory {
    type Ingest = MemoryChannel;
    type Search = MemoryChannel;
    type Control = MemoryChannel;

    fn ingest(&self, config: &SonicConfig) -> Result<MemoryChannel> {
        debug!(addr = %config.socket_addr(), "opening ingest channel");
        Ok(self.daemon.channel(Mode::Ingest))
    }

    fn search(&self, config: &SonicConfig) -> Result<MemoryChannel> {
        debug!(addr = %config.socket_addr(), "opening search channel");
        Ok(self.daemon.channel(Mode::Search))
    }

    fn control(&self, config: &SonicConfig) -> Result<MemoryChannel> {
        debug!(addr = %config.socket_addr(), "opening control channel");
        Ok(self.daemon.channel(Mode::Control))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connected(daemon: &MemoryDaemon, mode: Mode) -> MemoryChannel {
        let mut channel = daemon.channel(mode);
        channel.connect("SecretPassword").unwrap();
        channel
    }

    #[test]
    fn wrong_password_is_rejected() {
        let daemon = MemoryDaemon::default();
        let mut channel = daemon.channel(Mode::Search);
        let err = channel.connect("nope").unwrap_err();
        assert!(matches!(err, Error::Authentication));
        assert!(!channel.is_connected());
    }

    #[test]
    fn commands_need_a_connection() {
        let daemon = MemoryDaemon::default();
        let mut channel = daemon.channel(Mode::Ingest);
        let err = channel.ping().unwrap_err();
        assert!(matches!(err, Error::NoConnection(_)));
        assert!(daemon.commands().is_empty());
    }

    #[test]
    fn push_then_query() {
        let daemon = MemoryDaemon::default();
        let mut ingest = connected(&daemon, Mode::Ingest);
        let mut search = connected(&daemon, Mode::Search);

        ingest
            .push("Posts", "Post", "1", "Rust ownership explained", None)
            .unwrap();
        ingest
            .push("Posts", "Post", "2", "Borrowing in Rust", None)
            .unwrap();
        ingest.push("Posts", "Post", "3", "Cooking pasta", None).unwrap();

        let ids = search.query("Posts", "Post", "rust", None, None).unwrap();
        assert_eq!(ids, vec!["2", "1"]);

        let ids = search.query("Posts", "Post", "rust own", None, None).unwrap();
        assert_eq!(ids, vec!["1"]);
    }

    #[test]
    fn no_match_is_the_empty_sentinel() {
        let daemon = MemoryDaemon::default();
        let mut search = connected(&daemon, Mode::Search);
        let ids = search.query("Posts", "Post", "rust", None, None).unwrap();
        assert_eq!(ids, vec![String::new()]);
    }

    #[test]
    fn limit_and_offset_page_through_results() {
        let daemon = MemoryDaemon::default();
        let mut ingest = connected(&daemon, Mode::Ingest);
        let mut search = connected(&daemon, Mode::Search);
        for id in 1..=5 {
            ingest
                .push("Notes", "Note", &id.to_string(), "note", None)
                .unwrap();
        }

        let page = search
            .query("Notes", "Note", "note", Some(2), Some(2))
            .unwrap();
        assert_eq!(page, vec!["3", "2"]);
    }

    #[test]
    fn flush_removes_objects() {
        let daemon = MemoryDaemon::default();
        let mut ingest = connected(&daemon, Mode::Ingest);
        ingest.push("Notes", "Note", "1", "one", None).unwrap();
        ingest.push("Notes", "Note", "2", "two", None).unwrap();

        ingest.flush("Notes", "Note", "1").unwrap();
        assert!(!daemon.contains("Notes", "Note", "1"));
        assert_eq!(daemon.object_count("Notes", "Note"), 1);

        ingest.flush_bucket("Notes", "Note").unwrap();
        assert_eq!(daemon.object_count("Notes", "Note"), 0);
    }

    #[test]
    fn oversized_push_is_invalid() {
        let daemon = MemoryDaemon::default().with_buffer_size(8);
        let mut ingest = connected(&daemon, Mode::Ingest);
        let err = ingest
            .push("Notes", "Note", "1", "far too long for the buffer", None)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert!(!daemon.contains("Notes", "Note", "1"));
    }

    #[test]
    fn consolidate_tracks_pending_pushes() {
        let daemon = MemoryDaemon::default();
        let mut ingest = connected(&daemon, Mode::Ingest);
        let mut control = connected(&daemon, Mode::Control);
        assert!(daemon.is_consolidated());

        ingest.push("Notes", "Note", "1", "one", None).unwrap();
        assert!(!daemon.is_consolidated());

        control.consolidate().unwrap();
        assert!(daemon.is_consolidated());
    }

    #[test]
    fn wrong_mode_is_a_protocol_error() {
        let daemon = MemoryDaemon::default();
        let mut search = connected(&daemon, Mode::Search);
        let err = search.push("Notes", "Note", "1", "one", None).unwrap_err();
        assert!(matches!(err, Error::Protocol(_)));
    }

    #[test]
    fn failing_command_is_reported() {
        let daemon = MemoryDaemon::default();
        let mut control = connected(&daemon, Mode::Control);
        daemon.fail_on("consolidate");
        let err = control.consolidate().unwrap_err();
        assert!(matches!(
            err,
            Error::CommandFailed {
                command: "consolidate",
                ..
            }
        ));
    }
}
