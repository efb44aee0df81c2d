use tracing::{debug, warn};

use crate::{
    channel::{
        Channel,
        ChannelFactory,
        ControlChannel,
        IngestChannel,
        SearchChannel,
    },
    config::SonicConfig,
    error::Result,
    naming::Namespace,
    query::SearchQuery,
    reconcile::reconcile,
    record_id::{RecordId, SearchHits},
    searchable::Searchable,
    store::RecordStore,
};

/// The contract a search backend offers to searchable record types.
pub trait Engine<R: Searchable> {
    /// Index (or re-index) `records`.
    fn update(&mut self, records: &[R]) -> Result<()>;

    /// Remove `records` from the index.
    fn delete(&mut self, records: &[R]) -> Result<()>;

    fn search(&mut self, query: &SearchQuery) -> Result<SearchHits>;

    /// Fetch page `page` (counted from 1) of `per_page` identifiers.
    fn paginate(
        &mut self,
        query: &SearchQuery,
        per_page: usize,
        page: usize,
    ) -> Result<SearchHits>;

    /// The identifiers of a result, best first.
    fn map_ids(&self, hits: &SearchHits) -> Vec<RecordId>;

    /// Load the records behind `hits` from `store`, in rank order, with the
    /// query's `wheres` applied.
    fn map(
        &self,
        query: &SearchQuery,
        hits: &SearchHits,
        store: &dyn RecordStore<R>,
    ) -> Result<Vec<R>>;

    fn total_count(&self, hits: &SearchHits) -> usize;

    /// Remove every indexed record of the `entity` record type.
    fn flush_all(&mut self, entity: &str) -> Result<()>;
}

/// A single `PUSH` derived from a record.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PushMessage {
    namespace: Namespace,
    object: RecordId,
    text: String,
    locale: Option<String>,
}

impl PushMessage {
    fn from_record<R: Searchable>(record: &R) -> Option<Self> {
        let text = record.to_searchable_data().to_text()?;
        Some(Self {
            namespace: Namespace::of(record),
            object: record.scout_key(),
            text,
            locale: record.sonic_locale(),
        })
    }
}

/// [`Engine`] backed by a Sonic instance.
///
/// Holds one connected handle per channel mode. Handles are quit on
/// [`SonicEngine::shutdown`], or on drop if the engine was never shut down.
pub struct SonicEngine<I, S, C>
where
    I: IngestChannel,
    S: SearchChannel,
    C: ControlChannel,
{
    ingest: I,
    search: S,
    control: C,
    closed: bool,
}

impl<I, S, C> SonicEngine<I, S, C>
where
    I: IngestChannel,
    S: SearchChannel,
    C: ControlChannel,
{
    /// Wrap channels that are already connected.
    pub fn new(ingest: I, search: S, control: C) -> Self {
        Self {
            ingest,
            search,
            control,
            closed: false,
        }
    }

    /// Open and authenticate all three channels through `factory`.
    pub fn connect<F>(factory: &F, config: &SonicConfig) -> Result<Self>
    where
        F: ChannelFactory<Ingest = I, Search = S, Control = C>,
    {
        let mut ingest = factory.ingest(config)?;
        let mut search = factory.search(config)?;
        let mut control = factory.control(config)?;

        ingest.connect(&config.password)?;
        search.connect(&config.password)?;
        control.connect(&config.password)?;

        debug!(addr = %config.socket_addr(), "connected to sonic");
        Ok(Self::new(ingest, search, control))
    }

    /// Quit every channel, returning the first error after trying them all.
    pub fn shutdown(mut self) -> Result<()> {
        self.closed = true;
        let results = [
            self.ingest.quit(),
            self.search.quit(),
            self.control.quit(),
        ];
        results.into_iter().collect()
    }

    fn run_query(
        &mut self,
        query: &SearchQuery,
        limit: Option<usize>,
        offset: Option<usize>,
    ) -> Result<SearchHits> {
        self.search.ping()?;

        let ns = query.namespace();
        let raw = self.search.query(
            &ns.collection,
            &ns.bucket,
            &query.query,
            limit,
            offset,
        )?;
        let hits = SearchHits::from_raw(raw);

        debug!(
            collection = %ns.collection,
            bucket = %ns.bucket,
            hits = hits.len(),
            "sonic query"
        );
        Ok(hits)
    }
}

impl<R, I, S, C> Engine<R> for SonicEngine<I, S, C>
where
    R: Searchable,
    I: IngestChannel,
    S: SearchChannel,
    C: ControlChannel,
{
    fn update(&mut self, records: &[R]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        self.ingest.ping()?;

        let messages: Vec<PushMessage> =
            records.iter().filter_map(PushMessage::from_record).collect();
        if messages.is_empty() {
            debug!(records = records.len(), "nothing searchable to push");
            return Ok(());
        }

        for msg in &messages {
            self.ingest.push(
                &msg.namespace.collection,
                &msg.namespace.bucket,
                msg.object.as_str(),
                &msg.text,
                msg.locale.as_deref(),
            )?;
        }

        // Persist the pushed terms.
        self.control.consolidate()?;

        debug!(
            pushed = messages.len(),
            skipped = records.len() - messages.len(),
            "indexed records"
        );
        Ok(())
    }

    fn delete(&mut self, records: &[R]) -> Result<()> {
        self.ingest.ping()?;

        for record in records {
            let ns = Namespace::of(record);
            self.ingest.flush(
                &ns.collection,
                &ns.bucket,
                record.scout_key().as_str(),
            )?;
        }

        debug!(removed = records.len(), "removed records from index");
        Ok(())
    }

    fn search(&mut self, query: &SearchQuery) -> Result<SearchHits> {
        self.run_query(query, query.limit, None)
    }

    fn paginate(
        &mut self,
        query: &SearchQuery,
        per_page: usize,
        page: usize,
    ) -> Result<SearchHits> {
        let offset = page.saturating_sub(1).saturating_mul(per_page);
        self.run_query(query, Some(per_page), Some(offset))
    }

    fn map_ids(&self, hits: &SearchHits) -> Vec<RecordId> {
        hits.ids().to_vec()
    }

    fn map(
        &self,
        query: &SearchQuery,
        hits: &SearchHits,
        store: &dyn RecordStore<R>,
    ) -> Result<Vec<R>> {
        if hits.is_empty() {
            return Ok(Vec::new());
        }

        let fetched = store.fetch_by_ids(query, hits.ids())?;
        Ok(reconcile(hits, fetched, &query.wheres))
    }

    fn total_count(&self, hits: &SearchHits) -> usize {
        hits.len()
    }

    fn flush_all(&mut self, entity: &str) -> Result<()> {
        self.ingest.ping()?;
        let ns = Namespace::for_bucket(entity);
        self.ingest.flush_bucket(&ns.collection, &ns.bucket)
    }
}

impl<I, S, C> Drop for SonicEngine<I, S, C>
where
    I: IngestChannel,
    S: SearchChannel,
    C: ControlChannel,
{
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        for (mode, result) in [
            ("ingest", self.ingest.quit()),
            ("search", self.search.quit()),
            ("control", self.control.quit()),
        ] {
            if let Err(err) = result {
                warn!(channel = mode, error = %err, "failed to quit sonic channel");
            }
        }
    }
}

impl<I, S, C> std::fmt::Debug for SonicEngine<I, S, C>
where
    I: IngestChannel,
    S: SearchChannel,
    C: ControlChannel,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SonicEngine")
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}
