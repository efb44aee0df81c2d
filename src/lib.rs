//! sonic-scout - a [Sonic](https://github.com/valeriansaliou/sonic) driver
//! for searchable record models.
//!
//! Records implementing [`Searchable`] are pushed into Sonic buckets named
//! after their type, inside a collection named after the pluralized type.
//! Searches return ranked identifiers, which [`Engine::map`] turns back into
//! records loaded from a [`RecordStore`]. Sonic has no notion of filters, so
//! a query's `where` clauses are applied to the loaded records, and Sonic's
//! ranking is restored on the way out.
//!
//! # Quick start
//!
//! ```
//! use serde_json::{Value, json};
//! use sonic_scout::{
//!     Engine, MemoryDaemon, RecordId, SearchQuery, Searchable,
//!     SearchableData, SonicConfig, SonicEngine,
//! };
//!
//! #[derive(Clone)]
//! struct Post {
//!     id: u64,
//!     title: String,
//! }
//!
//! impl Searchable for Post {
//!     fn scout_key(&self) -> RecordId {
//!         RecordId::from(self.id)
//!     }
//!
//!     fn searchable_as(&self) -> String {
//!         "Post".to_string()
//!     }
//!
//!     fn to_searchable_data(&self) -> SearchableData {
//!         SearchableData::Text(self.title.clone())
//!     }
//!
//!     fn attribute(&self, name: &str) -> Option<Value> {
//!         (name == "id").then(|| json!(self.id))
//!     }
//! }
//!
//! let posts = vec![
//!     Post { id: 1, title: "Ownership in Rust".into() },
//!     Post { id: 2, title: "Rust lifetimes".into() },
//! ];
//!
//! let daemon = MemoryDaemon::default();
//! let mut engine =
//!     SonicEngine::connect(&daemon.factory(), &SonicConfig::default())?;
//! engine.update(&posts)?;
//!
//! let query = SearchQuery::new("Post", "rust");
//! let hits = Engine::<Post>::search(&mut engine, &query)?;
//! let store = |_: &SearchQuery, ids: &[RecordId]| -> sonic_scout::Result<Vec<Post>> {
//!     Ok(posts
//!         .iter()
//!         .filter(|p| ids.contains(&p.scout_key()))
//!         .cloned()
//!         .collect())
//! };
//! let found = Engine::<Post>::map(&engine, &query, &hits, &store)?;
//! assert_eq!(found.len(), 2);
//!
//! engine.shutdown()?;
//! # Ok::<(), sonic_scout::Error>(())
//! ```

pub mod channel;
pub mod config;
pub mod engine;
pub mod error;
pub mod memory;
pub mod naming;
pub mod query;
pub mod reconcile;
pub mod record_id;
pub mod searchable;
pub mod store;

pub use channel::{
    Channel,
    ChannelFactory,
    ControlChannel,
    IngestChannel,
    SearchChannel,
};
pub use config::SonicConfig;
pub use engine::{Engine, SonicEngine};
pub use error::{Error, Result};
pub use memory::MemoryDaemon;
pub use query::SearchQuery;
pub use reconcile::reconcile;
pub use record_id::{RecordId, SearchHits};
pub use searchable::{Searchable, SearchableData};
pub use store::RecordStore;
