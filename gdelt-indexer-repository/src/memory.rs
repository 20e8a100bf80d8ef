//! In-memory graph store.
//!
//! Keeps every collection in a map guarded by a mutex. Used for local runs
//! without a database (`GRAPH_STORE=memory`) and as the store in pipeline
//! tests. Behaves like the ArangoDB backend where it matters: collections must
//! exist before use and duplicate `_key`s are conflicts.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use gdelt_indexer_shared::{Collection, LocatedEvent, RelationType};
use serde_json::Value;
use tracing::debug;

use crate::errors::GraphStoreError;
use crate::interfaces::GraphStore;

#[derive(Debug, Default)]
struct State {
    collections: HashMap<Collection, BTreeMap<String, Value>>,
    next_generated_key: u64,
}

impl State {
    fn collection(
        &self,
        collection: Collection,
    ) -> Result<&BTreeMap<String, Value>, GraphStoreError> {
        self.collections
            .get(&collection)
            .ok_or_else(|| missing_collection(collection))
    }

    fn collection_mut(
        &mut self,
        collection: Collection,
    ) -> Result<&mut BTreeMap<String, Value>, GraphStoreError> {
        self.collections
            .get_mut(&collection)
            .ok_or_else(|| missing_collection(collection))
    }

    /// Target vertex of the first outbound edge with the given label.
    fn neighbour(&self, from_handle: &str, relation: RelationType) -> Option<&Value> {
        let label = serde_json::to_value(relation).ok()?;
        let edge = self
            .collections
            .get(&Collection::EventRelations)?
            .values()
            .find(|edge| {
                edge.get("_from").and_then(Value::as_str) == Some(from_handle)
                    && edge.get("type") == Some(&label)
            })?;
        let (collection_name, key) = edge.get("_to")?.as_str()?.split_once('/')?;
        let collection = Collection::ALL
            .into_iter()
            .find(|c| c.name() == collection_name)?;
        self.collections.get(&collection)?.get(key)
    }
}

fn missing_collection(collection: Collection) -> GraphStoreError {
    GraphStoreError::collection(format!("collection not found: {}", collection))
}

fn text(value: Option<&Value>, field: &str) -> Option<String> {
    value?.get(field)?.as_str().map(str::to_string)
}

fn number(value: Option<&Value>, field: &str) -> Option<f64> {
    value?.get(field)?.as_f64()
}

/// Graph store kept entirely in process memory.
#[derive(Debug, Default)]
pub struct MemoryGraphStore {
    state: Mutex<State>,
}

impl MemoryGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every document in a collection, in key order.
    ///
    /// Returns an empty list when the collection does not exist.
    pub fn documents(&self, collection: Collection) -> Vec<Value> {
        let state = self.lock();
        state
            .collections
            .get(&collection)
            .map(|docs| docs.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Look up one document by key.
    pub fn get(&self, collection: Collection, key: &str) -> Option<Value> {
        let state = self.lock();
        state.collections.get(&collection)?.get(key).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl GraphStore for MemoryGraphStore {
    async fn ping(&self) -> Result<(), GraphStoreError> {
        Ok(())
    }

    async fn ensure_collections(&self) -> Result<(), GraphStoreError> {
        let mut state = self.lock();
        for collection in Collection::ALL {
            state.collections.entry(collection).or_default();
        }
        Ok(())
    }

    async fn truncate(&self, collection: Collection) -> Result<(), GraphStoreError> {
        let mut state = self.lock();
        state
            .collection_mut(collection)
            .map_err(|e| GraphStoreError::truncate(e.to_string()))?
            .clear();
        debug!(collection = %collection, "Collection truncated");
        Ok(())
    }

    async fn insert(
        &self,
        collection: Collection,
        document: &Value,
    ) -> Result<(), GraphStoreError> {
        if !document.is_object() {
            return Err(GraphStoreError::serialization(
                "document must be a JSON object",
            ));
        }

        let mut state = self.lock();
        let key = match document.get("_key") {
            Some(Value::String(key)) => key.clone(),
            Some(other) => {
                return Err(GraphStoreError::insert(format!("invalid _key: {}", other)));
            }
            None => {
                state.next_generated_key += 1;
                format!("g{}", state.next_generated_key)
            }
        };

        let docs = state.collection_mut(collection)?;
        if docs.contains_key(&key) {
            return Err(GraphStoreError::conflict(collection.name(), &key));
        }
        docs.insert(key, document.clone());
        Ok(())
    }

    async fn count(&self, collection: Collection) -> Result<u64, GraphStoreError> {
        let state = self.lock();
        Ok(state.collection(collection)?.len() as u64)
    }

    async fn located_events(
        &self,
        limit: Option<usize>,
    ) -> Result<Vec<LocatedEvent>, GraphStoreError> {
        let state = self.lock();
        let events = state
            .collection(Collection::Events)
            .map_err(|e| GraphStoreError::query(e.to_string()))?;

        let located = events
            .iter()
            .filter_map(|(key, event)| {
                let handle = Collection::Events.handle(key);
                let location = state.neighbour(&handle, RelationType::OccurredAt)?;
                let actor = state.neighbour(&handle, RelationType::HasActor);
                Some(LocatedEvent {
                    source: text(Some(event), "source"),
                    goldsteinscore: number(Some(event), "goldsteinScale"),
                    quadclass: event.get("quadClass").and_then(Value::as_i64),
                    fullname: text(Some(location), "fullname"),
                    country_code: text(Some(location), "countryCode"),
                    actor_country_code: text(actor, "countryCode"),
                    actor_filter: text(actor, "type3Code"),
                    coordinates: [
                        number(Some(location), "latitude"),
                        number(Some(location), "longitude"),
                    ],
                })
            })
            .take(limit.unwrap_or(usize::MAX))
            .collect();

        Ok(located)
    }
}
