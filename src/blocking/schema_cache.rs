//! Process wide memoization of schema lookups, so the registry is asked at most once per subject
//! (or id, or registered schema text) as long as those calls succeed.
//!
//! Every key owns a slot with its own lock. The map is only locked long enough to find or add the
//! slot, so a slow registry call for one subject never holds up callers of another subject, while
//! callers of the same subject wait for the one call in flight instead of doing their own.
use std::hash::Hash;
use std::sync::{Arc, LazyLock, Mutex, PoisonError, TryLockError};

use dashmap::DashMap;
use log::debug;

use crate::blocking::schema_registry::SchemaRegistry;
use crate::error::SRCError;
use crate::schema_registry_common::{RegisteredSchema, SchemaType};

type Slot = Arc<Mutex<Option<Arc<RegisteredSchema>>>>;

static GLOBAL_CACHE: LazyLock<Arc<SchemaCache>> = LazyLock::new(|| Arc::new(SchemaCache::new()));

/// Cache from subject, and from id, to the last schema successfully resolved. Entries never
/// expire, a newer version registered under the same subject is only seen after
/// [`SchemaCache::invalidate`] or [`SchemaCache::clear`]. The requested version is not part of
/// the key, so once a subject is cached every version request for it gives the cached schema.
#[derive(Debug, Default)]
pub struct SchemaCache {
    by_subject: DashMap<String, Slot>,
    by_id: DashMap<u32, Slot>,
}

impl SchemaCache {
    pub fn new() -> SchemaCache {
        SchemaCache::default()
    }

    /// The instance shared by the whole process.
    pub fn global() -> Arc<SchemaCache> {
        GLOBAL_CACHE.clone()
    }

    pub fn get(&self, subject: &str) -> Option<Arc<RegisteredSchema>> {
        let slot = self.by_subject.get(subject)?.value().clone();
        read_slot(&slot)
    }

    pub fn get_by_id(&self, id: u32) -> Option<Arc<RegisteredSchema>> {
        let slot = self.by_id.get(&id)?.value().clone();
        read_slot(&slot)
    }

    /// Stores the schema for the subject, replacing what was there. It also becomes available by
    /// its id.
    pub fn put(&self, subject: &str, schema: RegisteredSchema) {
        let schema = Arc::new(schema);
        write_slot(&slot(&self.by_subject, String::from(subject)), schema.clone());
        self.remember_id(&schema);
    }

    /// Gives the cached schema for the subject, or gets it from the registry. A `version` of 0
    /// means the latest version. Errors from the registry are returned and not cached.
    pub fn resolve(
        &self,
        registry: &dyn SchemaRegistry,
        subject: &str,
        version: u32,
    ) -> Result<Arc<RegisteredSchema>, SRCError> {
        let schema = compute(
            &self.by_subject,
            String::from(subject),
            |_| true,
            || {
                debug!("schema for subject {} not cached, fetching", subject);
                if version == 0 {
                    registry.get_latest_schema(subject)
                } else {
                    registry.get_schema_by_version(subject, version)
                }
            },
        )?;
        self.remember_id(&schema);
        Ok(schema)
    }

    /// Creates the schema under the subject, unless the schema cached for the subject has the
    /// same text. A different schema for a known subject is registered again and replaces the
    /// cached one, so every distinct schema gets its own id.
    pub fn register(
        &self,
        registry: &dyn SchemaRegistry,
        subject: &str,
        schema: &str,
        schema_type: SchemaType,
    ) -> Result<Arc<RegisteredSchema>, SRCError> {
        let registered = compute(
            &self.by_subject,
            String::from(subject),
            |cached| cached.schema == schema,
            || {
                debug!("schema for subject {} not registered yet, registering", subject);
                registry.create_schema(subject, schema, schema_type)
            },
        )?;
        self.remember_id(&registered);
        Ok(registered)
    }

    /// Gives the cached schema with the id, or gets it from the registry.
    pub fn resolve_by_id(
        &self,
        registry: &dyn SchemaRegistry,
        id: u32,
    ) -> Result<Arc<RegisteredSchema>, SRCError> {
        compute(
            &self.by_id,
            id,
            |_| true,
            || {
                debug!("schema with id {} not cached, fetching", id);
                registry.get_schema_by_id(id)
            },
        )
    }

    /// Forgets the subject, the next resolve will go to the registry again.
    pub fn invalidate(&self, subject: &str) -> Option<Arc<RegisteredSchema>> {
        let (_, slot) = self.by_subject.remove(subject)?;
        read_slot(&slot)
    }

    pub fn clear(&self) {
        self.by_subject.clear();
        self.by_id.clear();
    }

    /// Number of subjects with a resolved schema.
    pub fn len(&self) -> usize {
        self.by_subject
            .iter()
            .filter(|entry| read_slot(entry.value()).is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn remember_id(&self, schema: &Arc<RegisteredSchema>) {
        let slot = slot(&self.by_id, schema.id);
        let mut guard = slot.lock().unwrap_or_else(PoisonError::into_inner);
        if guard.is_none() {
            *guard = Some(schema.clone());
        }
    }
}

// The shard lock is released when the entry guard is dropped at the end of this function.
fn slot<K: Eq + Hash>(map: &DashMap<K, Slot>, key: K) -> Slot {
    map.entry(key).or_default().value().clone()
}

// A slot whose fetch is still in flight reads as absent.
fn read_slot(slot: &Slot) -> Option<Arc<RegisteredSchema>> {
    match slot.try_lock() {
        Ok(guard) => guard.clone(),
        Err(TryLockError::Poisoned(e)) => e.into_inner().clone(),
        Err(TryLockError::WouldBlock) => None,
    }
}

fn write_slot(slot: &Slot, schema: Arc<RegisteredSchema>) {
    *slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(schema);
}

// A slot nobody is filling and that holds nothing.
fn is_empty_slot(slot: &Slot) -> bool {
    matches!(slot.try_lock(), Ok(guard) if guard.is_none())
}

// Gives the cached schema when `is_current` accepts it, otherwise fetches and stores a new one.
// When the fetch fails an empty slot is taken out of the map again.
fn compute<K, C, F>(
    map: &DashMap<K, Slot>,
    key: K,
    is_current: C,
    fetch: F,
) -> Result<Arc<RegisteredSchema>, SRCError>
where
    K: Eq + Hash + Clone,
    C: FnOnce(&RegisteredSchema) -> bool,
    F: FnOnce() -> Result<RegisteredSchema, SRCError>,
{
    let slot = slot(map, key.clone());
    let result = {
        let mut guard = slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(cached) = guard.as_ref() {
            if is_current(cached.as_ref()) {
                return Ok(cached.clone());
            }
        }
        fetch().map(|schema| {
            let schema = Arc::new(schema);
            *guard = Some(schema.clone());
            schema
        })
    };
    if result.is_err() {
        map.remove_if(&key, |_, slot| is_empty_slot(slot));
    }
    result
}
