use async_trait::async_trait;
use models::{IntroSourceFields, IntroSourceRecord};

use crate::errors::ServiceError;

/// CRUD operations on the intro source list.
///
/// Every call reflects the store's state at call time; nothing is cached.
#[async_trait]
pub trait IntroSourceRepository: Send + Sync {
    /// Every item with the fixed projection and no metadata.
    async fn list_all(&self) -> Result<Vec<IntroSourceRecord>, ServiceError>;

    /// One item with full metadata. `NotFound` when the store has no such item.
    async fn get_by_id(&self, id: i64) -> Result<IntroSourceRecord, ServiceError>;

    /// The item with the highest Id, or `None` for an empty list.
    async fn get_last(&self) -> Result<Option<IntroSourceRecord>, ServiceError>;

    /// Create a new item. Id and type marker are assigned by the store.
    async fn create(&self, fields: &IntroSourceFields) -> Result<(), ServiceError>;

    /// Replace the mutable fields of `record`, conditional on its concurrency tag.
    async fn update(&self, record: &IntroSourceRecord) -> Result<(), ServiceError>;

    /// Remove `record`, conditional on its concurrency tag.
    async fn delete(&self, record: &IntroSourceRecord) -> Result<(), ServiceError>;
}

pub(crate) fn require_positive_id(id: i64) -> Result<(), ServiceError> {
    if id <= 0 {
        return Err(ServiceError::Validation(format!("item id must be positive, got {id}")));
    }
    Ok(())
}

/// Mutations must carry the tag of the version they were read from.
pub(crate) fn require_tag(record: &IntroSourceRecord) -> Result<&str, ServiceError> {
    require_positive_id(record.id)?;
    record.concurrency_tag().ok_or_else(|| {
        ServiceError::Validation(format!("item {} has no concurrency tag; read it with full metadata first", record.id))
    })
}

/// In-memory stand-in for the list, used by controller tests
pub mod mock {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Mutex, MutexGuard};

    pub const MOCK_ENTITY_TYPE: &str = "SP.Data.Claas_x0020_Intro_x0020_SourceListItem";

    #[derive(Default)]
    struct Items {
        by_id: BTreeMap<i64, (u64, IntroSourceFields)>, // id -> (version, fields)
        next_id: i64,
    }

    /// Behaves like the list: assigns Ids, bumps versions, enforces if-match.
    #[derive(Default)]
    pub struct MockIntroSourceRepository {
        items: Mutex<Items>,
        unavailable: AtomicBool,
    }

    impl MockIntroSourceRepository {
        pub fn with_items<I: IntoIterator<Item = (i64, IntroSourceFields)>>(items: I) -> Self {
            let repo = Self::default();
            if let Ok(mut guard) = repo.items.lock() {
                for (id, fields) in items {
                    guard.by_id.insert(id, (1, fields));
                    guard.next_id = guard.next_id.max(id);
                }
            }
            repo
        }

        /// Make every subsequent call fail as if the site were unreachable.
        pub fn set_unavailable(&self, unavailable: bool) {
            self.unavailable.store(unavailable, Ordering::SeqCst);
        }

        pub fn len(&self) -> usize {
            self.items.lock().map(|g| g.by_id.len()).unwrap_or(0)
        }

        pub fn is_empty(&self) -> bool {
            self.len() == 0
        }

        fn lock(&self) -> Result<MutexGuard<'_, Items>, ServiceError> {
            if self.unavailable.load(Ordering::SeqCst) {
                return Err(ServiceError::Transport("site unavailable".into()));
            }
            self.items.lock().map_err(|_| ServiceError::Transport("mock store poisoned".into()))
        }

        fn full(id: i64, version: u64, fields: &IntroSourceFields) -> IntroSourceRecord {
            IntroSourceRecord {
                odata_type: Some(format!("#{MOCK_ENTITY_TYPE}")),
                etag: Some(format!("\"{version}\"")),
                id,
                fields: fields.clone(),
            }
        }

        fn check_tag(items: &Items, record: &IntroSourceRecord) -> Result<(), ServiceError> {
            let tag = require_tag(record)?;
            let (version, _) = items.by_id.get(&record.id).ok_or_else(|| ServiceError::not_found("intro source"))?;
            if tag != format!("\"{version}\"") {
                return Err(ServiceError::Conflict(format!("item {} was modified since {tag}", record.id)));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl IntroSourceRepository for MockIntroSourceRepository {
        async fn list_all(&self) -> Result<Vec<IntroSourceRecord>, ServiceError> {
            let items = self.lock()?;
            Ok(items
                .by_id
                .iter()
                .map(|(id, (_, fields))| IntroSourceRecord { odata_type: None, etag: None, id: *id, fields: fields.clone() })
                .collect())
        }

        async fn get_by_id(&self, id: i64) -> Result<IntroSourceRecord, ServiceError> {
            require_positive_id(id)?;
            let items = self.lock()?;
            items
                .by_id
                .get(&id)
                .map(|(version, fields)| Self::full(id, *version, fields))
                .ok_or_else(|| ServiceError::not_found("intro source"))
        }

        async fn get_last(&self) -> Result<Option<IntroSourceRecord>, ServiceError> {
            let items = self.lock()?;
            Ok(items.by_id.iter().next_back().map(|(id, (version, fields))| Self::full(*id, *version, fields)))
        }

        async fn create(&self, fields: &IntroSourceFields) -> Result<(), ServiceError> {
            fields.validate()?;
            let mut items = self.lock()?;
            items.next_id += 1;
            let id = items.next_id;
            items.by_id.insert(id, (1, fields.clone()));
            Ok(())
        }

        async fn update(&self, record: &IntroSourceRecord) -> Result<(), ServiceError> {
            let mut items = self.lock()?;
            Self::check_tag(&items, record)?;
            if let Some(entry) = items.by_id.get_mut(&record.id) {
                entry.0 += 1;
                entry.1 = record.fields.clone();
            }
            Ok(())
        }

        async fn delete(&self, record: &IntroSourceRecord) -> Result<(), ServiceError> {
            let mut items = self.lock()?;
            Self::check_tag(&items, record)?;
            items.by_id.remove(&record.id);
            Ok(())
        }
    }

}
