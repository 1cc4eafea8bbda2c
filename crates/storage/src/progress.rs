use std::sync::Arc;

use quiz_core::model::{AnswerLists, ProgressCheckpoint};

use crate::repository::{KeyValueStore, StorageError};

pub const INDEX_KEY: &str = "progress.index";
pub const ANSWERS_KEY: &str = "progress.answers";

/// Durable resume state for a quiz flow, stored as two keys.
///
/// The index is written before the answers and the answers key alone decides
/// whether a checkpoint exists. The two writes are not atomic: a crash between
/// them leaves the new index paired with the previous answers.
#[derive(Clone)]
pub struct ProgressStore {
    kv: Arc<dyn KeyValueStore>,
}

impl ProgressStore {
    #[must_use]
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// Persist the current index and answers.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if encoding or either write fails.
    pub async fn save(&self, index: usize, answers: &AnswerLists) -> Result<(), StorageError> {
        let index_bytes =
            serde_json::to_vec(&index).map_err(|err| StorageError::Serialization(err.to_string()))?;
        let answer_bytes = serde_json::to_vec(answers)
            .map_err(|err| StorageError::Serialization(err.to_string()))?;

        self.kv.set(INDEX_KEY, &index_bytes).await?;
        self.kv.set(ANSWERS_KEY, &answer_bytes).await?;
        tracing::debug!(index, questions = answers.len(), "saved quiz progress");
        Ok(())
    }

    /// Load the last saved checkpoint, if any.
    ///
    /// A missing index next to present answers reads as index 0.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if stored bytes are corrupt, or a
    /// backend error if the store cannot be read.
    pub async fn load(&self) -> Result<Option<ProgressCheckpoint>, StorageError> {
        let Some(answer_bytes) = self.kv.get(ANSWERS_KEY).await? else {
            return Ok(None);
        };
        let answers: AnswerLists = serde_json::from_slice(&answer_bytes)
            .map_err(|err| StorageError::Serialization(err.to_string()))?;

        let index = match self.kv.get(INDEX_KEY).await? {
            Some(bytes) => serde_json::from_slice::<usize>(&bytes)
                .map_err(|err| StorageError::Serialization(err.to_string()))?,
            None => 0,
        };

        Ok(Some(ProgressCheckpoint::new(index, answers)))
    }

    /// Remove both keys; a following `load` returns `None`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    pub async fn clear(&self) -> Result<(), StorageError> {
        self.kv.remove(INDEX_KEY).await?;
        self.kv.remove(ANSWERS_KEY).await?;
        tracing::debug!("cleared quiz progress");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryStore;
    use quiz_core::model::{OptionId, QuestionId};

    fn store() -> (ProgressStore, InMemoryStore) {
        let kv = InMemoryStore::new();
        (ProgressStore::new(Arc::new(kv.clone())), kv)
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let (progress, _) = store();
        let mut answers = AnswerLists::new();
        answers.insert(QuestionId::new("q1"), vec![OptionId::new("a"), OptionId::new("b")]);

        progress.save(2, &answers).await.unwrap();
        let loaded = progress.load().await.unwrap().expect("checkpoint");
        assert_eq!(loaded.index, 2);

        let mut ids: Vec<_> = loaded.answers["q1"].iter().map(OptionId::as_str).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn clear_removes_checkpoint() {
        let (progress, kv) = store();
        progress.save(1, &AnswerLists::new()).await.unwrap();
        assert!(progress.load().await.unwrap().is_some());

        progress.clear().await.unwrap();
        assert!(progress.load().await.unwrap().is_none());
        assert_eq!(kv.get(INDEX_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn empty_store_loads_none() {
        let (progress, _) = store();
        assert!(progress.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn answers_key_is_the_sentinel() {
        let (progress, kv) = store();
        kv.set(INDEX_KEY, b"3").await.unwrap();
        assert!(progress.load().await.unwrap().is_none());

        kv.remove(INDEX_KEY).await.unwrap();
        kv.set(ANSWERS_KEY, br#"{"q1":["a"]}"#).await.unwrap();
        let loaded = progress.load().await.unwrap().expect("checkpoint");
        assert_eq!(loaded.index, 0);
    }

    /// Reads succeed, every write fails.
    struct ReadOnlyStore;

    #[async_trait::async_trait]
    impl KeyValueStore for ReadOnlyStore {
        async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, StorageError> {
            Ok(None)
        }

        async fn set(&self, _key: &str, _value: &[u8]) -> Result<(), StorageError> {
            Err(StorageError::Connection("read-only".into()))
        }

        async fn remove(&self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Connection("read-only".into()))
        }
    }

    #[tokio::test]
    async fn backend_write_failures_surface() {
        let progress = ProgressStore::new(Arc::new(ReadOnlyStore));
        let err = progress.save(1, &AnswerLists::new()).await.unwrap_err();
        assert!(matches!(err, StorageError::Connection(_)));
        assert!(progress.clear().await.is_err());
    }

    #[tokio::test]
    async fn corrupt_bytes_are_a_storage_failure() {
        let (progress, kv) = store();
        kv.set(ANSWERS_KEY, b"not json").await.unwrap();
        let err = progress.load().await.unwrap_err();
        assert!(matches!(err, StorageError::Serialization(_)));

        kv.set(ANSWERS_KEY, b"{}").await.unwrap();
        kv.set(INDEX_KEY, b"-1").await.unwrap();
        let err = progress.load().await.unwrap_err();
        assert!(matches!(err, StorageError::Serialization(_)));
    }
}
