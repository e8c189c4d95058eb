/// Chat persistence trait and implementations
///
/// This module provides an async trait for loading and saving the lists of a
/// chat scope, with implementations for both filesystem-based and in-memory
/// storage. Both go through the same JSON serialization and validate records
/// on the way in.
use async_trait::async_trait;
use std::collections::HashMap;
#[cfg(feature = "tokio-runtime")]
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use crate::model::ChatLists;

/// Error types for chat persistence
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("serialization error: {0}")]
    Serialize(String),
    #[error("invalid stored data for chat '{chat}': {reason}")]
    Invalid { chat: String, reason: String },
    #[error("chat id {0:?} cannot be used as a file name")]
    InvalidChatId(String),
}

impl From<std::io::Error> for PersistError {
    fn from(e: std::io::Error) -> Self {
        PersistError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for PersistError {
    fn from(e: serde_json::Error) -> Self {
        PersistError::Serialize(e.to_string())
    }
}

/// Async trait for chat storage
///
/// Implementations must make `save` all-or-nothing: after a failed save
/// the previously stored state is still what `load` returns.
#[async_trait]
pub trait ChatRepository: Send + Sync {
    /// Load the lists of a chat, or `None` if the chat has never been saved
    async fn load(&self, chat: &str) -> Result<Option<ChatLists>, PersistError>;

    /// Store the lists of a chat, replacing what was there
    async fn save(&self, chat: &str, lists: &ChatLists) -> Result<(), PersistError>;
}

fn decode(chat: &str, raw: &str) -> Result<ChatLists, PersistError> {
    let lists: ChatLists = serde_json::from_str(raw)?;
    lists.validate().map_err(|reason| PersistError::Invalid {
        chat: chat.to_string(),
        reason,
    })?;
    Ok(lists)
}

fn encode(lists: &ChatLists) -> Result<String, PersistError> {
    Ok(serde_json::to_string_pretty(lists)?)
}

/// Filesystem-based repository
///
/// Keeps one JSON file per chat in a base directory. Writes go to a
/// temporary file first and are renamed into place, so a crash mid-write
/// leaves the previous file intact.
///
/// Only available with the `tokio-runtime` feature (not on WASM).
#[cfg(feature = "tokio-runtime")]
pub struct FolderRepository {
    base_path: PathBuf,
}

#[cfg(feature = "tokio-runtime")]
impl FolderRepository {
    /// Create a new FolderRepository storing files under `base_path`
    ///
    /// The directory is created on first save.
    ///
    /// # Example
    /// ```no_run
    /// use idea_roulette::repository::FolderRepository;
    /// use std::path::PathBuf;
    ///
    /// let repository = FolderRepository::new(PathBuf::from("./data"));
    /// ```
    pub fn new(base_path: PathBuf) -> Self {
        FolderRepository { base_path }
    }

    /// File that holds a chat's lists
    ///
    /// Ids are used verbatim; anything outside `[A-Za-z0-9_-]` is rejected.
    pub fn chat_path(&self, chat: &str) -> Result<PathBuf, PersistError> {
        let safe = !chat.is_empty()
            && chat
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !safe {
            return Err(PersistError::InvalidChatId(chat.to_string()));
        }
        Ok(self.base_path.join(format!("{}.json", chat)))
    }
}

#[cfg(feature = "tokio-runtime")]
#[async_trait]
impl ChatRepository for FolderRepository {
    async fn load(&self, chat: &str) -> Result<Option<ChatLists>, PersistError> {
        let path = self.chat_path(chat)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(raw) => decode(chat, &raw).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, chat: &str, lists: &ChatLists) -> Result<(), PersistError> {
        use tokio::io::AsyncWriteExt;

        let path = self.chat_path(chat)?;
        let tmp_path = path.with_extension("json.tmp");
        let content = encode(lists)?;

        tokio::fs::create_dir_all(&self.base_path).await?;

        let mut file = tokio::fs::File::create(&tmp_path).await?;
        file.write_all(content.as_bytes()).await?;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        if let Err(e) = tokio::fs::rename(&tmp_path, &path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(e.into());
        }

        tracing::trace!(chat, path = %path.display(), "chat saved");
        Ok(())
    }
}

/// In-memory chat store
///
/// Keeps serialized chats in memory, useful for testing and for running
/// without a data directory.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    chats: Arc<RwLock<HashMap<String, String>>>,
    fail_writes: Arc<AtomicBool>,
}

impl InMemoryRepository {
    /// Create a new empty InMemoryRepository
    ///
    /// # Example
    /// ```
    /// use idea_roulette::repository::InMemoryRepository;
    ///
    /// let repository = InMemoryRepository::new();
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following save fail (or succeed again)
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Store raw JSON for a chat, bypassing validation
    pub fn insert_raw(&self, chat: impl Into<String>, raw: impl Into<String>) {
        let mut chats = self.chats.write().unwrap_or_else(|e| e.into_inner());
        chats.insert(chat.into(), raw.into());
    }

    /// Raw JSON currently stored for a chat
    pub fn raw(&self, chat: &str) -> Option<String> {
        let chats = self.chats.read().unwrap_or_else(|e| e.into_inner());
        chats.get(chat).cloned()
    }

    /// Check if a chat has been saved
    pub fn contains(&self, chat: &str) -> bool {
        let chats = self.chats.read().unwrap_or_else(|e| e.into_inner());
        chats.contains_key(chat)
    }
}

#[async_trait]
impl ChatRepository for InMemoryRepository {
    async fn load(&self, chat: &str) -> Result<Option<ChatLists>, PersistError> {
        match self.raw(chat) {
            Some(raw) => decode(chat, &raw).map(Some),
            None => Ok(None),
        }
    }

    async fn save(&self, chat: &str, lists: &ChatLists) -> Result<(), PersistError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(PersistError::Io("simulated write failure".to_string()));
        }
        let content = encode(lists)?;
        self.insert_raw(chat, content);
        Ok(())
    }
}
