/// Idea Roulette - no-repeat random picks from curated leisure ideas
///
/// Ideas live in named lists, one set of lists per chat. Each idea can carry
/// places; every (idea, place) pair is picked on its own, and an idea without
/// places is picked as itself. Picks never repeat until the history is reset,
/// and any change to the ideas or places of a list resets it.
///
/// # Example
///
/// ```
/// # tokio_test::block_on(async {
/// use idea_roulette::{IdeaStore, InMemoryRepository, PickResult};
/// use std::sync::Arc;
///
/// let store = IdeaStore::with_seed(Arc::new(InMemoryRepository::new()), 42);
/// store.add_idea("chat-1", "Bike ride").await.unwrap();
///
/// let first = store.pick("chat-1").await.unwrap();
/// assert!(matches!(first, PickResult::Shown { .. }));
/// assert_eq!(store.pick("chat-1").await.unwrap(), PickResult::Exhausted);
/// # });
/// ```
pub mod combinations;
pub mod command;
pub mod config;
pub mod diagnostic;
pub mod format;
pub mod model;
pub mod repository;
pub mod selector;
pub mod span;
pub mod store;

/// Re-export main types for convenience
pub use config::Config;
pub use model::{ChatLists, Idea, IdeaList, Place, UnitId};
pub use repository::{ChatRepository, InMemoryRepository, PersistError};
pub use selector::{ExhaustionPolicy, SelectError, Selection, Selector};
pub use store::{
    IdeaStore, IdeaView, ListSummary, ListView, Missing, PickResult, PlaceView, StoreError,
};

#[cfg(feature = "tokio-runtime")]
pub use repository::FolderRepository;

use std::sync::Arc;

/// Build a store from configuration, backed by the configured data directory
///
/// # Example
/// ```no_run
/// use idea_roulette::{open_store, Config};
///
/// let store = open_store(&Config::from_env());
/// ```
#[cfg(feature = "tokio-runtime")]
pub fn open_store(config: &Config) -> IdeaStore {
    let repository: Arc<dyn ChatRepository> =
        Arc::new(FolderRepository::new(config.data_dir.clone()));
    store_with(repository, config)
}

/// Build a store over any repository, applying the seed and exhaustion policy
pub fn store_with(repository: Arc<dyn ChatRepository>, config: &Config) -> IdeaStore {
    let store = match config.seed {
        Some(seed) => IdeaStore::with_seed(repository, seed),
        None => IdeaStore::new(repository),
    };
    store.with_policy(config.on_exhausted)
}
