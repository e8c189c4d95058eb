/// Per-chat idea store
///
/// [`IdeaStore`] is the single entry point the front end talks to. It owns
/// the lists of every chat scope it has seen, serializes operations within a
/// chat, and persists every change through a [`ChatRepository`] before making
/// it visible in memory.
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use crate::combinations;
use crate::model::{list_key, ChatLists, IdeaList, Place, UnitId};
use crate::repository::{ChatRepository, PersistError};
use crate::selector::{ExhaustionPolicy, SelectError, Selector};

/// Something a request referred to that does not exist
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Missing {
    #[error("idea {0}")]
    Idea(usize),
    #[error("place {place} of idea {idea}")]
    Place { idea: usize, place: usize },
    #[error("list '{0}'")]
    List(String),
}

/// Errors returned by store operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(Missing),
    #[error("a list with key '{0}' already exists")]
    DuplicateKey(String),
    #[error("list name must contain visible characters")]
    InvalidName,
    #[error("the last list of a chat cannot be deleted")]
    LastListProtected,
    #[error("persistence failed: {0}")]
    Persistence(#[from] PersistError),
}

/// Outcome of a pick request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickResult {
    Shown {
        /// Number of the idea at the time of the pick
        number: usize,
        idea: String,
        place: Option<String>,
        /// The history was cleared because everything had been shown
        restarted: bool,
    },
    /// The active list has no ideas
    ListEmpty,
    /// Every idea and place has been shown since the last reset
    Exhausted,
}

/// A place as shown in a listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceView {
    /// 1-based position within the idea
    pub position: usize,
    pub text: String,
    pub used: bool,
}

/// An idea as shown in a listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdeaView {
    pub number: usize,
    pub text: String,
    pub places: Vec<PlaceView>,
    /// True when every unit of this idea has been shown
    pub used: bool,
}

/// Read-only snapshot of the active list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListView {
    pub key: String,
    pub name: String,
    pub ideas: Vec<IdeaView>,
    /// Units shown since the last reset
    pub shown: usize,
    /// All units in the list
    pub total: usize,
}

/// One entry of the list overview
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListSummary {
    pub key: String,
    pub name: String,
    pub ideas: usize,
    pub active: bool,
}

type ChatSlot = Arc<tokio::sync::Mutex<Option<ChatLists>>>;

/// Owns the lists of every chat and serves picks from them
pub struct IdeaStore<R: Rng + Send = StdRng> {
    repository: Arc<dyn ChatRepository>,
    chats: RwLock<HashMap<String, ChatSlot>>,
    rng: Mutex<R>,
    policy: ExhaustionPolicy,
}

impl IdeaStore<StdRng> {
    /// Create a store with an entropy-seeded RNG
    pub fn new(repository: Arc<dyn ChatRepository>) -> Self {
        Self::with_rng(repository, StdRng::from_entropy())
    }

    /// Create a store with a deterministic RNG
    pub fn with_seed(repository: Arc<dyn ChatRepository>, seed: u64) -> Self {
        Self::with_rng(repository, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng + Send> IdeaStore<R> {
    pub fn with_rng(repository: Arc<dyn ChatRepository>, rng: R) -> Self {
        IdeaStore {
            repository,
            chats: RwLock::new(HashMap::new()),
            rng: Mutex::new(rng),
            policy: ExhaustionPolicy::default(),
        }
    }

    /// Set what happens when a list runs out of unseen ideas
    pub fn with_policy(mut self, policy: ExhaustionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> ExhaustionPolicy {
        self.policy
    }

    fn slot(&self, chat: &str) -> ChatSlot {
        {
            let chats = self.chats.read().unwrap_or_else(|e| e.into_inner());
            if let Some(slot) = chats.get(chat) {
                return Arc::clone(slot);
            }
        }
        let mut chats = self.chats.write().unwrap_or_else(|e| e.into_inner());
        Arc::clone(chats.entry(chat.to_string()).or_default())
    }

    /// Run `op` against a copy of the chat's lists while holding the chat lock.
    ///
    /// When `op` reports a change, the copy is persisted and only then
    /// replaces the in-memory state. On any error nothing changes.
    async fn with_chat<T, F>(&self, chat: &str, op: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut ChatLists) -> Result<(T, bool), StoreError>,
    {
        let slot = self.slot(chat);
        let mut guard = slot.lock().await;

        let current = match guard.take() {
            Some(lists) => lists,
            None => match self.repository.load(chat).await? {
                Some(lists) => {
                    debug!(chat, lists = lists.lists.len(), "chat loaded");
                    lists
                }
                None => {
                    debug!(chat, "new chat, starting with default list");
                    ChatLists::new_default()
                }
            },
        };

        let mut working = current.clone();
        let (value, changed) = match op(&mut working) {
            Ok(result) => result,
            Err(e) => {
                *guard = Some(current);
                return Err(e);
            }
        };

        if changed {
            if let Err(e) = self.repository.save(chat, &working).await {
                warn!(chat, error = %e, "failed to persist chat, change discarded");
                *guard = Some(current);
                return Err(e.into());
            }
            *guard = Some(working);
        } else {
            *guard = Some(current);
        }
        Ok(value)
    }

    /// Pick an idea from the active list that has not been shown yet
    pub async fn pick(&self, chat: &str) -> Result<PickResult, StoreError> {
        self.with_chat(chat, |lists| {
            let key = lists.active.clone();
            let list = active_mut(lists)?;

            let selection = {
                let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
                Selector::new(&mut *rng).with_policy(self.policy).pick(list)
            };

            match selection {
                Ok(selection) => {
                    if selection.restarted {
                        warn!(chat, list = %key, "all ideas shown, history restarted");
                    }
                    let (idea, place) = combinations::resolve(list, &selection.unit)
                        .ok_or(StoreError::NotFound(Missing::Idea(selection.unit.idea)))?;
                    let result = PickResult::Shown {
                        number: idea.number,
                        idea: idea.text.clone(),
                        place: place.map(|p| p.text.clone()),
                        restarted: selection.restarted,
                    };
                    debug!(chat, list = %key, unit = ?selection.unit, shown = list.history.len(), "picked");
                    Ok((result, true))
                }
                Err(SelectError::ListEmpty) => Ok((PickResult::ListEmpty, false)),
                Err(SelectError::Exhausted) => {
                    debug!(chat, list = %key, "list exhausted");
                    Ok((PickResult::Exhausted, false))
                }
            }
        })
        .await
    }

    /// Forget what has been shown from the active list
    pub async fn reset_history(&self, chat: &str) -> Result<(), StoreError> {
        self.with_chat(chat, |lists| {
            let list = active_mut(lists)?;
            Selector::<R>::reset(list);
            debug!(chat, "history reset");
            Ok(((), true))
        })
        .await
    }

    /// Append an idea to the active list and return its number
    pub async fn add_idea(&self, chat: &str, text: &str) -> Result<usize, StoreError> {
        self.with_chat(chat, |lists| {
            let list = active_mut(lists)?;
            let number = list.push_idea(text);
            Selector::<R>::reset(list);
            debug!(chat, number, "idea added");
            Ok((number, true))
        })
        .await
    }

    /// Delete an idea by number and return its text
    pub async fn delete_idea(&self, chat: &str, number: usize) -> Result<String, StoreError> {
        self.with_chat(chat, |lists| {
            let list = active_mut(lists)?;
            let removed = list
                .remove_idea(number)
                .ok_or(StoreError::NotFound(Missing::Idea(number)))?;
            Selector::<R>::reset(list);
            debug!(chat, number, remaining = list.ideas.len(), "idea deleted");
            Ok((removed.text, true))
        })
        .await
    }

    /// Attach a place to an idea
    pub async fn add_place(&self, chat: &str, number: usize, text: &str) -> Result<(), StoreError> {
        self.with_chat(chat, |lists| {
            let list = active_mut(lists)?;
            let idea = list
                .idea_mut(number)
                .ok_or(StoreError::NotFound(Missing::Idea(number)))?;
            idea.places.push(Place::new(text));
            let places = idea.places.len();
            Selector::<R>::reset(list);
            debug!(chat, number, places, "place added");
            Ok(((), true))
        })
        .await
    }

    /// Remove a place (1-based position) from an idea and return its text
    pub async fn delete_place(
        &self,
        chat: &str,
        number: usize,
        position: usize,
    ) -> Result<String, StoreError> {
        self.with_chat(chat, |lists| {
            let list = active_mut(lists)?;
            let idea = list
                .idea_mut(number)
                .ok_or(StoreError::NotFound(Missing::Idea(number)))?;
            let idx = position
                .checked_sub(1)
                .filter(|idx| *idx < idea.places.len())
                .ok_or(StoreError::NotFound(Missing::Place {
                    idea: number,
                    place: position,
                }))?;
            let removed = idea.places.remove(idx);
            Selector::<R>::reset(list);
            debug!(chat, number, position, "place deleted");
            Ok((removed.text, true))
        })
        .await
    }

    /// Snapshot of the active list, with shown flags per unit
    pub async fn list_all(&self, chat: &str) -> Result<ListView, StoreError> {
        self.with_chat(chat, |lists| {
            let key = lists.active.clone();
            let list = active_mut(lists)?;
            Ok((view_of(key, list), false))
        })
        .await
    }

    /// Overview of every list in the chat
    pub async fn lists(&self, chat: &str) -> Result<Vec<ListSummary>, StoreError> {
        self.with_chat(chat, |lists| {
            let summaries = lists
                .lists
                .iter()
                .map(|(key, list)| ListSummary {
                    key: key.clone(),
                    name: list.name.clone(),
                    ideas: list.ideas.len(),
                    active: *key == lists.active,
                })
                .collect();
            Ok((summaries, false))
        })
        .await
    }

    /// Create a list, make it active and return its key
    pub async fn create_list(&self, chat: &str, name: &str) -> Result<String, StoreError> {
        self.with_chat(chat, |lists| {
            let key = list_key(name).ok_or(StoreError::InvalidName)?;
            if lists.lists.contains_key(&key) {
                return Err(StoreError::DuplicateKey(key));
            }
            lists.lists.insert(key.clone(), IdeaList::new(name.trim()));
            lists.active = key.clone();
            info!(chat, list = %key, "list created");
            Ok((key, true))
        })
        .await
    }

    /// Delete a list by key or display name and return the key of the
    /// active list afterwards
    pub async fn delete_list(&self, chat: &str, name: &str) -> Result<String, StoreError> {
        self.with_chat(chat, |lists| {
            let key = existing_key(lists, name)?;
            if lists.lists.len() == 1 {
                return Err(StoreError::LastListProtected);
            }
            lists.lists.remove(&key);
            if lists.active == key {
                if let Some(next) = lists.lists.keys().next() {
                    lists.active = next.clone();
                }
            }
            info!(chat, list = %key, active = %lists.active, "list deleted");
            Ok((lists.active.clone(), true))
        })
        .await
    }

    /// Make another list active, by key or display name
    pub async fn switch_list(&self, chat: &str, name: &str) -> Result<(), StoreError> {
        self.with_chat(chat, |lists| {
            let key = existing_key(lists, name)?;
            let changed = lists.active != key;
            info!(chat, list = %key, "list activated");
            lists.active = key;
            Ok(((), changed))
        })
        .await
    }
}

/// Resolve a key or display name to the key of an existing list
fn existing_key(lists: &ChatLists, name: &str) -> Result<String, StoreError> {
    list_key(name)
        .filter(|key| lists.lists.contains_key(key))
        .ok_or_else(|| StoreError::NotFound(Missing::List(name.trim().to_string())))
}

fn active_mut(lists: &mut ChatLists) -> Result<&mut IdeaList, StoreError> {
    let key = lists.active.clone();
    lists
        .active_list_mut()
        .ok_or(StoreError::NotFound(Missing::List(key)))
}

fn view_of(key: String, list: &IdeaList) -> ListView {
    let ideas = list
        .ideas
        .iter()
        .map(|idea| {
            let places: Vec<PlaceView> = idea
                .places
                .iter()
                .enumerate()
                .map(|(pos, place)| PlaceView {
                    position: pos + 1,
                    text: place.text.clone(),
                    used: list.is_used(&UnitId::with_place(idea.number, pos)),
                })
                .collect();
            let used = if places.is_empty() {
                list.is_used(&UnitId::idea_alone(idea.number))
            } else {
                places.iter().all(|p| p.used)
            };
            IdeaView {
                number: idea.number,
                text: idea.text.clone(),
                places,
                used,
            }
        })
        .collect();

    let units = combinations::enumerate(list);
    ListView {
        key,
        name: list.name.clone(),
        ideas,
        shown: units.iter().filter(|u| list.is_used(u)).count(),
        total: units.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryRepository;

    fn store() -> (IdeaStore, InMemoryRepository) {
        let repository = InMemoryRepository::new();
        let store = IdeaStore::with_seed(Arc::new(repository.clone()), 7);
        (store, repository)
    }

    #[tokio::test]
    async fn test_new_chat_has_default_list() {
        let (store, repository) = store();
        let lists = store.lists("1").await.unwrap();
        assert_eq!(lists.len(), 1);
        assert!(lists[0].active);
        assert_eq!(lists[0].name, "Ideas");
        // Reading does not persist anything
        assert!(!repository.contains("1"));
    }

    #[tokio::test]
    async fn test_add_idea_persists() {
        let (store, repository) = store();
        assert_eq!(store.add_idea("1", "Bike ride").await.unwrap(), 1);
        assert_eq!(store.add_idea("1", "Picnic").await.unwrap(), 2);
        assert!(repository.raw("1").unwrap().contains("Picnic"));
    }

    #[tokio::test]
    async fn test_pick_empty_list() {
        let (store, _) = store();
        assert_eq!(store.pick("1").await.unwrap(), PickResult::ListEmpty);
    }

    #[tokio::test]
    async fn test_delete_idea_not_found() {
        let (store, _) = store();
        store.add_idea("1", "Bike ride").await.unwrap();
        assert_eq!(
            store.delete_idea("1", 2).await,
            Err(StoreError::NotFound(Missing::Idea(2)))
        );
        assert_eq!(
            store.delete_idea("1", 0).await,
            Err(StoreError::NotFound(Missing::Idea(0)))
        );
    }

    #[tokio::test]
    async fn test_delete_place_positions_are_one_based() {
        let (store, _) = store();
        store.add_idea("1", "Picnic").await.unwrap();
        store.add_place("1", 1, "Park A").await.unwrap();
        store.add_place("1", 1, "Park B").await.unwrap();

        assert_eq!(
            store.delete_place("1", 1, 0).await,
            Err(StoreError::NotFound(Missing::Place { idea: 1, place: 0 }))
        );
        assert_eq!(store.delete_place("1", 1, 2).await.unwrap(), "Park B");
        assert_eq!(
            store.delete_place("1", 2, 1).await,
            Err(StoreError::NotFound(Missing::Idea(2)))
        );
    }

    #[tokio::test]
    async fn test_list_view_flags() {
        let (store, _) = store();
        store.add_idea("1", "Picnic").await.unwrap();
        store.add_place("1", 1, "Park A").await.unwrap();

        let before = store.list_all("1").await.unwrap();
        assert_eq!((before.shown, before.total), (0, 1));
        assert!(!before.ideas[0].used);

        store.pick("1").await.unwrap();
        let after = store.list_all("1").await.unwrap();
        assert_eq!((after.shown, after.total), (1, 1));
        assert!(after.ideas[0].used);
        assert!(after.ideas[0].places[0].used);
        assert_eq!(after.ideas[0].places[0].position, 1);
    }

    #[tokio::test]
    async fn test_create_list_rules() {
        let (store, _) = store();
        assert_eq!(store.create_list("1", "Rainy Day").await.unwrap(), "rainy-day");
        assert_eq!(
            store.create_list("1", "rainy   day").await,
            Err(StoreError::DuplicateKey("rainy-day".to_string()))
        );
        assert_eq!(store.create_list("1", "  ").await, Err(StoreError::InvalidName));

        let view = store.list_all("1").await.unwrap();
        assert_eq!(view.key, "rainy-day");
        assert_eq!(view.name, "Rainy Day");
        assert!(view.ideas.is_empty());
    }

    #[tokio::test]
    async fn test_delete_last_list_protected() {
        let (store, _) = store();
        assert_eq!(
            store.delete_list("1", "ideas").await,
            Err(StoreError::LastListProtected)
        );
        assert_eq!(
            store.delete_list("1", "missing").await,
            Err(StoreError::NotFound(Missing::List("missing".to_string())))
        );
    }

    #[tokio::test]
    async fn test_delete_active_list_switches() {
        let (store, _) = store();
        store.create_list("1", "Weekend").await.unwrap();
        assert_eq!(store.delete_list("1", "weekend").await.unwrap(), "ideas");
        let lists = store.lists("1").await.unwrap();
        assert_eq!(lists.len(), 1);
        assert!(lists[0].active);
    }

    #[tokio::test]
    async fn test_delete_inactive_list_keeps_active() {
        let (store, _) = store();
        store.create_list("1", "Weekend").await.unwrap();
        store.create_list("1", "Rainy Day").await.unwrap();

        assert_eq!(store.delete_list("1", "weekend").await.unwrap(), "rainy-day");
        let active: Vec<String> = store
            .lists("1")
            .await
            .unwrap()
            .into_iter()
            .filter(|l| l.active)
            .map(|l| l.key)
            .collect();
        assert_eq!(active, vec!["rainy-day".to_string()]);
    }

    #[tokio::test]
    async fn test_delete_active_list_picks_first_remaining_key() {
        let (store, _) = store();
        store.create_list("1", "Weekend").await.unwrap();
        store.create_list("1", "Beach").await.unwrap();
        store.create_list("1", "Zoo").await.unwrap();

        // Remaining keys in order: beach, ideas, weekend
        assert_eq!(store.delete_list("1", "zoo").await.unwrap(), "beach");
        assert_eq!(store.list_all("1").await.unwrap().key, "beach");

        assert_eq!(store.delete_list("1", "beach").await.unwrap(), "ideas");
        assert_eq!(store.lists("1").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_switch_and_delete_accept_display_names() {
        let (store, _) = store();
        store.create_list("1", "Rainy Day").await.unwrap();
        store.switch_list("1", "ideas").await.unwrap();

        store.switch_list("1", "Rainy Day").await.unwrap();
        assert_eq!(store.list_all("1").await.unwrap().key, "rainy-day");

        store.switch_list("1", "  RAINY   day ").await.unwrap();
        assert_eq!(store.delete_list("1", "Rainy Day").await.unwrap(), "ideas");
        assert_eq!(
            store.switch_list("1", "Rainy Day").await,
            Err(StoreError::NotFound(Missing::List("Rainy Day".to_string())))
        );
        assert_eq!(
            store.switch_list("1", "   ").await,
            Err(StoreError::NotFound(Missing::List(String::new())))
        );
    }

    #[tokio::test]
    async fn test_switch_list_keeps_history() {
        let (store, _) = store();
        store.add_idea("1", "Bike ride").await.unwrap();
        store.pick("1").await.unwrap();

        store.create_list("1", "Weekend").await.unwrap();
        store.switch_list("1", "ideas").await.unwrap();
        assert_eq!(store.pick("1").await.unwrap(), PickResult::Exhausted);

        assert_eq!(
            store.switch_list("1", "nope").await,
            Err(StoreError::NotFound(Missing::List("nope".to_string())))
        );
    }
}
