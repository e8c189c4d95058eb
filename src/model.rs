/// Data records for idea lists, ideas and places
///
/// Everything here is plain data with a fixed schema. The records are
/// serialized as-is by the repository layer and checked with
/// [`ChatLists::validate`] whenever they cross that boundary.
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Display name of the list every new chat starts with
pub const DEFAULT_LIST_NAME: &str = "Ideas";

/// A place attached to an idea
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Place {
    #[serde(alias = "name")]
    pub text: String,
}

impl Place {
    pub fn new(text: impl Into<String>) -> Self {
        Place { text: text.into() }
    }
}

/// A single leisure idea
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Idea {
    /// 1-based display number, always equal to the position in the list
    #[serde(alias = "id")]
    pub number: usize,
    pub text: String,
    #[serde(default)]
    pub places: Vec<Place>,
}

/// Identifier of one selectable unit.
///
/// Only meaningful for the list state it was computed from: any change to
/// the idea or place sequence shifts what a given identifier points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UnitId {
    /// 1-based idea number
    pub idea: usize,
    /// 0-based place position, `None` for an idea without places
    pub place: Option<usize>,
}

impl UnitId {
    pub fn idea_alone(idea: usize) -> Self {
        UnitId { idea, place: None }
    }

    pub fn with_place(idea: usize, place: usize) -> Self {
        UnitId {
            idea,
            place: Some(place),
        }
    }
}

/// A named list of ideas together with its pick history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdeaList {
    pub name: String,
    #[serde(default)]
    pub ideas: Vec<Idea>,
    /// Units shown since the last reset
    #[serde(default)]
    pub history: BTreeSet<UnitId>,
}

impl IdeaList {
    pub fn new(name: impl Into<String>) -> Self {
        IdeaList {
            name: name.into(),
            ideas: Vec::new(),
            history: BTreeSet::new(),
        }
    }

    /// Look up an idea by its 1-based number
    pub fn idea(&self, number: usize) -> Option<&Idea> {
        number.checked_sub(1).and_then(|idx| self.ideas.get(idx))
    }

    pub fn idea_mut(&mut self, number: usize) -> Option<&mut Idea> {
        number.checked_sub(1).and_then(move |idx| self.ideas.get_mut(idx))
    }

    /// Append an idea and return its number
    pub fn push_idea(&mut self, text: impl Into<String>) -> usize {
        let number = self.ideas.len() + 1;
        self.ideas.push(Idea {
            number,
            text: text.into(),
            places: Vec::new(),
        });
        number
    }

    /// Remove an idea by number, renumbering the ones after it
    pub fn remove_idea(&mut self, number: usize) -> Option<Idea> {
        let idx = number.checked_sub(1).filter(|idx| *idx < self.ideas.len())?;
        let removed = self.ideas.remove(idx);
        self.renumber();
        Some(removed)
    }

    /// Make idea numbers match positions again (1..N)
    pub fn renumber(&mut self) {
        for (idx, idea) in self.ideas.iter_mut().enumerate() {
            idea.number = idx + 1;
        }
    }

    pub fn is_used(&self, unit: &UnitId) -> bool {
        self.history.contains(unit)
    }
}

/// All lists belonging to one chat scope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredChat")]
pub struct ChatLists {
    pub lists: BTreeMap<String, IdeaList>,
    /// Key of the active list
    pub active: String,
}

/// On-disk shape of a chat, which may lack an active list
#[derive(Deserialize)]
struct StoredChat {
    #[serde(default)]
    lists: BTreeMap<String, IdeaList>,
    #[serde(default, alias = "current_list")]
    active: Option<String>,
}

impl From<StoredChat> for ChatLists {
    fn from(stored: StoredChat) -> Self {
        match stored.active {
            Some(active) => ChatLists {
                lists: stored.lists,
                active,
            },
            // A chat that never had a list starts like a new one
            None if stored.lists.is_empty() => ChatLists::new_default(),
            None => {
                let active = stored.lists.keys().next().cloned().unwrap_or_default();
                ChatLists {
                    lists: stored.lists,
                    active,
                }
            }
        }
    }
}

impl ChatLists {
    /// A fresh chat scope with a single, active default list
    pub fn new_default() -> Self {
        let mut lists = BTreeMap::new();
        let key = list_key(DEFAULT_LIST_NAME).unwrap_or_else(|| DEFAULT_LIST_NAME.to_lowercase());
        lists.insert(key.clone(), IdeaList::new(DEFAULT_LIST_NAME));
        ChatLists {
            lists,
            active: key,
        }
    }

    pub fn active_list(&self) -> Option<&IdeaList> {
        self.lists.get(&self.active)
    }

    pub fn active_list_mut(&mut self) -> Option<&mut IdeaList> {
        self.lists.get_mut(&self.active)
    }

    /// Check the invariants every stored chat must satisfy
    pub fn validate(&self) -> Result<(), String> {
        if self.lists.is_empty() {
            return Err("chat has no lists".to_string());
        }
        if !self.lists.contains_key(&self.active) {
            return Err(format!("active list '{}' does not exist", self.active));
        }
        for (key, list) in &self.lists {
            for (idx, idea) in list.ideas.iter().enumerate() {
                if idea.number != idx + 1 {
                    return Err(format!(
                        "list '{}': idea at position {} is numbered {}",
                        key,
                        idx + 1,
                        idea.number
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Derive a list key from a display name.
///
/// Returns `None` when the name has no visible characters.
pub fn list_key(name: &str) -> Option<String> {
    let key = name
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-");
    if key.is_empty() {
        None
    } else {
        Some(key)
    }
}
