/// No-repeat random selection over the units of an idea list
use crate::combinations;
use crate::model::{IdeaList, UnitId};
use rand::Rng;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SelectError {
    /// The list has no ideas at all
    #[error("the list has no ideas")]
    ListEmpty,
    /// Every unit has already been shown since the last reset
    #[error("every idea in the list has already been shown")]
    Exhausted,
}

/// What to do when every unit of a list has been shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExhaustionPolicy {
    /// Report [`SelectError::Exhausted`] and leave the history alone
    #[default]
    Report,
    /// Clear the history and pick from the whole list again
    Restart,
}

impl FromStr for ExhaustionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "report" => Ok(ExhaustionPolicy::Report),
            "restart" => Ok(ExhaustionPolicy::Restart),
            other => Err(format!("unknown exhaustion policy: {}", other)),
        }
    }
}

/// A successful pick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub unit: UnitId,
    /// True when the history was cleared to make this pick possible
    pub restarted: bool,
}

/// Picks units that have not been shown yet
pub struct Selector<'a, R: Rng> {
    rng: &'a mut R,
    policy: ExhaustionPolicy,
}

impl<'a, R: Rng> Selector<'a, R> {
    pub fn new(rng: &'a mut R) -> Self {
        Selector {
            rng,
            policy: ExhaustionPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: ExhaustionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Pick a unit uniformly among those not in the history, and record it.
    ///
    /// The universe is recomputed on every call, so the result always
    /// reflects the current ideas and places.
    pub fn pick(&mut self, list: &mut IdeaList) -> Result<Selection, SelectError> {
        if list.ideas.is_empty() {
            return Err(SelectError::ListEmpty);
        }

        let mut restarted = false;
        let mut candidates = combinations::remaining(list);
        if candidates.is_empty() {
            match self.policy {
                ExhaustionPolicy::Report => return Err(SelectError::Exhausted),
                ExhaustionPolicy::Restart => {
                    Self::reset(list);
                    candidates = combinations::enumerate(list);
                    restarted = true;
                }
            }
        }

        let idx = self.rng.gen_range(0..candidates.len());
        let unit = candidates.swap_remove(idx);
        list.history.insert(unit);

        Ok(Selection { unit, restarted })
    }

    /// Forget every unit shown so far
    pub fn reset(list: &mut IdeaList) {
        list.history.clear();
    }
}
