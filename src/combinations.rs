/// Expands an idea list into the units a pick can choose from
use crate::model::{Idea, IdeaList, Place, UnitId};

/// Enumerate every unit of the list, in idea order and then place order.
///
/// An idea without places yields one unit for itself; an idea with places
/// yields one unit per place and none for the idea alone.
pub fn enumerate(list: &IdeaList) -> Vec<UnitId> {
    let mut units = Vec::with_capacity(universe_size(list));
    for idea in &list.ideas {
        if idea.places.is_empty() {
            units.push(UnitId::idea_alone(idea.number));
        } else {
            units.extend((0..idea.places.len()).map(|pos| UnitId::with_place(idea.number, pos)));
        }
    }
    units
}

/// Number of units in the list without building them
pub fn universe_size(list: &IdeaList) -> usize {
    list.ideas.iter().map(|idea| idea.places.len().max(1)).sum()
}

/// Units of the list that are not in its history yet
pub fn remaining(list: &IdeaList) -> Vec<UnitId> {
    enumerate(list)
        .into_iter()
        .filter(|unit| !list.is_used(unit))
        .collect()
}

/// Map a unit back to the idea and place it stands for
pub fn resolve<'l>(list: &'l IdeaList, unit: &UnitId) -> Option<(&'l Idea, Option<&'l Place>)> {
    let idea = list.idea(unit.idea)?;
    match unit.place {
        None if idea.places.is_empty() => Some((idea, None)),
        None => None,
        Some(pos) => idea.places.get(pos).map(|place| (idea, Some(place))),
    }
}
