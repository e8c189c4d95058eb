use idea_roulette::combinations;
use idea_roulette::{IdeaStore, InMemoryRepository, PickResult};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Helper function to build a store with a fixed seed
fn store(seed: u64) -> IdeaStore {
    IdeaStore::with_seed(Arc::new(InMemoryRepository::new()), seed)
}

/// Helper to unpack a shown pick
fn shown(result: PickResult) -> (String, Option<String>) {
    match result {
        PickResult::Shown { idea, place, .. } => (idea, place),
        other => panic!("expected an idea, got {:?}", other),
    }
}

#[tokio::test]
async fn test_single_idea_without_places() {
    let store = store(1);
    store.add_idea("chat", "Bike ride").await.unwrap();

    let (idea, place) = shown(store.pick("chat").await.unwrap());
    assert_eq!(idea, "Bike ride");
    assert_eq!(place, None);

    let view = store.list_all("chat").await.unwrap();
    assert_eq!(view.shown, 1);

    assert_eq!(store.pick("chat").await.unwrap(), PickResult::Exhausted);
}

#[tokio::test]
async fn test_places_are_picked_individually() {
    let store = store(2);
    store.add_idea("chat", "Picnic").await.unwrap();
    store.add_place("chat", 1, "Park A").await.unwrap();
    store.add_place("chat", 1, "Park B").await.unwrap();

    assert_eq!(store.list_all("chat").await.unwrap().total, 2);

    let mut places = HashSet::new();
    for _ in 0..2 {
        let (idea, place) = shown(store.pick("chat").await.unwrap());
        assert_eq!(idea, "Picnic");
        assert!(places.insert(place.unwrap()));
    }
    assert_eq!(
        places,
        HashSet::from(["Park A".to_string(), "Park B".to_string()])
    );
    assert_eq!(store.pick("chat").await.unwrap(), PickResult::Exhausted);
}

#[tokio::test]
async fn test_delete_idea_renumbers_and_resets() {
    let store = store(3);
    for text in ["First", "Second", "Third"] {
        store.add_idea("chat", text).await.unwrap();
    }
    // Use up everything before the deletion
    for _ in 0..3 {
        shown(store.pick("chat").await.unwrap());
    }
    assert_eq!(store.pick("chat").await.unwrap(), PickResult::Exhausted);

    assert_eq!(store.delete_idea("chat", 1).await.unwrap(), "First");

    let view = store.list_all("chat").await.unwrap();
    let numbered: Vec<(usize, &str)> = view
        .ideas
        .iter()
        .map(|i| (i.number, i.text.as_str()))
        .collect();
    assert_eq!(numbered, vec![(1, "Second"), (2, "Third")]);
    assert_eq!(view.shown, 0);

    let mut seen = HashSet::new();
    for _ in 0..2 {
        seen.insert(shown(store.pick("chat").await.unwrap()).0);
    }
    assert_eq!(
        seen,
        HashSet::from(["Second".to_string(), "Third".to_string()])
    );
}

#[tokio::test]
async fn test_add_place_changes_universe_and_resets() {
    let store = store(4);
    store.add_idea("chat", "Museum").await.unwrap();
    store.add_idea("chat", "Cinema").await.unwrap();
    shown(store.pick("chat").await.unwrap());
    assert_eq!(store.list_all("chat").await.unwrap().total, 2);

    store.add_place("chat", 2, "Odeon").await.unwrap();
    store.add_place("chat", 2, "Rex").await.unwrap();

    let view = store.list_all("chat").await.unwrap();
    assert_eq!(view.shown, 0);
    // Museum alone, plus one unit per cinema
    assert_eq!(view.total, 3);

    let mut seen = HashSet::new();
    for _ in 0..3 {
        assert!(seen.insert(shown(store.pick("chat").await.unwrap())));
    }
    assert!(seen.contains(&("Cinema".to_string(), Some("Odeon".to_string()))));
    assert!(!seen.contains(&("Cinema".to_string(), None)));
}

#[tokio::test]
async fn test_every_mutation_resets_history() {
    let store = store(5);
    store.add_idea("chat", "A").await.unwrap();
    store.add_idea("chat", "B").await.unwrap();
    store.add_place("chat", 2, "X").await.unwrap();
    store.add_place("chat", 2, "Y").await.unwrap();

    async fn exhaust(store: &IdeaStore) {
        while let PickResult::Shown { .. } = store.pick("chat").await.unwrap() {}
    }

    exhaust(&store).await;
    store.delete_place("chat", 2, 1).await.unwrap();
    assert_eq!(store.list_all("chat").await.unwrap().shown, 0);

    exhaust(&store).await;
    store.add_idea("chat", "C").await.unwrap();
    assert_eq!(store.list_all("chat").await.unwrap().shown, 0);

    exhaust(&store).await;
    store.reset_history("chat").await.unwrap();
    assert_eq!(store.list_all("chat").await.unwrap().shown, 0);
}

#[tokio::test]
async fn test_no_repeat_until_exhausted() {
    let store = store(6);
    let places = [0usize, 3, 1, 0, 2];
    for (i, count) in places.iter().enumerate() {
        let number = store.add_idea("chat", &format!("idea {}", i)).await.unwrap();
        for p in 0..*count {
            store
                .add_place("chat", number, &format!("place {}", p))
                .await
                .unwrap();
        }
    }

    let expected: usize = places.iter().map(|p| (*p).max(1)).sum();
    assert_eq!(store.list_all("chat").await.unwrap().total, expected);

    let mut seen = HashSet::new();
    for _ in 0..expected {
        assert!(seen.insert(shown(store.pick("chat").await.unwrap())));
    }
    assert_eq!(store.pick("chat").await.unwrap(), PickResult::Exhausted);
}

#[tokio::test]
async fn test_weight_follows_place_count() {
    // An idea with three places surfaces three times as often as a first pick
    let trials = 6_000;
    let mut counts: HashMap<String, usize> = HashMap::new();
    for seed in 0..trials {
        let store = store(seed);
        store.add_idea("chat", "Walk").await.unwrap();
        store.add_idea("chat", "Cafe").await.unwrap();
        for place in ["North", "South", "East"] {
            store.add_place("chat", 2, place).await.unwrap();
        }
        let (idea, _) = shown(store.pick("chat").await.unwrap());
        *counts.entry(idea).or_default() += 1;
    }

    let walk = counts["Walk"] as f64 / trials as f64;
    let cafe = counts["Cafe"] as f64 / trials as f64;
    assert!((walk - 0.25).abs() < 0.03, "walk frequency {}", walk);
    assert!((cafe - 0.75).abs() < 0.03, "cafe frequency {}", cafe);
}

#[test]
fn test_universe_size_formula() {
    let mut list = idea_roulette::IdeaList::new("Formula");
    for places in [2usize, 0, 5, 1] {
        let number = list.push_idea("idea");
        let idea = list.idea_mut(number).unwrap();
        for _ in 0..places {
            idea.places.push(idea_roulette::Place::new("p"));
        }
    }
    assert_eq!(combinations::universe_size(&list), 2 + 1 + 5 + 1);
    assert_eq!(combinations::enumerate(&list).len(), 9);
}
