/// Plain-text rendering of store results for the terminal
use crate::store::{ListSummary, ListView, PickResult};

pub fn pick(result: &PickResult) -> String {
    match result {
        PickResult::Shown {
            number,
            idea,
            place,
            restarted,
        } => {
            let mut out = String::new();
            if *restarted {
                out.push_str("Everything has been shown, starting over.\n");
            }
            out.push_str(&format!("Idea {}: {}", number, idea));
            if let Some(place) = place {
                out.push_str(&format!("\n  at {}", place));
            }
            out
        }
        PickResult::ListEmpty => "No ideas yet. Add one with 'add <text>'.".to_string(),
        PickResult::Exhausted => {
            "Every idea has been shown. Use 'reset' to start over.".to_string()
        }
    }
}

pub fn list(view: &ListView) -> String {
    let mut lines = vec![format!("{} ({}/{} shown)", view.name, view.shown, view.total)];
    if view.ideas.is_empty() {
        lines.push("  (empty)".to_string());
    }
    for idea in &view.ideas {
        let mark = if idea.used { "x" } else { " " };
        lines.push(format!("[{}] {}. {}", mark, idea.number, idea.text));
        for place in &idea.places {
            let mark = if place.used { "x" } else { " " };
            lines.push(format!("    [{}] {}) {}", mark, place.position, place.text));
        }
    }
    lines.join("\n")
}

pub fn lists(summaries: &[ListSummary]) -> String {
    summaries
        .iter()
        .map(|s| {
            let marker = if s.active { "*" } else { " " };
            format!("{} {} ({}): {} ideas", marker, s.name, s.key, s.ideas)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
