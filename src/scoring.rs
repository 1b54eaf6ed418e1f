use serde::{Deserialize, Serialize};

use crate::sequence::{Responses, Sequence};

/// Outcome of one run. `score + mistakes == total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultSummary {
    pub score: usize,
    pub total: usize,
    pub accuracy: u32,
    pub mistakes: usize,
    pub time_used_secs: u32,
}

/// Expected vs recalled for one slot, for the comparison view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotVerdict {
    pub expected: String,
    pub recalled: Option<String>,
    pub correct: bool,
}

pub fn accuracy(score: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((score as f64 / total as f64) * 100.0).round() as u32
}

fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Per-discipline equality rule for one slot.
///
/// Cards compare rank and suit only. Words and names ignore case and
/// surrounding whitespace. Images and colors need the exact reference; the
/// same image picked for two slots is judged independently for each.
pub fn slot_correct(sequence: &Sequence, responses: &Responses, slot: usize) -> bool {
    match (sequence, responses) {
        (Sequence::Numbers(want), Responses::Numbers(got))
        | (Sequence::Binaries(want), Responses::Binaries(got)) => {
            match (want.chars().nth(slot), got.as_str().chars().nth(slot)) {
                (Some(w), Some(g)) => w == g,
                _ => false,
            }
        }
        (Sequence::Cards(want), Responses::Cards(got)) => {
            match (want.get(slot), got.get(slot).and_then(Option::as_ref)) {
                (Some(w), Some(g)) => w.same_face(g),
                _ => false,
            }
        }
        (Sequence::Words(want), Responses::Words(got)) => match (want.get(slot), got.get(slot)) {
            (Some(w), Some(g)) => !g.trim().is_empty() && normalize(w) == normalize(g),
            _ => false,
        },
        (Sequence::Names(want), Responses::Names(got)) => match (want.get(slot), got.get(slot)) {
            (Some(w), Some(g)) => !g.trim().is_empty() && normalize(&w.name) == normalize(g),
            _ => false,
        },
        (Sequence::Images(want), Responses::Images(got)) => {
            match (want.get(slot), got.get(slot).and_then(Option::as_ref)) {
                (Some(w), Some(g)) => w == g,
                _ => false,
            }
        }
        (Sequence::Colors(want), Responses::Colors(got)) => {
            match (want.get(slot), got.get(slot).copied().flatten()) {
                (Some(w), Some(g)) => *w == g,
                _ => false,
            }
        }
        _ => false,
    }
}

pub fn score(sequence: &Sequence, responses: &Responses, time_used_secs: u32) -> ResultSummary {
    let total = sequence.len();
    let score = (0..total)
        .filter(|&slot| slot_correct(sequence, responses, slot))
        .count();
    ResultSummary {
        score,
        total,
        accuracy: accuracy(score, total),
        mistakes: total - score,
        time_used_secs,
    }
}

pub fn verdicts(sequence: &Sequence, responses: &Responses) -> Vec<SlotVerdict> {
    (0..sequence.len())
        .map(|slot| SlotVerdict {
            expected: sequence.label(slot).unwrap_or_default(),
            recalled: responses.label(slot),
            correct: slot_correct(sequence, responses, slot),
        })
        .collect()
}
