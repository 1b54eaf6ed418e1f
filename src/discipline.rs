use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// The seven drill types. Fixed for the lifetime of a run.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Discipline {
    Numbers,
    Binaries,
    Cards,
    Words,
    #[serde(rename = "NAMES_FACES")]
    Names,
    Images,
    Colors,
}

impl Discipline {
    pub const ALL: [Discipline; 7] = [
        Discipline::Numbers,
        Discipline::Binaries,
        Discipline::Cards,
        Discipline::Words,
        Discipline::Names,
        Discipline::Images,
        Discipline::Colors,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Discipline::Numbers => "Numbers",
            Discipline::Binaries => "Binaries",
            Discipline::Cards => "Cards",
            Discipline::Words => "Words",
            Discipline::Names => "Faces",
            Discipline::Images => "Images",
            Discipline::Colors => "Colors",
        }
    }

    /// Numbers and binaries are recalled into one continuous text buffer.
    pub fn is_buffered(&self) -> bool {
        matches!(self, Discipline::Numbers | Discipline::Binaries)
    }

    /// Words and names are recalled by typing one entry per slot.
    pub fn is_typed_per_slot(&self) -> bool {
        matches!(self, Discipline::Words | Discipline::Names)
    }

    /// Cards, images and colors are recalled by picking from a fixed set.
    pub fn is_picked(&self) -> bool {
        matches!(
            self,
            Discipline::Cards | Discipline::Images | Discipline::Colors
        )
    }

    /// Characters a buffered recall accepts.
    pub fn accepts(&self, c: char) -> bool {
        match self {
            Discipline::Numbers => c.is_ascii_digit(),
            Discipline::Binaries => c == '0' || c == '1',
            _ => false,
        }
    }

    /// Number of raw items shown as one navigable unit while memorizing.
    pub fn effective_group(&self, grouping: usize) -> usize {
        if self.is_buffered() {
            grouping.max(1)
        } else {
            1
        }
    }

    /// Number of navigable memorize positions for `quantity` items.
    pub fn memorize_positions(&self, quantity: usize, grouping: usize) -> usize {
        quantity.div_ceil(self.effective_group(grouping))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grouping_only_applies_to_buffered_disciplines() {
        assert_eq!(Discipline::Numbers.memorize_positions(20, 3), 7);
        assert_eq!(Discipline::Binaries.memorize_positions(24, 6), 4);
        assert_eq!(Discipline::Cards.memorize_positions(20, 3), 20);
        assert_eq!(Discipline::Colors.memorize_positions(1, 4), 1);
    }

    #[test]
    fn buffered_alphabets() {
        assert!(Discipline::Numbers.accepts('7'));
        assert!(!Discipline::Numbers.accepts('a'));
        assert!(Discipline::Binaries.accepts('1'));
        assert!(!Discipline::Binaries.accepts('2'));
        assert!(!Discipline::Words.accepts('1'));
    }

    #[test]
    fn serialized_names_match_history_layout() {
        assert_eq!(
            serde_json::to_string(&Discipline::Names).unwrap(),
            "\"NAMES_FACES\""
        );
        assert_eq!(
            serde_json::to_string(&Discipline::Numbers).unwrap(),
            "\"NUMBERS\""
        );
        let d: Discipline = serde_json::from_str("\"COLORS\"").unwrap();
        assert_eq!(d, Discipline::Colors);
    }

    #[test]
    fn input_families_partition_disciplines() {
        for d in Discipline::ALL {
            let families = [d.is_buffered(), d.is_typed_per_slot(), d.is_picked()];
            assert_eq!(families.iter().filter(|f| **f).count(), 1, "{d}");
        }
    }
}
