use std::fmt;

use serde::{Deserialize, Serialize};

use crate::discipline::Discipline;
use crate::error::RecallError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Suit {
    Spades,
    Hearts,
    Diamonds,
    Clubs,
}

impl Suit {
    /// Deck order used for the recall picker.
    pub const ALL: [Suit; 4] = [Suit::Spades, Suit::Hearts, Suit::Clubs, Suit::Diamonds];

    pub fn symbol(&self) -> char {
        match self {
            Suit::Spades => '♠',
            Suit::Hearts => '♥',
            Suit::Diamonds => '♦',
            Suit::Clubs => '♣',
        }
    }

    pub fn is_red(&self) -> bool {
        matches!(self, Suit::Hearts | Suit::Diamonds)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rank {
    Ace,
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Jack,
    Queen,
    King,
}

impl Rank {
    pub const ALL: [Rank; 13] = [
        Rank::Ace,
        Rank::Two,
        Rank::Three,
        Rank::Four,
        Rank::Five,
        Rank::Six,
        Rank::Seven,
        Rank::Eight,
        Rank::Nine,
        Rank::Ten,
        Rank::Jack,
        Rank::Queen,
        Rank::King,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Rank::Ace => "A",
            Rank::Two => "2",
            Rank::Three => "3",
            Rank::Four => "4",
            Rank::Five => "5",
            Rank::Six => "6",
            Rank::Seven => "7",
            Rank::Eight => "8",
            Rank::Nine => "9",
            Rank::Ten => "10",
            Rank::Jack => "J",
            Rank::Queen => "Q",
            Rank::King => "K",
        }
    }
}

/// Rank and suit; the only parts of a card that count when scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CardFace {
    pub rank: Rank,
    pub suit: Suit,
}

impl fmt::Display for CardFace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.rank.label(), self.suit.symbol())
    }
}

/// A card in a specific slot. `id` stays unique across concatenated decks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: String,
    pub face: CardFace,
}

impl Card {
    pub fn new(rank: Rank, suit: Suit) -> Self {
        let face = CardFace { rank, suit };
        Self {
            id: face.to_string(),
            face,
        }
    }

    pub fn same_face(&self, other: &Card) -> bool {
        self.face == other.face
    }
}

/// Unshuffled 52-card deck, suit by suit.
pub fn standard_deck() -> Vec<Card> {
    Suit::ALL
        .iter()
        .flat_map(|&suit| Rank::ALL.iter().map(move |&rank| Card::new(rank, suit)))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameFace {
    pub name: String,
    pub portrait: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageRef(pub String);

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaletteColor {
    Red,
    Orange,
    Yellow,
    Green,
    Cyan,
    Blue,
    Purple,
    Pink,
    Grey,
    Black,
}

impl PaletteColor {
    pub const ALL: [PaletteColor; 10] = [
        PaletteColor::Red,
        PaletteColor::Orange,
        PaletteColor::Yellow,
        PaletteColor::Green,
        PaletteColor::Cyan,
        PaletteColor::Blue,
        PaletteColor::Purple,
        PaletteColor::Pink,
        PaletteColor::Grey,
        PaletteColor::Black,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            PaletteColor::Red => "Red",
            PaletteColor::Orange => "Orange",
            PaletteColor::Yellow => "Yellow",
            PaletteColor::Green => "Green",
            PaletteColor::Cyan => "Cyan",
            PaletteColor::Blue => "Blue",
            PaletteColor::Purple => "Purple",
            PaletteColor::Pink => "Pink",
            PaletteColor::Grey => "Grey",
            PaletteColor::Black => "Black",
        }
    }

    pub fn rgb(&self) -> (u8, u8, u8) {
        match self {
            PaletteColor::Red => (0xef, 0x44, 0x44),
            PaletteColor::Orange => (0xf9, 0x73, 0x16),
            PaletteColor::Yellow => (0xea, 0xb3, 0x08),
            PaletteColor::Green => (0x22, 0xc5, 0x5e),
            PaletteColor::Cyan => (0x06, 0xb6, 0xd4),
            PaletteColor::Blue => (0x3b, 0x82, 0xf6),
            PaletteColor::Purple => (0xa8, 0x55, 0xf7),
            PaletteColor::Pink => (0xec, 0x48, 0x99),
            PaletteColor::Grey => (0x64, 0x74, 0x8b),
            PaletteColor::Black => (0x0f, 0x17, 0x2a),
        }
    }
}

/// Ground truth for one run. Generated once and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sequence {
    Numbers(String),
    Binaries(String),
    Cards(Vec<Card>),
    Words(Vec<String>),
    Names(Vec<NameFace>),
    Images(Vec<ImageRef>),
    Colors(Vec<PaletteColor>),
}

impl Sequence {
    pub fn discipline(&self) -> Discipline {
        match self {
            Sequence::Numbers(_) => Discipline::Numbers,
            Sequence::Binaries(_) => Discipline::Binaries,
            Sequence::Cards(_) => Discipline::Cards,
            Sequence::Words(_) => Discipline::Words,
            Sequence::Names(_) => Discipline::Names,
            Sequence::Images(_) => Discipline::Images,
            Sequence::Colors(_) => Discipline::Colors,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Sequence::Numbers(s) | Sequence::Binaries(s) => s.chars().count(),
            Sequence::Cards(v) => v.len(),
            Sequence::Words(v) => v.len(),
            Sequence::Names(v) => v.len(),
            Sequence::Images(v) => v.len(),
            Sequence::Colors(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Display text for one slot.
    pub fn label(&self, slot: usize) -> Option<String> {
        match self {
            Sequence::Numbers(s) | Sequence::Binaries(s) => {
                s.chars().nth(slot).map(|c| c.to_string())
            }
            Sequence::Cards(v) => v.get(slot).map(|c| c.face.to_string()),
            Sequence::Words(v) => v.get(slot).cloned(),
            Sequence::Names(v) => v.get(slot).map(|n| n.name.clone()),
            Sequence::Images(v) => v.get(slot).map(|i| i.to_string()),
            Sequence::Colors(v) => v.get(slot).map(|c| c.name().to_string()),
        }
    }
}

/// One recall input for a picked or typed slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Card(Card),
    Text(String),
    Image(ImageRef),
    Color(PaletteColor),
}

impl Answer {
    pub fn kind(&self) -> &'static str {
        match self {
            Answer::Card(_) => "card",
            Answer::Text(_) => "text",
            Answer::Image(_) => "image",
            Answer::Color(_) => "color",
        }
    }

    pub fn label(&self) -> String {
        match self {
            Answer::Card(c) => c.face.to_string(),
            Answer::Text(t) => t.clone(),
            Answer::Image(i) => i.to_string(),
            Answer::Color(c) => c.name().to_string(),
        }
    }
}

/// Continuous typed recall for numbers and binaries.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TypedBuffer {
    text: String,
    capacity: usize,
}

impl TypedBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            text: String::with_capacity(capacity),
            capacity,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn push(&mut self, c: char) -> bool {
        if self.text.len() >= self.capacity {
            return false;
        }
        self.text.push(c);
        true
    }

    fn pop(&mut self) -> bool {
        self.text.pop().is_some()
    }
}

/// The user's recall, one slot per sequence item. Length is fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Responses {
    Numbers(TypedBuffer),
    Binaries(TypedBuffer),
    Cards(Vec<Option<Card>>),
    Words(Vec<String>),
    Names(Vec<String>),
    Images(Vec<Option<ImageRef>>),
    Colors(Vec<Option<PaletteColor>>),
}

impl Responses {
    pub fn unanswered(sequence: &Sequence) -> Self {
        let n = sequence.len();
        match sequence.discipline() {
            Discipline::Numbers => Responses::Numbers(TypedBuffer::new(n)),
            Discipline::Binaries => Responses::Binaries(TypedBuffer::new(n)),
            Discipline::Cards => Responses::Cards(vec![None; n]),
            Discipline::Words => Responses::Words(vec![String::new(); n]),
            Discipline::Names => Responses::Names(vec![String::new(); n]),
            Discipline::Images => Responses::Images(vec![None; n]),
            Discipline::Colors => Responses::Colors(vec![None; n]),
        }
    }

    pub fn discipline(&self) -> Discipline {
        match self {
            Responses::Numbers(_) => Discipline::Numbers,
            Responses::Binaries(_) => Discipline::Binaries,
            Responses::Cards(_) => Discipline::Cards,
            Responses::Words(_) => Discipline::Words,
            Responses::Names(_) => Discipline::Names,
            Responses::Images(_) => Discipline::Images,
            Responses::Colors(_) => Discipline::Colors,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Responses::Numbers(b) | Responses::Binaries(b) => b.capacity(),
            Responses::Cards(v) => v.len(),
            Responses::Words(v) | Responses::Names(v) => v.len(),
            Responses::Images(v) => v.len(),
            Responses::Colors(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn buffer(&self) -> Option<&str> {
        match self {
            Responses::Numbers(b) | Responses::Binaries(b) => Some(b.as_str()),
            _ => None,
        }
    }

    pub fn is_answered(&self, slot: usize) -> bool {
        match self {
            Responses::Numbers(b) | Responses::Binaries(b) => slot < b.as_str().len(),
            Responses::Cards(v) => v.get(slot).is_some_and(Option::is_some),
            Responses::Words(v) | Responses::Names(v) => {
                v.get(slot).is_some_and(|t| !t.trim().is_empty())
            }
            Responses::Images(v) => v.get(slot).is_some_and(Option::is_some),
            Responses::Colors(v) => v.get(slot).is_some_and(Option::is_some),
        }
    }

    pub fn answered_count(&self) -> usize {
        (0..self.len()).filter(|&i| self.is_answered(i)).count()
    }

    /// Recalled text for one slot, if any.
    pub fn label(&self, slot: usize) -> Option<String> {
        if !self.is_answered(slot) {
            return None;
        }
        match self {
            Responses::Numbers(b) | Responses::Binaries(b) => {
                b.as_str().chars().nth(slot).map(|c| c.to_string())
            }
            Responses::Cards(v) => v[slot].as_ref().map(|c| c.face.to_string()),
            Responses::Words(v) | Responses::Names(v) => Some(v[slot].clone()),
            Responses::Images(v) => v[slot].as_ref().map(|i| i.to_string()),
            Responses::Colors(v) => v[slot].map(|c| c.name().to_string()),
        }
    }

    fn check_slot(&self, slot: usize) -> Result<(), RecallError> {
        let len = self.len();
        if slot >= len {
            return Err(RecallError::SlotOutOfRange { slot, len });
        }
        Ok(())
    }

    /// Stores `answer` in `slot`, returning whether the slot already held one.
    pub fn record(&mut self, slot: usize, answer: Answer) -> Result<bool, RecallError> {
        self.check_slot(slot)?;
        let was_answered = self.is_answered(slot);
        let discipline = self.discipline();
        match (self, answer) {
            (Responses::Numbers(_) | Responses::Binaries(_), _) => {
                return Err(RecallError::BufferOnly(discipline))
            }
            (Responses::Cards(v), Answer::Card(card)) => v[slot] = Some(card),
            (Responses::Words(v) | Responses::Names(v), Answer::Text(text)) => v[slot] = text,
            (Responses::Images(v), Answer::Image(image)) => v[slot] = Some(image),
            (Responses::Colors(v), Answer::Color(color)) => v[slot] = Some(color),
            (_, other) => {
                return Err(RecallError::WrongAnswerKind {
                    discipline,
                    answer: other.kind(),
                })
            }
        }
        Ok(was_answered)
    }

    pub fn clear(&mut self, slot: usize) -> Result<(), RecallError> {
        self.check_slot(slot)?;
        let discipline = self.discipline();
        match self {
            Responses::Numbers(_) | Responses::Binaries(_) => {
                return Err(RecallError::BufferOnly(discipline))
            }
            Responses::Cards(v) => v[slot] = None,
            Responses::Words(v) | Responses::Names(v) => v[slot].clear(),
            Responses::Images(v) => v[slot] = None,
            Responses::Colors(v) => v[slot] = None,
        }
        Ok(())
    }

    /// Current text of a typed slot.
    pub fn text(&self, slot: usize) -> Option<&str> {
        match self {
            Responses::Words(v) | Responses::Names(v) => v.get(slot).map(String::as_str),
            _ => None,
        }
    }

    /// Appends `c` to the buffer if it belongs to the discipline's alphabet.
    pub fn type_char(&mut self, c: char) -> bool {
        let discipline = self.discipline();
        match self {
            Responses::Numbers(b) | Responses::Binaries(b) if discipline.accepts(c) => b.push(c),
            _ => false,
        }
    }

    pub fn backspace(&mut self) -> bool {
        match self {
            Responses::Numbers(b) | Responses::Binaries(b) => b.pop(),
            _ => false,
        }
    }
}
