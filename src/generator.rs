use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::bank::EmbeddedBank;
use crate::config::Locale;
use crate::discipline::Discipline;
use crate::error::GenerationError;
use crate::sequence::{standard_deck, Card, ImageRef, NameFace, PaletteColor, Sequence};

const FALLBACK_WORDS_EN: [&str; 20] = [
    "Apple", "Bicycle", "Cat", "Dog", "Elephant", "Feather", "Guitar", "House", "Ice", "Jacket",
    "Kite", "Lamp", "Moon", "Notebook", "Orange", "Piano", "Queen", "Robot", "Sun", "Tree",
];

const FALLBACK_WORDS_UK: [&str; 20] = [
    "Яблуко", "Велосипед", "Кіт", "Собака", "Слон", "Перо", "Гітара", "Будинок", "Лід", "Куртка",
    "Змій", "Лампа", "Місяць", "Зошит", "Апельсин", "Піаніно", "Королева", "Робот", "Сонце",
    "Дерево",
];

const FALLBACK_NAMES_EN: [&str; 10] = [
    "John Smith",
    "Maria Garcia",
    "Wei Chen",
    "Ahmed Khan",
    "Sarah Jones",
    "Dmitry Ivanov",
    "Yuki Tanaka",
    "Emma Wilson",
    "Carlos Rodriguez",
    "Fatima Al-Sayed",
];

const FALLBACK_NAMES_UK: [&str; 10] = [
    "Іван Петренко",
    "Марія Коваль",
    "Олександр Бойко",
    "Тетяна Шевченко",
    "Андрій Мельник",
    "Ольга Ткаченко",
    "Микола Бондар",
    "Юлія Кравченко",
    "Сергій Олійник",
    "Наталія Лисенко",
];

const IMAGE_SEED_LEN: usize = 7;
const SEED_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Which external list a discipline needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Words,
    Names,
}

impl ListKind {
    pub fn file_stem(&self) -> &'static str {
        match self {
            ListKind::Words => "words",
            ListKind::Names => "names",
        }
    }
}

/// External producer of word or name lists. May fail in any way; callers
/// never see the failure because [`ContentGenerator`] falls back.
pub trait ListSource: Send + Sync {
    fn generate(&self, quantity: usize, locale: Locale) -> Result<Vec<String>, GenerationError>;
}

/// Fixed local list for `kind`, cycled to exactly `quantity` entries.
pub fn fallback_list(kind: ListKind, locale: Locale, quantity: usize) -> Vec<String> {
    let base: &[&str] = match (kind, locale) {
        (ListKind::Words, Locale::En) => &FALLBACK_WORDS_EN,
        (ListKind::Words, Locale::Uk) => &FALLBACK_WORDS_UK,
        (ListKind::Names, Locale::En) => &FALLBACK_NAMES_EN,
        (ListKind::Names, Locale::Uk) => &FALLBACK_NAMES_UK,
    };
    base.iter()
        .cycle()
        .take(quantity)
        .map(|s| s.to_string())
        .collect()
}

/// Validates a source's output: blanks, empty or short lists are failures,
/// extra entries are dropped.
pub fn checked_list(
    result: Result<Vec<String>, GenerationError>,
    quantity: usize,
) -> Result<Vec<String>, GenerationError> {
    let mut items = result?;
    if items.is_empty() {
        return Err(GenerationError::Empty);
    }
    if items.iter().any(|s| s.trim().is_empty()) {
        return Err(GenerationError::Malformed("blank entry".into()));
    }
    if items.len() < quantity {
        return Err(GenerationError::Short {
            wanted: quantity,
            got: items.len(),
        });
    }
    items.truncate(quantity);
    Ok(items.into_iter().map(|s| s.trim().to_string()).collect())
}

/// Stable portrait reference for a name.
pub fn portrait_for(name: &str) -> String {
    let seed: String = name
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-");
    format!("avatar:{seed}")
}

pub fn digits<R: Rng + ?Sized>(quantity: usize, rng: &mut R) -> String {
    (0..quantity)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

pub fn bits<R: Rng + ?Sized>(quantity: usize, rng: &mut R) -> String {
    (0..quantity)
        .map(|_| if rng.gen_bool(0.5) { '1' } else { '0' })
        .collect()
}

/// Independently shuffled decks, concatenated and cut to `quantity`.
/// Slot ids carry the deck number so repeats stay distinguishable.
pub fn cards<R: Rng + ?Sized>(quantity: usize, rng: &mut R) -> Vec<Card> {
    let decks = quantity.div_ceil(52);
    let mut out = Vec::with_capacity(decks * 52);
    for deck_no in 0..decks {
        let mut deck = standard_deck();
        deck.shuffle(rng);
        out.extend(deck.into_iter().map(|mut card| {
            card.id = format!("{deck_no}-{}", card.id);
            card
        }));
    }
    out.truncate(quantity);
    out
}

/// Distinct random image seeds.
pub fn images<R: Rng + ?Sized>(quantity: usize, rng: &mut R) -> Vec<ImageRef> {
    let mut seen = HashSet::with_capacity(quantity);
    let mut out = Vec::with_capacity(quantity);
    while out.len() < quantity {
        let seed: String = (0..IMAGE_SEED_LEN)
            .map(|_| char::from(SEED_ALPHABET[rng.gen_range(0..SEED_ALPHABET.len())]))
            .collect();
        if seen.insert(seed.clone()) {
            out.push(ImageRef(format!("picsum:{seed}")));
        }
    }
    out
}

pub fn colors<R: Rng + ?Sized>(quantity: usize, rng: &mut R) -> Vec<PaletteColor> {
    (0..quantity)
        .map(|_| PaletteColor::ALL[rng.gen_range(0..PaletteColor::ALL.len())])
        .collect()
}

/// Produces the sequence for a run. Always succeeds with exactly `quantity`
/// items; list-source failures are logged and replaced by fallback lists.
pub struct ContentGenerator {
    words: Box<dyn ListSource>,
    names: Box<dyn ListSource>,
}

impl ContentGenerator {
    pub fn new(words: Box<dyn ListSource>, names: Box<dyn ListSource>) -> Self {
        Self { words, names }
    }

    /// Generator backed by the embedded banks.
    pub fn bundled() -> Self {
        Self::new(
            Box::new(EmbeddedBank::new(ListKind::Words)),
            Box::new(EmbeddedBank::new(ListKind::Names)),
        )
    }

    fn list(&self, kind: ListKind, quantity: usize, locale: Locale) -> Vec<String> {
        let source = match kind {
            ListKind::Words => &self.words,
            ListKind::Names => &self.names,
        };
        match checked_list(source.generate(quantity, locale), quantity) {
            Ok(items) => items,
            Err(err) => {
                tracing::warn!(
                    ?kind,
                    quantity,
                    %locale,
                    %err,
                    "list source failed, using fallback list"
                );
                fallback_list(kind, locale, quantity)
            }
        }
    }

    pub fn generate<R: Rng + ?Sized>(
        &self,
        discipline: Discipline,
        quantity: usize,
        locale: Locale,
        rng: &mut R,
    ) -> Sequence {
        let sequence = match discipline {
            Discipline::Numbers => Sequence::Numbers(digits(quantity, rng)),
            Discipline::Binaries => Sequence::Binaries(bits(quantity, rng)),
            Discipline::Cards => Sequence::Cards(cards(quantity, rng)),
            Discipline::Words => Sequence::Words(self.list(ListKind::Words, quantity, locale)),
            Discipline::Names => Sequence::Names(
                self.list(ListKind::Names, quantity, locale)
                    .into_iter()
                    .map(|name| NameFace {
                        portrait: portrait_for(&name),
                        name,
                    })
                    .collect(),
            ),
            Discipline::Images => Sequence::Images(images(quantity, rng)),
            Discipline::Colors => Sequence::Colors(colors(quantity, rng)),
        };
        tracing::debug!(%discipline, quantity, "generated sequence");
        sequence
    }
}

impl Default for ContentGenerator {
    fn default() -> Self {
        Self::bundled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashMap;

    struct Failing;

    impl ListSource for Failing {
        fn generate(&self, _: usize, _: Locale) -> Result<Vec<String>, GenerationError> {
            Err(GenerationError::Unavailable("offline".into()))
        }
    }

    struct Fixed(Vec<&'static str>);

    impl ListSource for Fixed {
        fn generate(&self, _: usize, _: Locale) -> Result<Vec<String>, GenerationError> {
            Ok(self.0.iter().map(|s| s.to_string()).collect())
        }
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(0x5eed)
    }

    #[test]
    fn every_discipline_yields_quantity_items() {
        let generator = ContentGenerator::bundled();
        let mut rng = rng();
        for discipline in Discipline::ALL {
            for quantity in [1, 5, 52, 53, 130] {
                let seq = generator.generate(discipline, quantity, Locale::En, &mut rng);
                assert_eq!(seq.len(), quantity, "{discipline} x{quantity}");
                assert_eq!(seq.discipline(), discipline);
            }
        }
    }

    #[test]
    fn digits_and_bits_stay_in_alphabet() {
        let mut rng = rng();
        assert!(digits(200, &mut rng).chars().all(|c| c.is_ascii_digit()));
        assert!(bits(200, &mut rng).chars().all(|c| c == '0' || c == '1'));
    }

    #[test]
    fn single_deck_is_a_permutation() {
        let mut rng = rng();
        let hand = cards(52, &mut rng);
        let mut faces: Vec<String> = hand.iter().map(|c| c.face.to_string()).collect();
        faces.sort();
        faces.dedup();
        assert_eq!(faces.len(), 52);
    }

    #[test]
    fn multi_deck_ids_stay_unique() {
        let mut rng = rng();
        let hand = cards(110, &mut rng);
        let ids: HashSet<_> = hand.iter().map(|c| c.id.clone()).collect();
        assert_eq!(ids.len(), 110);
        let mut per_face: HashMap<String, usize> = HashMap::new();
        for card in &hand[..104] {
            *per_face.entry(card.face.to_string()).or_default() += 1;
        }
        assert!(per_face.values().all(|&n| n == 2));
        assert!(hand[52].id.starts_with("1-"));
        assert!(hand[104].id.starts_with("2-"));
    }

    #[test]
    fn images_are_distinct() {
        let mut rng = rng();
        let refs = images(300, &mut rng);
        let unique: HashSet<_> = refs.iter().collect();
        assert_eq!(unique.len(), 300);
    }

    #[test]
    fn failing_source_falls_back_to_cycled_list() {
        let generator = ContentGenerator::new(Box::new(Failing), Box::new(Failing));
        let seq = generator.generate(Discipline::Words, 45, Locale::En, &mut rng());
        let Sequence::Words(words) = seq else {
            panic!("expected words");
        };
        assert_eq!(words.len(), 45);
        assert_eq!(words[0], "Apple");
        assert_eq!(words[20], "Apple");
        assert_eq!(words[44], "Elephant");
    }

    #[test]
    fn short_list_falls_back() {
        let generator = ContentGenerator::new(
            Box::new(Fixed(vec!["Owl", "Lamp"])),
            Box::new(Fixed(vec![])),
        );
        let seq = generator.generate(Discipline::Words, 5, Locale::Uk, &mut rng());
        assert_eq!(
            seq,
            Sequence::Words(fallback_list(ListKind::Words, Locale::Uk, 5))
        );

        let seq = generator.generate(Discipline::Names, 12, Locale::En, &mut rng());
        let Sequence::Names(names) = seq else {
            panic!("expected names");
        };
        assert_eq!(names.len(), 12);
        assert_eq!(names[10].name, "John Smith");
        assert_eq!(names[10].portrait, "avatar:john-smith");
    }

    #[test]
    fn long_list_is_truncated_and_trimmed() {
        let generator = ContentGenerator::new(
            Box::new(Fixed(vec![" Owl ", "Lamp", "Kite"])),
            Box::new(Failing),
        );
        let seq = generator.generate(Discipline::Words, 2, Locale::En, &mut rng());
        assert_eq!(seq, Sequence::Words(vec!["Owl".into(), "Lamp".into()]));
    }

    #[test]
    fn blank_entries_are_malformed() {
        let result = checked_list(Ok(vec!["a".into(), " ".into()]), 2);
        assert!(matches!(result, Err(GenerationError::Malformed(_))));
    }
}
