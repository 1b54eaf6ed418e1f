//! Word and name banks compiled into the binary.

use include_dir::{include_dir, Dir};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;
use serde_json::from_str;

use crate::config::Locale;
use crate::error::GenerationError;
use crate::generator::{ListKind, ListSource};

static BANK_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/bank");

#[allow(dead_code)]
#[derive(Deserialize, Clone, Debug)]
pub struct Bank {
    pub name: String,
    pub locale: Locale,
    pub size: u32,
    pub items: Vec<String>,
}

impl Bank {
    pub fn load(kind: ListKind, locale: Locale) -> Result<Self, GenerationError> {
        read_bank_from_file(&format!("{}_{}.json", kind.file_stem(), locale))
    }
}

fn read_bank_from_file(file_name: &str) -> Result<Bank, GenerationError> {
    let file = BANK_DIR
        .get_file(file_name)
        .ok_or_else(|| GenerationError::Unavailable(format!("no bank named {file_name}")))?;

    let file_as_str = file
        .contents_utf8()
        .ok_or_else(|| GenerationError::Malformed(format!("{file_name} is not utf-8")))?;

    from_str(file_as_str).map_err(|e| GenerationError::Malformed(e.to_string()))
}

/// Draws `quantity` entries from a bank, reshuffling the bank for every
/// pass so short banks still fill long runs without adjacent repeats.
pub fn draw<R: Rng + ?Sized>(items: &[String], quantity: usize, rng: &mut R) -> Vec<String> {
    let mut out = Vec::with_capacity(quantity);
    if items.is_empty() {
        return out;
    }
    let mut pass: Vec<&String> = items.iter().collect();
    while out.len() < quantity {
        pass.shuffle(rng);
        out.extend(pass.iter().take(quantity - out.len()).map(|s| (*s).clone()));
    }
    out
}

/// List source backed by the embedded banks.
#[derive(Debug, Clone, Copy)]
pub struct EmbeddedBank {
    kind: ListKind,
}

impl EmbeddedBank {
    pub fn new(kind: ListKind) -> Self {
        Self { kind }
    }
}

impl ListSource for EmbeddedBank {
    fn generate(&self, quantity: usize, locale: Locale) -> Result<Vec<String>, GenerationError> {
        let bank = Bank::load(self.kind, locale)?;
        if bank.items.is_empty() {
            return Err(GenerationError::Empty);
        }
        Ok(draw(&bank.items, quantity, &mut rand::thread_rng()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn every_bank_loads() {
        for kind in [ListKind::Words, ListKind::Names] {
            for locale in [Locale::En, Locale::Uk] {
                let bank = Bank::load(kind, locale).unwrap();
                assert_eq!(bank.locale, locale);
                assert_eq!(bank.size as usize, bank.items.len());
                assert!(bank.items.len() >= 20, "{}", bank.name);
            }
        }
    }

    #[test]
    fn missing_bank_is_unavailable() {
        assert!(matches!(
            read_bank_from_file("klingon.json"),
            Err(GenerationError::Unavailable(_))
        ));
    }

    #[test]
    fn draw_fills_past_bank_size() {
        let items: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
        let mut rng = StdRng::seed_from_u64(7);
        let out = draw(&items, 8, &mut rng);
        assert_eq!(out.len(), 8);
        // every full pass is a permutation of the bank
        let mut first_pass = out[..3].to_vec();
        first_pass.sort();
        assert_eq!(first_pass, items);
    }

    #[test]
    fn draw_from_empty_bank_is_empty() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(draw(&[], 5, &mut rng).is_empty());
    }

    #[test]
    fn embedded_bank_returns_exact_quantity() {
        let words = EmbeddedBank::new(ListKind::Words)
            .generate(250, Locale::Uk)
            .unwrap();
        assert_eq!(words.len(), 250);
    }
}
