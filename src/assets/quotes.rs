// Character quote pool
// Source file: JSON object of character name -> list of quotes.
// A missing or malformed file is never fatal; the book is just empty.

use std::collections::HashMap;
use std::path::Path;

use rand::Rng;
use rand::seq::SliceRandom;

use crate::constants::NO_QUOTE_PLACEHOLDER;

#[derive(Debug, Clone, Default)]
pub struct QuoteBook {
    quotes: HashMap<String, Vec<String>>,
}

impl QuoteBook {
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            log::warn!("Quotes file not found: {}", path.display());
            return Self::default();
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                log::warn!("Failed to read quotes file {}: {}", path.display(), e);
                return Self::default();
            }
        };

        match Self::from_json(&content) {
            Ok(book) => {
                log::info!("Loaded quotes for {} characters", book.quotes.len());
                book
            }
            Err(e) => {
                log::warn!("Failed to parse quotes file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Build from JSON text. Non-list entries and blank quotes are skipped.
    pub fn from_json(content: &str) -> serde_json::Result<Self> {
        let raw: serde_json::Map<String, serde_json::Value> = serde_json::from_str(content)?;
        let mut quotes = HashMap::new();

        for (character, value) in raw {
            let serde_json::Value::Array(items) = value else {
                log::warn!("Quotes for '{}' are not a list; skipping", character);
                continue;
            };

            let cleaned: Vec<String> = items
                .iter()
                .map(|q| match q {
                    serde_json::Value::String(s) => s.trim().to_string(),
                    other => other.to_string().trim().to_string(),
                })
                .filter(|q| !q.is_empty())
                .collect();

            if !cleaned.is_empty() {
                quotes.insert(character.trim().to_string(), cleaned);
            }
        }

        Ok(Self { quotes })
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    /// Exact key first, then case-insensitive
    fn lookup(&self, character: &str) -> Option<&Vec<String>> {
        self.quotes.get(character).or_else(|| {
            let wanted = character.to_lowercase();
            self.quotes
                .iter()
                .find(|(name, _)| name.to_lowercase() == wanted)
                .map(|(_, list)| list)
        })
    }

    pub fn has_quotes(&self, character: &str) -> bool {
        self.lookup(character).is_some()
    }

    pub fn random_quote<R: Rng + ?Sized>(&self, character: &str, rng: &mut R) -> Option<&str> {
        self.lookup(character)
            .and_then(|list| list.choose(rng))
            .map(String::as_str)
    }

    pub fn quote_or_placeholder<R: Rng + ?Sized>(&self, character: &str, rng: &mut R) -> String {
        self.random_quote(character, rng)
            .unwrap_or(NO_QUOTE_PLACEHOLDER)
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"{
        "Ryu": ["The answer lies in the heart of battle.", "  "],
        "Ken": "not a list",
        "Blanka": [],
        " Cammy ": ["Target acquired."]
    }"#;

    #[test]
    fn test_from_json_skips_bad_entries() {
        let book = QuoteBook::from_json(SAMPLE).unwrap();
        assert!(book.has_quotes("Ryu"));
        assert!(!book.has_quotes("Ken"));
        assert!(!book.has_quotes("Blanka"));
        assert!(book.has_quotes("Cammy"));
    }

    #[test]
    fn test_lookup_falls_back_to_case_insensitive() {
        let book = QuoteBook::from_json(SAMPLE).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(
            book.random_quote("ryu", &mut rng),
            Some("The answer lies in the heart of battle.")
        );
        assert_eq!(book.quote_or_placeholder("Zangief", &mut rng), "No quotes available");
    }

    #[test]
    fn test_missing_or_malformed_file_is_empty() {
        let dir = TempDir::new().unwrap();
        assert!(QuoteBook::load(&dir.path().join("none.json")).is_empty());

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "[1, 2").unwrap();
        assert!(QuoteBook::load(&bad).is_empty());
    }
}
