// Accent-character rotation: one random character, one of its portraits, one quote.

use std::path::PathBuf;

use rand::Rng;
use rand::seq::SliceRandom;

use super::{PortraitLibrary, QuoteBook};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationFrame {
    pub character: String,
    pub portrait: Option<PathBuf>,
    pub quote: String,
}

/// Pick the next frame to show. `None` when no characters are configured.
pub fn next_frame<R: Rng + ?Sized>(
    characters: &[String],
    portraits: &PortraitLibrary,
    quotes: &QuoteBook,
    rng: &mut R,
) -> Option<RotationFrame> {
    let character = characters.choose(rng)?;
    let portrait = portraits.portraits_for(character).choose(rng).cloned();
    let quote = quotes.quote_or_placeholder(character, rng);

    Some(RotationFrame {
        character: character.clone(),
        portrait,
        quote,
    })
}
