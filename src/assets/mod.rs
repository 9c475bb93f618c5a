// Replay Keeper - Asset lookup
// Character portraits, flavor quotes and the rotation that pairs them.

pub mod portraits;
pub mod quotes;
pub mod rotation;

pub use portraits::{Portrait, PortraitCache, PortraitEntry, PortraitLibrary};
pub use quotes::QuoteBook;
pub use rotation::{RotationFrame, next_frame};

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use crate::constants::{PORTRAIT_EXTENSIONS, PORTRAIT_NAME_SUFFIXES};

fn version_marker() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)(_|-)(alt|v|ver|version)\d*$").expect("static regex"))
}

/// Display name for a portrait file: `"chun-li_alt2.png"` becomes `"Chun Li"`.
pub fn clean_filename(filename: &str) -> String {
    let mut name = Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(filename)
        .to_string();

    let lowered = name.to_lowercase();
    if let Some(suffix) = PORTRAIT_NAME_SUFFIXES.iter().find(|s| lowered.ends_with(*s)) {
        name.truncate(name.len() - suffix.len());
    }

    let name = version_marker().replace(&name, "");
    let spaced = name.replace(&['_', '-'][..], " ");

    title_case(&spaced.split_whitespace().collect::<Vec<_>>().join(" "))
}

/// Uppercase every letter that follows a non-letter, lowercase the rest,
/// so `"o'neil"` becomes `"O'Neil"` and `"ryu2nd"` becomes `"Ryu2Nd"`.
fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut after_letter = false;
    for c in text.chars() {
        if after_letter {
            out.extend(c.to_lowercase());
        } else {
            out.extend(c.to_uppercase());
        }
        after_letter = c.is_alphabetic();
    }
    out
}

/// True for the image types portraits are read from
pub fn is_portrait_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let e = e.to_lowercase();
            PORTRAIT_EXTENSIONS.contains(&e.as_str())
        })
        .unwrap_or(false)
}
