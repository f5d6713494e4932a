//! Product name and taglines.

use rand::Rng;

pub const BRAND_NAME: &str = "YOCR";
pub const PRIMARY_TAGLINE: &str = "Yo, OCR your files!";
pub const ALT_TAGLINES: [&str; 4] = [
    "Yo, get your text instantly.",
    "Yo—give me that image, I’ll read it.",
    "OCR that says Yo back.",
    "Yo, let me extract that for you.",
];

/// Random tagline from the alternates, optionally including the primary.
#[must_use]
pub fn random_tagline(include_primary: bool) -> &'static str {
    random_tagline_with(&mut rand::rng(), include_primary)
}

pub fn random_tagline_with<R: Rng>(rng: &mut R, include_primary: bool) -> &'static str {
    let mut pool: Vec<&'static str> = Vec::with_capacity(ALT_TAGLINES.len() + 1);
    if include_primary {
        pool.push(PRIMARY_TAGLINE);
    }
    pool.extend(ALT_TAGLINES);
    if pool.is_empty() {
        return PRIMARY_TAGLINE;
    }
    pool[rng.random_range(0..pool.len())]
}

#[cfg(test)]
#[path = "brand_test.rs"]
mod tests;
