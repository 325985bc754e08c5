//! Thai-locale string ordering for the name sort.
//!
//! Backed by the CLDR `th` collation tailoring. Prevowels (เ แ โ ใ ไ) sort
//! after the consonant they precede, tone marks only break ties, and
//! accented Latin and punctuation follow the root collation order.

use icu_collator::{Collator, CollatorOptions};
use icu_locid::locale;
use std::cmp::Ordering;
use tracing::warn;

thread_local! {
    static THAI: Option<Collator> = Collator::try_new(&locale!("th").into(), CollatorOptions::new())
        .map_err(|e| warn!("Thai collation unavailable, falling back to code-point order: {}", e))
        .ok();
}

/// Compares two strings the way a Thai-locale collator orders them.
pub fn compare(a: &str, b: &str) -> Ordering {
    THAI.with(|collator| match collator {
        Some(collator) => collator.compare(a, b),
        None => a.cmp(b),
    })
}
