//! Version ordering and filename-driven recipe resolution.
//!
//! Versions are dot-separated sequences of non-negative integers compared
//! segment by segment, with missing trailing segments counting as zero
//! (`1.2 == 1.2.0 < 1.10`). The same ordering is used for "latest"
//! resolution and for listing.

use crate::errors::{RecipeError, Result};
use crate::storage::DefinitionStore;
use std::cmp::Ordering;
use std::str::FromStr;

pub const CSV_SUFFIX: &str = ".csv";
pub const RECIPE_DELIMITER: char = '_';

#[derive(Debug, Clone)]
pub struct Version {
    segments: Vec<u64>,
}

impl Version {
    pub fn segments(&self) -> &[u64] {
        &self.segments
    }

    fn segment(&self, i: usize) -> u64 {
        self.segments.get(i).copied().unwrap_or(0)
    }
}

impl FromStr for Version {
    type Err = RecipeError;

    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Err(RecipeError::malformed(s, "empty version"));
        }
        let mut segments = Vec::new();
        for (idx, part) in s.split('.').enumerate() {
            if part.is_empty() {
                return Err(RecipeError::malformed(s, format!("segment {} is empty", idx + 1)));
            }
            // u64::from_str accepts a leading '+', which is not a version digit
            if !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(RecipeError::malformed(
                    s,
                    format!("segment '{}' is not a non-negative integer", part),
                ));
            }
            let n: u64 = part.parse().map_err(|e| {
                RecipeError::malformed(s, format!("segment '{}': {}", part, e))
            })?;
            segments.push(n);
        }
        Ok(Self { segments })
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.segments.len().max(other.segments.len());
        (0..len)
            .map(|i| self.segment(i).cmp(&other.segment(i)))
            .find(|o| o.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

/// Total order over raw version strings used for listings.
///
/// Well-formed versions sort numerically; malformed ones sort after all
/// well-formed versions, lexically among themselves. Numerically equal
/// strings fall back to segment count and then the raw text.
pub fn compare_version_strings(a: &str, b: &str) -> Ordering {
    match (a.parse::<Version>(), b.parse::<Version>()) {
        (Ok(va), Ok(vb)) => va
            .cmp(&vb)
            .then_with(|| va.segments.len().cmp(&vb.segments.len()))
            .then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// Picks the greatest version. Any unparseable entry fails the whole call.
pub fn select_latest<S: AsRef<str>>(versions: &[S]) -> Result<Option<String>> {
    let mut best: Option<(Version, &str)> = None;
    for raw in versions {
        let raw = raw.as_ref();
        let parsed: Version = raw.parse()?;
        let replace = match &best {
            None => true,
            Some((bv, braw)) => parsed
                .cmp(bv)
                .then_with(|| parsed.segments.len().cmp(&bv.segments.len()))
                .then_with(|| raw.cmp(braw))
                .is_gt(),
        };
        if replace {
            best = Some((parsed, raw));
        }
    }
    Ok(best.map(|(_, raw)| raw.to_string()))
}

/// Latest recorded version of `recipe_id`, or `None` when it has no rows.
pub fn latest_version<S: DefinitionStore + ?Sized>(
    store: &S,
    recipe_id: &str,
) -> Result<Option<String>> {
    let versions = store.versions(recipe_id)?;
    let latest = select_latest(&versions)?;
    tracing::debug!(
        event = "latest_version",
        recipe_id = recipe_id,
        candidates = versions.len(),
        latest = ?latest
    );
    Ok(latest)
}

/// Recipe reference derived from a filename such as `abc_v1.csv`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeRef<'a> {
    pub recipe_id: &'a str,
    /// Text after the first delimiter, if there was one.
    pub remainder: Option<&'a str>,
}

pub fn parse_recipe_ref(filename: &str) -> RecipeRef<'_> {
    let base = filename.strip_suffix(CSV_SUFFIX).unwrap_or(filename);
    match base.split_once(RECIPE_DELIMITER) {
        Some((recipe_id, rest)) => RecipeRef {
            recipe_id,
            remainder: Some(rest),
        },
        None => RecipeRef {
            recipe_id: base,
            remainder: None,
        },
    }
}

/// Resolves a filename to its recipe id and that recipe's latest version.
pub fn resolve_from_filename<'f, S: DefinitionStore + ?Sized>(
    store: &S,
    filename: &'f str,
) -> Result<(&'f str, Option<String>)> {
    let r = parse_recipe_ref(filename);
    let latest = latest_version(store, r.recipe_id)?;
    Ok((r.recipe_id, latest))
}
