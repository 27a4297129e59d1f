//! SQL identifier generation for structural paths
//!
//! Paths are dotted field sequences (`orders.items.sku`). They become
//! identifiers by replacing the separators with underscores; names longer
//! than the limit are shortened by dropping interior segments. A name already
//! handed out to another path gets a numeric suffix. Every name is memoized
//! for the lifetime of the namer, which is one inference run.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use super::error::InferenceError;

/// Separator between segments of a structural path
pub const PATH_SEPARATOR: char = '.';

/// Separator between segments of a generated identifier
pub const NAME_SEPARATOR: char = '_';

/// Join a path and a field name into a structural path
///
/// Under a non-empty path an empty field still adds a segment, so a field's
/// path never equals its parent's.
pub fn combine_path(path: &str, field: &str) -> String {
    if path.is_empty() && !field.is_empty() {
        field.to_string()
    } else {
        format!("{}{}{}", path, PATH_SEPARATOR, field)
    }
}

/// Run-scoped, memoizing path-to-identifier mapping
#[derive(Debug, Default)]
pub struct IdentifierNamer {
    names: HashMap<(String, usize), String>,
    used: HashSet<String>,
    collisions: usize,
}

impl IdentifierNamer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Identifier for `path`, at most `max_length` characters long
    ///
    /// Repeated calls with the same path and limit return the same name.
    ///
    /// # Errors
    ///
    /// Returns [`InferenceError::IdentifierTooLong`] when the limit leaves no
    /// room for a unique suffix.
    pub fn to_name(&mut self, path: &str, max_length: usize) -> Result<String, InferenceError> {
        let key = (path.to_string(), max_length);
        if let Some(name) = self.names.get(&key) {
            return Ok(name.clone());
        }

        let joined = path.replace(PATH_SEPARATOR, &NAME_SEPARATOR.to_string());
        let fits = joined.chars().count() <= max_length;
        let base = if fits { joined } else { shorten(path, max_length) };
        let taken = self.used.contains(&base);
        let name = if taken {
            self.with_suffix(path, &base, max_length)?
        } else {
            base
        };
        if !fits || taken {
            debug!(path, name = %name, max_length, "Shortened identifier");
        }

        self.used.insert(name.clone());
        self.names.insert(key, name.clone());
        Ok(name)
    }

    /// Number of distinct names handed out so far
    pub fn len(&self) -> usize {
        self.used.len()
    }

    pub fn is_empty(&self) -> bool {
        self.used.is_empty()
    }

    fn with_suffix(
        &mut self,
        path: &str,
        base: &str,
        max_length: usize,
    ) -> Result<String, InferenceError> {
        loop {
            self.collisions += 1;
            let suffix = self.collisions.to_string();
            if suffix.len() >= max_length {
                return Err(InferenceError::IdentifierTooLong {
                    path: path.to_string(),
                    max: max_length,
                });
            }

            let candidate = format!("{}{}", truncate(base, max_length - suffix.len()), suffix);
            if !self.used.contains(&candidate) {
                return Ok(candidate);
            }
        }
    }
}

/// Drop interior segments until the name fits, keeping the first and last
fn shorten(path: &str, max_length: usize) -> String {
    let segments: Vec<&str> = path.split(PATH_SEPARATOR).collect();
    let separator = NAME_SEPARATOR.to_string();

    if segments.len() > 2 {
        let first = segments[0];
        for dropped in 1..segments.len() - 1 {
            let mut kept = Vec::with_capacity(segments.len() - dropped);
            kept.push(first);
            kept.extend_from_slice(&segments[1 + dropped..]);
            let candidate = kept.join(&separator);
            if candidate.chars().count() <= max_length {
                return candidate;
            }
        }
    }

    let last_two = match segments.as_slice() {
        [first, .., last] => format!("{}{}{}", first, NAME_SEPARATOR, last),
        _ => segments.join(&separator),
    };
    truncate(&last_two, max_length)
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}
