//! Filename guard
//!
//! Validation is purely lexical: no filesystem call happens here, so a
//! rejected name is guaranteed to have produced zero filesystem access.

use std::fmt;
use std::path::{Component, Path};
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::errors::{FilenameError, FilenameResult};

static PROFILE_GRAMMAR: OnceLock<Regex> = OnceLock::new();
static ARCHIVE_GRAMMAR: OnceLock<Regex> = OnceLock::new();

/// The kinds of slot a caller may name. Each has its own grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    /// Device profile document (`*.a7p`)
    Profile,
    /// Reticle archive (`*.tar`)
    Archive,
}

impl DocumentKind {
    /// Mandatory filename suffix for this kind.
    pub fn suffix(&self) -> &'static str {
        match self {
            DocumentKind::Profile => ".a7p",
            DocumentKind::Archive => ".tar",
        }
    }

    fn grammar(&self) -> &'static Regex {
        let (cell, pattern) = match self {
            DocumentKind::Profile => (&PROFILE_GRAMMAR, r"^[a-zA-Z0-9][a-zA-Z0-9_.\- ]*\.a7p$"),
            DocumentKind::Archive => (&ARCHIVE_GRAMMAR, r"^[a-zA-Z0-9][a-zA-Z0-9_.\- ]*\.tar$"),
        };
        cell.get_or_init(|| Regex::new(pattern).expect("slot grammar literal is valid"))
    }

    /// Returns whether `name` satisfies this kind's grammar.
    pub fn matches(&self, name: &str) -> bool {
        self.grammar().is_match(name)
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentKind::Profile => write!(f, "profile"),
            DocumentKind::Archive => write!(f, "archive"),
        }
    }
}

/// A slot name that passed the guard.
///
/// Only constructible through [`FilenameGuard::validate`], so holding one is
/// proof that joining it to the slot directory cannot escape that directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentName {
    name: String,
    kind: DocumentKind,
}

impl DocumentName {
    /// The validated name, used verbatim as the storage key.
    pub fn as_str(&self) -> &str {
        &self.name
    }

    /// The kind this name was validated for.
    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    pub fn into_string(self) -> String {
        self.name
    }
}

impl fmt::Display for DocumentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl AsRef<Path> for DocumentName {
    fn as_ref(&self) -> &Path {
        Path::new(&self.name)
    }
}

/// Validates untrusted identifiers against the per-kind grammar.
pub struct FilenameGuard;

impl FilenameGuard {
    /// Validates `raw` as a slot name of `kind`.
    ///
    /// # Errors
    ///
    /// - `Empty` for an empty string
    /// - `Grammar` if the name does not match the kind's grammar
    /// - `NotCanonical` if lexical cleaning changes the name or yields
    ///   anything other than one plain component
    pub fn validate(raw: &str, kind: DocumentKind) -> FilenameResult<DocumentName> {
        if raw.is_empty() {
            return Err(FilenameError::Empty);
        }

        if !kind.matches(raw) {
            return Err(FilenameError::Grammar {
                name: raw.to_string(),
                kind,
            });
        }

        let cleaned = lexically_clean(raw)
            .ok_or_else(|| FilenameError::NotCanonical(raw.to_string()))?;

        // The cleaned form is what would be joined to the directory, so it
        // must be the very same single component and still obey the grammar.
        if cleaned != raw || !kind.matches(&cleaned) {
            return Err(FilenameError::NotCanonical(raw.to_string()));
        }

        Ok(DocumentName {
            name: cleaned,
            kind,
        })
    }
}

/// Resolves `.` and `..` without touching the filesystem.
///
/// Returns `None` for absolute paths, prefixes, or anything that does not
/// reduce to exactly one normal component.
fn lexically_clean(raw: &str) -> Option<String> {
    let mut parts: Vec<&std::ffi::OsStr> = Vec::new();
    for component in Path::new(raw).components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                parts.pop()?;
            }
            Component::Normal(part) => parts.push(part),
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }

    match parts.as_slice() {
        [single] => single.to_str().map(str::to_string),
        _ => None,
    }
}
