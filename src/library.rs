//! Named libraries and the registry that assembles them.
//!
//! The registry is mutable during setup and is frozen into a [`LibrarySet`]
//! before any test runs. Libraries keep the order of their first reference;
//! there is no build order implied between them.
use crate::error::{HarnessError, Result};
use crate::pattern;
use crate::source::SourceSet;
use crate::util::normalize_lexically;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Names the backend reserves for its own use.
const RESERVED_LIBRARY_NAMES: &[&str] = &["work"];

/// A named library and its ordered sources.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct Library {
    name: String,
    sources: SourceSet,
}

impl Library {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sources(&self) -> &SourceSet {
        &self.sources
    }
}

/// Normalize and validate a library name.
///
/// HDL library names are case-insensitive identifiers, so they are stored
/// lowercase.
pub fn normalize_library_name(name: &str) -> Result<String> {
    let invalid = |detail: &str| HarnessError::InvalidLibraryName {
        name: name.to_string(),
        detail: detail.to_string(),
    };
    let mut chars = name.chars();
    match chars.next() {
        None => return Err(invalid("must be non-empty")),
        Some(first) if !first.is_ascii_alphabetic() => {
            return Err(invalid("must start with a letter"))
        }
        Some(_) => {}
    }
    if !chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_') {
        return Err(invalid("only letters, digits, and '_' are allowed"));
    }
    let normalized = name.to_ascii_lowercase();
    if RESERVED_LIBRARY_NAMES.contains(&normalized.as_str()) {
        return Err(invalid("name is reserved"));
    }
    Ok(normalized)
}

/// Setup-phase registry mapping library names to source sets.
#[derive(Debug, Clone)]
pub struct LibraryRegistry {
    root: PathBuf,
    libraries: Vec<Library>,
}

impl LibraryRegistry {
    /// Create a registry resolving relative locations against `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            libraries: Vec::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create `name` if absent; existing libraries are left untouched.
    pub fn add_library(&mut self, name: &str) -> Result<&mut Library> {
        let name = normalize_library_name(name)?;
        let index = match self.position(&name) {
            Some(index) => index,
            None => {
                tracing::debug!(library = %name, "library created");
                self.libraries.push(Library {
                    name,
                    sources: SourceSet::new(),
                });
                self.libraries.len() - 1
            }
        };
        Ok(&mut self.libraries[index])
    }

    /// Resolve `location` and append the results to `library`.
    ///
    /// Wildcard locations expand in lexicographic order and may match
    /// nothing. Plain locations must exist. Resolved paths are lexically
    /// normalized, so one file reached through different spellings is a
    /// single entry. Either every resolved path is
    /// appended or, on error, none is. Returns the number of new entries.
    pub fn add_files(&mut self, library: &str, location: &str) -> Result<usize> {
        let resolved = self.resolve(location)?;
        let library_entry = self.add_library(library)?;
        let mut added = 0;
        for path in resolved {
            if library_entry.sources.push(path.clone()) {
                added += 1;
            } else {
                tracing::warn!(
                    library = %library_entry.name,
                    path = %path.display(),
                    "source already present; keeping the existing entry"
                );
            }
        }
        if added == 0 && pattern::is_pattern(location) {
            tracing::debug!(library = %library_entry.name, location, "pattern matched no new sources");
        }
        tracing::info!(library = %library_entry.name, location, added, "sources added");
        Ok(added)
    }

    /// Append one explicit file to `library`. Wildcards are not expanded.
    pub fn add_file(&mut self, library: &str, path: &str) -> Result<bool> {
        let resolved = self.resolve_explicit(path)?;
        let library_entry = self.add_library(library)?;
        let added = library_entry.sources.push(resolved);
        if !added {
            tracing::warn!(library = %library_entry.name, path, "source already present");
        }
        Ok(added)
    }

    /// Snapshot of `name`'s sources; unknown libraries yield an empty set.
    pub fn get_library(&self, name: &str) -> SourceSet {
        self.library(name)
            .map(|library| library.sources.clone())
            .unwrap_or_default()
    }

    pub fn library(&self, name: &str) -> Option<&Library> {
        let name = name.to_ascii_lowercase();
        self.position(&name).map(|index| &self.libraries[index])
    }

    pub fn libraries(&self) -> &[Library] {
        &self.libraries
    }

    /// Freeze the registry into an immutable snapshot.
    pub fn freeze(self) -> LibrarySet {
        LibrarySet {
            root: self.root,
            libraries: self.libraries,
        }
    }

    fn position(&self, normalized: &str) -> Option<usize> {
        self.libraries
            .iter()
            .position(|library| library.name == normalized)
    }

    /// A wildcard location that matches nothing, or does not compile, falls
    /// back to a file literally named `location` when one exists.
    fn resolve(&self, location: &str) -> Result<Vec<PathBuf>> {
        if !pattern::is_pattern(location) {
            return Ok(vec![self.resolve_explicit(location)?]);
        }
        let expanded = pattern::expand(&self.root, location);
        let literal_fallback = match &expanded {
            Ok(paths) => paths.is_empty(),
            Err(HarnessError::InvalidPattern { .. }) => true,
            Err(_) => false,
        };
        if literal_fallback && self.root.join(location).is_file() {
            tracing::debug!(location, "wildcard location taken as a literal file name");
            return Ok(vec![self.resolve_explicit(location)?]);
        }
        expanded
    }

    fn resolve_explicit(&self, location: &str) -> Result<PathBuf> {
        let path = self.root.join(location);
        if !path.is_file() {
            return Err(HarnessError::Resolution { path });
        }
        Ok(normalize_lexically(&path))
    }
}

/// Frozen libraries handed to the orchestrator.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct LibrarySet {
    #[serde(skip)]
    root: PathBuf,
    libraries: Vec<Library>,
}

impl LibrarySet {
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn get(&self, name: &str) -> Option<&Library> {
        let name = name.to_ascii_lowercase();
        self.libraries.iter().find(|library| library.name == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Library> {
        self.libraries.iter()
    }

    pub fn len(&self) -> usize {
        self.libraries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.libraries.is_empty()
    }
}

#[cfg(test)]
#[path = "library_tests.rs"]
mod tests;
