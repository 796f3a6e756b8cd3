//! Source artifacts and the ordered sets a library compiles.
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// HDL flavor of a source artifact, derived from its extension.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Vhdl,
    Verilog,
    SystemVerilog,
    Other,
}

impl SourceKind {
    /// Classify a path by extension (case-insensitive).
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());
        match ext.as_deref() {
            Some("vhd" | "vhdl") => SourceKind::Vhdl,
            Some("v" | "vh") => SourceKind::Verilog,
            Some("sv" | "svh") => SourceKind::SystemVerilog,
            _ => SourceKind::Other,
        }
    }

    /// Return the stable string identifier used in manifests.
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Vhdl => "vhdl",
            SourceKind::Verilog => "verilog",
            SourceKind::SystemVerilog => "system_verilog",
            SourceKind::Other => "other",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One resolved source artifact.
///
/// `kind` is a pure function of `location`, so two entries for the same
/// path always carry the same metadata.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    location: PathBuf,
    kind: SourceKind,
}

impl SourceEntry {
    pub fn new(location: PathBuf) -> Self {
        let kind = SourceKind::from_path(&location);
        Self { location, kind }
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    pub fn kind(&self) -> SourceKind {
        self.kind
    }
}

/// Insertion-ordered sources of one library.
///
/// Order is the order the backend is told about sources; it is never
/// re-sorted after insertion.
#[derive(Debug, Serialize, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct SourceSet {
    entries: Vec<SourceEntry>,
}

impl SourceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `location` unless it is already present.
    ///
    /// Returns false when the entry already existed.
    pub fn push(&mut self, location: PathBuf) -> bool {
        if self.contains(&location) {
            return false;
        }
        self.entries.push(SourceEntry::new(location));
        true
    }

    pub fn contains(&self, location: &Path) -> bool {
        self.entries.iter().any(|entry| entry.location == location)
    }

    pub fn entries(&self) -> &[SourceEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SourceEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a SourceSet {
    type Item = &'a SourceEntry;
    type IntoIter = std::slice::Iter<'a, SourceEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_follows_extension() {
        assert_eq!(SourceKind::from_path(Path::new("T65.vhd")), SourceKind::Vhdl);
        assert_eq!(SourceKind::from_path(Path::new("a.VHDL")), SourceKind::Vhdl);
        assert_eq!(
            SourceKind::from_path(Path::new("s27kl0642.v")),
            SourceKind::Verilog
        );
        assert_eq!(
            SourceKind::from_path(Path::new("top.sv")),
            SourceKind::SystemVerilog
        );
        assert_eq!(SourceKind::from_path(Path::new("README")), SourceKind::Other);
    }

    #[test]
    fn push_preserves_order_and_ignores_repeats() {
        let mut set = SourceSet::new();
        assert!(set.push(PathBuf::from("b.vhd")));
        assert!(set.push(PathBuf::from("a.vhd")));
        assert!(!set.push(PathBuf::from("b.vhd")));

        let locations: Vec<_> = set.iter().map(|entry| entry.location()).collect();
        assert_eq!(locations, vec![Path::new("b.vhd"), Path::new("a.vhd")]);
    }
}
