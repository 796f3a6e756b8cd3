//! Shell-style wildcard handling.
//!
//! Source locations use wildcards per path component (`*`, `?`, `[...]`,
//! with `[!...]` or `[^...]` negation); test selection reuses the same syntax over
//! dotted test identifiers, where `*` also crosses `.`.
use crate::error::{HarnessError, Result};
use crate::util::normalize_lexically;
use regex::Regex;
use std::fs;
use std::path::{Component, Path, PathBuf};

const WILDCARD_CHARS: [char; 3] = ['*', '?', '['];

/// Return true when `location` contains wildcard characters.
pub fn is_pattern(location: &str) -> bool {
    location.contains(&WILDCARD_CHARS[..])
}

/// A compiled wildcard matcher.
#[derive(Debug, Clone)]
pub struct Wildcard {
    source: String,
    regex: Regex,
}

impl Wildcard {
    /// Compile a pattern matched against a single path component.
    pub fn component(pattern: &str) -> Result<Self> {
        Self::compile(pattern, r"[^/\\]")
    }

    /// Compile a pattern matched against a whole test identifier.
    pub fn identifier(pattern: &str) -> Result<Self> {
        Self::compile(pattern, ".")
    }

    fn compile(pattern: &str, any: &str) -> Result<Self> {
        let invalid = |detail: &str| HarnessError::InvalidPattern {
            pattern: pattern.to_string(),
            detail: detail.to_string(),
        };

        let mut expr = String::from("^");
        let mut chars = pattern.chars().peekable();
        while let Some(ch) = chars.next() {
            match ch {
                '*' => {
                    expr.push_str(any);
                    expr.push('*');
                }
                '?' => expr.push_str(any),
                '[' => {
                    let mut class = String::from("[");
                    if matches!(chars.peek(), Some('!' | '^')) {
                        chars.next();
                        class.push('^');
                    }
                    let mut first = true;
                    let mut closed = false;
                    for next in chars.by_ref() {
                        // A leading `]` is a literal member of the class.
                        if next == ']' && !first {
                            closed = true;
                            break;
                        }
                        first = false;
                        if matches!(next, '\\' | '[' | ']' | '^' | '&' | '~') {
                            class.push('\\');
                        }
                        class.push(next);
                    }
                    if !closed {
                        return Err(invalid("unclosed '['"));
                    }
                    class.push(']');
                    expr.push_str(&class);
                }
                other => {
                    let mut buf = [0u8; 4];
                    expr.push_str(&regex::escape(other.encode_utf8(&mut buf)));
                }
            }
        }
        expr.push('$');

        let regex = Regex::new(&expr).map_err(|err| invalid(&err.to_string()))?;
        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    /// Test `text` against the whole pattern.
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// Return the pattern as written.
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

/// Expand `location` against the filesystem into concrete files.
///
/// Relative locations resolve against `root`. Results are lexically
/// normalized (no `.` or `dir/..` components) and sorted; a pattern that
/// matches nothing yields an empty list.
/// Entries starting with `.` only match components that also start with `.`.
pub fn expand(root: &Path, location: &str) -> Result<Vec<PathBuf>> {
    let location_path = Path::new(location);
    let mut candidates = if location_path.has_root() {
        vec![PathBuf::new()]
    } else {
        vec![root.to_path_buf()]
    };

    for component in location_path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir | Component::ParentDir => {
                for candidate in &mut candidates {
                    candidate.push(component.as_os_str());
                }
            }
            Component::CurDir => {}
            Component::Normal(name) => {
                let Some(text) = name.to_str().filter(|text| is_pattern(text)) else {
                    for candidate in &mut candidates {
                        candidate.push(name);
                    }
                    continue;
                };
                let wildcard = Wildcard::component(text)?;
                let mut matched = Vec::new();
                for candidate in &candidates {
                    matched.extend(match_dir(candidate, &wildcard, location)?);
                }
                candidates = matched;
            }
        }
        if candidates.is_empty() {
            break;
        }
    }

    candidates.retain(|path| path.is_file());
    let mut candidates: Vec<PathBuf> = candidates
        .iter()
        .map(|path| normalize_lexically(path.as_path()))
        .collect();
    candidates.sort();
    candidates.dedup();
    Ok(candidates)
}

fn match_dir(dir: &Path, wildcard: &Wildcard, location: &str) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let io_err = |source: std::io::Error| HarnessError::PatternIo {
        pattern: location.to_string(),
        source,
    };
    let allow_hidden = wildcard.as_str().starts_with('.');
    let mut matched = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else {
            continue;
        };
        if name.starts_with('.') && !allow_hidden {
            continue;
        }
        if wildcard.is_match(name) {
            matched.push(dir.join(name));
        }
    }
    Ok(matched)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent directory");
        }
        fs::write(path, b"--\n").expect("write file");
    }

    #[test]
    fn detects_wildcard_characters() {
        assert!(is_pattern("./*.vhd"));
        assert!(is_pattern("rom?.v"));
        assert!(is_pattern("src/[ab].sv"));
        assert!(!is_pattern("../../src/common/T65/T65.vhd"));
    }

    #[test]
    fn component_star_does_not_cross_separators() {
        let wildcard = Wildcard::component("*.vhd").expect("compile");
        assert!(wildcard.is_match("m6522.vhd"));
        assert!(!wildcard.is_match("m6522.vhdl"));
        assert!(!wildcard.is_match("sub/m6522.vhd"));
    }

    #[test]
    fn identifier_star_crosses_dots() {
        let wildcard = Wildcard::identifier("lib.tb_*").expect("compile");
        assert!(wildcard.is_match("lib.tb_top.wide"));
        assert!(!wildcard.is_match("fmf.tb_top"));
    }

    #[test]
    fn character_classes_and_negation() {
        let wildcard = Wildcard::component("sid_[cv]*.vhd").expect("compile");
        assert!(wildcard.is_match("sid_coeffs.vhd"));
        assert!(wildcard.is_match("sid_voice.vhd"));
        assert!(!wildcard.is_match("sid_filters.vhd"));

        for pattern in ["T65_[!A]*", "T65_[^A]*"] {
            let negated = Wildcard::component(pattern).expect("compile");
            assert!(negated.is_match("T65_Pack.vhd"), "{pattern}");
            assert!(!negated.is_match("T65_ALU.vhd"), "{pattern}");
        }
    }

    #[test]
    fn unclosed_class_is_rejected() {
        let err = Wildcard::component("foo[ab").expect_err("unclosed class");
        assert!(matches!(err, HarnessError::InvalidPattern { .. }));
    }

    #[test]
    fn regex_metacharacters_are_literal() {
        let wildcard = Wildcard::component("a+b(1).v").expect("compile");
        assert!(wildcard.is_match("a+b(1).v"));
        assert!(!wildcard.is_match("aab1.v"));
    }

    #[test]
    fn expand_sorts_matches_lexicographically() {
        let dir = tempfile::tempdir().expect("create temp dir");
        for name in ["vidproc.vhd", "keyboard.vhd", "spi.vhd", "notes.txt"] {
            touch(dir.path(), name);
        }

        let found = expand(dir.path(), "./*.vhd").expect("expand");
        let names: Vec<_> = found
            .iter()
            .map(|path| path.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["keyboard.vhd", "spi.vhd", "vidproc.vhd"]);
    }

    #[test]
    fn expand_walks_wildcard_directories() {
        let dir = tempfile::tempdir().expect("create temp dir");
        touch(dir.path(), "common/SID/sid_voice.vhd");
        touch(dir.path(), "common/T65/T65.vhd");
        touch(dir.path(), "common/T65/T65_ALU.vhd");

        let found = expand(dir.path(), "common/*/T65*.vhd").expect("expand");
        assert_eq!(
            found,
            vec![
                dir.path().join("common/T65/T65.vhd"),
                dir.path().join("common/T65/T65_ALU.vhd"),
            ]
        );
    }

    #[test]
    fn expand_skips_hidden_entries_and_directories() {
        let dir = tempfile::tempdir().expect("create temp dir");
        touch(dir.path(), ".hidden.vhd");
        touch(dir.path(), "shown.vhd");
        fs::create_dir_all(dir.path().join("dir.vhd")).expect("create dir");

        let found = expand(dir.path(), "*.vhd").expect("expand");
        assert_eq!(found, vec![dir.path().join("shown.vhd")]);

        let hidden = expand(dir.path(), ".*.vhd").expect("expand hidden");
        assert_eq!(hidden, vec![dir.path().join(".hidden.vhd")]);
    }

    #[test]
    fn expand_folds_parent_components() {
        let dir = tempfile::tempdir().expect("create temp dir");
        touch(dir.path(), "sim/tb_top.vhd");
        touch(dir.path(), "src/m6522.vhd");

        let found = expand(&dir.path().join("sim"), "../src/*.vhd").expect("expand");
        assert_eq!(found, vec![dir.path().join("src/m6522.vhd")]);
    }

    #[test]
    fn expand_of_missing_directory_is_empty() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let found = expand(dir.path(), "library/fmf/*.vhd").expect("expand");
        assert!(found.is_empty());
    }
}
