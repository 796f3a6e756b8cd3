use std::path::{Component, Path, PathBuf};

/// Render `path` relative to `base`, climbing with `..` when needed.
///
/// Paths that share no anchor with `base` (one absolute, one relative) are
/// shown normalized but otherwise as given.
pub fn display_path(path: &Path, base: Option<&Path>) -> String {
    let path = normalize_lexically(path);
    if let Some(relative) = base.and_then(|base| relative_to(&path, &normalize_lexically(base))) {
        return relative.display().to_string();
    }
    path.display().to_string()
}

fn relative_to(path: &Path, base: &Path) -> Option<PathBuf> {
    if path.has_root() != base.has_root() {
        return None;
    }
    let path_parts: Vec<_> = path
        .components()
        .filter(|component| *component != Component::CurDir)
        .collect();
    let base_parts: Vec<_> = base
        .components()
        .filter(|component| *component != Component::CurDir)
        .collect();
    let shared = path_parts
        .iter()
        .zip(&base_parts)
        .take_while(|(left, right)| left == right)
        .count();
    // Climbing out of a base that itself starts with `..` is not expressible.
    if base_parts[shared..]
        .iter()
        .any(|component| *component == Component::ParentDir)
    {
        return None;
    }
    let mut out = PathBuf::new();
    for _ in shared..base_parts.len() {
        out.push("..");
    }
    for component in &path_parts[shared..] {
        out.push(component.as_os_str());
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    Some(out)
}

/// Drop `.` components and fold `dir/..` pairs without touching the
/// filesystem. Leading `..` components are kept.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let can_pop = matches!(
                    out.components().next_back(),
                    Some(Component::Normal(_))
                );
                if can_pop {
                    out.pop();
                } else {
                    out.push(component.as_os_str());
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}
