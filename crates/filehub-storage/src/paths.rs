//! Shared object path handling for storage backends.
//!
//! Paths are backend-relative, `/`-separated, with no leading or trailing
//! slash. Prefixed backends (an S3 provider configured with a key prefix)
//! root every path under the prefix on the way in and strip it on the way
//! out, so callers only ever see prefix-relative paths.

use crate::traits::{StorageError, StorageResult};

/// Normalize a caller-supplied path: trims slashes and rejects traversal
/// segments. An empty string is the location root.
pub fn normalize(path: &str) -> StorageResult<String> {
    let trimmed = path.trim_matches('/');
    if trimmed.split('/').any(|segment| segment == "..") {
        return Err(StorageError::InvalidPath(format!(
            "path must not contain '..': {}",
            path
        )));
    }
    Ok(trimmed.to_string())
}

/// Root a normalized path under an optional key prefix.
pub fn join_prefix(prefix: Option<&str>, path: &str) -> String {
    match prefix.map(|p| p.trim_matches('/')).filter(|p| !p.is_empty()) {
        Some(p) if path.is_empty() => p.to_string(),
        Some(p) => format!("{}/{}", p, path),
        None => path.to_string(),
    }
}

/// Strip the key prefix from a backend-reported location, yielding the
/// prefix-relative path callers expect. Only a whole leading segment is
/// stripped: "uploadsX/a" does not match the prefix "uploads".
pub fn strip_prefix<'a>(prefix: Option<&str>, location: &'a str) -> &'a str {
    match prefix.map(|p| p.trim_matches('/')).filter(|p| !p.is_empty()) {
        Some(p) if location == p => "",
        Some(p) => location
            .strip_prefix(p)
            .and_then(|rest| rest.strip_prefix('/'))
            .unwrap_or(location),
        None => location,
    }
}

/// Derive the distinct intermediate directory paths implied by a set of file
/// paths under `root`, in first-seen order. Object stores report no real
/// directories, so a recursive listing synthesizes them from the keys.
pub fn implied_dirs(root: &str, file_paths: &[String]) -> Vec<String> {
    let mut seen = Vec::new();
    for file in file_paths {
        let Some(parent) = file.rsplit_once('/').map(|(parent, _)| parent) else {
            continue;
        };
        // Emit every ancestor between the root and the file.
        let mut current = String::new();
        for segment in parent.split('/') {
            if !current.is_empty() {
                current.push('/');
            }
            current.push_str(segment);
            if current.as_str() != root
                && current.len() > root.len()
                && !seen.contains(&current)
            {
                seen.push(current.clone());
            }
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_trims_and_rejects_traversal() {
        assert_eq!(normalize("/folder1/").unwrap(), "folder1");
        assert_eq!(normalize("").unwrap(), "");
        assert!(normalize("a/../b").is_err());
        assert!(normalize("..").is_err());
    }

    #[test]
    fn join_and_strip_are_inverse() {
        assert_eq!(join_prefix(Some("uploads"), "a/b.txt"), "uploads/a/b.txt");
        assert_eq!(join_prefix(Some("uploads/"), ""), "uploads");
        assert_eq!(join_prefix(None, "a/b.txt"), "a/b.txt");
        assert_eq!(strip_prefix(Some("uploads"), "uploads/a/b.txt"), "a/b.txt");
        assert_eq!(strip_prefix(None, "a/b.txt"), "a/b.txt");
    }

    #[test]
    fn strip_prefix_only_matches_whole_segments() {
        assert_eq!(strip_prefix(Some("uploads"), "uploadsX/a"), "uploadsX/a");
        assert_eq!(strip_prefix(Some("uploads"), "uploads"), "");
    }

    #[test]
    fn implied_dirs_come_from_file_keys() {
        let files = vec![
            "folder1/a.txt".to_string(),
            "folder1/sub/b.txt".to_string(),
            "top.txt".to_string(),
        ];
        let dirs = implied_dirs("", &files);
        assert_eq!(dirs, vec!["folder1".to_string(), "folder1/sub".to_string()]);

        let dirs = implied_dirs("folder1", &files[..2]);
        assert_eq!(dirs, vec!["folder1/sub".to_string()]);
    }
}
