//! Path validation and normalisation.

use std::path::{Component, Path, PathBuf};

use crate::error::{ErrorKind, Result};

/// Validates a root-relative path used for writing.
/// Ensures that paths don't escape the storage root (no `..` traversal).
///
/// > **Note:** This does **not** normalize backslashes, non-UTF8 bytes, or
/// >           platform-specific weirdness. Null bytes are explicitly rejected.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use iconsprite_storage::validate_path;
/// assert!(validate_path("runtime.js").is_ok());
/// assert!(validate_path("symbols/arrow.js").is_ok());
/// assert!(validate_path("a/../sprite.svg").is_ok()); // (never leaves the root)
/// assert!(validate_path("../etc/passwd").is_err());
/// assert!(validate_path("a/../../b").is_err());
/// assert_eq!(
///     validate_path("wrong/.././symbols//./arrow.js/").unwrap(),
///     Path::new("symbols/arrow.js")
/// );
/// ```
pub fn validate(path: impl AsRef<Path>) -> Result<PathBuf> {
    let mut components = Vec::new();
    for component in path.as_ref().components() {
        match component {
            Component::Normal(s) => {
                // Null bytes pass through Path::components() on Unix but cause
                // truncation in C-based syscalls.
                if s.as_encoded_bytes().contains(&0) {
                    exn::bail!(ErrorKind::InvalidPath(path.as_ref().to_path_buf()));
                }
                components.push(s)
            },
            Component::CurDir | Component::RootDir => {},
            Component::Prefix(_) => exn::bail!(ErrorKind::InvalidPath(path.as_ref().to_path_buf())),
            Component::ParentDir => {
                if components.pop().is_none() {
                    exn::bail!(ErrorKind::InvalidPath(path.as_ref().to_path_buf()));
                }
            },
        }
    }
    match components.is_empty() {
        true => exn::bail!(ErrorKind::InvalidPath(path.as_ref().to_path_buf())),
        false => Ok(components.into_iter().collect()),
    }
}

/// Lexically normalises a path: drops `.` components and resolves `..`
/// against the preceding component. Never touches the filesystem, so symlinks
/// are not followed. `..` at the root stays at the root.
///
/// ```
/// use std::path::Path;
/// use iconsprite_storage::normalize_path;
/// assert_eq!(normalize_path("/app/./assets/../icons//a.svg"), Path::new("/app/icons/a.svg"));
/// assert_eq!(normalize_path("/.."), Path::new("/"));
/// assert_eq!(normalize_path("../a/./b"), Path::new("../a/b"));
/// ```
pub fn normalize(path: impl AsRef<Path>) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.as_ref().components() {
        match component {
            Component::CurDir => {},
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                },
                Some(Component::RootDir | Component::Prefix(_)) => {},
                _ => normalized.push(".."),
            },
            other => normalized.push(other),
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("sprite.svg", "sprite.svg")]
    #[case("a//b//c", "a/b/c")]
    #[case("a/./b/./c", "a/b/c")]
    #[case("a/b/..", "a")]
    #[case("symbols/", "symbols")]
    #[case("/absolute/is/rooted", "absolute/is/rooted")]
    fn test_valid(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(validate(input).unwrap(), Path::new(expected));
    }

    #[rstest]
    #[case("")]
    #[case(".")]
    #[case("./")]
    #[case("//")]
    #[case("..")]
    #[case("../etc/passwd")]
    #[case("a/../../b")]
    #[case("a\0b")]
    fn test_invalid(#[case] input: &str) {
        let err = validate(input).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidPath(_)));
    }

    #[rstest]
    #[case("/a/b/c.svg", "/a/b/c.svg")]
    #[case("/a/./b/../c.svg", "/a/c.svg")]
    #[case("/a//b/", "/a/b")]
    #[case("/../../a", "/a")]
    #[case("a/../../b", "../b")]
    #[case("./a", "a")]
    fn test_normalize(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize(input), Path::new(expected));
    }
}
