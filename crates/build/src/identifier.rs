use crate::consts::{HYPHEN_RUN, INVALID_ID_CHARS, MAX_ID_LENGTH};
use crate::error::{ErrorKind, Result};

/// Turns a file name stem into something usable as an XML `id`.
///
/// Runs of characters outside `[A-Za-z0-9_-]` become a single hyphen (and
/// merge with hyphens next to them), ids that would start with a digit or a
/// hyphen get an `id-` prefix, and the result is cut to 64 characters
/// without a trailing hyphen.
///
/// ```
/// use iconsprite_build::sanitize;
///
/// assert_eq!(sanitize("  Hello World!  ").unwrap(), "Hello-World");
/// assert_eq!(sanitize("123abc").unwrap(), "id-123abc");
/// assert!(sanitize("   ").is_err());
/// ```
pub fn sanitize(raw: &str) -> Result<String> {
    let replaced = INVALID_ID_CHARS.replace_all(raw.trim(), "-");
    let collapsed = HYPHEN_RUN.replace_all(&replaced, "-");
    let mut id = match collapsed.starts_with(|c: char| c.is_ascii_digit() || c == '-') {
        true => format!("id-{collapsed}"),
        false => collapsed.into_owned(),
    };
    if id.is_empty() {
        exn::bail!(ErrorKind::EmptyIdentifier(raw.to_string()));
    }
    // Only ASCII is left at this point, so bytes are characters.
    id.truncate(MAX_ID_LENGTH);
    if id.ends_with('-') {
        id.pop();
    }
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("  Hello World!  ", "Hello-World")]
    #[case("123abc", "id-123abc")]
    #[case("-abc", "id--abc")]
    #[case("arrow_left", "arrow_left")]
    #[case("a - b", "a-b")]
    #[case("a---b", "a-b")]
    #[case("icon.name", "icon-name")]
    #[case("café", "caf")]
    #[case("日本", "id-")]
    #[case("ok-", "ok")]
    fn test_sanitize(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(sanitize(raw).unwrap(), expected);
    }

    #[test]
    fn truncates_to_maximum_length() {
        assert_eq!(sanitize(&"a".repeat(70)).unwrap().len(), 64);
        // Cut lands right after a hyphen: it goes too.
        let raw = format!("{}-bcd", "a".repeat(63));
        assert_eq!(sanitize(&raw).unwrap(), "a".repeat(63));
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("\t\n")]
    fn test_empty(#[case] raw: &str) {
        let err = sanitize(raw).unwrap_err();
        assert_eq!(*err, ErrorKind::EmptyIdentifier(raw.to_string()));
    }

    #[rstest]
    #[case("x")]
    #[case("  Hello World!  ")]
    #[case("2024 report (final)")]
    #[case("___")]
    #[case("--a--")]
    #[case("ünïcödé ïcön")]
    fn test_output_shape(#[case] raw: &str) {
        let id = sanitize(raw).unwrap();
        assert!(id.len() <= MAX_ID_LENGTH);
        assert!(!id.ends_with('-') || id == "id-");
        assert!(id.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_'));
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-'));
    }
}
