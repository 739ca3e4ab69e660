use std::path::{Path, PathBuf};

use exn::ResultExt;
use glob::{MatchOptions, Pattern};

use crate::error::{ErrorKind, Result};

/// `*` never crosses a directory boundary, `**` does; dotfiles are not special.
pub(crate) const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// A compiled list of glob patterns anchored to a root directory.
///
/// Patterns starting with `!` exclude whatever they match from the result of
/// the other patterns, regardless of where they appear in the list.
#[derive(Debug, Clone)]
pub struct PatternSet {
    include: Vec<Pattern>,
    exclude: Vec<Pattern>,
}

impl PatternSet {
    pub fn new(root: &Path, patterns: &[impl AsRef<str>]) -> Result<Self> {
        let mut include = Vec::new();
        let mut exclude = Vec::new();
        for raw in patterns {
            let raw = raw.as_ref().trim();
            let (negated, body) = match raw.strip_prefix('!') {
                Some(rest) => (true, rest),
                None => (false, raw),
            };
            let pattern = Pattern::new(&anchor(root, body)).or_raise(|| ErrorKind::InvalidPattern(raw.to_string()))?;
            match negated {
                true => exclude.push(pattern),
                false => include.push(pattern),
            }
        }
        Ok(Self { include, exclude })
    }

    pub fn includes(&self) -> &[Pattern] {
        &self.include
    }

    pub fn is_excluded(&self, path: &Path) -> bool {
        self.exclude.iter().any(|pattern| pattern.matches_path_with(path, MATCH_OPTIONS))
    }

    pub fn matches(&self, path: &Path) -> bool {
        self.include.iter().any(|pattern| pattern.matches_path_with(path, MATCH_OPTIONS)) && !self.is_excluded(path)
    }
}

/// Turns a pattern into an absolute one. The root is escaped so that
/// directories named like `[icons]` match literally.
fn anchor(root: &Path, pattern: &str) -> String {
    if Path::new(pattern).is_absolute() {
        return pattern.to_string();
    }
    let mut root: PathBuf = root.to_path_buf();
    let mut rest = pattern;
    loop {
        if let Some(stripped) = rest.strip_prefix("./") {
            rest = stripped;
        } else if let Some(stripped) = rest.strip_prefix("../") {
            root.pop();
            rest = stripped;
        } else {
            break;
        }
    }
    let root = Pattern::escape(&root.to_string_lossy());
    format!("{}/{}", root.trim_end_matches('/'), rest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("icons/*.svg", "/app/icons/*.svg")]
    #[case("./icons/*.svg", "/app/icons/*.svg")]
    #[case("../shared/*.svg", "/shared/*.svg")]
    #[case("/abs/**/*.svg", "/abs/**/*.svg")]
    fn test_anchor(#[case] pattern: &str, #[case] expected: &str) {
        assert_eq!(anchor(Path::new("/app"), pattern), expected);
    }

    #[test]
    fn root_metacharacters_are_literal() {
        let set = PatternSet::new(Path::new("/a[1]"), &["*.svg"]).unwrap();
        assert!(set.matches(Path::new("/a[1]/x.svg")));
        assert!(!set.matches(Path::new("/a1/x.svg")));
    }

    #[rstest]
    #[case("/app/icons/a.svg", true)]
    #[case("/app/icons/nested/a.svg", false)]
    #[case("/app/icons/.hidden.svg", true)]
    #[case("/app/icons/a.SVG", false)]
    #[case("/app/icons/skip.svg", false)]
    fn test_matches(#[case] path: &str, #[case] expected: bool) {
        let set = PatternSet::new(Path::new("/app"), &["icons/*.svg", "!icons/skip.svg"]).unwrap();
        assert_eq!(set.matches(Path::new(path)), expected);
    }

    #[test]
    fn double_star_crosses_directories() {
        let set = PatternSet::new(Path::new("/app"), &["icons/**/*.svg"]).unwrap();
        assert!(set.matches(Path::new("/app/icons/a.svg")));
        assert!(set.matches(Path::new("/app/icons/x/y/a.svg")));
    }

    #[test]
    fn invalid_pattern() {
        let err = PatternSet::new(Path::new("/app"), &["icons/[.svg"]).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidPattern(p) if p == "icons/[.svg"));
    }
}
