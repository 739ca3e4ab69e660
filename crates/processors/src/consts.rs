use regex::Regex;
use std::sync::LazyLock;

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        pub(crate) static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

// `url(#id)` with optional quotes and inner whitespace. Group 2 is the id,
// groups 1 and 3 are kept verbatim when rewriting.
regex!(URL_REFERENCE, r#"(url\(\s*['"]?#)([^'")\s]+)(['"]?\s*\))"#);
regex!(WHITESPACE_RUN, r"\s+");
