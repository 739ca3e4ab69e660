use regex::Regex;
use std::sync::LazyLock;

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        pub(crate) static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

regex!(INVALID_ID_CHARS, r"[^A-Za-z0-9_-]+");
regex!(HYPHEN_RUN, r"-{2,}");

pub const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";
/// Route prefix under which a dev server hands out live sprites.
pub const DEV_SPRITE_ROUTE: &str = "/__iconsprite/";
/// Served for sprite names nobody configured.
pub const EMPTY_SPRITE: &str = "<svg></svg>";
pub const MAX_ID_LENGTH: usize = 64;
