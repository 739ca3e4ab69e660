use std::path::{Path, PathBuf};
use std::str::FromStr;

use derive_more::Display;
use iconsprite_storage::normalize_path;

/// What happened on the filesystem.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    #[display("add")]
    Add,
    #[display("change")]
    Change,
    #[display("unlink")]
    Unlink,
    #[display("addDir")]
    AddDir,
    #[display("unlinkDir")]
    UnlinkDir,
}

impl EventKind {
    /// File events are about a single file, the rest about directories.
    pub fn is_file_event(self) -> bool {
        matches!(self, Self::Add | Self::Change | Self::Unlink)
    }
}

impl FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "add" => Ok(Self::Add),
            "change" => Ok(Self::Change),
            "unlink" => Ok(Self::Unlink),
            "addDir" => Ok(Self::AddDir),
            "unlinkDir" => Ok(Self::UnlinkDir),
            other => Err(format!("unknown event kind '{other}'")),
        }
    }
}

/// A filesystem event the collector cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    pub kind: EventKind,
    /// Absolute and normalised.
    pub path: PathBuf,
}

impl WatchEvent {
    /// Turns a raw watcher notification into an event, or `None` if it
    /// can't affect any sprite. Relative paths are taken relative to
    /// `src_dir`; file events only pass for `.svg` files.
    ///
    /// ```
    /// use std::path::Path;
    /// use iconsprite_build::{EventKind, WatchEvent};
    ///
    /// let event = WatchEvent::classify(EventKind::Add, "icons/a.svg", Path::new("/app")).unwrap();
    /// assert_eq!(event.path, Path::new("/app/icons/a.svg"));
    /// assert!(WatchEvent::classify(EventKind::Change, "notes.txt", Path::new("/app")).is_none());
    /// ```
    pub fn classify(kind: EventKind, path: impl AsRef<Path>, src_dir: &Path) -> Option<Self> {
        let path = normalize_path(src_dir.join(path.as_ref()));
        if kind.is_file_event() && path.extension().is_none_or(|extension| extension != "svg") {
            return None;
        }
        Some(Self { kind, path })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(EventKind::Add, "icons/a.svg", Some("/app/icons/a.svg"))]
    #[case(EventKind::Change, "/elsewhere/b.svg", Some("/elsewhere/b.svg"))]
    #[case(EventKind::Unlink, "./icons/../c.svg", Some("/app/c.svg"))]
    #[case(EventKind::Add, "icons/a.svg.bak", None)]
    #[case(EventKind::Change, "icons/A.SVG", None)]
    #[case(EventKind::Unlink, "icons", None)]
    #[case(EventKind::AddDir, "icons/new", Some("/app/icons/new"))]
    #[case(EventKind::UnlinkDir, "/app/icons/old.d", Some("/app/icons/old.d"))]
    fn test_classify(#[case] kind: EventKind, #[case] path: &str, #[case] expected: Option<&str>) {
        let event = WatchEvent::classify(kind, path, Path::new("/app"));
        assert_eq!(event.map(|e| e.path), expected.map(PathBuf::from));
    }

    #[rstest]
    #[case("add", EventKind::Add)]
    #[case("change", EventKind::Change)]
    #[case("unlink", EventKind::Unlink)]
    #[case("addDir", EventKind::AddDir)]
    #[case("unlinkDir", EventKind::UnlinkDir)]
    fn test_kind_names(#[case] name: &str, #[case] kind: EventKind) {
        assert_eq!(name.parse::<EventKind>().unwrap(), kind);
        assert_eq!(kind.to_string(), name);
    }

    #[test]
    fn unknown_kind() {
        assert!("rename".parse::<EventKind>().is_err());
    }
}
