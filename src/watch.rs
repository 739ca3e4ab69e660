//! Rebuilds on filesystem changes.
//!
//! `notify` reports raw events from its own thread; they are forwarded over a
//! channel, translated into [`EventKind`]s and handed to the collector one at
//! a time. Outputs are rewritten only when a dispatch reports a change.
//!
//! In dev mode the generated runtime points at `/__iconsprite/`; the host's
//! dev server maps that route onto the output directory.

use crate::error::{ErrorKind, Result};
use crate::project::Project;
use exn::ResultExt;
use iconsprite_build::{EventKind, WatchEvent};
use notify::event::{CreateKind, ModifyKind, RemoveKind, RenameMode};
use notify::{RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

/// Maps one `notify` event onto collector events. Paths that no longer exist
/// are guessed to be files when they have an extension.
pub fn translate(event: &notify::Event) -> Vec<(EventKind, PathBuf)> {
    let created = |path: &Path| match path.is_dir() {
        true => EventKind::AddDir,
        false => EventKind::Add,
    };
    let removed = |path: &Path| match path.extension().is_some() {
        true => EventKind::Unlink,
        false => EventKind::UnlinkDir,
    };
    let each = |kind: &dyn Fn(&Path) -> EventKind| -> Vec<(EventKind, PathBuf)> {
        event.paths.iter().map(|path| (kind(path), path.clone())).collect()
    };
    match &event.kind {
        notify::EventKind::Create(CreateKind::File) => each(&|_| EventKind::Add),
        notify::EventKind::Create(CreateKind::Folder) => each(&|_| EventKind::AddDir),
        notify::EventKind::Create(_) => each(&created),
        notify::EventKind::Remove(RemoveKind::File) => each(&|_| EventKind::Unlink),
        notify::EventKind::Remove(RemoveKind::Folder) => each(&|_| EventKind::UnlinkDir),
        notify::EventKind::Remove(_) => each(&removed),
        notify::EventKind::Modify(ModifyKind::Name(RenameMode::From)) => each(&removed),
        notify::EventKind::Modify(ModifyKind::Name(RenameMode::To)) => each(&created),
        notify::EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => match event.paths.as_slice() {
            [from, to] => vec![(removed(from), from.clone()), (created(to), to.clone())],
            _ => Vec::new(),
        },
        notify::EventKind::Modify(ModifyKind::Name(_)) => {
            each(&|path: &Path| match path.exists() {
                true => created(path),
                false => removed(path),
            })
        },
        notify::EventKind::Modify(ModifyKind::Metadata(_)) => Vec::new(),
        notify::EventKind::Modify(_) => each(&|_| EventKind::Change),
        _ => Vec::new(),
    }
}

/// Builds once, then keeps the outputs up to date until interrupted.
pub async fn run(project: &Project) -> Result<()> {
    let (sender, mut receiver) = mpsc::unbounded_channel();
    let mut watcher = notify::recommended_watcher(move |result| {
        let _ = sender.send(result);
    })
    .or_raise(|| ErrorKind::Watch)?;
    // Watch before the initial build so nothing in between is missed.
    watcher.watch(project.src_dir(), RecursiveMode::Recursive).or_raise(|| ErrorKind::Watch)?;
    project.build().await?;
    tracing::info!(src = %project.src_dir().display(), "watching for changes");

    loop {
        tokio::select! {
            received = receiver.recv() => match received {
                Some(Ok(event)) => apply(project, &event).await,
                Some(Err(err)) => tracing::warn!(error = %err, "watcher error"),
                None => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    tracing::info!("stopped watching");
    Ok(())
}

async fn apply(project: &Project, event: &notify::Event) {
    let mut changed = false;
    for (kind, path) in translate(event) {
        if path.starts_with(project.out_dir()) {
            continue;
        }
        let Some(event) = WatchEvent::classify(kind, &path, project.src_dir()) else {
            continue;
        };
        tracing::debug!(kind = %event.kind, path = %event.path.display(), "dispatching");
        match project.collector().dispatch(&event).await {
            Ok(result) => changed |= result,
            Err(err) => tracing::warn!(kind = %event.kind, path = %event.path.display(), error = ?err, "event failed"),
        }
    }
    if changed && let Err(err) = project.write().await {
        tracing::error!(error = ?err, "could not rewrite outputs");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    fn event(kind: notify::EventKind, paths: &[&Path]) -> notify::Event {
        paths.iter().fold(notify::Event::new(kind), |event, path| event.add_path(path.to_path_buf()))
    }

    #[rstest]
    #[case(notify::EventKind::Create(CreateKind::File), EventKind::Add)]
    #[case(notify::EventKind::Create(CreateKind::Folder), EventKind::AddDir)]
    #[case(notify::EventKind::Remove(RemoveKind::File), EventKind::Unlink)]
    #[case(notify::EventKind::Remove(RemoveKind::Folder), EventKind::UnlinkDir)]
    #[case(notify::EventKind::Modify(ModifyKind::Data(notify::event::DataChange::Content)), EventKind::Change)]
    #[case(notify::EventKind::Modify(ModifyKind::Any), EventKind::Change)]
    fn test_translate(#[case] kind: notify::EventKind, #[case] expected: EventKind) {
        let path = Path::new("/app/icons/a.svg");
        assert_eq!(translate(&event(kind, &[path])), [(expected, path.to_path_buf())]);
    }

    #[test]
    fn metadata_changes_are_ignored() {
        let kind = notify::EventKind::Modify(ModifyKind::Metadata(notify::event::MetadataKind::Permissions));
        assert!(translate(&event(kind, &[Path::new("/app/a.svg")])).is_empty());
        assert!(translate(&event(notify::EventKind::Access(notify::event::AccessKind::Any), &[Path::new("/a.svg")])).is_empty());
    }

    #[test]
    fn rename_is_unlink_then_add() {
        let dir = TempDir::new().unwrap();
        let to = dir.path().join("new.svg");
        std::fs::write(&to, "<svg/>").unwrap();
        let from = dir.path().join("old.svg");
        let kind = notify::EventKind::Modify(ModifyKind::Name(RenameMode::Both));
        assert_eq!(
            translate(&event(kind, &[&from, &to])),
            [(EventKind::Unlink, from.clone()), (EventKind::Add, to.clone())]
        );
    }

    #[test]
    fn ambiguous_events_check_the_filesystem() {
        let dir = TempDir::new().unwrap();
        let created = dir.path().join("nested");
        std::fs::create_dir(&created).unwrap();
        assert_eq!(
            translate(&event(notify::EventKind::Create(CreateKind::Any), &[&created])),
            [(EventKind::AddDir, created.clone())]
        );
        let gone = dir.path().join("gone");
        assert_eq!(
            translate(&event(notify::EventKind::Remove(RemoveKind::Any), &[&gone])),
            [(EventKind::UnlinkDir, gone.clone())]
        );
        let gone_file = dir.path().join("gone.svg");
        assert_eq!(
            translate(&event(notify::EventKind::Modify(ModifyKind::Name(RenameMode::Any)), &[&gone_file])),
            [(EventKind::Unlink, gone_file.clone())]
        );
    }

    #[tokio::test]
    async fn apply_rewrites_outputs_on_change() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("assets/symbols")).unwrap();
        std::fs::write(dir.path().join("assets/symbols/a.svg"), "<svg/>").unwrap();
        let settings = iconsprite_config::Settings { dev: true, ..Default::default() };
        let project = Project::open(&settings, dir.path()).unwrap();
        project.build().await.unwrap();

        let added = dir.path().join("assets/symbols/b.svg");
        std::fs::write(&added, "<svg/>").unwrap();
        apply(&project, &event(notify::EventKind::Create(CreateKind::File), &[&added])).await;
        let runtime = std::fs::read_to_string(dir.path().join(".iconsprite/runtime.js")).unwrap();
        assert!(runtime.contains("\"b\""), "{runtime}");

        // Outputs never feed back into the collector.
        let output = dir.path().join(".iconsprite/sprite-default.x.svg");
        apply(&project, &event(notify::EventKind::Create(CreateKind::File), &[&output])).await;
        assert_eq!(project.collector().exports().await.symbol_names, ["a", "b"]);
    }
}
