//! Filesystem watching over the snippet root.
//!
//! The watcher is deliberately dumb: any create, modify, or remove anywhere
//! under the root fires the handler, and the handler is expected to route to
//! [`Registry::on_directory_changed`](crate::app::registry::Registry) on the
//! host's interactive thread. The registry coalesces bursts itself.

use std::path::Path;

use anyhow::{Context, Result};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

/// Watches a snippet directory and forwards change events to a handler.
///
/// Dropping the watcher stops it.
pub struct SnippetWatcher {
    _watcher: RecommendedWatcher,
}

impl SnippetWatcher {
    pub fn new<F>(root: &Path, on_change: F) -> Result<Self>
    where
        F: Fn() + Send + 'static,
    {
        let mut watcher =
            notify::recommended_watcher(move |result: notify::Result<Event>| match result {
                Ok(event) if is_relevant(&event.kind) => on_change(),
                Ok(_) => {}
                Err(err) => {
                    tracing::warn!(error = %err, "snippet watcher error");
                }
            })
            .context("failed to create snippet watcher")?;

        watcher
            .watch(root, RecursiveMode::Recursive)
            .with_context(|| format!("failed to watch snippet directory {}", root.display()))?;

        Ok(Self { _watcher: watcher })
    }
}

fn is_relevant(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    )
}
