//! Keeping bound commands in sync with the snippet directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::app::engine::{Engine, InvocationHandle};
use crate::app::scan;
use crate::domain::errors::SnippetError;
use crate::domain::model::{NAMESPACE, PERMANENT_ACTIONS, SEPARATOR, SNIPPET_EXTENSION};
use crate::domain::model::{EDITOR_ACTION, RELOAD_ACTION, RERUN_ACTION};
use crate::host::{ActionContext, CommandCallback, CommandHost};
use crate::infra::store;

/// Derive the command name a snippet registers under.
///
/// Uniqueness is not enforced: two files can derive the same name, and the
/// one processed last during a sync wins the binding. That shadowing is a
/// documented quirk, not corrected here.
pub fn derive_command_name(path: &Path, description: Option<&str>) -> String {
    let label = match description {
        Some(description) if !description.is_empty() => description.to_owned(),
        _ => {
            let base = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            let suffix = format!(".{SNIPPET_EXTENSION}");
            base.strip_suffix(&suffix).unwrap_or(&base).to_owned()
        }
    };
    format!("{NAMESPACE}{SEPARATOR}{label}")
}

/// Full teardown-and-rebind synchronizer for the snippet namespace.
///
/// A sync is never incremental: every previously bound snippet command is
/// fully unbound before the current file set is re-registered, so the bound
/// set exactly mirrors the directory after every call and stale bindings
/// cannot leak. Syncs always run on the host's interactive thread; a change
/// signal arriving while one is in progress is coalesced.
pub struct Registry {
    root: PathBuf,
    host: Arc<dyn CommandHost>,
    engine: Arc<Engine>,
    syncing: AtomicBool,
}

impl Registry {
    pub fn new(root: impl Into<PathBuf>, host: Arc<dyn CommandHost>, engine: Arc<Engine>) -> Self {
        Self {
            root: root.into(),
            host,
            engine,
            syncing: AtomicBool::new(false),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    /// Register and bind the three permanent commands. The editor launcher
    /// lives in the UI layer, so its callback is supplied by the caller;
    /// rerun and reload bind back into this registry.
    pub fn install(registry: &Arc<Self>, editor: CommandCallback) -> Result<(), SnippetError> {
        let host = &registry.host;
        host.register_command(EDITOR_ACTION, None)?;
        host.register_command(RERUN_ACTION, None)?;
        host.register_command(RELOAD_ACTION, None)?;

        host.bind_command(EDITOR_ACTION, editor)?;

        let rerun = Arc::clone(registry);
        host.bind_command(
            RERUN_ACTION,
            Box::new(move |context| {
                rerun.rerun_last(context);
            }),
        )?;

        let reload = Arc::clone(registry);
        host.bind_command(
            RELOAD_ACTION,
            Box::new(move |_context| {
                reload.sync();
            }),
        )?;

        host.add_menu_entry(EDITOR_ACTION, "Snippet")?;
        host.add_menu_entry(RERUN_ACTION, "Snippet")?;
        host.add_menu_entry(RELOAD_ACTION, "Snippet")?;
        Ok(())
    }

    /// Rebuild the registry from the current snippet directory contents.
    pub fn sync(&self) {
        if self
            .syncing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("registry sync already in progress, coalescing");
            return;
        }
        self.rebuild();
        self.syncing.store(false, Ordering::Release);
    }

    /// Entry point for the external directory watcher.
    pub fn on_directory_changed(&self) {
        self.sync();
    }

    /// Entry point for the external per-file watcher.
    pub fn on_watched_file_changed(&self) {
        self.sync();
    }

    /// Re-invoke the most recently run snippet. A no-op when nothing has
    /// run yet this session.
    pub fn rerun_last(&self, context: Option<ActionContext>) -> Option<InvocationHandle> {
        let path = self.engine.state().last_run()?;
        Some(self.engine.invoke(&path, context))
    }

    fn rebuild(&self) {
        self.teardown();

        let mut registered = 0usize;
        for path in scan::walk_snippets(&self.root, SNIPPET_EXTENSION) {
            let record = store::parse_snippet(&path);
            if record.body.is_empty() {
                continue;
            }

            let name = derive_command_name(&path, record.description.as_deref());
            if let Err(err) = self.host.register_command(&name, record.hotkey.as_ref()) {
                tracing::warn!(command = %name, error = %err, "failed to register snippet command");
                continue;
            }

            let engine = Arc::clone(&self.engine);
            let snippet_path = path.clone();
            let callback: CommandCallback = Box::new(move |context| {
                engine.invoke(&snippet_path, context);
            });
            if let Err(err) = self.host.bind_command(&name, callback) {
                tracing::warn!(command = %name, error = %err, "failed to bind snippet command");
            }
            if let Err(err) = self.host.add_menu_entry(&name, NAMESPACE) {
                tracing::warn!(command = %name, error = %err, "failed to add menu entry");
            }
            registered += 1;
        }
        tracing::debug!(count = registered, root = %self.root.display(), "registry rebuilt");
    }

    /// Unbind every snippet-derived command except the permanent three.
    ///
    /// Later steps run even when an earlier one fails; in particular a
    /// failed menu removal must never leave a command registered.
    fn teardown(&self) {
        let prefix = format!("{NAMESPACE}{SEPARATOR}");
        for name in self.host.registered_commands() {
            if !name.starts_with(&prefix) || PERMANENT_ACTIONS.contains(&name.as_str()) {
                continue;
            }
            if let Err(err) = self.host.detach_hotkey(&name) {
                tracing::warn!(command = %name, error = %err, "failed to detach hotkey");
            }
            if let Err(err) = self.host.remove_menu_entry(&name) {
                tracing::warn!(command = %name, error = %err, "failed to remove menu entry");
            }
            if let Err(err) = self.host.unbind_command(&name) {
                tracing::warn!(command = %name, error = %err, "failed to unbind command");
            }
            if let Err(err) = self.host.unregister_command(&name) {
                tracing::warn!(command = %name, error = %err, "failed to unregister command");
            }
        }
    }
}
