//! Traits behind which the host application sits.
//!
//! The registry and engine never talk to a concrete host. Commands, menus,
//! hotkeys, open documents, and the script runtime all arrive through these
//! seams, so the core runs unchanged against the real host, the headless
//! CLI, or the fakes used in tests.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::domain::errors::SnippetError;
use crate::domain::keyseq::KeySequence;
use crate::domain::model::{Environment, ObjectRef};

/// Callback bound to a command; receives whatever context the host captured
/// at the moment the command fired.
pub type CommandCallback = Box<dyn Fn(Option<ActionContext>) + Send + Sync>;

/// The host's command, menu, and hotkey subsystem.
///
/// Registration and binding are separate steps, matching hosts that keep a
/// command table distinct from its handlers. `unregister_command` must not
/// assume the command is still bound.
pub trait CommandHost: Send + Sync {
    /// Names of every currently registered command, snippet-derived or not.
    fn registered_commands(&self) -> Vec<String>;

    fn register_command(
        &self,
        name: &str,
        hotkey: Option<&KeySequence>,
    ) -> Result<(), SnippetError>;

    fn bind_command(&self, name: &str, callback: CommandCallback) -> Result<(), SnippetError>;

    fn unbind_command(&self, name: &str) -> Result<(), SnippetError>;

    fn unregister_command(&self, name: &str) -> Result<(), SnippetError>;

    fn add_menu_entry(&self, name: &str, group: &str) -> Result<(), SnippetError>;

    fn remove_menu_entry(&self, name: &str) -> Result<(), SnippetError>;

    fn detach_hotkey(&self, name: &str) -> Result<(), SnippetError>;
}

/// An open document or binary view inside the host.
pub trait HostView: Send + Sync {
    /// Host-side identity of this view, for the execution environment.
    fn object(&self) -> ObjectRef;

    /// Open a named undo scope. Every `begin_undo` must be paired with
    /// exactly one `commit_undo`.
    fn begin_undo(&self, name: &str);

    fn commit_undo(&self);

    /// Move the host's visible cursor to `address`.
    fn navigate(&self, address: u64);

    /// Blocking re-analysis of the view.
    fn update_analysis_and_wait(&self);
}

/// The function under the cursor, with its derived representations.
pub trait HostFunction: Send + Sync {
    fn object(&self) -> ObjectRef;
    fn low_ir(&self) -> ObjectRef;
    fn mid_ir(&self) -> ObjectRef;
    fn high_ir(&self) -> ObjectRef;
    fn basic_block_at(&self, address: u64) -> Option<ObjectRef>;
}

/// What the host knows about "where the user is" when a command fires.
#[derive(Clone, Default)]
pub struct ActionContext {
    pub view: Option<Arc<dyn HostView>>,
    pub address: Option<u64>,
    /// Selection length in bytes; `Some(0)` still counts as a selection.
    pub length: Option<u64>,
    pub function: Option<Arc<dyn HostFunction>>,
    pub token: Option<String>,
}

impl fmt::Debug for ActionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionContext")
            .field("view", &self.view.is_some())
            .field("address", &self.address)
            .field("length", &self.length)
            .field("function", &self.function.is_some())
            .field("token", &self.token)
            .finish()
    }
}

/// A snippet body compiled into a runnable unit.
///
/// Runs on a worker thread, so implementations must be `Send`. Free
/// variables in the body resolve against the supplied environment, and any
/// assignments the body makes must be visible in it afterwards.
pub trait CompiledSnippet: Send {
    fn run(&self, env: &mut Environment) -> Result<(), SnippetError>;
}

/// Compiles snippet bodies. The runtime also decides which host-library
/// surface snippet code can reach; the engine only supplies the context
/// environment.
pub trait ScriptRuntime: Send + Sync {
    /// Compile `source`, reporting errors against `origin`. `first_line` is
    /// the line number of the first body line within the file, so error
    /// messages line up with what the user sees in their editor.
    fn compile(
        &self,
        source: &str,
        origin: &Path,
        first_line: u32,
    ) -> Result<Box<dyn CompiledSnippet>, SnippetError>;
}
