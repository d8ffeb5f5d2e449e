//! Shared fakes standing in for the host application.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;

use snipkit::KeySequence;
use snipkit::domain::errors::SnippetError;
use snipkit::domain::model::{Environment, ObjectRef, Value};
use snipkit::host::{
    ActionContext, CommandCallback, CommandHost, CompiledSnippet, HostView, ScriptRuntime,
};

/// In-memory command subsystem that records every operation.
#[derive(Default)]
pub struct FakeHost {
    state: Mutex<HostState>,
}

#[derive(Default)]
struct HostState {
    registered: Vec<String>,
    hotkeys: HashMap<String, KeySequence>,
    bindings: HashMap<String, Arc<CommandCallback>>,
    menu: Vec<(String, String)>,
    fail_menu_removal: HashSet<String>,
    ops: Vec<(String, String)>,
}

/// Comparable view of everything the host currently has bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationSnapshot {
    pub registered: Vec<String>,
    pub hotkeys: Vec<(String, String)>,
    pub bound: Vec<String>,
    pub menu: Vec<(String, String)>,
}

impl FakeHost {
    pub fn registered(&self) -> Vec<String> {
        let mut names = self.state.lock().registered.clone();
        names.sort();
        names
    }

    pub fn hotkey(&self, name: &str) -> Option<KeySequence> {
        self.state.lock().hotkeys.get(name).cloned()
    }

    pub fn menu_entries(&self) -> Vec<(String, String)> {
        let mut entries = self.state.lock().menu.clone();
        entries.sort();
        entries
    }

    pub fn ops(&self) -> Vec<(String, String)> {
        self.state.lock().ops.clone()
    }

    /// Make `remove_menu_entry` fail for `name` from now on.
    pub fn fail_menu_removal_for(&self, name: &str) {
        self.state.lock().fail_menu_removal.insert(name.to_owned());
    }

    /// Fire a bound command the way the host would on a click or hotkey.
    pub fn invoke_command(&self, name: &str, context: Option<ActionContext>) {
        let callback = self
            .state
            .lock()
            .bindings
            .get(name)
            .cloned()
            .unwrap_or_else(|| panic!("command {name} is not bound"));
        (*callback)(context);
    }

    pub fn snapshot(&self) -> RegistrationSnapshot {
        let state = self.state.lock();
        let mut registered = state.registered.clone();
        registered.sort();
        let mut hotkeys: Vec<_> = state
            .hotkeys
            .iter()
            .map(|(name, seq)| (name.clone(), seq.to_string()))
            .collect();
        hotkeys.sort();
        let mut bound: Vec<_> = state.bindings.keys().cloned().collect();
        bound.sort();
        let mut menu = state.menu.clone();
        menu.sort();
        RegistrationSnapshot {
            registered,
            hotkeys,
            bound,
            menu,
        }
    }

    fn log(&self, op: &str, name: &str) {
        self.state.lock().ops.push((op.to_owned(), name.to_owned()));
    }
}

impl CommandHost for FakeHost {
    fn registered_commands(&self) -> Vec<String> {
        self.state.lock().registered.clone()
    }

    fn register_command(
        &self,
        name: &str,
        hotkey: Option<&KeySequence>,
    ) -> Result<(), SnippetError> {
        self.log("register", name);
        let mut state = self.state.lock();
        if !state.registered.iter().any(|n| n == name) {
            state.registered.push(name.to_owned());
        }
        match hotkey {
            Some(hotkey) => {
                state.hotkeys.insert(name.to_owned(), hotkey.clone());
            }
            None => {
                state.hotkeys.remove(name);
            }
        }
        Ok(())
    }

    fn bind_command(&self, name: &str, callback: CommandCallback) -> Result<(), SnippetError> {
        self.log("bind", name);
        self.state
            .lock()
            .bindings
            .insert(name.to_owned(), Arc::new(callback));
        Ok(())
    }

    fn unbind_command(&self, name: &str) -> Result<(), SnippetError> {
        self.log("unbind", name);
        self.state.lock().bindings.remove(name);
        Ok(())
    }

    fn unregister_command(&self, name: &str) -> Result<(), SnippetError> {
        self.log("unregister", name);
        self.state.lock().registered.retain(|n| n != name);
        Ok(())
    }

    fn add_menu_entry(&self, name: &str, group: &str) -> Result<(), SnippetError> {
        self.log("add_menu", name);
        let mut state = self.state.lock();
        let entry = (name.to_owned(), group.to_owned());
        if !state.menu.contains(&entry) {
            state.menu.push(entry);
        }
        Ok(())
    }

    fn remove_menu_entry(&self, name: &str) -> Result<(), SnippetError> {
        self.log("remove_menu", name);
        let mut state = self.state.lock();
        if state.fail_menu_removal.contains(name) {
            return Err(SnippetError::Registration {
                name: name.to_owned(),
                message: "menu removal rejected by host".into(),
            });
        }
        state.menu.retain(|(n, _)| n != name);
        Ok(())
    }

    fn detach_hotkey(&self, name: &str) -> Result<(), SnippetError> {
        self.log("detach_hotkey", name);
        self.state.lock().hotkeys.remove(name);
        Ok(())
    }
}

/// Everything a snippet did to the view, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewOp {
    BeginUndo(String),
    CommitUndo,
    Navigate(u64),
    UpdateAnalysis,
}

#[derive(Default)]
pub struct FakeView {
    ops: Mutex<Vec<ViewOp>>,
}

impl FakeView {
    pub fn ops(&self) -> Vec<ViewOp> {
        self.ops.lock().clone()
    }

    pub fn count(&self, matcher: impl Fn(&ViewOp) -> bool) -> usize {
        self.ops.lock().iter().filter(|op| matcher(op)).count()
    }
}

impl HostView for FakeView {
    fn object(&self) -> ObjectRef {
        ObjectRef(1)
    }

    fn begin_undo(&self, name: &str) {
        self.ops.lock().push(ViewOp::BeginUndo(name.to_owned()));
    }

    fn commit_undo(&self) {
        self.ops.lock().push(ViewOp::CommitUndo);
    }

    fn navigate(&self, address: u64) {
        self.ops.lock().push(ViewOp::Navigate(address));
    }

    fn update_analysis_and_wait(&self) {
        self.ops.lock().push(ViewOp::UpdateAnalysis);
    }
}

/// Toy runtime interpreting one directive per line.
///
/// `name = 0x1234` binds an address in the environment, `raise` fails the
/// run, and a body containing `@syntax-error` refuses to compile.
#[derive(Default)]
pub struct FakeRuntime {
    compiles: AtomicUsize,
}

impl FakeRuntime {
    pub fn compile_count(&self) -> usize {
        self.compiles.load(Ordering::SeqCst)
    }
}

impl ScriptRuntime for FakeRuntime {
    fn compile(
        &self,
        source: &str,
        origin: &Path,
        _first_line: u32,
    ) -> Result<Box<dyn CompiledSnippet>, SnippetError> {
        self.compiles.fetch_add(1, Ordering::SeqCst);
        if source.contains("@syntax-error") {
            return Err(SnippetError::Compile {
                path: origin.to_path_buf(),
                message: "invalid syntax".into(),
            });
        }
        Ok(Box::new(FakeCompiled {
            origin: origin.to_path_buf(),
            program: source.to_owned(),
        }))
    }
}

struct FakeCompiled {
    origin: PathBuf,
    program: String,
}

impl CompiledSnippet for FakeCompiled {
    fn run(&self, env: &mut Environment) -> Result<(), SnippetError> {
        for line in self.program.lines() {
            let line = line.trim();
            if line == "raise" {
                return Err(SnippetError::Script {
                    path: self.origin.clone(),
                    message: "deliberate failure".into(),
                });
            }
            if let Some((name, value)) = line.split_once('=') {
                let value = value.trim();
                let parsed = value
                    .strip_prefix("0x")
                    .map(|hex| u64::from_str_radix(hex, 16))
                    .unwrap_or_else(|| value.parse());
                if let Ok(address) = parsed {
                    env.set(name.trim(), Value::Address(address));
                }
            }
        }
        Ok(())
    }
}
