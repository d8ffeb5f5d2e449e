//! Asynchronous snippet execution.
//!
//! Each invocation is its own worker thread walking the
//! `Queued → Running → {Completed, Failed}` state machine. The interactive
//! thread only compiles and captures context; everything that can block or
//! fail arbitrarily happens on the worker. There is no cancellation: a hung
//! snippet occupies its own worker and nothing else.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use parking_lot::Mutex;

use crate::app::context::{ContextSnapshot, build_context};
use crate::app::registry::derive_command_name;
use crate::domain::errors::SnippetError;
use crate::domain::model::Value;
use crate::host::{ActionContext, CompiledSnippet, HostView, ScriptRuntime};
use crate::infra::store;

/// Line number of the first body line within a snippet file. The two header
/// lines are stripped before compilation, so compile errors are offset to
/// match the file on disk.
const BODY_FIRST_LINE: u32 = 3;

/// Process-wide engine state with an explicit owner instead of ambient
/// globals. Constructed once at startup and shared by reference with the
/// registry.
///
/// Writers are single-threaded by discipline (the interactive thread flips
/// the flag, an invocation records itself at start), but both cells are
/// safe against genuinely concurrent writers anyway.
pub struct EngineState {
    auto_update_analysis: AtomicBool,
    last_run: Mutex<Option<PathBuf>>,
}

impl EngineState {
    pub fn new(auto_update_analysis: bool) -> Self {
        Self {
            auto_update_analysis: AtomicBool::new(auto_update_analysis),
            last_run: Mutex::new(None),
        }
    }

    pub fn set_auto_update_analysis(&self, enabled: bool) {
        self.auto_update_analysis.store(enabled, Ordering::Release);
    }

    pub fn auto_update_analysis(&self) -> bool {
        self.auto_update_analysis.load(Ordering::Acquire)
    }

    /// Path of the most recently invoked snippet. Cleared only by process
    /// restart.
    pub fn last_run(&self) -> Option<PathBuf> {
        self.last_run.lock().clone()
    }

    fn record_last_run(&self, path: &Path) {
        *self.last_run.lock() = Some(path.to_path_buf());
    }
}

impl Default for EngineState {
    fn default() -> Self {
        Self::new(false)
    }
}

/// Where an invocation currently is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationStatus {
    Queued,
    Running,
    Completed,
    Failed,
}

/// Terminal result of an invocation. Re-running is always a fresh
/// user-initiated invocation; nothing retries automatically.
#[derive(Debug)]
pub enum InvocationOutcome {
    Completed,
    Failed(SnippetError),
}

impl InvocationOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, InvocationOutcome::Failed(_))
    }
}

/// Handle to a fire-and-forget invocation.
///
/// Dropping the handle detaches the worker; joining it is only needed when
/// the caller wants the outcome (tests, the editor's Run button).
pub struct InvocationHandle {
    path: PathBuf,
    status: Arc<Mutex<InvocationStatus>>,
    worker: Option<thread::JoinHandle<InvocationOutcome>>,
    immediate: Option<InvocationOutcome>,
}

impl InvocationHandle {
    fn failed(path: PathBuf, error: SnippetError) -> Self {
        Self {
            path,
            status: Arc::new(Mutex::new(InvocationStatus::Failed)),
            worker: None,
            immediate: Some(InvocationOutcome::Failed(error)),
        }
    }

    pub fn status(&self) -> InvocationStatus {
        *self.status.lock()
    }

    /// Block until the invocation reaches a terminal state.
    pub fn join(mut self) -> InvocationOutcome {
        if let Some(worker) = self.worker.take() {
            match worker.join() {
                Ok(outcome) => outcome,
                Err(_) => {
                    *self.status.lock() = InvocationStatus::Failed;
                    InvocationOutcome::Failed(SnippetError::Script {
                        path: self.path.clone(),
                        message: "snippet worker panicked".into(),
                    })
                }
            }
        } else {
            self.immediate
                .take()
                .unwrap_or(InvocationOutcome::Completed)
        }
    }
}

/// Compiles and runs snippets against host state.
pub struct Engine {
    state: Arc<EngineState>,
    runtime: Arc<dyn ScriptRuntime>,
}

impl Engine {
    pub fn new(runtime: Arc<dyn ScriptRuntime>, state: Arc<EngineState>) -> Self {
        Self { state, runtime }
    }

    pub fn state(&self) -> &Arc<EngineState> {
        &self.state
    }

    pub fn set_auto_update_analysis(&self, enabled: bool) {
        self.state.set_auto_update_analysis(enabled);
    }

    /// Invoke the snippet at `path` with whatever context the host captured.
    ///
    /// The file is re-read on every invocation; edits between runs always
    /// take effect. The last-run pointer is recorded before anything else so
    /// a rerun request issued during a long-running snippet still targets
    /// this file.
    pub fn invoke(&self, path: &Path, context: Option<ActionContext>) -> InvocationHandle {
        self.state.record_last_run(path);

        let record = store::parse_snippet(path);
        let name = derive_command_name(path, record.description.as_deref());

        let compiled = match self.runtime.compile(&record.body, path, BODY_FIRST_LINE) {
            Ok(compiled) => compiled,
            Err(err) => {
                tracing::error!(path = %path.display(), error = %err, "snippet failed to compile");
                return InvocationHandle::failed(path.to_path_buf(), err);
            }
        };

        let snapshot = build_context(context);
        self.spawn(name, path.to_path_buf(), compiled, snapshot)
    }

    fn spawn(
        &self,
        name: String,
        path: PathBuf,
        compiled: Box<dyn CompiledSnippet>,
        snapshot: ContextSnapshot,
    ) -> InvocationHandle {
        let status = Arc::new(Mutex::new(InvocationStatus::Queued));
        let worker_status = Arc::clone(&status);
        let state = Arc::clone(&self.state);
        let worker_path = path.clone();

        let worker = thread::Builder::new()
            .name(format!("snippet: {name}"))
            .spawn(move || {
                *worker_status.lock() = InvocationStatus::Running;
                let outcome = run_invocation(&name, &worker_path, compiled, snapshot, &state);
                *worker_status.lock() = match outcome {
                    InvocationOutcome::Completed => InvocationStatus::Completed,
                    InvocationOutcome::Failed(_) => InvocationStatus::Failed,
                };
                outcome
            });

        match worker {
            Ok(handle) => InvocationHandle {
                path,
                status,
                worker: Some(handle),
                immediate: None,
            },
            Err(err) => {
                tracing::error!(path = %path.display(), error = %err, "failed to spawn snippet worker");
                InvocationHandle::failed(
                    path.clone(),
                    SnippetError::Script {
                        path,
                        message: format!("failed to spawn worker: {err}"),
                    },
                )
            }
        }
    }
}

/// Commits an undo scope when dropped, so the boundary closes on every exit
/// path out of [`run_invocation`].
struct UndoScope {
    view: Arc<dyn HostView>,
}

impl UndoScope {
    fn open(view: Arc<dyn HostView>, name: &str) -> Self {
        view.begin_undo(name);
        Self { view }
    }
}

impl Drop for UndoScope {
    fn drop(&mut self) {
        self.view.commit_undo();
    }
}

fn run_invocation(
    name: &str,
    path: &Path,
    compiled: Box<dyn CompiledSnippet>,
    snapshot: ContextSnapshot,
    state: &EngineState,
) -> InvocationOutcome {
    let view = snapshot.view();
    let original_address = snapshot.address();
    let (_context, mut env) = snapshot.into_parts();

    let _scope = view
        .as_ref()
        .map(|view| UndoScope::open(Arc::clone(view), name));

    match compiled.run(&mut env) {
        Ok(()) => {}
        Err(err) => {
            tracing::error!(path = %path.display(), error = %err, "snippet raised during execution");
            return InvocationOutcome::Failed(err);
        }
    }

    if state.auto_update_analysis()
        && let Some(view) = &view
    {
        view.update_analysis_and_wait();
    }

    // `here` and `current_address` are equivalent legacy aliases; each is
    // checked on its own and each can issue its own navigation request.
    if let Some(view) = &view {
        if let Some(here) = env.get("here").and_then(Value::as_address)
            && Some(here) != original_address
        {
            view.navigate(here);
        }
        if let Some(addr) = env.get("current_address").and_then(Value::as_address)
            && Some(addr) != original_address
        {
            view.navigate(addr);
        }
    }

    InvocationOutcome::Completed
}
