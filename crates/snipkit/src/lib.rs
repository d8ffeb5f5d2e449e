pub mod app;
pub mod domain;
pub mod host;
pub mod infra;

pub use app::context::{ContextSnapshot, build_context};
pub use app::engine::{Engine, EngineState, InvocationHandle, InvocationOutcome};
pub use app::registry::{Registry, derive_command_name};
pub use domain::keyseq::KeySequence;
pub use domain::model::SnippetRecord;
pub use infra::store::{parse_snippet, save_snippet};

pub fn init() {
    tracing_subscriber::fmt::init();
}
