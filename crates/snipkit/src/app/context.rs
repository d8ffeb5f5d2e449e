//! Capturing host state into an immutable snapshot at invocation time.

use std::sync::Arc;

use crate::domain::model::{Environment, Value};
use crate::host::{ActionContext, HostView};

/// Host state frozen at the moment a snippet was invoked.
///
/// Owned by exactly one invocation: the engine consumes it, the snippet
/// mutates only the environment copy, and everything is discarded when the
/// invocation completes. `context` is the back-reference to the originating
/// host context.
pub struct ContextSnapshot {
    context: Option<ActionContext>,
    env: Environment,
}

impl ContextSnapshot {
    pub fn view(&self) -> Option<Arc<dyn HostView>> {
        self.context.as_ref().and_then(|ctx| ctx.view.clone())
    }

    pub fn address(&self) -> Option<u64> {
        self.context.as_ref().and_then(|ctx| ctx.address)
    }

    pub fn context(&self) -> Option<&ActionContext> {
        self.context.as_ref()
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    pub fn into_parts(self) -> (Option<ActionContext>, Environment) {
        (self.context, self.env)
    }
}

/// Build the execution environment for one invocation.
///
/// Every name is always present; fields the host could not supply are bound
/// to [`Value::Null`] so that snippets can probe them without failing. With
/// no host context at all (`None`), the result is the deterministic
/// all-absent placeholder that lets context-independent snippets run
/// headless.
pub fn build_context(context: Option<ActionContext>) -> ContextSnapshot {
    let mut env = Environment::new();

    let view = context.as_ref().and_then(|ctx| ctx.view.clone());
    let address = context.as_ref().and_then(|ctx| ctx.address);
    let length = context.as_ref().and_then(|ctx| ctx.length);
    let function = context.as_ref().and_then(|ctx| ctx.function.clone());
    let token = context.as_ref().and_then(|ctx| ctx.token.clone());

    let view_value = view
        .as_ref()
        .map(|view| Value::Object(view.object()))
        .unwrap_or(Value::Null);
    env.set("current_view", view_value.clone());
    env.set("bv", view_value);

    env.set("current_function", Value::Null);
    env.set("current_llil", Value::Null);
    env.set("current_mlil", Value::Null);
    env.set("current_hlil", Value::Null);
    env.set("current_token", Value::Null);
    env.set("current_basic_block", Value::Null);

    if let Some(function) = &function {
        env.set("current_function", Value::Object(function.object()));
        env.set("current_llil", Value::Object(function.low_ir()));
        env.set("current_mlil", Value::Object(function.mid_ir()));
        env.set("current_hlil", Value::Object(function.high_ir()));
        if let Some(token) = &token {
            env.set("current_token", Value::Text(token.clone()));
        }
        let block = address
            .and_then(|addr| function.basic_block_at(addr))
            .map(Value::Object)
            .unwrap_or(Value::Null);
        env.set("current_basic_block", block);
    }

    let address_value = address.map(Value::Address).unwrap_or(Value::Null);
    env.set("current_address", address_value.clone());
    env.set("here", address_value);

    // A selection ending past u64::MAX cannot form a half-open pair.
    let selection = match (address, length) {
        (Some(addr), Some(len)) => addr
            .checked_add(len)
            .map(|end| Value::Range(addr, end))
            .unwrap_or(Value::Null),
        _ => Value::Null,
    };
    env.set("current_selection", selection);

    ContextSnapshot { context, env }
}
