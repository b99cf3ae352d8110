use std::{cell::RefCell, ffi::OsStr};

use crate::runtime::DEFAULT_PROMPT;

#[derive(Clone, Debug)]
struct Env {
    trace_enabled: bool,
    prompt: String,
}

thread_local! {
    /// Must only be mutated within `set_env`
    static ENV: RefCell<Option<Env>> = const { RefCell::new(None) };
}

/// Read configuration from the process environment.
///
/// - `LC3VM_TRACE=1` turns the instruction trace on.
/// - `LC3VM_PROMPT` replaces the prompt printed by the `IN` trap.
pub fn init() {
    let value = Env {
        trace_enabled: var_is("LC3VM_TRACE", "1"),
        prompt: std::env::var("LC3VM_PROMPT").unwrap_or_else(|_| DEFAULT_PROMPT.to_string()),
    };
    set_env(value);
}

pub fn is_trace_enabled() -> bool {
    with_env(|env| env.trace_enabled)
}

pub fn prompt() -> String {
    with_env(|env| env.prompt.clone())
}

fn set_env(value: Env) {
    ENV.with(|env| {
        let mut env = env.borrow_mut();
        assert!(
            env.is_none(),
            "tried to initialize environment state multiple times"
        );
        *env = Some(value);
    });
}

fn with_env<F, R>(callback: F) -> R
where
    F: Fn(&Env) -> R,
{
    ENV.with(|env| {
        let env = env.borrow();
        let env = env.as_ref().unwrap_or_else(|| {
            panic!("tried to access environment state before initialization");
        });
        callback(env)
    })
}

fn var_is(name: impl AsRef<OsStr>, value: impl AsRef<str>) -> bool {
    std::env::var(name.as_ref()).is_ok_and(|v| v == value.as_ref())
}
