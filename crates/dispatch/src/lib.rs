//! Dispatch of ad-tech-authored code into a pool of sandboxed script
//! engines.
//!
//! The engine itself is an opaque capability ([`ScriptEngine`]); any V8- or
//! QuickJS-based embedder satisfies it. This crate owns the pooling,
//! versioned code snapshots, batching and per-request timeouts, plus the
//! wrapper codegen that gives every ad-tech function a uniform dispatch
//! surface.

mod pool;
pub mod wrapper;

pub use pool::{CodeDispatcher, DispatcherConfig, DispatcherPool};

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use thiserror::Error;

/// One invocation of a handler inside the sandbox.
#[derive(Debug, Clone)]
pub struct DispatchRequest {
    /// Caller-chosen id echoed back on the response (interest group name or
    /// render URL).
    pub id: String,
    /// Code snapshot version to execute against.
    pub version: u64,
    /// Entry function name; one of the wrapper-exported constants.
    pub handler_name: String,
    /// Positional string arguments, passed to the handler verbatim.
    pub input: Vec<String>,
}

/// Result of one sandbox invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchResponse {
    pub id: String,
    /// Raw string returned by the handler (JSON by wrapper contract).
    pub resp: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("dispatch timed out")]
    Timeout,
    #[error("no code loaded for version {0}")]
    VersionNotFound(u64),
    #[error("dispatch queue full")]
    QueueFull,
    #[error("engine failure: {0}")]
    Engine(String),
    #[error("dispatcher stopped")]
    Stopped,
}

/// An immutable, versioned blob of wrapped ad-tech code.
///
/// Batches capture their snapshot at submit time, so a concurrent
/// [`DispatcherPool::load_sync`] never changes what an in-flight batch
/// executes.
#[derive(Debug, Clone)]
pub struct CodeSnapshot {
    pub version: u64,
    pub blob: Arc<str>,
}

/// The sandboxed engine capability.
///
/// One engine instance runs on one pool worker thread and is never shared;
/// implementations therefore need no internal synchronisation. JS execution
/// is cooperative: once `invoke` starts it runs to completion unless the
/// engine honours the `interrupted` hint set on timeout.
pub trait ScriptEngine {
    fn invoke(
        &mut self,
        snapshot: &CodeSnapshot,
        handler_name: &str,
        input: &[String],
        interrupted: &AtomicBool,
    ) -> Result<String, String>;
}

/// Stand-in engine for builds without an embedded JS runtime.
///
/// Deployments link a real embedder through [`ScriptEngine`]; with this
/// engine every dispatch fails cleanly, which the reactors treat as a
/// per-request skip.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullEngine;

impl ScriptEngine for NullEngine {
    fn invoke(
        &mut self,
        _snapshot: &CodeSnapshot,
        handler_name: &str,
        _input: &[String],
        _interrupted: &AtomicBool,
    ) -> Result<String, String> {
        Err(format!("no script engine embedded; cannot run {handler_name}"))
    }
}
