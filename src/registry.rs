// Copyright 2015-2018 Deyan Ginev. See the LICENSE
// file at the top-level directory of this distribution.
//
// Licensed under the MIT license <LICENSE-MIT or http://opensource.org/licenses/MIT>.
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Named task functions, and their panic-safe invocation

use serde_json::Value;
use std::any::Any;
use std::collections::HashMap;
use std::error::Error as StdError;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::message::{Args, Failure, FailureKind, Monitor, Outcome, ResultEnvelope};

/// What a task function returns
pub type TaskResult = Result<Value, Box<dyn StdError + Send + Sync>>;

/// A task function: positional parameters plus the task's monitor
pub type TaskFn = Arc<dyn Fn(&[Value], &Monitor) -> TaskResult + Send + Sync>;

/// Task functions a worker pool can execute, looked up by name
#[derive(Clone, Default)]
pub struct Registry {
  functions: HashMap<String, TaskFn>,
}

impl fmt::Debug for Registry {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    f.debug_struct("Registry")
      .field("functions", &self.names())
      .finish()
  }
}

impl Registry {
  /// An empty registry
  pub fn new() -> Registry { Registry::default() }

  /// A registry preloaded with `identity`, `sum` and `sleep`
  pub fn with_builtins() -> Registry {
    let mut registry = Registry::new();
    registry
      .register("identity", identity)
      .register("sum", sum)
      .register("sleep", sleep);
    registry
  }

  /// Registers `function` under `name`, replacing any previous entry
  pub fn register<S, F>(&mut self, name: S, function: F) -> &mut Registry
  where
    S: Into<String>,
    F: Fn(&[Value], &Monitor) -> TaskResult + Send + Sync + 'static,
  {
    self.functions.insert(name.into(), Arc::new(function));
    self
  }

  /// The function registered under `name`
  pub fn get(&self, name: &str) -> Option<TaskFn> { self.functions.get(name).cloned() }

  /// Is a function registered under `name`?
  pub fn contains(&self, name: &str) -> bool { self.functions.contains_key(name) }

  /// Sorted names of all registered functions
  pub fn names(&self) -> Vec<String> {
    let mut names: Vec<String> = self.functions.keys().cloned().collect();
    names.sort();
    names
  }

  /// Runs `func` over `args`, converting errors and panics into a failure
  /// envelope. Never unwinds into the caller.
  pub fn safely_call(&self, func: &str, args: &Args) -> ResultEnvelope {
    let start = Instant::now();
    let outcome = match self.get(func) {
      None => Outcome::Failure(Failure {
        kind: FailureKind::UnknownFunction,
        message: format!("no task function registered as {:?}", func),
      }),
      Some(function) => {
        match panic::catch_unwind(AssertUnwindSafe(|| function(&args.params, &args.monitor))) {
          Ok(Ok(value)) => Outcome::Success(value),
          Ok(Err(e)) => Outcome::Failure(Failure {
            kind: FailureKind::Error,
            message: e.to_string(),
          }),
          Err(payload) => Outcome::Failure(Failure {
            kind: FailureKind::Panic,
            message: panic_message(payload.as_ref()),
          }),
        }
      },
    };
    let operation = if args.monitor.operation.is_empty() {
      func.to_string()
    } else {
      args.monitor.operation.clone()
    };
    ResultEnvelope {
      task_no: args.monitor.task_no,
      operation,
      outcome,
      duration_ms: start.elapsed().as_millis() as u64,
    }
  }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
  if let Some(message) = payload.downcast_ref::<&str>() {
    (*message).to_string()
  } else if let Some(message) = payload.downcast_ref::<String>() {
    message.clone()
  } else {
    "task panicked with a non-string payload".to_string()
  }
}

/// `identity(x) = x`; several parameters come back as an array
fn identity(params: &[Value], _monitor: &Monitor) -> TaskResult {
  match params {
    [single] => Ok(single.clone()),
    _ => Ok(Value::Array(params.to_vec())),
  }
}

/// Sums numeric parameters
fn sum(params: &[Value], _monitor: &Monitor) -> TaskResult {
  if params.iter().all(|param| param.is_i64()) {
    let total: i64 = params.iter().filter_map(Value::as_i64).sum();
    return Ok(Value::from(total));
  }
  let mut total = 0.0;
  for param in params {
    total += param
      .as_f64()
      .ok_or_else(|| format!("sum: {} is not a number", param))?;
  }
  Ok(Value::from(total))
}

/// Sleeps for the given number of milliseconds, then returns it
fn sleep(params: &[Value], _monitor: &Monitor) -> TaskResult {
  let millis = params
    .first()
    .and_then(Value::as_u64)
    .ok_or("sleep: expected a millisecond count")?;
  thread::sleep(Duration::from_millis(millis));
  Ok(Value::from(millis))
}
