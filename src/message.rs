// Copyright 2015-2018 Deyan Ginev. See the LICENSE
// file at the top-level directory of this distribution.
//
// Licensed under the MIT license <LICENSE-MIT or http://opensource.org/licenses/MIT>.
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Wire messages: task arguments with their trailing monitor, commands and result envelopes
//!
//! Everything travels as JSON. A task message is `[command, args]`, or just
//! `args` for pools configured with a fixed function, where `args` is an array
//! whose last element is the `Monitor`.

use serde::de::{Deserializer, Error as _};
use serde::ser::{SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::{Error, Result};

/// The command that asks a worker pool to terminate
pub const STOP: &str = "stop";

/// Bookkeeping carried as the last argument of every task
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Monitor {
  /// human-readable name of the operation, used in logs and result envelopes
  #[serde(default)]
  pub operation: String,
  /// position of the task in its submission batch
  #[serde(default)]
  pub task_no: usize,
  /// return address for the task's result, stamped at submission
  #[serde(default)]
  pub backurl: Option<String>,
}

impl Monitor {
  /// A monitor for `operation`, not yet stamped with a return address
  pub fn new<S: Into<String>>(operation: S) -> Monitor {
    Monitor {
      operation: operation.into(),
      ..Monitor::default()
    }
  }
}

/// The argument list of a task: positional parameters followed by the monitor
#[derive(Debug, Clone, PartialEq)]
pub struct Args {
  /// positional parameters handed to the task function
  pub params: Vec<Value>,
  /// trailing bookkeeping argument
  pub monitor: Monitor,
}

impl Args {
  /// Builds an argument list from its parameters and monitor
  pub fn new(params: Vec<Value>, monitor: Monitor) -> Args { Args { params, monitor } }

  /// The return address stamped on the monitor, if any
  pub fn backurl(&self) -> Option<&str> { self.monitor.backurl.as_deref() }
}

impl Serialize for Args {
  fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    let mut seq = serializer.serialize_seq(Some(self.params.len() + 1))?;
    for param in &self.params {
      seq.serialize_element(param)?;
    }
    seq.serialize_element(&self.monitor)?;
    seq.end()
  }
}

impl<'de> Deserialize<'de> for Args {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Args, D::Error> {
    let mut params = Vec::<Value>::deserialize(deserializer)?;
    let last = params
      .pop()
      .ok_or_else(|| D::Error::custom("argument list has no trailing monitor"))?;
    let monitor = Monitor::deserialize(last).map_err(D::Error::custom)?;
    Ok(Args { params, monitor })
  }
}

/// A decoded task message
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
  /// terminate the receiving worker pool
  Stop,
  /// run `func` over `args`
  Call {
    /// registered name of the task function
    func: String,
    /// its arguments, monitor last
    args: Args,
  },
}

fn malformed(reason: &str) -> Error { Error::Decode(serde_json::Error::custom(reason)) }

/// Encodes a `[func, args]` task message
pub fn encode_call(func: &str, args: &Args) -> Result<Vec<u8>> {
  serde_json::to_vec(&(func, args)).map_err(Error::Encode)
}

/// Encodes a bare `args` message, for fixed-function pools
pub fn encode_args(args: &Args) -> Result<Vec<u8>> {
  serde_json::to_vec(args).map_err(Error::Encode)
}

/// Encodes the stop sentinel; understood by both pool flavours
pub fn encode_stop() -> Result<Vec<u8>> { serde_json::to_vec(STOP).map_err(Error::Encode) }

/// Decodes a task message. With `fixed` set, the message carries only the
/// arguments and is paired with that function name.
pub fn decode_command(bytes: &[u8], fixed: Option<&str>) -> Result<Command> {
  let value: Value = serde_json::from_slice(bytes).map_err(Error::Decode)?;
  if value.as_str() == Some(STOP) {
    return Ok(Command::Stop);
  }
  if let Some(func) = fixed {
    let args = Args::deserialize(value).map_err(Error::Decode)?;
    return Ok(Command::Call {
      func: func.to_string(),
      args,
    });
  }
  let mut pair = match value {
    Value::Array(pair) if pair.len() == 2 => pair,
    _ => return Err(malformed("expected a [command, args] pair")),
  };
  let args = pair.pop().unwrap_or(Value::Null);
  let func = match pair.pop() {
    Some(Value::String(func)) => func,
    _ => return Err(malformed("command must be a string")),
  };
  if func == STOP {
    return Ok(Command::Stop);
  }
  let args = Args::deserialize(args).map_err(Error::Decode)?;
  Ok(Command::Call { func, args })
}

/// Why a task did not produce a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
  /// the task function returned an error
  Error,
  /// the task function panicked
  Panic,
  /// no function of that name is registered with the pool
  UnknownFunction,
}

impl fmt::Display for FailureKind {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    let name = match self {
      FailureKind::Error => "error",
      FailureKind::Panic => "panic",
      FailureKind::UnknownFunction => "unknown function",
    };
    f.write_str(name)
  }
}

/// A captured task failure, delivered as data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct Failure {
  /// category of the failure
  pub kind: FailureKind,
  /// description of the failure
  pub message: String,
}

/// Success value or captured failure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
  /// the value returned by the task function
  Success(Value),
  /// the failure the task function ran into
  Failure(Failure),
}

/// The outcome of one task, as delivered to its return address
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultEnvelope {
  /// sequence number of the task in its submission batch
  pub task_no: usize,
  /// name of the operation, copied from the monitor
  pub operation: String,
  /// success value or failure
  pub outcome: Outcome,
  /// wall-clock execution time
  pub duration_ms: u64,
}

impl ResultEnvelope {
  /// Did the task succeed?
  pub fn is_success(&self) -> bool { matches!(self.outcome, Outcome::Success(_)) }

  /// The success value, if any
  pub fn value(&self) -> Option<&Value> {
    match self.outcome {
      Outcome::Success(ref value) => Some(value),
      Outcome::Failure(_) => None,
    }
  }

  /// Converts the envelope into the task's own result
  pub fn into_result(self) -> std::result::Result<Value, Failure> {
    match self.outcome {
      Outcome::Success(value) => Ok(value),
      Outcome::Failure(failure) => Err(failure),
    }
  }

  /// Serializes the envelope for the wire
  pub fn encode(&self) -> Result<Vec<u8>> { serde_json::to_vec(self).map_err(Error::Encode) }

  /// Deserializes an envelope received from the wire
  pub fn decode(bytes: &[u8]) -> Result<ResultEnvelope> {
    serde_json::from_slice(bytes).map_err(Error::Decode)
  }
}
