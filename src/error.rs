// Copyright 2015-2018 Deyan Ginev. See the LICENSE
// file at the top-level directory of this distribution.
//
// Licensed under the MIT license <LICENSE-MIT or http://opensource.org/licenses/MIT>.
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Error kinds shared by all ztask components

use std::time::Duration;
use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while binding, dispatching or collecting tasks.
///
/// Task bodies never produce one of these: their failures travel as data,
/// inside a [`crate::message::Outcome::Failure`].
#[derive(Debug, Error)]
pub enum Error {
  /// An ephemeral endpoint without a usable `:min-max` port range suffix
  #[error("malformed endpoint {endpoint:?}: {reason}")]
  MalformedEndpoint {
    /// the endpoint as given by the caller
    endpoint: String,
    /// what is wrong with it
    reason: String,
  },

  /// The transport refused to bind a socket
  #[error("{source}: {endpoint}")]
  Bind {
    /// endpoint we attempted to bind
    endpoint: String,
    /// underlying zmq failure
    #[source]
    source: zmq::Error,
  },

  /// The transport refused to connect a socket
  #[error("{source}: {endpoint}")]
  Connect {
    /// endpoint we attempted to connect to
    endpoint: String,
    /// underlying zmq failure
    #[source]
    source: zmq::Error,
  },

  /// Any other socket-level failure (send, recv, poll, options)
  #[error("socket error: {0}")]
  Socket(#[from] zmq::Error),

  /// A message could not be serialized
  #[error("could not encode message: {0}")]
  Encode(#[source] serde_json::Error),

  /// A message arrived that could not be decoded; framing is compromised
  #[error("undecodable message: {0}")]
  Decode(#[source] serde_json::Error),

  /// A result envelope could not be handed to its return address
  #[error("result delivery to {backurl} failed: {source}")]
  SinkDelivery {
    /// the return address of the task
    backurl: String,
    /// underlying zmq failure
    #[source]
    source: zmq::Error,
  },

  /// A task arrived whose monitor carries no return address
  #[error("task {task_no} ({operation}) carries no return address")]
  MissingBackurl {
    /// sequence number assigned at submission
    task_no: usize,
    /// name of the operation
    operation: String,
  },

  /// No result arrived within the deadline set on a `Starmap`
  #[error("timed out after {waited:?} waiting for result {received} of {expected}")]
  Timeout {
    /// the per-result deadline that expired
    waited: Duration,
    /// results received before the deadline expired
    received: usize,
    /// results expected in total
    expected: usize,
  },

  /// A configuration value could not be interpreted
  #[error("invalid configuration for {key}: {reason}")]
  Config {
    /// environment variable name
    key: String,
    /// parse failure description
    reason: String,
  },

  /// The dispatch side of an execution pool was already closed
  #[error("execution pool is no longer accepting work")]
  PoolClosed,

  /// A scoped thread panicked before returning
  #[error("thread {name:?} panicked")]
  Panicked {
    /// the thread's name
    name: String,
  },

  /// Installing the interrupt handler failed
  #[error("could not install signal handler: {0}")]
  Signal(#[from] ctrlc::Error),

  /// Spawning an OS thread failed
  #[error(transparent)]
  Io(#[from] std::io::Error),
}
