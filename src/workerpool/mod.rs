// Copyright 2015-2018 Deyan Ginev. See the LICENSE
// file at the top-level directory of this distribution.
//
// Licensed under the MIT license <LICENSE-MIT or http://opensource.org/licenses/MIT>.
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Worker pool: pulls tasks from a source endpoint and executes them on a bounded set of
//! local execution slots, each slot delivering its own result to the task's return address

/// Bounded thread pool backing the execution slots
pub mod execution;

use std::fmt;
use std::sync::{Arc, Mutex};
use std::thread;
use tracing::{debug, error, info, warn};

use crate::context::{recv_bytes, Context, SocketRole};
use crate::error::{Error, Result};
use crate::message::{self, Command};
use crate::registry::Registry;
use crate::responder::Responder;
use crate::shutdown::{ShutdownSignal, POLL_INTERVAL_MS};
use execution::ExecutionPool;

/// Lifecycle of a worker pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolState {
  /// connecting and spawning execution slots
  Init,
  /// receiving and dispatching tasks
  Running,
  /// a stop was requested; no further tasks are accepted
  Draining,
  /// sockets and execution slots released
  Terminated,
}

impl fmt::Display for PoolState {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    let name = match self {
      PoolState::Init => "init",
      PoolState::Running => "running",
      PoolState::Draining => "draining",
      PoolState::Terminated => "terminated",
    };
    f.write_str(name)
  }
}

/// The number of execution slots used when none is configured
pub fn default_num_workers() -> usize { thread::available_parallelism().map_or(1, |n| n.get()) }

/// Specifies the source endpoint and execution parameters for a worker pool.
///
/// Clones share the observable `state`, so a clone kept aside can watch a pool
/// running on another thread.
#[derive(Debug, Clone)]
pub struct WorkerPool {
  /// endpoint to pull tasks from
  pub url: String,
  /// number of execution slots
  pub num_workers: usize,
  /// when set, messages carry only arguments and are all run with this function
  pub func: Option<String>,
  registry: Arc<Registry>,
  state: Arc<Mutex<PoolState>>,
}

impl WorkerPool {
  /// A pool pulling from `url`, with one execution slot per available CPU
  pub fn new<S: Into<String>>(url: S, registry: Registry) -> WorkerPool {
    WorkerPool {
      url: url.into(),
      num_workers: default_num_workers(),
      func: None,
      registry: Arc::new(registry),
      state: Arc::new(Mutex::new(PoolState::Init)),
    }
  }

  /// Sets the number of execution slots
  pub fn with_num_workers(mut self, num_workers: usize) -> WorkerPool {
    self.num_workers = num_workers.max(1);
    self
  }

  /// Runs every incoming message with the registered function `func`
  pub fn with_func<S: Into<String>>(mut self, func: S) -> WorkerPool {
    self.func = Some(func.into());
    self
  }

  /// The pool's current lifecycle state
  pub fn state(&self) -> PoolState {
    match self.state.lock() {
      Ok(state) => *state,
      Err(poisoned) => *poisoned.into_inner(),
    }
  }

  fn set_state(&self, next: PoolState) {
    let mut state = match self.state.lock() {
      Ok(state) => state,
      Err(poisoned) => poisoned.into_inner(),
    };
    let previous = *state;
    debug!(url = %self.url, from = %previous, to = %next, "worker pool state change");
    *state = next;
  }

  /// Connects to the source endpoint and executes tasks until a `stop`
  /// command arrives or `shutdown` fires. Returns the number of tasks dispatched.
  ///
  /// On stop, queued tasks are discarded and running ones abandoned, so that
  /// the pool terminates promptly.
  pub fn start(&self, context: &Context, shutdown: &ShutdownSignal) -> Result<usize> {
    self.set_state(PoolState::Init);
    let title = format!("ztask-worker {}", self.url);
    let outcome = match context.connect(&self.url, SocketRole::Pull, None) {
      Err(e) => Err(e),
      Ok(receiver) => match ExecutionPool::new(self.num_workers, &title) {
        Err(e) => Err(e),
        Ok(pool) => {
          info!(%title, workers = pool.size(), "worker pool started");
          self.set_state(PoolState::Running);
          let outcome = self.run(context, &receiver, &pool, shutdown);
          self.set_state(PoolState::Draining);
          pool.terminate();
          drop(receiver);
          outcome
        },
      },
    };
    self.set_state(PoolState::Terminated);
    if let Err(ref e) = outcome {
      error!(url = %self.url, error = %e, "worker pool terminated abnormally");
    }
    outcome
  }

  fn run(
    &self,
    context: &Context,
    receiver: &zmq::Socket,
    pool: &ExecutionPool,
    shutdown: &ShutdownSignal,
  ) -> Result<usize>
  {
    let mut dispatched: usize = 0;
    loop {
      if shutdown.is_shutdown() {
        info!("shutdown requested, stopping worker pool");
        return Ok(dispatched);
      }
      let mut items = [receiver.as_poll_item(zmq::POLLIN)];
      match zmq::poll(&mut items, POLL_INTERVAL_MS) {
        Ok(_) => {},
        Err(zmq::Error::EINTR) => continue,
        Err(e) => return Err(e.into()),
      }
      if !items[0].get_revents().contains(zmq::POLLIN) {
        continue;
      }
      let bytes = recv_bytes(receiver)?;
      let (func, args) = match message::decode_command(&bytes, self.func.as_deref())? {
        Command::Stop => {
          info!("Received stop command");
          return Ok(dispatched);
        },
        Command::Call { func, args } => (func, args),
      };
      let backurl = match args.backurl() {
        Some(backurl) => backurl.to_string(),
        None => {
          let e = Error::MissingBackurl {
            task_no: args.monitor.task_no,
            operation: args.monitor.operation.clone(),
          };
          warn!(error = %e, "discarding task");
          continue;
        },
      };
      // the executed job delivers its own result; no completion callback on the pool
      let responder = Responder::new(backurl, SocketRole::Push);
      let registry = self.registry.clone();
      let context = context.clone();
      debug!(%func, task_no = args.monitor.task_no, %responder, "dispatching task");
      pool.execute(move || {
        if let Err(e) = responder.deliver(&context, || registry.safely_call(&func, &args)) {
          error!(error = %e, "could not deliver task result");
        }
      })?;
      dispatched += 1;
    }
  }
}

/// Pushes the `stop` command to `url`; whichever worker pool pulls it terminates
pub fn send_stop(context: &Context, url: &str) -> Result<()> {
  let sender = context.connect(url, SocketRole::Push, None)?;
  sender.send(message::encode_stop()?, 0)?;
  info!(%url, "sent stop command");
  Ok(())
}
