// Copyright 2015-2018 Deyan Ginev. See the LICENSE
// file at the top-level directory of this distribution.
//
// Licensed under the MIT license <LICENSE-MIT or http://opensource.org/licenses/MIT>.
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Threads that own their own zmq context and are joined when their handle goes out of scope

use std::thread::{self, JoinHandle};
use tracing::error;

use crate::context::Context;
use crate::error::{Error, Result};

/// A named thread running a socket-using closure.
///
/// The closure receives a fresh `Context`, so no socket crosses the thread
/// boundary. Dropping the handle joins the thread.
pub struct ScopedThread<T> {
  name: String,
  handle: Option<JoinHandle<Result<T>>>,
}

impl<T: Send + 'static> ScopedThread<T> {
  /// Spawns `body` on a new thread called `name`
  pub fn spawn<F>(name: &str, body: F) -> Result<ScopedThread<T>>
  where F: FnOnce(Context) -> Result<T> + Send + 'static {
    let handle = thread::Builder::new()
      .name(name.to_string())
      .spawn(move || body(Context::new()))?;
    Ok(ScopedThread {
      name: name.to_string(),
      handle: Some(handle),
    })
  }

  /// Waits for the thread and returns what its body returned
  pub fn join(mut self) -> Result<T> {
    match self.handle.take() {
      None => Err(Error::Panicked {
        name: self.name.clone(),
      }),
      Some(handle) => handle.join().unwrap_or_else(|_| {
        Err(Error::Panicked {
          name: self.name.clone(),
        })
      }),
    }
  }
}

impl<T> Drop for ScopedThread<T> {
  fn drop(&mut self) {
    if let Some(handle) = self.handle.take() {
      match handle.join() {
        Ok(Ok(_)) => {},
        Ok(Err(e)) => error!(thread = %self.name, error = %e, "scoped thread failed"),
        Err(_) => error!(thread = %self.name, "scoped thread panicked"),
      }
    }
  }
}
