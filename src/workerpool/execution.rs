// Copyright 2015-2018 Deyan Ginev. See the LICENSE
// file at the top-level directory of this distribution.
//
// Licensed under the MIT license <LICENSE-MIT or http://opensource.org/licenses/MIT>.
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

use crate::error::{Error, Result};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// A fixed set of OS threads executing dispatched jobs, one at a time per thread.
/// Jobs beyond the number of threads wait in an unbounded queue.
pub struct ExecutionPool {
  sender: Option<Sender<Job>>,
  slots: Vec<JoinHandle<()>>,
  terminated: Arc<AtomicBool>,
  running: Arc<AtomicUsize>,
}

impl ExecutionPool {
  /// Spawns `size` execution slots, named after `title`
  pub fn new(size: usize, title: &str) -> Result<ExecutionPool> {
    let size = size.max(1);
    let (sender, receiver) = mpsc::channel::<Job>();
    let receiver = Arc::new(Mutex::new(receiver));
    let terminated = Arc::new(AtomicBool::new(false));
    let running = Arc::new(AtomicUsize::new(0));
    let mut slots = Vec::with_capacity(size);
    for slot in 0..size {
      let receiver = receiver.clone();
      let terminated = terminated.clone();
      let running = running.clone();
      let handle = thread::Builder::new()
        .name(format!("{} #{}", title, slot))
        .spawn(move || run_slot(&receiver, &terminated, &running))?;
      slots.push(handle);
    }
    Ok(ExecutionPool {
      sender: Some(sender),
      slots,
      terminated,
      running,
    })
  }

  /// Number of execution slots
  pub fn size(&self) -> usize { self.slots.len() }

  /// Number of jobs currently executing
  pub fn running(&self) -> usize { self.running.load(Ordering::SeqCst) }

  /// Queues `job` for the next free slot
  pub fn execute<F>(&self, job: F) -> Result<()>
  where F: FnOnce() + Send + 'static {
    match self.sender {
      Some(ref sender) => sender.send(Box::new(job)).map_err(|_| Error::PoolClosed),
      None => Err(Error::PoolClosed),
    }
  }

  /// Stops accepting work and waits for every queued job to finish
  pub fn close(mut self) {
    self.sender = None;
    for slot in self.slots.drain(..) {
      if slot.join().is_err() {
        warn!("execution slot died unexpectedly");
      }
    }
  }

  /// Stops accepting work and discards queued jobs without waiting.
  /// Jobs already running are abandoned: their threads finish them on their own.
  pub fn terminate(mut self) {
    self.shut_down();
  }

  fn shut_down(&mut self) {
    self.terminated.store(true, Ordering::SeqCst);
    self.sender = None;
    let abandoned = self.running();
    if abandoned > 0 {
      debug!(abandoned, "terminating execution pool with jobs still running");
    }
    self.slots.clear();
  }
}

impl Drop for ExecutionPool {
  fn drop(&mut self) {
    if self.sender.is_some() {
      self.shut_down();
    }
  }
}

fn run_slot(receiver: &Mutex<Receiver<Job>>, terminated: &AtomicBool, running: &AtomicUsize) {
  loop {
    let job = match receiver.lock() {
      Ok(receiver) => receiver.recv(),
      Err(_) => break,
    };
    match job {
      Ok(job) => {
        if terminated.load(Ordering::SeqCst) {
          // discard whatever was queued before termination
          continue;
        }
        running.fetch_add(1, Ordering::SeqCst);
        if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
          warn!("job panicked inside its execution slot");
        }
        running.fetch_sub(1, Ordering::SeqCst);
      },
      Err(_) => break,
    }
  }
}
