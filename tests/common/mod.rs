// Copyright 2015-2018 Deyan Ginev. See the LICENSE
// file at the top-level directory of this distribution.
//
// Licensed under the MIT license <LICENSE-MIT or http://opensource.org/licenses/MIT>.
// This file may not be copied, modified, or distributed
// except according to those terms.
#![allow(dead_code)]

use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use ztask::scoped::ScopedThread;
use ztask::shutdown::ShutdownSignal;
use ztask::{Args, Monitor, Registry, Result, Streamer, WorkerPool};

/// A streamer and a worker pool, each on its own scoped thread
pub struct Cluster {
  pub frontend: String,
  pub backend: String,
  pub pool: WorkerPool,
  pub shutdown: ShutdownSignal,
  pool_thread: Option<ScopedThread<usize>>,
  streamer_thread: Option<ScopedThread<usize>>,
}

impl Cluster {
  /// Starts a streamer on `port` (frontend) and `port + 1` (backend), plus a pool pulling from it
  pub fn start(port: u16, pool: WorkerPool) -> Cluster {
    let frontend = format!("tcp://127.0.0.1:{}", port);
    let backend = format!("tcp://127.0.0.1:{}", port + 1);
    let shutdown = ShutdownSignal::new();
    let streamer_thread = Cluster::spawn_streamer(&frontend, &backend, &shutdown);
    let mut cluster = Cluster {
      frontend,
      backend,
      pool,
      shutdown,
      pool_thread: None,
      streamer_thread: Some(streamer_thread),
    };
    cluster.pool_thread = Some(cluster.spawn_pool());
    cluster
  }

  /// Starts only the streamer; no pool pulls its backend
  pub fn streamer_only(port: u16) -> Cluster {
    let frontend = format!("tcp://127.0.0.1:{}", port);
    let backend = format!("tcp://127.0.0.1:{}", port + 1);
    let shutdown = ShutdownSignal::new();
    let streamer_thread = Cluster::spawn_streamer(&frontend, &backend, &shutdown);
    Cluster {
      pool: WorkerPool::new(backend.clone(), Registry::new()),
      frontend,
      backend,
      shutdown,
      pool_thread: None,
      streamer_thread: Some(streamer_thread),
    }
  }

  fn spawn_streamer(frontend: &str, backend: &str, shutdown: &ShutdownSignal) -> ScopedThread<usize> {
    let streamer = Streamer::new(frontend, backend);
    let shutdown = shutdown.clone();
    ScopedThread::spawn("streamer", move |context| streamer.start(&context, &shutdown)).unwrap()
  }

  fn spawn_pool(&self) -> ScopedThread<usize> {
    let pool = self.pool.clone();
    let shutdown = self.shutdown.clone();
    ScopedThread::spawn("workerpool", move |context| pool.start(&context, &shutdown)).unwrap()
  }

  /// Waits for the pool thread to return on its own (after a stop command)
  pub fn join_pool(&mut self) -> Result<usize> {
    self
      .pool_thread
      .take()
      .expect("pool thread was started")
      .join()
  }
}

impl Drop for Cluster {
  fn drop(&mut self) {
    self.shutdown.shutdown();
    self.pool_thread.take();
    self.streamer_thread.take();
  }
}

/// Built-ins plus functions that fail in each possible way
pub fn test_registry() -> Registry {
  let mut registry = Registry::with_builtins();
  registry
    .register("fail", |_, _| Err("no luck".into()))
    .register("explode", |params, _| panic!("exploded on {:?}", params));
  registry
}

/// A registry whose `count` function records how often it ran
pub fn counting_registry() -> (Registry, Arc<AtomicUsize>) {
  let counter = Arc::new(AtomicUsize::new(0));
  let task_counter = counter.clone();
  let mut registry = Registry::with_builtins();
  registry.register("count", move |_, _| {
    Ok(Value::from(task_counter.fetch_add(1, Ordering::SeqCst) + 1))
  });
  (registry, counter)
}

/// One single-parameter task per value
pub fn tasks(operation: &str, values: &[Value]) -> Vec<Args> {
  values
    .iter()
    .map(|value| Args::new(vec![value.clone()], Monitor::new(operation)))
    .collect()
}
