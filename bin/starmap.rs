// Copyright 2015-2018 Deyan Ginev. See the LICENSE
// file at the top-level directory of this distribution.
//
// Licensed under the MIT license <LICENSE-MIT or http://opensource.org/licenses/MIT>.
// This file may not be copied, modified, or distributed
// except according to those terms.
use clap::Parser;
use serde_json::Value;
use std::error::Error;
use ztask::config::Config;
use ztask::scoped::ScopedThread;
use ztask::shutdown::ShutdownSignal;
use ztask::{logging, Args, Context, Monitor, Outcome, Registry, Streamer, Submitter, WorkerPool};

/// Maps a built-in function over JSON values, one task per value
#[derive(Parser, Debug)]
#[command(name = "starmap", version)]
struct Opts {
  /// registered function to call (identity, sum, sleep)
  #[arg(long, default_value = "identity")]
  func: String,
  /// run a streamer and a worker pool in-process instead of using remote ones
  #[arg(long)]
  local: bool,
  /// one JSON value per task; arrays are spread into positional parameters
  values: Vec<String>,
}

fn task_args(raw: &str, func: &str) -> Result<Args, serde_json::Error> {
  let params = match serde_json::from_str::<Value>(raw)? {
    Value::Array(params) => params,
    single => vec![single],
  };
  Ok(Args::new(params, Monitor::new(func)))
}

fn submit(config: &Config, func: &str, allargs: Vec<Args>) -> Result<(), Box<dyn Error>> {
  let context = Context::new();
  let mut submitter = Submitter::new(&context, &config.frontend_url, &config.receiver_url);
  if let Some(timeout) = config.result_timeout {
    submitter = submitter.with_timeout(timeout);
  }
  let results = submitter.submit(func, allargs)?;
  println!("submitted {} tasks", results.submitted());
  for envelope in results {
    let envelope = envelope?;
    match envelope.outcome {
      Outcome::Success(value) => println!("task {}: {}", envelope.task_no, value),
      Outcome::Failure(failure) => println!("task {} failed: {}", envelope.task_no, failure),
    }
  }
  Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
  logging::init();
  let opts = Opts::parse();
  let config = Config::from_env()?;
  let allargs = opts
    .values
    .iter()
    .map(|raw| task_args(raw, &opts.func))
    .collect::<Result<Vec<Args>, _>>()?;

  let shutdown = ShutdownSignal::new();
  let mut local = Vec::new();
  if opts.local {
    let streamer = Streamer::new(config.frontend_url.clone(), config.task_url.clone());
    let streamer_shutdown = shutdown.clone();
    local.push(ScopedThread::spawn("streamer", move |context| {
      streamer.start(&context, &streamer_shutdown).map(|_| ())
    })?);
    let pool = WorkerPool::new(config.task_url.clone(), Registry::with_builtins())
      .with_num_workers(config.num_workers);
    let pool_shutdown = shutdown.clone();
    local.push(ScopedThread::spawn("workerpool", move |context| {
      pool.start(&context, &pool_shutdown).map(|_| ())
    })?);
  }

  let outcome = submit(&config, &opts.func, allargs);
  shutdown.shutdown();
  for thread in local {
    thread.join()?;
  }
  outcome
}
