// Copyright 2015-2018 Deyan Ginev. See the LICENSE
// file at the top-level directory of this distribution.
//
// Licensed under the MIT license <LICENSE-MIT or http://opensource.org/licenses/MIT>.
// This file may not be copied, modified, or distributed
// except according to those terms.
use clap::Parser;
use std::error::Error;
use ztask::config::Config;
use ztask::shutdown::ShutdownSignal;
use ztask::{logging, Context, Registry, WorkerPool};

/// A worker pool executing the built-in task functions, pulling from a streamer backend
#[derive(Parser, Debug)]
#[command(name = "workerpool", version)]
struct Opts {
  /// endpoint to pull tasks from (defaults to ZTASK_TASK_URL)
  url: Option<String>,
  /// number of execution slots (defaults to ZTASK_NUM_WORKERS, then the CPU count)
  num_workers: Option<usize>,
  /// run every incoming argument list with this function
  #[arg(long)]
  func: Option<String>,
  /// push a stop command to the url instead of starting a pool
  #[arg(long)]
  stop: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
  logging::init();
  let opts = Opts::parse();
  let config = Config::from_env()?;
  let url = opts.url.unwrap_or(config.task_url);
  let context = Context::new();

  if opts.stop {
    ztask::send_stop(&context, &url)?;
    return Ok(());
  }

  let registry = Registry::with_builtins();
  if let Some(ref func) = opts.func {
    if !registry.contains(func) {
      let known = registry.names();
      return Err(format!("unknown function {:?}, expected one of {:?}", func, known).into());
    }
  }
  let mut pool = WorkerPool::new(url, registry)
    .with_num_workers(opts.num_workers.unwrap_or(config.num_workers));
  if let Some(func) = opts.func {
    pool = pool.with_func(func);
  }
  let shutdown = ShutdownSignal::on_interrupt()?;
  pool.start(&context, &shutdown)?;
  Ok(())
}
