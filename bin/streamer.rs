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
use ztask::{logging, Context, Streamer};

/// Relays tasks from submitters (frontend) to worker pools (backend)
#[derive(Parser, Debug)]
#[command(name = "streamer", version)]
struct Opts {
  /// endpoint to bind for submitters (defaults to ZTASK_FRONTEND_URL)
  frontend: Option<String>,
  /// endpoint to bind for worker pools (defaults to ZTASK_TASK_URL)
  backend: Option<String>,
}

fn main() -> Result<(), Box<dyn Error>> {
  logging::init();
  let opts = Opts::parse();
  let config = Config::from_env()?;
  let streamer = Streamer::new(
    opts.frontend.unwrap_or(config.frontend_url),
    opts.backend.unwrap_or(config.task_url),
  );
  let shutdown = ShutdownSignal::on_interrupt()?;
  streamer.start(&Context::new(), &shutdown)?;
  Ok(())
}
