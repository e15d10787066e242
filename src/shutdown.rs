// Copyright 2015-2018 Deyan Ginev. See the LICENSE
// file at the top-level directory of this distribution.
//
// Licensed under the MIT license <LICENSE-MIT or http://opensource.org/licenses/MIT>.
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Process-level shutdown flag, polled by the long-running loops

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

use crate::error::Result;

/// How often (in milliseconds) blocking loops wake up to check the shutdown flag
pub const POLL_INTERVAL_MS: i64 = 100;

/// Shared flag asking streamers and worker pools to release their sockets and return
#[derive(Clone, Debug, Default)]
pub struct ShutdownSignal {
  flag: Arc<AtomicBool>,
}

impl ShutdownSignal {
  /// A signal that has not fired
  pub fn new() -> ShutdownSignal { ShutdownSignal::default() }

  /// A signal that fires on Ctrl-C. Can only be installed once per process.
  pub fn on_interrupt() -> Result<ShutdownSignal> {
    let signal = ShutdownSignal::new();
    let handler_signal = signal.clone();
    ctrlc::set_handler(move || {
      info!("interrupt received, shutting down");
      handler_signal.shutdown();
    })?;
    Ok(signal)
  }

  /// Fire the signal
  pub fn shutdown(&self) { self.flag.store(true, Ordering::SeqCst); }

  /// Has the signal fired?
  pub fn is_shutdown(&self) -> bool { self.flag.load(Ordering::SeqCst) }
}
