// Copyright 2015-2018 Deyan Ginev. See the LICENSE
// file at the top-level directory of this distribution.
//
// Licensed under the MIT license <LICENSE-MIT or http://opensource.org/licenses/MIT>.
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Streamer: a PULL/PUSH relay decoupling task submitters from worker pools

use tracing::{info, warn};

use crate::context::{recv_multipart, Context, SocketRole};
use crate::error::Result;
use crate::shutdown::{ShutdownSignal, POLL_INTERVAL_MS};

/// Specifies the binding parameters for a streamer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Streamer {
  /// endpoint submitters push their tasks to
  pub frontend: String,
  /// endpoint worker pools pull their tasks from
  pub backend: String,
}

impl Streamer {
  /// A streamer between two endpoints
  pub fn new<S: Into<String>, T: Into<String>>(frontend: S, backend: T) -> Streamer {
    Streamer {
      frontend: frontend.into(),
      backend: backend.into(),
    }
  }

  /// Binds both endpoints and forwards every message from the frontend to
  /// the backend, unmodified and in order, until `shutdown` fires.
  /// Returns the number of messages forwarded.
  pub fn start(&self, context: &Context, shutdown: &ShutdownSignal) -> Result<usize> {
    let frontend = context.bind(&self.frontend, SocketRole::Pull, None)?;
    let backend = context.bind(&self.backend, SocketRole::Push, None)?;
    info!(frontend = %self.frontend, backend = %self.backend, "streamer started");

    let mut forwarded: usize = 0;
    while !shutdown.is_shutdown() {
      if !wait_for(&frontend, zmq::POLLIN)? {
        continue;
      }
      let frames = recv_multipart(&frontend)?;
      // a PUSH socket without connected pullers is never writable; keep checking the flag
      let mut writable = false;
      while !shutdown.is_shutdown() {
        if wait_for(&backend, zmq::POLLOUT)? {
          writable = true;
          break;
        }
      }
      if !writable {
        warn!("streamer shut down with a message still in flight, dropping it");
        break;
      }
      backend.send_multipart(frames, 0)?;
      forwarded += 1;
    }
    info!(forwarded, "streamer terminated");
    Ok(forwarded)
  }
}

/// Polls a single socket for `events` for one poll interval.
fn wait_for(socket: &zmq::Socket, events: zmq::PollEvents) -> Result<bool> {
  let mut items = [socket.as_poll_item(events)];
  match zmq::poll(&mut items, POLL_INTERVAL_MS) {
    Ok(_) => Ok(items[0].get_revents().contains(events)),
    Err(zmq::Error::EINTR) => Ok(false),
    Err(e) => Err(e.into()),
  }
}
