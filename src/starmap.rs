// Copyright 2015-2018 Deyan Ginev. See the LICENSE
// file at the top-level directory of this distribution.
//
// Licensed under the MIT license <LICENSE-MIT or http://opensource.org/licenses/MIT>.
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Task submission: starmap a function over argument tuples and collect one result per tuple
//!
//! Submission happens in two phases. Every task is pushed (and the push
//! socket released) before the first result is received, so the number of
//! expected results is known up front and a full outgoing queue can never
//! wait on an undrained return socket.

use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::context::{recv_bytes, Context, SocketRole};
use crate::error::{Error, Result};
use crate::message::{self, Args, ResultEnvelope};

/// Submits tasks to a distribution endpoint, collecting results on an
/// ephemeral return endpoint.
#[derive(Debug, Clone)]
pub struct Submitter {
  context: Context,
  /// endpoint tasks are pushed to (a streamer frontend)
  pub frontend_url: String,
  /// return endpoint template, ending in a `:min-max` port range
  pub backend_url: String,
  /// per-result receive deadline; `None` waits forever
  pub timeout: Option<Duration>,
}

impl Submitter {
  /// A submitter pushing to `frontend_url` and collecting on a port of `backend_url`
  pub fn new<S: Into<String>, T: Into<String>>(
    context: &Context,
    frontend_url: S,
    backend_url: T,
  ) -> Submitter
  {
    Submitter {
      context: context.clone(),
      frontend_url: frontend_url.into(),
      backend_url: backend_url.into(),
      timeout: None,
    }
  }

  /// Gives up on a submission when no result arrives within `timeout`
  pub fn with_timeout(mut self, timeout: Duration) -> Submitter {
    self.timeout = Some(timeout);
    self
  }

  /// Sends `[func, args]` for every argument list
  pub fn submit<I>(&self, func: &str, allargs: I) -> Result<Starmap>
  where I: IntoIterator<Item = Args> {
    self.submit_with(func, allargs, |args| message::encode_call(func, args))
  }

  /// Sends bare argument lists, for worker pools configured with a fixed function
  pub fn submit_args<I>(&self, func: &str, allargs: I) -> Result<Starmap>
  where I: IntoIterator<Item = Args> {
    self.submit_with(func, allargs, message::encode_args)
  }

  fn submit_with<I, E>(&self, operation: &str, allargs: I, encode: E) -> Result<Starmap>
  where
    I: IntoIterator<Item = Args>,
    E: Fn(&Args) -> Result<Vec<u8>>,
  {
    let (backurl, receiver) = self
      .context
      .bind_ephemeral(&self.backend_url, SocketRole::Pull)?;
    let submitted = {
      let sender = self
        .context
        .connect(&self.frontend_url, SocketRole::Push, None)?;
      let mut n: usize = 0;
      for mut args in allargs {
        args.monitor.backurl = Some(backurl.clone());
        args.monitor.task_no = n;
        if args.monitor.operation.is_empty() {
          args.monitor.operation = operation.to_string();
        }
        sender.send(encode(&args)?, 0)?;
        n += 1;
      }
      n
    };
    info!(%operation, submitted, %backurl, "submitted tasks");
    Ok(Starmap {
      backurl,
      receiver: Some(receiver),
      submitted,
      received: 0,
      timeout: self.timeout,
    })
  }
}

/// Convenience wrapper: submits `func` over `allargs` via `frontend_url`,
/// collecting results on a port from the `backend_url` range.
pub fn starmap<I>(
  context: &Context,
  frontend_url: &str,
  backend_url: &str,
  func: &str,
  allargs: I,
) -> Result<Starmap>
where
  I: IntoIterator<Item = Args>,
{
  Submitter::new(context, frontend_url, backend_url).submit(func, allargs)
}

/// The results of one submission, in arrival order.
///
/// Yields exactly `submitted()` items, each received from the network once;
/// the return socket is released as soon as the last one arrives (or the
/// iterator is dropped). A timeout, a socket failure or an undecodable result
/// ends the sequence early, after yielding the error.
pub struct Starmap {
  backurl: String,
  receiver: Option<zmq::Socket>,
  submitted: usize,
  received: usize,
  timeout: Option<Duration>,
}

impl fmt::Debug for Starmap {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    f.debug_struct("Starmap")
      .field("backurl", &self.backurl)
      .field("submitted", &self.submitted)
      .field("received", &self.received)
      .finish()
  }
}

impl Starmap {
  /// How many tasks were submitted, hence how many results to expect
  pub fn submitted(&self) -> usize { self.submitted }

  /// How many results were received so far
  pub fn received(&self) -> usize { self.received }

  /// The concrete return address stamped on every task
  pub fn backurl(&self) -> &str { &self.backurl }

  /// Sets or clears the per-result receive deadline
  pub fn set_timeout(&mut self, timeout: Option<Duration>) { self.timeout = timeout; }

  fn recv(&self, receiver: &zmq::Socket) -> Result<Vec<u8>> {
    let timeout = match self.timeout {
      None => return recv_bytes(receiver),
      Some(timeout) => timeout,
    };
    let deadline = Instant::now() + timeout;
    loop {
      let remaining = deadline.saturating_duration_since(Instant::now());
      if remaining.is_zero() {
        return Err(Error::Timeout {
          waited: timeout,
          received: self.received,
          expected: self.submitted,
        });
      }
      let mut items = [receiver.as_poll_item(zmq::POLLIN)];
      match zmq::poll(&mut items, remaining.as_millis().max(1) as i64) {
        Ok(_) => {},
        Err(zmq::Error::EINTR) => continue,
        Err(e) => return Err(e.into()),
      }
      if items[0].get_revents().contains(zmq::POLLIN) {
        return recv_bytes(receiver);
      }
    }
  }
}

impl Iterator for Starmap {
  type Item = Result<ResultEnvelope>;

  fn next(&mut self) -> Option<Result<ResultEnvelope>> {
    if self.received >= self.submitted {
      self.receiver = None;
      return None;
    }
    let receiver = self.receiver.take()?;
    let bytes = match self.recv(&receiver) {
      Ok(bytes) => bytes,
      // receiver stays dropped: the sequence ends here
      Err(e) => return Some(Err(e)),
    };
    self.received += 1;
    let envelope = match ResultEnvelope::decode(&bytes) {
      Ok(envelope) => envelope,
      Err(e) => {
        warn!(backurl = %self.backurl, error = %e, "corrupt result, releasing return socket");
        return Some(Err(e));
      },
    };
    if self.received < self.submitted {
      self.receiver = Some(receiver);
    } else {
      debug!(backurl = %self.backurl, "all results received, releasing return socket");
    }
    Some(Ok(envelope))
  }

  fn size_hint(&self) -> (usize, Option<usize>) {
    let remaining = match self.receiver {
      Some(_) => self.submitted - self.received,
      None => 0,
    };
    (remaining, Some(remaining))
  }
}

impl ExactSizeIterator for Starmap {}
