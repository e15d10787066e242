// Copyright 2015-2018 Deyan Ginev. See the LICENSE
// file at the top-level directory of this distribution.
//
// Licensed under the MIT license <LICENSE-MIT or http://opensource.org/licenses/MIT>.
// This file may not be copied, modified, or distributed
// except according to those terms.
use ztask::context::{recv_bytes, recv_multipart};
use ztask::endpoint::{port_of, PortRange};
use ztask::{Context, Error, SocketRole};

#[test]
fn ephemeral_binds_pick_distinct_ports_in_range() {
  let context = Context::new();
  let first = context.bind_ephemeral("tcp://127.0.0.1:53000-53010", SocketRole::Pull);
  let second = context.bind_ephemeral("tcp://127.0.0.1:53000-53010", SocketRole::Pull);
  assert!(first.is_ok());
  assert!(second.is_ok());
  let (first_url, _first_socket) = first.unwrap();
  let (second_url, _second_socket) = second.unwrap();

  let first_port = port_of(&first_url).unwrap();
  let second_port = port_of(&second_url).unwrap();
  assert_ne!(first_port, second_port);
  assert!((53000..=53010).contains(&first_port));
  assert!((53000..=53010).contains(&second_port));
  assert!(first_url.starts_with("tcp://127.0.0.1:"));
}

#[test]
fn exhausted_range_is_a_bind_error() {
  let context = Context::new();
  let taken = context.bind_ephemeral("tcp://127.0.0.1:53030-53030", SocketRole::Pull);
  assert!(taken.is_ok());
  match context.bind_ephemeral("tcp://127.0.0.1:53030-53030", SocketRole::Pull) {
    Err(Error::Bind { endpoint, .. }) => assert_eq!(endpoint, "tcp://127.0.0.1:53030-53030"),
    other => panic!("expected a bind error, got {:?}", other.map(|(url, _)| url)),
  }
}

#[test]
fn range_suffix_is_required() {
  let context = Context::new();
  for endpoint in &[
    "tcp://127.0.0.1:53020",
    "tcp://127.0.0.1",
    "tcp://127.0.0.1:53025-53020",
    "tcp://127.0.0.1:0-10",
    "tcp://127.0.0.1:1000-99999",
  ] {
    match context.bind_ephemeral(endpoint, SocketRole::Pull) {
      Err(Error::MalformedEndpoint { endpoint: reported, .. }) => assert_eq!(&reported, endpoint),
      other => panic!("{} should be malformed, got {:?}", endpoint, other.map(|(url, _)| url)),
    }
  }
}

#[test]
fn port_range_substitutes_chosen_port() {
  let range = PortRange::parse("tcp://*:51700-51800").unwrap();
  assert_eq!(range.base, "tcp://*");
  assert_eq!(range.min, 51700);
  assert_eq!(range.max, 51800);
  assert!(range.contains(51800));
  assert!(!range.contains(51801));
  assert_eq!(range.with_port(51742), "tcp://*:51742");
  assert_eq!(range.to_string(), "tcp://*:51700-51800");
  assert_eq!(port_of("tcp://localhost:5555"), Some(5555));
  assert_eq!(port_of("ipc:///tmp/socket"), None);
}

#[test]
fn failed_bind_names_the_endpoint() {
  let context = Context::new();
  match context.bind("bogus://nowhere", SocketRole::Pull, None) {
    Err(e @ Error::Bind { .. }) => assert!(e.to_string().ends_with(": bogus://nowhere")),
    Err(other) => panic!("expected a bind error, got {}", other),
    Ok(_) => panic!("bogus transport should not bind"),
  }
  // the same endpoint can be bound right after a failure elsewhere
  let bound = context.bind("tcp://127.0.0.1:53040", SocketRole::Push, None);
  assert!(bound.is_ok());
  match context.bind("tcp://127.0.0.1:53040", SocketRole::Push, None) {
    Err(Error::Bind { endpoint, source }) => {
      assert_eq!(endpoint, "tcp://127.0.0.1:53040");
      assert_eq!(source, zmq::Error::EADDRINUSE);
    },
    other => panic!("expected EADDRINUSE, got {:?}", other.err()),
  }
}

#[test]
fn failed_connect_names_the_endpoint() {
  let context = Context::new();
  match context.connect("bogus://nowhere", SocketRole::Push, None) {
    Err(e @ Error::Connect { .. }) => assert!(e.to_string().contains("bogus://nowhere")),
    Err(other) => panic!("expected a connect error, got {}", other),
    Ok(_) => panic!("bogus transport should not connect"),
  }
}

#[test]
fn identities_are_applied() {
  let context = Context::new();
  let identity = ztask::context::random_identity();
  assert_eq!(identity.len(), 10);
  let dealer = context
    .connect("tcp://127.0.0.1:53050", SocketRole::Dealer, Some(identity.as_bytes()))
    .unwrap();
  assert_eq!(dealer.get_identity().unwrap(), identity.as_bytes());
}

#[test]
fn receive_helpers_return_whole_messages() {
  let context = Context::new();
  let pull = context
    .bind("inproc://receive-helpers", SocketRole::Pull, None)
    .unwrap();
  let push = context
    .connect("inproc://receive-helpers", SocketRole::Push, None)
    .unwrap();
  push.send("single", 0).unwrap();
  push.send_multipart(vec!["head", "tail"], 0).unwrap();
  assert_eq!(recv_bytes(&pull).unwrap(), b"single".to_vec());
  assert_eq!(
    recv_multipart(&pull).unwrap(),
    vec![b"head".to_vec(), b"tail".to_vec()]
  );
}
