// Copyright 2015-2018 Deyan Ginev. See the LICENSE
// file at the top-level directory of this distribution.
//
// Licensed under the MIT license <LICENSE-MIT or http://opensource.org/licenses/MIT>.
// This file may not be copied, modified, or distributed
// except according to those terms.
use serde_json::{json, Value};
use ztask::message::{self, Command, FailureKind};
use ztask::{Args, Error, Monitor, Outcome, Registry, ResultEnvelope};

fn stamped(params: Vec<Value>) -> Args {
  let mut monitor = Monitor::new("test");
  monitor.backurl = Some("tcp://127.0.0.1:51742".to_string());
  monitor.task_no = 7;
  Args::new(params, monitor)
}

#[test]
fn monitor_travels_as_last_argument() {
  let args = stamped(vec![json!(1), json!("two")]);
  let bytes = message::encode_call("identity", &args).unwrap();
  let wire: Value = serde_json::from_slice(&bytes).unwrap();
  assert_eq!(
    wire,
    json!([
      "identity",
      [1, "two", {"operation": "test", "task_no": 7, "backurl": "tcp://127.0.0.1:51742"}]
    ])
  );

  match message::decode_command(&bytes, None).unwrap() {
    Command::Call { func, args: decoded } => {
      assert_eq!(func, "identity");
      assert_eq!(decoded, args);
      assert_eq!(decoded.backurl(), Some("tcp://127.0.0.1:51742"));
    },
    Command::Stop => panic!("decoded a call as stop"),
  }
}

#[test]
fn fixed_function_messages_carry_only_arguments() {
  let args = stamped(vec![json!(3)]);
  let bytes = message::encode_args(&args).unwrap();
  match message::decode_command(&bytes, Some("sum")).unwrap() {
    Command::Call { func, args: decoded } => {
      assert_eq!(func, "sum");
      assert_eq!(decoded, args);
    },
    Command::Stop => panic!("decoded arguments as stop"),
  }
}

#[test]
fn stop_is_understood_in_both_modes() {
  let stop = message::encode_stop().unwrap();
  assert_eq!(message::decode_command(&stop, None).unwrap(), Command::Stop);
  assert_eq!(message::decode_command(&stop, Some("sum")).unwrap(), Command::Stop);
  let paired = br#"["stop", null]"#;
  assert_eq!(message::decode_command(paired, None).unwrap(), Command::Stop);
}

#[test]
fn malformed_messages_are_decode_errors() {
  let cases: Vec<&[u8]> = vec![
    &b"not json at all"[..],
    &br#"["identity"]"#[..],
    &br#"[42, [{"operation": "x"}]]"#[..],
    &br#"["identity", []]"#[..],
    &br#"["identity", [1, 2]]"#[..],
  ];
  for bytes in cases {
    match message::decode_command(bytes, None) {
      Err(Error::Decode(_)) => {},
      other => panic!("{:?} should not decode, got {:?}", String::from_utf8_lossy(bytes), other),
    }
  }
}

#[test]
fn safely_call_captures_failures() {
  let mut registry = Registry::with_builtins();
  registry
    .register("fail", |_, _| Err("no luck".into()))
    .register("explode", |_, _| panic!("kaboom"));

  let args = stamped(vec![json!(5)]);
  let envelope = registry.safely_call("identity", &args);
  assert_eq!(envelope.task_no, 7);
  assert_eq!(envelope.operation, "test");
  assert_eq!(envelope.value(), Some(&json!(5)));

  let failed = registry.safely_call("fail", &args);
  assert!(!failed.is_success());
  match failed.outcome {
    Outcome::Failure(ref failure) => {
      assert_eq!(failure.kind, FailureKind::Error);
      assert_eq!(failure.message, "no luck");
    },
    Outcome::Success(_) => panic!("fail should fail"),
  }

  let exploded = registry.safely_call("explode", &args).into_result();
  let failure = exploded.unwrap_err();
  assert_eq!(failure.kind, FailureKind::Panic);
  assert_eq!(failure.message, "kaboom");

  let unknown = registry.safely_call("nonexistent", &args).into_result();
  assert_eq!(unknown.unwrap_err().kind, FailureKind::UnknownFunction);
}

#[test]
fn builtins_compute() {
  let registry = Registry::with_builtins();
  assert_eq!(registry.names(), vec!["identity", "sleep", "sum"]);
  assert!(registry.contains("sum"));
  assert!(!registry.contains("count"));
  let sum = registry.safely_call("sum", &stamped(vec![json!(1), json!(2), json!(3)]));
  assert_eq!(sum.value(), Some(&json!(6)));
  let mixed = registry.safely_call("sum", &stamped(vec![json!(1), json!(0.5)]));
  assert_eq!(mixed.value(), Some(&json!(1.5)));
  let bad = registry.safely_call("sum", &stamped(vec![json!("x")]));
  assert!(!bad.is_success());
  let pair = registry.safely_call("identity", &stamped(vec![json!(1), json!(2)]));
  assert_eq!(pair.value(), Some(&json!([1, 2])));
}

#[test]
fn envelopes_survive_the_wire() {
  let envelope = Registry::with_builtins().safely_call("identity", &stamped(vec![json!("x")]));
  let decoded = ResultEnvelope::decode(&envelope.encode().unwrap()).unwrap();
  assert_eq!(decoded, envelope);
  assert!(matches!(ResultEnvelope::decode(b"{}"), Err(Error::Decode(_))));
}
