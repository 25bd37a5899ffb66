//! Ordering and overlap: state updates are serialized, translations are not.

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use crate::{
    actor::{
      CompileReply, SendError,
      __tests__::helpers::{APP, ActorTestContext, LIB, REPLY_TIMEOUT},
    },
    ipc::CompileRequest,
  };

  fn payload(path: &str) -> serde_json::Value {
    serde_json::to_value(CompileRequest::new(path)).expect("encode request")
  }

  #[tokio::test]
  async fn test_slow_translation_does_not_block_other_requests() {
    let ctx = ActorTestContext::new();
    ctx.compile_ok(APP).await;
    ctx.compile_ok(LIB).await;
    let gate = ctx.fake.gate("/p/A.fs");

    let mut slow = ctx.handle.send("slow", payload("/p/A.fs")).await.expect("send slow");
    let fast = ctx.handle.send("fast", payload("/p/lib/L.fs")).await.expect("send fast");

    let fast = tokio::time::timeout(REPLY_TIMEOUT, fast)
      .await
      .expect("fast reply while slow is gated")
      .expect("fast reply");
    assert!(!fast.is_error());
    assert!(slow.try_recv().is_err(), "gated translation must still be pending");

    gate.notify_one();
    let slow = tokio::time::timeout(REPLY_TIMEOUT, slow)
      .await
      .expect("slow reply after gate opens")
      .expect("slow reply");
    assert!(!slow.is_error());
  }

  #[tokio::test]
  async fn test_state_updates_follow_arrival_order() {
    let ctx = ActorTestContext::new();
    ctx.compile_ok(APP).await;

    // First request marks A compiled, the second must see that and rebuild
    let first = ctx.handle.send("1", payload("/p/A.fs")).await.expect("send first");
    let second = ctx.handle.send("2", payload("/p/A.fs")).await.expect("send second");

    let store = ctx.handle.snapshot().await.expect("snapshot");
    assert_eq!(ctx.fake.checks(), 2);
    let app = store.get(&std::path::PathBuf::from(APP)).expect("app loaded");
    assert!(app.is_compiled(&std::path::PathBuf::from("/p/A.fs")));

    for rx in [first, second] {
      let reply = tokio::time::timeout(REPLY_TIMEOUT, rx)
        .await
        .expect("reply in time")
        .expect("reply");
      assert!(matches!(reply, CompileReply::Done(_)));
    }
  }

  #[tokio::test]
  async fn test_shutdown_waits_for_in_flight_translation() {
    let ctx = ActorTestContext::new();
    ctx.compile_ok(APP).await;
    let gate = ctx.fake.gate("/p/B.fs");

    let pending = ctx.handle.send("pending", payload("/p/B.fs")).await.expect("send");
    ctx.handle.shutdown().await.expect("shutdown");

    gate.notify_one();
    let reply = tokio::time::timeout(REPLY_TIMEOUT, pending)
      .await
      .expect("reply in time")
      .expect("reply delivered despite shutdown");
    assert!(!reply.is_error());

    let mut gone = false;
    for _ in 0..50 {
      if matches!(ctx.handle.snapshot().await, Err(SendError::ActorGone)) {
        gone = true;
        break;
      }
      tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(gone, "actor should stop after shutdown");
  }
}
