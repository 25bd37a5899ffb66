//! Test helpers for actor integration tests.
//!
//! Provides `ActorTestContext`, which spawns a CompilerActor over the
//! in-memory toolchain with two registered projects.

use std::{sync::Arc, time::Duration};

use tokio_util::sync::CancellationToken;

use crate::{
  actor::{CompileReply, CompilerActor, CompilerActorConfig, CompilerHandle},
  ipc::{CompileOutput, CompileRequest, ErrorReply},
  service::__tests__::helpers::{CountingLoader, FakeToolchain},
};

pub const APP: &str = "/p/app.fsproj";
pub const LIB: &str = "/p/lib/lib.fsproj";

/// Timeout for any single reply in these tests
pub const REPLY_TIMEOUT: Duration = Duration::from_secs(5);

pub struct ActorTestContext {
  pub fake: Arc<FakeToolchain>,
  pub loader: Arc<CountingLoader>,
  pub handle: CompilerHandle,
  pub cancel: CancellationToken,
}

impl ActorTestContext {
  /// Spawn an actor over a fresh toolchain
  pub fn new() -> Self {
    let fake = FakeToolchain::new();
    fake.add_project(APP, &["/p/A.fs", "/p/B.fs", "/p/build.fsx"]);
    fake.add_project(LIB, &["/p/lib/L.fs"]);
    let loader = CountingLoader::new();
    let cancel = CancellationToken::new();
    let handle = CompilerActor::spawn(
      CompilerActorConfig::default(),
      fake.toolchain(),
      loader.clone(),
      cancel.clone(),
    );
    Self {
      fake,
      loader,
      handle,
      cancel,
    }
  }

  pub async fn compile(&self, request: CompileRequest) -> CompileReply {
    let id = request.path.display().to_string();
    tokio::time::timeout(REPLY_TIMEOUT, self.handle.compile(id, &request))
      .await
      .expect("reply in time")
      .expect("actor reachable")
  }

  /// Compile `path` and expect a successful output
  pub async fn compile_ok(&self, path: &str) -> CompileOutput {
    self
      .compile(CompileRequest::new(path))
      .await
      .into_result()
      .unwrap_or_else(|e| panic!("compile {path} failed: {e}"))
  }

  /// Compile `path` and expect an error reply
  pub async fn compile_err(&self, path: &str) -> ErrorReply {
    self
      .compile(CompileRequest::new(path))
      .await
      .into_result()
      .expect_err("expected an error reply")
  }
}

impl Drop for ActorTestContext {
  fn drop(&mut self) {
    self.cancel.cancel();
  }
}
