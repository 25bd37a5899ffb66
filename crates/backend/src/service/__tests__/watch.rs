//! Resolver scenarios: creation, reuse, watch rebuilds and rejections

use std::{path::PathBuf, sync::Arc, sync::atomic::Ordering};

use pretty_assertions::assert_eq;

use super::helpers::{RUNTIME_DIR, ResolverHarness};
use crate::{
  domain::log::{Diagnostic, Severity},
  domain::source::normalize_path,
  service::{CompileError, context::DUMP_DIR_OPTION, dump::dump_path},
};

const APP: &str = "/p/app.fsproj";
const LIB: &str = "/p/lib/lib.fsproj";

fn harness() -> ResolverHarness {
  let h = ResolverHarness::new();
  h.fake.add_project(APP, &["/p/A.fs", "/p/B.fs", "/p/build.fsx"]);
  h.fake.add_project(LIB, &["/p/lib/L.fs"]);
  h
}

#[tokio::test]
async fn test_manifest_request_creates_project() {
  let mut h = harness();

  let (project, ctx) = h.resolve(APP).await.expect("resolve manifest");

  assert_eq!(project.project_file(), PathBuf::from(APP));
  assert_eq!(project.runtime_dir(), PathBuf::from(RUNTIME_DIR));
  assert!(project.is_compiled(&PathBuf::from(APP)));
  assert_eq!(project.source_files().len(), 3);
  assert!(ctx.log.entries().is_empty());
  assert_eq!(h.store.len(), 1);
  assert_eq!(h.fake.checks(), 1);
}

#[tokio::test]
async fn test_uncompiled_member_reuses_analysis() {
  let mut h = harness();
  let (created, _) = h.resolve(APP).await.expect("resolve manifest");

  let (project, _) = h.resolve("/p/A.fs").await.expect("resolve member");

  assert_eq!(h.fake.checks(), 1);
  assert_eq!(project.checked().generation(), created.checked().generation());
  assert!(project.is_compiled(&PathBuf::from("/p/A.fs")));
  assert!(!project.is_compiled(&PathBuf::from("/p/B.fs")));
}

#[tokio::test]
async fn test_compiled_member_triggers_watch_rebuild() {
  let mut h = harness();
  h.resolve(APP).await.expect("resolve manifest");
  let (first, _) = h.resolve("/p/A.fs").await.expect("first request");

  let (second, _) = h.resolve("/p/A.fs").await.expect("second request");

  assert_eq!(h.fake.checks(), 2);
  assert_eq!(h.fake.derives(), 1, "watch rebuild must not derive options again");
  assert!(Arc::ptr_eq(first.options(), second.options()));
  assert!(second.checked().generation() > first.checked().generation());
  // Rebuild starts a fresh compiled set holding only the target
  assert!(second.is_compiled(&PathBuf::from("/p/A.fs")));
  assert!(!second.is_compiled(&PathBuf::from(APP)));
}

#[tokio::test]
async fn test_alternating_files_check_once_per_change() {
  let mut h = harness();
  h.resolve(APP).await.expect("resolve manifest");

  h.resolve("/p/A.fs").await.expect("A");
  h.resolve("/p/B.fs").await.expect("B");
  assert_eq!(h.fake.checks(), 1);
  let before = h.store.get(&PathBuf::from(APP)).expect("app loaded");
  assert!(before.is_compiled(&PathBuf::from("/p/A.fs")));

  let (after, _) = h.resolve("/p/A.fs").await.expect("A again");
  assert_eq!(h.fake.checks(), 2);
  assert!(after.is_compiled(&PathBuf::from("/p/A.fs")));
}

#[tokio::test]
async fn test_unknown_source_is_rejected_with_loaded_projects() {
  let mut h = harness();
  h.resolve(APP).await.expect("resolve app");
  h.resolve(LIB).await.expect("resolve lib");

  let err = h.resolve("/elsewhere/X.fs").await.expect_err("not a member");

  assert_eq!(err.code(), -32602);
  let message = err.to_string();
  assert!(message.contains("/elsewhere/X.fs"), "{message}");
  assert!(message.contains(APP), "{message}");
  assert!(message.contains(LIB), "{message}");
  assert_eq!(h.store.len(), 2);
}

#[tokio::test]
async fn test_unknown_source_with_empty_store() {
  let mut h = harness();

  let err = h.resolve("/p/A.fs").await.expect_err("no projects");

  assert!(err.to_string().contains("(none)"));
  assert_eq!(h.fake.checks(), 0);
}

#[tokio::test]
async fn test_signature_and_unknown_extensions_are_rejected() {
  let mut h = harness();
  h.resolve(APP).await.expect("resolve manifest");

  let signature = h.resolve("/p/A.fsi").await.expect_err("signature");
  assert!(matches!(signature, CompileError::SignatureFile { .. }));

  let other = h.resolve("/p/readme.md").await.expect_err("other");
  assert!(matches!(other, CompileError::UnsupportedFile { .. }));

  assert_eq!(h.fake.checks(), 1);
}

#[tokio::test]
async fn test_new_script_gets_its_own_project() {
  let mut h = harness();

  let (project, _) = h.resolve("/scripts/tool.fsx").await.expect("resolve script");

  assert_eq!(project.project_file(), PathBuf::from("/scripts/tool.fsx"));
  assert_eq!(project.source_files(), &[PathBuf::from("/scripts/tool.fsx")]);
  assert!(project.is_compiled(&PathBuf::from("/scripts/tool.fsx")));
  assert_eq!(h.store.len(), 1);
}

#[tokio::test]
async fn test_known_script_is_rebuilt_with_fresh_options() {
  let mut h = harness();
  let (first, _) = h.resolve("/scripts/tool.fsx").await.expect("first");

  let (second, _) = h.resolve("/scripts/tool.fsx").await.expect("second");

  assert_eq!(h.fake.derives(), 2);
  assert_eq!(h.fake.checks(), 2);
  assert_eq!(h.fake.runtime_lookups(), 1, "runtime directory is carried over");
  assert!(!Arc::ptr_eq(first.options(), second.options()));
  assert_eq!(h.store.len(), 1);
}

#[tokio::test]
async fn test_script_member_rebuilds_owner() {
  let mut h = harness();
  let (app, _) = h.resolve(APP).await.expect("resolve manifest");

  let (project, _) = h.resolve("/p/build.fsx").await.expect("resolve script member");

  assert_eq!(project.project_file(), PathBuf::from(APP));
  assert!(Arc::ptr_eq(app.options(), project.options()));
  assert_eq!(h.fake.checks(), 2);
  assert_eq!(h.store.len(), 1, "script must not get its own project");
}

#[tokio::test]
async fn test_manifest_rerequest_replaces_model() {
  let mut h = harness();
  let (first, _) = h.resolve(APP).await.expect("first");
  h.resolve("/p/A.fs").await.expect("member");

  let (second, _) = h.resolve(APP).await.expect("second");

  assert_eq!(h.store.len(), 1);
  assert_eq!(h.fake.derives(), 2);
  assert_eq!(h.fake.runtime_lookups(), 1);
  assert!(!Arc::ptr_eq(first.options(), second.options()));
  assert!(!second.is_compiled(&PathBuf::from("/p/A.fs")));
  assert!(second.checked().generation() > first.checked().generation());
}

#[tokio::test]
async fn test_missing_runtime_dir_leaves_store_untouched() {
  let mut h = harness();
  h.fake.no_runtime_dir.store(true, Ordering::SeqCst);

  let err = h.resolve(APP).await.expect_err("no runtime dir");

  assert!(matches!(err, CompileError::RuntimeDirNotFound { .. }));
  assert!(err.is_configuration());
  assert!(h.store.is_empty());
  assert_eq!(h.fake.checks(), 0);
}

#[tokio::test]
async fn test_front_end_failure_keeps_previous_model() {
  let mut h = harness();
  let (before, _) = h.resolve(APP).await.expect("resolve manifest");
  h.fake.fail_check(APP);

  let err = h.resolve(APP).await.expect_err("check fails");

  assert!(matches!(err, CompileError::FrontEnd { .. }));
  assert!(err.to_string().contains("checker crashed"));
  let kept = h.store.get(&PathBuf::from(APP)).expect("model kept");
  assert_eq!(kept.checked().generation(), before.checked().generation());
}

#[tokio::test]
async fn test_front_end_diagnostics_are_forwarded() {
  let mut h = harness();
  h.fake.set_diagnostics(
    APP,
    vec![Diagnostic::error("type mismatch"), Diagnostic::warning("unused value")],
  );

  let (_, ctx) = h.resolve(APP).await.expect("resolve manifest");

  let severities: Vec<_> = ctx.log.entries().iter().map(|e| e.severity).collect();
  assert_eq!(severities, vec![Severity::Error, Severity::Warning]);
  assert!(ctx.log.has_errors());

  // Reuse does not replay diagnostics
  let (_, ctx) = h.resolve("/p/A.fs").await.expect("resolve member");
  assert!(ctx.log.entries().is_empty());
}

#[tokio::test]
async fn test_dump_dir_receives_analysis() {
  let mut h = harness();
  let dir = tempfile::tempdir().expect("tempdir");
  let mut ctx = h.context(APP);
  ctx
    .extra_options
    .insert(DUMP_DIR_OPTION.to_string(), dir.path().to_string_lossy().into_owned().into());

  h.resolver
    .update_state(&mut h.store, &mut ctx)
    .await
    .expect("resolve manifest");

  let written = std::fs::read_to_string(dump_path(dir.path(), &PathBuf::from(APP))).expect("dump written");
  let dump: serde_json::Value = serde_json::from_str(&written).expect("dump json");
  assert_eq!(dump["projectFile"], APP);
  assert_eq!(dump["analysis"]["files"], 3);
  assert!(ctx.log.entries().is_empty());
}

#[cfg(unix)]
#[tokio::test]
async fn test_member_listed_through_symlinked_dir() {
  let mut h = ResolverHarness::new();
  let root = tempfile::tempdir().expect("tempdir");
  let real = root.path().join("real");
  std::fs::create_dir(&real).expect("create real dir");
  std::fs::write(real.join("app.fsproj"), "").expect("write manifest");
  std::fs::write(real.join("A.fs"), "").expect("write source");
  let link = root.path().join("link");
  std::os::unix::fs::symlink(&real, &link).expect("create symlink");

  // The build tool reports members through the link, requests arrive canonical
  let manifest = normalize_path(&link.join("app.fsproj"));
  let listed = link.join("A.fs");
  h.fake.add_project(
    manifest.to_str().expect("utf-8 path"),
    &[listed.to_str().expect("utf-8 path")],
  );
  let (project, _) = h.resolve(manifest.to_str().expect("utf-8 path")).await.expect("resolve manifest");
  let member = normalize_path(&listed);
  assert_eq!(project.source_files(), &[member.clone()]);

  let (owner, _) = h
    .resolve(member.to_str().expect("utf-8 path"))
    .await
    .expect("member file accepted");

  assert_eq!(owner.project_file(), manifest.as_path());
  assert!(owner.is_compiled(&member));
  assert_eq!(h.fake.checks(), 1);
}
