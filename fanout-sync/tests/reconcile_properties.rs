//! Convergence properties of the reconciler and driver against the in-memory store.

use std::cell::Cell;
use std::collections::BTreeMap;
use std::path::PathBuf;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use crypto_box::{aead::OsRng, SecretKey};
use fanout_core::{DesiredRepository, RepoId};
use fanout_store::{Call, MemoryStore, SealError, SealedBox, Sealer};
use fanout_sync::{
    diff_repository, distribute_secret, ArtifactKind, Driver, Outcome, Reconciler,
};
use fanout_templates::{workflow_path, ArtifactSource, DesiredArtifact, TemplateError};
use rstest::rstest;

const CI: &str = ".github/workflows/ci.yml";
const VAR: &str = "RUNTIME_TARGET";

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

#[derive(Default)]
struct StaticSource {
    workflows: BTreeMap<String, Vec<u8>>,
    aux: Vec<DesiredArtifact>,
    aux_walks: Cell<usize>,
}

impl StaticSource {
    fn with_workflow(mut self, id: &str, content: &str) -> Self {
        self.workflows.insert(id.to_owned(), content.as_bytes().to_vec());
        self
    }

    fn with_aux(mut self, path: &str, content: &str) -> Self {
        self.aux.push(DesiredArtifact {
            path: path.to_owned(),
            content: content.as_bytes().to_vec(),
        });
        self
    }
}

impl ArtifactSource for StaticSource {
    fn workflow(
        &self,
        _repo: &DesiredRepository,
        id: &str,
    ) -> Result<DesiredArtifact, TemplateError> {
        self.workflows
            .get(id)
            .map(|content| DesiredArtifact {
                path: workflow_path(id),
                content: content.clone(),
            })
            .ok_or_else(|| TemplateError::TemplateNotFound {
                id: id.to_owned(),
                dir: PathBuf::from("workflows"),
            })
    }

    fn auxiliary<'a>(
        &'a self,
        _repo: &'a DesiredRepository,
    ) -> Box<dyn Iterator<Item = Result<DesiredArtifact, TemplateError>> + 'a> {
        self.aux_walks.set(self.aux_walks.get() + 1);
        Box::new(self.aux.iter().cloned().map(Ok))
    }
}

struct PlainSealer;

impl Sealer for PlainSealer {
    fn seal(&self, _key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, SealError> {
        Ok(plaintext.to_vec())
    }
}

fn widgets() -> RepoId {
    RepoId::new("acme", "widgets")
}

fn desired(repo: RepoId, workflows: &[&str], runtime_target: Option<&str>) -> DesiredRepository {
    let mut d = DesiredRepository::new(repo);
    d.workflows = workflows.iter().map(|w| w.to_string()).collect();
    d.runtime_target = runtime_target.map(str::to_owned);
    d
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn scenario_absent_remote_is_created_with_content() {
    let store = MemoryStore::new();
    let outcome = Reconciler::new(&store, "sync").reconcile_file(&widgets(), "main", CI, b"A");
    assert_eq!(outcome, Outcome::Created);

    let writes: Vec<_> = store.calls().into_iter().filter(Call::is_write).collect();
    assert_eq!(writes.len(), 1);
    match &writes[0] {
        Call::PutContent { content, version, .. } => {
            assert_eq!(content, b"A");
            assert!(version.is_none(), "create must not carry a version");
        }
        other => panic!("unexpected write {other:?}"),
    }
}

#[test]
fn scenario_equal_remote_is_unchanged_with_zero_writes() {
    let store = MemoryStore::new();
    store.insert_file(&widgets(), "main", CI, "A", "v1");
    let outcome = Reconciler::new(&store, "sync").reconcile_file(&widgets(), "main", CI, b"A");
    assert_eq!(outcome, Outcome::Unchanged);
    assert_eq!(store.write_count(), 0);
}

#[test]
fn scenario_different_remote_is_updated_with_its_version() {
    let store = MemoryStore::new();
    store.insert_file(&widgets(), "main", CI, "B", "v2");
    let outcome = Reconciler::new(&store, "sync").reconcile_file(&widgets(), "main", CI, b"A");
    assert_eq!(outcome, Outcome::Updated);

    let writes: Vec<_> = store.calls().into_iter().filter(Call::is_write).collect();
    assert_eq!(writes.len(), 1);
    match &writes[0] {
        Call::PutContent { content, version, .. } => {
            assert_eq!(content, b"A");
            assert_eq!(version.as_ref().map(|v| v.0.as_str()), Some("v2"));
        }
        other => panic!("unexpected write {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

#[test]
fn second_run_is_idempotent() {
    let store = MemoryStore::new();
    let source = StaticSource::default()
        .with_workflow("ci", "on: push\n")
        .with_workflow("release", "on: tag\n")
        .with_aux(".github/actions/setup/action.yml", "runs: composite\n");
    let repos = vec![
        desired(widgets(), &["ci", "release"], None),
        desired(RepoId::new("acme", "gadgets"), &["ci"], None),
    ];
    let driver = Driver::new(Reconciler::new(&store, "sync"), &source, VAR);

    let first = driver.sync_all(&repos);
    assert!(first.is_success());
    assert!(first.repositories[0].count(Outcome::wrote) > 0);

    store.clear_calls();
    let second = driver.sync_all(&repos);
    for repo in &second.repositories {
        for artifact in &repo.artifacts {
            assert_eq!(artifact.outcome, Outcome::Unchanged, "{}", artifact.key);
        }
    }
    assert_eq!(store.write_count(), 0, "second run must not write");
}

#[rstest]
#[case::absent(None, Outcome::Created)]
#[case::equal(Some("on: push\n"), Outcome::Unchanged)]
#[case::different(Some("on: tag\n"), Outcome::Updated)]
fn converges_from_any_remote_state(#[case] remote: Option<&str>, #[case] first: Outcome) {
    let store = MemoryStore::new();
    if let Some(content) = remote {
        store.insert_file(&widgets(), "main", CI, content, "v1");
    }
    let reconciler = Reconciler::new(&store, "sync");

    assert_eq!(reconciler.reconcile_file(&widgets(), "main", CI, b"on: push\n"), first);
    store.clear_calls();
    assert_eq!(
        reconciler.reconcile_file(&widgets(), "main", CI, b"on: push\n"),
        Outcome::Unchanged
    );
    assert_eq!(store.write_count(), 0);
    let (content, _) = store.file(&widgets(), "main", CI).expect("file present");
    assert_eq!(content, b"on: push\n");
}

#[test]
fn update_is_always_preceded_by_a_read_of_the_same_path() {
    let store = MemoryStore::new();
    store.insert_file(&widgets(), "main", CI, "old", "v7");
    let source = StaticSource::default()
        .with_workflow("ci", "new")
        .with_aux(".github/actions/a.yml", "a");
    let driver = Driver::new(Reconciler::new(&store, "sync"), &source, VAR);
    driver.sync_repository(&desired(widgets(), &["ci"], None));

    let calls = store.calls();
    for (i, call) in calls.iter().enumerate() {
        if let Call::PutContent { path, version: Some(version), .. } = call {
            let previous = i.checked_sub(1).map(|j| &calls[j]);
            assert!(
                matches!(previous, Some(Call::GetContent { path: p, .. }) if p == path),
                "update of {path} not preceded by its read"
            );
            assert_eq!(version.0, "v7");
        }
    }
}

#[test]
fn single_trailing_byte_difference_is_an_update() {
    let store = MemoryStore::new();
    store.insert_file(&widgets(), "main", CI, "on: push\n", "v1");
    let outcome =
        Reconciler::new(&store, "sync").reconcile_file(&widgets(), "main", CI, b"on: push\n\n");
    assert_eq!(outcome, Outcome::Updated);
}

#[test]
fn failing_read_does_not_stop_sibling_artifacts() {
    let store = MemoryStore::new();
    let source = StaticSource::default()
        .with_workflow("ci", "1")
        .with_aux(".github/actions/broken.yml", "2")
        .with_aux(".github/actions/z.yml", "3");
    store.fail_key(".github/actions/broken.yml");

    let driver = Driver::new(Reconciler::new(&store, "sync"), &source, VAR);
    let report = driver.sync_repository(&desired(widgets(), &["ci"], None));

    let outcomes: Vec<_> = report.artifacts.iter().map(|a| a.outcome.clone()).collect();
    assert_eq!(outcomes.len(), 3);
    assert_eq!(outcomes[0], Outcome::Created);
    assert!(outcomes[1].is_failed());
    assert_eq!(outcomes[2], Outcome::Created);
}

#[test]
fn create_race_is_failed_without_retry() {
    let store = MemoryStore::new();
    store.interleave_write(&widgets(), "main", CI, "theirs");
    let outcome = Reconciler::new(&store, "sync").reconcile_file(&widgets(), "main", CI, b"ours");

    assert!(
        matches!(&outcome, Outcome::Failed(reason) if reason.contains("422")),
        "got {outcome:?}"
    );
    let calls = store.calls();
    assert_eq!(calls.len(), 2, "one read, one write, no retry: {calls:?}");
    assert!(matches!(&calls[0], Call::GetContent { .. }));
    assert!(matches!(&calls[1], Call::PutContent { version: None, .. }));
    let (content, _) = store.file(&widgets(), "main", CI).expect("file");
    assert_eq!(content, b"theirs");
}

#[test]
fn stale_version_on_update_is_failed_without_retry() {
    let store = MemoryStore::new();
    store.insert_file(&widgets(), "main", CI, "old", "v2");
    store.interleave_write(&widgets(), "main", CI, "theirs");
    let outcome = Reconciler::new(&store, "sync").reconcile_file(&widgets(), "main", CI, b"ours");

    assert!(
        matches!(&outcome, Outcome::Failed(reason) if reason.contains("409")),
        "got {outcome:?}"
    );
    let puts: Vec<_> = store
        .calls()
        .into_iter()
        .filter(|c| matches!(c, Call::PutContent { .. }))
        .collect();
    assert_eq!(puts.len(), 1);
    assert!(matches!(
        &puts[0],
        Call::PutContent { version: Some(v), .. } if v.0 == "v2"
    ));
}

#[test]
fn write_conflict_does_not_stop_sibling_artifacts() {
    let store = MemoryStore::new();
    store.interleave_write(&widgets(), "main", CI, "theirs");
    let source = StaticSource::default()
        .with_workflow("ci", "1")
        .with_workflow("release", "2");
    let driver = Driver::new(Reconciler::new(&store, "sync"), &source, VAR);

    let report = driver.sync_repository(&desired(widgets(), &["ci", "release"], None));
    assert!(report.outcome_of(CI).expect("ci reported").is_failed());
    assert_eq!(
        report.outcome_of(".github/workflows/release.yml"),
        Some(&Outcome::Created)
    );
}

#[test]
fn failing_repository_does_not_stop_the_batch() {
    let store = MemoryStore::new();
    let broken = RepoId::new("acme", "broken");
    store.fail_repo(&broken);
    let source = StaticSource::default().with_workflow("ci", "1");
    let repos = vec![
        desired(broken.clone(), &["ci"], Some("self-hosted")),
        desired(widgets(), &["ci"], Some("self-hosted")),
    ];

    let driver = Driver::new(Reconciler::new(&store, "sync"), &source, VAR);
    let mut streamed = Vec::new();
    let run = driver.sync_all_with(&repos, |r| streamed.push(r.repo.to_string()));

    assert_eq!(streamed, vec!["acme/broken", "acme/widgets"]);
    assert_eq!(run.repositories[0].failed_count(), 2);
    assert_eq!(run.repositories[1].failed_count(), 0);
    assert_eq!(run.failed_count(), 2);
    assert!(!run.is_success());
}

#[test]
fn variable_failure_does_not_block_file_sync() {
    let store = MemoryStore::new();
    store.fail_key(VAR);
    let source = StaticSource::default().with_workflow("ci", "1");
    let driver = Driver::new(Reconciler::new(&store, "sync"), &source, VAR);

    let report = driver.sync_repository(&desired(widgets(), &["ci"], Some("linux")));
    assert_eq!(report.artifacts[0].kind, ArtifactKind::Variable);
    assert!(report.artifacts[0].outcome.is_failed());
    assert_eq!(report.outcome_of(CI), Some(&Outcome::Created));
}

#[test]
fn missing_template_fails_only_its_own_file() {
    let store = MemoryStore::new();
    store.insert_variable(&widgets(), VAR, "old");
    let source = StaticSource::default().with_workflow("ci", "1");
    let driver = Driver::new(Reconciler::new(&store, "sync"), &source, VAR);

    let report = driver.sync_repository(&desired(widgets(), &["missing", "ci"], Some("new")));
    assert_eq!(report.artifacts[0].outcome, Outcome::Updated);
    assert!(report.outcome_of(&workflow_path("missing")).unwrap().is_failed());
    assert_eq!(report.outcome_of(CI), Some(&Outcome::Created));
    assert_eq!(store.variable(&widgets(), VAR).as_deref(), Some("new"));
}

#[test]
fn secret_upsert_always_writes_once() {
    let store = MemoryStore::new();
    let reconciler = Reconciler::new(&store, "sync");
    reconciler.reconcile_secret(&PlainSealer, &widgets(), "DEPLOY_TOKEN", "one");
    store.clear_calls();

    let outcome = reconciler.reconcile_secret(&PlainSealer, &widgets(), "DEPLOY_TOKEN", "one");
    assert_eq!(outcome, Outcome::Updated);
    let secret_writes = store
        .calls()
        .iter()
        .filter(|c| matches!(c, Call::PutSecret { .. }))
        .count();
    assert_eq!(secret_writes, 1);
    assert_eq!(store.write_count(), 1);
}

#[test]
fn absent_variable_is_created_once_and_never_updated() {
    let store = MemoryStore::new();
    let outcome = Reconciler::new(&store, "sync").reconcile_variable(&widgets(), VAR, "x");
    assert_eq!(outcome, Outcome::Created);
    let calls = store.calls();
    assert_eq!(calls.iter().filter(|c| matches!(c, Call::CreateVariable { .. })).count(), 1);
    assert_eq!(calls.iter().filter(|c| matches!(c, Call::UpdateVariable { .. })).count(), 0);
}

#[test]
fn present_variable_is_updated_once_and_never_created() {
    let store = MemoryStore::new();
    store.insert_variable(&widgets(), VAR, "x");
    let outcome = Reconciler::new(&store, "sync").reconcile_variable(&widgets(), VAR, "y");
    assert_eq!(outcome, Outcome::Updated);
    let calls = store.calls();
    assert_eq!(calls.iter().filter(|c| matches!(c, Call::CreateVariable { .. })).count(), 0);
    assert_eq!(calls.iter().filter(|c| matches!(c, Call::UpdateVariable { .. })).count(), 1);
}

// ---------------------------------------------------------------------------
// Ordering and fan-out
// ---------------------------------------------------------------------------

#[test]
fn variable_then_templates_then_shared_aux_once() {
    let store = MemoryStore::new();
    let source = StaticSource::default()
        .with_workflow("ci", "1")
        .with_workflow("release", "2")
        .with_aux(".github/actions/a.yml", "a")
        .with_aux(".github/actions/b.yml", "b");
    let driver = Driver::new(Reconciler::new(&store, "sync"), &source, VAR);
    let report = driver.sync_repository(&desired(widgets(), &["ci", "release"], Some("linux")));

    let keys: Vec<&str> = report.artifacts.iter().map(|a| a.key.as_str()).collect();
    assert_eq!(
        keys,
        vec![
            VAR,
            ".github/workflows/ci.yml",
            ".github/actions/a.yml",
            ".github/actions/b.yml",
            ".github/workflows/release.yml",
        ]
    );
    assert_eq!(source.aux_walks.get(), 1);
}

#[test]
fn repository_without_workflows_touches_no_files() {
    let store = MemoryStore::new();
    let source = StaticSource::default().with_aux(".github/actions/a.yml", "a");
    let driver = Driver::new(Reconciler::new(&store, "sync"), &source, VAR);
    let report = driver.sync_repository(&desired(widgets(), &[], None));
    assert!(report.artifacts.is_empty());
    assert!(store.calls().is_empty());
}

#[test]
fn distribute_secret_reaches_every_repository() {
    let store = MemoryStore::new();
    let reconciler = Reconciler::new(&store, "sync");
    let repos = vec![
        desired(widgets(), &[], None),
        desired(RepoId::new("acme", "gadgets"), &[], None),
    ];
    let mut streamed = Vec::new();
    let run = distribute_secret(&reconciler, &PlainSealer, &repos, "DEPLOY_TOKEN", "v", |r| {
        streamed.push(r.repo.to_string())
    });
    assert!(run.is_success());
    assert_eq!(streamed, vec!["acme/widgets", "acme/gadgets"]);
    assert!(store.secret(&widgets(), "DEPLOY_TOKEN").is_some());
    assert!(store.secret(&RepoId::new("acme", "gadgets"), "DEPLOY_TOKEN").is_some());
}

#[test]
fn distributed_secret_opens_with_the_repository_key() {
    let recipient = SecretKey::generate(&mut OsRng);
    let store = MemoryStore::new();
    store.set_public_key(recipient.public_key().as_bytes().to_vec());
    let reconciler = Reconciler::new(&store, "sync");

    let run = distribute_secret(
        &reconciler,
        &SealedBox,
        &[desired(widgets(), &[], None)],
        "DEPLOY_TOKEN",
        "hunter2",
        |_| {},
    );
    assert_eq!(
        run.repositories[0].outcome_of("DEPLOY_TOKEN"),
        Some(&Outcome::Created)
    );
    let stored = store.secret(&widgets(), "DEPLOY_TOKEN").expect("secret stored");
    let sealed = STANDARD.decode(&stored.encrypted_value).expect("base64");
    assert_eq!(recipient.unseal(&sealed).expect("unseal"), b"hunter2");
}

#[test]
fn secret_dry_run_seals_but_never_writes() {
    let store = MemoryStore::new();
    let reconciler = Reconciler::new(&store, "sync").dry_run(true);
    let run = distribute_secret(
        &reconciler,
        &PlainSealer,
        &[desired(widgets(), &[], None)],
        "DEPLOY_TOKEN",
        "v",
        |_| {},
    );
    assert!(run.dry_run);
    assert_eq!(
        run.repositories[0].outcome_of("DEPLOY_TOKEN"),
        Some(&Outcome::WouldUpdate)
    );
    assert_eq!(store.write_count(), 0);
}

#[test]
fn dry_run_driver_reports_without_writing() {
    let store = MemoryStore::new();
    let source = StaticSource::default().with_workflow("ci", "1");
    let driver = Driver::new(Reconciler::new(&store, "sync").dry_run(true), &source, VAR);
    let run = driver.sync_all(&[desired(widgets(), &["ci"], Some("linux"))]);
    assert!(run.dry_run);
    assert_eq!(run.repositories[0].outcome_of(CI), Some(&Outcome::WouldCreate));
    assert_eq!(store.write_count(), 0);
}

// ---------------------------------------------------------------------------
// Diff
// ---------------------------------------------------------------------------

#[test]
fn diff_lists_only_differing_files() {
    let store = MemoryStore::new();
    store.insert_file(&widgets(), "main", CI, "on: push\n", "v1");
    store.insert_file(&widgets(), "main", ".github/actions/a.yml", "a\n", "v1");
    let source = StaticSource::default()
        .with_workflow("ci", "on: pull_request\n")
        .with_aux(".github/actions/a.yml", "a\n")
        .with_aux(".github/actions/new.yml", "fresh\n");

    let diff = diff_repository(&store, &source, &desired(widgets(), &["ci"], None));
    let paths: Vec<&str> = diff.diffs.iter().map(|d| d.path.as_str()).collect();
    assert_eq!(paths, vec![CI, ".github/actions/new.yml"]);
    assert!(diff.diffs[0].unified_diff.contains("+on: pull_request"));
    assert!(diff.diffs[0].unified_diff.contains("-on: push"));
    assert!(diff.diffs[1].new_file);
    assert!(diff.failures.is_empty());
    assert_eq!(store.write_count(), 0);
}
