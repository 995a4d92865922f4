// tests/release_test.rs
mod common;

use common::{commit_message, Fixture};
use git_release::config::Config;
use git_release::git::{Git2Repository, ReleaseRepository};
use git_release::{ReleaseError, ReleaseRequest, Releaser};

fn release(fixture: &Fixture, version: &str, new_version: &str) -> git_release::Result<git_release::ReleaseOutcome> {
    let repo = Git2Repository::open(fixture.work_path())?;
    let config = Config::default();
    Releaser::new(&repo, &config).run(&ReleaseRequest::new(version, new_version))
}

#[test]
fn test_release_commits_tags_and_pushes() {
    let fixture = Fixture::new("version := \"0.9.0-SNAPSHOT\"\n");

    let outcome = release(&fixture, "1.0.0", "1.1.0").expect("release succeeds");
    assert_eq!(outcome.tag, "v1.0.0");
    assert_eq!(fixture.read_version_file(), "version := \"1.1.0-SNAPSHOT\"\n");

    let work = fixture.work_repo();
    let head = work.head().unwrap().peel_to_commit().unwrap();
    assert_eq!(head.id(), outcome.snapshot_commit);
    assert_eq!(head.message(), Some("v1.1.0-SNAPSHOT"));

    let release_commit = head.parent(0).unwrap();
    assert_eq!(release_commit.id(), outcome.release_commit);
    assert_eq!(release_commit.message(), Some("v1.0.0"));

    // The release commit holds the release version, not the snapshot
    let blob = release_commit
        .tree()
        .unwrap()
        .get_name("version.sbt")
        .unwrap()
        .to_object(&work)
        .unwrap()
        .peel_to_blob()
        .unwrap();
    assert_eq!(blob.content(), b"version := \"1.0.0\"\n");
}

#[test]
fn test_tag_is_annotated_and_on_release_commit() {
    let fixture = Fixture::new("version := \"0.9.0-SNAPSHOT\"\n");
    let outcome = release(&fixture, "1.0.0", "1.1.0").unwrap();

    let work = fixture.work_repo();
    let tag = work
        .find_reference("refs/tags/v1.0.0")
        .unwrap()
        .peel_to_tag()
        .expect("tag is annotated");
    assert_eq!(tag.name(), Some("v1.0.0"));
    assert_eq!(tag.message(), Some("v1.0.0"));
    assert_eq!(tag.target_id(), outcome.release_commit);
    assert_ne!(tag.target_id(), outcome.snapshot_commit);
}

#[test]
fn test_remote_receives_branch_and_tags() {
    let fixture = Fixture::new("val version = \"0.9.0-SNAPSHOT\"\n");
    let outcome = release(&fixture, "1.0.0", "1.1.0").unwrap();

    let remote = fixture.remote_repo();
    assert_eq!(
        commit_message(&remote, "refs/heads/master"),
        "v1.1.0-SNAPSHOT"
    );
    let remote_tag_commit = remote
        .find_reference("refs/tags/v1.0.0")
        .unwrap()
        .peel_to_commit()
        .unwrap();
    assert_eq!(remote_tag_commit.id(), outcome.release_commit);
}

#[test]
fn test_second_release_with_same_versions_fails_on_tag() {
    let fixture = Fixture::new("version := \"0.9.0-SNAPSHOT\"\n");
    release(&fixture, "1.0.0", "1.1.0").unwrap();
    let head_before = fixture.work_repo().head().unwrap().target().unwrap();

    let err = release(&fixture, "1.0.0", "1.1.0").unwrap_err();
    assert!(matches!(err.root_cause(), ReleaseError::TagExists(tag) if tag == "v1.0.0"));

    assert_eq!(
        fixture.work_repo().head().unwrap().target().unwrap(),
        head_before
    );
    assert_eq!(fixture.read_version_file(), "version := \"1.1.0-SNAPSHOT\"\n");
}

#[test]
fn test_release_of_current_version_fails_at_first_commit() {
    let fixture = Fixture::new("version := \"1.0.0\"\n");

    let err = release(&fixture, "1.0.0", "1.1.0").unwrap_err();
    match &err {
        ReleaseError::StepFailed {
            completed,
            published,
            source,
            ..
        } => {
            assert_eq!(completed.len(), 1);
            assert!(!published);
            assert!(matches!(**source, ReleaseError::NothingToCommit(_)));
        }
        other => panic!("unexpected error: {}", other),
    }

    assert!(fixture.work_repo().find_reference("refs/tags/v1.0.0").is_err());
}

#[test]
fn test_unreachable_remote_leaves_local_release() {
    let fixture = Fixture::new("version := \"0.9.0-SNAPSHOT\"\n");
    fixture.break_remote();

    let err = release(&fixture, "1.0.0", "1.1.0").unwrap_err();
    match &err {
        ReleaseError::StepFailed {
            step,
            completed,
            published,
            source,
        } => {
            assert!(step.starts_with("6/7"), "got: {}", step);
            assert_eq!(completed.len(), 5);
            assert!(!published);
            assert!(matches!(**source, ReleaseError::Remote(_)));
        }
        other => panic!("unexpected error: {}", other),
    }

    // Local commits and tag stay; nothing is rolled back
    let work = fixture.work_repo();
    assert!(work.find_reference("refs/tags/v1.0.0").is_ok());
    assert_eq!(commit_message(&work, "HEAD"), "v1.1.0-SNAPSHOT");
}

#[test]
fn test_ambiguous_version_file_changes_nothing() {
    let original = "version := \"0.9.0\"\nThisBuild / version := \"0.9.0\"\n";
    let fixture = Fixture::new(original);

    let err = release(&fixture, "1.0.0", "1.1.0").unwrap_err();
    assert!(matches!(err.root_cause(), ReleaseError::VersionFile(_)));
    assert_eq!(fixture.read_version_file(), original);
    assert_eq!(commit_message(&fixture.work_repo(), "HEAD"), "Initial commit");
}

#[test]
fn test_repository_handle_reports_branch_and_state() {
    let fixture = Fixture::new("version := \"0.9.0-SNAPSHOT\"\n");
    let repo = Git2Repository::open(fixture.work_path()).unwrap();

    assert_eq!(repo.current_branch().unwrap(), "master");
    assert!(!repo.is_dirty().unwrap());

    std::fs::write(fixture.version_file(), "version := \"edited\"\n").unwrap();
    assert!(repo.is_dirty().unwrap());
}

#[test]
fn test_unquotable_snapshot_suffix_leaves_repository_untouched() {
    let fixture = Fixture::new("version := \"0.9.0-SNAPSHOT\"\n");
    let repo = Git2Repository::open(fixture.work_path()).unwrap();
    let mut config = Config::default();
    config.snapshot_suffix = "-\"SNAP".to_string();

    let err = Releaser::new(&repo, &config)
        .run(&ReleaseRequest::new("1.0.0", "1.1.0"))
        .unwrap_err();

    assert!(matches!(err, ReleaseError::InvalidVersion { .. }), "got: {}", err);
    assert!(!repo.tag_exists("v1.0.0").unwrap());
    assert_eq!(commit_message(&fixture.work_repo(), "HEAD"), "Initial commit");
    assert_eq!(fixture.read_version_file(), "version := \"0.9.0-SNAPSHOT\"\n");
}
