//! Release orchestration.
//!
//! A release is a fixed, linear sequence of steps:
//!
//! 1. write the release version to the version file
//! 2. commit it
//! 3. tag that commit
//! 4. write the next snapshot version
//! 5. commit it
//! 6. push the branch
//! 7. push the tags
//!
//! The sequence is built up front as a [ReleasePlan] and executed fail-fast:
//! the first failing step stops the run and nothing is rolled back.

use std::fmt;
use std::path::PathBuf;

use git2::Oid;

use crate::config::Config;
use crate::error::{ReleaseError, Result};
use crate::git::ReleaseRepository;
use crate::version_file::{self, validate_version};

/// The two operator-supplied versions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseRequest {
    /// Version being released (e.g. "1.0.0")
    pub version: String,
    /// Next development version, without the snapshot suffix (e.g. "1.1.0")
    pub new_version: String,
}

impl ReleaseRequest {
    pub fn new(version: impl Into<String>, new_version: impl Into<String>) -> Self {
        ReleaseRequest {
            version: version.into(),
            new_version: new_version.into(),
        }
    }
}

/// One action of the release procedure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseStep {
    WriteVersion { version: String },
    Commit { message: String },
    Tag { name: String, message: String },
    PushBranch { remote: String, branch: String },
    PushTags { remote: String },
}

impl ReleaseStep {
    /// Whether the step makes changes visible outside the local repository
    pub fn is_publishing(&self) -> bool {
        matches!(
            self,
            ReleaseStep::PushBranch { .. } | ReleaseStep::PushTags { .. }
        )
    }
}

impl fmt::Display for ReleaseStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReleaseStep::WriteVersion { version } => write!(f, "set version to {}", version),
            ReleaseStep::Commit { message } => write!(f, "commit '{}'", message),
            ReleaseStep::Tag { name, .. } => write!(f, "create tag {}", name),
            ReleaseStep::PushBranch { remote, branch } => {
                write!(f, "push branch to {}/{}", remote, branch)
            }
            ReleaseStep::PushTags { remote } => write!(f, "push tags to {}", remote),
        }
    }
}

/// The ordered steps of one release
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleasePlan {
    /// Version file, absolute (joined onto the repository workdir)
    pub version_file: PathBuf,
    /// Name of the release tag
    pub tag: String,
    pub steps: Vec<ReleaseStep>,
}

/// What a successful release produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseOutcome {
    pub tag: String,
    pub release_commit: Oid,
    /// Commit the tag points at; always equal to `release_commit`
    pub tag_target: Oid,
    pub snapshot_commit: Oid,
    pub completed: Vec<ReleaseStep>,
}

/// Drives the release procedure against a repository handle.
pub struct Releaser<'a, R: ReleaseRepository> {
    repo: &'a R,
    config: &'a Config,
}

impl<'a, R: ReleaseRepository> Releaser<'a, R> {
    pub fn new(repo: &'a R, config: &'a Config) -> Self {
        Releaser { repo, config }
    }

    /// Builds the step list for `request` without touching anything.
    ///
    /// # Returns
    /// * `Err(InvalidVersion)` - If the release or snapshot version cannot be
    ///   written as a quoted literal
    pub fn plan(&self, request: &ReleaseRequest) -> Result<ReleasePlan> {
        validate_version(&request.version)?;
        validate_version(&request.new_version)?;

        let config = self.config;
        let tag = config.tag_name(&request.version);
        let release_message = config.release_commit_message(&request.version);
        let snapshot = config.snapshot_version(&request.new_version);
        validate_version(&snapshot)?;
        let snapshot_message = config.snapshot_commit_message(&snapshot);

        let steps = vec![
            ReleaseStep::WriteVersion {
                version: request.version.clone(),
            },
            ReleaseStep::Commit {
                message: release_message,
            },
            ReleaseStep::Tag {
                name: tag.clone(),
                message: tag.clone(),
            },
            ReleaseStep::WriteVersion { version: snapshot },
            ReleaseStep::Commit {
                message: snapshot_message,
            },
            ReleaseStep::PushBranch {
                remote: config.remote.clone(),
                branch: config.branch.clone(),
            },
            ReleaseStep::PushTags {
                remote: config.remote.clone(),
            },
        ];

        Ok(ReleasePlan {
            version_file: self.repo.workdir().join(&config.version_file),
            tag,
            steps,
        })
    }

    /// Plans and executes a release.
    ///
    /// A tag that already exists is reported before any step runs, so a
    /// repeated release fails without leaving a stray commit behind.
    pub fn run(&self, request: &ReleaseRequest) -> Result<ReleaseOutcome> {
        self.run_with_progress(request, |_, _, _| {})
    }

    /// Like [`run`](Self::run), calling `progress(index, total, step)` before each step.
    pub fn run_with_progress<F>(&self, request: &ReleaseRequest, progress: F) -> Result<ReleaseOutcome>
    where
        F: FnMut(usize, usize, &ReleaseStep),
    {
        let plan = self.plan(request)?;
        if self.repo.tag_exists(&plan.tag)? {
            return Err(ReleaseError::TagExists(plan.tag));
        }
        self.execute(&plan, progress)
    }

    /// Executes `plan` step by step, stopping at the first failure.
    ///
    /// A failure is wrapped in `StepFailed`, carrying the steps that completed.
    pub fn execute<F>(&self, plan: &ReleasePlan, mut progress: F) -> Result<ReleaseOutcome>
    where
        F: FnMut(usize, usize, &ReleaseStep),
    {
        let total = plan.steps.len();
        let mut completed: Vec<ReleaseStep> = Vec::with_capacity(total);
        let mut commits: Vec<Oid> = Vec::new();
        let mut tag_target = None;

        for (index, step) in plan.steps.iter().enumerate() {
            progress(index + 1, total, step);
            tracing::info!(step = index + 1, total, "{}", step);

            match self.execute_step(plan, step) {
                Ok(Some(oid)) => match step {
                    ReleaseStep::Tag { .. } => tag_target = Some(oid),
                    _ => commits.push(oid),
                },
                Ok(None) => {}
                Err(source) => {
                    tracing::debug!(step = index + 1, error = %source, "release step failed");
                    return Err(ReleaseError::StepFailed {
                        step: format!("{}/{} ({})", index + 1, total, step),
                        published: completed.iter().any(ReleaseStep::is_publishing),
                        completed: completed.iter().map(|s| s.to_string()).collect(),
                        source: Box::new(source),
                    });
                }
            }

            completed.push(step.clone());
        }

        let (release_commit, snapshot_commit) = match commits.as_slice() {
            [release, snapshot] => (*release, *snapshot),
            _ => {
                return Err(ReleaseError::config(format!(
                    "release plan must contain exactly two commits, found {}",
                    commits.len()
                )))
            }
        };
        let tag_target = tag_target
            .ok_or_else(|| ReleaseError::config("release plan did not create a tag"))?;

        Ok(ReleaseOutcome {
            tag: plan.tag.clone(),
            release_commit,
            tag_target,
            snapshot_commit,
            completed,
        })
    }

    fn execute_step(&self, plan: &ReleasePlan, step: &ReleaseStep) -> Result<Option<Oid>> {
        match step {
            ReleaseStep::WriteVersion { version } => {
                version_file::write_version(&plan.version_file, version)?;
                Ok(None)
            }
            ReleaseStep::Commit { message } => self.repo.commit_all(message).map(Some),
            ReleaseStep::Tag { name, message } => {
                self.repo.create_annotated_tag(name, message).map(Some)
            }
            ReleaseStep::PushBranch { remote, branch } => {
                self.repo.push_branch(remote, branch)?;
                Ok(None)
            }
            ReleaseStep::PushTags { remote } => {
                self.repo.push_tags(remote)?;
                Ok(None)
            }
        }
    }
}
