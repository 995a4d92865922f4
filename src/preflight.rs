use std::fmt;

use semver::Version;

use crate::config::Config;
use crate::error::Result;
use crate::git::ReleaseRepository;
use crate::release::ReleaseRequest;

/// Non-fatal conditions noticed before a release starts.
/// These should be shown to the operator, who decides whether to continue.
#[derive(Debug, Clone, PartialEq)]
pub enum ReleaseWarning {
    /// Tracked files are already modified and would land in the release commit
    DirtyWorkingTree,
    /// The checked-out branch is not the branch being pushed to
    UnexpectedBranch { current: String, expected: String },
    /// A version is not a semantic version
    NonSemanticVersion { version: String },
    /// The next version does not sort after the release version
    VersionNotIncreasing { version: String, new_version: String },
    /// The release tag exists already; the release will be refused
    TagAlreadyExists { tag: String },
}

impl ReleaseWarning {
    /// Whether a real run is certain to fail because of this condition
    pub fn is_blocking(&self) -> bool {
        matches!(self, ReleaseWarning::TagAlreadyExists { .. })
    }
}

impl fmt::Display for ReleaseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReleaseWarning::DirtyWorkingTree => write!(
                f,
                "Working tree has uncommitted changes to tracked files; they will be included in the release commit"
            ),
            ReleaseWarning::UnexpectedBranch { current, expected } => write!(
                f,
                "Current branch '{}' will be pushed to remote branch '{}'",
                current, expected
            ),
            ReleaseWarning::NonSemanticVersion { version } => {
                write!(f, "Version '{}' is not a semantic version", version)
            }
            ReleaseWarning::VersionNotIncreasing {
                version,
                new_version,
            } => write!(
                f,
                "Next version '{}' is not greater than release version '{}'",
                new_version, version
            ),
            ReleaseWarning::TagAlreadyExists { tag } => {
                write!(f, "Tag '{}' already exists", tag)
            }
        }
    }
}

/// Collects every warning that applies to `request` in `repo`.
pub fn check<R: ReleaseRepository>(
    repo: &R,
    config: &Config,
    request: &ReleaseRequest,
) -> Result<Vec<ReleaseWarning>> {
    let mut warnings = Vec::new();

    if repo.is_dirty()? {
        warnings.push(ReleaseWarning::DirtyWorkingTree);
    }

    let current = repo.current_branch()?;
    if current != config.branch {
        warnings.push(ReleaseWarning::UnexpectedBranch {
            current,
            expected: config.branch.clone(),
        });
    }

    warnings.extend(version_warnings(request));

    let tag = config.tag_name(&request.version);
    if repo.tag_exists(&tag)? {
        warnings.push(ReleaseWarning::TagAlreadyExists { tag });
    }

    tracing::debug!(count = warnings.len(), "preflight checks finished");
    Ok(warnings)
}

/// Semver advisories; versions stay opaque, so none of these block a release.
pub fn version_warnings(request: &ReleaseRequest) -> Vec<ReleaseWarning> {
    let mut warnings = Vec::new();

    let parsed = Version::parse(&request.version);
    let parsed_new = Version::parse(&request.new_version);

    for (raw, result) in [
        (&request.version, &parsed),
        (&request.new_version, &parsed_new),
    ] {
        if result.is_err() {
            warnings.push(ReleaseWarning::NonSemanticVersion {
                version: raw.clone(),
            });
        }
    }

    if let (Ok(version), Ok(new_version)) = (parsed, parsed_new) {
        if new_version <= version {
            warnings.push(ReleaseWarning::VersionNotIncreasing {
                version: request.version.clone(),
                new_version: request.new_version.clone(),
            });
        }
    }

    warnings
}
