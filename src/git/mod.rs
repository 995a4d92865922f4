//! Git operations abstraction layer
//!
//! The release procedure never touches the process working directory. It
//! receives a [ReleaseRepository] handle and performs every version-control
//! operation through it, so the same procedure runs against the operator's
//! repository or a throwaway fixture.
//!
//! - [repository::Git2Repository]: real implementation using the `git2` crate
//! - [mock::MockRepository]: in-memory implementation recording every call
//!
//! ```rust
//! # use git_release::git::ReleaseRepository;
//! # fn example<R: ReleaseRepository>(repo: &R) -> git_release::Result<()> {
//! let commit = repo.commit_all("v1.0.0")?;
//! let tagged = repo.create_annotated_tag("v1.0.0", "v1.0.0")?;
//! assert_eq!(commit, tagged);
//! # Ok(())
//! # }
//! ```

pub mod mock;
pub mod repository;

pub use mock::{MockOperation, MockRepository, RecordedOp};
pub use repository::Git2Repository;

use crate::error::Result;
use git2::Oid;
use std::path::Path;

/// Version-control operations needed by the release procedure.
///
/// ## Error Handling
///
/// Implementations map underlying failures to [crate::error::ReleaseError]:
/// an empty commit is `NothingToCommit`, a taken tag name is `TagExists`,
/// rejected or failed pushes are `Remote`.
pub trait ReleaseRepository {
    /// Root of the working tree; relative config paths resolve against it
    fn workdir(&self) -> &Path;

    /// Short name of the checked-out branch (e.g. "master")
    ///
    /// # Returns
    /// * `Err` - If HEAD is detached or the branch has no commits yet
    fn current_branch(&self) -> Result<String>;

    /// Whether tracked files differ from HEAD (untracked files are ignored)
    fn is_dirty(&self) -> Result<bool>;

    fn tag_exists(&self, name: &str) -> Result<bool>;

    /// Stage every modification to tracked files and commit it on HEAD
    ///
    /// Mirrors `git commit -a -m <message>`.
    ///
    /// # Returns
    /// * `Ok(Oid)` - The new commit
    /// * `Err(NothingToCommit)` - If the staged tree equals HEAD's tree
    fn commit_all(&self, message: &str) -> Result<Oid>;

    /// Create an annotated tag on the HEAD commit
    ///
    /// Mirrors `git tag -a <name> -m <message>`.
    ///
    /// # Returns
    /// * `Ok(Oid)` - The commit the tag points at
    /// * `Err(TagExists)` - If a tag named `name` already exists
    fn create_annotated_tag(&self, name: &str, message: &str) -> Result<Oid>;

    /// Push the checked-out branch to `refs/heads/<branch>` on `remote`
    ///
    /// Mirrors `git push <remote> <branch>`.
    fn push_branch(&self, remote: &str, branch: &str) -> Result<()>;

    /// Push every local tag to `remote`
    ///
    /// Mirrors `git push --tags`.
    fn push_tags(&self, remote: &str) -> Result<()>;
}
