use crate::error::{ReleaseError, Result};
use crate::git::ReleaseRepository;
use git2::Oid;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

/// Operations a mock can be told to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockOperation {
    Commit,
    Tag,
    PushBranch,
    PushTags,
}

/// A mutating call observed by the mock, in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedOp {
    Commit { id: Oid, message: String },
    Tag { name: String, message: String, target: Oid },
    PushBranch { remote: String, branch: String },
    PushTags { remote: String, tags: Vec<String> },
}

#[derive(Debug, Default)]
struct MockState {
    ops: Vec<RecordedOp>,
    committed: HashMap<PathBuf, String>,
    tags: BTreeMap<String, Oid>,
    head: Option<Oid>,
    next_id: u32,
}

/// Mock repository for testing without actual git operations
///
/// The mock owns a real directory so version files can be rewritten on disk.
/// Tracked files are snapshotted at registration and on every commit; a commit
/// whose tracked files all match the last snapshot fails with `NothingToCommit`.
pub struct MockRepository {
    workdir: PathBuf,
    branch: String,
    tracked: Vec<PathBuf>,
    failures: HashSet<MockOperation>,
    state: RefCell<MockState>,
}

impl MockRepository {
    /// Create a mock rooted at `workdir` on branch "master"
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        let state = MockState {
            head: Some(Oid::from_bytes(&[0xaa; 20]).unwrap_or_else(|_| Oid::zero())),
            ..MockState::default()
        };

        MockRepository {
            workdir: workdir.into(),
            branch: "master".to_string(),
            tracked: Vec::new(),
            failures: HashSet::new(),
            state: RefCell::new(state),
        }
    }

    /// Track a file relative to the workdir, snapshotting its current contents
    pub fn track(mut self, relative: impl Into<PathBuf>) -> Self {
        let relative = relative.into();
        let contents = fs::read_to_string(self.workdir.join(&relative)).unwrap_or_default();
        self.state
            .get_mut()
            .committed
            .insert(relative.clone(), contents);
        self.tracked.push(relative);
        self
    }

    pub fn on_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }

    /// Register a pre-existing tag on the initial HEAD
    pub fn with_tag(mut self, name: impl Into<String>) -> Self {
        let state = self.state.get_mut();
        let head = state.head.unwrap_or_else(Oid::zero);
        state.tags.insert(name.into(), head);
        self
    }

    /// Make every call of `operation` fail with a remote/git style error
    pub fn fail_on(mut self, operation: MockOperation) -> Self {
        self.failures.insert(operation);
        self
    }

    /// Mutating calls observed so far, in order
    pub fn operations(&self) -> Vec<RecordedOp> {
        self.state.borrow().ops.clone()
    }

    pub fn tag_target(&self, name: &str) -> Option<Oid> {
        self.state.borrow().tags.get(name).copied()
    }

    fn check_failure(&self, operation: MockOperation) -> Result<()> {
        if self.failures.contains(&operation) {
            return Err(ReleaseError::remote(format!(
                "injected failure for {:?}",
                operation
            )));
        }
        Ok(())
    }

    fn read_tracked(&self) -> HashMap<PathBuf, String> {
        self.tracked
            .iter()
            .map(|path| {
                let contents = fs::read_to_string(self.workdir.join(path)).unwrap_or_default();
                (path.clone(), contents)
            })
            .collect()
    }
}

/// Commit ids are the counter in big-endian followed by zeros.
fn commit_id(counter: u32) -> Result<Oid> {
    let mut bytes = [0u8; 20];
    bytes[..4].copy_from_slice(&counter.to_be_bytes());
    Ok(Oid::from_bytes(&bytes)?)
}

impl ReleaseRepository for MockRepository {
    fn workdir(&self) -> &Path {
        &self.workdir
    }

    fn current_branch(&self) -> Result<String> {
        Ok(self.branch.clone())
    }

    fn is_dirty(&self) -> Result<bool> {
        Ok(self.read_tracked() != self.state.borrow().committed)
    }

    fn tag_exists(&self, name: &str) -> Result<bool> {
        Ok(self.state.borrow().tags.contains_key(name))
    }

    fn commit_all(&self, message: &str) -> Result<Oid> {
        self.check_failure(MockOperation::Commit)?;

        let current = self.read_tracked();
        let mut state = self.state.borrow_mut();
        if current == state.committed {
            return Err(ReleaseError::NothingToCommit(message.to_string()));
        }

        state.next_id += 1;
        let id = commit_id(state.next_id)?;
        state.committed = current;
        state.head = Some(id);
        state.ops.push(RecordedOp::Commit {
            id,
            message: message.to_string(),
        });
        Ok(id)
    }

    fn create_annotated_tag(&self, name: &str, message: &str) -> Result<Oid> {
        self.check_failure(MockOperation::Tag)?;

        let mut state = self.state.borrow_mut();
        if state.tags.contains_key(name) {
            return Err(ReleaseError::TagExists(name.to_string()));
        }

        let target = state.head.unwrap_or_else(Oid::zero);
        state.tags.insert(name.to_string(), target);
        state.ops.push(RecordedOp::Tag {
            name: name.to_string(),
            message: message.to_string(),
            target,
        });
        Ok(target)
    }

    fn push_branch(&self, remote: &str, branch: &str) -> Result<()> {
        self.check_failure(MockOperation::PushBranch)?;

        self.state.borrow_mut().ops.push(RecordedOp::PushBranch {
            remote: remote.to_string(),
            branch: branch.to_string(),
        });
        Ok(())
    }

    fn push_tags(&self, remote: &str) -> Result<()> {
        self.check_failure(MockOperation::PushTags)?;

        let mut state = self.state.borrow_mut();
        let tags = state.tags.keys().cloned().collect();
        state.ops.push(RecordedOp::PushTags {
            remote: remote.to_string(),
            tags,
        });
        Ok(())
    }
}
