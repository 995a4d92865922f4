use crate::error::{ReleaseError, Result};
use git2::{Cred, CredentialType, ErrorCode, ObjectType, Oid, PushOptions, RemoteCallbacks};
use git2::{Repository as Git2Repo, StatusOptions};
use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};

/// Give up after this many credential callbacks for a single push.
const MAX_CREDENTIAL_ATTEMPTS: usize = 4;

/// Wrapper around git2::Repository implementing [super::ReleaseRepository]
pub struct Git2Repository {
    repo: Git2Repo,
    workdir: PathBuf,
}

impl Git2Repository {
    /// Open the repository containing `path`, searching parent directories
    ///
    /// # Returns
    /// * `Err` - If no repository is found or it is bare
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let repo = Git2Repo::discover(path).map_err(|e| {
            ReleaseError::Repository(format!(
                "Not in a git repository ({}): {}",
                path.display(),
                e.message()
            ))
        })?;
        Self::from_git2(repo)
    }

    /// Create from existing git2::Repository
    pub fn from_git2(repo: Git2Repo) -> Result<Self> {
        let workdir = repo
            .workdir()
            .ok_or_else(|| {
                ReleaseError::Repository("Bare repositories have no working tree".to_string())
            })?
            .to_path_buf();

        Ok(Git2Repository { repo, workdir })
    }

    fn head_branch_ref(&self) -> Result<String> {
        let head = self.repo.head().map_err(|e| {
            ReleaseError::branch(format!("Cannot resolve HEAD: {}", e.message()))
        })?;

        if !head.is_branch() {
            return Err(ReleaseError::branch(
                "HEAD is detached; check out a branch before releasing",
            ));
        }

        head.name()
            .map(|s| s.to_string())
            .ok_or_else(|| ReleaseError::branch("HEAD reference name is not valid UTF-8"))
    }

    /// Push `refspecs` to `remote_name`, turning rejected updates into errors.
    fn push_refspecs(&self, remote_name: &str, refspecs: &[String]) -> Result<()> {
        let mut remote = self.repo.find_remote(remote_name).map_err(|_| {
            ReleaseError::remote(format!("No remote named '{}' found", remote_name))
        })?;

        let attempts = Cell::new(0usize);
        let rejected: RefCell<Vec<String>> = RefCell::new(Vec::new());

        let mut callbacks = RemoteCallbacks::new();
        callbacks.credentials(|_url, username_from_url, allowed_types| {
            attempts.set(attempts.get() + 1);
            if attempts.get() > MAX_CREDENTIAL_ATTEMPTS {
                return Err(git2::Error::from_str("authentication failed"));
            }
            resolve_credentials(username_from_url, allowed_types)
        });
        callbacks.push_update_reference(|refname, status| {
            if let Some(status) = status {
                rejected
                    .borrow_mut()
                    .push(format!("{} ({})", refname, status));
            }
            Ok(())
        });

        let mut push_options = PushOptions::new();
        push_options.remote_callbacks(callbacks);

        tracing::debug!(remote = remote_name, refspecs = ?refspecs, "pushing");
        remote
            .push(refspecs, Some(&mut push_options))
            .map_err(|e| match e.class() {
                git2::ErrorClass::Net => {
                    ReleaseError::remote(format!("Network error during push: {}", e.message()))
                }
                git2::ErrorClass::Reference => {
                    ReleaseError::remote(format!("Reference error during push: {}", e.message()))
                }
                _ => ReleaseError::remote(format!(
                    "Push to '{}' failed: {}",
                    remote_name,
                    e.message()
                )),
            })?;

        let rejected = rejected.borrow();
        if !rejected.is_empty() {
            return Err(ReleaseError::remote(format!(
                "Remote '{}' rejected: {}",
                remote_name,
                rejected.join(", ")
            )));
        }

        Ok(())
    }
}

/// SSH keys from ~/.ssh, then the SSH agent, then libgit2 defaults.
fn resolve_credentials(
    username_from_url: Option<&str>,
    allowed_types: CredentialType,
) -> std::result::Result<Cred, git2::Error> {
    let username = username_from_url.unwrap_or("git");

    if allowed_types.contains(CredentialType::SSH_KEY) {
        if let Some(home) = dirs::home_dir() {
            for key in ["id_ed25519", "id_rsa", "id_ecdsa"] {
                let path = home.join(".ssh").join(key);
                if path.exists() {
                    if let Ok(cred) = Cred::ssh_key(username, None, &path, None) {
                        return Ok(cred);
                    }
                }
            }
        }

        if let Ok(cred) = Cred::ssh_key_from_agent(username) {
            return Ok(cred);
        }
    }

    Cred::default()
}

impl super::ReleaseRepository for Git2Repository {
    fn workdir(&self) -> &Path {
        &self.workdir
    }

    fn current_branch(&self) -> Result<String> {
        let name = self.head_branch_ref()?;
        Ok(name.trim_start_matches("refs/heads/").to_string())
    }

    fn is_dirty(&self) -> Result<bool> {
        let mut options = StatusOptions::new();
        options.include_untracked(false).include_ignored(false);

        let statuses = self.repo.statuses(Some(&mut options))?;
        Ok(statuses
            .iter()
            .any(|entry| entry.status() != git2::Status::CURRENT))
    }

    fn tag_exists(&self, name: &str) -> Result<bool> {
        match self.repo.find_reference(&format!("refs/tags/{}", name)) {
            Ok(_) => Ok(true),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn commit_all(&self, message: &str) -> Result<Oid> {
        let mut index = self.repo.index()?;
        index.update_all(["*"], None)?;
        index.write()?;

        let tree_id = index.write_tree()?;
        let parent = self.repo.head()?.peel_to_commit()?;
        if parent.tree_id() == tree_id {
            return Err(ReleaseError::NothingToCommit(message.to_string()));
        }

        let tree = self.repo.find_tree(tree_id)?;
        let signature = self.repo.signature()?;
        let oid = self.repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            message,
            &tree,
            &[&parent],
        )?;

        tracing::debug!(%oid, message, "created commit");
        Ok(oid)
    }

    fn create_annotated_tag(&self, name: &str, message: &str) -> Result<Oid> {
        if self.tag_exists(name)? {
            return Err(ReleaseError::TagExists(name.to_string()));
        }

        let target = self.repo.head()?.peel(ObjectType::Commit)?;
        let signature = self.repo.signature()?;
        self.repo
            .tag(name, &target, &signature, message, false)
            .map_err(|e| {
                if e.code() == ErrorCode::Exists {
                    ReleaseError::TagExists(name.to_string())
                } else {
                    ReleaseError::Git(e)
                }
            })?;

        tracing::debug!(tag = name, target = %target.id(), "created annotated tag");
        Ok(target.id())
    }

    fn push_branch(&self, remote: &str, branch: &str) -> Result<()> {
        let source = self.head_branch_ref()?;
        self.push_refspecs(remote, &[format!("{}:refs/heads/{}", source, branch)])
    }

    fn push_tags(&self, remote: &str) -> Result<()> {
        let refspecs: Vec<String> = self
            .repo
            .tag_names(None)?
            .iter()
            .flatten()
            .map(|tag| format!("refs/tags/{}:refs/tags/{}", tag, tag))
            .collect();

        if refspecs.is_empty() {
            tracing::debug!(remote, "no tags to push");
            return Ok(());
        }

        self.push_refspecs(remote, &refspecs)
    }
}
