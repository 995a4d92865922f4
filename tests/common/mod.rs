// Shared fixtures: a work repository on `master` whose `origin` is a bare
// repository in another temp directory.
#![allow(dead_code)]

use git2::{Repository, RepositoryInitOptions};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub struct Fixture {
    pub work: TempDir,
    pub remote: TempDir,
}

impl Fixture {
    /// Work repo with one commit containing `version.sbt` = `contents`
    pub fn new(contents: &str) -> Fixture {
        let remote = TempDir::new().expect("Could not create remote dir");
        Repository::init_bare(remote.path()).expect("Could not init bare repo");

        let work = TempDir::new().expect("Could not create work dir");
        let mut opts = RepositoryInitOptions::new();
        opts.initial_head("master");
        let repo = Repository::init_opts(work.path(), &opts).expect("Could not init git repo");

        {
            let mut config = repo.config().expect("Could not get config");
            config
                .set_str("user.name", "Test User")
                .expect("Could not set user.name");
            config
                .set_str("user.email", "test@example.com")
                .expect("Could not set user.email");
        }

        fs::write(work.path().join("version.sbt"), contents).expect("Could not write version file");
        commit_file(&repo, "version.sbt", "Initial commit");

        let url = remote.path().to_str().expect("temp path is UTF-8");
        repo.remote("origin", url).expect("Could not add origin");

        Fixture { work, remote }
    }

    pub fn work_path(&self) -> &Path {
        self.work.path()
    }

    pub fn version_file(&self) -> PathBuf {
        self.work.path().join("version.sbt")
    }

    pub fn read_version_file(&self) -> String {
        fs::read_to_string(self.version_file()).expect("Could not read version file")
    }

    pub fn work_repo(&self) -> Repository {
        Repository::open(self.work.path()).expect("Could not open work repo")
    }

    pub fn remote_repo(&self) -> Repository {
        Repository::open_bare(self.remote.path()).expect("Could not open remote repo")
    }

    /// Point `origin` somewhere that does not exist
    pub fn break_remote(&self) {
        let repo = self.work_repo();
        let missing = self.remote.path().join("missing.git");
        repo.remote_set_url("origin", missing.to_str().expect("temp path is UTF-8"))
            .expect("Could not change origin url");
    }
}

pub fn commit_file(repo: &Repository, relative: &str, message: &str) {
    let mut index = repo.index().expect("Could not get index");
    index
        .add_path(Path::new(relative))
        .expect("Could not add file to index");
    index.write().expect("Could not write index");

    let tree_id = index.write_tree().expect("Could not write tree");
    let tree = repo.find_tree(tree_id).expect("Could not find tree");
    let sig = repo.signature().expect("Could not get sig");
    let parents: Vec<git2::Commit> = repo
        .head()
        .ok()
        .and_then(|head| head.peel_to_commit().ok())
        .into_iter()
        .collect();
    let parent_refs: Vec<&git2::Commit> = parents.iter().collect();

    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parent_refs)
        .expect("Could not create commit");
}

/// Message of the commit a reference peels to
pub fn commit_message(repo: &Repository, reference: &str) -> String {
    repo.find_reference(reference)
        .expect("reference exists")
        .peel_to_commit()
        .expect("reference points at a commit")
        .message()
        .unwrap_or_default()
        .to_string()
}
