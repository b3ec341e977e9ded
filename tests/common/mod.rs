//! Common test utilities for deckhand integration tests

use std::path::PathBuf;

use assert_cmd::Command;
use tempfile::TempDir;

/// A throwaway workspace with a manifest, installations and repository dirs
pub struct TestWorkspace {
    #[allow(dead_code)]
    pub temp: TempDir,
    pub path: PathBuf,
    installations: Vec<(String, Option<Vec<String>>)>,
}

#[allow(dead_code)]
impl TestWorkspace {
    /// Create a workspace whose manifest targets the kind provider
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let path = temp.path().to_path_buf();
        let workspace = Self {
            temp,
            path,
            installations: Vec::new(),
        };
        workspace.write_file(
            "deckhand.yaml",
            "cluster: local\nproject: demo\nprovider: kind\nregion: us-east-1\nbucket: state\n",
        );
        workspace
    }

    /// Record an installed repository with known dependencies
    pub fn install(mut self, name: &str, dependencies: &[&str]) -> Self {
        self.installations.push((
            name.to_string(),
            Some(dependencies.iter().map(|d| d.to_string()).collect()),
        ));
        std::fs::create_dir_all(self.path.join(name)).expect("Failed to create repository dir");
        self.save_installations();
        self
    }

    /// Record an installed repository without dependency metadata
    pub fn install_unordered(mut self, name: &str) -> Self {
        self.installations.push((name.to_string(), None));
        std::fs::create_dir_all(self.path.join(name)).expect("Failed to create repository dir");
        self.save_installations();
        self
    }

    /// Add steps for one action to a repository's execution file
    pub fn steps(self, repo: &str, action: &str, steps: &[(&str, &str)]) -> Self {
        let file = format!("{}/deploy.yaml", repo);
        let mut content = if self.file_exists(&file) {
            self.read_file(&file)
        } else {
            String::new()
        };
        content.push_str(&format!("{}:\n", action));
        for (name, script) in steps {
            content.push_str(&format!(
                "  - name: {}\n    command: sh\n    args: [\"-c\", \"{}\"]\n",
                name, script
            ));
        }
        self.write_file(&file, &content);
        self
    }

    /// Make the workspace a git work tree and commit everything in it
    pub fn commit_all(&self) {
        let repo = git2::Repository::open(&self.path)
            .or_else(|_| git2::Repository::init(&self.path))
            .expect("Failed to open git repository");
        let mut index = repo.index().expect("Failed to read index");
        index
            .add_all(["*"], git2::IndexAddOption::DEFAULT, None)
            .expect("Failed to stage files");
        index.write().expect("Failed to write index");
        let tree_id = index.write_tree().expect("Failed to write tree");
        let tree = repo.find_tree(tree_id).expect("Failed to find tree");
        let signature =
            git2::Signature::now("Test", "test@example.com").expect("Failed to build signature");
        let parent = repo.head().ok().and_then(|head| head.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();
        repo.commit(Some("HEAD"), &signature, &signature, "snapshot", &tree, &parents)
            .expect("Failed to commit");
    }

    fn save_installations(&self) {
        let mut content = String::from("installations:\n");
        for (name, dependencies) in &self.installations {
            content.push_str(&format!("  - repository:\n      name: {}\n", name));
            if let Some(dependencies) = dependencies {
                content.push_str(&format!(
                    "      dependencies: [{}]\n",
                    dependencies.join(", ")
                ));
            }
        }
        self.write_file("installations.yaml", &content);
    }

    /// Write a file in workspace
    pub fn write_file(&self, path: &str, content: &str) {
        let file_path = self.path.join(path);
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        std::fs::write(&file_path, content).expect("Failed to write file");
    }

    /// Read a file from workspace
    pub fn read_file(&self, path: &str) -> String {
        std::fs::read_to_string(self.path.join(path)).expect("Failed to read file")
    }

    pub fn file_exists(&self, path: &str) -> bool {
        self.path.join(path).exists()
    }

    /// The deckhand binary, pointed at this workspace
    ///
    /// `KUBERNETES_SERVICE_HOST` keeps the kind provider from exporting a
    /// kubeconfig.
    pub fn cmd(&self) -> Command {
        let mut cmd = deckhand_cmd();
        cmd.arg("-w")
            .arg(&self.path)
            .env_remove("DECKHAND_WORKSPACE")
            .env_remove("DECKHAND_LOG")
            .env("KUBERNETES_SERVICE_HOST", "127.0.0.1");
        cmd
    }
}

#[allow(deprecated)]
pub fn deckhand_cmd() -> Command {
    Command::cargo_bin("deckhand").expect("deckhand binary should be built")
}
