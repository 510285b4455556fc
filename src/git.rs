// SPDX-FileCopyrightText: 2025 Maciej Borzecki <maciek.borzecki@gmail.com>
//
// SPDX-License-Identifier: MIT

use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror;

use crate::version::Outcome;

/// Wraps errors of the describe step. All of them end up as a fallback.
#[derive(thiserror::Error, Debug)]
pub enum DescribeError {
    #[error("git is not available: {0}")]
    Unavailable(String),
    #[error("cannot start git: {0}")]
    Start(io::Error),
    #[error("git command exited with status {exit_code}, stderr:\n{stderr}")]
    Execution { stderr: String, exit_code: i32 },
    #[error("git output is not valid UTF-8")]
    Encoding,
    #[error("git returned an empty description")]
    Empty,
}

// io::Error is not comparable, errors compare by their message.
impl PartialEq for DescribeError {
    fn eq(&self, other: &Self) -> bool {
        self.to_string() == other.to_string()
    }
}

pub struct GitCommand(Command);

/// Builds git command line.
pub struct GitCommandBuilder<'a> {
    program: &'a str,
    repo: Option<&'a Path>,
    args: Vec<&'a str>,
}

impl<'a> GitCommandBuilder<'a> {
    pub fn new(program: &'a str) -> Self {
        Self {
            program,
            repo: None,
            args: Vec::new(),
        }
    }

    pub fn in_repo(mut self, repo: Option<&'a Path>) -> Self {
        self.repo = repo;
        self
    }

    pub fn args(mut self, args: &'a [&str]) -> Self {
        self.args = args.to_vec();
        self
    }

    pub fn build(self) -> GitCommand {
        let mut cmd = Command::new(self.program);
        if let Some(repo) = self.repo {
            cmd.arg("-C");
            cmd.arg(repo);
        }

        cmd.args(self.args);
        GitCommand(cmd)
    }
}

/// Trait representing a way to run git command.
pub trait GitRunner {
    fn run(&mut self, cmd: GitCommand) -> Result<Vec<u8>, DescribeError>;
}

/// Runs git as a child process.
pub struct GitCommandRunner;

impl GitRunner for GitCommandRunner {
    /// Runs a command returning its output (stdout).
    fn run(&mut self, gitcmd: GitCommand) -> Result<Vec<u8>, DescribeError> {
        let GitCommand(mut cmd) = gitcmd;

        log::trace!(
            "running {} with: {:?}",
            cmd.get_program().to_string_lossy(),
            cmd.get_args()
                .map(|a| a.to_string_lossy())
                .collect::<Vec<_>>()
        );

        let res = cmd.output().map_err(DescribeError::Start)?;

        if !res.status.success() {
            return Err(DescribeError::Execution {
                stderr: String::from_utf8_lossy(&res.stderr).trim().to_string(),
                exit_code: res.status.code().unwrap_or(255),
            });
        }
        Ok(res.stdout)
    }
}

fn output_to_string(output: Vec<u8>) -> Result<String, DescribeError> {
    let text = String::from_utf8(output).map_err(|_| DescribeError::Encoding)?;
    let text = text.trim();
    if text.is_empty() {
        return Err(DescribeError::Empty);
    }
    Ok(text.to_string())
}

/// Describes repository state using the git executable.
pub struct GitDescriber<R>
where
    R: GitRunner,
{
    runner: R,
    program: String,
    repo: Option<PathBuf>,
}

impl<R> GitDescriber<R>
where
    R: GitRunner,
{
    pub fn new(runner: R, program: &str, repo: Option<PathBuf>) -> Self {
        Self {
            runner,
            program: program.to_string(),
            repo,
        }
    }

    // Consume self and return the underlying runner, used by tests to inspect
    // the calls.
    #[cfg(test)]
    fn test_into_runner(self) -> R {
        self.runner
    }

    /// Checks that git can be executed at all, returning its version line.
    pub fn probe(&mut self) -> Result<String, DescribeError> {
        let cmd = GitCommandBuilder::new(&self.program)
            .in_repo(self.repo.as_deref())
            .args(&["--version"])
            .build();

        self.runner
            .run(cmd)
            .and_then(output_to_string)
            .map_err(|e| DescribeError::Unavailable(e.to_string()))
    }

    /// Runs `git describe --tags --always` exactly once. Without tags git
    /// prints the abbreviated hash.
    pub fn describe_tags(&mut self) -> Result<String, DescribeError> {
        let cmd = GitCommandBuilder::new(&self.program)
            .in_repo(self.repo.as_deref())
            .args(&["describe", "--tags", "--always"])
            .build();

        self.runner.run(cmd).and_then(output_to_string)
    }

    /// Probes for git and describes the repository. Never fails, any error is
    /// carried in the fallback outcome.
    pub fn describe(&mut self) -> Outcome {
        match self.probe() {
            Ok(version) => log::debug!("using {}", version),
            Err(err) => {
                log::warn!("{}", err);
                return Outcome::Fallback(err);
            }
        }

        match self.describe_tags() {
            Ok(descriptor) => Outcome::Described(descriptor),
            Err(err) => {
                log::warn!("cannot describe repository: {}", err);
                Outcome::Fallback(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;

    struct MockGitRunner {
        seen_calls: VecDeque<Vec<String>>,
        outputs: VecDeque<Result<Vec<u8>, DescribeError>>,
    }

    impl MockGitRunner {
        fn new(calls: Vec<Result<Vec<u8>, DescribeError>>) -> Self {
            Self {
                seen_calls: VecDeque::new(),
                outputs: VecDeque::from(calls),
            }
        }
    }

    impl GitRunner for MockGitRunner {
        fn run(&mut self, cmd: GitCommand) -> Result<Vec<u8>, DescribeError> {
            let GitCommand(cmd) = cmd;
            let call: Vec<String> = cmd
                .get_args()
                .map(|v| v.to_string_lossy().to_string())
                .collect();

            let out = self
                .outputs
                .pop_front()
                .expect(&format!("expected mock result for call {:?}", call));
            self.seen_calls.push_back(call);
            out
        }
    }

    const GIT_VERSION: &[u8] = b"git version 2.47.1\n";

    #[test]
    fn test_describe_tagged() {
        let r = MockGitRunner::new(vec![
            Ok(GIT_VERSION.to_vec()),
            Ok(b"v1.2.3-5-gabcdef0\n".to_vec()),
        ]);
        let mut d = GitDescriber::new(r, "git", None);
        assert_eq!(
            d.describe(),
            Outcome::Described("v1.2.3-5-gabcdef0".to_string())
        );

        let mut r = d.test_into_runner();
        assert_eq!(r.seen_calls.len(), 2);
        assert_eq!(
            r.seen_calls.pop_front().expect("expected a call"),
            vec!["--version"]
        );
        assert_eq!(
            r.seen_calls.pop_front().expect("expected a call"),
            vec!["describe", "--tags", "--always"]
        );
    }

    #[test]
    fn test_describe_in_repo() {
        let r = MockGitRunner::new(vec![Ok(GIT_VERSION.to_vec()), Ok(b"v2.0".to_vec())]);
        let mut d = GitDescriber::new(r, "git", Some(PathBuf::from("/src/fw")));
        assert_eq!(d.describe(), Outcome::Described("v2.0".to_string()));

        let mut r = d.test_into_runner();
        assert_eq!(
            r.seen_calls.pop_front().expect("expected a call"),
            vec!["-C", "/src/fw", "--version"]
        );
        assert_eq!(
            r.seen_calls.pop_front().expect("expected a call"),
            vec!["-C", "/src/fw", "describe", "--tags", "--always"]
        );
    }

    #[test]
    fn test_describe_not_a_repository_falls_back() {
        let r = MockGitRunner::new(vec![
            Ok(GIT_VERSION.to_vec()),
            Err(DescribeError::Execution {
                stderr: "fatal: not a git repository (or any of the parent directories): .git"
                    .to_string(),
                exit_code: 128,
            }),
        ]);
        let mut d = GitDescriber::new(r, "git", None);
        match d.describe() {
            Outcome::Fallback(DescribeError::Execution { exit_code, .. }) => {
                assert_eq!(exit_code, 128)
            }
            other => panic!("unexpected outcome {:?}", other),
        }

        // attempted exactly once
        let r = d.test_into_runner();
        assert_eq!(r.seen_calls.len(), 2);
    }

    fn git_in(dir: &Path, args: &[&str]) {
        let status = Command::new("git")
            .arg("-C")
            .arg(dir)
            .args([
                "-c",
                "user.name=Test",
                "-c",
                "user.email=test@example.com",
                "-c",
                "commit.gpgsign=false",
                "-c",
                "tag.gpgsign=false",
            ])
            .args(args)
            .status()
            .expect("cannot run git");
        assert!(status.success(), "git {:?} failed", args);
    }

    fn repo_with_commit() -> tempfile::TempDir {
        let dir = tempfile::tempdir().expect("cannot create temp dir");
        git_in(dir.path(), &["init", "-q"]);
        git_in(dir.path(), &["commit", "-q", "--allow-empty", "-m", "initial"]);
        dir
    }

    #[test]
    fn test_git_describe_untagged_repository() {
        let dir = repo_with_commit();
        let mut d = GitDescriber::new(GitCommandRunner {}, "git", Some(dir.path().to_path_buf()));
        let descriptor = match d.describe() {
            Outcome::Described(descriptor) => descriptor,
            other => panic!("unexpected outcome {:?}", other),
        };

        // bare abbreviated hash, passed through as the token
        assert!(descriptor.len() >= 7, "short descriptor {}", descriptor);
        assert!(descriptor.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(crate::version::hash_suffix(&descriptor), descriptor);
    }

    #[test]
    fn test_git_describe_tagged_repository() {
        let dir = repo_with_commit();
        git_in(dir.path(), &["tag", "v1.0.0"]);
        git_in(dir.path(), &["commit", "-q", "--allow-empty", "-m", "next"]);

        let mut d = GitDescriber::new(GitCommandRunner {}, "git", Some(dir.path().to_path_buf()));
        let descriptor = match d.describe() {
            Outcome::Described(descriptor) => descriptor,
            other => panic!("unexpected outcome {:?}", other),
        };

        assert!(descriptor.starts_with("v1.0.0-1-g"), "got {}", descriptor);
        let token = crate::version::hash_suffix(&descriptor);
        assert_eq!(token, &descriptor["v1.0.0-1-".len()..]);
        assert!(token.starts_with('g'));
    }

    #[test]
    fn test_describe_git_missing() {
        let r = MockGitRunner::new(vec![Err(DescribeError::Start(io::Error::new(
            io::ErrorKind::NotFound,
            "no such file",
        )))]);
        let mut d = GitDescriber::new(r, "git", None);
        match d.describe() {
            Outcome::Fallback(DescribeError::Unavailable(_)) => {}
            other => panic!("unexpected outcome {:?}", other),
        }

        // describe is not attempted without git
        let r = d.test_into_runner();
        assert_eq!(r.seen_calls.len(), 1);
    }

    #[test]
    fn test_describe_bad_output() {
        let r = MockGitRunner::new(vec![Ok(GIT_VERSION.to_vec()), Ok(vec![0xff, 0xfe])]);
        let mut d = GitDescriber::new(r, "git", None);
        assert_eq!(d.describe(), Outcome::Fallback(DescribeError::Encoding));

        let r = MockGitRunner::new(vec![Ok(GIT_VERSION.to_vec()), Ok(b"  \n".to_vec())]);
        let mut d = GitDescriber::new(r, "git", None);
        assert_eq!(d.describe(), Outcome::Fallback(DescribeError::Empty));
    }

    #[test]
    fn test_builder_program() {
        let GitCommand(cmd) = GitCommandBuilder::new("/usr/local/bin/git")
            .args(&["describe", "--tags"])
            .build();
        assert_eq!(cmd.get_program(), "/usr/local/bin/git");
    }
}
