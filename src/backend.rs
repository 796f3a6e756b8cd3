//! Boundary to the external simulation backend.
//!
//! Each test is one self-contained invocation: the frozen libraries, the
//! frozen simulator options, and the test's encoded generic string. What the
//! backend does with them, including pass/fail semantics, is opaque here.
use crate::error::{HarnessError, Result};
use crate::generics::EncodedGeneric;
use crate::library::{Library, LibrarySet};
use crate::options::FrozenOptions;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Instant;

pub const MANIFEST_SCHEMA_VERSION: u32 = 1;

pub const ENV_MANIFEST: &str = "SIMH_MANIFEST";
pub const ENV_TEST_ID: &str = "SIMH_TEST_ID";
pub const ENV_GENERICS: &str = "SIMH_GENERICS";

const PLACEHOLDER_MANIFEST: &str = "{manifest}";
const PLACEHOLDER_TEST: &str = "{test}";
const PLACEHOLDER_GENERICS: &str = "{generics}";

/// Everything one backend invocation receives.
#[derive(Debug, Clone, Copy)]
pub struct TestInvocation<'a> {
    pub test_id: &'a str,
    pub libraries: &'a LibrarySet,
    pub options: &'a FrozenOptions,
    pub generics: &'a EncodedGeneric,
}

impl TestInvocation<'_> {
    /// Render the JSON manifest describing this invocation.
    pub fn manifest(&self) -> Manifest<'_> {
        Manifest {
            schema_version: MANIFEST_SCHEMA_VERSION,
            test_id: self.test_id,
            generics: self.generics,
            sim_options: self.options,
            libraries: self.libraries.iter().collect(),
        }
    }
}

/// On-disk form of a [`TestInvocation`].
#[derive(Debug, Serialize)]
pub struct Manifest<'a> {
    pub schema_version: u32,
    pub test_id: &'a str,
    pub generics: &'a EncodedGeneric,
    pub sim_options: &'a FrozenOptions,
    pub libraries: Vec<&'a Library>,
}

/// Result reported by the backend for one test.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TestStatus {
    Passed,
    /// The backend ran the test and reported failure; `exit_code` is absent
    /// when the backend was terminated by a signal.
    Failed { exit_code: Option<i32> },
    /// The harness could not prepare this test (for example, its generics
    /// could not be encoded); the backend was not invoked.
    Errored { reason: String },
}

impl TestStatus {
    pub fn is_pass(&self) -> bool {
        matches!(self, TestStatus::Passed)
    }

    pub fn label(&self) -> &'static str {
        match self {
            TestStatus::Passed => "pass",
            TestStatus::Failed { .. } => "fail",
            TestStatus::Errored { .. } => "error",
        }
    }
}

/// Seam between the orchestrator and whatever executes tests.
pub trait Backend {
    /// Run one test. Errors mean the backend could not be started; a test
    /// that runs and fails is `Ok(TestStatus::Failed { .. })`.
    fn run(&self, invocation: &TestInvocation<'_>) -> Result<TestStatus>;
}

/// Backend that spawns an external command once per test.
#[derive(Debug, Clone)]
pub struct CommandBackend {
    program: PathBuf,
    args: Vec<String>,
    env: BTreeMap<String, String>,
    cwd: PathBuf,
}

impl CommandBackend {
    /// Parse a shell-style command line and resolve its program.
    ///
    /// Programs containing a path separator resolve against `cwd`; bare
    /// names are looked up on `PATH`.
    pub fn from_command(command: &str, cwd: &Path) -> Result<Self> {
        let words = shell_words::split(command)
            .map_err(|err| HarnessError::backend(command, format!("parse command: {err}")))?;
        let Some((program, args)) = words.split_first() else {
            return Err(HarnessError::backend(command, "command is empty"));
        };
        let resolved = which::which_in(program, std::env::var_os("PATH"), cwd)
            .map_err(|err| HarnessError::backend(program, err.to_string()))?;
        tracing::debug!(program = %resolved.display(), "backend resolved");
        Ok(Self {
            program: resolved,
            args: args.to_vec(),
            env: BTreeMap::new(),
            cwd: cwd.to_path_buf(),
        })
    }

    /// Append arguments after the configured command words.
    pub fn with_args(mut self, args: impl IntoIterator<Item = String>) -> Self {
        self.args.extend(args);
        self
    }

    /// Add environment variables for every invocation.
    pub fn with_env(mut self, env: BTreeMap<String, String>) -> Self {
        self.env.extend(env);
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Arguments for one invocation with placeholders substituted.
    pub fn render_args(&self, manifest: &Path, invocation: &TestInvocation<'_>) -> Vec<String> {
        let manifest = manifest.display().to_string();
        self.args
            .iter()
            .map(|arg| {
                arg.replace(PLACEHOLDER_MANIFEST, &manifest)
                    .replace(PLACEHOLDER_TEST, invocation.test_id)
                    .replace(PLACEHOLDER_GENERICS, invocation.generics.as_str())
            })
            .collect()
    }

    fn program_label(&self) -> String {
        self.program.display().to_string()
    }

    fn write_manifest(&self, invocation: &TestInvocation<'_>) -> Result<tempfile::NamedTempFile> {
        let fail = |detail: String| HarnessError::backend(&self.program_label(), detail);
        let mut file = tempfile::Builder::new()
            .prefix("simh-manifest-")
            .suffix(".json")
            .tempfile()
            .map_err(|err| fail(format!("create manifest: {err}")))?;
        serde_json::to_writer_pretty(&mut file, &invocation.manifest())
            .map_err(|err| fail(format!("write manifest: {err}")))?;
        file.flush()
            .map_err(|err| fail(format!("flush manifest: {err}")))?;
        Ok(file)
    }
}

impl Backend for CommandBackend {
    fn run(&self, invocation: &TestInvocation<'_>) -> Result<TestStatus> {
        let manifest = self.write_manifest(invocation)?;
        let args = self.render_args(manifest.path(), invocation);

        let start = Instant::now();
        let status = Command::new(&self.program)
            .args(args)
            .current_dir(&self.cwd)
            .envs(&self.env)
            .env(ENV_MANIFEST, manifest.path())
            .env(ENV_TEST_ID, invocation.test_id)
            .env(ENV_GENERICS, invocation.generics.as_str())
            .status()
            .map_err(|err| HarnessError::backend(&self.program_label(), format!("spawn: {err}")))?;
        let elapsed_ms = start.elapsed().as_millis();

        tracing::info!(
            test = invocation.test_id,
            elapsed_ms,
            exit_code = status.code(),
            "backend invocation complete"
        );

        if status.success() {
            Ok(TestStatus::Passed)
        } else {
            Ok(TestStatus::Failed {
                exit_code: status.code(),
            })
        }
    }
}

#[cfg(test)]
#[path = "backend_tests.rs"]
mod tests;
