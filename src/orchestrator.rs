//! Run orchestration.
//!
//! Setup turns a [`RunConfig`] into a frozen [`Project`]; the orchestrator
//! then hands each selected test to a [`Backend`] and collects results
//! without reinterpreting them.
use crate::backend::{Backend, TestInvocation, TestStatus};
use crate::config::RunConfig;
use crate::error::Result;
use crate::generics::{encode, DelimiterPolicy, EncodedGeneric, GenericConfig};
use crate::library::{normalize_library_name, LibraryRegistry, LibrarySet};
use crate::options::{FrozenOptions, SimOptions};
use crate::pattern::Wildcard;
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use std::time::Instant;

/// One testbench run with one generic configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct TestCase {
    id: String,
    generics: Vec<(String, Value)>,
}

impl TestCase {
    /// Identifier of the form `library.testbench[.config]`.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Encode this test's generics under `policy`.
    pub fn encode(&self, policy: DelimiterPolicy) -> Result<EncodedGeneric> {
        let config = GenericConfig::from_json_pairs(&self.generics)?;
        encode(&config, policy)
    }
}

/// Frozen libraries, options, and planned tests.
#[derive(Debug, Clone)]
pub struct Project {
    libraries: LibrarySet,
    options: FrozenOptions,
    tests: Vec<TestCase>,
    policy: DelimiterPolicy,
}

impl Project {
    /// Assemble libraries and options from `config`, resolving sources
    /// against `root`. Any resolution error aborts setup.
    pub fn assemble(config: &RunConfig, root: &Path) -> Result<Self> {
        let mut registry = LibraryRegistry::new(root);
        for library in &config.libraries {
            registry.add_library(&library.name)?;
            for location in &library.sources {
                registry.add_files(&library.name, location)?;
            }
        }

        let mut options = SimOptions::new();
        for (name, value) in &config.sim_options {
            options.set_option(name.clone(), value.clone());
        }

        let tests = plan_tests(config)?;
        tracing::info!(
            libraries = registry.libraries().len(),
            options = options.get_options().len(),
            tests = tests.len(),
            "project assembled"
        );

        let policy = if config.strict_generics {
            DelimiterPolicy::Reject
        } else {
            DelimiterPolicy::Verbatim
        };
        Ok(Self {
            libraries: registry.freeze(),
            options: options.freeze(),
            tests,
            policy,
        })
    }

    pub fn libraries(&self) -> &LibrarySet {
        &self.libraries
    }

    pub fn options(&self) -> &FrozenOptions {
        &self.options
    }

    pub fn tests(&self) -> &[TestCase] {
        &self.tests
    }

    pub fn policy(&self) -> DelimiterPolicy {
        self.policy
    }

    /// Tests whose id matches any of `patterns`; all tests when empty.
    pub fn select(&self, patterns: &[String]) -> Result<Vec<&TestCase>> {
        if patterns.is_empty() {
            return Ok(self.tests.iter().collect());
        }
        let wildcards = patterns
            .iter()
            .map(|pattern| Wildcard::identifier(pattern))
            .collect::<Result<Vec<_>>>()?;
        Ok(self
            .tests
            .iter()
            .filter(|test| wildcards.iter().any(|wildcard| wildcard.is_match(&test.id)))
            .collect())
    }

    /// Run `tests` one at a time through `backend`.
    ///
    /// A test whose generics cannot be encoded is recorded as errored and
    /// its siblings still run. A backend that cannot be started aborts the
    /// whole run.
    pub fn run(&self, tests: &[&TestCase], backend: &dyn Backend) -> Result<RunSummary> {
        let mut outcomes = Vec::with_capacity(tests.len());
        for test in tests {
            let start = Instant::now();
            let status = match test.encode(self.policy) {
                Ok(generics) => {
                    let invocation = TestInvocation {
                        test_id: &test.id,
                        libraries: &self.libraries,
                        options: &self.options,
                        generics: &generics,
                    };
                    match backend.run(&invocation) {
                        Ok(status) => status,
                        Err(err) if err.aborts_run() => return Err(err),
                        Err(err) => TestStatus::Errored {
                            reason: err.to_string(),
                        },
                    }
                }
                Err(err) => {
                    tracing::warn!(test = %test.id, error = %err, "test configuration not encodable");
                    TestStatus::Errored {
                        reason: err.to_string(),
                    }
                }
            };
            outcomes.push(TestOutcome {
                test_id: test.id.clone(),
                status,
                duration_ms: start.elapsed().as_millis(),
            });
        }
        Ok(RunSummary { outcomes })
    }
}

/// Expand testbenches into test cases in declaration order.
///
/// A testbench without configurations runs once with no generics.
pub fn plan_tests(config: &RunConfig) -> Result<Vec<TestCase>> {
    let mut tests = Vec::new();
    for testbench in &config.testbenches {
        let library = normalize_library_name(&testbench.library)?;
        let base = format!("{library}.{}", testbench.name);
        if testbench.configs.is_empty() {
            tests.push(TestCase {
                id: base,
                generics: Vec::new(),
            });
            continue;
        }
        for test_config in &testbench.configs {
            tests.push(TestCase {
                id: format!("{base}.{}", test_config.name),
                generics: test_config.generics.pairs().to_vec(),
            });
        }
    }
    Ok(tests)
}

/// Result of one test as reported by the backend.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct TestOutcome {
    pub test_id: String,
    #[serde(flatten)]
    pub status: TestStatus,
    pub duration_ms: u128,
}

/// Per-test outcomes of one run, in execution order.
#[derive(Debug, Serialize, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub outcomes: Vec<TestOutcome>,
}

impl RunSummary {
    pub fn passed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.status.is_pass())
            .count()
    }

    pub fn not_passed(&self) -> usize {
        self.outcomes.len() - self.passed()
    }

    /// Process exit status for this run.
    ///
    /// Zero when every test passed; otherwise the first non-passing test's
    /// backend exit code, or 1 when it has none.
    pub fn exit_code(&self) -> i32 {
        self.outcomes
            .iter()
            .find_map(|outcome| match &outcome.status {
                TestStatus::Passed => None,
                TestStatus::Failed {
                    exit_code: Some(code),
                } if *code != 0 => Some(*code),
                TestStatus::Failed { .. } | TestStatus::Errored { .. } => Some(1),
            })
            .unwrap_or(0)
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
