use anyhow::{anyhow, Context, Result};
use clap::Parser;
use serde::Serialize;
use sim_harness::backend::{CommandBackend, TestStatus};
use sim_harness::cli::{Command, ConfigArgs, EncodeArgs, FilesArgs, InitArgs, RootArgs, RunArgs};
use sim_harness::config::{self, RunConfig};
use sim_harness::orchestrator::{Project, RunSummary};
use sim_harness::util::display_path;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let args = RootArgs::parse();
    init_tracing(args.verbose);

    match args.command {
        Command::Init(args) => cmd_init(&args),
        Command::Files(args) => cmd_files(&args),
        Command::Encode(args) => cmd_encode(&args),
        Command::Run(args) => {
            let code = cmd_run(&args)?;
            if code != 0 {
                std::process::exit(code);
            }
            Ok(())
        }
    }
}

/// Logs go to stderr; `RUST_LOG` takes precedence over `--verbose`.
fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn cmd_init(args: &InitArgs) -> Result<()> {
    if args.config.exists() && !args.force {
        return Err(anyhow!(
            "{} already exists (use --force to overwrite)",
            args.config.display()
        ));
    }
    config::write_config(&args.config, &config::default_config())?;
    println!("Wrote run configuration to {}", args.config.display());
    Ok(())
}

fn cmd_files(args: &FilesArgs) -> Result<()> {
    let (_, project) = load_project(&args.config)?;
    if args.json {
        return print_json(project.libraries());
    }
    let root = args.config.source_root();
    for library in project.libraries().iter() {
        for entry in library.sources() {
            println!(
                "{}: {}",
                library.name(),
                display_path(entry.location(), Some(root.as_path()))
            );
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct EncodeRow {
    test_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    generics: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn cmd_encode(args: &EncodeArgs) -> Result<()> {
    let (_, project) = load_project(&args.config)?;
    let mut rows = Vec::new();
    for test in project.tests() {
        let row = match test.encode(project.policy()) {
            Ok(encoded) => EncodeRow {
                test_id: test.id().to_string(),
                generics: Some(encoded.into_string()),
                error: None,
            },
            Err(err) => EncodeRow {
                test_id: test.id().to_string(),
                generics: None,
                error: Some(err.to_string()),
            },
        };
        rows.push(row);
    }

    if args.json {
        print_json(&rows)?;
    } else {
        for row in &rows {
            match (&row.generics, &row.error) {
                (Some(generics), _) => println!("{}\t{generics}", row.test_id),
                (None, Some(error)) => eprintln!("{}\terror: {error}", row.test_id),
                (None, None) => {}
            }
        }
    }

    let failures = rows.iter().filter(|row| row.error.is_some()).count();
    if failures > 0 {
        return Err(anyhow!("{failures} test configuration(s) could not be encoded"));
    }
    Ok(())
}

fn cmd_run(args: &RunArgs) -> Result<i32> {
    let (config, project) = load_project(&args.config)?;
    let tests = project.select(&args.patterns)?;

    if args.list {
        for test in &tests {
            println!("{}", test.id());
        }
        return Ok(0);
    }
    if tests.is_empty() {
        eprintln!("No tests selected.");
        return Ok(0);
    }

    let (command, env) = match (&args.backend, config.backend) {
        (Some(command), backend) => (
            command.clone(),
            backend.map(|backend| backend.env).unwrap_or_default(),
        ),
        (None, Some(backend)) => (backend.command, backend.env),
        (None, None) => {
            return Err(anyhow!(
                "no backend command configured (set backend.command or pass --backend)"
            ))
        }
    };
    let root = args.config.source_root();
    let backend = CommandBackend::from_command(&command, &root)?
        .with_args(args.backend_args.iter().cloned())
        .with_env(env);
    tracing::info!(
        program = %backend.program().display(),
        tests = tests.len(),
        "starting run"
    );

    let summary = project
        .run(&tests, &backend)
        .context("run tests through backend")?;
    if args.json {
        print_json(&summary)?;
    } else {
        print_summary(&summary);
    }
    Ok(summary.exit_code())
}

fn load_project(args: &ConfigArgs) -> Result<(RunConfig, Project)> {
    let config = config::load_config(&args.config)?;
    config::validate_config(&config)
        .with_context(|| format!("validate {}", args.config.display()))?;
    let root = args.source_root();
    let project = Project::assemble(&config, &root)
        .with_context(|| format!("assemble libraries under {}", display_path(&root, None)))?;
    Ok((config, project))
}

fn print_summary(summary: &RunSummary) {
    for outcome in &summary.outcomes {
        let detail = match &outcome.status {
            TestStatus::Passed => String::new(),
            TestStatus::Failed {
                exit_code: Some(code),
            } => format!(" (exit {code})"),
            TestStatus::Failed { exit_code: None } => " (terminated by signal)".to_string(),
            TestStatus::Errored { reason } => format!(" ({reason})"),
        };
        println!(
            "{} {} ({} ms){detail}",
            outcome.status.label(),
            outcome.test_id,
            outcome.duration_ms
        );
    }
    println!(
        "{} of {} tests passed",
        summary.passed(),
        summary.outcomes.len()
    );
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}
