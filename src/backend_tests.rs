use super::*;
use crate::generics::GenericConfig;
use crate::library::LibraryRegistry;
use crate::options::SimOptions;
use std::fs;

struct Fixture {
    dir: tempfile::TempDir,
    libraries: LibrarySet,
    options: FrozenOptions,
    generics: EncodedGeneric,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        fs::write(dir.path().join("tb_top.vhd"), b"-- tb\n").expect("write source");
        let mut registry = LibraryRegistry::new(dir.path());
        registry.add_files("lib", "*.vhd").expect("add sources");
        registry.add_library("fmf").expect("add vendor library");

        let mut options = SimOptions::new();
        options.set_option("disable_ieee_warnings", 1);

        let generics = GenericConfig::from_pairs([("width", 8)])
            .expect("build generics")
            .encode()
            .expect("encode");

        Self {
            dir,
            libraries: registry.freeze(),
            options: options.freeze(),
            generics,
        }
    }

    fn invocation(&self) -> TestInvocation<'_> {
        TestInvocation {
            test_id: "lib.tb_top.default",
            libraries: &self.libraries,
            options: &self.options,
            generics: &self.generics,
        }
    }
}

fn shell_available() -> bool {
    which::which("sh").is_ok()
}

#[test]
fn manifest_lists_libraries_options_and_generics() {
    let fixture = Fixture::new();
    let manifest = serde_json::to_value(fixture.invocation().manifest()).expect("serialize");

    assert_eq!(manifest["schema_version"], MANIFEST_SCHEMA_VERSION);
    assert_eq!(manifest["test_id"], "lib.tb_top.default");
    assert_eq!(manifest["generics"], "width:8");
    assert_eq!(manifest["sim_options"]["disable_ieee_warnings"], 1);
    assert_eq!(manifest["libraries"][0]["name"], "lib");
    assert_eq!(manifest["libraries"][0]["sources"][0]["kind"], "vhdl");
    assert_eq!(manifest["libraries"][1]["name"], "fmf");
    assert_eq!(
        manifest["libraries"][1]["sources"]
            .as_array()
            .expect("sources array")
            .len(),
        0
    );
}

#[test]
fn unknown_program_is_an_invocation_error() {
    let fixture = Fixture::new();
    let err = CommandBackend::from_command("simh-no-such-backend-binary --flag", fixture.dir.path())
        .expect_err("program should not resolve");
    assert!(matches!(err, HarnessError::BackendInvocation { .. }));
    assert!(err.aborts_run());
}

#[test]
fn empty_command_is_an_invocation_error() {
    let err = CommandBackend::from_command("", Path::new(".")).expect_err("empty");
    assert!(matches!(err, HarnessError::BackendInvocation { .. }));
}

#[test]
fn placeholders_are_substituted() {
    if !shell_available() {
        return;
    }
    let fixture = Fixture::new();
    let backend = CommandBackend::from_command("sh run.sh --test={test}", fixture.dir.path())
        .expect("resolve sh")
        .with_args(["-g".to_string(), "{generics}".to_string(), "{manifest}".to_string()]);

    let args = backend.render_args(Path::new("/tmp/m.json"), &fixture.invocation());
    assert_eq!(
        args,
        vec![
            "run.sh",
            "--test=lib.tb_top.default",
            "-g",
            "width:8",
            "/tmp/m.json"
        ]
    );
}

#[test]
fn backend_receives_environment_and_exit_code_passes_through() {
    if !shell_available() {
        return;
    }
    let fixture = Fixture::new();
    let script = r#"sh -c 'printf "%s|%s|%s" "$SIMH_TEST_ID" "$SIMH_GENERICS" "$EXTRA" > seen.txt; cp "$SIMH_MANIFEST" manifest.json; exit 3'"#;
    let backend = CommandBackend::from_command(script, fixture.dir.path())
        .expect("resolve sh")
        .with_env(BTreeMap::from([("EXTRA".to_string(), "yes".to_string())]));

    let status = backend.run(&fixture.invocation()).expect("backend starts");

    assert_eq!(status, TestStatus::Failed { exit_code: Some(3) });
    let seen = fs::read_to_string(fixture.dir.path().join("seen.txt")).expect("read seen");
    assert_eq!(seen, "lib.tb_top.default|width:8|yes");
    let manifest: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(fixture.dir.path().join("manifest.json")).expect("read manifest"),
    )
    .expect("parse manifest");
    assert_eq!(manifest["generics"], "width:8");
}

#[test]
fn zero_exit_is_a_pass() {
    if !shell_available() {
        return;
    }
    let fixture = Fixture::new();
    let backend = CommandBackend::from_command("sh -c 'exit 0'", fixture.dir.path())
        .expect("resolve sh");
    assert_eq!(
        backend.run(&fixture.invocation()).expect("run"),
        TestStatus::Passed
    );
}
