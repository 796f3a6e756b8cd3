//! Shared test infrastructure for integration tests.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// A scratch project laid out like a simulation directory next to shared
/// sources and a vendor model library.
pub struct Project {
    pub dir: TempDir,
}

impl Project {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let project = Self { dir };
        for rel in [
            "sim/tb_top.vhd",
            "sim/tb_psram.vhd",
            "src/common/T65/T65.vhd",
            "src/common/T65/T65_ALU.vhd",
            "src/common/m6522.vhd",
            "library/s27kl0642/s27kl0642.v",
            "library/fmf/gen_utils.vhd",
            "library/fmf/conversions.vhd",
        ] {
            project.write(rel, "-- stub\n");
        }
        project
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn sim_dir(&self) -> PathBuf {
        self.root().join("sim")
    }

    pub fn config_path(&self) -> PathBuf {
        self.sim_dir().join("simh.json")
    }

    pub fn write(&self, rel: &str, contents: &str) {
        let path = self.root().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent directory");
        }
        std::fs::write(path, contents.as_bytes()).expect("write file");
    }

    pub fn write_config(&self, text: &str) {
        std::fs::write(self.config_path(), text).expect("write config");
    }

    /// Run `simh <args...> --config sim/simh.json`.
    pub fn simh(&self, subcommand: &str, extra: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_simh"))
            .arg(subcommand)
            .arg("--config")
            .arg(self.config_path())
            .args(extra)
            .env_remove("RUST_LOG")
            .output()
            .expect("run simh")
    }
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

pub fn shell_available() -> bool {
    which::which("sh").is_ok()
}
