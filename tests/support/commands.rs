//! Command helper methods for Test.

use super::Test;
use assert_cmd::Command;
use std::process::Output;

impl Test {
    /// Create a rigger command running in the test project.
    ///
    /// Ambient `ENVIRONMENT`, `PROJECT_NAME` and `RIGGER_LOG` are cleared so
    /// the developer's shell cannot leak into tests; color is off.
    pub fn cmd(&self) -> Command {
        #[allow(deprecated)]
        let mut cmd = Command::cargo_bin("rigger").expect("failed to find rigger binary");
        cmd.current_dir(self.dir.path());
        cmd.env_remove("ENVIRONMENT");
        cmd.env_remove("PROJECT_NAME");
        cmd.env_remove("RIGGER_LOG");
        cmd.env("NO_COLOR", "1");
        cmd
    }

    /// Shortcut for `rigger config`.
    pub fn config(&self, args: &[&str]) -> Output {
        self.cmd()
            .args(args)
            .arg("config")
            .output()
            .expect("failed to run rigger config")
    }

    /// Shortcut for `rigger config --json`, parsed.
    pub fn config_json(&self, args: &[&str]) -> serde_json::Value {
        let output = self
            .cmd()
            .args(args)
            .args(["config", "--json"])
            .output()
            .expect("failed to run rigger config --json");
        super::assert_success(&output);
        serde_json::from_slice(&output.stdout).expect("config --json is not JSON")
    }
}
