//! Test support utilities for rigger integration tests.
//!
//! Provides isolated project directories, command helpers, in-process
//! stage fakes and fixtures.

#![allow(dead_code)]

pub mod assertions;
pub mod commands;
pub mod fakes;
pub mod fixtures;
pub mod skip;

#[allow(unused_imports)]
pub use assertions::*;
#[allow(unused_imports)]
pub use fakes::*;
#[allow(unused_imports)]
pub use fixtures::*;

use std::path::PathBuf;

use tempfile::TempDir;

use rigger::core::config::Settings;
use rigger::core::resolver::{resolve, Resolved};

/// A throwaway project root.
///
/// Starts with `infrastructure/environments/dev.tfvars`. Child processes
/// run with `.current_dir()` so tests can run in parallel.
pub struct Test {
    pub dir: TempDir,
}

impl Test {
    /// Project with only the dev environment.
    pub fn new() -> Self {
        let t = Self::empty();
        t.write_vars("dev", DEV_TFVARS);
        t
    }

    /// Project with no variable sets at all.
    pub fn empty() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        std::fs::create_dir_all(dir.path().join("infrastructure/environments"))
            .expect("failed to create environments dir");
        Self { dir }
    }

    /// Project with every declared environment.
    pub fn all_envs() -> Self {
        let t = Self::new();
        t.write_vars("staging", STAGING_TFVARS);
        t.write_vars("prod", PROD_TFVARS);
        t
    }

    pub fn write_vars(&self, env: &str, contents: &str) {
        std::fs::write(self.vars_path(env), contents).expect("failed to write tfvars");
    }

    pub fn vars_path(&self, env: &str) -> PathBuf {
        self.dir
            .path()
            .join("infrastructure/environments")
            .join(format!("{}.tfvars", env))
    }

    pub fn write_config(&self, contents: &str) {
        std::fs::write(self.dir.path().join("rigger.toml"), contents)
            .expect("failed to write rigger.toml");
    }

    pub fn settings(&self) -> Settings {
        Settings::load(self.dir.path()).expect("failed to load settings")
    }

    /// Resolve in-process, as the CLI would.
    pub fn resolve(&self, project: &str, env: &str) -> Resolved {
        resolve(&self.settings(), project, env).expect("failed to resolve")
    }

    pub fn state_dir(&self) -> PathBuf {
        self.dir.path().join(".rigger")
    }
}
