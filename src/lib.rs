//! Rigger - deploy and tear down the chatbot platform.
//!
//! One `(project, environment)` at a time: Terraform infrastructure, a
//! published parameter tree, then the SAM application. Teardown runs in
//! reverse and empties versioned buckets before Terraform removes them.
//!
//! # Architecture
//!
//! ```text
//! src/
//! ├── cli/              # Command-line interface
//! │   ├── deploy        # deploy, deploy-infra, deploy-app
//! │   ├── destroy       # destroy, cleanup
//! │   ├── status        # What exists in AWS
//! │   ├── config        # Resolved configuration
//! │   └── completions   # Shell completions
//! └── core/             # Core library components
//!     ├── config        # rigger.toml
//!     ├── domain/       # Environments, naming, schema, variable sets
//!     ├── resolver      # (project, env) -> Resolved
//!     ├── runner        # External tool execution
//!     ├── stage/        # Terraform and SAM drivers
//!     ├── store/        # SSM, Secrets Manager, S3, CloudFormation
//!     ├── publisher     # Outputs -> parameters + secret
//!     ├── cleanup       # Versioned bucket emptying
//!     ├── sequencer     # Step plans and preconditions
//!     └── lock          # Per-environment run lock
//! ```
//!
//! # Features
//!
//! - Repeatable: every step is safe to re-run, "already absent" is success
//! - Strict bucket pattern; nothing outside it is ever deleted
//! - Dry-run teardown
//! - All AWS access behind traits, with in-memory stores for tests

pub mod cli;
pub mod core;
pub mod error;
