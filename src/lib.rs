//! Interactive Linux workstation provisioner.
//!
//! Resolves the privilege mode and the target distribution (Ubuntu, Fedora or
//! Arch), then offers an ordered list of optional steps: package installs,
//! login shell, PATH setup, an editor built from source, its configuration,
//! git identity and a shell framework.  The first failing step ends the run.
//!
//! The public API is organised into layers:
//!
//! - **[`platform`]** and **[`privilege`]**: per-run facts resolved once
//! - **[`config`]**: settings with compiled defaults and a TOML override
//! - **[`resources`]**: idempotent `check + apply` primitives
//! - **[`steps`]**: the ordered step table and its runner
//! - **[`commands`]**: top-level orchestration
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod exec;
pub mod fetch;
pub mod logging;
pub mod platform;
pub mod privilege;
pub mod prompt;
pub mod resources;
pub mod steps;
