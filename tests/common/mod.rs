// Common test utilities and fixtures

pub mod fixtures;

#[allow(unused_imports)]
pub use fixtures::{commit_files, create_branch, test_env, TestEnv};
