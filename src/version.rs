// Copyright 2025 Stoolap Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Version information
//!
//! `VERSION()` reports the MySQL release whose semantics the evaluator
//! follows, suffixed with this crate's own version.

use std::sync::OnceLock;

/// MySQL release the evaluator tracks
pub const MYSQL_VERSION: &str = "8.0.36";

/// Crate version (e.g., "0.1.0")
pub const CRATE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Git commit hash at build time
/// Set via STOOLAP_EVAL_GIT_COMMIT environment variable during compilation
pub const GIT_COMMIT: &str = match option_env!("STOOLAP_EVAL_GIT_COMMIT") {
    Some(commit) => commit,
    None => "unknown",
};

/// Cargo profile the crate was built with
pub const BUILD_PROFILE: &str = match option_env!("STOOLAP_EVAL_PROFILE") {
    Some(profile) => profile,
    None => "unknown",
};

static SERVER_VERSION: OnceLock<String> = OnceLock::new();

/// String returned by `VERSION()`, e.g. `8.0.36-stoolap-eval-0.1.0`
pub fn server_version() -> &'static str {
    SERVER_VERSION.get_or_init(|| format!("{}-stoolap-eval-{}", MYSQL_VERSION, CRATE_VERSION))
}

/// Returns version info as a formatted string
pub fn version_info() -> String {
    format!(
        "stoolap-eval {} (mysql {}, commit: {}, profile: {})",
        CRATE_VERSION, MYSQL_VERSION, GIT_COMMIT, BUILD_PROFILE
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_version() {
        let v = server_version();
        assert!(v.starts_with("8.0."));
        assert!(v.ends_with(CRATE_VERSION));
    }

    #[test]
    fn test_version_info() {
        let info = version_info();
        assert!(info.starts_with("stoolap-eval "));
        assert!(info.contains(GIT_COMMIT));
    }
}
