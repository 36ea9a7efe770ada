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

use std::process::Command;

/// Short commit hash of the checkout, if building from git
fn git_commit() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short=12", "HEAD"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let commit = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!commit.is_empty()).then_some(commit)
}

fn main() {
    if std::env::var("STOOLAP_EVAL_GIT_COMMIT").is_err() {
        if let Some(commit) = git_commit() {
            println!("cargo:rustc-env=STOOLAP_EVAL_GIT_COMMIT={}", commit);
        }
    }
    if let Ok(profile) = std::env::var("PROFILE") {
        println!("cargo:rustc-env=STOOLAP_EVAL_PROFILE={}", profile);
    }

    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/heads/");
    println!("cargo:rerun-if-env-changed=STOOLAP_EVAL_GIT_COMMIT");
}
