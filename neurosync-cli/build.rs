use std::process::Command;

fn git_describe(root: &str) -> Option<String> {
    let out = Command::new("git")
        .args(["-C", root, "describe", "--always", "--dirty", "--abbrev=8"])
        .output()
        .ok()?;
    if !out.status.success() {
        return None;
    }
    let s = String::from_utf8_lossy(&out.stdout).trim().to_string();
    (!s.is_empty()).then_some(s)
}

fn main() {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string());
    let sha = git_describe(&format!("{manifest_dir}/..")).unwrap_or_else(|| "unknown".to_string());

    println!("cargo:rustc-env=NEUROSYNC_BUILD_SHA={sha}");
    println!("cargo:rerun-if-changed=../.git/HEAD");
}
