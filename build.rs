/// Build script for incline-sim
/// Embeds the commit and build time shown by `incline-sim --version`

fn main() {
    println!("cargo:rerun-if-changed=Cargo.toml");
    println!("cargo:rerun-if-changed=Cargo.lock");

    // Outside a git checkout the hash is reported as "unknown".
    let hash = std::process::Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|hash| hash.trim().to_string())
        .filter(|hash| !hash.is_empty())
        .unwrap_or_else(|| "unknown".to_string());
    println!("cargo:rustc-env=INCLINE_SIM_GIT_HASH={hash}");

    println!(
        "cargo:rustc-env=INCLINE_SIM_BUILD_TIMESTAMP={}",
        unix_timestamp()
    );
}

/// Seconds since the Unix epoch, without an external crate
fn unix_timestamp() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    format!("{secs}")
}
