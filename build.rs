use std::env;
use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=.git/HEAD");

    let hash = capture("git", &["rev-parse", "--short", "HEAD"])
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "unknown".to_string());
    let status = match capture("git", &["status", "--porcelain"]) {
        Some(out) if out.is_empty() => "clean",
        Some(_) => "dirty",
        None => "unknown",
    };
    let built_at = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
    let target = env::var("TARGET").unwrap_or_else(|_| "unknown-target".to_string());
    let rustc = capture("rustc", &["--version"]).unwrap_or_else(|| "unknown".to_string());

    println!("cargo:rustc-env=STARJAR_BUILD_HASH={hash}");
    println!("cargo:rustc-env=STARJAR_BUILD_STATUS={status}");
    println!("cargo:rustc-env=STARJAR_BUILD_TIMESTAMP={built_at}");
    println!("cargo:rustc-env=STARJAR_BUILD_TARGET={target}");
    println!("cargo:rustc-env=STARJAR_BUILD_RUSTC={rustc}");
}

/// Runs a tool and returns its trimmed stdout, or `None` when it is missing or fails.
fn capture(program: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(program).args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8(output.stdout)
        .ok()
        .map(|s| s.trim().to_string())
}
