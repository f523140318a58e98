use std::process::Command;

fn main() {
    println!("cargo:rerun-if-env-changed=TARGET");
    if let Ok(target) = std::env::var("TARGET") {
        println!("cargo:rustc-env=FRAMECAST_BUILD_TARGET={target}");
    }

    // Source tarballs have no git metadata; the version command falls back to "unknown".
    println!("cargo:rerun-if-changed=../../.git/HEAD");
    let hash = Command::new("git")
        .args(["rev-parse", "--short=12", "HEAD"])
        .output()
        .ok()
        .filter(|out| out.status.success())
        .and_then(|out| String::from_utf8(out.stdout).ok())
        .map(|hash| hash.trim().to_string())
        .filter(|hash| !hash.is_empty());
    if let Some(hash) = hash {
        println!("cargo:rustc-env=FRAMECAST_GIT_HASH={hash}");
    }
}
