use std::env;
use std::process::Command;

// First stable release exposing the AVX-512 intrinsics in `std::arch`.
const AVX512_STABLE_MINOR: u32 = 89;

/// Version information of the compiler driving this build.
#[derive(Debug, PartialEq, Eq)]
struct RustcVersion {
    minor: u32,
}

impl RustcVersion {
    // Parses the first line of `rustc --version`, e.g. `rustc 1.89.0 (29483883e 2025-08-04)`
    // or `rustc 1.91.0-nightly (...)`.
    fn parse(version_info: &str) -> Option<Self> {
        let version = version_info.split_whitespace().nth(1)?;
        let minor = version.split('.').nth(1)?.parse().ok()?;

        Some(Self { minor })
    }

    fn detect() -> Option<Self> {
        let rustc = env::var("RUSTC").unwrap_or_else(|_| "rustc".to_string());
        let output = Command::new(rustc).arg("--version").output().ok()?;

        Self::parse(&String::from_utf8_lossy(&output.stdout))
    }

    fn has_stable_avx512(&self) -> bool {
        self.minor >= AVX512_STABLE_MINOR
    }
}

fn main() {
    println!("cargo::rerun-if-changed=build.rs");
    println!("cargo::rerun-if-env-changed=RUSTC");

    // Disable flag warnings for build
    println!("cargo::rustc-check-cfg=cfg(avx512)");

    let version = RustcVersion::detect();

    // The AVX-512 backend is only compiled for x86_64 targets whose toolchain
    // ships the intrinsics; whether the CPU supports them is decided at runtime.
    let target_arch = env::var("CARGO_CFG_TARGET_ARCH").unwrap_or_default();
    let avx512 = target_arch == "x86_64"
        && version
            .as_ref()
            .map(RustcVersion::has_stable_avx512)
            .unwrap_or(false);

    if avx512 {
        println!("cargo::rustc-cfg=avx512");
    }
}
