//! Build-time version info, injected via the environment at compile time.

/// Exporter name used for the binary and the exporter-wide metric namespace.
pub const NAME: &str = "beat_exporter";

/// Release version string (set at build time).
pub const RELEASE: &str = env!("CARGO_PKG_VERSION");

/// Git commit hash (set at build time via env, or "unknown").
pub fn git_commit() -> &'static str {
    option_env!("GIT_COMMIT").unwrap_or("unknown")
}

/// Target OS.
pub fn target_os() -> &'static str {
    std::env::consts::OS
}

/// Target architecture.
pub fn target_arch() -> &'static str {
    std::env::consts::ARCH
}

/// Full version string with platform info.
pub fn full() -> String {
    format!(
        "{NAME}, version {} (commit: {}, {}/{})",
        RELEASE,
        git_commit(),
        target_os(),
        target_arch(),
    )
}
