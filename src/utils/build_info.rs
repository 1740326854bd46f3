/// Version of the shell command set, bumped when commands change shape.
pub const CLI_VERSION: &str = "1";

/// Metadata captured by `build.rs`.
#[derive(Debug, Clone, Copy)]
pub struct BuildInfo {
    pub version: &'static str,
    pub git_hash: &'static str,
    pub git_status: &'static str,
    pub timestamp: &'static str,
    pub target: &'static str,
    pub profile: &'static str,
    pub rustc: &'static str,
}

pub fn current() -> BuildInfo {
    BuildInfo {
        version: env!("CARGO_PKG_VERSION"),
        git_hash: env!("ORFI_BUILD_HASH"),
        git_status: env!("ORFI_BUILD_STATUS"),
        timestamp: env!("ORFI_BUILD_TIMESTAMP"),
        target: env!("ORFI_BUILD_TARGET"),
        profile: env!("ORFI_BUILD_PROFILE"),
        rustc: env!("ORFI_BUILD_RUSTC"),
    }
}
