/// Build metadata embedded by `build.rs`.
#[derive(Debug, Clone, Copy)]
pub struct BuildInfo {
    pub version: &'static str,
    pub git_hash: &'static str,
    pub git_status: &'static str,
    pub timestamp: &'static str,
    pub target: &'static str,
    pub rustc: &'static str,
}

pub fn current() -> BuildInfo {
    BuildInfo {
        version: env!("CARGO_PKG_VERSION"),
        git_hash: env!("STARJAR_BUILD_HASH"),
        git_status: env!("STARJAR_BUILD_STATUS"),
        timestamp: env!("STARJAR_BUILD_TIMESTAMP"),
        target: env!("STARJAR_BUILD_TARGET"),
        rustc: env!("STARJAR_BUILD_RUSTC"),
    }
}
