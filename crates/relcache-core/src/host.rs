//! Host platform description used to name native artifacts.

use std::collections::HashMap;

use crate::identifier::NativeKind;

/// Platform, architecture and ABI versions of the running host.
///
/// Platform and architecture use the release naming scheme (`linux`,
/// `darwin`, `win32`, `x64`, `arm64`, ...) rather than Rust target names,
/// since that is how published native artifacts are labelled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostInfo {
    /// Platform label.
    pub platform: String,

    /// Architecture label.
    pub architecture: String,

    abi_versions: HashMap<NativeKind, String>,
}

impl Default for HostInfo {
    fn default() -> Self {
        Self::detect()
    }
}

impl HostInfo {
    /// Describes the host this binary was compiled for.
    ///
    /// No ABI versions are known until configured with
    /// [`with_abi_version`](Self::with_abi_version).
    ///
    /// # Examples
    ///
    /// ```
    /// use relcache_core::HostInfo;
    ///
    /// let host = HostInfo::detect();
    /// assert!(!host.platform.is_empty());
    /// ```
    #[must_use]
    pub fn detect() -> Self {
        Self::new(
            platform_label(std::env::consts::OS),
            architecture_label(std::env::consts::ARCH),
        )
    }

    /// Creates a host description with explicit labels.
    #[must_use]
    pub fn new(platform: impl Into<String>, architecture: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            architecture: architecture.into(),
            abi_versions: HashMap::new(),
        }
    }

    /// Sets the ABI version reported for a native kind.
    #[must_use]
    pub fn with_abi_version(mut self, kind: NativeKind, version: impl Into<String>) -> Self {
        self.abi_versions.insert(kind, version.into());
        self
    }

    /// Returns the ABI version for a native kind, if known.
    #[must_use]
    pub fn abi_version(&self, kind: NativeKind) -> Option<&str> {
        self.abi_versions.get(&kind).map(String::as_str)
    }
}

/// Maps a Rust OS name to the release platform label.
#[must_use]
pub fn platform_label(os: &str) -> String {
    match os {
        "macos" => "darwin",
        "windows" => "win32",
        other => other,
    }
    .to_string()
}

/// Maps a Rust architecture name to the release architecture label.
#[must_use]
pub fn architecture_label(arch: &str) -> String {
    match arch {
        "x86_64" => "x64",
        "aarch64" => "arm64",
        "x86" => "ia32",
        "powerpc64" => "ppc64",
        other => other,
    }
    .to_string()
}
