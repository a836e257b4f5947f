//! Host platform detection.
//!
//! The default `--platform` of a build is the host's, written the way
//! container tooling names it (`<os>/<arch>`, e.g. `linux/amd64`).

pub mod arch;
pub mod os;

use arch::Arch;
use os::Os;
use std::fmt;

/// Container platform identifier (e.g., "linux/arm64")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Platform {
  pub os: Os,
  pub arch: Arch,
}

impl Platform {
  pub fn new(os: Os, arch: Arch) -> Self {
    Self { os, arch }
  }

  /// Detect the current platform at runtime
  ///
  /// Returns `None` if the OS or architecture has no container name
  pub fn current() -> Option<Self> {
    Some(Self {
      os: Os::current()?,
      arch: Arch::current()?,
    })
  }
}

impl fmt::Display for Platform {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}/{}", self.os, self.arch)
  }
}

/// Returns the host platform string, if it is a known one
pub fn default_platform() -> Option<String> {
  Platform::current().map(|p| p.to_string())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn platform_format() {
    let platform = Platform::new(Os::Linux, Arch::X86_64);
    assert_eq!(platform.to_string(), "linux/amd64");

    let platform = Platform::new(Os::MacOs, Arch::Aarch64);
    assert_eq!(platform.to_string(), "darwin/arm64");
  }

  #[test]
  fn default_platform_has_os_and_arch() {
    if let Some(platform) = default_platform() {
      assert_eq!(platform.split('/').count(), 2);
    }
  }
}
