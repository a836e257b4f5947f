/// Recipe file read when none is given.
pub const DEFAULT_RECIPE: &str = "Dockerfile";

/// Build context root used when none is given.
pub const DEFAULT_WORKDIR: &str = ".";

/// Hash algorithm identifier used when none is given.
pub const DEFAULT_HASH: &str = "sha1";
