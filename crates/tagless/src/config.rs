//! Tunables of a [`Codec`](crate::Codec).

use bon::Builder;

/// The nesting bound used when none is configured.
pub const DEFAULT_MAX_DEPTH: u16 = 16;

/// Configuration of a [`Codec`](crate::Codec).
///
/// # Example
///
/// ```ignore
/// use tagless::{Codec, Config};
///
/// let codec = Codec::with_config(Config::builder().max_depth(64).build());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Builder)]
pub struct Config {
    /// The maximum number of nested objects a single value may contain,
    /// counting the root object.
    ///
    /// Encoding or decoding a deeper graph fails with
    /// [`Error::DepthExceeded`](crate::Error::DepthExceeded). This is also
    /// what stops a cyclic graph from recursing forever.
    #[builder(default = DEFAULT_MAX_DEPTH)]
    pub max_depth: u16,
}

impl Default for Config {
    fn default() -> Self { Self::builder().build() }
}
