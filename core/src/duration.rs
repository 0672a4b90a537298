//! Proxy-native duration rendering.

use std::fmt;

use serde::{Serialize, Serializer};

/// A millisecond duration rendered as `"<seconds>.<millis>s"`.
///
/// The data plane parses this field strictly: the fractional part is always
/// three digits and the seconds part is never padded.
///
/// ```
/// use routegen::ProxyDuration;
///
/// assert_eq!(ProxyDuration::from_millis(1234).to_string(), "1.234s");
/// assert_eq!(ProxyDuration::from_millis(3000).to_string(), "3.000s");
/// assert_eq!(ProxyDuration::from_millis(5).to_string(), "0.005s");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProxyDuration {
    millis: u64,
}

impl ProxyDuration {
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self { millis }
    }

    #[must_use]
    pub const fn as_millis(self) -> u64 {
        self.millis
    }
}

impl fmt::Display for ProxyDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:03}s", self.millis / 1000, self.millis % 1000)
    }
}

impl Serialize for ProxyDuration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
