use std::fmt;
use std::sync::Arc;

/// Opaque identifier of an experience hosted by the runtime.
///
/// The host owns the identifier; the multiplexer only compares and hashes it.
/// Cloning is cheap.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExperienceId(Arc<str>);

impl ExperienceId {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExperienceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ExperienceId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ExperienceId {
    fn from(value: String) -> Self {
        Self(Arc::from(value))
    }
}

impl AsRef<str> for ExperienceId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}
