use std::fmt;

/// Which busy flag an operation or subscriber refers to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum LoadingScope {
    /// The controller-wide flag, the one the dismiss guard looks at.
    #[default]
    Default,
    /// An independent flag keyed by a caller-chosen tag. Any string is valid,
    /// including the empty one.
    Tag(String),
}

impl LoadingScope {
    pub fn tag(tag: impl Into<String>) -> Self {
        Self::Tag(tag.into())
    }

    pub fn is_default(&self) -> bool {
        matches!(self, Self::Default)
    }

    pub fn as_tag(&self) -> Option<&str> {
        match self {
            Self::Default => None,
            Self::Tag(tag) => Some(tag),
        }
    }
}

impl From<&str> for LoadingScope {
    fn from(tag: &str) -> Self {
        Self::Tag(tag.to_string())
    }
}

impl From<String> for LoadingScope {
    fn from(tag: String) -> Self {
        Self::Tag(tag)
    }
}

impl From<Option<&str>> for LoadingScope {
    fn from(tag: Option<&str>) -> Self {
        tag.map(Self::from).unwrap_or_default()
    }
}

impl fmt::Display for LoadingScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => write!(f, "<default>"),
            Self::Tag(tag) => write!(f, "tag '{}'", tag),
        }
    }
}
