use std::fmt;

/// Rule kinds the restriction checker knows how to evaluate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestrictionKind {
    Keyword,
    Regexp,
}

impl RestrictionKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "KEYWORD" => Some(Self::Keyword),
            "REGEXP" => Some(Self::Regexp),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Keyword => "KEYWORD",
            Self::Regexp => "REGEXP",
        }
    }
}

/// A static rule a solution must not violate.
///
/// `kind` keeps the stored text so that unknown kinds surface at evaluation
/// time rather than when the row is read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Restriction {
    pub kind: String,
    pub definition: String,
}

impl Restriction {
    pub fn keyword(definition: impl Into<String>) -> Self {
        Self {
            kind: RestrictionKind::Keyword.as_str().to_string(),
            definition: definition.into(),
        }
    }

    pub fn regexp(definition: impl Into<String>) -> Self {
        Self {
            kind: RestrictionKind::Regexp.as_str().to_string(),
            definition: definition.into(),
        }
    }
}

impl fmt::Display for Restriction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?}", self.kind, self.definition)
    }
}
