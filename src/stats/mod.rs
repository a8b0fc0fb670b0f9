use serde_json::Value;
use std::fmt::{Display, Formatter};

pub mod transform;

pub use transform::{transform, BY_LOGIN_KEY, CONTRIBUTORS_COLUMNS_KEY};

/// One contributor and their contribution count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContributionRecord {
    pub login: String,
    pub count: u64,
}

impl ContributionRecord {
    pub fn new(login: impl Into<String>, count: u64) -> Self {
        Self {
            login: login.into(),
            count,
        }
    }
}

/// A `[login, count]` pair so templates can index into it.
impl From<&ContributionRecord> for Value {
    fn from(record: &ContributionRecord) -> Self {
        Value::Array(vec![
            Value::from(record.login.as_str()),
            Value::from(record.count),
        ])
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransformError {
    NotAnObject,
    MissingByLogin,
    ByLoginNotAnObject,
    InvalidCount { login: String },
}

impl Display for TransformError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAnObject => write!(f, "stats response is not a JSON object"),
            Self::MissingByLogin => write!(f, "stats response has no `byLogin` field"),
            Self::ByLoginNotAnObject => write!(f, "`byLogin` is not an object"),
            Self::InvalidCount { login } => write!(
                f,
                "contribution count for `{}` is not a non-negative integer",
                login
            ),
        }
    }
}

impl std::error::Error for TransformError {}
