use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Fixed set of topics a post can be filed under. Parsing ignores case and
/// surrounding whitespace, in query strings and JSON bodies alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Category {
    Futurology,
    Science,
    Technology,
    Philosophy,
    Sociology,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Futurology,
        Category::Science,
        Category::Technology,
        Category::Philosophy,
        Category::Sociology,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Category::Futurology => "futurology",
            Category::Science => "science",
            Category::Technology => "technology",
            Category::Philosophy => "philosophy",
            Category::Sociology => "sociology",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown category {0:?}")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

impl TryFrom<String> for Category {
    type Error = UnknownCategory;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}
