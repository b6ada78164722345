use std::fmt;

use serde::Serialize;

/// Number of classes the classifier distinguishes.
pub const CLASS_COUNT: usize = 3;

/// Iris species, in class-index order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Species {
    Setosa,
    Versicolor,
    Virginica,
}

impl Species {
    pub const ALL: [Species; CLASS_COUNT] = [Species::Setosa, Species::Versicolor, Species::Virginica];

    pub fn as_str(&self) -> &'static str {
        match self {
            Species::Setosa => "setosa",
            Species::Versicolor => "versicolor",
            Species::Virginica => "virginica",
        }
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
