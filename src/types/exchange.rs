use std::fmt;
use serde::{Deserialize, Serialize};

/// The fixed set of venues contributing to the silver aggregate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Exchange {
    Lbma,
    Comex,
    Shanghai,
    Other,
}

impl Exchange {
    pub fn as_str(&self) -> &'static str {
        match self {
            Exchange::Lbma => "LBMA",
            Exchange::Comex => "COMEX",
            Exchange::Shanghai => "SHANGHAI",
            Exchange::Other => "OTHER",
        }
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
