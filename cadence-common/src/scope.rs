use serde::{Deserialize, Serialize};

/// How long a behavior profile lives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileScope {
    /// One profile for the whole session, installed by the caller.
    #[default]
    Session,
    /// A fresh personality for every detected item.
    Item,
}
