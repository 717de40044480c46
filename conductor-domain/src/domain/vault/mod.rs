use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fmt::{Debug, Formatter},
};

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vault {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub plaintext: bool,
    #[serde(default)]
    pub items: BTreeMap<String, String>,
}

impl Debug for Vault {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vault")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("plaintext", &self.plaintext)
            .field("items", &self.items.keys().collect::<Vec<_>>())
            .finish()
    }
}
