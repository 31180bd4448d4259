use garde::Validate;
use serde::{Deserialize, Serialize};

/// One candidate hairstyle proposed by the analysis call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StyleDescriptor {
    #[garde(range(min = 1))]
    pub id: u32,

    #[garde(length(min = 1))]
    pub label: String,

    /// Natural-language description fed to the mutation prompt.
    #[garde(length(min = 1))]
    pub prompt_description: String,
}

impl StyleDescriptor {
    pub fn new(id: u32, label: impl Into<String>, prompt_description: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
            prompt_description: prompt_description.into(),
        }
    }
}
