use serde::{Deserialize, Serialize};

/// A single entry in the list.
///
/// Items have no identity of their own: they are addressed by their position
/// in the collection. Editing produces a new value via `with_title` /
/// `with_description`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Item {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

impl Item {
    pub fn new(title: impl Into<String>) -> Self {
        Item {
            title: title.into(),
            description: String::new(),
        }
    }

    pub fn with_title(&self, title: impl Into<String>) -> Self {
        Item {
            title: title.into(),
            description: self.description.clone(),
        }
    }

    pub fn with_description(&self, description: impl Into<String>) -> Self {
        Item {
            title: self.title.clone(),
            description: description.into(),
        }
    }

    /// Plain-text rendering used for recovery log bodies
    pub fn to_text(&self) -> String {
        if self.description.is_empty() {
            self.title.clone()
        } else {
            format!("{}\n{}", self.title, self.description)
        }
    }
}
