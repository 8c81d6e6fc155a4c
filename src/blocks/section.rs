//! Sections: the labelled regions of a block.

use serde::{Deserialize, Serialize};

use super::{Block, Input};

/// One header item of a section: static text, an editable literal, a
/// selectable literal, a function-scoped name, or an operation slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum HeaderItem {
    Label {
        text: String,
    },
    Field {
        value: String,
    },
    Dropdown {
        value: String,
    },
    LocalVariable {
        name: String,
    },
    Slot {
        #[serde(default)]
        input: Input,
    },
}

/// The ordered header row of a section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Header {
    #[serde(default)]
    pub items: Vec<HeaderItem>,
}

/// One labelled region of a block: a header row plus a body of child
/// blocks (a statement sequence).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Section {
    #[serde(default)]
    pub header: Header,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub body: Vec<Block>,
}

impl Section {
    pub fn with_items(items: Vec<HeaderItem>) -> Section {
        Section {
            header: Header { items },
            body: Vec::new(),
        }
    }

    pub fn with_body(items: Vec<HeaderItem>, body: Vec<Block>) -> Section {
        Section {
            header: Header { items },
            body,
        }
    }
}
