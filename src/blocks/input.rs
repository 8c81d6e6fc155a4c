//! The value an operation slot currently holds.

use serde::{Deserialize, Serialize};

use super::Block;

/// A slot value: a literal token, or a nested operation block that supplies
/// the value at run time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Input {
    /// Literal text, used when no operation is plugged in.
    #[serde(default)]
    pub value: String,
    /// Nested operation block supplying the value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<Box<Block>>,
}

impl Input {
    pub fn literal<S: ToString>(value: S) -> Input {
        Input {
            value: value.to_string(),
            operation: None,
        }
    }

    pub fn operation(block: Block) -> Input {
        Input {
            value: String::new(),
            operation: Some(Box::new(block)),
        }
    }

    pub fn is_operation(&self) -> bool {
        self.operation.is_some()
    }

    /// A literal is numeric iff it parses as a culture-invariant float;
    /// otherwise it is text. This duality governs lowering and boolean
    /// coercion and must match the editor's behavior exactly.
    pub fn numeric(&self) -> Option<f64> {
        parse_numeric(&self.value)
    }
}

/// Culture-invariant float parse for the numeric/text duck rule.
pub fn parse_numeric(token: &str) -> Option<f64> {
    token.trim().parse::<f64>().ok()
}
