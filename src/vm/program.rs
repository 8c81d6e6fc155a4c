//! The lowered program: an immutable node graph plus the variable snapshot
//! taken at lowering time.
//!
//! The JSON form of this model is an external interface: nodes are tagged
//! by `"type"`, and fields with a zero/empty default may be omitted by the
//! emitter (readers apply serde defaults).

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::variable::VariableStore;

/// A value operand: a literal resolved at lowering time, or a reference to
/// the enclosing function's declared parameter, bound per call at tick
/// time. Global variable references never reach the runtime symbolically;
/// lowering substitutes their snapshot value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ValueRef {
    Literal(f64),
    Variable(String),
}

impl Default for ValueRef {
    fn default() -> Self {
        ValueRef::Literal(0.0)
    }
}

impl From<f64> for ValueRef {
    fn from(value: f64) -> Self {
        ValueRef::Literal(value)
    }
}

/// The operand of a conditional: a pin to digital-read, or a variable whose
/// snapshot value is tested for `> 0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Condition {
    Pin {
        pin: u8,
    },
    Variable {
        #[serde(rename = "conditionVar")]
        condition_var: String,
    },
}

/// One node of the lowered program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RuntimeNode {
    Forever {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        body: Vec<RuntimeNode>,
    },
    If {
        #[serde(flatten)]
        condition: Condition,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        body: Vec<RuntimeNode>,
    },
    IfElse {
        #[serde(flatten)]
        condition: Condition,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        body: Vec<RuntimeNode>,
        #[serde(rename = "elseBody", default, skip_serializing_if = "Vec::is_empty")]
        else_body: Vec<RuntimeNode>,
    },
    Repeat {
        #[serde(rename = "number", default)]
        count: f64,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        body: Vec<RuntimeNode>,
    },
    AnalogWrite {
        #[serde(default)]
        pin: u8,
        #[serde(default)]
        value: ValueRef,
    },
    DigitalRead {
        #[serde(default)]
        pin: u8,
    },
    FunctionDefine {
        #[serde(rename = "functionName", default)]
        function_name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parameter: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        body: Vec<RuntimeNode>,
    },
    FunctionCall {
        #[serde(rename = "functionName", default)]
        function_name: String,
        #[serde(rename = "number", default)]
        arg: ValueRef,
    },
    Wait {
        #[serde(rename = "number", default)]
        seconds: f64,
    },
    Forward {
        #[serde(rename = "number", default)]
        speed: f64,
    },
    TurnLeft {
        #[serde(rename = "number", default)]
        angle: f64,
    },
    TurnRight {
        #[serde(rename = "number", default)]
        angle: f64,
    },
    Stop {},
}

impl RuntimeNode {
    pub fn is_forever(&self) -> bool {
        matches!(self, RuntimeNode::Forever { .. })
    }

    pub fn is_function_define(&self) -> bool {
        matches!(self, RuntimeNode::FunctionDefine { .. })
    }
}

/// The immutable lowered program: ordered entry points plus the variable
/// snapshot. Produced once by the lowering pass and owned exclusively by
/// the engine for the duration of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    #[serde(default)]
    pub roots: Vec<RuntimeNode>,
    #[serde(default, skip_serializing_if = "VariableStore::is_empty")]
    pub variables: VariableStore,
}

impl Program {
    pub fn new(roots: Vec<RuntimeNode>, variables: VariableStore) -> Program {
        Program { roots, variables }
    }

    pub fn has_forever_root(&self) -> bool {
        self.roots.iter().any(RuntimeNode::is_forever)
    }

    pub fn to_json(&self) -> Result<String, CoreError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(text: &str) -> Result<Program, CoreError> {
        Ok(serde_json::from_str(text)?)
    }
}
