//! The block tree: the in-memory form of a visual program.
//!
//! A [`Block`] is one visual instruction or expression node. Blocks own
//! ordered [`Section`]s (a header row of labels/inputs plus a body of child
//! blocks) and an optional outer area of attached children. The tree is
//! created and mutated by an external editor; this crate snapshots it to
//! text ([`crate::serializer`]) and lowers it to a runnable program
//! ([`crate::compiler`]).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod input;
pub mod section;

#[cfg(test)]
pub(crate) mod testkit;

pub use input::Input;
pub use section::{Header, HeaderItem, Section};

/// The structural category of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    /// An entry point (the unbounded loop hat).
    Trigger,
    /// A statement in a body sequence.
    Statement,
    /// An expression that plugs into an input slot and yields a value.
    Operation,
    /// A standalone condition block.
    Condition,
    /// A reusable function definition.
    Define,
}

/// The closed instruction set.
///
/// `Block::name` stays a free string in the tree (it doubles as the
/// editor's prefab key), but every dispatch in this crate goes through this
/// enum: classify once, `match` everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockType {
    Forever,
    If,
    IfElse,
    Repeat,
    AnalogWrite,
    DigitalRead,
    SetVariable,
    Variable,
    FunctionDefine,
    FunctionCall,
    Wait,
    Forward,
    TurnLeft,
    TurnRight,
    Stop,
}

impl BlockType {
    /// Classifies a block name. Returns `None` for unknown kinds, which the
    /// serializer skips with a diagnostic.
    pub fn from_name(name: &str) -> Option<BlockType> {
        match name {
            "forever" => Some(BlockType::Forever),
            "if" => Some(BlockType::If),
            "ifElse" => Some(BlockType::IfElse),
            "repeat" => Some(BlockType::Repeat),
            "analogWrite" => Some(BlockType::AnalogWrite),
            "digitalRead" => Some(BlockType::DigitalRead),
            "setVariable" => Some(BlockType::SetVariable),
            "variable" => Some(BlockType::Variable),
            "functionDefine" => Some(BlockType::FunctionDefine),
            "functionCall" => Some(BlockType::FunctionCall),
            "wait" => Some(BlockType::Wait),
            "forward" => Some(BlockType::Forward),
            "turnLeft" => Some(BlockType::TurnLeft),
            "turnRight" => Some(BlockType::TurnRight),
            "stop" => Some(BlockType::Stop),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            BlockType::Forever => "forever",
            BlockType::If => "if",
            BlockType::IfElse => "ifElse",
            BlockType::Repeat => "repeat",
            BlockType::AnalogWrite => "analogWrite",
            BlockType::DigitalRead => "digitalRead",
            BlockType::SetVariable => "setVariable",
            BlockType::Variable => "variable",
            BlockType::FunctionDefine => "functionDefine",
            BlockType::FunctionCall => "functionCall",
            BlockType::Wait => "wait",
            BlockType::Forward => "forward",
            BlockType::TurnLeft => "turnLeft",
            BlockType::TurnRight => "turnRight",
            BlockType::Stop => "stop",
        }
    }

    /// The structural category a block of this type carries.
    pub fn kind(&self) -> BlockKind {
        match self {
            BlockType::Forever => BlockKind::Trigger,
            BlockType::FunctionDefine => BlockKind::Define,
            BlockType::Variable => BlockKind::Operation,
            _ => BlockKind::Statement,
        }
    }

    pub fn is_define(&self) -> bool {
        matches!(self, BlockType::FunctionDefine)
    }

    pub fn is_loop(&self) -> bool {
        matches!(self, BlockType::Forever)
    }

    pub fn is_assignment(&self) -> bool {
        matches!(self, BlockType::SetVariable)
    }
}

/// 2D placement of a block on the editor canvas. Preserved only for
/// round-tripping the visual layout; no runtime effect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// Present when a block reads or writes a named variable: the manager kind
/// the editor registered the variable under, and its display name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableBinding {
    pub manager: String,
    pub name: String,
}

/// A borrowed view of one block input: either a literal token or a nested
/// operation block plugged into the slot.
#[derive(Debug, Clone, Copy)]
pub enum InputRef<'a> {
    Literal(&'a str),
    Operation(&'a Block),
}

/// One visual instruction or expression node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    /// Instruction kind tag, also the editor's prefab/template key.
    pub name: String,
    #[serde(default)]
    pub position: Position,
    pub kind: BlockKind,
    #[serde(default)]
    pub sections: Vec<Section>,
    /// Children visually attached outside the main body but owned by this
    /// block.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outer_area: Vec<Block>,
    /// Binds a call site to its definition. Globally unique per definition,
    /// stable across serialization round-trips.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub define_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable_binding: Option<VariableBinding>,
}

impl Default for BlockKind {
    fn default() -> Self {
        BlockKind::Statement
    }
}

impl Block {
    /// Creates a block of a known type with empty sections.
    pub fn new(block_type: BlockType) -> Block {
        Block {
            name: block_type.name().to_owned(),
            kind: block_type.kind(),
            ..Default::default()
        }
    }

    /// Classifies this block's name into the closed instruction set.
    pub fn block_type(&self) -> Option<BlockType> {
        BlockType::from_name(&self.name)
    }

    /// The name of the variable this block reads or writes, if bound.
    pub fn variable_name(&self) -> Option<&str> {
        self.variable_binding.as_ref().map(|b| b.name.as_str())
    }

    /// Collects the block's inputs in header order across all sections:
    /// fields, dropdowns and slots count; labels and local variables do not.
    pub fn inputs(&self) -> Vec<InputRef<'_>> {
        let mut out = Vec::new();
        for section in &self.sections {
            for item in &section.header.items {
                match item {
                    HeaderItem::Field { value } | HeaderItem::Dropdown { value } => {
                        out.push(InputRef::Literal(value));
                    }
                    HeaderItem::Slot { input } => match &input.operation {
                        Some(op) => out.push(InputRef::Operation(op)),
                        None => out.push(InputRef::Literal(&input.value)),
                    },
                    HeaderItem::Label { .. } | HeaderItem::LocalVariable { .. } => {}
                }
            }
        }
        out
    }

    /// The n-th input (see [`Block::inputs`]), if present.
    pub fn input(&self, n: usize) -> Option<InputRef<'_>> {
        self.inputs().into_iter().nth(n)
    }

    /// The function-scoped names declared by this block's header, in order.
    pub fn local_variables(&self) -> Vec<&str> {
        let mut out = Vec::new();
        for section in &self.sections {
            for item in &section.header.items {
                if let HeaderItem::LocalVariable { name } = item {
                    out.push(name.as_str());
                }
            }
        }
        out
    }

    /// Concatenated label texts across all sections, in order.
    pub fn label_text(&self) -> String {
        let mut out = String::new();
        for section in &self.sections {
            for item in &section.header.items {
                if let HeaderItem::Label { text } = item {
                    out.push_str(text);
                }
            }
        }
        out
    }

    /// Computes a definition identifier from the block's label texts,
    /// sanitized to an identifier-safe alphabet. Deterministic for any
    /// labelled definition; a label-less definition gets a random
    /// identifier instead.
    pub fn compute_define_id(&self) -> String {
        let sanitized: String = self
            .label_text()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
            .collect();
        if sanitized.is_empty() {
            format!("fn_{}", Uuid::new_v4().simple())
        } else {
            sanitized
        }
    }

    /// Walks this block's subtree in document order: the block itself, then
    /// per section the header slot operations followed by the body children,
    /// then the outer area.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Block)) {
        visit(self);
        for section in &self.sections {
            for item in &section.header.items {
                if let HeaderItem::Slot { input } = item {
                    if let Some(op) = &input.operation {
                        op.walk(visit);
                    }
                }
            }
            for child in &section.body {
                child.walk(visit);
            }
        }
        for child in &self.outer_area {
            child.walk(visit);
        }
    }
}

/// The container a deserialized tree lands in: the ordered list of
/// top-level blocks of one canvas.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockDocument {
    pub blocks: Vec<Block>,
}

impl BlockDocument {
    pub fn new() -> BlockDocument {
        BlockDocument::default()
    }

    /// Finds the function-define block carrying the given identifier.
    pub fn find_define(&self, define_id: &str) -> Option<&Block> {
        self.blocks.iter().find(|b| {
            b.block_type().is_some_and(|t| t.is_define()) && b.define_id.as_deref() == Some(define_id)
        })
    }

    /// Walks every top-level block's subtree in document order.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Block)) {
        for block in &self.blocks {
            block.walk(visit);
        }
    }
}
