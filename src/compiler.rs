//! The lowering pass: turns a block tree (or its serialized text) into a
//! runnable [`Program`].
//!
//! Lowering is pure, idempotent and one-shot. It never fails for malformed
//! input: chunks that do not parse are ignored, unknown block kinds are
//! dropped, and every unresolvable reference degrades to a default value
//! plus a diagnostic. An educational simulator should run something
//! plausible rather than refuse to run at all.

use crate::blocks::{Block, BlockDocument, BlockType, InputRef};
use crate::blocks::input::parse_numeric;
use crate::log_warn;
use crate::serializer;
use crate::variable::VariableStore;
use crate::vm::{Condition, Program, RuntimeNode, ValueRef};


/// Speed applied when a motion block's value resolves to zero, so the
/// default block configuration still moves the vehicle.
pub const DEFAULT_DRIVE_SPEED: f64 = 1.0;
/// Angle applied when a turn block's value resolves to zero.
pub const DEFAULT_TURN_ANGLE: f64 = 90.0;

/// Lowers serialized block-tree text into a program. Chunks that fail to
/// parse are ignored; see [`lower_document`].
pub fn lower_source(text: &str) -> Program {
    let document = BlockDocument {
        blocks: serializer::parse_chunks(text),
    };
    lower_document(&document)
}

/// Lowers a block document into a program: variable snapshot, function
/// collection, entry-point selection, then per-kind lowering.
pub fn lower_document(document: &BlockDocument) -> Program {
    let variables = collect_variables(document);

    let ctx = LowerCtx {
        variables: &variables,
        parameter: None,
    };

    let mut defines: Vec<RuntimeNode> = Vec::new();
    let mut seen_ids: Vec<String> = Vec::new();
    for block in &document.blocks {
        if block.block_type().is_some_and(|t| t.is_define()) {
            if let Some(node) = lower_define(block, &variables, &mut seen_ids) {
                defines.push(node);
            }
        }
    }

    // Entry-point selection: forever blocks, or every remaining
    // non-define, non-assignment top-level block when there is none.
    let mut roots: Vec<RuntimeNode> = Vec::new();
    let has_loop = document
        .blocks
        .iter()
        .any(|b| b.block_type().is_some_and(|t| t.is_loop()));
    for block in &document.blocks {
        let Some(block_type) = block.block_type() else {
            log_warn!("Dropping block of unknown kind '{}'", block.name);
            continue;
        };
        if has_loop {
            if block_type.is_loop() {
                if let Some(node) = lower_block(block, &ctx) {
                    roots.push(node);
                }
            }
        } else if !block_type.is_define() && !block_type.is_assignment() {
            if let Some(node) = lower_block(block, &ctx) {
                roots.push(node);
            }
        }
    }

    // Defines go first so the engine can resolve calls from the roots
    // alone, without a separate function table on the wire.
    defines.extend(roots);
    Program::new(defines, variables)
}

/// Builds the variable snapshot: every `setVariable` block anywhere in the
/// tree, in document order, later bindings overwriting earlier ones.
fn collect_variables(document: &BlockDocument) -> VariableStore {
    let mut variables = VariableStore::new();
    document.walk(&mut |block| {
        if block.block_type() != Some(BlockType::SetVariable) {
            return;
        }
        let Some(name) = block.variable_name() else {
            log_warn!("setVariable block without a variable binding, skipping");
            return;
        };
        let value = match block.input(0) {
            Some(input) => numeric_of(input, &variables),
            None => 0.0,
        };
        variables.insert(name.to_owned(), value);
    });
    variables
}

fn lower_define(
    block: &Block,
    variables: &VariableStore,
    seen_ids: &mut Vec<String>,
) -> Option<RuntimeNode> {
    let define_id = match &block.define_id {
        Some(id) => id.clone(),
        None => block.compute_define_id(),
    };
    if seen_ids.iter().any(|id| id == &define_id) {
        // First occurrence is authoritative.
        log_warn!("Duplicate function definition '{}', keeping the first", define_id);
        return None;
    }
    seen_ids.push(define_id.clone());

    let locals = block.local_variables();
    if locals.len() > 1 {
        log_warn!(
            "Function '{}' declares {} parameters, only the first is bound",
            define_id,
            locals.len()
        );
    }
    let parameter = locals.first().map(|name| (*name).to_owned());

    let ctx = LowerCtx {
        variables,
        parameter: parameter.as_deref(),
    };
    let mut body = Vec::new();
    for section in &block.sections {
        body.extend(lower_body(&section.body, &ctx));
    }

    Some(RuntimeNode::FunctionDefine {
        function_name: define_id,
        parameter,
        body,
    })
}

/// Lowering context: the variable snapshot plus, inside a function body,
/// the declared parameter name (kept symbolic through lowering).
struct LowerCtx<'a> {
    variables: &'a VariableStore,
    parameter: Option<&'a str>,
}

fn lower_body(blocks: &[Block], ctx: &LowerCtx<'_>) -> Vec<RuntimeNode> {
    blocks.iter().filter_map(|b| lower_block(b, ctx)).collect()
}

fn lower_block(block: &Block, ctx: &LowerCtx<'_>) -> Option<RuntimeNode> {
    let Some(block_type) = block.block_type() else {
        log_warn!("Dropping block of unknown kind '{}'", block.name);
        return None;
    };

    match block_type {
        BlockType::Forever => Some(RuntimeNode::Forever {
            body: lower_section_body(block, 0, ctx),
        }),
        BlockType::If => Some(RuntimeNode::If {
            condition: lower_condition(block, ctx),
            body: lower_section_body(block, 0, ctx),
        }),
        BlockType::IfElse => Some(RuntimeNode::IfElse {
            condition: lower_condition(block, ctx),
            body: lower_section_body(block, 0, ctx),
            else_body: lower_section_body(block, 1, ctx),
        }),
        BlockType::Repeat => Some(RuntimeNode::Repeat {
            count: resolve_numeric(block.input(0), ctx),
            body: lower_section_body(block, 0, ctx),
        }),
        BlockType::AnalogWrite => Some(RuntimeNode::AnalogWrite {
            pin: resolve_pin(block.input(0), ctx),
            value: resolve_value(block.input(1), ctx),
        }),
        BlockType::DigitalRead => Some(RuntimeNode::DigitalRead {
            pin: resolve_pin(block.input(0), ctx),
        }),
        BlockType::FunctionCall => {
            let function_name = block.define_id.clone().unwrap_or_default();
            if function_name.is_empty() {
                log_warn!("Function call without a definition id, call will be a no-op");
            }
            Some(RuntimeNode::FunctionCall {
                function_name,
                arg: resolve_value(block.input(0), ctx),
            })
        }
        BlockType::Wait => Some(RuntimeNode::Wait {
            seconds: resolve_numeric(block.input(0), ctx),
        }),
        BlockType::Forward => Some(RuntimeNode::Forward {
            speed: defaulted(resolve_numeric(block.input(0), ctx), DEFAULT_DRIVE_SPEED),
        }),
        BlockType::TurnLeft => Some(RuntimeNode::TurnLeft {
            angle: defaulted(resolve_numeric(block.input(0), ctx), DEFAULT_TURN_ANGLE),
        }),
        BlockType::TurnRight => Some(RuntimeNode::TurnRight {
            angle: defaulted(resolve_numeric(block.input(0), ctx), DEFAULT_TURN_ANGLE),
        }),
        BlockType::Stop => Some(RuntimeNode::Stop {}),
        // Assignments contribute to the snapshot only; a definition nested
        // in a body is meaningless.
        BlockType::SetVariable => None,
        BlockType::FunctionDefine => {
            log_warn!("Function definition nested in a body, dropping");
            None
        }
        BlockType::Variable => {
            log_warn!("Variable block outside an input slot, dropping");
            None
        }
    }
}

fn lower_section_body(block: &Block, section: usize, ctx: &LowerCtx<'_>) -> Vec<RuntimeNode> {
    match block.sections.get(section) {
        Some(s) => lower_body(&s.body, ctx),
        None => Vec::new(),
    }
}

/// Extracts the condition from the first section's first input: a nested
/// pin-read yields the resolved pin, a nested variable reference yields the
/// variable name. A bare literal follows the numeric/text duck rule: a
/// number reads as a pin, anything else as a variable name.
fn lower_condition(block: &Block, ctx: &LowerCtx<'_>) -> Condition {
    match block.input(0) {
        Some(InputRef::Operation(op)) => match op.block_type() {
            Some(BlockType::DigitalRead) => Condition::Pin {
                pin: resolve_pin(op.input(0), ctx),
            },
            Some(BlockType::Variable) => match op.variable_name() {
                Some(name) => Condition::Variable {
                    condition_var: name.to_owned(),
                },
                None => {
                    log_warn!("Condition variable block without a binding, defaulting to pin 0");
                    Condition::Pin { pin: 0 }
                }
            },
            _ => {
                log_warn!(
                    "Unsupported condition operation '{}', defaulting to pin 0",
                    op.name
                );
                Condition::Pin { pin: 0 }
            }
        },
        Some(InputRef::Literal(token)) => match parse_numeric(token) {
            Some(n) => Condition::Pin { pin: to_pin(n) },
            None if !token.is_empty() => Condition::Variable {
                condition_var: token.to_owned(),
            },
            None => {
                log_warn!("Empty condition input, defaulting to pin 0");
                Condition::Pin { pin: 0 }
            }
        },
        None => {
            log_warn!("Conditional block without a condition input, defaulting to pin 0");
            Condition::Pin { pin: 0 }
        }
    }
}

/// Resolves an input to a number: a token matching a known variable name is
/// substituted by its snapshot value, anything else parses as a literal,
/// defaulting to 0.
fn resolve_numeric(input: Option<InputRef<'_>>, ctx: &LowerCtx<'_>) -> f64 {
    match input {
        Some(input) => {
            if let InputRef::Literal(token) = input {
                if let Some(param) = ctx.parameter {
                    if token == param {
                        // Parameter references have no snapshot value; the
                        // caller binds them, so a bare numeric slot reads 0.
                        return 0.0;
                    }
                }
            }
            numeric_of(input, ctx.variables)
        }
        None => 0.0,
    }
}

/// Like [`resolve_numeric`], but keeps a reference to the enclosing
/// function's parameter symbolic for per-call binding.
fn resolve_value(input: Option<InputRef<'_>>, ctx: &LowerCtx<'_>) -> ValueRef {
    let Some(input) = input else {
        return ValueRef::default();
    };
    let token = match input {
        InputRef::Literal(token) => token,
        InputRef::Operation(op) => match op.block_type() {
            Some(BlockType::Variable) => op.variable_name().unwrap_or(""),
            _ => {
                log_warn!("Unsupported value operation '{}', defaulting to 0", op.name);
                return ValueRef::default();
            }
        },
    };
    if let Some(param) = ctx.parameter {
        if token == param {
            return ValueRef::Variable(token.to_owned());
        }
    }
    if let Some(value) = ctx.variables.get(token) {
        return ValueRef::Literal(value);
    }
    match parse_numeric(token) {
        Some(n) => ValueRef::Literal(n),
        None => {
            if !token.is_empty() {
                log_warn!("Unresolved value token '{}', defaulting to 0", token);
            }
            ValueRef::default()
        }
    }
}

fn resolve_pin(input: Option<InputRef<'_>>, ctx: &LowerCtx<'_>) -> u8 {
    to_pin(resolve_numeric(input, ctx))
}

fn to_pin(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

fn defaulted(value: f64, default: f64) -> f64 {
    if value == 0.0 { default } else { value }
}

/// Document-order numeric resolution shared with the snapshot sub-pass:
/// nested variable reads see the snapshot built so far.
fn numeric_of(input: InputRef<'_>, variables: &VariableStore) -> f64 {
    match input {
        InputRef::Literal(token) => {
            if let Some(value) = variables.get(token) {
                return value;
            }
            match parse_numeric(token) {
                Some(n) => n,
                None => {
                    if !token.is_empty() {
                        log_warn!("Unresolved numeric token '{}', defaulting to 0", token);
                    }
                    0.0
                }
            }
        }
        InputRef::Operation(op) => match op.block_type() {
            Some(BlockType::Variable) => match op.variable_name() {
                Some(name) => match variables.get(name) {
                    Some(value) => value,
                    None => {
                        log_warn!("Unknown variable '{}', defaulting to 0", name);
                        0.0
                    }
                },
                None => 0.0,
            },
            _ => {
                log_warn!(
                    "Operation '{}' cannot be resolved at lowering time, defaulting to 0",
                    op.name
                );
                0.0
            }
        },
    }
}
