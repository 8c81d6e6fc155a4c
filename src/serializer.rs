//! Block tree ⇄ text.
//!
//! One top-level block (and everything reachable under it) serializes to
//! one self-contained JSON chunk; chunks are concatenated with an ASCII
//! record separator. JSON string escaping renders control characters as
//! `\u001e`, so the separator can never appear unescaped inside a chunk
//! payload.
//!
//! Loading is a two-phase build: every block is materialized fully in
//! memory (three passes over the chunk list), then a single resolution pass
//! links function calls to their definitions. No partially-built block is
//! ever observable and no pending-instantiation bookkeeping is needed.

use std::collections::HashMap;

use crate::blocks::{Block, BlockDocument, BlockType, HeaderItem};
use crate::log_warn;
use crate::variable::VariableStore;

#[cfg(test)]
mod tests;

/// Reserved chunk separator (ASCII record separator).
pub const CHUNK_SEPARATOR: char = '\u{1E}';

/// Serializes a document to its flat text form.
///
/// Function-define blocks are sorted to the front, ahead of all other
/// top-level blocks, so that deserialization can satisfy the
/// definition-before-call dependency without a dependency graph. A call
/// block's mirrored body is derived state and is not emitted; the
/// resolution pass rebuilds it on load.
pub fn serialize(document: &BlockDocument) -> String {
    let mut ordered: Vec<&Block> = Vec::with_capacity(document.blocks.len());
    ordered.extend(
        document
            .blocks
            .iter()
            .filter(|b| b.block_type().is_some_and(|t| t.is_define())),
    );
    ordered.extend(
        document
            .blocks
            .iter()
            .filter(|b| !b.block_type().is_some_and(|t| t.is_define())),
    );

    let chunks: Vec<String> = ordered
        .into_iter()
        .map(|block| {
            let mut block = block.clone();
            prepare_for_emit(&mut block);
            // Serializing a fully in-memory tree cannot fail.
            serde_json::to_string(&block).unwrap_or_default()
        })
        .collect();
    chunks.join(&CHUNK_SEPARATOR.to_string())
}

/// Ensures definitions carry their identifier and strips derived state
/// (call mirrors) before emitting.
fn prepare_for_emit(block: &mut Block) {
    for_each_block_mut(block, &mut |b| match b.block_type() {
        Some(BlockType::FunctionDefine) => {
            if b.define_id.is_none() {
                b.define_id = Some(b.compute_define_id());
            }
        }
        Some(BlockType::FunctionCall) => {
            for section in &mut b.sections {
                section.body.clear();
            }
        }
        _ => {}
    });
}

/// Splits text into chunks and parses each into a live block, skipping
/// malformed chunks and unknown block kinds with a diagnostic.
pub fn parse_chunks(text: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    for chunk in text.split(CHUNK_SEPARATOR) {
        let chunk = chunk.trim();
        if chunk.is_empty() {
            continue;
        }
        let block: Block = match serde_json::from_str(chunk) {
            Ok(block) => block,
            Err(e) => {
                log_warn!("Skipping malformed chunk: {}", e);
                continue;
            }
        };
        if block.block_type().is_none() {
            log_warn!("Skipping chunk of unknown block kind '{}'", block.name);
            continue;
        }
        blocks.push(block);
    }
    blocks
}

/// Reconstructs a tree from its flat text form into `document`, registering
/// every variable-producing block with `registry` along the way.
///
/// Three passes over the full chunk list, then resolution:
/// 1. register every variable name, in document order, skipping names that
///    are already registered;
/// 2. instantiate every function definition (skipping definitions whose id
///    already exists in the target);
/// 3. instantiate every other chunk;
/// 4. link every function call to its definition and rebuild its mirrored
///    body.
pub fn deserialize(text: &str, document: &mut BlockDocument, registry: &mut VariableStore) {
    let chunks = parse_chunks(text);

    // Pass 1: variable registration, nested operations and outer areas
    // included.
    for chunk in &chunks {
        chunk.walk(&mut |block| {
            if let Some(name) = variable_producer_name(block) {
                registry.register(name);
            }
        });
    }

    // Pass 2/3: definitions first, then the remainder, preserving chunk
    // order in the target document.
    let mut slots: Vec<Option<Block>> = vec![None; chunks.len()];
    let mut added_ids: Vec<String> = Vec::new();
    for (i, chunk) in chunks.iter().enumerate() {
        if !chunk.block_type().is_some_and(|t| t.is_define()) {
            continue;
        }
        let mut block = chunk.clone();
        if block.define_id.is_none() {
            block.define_id = Some(block.compute_define_id());
        }
        let id = block.define_id.clone().unwrap_or_default();
        if document.find_define(&id).is_some() || added_ids.contains(&id) {
            log_warn!("Definition '{}' already present, skipping chunk", id);
            continue;
        }
        added_ids.push(id);
        slots[i] = Some(block);
    }
    for (i, chunk) in chunks.into_iter().enumerate() {
        if chunk.block_type().is_some_and(|t| t.is_define()) {
            continue;
        }
        slots[i] = Some(chunk);
    }
    document.blocks.extend(slots.into_iter().flatten());

    resolve_calls(document);
}

/// The resolution pass: every call block is linked to its definition by id
/// and its mirrored body is rebuilt from the definition's first section.
/// Calls with no matching definition get one diagnostic each and stay
/// unlinked, a permanent no-op for the run.
pub fn resolve_calls(document: &mut BlockDocument) {
    let mut mirrors: HashMap<String, Vec<Block>> = HashMap::new();
    for block in &document.blocks {
        if !block.block_type().is_some_and(|t| t.is_define()) {
            continue;
        }
        let Some(id) = block.define_id.as_deref() else {
            continue;
        };
        let body = block
            .sections
            .first()
            .map(|s| s.body.clone())
            .unwrap_or_default();
        mirrors.entry(id.to_owned()).or_insert(body);
    }

    for block in &mut document.blocks {
        for_each_block_mut(block, &mut |b| {
            if b.block_type() != Some(BlockType::FunctionCall) {
                return;
            }
            let id = b.define_id.as_deref().unwrap_or_default();
            match mirrors.get(id) {
                Some(body) => {
                    if let Some(section) = b.sections.first_mut() {
                        section.body = body.clone();
                    }
                }
                None => {
                    log_warn!("Function call '{}' has no matching definition", id);
                }
            }
        });
    }
}

/// The name a block registers with the variable registry, if it is a
/// variable-producing block.
fn variable_producer_name(block: &Block) -> Option<&str> {
    match block.block_type() {
        Some(BlockType::SetVariable) | Some(BlockType::Variable) => block.variable_name(),
        _ => None,
    }
}

/// Mutable document-order walk over a block subtree.
fn for_each_block_mut(block: &mut Block, visit: &mut impl FnMut(&mut Block)) {
    visit(block);
    for section in &mut block.sections {
        for item in &mut section.header.items {
            if let HeaderItem::Slot { input } = item {
                if let Some(op) = &mut input.operation {
                    for_each_block_mut(op, visit);
                }
            }
        }
        for child in &mut section.body {
            for_each_block_mut(child, visit);
        }
    }
    for child in &mut block.outer_area {
        for_each_block_mut(child, visit);
    }
}
