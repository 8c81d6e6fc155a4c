use std::io::Write;

use super::*;
use crate::blocks::testkit::*;
use crate::blocks::{BlockKind, BlockType};

fn flatten(document: &BlockDocument) -> Vec<(String, Option<String>)> {
    let mut out = Vec::new();
    document.walk(&mut |block| {
        out.push((block.name.clone(), block.define_id.clone()));
    });
    out
}

fn load(text: &str) -> (BlockDocument, VariableStore) {
    let mut document = BlockDocument::new();
    let mut registry = VariableStore::new();
    deserialize(text, &mut document, &mut registry);
    (document, registry)
}

#[test]
fn round_trip_preserves_kinds_values_and_order() {
    let document = BlockDocument {
        blocks: vec![
            define("Spin", Some("speed"), vec![analog_write("9", "speed")]),
            set_variable("speed", "150"),
            forever(vec![analog_write("9", "200"), forward("1")]),
        ],
    };

    let text = serialize(&document);
    let (reloaded, _) = load(&text);
    assert_eq!(flatten(&reloaded), flatten(&document));

    // A second trip is textually stable.
    assert_eq!(serialize(&reloaded), text);
}

#[test]
fn round_trip_preserves_input_literals() {
    let document = BlockDocument {
        blocks: vec![forever(vec![analog_write("9", "200")])],
    };
    let (reloaded, _) = load(&serialize(&document));
    let body = &reloaded.blocks[0].sections[0].body[0];
    assert_eq!(body.block_type(), Some(BlockType::AnalogWrite));
    let inputs = body.inputs();
    assert!(matches!(inputs[0], crate::blocks::InputRef::Literal("9")));
    assert!(matches!(inputs[1], crate::blocks::InputRef::Literal("200")));
}

#[test]
fn defines_are_sorted_to_the_front() {
    let document = BlockDocument {
        blocks: vec![
            forever(vec![]),
            define("Spin", None, vec![forward("1")]),
        ],
    };
    let text = serialize(&document);
    let chunks: Vec<&str> = text.split(CHUNK_SEPARATOR).collect();
    assert_eq!(chunks.len(), 2);
    assert!(chunks[0].contains("functionDefine"));
}

#[test]
fn unknown_kinds_and_malformed_chunks_are_skipped() {
    let good = serde_json::to_string(&forward("1")).unwrap();
    let unknown = r#"{"name":"teleport","kind":"statement"}"#;
    let text = format!("{}{}{}{}not json", good, CHUNK_SEPARATOR, unknown, CHUNK_SEPARATOR);
    let (document, _) = load(&text);
    assert_eq!(document.blocks.len(), 1);
    assert_eq!(document.blocks[0].name, "forward");
}

#[test]
fn empty_chunks_are_skipped() {
    let (document, _) = load("\u{1E}\u{1E}  \u{1E}");
    assert!(document.blocks.is_empty());
}

#[test]
fn separator_cannot_leak_from_payload_text() {
    let mut block = set_variable("name\u{1E}with separator", "1");
    block.sections[0].header.items.push(crate::blocks::HeaderItem::Label {
        text: "label\u{1E}text".to_owned(),
    });
    let document = BlockDocument {
        blocks: vec![block],
    };
    let text = serialize(&document);
    // The separator splits into exactly one chunk: the payload copies were
    // escaped by the JSON encoder.
    assert_eq!(text.split(CHUNK_SEPARATOR).count(), 1);
    let (reloaded, _) = load(&text);
    assert_eq!(
        reloaded.blocks[0].variable_name(),
        Some("name\u{1E}with separator")
    );
}

#[test]
fn variables_register_in_document_order_including_nested() {
    let document = BlockDocument {
        blocks: vec![
            set_variable("speed", "100"),
            forever(vec![analog_write_op_value("9", variable_op("limit"))]),
        ],
    };
    let (_, registry) = load(&serialize(&document));
    assert!(registry.contains("speed"));
    assert!(registry.contains("limit"));
}

#[test]
fn registration_skips_already_registered_names() {
    let document = BlockDocument {
        blocks: vec![set_variable("speed", "100")],
    };
    let mut target = BlockDocument::new();
    let mut registry = VariableStore::new();
    registry.insert("speed".to_owned(), 42.0);
    deserialize(&serialize(&document), &mut target, &mut registry);
    assert_eq!(registry.get("speed"), Some(42.0));
}

#[test]
fn call_mirror_is_rebuilt_from_the_definition() {
    let definition = define("Spin", Some("speed"), vec![analog_write("10", "speed")]);
    let id = definition.define_id.clone().unwrap();
    let document = BlockDocument {
        blocks: vec![
            // The call appears before its definition in the text.
            forever(vec![call(&id, "150")]),
            definition,
        ],
    };

    let (reloaded, _) = load(&serialize(&document));
    let call_block = &reloaded.blocks[1].sections[0].body[0];
    assert_eq!(call_block.block_type(), Some(BlockType::FunctionCall));
    assert_eq!(call_block.sections[0].body.len(), 1);
    assert_eq!(call_block.sections[0].body[0].name, "analogWrite");
}

#[test]
fn duplicate_definitions_keep_the_first() {
    let definition = define("Spin", None, vec![forward("1")]);
    let id = definition.define_id.clone().unwrap();
    let text = format!(
        "{}{}{}",
        serde_json::to_string(&definition).unwrap(),
        CHUNK_SEPARATOR,
        serde_json::to_string(&definition).unwrap()
    );
    let (document, _) = load(&text);
    assert_eq!(document.blocks.len(), 1);
    assert_eq!(document.blocks[0].define_id.as_deref(), Some(id.as_str()));
}

#[test]
fn outer_area_children_survive_the_trip() {
    let mut block = forever(vec![]);
    block.outer_area.push(set_variable("speed", "80"));
    let document = BlockDocument {
        blocks: vec![block],
    };
    let (reloaded, registry) = load(&serialize(&document));
    assert_eq!(reloaded.blocks[0].outer_area.len(), 1);
    assert_eq!(reloaded.blocks[0].outer_area[0].kind, BlockKind::Statement);
    assert!(registry.contains("speed"));
}

#[test]
fn round_trip_through_a_file() {
    let document = BlockDocument {
        blocks: vec![
            set_variable("speed", "150"),
            forever(vec![analog_write("9", "speed")]),
        ],
    };
    let text = serialize(&document);

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(text.as_bytes()).unwrap();
    let read_back = std::fs::read_to_string(file.path()).unwrap();

    let (reloaded, _) = load(&read_back);
    assert_eq!(flatten(&reloaded), flatten(&document));
}
