//! Block builders shared by the serializer, compiler and engine tests.

use super::{Block, BlockType, HeaderItem, Input, Section, VariableBinding};

pub fn set_variable(name: &str, value: &str) -> Block {
    let mut block = Block::new(BlockType::SetVariable);
    block.variable_binding = Some(VariableBinding {
        manager: "global".to_owned(),
        name: name.to_owned(),
    });
    block.sections.push(Section::with_items(vec![
        HeaderItem::Label {
            text: format!("set {} to", name),
        },
        HeaderItem::Slot {
            input: Input::literal(value),
        },
    ]));
    block
}

pub fn variable_op(name: &str) -> Block {
    let mut block = Block::new(BlockType::Variable);
    block.variable_binding = Some(VariableBinding {
        manager: "global".to_owned(),
        name: name.to_owned(),
    });
    block
}

pub fn digital_read_op(pin: &str) -> Block {
    let mut block = Block::new(BlockType::DigitalRead);
    block.kind = super::BlockKind::Operation;
    block.sections.push(Section::with_items(vec![
        HeaderItem::Label {
            text: "read pin".to_owned(),
        },
        HeaderItem::Field {
            value: pin.to_owned(),
        },
    ]));
    block
}

pub fn analog_write(pin: &str, value: &str) -> Block {
    statement_with_inputs(BlockType::AnalogWrite, "write pin", &[pin, value])
}

pub fn analog_write_op_value(pin: &str, value_op: Block) -> Block {
    let mut block = Block::new(BlockType::AnalogWrite);
    block.sections.push(Section::with_items(vec![
        HeaderItem::Label {
            text: "write pin".to_owned(),
        },
        HeaderItem::Field {
            value: pin.to_owned(),
        },
        HeaderItem::Slot {
            input: Input::operation(value_op),
        },
    ]));
    block
}

pub fn forward(speed: &str) -> Block {
    statement_with_inputs(BlockType::Forward, "move forward", &[speed])
}

pub fn wait(seconds: &str) -> Block {
    statement_with_inputs(BlockType::Wait, "wait seconds", &[seconds])
}

pub fn repeat(count: &str, body: Vec<Block>) -> Block {
    let mut block = Block::new(BlockType::Repeat);
    block.sections.push(Section::with_body(
        vec![
            HeaderItem::Label {
                text: "repeat".to_owned(),
            },
            HeaderItem::Field {
                value: count.to_owned(),
            },
        ],
        body,
    ));
    block
}

pub fn forever(body: Vec<Block>) -> Block {
    let mut block = Block::new(BlockType::Forever);
    block.sections.push(Section::with_body(
        vec![HeaderItem::Label {
            text: "repeat forever".to_owned(),
        }],
        body,
    ));
    block
}

pub fn if_block(condition: Block, body: Vec<Block>) -> Block {
    let mut block = Block::new(BlockType::If);
    block.sections.push(Section::with_body(
        vec![
            HeaderItem::Label {
                text: "if".to_owned(),
            },
            HeaderItem::Slot {
                input: Input::operation(condition),
            },
        ],
        body,
    ));
    block
}

pub fn if_else_block(condition: Block, body: Vec<Block>, else_body: Vec<Block>) -> Block {
    let mut block = Block::new(BlockType::IfElse);
    block.sections.push(Section::with_body(
        vec![
            HeaderItem::Label {
                text: "if".to_owned(),
            },
            HeaderItem::Slot {
                input: Input::operation(condition),
            },
        ],
        body,
    ));
    block.sections.push(Section::with_body(
        vec![HeaderItem::Label {
            text: "else".to_owned(),
        }],
        else_body,
    ));
    block
}

pub fn define(label: &str, parameter: Option<&str>, body: Vec<Block>) -> Block {
    let mut block = Block::new(BlockType::FunctionDefine);
    let mut items = vec![HeaderItem::Label {
        text: label.to_owned(),
    }];
    if let Some(name) = parameter {
        items.push(HeaderItem::LocalVariable {
            name: name.to_owned(),
        });
    }
    block.sections.push(Section::with_body(items, body));
    block.define_id = Some(block.compute_define_id());
    block
}

pub fn call(define_id: &str, arg: &str) -> Block {
    let mut block = Block::new(BlockType::FunctionCall);
    block.define_id = Some(define_id.to_owned());
    block.sections.push(Section::with_items(vec![
        HeaderItem::Label {
            text: define_id.to_owned(),
        },
        HeaderItem::Slot {
            input: Input::literal(arg),
        },
    ]));
    block
}

fn statement_with_inputs(block_type: BlockType, label: &str, inputs: &[&str]) -> Block {
    let mut block = Block::new(block_type);
    let mut items = vec![HeaderItem::Label {
        text: label.to_owned(),
    }];
    for input in inputs {
        items.push(HeaderItem::Slot {
            input: Input::literal(input),
        });
    }
    block.sections.push(Section::with_items(items));
    block
}
