use pretty_assertions::assert_eq;

use crate::compiler::compile;
use crate::program::{Opcode, Program};
use crate::SerializationError;

#[test]
fn serialization() {
    let program = compile(r"(foo|bar)\1").unwrap();
    let bytes = program.serialize().unwrap();

    assert_eq!(&bytes[0..4], b"REXP");

    let restored = Program::deserialize(&bytes).unwrap();

    assert_eq!(program, restored);
    assert!(restored.has_backrefs());
    assert_eq!(restored.paren_count(), 2);

    let program = compile("hello+").unwrap();
    let restored = Program::deserialize(program.serialize().unwrap()).unwrap();

    assert_eq!(restored.prefix(), Some(&['h', 'e', 'l', 'l'][..]));
}

#[test]
fn serialization_with_reader_and_writer() {
    let program = compile("a*?b").unwrap();
    let mut bytes = Vec::new();

    program.serialize_into(&mut bytes).unwrap();

    let restored = Program::deserialize_from(bytes.as_slice()).unwrap();
    assert_eq!(program, restored);
}

#[test]
fn deserialization_errors() {
    assert!(matches!(
        Program::deserialize(b""),
        Err(SerializationError::InvalidFormat)
    ));

    assert!(matches!(
        Program::deserialize(b"YARA\x00\x00"),
        Err(SerializationError::InvalidFormat)
    ));

    assert!(matches!(
        Program::deserialize(b"REXP"),
        Err(SerializationError::InvalidEncoding(_))
    ));
}

/// Serializes `code` without any validation, and returns the result of
/// deserializing it.
fn reload(
    code: Vec<u32>,
    paren_count: usize,
) -> Result<Program, SerializationError> {
    let program = Program {
        code: code.into_boxed_slice(),
        paren_count,
        prefix: None,
        has_backrefs: false,
    };
    Program::deserialize(program.serialize().unwrap())
}

#[test]
fn corrupt_programs_are_rejected() {
    let end = Opcode::End as u32;
    let branch = Opcode::Branch as u32;

    // Sanity check, a minimal program is accepted.
    assert!(reload(vec![branch, 0, 3, end, 0, 0], 1).is_ok());

    // Empty program.
    assert!(reload(vec![], 1).is_err());

    // Unknown opcode.
    assert!(reload(vec![0xff, 0, 3, end, 0, 0], 1).is_err());

    // Truncated node.
    assert!(reload(vec![branch, 0, 3, end, 0], 1).is_err());

    // Jump out of the program.
    assert!(reload(vec![branch, 0, 100, end, 0, 0], 1).is_err());
    assert!(reload(vec![branch, 0, -3_i32 as u32, end, 0, 0], 1).is_err());

    // Node without successor that is not END.
    assert!(reload(vec![branch, 0, 0, end, 0, 0], 1).is_err());

    // The matcher doesn't execute STAR.
    assert!(reload(vec![Opcode::Star as u32, 0, 3, end, 0, 0], 1).is_err());

    // Group that doesn't exist.
    assert!(reload(vec![Opcode::Open as u32, 1, 3, end, 0, 0], 1).is_err());

    // Invalid character in an atom.
    assert!(
        reload(vec![Opcode::Atom as u32, 1, 4, 0xd800, end, 0, 0], 1).is_err()
    );

    // Reversed range.
    assert!(reload(
        vec![Opcode::AnyOf as u32, 1, 5, 'z' as u32, 'a' as u32, end, 0, 0],
        1
    )
    .is_err());

    // Jump into the characters of an atom.
    let atom = Opcode::Atom as u32;
    assert!(reload(vec![branch, 0, 3, atom, 1, 4, 'a' as u32, end, 0, 0], 1)
        .is_ok());
    assert!(reload(vec![branch, 0, 4, atom, 1, 4, 'a' as u32, end, 0, 0], 1)
        .is_err());

    // Too many groups.
    assert!(reload(vec![branch, 0, 3, end, 0, 0], u16::MAX as usize + 1)
        .is_ok());
    assert!(reload(vec![branch, 0, 3, end, 0, 0], u16::MAX as usize + 2)
        .is_err());

    // The body of a reluctant closure must end with END.
    let star = Opcode::ReluctantStar as u32;
    let nothing = Opcode::Nothing as u32;
    assert!(reload(vec![star, 0, 9, nothing, 0, 3, end, 0, 0, end, 0, 0], 1)
        .is_ok());
    assert!(reload(
        vec![star, 0, 9, nothing, 0, 3, nothing, 0, 3, end, 0, 0],
        1
    )
    .is_err());

    // Compiled programs that are valid keep being valid.
    let program = compile(r"x(?:a+?|b)*?y").unwrap();
    assert!(reload(program.code().to_vec(), program.paren_count()).is_ok());

    let program = compile(r"(a)(?:b|c)*\1").unwrap();
    assert!(reload(program.code().to_vec(), program.paren_count()).is_ok());
    assert!(reload(program.code().to_vec(), 1).is_err());
}

#[test]
fn nodes() {
    let program = compile("ab|c").unwrap();
    let opcodes: Vec<Opcode> = program.nodes().map(|node| node.opcode).collect();

    assert_eq!(
        opcodes,
        vec![
            Opcode::Branch,
            Opcode::Atom,
            Opcode::Branch,
            Opcode::Atom,
            Opcode::End
        ]
    );

    let addrs: Vec<usize> = program.nodes().map(|node| node.addr).collect();
    assert_eq!(addrs, vec![0, 3, 8, 11, 15]);
}

#[test]
fn display() {
    let program = compile(r"^\b[:space:].$").unwrap();

    assert_eq!(
        program.to_string(),
        r#"
00000: BRANCH -> 00018
00003: BOL -> 00006
00006: ESCAPE \b -> 00009
00009: POSIXCLASS [:space:] -> 00012
00012: ANY -> 00015
00015: EOL -> 00018
00018: END
"#
    );
}
