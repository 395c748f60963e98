use bytes::Bytes;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::io::Cursor;

use rustaof::classification::SpecialCommand;
use rustaof::{Classify, Error, Operation, OperationReader, OperationWriter, RedisCommands};
use strum::IntoEnumIterator;

const COMMANDS: &[&str] = &[
    "SET", "SADD", "HSET", "DEL", "EXPIREAT", "lpush", "Incr", "ZADD",
];

// A log like the ones Redis writes: a database selection followed by a few mutations.
const LOG: &[u8] = b"*2\r\n$6\r\nSELECT\r\n$1\r\n0\r\n\
*3\r\n$3\r\nSET\r\n$3\r\nfoo\r\n$3\r\nbar\r\n\
*4\r\n$4\r\nSADD\r\n$2\r\nk1\r\n$2\r\nk2\r\n$2\r\nk3\r\n\
*3\r\n$4\r\nSADD\r\n$2\r\nk1\r\n$2\r\nk4\r\n";

fn encode(ops: &[Operation]) -> Vec<u8> {
    let mut writer = OperationWriter::new(Vec::new());
    for op in ops {
        writer.write_operation(op).unwrap();
    }
    writer.into_inner()
}

fn decode(data: &[u8]) -> Vec<Operation> {
    OperationReader::new(Cursor::new(data))
        .collect::<Result<Vec<_>, _>>()
        .unwrap()
}

// Any byte may appear in a key or a value, except the line terminator.
fn random_bytes(rng: &mut StdRng, max_len: usize) -> Bytes {
    let len = rng.gen_range(0..=max_len);
    let mut bytes = Vec::with_capacity(len);
    while bytes.len() < len {
        let byte: u8 = rng.gen();
        if byte != b'\n' {
            bytes.push(byte);
        }
    }
    Bytes::from(bytes)
}

fn random_operation(rng: &mut StdRng) -> Operation {
    let special = SpecialCommand::iter().collect::<Vec<_>>();

    let command = if rng.gen_bool(0.3) {
        special[rng.gen_range(0..special.len())].as_ref().to_string()
    } else {
        COMMANDS[rng.gen_range(0..COMMANDS.len())].to_string()
    };

    let mut op = Operation::new(command.clone());
    if RedisCommands.has_sub_op(&command) {
        op = op.with_sub_op(["AND", "OR", "XOR", "NOT"][rng.gen_range(0..4)]);
    }
    if RedisCommands.has_key(&command) {
        op = op.with_key(random_bytes(rng, 16));
    }

    let arguments = (0..rng.gen_range(0..6))
        .map(|_| random_bytes(rng, 64))
        .collect::<Vec<_>>();
    op.with_arguments(arguments)
}

#[test]
fn decode_of_encode_is_identity() {
    let mut rng = StdRng::seed_from_u64(0x0a0f);

    for _ in 0..200 {
        let ops = (0..rng.gen_range(1..10))
            .map(|_| random_operation(&mut rng))
            .collect::<Vec<_>>();

        assert_eq!(decode(&encode(&ops)), ops);
    }
}

#[test]
fn encode_of_decode_reproduces_bytes() {
    let mut rng = StdRng::seed_from_u64(0xb17);

    for _ in 0..200 {
        let ops = (0..rng.gen_range(1..10))
            .map(|_| random_operation(&mut rng))
            .collect::<Vec<_>>();
        let bytes = encode(&ops);

        assert_eq!(encode(&decode(&bytes)), bytes);
    }
}

#[test]
fn read_log() {
    let ops = decode(LOG);

    assert_eq!(
        ops,
        vec![
            Operation::new("SELECT").with_arguments(["0"]),
            Operation::new("SET").with_key("foo").with_arguments(["bar"]),
            Operation::new("SADD")
                .with_key("k1")
                .with_arguments(["k2", "k3"]),
            Operation::new("SADD").with_key("k1").with_arguments(["k4"]),
        ]
    );
    assert_eq!(encode(&ops), LOG);
}

#[test]
fn read_log_until_end_of_stream() {
    let mut reader = OperationReader::new(Cursor::new(LOG));

    for command in ["SELECT", "SET", "SADD", "SADD"] {
        assert_eq!(reader.read_operation().unwrap().command, command);
    }

    assert!(matches!(reader.read_operation(), Err(Error::EndOfStream)));
    assert_eq!(reader.position(), LOG.len() as u64);
}

#[test]
fn keyless_command_with_key_round_trips_without_key() {
    let op = Operation::new("SELECT")
        .with_key("dropped")
        .with_arguments(["2"]);

    let bytes = encode(&[op]);

    assert_eq!(bytes, b"*2\r\n$6\r\nSELECT\r\n$1\r\n2\r\n");
    assert_eq!(
        decode(&bytes),
        vec![Operation::new("SELECT").with_arguments(["2"])]
    );
}

#[test]
fn binary_values_round_trip() {
    let op = Operation::new("SET")
        .with_key(&b"\x00\r"[..])
        .with_arguments([&b"\xff\xfe\x00"[..], &b"\r\r"[..], &b""[..]]);

    let bytes = encode(&[op.clone()]);

    assert_eq!(
        bytes,
        &b"*5\r\n$3\r\nSET\r\n$2\r\n\x00\r\r\n$3\r\n\xff\xfe\x00\r\n$2\r\n\r\r\r\n$0\r\n\r\n"[..]
    );
    assert_eq!(decode(&bytes), vec![op]);
}

#[test]
fn sub_operation_round_trip() {
    let op = Operation::new("BITOP")
        .with_sub_op("XOR")
        .with_key("k3")
        .with_arguments(["a", "b"]);

    let bytes = encode(&[op.clone()]);

    assert!(bytes.starts_with(b"*5\r\n$5\r\nBITOP\r\n$3\r\nXOR\r\n$2\r\nk3\r\n"));
    assert_eq!(decode(&bytes), vec![op]);
}

#[test]
fn truncated_logs_are_corrupt() {
    // Every proper prefix ending inside a record fails with a corrupt record, or with a plain end
    // of stream when only part of the header line made it.
    let first = decode(LOG).remove(0);
    let first_len = encode(&[first]).len();

    for end in first_len + 1..LOG.len() {
        let mut reader = OperationReader::new(Cursor::new(&LOG[..end]));
        let mut result = reader.read_operation();
        while result.is_ok() {
            result = reader.read_operation();
        }

        let err = result.unwrap_err();
        assert!(err.is_truncation(), "prefix of {} bytes: {:?}", end, err);
    }
}
