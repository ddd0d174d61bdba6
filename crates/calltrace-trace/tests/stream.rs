use std::io::Cursor;

use calltrace_trace::stream::{decode_value, encode_value};
use calltrace_trace::{
    ArgRecord, CallEnd, CallStatus, MemoryCapture, ObjectId, StreamReader, StreamWriter,
    TraceConfig, TraceReadError, TraceWriter, Value,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn arb_value() -> impl Strategy<Value = Value> {
    let scalars = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::SInt),
        any::<u64>().prop_map(Value::UInt),
        (-1.0e6f32..1.0e6).prop_map(Value::Float),
        (-1.0e12f64..1.0e12).prop_map(Value::Double),
    ];
    let named = prop_oneof![
        "[a-zA-Z0-9_ ]{0,12}".prop_map(Value::String),
        (proptest::option::of("[A-Z_]{1,10}"), any::<i64>())
            .prop_map(|(name, value)| Value::Enum { name, value }),
        (any::<u64>(), prop::collection::vec("[A-Z_]{1,8}", 0..3))
            .prop_map(|(value, names)| Value::Flags { value, names }),
        prop::collection::vec(any::<u8>(), 0..32).prop_map(Value::Blob),
        any::<u64>().prop_map(Value::Pointer),
        any::<u64>().prop_map(|id| Value::Object(ObjectId(id))),
    ];
    let leaf = prop_oneof![scalars, named];
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            ("[A-Z0-9_]{1,12}", prop::collection::vec(("[a-zA-Z]{1,8}", inner), 0..4))
                .prop_map(|(name, fields)| Value::Struct { name, fields }),
        ]
    })
}

proptest! {
    #[test]
    fn values_survive_the_codec(value in arb_value()) {
        let mut bytes = Vec::new();
        encode_value(&mut bytes, &value).unwrap();
        prop_assert_eq!(decode_value(&bytes).unwrap(), value);
    }
}

fn write_two_calls<W: std::io::Write + Send>(writer: &StreamWriter<W>) {
    let id = writer.begin("IDirect3DDevice9::SetVertexShaderConstantF").unwrap();
    writer
        .write(
            id,
            ArgRecord {
                index: 0,
                name: "StartRegister".into(),
                before: Some(Value::UInt(4)),
                after: None,
            },
        )
        .unwrap();
    writer
        .end(
            id,
            CallEnd {
                this: Some(ObjectId(1)),
                ret: Some(Value::SInt(0)),
                status: CallStatus::Completed,
                memory: vec![MemoryCapture {
                    address: 0x1000,
                    bytes: vec![1, 2, 3],
                }],
                side_effects: true,
            },
        )
        .unwrap();

    let id = writer.begin("Direct3DCreate9Ex").unwrap();
    writer
        .end(
            id,
            CallEnd {
                this: None,
                ret: Some(Value::SInt(0x8876_0a9c_u32 as i32 as i64)),
                status: CallStatus::Unresolved,
                memory: Vec::new(),
                side_effects: false,
            },
        )
        .unwrap();
}

#[test]
fn records_round_trip_through_a_stream() {
    let writer = StreamWriter::new(Vec::new()).unwrap();
    write_two_calls(&writer);
    let bytes = writer.into_inner();

    let mut reader = StreamReader::new(Cursor::new(bytes)).unwrap();
    let records = reader.read_all().unwrap();
    assert!(!reader.truncated());
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].name, "IDirect3DDevice9::SetVertexShaderConstantF");
    assert_eq!(records[0].this, Some(ObjectId(1)));
    assert_eq!(
        records[0].arg("StartRegister").unwrap().before,
        Some(Value::UInt(4))
    );
    assert_eq!(records[0].memory[0].bytes, vec![1, 2, 3]);
    assert_eq!(records[1].status, CallStatus::Unresolved);
    assert!(!records[1].side_effects);
    assert!(records[1].id > records[0].id);
}

#[test]
fn truncated_final_record_is_tolerated() {
    let writer = StreamWriter::new(Vec::new()).unwrap();
    write_two_calls(&writer);
    let mut bytes = writer.into_inner();
    bytes.truncate(bytes.len() - 3);

    let mut reader = StreamReader::new(Cursor::new(bytes)).unwrap();
    let records = reader.read_all().unwrap();
    assert_eq!(records.len(), 1);
    assert!(reader.truncated());
}

#[test]
fn truncated_length_prefix_is_tolerated() {
    let writer = StreamWriter::new(Vec::new()).unwrap();
    write_two_calls(&writer);
    let mut bytes = writer.into_inner();
    bytes.extend_from_slice(&[7, 0]);

    let mut reader = StreamReader::new(Cursor::new(bytes)).unwrap();
    assert_eq!(reader.read_all().unwrap().len(), 2);
    assert!(reader.truncated());
}

#[test]
fn foreign_input_is_rejected() {
    assert!(matches!(
        StreamReader::new(Cursor::new(b"NOTATRACE".to_vec())),
        Err(TraceReadError::InvalidMagic)
    ));
}

#[test]
fn config_writer_produces_a_readable_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.trace");
    let config = TraceConfig::from_lookup(|key| {
        (key == "CALLTRACE_OUTPUT").then(|| path.to_string_lossy().into_owned())
    });
    let writer = config.open_writer().unwrap();
    write_two_calls(&writer);
    writer.flush().unwrap();
    drop(writer);

    let file = std::fs::File::open(&path).unwrap();
    let mut reader = StreamReader::new(std::io::BufReader::new(file)).unwrap();
    assert_eq!(reader.read_all().unwrap().len(), 2);
}
