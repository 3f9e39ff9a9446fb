//! Integration tests that hand-lay buffers exactly as the engine does and
//! decode them through the public API.

use quiver_common::types::{LogicalType, TypeId, Value};
use quiver_common::utils::{Error, IndexKind};
use quiver_core::memory::layout::{self, ListEntry};
use quiver_core::{Chunk, RawVector, STANDARD_VECTOR_SIZE, VectorBuilder};

fn int_vector(values: &[i32]) -> RawVector {
    RawVector {
        logical_type: LogicalType::INTEGER,
        len: values.len(),
        data: values.iter().flat_map(|v| v.to_ne_bytes()).collect(),
        validity: None,
        heap: Box::default(),
        children: Vec::new(),
    }
}

fn entries(list: &[(u64, u64)]) -> Box<[u8]> {
    list.iter()
        .flat_map(|&(o, l)| ListEntry::new(o, l).to_bytes())
        .collect()
}

#[test]
fn list_of_list_of_int_from_engine_buffers() {
    // [[1, 2], [3, 4, 5]]
    let inner = RawVector {
        logical_type: LogicalType::list_of(LogicalType::INTEGER),
        len: 2,
        data: entries(&[(0, 2), (2, 3)]),
        validity: None,
        heap: Box::default(),
        children: vec![int_vector(&[1, 2, 3, 4, 5])],
    };
    let outer = RawVector {
        logical_type: LogicalType::list_of(LogicalType::list_of(LogicalType::INTEGER)),
        len: 1,
        data: entries(&[(0, 2)]),
        validity: None,
        heap: Box::default(),
        children: vec![inner],
    };
    let chunk = Chunk::from_raw(1, STANDARD_VECTOR_SIZE, vec![outer]).unwrap();

    let rows = chunk.column::<Vec<Option<Vec<Option<i32>>>>>(0).unwrap();
    let outer = rows[0].as_ref().unwrap();
    assert_eq!(outer.len(), 2);
    assert_eq!(outer[0], Some(vec![Some(1), Some(2)]));
    assert_eq!(outer[1], Some(vec![Some(3), Some(4), Some(5)]));

    let leaf = chunk
        .vector(0)
        .unwrap()
        .list_child()
        .unwrap()
        .list_child()
        .unwrap();
    assert!(chunk.typed::<i32>(0).is_err());
    let leaf_values: Vec<i32> = leaf
        .data()
        .chunks_exact(4)
        .map(|b| i32::from_ne_bytes([b[0], b[1], b[2], b[3]]))
        .collect();
    assert_eq!(leaf_values, vec![1, 2, 3, 4, 5]);
}

#[test]
fn strings_from_engine_buffers() {
    let long = b"cdefghijklmnopqrstuvwxyz";
    let heap: Box<[u8]> = long.to_vec().into_boxed_slice();
    let base = heap.as_ptr() as usize as u64;

    let mut data = Vec::new();
    data.extend_from_slice(&layout::encode_string_record(b"hello", 0).unwrap());
    let mut rec = layout::encode_string_record(long, 0).unwrap();
    layout::rebase_string_record(&mut rec, base);
    data.extend_from_slice(&rec);

    let col = RawVector {
        logical_type: LogicalType::VARCHAR,
        len: 2,
        data: data.into_boxed_slice(),
        validity: None,
        heap,
        children: Vec::new(),
    };
    // Moving the box into the chunk keeps the heap allocation in place.
    let chunk = Chunk::from_raw(2, STANDARD_VECTOR_SIZE, vec![col]).unwrap();
    assert_eq!(
        chunk.column::<String>(0).unwrap(),
        vec![
            Some("hello".to_string()),
            Some("cdefghijklmnopqrstuvwxyz".to_string())
        ]
    );
}

#[test]
fn string_pointer_into_another_vector_is_a_layout_error() {
    let long = b"cdefghijklmnopqrstuvwxyz";
    let foreign: Box<[u8]> = long.to_vec().into_boxed_slice();
    let mut rec = layout::encode_string_record(long, 0).unwrap();
    layout::rebase_string_record(&mut rec, foreign.as_ptr() as usize as u64);

    let col = RawVector {
        logical_type: LogicalType::VARCHAR,
        len: 1,
        data: rec.to_vec().into_boxed_slice(),
        validity: None,
        heap: Box::default(),
        children: Vec::new(),
    };
    let chunk = Chunk::from_raw(1, STANDARD_VECTOR_SIZE, vec![col]).unwrap();
    assert!(matches!(chunk.get::<String>(0, 0), Err(Error::Layout(_))));
    assert!(matches!(chunk.value(0, 0), Err(Error::Layout(_))));
}

#[test]
fn invalid_utf8_is_reported_with_row() {
    let mut data = Vec::new();
    data.extend_from_slice(&layout::encode_string_record(b"ok", 0).unwrap());
    data.extend_from_slice(&layout::encode_string_record(&[0xff, 0xfe], 0).unwrap());
    let col = RawVector {
        logical_type: LogicalType::VARCHAR,
        len: 2,
        data: data.into_boxed_slice(),
        validity: None,
        heap: Box::default(),
        children: Vec::new(),
    };
    let chunk = Chunk::from_raw(2, STANDARD_VECTOR_SIZE, vec![col]).unwrap();
    assert_eq!(chunk.get::<String>(0, 0).unwrap(), Some("ok".into()));
    assert_eq!(
        chunk.get::<String>(0, 1).unwrap_err(),
        Error::InvalidUtf8 { row: 1 }
    );
}

#[test]
fn invalid_row_is_never_read() {
    // Row 1 is NULL and its bytes are garbage; decoding must not look at them.
    let mut col = int_vector(&[10, -1, 30]);
    col.validity = Some(vec![0b101].into_boxed_slice());
    let chunk = Chunk::from_raw(3, STANDARD_VECTOR_SIZE, vec![col]).unwrap();
    assert_eq!(chunk.column::<i32>(0).unwrap(), vec![Some(10), None, Some(30)]);
    assert!(chunk.is_null(0, 1).unwrap());
    assert!(!chunk.column_is_null(0).unwrap());
}

#[test]
fn null_list_row_with_garbage_entry_is_skipped() {
    let list = RawVector {
        logical_type: LogicalType::list_of(LogicalType::INTEGER),
        len: 2,
        data: entries(&[(0, 1), (u64::MAX, 99)]),
        validity: Some(vec![0b01].into_boxed_slice()),
        heap: Box::default(),
        children: vec![int_vector(&[7])],
    };
    let chunk = Chunk::from_raw(2, STANDARD_VECTOR_SIZE, vec![list]).unwrap();
    assert_eq!(
        chunk.column::<Vec<Option<i32>>>(0).unwrap(),
        vec![Some(vec![Some(7)]), None]
    );
}

#[test]
fn list_entry_past_child_is_a_layout_error() {
    let list = RawVector {
        logical_type: LogicalType::list_of(LogicalType::INTEGER),
        len: 1,
        data: entries(&[(0, 4)]),
        validity: None,
        heap: Box::default(),
        children: vec![int_vector(&[1, 2])],
    };
    let chunk = Chunk::from_raw(1, STANDARD_VECTOR_SIZE, vec![list]).unwrap();
    assert!(matches!(
        chunk.get::<Vec<Option<i32>>>(0, 0),
        Err(Error::Layout(_))
    ));
}

#[test]
fn all_null_column_semantics() {
    let mut nulls = int_vector(&[0, 0]);
    nulls.validity = Some(vec![0].into_boxed_slice());
    let no_bitmap = int_vector(&[1, 2]);
    let chunk = Chunk::from_raw(2, STANDARD_VECTOR_SIZE, vec![nulls, no_bitmap]).unwrap();
    assert!(chunk.column_is_null(0).unwrap());
    assert!(!chunk.column_is_null(1).unwrap());

    let mut empty = int_vector(&[]);
    empty.validity = Some(Vec::new().into_boxed_slice());
    let chunk = Chunk::from_raw(0, STANDARD_VECTOR_SIZE, vec![empty]).unwrap();
    assert!(!chunk.column_is_null(0).unwrap());
}

#[test]
fn indices_are_bounds_checked() {
    let chunk = Chunk::from_raw(5, STANDARD_VECTOR_SIZE, vec![int_vector(&[1, 2, 3, 4, 5])])
        .unwrap();
    assert_eq!(
        chunk.get::<i32>(0, 10).unwrap_err(),
        Error::OutOfBounds {
            what: IndexKind::Row,
            index: 10,
            bound: 5
        }
    );
    assert_eq!(
        chunk.value(1, 0).unwrap_err(),
        Error::OutOfBounds {
            what: IndexKind::Column,
            index: 1,
            bound: 1
        }
    );
    assert_eq!(chunk.value(0, 4).unwrap(), Value::Integer(5));
}

#[test]
fn cloned_vector_reads_strings_from_its_own_heap() {
    let mut builder = VectorBuilder::new(LogicalType::VARCHAR);
    builder.push("hello").unwrap();
    builder.push("cdefghijklmnopqrstuvwxyz").unwrap();
    let original = builder.finish();
    let copy = original.clone();
    assert_ne!(copy.heap.as_ptr(), original.heap.as_ptr());
    drop(original);

    let chunk = Chunk::from_raw(2, STANDARD_VECTOR_SIZE, vec![copy]).unwrap();
    assert_eq!(
        chunk.column::<String>(0).unwrap(),
        vec![
            Some("hello".to_string()),
            Some("cdefghijklmnopqrstuvwxyz".to_string())
        ]
    );
}

#[test]
fn cloned_list_relocates_child_strings() {
    let mut builder = VectorBuilder::new(LogicalType::list_of(LogicalType::VARCHAR));
    builder
        .push(vec!["a long string that lives in the heap", "short"])
        .unwrap();
    let copy = builder.finish().clone();

    let chunk = Chunk::from_raw(1, STANDARD_VECTOR_SIZE, vec![copy]).unwrap();
    assert_eq!(
        chunk.get::<Vec<Option<String>>>(0, 0).unwrap(),
        Some(vec![
            Some("a long string that lives in the heap".to_string()),
            Some("short".to_string())
        ])
    );
}

#[test]
fn cloned_foreign_pointer_stays_a_layout_error() {
    let long = b"cdefghijklmnopqrstuvwxyz";
    let foreign: Box<[u8]> = long.to_vec().into_boxed_slice();
    let mut rec = layout::encode_string_record(long, 0).unwrap();
    layout::rebase_string_record(&mut rec, foreign.as_ptr() as usize as u64);
    let col = RawVector {
        logical_type: LogicalType::VARCHAR,
        len: 1,
        data: rec.to_vec().into_boxed_slice(),
        validity: None,
        heap: vec![0u8; 4].into_boxed_slice(),
        children: Vec::new(),
    };
    let chunk = Chunk::from_raw(1, STANDARD_VECTOR_SIZE, vec![col.clone()]).unwrap();
    assert!(matches!(chunk.get::<String>(0, 0), Err(Error::Layout(_))));
}

#[test]
fn primitive_with_nested_tag_is_rejected() {
    let mut col = RawVector::empty(LogicalType::Primitive(TypeId::List));
    col.len = 1;
    col.data = vec![0u8; 16].into_boxed_slice();
    assert!(matches!(
        Chunk::from_raw(1, STANDARD_VECTOR_SIZE, vec![col]),
        Err(Error::Layout(_))
    ));

    let nested_child = RawVector {
        logical_type: LogicalType::list_of(LogicalType::Primitive(TypeId::Struct)),
        len: 0,
        data: Box::default(),
        validity: None,
        heap: Box::default(),
        children: vec![RawVector::empty(LogicalType::Primitive(TypeId::Struct))],
    };
    assert!(matches!(
        Chunk::from_raw(0, STANDARD_VECTOR_SIZE, vec![nested_child]),
        Err(Error::Layout(_))
    ));
}
