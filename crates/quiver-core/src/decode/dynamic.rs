//! Decoding into [`Value`] when the type is only known at run time.

use std::sync::Arc;

use arcstr::ArcStr;
use quiver_common::types::{Date, LogicalType, Time, Timestamp, TypeId, Value};
use quiver_common::utils::{Error, Result};

use super::{Decodable, DecodePath, PathSegment, mismatch};
use crate::chunk::Chunk;
use crate::memory::layout;
use crate::vector::Vector;

/// Fails with [`Error::Unsupported`] if any part of `ty` cannot be decoded.
///
/// # Errors
///
/// See above.
pub fn ensure_decodable(ty: &LogicalType) -> Result<()> {
    match ty.first_undecodable() {
        Some(unsupported) => Err(Error::Unsupported(unsupported.clone())),
        None => Ok(()),
    }
}

/// Compares `expected` against `actual` and reports the deepest point at
/// which they differ.
fn compare(expected: &LogicalType, actual: &LogicalType, path: &mut DecodePath) -> Result<()> {
    match (expected, actual) {
        (LogicalType::List(e), LogicalType::List(a)) => {
            path.within(PathSegment::Element, |p| compare(e, a, p))
        }
        (
            LogicalType::Array { child: e, size: es },
            LogicalType::Array { child: a, size: az },
        ) if es == az => path.within(PathSegment::Element, |p| compare(e, a, p)),
        (
            LogicalType::Map { key: ek, value: ev },
            LogicalType::Map { key: ak, value: av },
        ) => {
            path.within(PathSegment::Key, |p| compare(ek, ak, p))?;
            path.within(PathSegment::Value, |p| compare(ev, av, p))
        }
        (LogicalType::Struct(ef), LogicalType::Struct(af))
            if ef.len() == af.len() && ef.iter().zip(af).all(|(e, a)| e.name() == a.name()) =>
        {
            for (e, a) in ef.iter().zip(af) {
                path.within(PathSegment::Field(e.name_arc().clone()), |p| {
                    compare(e.logical_type(), a.logical_type(), p)
                })?;
            }
            Ok(())
        }
        (e, a) if e == a => Ok(()),
        (e, a) => Err(mismatch(e.clone(), a, path)),
    }
}

/// Decodes `row` of `vector` using the vector's own type.
///
/// # Errors
///
/// [`Error::Unsupported`] for types the decoder does not handle, or a
/// layout error.
pub fn read_value(vector: Vector<'_>, row: usize) -> Result<Value> {
    if vector.is_null(row) {
        return Ok(Value::Null);
    }
    let data = vector.data();
    let value = match vector.logical_type() {
        LogicalType::Primitive(id) => match id {
            TypeId::Boolean => Value::Bool(bool::read(vector, row)?),
            TypeId::TinyInt => Value::TinyInt(i8::read(vector, row)?),
            TypeId::SmallInt => Value::SmallInt(i16::read(vector, row)?),
            TypeId::Integer => Value::Integer(i32::read(vector, row)?),
            TypeId::BigInt => Value::BigInt(i64::read(vector, row)?),
            TypeId::UTinyInt => Value::UTinyInt(u8::read(vector, row)?),
            TypeId::USmallInt => Value::USmallInt(u16::read(vector, row)?),
            TypeId::UInteger => Value::UInteger(u32::read(vector, row)?),
            TypeId::UBigInt => Value::UBigInt(u64::read(vector, row)?),
            TypeId::Float => Value::Float(f32::read(vector, row)?),
            TypeId::Double => Value::Double(f64::read(vector, row)?),
            TypeId::HugeInt => Value::HugeInt(layout::read_hugeint(data, row)?),
            TypeId::UHugeInt => Value::UHugeInt(layout::read_uhugeint(data, row)?),
            TypeId::Date => Value::Date(Date::read(vector, row)?),
            TypeId::Time => Value::Time(Time::read(vector, row)?),
            TypeId::Timestamp => Value::Timestamp(Timestamp::read(vector, row)?),
            TypeId::Interval => Value::Interval(layout::read_interval(data, row)?),
            TypeId::Varchar => Value::String(ArcStr::from(vector.string(row)?)),
            _ => return Err(Error::Unsupported(vector.logical_type().clone())),
        },
        LogicalType::List(_) | LogicalType::Array { .. } => {
            let range = vector.list_range(row)?;
            let child = vector
                .list_child()
                .ok_or_else(|| Error::layout("list vector has no child"))?;
            let items: Vec<Value> = range
                .map(|r| read_value(child, r))
                .collect::<Result<_>>()?;
            Value::List(items.into())
        }
        LogicalType::Map { .. } => {
            let range = vector.list_range(row)?;
            let entries = vector
                .list_child()
                .ok_or_else(|| Error::layout("map vector has no entries child"))?;
            let keys = entries.struct_child(0)?;
            let values = entries.struct_child(1)?;
            let pairs: Vec<(Value, Value)> = range
                .map(|r| {
                    if keys.is_null(r) {
                        return Err(Error::layout(format!("map entry {r} has a NULL key")));
                    }
                    Ok((read_value(keys, r)?, read_value(values, r)?))
                })
                .collect::<Result<_>>()?;
            Value::Map(pairs.into())
        }
        LogicalType::Struct(fields) => {
            let values: Vec<(ArcStr, Value)> = fields
                .iter()
                .enumerate()
                .map(|(i, f)| Ok((f.name_arc().clone(), read_value(vector.struct_child(i)?, row)?)))
                .collect::<Result<_>>()?;
            Value::Struct(Arc::from(values))
        }
    };
    Ok(value)
}

/// Decodes a whole column, checking it against `expected` first.
///
/// # Errors
///
/// [`Error::OutOfBounds`] for a bad column, [`Error::TypeMismatch`] naming
/// the deepest disagreement, [`Error::Unsupported`], or a layout error.
pub fn decode_column_as(chunk: &Chunk, column: usize, expected: &LogicalType) -> Result<Vec<Value>> {
    let vector = checked_vector(chunk, column, expected)?;
    (0..vector.len()).map(|row| read_value(vector, row)).collect()
}

/// Decodes one cell, checking its column against `expected` first.
///
/// # Errors
///
/// As [`decode_column_as`], plus [`Error::OutOfBounds`] for a bad row.
pub fn decode_row_as(
    chunk: &Chunk,
    column: usize,
    row: usize,
    expected: &LogicalType,
) -> Result<Value> {
    let vector = checked_vector(chunk, column, expected)?;
    vector.check_row(row)?;
    read_value(vector, row)
}

fn checked_vector<'c>(chunk: &'c Chunk, column: usize, expected: &LogicalType) -> Result<Vector<'c>> {
    let vector = chunk.vector(column)?;
    compare(expected, vector.logical_type(), &mut DecodePath::column(column))?;
    ensure_decodable(vector.logical_type())?;
    Ok(vector)
}

/// `Value` inside typed containers accepts any decodable element type.
impl Decodable for Value {
    fn logical_type() -> LogicalType {
        LogicalType::Primitive(TypeId::Any)
    }

    fn check_type(actual: &LogicalType, _path: &mut DecodePath) -> Result<()> {
        ensure_decodable(actual)
    }

    fn read(vector: Vector<'_>, row: usize) -> Result<Self> {
        read_value(vector, row)
    }
}
