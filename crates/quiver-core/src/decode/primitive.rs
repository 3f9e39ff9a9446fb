//! Leaf decoders: fixed-width primitives, temporal types and strings.

use quiver_common::types::{Date, Interval, LogicalType, Time, Timestamp};
use quiver_common::utils::Result;

use super::Decodable;
use crate::memory::layout;
use crate::vector::Vector;

macro_rules! fixed_width {
    ($($ty:ty => $lt:ident, $width:literal;)*) => {
        $(
            impl Decodable for $ty {
                fn logical_type() -> LogicalType {
                    LogicalType::$lt
                }

                #[inline]
                fn read(vector: Vector<'_>, row: usize) -> Result<Self> {
                    let bytes = layout::read_array::<$width>(vector.data(), row)?;
                    Ok(<$ty>::from_ne_bytes(bytes))
                }
            }
        )*
    };
}

fixed_width! {
    i8 => TINYINT, 1;
    i16 => SMALLINT, 2;
    i32 => INTEGER, 4;
    i64 => BIGINT, 8;
    u8 => UTINYINT, 1;
    u16 => USMALLINT, 2;
    u32 => UINTEGER, 4;
    u64 => UBIGINT, 8;
    f32 => FLOAT, 4;
    f64 => DOUBLE, 8;
}

impl Decodable for bool {
    fn logical_type() -> LogicalType {
        LogicalType::BOOLEAN
    }

    #[inline]
    fn read(vector: Vector<'_>, row: usize) -> Result<Self> {
        let [byte] = layout::read_array::<1>(vector.data(), row)?;
        Ok(byte != 0)
    }
}

impl Decodable for i128 {
    fn logical_type() -> LogicalType {
        LogicalType::HUGEINT
    }

    fn read(vector: Vector<'_>, row: usize) -> Result<Self> {
        layout::read_hugeint(vector.data(), row)
    }
}

impl Decodable for u128 {
    fn logical_type() -> LogicalType {
        LogicalType::UHUGEINT
    }

    fn read(vector: Vector<'_>, row: usize) -> Result<Self> {
        layout::read_uhugeint(vector.data(), row)
    }
}

impl Decodable for Date {
    fn logical_type() -> LogicalType {
        LogicalType::DATE
    }

    fn read(vector: Vector<'_>, row: usize) -> Result<Self> {
        i32::read(vector, row).map(Date::from_days)
    }
}

impl Decodable for Time {
    fn logical_type() -> LogicalType {
        LogicalType::TIME
    }

    fn read(vector: Vector<'_>, row: usize) -> Result<Self> {
        i64::read(vector, row).map(Time::from_micros)
    }
}

impl Decodable for Timestamp {
    fn logical_type() -> LogicalType {
        LogicalType::TIMESTAMP
    }

    fn read(vector: Vector<'_>, row: usize) -> Result<Self> {
        i64::read(vector, row).map(Timestamp::from_micros)
    }
}

impl Decodable for Interval {
    fn logical_type() -> LogicalType {
        LogicalType::INTERVAL
    }

    fn read(vector: Vector<'_>, row: usize) -> Result<Self> {
        layout::read_interval(vector.data(), row)
    }
}

impl Decodable for String {
    fn logical_type() -> LogicalType {
        LogicalType::VARCHAR
    }

    fn read(vector: Vector<'_>, row: usize) -> Result<Self> {
        vector.string(row).map(str::to_owned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiver_common::types::Value;
    use quiver_common::utils::Error;

    use crate::builder::ChunkBuilder;
    use crate::chunk::Chunk;

    fn single(ty: LogicalType, values: Vec<Value>) -> Chunk {
        let mut b = ChunkBuilder::new(&[ty]);
        for v in values {
            b.append_row(&[v]).unwrap();
        }
        b.finish().unwrap()
    }

    #[test]
    fn test_nulls_decode_to_none() {
        let chunk = single(
            LogicalType::BIGINT,
            vec![Value::from(1i64), Value::Null, Value::from(-3i64)],
        );
        assert_eq!(chunk.column::<i64>(0).unwrap(), vec![Some(1), None, Some(-3)]);
    }

    #[test]
    fn test_float_bits_are_preserved() {
        let nan = f64::from_bits(0x7ff8_dead_beef_0001);
        let chunk = single(
            LogicalType::DOUBLE,
            vec![
                Value::from(nan),
                Value::from(f64::INFINITY),
                Value::from(-0.0f64),
            ],
        );
        let out = chunk.column::<f64>(0).unwrap();
        assert_eq!(out[0].unwrap().to_bits(), nan.to_bits());
        assert_eq!(out[1], Some(f64::INFINITY));
        assert_eq!(out[2].unwrap().to_bits(), (-0.0f64).to_bits());

        let fnan = f32::from_bits(0x7fc0_1234);
        let chunk = single(LogicalType::FLOAT, vec![Value::from(fnan)]);
        assert_eq!(chunk.get::<f32>(0, 0).unwrap().unwrap().to_bits(), fnan.to_bits());
    }

    #[test]
    fn test_extremes_round_trip() {
        let chunk = single(
            LogicalType::HUGEINT,
            vec![Value::from(i128::MIN), Value::from(i128::MAX)],
        );
        assert_eq!(
            chunk.column::<i128>(0).unwrap(),
            vec![Some(i128::MIN), Some(i128::MAX)]
        );

        let chunk = single(LogicalType::UBIGINT, vec![Value::from(u64::MAX)]);
        assert_eq!(chunk.get::<u64>(0, 0).unwrap(), Some(u64::MAX));
    }

    #[test]
    fn test_temporal_types() {
        let date = Date::from_ymd(2024, 2, 29).unwrap();
        let ts = Timestamp::from_date_time(date, Time::from_hms_micro(12, 0, 0, 1).unwrap());
        let iv = Interval::new(1, 2, 3);
        let mut b = ChunkBuilder::new(&[
            LogicalType::DATE,
            LogicalType::TIMESTAMP,
            LogicalType::INTERVAL,
        ]);
        b.append_row(&[Value::from(date), Value::from(ts), Value::from(iv)])
            .unwrap();
        let chunk = b.finish().unwrap();
        assert_eq!(chunk.get::<Date>(0, 0).unwrap(), Some(date));
        assert_eq!(chunk.get::<Timestamp>(1, 0).unwrap(), Some(ts));
        assert_eq!(chunk.get::<Interval>(2, 0).unwrap(), Some(iv));
    }

    #[test]
    fn test_boolean_column_rejects_tinyint() {
        let chunk = single(LogicalType::BOOLEAN, vec![Value::from(true)]);
        let err = chunk.column::<i8>(0).unwrap_err();
        assert_eq!(
            err,
            Error::type_mismatch(LogicalType::TINYINT, LogicalType::BOOLEAN, "column 0")
        );
        let msg = err.to_string();
        assert!(msg.contains("tinyint") && msg.contains("boolean"), "{msg}");
        assert_eq!(chunk.get::<bool>(0, 0).unwrap(), Some(true));
    }

    #[test]
    fn test_inline_and_heap_strings() {
        let chunk = single(
            LogicalType::VARCHAR,
            vec![
                Value::from("hello"),
                Value::from("cdefghijklmnopqrstuvwxyz"),
                Value::from(""),
                Value::Null,
            ],
        );
        assert_eq!(
            chunk.column::<String>(0).unwrap(),
            vec![
                Some("hello".to_string()),
                Some("cdefghijklmnopqrstuvwxyz".to_string()),
                Some(String::new()),
                None,
            ]
        );
    }

    #[test]
    fn test_blob_is_unsupported() {
        let chunk = single(LogicalType::BLOB, vec![Value::from("raw")]);
        assert_eq!(
            chunk.column::<String>(0).unwrap_err(),
            Error::Unsupported(LogicalType::BLOB)
        );
    }
}
