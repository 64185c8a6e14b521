//! tokio-postgres integration: [`Value`] as a bind parameter, and
//! [`AsyncExecutor`] for clients and transactions.
//!
//! ```ignore
//! let (client, connection) = tokio_postgres::connect(&url, NoTls).await?;
//! tokio::spawn(connection);
//!
//! ds.delete_by_key("Customer", 7)?.execute_async(&client).await?;
//! ```

use crate::command::{AsyncExecutor, PreparedStatement};
use crate::error::TabulaResult;
use crate::value::Value;
use bytes::BytesMut;
use rust_decimal::Decimal;
use std::error::Error;
use tokio_postgres::types::{IsNull, ToSql, Type};

type BoxError = Box<dyn Error + Sync + Send>;

fn encode_int(v: i128, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    match *ty {
        Type::INT2 => i16::try_from(v)?.to_sql_checked(ty, out),
        Type::INT4 => i32::try_from(v)?.to_sql_checked(ty, out),
        Type::OID => u32::try_from(v)?.to_sql_checked(ty, out),
        Type::FLOAT4 => (v as f32).to_sql_checked(ty, out),
        Type::FLOAT8 => (v as f64).to_sql_checked(ty, out),
        Type::NUMERIC => Decimal::from_i128_with_scale(v, 0).to_sql_checked(ty, out),
        Type::BOOL => match v {
            0 => false.to_sql_checked(ty, out),
            1 => true.to_sql_checked(ty, out),
            _ => Err(format!("{v} is not a boolean").into()),
        },
        Type::TEXT | Type::VARCHAR | Type::BPCHAR => v.to_string().to_sql_checked(ty, out),
        _ => i64::try_from(v)?.to_sql_checked(ty, out),
    }
}

impl ToSql for Value {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
        match self {
            Value::Null => Ok(IsNull::Yes),
            Value::Bool(b) => b.to_sql_checked(ty, out),
            Value::Int(i) => encode_int(i128::from(*i), ty, out),
            Value::UInt(u) => encode_int(i128::from(*u), ty, out),
            Value::Float(f) => match *ty {
                Type::FLOAT4 => (*f as f32).to_sql_checked(ty, out),
                Type::NUMERIC => Decimal::try_from(*f)?.to_sql_checked(ty, out),
                _ => f.to_sql_checked(ty, out),
            },
            Value::Decimal(d) => d.to_sql_checked(ty, out),
            Value::String(s) => s.as_str().to_sql_checked(ty, out),
            Value::Bytes(b) => b.as_slice().to_sql_checked(ty, out),
            Value::Date(d) => d.to_sql_checked(ty, out),
            Value::Time(t) => t.to_sql_checked(ty, out),
            Value::DateTime(dt) => dt.to_sql_checked(ty, out),
            Value::Timestamp(ts) => ts.to_sql_checked(ty, out),
            Value::Uuid(u) => u.to_sql_checked(ty, out),
            Value::Json(j) => j.to_sql_checked(ty, out),
            Value::Enum { name, discriminant } => match *ty {
                Type::INT2 | Type::INT4 | Type::INT8 => {
                    encode_int(i128::from(*discriminant), ty, out)
                }
                _ => name.as_str().to_sql_checked(ty, out),
            },
        }
    }

    // Each variant defers to the driver's own type check in `to_sql`.
    fn accepts(_ty: &Type) -> bool {
        true
    }

    tokio_postgres::types::to_sql_checked!();
}

fn bind_params(stmt: &PreparedStatement) -> Vec<&(dyn ToSql + Sync)> {
    stmt.parameters
        .iter()
        .map(|p| &p.value as &(dyn ToSql + Sync))
        .collect()
}

impl AsyncExecutor for tokio_postgres::Client {
    async fn execute(&self, stmt: &PreparedStatement) -> TabulaResult<u64> {
        let params = bind_params(stmt);
        Ok(tokio_postgres::Client::execute(self, stmt.text.as_str(), &params).await?)
    }
}

impl AsyncExecutor for tokio_postgres::Transaction<'_> {
    async fn execute(&self, stmt: &PreparedStatement) -> TabulaResult<u64> {
        let params = bind_params(stmt);
        Ok(tokio_postgres::Transaction::execute(self, stmt.text.as_str(), &params).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_narrow_to_the_target_type() {
        let mut buf = BytesMut::new();
        assert!(Value::Int(7).to_sql(&Type::INT2, &mut buf).is_ok());
        assert_eq!(&buf[..], &7_i16.to_be_bytes());

        let mut buf = BytesMut::new();
        assert!(Value::Int(70_000).to_sql(&Type::INT2, &mut buf).is_err());
    }

    #[test]
    fn null_writes_nothing() {
        let mut buf = BytesMut::new();
        assert!(matches!(Value::Null.to_sql(&Type::UUID, &mut buf), Ok(IsNull::Yes)));
        assert!(buf.is_empty());
    }

    #[test]
    fn mismatched_types_are_rejected() {
        let mut buf = BytesMut::new();
        assert!(Value::Bool(true).to_sql(&Type::UUID, &mut buf).is_err());
    }

    #[test]
    fn enums_bind_by_discriminant_or_name() {
        let status = Value::Enum {
            name: "Active".into(),
            discriminant: 2,
        };
        let mut buf = BytesMut::new();
        status.to_sql(&Type::INT4, &mut buf).unwrap();
        assert_eq!(&buf[..], &2_i32.to_be_bytes());

        let mut buf = BytesMut::new();
        status.to_sql(&Type::TEXT, &mut buf).unwrap();
        assert_eq!(&buf[..], b"Active");
    }
}
