use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::prelude::*;
use byteorder::{BigEndian, ByteOrder};
use diesel::AsExpression;
use diesel::backend::Backend;
use diesel::deserialize::{self, FromSql, FromSqlRow};
use diesel::serialize::{self, Output, ToSql};
use diesel::sql_types::BigInt;
use serde::de::Visitor;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::Display;
use std::str::FromStr;
use thiserror::Error;

/// Number of characters in the external form: six bytes encode to exactly
/// eight URL-safe base64 characters with no padding.
pub const ENCODED_LEN: usize = 8;

const BYTE_LEN: usize = 6;

/// A 48-bit post identifier.
///
/// Internally a signed integer drawn from six random bytes interpreted as
/// big-endian two's complement; externally an 8-character URL-safe base64
/// string. The two forms are a bijection on the 48-bit range and the string
/// form is the stable identity clients see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, AsExpression, FromSqlRow)]
#[diesel(sql_type = BigInt)]
pub struct PostId(i64);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodePostIdError {
    #[error("Post id must be exactly {ENCODED_LEN} characters, got {0}")]
    InvalidLength(usize),
    #[error(transparent)]
    Base64(#[from] base64::DecodeError),
    #[error("{0} is outside the 48-bit post id range")]
    OutOfRange(i64),
}

impl PostId {
    pub const MIN: i64 = -(1 << 47);
    pub const MAX: i64 = (1 << 47) - 1;

    pub fn new(value: i64) -> Result<Self, DecodePostIdError> {
        (Self::MIN..=Self::MAX)
            .contains(&value)
            .then_some(Self(value))
            .ok_or(DecodePostIdError::OutOfRange(value))
    }

    /// Draws a fresh candidate id. Uniqueness is the caller's problem:
    /// generation is retried against the post table until unused.
    pub fn generate() -> Self {
        let bytes: [u8; BYTE_LEN] = rand::random();
        Self(BigEndian::read_i48(&bytes))
    }

    pub fn value(self) -> i64 {
        self.0
    }

    pub fn encode(self) -> String {
        let mut bytes = [0; BYTE_LEN];
        BigEndian::write_i48(&mut bytes, self.0);
        URL_SAFE_NO_PAD.encode(bytes)
    }

    pub fn decode(text: &str) -> Result<Self, DecodePostIdError> {
        if text.len() != ENCODED_LEN {
            return Err(DecodePostIdError::InvalidLength(text.len()));
        }
        let decoded = URL_SAFE_NO_PAD.decode(text)?;
        Ok(Self(BigEndian::read_i48(&decoded)))
    }
}

impl Display for PostId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for PostId {
    type Err = DecodePostIdError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

impl Serialize for PostId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encode())
    }
}

impl<'de> Deserialize<'de> for PostId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PostIdVisitor;
        impl Visitor<'_> for PostIdVisitor {
            type Value = PostId;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(formatter, "an {ENCODED_LEN}-character URL-safe base64 string")
            }

            fn visit_str<E: serde::de::Error>(self, value: &str) -> Result<Self::Value, E> {
                PostId::decode(value).map_err(E::custom)
            }
        }
        deserializer.deserialize_str(PostIdVisitor)
    }
}

impl<DB: Backend> ToSql<BigInt, DB> for PostId
where
    i64: ToSql<BigInt, DB>,
{
    fn to_sql<'a>(&'a self, out: &mut Output<'a, '_, DB>) -> serialize::Result {
        self.0.to_sql(out)
    }
}

impl<DB: Backend> FromSql<BigInt, DB> for PostId
where
    i64: FromSql<BigInt, DB>,
{
    fn from_sql(bytes: DB::RawValue<'_>) -> deserialize::Result<Self> {
        let value = i64::from_sql(bytes)?;
        PostId::new(value).map_err(Box::from)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn encode_known_values() {
        assert_eq!(PostId(0).encode(), "AAAAAAAA");
        assert_eq!(PostId(1).encode(), "AAAAAAAB");
        assert_eq!(PostId(-1).encode(), "________");
        assert_eq!(PostId(PostId::MAX).encode(), "f_______");
        assert_eq!(PostId(PostId::MIN).encode(), "gAAAAAAA");
    }

    #[test]
    fn round_trip_both_directions() {
        for value in [0, 1, -1, 255, -256, 48_813_534_215, PostId::MIN, PostId::MAX] {
            let id = PostId::new(value).unwrap();
            assert_eq!(PostId::decode(&id.encode()), Ok(id));
        }
        for text in ["AAAAAAAB", "f_______", "gAAAAAAA", "aW1hZ2Vz"] {
            assert_eq!(PostId::decode(text).unwrap().encode(), text);
        }
    }

    #[test]
    fn rejects_bad_lengths() {
        assert_eq!(PostId::decode(""), Err(DecodePostIdError::InvalidLength(0)));
        assert_eq!(PostId::decode("AAAAAAA"), Err(DecodePostIdError::InvalidLength(7)));
        assert_eq!(PostId::decode("AAAAAAAAA"), Err(DecodePostIdError::InvalidLength(9)));
    }

    #[test]
    fn rejects_out_of_range_values() {
        assert!(PostId::new(PostId::MAX + 1).is_err());
        assert!(PostId::new(PostId::MIN - 1).is_err());
    }

    #[test]
    fn generated_ids_stay_in_range() {
        for _ in 0..1000 {
            let id = PostId::generate();
            assert!((PostId::MIN..=PostId::MAX).contains(&id.value()));
        }
    }
}
