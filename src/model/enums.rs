use diesel::AsExpression;
use diesel::backend::Backend;
use diesel::deserialize::{self, FromSql, FromSqlRow};
use diesel::serialize::{self, Output, ToSql};
use diesel::sql_types::SmallInt;
use image::ImageFormat;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::{Display, EnumString, FromRepr, IntoStaticStr};
use thiserror::Error;

/// Visibility state of a post. Stored as a smallint; the discriminants are
/// part of the database encoding and must not be reordered.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, FromRepr, Display, EnumString, IntoStaticStr, AsExpression, FromSqlRow,
    Serialize, Deserialize,
)]
#[repr(i16)]
#[diesel(sql_type = SmallInt)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Privacy {
    Public = 0,
    Unlisted = 1,
    Private = 2,
    Unpublished = 3,
    Draft = 4,
}

impl Privacy {
    /// Whether posts in this state have left the pre-publish pipeline.
    /// `created_on` is stamped at the first transition into a published state.
    pub fn published(self) -> bool {
        !matches!(self, Self::Unpublished | Self::Draft)
    }
}

#[derive(Debug, Error)]
#[error("Smallint out of range of privacy enum")]
pub struct DeserializePrivacyError;

impl<DB: Backend> ToSql<SmallInt, DB> for Privacy
where
    i16: ToSql<SmallInt, DB>,
{
    fn to_sql<'a>(&'a self, out: &mut Output<'a, '_, DB>) -> serialize::Result {
        // to_sql cannot be called on a temporary, hence the const table
        const VALUES: [i16; 5] = [0, 1, 2, 3, 4];
        VALUES[*self as usize].to_sql(out)
    }
}

impl<DB: Backend> FromSql<SmallInt, DB> for Privacy
where
    i16: FromSql<SmallInt, DB>,
{
    fn from_sql(bytes: DB::RawValue<'_>) -> deserialize::Result<Self> {
        let database_value = i16::from_sql(bytes)?;
        Privacy::from_repr(database_value).ok_or(DeserializePrivacyError.into())
    }
}

#[derive(
    Debug, Copy, Clone, PartialEq, Eq, FromRepr, Display, EnumString, IntoStaticStr, AsExpression, FromSqlRow,
    Serialize, Deserialize,
)]
#[repr(i16)]
#[diesel(sql_type = SmallInt)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Rating {
    General = 0,
    Mature = 1,
    Explicit = 2,
}

#[derive(Debug, Error)]
#[error("Smallint out of range of rating enum")]
pub struct DeserializeRatingError;

impl<DB: Backend> ToSql<SmallInt, DB> for Rating
where
    i16: ToSql<SmallInt, DB>,
{
    fn to_sql<'a>(&'a self, out: &mut Output<'a, '_, DB>) -> serialize::Result {
        const VALUES: [i16; 3] = [0, 1, 2];
        VALUES[*self as usize].to_sql(out)
    }
}

impl<DB: Backend> FromSql<SmallInt, DB> for Rating
where
    i16: FromSql<SmallInt, DB>,
{
    fn from_sql(bytes: DB::RawValue<'_>) -> deserialize::Result<Self> {
        let database_value = i16::from_sql(bytes)?;
        Rating::from_repr(database_value).ok_or(DeserializeRatingError.into())
    }
}

/// Raster formats accepted for upload. The extension table below is fixed;
/// a client filename whose extension disagrees with the sniffed format is
/// rejected before anything is stored.
#[derive(Debug, Copy, Clone, PartialEq, Eq, FromRepr, AsExpression, FromSqlRow, Serialize, Deserialize)]
#[repr(i16)]
#[diesel(sql_type = SmallInt)]
pub enum MimeType {
    #[serde(rename = "image/bmp")]
    Bmp = 0,
    #[serde(rename = "image/gif")]
    Gif = 1,
    #[serde(rename = "image/jpeg")]
    Jpeg = 2,
    #[serde(rename = "image/png")]
    Png = 3,
    #[serde(rename = "image/webp")]
    Webp = 4,
}

#[derive(Debug, Error)]
#[error("'{0}' is not a supported file extension")]
pub struct ParseExtensionError(pub String);

impl MimeType {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Bmp => "bmp",
            Self::Gif => "gif",
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Webp => "webp",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bmp => "image/bmp",
            Self::Gif => "image/gif",
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Webp => "image/webp",
        }
    }

    pub fn from_extension(extension: &str) -> Result<Self, ParseExtensionError> {
        match extension.to_ascii_lowercase().as_str() {
            "bmp" => Ok(Self::Bmp),
            "gif" => Ok(Self::Gif),
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            "png" => Ok(Self::Png),
            "webp" => Ok(Self::Webp),
            _ => Err(ParseExtensionError(extension.to_owned())),
        }
    }

    pub fn from_image_format(format: ImageFormat) -> Option<Self> {
        match format {
            ImageFormat::Bmp => Some(Self::Bmp),
            ImageFormat::Gif => Some(Self::Gif),
            ImageFormat::Jpeg => Some(Self::Jpeg),
            ImageFormat::Png => Some(Self::Png),
            ImageFormat::WebP => Some(Self::Webp),
            _ => None,
        }
    }

    pub fn to_image_format(self) -> ImageFormat {
        match self {
            Self::Bmp => ImageFormat::Bmp,
            Self::Gif => ImageFormat::Gif,
            Self::Jpeg => ImageFormat::Jpeg,
            Self::Png => ImageFormat::Png,
            Self::Webp => ImageFormat::WebP,
        }
    }
}

impl FromStr for MimeType {
    type Err = ParseExtensionError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "image/bmp" => Ok(Self::Bmp),
            "image/gif" => Ok(Self::Gif),
            "image/jpeg" => Ok(Self::Jpeg),
            "image/png" => Ok(Self::Png),
            "image/webp" => Ok(Self::Webp),
            _ => Err(ParseExtensionError(s.to_owned())),
        }
    }
}

impl std::fmt::Display for MimeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<DB: Backend> ToSql<SmallInt, DB> for MimeType
where
    i16: ToSql<SmallInt, DB>,
{
    fn to_sql<'a>(&'a self, out: &mut Output<'a, '_, DB>) -> serialize::Result {
        const VALUES: [i16; 5] = [0, 1, 2, 3, 4];
        VALUES[*self as usize].to_sql(out)
    }
}

impl<DB: Backend> FromSql<SmallInt, DB> for MimeType
where
    i16: FromSql<SmallInt, DB>,
{
    fn from_sql(bytes: DB::RawValue<'_>) -> deserialize::Result<Self> {
        let database_value = i16::from_sql(bytes)?;
        MimeType::from_repr(database_value).ok_or(DeserializeMimeTypeError.into())
    }
}

#[derive(Debug, Error)]
#[error("Smallint out of range of mime type enum")]
pub struct DeserializeMimeTypeError;

/// Resources a request can fail to find. Keeps 404 messages uniform.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Display, IntoStaticStr)]
pub enum ResourceType {
    Post,
    User,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn privacy_round_trips_through_repr() {
        for privacy in [Privacy::Public, Privacy::Unlisted, Privacy::Private, Privacy::Unpublished, Privacy::Draft] {
            assert_eq!(Privacy::from_repr(privacy as i16), Some(privacy));
        }
        assert_eq!(Privacy::from_repr(5), None);
    }

    #[test]
    fn published_states() {
        assert!(Privacy::Public.published());
        assert!(Privacy::Unlisted.published());
        assert!(Privacy::Private.published());
        assert!(!Privacy::Unpublished.published());
        assert!(!Privacy::Draft.published());
    }

    #[test]
    fn privacy_names() {
        assert_eq!(Privacy::Public.to_string(), "public");
        assert_eq!("draft".parse(), Ok(Privacy::Draft));
        assert_eq!(Rating::Explicit.to_string(), "explicit");
    }

    #[test]
    fn extension_table_agrees_with_mime_strings() {
        for mime in [MimeType::Bmp, MimeType::Gif, MimeType::Jpeg, MimeType::Png, MimeType::Webp] {
            assert_eq!(MimeType::from_extension(mime.extension()).unwrap(), mime);
            assert_eq!(mime.as_str().parse::<MimeType>().unwrap(), mime);
        }
        assert_eq!(MimeType::from_extension("JPEG").unwrap(), MimeType::Jpeg);
        assert!(MimeType::from_extension("tiff").is_err());
    }
}
