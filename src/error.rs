pub trait ErrorKind {
    fn kind(&self) -> &'static str;
}

impl ErrorKind for base64::DecodeError {
    fn kind(&self) -> &'static str {
        match self {
            Self::InvalidByte(..) => "InvalidByte",
            Self::InvalidLastSymbol(..) => "InvalidLastSymbol",
            Self::InvalidLength(_) => "InvalidLength",
            Self::InvalidPadding => "InvalidPadding",
        }
    }
}

impl ErrorKind for crate::auth::AuthenticationError {
    fn kind(&self) -> &'static str {
        match self {
            Self::InvalidAuthType => "InvalidAuthType",
            Self::InvalidEncoding(err) => err.kind(),
            Self::InvalidToken => "InvalidToken",
            Self::MalformedToken => "MalformedToken",
            Self::NotAnInteger(_) => "MalformedToken",
        }
    }
}

impl ErrorKind for crate::model::post_id::DecodePostIdError {
    fn kind(&self) -> &'static str {
        match self {
            Self::InvalidLength(_) => "InvalidPostIdLength",
            Self::Base64(err) => err.kind(),
            Self::OutOfRange(_) => "PostIdOutOfRange",
        }
    }
}

impl ErrorKind for axum::extract::multipart::MultipartRejection {
    fn kind(&self) -> &'static str {
        match self {
            Self::InvalidBoundary(_) => "InvalidBoundary",
            _ => "UnknownMultipartRejectionError",
        }
    }
}

impl ErrorKind for axum::extract::rejection::JsonRejection {
    fn kind(&self) -> &'static str {
        match self {
            Self::JsonDataError(_) => "JsonDataError",
            Self::JsonSyntaxError(_) => "JsonSyntaxError",
            Self::MissingJsonContentType(_) => "MissingJsonContentType",
            Self::BytesRejection(_) => "BytesRejection",
            _ => "UnknownJsonRejectionError",
        }
    }
}

impl ErrorKind for diesel::result::DatabaseErrorKind {
    fn kind(&self) -> &'static str {
        match self {
            Self::CheckViolation => "CheckViolation",
            Self::ClosedConnection => "ClosedConnection",
            Self::ForeignKeyViolation => "ForeignKeyViolation",
            Self::NotNullViolation => "NotNullViolation",
            Self::ReadOnlyTransaction => "ReadOnlyTransaction",
            Self::SerializationFailure => "SerializationFailure",
            Self::UnableToSendCommand => "UnableToSendCommand",
            Self::UniqueViolation => "UniqueViolation",
            _ => "UnknownDatabaseError",
        }
    }
}

impl ErrorKind for diesel::result::Error {
    fn kind(&self) -> &'static str {
        match self {
            Self::AlreadyInTransaction => "AlreadyInTransaction",
            Self::BrokenTransactionManager => "BrokenTransactionManager",
            Self::DatabaseError(err, _) => err.kind(),
            Self::DeserializationError(_) => "DeserializationError",
            Self::InvalidCString(_) => "InvalidCString",
            Self::NotFound => "RowNotFound",
            Self::NotInTransaction => "NotInTransaction",
            Self::QueryBuilderError(_) => "QueryBuilderError",
            Self::RollbackErrorOnCommit { rollback_error, .. } => rollback_error.kind(),
            Self::RollbackTransaction => "RollbackTransaction",
            Self::SerializationError(_) => "SerializationError",
            _ => "UnknownQueryError",
        }
    }
}

impl ErrorKind for image::error::LimitErrorKind {
    fn kind(&self) -> &'static str {
        match self {
            Self::DimensionError => "DimensionLimitsExceeded",
            Self::InsufficientMemory => "InsufficientMemory",
            Self::Unsupported { .. } => "UnsupportedImageDimensions",
            _ => "UnknownImageLimitError",
        }
    }
}

impl ErrorKind for image::error::ParameterErrorKind {
    fn kind(&self) -> &'static str {
        match self {
            Self::DimensionMismatch => "DimensionMismatch",
            Self::FailedAlready => "FailedAlready",
            Self::Generic(_) => "GenericError",
            Self::NoMoreData => "NoMoreData",
            _ => "UnknownImageParameterError",
        }
    }
}

impl ErrorKind for image::error::UnsupportedErrorKind {
    fn kind(&self) -> &'static str {
        match self {
            Self::Color(_) => "UnsupportedColor",
            Self::Format(_) => "UnsupportedFormat",
            Self::GenericFeature(_) => "UnsupportedFeature",
            _ => "UnknownImageUnsupportedError",
        }
    }
}

impl ErrorKind for image::ImageError {
    fn kind(&self) -> &'static str {
        match self {
            Self::Decoding(_) => "FailedDecoding",
            Self::Encoding(_) => "FailedEncoding",
            Self::IoError(err) => err.kind().kind(),
            Self::Limits(err) => err.kind().kind(),
            Self::Parameter(err) => err.kind().kind(),
            Self::Unsupported(err) => err.kind().kind(),
        }
    }
}

impl ErrorKind for redis::ErrorKind {
    fn kind(&self) -> &'static str {
        match self {
            Self::ResponseError => "CacheResponseError",
            Self::AuthenticationFailed => "CacheAuthenticationFailed",
            Self::TypeError => "CacheTypeError",
            Self::ExecAbortError => "CacheExecAborted",
            Self::BusyLoadingError => "CacheBusyLoading",
            Self::NoScriptError => "CacheNoScript",
            Self::InvalidClientConfig => "CacheInvalidClientConfig",
            Self::Moved => "CacheKeyMoved",
            Self::Ask => "CacheAskRedirect",
            Self::TryAgain => "CacheTryAgain",
            Self::ClusterDown => "CacheClusterDown",
            Self::CrossSlot => "CacheCrossSlot",
            Self::MasterDown => "CacheMasterDown",
            Self::IoError => "CacheIoError",
            Self::ClientError => "CacheClientError",
            Self::ExtensionError => "CacheExtensionError",
            Self::ReadOnly => "CacheReadOnly",
            _ => "UnknownCacheError",
        }
    }
}

impl ErrorKind for std::num::IntErrorKind {
    fn kind(&self) -> &'static str {
        match self {
            Self::Empty => "EmptyValue",
            Self::InvalidDigit => "InvalidDigit",
            Self::PosOverflow => "PositiveOverflow",
            Self::NegOverflow => "NegativeOverflow",
            Self::Zero => "ZeroNotAllowed",
            _ => "UnknownIntParseError",
        }
    }
}

impl ErrorKind for serde_json::error::Category {
    fn kind(&self) -> &'static str {
        match self {
            Self::Io => "JsonIoError",
            Self::Syntax => "JsonInvalidSyntax",
            Self::Data => "JsonInvalidData",
            Self::Eof => "JsonUnexpectedEOF",
        }
    }
}

impl ErrorKind for std::io::ErrorKind {
    fn kind(&self) -> &'static str {
        match self {
            Self::NotFound => "FileNotFound",
            Self::PermissionDenied => "PermissionDenied",
            Self::ConnectionRefused => "ConnectionRefused",
            Self::ConnectionReset => "ConnectionReset",
            Self::ConnectionAborted => "ConnectionAborted",
            Self::NotConnected => "NotConnected",
            Self::BrokenPipe => "BrokenPipe",
            Self::AlreadyExists => "FileAlreadyExists",
            Self::WouldBlock => "WouldBlock",
            Self::InvalidInput => "InvalidInput",
            Self::InvalidData => "InvalidData",
            Self::TimedOut => "TimedOut",
            Self::WriteZero => "WriteZero",
            Self::StorageFull => "StorageFull",
            Self::FileTooLarge => "FileTooLarge",
            Self::Interrupted => "Interrupted",
            Self::Unsupported => "Unsupported",
            Self::UnexpectedEof => "UnexpectedEof",
            Self::OutOfMemory => "OutOfMemory",
            Self::Other => "OtherIoError",
            _ => "UnknownIoError",
        }
    }
}

impl ErrorKind for crate::api::ApiError {
    fn kind(&self) -> &'static str {
        match self {
            Self::BadBannerAspect(..) => "BadBannerAspect",
            Self::CropOutOfBounds => "CropOutOfBounds",
            Self::ContentTypeMismatch(..) => "ContentTypeMismatch",
            Self::DecodePostId(err) => err.kind(),
            Self::DescriptionTooLong(_) => "DescriptionTooLong",
            Self::EmptyUpdate => "EmptyUpdate",
            Self::FailedAuthentication(err) => err.kind(),
            Self::FailedConnection(_) => "FailedConnection",
            Self::FailedQuery(err) => err.kind(),
            Self::Forbidden(_) => "Forbidden",
            Self::HeaderDeserialization(_) => "HeaderDeserialization",
            Self::IllegalDraftTransition => "IllegalDraftTransition",
            Self::Image(err) => err.kind(),
            Self::InvalidImage(_) => "InvalidImage",
            Self::InvalidVote => "InvalidVote",
            Self::JoinTask(_) => "TaskFailure",
            Self::JsonRejection(err) => err.kind(),
            Self::JsonSerialization(err) => err.classify().kind(),
            Self::NonSquareCrop(..) => "NonSquareCrop",
            Self::NotAnInteger(err) => err.kind().kind(),
            Self::NotFound(err) => match err {
                crate::model::enums::ResourceType::Post => "PostNotFound",
                crate::model::enums::ResourceType::User => "UserNotFound",
            },
            Self::NotLoggedIn => "NotLoggedIn",
            Self::Multipart(_) => "MultipartError",
            Self::MultipartRejection(err) => err.kind(),
            Self::SamePrivacy(_) => "SamePrivacy",
            Self::Cache(err) => err.kind().kind(),
            Self::Request(_) => "RequestError",
            Self::StdIo(err) => err.kind().kind(),
            Self::Storage(_) => "ObjectStoreError",
            Self::TitleTooLong(_) => "TitleTooLong",
            Self::UnpublishablePrivacy => "UnpublishablePrivacy",
            Self::UnsupportedExtension(_) => "UnsupportedExtension",
            Self::UpstreamStatus(..) => "UpstreamStatus",
        }
    }
}
