use crate::api::{ApiError, ApiResult};
use crate::model::enums::{MimeType, Privacy, Rating, ResourceType};
use crate::model::post::NewPost;
use crate::model::post_id::PostId;
use crate::schema::post;
use crate::score;
use crate::time::DateTime;
use diesel::prelude::*;
use diesel::PgConnection;
use diesel::sql_types::{BigInt, Double, SmallInt};

pub const MAX_TITLE_LENGTH: usize = 100;
pub const MAX_DESCRIPTION_LENGTH: usize = 10_000;

/// Outcome of a privacy transition, carrying what the caller needs to
/// schedule counter deltas after commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrivacyChange {
    pub old: Privacy,
    pub new: Privacy,
    pub rating: Rating,
}

impl PrivacyChange {
    /// `+1` when the post just became publicly countable, `-1` when it just
    /// stopped being so, `None` for everything else.
    pub fn public_delta(&self) -> Option<i64> {
        match (self.old, self.new) {
            (Privacy::Public, Privacy::Public) => None,
            (_, Privacy::Public) => Some(1),
            (Privacy::Public, _) => Some(-1),
            _ => None,
        }
    }
}

/// Optional metadata edits, with unset and clear-to-null kept distinct:
/// the outer `Option` is field presence, the inner one the new value.
#[derive(Debug, Default)]
pub struct MetadataPatch<'a> {
    pub title: Option<Option<&'a str>>,
    pub description: Option<Option<&'a str>>,
    pub rating: Option<Rating>,
}

impl MetadataPatch<'_> {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.rating.is_none()
    }

    pub fn validate(&self) -> ApiResult<()> {
        if let Some(Some(title)) = self.title
            && title.chars().count() > MAX_TITLE_LENGTH
        {
            return Err(ApiError::TitleTooLong(MAX_TITLE_LENGTH));
        }
        if let Some(Some(description)) = self.description
            && description.chars().count() > MAX_DESCRIPTION_LENGTH
        {
            return Err(ApiError::DescriptionTooLong(MAX_DESCRIPTION_LENGTH));
        }
        Ok(())
    }
}

#[derive(AsChangeset)]
#[diesel(table_name = post)]
struct MetadataChangeset<'a> {
    title: Option<Option<&'a str>>,
    description: Option<Option<&'a str>>,
    rating: Option<Rating>,
    updated_on: DateTime,
}

/// Fields accepted when creating a populated draft.
#[derive(Debug, Default)]
pub struct CreateFields<'a> {
    pub reply_to: Option<PostId>,
    pub title: Option<&'a str>,
    pub description: Option<&'a str>,
    pub rating: Option<Rating>,
    pub privacy: Option<Privacy>,
}

/// Idempotently produces the caller's unpublished slot. The insert is a
/// no-op when the slot already exists thanks to the partial unique index,
/// and the read-back below returns the same id either way.
pub fn create(conn: &mut PgConnection, user_id: i64) -> ApiResult<PostId> {
    let post_id = find_unused_id(conn)?;
    NewPost {
        post_id,
        user_id,
        title: None,
        description: None,
        rating: Rating::General,
        privacy: Privacy::Unpublished,
        parent: None,
    }
    .insert_into(post::table)
    .on_conflict(post::user_id)
    .filter_target(post::privacy.eq(Privacy::Unpublished))
    .do_nothing()
    .execute(conn)?;

    post::table
        .select(post::post_id)
        .filter(post::user_id.eq(user_id))
        .filter(post::privacy.eq(Privacy::Unpublished))
        .first(conn)
        .map_err(ApiError::from)
}

/// Creates a draft populated with the given fields. When a target privacy
/// was supplied the transition runs inside the same transaction, so a post
/// created as public is never observable as a bare draft.
pub fn create_with_fields<'a>(
    conn: &mut PgConnection,
    user_id: i64,
    fields: CreateFields<'a>,
) -> ApiResult<(PostId, Option<PrivacyChange>)> {
    let post_id = find_unused_id(conn)?;
    NewPost {
        post_id,
        user_id,
        title: fields.title,
        description: fields.description,
        rating: fields.rating.unwrap_or(Rating::General),
        privacy: Privacy::Draft,
        parent: fields.reply_to,
    }
    .insert_into(post::table)
    .execute(conn)?;

    // The post is already a draft, so a requested draft privacy is a no-op
    let change = fields
        .privacy
        .filter(|&requested| requested != Privacy::Draft)
        .map(|requested| privacy(conn, user_id, post_id, requested))
        .transpose()?;
    Ok((post_id, change))
}

/// Applies a metadata patch. The WHERE clause carries both the uploader and
/// the post id: cross-user edits match zero rows and surface as not-found.
pub fn metadata(conn: &mut PgConnection, user_id: i64, post_id: PostId, patch: &MetadataPatch) -> ApiResult<DateTime> {
    let updated_on = DateTime::now();
    let changeset = MetadataChangeset {
        title: patch.title,
        description: patch.description,
        rating: patch.rating,
        updated_on,
    };
    let updated = diesel::update(post::table.filter(post::post_id.eq(post_id)).filter(post::user_id.eq(user_id)))
        .set(changeset)
        .execute(conn)?;
    if updated == 0 {
        return Err(ApiError::NotFound(ResourceType::Post));
    }
    Ok(updated_on)
}

/// The privacy transition. On first publish the self-upvote, the initial
/// score row, and the post row update are a single atomic statement; a
/// failure anywhere leaves all three untouched.
pub fn privacy(conn: &mut PgConnection, user_id: i64, post_id: PostId, new: Privacy) -> ApiResult<PrivacyChange> {
    if new == Privacy::Unpublished {
        return Err(ApiError::UnpublishablePrivacy);
    }

    let (old, rating): (Privacy, Rating) = post::table
        .select((post::privacy, post::rating))
        .filter(post::post_id.eq(post_id))
        .filter(post::user_id.eq(user_id))
        .first(conn)
        .optional()?
        .ok_or(ApiError::NotFound(ResourceType::Post))?;
    validate_transition(old, new)?;

    if !old.published() && new.published() {
        let now = DateTime::now();
        diesel::sql_query(FIRST_PUBLISH_SQL)
            .bind::<BigInt, _>(user_id)
            .bind::<BigInt, _>(post_id.value())
            .bind::<Double, _>(score::hot(1, 0, now.timestamp()))
            .bind::<Double, _>(score::confidence(1, 1))
            .bind::<Double, _>(score::controversial(1, 0))
            .bind::<SmallInt, _>(new as i16)
            .execute(conn)?;
    } else {
        diesel::update(post::table.filter(post::post_id.eq(post_id)).filter(post::user_id.eq(user_id)))
            .set((post::updated_on.eq(DateTime::now()), post::privacy.eq(new)))
            .execute(conn)?;
    }
    Ok(PrivacyChange { old, new, rating })
}

/// Records freshly uploaded content on a post and returns the previous
/// filename (for post-commit blob cleanup) plus the new edit time.
pub fn content(
    conn: &mut PgConnection,
    user_id: i64,
    post_id: PostId,
    filename: &str,
    mime_type: MimeType,
    width: i32,
    height: i32,
) -> ApiResult<(Option<String>, DateTime)> {
    let previous: Option<Option<String>> = post::table
        .select(post::filename)
        .filter(post::post_id.eq(post_id))
        .filter(post::user_id.eq(user_id))
        .first(conn)
        .optional()?;
    let previous = previous.ok_or(ApiError::Forbidden(ResourceType::Post))?;

    let updated_on = DateTime::now();
    diesel::update(post::table.filter(post::post_id.eq(post_id)).filter(post::user_id.eq(user_id)))
        .set((
            post::updated_on.eq(updated_on),
            post::filename.eq(filename),
            post::mime_type.eq(mime_type),
            post::width.eq(width),
            post::height.eq(height),
        ))
        .execute(conn)?;
    Ok((previous, updated_on))
}

fn validate_transition(old: Privacy, new: Privacy) -> ApiResult<()> {
    if old == new {
        return Err(ApiError::SamePrivacy(new));
    }
    if new == Privacy::Draft && old != Privacy::Unpublished {
        return Err(ApiError::IllegalDraftTransition);
    }
    Ok(())
}

/// Draws candidate ids until one is unused. Expected to terminate on the
/// first attempt with overwhelming probability given the 48-bit space.
fn find_unused_id(conn: &mut PgConnection) -> ApiResult<PostId> {
    loop {
        let candidate = PostId::generate();
        let in_use: i64 = post::table
            .filter(post::post_id.eq(candidate))
            .count()
            .get_result(conn)?;
        if in_use == 0 {
            return Ok(candidate);
        }
    }
}

const FIRST_PUBLISH_SQL: &str = "\
WITH seeded_vote AS (
    INSERT INTO post_vote (user_id, post_id, upvote)
    VALUES ($1, $2, TRUE)
    ON CONFLICT (user_id, post_id) DO UPDATE SET upvote = TRUE
), seeded_score AS (
    INSERT INTO post_score (post_id, upvotes, downvotes, top, hot, best, controversial)
    VALUES ($2, 1, 0, 1, $3, $4, $5)
    ON CONFLICT (post_id) DO UPDATE SET
        upvotes = 1, downvotes = 0, top = 1, hot = $3, best = $4, controversial = $5
)
UPDATE post
SET created_on = NOW(), updated_on = NOW(), privacy = $6
WHERE user_id = $1 AND post_id = $2";

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn transition_rules() {
        assert!(validate_transition(Privacy::Unpublished, Privacy::Public).is_ok());
        assert!(validate_transition(Privacy::Unpublished, Privacy::Draft).is_ok());
        assert!(validate_transition(Privacy::Draft, Privacy::Unlisted).is_ok());
        assert!(validate_transition(Privacy::Public, Privacy::Private).is_ok());

        assert!(matches!(
            validate_transition(Privacy::Public, Privacy::Public),
            Err(ApiError::SamePrivacy(Privacy::Public))
        ));
        assert!(matches!(
            validate_transition(Privacy::Public, Privacy::Draft),
            Err(ApiError::IllegalDraftTransition)
        ));
    }

    #[test]
    fn public_deltas() {
        let change = |old, new| PrivacyChange { old, new, rating: Rating::General };
        assert_eq!(change(Privacy::Unpublished, Privacy::Public).public_delta(), Some(1));
        assert_eq!(change(Privacy::Private, Privacy::Public).public_delta(), Some(1));
        assert_eq!(change(Privacy::Public, Privacy::Private).public_delta(), Some(-1));
        assert_eq!(change(Privacy::Unpublished, Privacy::Draft).public_delta(), None);
        assert_eq!(change(Privacy::Draft, Privacy::Unlisted).public_delta(), None);
    }

    #[test]
    fn patch_validation() {
        let long_title = "x".repeat(MAX_TITLE_LENGTH + 1);
        let patch = MetadataPatch {
            title: Some(Some(&long_title)),
            ..Default::default()
        };
        assert!(matches!(patch.validate(), Err(ApiError::TitleTooLong(_))));

        let long_description = "x".repeat(MAX_DESCRIPTION_LENGTH + 1);
        let patch = MetadataPatch {
            description: Some(Some(&long_description)),
            ..Default::default()
        };
        assert!(matches!(patch.validate(), Err(ApiError::DescriptionTooLong(_))));

        let exact_title = "x".repeat(MAX_TITLE_LENGTH);
        let patch = MetadataPatch {
            title: Some(Some(&exact_title)),
            description: Some(None),
            ..Default::default()
        };
        assert!(patch.validate().is_ok());
        assert!(!patch.is_empty());
        assert!(MetadataPatch::default().is_empty());
    }
}
