use crate::api::{ApiError, ApiResult};
use crate::model::enums::ResourceType;
use crate::model::post_id::PostId;
use crate::schema::user;
use diesel::prelude::*;
use diesel::PgConnection;

/// Points the user's icon at `post_id`, returning the previous source post
/// so its renditions can be deleted once the new ones are live.
pub fn set_icon(conn: &mut PgConnection, user_id: i64, post_id: PostId) -> ApiResult<Option<PostId>> {
    let previous = user::table
        .select(user::icon)
        .filter(user::user_id.eq(user_id))
        .first(conn)
        .optional()?
        .ok_or(ApiError::NotFound(ResourceType::User))?;
    diesel::update(user::table.filter(user::user_id.eq(user_id)))
        .set(user::icon.eq(post_id))
        .execute(conn)?;
    Ok(previous)
}

pub fn set_banner(conn: &mut PgConnection, user_id: i64, post_id: PostId) -> ApiResult<Option<PostId>> {
    let previous = user::table
        .select(user::banner)
        .filter(user::user_id.eq(user_id))
        .first(conn)
        .optional()?
        .ok_or(ApiError::NotFound(ResourceType::User))?;
    diesel::update(user::table.filter(user::user_id.eq(user_id)))
        .set(user::banner.eq(post_id))
        .execute(conn)?;
    Ok(previous)
}
