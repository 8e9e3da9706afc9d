use crate::model::enums::{Privacy, Rating};
use crate::model::post_id::PostId;
use crate::schema::{post, post_score, post_vote};
use diesel::pg::Pg;
use diesel::prelude::*;

#[derive(Insertable)]
#[diesel(table_name = post)]
#[diesel(check_for_backend(Pg))]
pub struct NewPost<'a> {
    pub post_id: PostId,
    pub user_id: i64,
    pub title: Option<&'a str>,
    pub description: Option<&'a str>,
    pub rating: Rating,
    pub privacy: Privacy,
    pub parent: Option<PostId>,
}

#[derive(Identifiable, Insertable, Queryable, Selectable)]
#[diesel(table_name = post_vote)]
#[diesel(primary_key(user_id, post_id))]
#[diesel(check_for_backend(Pg))]
pub struct PostVote {
    pub user_id: i64,
    pub post_id: PostId,
    pub upvote: Option<bool>,
}

#[derive(AsChangeset, Identifiable, Insertable, Queryable, Selectable)]
#[diesel(table_name = post_score)]
#[diesel(primary_key(post_id))]
#[diesel(check_for_backend(Pg))]
pub struct PostScore {
    pub post_id: PostId,
    pub upvotes: i64,
    pub downvotes: i64,
    pub top: i64,
    pub hot: f64,
    pub best: f64,
    pub controversial: f64,
}
