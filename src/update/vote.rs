use crate::api::error::map_foreign_key_violation;
use crate::api::ApiResult;
use crate::model::enums::ResourceType;
use crate::model::post::{PostScore, PostVote};
use crate::model::post_id::PostId;
use crate::schema::{post_score, post_vote};
use crate::score;
use crate::time::DateTime;
use diesel::prelude::*;
use diesel::PgConnection;
use diesel::sql_types::{BigInt, Nullable, Timestamptz};

/// Vote aggregates after a ballot change, used for the score upsert and the
/// write-through caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteTotals {
    pub up: i64,
    pub down: i64,
    pub total: i64,
}

#[derive(QueryableByName)]
struct VoteTally {
    #[diesel(sql_type = BigInt)]
    total: i64,
    #[diesel(sql_type = Nullable<BigInt>)]
    up: Option<i64>,
    #[diesel(sql_type = Timestamptz)]
    created_on: DateTime,
}

/// Upserts the caller's ballot, recomputes the aggregates from the vote
/// table, and upserts the score row. `None` retracts an existing vote; the
/// row is kept with a null ballot and excluded from both counts.
pub fn vote(conn: &mut PgConnection, user_id: i64, post_id: PostId, upvote: Option<bool>) -> ApiResult<VoteTotals> {
    let ballot = PostVote { user_id, post_id, upvote };
    let upserted = ballot
        .insert_into(post_vote::table)
        .on_conflict((post_vote::user_id, post_vote::post_id))
        .do_update()
        .set(post_vote::upvote.eq(upvote))
        .execute(conn);
    map_foreign_key_violation(upserted, ResourceType::Post)?;

    let tally: VoteTally = diesel::sql_query(VOTE_TALLY_SQL)
        .bind::<BigInt, _>(post_id.value())
        .get_result(conn)?;

    let up = tally.up.unwrap_or(0);
    let total = tally.total;
    let down = total - up;
    let score_row = PostScore {
        post_id,
        upvotes: up,
        downvotes: down,
        top: up - down,
        hot: score::hot(up, down, tally.created_on.timestamp()),
        best: score::confidence(up, total),
        controversial: score::controversial(up, down),
    };
    diesel::insert_into(post_score::table)
        .values(&score_row)
        .on_conflict(post_score::post_id)
        .do_update()
        .set(&score_row)
        .execute(conn)?;

    Ok(VoteTotals { up, down, total })
}

/// Retracted (null) ballots are excluded from both counts by the join
/// condition, not the WHERE clause, so a post with only retracted votes
/// still tallies as zero.
const VOTE_TALLY_SQL: &str = "\
SELECT COUNT(post_vote.upvote) AS total,
       SUM(post_vote.upvote::int) AS up,
       post.created_on
FROM post
    LEFT JOIN post_vote
        ON post_vote.post_id = post.post_id
            AND post_vote.upvote IS NOT NULL
WHERE post.post_id = $1
GROUP BY post.post_id";
