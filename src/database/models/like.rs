use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error};
use diesel::sqlite::SqliteConnection;

use crate::schema::likes;

#[derive(Debug, Clone, PartialEq, Queryable)]
pub struct Like {
    pub id: i32,
    pub blog_id: i32,
    pub user_id: String,
}

#[derive(Insertable)]
#[diesel(table_name = likes)]
struct LikeInsert<'a> {
    blog_id: i32,
    user_id: &'a str,
}

impl Like {
    /// Inserts a like. A second like for the same (user, blog) pair is
    /// refused by the store with a `UniqueViolation`.
    pub fn new(conn: &mut SqliteConnection, user_id: &str, blog_id: i32) -> QueryResult<Like> {
        diesel::insert_into(likes::table)
            .values(&LikeInsert { blog_id, user_id })
            .get_result(conn)
    }

    /// Returns the user's like on the blog, creating it when absent. The
    /// flag tells whether this call created it.
    pub fn get_or_create(
        conn: &mut SqliteConnection,
        user_id: &str,
        blog_id: i32,
    ) -> QueryResult<(Like, bool)> {
        if let Some(like) = Like::find_for(conn, user_id, blog_id)? {
            return Ok((like, false));
        }

        match Like::new(conn, user_id, blog_id) {
            Ok(like) => Ok((like, true)),
            // lost a race against a concurrent like
            Err(Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
                let like = likes::table
                    .filter(likes::user_id.eq(user_id))
                    .filter(likes::blog_id.eq(blog_id))
                    .first(conn)?;
                Ok((like, false))
            }
            Err(err) => Err(err),
        }
    }

    pub fn find_by_id(conn: &mut SqliteConnection, like_id: i32) -> QueryResult<Like> {
        likes::table.find(like_id).first(conn)
    }

    pub fn find_for(
        conn: &mut SqliteConnection,
        user_id: &str,
        blog_id: i32,
    ) -> QueryResult<Option<Like>> {
        likes::table
            .filter(likes::user_id.eq(user_id))
            .filter(likes::blog_id.eq(blog_id))
            .first(conn)
            .optional()
    }

    pub fn all(conn: &mut SqliteConnection) -> QueryResult<Vec<Like>> {
        likes::table.order(likes::id.asc()).load(conn)
    }

    pub fn count_for_blog(conn: &mut SqliteConnection, blog_id: i32) -> QueryResult<i64> {
        likes::table
            .filter(likes::blog_id.eq(blog_id))
            .count()
            .get_result(conn)
    }

    pub fn edit(
        &mut self,
        conn: &mut SqliteConnection,
        blog_id: Option<i32>,
        user_id: Option<String>,
    ) -> QueryResult<()> {
        if let Some(blog_id) = blog_id {
            self.blog_id = blog_id;
        }
        if let Some(user_id) = user_id {
            self.user_id = user_id;
        }

        diesel::update(likes::table.find(self.id))
            .set((likes::blog_id.eq(self.blog_id), likes::user_id.eq(&self.user_id)))
            .execute(conn)?;

        Ok(())
    }

    /// Removes the user's like on the blog, returns how many rows went (0 or 1).
    pub fn delete_for(conn: &mut SqliteConnection, user_id: &str, blog_id: i32) -> QueryResult<usize> {
        diesel::delete(
            likes::table
                .filter(likes::user_id.eq(user_id))
                .filter(likes::blog_id.eq(blog_id)),
        )
        .execute(conn)
    }

    pub fn delete_by_id(conn: &mut SqliteConnection, like_id: i32) -> QueryResult<usize> {
        diesel::delete(likes::table.find(like_id)).execute(conn)
    }
}
