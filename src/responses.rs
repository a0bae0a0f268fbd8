//! Wire representations of the stored records.
//!
//! Derived fields are computed here at read time from the owning record and
//! a store connection, nothing derived is kept in the tables.

use chrono::NaiveDateTime;
use diesel::{sqlite::SqliteConnection, QueryResult};
use serde::{Deserialize, Serialize};

use crate::database::models::{blog::Blog, comment::Comment, like::Like, user::User};

/// A user as the API shows it. The password hash is never part of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub email: String,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlogResponse {
    pub id: i32,
    pub title: String,
    pub content: String,
    pub author: UserResponse,
    pub likes_count: i64,
    pub comments_count: i64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

pub fn likes_count(blog: &Blog, conn: &mut SqliteConnection) -> QueryResult<i64> {
    Like::count_for_blog(conn, blog.id)
}

pub fn comments_count(blog: &Blog, conn: &mut SqliteConnection) -> QueryResult<i64> {
    Comment::count_for_blog(conn, blog.id)
}

impl BlogResponse {
    pub fn build(blog: &Blog, conn: &mut SqliteConnection) -> QueryResult<Self> {
        let author = User::find_by_id(conn, &blog.author_id)?;

        Ok(Self {
            id: blog.id,
            title: blog.title.clone(),
            content: blog.content.clone(),
            author: UserResponse::from(&author),
            likes_count: likes_count(blog, conn)?,
            comments_count: comments_count(blog, conn)?,
            created_at: blog.created_at,
            updated_at: blog.updated_at,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentResponse {
    pub id: i32,
    pub blog: i32,
    pub author: UserResponse,
    pub content: String,
    pub created_at: NaiveDateTime,
}

impl CommentResponse {
    pub fn build(comment: &Comment, conn: &mut SqliteConnection) -> QueryResult<Self> {
        let author = User::find_by_id(conn, &comment.author_id)?;

        Ok(Self {
            id: comment.id,
            blog: comment.blog_id,
            author: UserResponse::from(&author),
            content: comment.content.clone(),
            created_at: comment.created_at,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LikeResponse {
    pub id: i32,
    pub blog: i32,
    pub user: String,
}

impl From<&Like> for LikeResponse {
    fn from(like: &Like) -> Self {
        Self {
            id: like.id,
            blog: like.blog_id,
            user: like.user_id.clone(),
        }
    }
}

/// Body of the like/unlike toggle responses
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

impl StatusResponse {
    pub fn new(status: &'static str) -> Self {
        Self { status }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::database::db_utils::test_pool;

    #[test]
    fn user_representation_has_no_password() {
        let pool = test_pool();
        let mut conn = pool.get().unwrap();
        let user = User::new(&mut conn, "alice", "a@x.com", "pw123").unwrap();

        let json = serde_json::to_value(UserResponse::from(&user)).unwrap();

        assert_eq!(
            json,
            serde_json::json!({ "id": user.id, "username": "alice", "email": "a@x.com" })
        );
    }

    #[test]
    fn blog_counts_are_computed_from_the_store() {
        let pool = test_pool();
        let mut conn = pool.get().unwrap();
        let alice = User::new(&mut conn, "alice", "", "pw123").unwrap();
        let bob = User::new(&mut conn, "bob", "", "pw123").unwrap();
        let blog = Blog::new(&mut conn, &alice, "Hi", "Body").unwrap();
        Like::new(&mut conn, &alice.id, blog.id).unwrap();
        Like::new(&mut conn, &bob.id, blog.id).unwrap();
        Comment::new(&mut conn, blog.id, &bob.id, "nice").unwrap();

        let response = BlogResponse::build(&blog, &mut conn).unwrap();

        assert_eq!(response.author.username, "alice");
        assert_eq!(response.likes_count, 2);
        assert_eq!(response.comments_count, 1);
    }
}
