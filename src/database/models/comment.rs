use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

use crate::schema::comments;

#[derive(Debug, Clone, PartialEq, Queryable)]
pub struct Comment {
    pub id: i32,
    pub blog_id: i32,
    pub author_id: String,
    pub content: String,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = comments)]
struct CommentInsert<'a> {
    blog_id: i32,
    author_id: &'a str,
    content: &'a str,
    created_at: NaiveDateTime,
}

impl Comment {
    /** Creates a comment on the blog specified */
    pub fn new(
        conn: &mut SqliteConnection,
        blog_id: i32,
        author_id: &str,
        content: &str,
    ) -> QueryResult<Comment> {
        let record = CommentInsert {
            blog_id,
            author_id,
            content,
            created_at: Utc::now().naive_utc(),
        };

        diesel::insert_into(comments::table)
            .values(&record)
            .get_result(conn)
    }

    /** Returns comment with the id specified */
    pub fn find_by_id(conn: &mut SqliteConnection, comment_id: i32) -> QueryResult<Comment> {
        comments::table.find(comment_id).first(conn)
    }

    pub fn count(conn: &mut SqliteConnection) -> QueryResult<i64> {
        comments::table.count().get_result(conn)
    }

    pub fn count_for_blog(conn: &mut SqliteConnection, blog_id: i32) -> QueryResult<i64> {
        comments::table
            .filter(comments::blog_id.eq(blog_id))
            .count()
            .get_result(conn)
    }

    pub fn page(conn: &mut SqliteConnection, limit: i64, offset: i64) -> QueryResult<Vec<Comment>> {
        comments::table
            .order((comments::created_at.desc(), comments::id.desc()))
            .limit(limit)
            .offset(offset)
            .load(conn)
    }

    /** Moves the comment to another blog and/or replaces its text */
    pub fn edit(
        &mut self,
        conn: &mut SqliteConnection,
        blog_id: Option<i32>,
        content: Option<String>,
    ) -> QueryResult<()> {
        if let Some(blog_id) = blog_id {
            self.blog_id = blog_id;
        }
        if let Some(content) = content {
            self.content = content;
        }

        diesel::update(comments::table.find(self.id))
            .set((
                comments::blog_id.eq(self.blog_id),
                comments::content.eq(&self.content),
            ))
            .execute(conn)?;

        Ok(())
    }

    /** Deletes a comment from database */
    pub fn delete(conn: &mut SqliteConnection, comment_id: i32) -> QueryResult<usize> {
        diesel::delete(comments::table.find(comment_id)).execute(conn)
    }
}
