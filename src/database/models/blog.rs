use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

use super::user::User;
use crate::schema::blogs;

#[derive(Debug, Clone, PartialEq, Queryable)]
pub struct Blog {
    pub id: i32,
    pub title: String,
    pub content: String,
    pub author_id: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = blogs)]
struct BlogInsert<'a> {
    title: &'a str,
    content: &'a str,
    author_id: &'a str,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

impl Blog {
    /// Creates a blog owned by `author`, both timestamps set to now.
    pub fn new(
        conn: &mut SqliteConnection,
        author: &User,
        title: &str,
        content: &str,
    ) -> QueryResult<Blog> {
        let time = Utc::now().naive_utc();

        let to_insert = BlogInsert {
            title,
            content,
            author_id: &author.id,
            created_at: time,
            updated_at: time,
        };

        diesel::insert_into(blogs::table)
            .values(&to_insert)
            .get_result(conn)
    }

    pub fn get_by_id(conn: &mut SqliteConnection, blog_id: i32) -> QueryResult<Blog> {
        blogs::table.find(blog_id).first(conn)
    }

    pub fn exists(conn: &mut SqliteConnection, blog_id: i32) -> QueryResult<bool> {
        diesel::select(diesel::dsl::exists(blogs::table.find(blog_id))).get_result(conn)
    }

    pub fn count(conn: &mut SqliteConnection) -> QueryResult<i64> {
        blogs::table.count().get_result(conn)
    }

    /// One page of blogs, newest first. Blogs created within the same
    /// timestamp fall back to id order.
    pub fn page(conn: &mut SqliteConnection, limit: i64, offset: i64) -> QueryResult<Vec<Blog>> {
        blogs::table
            .order((blogs::created_at.desc(), blogs::id.desc()))
            .limit(limit)
            .offset(offset)
            .load(conn)
    }

    /// Changes title and/or content and bumps `updated_at`. The author never changes.
    pub fn edit(
        &mut self,
        conn: &mut SqliteConnection,
        title: Option<String>,
        content: Option<String>,
    ) -> QueryResult<()> {
        if let Some(title) = title {
            self.title = title;
        }
        if let Some(content) = content {
            self.content = content;
        }
        self.updated_at = Utc::now().naive_utc();

        diesel::update(blogs::table.find(self.id))
            .set((
                blogs::title.eq(&self.title),
                blogs::content.eq(&self.content),
                blogs::updated_at.eq(self.updated_at),
            ))
            .execute(conn)?;

        Ok(())
    }

    /// Deletes the blog, its comments and likes are removed by the store.
    pub fn delete_by_id(conn: &mut SqliteConnection, blog_id: i32) -> QueryResult<usize> {
        diesel::delete(blogs::table.find(blog_id)).execute(conn)
    }
}
