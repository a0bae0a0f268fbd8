use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use uuid::Uuid;

use crate::{
    auth::password::{check_password, make_password},
    schema::users,
};

#[derive(Debug, Clone, PartialEq, Queryable)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    /// Salted hash, see [make_password]
    pub password: String,
    pub date_joined: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = users)]
struct UserInsert<'a> {
    id: String,
    username: &'a str,
    email: &'a str,
    password: String,
    date_joined: NaiveDateTime,
}

/// Fields a user update may change, `None` leaves the stored value alone.
#[derive(Debug, Default, Clone)]
pub struct UserChanges {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

impl User {
    /// Pushes a new user in the database, hashing `raw_password` on the way in.
    ///
    /// A taken username comes back as a `UniqueViolation` database error.
    ///
    /// # Example
    /// ```
    /// let user = User::new(&mut conn, "alice", "a@x.com", "pw123")?;
    /// assert_ne!(user.password, "pw123");
    /// ```
    pub fn new(
        conn: &mut SqliteConnection,
        username: &str,
        email: &str,
        raw_password: &str,
    ) -> QueryResult<User> {
        let to_insert = UserInsert {
            id: Uuid::new_v4().to_string(),
            username,
            email,
            password: make_password(raw_password),
            date_joined: Utc::now().naive_utc(),
        };

        diesel::insert_into(users::table)
            .values(&to_insert)
            .get_result(conn)
    }

    /// Returns the user with the id specified, or a `NotFound` error.
    pub fn find_by_id(conn: &mut SqliteConnection, user_id: &str) -> QueryResult<User> {
        users::table.find(user_id).first(conn)
    }

    /// Returns the user with the username specified, if there is one.
    pub fn find_by_username(
        conn: &mut SqliteConnection,
        uname: &str,
    ) -> QueryResult<Option<User>> {
        users::table
            .filter(users::username.eq(uname))
            .first(conn)
            .optional()
    }

    pub fn all(conn: &mut SqliteConnection) -> QueryResult<Vec<User>> {
        users::table.order(users::username.asc()).load(conn)
    }

    pub fn check_password(&self, raw_password: &str) -> bool {
        check_password(raw_password, &self.password)
    }

    pub fn edit(&mut self, conn: &mut SqliteConnection, changes: UserChanges) -> QueryResult<()> {
        if let Some(username) = changes.username {
            self.username = username;
        }
        if let Some(email) = changes.email {
            self.email = email;
        }
        if let Some(raw_password) = changes.password {
            self.password = make_password(&raw_password);
        }

        diesel::update(users::table.find(&self.id))
            .set((
                users::username.eq(&self.username),
                users::email.eq(&self.email),
                users::password.eq(&self.password),
            ))
            .execute(conn)?;

        Ok(())
    }

    /// Deletes the user. Blogs, comments and likes go with it through the
    /// foreign key cascades.
    pub fn delete(&self, conn: &mut SqliteConnection) -> QueryResult<usize> {
        diesel::delete(users::table.find(&self.id)).execute(conn)
    }
}
