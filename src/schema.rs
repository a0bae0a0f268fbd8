diesel::table! {
    blogs (id) {
        id -> Integer,
        title -> Text,
        content -> Text,
        author_id -> Text,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

diesel::table! {
    comments (id) {
        id -> Integer,
        blog_id -> Integer,
        author_id -> Text,
        content -> Text,
        created_at -> Timestamp,
    }
}

diesel::table! {
    likes (id) {
        id -> Integer,
        blog_id -> Integer,
        user_id -> Text,
    }
}

diesel::table! {
    users (id) {
        id -> Text,
        username -> Text,
        email -> Text,
        password -> Text,
        date_joined -> Timestamp,
    }
}

diesel::joinable!(blogs -> users (author_id));
diesel::joinable!(comments -> blogs (blog_id));
diesel::joinable!(likes -> blogs (blog_id));

diesel::allow_tables_to_appear_in_same_query!(
    blogs,
    comments,
    likes,
    users,
);
