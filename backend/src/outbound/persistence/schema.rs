//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `migrations/` exactly. Regenerate with
//! `diesel print-schema` after changing a migration.

diesel::table! {
    /// Registered marketplace members.
    users (id) {
        id -> Uuid,
        /// Unique login name.
        username -> Varchar,
        /// Encoded credential hash (`pbkdf2-sha256$...`).
        password_hash -> Varchar,
        /// Unique when present.
        email -> Nullable<Varchar>,
        location -> Nullable<Varchar>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Physical books and their availability.
    books (id) {
        id -> Uuid,
        owner_id -> Uuid,
        title -> Varchar,
        author -> Varchar,
        description -> Nullable<Text>,
        /// One of `available`, `pending`, `exchanged` (CHECK constraint).
        status -> Varchar,
        cover_image -> Nullable<Varchar>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Trade proposals. Both book columns reference `books`.
    exchanges (id) {
        id -> Uuid,
        requested_book_id -> Uuid,
        requester_id -> Uuid,
        offered_book_id -> Uuid,
        /// One of `pending`, `accepted`, `rejected` (CHECK constraint).
        status -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(books -> users (owner_id));
diesel::joinable!(exchanges -> users (requester_id));

diesel::allow_tables_to_appear_in_same_query!(users, books, exchanges);
