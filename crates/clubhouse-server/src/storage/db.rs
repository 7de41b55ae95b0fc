//! `SQLite` database handle for the Clubhouse server.

pub use clubhouse_core::db::DatabaseError;

clubhouse_core::define_database!(ClubhouseDatabase, "Clubhouse database migrations complete");
