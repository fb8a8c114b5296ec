#![forbid(unsafe_code)]

pub mod bridge;
pub mod kv;
pub mod repo;
pub mod sqlite;
pub mod survey_db;
