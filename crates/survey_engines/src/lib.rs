#![forbid(unsafe_code)]

pub mod assignment;
pub mod catalog;
pub mod education;
pub mod submission_client;
