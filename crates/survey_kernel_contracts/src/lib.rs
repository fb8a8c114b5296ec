#![forbid(unsafe_code)]

pub mod assignment;
pub mod common;
pub mod icon;
pub mod role;
pub mod session;
pub mod submission;

pub use common::{ContractViolation, Validate};
