#![forbid(unsafe_code)]

#[derive(Debug, Clone, PartialEq)]
pub enum ContractViolation {
    InvalidValue {
        field: &'static str,
        reason: &'static str,
    },
    InvalidRange {
        field: &'static str,
        min: f64,
        max: f64,
        got: f64,
    },
}

impl std::fmt::Display for ContractViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { field, reason } => write!(f, "{field}: {reason}"),
            Self::InvalidRange {
                field,
                min,
                max,
                got,
            } => write!(f, "{field}: {got} outside [{min}, {max}]"),
        }
    }
}

impl std::error::Error for ContractViolation {}

pub trait Validate {
    fn validate(&self) -> Result<(), ContractViolation>;
}

/// Length in characters, not bytes; role titles carry en dashes.
pub fn char_len(value: &str) -> usize {
    value.chars().count()
}
