#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

use crate::{ContractViolation, Validate};

/// Number of CRediT contributor roles in the catalog.
pub const ROLE_COUNT: usize = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleId(pub u8);

impl RoleId {
    pub fn new(raw: u8) -> Result<Self, ContractViolation> {
        let id = Self(raw);
        id.validate()?;
        Ok(id)
    }
}

impl Validate for RoleId {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.0 == 0 || usize::from(self.0) > ROLE_COUNT {
            return Err(ContractViolation::InvalidRange {
                field: "role.id",
                min: 1.0,
                max: ROLE_COUNT as f64,
                got: f64::from(self.0),
            });
        }
        Ok(())
    }
}

impl std::fmt::Display for RoleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditRole {
    pub id: RoleId,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_icon: Option<String>,
}

impl CreditRole {
    pub fn unassigned(id: RoleId, title: &str, description: &str) -> Self {
        Self {
            id,
            title: title.to_string(),
            description: description.to_string(),
            assigned_icon: None,
        }
    }

    /// Blank strings count as unassigned.
    pub fn is_assigned(&self) -> bool {
        self.assigned_icon
            .as_deref()
            .is_some_and(|icon| !icon.trim().is_empty())
    }
}

impl Validate for CreditRole {
    fn validate(&self) -> Result<(), ContractViolation> {
        self.id.validate()?;
        if self.title.trim().is_empty() {
            return Err(ContractViolation::InvalidValue {
                field: "role.title",
                reason: "must not be empty",
            });
        }
        Ok(())
    }
}
