#![forbid(unsafe_code)]

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::icon::IconItem;
use crate::role::{CreditRole, RoleId, ROLE_COUNT};
use crate::{ContractViolation, Validate};

/// Everything needed to resume the assignment page exactly where it was left.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentSnapshot {
    pub roles: Vec<CreditRole>,
    pub current_icon_index: usize,
    pub available_icons: Vec<IconItem>,
}

impl Validate for AssignmentSnapshot {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.roles.len() != ROLE_COUNT {
            return Err(ContractViolation::InvalidValue {
                field: "assignment_snapshot.roles",
                reason: "must hold exactly 14 roles",
            });
        }
        let mut role_ids = BTreeSet::new();
        for role in &self.roles {
            role.validate()?;
            if !role_ids.insert(role.id) {
                return Err(ContractViolation::InvalidValue {
                    field: "assignment_snapshot.roles",
                    reason: "role ids must be unique",
                });
            }
        }

        let mut icon_ids = BTreeSet::new();
        let mut icon_names = BTreeSet::new();
        for icon in &self.available_icons {
            icon.validate()?;
            if !icon_ids.insert(icon.id.as_str()) || !icon_names.insert(icon.name.as_str()) {
                return Err(ContractViolation::InvalidValue {
                    field: "assignment_snapshot.available_icons",
                    reason: "icon ids and names must be unique",
                });
            }
        }
        if self.current_icon_index > self.available_icons.len() {
            return Err(ContractViolation::InvalidRange {
                field: "assignment_snapshot.current_icon_index",
                min: 0.0,
                max: self.available_icons.len() as f64,
                got: self.current_icon_index as f64,
            });
        }

        let mut held = BTreeSet::new();
        for icon_name in self.roles.iter().filter_map(|r| r.assigned_icon.as_deref()) {
            if !icon_names.contains(icon_name) {
                return Err(ContractViolation::InvalidValue {
                    field: "assignment_snapshot.roles.assigned_icon",
                    reason: "must name an icon in available_icons",
                });
            }
            if !held.insert(icon_name) {
                return Err(ContractViolation::InvalidValue {
                    field: "assignment_snapshot.roles.assigned_icon",
                    reason: "an icon may be held by at most one role",
                });
            }
        }
        Ok(())
    }
}

/// Drag source payload, built where the drag starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DragPayload {
    /// An icon taken from the offering queue.
    New { icon_id: String },
    /// An icon already sitting on a role, dragged onto another role.
    Reassign { source_role_id: RoleId },
}
