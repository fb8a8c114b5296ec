#![forbid(unsafe_code)]

use rand::Rng;
use survey_kernel_contracts::assignment::{AssignmentSnapshot, DragPayload};
use survey_kernel_contracts::icon::IconItem;
use survey_kernel_contracts::role::{CreditRole, RoleId, ROLE_COUNT};
use survey_kernel_contracts::Validate;
use tracing::{debug, warn};

use crate::catalog::{credit_roles, shuffled_icon_set};

/// What a mutating call did to the store. Anything but `Unchanged` must be
/// pushed to persistence by the owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentOutcome {
    Placed { cursor_advanced: bool },
    Swapped,
    Reset,
    Unchanged,
}

impl AssignmentOutcome {
    pub fn is_change(self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentStore {
    roles: Vec<CreditRole>,
    available_icons: Vec<IconItem>,
    current_icon_index: usize,
}

impl AssignmentStore {
    /// Restores `seed` verbatim when it is a well-formed snapshot, otherwise
    /// starts from the catalog with a fresh permutation.
    pub fn initialize<R: Rng + ?Sized>(seed: Option<AssignmentSnapshot>, rng: &mut R) -> Self {
        match seed {
            Some(snapshot) => match snapshot.validate() {
                Ok(()) => Self {
                    roles: snapshot.roles,
                    available_icons: snapshot.available_icons,
                    current_icon_index: snapshot.current_icon_index,
                },
                Err(violation) => {
                    warn!(%violation, "discarding malformed assignment snapshot");
                    Self::fresh(rng)
                }
            },
            None => Self::fresh(rng),
        }
    }

    pub fn fresh<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            roles: credit_roles(),
            available_icons: shuffled_icon_set(rng),
            current_icon_index: 0,
        }
    }

    /// Drops an offered icon onto a role. Unknown icon ids and unknown roles
    /// leave the store untouched.
    pub fn assign_new_icon(&mut self, role_id: RoleId, icon_id: &str) -> AssignmentOutcome {
        let Some(icon_pos) = self.available_icons.iter().position(|i| i.id == icon_id) else {
            debug!(icon_id, "drop ignored: icon not in available set");
            return AssignmentOutcome::Unchanged;
        };
        if !self.roles.iter().any(|r| r.id == role_id) {
            debug!(%role_id, "drop ignored: unknown role");
            return AssignmentOutcome::Unchanged;
        }

        let icon_name = self.available_icons[icon_pos].name.clone();
        for role in &mut self.roles {
            if role.id == role_id {
                role.assigned_icon = Some(icon_name.clone());
            } else if role.assigned_icon.as_deref() == Some(icon_name.as_str()) {
                role.assigned_icon = None;
            }
        }

        // Offering order is not enforced; only placing the icon under the
        // cursor moves it.
        let cursor_advanced = icon_pos == self.current_icon_index;
        if cursor_advanced {
            self.current_icon_index += 1;
        }
        AssignmentOutcome::Placed { cursor_advanced }
    }

    pub fn swap_assigned(&mut self, source: RoleId, target: RoleId) -> AssignmentOutcome {
        if source == target {
            return AssignmentOutcome::Unchanged;
        }
        let Some(source_pos) = self.roles.iter().position(|r| r.id == source) else {
            return AssignmentOutcome::Unchanged;
        };
        let Some(target_pos) = self.roles.iter().position(|r| r.id == target) else {
            return AssignmentOutcome::Unchanged;
        };
        if self.roles[source_pos].assigned_icon == self.roles[target_pos].assigned_icon {
            return AssignmentOutcome::Unchanged;
        }

        let source_icon = self.roles[source_pos].assigned_icon.take();
        let target_icon = self.roles[target_pos].assigned_icon.take();
        self.roles[target_pos].assigned_icon = source_icon;
        self.roles[source_pos].assigned_icon = target_icon;
        AssignmentOutcome::Swapped
    }

    pub fn apply_drop(&mut self, role_id: RoleId, payload: &DragPayload) -> AssignmentOutcome {
        match payload {
            DragPayload::New { icon_id } => self.assign_new_icon(role_id, icon_id),
            DragPayload::Reassign { source_role_id } => self.swap_assigned(*source_role_id, role_id),
        }
    }

    /// `(assigned, total)`; total is always the catalog size.
    pub fn progress(&self) -> (usize, usize) {
        let assigned = self.roles.iter().filter(|r| r.is_assigned()).count();
        (assigned, ROLE_COUNT)
    }

    pub fn progress_percent(&self) -> f64 {
        let (assigned, total) = self.progress();
        assigned as f64 / total as f64 * 100.0
    }

    pub fn unassigned_count(&self) -> usize {
        let (assigned, total) = self.progress();
        total - assigned
    }

    pub fn is_complete(&self) -> bool {
        self.unassigned_count() == 0
    }

    pub fn reset<R: Rng + ?Sized>(&mut self, rng: &mut R) -> AssignmentOutcome {
        *self = Self::fresh(rng);
        AssignmentOutcome::Reset
    }

    pub fn current_offering(&self) -> Option<&IconItem> {
        self.available_icons.get(self.current_icon_index)
    }

    pub fn roles(&self) -> &[CreditRole] {
        &self.roles
    }

    pub fn role(&self, role_id: RoleId) -> Option<&CreditRole> {
        self.roles.iter().find(|r| r.id == role_id)
    }

    pub fn available_icons(&self) -> &[IconItem] {
        &self.available_icons
    }

    pub fn current_icon_index(&self) -> usize {
        self.current_icon_index
    }

    pub fn snapshot(&self) -> AssignmentSnapshot {
        AssignmentSnapshot {
            roles: self.roles.clone(),
            current_icon_index: self.current_icon_index,
            available_icons: self.available_icons.clone(),
        }
    }
}
