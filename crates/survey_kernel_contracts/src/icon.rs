#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

use crate::{ContractViolation, Validate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IconShape {
    Circle,
    Square,
    Triangle,
    Diamond,
    Hexagon,
    Star,
    Heart,
    Lightbulb,
    Gear,
    Chart,
    Pen,
    Eye,
    Users,
    Search,
    Database,
    MagnifyingGlass,
    Coin,
    Microscope,
    Workflow,
    Person,
    Box,
    Code,
    OrgChart,
    Clipboard,
    PenCaret,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IconItem {
    pub id: String,
    pub name: String,
    pub color: String,
    pub shape: IconShape,
}

impl IconItem {
    pub fn new(id: &str, name: &str, color: &str, shape: IconShape) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            color: color.to_string(),
            shape,
        }
    }
}

impl Validate for IconItem {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.id.trim().is_empty() {
            return Err(ContractViolation::InvalidValue {
                field: "icon.id",
                reason: "must not be empty",
            });
        }
        if self.name.trim().is_empty() {
            return Err(ContractViolation::InvalidValue {
                field: "icon.name",
                reason: "must not be empty",
            });
        }
        let hex = self.color.strip_prefix('#').unwrap_or("");
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ContractViolation::InvalidValue {
                field: "icon.color",
                reason: "must be #RRGGBB",
            });
        }
        Ok(())
    }
}
