//! Feature schemas.
//!
//! A schema describes the fields a feature can carry and owns the symbology
//! (named groups of reusable symbol presets) that features of that schema
//! can pick from. Schemas come from the external schema store and are
//! read-only here.
//!
//! Field definitions form a closed set of kinds ([`FieldDefinition`]). Only
//! [`FieldDefinition::SymbologyBoolean`] influences how a feature is drawn;
//! the order of definitions inside a schema is significant because later
//! symbology fields override earlier ones.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::style::SymbolStyle;

pub type SchemaId = u64;
pub type FieldId = u64;
pub type SymbolId = u64;
pub type GroupId = u64;

/// Errors raised when a schema violates its structural invariants.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("schema {schema} defines field {field} more than once")]
    DuplicateField { schema: SchemaId, field: FieldId },

    #[error("schema {schema} defines symbol {symbol} more than once")]
    DuplicateSymbol { schema: SchemaId, symbol: SymbolId },
}

/// One field definition of a schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FieldDefinition {
    #[serde(rename = "text_field")]
    Text {
        id: FieldId,
        name: String,
        #[serde(default)]
        default_value: Option<String>,
    },

    #[serde(rename = "number_field")]
    Number {
        id: FieldId,
        name: String,
        #[serde(default)]
        default_value: Option<f64>,
    },

    #[serde(rename = "boolean_field")]
    Boolean {
        id: FieldId,
        name: String,
        #[serde(default)]
        default_value: bool,
    },

    #[serde(rename = "date_field")]
    Date {
        id: FieldId,
        name: String,
        /// ISO 8601 calendar date.
        #[serde(default)]
        default_value: Option<String>,
    },

    #[serde(rename = "url_field")]
    Url {
        id: FieldId,
        name: String,
    },

    /// A checkbox that, when ticked, layers `symbol` over the feature's style.
    #[serde(rename = "symbology_field_boolean")]
    SymbologyBoolean {
        id: FieldId,
        name: String,
        #[serde(default)]
        default_value: bool,
        symbol: SymbolStyle,
    },
}

impl FieldDefinition {
    /// Returns the id of this field
    pub fn id(&self) -> FieldId {
        match self {
            Self::Text { id, .. }
            | Self::Number { id, .. }
            | Self::Boolean { id, .. }
            | Self::Date { id, .. }
            | Self::Url { id, .. }
            | Self::SymbologyBoolean { id, .. } => *id,
        }
    }

    /// Returns the display name of this field
    pub fn name(&self) -> &str {
        match self {
            Self::Text { name, .. }
            | Self::Number { name, .. }
            | Self::Boolean { name, .. }
            | Self::Date { name, .. }
            | Self::Url { name, .. }
            | Self::SymbologyBoolean { name, .. } => name,
        }
    }
}

/// A named group that symbol presets are filed under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbologyGroup {
    pub id: GroupId,
    pub name: String,
}

/// A reusable partial style features can reference by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolPreset {
    pub id: SymbolId,
    pub group_id: GroupId,
    pub props: SymbolStyle,
    #[serde(default)]
    pub favourited_map_ids: Vec<u64>,
}

/// The symbol presets of a schema and the groups they belong to.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symbology {
    #[serde(default)]
    pub groups: Vec<SymbologyGroup>,
    #[serde(default)]
    pub symbols: Vec<SymbolPreset>,
}

impl Symbology {
    /// Looks up a symbol preset by id
    pub fn symbol(&self, id: SymbolId) -> Option<&SymbolPreset> {
        self.symbols.iter().find(|symbol| symbol.id == id)
    }

    /// Returns the presets filed under `group_id`, in stored order.
    pub fn symbols_in_group(&self, group_id: GroupId) -> impl Iterator<Item = &SymbolPreset> {
        self.symbols
            .iter()
            .filter(move |symbol| symbol.group_id == group_id)
    }
}

/// A feature schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub id: SchemaId,
    pub name: String,
    /// Field definitions in display and override order.
    #[serde(default)]
    pub definition: Vec<FieldDefinition>,
    #[serde(default)]
    pub symbology: Symbology,
    #[serde(default)]
    pub default_symbology: Option<SymbolStyle>,
}

impl Schema {
    /// Looks up a field definition by id
    pub fn field(&self, id: FieldId) -> Option<&FieldDefinition> {
        self.definition.iter().find(|field| field.id() == id)
    }

    /// Checks that field ids and symbol ids are unique.
    ///
    /// # Errors
    ///
    /// Returns the first duplicate found, fields before symbols.
    pub fn validate(&self) -> Result<(), SchemaError> {
        let mut fields = HashSet::new();
        if let Some(field) = self
            .definition
            .iter()
            .map(FieldDefinition::id)
            .find(|id| !fields.insert(*id))
        {
            return Err(SchemaError::DuplicateField {
                schema: self.id,
                field,
            });
        }

        let mut symbols = HashSet::new();
        if let Some(symbol) = self
            .symbology
            .symbols
            .iter()
            .map(|symbol| symbol.id)
            .find(|id| !symbols.insert(*id))
        {
            return Err(SchemaError::DuplicateSymbol {
                schema: self.id,
                symbol,
            });
        }

        Ok(())
    }
}
