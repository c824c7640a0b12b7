//! JSON schema files declaring struct types.
//!
//! ```json
//! {
//!   "structs": [
//!     { "name": "Point", "fields": [
//!         { "name": "x", "type": "int" },
//!         { "name": "y", "type": "int" },
//!         { "name": "label", "type": "string", "default": true }
//!     ] }
//!   ]
//! }
//! ```
//!
//! Field types are type expressions (see [`TypeRegistry::parse_type`]) and may
//! name any struct in the same file, in any order.

use serde::Deserialize;

use crate::error::{Result, ValtreeError};
use crate::types::{FieldDef, TypeRegistry};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Schema {
    #[serde(default)]
    pub structs: Vec<StructDecl>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StructDecl {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldDecl>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    /// Whether the field may be omitted from a struct literal.
    #[serde(default)]
    pub default: bool,
}

impl Schema {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Build a registry holding the builtin types plus every struct here.
    pub fn build_registry(&self) -> Result<TypeRegistry> {
        let mut registry = TypeRegistry::new();
        self.register(&mut registry)?;
        Ok(registry)
    }

    /// Add this schema's structs to an existing registry.
    pub fn register(&self, registry: &mut TypeRegistry) -> Result<()> {
        let ids = self
            .structs
            .iter()
            .map(|decl| registry.declare_struct(&decl.name))
            .collect::<Result<Vec<_>>>()?;

        for (decl, ty) in self.structs.iter().zip(ids) {
            let mut fields = Vec::with_capacity(decl.fields.len());
            for field in &decl.fields {
                let field_ty = registry.parse_type(&field.ty).map_err(|e| {
                    ValtreeError::Schema(format!(
                        "struct {}, field {}: {}",
                        decl.name,
                        field.name,
                        schema_message(e)
                    ))
                })?;
                fields.push(FieldDef {
                    name: field.name.clone(),
                    ty: field_ty,
                    has_default: field.default,
                });
            }
            registry.define_struct(ty, fields)?;
        }

        tracing::debug!(structs = self.structs.len(), "registered schema");
        Ok(())
    }
}

fn schema_message(err: ValtreeError) -> String {
    match err {
        ValtreeError::Schema(message) => message,
        other => other.to_string(),
    }
}
