//! Type handles and the resolver the deserializer consults.
//!
//! The reader only cares about two shapes: vectors (one element type) and
//! structs (an ordered list of field types plus how many of them must be
//! supplied). Everything else is a scalar and is never introspected.
//!
//! [`TypeRegistry`] is the bundled [`TypeResolver`]. It predefines the scalar
//! types `any`, `int`, `float` and `string`, interns vector types so `[int]`
//! always yields the same handle, and stores struct definitions declared in
//! code or loaded from a [`Schema`](crate::schema::Schema).

use std::collections::HashMap;
use std::fmt;

use crate::error::{Result, ValtreeError};

/// Opaque handle into a type system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeId(pub u32);

impl TypeId {
    /// The untyped handle; elements read against it are decoded by syntax alone.
    pub const ANY: TypeId = TypeId(0);
    pub const INT: TypeId = TypeId(1);
    pub const FLOAT: TypeId = TypeId(2);
    pub const STRING: TypeId = TypeId(3);
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a [`TypeId`] looks like to the reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape<'a> {
    Vector(TypeId),
    Struct(StructShape<'a>),
    Scalar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StructShape<'a> {
    pub name: &'a str,
    pub fields: &'a [TypeId],
    /// Always `<= fields.len()`.
    pub required: usize,
}

/// Type lookups needed by the deserializer and encoder.
pub trait TypeResolver {
    /// Resolve a struct name to its handle and required field count.
    fn resolve_struct(&self, name: &str) -> Option<(TypeId, usize)>;

    /// Describe a handle. Unknown handles are [`Shape::Scalar`].
    fn describe(&self, ty: TypeId) -> Shape<'_>;
}

/// A struct field as declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    pub name: String,
    pub ty: TypeId,
    pub has_default: bool,
}

impl FieldDef {
    pub fn required(name: impl Into<String>, ty: TypeId) -> Self {
        Self {
            name: name.into(),
            ty,
            has_default: false,
        }
    }

    pub fn with_default(name: impl Into<String>, ty: TypeId) -> Self {
        Self {
            name: name.into(),
            ty,
            has_default: true,
        }
    }
}

#[derive(Debug, Clone)]
struct StructDef {
    name: String,
    field_names: Vec<String>,
    field_types: Vec<TypeId>,
    required: usize,
    defined: bool,
}

#[derive(Debug, Clone)]
enum TypeDef {
    Any,
    Int,
    Float,
    String,
    Vector(TypeId),
    Struct(StructDef),
}

const BUILTINS: [(&str, TypeId); 4] = [
    ("any", TypeId::ANY),
    ("int", TypeId::INT),
    ("float", TypeId::FLOAT),
    ("string", TypeId::STRING),
];

#[derive(Debug, Clone)]
pub struct TypeRegistry {
    defs: Vec<TypeDef>,
    structs: HashMap<String, TypeId>,
    vectors: HashMap<TypeId, TypeId>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self {
            defs: vec![TypeDef::Any, TypeDef::Int, TypeDef::Float, TypeDef::String],
            structs: HashMap::new(),
            vectors: HashMap::new(),
        }
    }

    /// The interned vector type with element type `elem`.
    pub fn vector_of(&mut self, elem: TypeId) -> Result<TypeId> {
        if let Some(&ty) = self.vectors.get(&elem) {
            return Ok(ty);
        }
        let ty = self.push(TypeDef::Vector(elem))?;
        self.vectors.insert(elem, ty);
        Ok(ty)
    }

    /// Reserve a struct name so other definitions can refer to it before its
    /// fields are known. Complete it with [`define_struct`](Self::define_struct).
    pub fn declare_struct(&mut self, name: &str) -> Result<TypeId> {
        if !is_identifier(name) {
            return Err(ValtreeError::Schema(format!(
                "invalid struct name: {name:?}"
            )));
        }
        if name == "nil" || BUILTINS.iter().any(|(builtin, _)| *builtin == name) {
            return Err(ValtreeError::Schema(format!("reserved type name: {name}")));
        }
        if self.structs.contains_key(name) {
            return Err(ValtreeError::Schema(format!("duplicate struct: {name}")));
        }
        let ty = self.push(TypeDef::Struct(StructDef {
            name: name.to_owned(),
            field_names: Vec::new(),
            field_types: Vec::new(),
            required: 0,
            defined: false,
        }))?;
        self.structs.insert(name.to_owned(), ty);
        Ok(ty)
    }

    /// Set the fields of a declared struct.
    ///
    /// Fields with a default must come after every field without one; the
    /// number of fields without a default is the struct's required count.
    pub fn define_struct(&mut self, ty: TypeId, fields: Vec<FieldDef>) -> Result<()> {
        let known = self.defs.len();
        let Some(TypeDef::Struct(def)) = self.defs.get_mut(ty.0 as usize) else {
            return Err(ValtreeError::Schema(format!("{ty} is not a struct type")));
        };
        if def.defined {
            return Err(ValtreeError::Schema(format!(
                "struct {} is already defined",
                def.name
            )));
        }

        let mut required = 0;
        let mut seen_default = false;
        for (i, field) in fields.iter().enumerate() {
            if fields[..i].iter().any(|f| f.name == field.name) {
                return Err(ValtreeError::Schema(format!(
                    "duplicate field {} in struct {}",
                    field.name, def.name
                )));
            }
            if field.ty.0 as usize >= known {
                return Err(ValtreeError::Schema(format!(
                    "field {} of struct {} has unknown type {}",
                    field.name, def.name, field.ty
                )));
            }
            if field.has_default {
                seen_default = true;
            } else if seen_default {
                return Err(ValtreeError::Schema(format!(
                    "field {} of struct {} has no default but follows a field that does",
                    field.name, def.name
                )));
            } else {
                required += 1;
            }
        }

        def.field_names = fields.iter().map(|f| f.name.clone()).collect();
        def.field_types = fields.iter().map(|f| f.ty).collect();
        def.required = required;
        def.defined = true;
        Ok(())
    }

    /// Declare and define a struct in one step.
    pub fn add_struct(&mut self, name: &str, fields: Vec<FieldDef>) -> Result<TypeId> {
        let ty = self.declare_struct(name)?;
        self.define_struct(ty, fields)?;
        Ok(ty)
    }

    /// Field names of a struct type, in declaration order.
    pub fn field_names(&self, ty: TypeId) -> Option<&[String]> {
        match self.defs.get(ty.0 as usize)? {
            TypeDef::Struct(def) => Some(&def.field_names),
            _ => None,
        }
    }

    /// Structs that were declared but never defined.
    pub fn undefined_structs(&self) -> Vec<&str> {
        self.defs
            .iter()
            .filter_map(|def| match def {
                TypeDef::Struct(def) if !def.defined => Some(def.name.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Resolve a type expression: `any`, `int`, `float`, `string`, a struct
    /// name, or `[T]` for a vector of `T`.
    pub fn parse_type(&mut self, expr: &str) -> Result<TypeId> {
        let expr = expr.trim();
        if let Some(inner) = expr.strip_prefix('[') {
            let inner = inner.strip_suffix(']').ok_or_else(|| {
                ValtreeError::Schema(format!("unbalanced brackets in type: {expr}"))
            })?;
            let elem = self.parse_type(inner)?;
            return self.vector_of(elem);
        }
        if let Some((_, ty)) = BUILTINS.iter().find(|(name, _)| *name == expr) {
            return Ok(*ty);
        }
        self.structs
            .get(expr)
            .copied()
            .ok_or_else(|| ValtreeError::Schema(format!("unknown type: {expr}")))
    }

    /// Render a handle as a type expression.
    pub fn type_name(&self, ty: TypeId) -> String {
        match self.defs.get(ty.0 as usize) {
            Some(TypeDef::Any) => "any".to_owned(),
            Some(TypeDef::Int) => "int".to_owned(),
            Some(TypeDef::Float) => "float".to_owned(),
            Some(TypeDef::String) => "string".to_owned(),
            Some(TypeDef::Vector(elem)) => format!("[{}]", self.type_name(*elem)),
            Some(TypeDef::Struct(def)) => def.name.clone(),
            None => ty.to_string(),
        }
    }

    fn push(&mut self, def: TypeDef) -> Result<TypeId> {
        let ty = u32::try_from(self.defs.len())
            .map(TypeId)
            .map_err(|_| ValtreeError::Schema("type table is full".to_owned()))?;
        self.defs.push(def);
        Ok(ty)
    }
}

impl TypeResolver for TypeRegistry {
    fn resolve_struct(&self, name: &str) -> Option<(TypeId, usize)> {
        let ty = *self.structs.get(name)?;
        match self.defs.get(ty.0 as usize)? {
            TypeDef::Struct(def) => Some((ty, def.required)),
            _ => None,
        }
    }

    fn describe(&self, ty: TypeId) -> Shape<'_> {
        match self.defs.get(ty.0 as usize) {
            Some(TypeDef::Vector(elem)) => Shape::Vector(*elem),
            Some(TypeDef::Struct(def)) => Shape::Struct(StructShape {
                name: &def.name,
                fields: &def.field_types,
                required: def.required,
            }),
            _ => Shape::Scalar,
        }
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
