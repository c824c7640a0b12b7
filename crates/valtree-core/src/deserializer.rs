//! Recursive-descent reader that turns text into heap values, guided by a type.
//!
//! Grammar (struct fields are positional):
//!
//! ```text
//! value := int | float | string | "nil" | "-" value
//!        | "[" elems "]" | ident "{" elems "}"
//! elems := (empty) | value (("," | linefeed) value)* [linefeed]
//! ```
//!
//! Syntax alone cannot say what a nested container is; the [`TypeId`] passed
//! down does. A vector type hands its element type to every element, a struct
//! type hands each position its field type.
//!
//! # Ownership
//!
//! Each object created during a parse is recorded in the deserializer's
//! [`AllocationLog`], which is drained when the deserializer is dropped. No
//! branch below cleans up after itself on error: returning `Err` unwinds to the
//! drop, and the drop releases everything. Containers retain their children, so
//! the drain leaves a successfully built tree alive only if its root was
//! retained first (see [`Deserializer::retain`]).

use crate::allocation::AllocationLog;
use crate::error::{ParseResult, SyntaxError};
use crate::heap::HeapFactory;
use crate::lexer::{Lexer, Token, TokenKind};
use crate::types::{Shape, TypeId, TypeResolver};
use crate::value::Value;

/// Bounds for a `Name{...}` body.
#[derive(Debug, Clone, Copy)]
struct FieldLimits {
    /// Values past this many are read and discarded.
    max: usize,
    required: usize,
}

pub struct Deserializer<'src, 'ctx, H, R>
where
    H: HeapFactory + ?Sized,
    R: TypeResolver + ?Sized,
{
    lexer: Lexer<'src>,
    token: Token<'src>,
    heap: &'ctx mut H,
    types: &'ctx R,
    log: AllocationLog,
}

impl<'src, 'ctx, H, R> Deserializer<'src, 'ctx, H, R>
where
    H: HeapFactory + ?Sized,
    R: TypeResolver + ?Sized,
{
    /// Bind a deserializer to `text`, reading the first token.
    pub fn new(text: &'src str, heap: &'ctx mut H, types: &'ctx R) -> ParseResult<Self> {
        let mut lexer = Lexer::new(text);
        let token = lexer.next_token()?;
        Ok(Self {
            lexer,
            token,
            heap,
            types,
            log: AllocationLog::new(),
        })
    }

    /// Parse exactly one value followed by an optional line break and the end
    /// of input.
    pub fn parse_one(&mut self, ty: TypeId) -> ParseResult<Value> {
        let value = self.parse_factor(ty)?;
        self.gobble(TokenKind::Linefeed)?;
        self.expect(TokenKind::EndOfFile)?;
        Ok(value)
    }

    /// Add a reference to `value` so it outlives this deserializer's teardown.
    pub fn retain(&mut self, value: &Value) {
        self.heap.incref(value);
    }

    /// Objects allocated so far and not yet released.
    pub fn allocations(&self) -> &AllocationLog {
        &self.log
    }

    pub fn parse_factor(&mut self, ty: TypeId) -> ParseResult<Value> {
        match self.token.kind {
            TokenKind::Int => {
                let value = self.int_literal(false)?;
                self.advance()?;
                Ok(Value::Int(value))
            }
            TokenKind::Float => {
                let value = self.token.text.parse::<f64>().map_err(|_| {
                    self.error(format!("malformed float literal: {}", self.token))
                })?;
                self.advance()?;
                Ok(Value::Float(value))
            }
            TokenKind::Str => {
                let obj = self.heap.new_string(&self.token.text);
                let value = Value::Str(obj);
                self.log.record(value);
                self.advance()?;
                Ok(value)
            }
            TokenKind::Nil => {
                self.advance()?;
                Ok(Value::Nil)
            }
            TokenKind::Minus => {
                self.advance()?;
                // Read `-<int>` as one literal so the most negative i64 fits.
                if self.token.kind == TokenKind::Int {
                    let value = self.int_literal(true)?;
                    self.advance()?;
                    return Ok(Value::Int(value));
                }
                match self.parse_factor(ty)? {
                    Value::Int(i) => i
                        .checked_neg()
                        .map(Value::Int)
                        .ok_or_else(|| self.error(format!("integer literal out of range: -{i}"))),
                    Value::Float(f) => Ok(Value::Float(-f)),
                    _ => Err(self.error("numeric value expected")),
                }
            }
            TokenKind::LeftBracket => {
                self.advance()?;
                self.parse_elems(TokenKind::RightBracket, ty, None)
            }
            TokenKind::Ident => {
                let name = self.token.text.clone().into_owned();
                self.advance()?;
                self.expect(TokenKind::LeftBrace)?;
                let types = self.types;
                let Some((struct_ty, required)) = types.resolve_struct(&name) else {
                    return Err(self.error(format!("unknown type: {name}")));
                };
                let max = match types.describe(struct_ty) {
                    Shape::Struct(shape) => shape.fields.len(),
                    Shape::Vector(_) | Shape::Scalar => required,
                };
                let limits = FieldLimits { max, required };
                self.parse_elems(TokenKind::RightBrace, struct_ty, Some(limits))
            }
            _ => Err(self.error(format!("illegal start of value: {}", self.token))),
        }
    }

    /// Parse container elements up to and including `end`, then build the
    /// container.
    fn parse_elems(
        &mut self,
        end: TokenKind,
        ty: TypeId,
        limits: Option<FieldLimits>,
    ) -> ParseResult<Value> {
        self.gobble(TokenKind::Linefeed)?;
        let types = self.types;
        let shape = types.describe(ty);
        let mut elems = Vec::new();

        if self.token.kind == end {
            self.advance()?;
        } else {
            let mut index = 0;
            loop {
                let elem_ty = self.element_type(shape, index, limits)?;
                let value = self.parse_factor(elem_ty)?;
                if limits.is_some_and(|l| elems.len() == l.max) {
                    self.log.release_entry(&mut *self.heap, value);
                } else {
                    elems.push(value);
                }
                index += 1;

                let has_linefeed = self.token.kind == TokenKind::Linefeed;
                if has_linefeed {
                    self.advance()?;
                }
                if self.token.kind == end {
                    break;
                }
                if !has_linefeed {
                    self.expect(TokenKind::Comma)?;
                }
            }
            self.advance()?;
        }

        // `[..]` read as a struct owes the same required fields as `Name{..}`.
        let required = match (limits, shape) {
            (Some(l), _) => l.required,
            (None, Shape::Struct(s)) => s.required,
            (None, Shape::Vector(_) | Shape::Scalar) => 0,
        };
        if elems.len() < required {
            let name = match shape {
                Shape::Struct(s) => s.name,
                Shape::Vector(_) | Shape::Scalar => "struct",
            };
            return Err(self.error(format!(
                "not enough constructor initializers for {name}: expected {required}, found {}",
                elems.len()
            )));
        }

        let container = self.heap.new_container(elems.len(), ty);
        let value = Value::Vector(container);
        self.log.record(value);
        for elem in elems {
            self.heap.incref(&elem);
            self.heap.push(container, elem);
        }
        Ok(value)
    }

    fn element_type(
        &self,
        shape: Shape<'_>,
        index: usize,
        limits: Option<FieldLimits>,
    ) -> ParseResult<TypeId> {
        match shape {
            Shape::Vector(elem) => Ok(elem),
            Shape::Struct(s) => match s.fields.get(index) {
                Some(&field) => Ok(field),
                // Surplus struct initializers are discarded, so their type is moot.
                None if limits.is_some_and(|l| index >= l.max) => Ok(TypeId::ANY),
                None => Err(self.error(format!(
                    "too many elements for {}: it has {} fields",
                    s.name,
                    s.fields.len()
                ))),
            },
            Shape::Scalar => Ok(TypeId::ANY),
        }
    }

    fn int_literal(&self, negative: bool) -> ParseResult<i64> {
        let parsed = if negative {
            format!("-{}", self.token.text).parse::<i64>()
        } else {
            self.token.text.parse::<i64>()
        };
        parsed.map_err(|_| self.error(format!("integer literal out of range: {}", self.token)))
    }

    fn advance(&mut self) -> ParseResult<()> {
        self.token = self.lexer.next_token()?;
        Ok(())
    }

    fn expect(&mut self, kind: TokenKind) -> ParseResult<()> {
        if self.token.kind != kind {
            return Err(self.error(format!("{kind} expected, found: {}", self.token)));
        }
        self.advance()
    }

    fn gobble(&mut self, kind: TokenKind) -> ParseResult<()> {
        if self.token.kind == kind {
            self.advance()?;
        }
        Ok(())
    }

    fn error(&self, message: impl Into<String>) -> SyntaxError {
        SyntaxError::new(message, self.token.position)
    }
}

impl<H, R> Drop for Deserializer<'_, '_, H, R>
where
    H: HeapFactory + ?Sized,
    R: TypeResolver + ?Sized,
{
    fn drop(&mut self) {
        tracing::debug!(entries = self.log.len(), "releasing allocation log");
        self.log.release_all(&mut *self.heap);
    }
}

impl<H, R> std::fmt::Debug for Deserializer<'_, '_, H, R>
where
    H: HeapFactory + ?Sized,
    R: TypeResolver + ?Sized,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Deserializer")
            .field("token", &self.token)
            .field("allocations", &self.log.len())
            .finish_non_exhaustive()
    }
}
