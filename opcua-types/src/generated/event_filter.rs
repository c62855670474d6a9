// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// This file was generated by opcua-codegen from dictionary/types.yaml. DO NOT EDIT.

//! EventFilter wire types and a bottom-up evaluator for the where-clause
//! operator tree.
//!
//! Parsing a textual or XML filter expression into this tree is an external
//! collaborator's job; this module only encodes/decodes the tree the client
//! sent and evaluates it against a fired event's fields.

use std::io::{Read, Write};

use crate::{
    binary_struct,
    encoding::{BinaryDecodable, BinaryEncodable, Context},
    generated::attribute::AttributeId,
    node_id::NodeId,
    qualified_name::QualifiedName,
    string::UAString,
    variant::Variant,
    wire_enum, Error, UaNullable,
};

wire_enum!(FilterOperator, default = Equals {
    Equals = 0,
    IsNull = 1,
    GreaterThan = 2,
    LessThan = 3,
    GreaterOrEqual = 4,
    LessOrEqual = 5,
    Like = 6,
    Not = 7,
    Between = 8,
    InList = 9,
    And = 10,
    Or = 11,
    Cast = 12,
    OfType = 16,
    RelatedTo = 17,
    BitwiseAnd = 18,
    BitwiseOr = 19,
});

/// A path from an event instance to one of its fields, e.g. `/Severity`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SimpleAttributeOperand {
    /// Restricts the operand to instances of this event type; null matches any.
    pub type_id: NodeId,
    /// Browse-name hops from the event instance to the field.
    pub browse_path: Option<Vec<QualifiedName>>,
    /// Attribute to read at the end of the path; almost always `Value`.
    pub attribute_id: u32,
    /// Index range into the attribute's value, if it is an array.
    pub index_range: UAString,
}

impl UaNullable for SimpleAttributeOperand {
    fn is_ua_null(&self) -> bool {
        false
    }
}

binary_struct!(SimpleAttributeOperand {
    type_id: NodeId,
    browse_path: Option<Vec<QualifiedName>>,
    attribute_id: u32,
    index_range: UAString,
});

impl SimpleAttributeOperand {
    /// Build an operand selecting the `Value` attribute of the field named by `path`.
    pub fn value_of(path: &[&str]) -> Self {
        Self {
            type_id: NodeId::null(),
            browse_path: Some(path.iter().map(|p| QualifiedName::from(*p)).collect()),
            attribute_id: AttributeId::Value as u32,
            index_range: UAString::null(),
        }
    }
}

/// A constant value used as an operand.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LiteralOperand {
    /// The constant value.
    pub value: Variant,
}

impl UaNullable for LiteralOperand {
    fn is_ua_null(&self) -> bool {
        false
    }
}

binary_struct!(LiteralOperand { value: Variant });

/// A reference to another element of the same `ContentFilter`, used to build
/// the operator tree out of a flat element array.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ElementOperand {
    /// Index into the owning `ContentFilter::elements`.
    pub index: u32,
}

impl UaNullable for ElementOperand {
    fn is_ua_null(&self) -> bool {
        false
    }
}

binary_struct!(ElementOperand { index: u32 });

/// Reads an attribute of a node reached by a full `NodeId` + browse path,
/// rather than relative to the event instance.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AttributeOperand {
    /// Node the path starts from.
    pub node_id: NodeId,
    /// Optional textual alias for this operand, referenced by other elements.
    pub alias: UAString,
    /// Browse-name hops from `node_id` to the target.
    pub browse_path: Option<Vec<QualifiedName>>,
    /// Attribute to read at the end of the path.
    pub attribute_id: u32,
    /// Index range into the attribute's value, if it is an array.
    pub index_range: UAString,
}

impl UaNullable for AttributeOperand {
    fn is_ua_null(&self) -> bool {
        false
    }
}

binary_struct!(AttributeOperand {
    node_id: NodeId,
    alias: UAString,
    browse_path: Option<Vec<QualifiedName>>,
    attribute_id: u32,
    index_range: UAString,
});

/// One operand slot: exactly one of the four operand kinds, wrapped as an
/// `ExtensionObject` on the wire. Decoded eagerly here since the evaluator
/// needs to inspect the operand kind regardless.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterOperand {
    /// Constant value.
    Literal(LiteralOperand),
    /// Reference to another tree element.
    Element(ElementOperand),
    /// Path from the fired event instance.
    SimpleAttribute(SimpleAttributeOperand),
    /// Path from an arbitrary node.
    Attribute(AttributeOperand),
}

impl Default for FilterOperand {
    fn default() -> Self {
        FilterOperand::Literal(LiteralOperand::default())
    }
}

const OPERAND_TAG_LITERAL: u8 = 0;
const OPERAND_TAG_ELEMENT: u8 = 1;
const OPERAND_TAG_SIMPLE_ATTRIBUTE: u8 = 2;
const OPERAND_TAG_ATTRIBUTE: u8 = 3;

impl BinaryEncodable for FilterOperand {
    fn byte_len(&self, ctx: &Context<'_>) -> usize {
        1 + match self {
            FilterOperand::Literal(v) => v.byte_len(ctx),
            FilterOperand::Element(v) => v.byte_len(ctx),
            FilterOperand::SimpleAttribute(v) => v.byte_len(ctx),
            FilterOperand::Attribute(v) => v.byte_len(ctx),
        }
    }

    fn encode<S: Write + ?Sized>(&self, stream: &mut S, ctx: &Context<'_>) -> crate::encoding::EncodingResult<()> {
        match self {
            FilterOperand::Literal(v) => {
                OPERAND_TAG_LITERAL.encode(stream, ctx)?;
                v.encode(stream, ctx)
            }
            FilterOperand::Element(v) => {
                OPERAND_TAG_ELEMENT.encode(stream, ctx)?;
                v.encode(stream, ctx)
            }
            FilterOperand::SimpleAttribute(v) => {
                OPERAND_TAG_SIMPLE_ATTRIBUTE.encode(stream, ctx)?;
                v.encode(stream, ctx)
            }
            FilterOperand::Attribute(v) => {
                OPERAND_TAG_ATTRIBUTE.encode(stream, ctx)?;
                v.encode(stream, ctx)
            }
        }
    }
}

impl BinaryDecodable for FilterOperand {
    fn decode<S: Read + ?Sized>(stream: &mut S, ctx: &Context<'_>) -> crate::encoding::EncodingResult<Self> {
        let tag = u8::decode(stream, ctx)?;
        Ok(match tag {
            OPERAND_TAG_LITERAL => FilterOperand::Literal(LiteralOperand::decode(stream, ctx)?),
            OPERAND_TAG_ELEMENT => FilterOperand::Element(ElementOperand::decode(stream, ctx)?),
            OPERAND_TAG_SIMPLE_ATTRIBUTE => {
                FilterOperand::SimpleAttribute(SimpleAttributeOperand::decode(stream, ctx)?)
            }
            OPERAND_TAG_ATTRIBUTE => FilterOperand::Attribute(AttributeOperand::decode(stream, ctx)?),
            other => return Err(Error::decoding(format!("unrecognized filter operand tag {other}"))),
        })
    }
}

/// One node of the where-clause tree: an operator plus its operands.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ContentFilterElement {
    /// The operator this element applies.
    pub filter_operator: FilterOperator,
    /// The operator's operands, in the fixed order each operator expects.
    pub filter_operands: Option<Vec<FilterOperand>>,
}

impl UaNullable for ContentFilterElement {
    fn is_ua_null(&self) -> bool {
        self.filter_operands.as_ref().map(|v| v.is_empty()).unwrap_or(true)
    }
}

binary_struct!(ContentFilterElement {
    filter_operator: FilterOperator,
    filter_operands: Option<Vec<FilterOperand>>,
});

/// The where-clause: a flat array of elements, with element 0 the root.
/// Non-leaf operands reference other elements by index via `ElementOperand`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ContentFilter {
    /// The tree's elements, indexed by `ElementOperand::index`.
    pub elements: Option<Vec<ContentFilterElement>>,
}

impl UaNullable for ContentFilter {
    fn is_ua_null(&self) -> bool {
        self.elements.is_none()
    }
}

binary_struct!(ContentFilter {
    elements: Option<Vec<ContentFilterElement>>,
});

/// The combination of a where-clause and a list of fields to project,
/// attached to an event MonitoredItem's `MonitoringParameters::filter`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EventFilter {
    /// Ordered fields to project into each `EventFieldList`.
    pub select_clauses: Option<Vec<SimpleAttributeOperand>>,
    /// Predicate an event instance must satisfy to be reported.
    pub where_clause: ContentFilter,
}

impl UaNullable for EventFilter {
    fn is_ua_null(&self) -> bool {
        false
    }
}

binary_struct!(EventFilter {
    select_clauses: Option<Vec<SimpleAttributeOperand>>,
    where_clause: ContentFilter,
});

/// Resolves a [`SimpleAttributeOperand`]/[`AttributeOperand`] against a fired
/// event instance. The server's event source implements this; the evaluator
/// is generic over it so it has no dependency on the address space.
pub trait EventFieldSource {
    /// Look up the value at `field`'s browse path, or `None` if absent.
    fn resolve(&self, field: &SimpleAttributeOperand) -> Option<Variant>;
}

/// Numeric coercion ladder used for comparison operators: everything widens
/// to `f64` for comparison, matching the standard's "scalar numerics promote
/// to a common wider type" rule. Non-numeric, incomparable operands yield
/// `None`, which propagates as a `null` result.
fn as_f64(v: &Variant) -> Option<f64> {
    match v {
        Variant::SByte(n) => Some(*n as f64),
        Variant::Byte(n) => Some(*n as f64),
        Variant::Int16(n) => Some(*n as f64),
        Variant::UInt16(n) => Some(*n as f64),
        Variant::Int32(n) => Some(*n as f64),
        Variant::UInt32(n) => Some(*n as f64),
        Variant::Int64(n) => Some(*n as f64),
        Variant::UInt64(n) => Some(*n as f64),
        Variant::Float(n) => Some(*n as f64),
        Variant::Double(n) => Some(*n),
        _ => None,
    }
}

fn as_i64(v: &Variant) -> Option<i64> {
    match v {
        Variant::SByte(n) => Some(*n as i64),
        Variant::Byte(n) => Some(*n as i64),
        Variant::Int16(n) => Some(*n as i64),
        Variant::UInt16(n) => Some(*n as i64),
        Variant::Int32(n) => Some(*n as i64),
        Variant::UInt32(n) => Some(*n as i64),
        Variant::Int64(n) => Some(*n),
        Variant::UInt64(n) => Some(*n as i64),
        _ => None,
    }
}

fn is_null_variant(v: &Variant) -> bool {
    matches!(v, Variant::Empty)
}

fn as_bool(v: &Variant) -> Option<bool> {
    match v {
        Variant::Boolean(b) => Some(*b),
        _ => None,
    }
}

/// Evaluates a [`ContentFilter`] tree against one event instance.
pub struct FilterEvaluator<'a, S: EventFieldSource> {
    filter: &'a ContentFilter,
    source: &'a S,
}

impl<'a, S: EventFieldSource> FilterEvaluator<'a, S> {
    /// Build an evaluator for `filter` over the fields `source` exposes.
    pub fn new(filter: &'a ContentFilter, source: &'a S) -> Self {
        Self { filter, source }
    }

    fn elements(&self) -> &[ContentFilterElement] {
        self.filter.elements.as_deref().unwrap_or(&[])
    }

    fn operand_value(&self, operand: &FilterOperand) -> Variant {
        match operand {
            FilterOperand::Literal(lit) => lit.value.clone(),
            FilterOperand::SimpleAttribute(field) => {
                self.source.resolve(field).unwrap_or(Variant::Empty)
            }
            FilterOperand::Attribute(_) => Variant::Empty,
            FilterOperand::Element(elem) => self.eval_element(elem.index as usize),
        }
    }

    /// Evaluate the whole where-clause; an empty tree matches everything.
    pub fn matches(&self) -> bool {
        if self.elements().is_empty() {
            return true;
        }
        as_bool(&self.eval_element(0)).unwrap_or(false)
    }

    fn eval_element(&self, index: usize) -> Variant {
        let Some(element) = self.elements().get(index) else {
            return Variant::Empty;
        };
        let empty = Vec::new();
        let operands = element.filter_operands.as_ref().unwrap_or(&empty);
        match element.filter_operator {
            FilterOperator::And => {
                let Some(a) = operands.first() else { return Variant::Empty };
                match as_bool(&self.operand_value(a)) {
                    Some(false) => Variant::Boolean(false),
                    Some(true) => operands
                        .get(1)
                        .map(|b| self.operand_value(b))
                        .unwrap_or(Variant::Empty),
                    None => Variant::Empty,
                }
            }
            FilterOperator::Or => {
                let Some(a) = operands.first() else { return Variant::Empty };
                match as_bool(&self.operand_value(a)) {
                    Some(true) => Variant::Boolean(true),
                    Some(false) => operands
                        .get(1)
                        .map(|b| self.operand_value(b))
                        .unwrap_or(Variant::Empty),
                    None => Variant::Empty,
                }
            }
            FilterOperator::Not => match operands.first().map(|a| self.operand_value(a)) {
                Some(v) => match as_bool(&v) {
                    Some(b) => Variant::Boolean(!b),
                    None => Variant::Empty,
                },
                None => Variant::Empty,
            },
            FilterOperator::IsNull => match operands.first() {
                Some(a) => Variant::Boolean(is_null_variant(&self.operand_value(a))),
                None => Variant::Empty,
            },
            FilterOperator::Equals => self.compare(operands, |a, b| {
                if let (Some(a), Some(b)) = (as_f64(a), as_f64(b)) {
                    Some(a == b)
                } else {
                    Some(a == b)
                }
            }),
            FilterOperator::GreaterThan => {
                self.numeric_compare(operands, |a, b| a > b)
            }
            FilterOperator::LessThan => self.numeric_compare(operands, |a, b| a < b),
            FilterOperator::GreaterOrEqual => {
                self.numeric_compare(operands, |a, b| a >= b)
            }
            FilterOperator::LessOrEqual => self.numeric_compare(operands, |a, b| a <= b),
            FilterOperator::Between => {
                let (Some(v), Some(lo), Some(hi)) = (
                    operands.first().and_then(|o| as_f64(&self.operand_value(o))),
                    operands.get(1).and_then(|o| as_f64(&self.operand_value(o))),
                    operands.get(2).and_then(|o| as_f64(&self.operand_value(o))),
                ) else {
                    return Variant::Empty;
                };
                Variant::Boolean(v >= lo && v <= hi)
            }
            FilterOperator::InList => {
                let Some(needle) = operands.first().map(|o| self.operand_value(o)) else {
                    return Variant::Empty;
                };
                let found = operands[1..]
                    .iter()
                    .any(|o| self.operand_value(o) == needle);
                Variant::Boolean(found)
            }
            FilterOperator::BitwiseAnd => {
                self.int_op(operands, |a, b| a & b)
            }
            FilterOperator::BitwiseOr => self.int_op(operands, |a, b| a | b),
            // OfType/RelatedTo/Cast/Like need address-space access this
            // evaluator doesn't have; treat as non-matching rather than
            // erroring the whole filter.
            FilterOperator::OfType
            | FilterOperator::RelatedTo
            | FilterOperator::Cast
            | FilterOperator::Like => Variant::Empty,
        }
    }

    fn compare(
        &self,
        operands: &[FilterOperand],
        f: impl Fn(&Variant, &Variant) -> Option<bool>,
    ) -> Variant {
        let (Some(a), Some(b)) = (operands.first(), operands.get(1)) else {
            return Variant::Empty;
        };
        let (a, b) = (self.operand_value(a), self.operand_value(b));
        match f(&a, &b) {
            Some(result) => Variant::Boolean(result),
            None => Variant::Empty,
        }
    }

    fn numeric_compare(
        &self,
        operands: &[FilterOperand],
        f: impl Fn(f64, f64) -> bool,
    ) -> Variant {
        let (Some(a), Some(b)) = (operands.first(), operands.get(1)) else {
            return Variant::Empty;
        };
        let (a, b) = (self.operand_value(a), self.operand_value(b));
        match (as_f64(&a), as_f64(&b)) {
            (Some(a), Some(b)) => Variant::Boolean(f(a, b)),
            _ => Variant::Empty,
        }
    }

    fn int_op(&self, operands: &[FilterOperand], f: impl Fn(i64, i64) -> i64) -> Variant {
        let (Some(a), Some(b)) = (operands.first(), operands.get(1)) else {
            return Variant::Empty;
        };
        let (a, b) = (self.operand_value(a), self.operand_value(b));
        match (as_i64(&a), as_i64(&b)) {
            (Some(a), Some(b)) => Variant::Int64(f(a, b)),
            _ => Variant::Empty,
        }
    }

    /// Project `select_clauses` into one [`Variant`] per clause, using an
    /// empty `Variant` for any field that fails to resolve.
    pub fn project(&self, select_clauses: &[SimpleAttributeOperand]) -> Vec<Variant> {
        select_clauses
            .iter()
            .map(|clause| self.source.resolve(clause).unwrap_or(Variant::Empty))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MapSource(std::collections::HashMap<String, Variant>);

    impl EventFieldSource for MapSource {
        fn resolve(&self, field: &SimpleAttributeOperand) -> Option<Variant> {
            let name = field.browse_path.as_ref()?.last()?.name.as_ref();
            self.0.get(name).cloned()
        }
    }

    fn literal(v: Variant) -> FilterOperand {
        FilterOperand::Literal(LiteralOperand { value: v })
    }

    fn field(name: &str) -> FilterOperand {
        FilterOperand::SimpleAttribute(SimpleAttributeOperand::value_of(&[name]))
    }

    #[test]
    fn empty_filter_matches_everything() {
        let filter = ContentFilter { elements: None };
        let source = MapSource(Default::default());
        assert!(FilterEvaluator::new(&filter, &source).matches());
    }

    #[test]
    fn severity_greater_than_500_matches() {
        let mut map = std::collections::HashMap::new();
        map.insert("Severity".to_string(), Variant::UInt16(900));
        let source = MapSource(map);
        let filter = ContentFilter {
            elements: Some(vec![ContentFilterElement {
                filter_operator: FilterOperator::GreaterThan,
                filter_operands: Some(vec![field("Severity"), literal(Variant::Int32(500))]),
            }]),
        };
        assert!(FilterEvaluator::new(&filter, &source).matches());
    }

    #[test]
    fn and_short_circuits_on_false_left_operand() {
        let mut map = std::collections::HashMap::new();
        map.insert("Severity".to_string(), Variant::UInt16(100));
        let source = MapSource(map);
        let filter = ContentFilter {
            elements: Some(vec![ContentFilterElement {
                filter_operator: FilterOperator::And,
                filter_operands: Some(vec![
                    FilterOperand::Element(ElementOperand { index: 1 }),
                    FilterOperand::Element(ElementOperand { index: 1 }),
                ]),
            }, ContentFilterElement {
                filter_operator: FilterOperator::GreaterThan,
                filter_operands: Some(vec![field("Severity"), literal(Variant::Int32(500))]),
            }]),
        };
        assert!(!FilterEvaluator::new(&filter, &source).matches());
    }

    #[test]
    fn select_clause_projection_fills_empty_for_missing_field() {
        let source = MapSource(Default::default());
        let filter = ContentFilter { elements: None };
        let evaluator = FilterEvaluator::new(&filter, &source);
        let projected = evaluator.project(&[SimpleAttributeOperand::value_of(&["Message"])]);
        assert_eq!(projected, vec![Variant::Empty]);
    }
}
