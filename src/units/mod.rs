
//! Subsystem for representing units, composing them into new units,
//! and converting between them.

pub mod compose;
pub mod dimension;
pub mod fraction;
pub mod hierarchy;
pub mod parsing;
pub mod scalar;
pub mod transform;
pub mod unit;

pub use compose::{CompositionError, multiply, divide, power, prefix, check_composable};
pub use dimension::Dimension;
pub use fraction::{FractionBounds, fractionalize, format_fraction, parse_fraction};
pub use hierarchy::hierarchical;
pub use parsing::{parse_unit_expression, UnitExprError};
pub use scalar::Scalar;
pub use transform::{Transform, Ratio, ConversionError};
pub use unit::{Unit, UnitSymbol, Datatype, Conversion, DependentVariable};
