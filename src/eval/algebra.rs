
//! The operator algebra. Every operator of the language is a function
//! that matches on the runtime types of its operands; combinations
//! that are not listed are type errors naming both operands.

use super::error::EvalError;
use super::function::{Arity, FunctionValue};
use super::matrix;
use super::value::{Value, ValueUnit};
use crate::catalog::Catalog;
use crate::expr::operator::{BinaryOp, UnaryOp};
use crate::units::compose;
use crate::units::dimension::Dimension;
use crate::units::scalar::Scalar;
use crate::units::transform::expect_number;
use crate::units::unit::{Datatype, Unit};

use std::cmp::Ordering;

/// Arithmetic over runtime values, against one catalog.
#[derive(Debug, Clone, Copy)]
pub struct Algebra<'a> {
  catalog: &'a Catalog,
}

type NumberOp<'f> = &'f dyn Fn(f64, f64) -> Result<f64, EvalError>;
type ValueOp<'f> = &'f dyn Fn(&Value, &Value) -> Result<Value, EvalError>;

/// Largest magnitude at which every integer is exactly representable.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

impl<'a> Algebra<'a> {
  pub fn new(catalog: &'a Catalog) -> Self {
    Self { catalog }
  }

  pub fn catalog(&self) -> &'a Catalog {
    self.catalog
  }

  pub fn render(&self, value: &Value) -> String {
    value.render(self.catalog.language())
  }

  fn unit_name(&self, unit: &Unit) -> String {
    unit.display_name(self.catalog.language())
  }

  pub fn mismatch(&self, op: &str, left: &Value, right: &Value) -> EvalError {
    EvalError::TypeMismatch { op: op.to_owned(), left: self.render(left), right: self.render(right) }
  }

  pub fn unary_mismatch(&self, op: &str, operand: &Value) -> EvalError {
    EvalError::UnaryTypeMismatch { op: op.to_owned(), operand: self.render(operand) }
  }

  fn dimension_mismatch(&self, left: &Unit, right: &Unit) -> EvalError {
    EvalError::DimensionMismatch {
      left: format!("unit `{}`", self.unit_name(left)),
      right: format!("unit `{}`", self.unit_name(right)),
    }
  }

  pub fn binary(&self, op: BinaryOp, a: &Value, b: &Value) -> Result<Value, EvalError> {
    match op {
      BinaryOp::Power => self.pow(a, b),
      BinaryOp::Prefix10 => self.scale_prefix(op, 10, a, b),
      BinaryOp::Prefix2 => self.scale_prefix(op, 2, a, b),
      BinaryOp::Root => self.root(a, b),
      BinaryOp::At => self.bind(a, b),
      BinaryOp::Convert => match b {
        Value::Unit(target) => self.convert(a, target, None),
        _ => Err(self.mismatch(op.symbol(), a, b)),
      },
      BinaryOp::Mul => self.mul(a, b),
      BinaryOp::Div => self.div(a, b),
      BinaryOp::Mod => self.numbers(op, a, b, &|x, y| Ok(x - y * (x / y).floor())),
      BinaryOp::IntDiv => self.numbers(op, a, b, &|x, y| Ok((x / y).floor())),
      BinaryOp::Add => self.add(a, b),
      BinaryOp::Sub => self.sub(a, b),
      BinaryOp::Shl | BinaryOp::Shr | BinaryOp::BitAnd | BinaryOp::BitXor | BinaryOp::BitOr => {
        self.bitwise(op, a, b)
      }
      BinaryOp::Concat => self.concat(a, b),
      BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => self.compare(op, a, b),
      BinaryOp::Eq => self.equals(a, b).map(Value::Boolean),
      BinaryOp::Ne => self.equals(a, b).map(|eq| Value::Boolean(!eq)),
      BinaryOp::And | BinaryOp::Or | BinaryOp::Xor => self.logical(op, a, b),
      // Assignment is a statement, handled by the evaluator.
      BinaryOp::Assign => Err(self.mismatch(op.symbol(), a, b)),
    }
  }

  pub fn unary(&self, op: UnaryOp, a: &Value) -> Result<Value, EvalError> {
    match op {
      UnaryOp::Plus => match a {
        Value::Number(_) | Value::Array(_) | Value::ValueUnit(_) => Ok(a.clone()),
        _ => Err(self.unary_mismatch(op.symbol(), a)),
      },
      UnaryOp::Neg => self.neg(a),
      UnaryOp::BitNot => self.map_numbers(op.symbol(), a, &|x| Ok(!to_integer(op.symbol(), x)? as f64)),
      UnaryOp::Not => match a {
        Value::Boolean(b) => Ok(Value::Boolean(!b)),
        Value::Array(elems) => elems.iter().map(|e| self.unary(op, e)).collect::<Result<_, _>>().map(Value::Array),
        _ => Err(self.unary_mismatch(op.symbol(), a)),
      },
      UnaryOp::Sqrt => self.root(&Value::Number(2.0), a),
      UnaryOp::Cbrt => self.root(&Value::Number(3.0), a),
      UnaryOp::FourthRoot => self.root(&Value::Number(4.0), a),
    }
  }

  /// Applies `f` elementwise when either operand is an array, with a
  /// non-array operand broadcast across the other. `None` when
  /// neither operand is an array.
  fn broadcast(&self, op: BinaryOp, a: &Value, b: &Value, f: ValueOp<'_>) -> Option<Result<Value, EvalError>> {
    let result = match (a, b) {
      (Value::Array(xs), Value::Array(ys)) => {
        if xs.len() != ys.len() {
          let message = format!("arrays of length {} and {} do not line up", xs.len(), ys.len());
          return Some(Err(EvalError::domain(op.symbol(), message)));
        }
        xs.iter().zip(ys).map(|(x, y)| f(x, y)).collect::<Result<Vec<_>, _>>()
      }
      (Value::Array(xs), y) => xs.iter().map(|x| f(x, y)).collect(),
      (x, Value::Array(ys)) => ys.iter().map(|y| f(x, y)).collect(),
      _ => return None,
    };
    Some(result.map(Value::Array))
  }

  fn broadcast_or_mismatch(&self, op: BinaryOp, a: &Value, b: &Value, f: ValueOp<'_>) -> Result<Value, EvalError> {
    self.broadcast(op, a, b, f).unwrap_or_else(|| Err(self.mismatch(op.symbol(), a, b)))
  }

  /// A purely numeric operator, lifted over arrays.
  fn numbers(&self, op: BinaryOp, a: &Value, b: &Value, f: NumberOp<'_>) -> Result<Value, EvalError> {
    match (a, b) {
      (Value::Number(x), Value::Number(y)) => f(*x, *y).map(Value::Number),
      _ => self.broadcast_or_mismatch(op, a, b, &|x, y| self.numbers(op, x, y, f)),
    }
  }

  fn map_numbers(&self, op: &str, a: &Value, f: &dyn Fn(f64) -> Result<f64, EvalError>) -> Result<Value, EvalError> {
    match a {
      Value::Number(x) => f(*x).map(Value::Number),
      Value::Array(elems) => elems.iter().map(|e| self.map_numbers(op, e, f)).collect::<Result<_, _>>().map(Value::Array),
      _ => Err(self.unary_mismatch(op, a)),
    }
  }

  /// Applies a real function to a number, elementwise to arrays, and
  /// to the base value of a quantity (so `sin` of degrees works).
  pub fn map_real(&self, name: &str, a: &Value, f: fn(f64) -> f64) -> Result<Value, EvalError> {
    match a {
      Value::ValueUnit(_) => Ok(Value::Number(f(self.real(name, a)?))),
      Value::Array(elems) => elems.iter().map(|e| self.map_real(name, e, f)).collect::<Result<_, _>>().map(Value::Array),
      _ => self.map_numbers(name, a, &|x| Ok(f(x))),
    }
  }

  /// The value as a plain real: numbers as is, quantities by their
  /// base value.
  pub fn real(&self, name: &str, a: &Value) -> Result<f64, EvalError> {
    match a {
      Value::Number(x) => Ok(*x),
      Value::ValueUnit(x) => {
        let dep = self.binding_base(&x.unit, x.depvalue.as_ref(), x.depunit.as_ref(), "source")?;
        let scalar = x.value.to_scalar().ok_or_else(|| self.unary_mismatch(name, a))?;
        Ok(expect_number(&x.unit.to_base(&scalar, dep.as_ref())?)?)
      }
      _ => Err(self.unary_mismatch(name, a)),
    }
  }

  pub fn add(&self, a: &Value, b: &Value) -> Result<Value, EvalError> {
    self.additive(BinaryOp::Add, a, b)
  }

  pub fn sub(&self, a: &Value, b: &Value) -> Result<Value, EvalError> {
    self.additive(BinaryOp::Sub, a, b)
  }

  fn additive(&self, op: BinaryOp, a: &Value, b: &Value) -> Result<Value, EvalError> {
    match (a, b) {
      (Value::Number(x), Value::Number(y)) => {
        Ok(Value::Number(if op == BinaryOp::Add { x + y } else { x - y }))
      }
      (Value::ValueUnit(x), Value::ValueUnit(y)) => {
        let y_value = self.align(x, y)?;
        let value = self.additive(op, &x.value, &y_value)?;
        Ok(Value::ValueUnit(Box::new(x.with_value(value))))
      }
      _ => self.broadcast_or_mismatch(op, a, b, &|x, y| self.additive(op, x, y)),
    }
  }

  /// The payload of `y` expressed in the unit of `x`, for addition and
  /// subtraction.
  pub fn align(&self, x: &ValueUnit, y: &ValueUnit) -> Result<Value, EvalError> {
    compose::check_composable(self.catalog, &x.unit)?;
    compose::check_composable(self.catalog, &y.unit)?;
    if !x.unit.dimension.eq_dim(&y.unit.dimension) {
      return Err(self.dimension_mismatch(&x.unit, &y.unit));
    }
    self.convert_payload(&y.value, &y.unit, None, &x.unit, None)
  }

  pub fn neg(&self, a: &Value) -> Result<Value, EvalError> {
    match a {
      Value::Number(x) => Ok(Value::Number(-x)),
      Value::Array(elems) => elems.iter().map(|e| self.neg(e)).collect::<Result<_, _>>().map(Value::Array),
      Value::ValueUnit(x) => Ok(Value::ValueUnit(Box::new(x.with_value(self.neg(&x.value)?)))),
      _ => Err(self.unary_mismatch("-", a)),
    }
  }

  pub fn mul(&self, a: &Value, b: &Value) -> Result<Value, EvalError> {
    let op = BinaryOp::Mul;
    match (a, b) {
      (Value::Number(x), Value::Number(y)) => Ok(Value::Number(x * y)),
      (Value::Array(_), Value::Array(_)) => match (a.as_matrix(), b.as_matrix()) {
        (Some(m), Some(n)) => matrix::product(self, &m, &n).map(Value::from_matrix),
        _ => self.broadcast_or_mismatch(op, a, b, &|x, y| self.mul(x, y)),
      },
      (Value::Number(_) | Value::Array(_) | Value::String(_), Value::Unit(u)) => {
        Ok(Value::quantity(a.clone(), (**u).clone()))
      }
      (Value::Unit(u), Value::Number(_)) => Ok(Value::quantity(b.clone(), (**u).clone())),
      (Value::Unit(u), Value::Unit(v)) => {
        Ok(Value::unit(compose::multiply(self.catalog, &[u.as_ref(), v.as_ref()])?))
      }
      (Value::ValueUnit(x), Value::ValueUnit(y)) => {
        let unit = compose::multiply(self.catalog, &[&x.unit, &y.unit])?;
        Ok(Value::quantity(self.mul(&x.value, &y.value)?, unit))
      }
      (Value::ValueUnit(x), Value::Number(_)) => {
        Ok(Value::ValueUnit(Box::new(x.with_value(self.mul(&x.value, b)?))))
      }
      (Value::Number(_), Value::ValueUnit(y)) => {
        Ok(Value::ValueUnit(Box::new(y.with_value(self.mul(a, &y.value)?))))
      }
      (Value::ValueUnit(x), Value::Unit(u)) => {
        let unit = compose::multiply(self.catalog, &[&x.unit, u.as_ref()])?;
        Ok(Value::quantity(x.value.clone(), unit))
      }
      (Value::Unit(u), Value::ValueUnit(y)) => {
        let unit = compose::multiply(self.catalog, &[u.as_ref(), &y.unit])?;
        Ok(Value::quantity(y.value.clone(), unit))
      }
      (Value::Function(f), Value::Function(g)) => Ok(Value::Function(f.compose(g))),
      _ => self.broadcast_or_mismatch(op, a, b, &|x, y| self.mul(x, y)),
    }
  }

  pub fn div(&self, a: &Value, b: &Value) -> Result<Value, EvalError> {
    let op = BinaryOp::Div;
    if let Some(divisor) = b.as_matrix() {
      if divisor.is_square() && (a.as_matrix().is_some() || matches!(a, Value::Number(_))) {
        let inverse = Value::from_matrix(matrix::inverse(self, &divisor)?);
        return self.mul(a, &inverse);
      }
    }
    match (a, b) {
      (Value::Number(x), Value::Number(y)) => Ok(Value::Number(x / y)),
      (Value::Number(_) | Value::Array(_), Value::Unit(u)) => {
        Ok(Value::quantity(a.clone(), compose::power(self.catalog, u, -1.0)?))
      }
      (Value::Unit(u), Value::Number(y)) => Ok(Value::quantity(Value::Number(1.0 / y), (**u).clone())),
      (Value::Unit(u), Value::Unit(v)) => {
        Ok(Value::unit(compose::divide(self.catalog, &[u.as_ref(), v.as_ref()])?))
      }
      (Value::ValueUnit(x), Value::ValueUnit(y)) => {
        let unit = compose::divide(self.catalog, &[&x.unit, &y.unit])?;
        Ok(Value::quantity(self.div(&x.value, &y.value)?, unit))
      }
      (Value::ValueUnit(x), Value::Number(_)) => {
        Ok(Value::ValueUnit(Box::new(x.with_value(self.div(&x.value, b)?))))
      }
      (Value::Number(_), Value::ValueUnit(y)) => {
        let unit = compose::power(self.catalog, &y.unit, -1.0)?;
        Ok(Value::quantity(self.div(a, &y.value)?, unit))
      }
      (Value::ValueUnit(x), Value::Unit(u)) => {
        let unit = compose::divide(self.catalog, &[&x.unit, u.as_ref()])?;
        Ok(Value::quantity(x.value.clone(), unit))
      }
      (Value::Unit(u), Value::ValueUnit(y)) => {
        let unit = compose::divide(self.catalog, &[u.as_ref(), &y.unit])?;
        Ok(Value::quantity(self.div(&Value::Number(1.0), &y.value)?, unit))
      }
      (Value::Function(f), Value::Function(g)) => Ok(Value::Function(f.compose(&g.invert()?))),
      _ => self.broadcast_or_mismatch(op, a, b, &|x, y| self.div(x, y)),
    }
  }

  pub fn pow(&self, a: &Value, b: &Value) -> Result<Value, EvalError> {
    let op = BinaryOp::Power;
    if let (Some(m), Value::Number(n)) = (a.as_matrix(), b) {
      let exponent = to_integer(op.symbol(), *n)?;
      return matrix::power(self, &m, exponent).map(Value::from_matrix);
    }
    match (a, b) {
      (Value::Number(x), Value::Number(y)) => Ok(Value::Number(x.powf(*y))),
      (Value::Unit(u), Value::Number(n)) => Ok(Value::unit(compose::power(self.catalog, u, *n)?)),
      (Value::ValueUnit(x), Value::Number(n)) => {
        let unit = compose::power(self.catalog, &x.unit, *n)?;
        Ok(Value::quantity(self.pow(&x.value, b)?, unit))
      }
      (Value::Function(f), Value::Number(n)) => {
        Ok(Value::Function(f.pow(to_integer(op.symbol(), *n)?)?))
      }
      _ => self.broadcast_or_mismatch(op, a, b, &|x, y| self.pow(x, y)),
    }
  }

  /// `degree √ x`. Odd roots of negative numbers are real.
  pub fn root(&self, degree: &Value, x: &Value) -> Result<Value, EvalError> {
    let op = BinaryOp::Root;
    match (degree, x) {
      (Value::Number(n), Value::Number(x)) => Ok(Value::Number(real_root(*x, *n))),
      (Value::Array(_), _) | (_, Value::Array(_)) => {
        self.broadcast_or_mismatch(op, degree, x, &|n, y| self.root(n, y))
      }
      (Value::Number(n), Value::Unit(_) | Value::ValueUnit(_)) => self.pow(x, &Value::Number(1.0 / n)),
      _ => Err(self.mismatch(op.symbol(), degree, x)),
    }
  }

  /// `x _ n` and `x ↓ n`: scaling by a power of ten or two. On a bare
  /// unit this applies the matching prefix.
  fn scale_prefix(&self, op: BinaryOp, base: u32, a: &Value, b: &Value) -> Result<Value, EvalError> {
    match (a, b) {
      (Value::Number(x), Value::Number(n)) => Ok(Value::Number(x * f64::from(base).powf(*n))),
      (Value::Unit(u), Value::Number(n)) => {
        let exponent = i32::try_from(to_integer(op.symbol(), *n)?)
          .map_err(|_| EvalError::domain(op.symbol(), format!("prefix exponent {n} is out of range")))?;
        Ok(Value::unit(compose::prefix(self.catalog, u, base, exponent)?))
      }
      (Value::ValueUnit(x), Value::Number(n)) => {
        let scaled = self.mul(&x.value, &Value::Number(f64::from(base).powf(*n)))?;
        Ok(Value::ValueUnit(Box::new(x.with_value(scaled))))
      }
      _ => self.broadcast_or_mismatch(op, a, b, &|x, y| self.scale_prefix(op, base, x, y)),
    }
  }

  fn bitwise(&self, op: BinaryOp, a: &Value, b: &Value) -> Result<Value, EvalError> {
    let symbol = op.symbol();
    self.numbers(op, a, b, &|x, y| {
      let (i, j) = (to_integer(symbol, x)?, to_integer(symbol, y)?);
      let result = match op {
        BinaryOp::Shl => shift_left(i, j),
        BinaryOp::Shr => shift_left(i, j.saturating_neg()),
        BinaryOp::BitAnd => i & j,
        BinaryOp::BitXor => i ^ j,
        _ => i | j,
      };
      Ok(result as f64)
    })
  }

  fn concat(&self, a: &Value, b: &Value) -> Result<Value, EvalError> {
    match (a, b) {
      (Value::Array(xs), Value::Array(ys)) => Ok(Value::Array(xs.iter().chain(ys).cloned().collect())),
      (Value::String(_), _) | (_, Value::String(_)) => {
        Ok(Value::String(format!("{}{}", self.text(a), self.text(b))))
      }
      _ => Err(self.mismatch(BinaryOp::Concat.symbol(), a, b)),
    }
  }

  fn text(&self, value: &Value) -> String {
    match value {
      Value::String(s) => s.clone(),
      other => self.render(other),
    }
  }

  fn logical(&self, op: BinaryOp, a: &Value, b: &Value) -> Result<Value, EvalError> {
    match (a, b) {
      (Value::Boolean(x), Value::Boolean(y)) => Ok(Value::Boolean(match op {
        BinaryOp::And => *x && *y,
        BinaryOp::Or => *x || *y,
        _ => x != y,
      })),
      _ => Err(self.mismatch(op.symbol(), a, b)),
    }
  }

  fn compare(&self, op: BinaryOp, a: &Value, b: &Value) -> Result<Value, EvalError> {
    if let Some(result) = self.broadcast(op, a, b, &|x, y| self.compare(op, x, y)) {
      return result;
    }
    let result = self.ordering(op.symbol(), a, b)?.is_some_and(|ordering| match op {
      BinaryOp::Lt => ordering.is_lt(),
      BinaryOp::Le => ordering.is_le(),
      BinaryOp::Gt => ordering.is_gt(),
      _ => ordering.is_ge(),
    });
    Ok(Value::Boolean(result))
  }

  /// Orders two scalars. Quantities compare by base value. `None`
  /// when a NaN is involved.
  pub fn ordering(&self, op: &str, a: &Value, b: &Value) -> Result<Option<Ordering>, EvalError> {
    match (a, b) {
      (Value::Number(x), Value::Number(y)) => Ok(x.partial_cmp(y)),
      (Value::String(x), Value::String(y)) => Ok(Some(x.cmp(y))),
      (Value::ValueUnit(x), Value::ValueUnit(y)) => {
        let (p, q) = self.base_pair(op, x, y)?;
        Ok(p.partial_cmp(&q))
      }
      _ => Err(self.mismatch(op, a, b)),
    }
  }

  fn base_pair(&self, op: &str, x: &ValueUnit, y: &ValueUnit) -> Result<(f64, f64), EvalError> {
    if !x.unit.dimension.eq_dim(&y.unit.dimension) {
      return Err(self.dimension_mismatch(&x.unit, &y.unit));
    }
    let base = |v: &ValueUnit, side: &'static str| -> Result<f64, EvalError> {
      let dep = self.binding_base(&v.unit, v.depvalue.as_ref(), v.depunit.as_ref(), side)?;
      let scalar = v.value.to_scalar().ok_or_else(|| self.unary_mismatch(op, &v.value))?;
      Ok(expect_number(&v.unit.to_base(&scalar, dep.as_ref())?)?)
    };
    Ok((base(x, "left")?, base(y, "right")?))
  }

  pub fn equals(&self, a: &Value, b: &Value) -> Result<bool, EvalError> {
    match (a, b) {
      (Value::Number(x), Value::Number(y)) => Ok(x == y),
      (Value::String(x), Value::String(y)) => Ok(x == y),
      (Value::Boolean(x), Value::Boolean(y)) => Ok(x == y),
      (Value::Array(xs), Value::Array(ys)) => {
        if xs.len() != ys.len() {
          return Ok(false);
        }
        for (x, y) in xs.iter().zip(ys) {
          if !self.equals(x, y)? {
            return Ok(false);
          }
        }
        Ok(true)
      }
      (Value::ValueUnit(x), Value::ValueUnit(y)) => {
        let (p, q) = self.base_pair("==", x, y)?;
        Ok(p == q)
      }
      (Value::Unit(u), Value::Unit(v)) => Ok(same_unit(u, v)),
      (Value::Function(f), Value::Function(g)) => Ok(f.ptr_eq(g)),
      (Value::UnitType(r), Value::UnitType(s)) |
      (Value::Include(r), Value::Include(s)) |
      (Value::Element(r), Value::Element(s)) |
      (Value::Solver(r), Value::Solver(s)) => Ok(r == s),
      _ => Ok(false),
    }
  }

  /// `quantity @ independent`: binds the independent variable of a
  /// dependent unit.
  fn bind(&self, a: &Value, b: &Value) -> Result<Value, EvalError> {
    match a {
      Value::ValueUnit(x) if x.unit.is_dependent() => {
        let (depvalue, depunit) = self.split_binding(b)?;
        if let (Some(dep), Some(unit)) = (&x.unit.dependent, &depunit) {
          if !dep.dimension.eq_dim(&unit.dimension) {
            return Err(EvalError::DimensionMismatch {
              left: format!("independent variable of `{}`", self.unit_name(&x.unit)),
              right: format!("unit `{}`", self.unit_name(unit)),
            });
          }
        }
        Ok(Value::ValueUnit(Box::new((**x).clone().with_binding(depvalue, depunit))))
      }
      _ => Err(self.mismatch(BinaryOp::At.symbol(), a, b)),
    }
  }

  fn split_binding(&self, value: &Value) -> Result<(Value, Option<Unit>), EvalError> {
    match value {
      Value::ValueUnit(x) => Ok((x.value.clone(), Some(x.unit.clone()))),
      Value::Number(_) => Ok((value.clone(), None)),
      _ => Err(self.unary_mismatch(BinaryOp::At.symbol(), value)),
    }
  }

  /// The independent variable of a dependent unit in its base unit.
  /// `None` for units that do not need one.
  fn binding_base(
    &self,
    unit: &Unit,
    depvalue: Option<&Value>,
    depunit: Option<&Unit>,
    side: &'static str,
  ) -> Result<Option<Scalar>, EvalError> {
    if !unit.is_dependent() {
      return Ok(None);
    }
    let Some(value) = depvalue else {
      return Err(EvalError::MissingIndependentVariable { side, unit: self.unit_name(unit) });
    };
    let scalar = value.to_scalar().ok_or_else(|| self.unary_mismatch(BinaryOp::At.symbol(), value))?;
    match depunit {
      None => Ok(Some(scalar)),
      Some(depunit) => Ok(Some(depunit.to_base(&scalar, None)?)),
    }
  }

  /// Converts a value to `target`. A bare unit on the left yields a
  /// conversion function instead of a value. `binding` is the
  /// independent variable of a dependent target.
  pub fn convert(&self, value: &Value, target: &Unit, binding: Option<&Value>) -> Result<Value, EvalError> {
    let (depvalue, depunit) = match binding {
      Some(b) => {
        let (v, u) = self.split_binding(b)?;
        (Some(v), u)
      }
      None => (None, None),
    };
    match value {
      Value::Unit(source) => {
        self.conversion_function(source, target, depvalue.as_ref(), depunit.as_ref()).map(Value::Function)
      }
      Value::ValueUnit(x) => {
        let source_dep = self.binding_base(&x.unit, x.depvalue.as_ref(), x.depunit.as_ref(), "source")?;
        let target_dep = self.binding_base(target, depvalue.as_ref(), depunit.as_ref(), "target")?;
        let payload = self.convert_payload(&x.value, &x.unit, source_dep.as_ref(), target, target_dep.as_ref())?;
        let mut result = ValueUnit::new(payload, target.clone());
        if let Some(depvalue) = depvalue {
          result = result.with_binding(depvalue, depunit);
        }
        Ok(Value::ValueUnit(Box::new(result)))
      }
      Value::Array(elems) if elems.iter().any(|e| matches!(e, Value::ValueUnit(_))) => {
        elems.iter().map(|e| self.convert(e, target, binding)).collect::<Result<_, _>>().map(Value::Array)
      }
      // Plain numbers are in the dimensionless base unit.
      Value::Number(_) | Value::Array(_) => {
        let quantity = Value::quantity(value.clone(), Unit::new(Dimension::one()));
        self.convert(&quantity, target, binding)
      }
      _ => Err(self.mismatch(BinaryOp::Convert.symbol(), value, &Value::unit(target.clone()))),
    }
  }

  /// Converts a payload between two units. Reciprocal dimensions
  /// convert through the reciprocal of the base value. Numeric units
  /// convert arrays elementwise; tuple units take the array whole.
  pub fn convert_payload(
    &self,
    value: &Value,
    from: &Unit,
    from_dep: Option<&Scalar>,
    to: &Unit,
    to_dep: Option<&Scalar>,
  ) -> Result<Value, EvalError> {
    let reciprocal = if from.dimension.eq_dim(&to.dimension) {
      false
    } else if from.dimension.complementary(&to.dimension) {
      true
    } else {
      return Err(self.dimension_mismatch(from, to));
    };
    if let Value::Array(elems) = value {
      if from.datatype != Datatype::Tuple {
        return elems.iter()
          .map(|e| self.convert_payload(e, from, from_dep, to, to_dep))
          .collect::<Result<_, _>>()
          .map(Value::Array);
      }
    }
    let scalar = value.to_scalar().ok_or_else(|| self.unary_mismatch(BinaryOp::Convert.symbol(), value))?;
    let mut base = from.to_base(&scalar, from_dep)?;
    if reciprocal {
      base = Scalar::Number(1.0 / expect_number(&base)?);
    }
    Ok(Value::from_scalar(to.from_base(&base, to_dep)?))
  }

  fn conversion_function(
    &self,
    source: &Unit,
    target: &Unit,
    depvalue: Option<&Value>,
    depunit: Option<&Unit>,
  ) -> Result<FunctionValue, EvalError> {
    if source.is_dependent() {
      return Err(EvalError::MissingIndependentVariable { side: "source", unit: self.unit_name(source) });
    }
    if !source.dimension.eq_dim(&target.dimension) && !source.dimension.complementary(&target.dimension) {
      return Err(self.dimension_mismatch(source, target));
    }
    let target_dep = self.binding_base(target, depvalue, depunit, "target")?;
    let name = format!("{} to {}", self.unit_name(source), self.unit_name(target));
    let (from, to, dep) = (source.clone(), target.clone(), target_dep.clone());
    let (back_from, back_to, back_dep) = (source.clone(), target.clone(), target_dep);
    let function = FunctionValue::new(name, Arity::UNARY, move |algebra, args| {
      algebra.convert_payload(&args[0], &from, None, &to, dep.as_ref())
    }).with_inverse(move |algebra, args| {
      algebra.convert_payload(&args[0], &back_to, back_dep.as_ref(), &back_from, None)
    });
    Ok(function)
  }
}

fn same_unit(u: &Unit, v: &Unit) -> bool {
  if u.id.is_some() && u.id == v.id {
    return true;
  }
  u.dimension == v.dimension && u.datatype == v.datatype && u.ratio().is_some() && u.ratio() == v.ratio()
}

/// The value as an exact integer, for bitwise operators and integer
/// exponents.
pub fn to_integer(op: &str, x: f64) -> Result<i64, EvalError> {
  if x.is_finite() && x.fract() == 0.0 && x.abs() <= MAX_EXACT_INTEGER {
    Ok(x as i64)
  } else {
    Err(EvalError::domain(op, format!("{x} is not an integer")))
  }
}

fn shift_left(i: i64, amount: i64) -> i64 {
  if amount >= 0 {
    u32::try_from(amount).ok().and_then(|n| i.checked_shl(n)).unwrap_or(0)
  } else {
    i >> amount.unsigned_abs().min(63)
  }
}

pub fn real_root(x: f64, degree: f64) -> f64 {
  let odd = degree.fract() == 0.0 && degree.rem_euclid(2.0) == 1.0;
  if x < 0.0 && odd {
    -(-x).powf(1.0 / degree)
  } else {
    x.powf(1.0 / degree)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::catalog::defaults::default_catalog;

  use approx::assert_abs_diff_eq;

  fn n(x: f64) -> Value {
    Value::Number(x)
  }

  fn number(v: Value) -> f64 {
    v.as_number().unwrap()
  }

  fn unit(catalog: &Catalog, key: &str) -> Value {
    Value::unit(catalog.unit(key).unwrap().clone())
  }

  fn payload(v: &Value) -> f64 {
    match v {
      Value::ValueUnit(x) => x.value.as_number().unwrap(),
      other => panic!("not a quantity: {other}"),
    }
  }

  #[test]
  fn test_numbers() {
    let catalog = Catalog::new();
    let alg = Algebra::new(&catalog);
    assert_eq!(number(alg.binary(BinaryOp::Add, &n(2.0), &n(3.0)).unwrap()), 5.0);
    assert_eq!(number(alg.binary(BinaryOp::Mod, &n(-7.0), &n(3.0)).unwrap()), 2.0);
    assert_eq!(number(alg.binary(BinaryOp::IntDiv, &n(7.0), &n(2.0)).unwrap()), 3.0);
    assert_eq!(number(alg.binary(BinaryOp::Prefix10, &n(5.0), &n(3.0)).unwrap()), 5000.0);
    assert_eq!(number(alg.binary(BinaryOp::Prefix2, &n(1.0), &n(10.0)).unwrap()), 1024.0);
    assert_eq!(number(alg.binary(BinaryOp::Root, &n(3.0), &n(-8.0)).unwrap()), -2.0);
    assert_eq!(number(alg.unary(UnaryOp::Sqrt, &n(9.0)).unwrap()), 3.0);
  }

  #[test]
  fn test_bitwise() {
    let catalog = Catalog::new();
    let alg = Algebra::new(&catalog);
    assert_eq!(number(alg.binary(BinaryOp::Shl, &n(1.0), &n(4.0)).unwrap()), 16.0);
    assert_eq!(number(alg.binary(BinaryOp::Shr, &n(16.0), &n(2.0)).unwrap()), 4.0);
    assert_eq!(number(alg.binary(BinaryOp::BitXor, &n(6.0), &n(3.0)).unwrap()), 5.0);
    assert_eq!(number(alg.unary(UnaryOp::BitNot, &n(0.0)).unwrap()), -1.0);
    assert!(matches!(alg.binary(BinaryOp::BitAnd, &n(1.5), &n(1.0)), Err(EvalError::Domain { .. })));
  }

  #[test]
  fn test_arrays_broadcast() {
    let catalog = Catalog::new();
    let alg = Algebra::new(&catalog);
    let xs = Value::Array(vec![n(1.0), n(2.0)]);
    let sum = alg.add(&xs, &n(10.0)).unwrap();
    assert_eq!(sum.to_string(), "[11, 12]");
    let product = alg.mul(&xs, &xs).unwrap();
    assert_eq!(product.to_string(), "[1, 4]");
    let short = Value::Array(vec![n(1.0)]);
    assert!(matches!(alg.add(&xs, &short), Err(EvalError::Domain { .. })));
  }

  #[test]
  fn test_type_mismatch_renders_operands() {
    let catalog = Catalog::new();
    let alg = Algebra::new(&catalog);
    let err = alg.add(&n(1.0), &Value::Boolean(true)).unwrap_err();
    assert_eq!(err.to_string(), "Cannot apply `+` to 1 and true");
    let err = alg.logical(BinaryOp::And, &Value::Array(vec![n(1.0)]), &Value::String("x".to_owned())).unwrap_err();
    assert_eq!(err.to_string(), "Cannot apply `&&` to [1] and \"x\"");
  }

  #[test]
  fn test_quantity_addition_converts_to_first_unit() {
    let catalog = default_catalog();
    let alg = Algebra::new(&catalog);
    let one_foot = alg.mul(&n(1.0), &unit(&catalog, "foot")).unwrap();
    let six_inches = alg.mul(&n(6.0), &unit(&catalog, "inch")).unwrap();
    let total = alg.add(&one_foot, &six_inches).unwrap();
    assert_abs_diff_eq!(payload(&total), 1.5, epsilon = 1e-12);
    assert_eq!(total.to_string(), "1.5 feet");
    let second = alg.mul(&n(1.0), &unit(&catalog, "second")).unwrap();
    assert!(matches!(alg.add(&one_foot, &second), Err(EvalError::DimensionMismatch { .. })));
  }

  #[test]
  fn test_quantity_comparison() {
    let catalog = default_catalog();
    let alg = Algebra::new(&catalog);
    let one_foot = alg.mul(&n(1.0), &unit(&catalog, "foot")).unwrap();
    let thirty_cm = alg.mul(&n(0.3), &unit(&catalog, "meter")).unwrap();
    assert_eq!(alg.binary(BinaryOp::Gt, &one_foot, &thirty_cm).unwrap().as_bool(), Some(true));
    assert!(!alg.equals(&one_foot, &thirty_cm).unwrap());
  }

  #[test]
  fn test_unit_products() {
    let catalog = default_catalog();
    let alg = Algebra::new(&catalog);
    let speed = alg.div(&unit(&catalog, "meter"), &unit(&catalog, "second")).unwrap();
    let Value::Unit(speed) = speed else { panic!("expected a unit") };
    assert_eq!(speed.symbol_text().as_deref(), Some("m/s"));
    let area = alg.pow(&unit(&catalog, "meter"), &n(2.0)).unwrap();
    let Value::Unit(area) = area else { panic!("expected a unit") };
    assert_eq!(area.dimension, Dimension::from_components([("length", num::rational::Rational64::from(2))]));
    let kilometer = alg.binary(BinaryOp::Prefix10, &unit(&catalog, "meter"), &n(3.0)).unwrap();
    let Value::Unit(kilometer) = kilometer else { panic!("expected a unit") };
    assert_eq!(kilometer.ratio().unwrap().value(), 1000.0);
  }

  #[test]
  fn test_convert_reciprocal() {
    let catalog = default_catalog();
    let alg = Algebra::new(&catalog);
    let freq = alg.mul(&n(2.0), &unit(&catalog, "hertz")).unwrap();
    let second = catalog.unit("second").unwrap();
    let period = alg.convert(&freq, second, None).unwrap();
    assert_abs_diff_eq!(payload(&period), 0.5);
  }

  #[test]
  fn test_convert_dimension_mismatch() {
    let catalog = default_catalog();
    let alg = Algebra::new(&catalog);
    let length = alg.mul(&n(2.0), &unit(&catalog, "meter")).unwrap();
    let err = alg.convert(&length, catalog.unit("second").unwrap(), None).unwrap_err();
    assert_eq!(err.to_string(), "Dimensions of unit `meter` and unit `second` do not match");
  }

  #[test]
  fn test_conversion_function() {
    let catalog = default_catalog();
    let alg = Algebra::new(&catalog);
    let f = alg.convert(&unit(&catalog, "celsius"), catalog.unit("fahrenheit").unwrap(), None).unwrap();
    let Value::Function(f) = f else { panic!("expected a function") };
    assert_eq!(f.to_string(), "degree Celsius to degree Fahrenheit");
    assert_abs_diff_eq!(number(f.call(&alg, &[n(100.0)]).unwrap()), 212.0, epsilon = 1e-9);
    let back = f.invert().unwrap();
    assert_abs_diff_eq!(number(back.call(&alg, &[n(32.0)]).unwrap()), 0.0, epsilon = 1e-9);
  }

  #[test]
  fn test_dependent_conversion_needs_binding() {
    let catalog = default_catalog();
    let alg = Algebra::new(&catalog);
    let knot = catalog.unit("knot").unwrap();
    let one_mach = alg.mul(&n(1.0), &unit(&catalog, "mach")).unwrap();
    let err = alg.convert(&one_mach, knot, None).unwrap_err();
    assert_eq!(err, EvalError::MissingIndependentVariable { side: "source", unit: "mach".to_owned() });

    let temperature = alg.mul(&n(288.15), &unit(&catalog, "kelvin")).unwrap();
    let bound = alg.binary(BinaryOp::At, &one_mach, &temperature).unwrap();
    assert_eq!(bound.to_string(), "1 mach at 288.15 kelvins");
    let speed = alg.convert(&bound, knot, None).unwrap();
    assert_abs_diff_eq!(payload(&speed), 661.5, epsilon = 0.5);

    let mach = catalog.unit("mach").unwrap();
    let err = alg.convert(&speed, mach, None).unwrap_err();
    assert_eq!(err, EvalError::MissingIndependentVariable { side: "target", unit: "mach".to_owned() });
    let back = alg.convert(&speed, mach, Some(&temperature)).unwrap();
    assert_abs_diff_eq!(payload(&back), 1.0, epsilon = 1e-9);
  }

  #[test]
  fn test_function_algebra() {
    let catalog = Catalog::new();
    let alg = Algebra::new(&catalog);
    let double = FunctionValue::new("dbl", Arity::UNARY, |_, args| Ok(Value::Number(args[0].as_number().unwrap() * 2.0)))
      .with_inverse(|_, args| Ok(Value::Number(args[0].as_number().unwrap() / 2.0)));
    let f = Value::Function(double);
    let cubed = alg.pow(&f, &n(3.0)).unwrap();
    assert_eq!(cubed.to_string(), "function `dbl³`");
    let quotient = alg.div(&f, &f).unwrap();
    let Value::Function(quotient) = quotient else { panic!("expected a function") };
    assert_eq!(number(quotient.call(&alg, &[n(5.0)]).unwrap()), 5.0);
  }

  #[test]
  fn test_real_root() {
    assert_eq!(real_root(-27.0, 3.0), -3.0);
    assert!(real_root(-4.0, 2.0).is_nan());
    assert_eq!(real_root(16.0, 4.0), 2.0);
  }
}
