
//! Conversion instructions: a compact textual description of a unit's
//! numeric conversion, compiled on first use into a [`Transform`].

use crate::units::transform::{Transform, Ratio, ConversionError};

use once_cell::sync::OnceCell;

use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

/// Compiles instruction text into a forward/reverse transform pair.
/// The two directions must be exact mathematical inverses.
pub trait InstructionCompiler: Debug + Send + Sync {
  fn compile(&self, source: &str) -> Result<CompiledInstructions, ConversionError>;
}

#[derive(Debug, Clone)]
pub struct CompiledInstructions {
  pub transform: Transform,
  /// Present when the instructions amount to a pure scale.
  pub ratio: Option<Ratio>,
}

/// Handle to a unit's instructions. Compilation happens at most once
/// per handle, and clones of a handle share the compiled result.
#[derive(Clone)]
pub struct Instructions {
  source: String,
  compiler: Arc<dyn InstructionCompiler>,
  compiled: Arc<OnceCell<CompiledInstructions>>,
}

/// Default compiler. Instructions are whitespace-separated steps, each
/// an operator among `*`, `/`, `+`, `-` followed by a number. The
/// forward direction applies the steps in order; the reverse direction
/// undoes them in reverse order.
///
/// For instance, Fahrenheit is `-32 *5 /9 +273.15`.
#[derive(Debug, Clone, Default)]
pub struct LinearCompiler;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Step {
  Mul(f64),
  Div(f64),
  Add(f64),
  Sub(f64),
}

impl Instructions {
  pub fn new(source: impl Into<String>, compiler: Arc<dyn InstructionCompiler>) -> Self {
    Self {
      source: source.into(),
      compiler,
      compiled: Arc::new(OnceCell::new()),
    }
  }

  pub fn source(&self) -> &str {
    &self.source
  }

  pub fn compiled(&self) -> Result<&CompiledInstructions, ConversionError> {
    self.compiled.get_or_try_init(|| self.compiler.compile(&self.source))
  }

  pub fn is_compiled(&self) -> bool {
    self.compiled.get().is_some()
  }
}

impl Debug for Instructions {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    f.debug_struct("Instructions")
      .field("source", &self.source)
      .field("compiled", &self.is_compiled())
      .finish()
  }
}

impl Step {
  fn parse(token: &str) -> Option<Step> {
    let mut chars = token.chars();
    let op = chars.next()?;
    let arg: f64 = chars.as_str().parse().ok()?;
    match op {
      '*' => Some(Step::Mul(arg)),
      '/' => Some(Step::Div(arg)),
      '+' => Some(Step::Add(arg)),
      '-' => Some(Step::Sub(arg)),
      _ => None,
    }
  }

  fn apply(self, x: f64) -> f64 {
    match self {
      Step::Mul(a) => x * a,
      Step::Div(a) => x / a,
      Step::Add(a) => x + a,
      Step::Sub(a) => x - a,
    }
  }

  fn undo(self, x: f64) -> f64 {
    match self {
      Step::Mul(a) => x / a,
      Step::Div(a) => x * a,
      Step::Add(a) => x - a,
      Step::Sub(a) => x + a,
    }
  }
}

impl InstructionCompiler for LinearCompiler {
  fn compile(&self, source: &str) -> Result<CompiledInstructions, ConversionError> {
    let steps = source.split_whitespace()
      .map(|token| {
        Step::parse(token).ok_or_else(|| ConversionError::BadInstructions {
          source_text: source.to_owned(),
          reason: format!("bad step '{token}'"),
        })
      })
      .collect::<Result<Vec<_>, _>>()?;

    let ratio = steps.iter().try_fold(Ratio::ONE, |ratio, step| {
      match step {
        Step::Mul(a) => Some(Ratio::new(ratio.multiplier * a, ratio.divisor)),
        Step::Div(a) => Some(Ratio::new(ratio.multiplier, ratio.divisor * a)),
        Step::Add(_) | Step::Sub(_) => None,
      }
    });

    let forward_steps = steps.clone();
    let transform = Transform::numeric(
      move |x| forward_steps.iter().fold(x, |acc, step| step.apply(acc)),
      move |x| steps.iter().rev().fold(x, |acc, step| step.undo(acc)),
    );
    Ok(CompiledInstructions { transform, ratio })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::units::scalar::Scalar;

  use approx::assert_abs_diff_eq;

  fn linear(source: &str) -> Instructions {
    Instructions::new(source, Arc::new(LinearCompiler))
  }

  fn forward(instr: &Instructions, x: f64) -> f64 {
    let t = &instr.compiled().unwrap().transform;
    t.to_base(&Scalar::Number(x), None).unwrap().as_number().unwrap()
  }

  fn reverse(instr: &Instructions, x: f64) -> f64 {
    let t = &instr.compiled().unwrap().transform;
    t.from_base(&Scalar::Number(x), None).unwrap().as_number().unwrap()
  }

  #[test]
  fn test_affine_instructions() {
    let fahrenheit = linear("-32 *5 /9 +273.15");
    assert_abs_diff_eq!(forward(&fahrenheit, 212.0), 373.15, epsilon = 1e-9);
    assert_abs_diff_eq!(reverse(&fahrenheit, 273.15), 32.0, epsilon = 1e-9);
    assert!(fahrenheit.compiled().unwrap().ratio.is_none());
  }

  #[test]
  fn test_pure_ratio() {
    let inch = linear("*254 /10000");
    let ratio = inch.compiled().unwrap().ratio.unwrap();
    assert_abs_diff_eq!(ratio.value(), 0.0254);
    assert_abs_diff_eq!(reverse(&inch, 0.0254), 1.0, epsilon = 1e-12);
  }

  #[test]
  fn test_compiled_once_and_shared() {
    let instr = linear("*2");
    let copy = instr.clone();
    assert!(!copy.is_compiled());
    instr.compiled().unwrap();
    assert!(copy.is_compiled());
  }

  #[test]
  fn test_bad_instructions() {
    let err = linear("*2 ^3").compiled().unwrap_err();
    assert!(matches!(err, ConversionError::BadInstructions { .. }));
  }
}
