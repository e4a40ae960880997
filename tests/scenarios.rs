
use unitcalc::catalog::defaults::default_catalog;
use unitcalc::config::{DisambiguationRule, Settings};
use unitcalc::eval::{EvalError, Value};
use unitcalc::{Error, Session};

use approx::assert_abs_diff_eq;

fn session() -> Session {
  Session::new(default_catalog())
}

fn quantity(value: &Value) -> (&Value, Option<&str>) {
  match value {
    Value::ValueUnit(x) => (&x.value, x.unit.id.as_deref()),
    other => panic!("not a quantity: {other}"),
  }
}

#[test]
fn arithmetic_statements() {
  let mut session = session();
  assert_eq!(session.run("2+3*4").unwrap().as_number(), Some(14.0));
  assert_eq!(session.run("2^3^2").unwrap().as_number(), Some(512.0));
  assert_eq!(session.run("-2^2").unwrap().as_number(), Some(-4.0));
  assert_eq!(session.run("10 - 2 * 3").unwrap().as_number(), Some(4.0));
  assert_eq!(session.run("1 < 2 && 3 == 3").unwrap().as_bool(), Some(true));
  assert_eq!(session.run("1 + 2 << 1").unwrap().as_number(), Some(6.0));
  assert_eq!(session.run("\"ab\" . \"cd\"").unwrap().as_str(), Some("abcd"));
}

#[test]
fn conversions() {
  let mut session = session();
  let radians = session.run("5 degree to radian").unwrap();
  let (payload, unit) = quantity(&radians);
  assert_abs_diff_eq!(payload.as_number().unwrap(), 0.08726646, epsilon = 1e-8);
  assert_eq!(unit, Some("radian"));

  let period = session.run("2 hertz to second").unwrap();
  assert_abs_diff_eq!(quantity(&period).0.as_number().unwrap(), 0.5, epsilon = 1e-12);

  let boiling = session.run("(celsius => fahrenheit)(100)").unwrap();
  assert_abs_diff_eq!(boiling.as_number().unwrap(), 212.0, epsilon = 1e-9);
}

#[test]
fn fractional_display() {
  let mut session = session();
  let value = session.run("3.5 inch to unit(\"inch%0,0,16\")").unwrap();
  assert_eq!(session.render(&value), "3 1/2 inches");
}

#[test]
fn hierarchical_display() {
  let mut session = session();
  let value = session.run("1.5 foot to unit(\"foot,inch\")").unwrap();
  let parts = quantity(&value).0.as_array().unwrap();
  assert_eq!(parts.len(), 2);
  assert_eq!(parts[0].as_number(), Some(1.0));
  assert_abs_diff_eq!(parts[1].as_number().unwrap(), 6.0, epsilon = 1e-9);
}

#[test]
fn hierarchical_display_with_fractions() {
  let mut session = session();
  let value = session.run("1.5 foot to unit(\"foot,inch%0,0,16\")").unwrap();
  let parts = quantity(&value).0.as_array().unwrap();
  assert_eq!(parts[0].as_number(), Some(1.0));
  assert_eq!(parts[1].as_str(), Some("6"));

  let value = session.run("40.25 inch to unit(\"foot,inch%0,0,16\")").unwrap();
  assert!(session.render(&value).starts_with("[3, 4 1/4] "));
}

#[test]
fn variables_persist_between_statements() {
  let mut session = session();
  session.run("width = 3 meter").unwrap();
  session.run("height = 4 meter").unwrap();
  let area = session.run("width * height").unwrap();
  assert_abs_diff_eq!(quantity(&area).0.as_number().unwrap(), 12.0);
  assert!(session.context().get("width").is_some());
  assert!(session.context().get("depth").is_none());
}

#[test]
fn ambiguous_names_need_a_rule() {
  let mut session = session();
  let err = session.run("pound").unwrap_err();
  assert!(matches!(err, Error::Eval(EvalError::Ambiguous { count: 2, .. })));

  session.add_disambiguation(DisambiguationRule::new("pound").with_key("pound"));
  let Value::Unit(unit) = session.run("pound").unwrap() else { panic!("expected a unit") };
  assert_eq!(unit.id.as_deref(), Some("pound"));
}

#[test]
fn rules_from_settings() {
  let settings = Settings::from_json_str(r#"{
    "disambiguation": [{ "term": "pound", "key": "pound_sterling" }]
  }"#).unwrap();
  let mut session = Session::with_settings(default_catalog(), settings);
  let Value::Unit(unit) = session.run("pound").unwrap() else { panic!("expected a unit") };
  assert_eq!(unit.id.as_deref(), Some("pound_sterling"));
}

#[test]
fn errors_keep_the_session_usable() {
  let mut session = session();
  let err = session.run("2 +").unwrap_err();
  assert!(err.is_syntax_error());

  let err = session.run("1 meter + 1 second").unwrap_err();
  assert!(!err.is_syntax_error());
  assert_eq!(err.to_string(), "Dimensions of unit `meter` and unit `second` do not match");

  assert_eq!(session.run("1 + 1").unwrap().as_number(), Some(2.0));
}
