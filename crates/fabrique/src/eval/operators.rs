//! Evaluation rules for unary and binary operators over runtime [`Value`]s.
//! Type mismatches are reported through the [`ErrorReporter`] rather than
//! panicking, so one bad expression never aborts the rest of the build
//! script.

use std::rc::Rc;

use crate::ast::{BinaryOperator, UnaryOperator};
use crate::diagnostics::{ErrorReport, ErrorReporter, SourceRange};

use super::value::Value;

fn type_mismatch(op: &str, left: &Value, right: &Value, range: &SourceRange, reporter: &mut ErrorReporter) -> Value {
    reporter.report(ErrorReport::error(format!("operator '{op}' is not defined for {} and {}", left.describe(), right.describe()), range.clone()));
    Value::Unknown
}

pub fn eval_unary(operator: UnaryOperator, operand: Value, range: &SourceRange, reporter: &mut ErrorReporter) -> Value {
    match (operator, &operand) {
        (UnaryOperator::Not, Value::Bool(b)) => Value::Bool(!b),
        (UnaryOperator::Negate, Value::Int(i)) => Value::Int(-i),
        (UnaryOperator::Not, _) => {
            reporter.report(ErrorReport::error(format!("'!' expects bool, found {}", operand.describe()), range.clone()));
            Value::Unknown
        }
        (UnaryOperator::Negate, _) => {
            reporter.report(ErrorReport::error(format!("unary '-' expects int, found {}", operand.describe()), range.clone()));
            Value::Unknown
        }
    }
}

pub fn eval_binary(operator: BinaryOperator, left: Value, right: Value, range: &SourceRange, reporter: &mut ErrorReporter) -> Value {
    use BinaryOperator::*;

    if matches!(left, Value::Unknown) || matches!(right, Value::Unknown) {
        return Value::Unknown;
    }

    match operator {
        Add => match (&left, &right) {
            (Value::Int(a), Value::Int(b)) => Value::Int(a + b),
            (Value::Str(a), Value::Str(b)) => Value::Str(Rc::new(format!("{a}{b}"))),
            (Value::List(a), Value::List(b)) => Value::List(Rc::new(a.iter().cloned().chain(b.iter().cloned()).collect())),
            _ => type_mismatch("+", &left, &right, range, reporter),
        },
        Subtract => match (&left, &right) {
            (Value::Int(a), Value::Int(b)) => Value::Int(a - b),
            _ => type_mismatch("-", &left, &right, range, reporter),
        },
        Multiply => match (&left, &right) {
            (Value::Int(a), Value::Int(b)) => Value::Int(a * b),
            _ => type_mismatch("*", &left, &right, range, reporter),
        },
        Divide => match (&left, &right) {
            (Value::Int(_), Value::Int(0)) => {
                reporter.report(ErrorReport::error("division by zero", range.clone()));
                Value::Unknown
            }
            (Value::Int(a), Value::Int(b)) => Value::Int(a / b),
            _ => type_mismatch("/", &left, &right, range, reporter),
        },
        PrefixWith => match &right {
            Value::List(items) => {
                let mut prefixed = Vec::with_capacity(items.len() + 1);
                prefixed.push(left.clone());
                prefixed.extend(items.iter().cloned());
                Value::List(Rc::new(prefixed))
            }
            _ => type_mismatch("::", &left, &right, range, reporter),
        },
        ScalarAdd => match (&left, &right) {
            (Value::List(items), Value::Int(n)) => Value::List(Rc::new(
                items
                    .iter()
                    .map(|item| match item {
                        Value::Int(i) => Value::Int(i + n),
                        other => other.clone(),
                    })
                    .collect(),
            )),
            _ => type_mismatch(".+", &left, &right, range, reporter),
        },
        Equals => Value::Bool(values_equal(&left, &right)),
        NotEquals => Value::Bool(!values_equal(&left, &right)),
        LessThan => compare(&left, &right, range, reporter, |o| o.is_lt()),
        LessOrEqual => compare(&left, &right, range, reporter, |o| o.is_le()),
        GreaterThan => compare(&left, &right, range, reporter, |o| o.is_gt()),
        GreaterOrEqual => compare(&left, &right, range, reporter, |o| o.is_ge()),
        And => match (&left, &right) {
            (Value::Bool(a), Value::Bool(b)) => Value::Bool(*a && *b),
            _ => type_mismatch("&&", &left, &right, range, reporter),
        },
        Or => match (&left, &right) {
            (Value::Bool(a), Value::Bool(b)) => Value::Bool(*a || *b),
            _ => type_mismatch("||", &left, &right, range, reporter),
        },
        Xor => match (&left, &right) {
            (Value::Bool(a), Value::Bool(b)) => Value::Bool(*a ^ *b),
            _ => type_mismatch("^^", &left, &right, range, reporter),
        },
    }
}

fn compare(left: &Value, right: &Value, range: &SourceRange, reporter: &mut ErrorReporter, accept: impl Fn(std::cmp::Ordering) -> bool) -> Value {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => Value::Bool(accept(a.cmp(b))),
        (Value::Str(a), Value::Str(b)) => Value::Bool(accept(a.cmp(b))),
        _ => type_mismatch("comparison", left, right, range, reporter),
    }
}

fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Nil, Value::Nil) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Int(a), Value::Int(b)) => a == b,
        (Value::Str(a), Value::Str(b)) => a == b,
        (Value::File(a), Value::File(b)) => a.name == b.name,
        (Value::List(a), Value::List(b)) => a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| values_equal(x, y)),
        (Value::Record(a), Value::Record(b)) => {
            a.len() == b.len() && a.iter().all(|(k, v)| b.get(k).is_some_and(|other| values_equal(v, other)))
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range() -> SourceRange {
        use crate::file::SourceFile;
        SourceRange::new(0..0, SourceFile::new(vec!["<memory>".into()], String::new()))
    }

    #[test]
    fn adds_integers() {
        let mut reporter = ErrorReporter::new();
        let result = eval_binary(BinaryOperator::Add, Value::Int(1), Value::Int(2), &range(), &mut reporter);
        assert!(matches!(result, Value::Int(3)));
        assert!(!reporter.has_errors());
    }

    #[test]
    fn mismatched_types_report_error() {
        let mut reporter = ErrorReporter::new();
        let result = eval_binary(BinaryOperator::Add, Value::Int(1), Value::Bool(true), &range(), &mut reporter);
        assert!(matches!(result, Value::Unknown));
        assert!(reporter.has_errors());
    }

    #[test]
    fn adds_strings() {
        let mut reporter = ErrorReporter::new();
        let result = eval_binary(BinaryOperator::Add, Value::Str(Rc::new("o/".into())), Value::Str(Rc::new("a.c".into())), &range(), &mut reporter);
        match result {
            Value::Str(s) => assert_eq!(*s, "o/a.c"),
            other => panic!("expected string, got {}", other.describe()),
        }
        assert!(!reporter.has_errors());
    }

    #[test]
    fn prefix_with_prepends_to_list() {
        let mut reporter = ErrorReporter::new();
        let list = Value::List(Rc::new(vec![Value::Int(2), Value::Int(3)]));
        let result = eval_binary(BinaryOperator::PrefixWith, Value::Int(1), list, &range(), &mut reporter);
        match result {
            Value::List(items) => {
                let rendered: Vec<_> = items.iter().map(Value::describe).collect();
                assert_eq!(rendered, vec!["1".to_string(), "2".to_string(), "3".to_string()]);
            }
            other => panic!("expected list, got {}", other.describe()),
        }
        assert!(!reporter.has_errors());
    }

    #[test]
    fn scalar_add_maps_over_list() {
        let mut reporter = ErrorReporter::new();
        let list = Value::List(Rc::new(vec![Value::Int(1), Value::Int(2)]));
        let result = eval_binary(BinaryOperator::ScalarAdd, list, Value::Int(10), &range(), &mut reporter);
        match result {
            Value::List(items) => {
                let rendered: Vec<_> = items.iter().map(Value::describe).collect();
                assert_eq!(rendered, vec!["11".to_string(), "12".to_string()]);
            }
            other => panic!("expected list, got {}", other.describe()),
        }
    }
}
