//! Attribute conditions: a bare value (equality) or an explicit operator
//! with operands.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::UsageError;

/// Comparison and function operators understood by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Between,
    BeginsWith,
    In,
    Contains,
    Exists,
    NotExists,
}

impl Operator {
    /// Whether the operator may appear in a key condition expression.
    pub fn is_key_eligible(self) -> bool {
        matches!(
            self,
            Operator::Eq
                | Operator::Lt
                | Operator::Le
                | Operator::Gt
                | Operator::Ge
                | Operator::Between
                | Operator::BeginsWith
        )
    }

    /// Expression-language spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "<>",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::Between => "BETWEEN",
            Operator::BeginsWith => "begins_with",
            Operator::In => "IN",
            Operator::Contains => "contains",
            Operator::Exists => "attribute_exists",
            Operator::NotExists => "attribute_not_exists",
        }
    }

    fn check_arity(self, actual: usize) -> Result<(), UsageError> {
        let (ok, expected) = match self {
            Operator::Between => (actual == 2, "2"),
            Operator::In => (actual >= 1, "at least 1"),
            Operator::Exists | Operator::NotExists => (actual == 0, "0"),
            _ => (actual == 1, "1"),
        };
        if ok {
            Ok(())
        } else {
            Err(UsageError::OperandCount {
                operator: self.as_str(),
                expected,
                actual,
            })
        }
    }
}

/// A condition on one attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Condition {
    /// `attr = value`
    Equality(Value),
    /// `attr <op> operands...`
    Operator(Operator, Vec<Value>),
}

impl Condition {
    /// Explicit operator form.
    pub fn op(operator: Operator, operands: impl IntoIterator<Item = impl Into<Value>>) -> Self {
        Condition::Operator(operator, operands.into_iter().map(Into::into).collect())
    }

    pub fn ne(value: impl Into<Value>) -> Self {
        Self::op(Operator::Ne, [value])
    }

    pub fn lt(value: impl Into<Value>) -> Self {
        Self::op(Operator::Lt, [value])
    }

    pub fn le(value: impl Into<Value>) -> Self {
        Self::op(Operator::Le, [value])
    }

    pub fn gt(value: impl Into<Value>) -> Self {
        Self::op(Operator::Gt, [value])
    }

    pub fn ge(value: impl Into<Value>) -> Self {
        Self::op(Operator::Ge, [value])
    }

    pub fn between(low: impl Into<Value>, high: impl Into<Value>) -> Self {
        Condition::Operator(Operator::Between, vec![low.into(), high.into()])
    }

    pub fn begins_with(prefix: impl Into<String>) -> Self {
        Condition::Operator(Operator::BeginsWith, vec![Value::String(prefix.into())])
    }

    pub fn is_in(values: impl IntoIterator<Item = impl Into<Value>>) -> Self {
        Self::op(Operator::In, values)
    }

    pub fn contains(value: impl Into<Value>) -> Self {
        Self::op(Operator::Contains, [value])
    }

    pub fn exists() -> Self {
        Condition::Operator(Operator::Exists, Vec::new())
    }

    pub fn not_exists() -> Self {
        Condition::Operator(Operator::NotExists, Vec::new())
    }

    pub fn operator(&self) -> Operator {
        match self {
            Condition::Equality(_) => Operator::Eq,
            Condition::Operator(op, _) => *op,
        }
    }

    pub fn operands(&self) -> &[Value] {
        match self {
            Condition::Equality(v) => std::slice::from_ref(v),
            Condition::Operator(_, operands) => operands,
        }
    }

    pub fn is_key_eligible(&self) -> bool {
        self.operator().is_key_eligible()
    }

    /// Check the operand count against the operator.
    pub fn validate(&self) -> Result<(), UsageError> {
        self.operator().check_arity(self.operands().len())
    }
}

macro_rules! equality_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Condition {
                fn from(value: $ty) -> Self {
                    Condition::Equality(value.into())
                }
            }
        )*
    };
}

equality_from!(Value, &str, String, bool, i32, i64, u32, u64, f64);
