//! Formula AST
//!
//! Tree produced by the parser and walked by the interpreter.

use std::fmt;

use super::value::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    /// Reference to a binding supplied at evaluation time
    Param(String),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Call(Function, Vec<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Negate,
    Plus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,
    Concat,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
}

// == Function ==
/// Built-in worksheet functions. Names are matched case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Concat,
    Exact,
    Find,
    Left,
    Right,
    Mid,
    Len,
    Upper,
    Lower,
    Trim,
    If,
    And,
    Or,
    Not,
}

impl Function {
    pub fn from_name(name: &str) -> Option<Self> {
        let function = match name.to_ascii_uppercase().as_str() {
            "CONCAT" | "CONCATENATE" => Function::Concat,
            "EXACT" => Function::Exact,
            "FIND" => Function::Find,
            "LEFT" => Function::Left,
            "RIGHT" => Function::Right,
            "MID" => Function::Mid,
            "LEN" => Function::Len,
            "UPPER" => Function::Upper,
            "LOWER" => Function::Lower,
            "TRIM" => Function::Trim,
            "IF" => Function::If,
            "AND" => Function::And,
            "OR" => Function::Or,
            "NOT" => Function::Not,
            _ => return None,
        };
        Some(function)
    }

    pub fn name(self) -> &'static str {
        match self {
            Function::Concat => "CONCAT",
            Function::Exact => "EXACT",
            Function::Find => "FIND",
            Function::Left => "LEFT",
            Function::Right => "RIGHT",
            Function::Mid => "MID",
            Function::Len => "LEN",
            Function::Upper => "UPPER",
            Function::Lower => "LOWER",
            Function::Trim => "TRIM",
            Function::If => "IF",
            Function::And => "AND",
            Function::Or => "OR",
            Function::Not => "NOT",
        }
    }

    /// Accepted argument counts as `(min, max)`; `None` means variadic.
    pub fn arity(self) -> (usize, Option<usize>) {
        match self {
            Function::Concat | Function::And | Function::Or => (1, None),
            Function::Exact => (2, Some(2)),
            Function::Find => (2, Some(3)),
            Function::Left | Function::Right => (1, Some(2)),
            Function::Mid => (3, Some(3)),
            Function::Len | Function::Upper | Function::Lower | Function::Trim => (1, Some(1)),
            Function::If => (2, Some(3)),
            Function::Not => (1, Some(1)),
        }
    }

    pub fn accepts(self, count: usize) -> bool {
        let (min, max) = self.arity();
        count >= min && max.map_or(true, |max| count <= max)
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_lookup_is_case_insensitive() {
        assert_eq!(Function::from_name("concat"), Some(Function::Concat));
        assert_eq!(Function::from_name("Find"), Some(Function::Find));
        assert_eq!(Function::from_name("VLOOKUP"), None);
    }

    #[test]
    fn test_arity() {
        assert!(Function::Find.accepts(2));
        assert!(Function::Find.accepts(3));
        assert!(!Function::Find.accepts(4));
        assert!(Function::Concat.accepts(12));
        assert!(!Function::Concat.accepts(0));
        assert!(!Function::Mid.accepts(2));
    }
}
