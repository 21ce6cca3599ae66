//! Boolean predicate parser for interactive case splits
//!
//! Split conditions arrive as text (`"VAmount <= 1000 && VFlag == true"`)
//! and are parsed into [`Term`]s over the node's free variables. The
//! grammar is deliberately small: comparisons over identifiers, integer
//! and boolean literals, combined with `&&`, `||`, `!`, and parentheses.

use crate::result::{Error, Result};
use crate::term::Term;

/// Parses a boolean predicate into a term.
pub fn parse_predicate(input: &str) -> Result<Term> {
    let mut parser = Parser {
        input: input.as_bytes(),
        pos: 0,
    };
    let term = parser.or_expr()?;
    parser.skip_ws();
    if parser.pos != parser.input.len() {
        return Err(parser.error("trailing input after predicate"));
    }
    Ok(term)
}

struct Parser<'a> {
    input: &'a [u8],
    pos: usize,
}

impl Parser<'_> {
    fn error(&self, msg: &str) -> Error {
        Error::PredicateParse {
            offset: self.pos,
            msg: msg.to_string(),
        }
    }

    fn skip_ws(&mut self) {
        while self.pos < self.input.len() && self.input[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    fn eat(&mut self, token: &str) -> bool {
        self.skip_ws();
        if self.input[self.pos..].starts_with(token.as_bytes()) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn or_expr(&mut self) -> Result<Term> {
        let mut lhs = self.and_expr()?;
        while self.eat("||") {
            let rhs = self.and_expr()?;
            lhs = Term::or(lhs, rhs);
        }
        Ok(lhs)
    }

    fn and_expr(&mut self) -> Result<Term> {
        let mut lhs = self.not_expr()?;
        while self.eat("&&") {
            let rhs = self.not_expr()?;
            lhs = Term::and(lhs, rhs);
        }
        Ok(lhs)
    }

    fn not_expr(&mut self) -> Result<Term> {
        self.skip_ws();
        if self.eat("!") {
            // Guard against consuming the `!` of `!=`.
            if self.input.get(self.pos) == Some(&b'=') {
                self.pos -= 1;
                return Err(self.error("unexpected comparison operator"));
            }
            return Ok(Term::not(self.not_expr()?));
        }
        self.atom()
    }

    fn atom(&mut self) -> Result<Term> {
        self.skip_ws();
        if self.eat("(") {
            let inner = self.or_expr()?;
            if !self.eat(")") {
                return Err(self.error("expected ')'"));
            }
            return Ok(inner);
        }
        self.comparison()
    }

    fn comparison(&mut self) -> Result<Term> {
        let lhs = self.operand()?;
        self.skip_ws();

        // Two-character operators first so `<=` is not read as `<`.
        let op = if self.eat("==") {
            "=="
        } else if self.eat("!=") {
            "!="
        } else if self.eat("<=") {
            "<="
        } else if self.eat(">=") {
            ">="
        } else if self.eat("<") {
            "<"
        } else if self.eat(">") {
            ">"
        } else {
            // A bare boolean operand is a predicate on its own.
            return match &lhs {
                Term::Var(_) | Term::Bool(_) => Ok(lhs),
                _ => Err(self.error("expected comparison operator")),
            };
        };

        let rhs = self.operand()?;
        let boolean = matches!(lhs, Term::Bool(_)) || matches!(rhs, Term::Bool(_));
        let term = match (op, boolean) {
            ("==", true) => Term::eq_bool(lhs, rhs),
            ("==", false) => Term::eq_int(lhs, rhs),
            ("!=", true) => Term::not(Term::eq_bool(lhs, rhs)),
            ("!=", false) => Term::neq_int(lhs, rhs),
            ("<=", _) => Term::le_int(lhs, rhs),
            ("<", _) => Term::lt_int(lhs, rhs),
            (">=", _) => Term::le_int(rhs, lhs),
            (">", _) => Term::lt_int(rhs, lhs),
            _ => unreachable!(),
        };
        Ok(term)
    }

    fn operand(&mut self) -> Result<Term> {
        self.skip_ws();
        let start = self.pos;
        let Some(&first) = self.input.get(self.pos) else {
            return Err(self.error("unexpected end of predicate"));
        };

        if first.is_ascii_digit() {
            while self
                .input
                .get(self.pos)
                .is_some_and(|byte| byte.is_ascii_digit())
            {
                self.pos += 1;
            }
            let text = String::from_utf8_lossy(&self.input[start..self.pos]).into_owned();
            return Ok(Term::Int(text));
        }

        if first.is_ascii_alphabetic() || first == b'_' {
            while self
                .input
                .get(self.pos)
                .is_some_and(|byte| byte.is_ascii_alphanumeric() || *byte == b'_')
            {
                self.pos += 1;
            }
            let text = String::from_utf8_lossy(&self.input[start..self.pos]).into_owned();
            return Ok(match text.as_str() {
                "true" => Term::Bool(true),
                "false" => Term::Bool(false),
                _ => Term::var(text.clone()),
            });
        }

        Err(self.error("expected identifier, integer, or boolean literal"))
    }
}
