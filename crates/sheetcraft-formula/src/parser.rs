//! Formula parser
//!
//! A recursive descent parser over the token list with proper operator precedence.

use crate::ast::{BinaryOperator, CellReference, FormulaExpr, RangeReference, UnaryOperator};
use crate::error::{SyntaxError, SyntaxErrorKind};
use crate::lexer::{tokenize, SpannedToken, Token};
use sheetcraft_core::CellRange;

/// Deepest nesting of parentheses, calls and prefix operators accepted
const MAX_NESTING: usize = 128;

/// Longest root-to-leaf path of a formula tree, operator chains included
pub const MAX_TREE_DEPTH: usize = 512;

/// Parse a formula string into an AST
///
/// # Example
/// ```rust
/// use sheetcraft_formula::parse_formula;
///
/// let ast = parse_formula("=1+2").unwrap();
/// let ast = parse_formula("=SUM(A1:A10)").unwrap();
/// let ast = parse_formula("=IF(A1>0,\"Yes\",\"No\")").unwrap();
/// ```
pub fn parse_formula(formula: &str) -> Result<FormulaExpr, SyntaxError> {
    let leading = formula.len() - formula.trim_start().len();
    let trimmed = formula.trim_start();

    // Formula must start with '='
    let body = trimmed.strip_prefix('=').ok_or_else(|| {
        SyntaxError::new(
            SyntaxErrorKind::EmptyExpression,
            leading,
            "formula must start with '='",
        )
    })?;
    let offset = leading + 1;

    let tokens = tokenize(body).map_err(|e| e.offset(offset))?;
    if tokens.is_empty() {
        return Err(SyntaxError::new(
            SyntaxErrorKind::EmptyExpression,
            offset,
            "formula has nothing after '='",
        ));
    }

    let mut parser = FormulaParser::new(&tokens, body.len());
    let expr = parser.parse_formula().map_err(|e| e.offset(offset))?;
    Ok(expr)
}

/// Formula parser
struct FormulaParser<'a> {
    tokens: &'a [SpannedToken],
    pos: usize,
    end_position: usize,
    depth: usize,
}

impl<'a> FormulaParser<'a> {
    fn new(tokens: &'a [SpannedToken], end_position: usize) -> Self {
        Self {
            tokens,
            pos: 0,
            end_position,
            depth: 0,
        }
    }

    fn parse_formula(&mut self) -> Result<FormulaExpr, SyntaxError> {
        let node = self.parse_expression()?;

        // Make sure we consumed all input
        match self.current() {
            None => Ok(node.expr),
            Some(Token::RightParen) => Err(self.error(
                SyntaxErrorKind::MissingParenthesis,
                "')' has no matching '('",
            )),
            Some(token) => {
                let message = format!("unexpected {} after expression", token.describe());
                Err(self.error(SyntaxErrorKind::UnexpectedToken, message))
            }
        }
    }

    // === Token access ===

    fn current(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos).map(|t| &t.token)
    }

    fn current_position(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map(|t| t.position)
            .unwrap_or(self.end_position)
    }

    fn consume(&mut self) -> Option<&'a Token> {
        let token = self.current();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn error<S: Into<String>>(&self, kind: SyntaxErrorKind, message: S) -> SyntaxError {
        SyntaxError::new(kind, self.current_position(), message)
    }

    fn unexpected(&self) -> SyntaxError {
        match self.current() {
            Some(token) => self.error(
                SyntaxErrorKind::UnexpectedToken,
                format!("unexpected {}", token.describe()),
            ),
            None => self.error(SyntaxErrorKind::UnexpectedToken, "unexpected end of formula"),
        }
    }

    fn expect_right_paren(&mut self) -> Result<(), SyntaxError> {
        match self.current() {
            Some(Token::RightParen) => {
                self.consume();
                Ok(())
            }
            None => Err(self.error(SyntaxErrorKind::MissingParenthesis, "missing ')'")),
            Some(_) => Err(self.unexpected()),
        }
    }

    fn enter(&mut self) -> Result<(), SyntaxError> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(self.error(
                SyntaxErrorKind::UnexpectedToken,
                "formula is nested too deeply",
            ));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    // === Expression parsing with precedence ===
    // Precedence (lowest to highest):
    // 1. Comparison: =, <>, <, <=, >, >=
    // 2. Concatenation: &
    // 3. Addition/Subtraction: +, -
    // 4. Multiplication/Division: *, /
    // 5. Exponentiation: ^ (right associative)
    // 6. Unary: -, +
    // 7. Range: :
    // 8. Primary: literals, references, function calls, parentheses

    fn parse_expression(&mut self) -> Result<Node, SyntaxError> {
        self.enter()?;
        let node = self.parse_comparison();
        self.leave();
        node
    }

    fn parse_comparison(&mut self) -> Result<Node, SyntaxError> {
        let mut left = self.parse_concatenation()?;

        loop {
            let op = match self.current() {
                Some(Token::Equal) => BinaryOperator::Equal,
                Some(Token::NotEqual) => BinaryOperator::NotEqual,
                Some(Token::LessThan) => BinaryOperator::LessThan,
                Some(Token::LessEqual) => BinaryOperator::LessEqual,
                Some(Token::GreaterThan) => BinaryOperator::GreaterThan,
                Some(Token::GreaterEqual) => BinaryOperator::GreaterEqual,
                _ => break,
            };

            self.consume();
            let right = self.parse_concatenation()?;
            left = self.binary(op, left, right)?;
        }

        Ok(left)
    }

    fn parse_concatenation(&mut self) -> Result<Node, SyntaxError> {
        let mut left = self.parse_additive()?;

        while matches!(self.current(), Some(Token::Ampersand)) {
            self.consume();
            let right = self.parse_additive()?;
            left = self.binary(BinaryOperator::Concat, left, right)?;
        }

        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Node, SyntaxError> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match self.current() {
                Some(Token::Plus) => BinaryOperator::Add,
                Some(Token::Minus) => BinaryOperator::Subtract,
                _ => break,
            };

            self.consume();
            let right = self.parse_multiplicative()?;
            left = self.binary(op, left, right)?;
        }

        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Node, SyntaxError> {
        let mut left = self.parse_exponent()?;

        loop {
            let op = match self.current() {
                Some(Token::Star) => BinaryOperator::Multiply,
                Some(Token::Slash) => BinaryOperator::Divide,
                _ => break,
            };

            self.consume();
            let right = self.parse_exponent()?;
            left = self.binary(op, left, right)?;
        }

        Ok(left)
    }

    fn parse_exponent(&mut self) -> Result<Node, SyntaxError> {
        let left = self.parse_unary()?;

        if matches!(self.current(), Some(Token::Caret)) {
            self.consume();
            self.enter()?;
            let right = self.parse_exponent(); // Right associative
            self.leave();
            return self.binary(BinaryOperator::Power, left, right?);
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Node, SyntaxError> {
        match self.current() {
            // Prefix unary minus
            Some(Token::Minus) => {
                self.consume();
                self.enter()?;
                let operand = self.parse_unary();
                self.leave();
                let operand = operand?;
                self.node(
                    FormulaExpr::UnaryOp {
                        op: UnaryOperator::Negate,
                        operand: Box::new(operand.expr),
                    },
                    operand.height + 1,
                )
            }
            // Prefix plus (no-op)
            Some(Token::Plus) => {
                self.consume();
                self.enter()?;
                let operand = self.parse_unary();
                self.leave();
                operand
            }
            _ => self.parse_range(),
        }
    }

    fn parse_range(&mut self) -> Result<Node, SyntaxError> {
        let left = self.parse_primary()?;

        if !matches!(self.current(), Some(Token::Colon)) {
            return Ok(left);
        }

        let colon_position = self.current_position();
        self.consume();
        let right = self.parse_primary()?;

        // Only two cell references can form a range
        match (&left.expr, &right.expr) {
            (FormulaExpr::CellRef(start), FormulaExpr::CellRef(end)) => {
                Ok(Node::leaf(FormulaExpr::RangeRef(RangeReference {
                    range: CellRange::new(start.address, end.address),
                })))
            }
            _ => Err(SyntaxError::new(
                SyntaxErrorKind::UnexpectedToken,
                colon_position,
                "':' must join two cell references",
            )),
        }
    }

    fn parse_primary(&mut self) -> Result<Node, SyntaxError> {
        let Some(token) = self.current() else {
            return Err(self.unexpected());
        };

        match token {
            Token::Number(n) => {
                self.consume();
                Ok(Node::leaf(FormulaExpr::number(*n)))
            }

            Token::String(s) => {
                self.consume();
                Ok(Node::leaf(FormulaExpr::string(s.clone())))
            }

            Token::Boolean(b) => {
                self.consume();
                Ok(Node::leaf(FormulaExpr::boolean(*b)))
            }

            Token::LeftParen => {
                self.consume();
                let node = self.parse_expression()?;
                self.expect_right_paren()?;
                Ok(node)
            }

            Token::CellRef(address) => {
                self.consume();
                Ok(Node::leaf(FormulaExpr::CellRef(CellReference { address: *address })))
            }

            Token::RangeRef(start, end) => {
                self.consume();
                Ok(Node::leaf(FormulaExpr::RangeRef(RangeReference {
                    range: CellRange::new(*start, *end),
                })))
            }

            Token::Ident(name) => {
                self.consume();
                // Check if it's a function call
                if matches!(self.current(), Some(Token::LeftParen)) {
                    self.parse_function_call(name.clone())
                } else {
                    Ok(Node::leaf(FormulaExpr::Name(name.clone())))
                }
            }

            Token::RightParen => Err(self.error(
                SyntaxErrorKind::MissingParenthesis,
                "')' has no matching '('",
            )),

            _ => Err(self.unexpected()),
        }
    }

    fn parse_function_call(&mut self, name: String) -> Result<Node, SyntaxError> {
        self.consume(); // '('

        let mut args = Vec::new();
        let mut height = 0;

        // Parse arguments
        if !matches!(self.current(), Some(Token::RightParen)) {
            loop {
                let arg = self.parse_expression()?;
                height = height.max(arg.height);
                args.push(arg.expr);

                if !matches!(self.current(), Some(Token::Comma)) {
                    break;
                }
                self.consume();
            }
        }

        self.expect_right_paren()?;

        self.node(FormulaExpr::Function { name, args }, height + 1)
    }

    // === Tree building ===

    fn binary(&self, op: BinaryOperator, left: Node, right: Node) -> Result<Node, SyntaxError> {
        let height = left.height.max(right.height) + 1;
        self.node(
            FormulaExpr::BinaryOp {
                op,
                left: Box::new(left.expr),
                right: Box::new(right.expr),
            },
            height,
        )
    }

    /// Wrap an interior node, rejecting trees deeper than [`MAX_TREE_DEPTH`]
    fn node(&self, expr: FormulaExpr, height: usize) -> Result<Node, SyntaxError> {
        if height > MAX_TREE_DEPTH {
            return Err(self.error(
                SyntaxErrorKind::UnexpectedToken,
                "formula has too many nested operations",
            ));
        }
        Ok(Node { expr, height })
    }
}

/// A parsed subtree and the length of its longest root-to-leaf path
struct Node {
    expr: FormulaExpr,
    height: usize,
}

impl Node {
    fn leaf(expr: FormulaExpr) -> Self {
        Self { expr, height: 1 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Literal;
    use pretty_assertions::assert_eq;
    use sheetcraft_core::CellAddress;

    fn binary(op: BinaryOperator, left: FormulaExpr, right: FormulaExpr) -> FormulaExpr {
        FormulaExpr::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_formula("=42").unwrap(), FormulaExpr::number(42.0));
        assert_eq!(parse_formula("=3.5").unwrap(), FormulaExpr::number(3.5));
        assert_eq!(parse_formula("=1e10").unwrap(), FormulaExpr::number(1e10));
    }

    #[test]
    fn test_parse_string() {
        let ast = parse_formula("=\"Hello\"").unwrap();
        assert_eq!(ast, FormulaExpr::string("Hello"));

        let ast = parse_formula("=\"Hello \"\"World\"\"\"").unwrap();
        assert_eq!(ast, FormulaExpr::string("Hello \"World\""));
    }

    #[test]
    fn test_parse_boolean() {
        assert_eq!(parse_formula("=TRUE").unwrap(), FormulaExpr::boolean(true));
        assert_eq!(parse_formula("=false").unwrap(), FormulaExpr::boolean(false));

        // TRUE() is an ordinary zero-argument call
        assert_eq!(
            parse_formula("=TRUE()").unwrap(),
            FormulaExpr::Function {
                name: "TRUE".into(),
                args: vec![]
            }
        );
    }

    #[test]
    fn test_parse_arithmetic_precedence() {
        // 1+(2*3)
        let ast = parse_formula("=1+2*3").unwrap();
        assert_eq!(
            ast,
            binary(
                BinaryOperator::Add,
                FormulaExpr::number(1.0),
                binary(
                    BinaryOperator::Multiply,
                    FormulaExpr::number(2.0),
                    FormulaExpr::number(3.0)
                )
            )
        );
    }

    #[test]
    fn test_power_is_right_associative() {
        let ast = parse_formula("=2^3^2").unwrap();
        assert_eq!(
            ast,
            binary(
                BinaryOperator::Power,
                FormulaExpr::number(2.0),
                binary(
                    BinaryOperator::Power,
                    FormulaExpr::number(3.0),
                    FormulaExpr::number(2.0)
                )
            )
        );
    }

    #[test]
    fn test_comparison_binds_loosest() {
        // (1+1) = (2&"")
        let ast = parse_formula("=1+1=2&\"\"").unwrap();
        match ast {
            FormulaExpr::BinaryOp { op, left, right } => {
                assert_eq!(op, BinaryOperator::Equal);
                assert!(matches!(*left, FormulaExpr::BinaryOp { op: BinaryOperator::Add, .. }));
                assert!(matches!(*right, FormulaExpr::BinaryOp { op: BinaryOperator::Concat, .. }));
            }
            other => panic!("Expected BinaryOp, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_unary() {
        let ast = parse_formula("=-5").unwrap();
        assert_eq!(
            ast,
            FormulaExpr::UnaryOp {
                op: UnaryOperator::Negate,
                operand: Box::new(FormulaExpr::number(5.0)),
            }
        );

        // Unary minus binds tighter than ^ in spreadsheets: -2^2 = 4
        let ast = parse_formula("=-2^2").unwrap();
        assert!(matches!(ast, FormulaExpr::BinaryOp { op: BinaryOperator::Power, .. }));

        assert_eq!(parse_formula("=+7").unwrap(), FormulaExpr::number(7.0));
    }

    #[test]
    fn test_parse_cell_reference() {
        let ast = parse_formula("=$B$2").unwrap();
        let FormulaExpr::CellRef(cell_ref) = ast else {
            panic!("Expected CellRef");
        };
        assert_eq!(cell_ref.address.key(), (1, 1));
        assert!(cell_ref.address.row_absolute);
        assert!(cell_ref.address.col_absolute);
    }

    #[test]
    fn test_parse_range_reference() {
        let ast = parse_formula("=A1:B10").unwrap();
        let FormulaExpr::RangeRef(range_ref) = ast else {
            panic!("Expected RangeRef");
        };
        assert_eq!(range_ref.range.start.key(), (0, 0));
        assert_eq!(range_ref.range.end.key(), (9, 1));

        // Reversed corners and spaced colon give the same range
        assert_eq!(parse_formula("=C5:A1").unwrap(), parse_formula("=A1:C5").unwrap());
        assert_eq!(parse_formula("=A1 : C5").unwrap(), parse_formula("=A1:C5").unwrap());
    }

    #[test]
    fn test_parse_function() {
        let ast = parse_formula("=sum(1,A1:A3,B2)").unwrap();
        let FormulaExpr::Function { name, args } = ast else {
            panic!("Expected Function");
        };
        assert_eq!(name, "SUM");
        assert_eq!(args.len(), 3);
        assert!(matches!(&args[1], FormulaExpr::RangeRef(_)));
        assert_eq!(
            args[2],
            FormulaExpr::CellRef(CellReference {
                address: CellAddress::new(1, 1)
            })
        );
    }

    #[test]
    fn test_unknown_function_parses() {
        let ast = parse_formula("=NOSUCHFN(1)").unwrap();
        assert!(matches!(ast, FormulaExpr::Function { ref name, .. } if name == "NOSUCHFN"));
        assert_eq!(parse_formula("=foo").unwrap(), FormulaExpr::Name("FOO".into()));
    }

    #[test]
    fn test_parse_nested_function() {
        let ast = parse_formula(
            "=IFERROR(VLOOKUP(999, $A$2:$D$6, 2, FALSE), \"Tidak Ditemukan\")",
        )
        .unwrap();
        let FormulaExpr::Function { name, args } = ast else {
            panic!("Expected Function");
        };
        assert_eq!(name, "IFERROR");
        assert_eq!(args[1], FormulaExpr::Literal(Literal::String("Tidak Ditemukan".into())));
        let FormulaExpr::Function { name, args } = &args[0] else {
            panic!("Expected nested Function");
        };
        assert_eq!(name, "VLOOKUP");
        assert_eq!(args[3], FormulaExpr::boolean(false));
    }

    #[test]
    fn test_parse_parentheses() {
        let ast = parse_formula("=(1+2)*3").unwrap();
        let FormulaExpr::BinaryOp { op, left, right } = ast else {
            panic!("Expected BinaryOp");
        };
        assert_eq!(op, BinaryOperator::Multiply);
        assert!(matches!(*left, FormulaExpr::BinaryOp { op: BinaryOperator::Add, .. }));
        assert_eq!(*right, FormulaExpr::number(3.0));
    }

    #[test]
    fn test_syntax_errors() {
        let kind = |f: &str| parse_formula(f).unwrap_err().kind;

        assert_eq!(kind("SUM(A1)"), SyntaxErrorKind::EmptyExpression);
        assert_eq!(kind("="), SyntaxErrorKind::EmptyExpression);
        assert_eq!(kind("=   "), SyntaxErrorKind::EmptyExpression);
        assert_eq!(kind("=(1+2"), SyntaxErrorKind::MissingParenthesis);
        assert_eq!(kind("=SUM(1,2"), SyntaxErrorKind::MissingParenthesis);
        assert_eq!(kind("=1+2)"), SyntaxErrorKind::MissingParenthesis);
        assert_eq!(kind("=1+"), SyntaxErrorKind::UnexpectedToken);
        assert_eq!(kind("=1 2"), SyntaxErrorKind::UnexpectedToken);
        assert_eq!(kind("=SUM(1,,2)"), SyntaxErrorKind::UnexpectedToken);
        assert_eq!(kind("=1:2"), SyntaxErrorKind::UnexpectedToken);
        assert_eq!(kind("=\"abc"), SyntaxErrorKind::UnterminatedString);
        assert_eq!(kind("=1 ; 2"), SyntaxErrorKind::UnknownCharacter);
    }

    #[test]
    fn test_error_positions_refer_to_full_text() {
        let err = parse_formula("=1 + \"abc").unwrap_err();
        assert_eq!(err.position, 5);

        let err = parse_formula("  =(1").unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::MissingParenthesis);
        assert_eq!(err.position, 5);
    }

    #[test]
    fn test_deep_nesting_is_rejected() {
        let formula = format!("={}1{}", "(".repeat(5000), ")".repeat(5000));
        let err = parse_formula(&formula).unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::UnexpectedToken);

        let formula = format!("={}1", "-".repeat(5000));
        assert!(parse_formula(&formula).is_err());
    }

    #[test]
    fn test_long_operator_chain_is_rejected() {
        let formula = format!("=1{}", "+1".repeat(10_000));
        let err = parse_formula(&formula).unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::UnexpectedToken);

        let formula = format!("=A1{}", "&A1".repeat(10_000));
        assert!(parse_formula(&formula).is_err());

        // Chains within the limit still parse
        let formula = format!("=1{}", "+1".repeat(MAX_TREE_DEPTH - 1));
        assert!(parse_formula(&formula).is_ok());
        let formula = format!("=1{}", "+1".repeat(MAX_TREE_DEPTH));
        assert!(parse_formula(&formula).is_err());
    }
}
