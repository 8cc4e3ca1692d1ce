use std::sync::Arc;

use crate::ast::{BinaryOp, Expr, Literal, Program, Stmt, UnaryOp};
use crate::error::{Error, Result};
use crate::lexer::{Token, TokenKind};

/// A recursive descent parser that transforms a sequence of [Token]s into a
/// [Program].
///
/// The grammar is LL(1): a pipeline starts with `from` and is followed by
/// any number of `filter`, `select`, and `write` statements. Expression
/// parsing climbs the precedence ladder equality → comparison → additive →
/// multiplicative → unary → primary; all binary operators are
/// left-associative.
///
/// On any unmet expectation the parser fails with a positioned
/// [Error::Parse]; no recovery is attempted.
pub struct Parser {
    /// The stream of tokens produced by the [crate::lexer::Lexer].
    tokens: Vec<Token>,
    /// The current index in the token stream.
    position: usize,
}

impl Parser {
    /// Creates a new parser from a list of tokens.
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            position: 0,
        }
    }

    /// Parses the tokens into a [Program].
    ///
    /// # Errors
    /// Returns [Error::Parse] if the syntax is invalid or if trailing tokens
    /// remain after the pipeline.
    ///
    /// # Example
    /// ```
    /// # use sift::lexer::Lexer;
    /// # use sift::parser::Parser;
    /// let tokens = Lexer::new("from \"in.csv\" filter age > 30").tokenize();
    /// let program = Parser::new(tokens).parse().unwrap();
    /// assert_eq!(program.statements.len(), 2);
    /// ```
    pub fn parse(mut self) -> Result<Program> {
        let mut statements = vec![self.parse_from()?];

        loop {
            match self.current().kind {
                TokenKind::Filter => statements.push(self.parse_filter()?),
                TokenKind::Select => statements.push(self.parse_select()?),
                TokenKind::Write => statements.push(self.parse_write()?),
                _ => break,
            }
        }

        if !self.is_at_end() {
            return Err(self.error("Expected end of file"));
        }

        Ok(Program { statements })
    }

    // --- Navigation Helpers ---

    /// Returns a reference to the token at the current position.
    fn current(&self) -> &Token {
        &self.tokens[self.position]
    }

    /// Advances the cursor to the next token, stopping at EOF.
    fn advance(&mut self) {
        if self.position < self.tokens.len() - 1 {
            self.position += 1;
        }
    }

    /// Checks if the cursor has reached the end of the token stream.
    fn is_at_end(&self) -> bool {
        matches!(self.current().kind, TokenKind::Eof)
    }

    /// Consumes the current token if it matches `kind`.
    /// Only used for payload-free kinds.
    fn match_kind(&mut self, kind: &TokenKind) -> bool {
        if &self.current().kind == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Validates that the current token matches the expected kind and
    /// advances. Returns a positioned error with `message` otherwise.
    fn consume(&mut self, kind: TokenKind, message: &str) -> Result<()> {
        if self.current().kind == kind {
            self.advance();
            Ok(())
        } else {
            Err(self.error(message))
        }
    }

    /// Specifically consumes a [TokenKind::Str] and returns its content.
    fn consume_string(&mut self, message: &str) -> Result<String> {
        match &self.current().kind {
            TokenKind::Str(content) => {
                let content = content.clone();
                self.advance();
                Ok(content)
            }
            _ => Err(self.error(message)),
        }
    }

    /// Specifically consumes a [TokenKind::Ident] and returns its name.
    fn consume_ident(&mut self, message: &str) -> Result<String> {
        match self.current().kind {
            TokenKind::Ident => {
                let name = self.current().lexeme.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.error(message)),
        }
    }

    /// Builds a [Error::Parse] at the current token's position.
    fn error(&self, message: &str) -> Error {
        let token = self.current();
        Error::Parse {
            line: token.line,
            column: token.column,
            message: message.into(),
        }
    }

    // --- Production Rules ---

    fn parse_from(&mut self) -> Result<Stmt> {
        self.consume(TokenKind::From, "Expected 'from'")?;
        let path = self.consume_string("Expected string literal for file path")?;
        Ok(Stmt::From { path })
    }

    fn parse_filter(&mut self) -> Result<Stmt> {
        self.consume(TokenKind::Filter, "Expected 'filter'")?;
        let condition = self.parse_expr()?;
        Ok(Stmt::Filter { condition })
    }

    fn parse_select(&mut self) -> Result<Stmt> {
        self.consume(TokenKind::Select, "Expected 'select'")?;

        let mut columns = vec![self.consume_ident("Expected column name")?];
        while self.match_kind(&TokenKind::Comma) {
            columns.push(self.consume_ident("Expected column name after ','")?);
        }

        Ok(Stmt::Select { columns })
    }

    fn parse_write(&mut self) -> Result<Stmt> {
        self.consume(TokenKind::Write, "Expected 'write'")?;
        let path = self.consume_string("Expected string literal for file path")?;
        Ok(Stmt::Write { path })
    }

    // --- Expression Parsing (precedence climbing) ---

    fn parse_expr(&mut self) -> Result<Expr> {
        self.parse_equality()
    }

    /// equality := comparison (("==" | "!=") comparison)*
    fn parse_equality(&mut self) -> Result<Expr> {
        let mut expr = self.parse_comparison()?;

        loop {
            let op = match self.current().kind {
                TokenKind::EqEq => BinaryOp::Eq,
                TokenKind::BangEq => BinaryOp::Neq,
                _ => break,
            };
            self.advance();
            let right = self.parse_comparison()?;
            expr = Expr::Binary {
                op,
                left: Box::new(expr),
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    /// comparison := term (("<" | ">" | "<=" | ">=") term)*
    fn parse_comparison(&mut self) -> Result<Expr> {
        let mut expr = self.parse_term()?;

        loop {
            let op = match self.current().kind {
                TokenKind::Less => BinaryOp::Lt,
                TokenKind::Greater => BinaryOp::Gt,
                TokenKind::LessEq => BinaryOp::Lte,
                TokenKind::GreaterEq => BinaryOp::Gte,
                _ => break,
            };
            self.advance();
            let right = self.parse_term()?;
            expr = Expr::Binary {
                op,
                left: Box::new(expr),
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    /// term := factor (("+" | "-") factor)*
    fn parse_term(&mut self) -> Result<Expr> {
        let mut expr = self.parse_factor()?;

        loop {
            let op = match self.current().kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_factor()?;
            expr = Expr::Binary {
                op,
                left: Box::new(expr),
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    /// factor := unary (("*" | "/") unary)*
    fn parse_factor(&mut self) -> Result<Expr> {
        let mut expr = self.parse_unary()?;

        loop {
            let op = match self.current().kind {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            expr = Expr::Binary {
                op,
                left: Box::new(expr),
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    /// unary := ("-" | "not") unary | primary
    fn parse_unary(&mut self) -> Result<Expr> {
        let op = match self.current().kind {
            TokenKind::Minus => Some(UnaryOp::Neg),
            TokenKind::Not => Some(UnaryOp::Not),
            _ => None,
        };

        if let Some(op) = op {
            self.advance();
            let operand = self.parse_unary()?;
            return Ok(Expr::Unary {
                op,
                operand: Box::new(operand),
            });
        }

        self.parse_primary()
    }

    /// primary := NUMBER | STRING | IDENT | "(" expr ")"
    fn parse_primary(&mut self) -> Result<Expr> {
        match &self.current().kind {
            TokenKind::Int(value) => {
                let value = *value;
                self.advance();
                Ok(Expr::Literal(Literal::Int(value)))
            }
            TokenKind::Double(value) => {
                let value = *value;
                self.advance();
                Ok(Expr::Literal(Literal::Double(value)))
            }
            TokenKind::Str(content) => {
                let text = Arc::from(content.as_str());
                self.advance();
                Ok(Expr::Literal(Literal::Text(text)))
            }
            TokenKind::Ident => {
                let name = self.current().lexeme.clone();
                self.advance();
                Ok(Expr::Column(name))
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expr()?;
                self.consume(TokenKind::RParen, "Expected ')' after expression")?;
                Ok(expr)
            }
            _ => Err(self.error("Expected expression")),
        }
    }
}
