/// Represents the smallest meaningful units (atoms) of the pipeline language.
///
/// Numeric and string kinds carry their parsed payload; the raw source slice
/// is kept in [Token::lexeme].
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // --- Keywords ---
    From,
    Filter,
    Select,
    Write,
    Not,

    // --- Identifiers & Literals ---
    /// A name referencing a column (e.g., `age`).
    Ident,
    /// A 64-bit integer literal (e.g., `42`).
    Int(i64),
    /// A 64-bit floating-point literal (e.g., `3.14`).
    Double(f64),
    /// A string literal between double quotes; the payload is the content
    /// without the quotes.
    Str(String),

    // --- Operators ---
    /// Addition `+`
    Plus,
    /// Subtraction or numeric negation `-`
    Minus,
    /// Multiplication `*`
    Star,
    /// Division `/`
    Slash,
    /// Equality `==`
    EqEq,
    /// Inequality `!=`
    BangEq,
    /// Less than `<`
    Less,
    /// Greater than `>`
    Greater,
    /// Less than or equal `<=`
    LessEq,
    /// Greater than or equal `>=`
    GreaterEq,

    // --- Punctuation ---
    /// Comma `,`
    Comma,
    /// Left parenthesis `(`
    LParen,
    /// Right parenthesis `)`
    RParen,

    // --- Special ---
    /// Represents the End Of File/Input.
    Eof,
    /// A lexical error with a message. Dropped by [Lexer::tokenize]; the
    /// parser then reports a structural error at the surrounding context.
    Error(String),
}

/// A single token with its raw source text and 1-based position.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub line: u32,
    pub column: u32,
}

/// A lexical scanner that converts pipeline source text into a sequence of
/// [Token]s.
///
/// Whitespace and `#`-to-end-of-line comments are skipped. Error tokens are
/// dropped from the output, a documented limitation: a bad character shows
/// up later as a parse error on the token after it.
pub struct Lexer {
    /// The input stored as a vector of characters for easy iteration.
    input: Vec<char>,
    /// The current position in the character vector.
    position: usize,
    /// 1-based line of the next character to consume.
    line: u32,
    /// 1-based column of the next character to consume.
    column: u32,
}

impl Lexer {
    /// Creates a new Lexer for the given source text.
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
        }
    }

    /// Processes the entire input and returns a vector of tokens terminated
    /// by exactly one [TokenKind::Eof].
    ///
    /// # Example
    /// ```
    /// # use sift::lexer::{Lexer, TokenKind};
    /// let tokens = Lexer::new("filter age > 30").tokenize();
    /// assert_eq!(tokens[0].kind, TokenKind::Filter);
    /// assert_eq!(tokens[2].kind, TokenKind::Greater);
    /// assert_eq!(tokens.last().unwrap().kind, TokenKind::Eof);
    /// ```
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();

        loop {
            self.skip_whitespace();
            if self.is_at_end() {
                break;
            }

            let token = self.next_token();
            if !matches!(token.kind, TokenKind::Error(_)) {
                tokens.push(token);
            }
        }

        tokens.push(Token {
            kind: TokenKind::Eof,
            lexeme: String::new(),
            line: self.line,
            column: self.column,
        });
        tokens
    }

    /// Scans the next token starting at the current position.
    fn next_token(&mut self) -> Token {
        let start = self.position;
        let line = self.line;
        let column = self.column;

        let ch = self.advance();

        let kind = match ch {
            c if c.is_ascii_alphabetic() || c == '_' => self.scan_identifier(start),
            c if c.is_ascii_digit() => self.scan_number(start),
            '"' => self.scan_string(start),
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            ',' => TokenKind::Comma,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '<' => {
                if self.match_char('=') {
                    TokenKind::LessEq
                } else {
                    TokenKind::Less
                }
            }
            '>' => {
                if self.match_char('=') {
                    TokenKind::GreaterEq
                } else {
                    TokenKind::Greater
                }
            }
            '=' => {
                if self.match_char('=') {
                    TokenKind::EqEq
                } else {
                    TokenKind::Error("Unexpected character '='".into())
                }
            }
            '!' => {
                if self.match_char('=') {
                    TokenKind::BangEq
                } else {
                    TokenKind::Error("Unexpected character '!'".into())
                }
            }
            c => TokenKind::Error(format!("Unexpected character {c:?}")),
        };

        Token {
            kind,
            lexeme: self.lexeme(start),
            line,
            column,
        }
    }

    // --- Navigation Helpers ---

    /// Checks if the cursor has reached the end of the input.
    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    /// Consumes the current character and returns it, tracking line/column.
    fn advance(&mut self) -> char {
        let ch = self.input[self.position];
        self.position += 1;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        ch
    }

    /// Looks at the current character without consuming it.
    /// Returns `'\0'` if at end (sentinel value).
    fn peek(&self) -> char {
        if self.is_at_end() {
            return '\0';
        }
        self.input[self.position]
    }

    /// Looks one character past the current one (to distinguish `1.` from
    /// `1.5`; only the latter is a double).
    fn peek_next(&self) -> char {
        if self.position + 1 >= self.input.len() {
            return '\0';
        }
        self.input[self.position + 1]
    }

    /// Conditional advance: consumes the current character only if it
    /// matches `expected`. Used for the two-character operators.
    fn match_char(&mut self, expected: char) -> bool {
        if self.is_at_end() || self.input[self.position] != expected {
            return false;
        }
        self.advance();
        true
    }

    /// Returns the raw source slice from `start` to the current position.
    fn lexeme(&self, start: usize) -> String {
        self.input[start..self.position].iter().collect()
    }

    /// Consumes whitespace and `#` comments until a significant character.
    fn skip_whitespace(&mut self) {
        while !self.is_at_end() {
            match self.peek() {
                ' ' | '\r' | '\t' | '\n' => {
                    self.advance();
                }
                '#' => {
                    while !self.is_at_end() && self.peek() != '\n' {
                        self.advance();
                    }
                }
                _ => return,
            }
        }
    }

    // --- Extraction Logic ---

    /// Reads the rest of an identifier and determines whether it is a
    /// reserved keyword or a user-defined column name.
    fn scan_identifier(&mut self, start: usize) -> TokenKind {
        while self.peek().is_ascii_alphanumeric() || self.peek() == '_' {
            self.advance();
        }

        match self.lexeme(start).as_str() {
            "from" => TokenKind::From,
            "filter" => TokenKind::Filter,
            "select" => TokenKind::Select,
            "write" => TokenKind::Write,
            "not" => TokenKind::Not,
            _ => TokenKind::Ident,
        }
    }

    /// Reads a numeric literal: `[0-9]+` or `[0-9]+ "." [0-9]+`.
    /// A trailing `.` with no following digit is not part of the number.
    fn scan_number(&mut self, start: usize) -> TokenKind {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        let mut is_double = false;
        if self.peek() == '.' && self.peek_next().is_ascii_digit() {
            is_double = true;
            self.advance(); // consume '.'
            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        let text = self.lexeme(start);
        if is_double {
            match text.parse::<f64>() {
                Ok(value) => TokenKind::Double(value),
                Err(_) => TokenKind::Error(format!("Invalid number literal '{text}'")),
            }
        } else {
            match text.parse::<i64>() {
                Ok(value) => TokenKind::Int(value),
                Err(_) => TokenKind::Error(format!("Invalid number literal '{text}'")),
            }
        }
    }

    /// Reads a string literal enclosed in double quotes. There are no escape
    /// sequences; the string may span newlines.
    fn scan_string(&mut self, start: usize) -> TokenKind {
        while !self.is_at_end() && self.peek() != '"' {
            self.advance();
        }

        if self.is_at_end() {
            return TokenKind::Error("Unterminated string".into());
        }

        self.advance(); // consume closing quote

        // Content excludes the surrounding quotes
        let content: String = self.input[start + 1..self.position - 1].iter().collect();
        TokenKind::Str(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source)
            .tokenize()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_tokenize_pipeline() {
        let source = r#"from "in.csv" filter age > 30 select name,age write "out.csv""#;

        assert_eq!(
            kinds(source),
            vec![
                TokenKind::From,
                TokenKind::Str("in.csv".into()),
                TokenKind::Filter,
                TokenKind::Ident,
                TokenKind::Greater,
                TokenKind::Int(30),
                TokenKind::Select,
                TokenKind::Ident,
                TokenKind::Comma,
                TokenKind::Ident,
                TokenKind::Write,
                TokenKind::Str("out.csv".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_tokenize_numbers() {
        assert_eq!(
            kinds("42 3.14 0"),
            vec![
                TokenKind::Int(42),
                TokenKind::Double(3.14),
                TokenKind::Int(0),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_trailing_dot_is_not_a_double() {
        // "1." lexes as the integer 1; the dangling dot becomes a dropped
        // error token.
        assert_eq!(kinds("1."), vec![TokenKind::Int(1), TokenKind::Eof]);
    }

    #[test]
    fn test_two_char_operators() {
        assert_eq!(
            kinds("< <= > >= == !="),
            vec![
                TokenKind::Less,
                TokenKind::LessEq,
                TokenKind::Greater,
                TokenKind::GreaterEq,
                TokenKind::EqEq,
                TokenKind::BangEq,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_bare_equal_and_bang_are_dropped() {
        assert_eq!(kinds("= !"), vec![TokenKind::Eof]);
        assert_eq!(
            kinds("a = b"),
            vec![TokenKind::Ident, TokenKind::Ident, TokenKind::Eof]
        );
    }

    #[test]
    fn test_comments_are_skipped() {
        let source = "filter x # keep the adults\n> 1";
        assert_eq!(
            kinds(source),
            vec![
                TokenKind::Filter,
                TokenKind::Ident,
                TokenKind::Greater,
                TokenKind::Int(1),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_unterminated_string_is_dropped() {
        assert_eq!(kinds("\"oops"), vec![TokenKind::Eof]);
    }

    #[test]
    fn test_multiline_string_advances_line() {
        let tokens = Lexer::new("\"a\nb\" x").tokenize();

        assert_eq!(tokens[0].kind, TokenKind::Str("a\nb".into()));
        assert_eq!(tokens[0].line, 1);
        // the identifier after the string sits on line 2
        assert_eq!(tokens[1].kind, TokenKind::Ident);
        assert_eq!(tokens[1].line, 2);
    }

    #[test]
    fn test_positions_are_one_based() {
        let tokens = Lexer::new("from \"a\"\nfilter x").tokenize();

        assert_eq!((tokens[0].line, tokens[0].column), (1, 1));
        assert_eq!((tokens[1].line, tokens[1].column), (1, 6));
        assert_eq!((tokens[2].line, tokens[2].column), (2, 1));
        assert_eq!((tokens[3].line, tokens[3].column), (2, 8));
    }

    #[test]
    fn test_keywords_vs_identifiers() {
        let tokens = Lexer::new("from fromage not nothing").tokenize();

        assert_eq!(tokens[0].kind, TokenKind::From);
        assert_eq!(tokens[1].kind, TokenKind::Ident);
        assert_eq!(tokens[1].lexeme, "fromage");
        assert_eq!(tokens[2].kind, TokenKind::Not);
        assert_eq!(tokens[3].kind, TokenKind::Ident);
    }

    #[test]
    fn test_lexemes_appear_in_source_order() {
        // Round-trip property: every lexeme is a literal slice of the
        // source, in order (comments and whitespace aside).
        let source = "from \"data.csv\"  # load\nfilter (age + 1.5) >= 2 select a_b";
        let tokens = Lexer::new(source).tokenize();

        let mut cursor = 0;
        for token in &tokens {
            if token.lexeme.is_empty() {
                continue;
            }
            let found = source[cursor..]
                .find(&token.lexeme)
                .expect("lexeme not found in source");
            cursor += found + token.lexeme.len();
        }
    }
}
