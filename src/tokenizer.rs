use crate::error::{Error, Result};

/// Represents the smallest meaningful units (atoms) of the SQL language.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // --- SQL Keywords ---
    Create,
    Table,
    Insert,
    Into,
    Values,
    Select,
    From,
    Where,
    Group,
    Order,
    By,
    Asc,
    Desc,
    Limit,
    As,
    Drop,
    If,
    Exists,
    Show,
    Tables,
    Describe,
    Engine,

    // --- Identifiers & Literals ---
    /// A name representing a table, a column, a type or a function (e.g., `users`, `Int32`).
    Ident(String),
    /// An unsigned numeric literal kept as written (e.g., `42`, `3.14`).
    ///
    /// Conversion happens later, against the target column type.
    Number(String),
    /// A string literal between single or double quotes, quotes stripped.
    String(String),

    // --- Symbols ---
    /// Left parenthesis `(`
    LeftParen,
    /// Right parenthesis `)`
    RightParen,
    /// Comma `,`
    Comma,
    /// Semicolon `;`
    Semicolon,
    /// Multiplication or wildcard symbol `*`
    Star,
    /// Minus sign `-`
    Minus,
    /// Plus sign `+`
    Plus,
    /// Dot `.`
    Dot,
    /// Equal to
    Equal,
    /// `!=` or `<>`
    NotEqual,
    /// Greater than
    Greater,
    /// Greater than or equal to
    GreaterEqual,
    /// Lower than
    Lower,
    /// Lower than or equal to
    LowerEqual,

    // --- Special ---
    /// Represents the End Of File/Input.
    Eof,
}

impl Token {
    /// Keywords that never open a clause, so they may also name a table or column.
    pub fn is_name_keyword(&self) -> bool {
        matches!(
            self,
            Self::Asc
                | Self::Desc
                | Self::If
                | Self::Exists
                | Self::Show
                | Self::Tables
                | Self::Describe
                | Self::Engine
        )
    }
}

/// A token with the character range it was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    pub token: Token,
    /// Index of the first character.
    pub start: usize,
    /// Index one past the last character.
    pub end: usize,
}

/// A lexical scanner (lexer) that converts a raw SQL string into a sequence of [Token]s.
pub struct Tokenizer {
    /// The input string stored as a vector of characters for easy iteration.
    input: Vec<char>,
    /// The current position in the character vector.
    position: usize,
}

impl Tokenizer {
    /// Creates a new Tokenizer for the given input string.
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
        }
    }

    /// Processes the entire input and returns a vector of tokens, ending with [Token::Eof].
    ///
    /// # Errors
    /// Returns [Error::InvalidSyntax] if an invalid character is encountered or
    /// if a string literal is not terminated.
    ///
    /// # Example
    /// ```
    /// # use coldb::tokenizer::{Tokenizer, Token};
    /// let mut t = Tokenizer::new("SELECT *");
    /// let tokens = t.tokenize().unwrap();
    /// assert_eq!(tokens[0].token, Token::Select);
    /// ```
    pub fn tokenize(&mut self) -> Result<Vec<SpannedToken>> {
        let mut tokens = Vec::new();

        loop {
            self.skip_whitespace();
            let start = self.position;

            if self.is_at_end() {
                tokens.push(SpannedToken {
                    token: Token::Eof,
                    start,
                    end: start,
                });
                break;
            }

            let token = self.next_token()?;
            tokens.push(SpannedToken {
                token,
                start,
                end: self.position,
            });
        }

        Ok(tokens)
    }

    /// Returns the input characters in `start..end` as a string.
    pub fn slice(&self, start: usize, end: usize) -> String {
        let end = end.min(self.input.len());
        let start = start.min(end);
        self.input[start..end].iter().collect()
    }

    /// Identifies the next token based on the character at the current position.
    fn next_token(&mut self) -> Result<Token> {
        let ch = self.current_char();

        let single = match ch {
            '(' => Some(Token::LeftParen),
            ')' => Some(Token::RightParen),
            ',' => Some(Token::Comma),
            ';' => Some(Token::Semicolon),
            '*' => Some(Token::Star),
            '-' => Some(Token::Minus),
            '+' => Some(Token::Plus),
            '.' => Some(Token::Dot),
            '=' => Some(Token::Equal),
            _ => None,
        };
        if let Some(token) = single {
            self.advance();
            return Ok(token);
        }

        match ch {
            '>' | '<' | '!' => self.read_comparison(),
            c if c.is_alphabetic() || c == '_' => Ok(self.read_identifier()),
            c if c.is_ascii_digit() && self.starts_name() => Ok(self.read_identifier()),
            c if c.is_ascii_digit() => Ok(self.read_number()),
            '\'' | '"' => self.read_string(ch),
            _ => Err(Error::syntax(
                "SQL",
                format!("character {ch:?} is not supported"),
            )),
        }
    }

    // --- Navigation Helpers ---

    /// Returns the character at the current position.
    fn current_char(&self) -> char {
        self.input[self.position]
    }

    fn peek_char(&self) -> Option<char> {
        self.input.get(self.position + 1).copied()
    }

    /// Moves the cursor forward by one character.
    fn advance(&mut self) {
        self.position += 1;
    }

    /// Checks if the cursor has reached the end of the input.
    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    /// Consumes any whitespace characters (spaces, tabs, newlines).
    fn skip_whitespace(&mut self) {
        while !self.is_at_end() && self.current_char().is_whitespace() {
            self.advance();
        }
    }

    /// Returns true if the word at the cursor is a name such as `2024_sales`.
    ///
    /// Digit runs, `1e5`-style exponents and `2e` before a signed exponent stay numbers.
    fn starts_name(&self) -> bool {
        let word: Vec<char> = self.input[self.position..]
            .iter()
            .copied()
            .take_while(|c| c.is_alphanumeric() || *c == '_')
            .collect();
        let digits = word.iter().take_while(|c| c.is_ascii_digit()).count();
        match word.get(digits) {
            None => false,
            Some('e' | 'E') => !word[digits + 1..].iter().all(char::is_ascii_digit),
            Some(_) => true,
        }
    }

    // --- Extraction Logic ---

    /// Reads a sequence of word characters and determines if it's
    /// a reserved SQL keyword or a user-defined identifier.
    ///
    /// Keywords are matched case-insensitively.
    fn read_identifier(&mut self) -> Token {
        let mut ident = String::new();

        while !self.is_at_end()
            && (self.current_char().is_alphanumeric() || self.current_char() == '_')
        {
            ident.push(self.current_char());
            self.advance();
        }

        match ident.to_uppercase().as_str() {
            "CREATE" => Token::Create,
            "TABLE" => Token::Table,
            "INSERT" => Token::Insert,
            "INTO" => Token::Into,
            "VALUES" => Token::Values,
            "SELECT" => Token::Select,
            "FROM" => Token::From,
            "WHERE" => Token::Where,
            "GROUP" => Token::Group,
            "ORDER" => Token::Order,
            "BY" => Token::By,
            "ASC" => Token::Asc,
            "DESC" => Token::Desc,
            "LIMIT" => Token::Limit,
            "AS" => Token::As,
            "DROP" => Token::Drop,
            "IF" => Token::If,
            "EXISTS" => Token::Exists,
            "SHOW" => Token::Show,
            "TABLES" => Token::Tables,
            "DESCRIBE" => Token::Describe,
            "ENGINE" => Token::Engine,
            _ => Token::Ident(ident),
        }
    }

    /// Reads digits with at most one `.` and an optional exponent.
    fn read_number(&mut self) -> Token {
        let mut number = String::new();
        let mut has_dot = false;

        while !self.is_at_end() {
            let c = self.current_char();
            if c.is_ascii_digit() || (c == '.' && !has_dot) {
                has_dot |= c == '.';
                number.push(c);
                self.advance();
            } else if (c == 'e' || c == 'E')
                && self
                    .peek_char()
                    .is_some_and(|n| n.is_ascii_digit() || n == '-' || n == '+')
            {
                number.push(c);
                self.advance();
                number.push(self.current_char());
                self.advance();
                while !self.is_at_end() && self.current_char().is_ascii_digit() {
                    number.push(self.current_char());
                    self.advance();
                }
                break;
            } else {
                break;
            }
        }

        Token::Number(number)
    }

    /// Reads a string literal enclosed in `quote`; a doubled quote stands for itself.
    fn read_string(&mut self, quote: char) -> Result<Token> {
        self.advance(); // Skip the opening quote

        let mut string = String::new();
        loop {
            if self.is_at_end() {
                return Err(Error::syntax("SQL", "unterminated string literal"));
            }
            let c = self.current_char();
            self.advance();
            if c != quote {
                string.push(c);
            } else if !self.is_at_end() && self.current_char() == quote {
                string.push(quote);
                self.advance();
            } else {
                return Ok(Token::String(string));
            }
        }
    }

    fn read_comparison(&mut self) -> Result<Token> {
        let first = self.current_char();
        self.advance();
        let next = (!self.is_at_end()).then(|| self.current_char());

        let token = match (first, next) {
            ('>', Some('=')) => Token::GreaterEqual,
            ('<', Some('=')) => Token::LowerEqual,
            ('<', Some('>')) | ('!', Some('=')) => Token::NotEqual,
            ('>', _) => return Ok(Token::Greater),
            ('<', _) => return Ok(Token::Lower),
            _ => return Err(Error::syntax("SQL", "character '!' is not supported")),
        };
        self.advance();
        Ok(token)
    }
}
