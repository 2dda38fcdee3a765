use std::collections::HashSet;

use log::debug;

use crate::ast::*;
use crate::error::{Error, Result};
use crate::tokenizer::{SpannedToken, Token, Tokenizer};

/// Recursive-descent parser turning SQL text into a [Command].
pub struct Parser {
    tokenizer: Tokenizer,
    tokens: Vec<SpannedToken>,
    position: usize,
    /// Statement kind used in syntax error messages.
    statement: &'static str,
}

/// Parses one SQL statement.
///
/// # Example
/// ```
/// # use coldb::parser::parse;
/// # use coldb::ast::Command;
/// let command = parse("SHOW TABLES;").unwrap();
/// assert_eq!(command, Command::ShowTables);
/// ```
pub fn parse(sql: &str) -> Result<Command> {
    Parser::new(sql)?.parse()
}

impl Parser {
    /// Tokenizes `sql`.
    ///
    /// # Errors
    /// Returns [Error::InvalidSyntax] if the text cannot be tokenized.
    pub fn new(sql: &str) -> Result<Self> {
        let mut tokenizer = Tokenizer::new(sql);
        let tokens = tokenizer.tokenize()?;
        Ok(Self {
            tokenizer,
            tokens,
            position: 0,
            statement: "SQL",
        })
    }

    pub fn parse(&mut self) -> Result<Command> {
        let leading = (self.current_token().clone(), self.peek_token().clone());
        let command = match leading {
            (Token::Create, Token::Table) => self.parse_create_table(),
            (Token::Insert, Token::Into) => self.parse_insert(),
            (Token::Select, _) => self.parse_select(),
            (Token::Drop, Token::Table) => self.parse_drop_table(),
            (Token::Show, Token::Tables) => self.parse_show_tables(),
            (Token::Describe | Token::Desc, _) => self.parse_describe(),
            _ => Err(Error::UnsupportedStatement),
        }?;

        // semicolon is optional in SQL so skip it
        if matches!(self.current_token(), Token::Semicolon) {
            self.advance();
        }

        // Check we are at the end of the statement
        if !self.is_at_end() {
            return Err(self.error(format!(
                "unexpected token after statement: {:?}",
                self.current_token()
            )));
        }

        debug!("parsed {} statement", self.statement);
        Ok(command)
    }

    //helpers
    fn current_token(&self) -> &Token {
        &self.tokens[self.position].token
    }

    fn peek_token(&self) -> &Token {
        let idx = (self.position + 1).min(self.tokens.len() - 1);
        &self.tokens[idx].token
    }

    fn advance(&mut self) {
        if self.position < self.tokens.len() - 1 {
            self.position += 1;
        }
    }

    fn is_at_end(&self) -> bool {
        matches!(self.current_token(), Token::Eof)
    }

    fn error(&self, message: impl Into<String>) -> Error {
        Error::syntax(self.statement, message)
    }

    fn consume(&mut self, expected: Token) -> Result<()> {
        if *self.current_token() == expected {
            self.advance();
            Ok(())
        } else {
            Err(self.error(format!(
                "expected {:?}, found {:?}",
                expected,
                self.current_token()
            )))
        }
    }

    /// Consumes `expected` if it is the current token.
    fn eat(&mut self, expected: &Token) -> bool {
        if self.current_token() == expected {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consumes a name; non-clause keywords count as names, spelled as written.
    fn consume_ident(&mut self) -> Result<String> {
        let name = self.name_at(self.position).ok_or_else(|| {
            self.error(format!(
                "expected identifier, found {:?}",
                self.current_token()
            ))
        })?;
        self.advance();
        Ok(name)
    }

    fn name_at(&self, idx: usize) -> Option<String> {
        let spanned = &self.tokens[idx];
        match &spanned.token {
            Token::Ident(name) => Some(name.clone()),
            keyword if keyword.is_name_keyword() => {
                Some(self.tokenizer.slice(spanned.start, spanned.end))
            }
            _ => None,
        }
    }

    /// Parses `ident (, ident)*`.
    fn parse_ident_list(&mut self) -> Result<Vec<String>> {
        let mut names = vec![self.consume_ident()?];
        while self.eat(&Token::Comma) {
            names.push(self.consume_ident()?);
        }
        Ok(names)
    }

    // --- CREATE TABLE ---

    fn parse_create_table(&mut self) -> Result<Command> {
        self.statement = "CREATE TABLE";
        self.consume(Token::Create)?;
        self.consume(Token::Table)?;
        let name = self.consume_ident()?;
        self.consume(Token::LeftParen)?;
        if matches!(self.current_token(), Token::RightParen) {
            return Err(self.error("no column definitions"));
        }

        let mut columns = Vec::new();
        let mut seen = HashSet::new();
        loop {
            let column = self.parse_column_spec()?;
            if !seen.insert(column.name.clone()) {
                return Err(Error::DuplicateColumn(column.name));
            }
            columns.push(column);
            match self.current_token() {
                Token::RightParen => {
                    self.advance();
                    break;
                }
                Token::Comma => {
                    self.advance();
                    continue;
                }
                _ => return Err(self.error("expected ',' or ')' in column definitions")),
            }
        }

        let engine = if self.eat(&Token::Engine) {
            self.eat(&Token::Equal);
            Some(self.consume_ident()?)
        } else {
            None
        };

        Ok(Command::CreateTable(CreateTable {
            name,
            columns,
            engine,
        }))
    }

    fn parse_column_spec(&mut self) -> Result<ColumnSpec> {
        let name = self.consume_ident()?;
        let (type_name, precision) = self.parse_type_name()?;
        Ok(ColumnSpec {
            name,
            type_name,
            precision,
        })
    }

    /// Parses `Type`, `Type(precision)` or `Nullable(Type)`.
    fn parse_type_name(&mut self) -> Result<(String, Option<String>)> {
        let base = self.consume_ident()?;
        if !matches!(self.current_token(), Token::LeftParen) {
            return Ok((base, None));
        }

        if base.eq_ignore_ascii_case("Nullable") {
            self.consume(Token::LeftParen)?;
            let (inner, precision) = self.parse_type_name()?;
            self.consume(Token::RightParen)?;
            return Ok((format!("{base}({inner})"), precision));
        }

        let open = self.tokens[self.position].end;
        self.consume(Token::LeftParen)?;
        loop {
            match self.current_token() {
                Token::Number(_) | Token::Comma => self.advance(),
                Token::RightParen => break,
                _ => return Err(self.error(format!("invalid precision for type {base}"))),
            }
        }
        let close = self.tokens[self.position].start;
        self.advance();
        let precision = self.tokenizer.slice(open, close).trim().to_string();
        Ok((base, Some(precision)))
    }

    // --- INSERT ---

    fn parse_insert(&mut self) -> Result<Command> {
        self.statement = "INSERT";
        self.consume(Token::Insert)?;
        self.consume(Token::Into)?;
        let table = self.consume_ident()?;

        let columns = if self.eat(&Token::LeftParen) {
            let names = self.parse_ident_list()?;
            self.consume(Token::RightParen)?;
            Some(names)
        } else {
            None
        };

        self.consume(Token::Values)?;
        let mut rows = vec![self.parse_value_tuple()?];
        while self.eat(&Token::Comma) {
            rows.push(self.parse_value_tuple()?);
        }

        Ok(Command::Insert(Insert {
            table,
            columns,
            rows,
        }))
    }

    fn parse_value_tuple(&mut self) -> Result<Vec<Literal>> {
        self.consume(Token::LeftParen)?;
        if matches!(self.current_token(), Token::RightParen) {
            return Err(self.error("empty VALUES tuple"));
        }
        let mut values = vec![self.parse_literal()?];
        while self.eat(&Token::Comma) {
            values.push(self.parse_literal()?);
        }
        self.consume(Token::RightParen)?;
        Ok(values)
    }

    fn parse_literal(&mut self) -> Result<Literal> {
        match self.current_token().clone() {
            Token::String(text) => {
                self.advance();
                Ok(Literal::quoted(text))
            }
            Token::Ident(text) => {
                self.advance();
                Ok(Literal::bare(text))
            }
            sign @ (Token::Minus | Token::Plus) => {
                self.advance();
                let text = self
                    .number_text()
                    .ok_or_else(|| self.error("expected a number after the sign"))?;
                if sign == Token::Minus {
                    Ok(Literal::bare(format!("-{text}")))
                } else {
                    Ok(Literal::bare(text))
                }
            }
            other => self
                .number_text()
                .map(Literal::bare)
                .ok_or_else(|| self.error(format!("invalid value {other:?}"))),
        }
    }

    /// Consumes `12`, `1.5` or `.5` and returns it as written.
    fn number_text(&mut self) -> Option<String> {
        let current = &self.tokens[self.position];
        let (text, width) = match (&current.token, self.tokens.get(self.position + 1)) {
            (Token::Number(text), _) => (text.clone(), 1),
            (Token::Dot, Some(next)) => match &next.token {
                Token::Number(digits) if next.start == current.end && !digits.contains('.') => {
                    (format!(".{digits}"), 2)
                }
                _ => return None,
            },
            _ => return None,
        };
        for _ in 0..width {
            self.advance();
        }
        Some(text)
    }

    // --- SELECT ---

    fn parse_select(&mut self) -> Result<Command> {
        self.statement = "SELECT";
        self.consume(Token::Select)?;

        let columns = if matches!(self.current_token(), Token::Star)
            && matches!(self.peek_token(), Token::From)
        {
            self.advance();
            SelectColumns::Star
        } else {
            SelectColumns::Expressions(self.parse_select_list()?)
        };

        if !self.eat(&Token::From) {
            return Err(self.error("missing FROM"));
        }
        let table = self.consume_ident()?;

        let where_clause = if self.eat(&Token::Where) {
            Some(self.capture_where()?)
        } else {
            None
        };

        let mut group_by = Vec::new();
        if self.eat(&Token::Group) {
            self.consume(Token::By)?;
            group_by = self.parse_ident_list()?;
        }

        let mut order_by = Vec::new();
        if self.eat(&Token::Order) {
            self.consume(Token::By)?;
            loop {
                let column = self.consume_ident()?;
                let direction = if self.eat(&Token::Desc) {
                    SortDirection::Desc
                } else {
                    self.eat(&Token::Asc);
                    SortDirection::Asc
                };
                order_by.push(OrderByClause { column, direction });
                if !self.eat(&Token::Comma) {
                    break;
                }
            }
        }

        let limit = if self.eat(&Token::Limit) {
            match self.current_token() {
                Token::Number(text) => {
                    let limit = text
                        .parse::<usize>()
                        .map_err(|_| self.error(format!("invalid LIMIT {text}")))?;
                    self.advance();
                    Some(limit)
                }
                other => return Err(self.error(format!("invalid LIMIT {other:?}"))),
            }
        } else {
            None
        };

        Ok(Command::Select(Select {
            columns,
            table,
            where_clause,
            group_by,
            order_by,
            limit,
        }))
    }

    /// Splits the select list on commas outside parentheses, up to `FROM`.
    fn parse_select_list(&mut self) -> Result<Vec<ColumnExpression>> {
        let mut expressions = Vec::new();
        let mut start = self.position;
        let mut depth = 0usize;

        loop {
            match self.current_token() {
                Token::LeftParen => depth += 1,
                Token::RightParen => {
                    depth = depth
                        .checked_sub(1)
                        .ok_or_else(|| self.error("unbalanced parentheses"))?;
                }
                Token::Comma if depth == 0 => {
                    expressions.push(self.parse_column_expression(start, self.position)?);
                    start = self.position + 1;
                }
                Token::From if depth == 0 => break,
                Token::Eof => break,
                _ => {}
            }
            self.advance();
        }

        expressions.push(self.parse_column_expression(start, self.position)?);
        Ok(expressions)
    }

    /// Parses the tokens in `start..end` as one select-list entry.
    fn parse_column_expression(&self, start: usize, end: usize) -> Result<ColumnExpression> {
        let tokens: Vec<Token> = (start..end)
            .map(|idx| match self.name_at(idx) {
                Some(name) => Token::Ident(name),
                None => self.tokens[idx].token.clone(),
            })
            .collect();
        if tokens.is_empty() {
            return Err(self.error("empty column expression"));
        }

        // `expr AS alias` or `expr alias`
        let (body, alias) = match tokens.as_slice() {
            [body @ .., Token::As, Token::Ident(alias)] => (body, Some(alias.clone())),
            [body @ .., Token::Ident(alias)]
                if matches!(body.last(), Some(Token::RightParen | Token::Ident(_))) =>
            {
                (body, Some(alias.clone()))
            }
            all => (all, None),
        };

        let expression = match body {
            [Token::Ident(function), Token::LeftParen, argument, Token::RightParen] => {
                let column = match argument {
                    Token::Star => "*".to_string(),
                    Token::Ident(column) => column.clone(),
                    _ => return Ok(self.raw_expression(start, end)),
                };
                let aggregate = AggregateFunction::from_name(function)
                    .ok_or_else(|| Error::UnsupportedFunction(function.to_uppercase()))?;
                ColumnExpression::aggregate(aggregate, column)
            }
            [Token::Ident(column)] => ColumnExpression::column(column.clone()),
            [Token::Ident(table), Token::Dot, Token::Ident(column)] => {
                ColumnExpression::column(format!("{table}.{column}"))
            }
            _ => return Ok(self.raw_expression(start, end)),
        };

        Ok(match alias {
            Some(alias) => expression.with_alias(alias),
            None => expression,
        })
    }

    fn raw_expression(&self, start: usize, end: usize) -> ColumnExpression {
        let text = self
            .tokenizer
            .slice(self.tokens[start].start, self.tokens[end - 1].end);
        ColumnExpression::column(text.trim())
    }

    /// Captures the WHERE condition text up to the next clause keyword.
    fn capture_where(&mut self) -> Result<String> {
        let first = self.position;
        let mut depth = 0usize;
        loop {
            match self.current_token() {
                Token::LeftParen => depth += 1,
                Token::RightParen => depth = depth.saturating_sub(1),
                Token::Group | Token::Order | Token::Limit | Token::Semicolon if depth == 0 => {
                    break;
                }
                Token::Eof => break,
                _ => {}
            }
            self.advance();
        }
        if self.position == first {
            return Err(self.error("empty WHERE condition"));
        }
        let text = self
            .tokenizer
            .slice(self.tokens[first].start, self.tokens[self.position - 1].end);
        Ok(text)
    }

    // --- DROP / SHOW / DESCRIBE ---

    fn parse_drop_table(&mut self) -> Result<Command> {
        self.statement = "DROP TABLE";
        self.consume(Token::Drop)?;
        self.consume(Token::Table)?;
        let if_exists = if self.eat(&Token::If) {
            self.consume(Token::Exists)?;
            true
        } else {
            false
        };
        let name = self.consume_ident()?;
        Ok(Command::DropTable(DropTable { name, if_exists }))
    }

    fn parse_show_tables(&mut self) -> Result<Command> {
        self.statement = "SHOW TABLES";
        self.consume(Token::Show)?;
        self.consume(Token::Tables)?;
        Ok(Command::ShowTables)
    }

    fn parse_describe(&mut self) -> Result<Command> {
        self.statement = "DESCRIBE";
        self.advance(); // DESCRIBE or DESC
        self.eat(&Token::Table);
        let name = self.consume_ident()?;
        Ok(Command::Describe(Describe { name }))
    }
}
