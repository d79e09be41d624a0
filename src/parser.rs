//! `CREATE TABLE` parsing on top of the sqlparser MySQL tokenizer.

use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use sqlparser::dialect::MySqlDialect;
use sqlparser::tokenizer::{Token, Tokenizer};
use tracing::debug;

use crate::error::{GeneratorError, Result};
use crate::schema::{Column, ColumnList, ColumnType, Table, TableOptions};

static EOF: Token = Token::EOF;

/// Parses the first `CREATE TABLE` statement in `sql`.
///
/// Statements before it are skipped, anything after its terminating `;` is
/// ignored.
pub fn parse_create_table(sql: &str) -> Result<Table> {
    DdlParser::new(sql)?.parse()
}

type KeyList = SmallVec<[String; 2]>;

struct DdlParser {
    tokens: Vec<Token>,
    index: usize,
}

impl DdlParser {
    fn new(sql: &str) -> Result<Self> {
        let dialect = MySqlDialect {};
        let tokens = Tokenizer::new(&dialect, sql)
            .tokenize()
            .map_err(|err| GeneratorError::parse(excerpt(sql), err.to_string()))?;
        let tokens = tokens
            .into_iter()
            .filter(|token| !matches!(token, Token::Whitespace(_)))
            .collect();
        Ok(Self { tokens, index: 0 })
    }

    fn parse(&mut self) -> Result<Table> {
        self.skip_to_create_table()?;

        self.expect_keyword("CREATE")?;
        self.parse_keyword("TEMPORARY");
        self.expect_keyword("TABLE")?;
        self.parse_keywords(&["IF", "NOT", "EXISTS"]);
        let name = self.object_name()?;

        if !self.consume(&Token::LParen) {
            return Err(self.error("expected column definitions"));
        }

        let mut columns = ColumnList::new();
        let mut seen = FxHashSet::default();
        let mut primary_keys = KeyList::new();
        let mut unique_keys = KeyList::new();
        loop {
            if self.peek() == &Token::RParen {
                break;
            }
            if self.at_table_constraint() {
                self.table_constraint(&mut primary_keys, &mut unique_keys)?;
            } else {
                let column = self.column_definition()?;
                if !seen.insert(column.name.to_ascii_lowercase()) {
                    return Err(GeneratorError::DuplicateColumn(column.name));
                }
                debug!(column = %column.name, data_type = %column.data_type, "parsed column");
                columns.push(column);
            }
            if !self.consume(&Token::Comma) {
                break;
            }
        }
        self.expect(&Token::RParen)?;

        if columns.is_empty() {
            return Err(GeneratorError::parse(
                name,
                "no column definitions found",
            ));
        }

        for key in &primary_keys {
            let column = find_column(&mut columns, key).ok_or_else(|| {
                GeneratorError::parse(key.as_str(), "PRIMARY KEY references an unknown column")
            })?;
            column.primary_key = true;
            column.nullable = false;
        }
        for key in &unique_keys {
            if let Some(column) = find_column(&mut columns, key) {
                column.unique = true;
            }
        }

        let (comment, options) = self.table_options()?;
        debug!(table = %name, columns = columns.len(), "parsed create table");

        Ok(Table {
            name,
            columns,
            comment,
            options,
        })
    }

    /// Skips whole statements until one opens with `CREATE [TEMPORARY] TABLE`.
    fn skip_to_create_table(&mut self) -> Result<()> {
        loop {
            match self.peek() {
                Token::EOF => return Err(self.error("expected a CREATE TABLE statement")),
                Token::SemiColon => self.index += 1,
                _ if self.peek_keyword("CREATE") => {
                    let table_at = if is_keyword(self.peek_nth(1), "TEMPORARY") { 2 } else { 1 };
                    if is_keyword(self.peek_nth(table_at), "TABLE") {
                        return Ok(());
                    }
                    return Err(self.error("expected CREATE TABLE"));
                }
                _ => self.skip_statement(),
            }
        }
    }

    fn column_definition(&mut self) -> Result<Column> {
        let name = match self.peek() {
            Token::Word(_) => self.identifier()?,
            _ => return Err(self.error("expected column name")),
        };
        let (data_type, unsigned) = self.data_type(&name)?;
        let mut column = Column::new(name, data_type);
        column.unsigned = unsigned;

        loop {
            if matches!(self.peek(), Token::Comma | Token::RParen | Token::EOF) {
                break;
            }

            if self.parse_keywords(&["NOT", "NULL"]) {
                column.nullable = false;
            } else if self.parse_keyword("NULL") {
                column.nullable = true;
            } else if self.parse_keyword("DEFAULT") {
                column.default = Some(self.expression()?);
            } else if self.parse_keyword("AUTO_INCREMENT") {
                column.auto_increment = true;
            } else if self.parse_keywords(&["PRIMARY", "KEY"]) || self.parse_keyword("KEY") {
                column.primary_key = true;
            } else if self.parse_keyword("UNIQUE") {
                self.parse_keyword("KEY");
                column.unique = true;
            } else if self.parse_keyword("COMMENT") {
                column.comment = Some(self.string_literal()?);
            } else if self.parse_keywords(&["ON", "UPDATE"]) {
                self.expression()?;
            } else if self.parse_keywords(&["CHARACTER", "SET"])
                || self.parse_keyword("CHARSET")
                || self.parse_keyword("COLLATE")
            {
                self.option_value()?;
            } else if self.parse_keyword("UNSIGNED") {
                column.unsigned = true;
            } else if self.parse_keyword("SIGNED") {
                column.unsigned = false;
            } else if self.parse_keyword("ZEROFILL")
                || self.parse_keyword("VISIBLE")
                || self.parse_keyword("INVISIBLE")
                || self.parse_keyword("STORED")
                || self.parse_keyword("VIRTUAL")
            {
            } else if self.parse_keywords(&["GENERATED", "ALWAYS"]) {
                self.expect_keyword("AS")?;
                self.group()?;
            } else if self.parse_keyword("AS") || self.parse_keyword("CHECK") {
                self.group()?;
            } else if self.parse_keyword("COLUMN_FORMAT") || self.parse_keyword("STORAGE") {
                self.identifier()?;
            } else if self.parse_keyword("REFERENCES") {
                self.skip_element();
            } else {
                return Err(self.error(format!(
                    "unexpected token in definition of column '{}'",
                    column.name
                )));
            }
        }

        if column.primary_key {
            column.nullable = false;
        }
        Ok(column)
    }

    /// Type keyword, optional parameters and numeric attributes.
    fn data_type(&mut self, column: &str) -> Result<(ColumnType, bool)> {
        let name = match self.peek() {
            Token::Word(w) if w.quote_style.is_none() => w.value.to_ascii_lowercase(),
            _ => {
                return Err(self.error(format!("expected data type for column '{column}'")));
            }
        };
        self.index += 1;

        let name = match name.as_str() {
            "double" => {
                self.parse_keyword("PRECISION");
                name
            }
            "character" | "char" if self.parse_keyword("VARYING") => "varchar".to_owned(),
            "character" => "char".to_owned(),
            _ => name,
        };

        let mut data_type = ColumnType::new(name);
        if self.consume(&Token::LParen) {
            loop {
                let param = self.literal()?;
                data_type.params.push(param);
                if !self.consume(&Token::Comma) {
                    break;
                }
            }
            self.expect(&Token::RParen)?;
        }

        let mut unsigned = false;
        loop {
            if self.parse_keyword("UNSIGNED") {
                unsigned = true;
            } else if !(self.parse_keyword("SIGNED") || self.parse_keyword("ZEROFILL")) {
                break;
            }
        }
        Ok((data_type, unsigned))
    }

    fn at_table_constraint(&self) -> bool {
        const STARTS: [&str; 9] = [
            "PRIMARY",
            "UNIQUE",
            "KEY",
            "INDEX",
            "FULLTEXT",
            "SPATIAL",
            "CONSTRAINT",
            "FOREIGN",
            "CHECK",
        ];
        STARTS.iter().any(|kw| self.peek_keyword(kw))
    }

    fn table_constraint(&mut self, primary: &mut KeyList, unique: &mut KeyList) -> Result<()> {
        if self.parse_keyword("CONSTRAINT")
            && !["PRIMARY", "UNIQUE", "FOREIGN", "CHECK"]
                .iter()
                .any(|kw| self.peek_keyword(kw))
        {
            self.identifier()?;
        }

        if self.parse_keywords(&["PRIMARY", "KEY"]) {
            self.index_type()?;
            primary.extend(self.key_columns()?);
        } else if self.parse_keyword("UNIQUE") {
            let _ = self.parse_keyword("KEY") || self.parse_keyword("INDEX");
            if self.peek() != &Token::LParen && !self.peek_keyword("USING") {
                self.identifier()?;
            }
            self.index_type()?;
            let columns = self.key_columns()?;
            if let [column] = columns.as_slice() {
                unique.push(column.clone());
            }
        }

        // index options, KEY/INDEX definitions, foreign keys and checks
        self.skip_element();
        Ok(())
    }

    fn index_type(&mut self) -> Result<()> {
        if self.parse_keyword("USING") {
            self.identifier()?;
        }
        Ok(())
    }

    /// `(col [(len)] [ASC|DESC], ...)`
    fn key_columns(&mut self) -> Result<KeyList> {
        self.expect(&Token::LParen)?;
        let mut keys = KeyList::new();
        loop {
            keys.push(self.identifier()?);
            if self.peek() == &Token::LParen {
                self.group()?;
            }
            let _ = self.parse_keyword("ASC") || self.parse_keyword("DESC");
            if !self.consume(&Token::Comma) {
                break;
            }
        }
        self.expect(&Token::RParen)?;
        Ok(keys)
    }

    fn table_options(&mut self) -> Result<(Option<String>, TableOptions)> {
        let mut comment = None;
        let mut options = TableOptions::default();
        loop {
            match self.peek() {
                Token::SemiColon | Token::EOF => break,
                Token::Comma => {
                    self.index += 1;
                    continue;
                }
                _ => {}
            }

            self.parse_keyword("DEFAULT");
            if self.parse_keywords(&["CHARACTER", "SET"]) || self.parse_keyword("CHARSET") {
                self.consume(&Token::Eq);
                options.charset = Some(self.option_value()?);
            } else if self.parse_keyword("COLLATE") {
                self.consume(&Token::Eq);
                options.collation = Some(self.option_value()?);
            } else if self.parse_keyword("ENGINE") {
                self.consume(&Token::Eq);
                options.engine = Some(self.option_value()?);
            } else if self.parse_keyword("COMMENT") {
                self.consume(&Token::Eq);
                comment = Some(self.string_literal()?);
            } else if self.parse_keyword("AUTO_INCREMENT") {
                self.consume(&Token::Eq);
                let value = self.option_value()?;
                let value = value
                    .parse()
                    .map_err(|_| GeneratorError::parse(value.as_str(), "invalid AUTO_INCREMENT"))?;
                options.auto_increment = Some(value);
            } else if let Token::Word(w) = self.peek() {
                let key = w.value.to_ascii_uppercase();
                self.index += 1;
                self.consume(&Token::Eq);
                let value = self.option_value()?;
                options.other.push((key, value));
            } else {
                return Err(self.error("unexpected token in table options"));
            }
        }
        Ok((comment, options))
    }

    /// Raw text of a default or `ON UPDATE` value.
    fn expression(&mut self) -> Result<String> {
        let text = match self.peek().clone() {
            Token::Minus | Token::Plus => {
                let sign = self.next_token();
                match self.next_token() {
                    Token::Number(n, _) => format!("{sign}{n}"),
                    _ => return Err(self.error("expected number after sign")),
                }
            }
            Token::Number(n, _) => {
                self.index += 1;
                n
            }
            Token::SingleQuotedString(s) | Token::DoubleQuotedString(s) => {
                self.index += 1;
                quote(&s)
            }
            Token::LParen => self.group()?,
            Token::Word(w) if w.quote_style.is_none() => {
                self.index += 1;
                let introducer = w.value.starts_with('_')
                    || matches!(w.value.to_ascii_lowercase().as_str(), "b" | "x" | "n");
                match self.peek() {
                    Token::SingleQuotedString(_) if introducer => {
                        let literal = self.next_token();
                        format!("{}{literal}", w.value)
                    }
                    Token::LParen => format!("{}{}", w.value, self.group()?),
                    _ => w.value,
                }
            }
            Token::Comma | Token::RParen | Token::SemiColon | Token::EOF => {
                return Err(self.error("expected a value"));
            }
            // hex, bit and national string literals
            other => {
                self.index += 1;
                other.to_string()
            }
        };
        Ok(text)
    }

    /// A balanced parenthesized group, rendered back to text.
    fn group(&mut self) -> Result<String> {
        let start = self.index;
        self.expect(&Token::LParen)?;
        let mut depth = 1;
        while depth > 0 {
            match self.next_token() {
                Token::LParen => depth += 1,
                Token::RParen => depth -= 1,
                Token::EOF => {
                    return Err(GeneratorError::parse(
                        render_tokens(&self.tokens[start..]),
                        "unbalanced parentheses",
                    ));
                }
                _ => {}
            }
        }
        Ok(render_tokens(&self.tokens[start..self.index]))
    }

    /// Type parameter: length, precision, scale or enum member.
    fn literal(&mut self) -> Result<String> {
        let literal = match self.peek().clone() {
            Token::Number(n, _) => n,
            Token::SingleQuotedString(s) | Token::DoubleQuotedString(s) => quote(&s),
            _ => return Err(self.error("expected a type parameter")),
        };
        self.index += 1;
        Ok(literal)
    }

    fn string_literal(&mut self) -> Result<String> {
        match self.peek().clone() {
            Token::SingleQuotedString(s) | Token::DoubleQuotedString(s) => {
                self.index += 1;
                Ok(s)
            }
            _ => Err(self.error("expected a string literal")),
        }
    }

    fn option_value(&mut self) -> Result<String> {
        let value = match self.peek() {
            Token::Word(w) => w.value.clone(),
            Token::SingleQuotedString(s) | Token::DoubleQuotedString(s) => s.clone(),
            Token::Number(n, _) => n.clone(),
            _ => return Err(self.error("expected an option value")),
        };
        self.index += 1;
        Ok(value)
    }

    fn identifier(&mut self) -> Result<String> {
        match self.peek() {
            Token::Word(w) => {
                let value = w.value.clone();
                self.index += 1;
                Ok(value)
            }
            _ => Err(self.error("expected an identifier")),
        }
    }

    /// `name` or `schema.name`; the last part is kept.
    fn object_name(&mut self) -> Result<String> {
        let mut name = self.identifier()?;
        while self.consume(&Token::Period) {
            name = self.identifier()?;
        }
        Ok(name)
    }

    /// Advances to the next `,` or `)` at the current nesting level.
    fn skip_element(&mut self) {
        let mut depth = 0usize;
        loop {
            match self.peek() {
                Token::EOF => return,
                Token::Comma | Token::RParen if depth == 0 => return,
                Token::LParen => depth += 1,
                Token::RParen => depth -= 1,
                _ => {}
            }
            self.index += 1;
        }
    }

    fn skip_statement(&mut self) {
        loop {
            match self.next_token() {
                Token::SemiColon | Token::EOF => return,
                _ => {}
            }
        }
    }

    fn peek(&self) -> &Token {
        self.peek_nth(0)
    }

    fn peek_nth(&self, n: usize) -> &Token {
        self.tokens.get(self.index + n).unwrap_or(&EOF)
    }

    fn next_token(&mut self) -> Token {
        let token = self.peek().clone();
        if self.index < self.tokens.len() {
            self.index += 1;
        }
        token
    }

    fn peek_keyword(&self, keyword: &str) -> bool {
        is_keyword(self.peek(), keyword)
    }

    fn parse_keyword(&mut self, keyword: &str) -> bool {
        self.parse_keywords(&[keyword])
    }

    /// Consumes all of `keywords` or none of them.
    fn parse_keywords(&mut self, keywords: &[&str]) -> bool {
        let matched = keywords
            .iter()
            .enumerate()
            .all(|(i, keyword)| is_keyword(self.peek_nth(i), keyword));
        if matched {
            self.index += keywords.len();
        }
        matched
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<()> {
        if self.parse_keyword(keyword) {
            Ok(())
        } else {
            Err(self.error(format!("expected {keyword}")))
        }
    }

    fn consume(&mut self, expected: &Token) -> bool {
        if self.peek() == expected {
            self.index += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: &Token) -> Result<()> {
        if self.consume(expected) {
            Ok(())
        } else {
            Err(self.error(format!("expected '{expected}'")))
        }
    }

    fn error(&self, message: impl Into<String>) -> GeneratorError {
        GeneratorError::parse(self.fragment(), message)
    }

    /// The next few tokens, for error messages.
    fn fragment(&self) -> String {
        let end = (self.index + 6).min(self.tokens.len());
        match self.tokens.get(self.index..end) {
            Some(tokens) if !tokens.is_empty() => render_tokens(tokens),
            _ => "end of input".to_owned(),
        }
    }
}

fn is_keyword(token: &Token, keyword: &str) -> bool {
    matches!(token, Token::Word(w) if w.quote_style.is_none() && w.value.eq_ignore_ascii_case(keyword))
}

fn find_column<'a>(columns: &'a mut ColumnList, name: &str) -> Option<&'a mut Column> {
    columns
        .iter_mut()
        .find(|column| column.name.eq_ignore_ascii_case(name))
}

fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

fn render_tokens(tokens: &[Token]) -> String {
    let mut out = String::new();
    let mut prev_atom = false;
    for token in tokens {
        let atom = matches!(
            token,
            Token::Word(_)
                | Token::Number(..)
                | Token::SingleQuotedString(_)
                | Token::DoubleQuotedString(_)
        );
        if atom && prev_atom {
            out.push(' ');
        }
        out.push_str(&token.to_string());
        prev_atom = atom;
    }
    out
}

fn excerpt(sql: &str) -> String {
    let sql = sql.trim();
    match sql.char_indices().nth(40) {
        Some((end, _)) => format!("{}...", &sql[..end]),
        None => sql.to_owned(),
    }
}

/// Finds the table name after `CREATE TABLE` without parsing the statement.
///
/// Works on incomplete or otherwise unparsable text; returns `None` when no
/// `CREATE TABLE <name>` sequence is present.
pub fn extract_table_name(sql: &str) -> Option<String> {
    let lower = sql.to_ascii_lowercase();
    lower
        .match_indices("create")
        .filter(|(at, _)| *at == 0 || !is_ident_byte(lower.as_bytes()[at - 1]))
        .find_map(|(at, keyword)| {
            let mut scanner = Scanner {
                text: sql,
                lower: &lower,
                pos: at + keyword.len(),
            };
            scanner.table_name()
        })
}

struct Scanner<'a> {
    text: &'a str,
    lower: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn table_name(&mut self) -> Option<String> {
        self.keyword("temporary");
        if !self.keyword("table") {
            return None;
        }
        let save = self.pos;
        if !(self.keyword("if") && self.keyword("not") && self.keyword("exists")) {
            self.pos = save;
        }

        let mut name = self.identifier()?;
        while self.text[self.pos..].starts_with('.') {
            self.pos += 1;
            name = self.identifier()?;
        }
        Some(name.to_owned())
    }

    fn skip_whitespace(&mut self) -> bool {
        let rest = &self.text[self.pos..];
        let trimmed = rest.trim_start();
        self.pos += rest.len() - trimmed.len();
        rest.len() != trimmed.len()
    }

    /// A whitespace-preceded, case-insensitive keyword.
    fn keyword(&mut self, keyword: &str) -> bool {
        let save = self.pos;
        if self.skip_whitespace() && self.lower[self.pos..].starts_with(keyword) {
            let end = self.pos + keyword.len();
            if self.lower.as_bytes().get(end).map_or(true, |b| !is_ident_byte(*b)) {
                self.pos = end;
                return true;
            }
        }
        self.pos = save;
        false
    }

    fn identifier(&mut self) -> Option<&'a str> {
        self.skip_whitespace();
        let rest = &self.text[self.pos..];
        let (name, consumed) = match rest.chars().next()? {
            quote @ ('`' | '"') => {
                let close = rest[1..].find(quote)?;
                (&rest[1..1 + close], close + 2)
            }
            _ => {
                let len = rest
                    .bytes()
                    .position(|b| !is_ident_byte(b))
                    .unwrap_or(rest.len());
                (&rest[..len], len)
            }
        };
        if name.is_empty() {
            return None;
        }
        self.pos += consumed;
        Some(name)
    }
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$' || b >= 0x80
}
