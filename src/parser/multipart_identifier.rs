//! Parser for SQL-style multipart names such as `server.[my catalog].dbo."My Table"`.
//!
//! The parser is a six-state machine driven one character at a time. Each
//! state has its own transition function operating on an explicit
//! [`ParseContext`]:
//!
//! - `Value`: between parts; skips whitespace and decides whether the next
//!   part is quoted.
//! - `ParseNonQuote`: inside an unquoted part.
//! - `LookForNextCharOrSeparator`: whitespace seen inside an unquoted part;
//!   either the part continues (`name with spaces`) or a separator follows.
//! - `ParseQuote`: inside a quoted part.
//! - `RightQuote`: a closing quote was seen; a second one is an escaped quote
//!   character.
//! - `LookForSeparator`: after a closed quote and whitespace; only whitespace
//!   or a separator may follow.

use crate::error::EdmxError;

/// Maximum number of parts in a SQL Server object name.
pub const MAX_PARTS: usize = 4;
pub const SERVER_INDEX: usize = 0;
pub const CATALOG_INDEX: usize = 1;
pub const SCHEMA_INDEX: usize = 2;
pub const TABLE_INDEX: usize = 3;

/// Quoting and separator configuration for a parse.
#[derive(Debug, Clone)]
pub struct MultipartIdentifierOptions {
    /// Characters that open a quoted part. Paired by position with `right_quotes`.
    pub left_quotes: String,
    pub right_quotes: String,
    pub separator: char,
    /// Maximum number of parts accepted.
    pub limit: usize,
    /// Strip the quote characters from quoted parts.
    pub remove_quotes: bool,
    /// Fail on input that contains no part at all.
    pub throw_on_empty: bool,
}

impl Default for MultipartIdentifierOptions {
    fn default() -> Self {
        Self {
            left_quotes: String::new(),
            right_quotes: String::new(),
            separator: '.',
            limit: MAX_PARTS,
            remove_quotes: true,
            throw_on_empty: false,
        }
    }
}

impl MultipartIdentifierOptions {
    /// SQL Server quoting: `[name]` and `"name"`.
    pub fn sql_server() -> Self {
        Self {
            left_quotes: "[\"".to_string(),
            right_quotes: "]\"".to_string(),
            ..Self::default()
        }
    }

    pub fn with_quotes(left: &str, right: &str) -> Self {
        Self {
            left_quotes: left.to_string(),
            right_quotes: right.to_string(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Value,
    ParseNonQuote,
    LookForNextCharOrSeparator,
    ParseQuote,
    RightQuote,
    LookForSeparator,
}

/// Mutable state shared by the transition functions.
struct ParseContext<'a> {
    name: &'a str,
    options: &'a MultipartIdentifierOptions,
    left_quotes: Vec<char>,
    right_quotes: Vec<char>,
    /// Parts completed or in progress, left aligned.
    parts: Vec<Option<String>>,
    /// Index of the part being parsed.
    current: usize,
    buffer: String,
    whitespace: String,
    right_quote: char,
}

impl<'a> ParseContext<'a> {
    fn delimiter_error(&self) -> EdmxError {
        EdmxError::InvalidMultipartNameDelimiterUsage {
            name: self.name.to_string(),
        }
    }

    fn is_left_quote(&self, c: char) -> Option<usize> {
        self.left_quotes.iter().position(|q| *q == c)
    }

    fn is_right_quote(&self, c: char) -> bool {
        self.right_quotes.contains(&c)
    }

    fn store_current(&mut self, value: String) {
        self.parts[self.current] = Some(value);
    }

    /// Move to the next part, failing once the limit is exceeded.
    fn advance_part(&mut self) -> Result<(), EdmxError> {
        self.current += 1;
        if self.current >= self.options.limit {
            return Err(EdmxError::InvalidMultipartNameTooManyParts {
                name: self.name.to_string(),
                limit: self.options.limit,
            });
        }
        Ok(())
    }
}

fn on_value(ctx: &mut ParseContext<'_>, c: char) -> Result<State, EdmxError> {
    if c.is_whitespace() {
        return Ok(State::Value);
    }
    if c == ctx.options.separator {
        ctx.store_current(String::new());
        ctx.advance_part()?;
        return Ok(State::Value);
    }
    if let Some(quote_index) = ctx.is_left_quote(c) {
        ctx.right_quote = ctx.right_quotes[quote_index];
        ctx.buffer.clear();
        if !ctx.options.remove_quotes {
            ctx.buffer.push(c);
        }
        return Ok(State::ParseQuote);
    }
    if ctx.is_right_quote(c) {
        return Err(ctx.delimiter_error());
    }
    ctx.buffer.clear();
    ctx.buffer.push(c);
    Ok(State::ParseNonQuote)
}

fn on_parse_non_quote(ctx: &mut ParseContext<'_>, c: char) -> Result<State, EdmxError> {
    if c == ctx.options.separator {
        let value = std::mem::take(&mut ctx.buffer);
        ctx.store_current(value);
        ctx.advance_part()?;
        return Ok(State::Value);
    }
    if ctx.is_right_quote(c) || ctx.is_left_quote(c).is_some() {
        return Err(ctx.delimiter_error());
    }
    if c.is_whitespace() {
        let value = ctx.buffer.clone();
        ctx.store_current(value);
        ctx.whitespace.clear();
        ctx.whitespace.push(c);
        return Ok(State::LookForNextCharOrSeparator);
    }
    ctx.buffer.push(c);
    Ok(State::ParseNonQuote)
}

fn on_look_for_next_char_or_separator(
    ctx: &mut ParseContext<'_>,
    c: char,
) -> Result<State, EdmxError> {
    if c.is_whitespace() {
        ctx.whitespace.push(c);
        return Ok(State::LookForNextCharOrSeparator);
    }
    if c == ctx.options.separator {
        ctx.advance_part()?;
        return Ok(State::Value);
    }
    if ctx.is_right_quote(c) || ctx.is_left_quote(c).is_some() {
        return Err(ctx.delimiter_error());
    }
    let whitespace = std::mem::take(&mut ctx.whitespace);
    ctx.buffer.push_str(&whitespace);
    ctx.buffer.push(c);
    let value = ctx.buffer.clone();
    ctx.store_current(value);
    Ok(State::ParseNonQuote)
}

fn on_parse_quote(ctx: &mut ParseContext<'_>, c: char) -> Result<State, EdmxError> {
    if c == ctx.right_quote {
        if !ctx.options.remove_quotes {
            ctx.buffer.push(c);
        }
        return Ok(State::RightQuote);
    }
    ctx.buffer.push(c);
    Ok(State::ParseQuote)
}

fn on_right_quote(ctx: &mut ParseContext<'_>, c: char) -> Result<State, EdmxError> {
    if c == ctx.right_quote {
        // Doubled closing quote: a literal quote character inside the part.
        ctx.buffer.push(c);
        return Ok(State::ParseQuote);
    }
    if c == ctx.options.separator {
        let value = std::mem::take(&mut ctx.buffer);
        ctx.store_current(value);
        ctx.advance_part()?;
        return Ok(State::Value);
    }
    if !c.is_whitespace() {
        return Err(ctx.delimiter_error());
    }
    let value = ctx.buffer.clone();
    ctx.store_current(value);
    Ok(State::LookForSeparator)
}

fn on_look_for_separator(ctx: &mut ParseContext<'_>, c: char) -> Result<State, EdmxError> {
    if c.is_whitespace() {
        return Ok(State::LookForSeparator);
    }
    if c == ctx.options.separator {
        ctx.advance_part()?;
        return Ok(State::Value);
    }
    Err(ctx.delimiter_error())
}

/// Split `name` into its parts, in the order they appear.
///
/// A separator with nothing before it yields an empty part, so positions are
/// preserved: `".foo"` parses to `["", "foo"]` and `"a."` to `["a", ""]`.
/// Empty or whitespace-only input yields no parts (or an error when
/// `throw_on_empty` is set).
pub fn parse_multipart_identifier(
    name: &str,
    options: &MultipartIdentifierOptions,
) -> Result<Vec<String>, EdmxError> {
    let left_quotes: Vec<char> = options.left_quotes.chars().collect();
    let right_quotes: Vec<char> = options.right_quotes.chars().collect();
    if options.limit == 0
        || left_quotes.len() != right_quotes.len()
        || left_quotes.contains(&options.separator)
        || right_quotes.contains(&options.separator)
    {
        return Err(EdmxError::InvalidMultipartNameDelimiterUsage {
            name: name.to_string(),
        });
    }

    let mut ctx = ParseContext {
        name,
        options,
        left_quotes,
        right_quotes,
        parts: vec![None; options.limit],
        current: 0,
        buffer: String::with_capacity(name.len()),
        whitespace: String::new(),
        right_quote: ' ',
    };

    let mut state = State::Value;
    for c in name.chars() {
        state = match state {
            State::Value => on_value(&mut ctx, c)?,
            State::ParseNonQuote => on_parse_non_quote(&mut ctx, c)?,
            State::LookForNextCharOrSeparator => on_look_for_next_char_or_separator(&mut ctx, c)?,
            State::ParseQuote => on_parse_quote(&mut ctx, c)?,
            State::RightQuote => on_right_quote(&mut ctx, c)?,
            State::LookForSeparator => on_look_for_separator(&mut ctx, c)?,
        };
    }

    match state {
        State::Value => {
            // Trailing separator: the part after it is present but empty.
            if ctx.current > 0 {
                ctx.store_current(String::new());
            }
        }
        State::LookForSeparator | State::LookForNextCharOrSeparator => {}
        State::ParseNonQuote | State::RightQuote => {
            let value = std::mem::take(&mut ctx.buffer);
            ctx.store_current(value);
        }
        State::ParseQuote => return Err(ctx.delimiter_error()),
    }

    let parts: Vec<String> = ctx.parts.into_iter().map_while(|p| p).collect();
    if parts.is_empty() && options.throw_on_empty {
        return Err(EdmxError::InvalidMultipartName {
            name: name.to_string(),
        });
    }
    Ok(parts)
}

/// A parsed object name with the server/catalog/schema/table slots filled
/// right to left, so `dbo.Customers` has a schema and a table but no server
/// or catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultipartName {
    slots: [Option<String>; MAX_PARTS],
}

impl MultipartName {
    /// Parse with SQL Server quoting (`[]` and `""`).
    pub fn parse(name: &str) -> Result<Self, EdmxError> {
        let parts = parse_multipart_identifier(name, &MultipartIdentifierOptions::sql_server())?;
        Ok(Self::from_parts(parts))
    }

    /// Right-align up to four parts into the named slots. Extra leading parts
    /// are dropped.
    pub fn from_parts(parts: Vec<String>) -> Self {
        let mut slots: [Option<String>; MAX_PARTS] = Default::default();
        let skip = parts.len().saturating_sub(MAX_PARTS);
        let offset = MAX_PARTS - (parts.len() - skip);
        for (i, part) in parts.into_iter().skip(skip).enumerate() {
            slots[offset + i] = Some(part);
        }
        Self { slots }
    }

    pub fn slot(&self, index: usize) -> Option<&str> {
        self.slots.get(index).and_then(|s| s.as_deref())
    }

    pub fn server(&self) -> Option<&str> {
        self.slot(SERVER_INDEX)
    }

    pub fn catalog(&self) -> Option<&str> {
        self.slot(CATALOG_INDEX)
    }

    pub fn schema(&self) -> Option<&str> {
        self.slot(SCHEMA_INDEX)
    }

    pub fn table(&self) -> Option<&str> {
        self.slot(TABLE_INDEX)
    }
}
