//! Recursive descent parser over the token stream.
use super::lexer::{tokenize, SpannedToken, Token};
use super::value::{LuaKey, LuaTable, LuaValue};
use super::ParseError;

/// Parse a whole mission/dictionary file: `name = { ... }`.
///
/// Returns the root variable name (`mission`, `dictionary`, `options`) and
/// the parsed table.
pub fn parse_document(text: &str) -> Result<(String, LuaTable), ParseError> {
    let tokens = tokenize(text)?;
    let mut parser = Parser::new(tokens);

    let name = match parser.next() {
        Some(SpannedToken {
            token: Token::Ident(name),
            ..
        }) => name,
        other => return Err(Parser::unexpected(other.as_ref())),
    };
    parser.expect(&Token::Equals)?;

    let value = parser.parse_value()?;
    parser.expect_end()?;

    match value {
        LuaValue::Table(table) => Ok((name, table)),
        other => Err(ParseError::UnexpectedToken {
            found: format!("{:?}", other),
            line: 1,
            column: 1,
        }),
    }
}

/// Parse a bare value (no leading `name =`). Mostly useful in tests.
pub fn parse_value_text(text: &str) -> Result<LuaValue, ParseError> {
    let tokens = tokenize(text)?;
    let mut parser = Parser::new(tokens);
    let value = parser.parse_value()?;
    parser.expect_end()?;
    Ok(value)
}

struct Parser {
    tokens: Vec<SpannedToken>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<SpannedToken>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> Option<&SpannedToken> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<SpannedToken> {
        let t = self.tokens.get(self.pos).cloned();
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    fn unexpected(spanned: Option<&SpannedToken>) -> ParseError {
        match spanned {
            Some(t) => ParseError::UnexpectedToken {
                found: t.token.describe(),
                line: t.line,
                column: t.column,
            },
            None => ParseError::UnexpectedToken {
                found: "end of input".into(),
                line: 0,
                column: 0,
            },
        }
    }

    fn expect(&mut self, expected: &Token) -> Result<SpannedToken, ParseError> {
        match self.next() {
            Some(t) if &t.token == expected => Ok(t),
            other => Err(Self::unexpected(other.as_ref())),
        }
    }

    fn expect_end(&self) -> Result<(), ParseError> {
        match self.peek() {
            None => Ok(()),
            some => Err(Self::unexpected(some)),
        }
    }

    fn parse_value(&mut self) -> Result<LuaValue, ParseError> {
        match self.next() {
            Some(SpannedToken {
                token: Token::LBrace,
                line,
                column,
            }) => self.parse_table_body(line, column).map(LuaValue::Table),
            Some(SpannedToken {
                token: Token::Str(s),
                ..
            }) => Ok(LuaValue::Str(s)),
            Some(SpannedToken {
                token: Token::Int(n),
                ..
            }) => Ok(LuaValue::Int(n)),
            Some(SpannedToken {
                token: Token::Float(f),
                ..
            }) => Ok(LuaValue::Float(f)),
            Some(SpannedToken {
                token: Token::Bool(b),
                ..
            }) => Ok(LuaValue::Bool(b)),
            other => Err(Self::unexpected(other.as_ref())),
        }
    }

    /// Body of a table after its `{`; `open_*` is the brace position for
    /// the unbalanced-brace report.
    fn parse_table_body(
        &mut self,
        open_line: usize,
        open_column: usize,
    ) -> Result<LuaTable, ParseError> {
        let mut table = LuaTable::new();
        // implicit 1-based index for array-style entries
        let mut next_index: i64 = 1;

        loop {
            match self.peek() {
                None => {
                    return Err(ParseError::UnbalancedBraces {
                        line: open_line,
                        column: open_column,
                    })
                }
                Some(t) if t.token == Token::RBrace => {
                    self.next();
                    return Ok(table);
                }
                _ => {}
            }

            let (key, value) = self.parse_entry(&mut next_index)?;
            table.insert(key, value);

            // entries are comma-separated; a trailing comma before `}` is fine
            match self.peek() {
                Some(t) if t.token == Token::Comma => {
                    self.next();
                }
                Some(t) if t.token == Token::RBrace => {}
                None => {
                    return Err(ParseError::UnbalancedBraces {
                        line: open_line,
                        column: open_column,
                    })
                }
                some => return Err(Self::unexpected(some)),
            }
        }
    }

    fn parse_entry(&mut self, next_index: &mut i64) -> Result<(LuaKey, LuaValue), ParseError> {
        match self.peek() {
            // ["key"] = v  /  [3] = v
            Some(t) if t.token == Token::LBracket => {
                self.next();
                let key = match self.next() {
                    Some(SpannedToken {
                        token: Token::Str(s),
                        ..
                    }) => LuaKey::Str(s),
                    Some(SpannedToken {
                        token: Token::Int(n),
                        ..
                    }) => LuaKey::Int(n),
                    other => return Err(Self::unexpected(other.as_ref())),
                };
                self.expect(&Token::RBracket)?;
                self.expect(&Token::Equals)?;
                Ok((key, self.parse_value()?))
            }
            // name = v
            Some(t) if matches!(t.token, Token::Ident(_)) => {
                let name = match self.next() {
                    Some(SpannedToken {
                        token: Token::Ident(name),
                        ..
                    }) => name,
                    _ => unreachable!(),
                };
                self.expect(&Token::Equals)?;
                Ok((LuaKey::Str(name), self.parse_value()?))
            }
            // bare value: array-style, numbered from 1
            _ => {
                let key = LuaKey::Int(*next_index);
                *next_index += 1;
                Ok((key, self.parse_value()?))
            }
        }
    }
}
