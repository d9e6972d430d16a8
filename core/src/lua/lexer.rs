//! Tokenizer for the Lua literal-table subset found in mission archives.
use super::ParseError;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Equals,
    Comma,
    Ident(String),
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl Token {
    /// Short rendering for error messages.
    pub fn describe(&self) -> String {
        match self {
            Token::LBrace => "{".into(),
            Token::RBrace => "}".into(),
            Token::LBracket => "[".into(),
            Token::RBracket => "]".into(),
            Token::Equals => "=".into(),
            Token::Comma => ",".into(),
            Token::Ident(s) => s.clone(),
            Token::Str(s) => format!("\"{}\"", s),
            Token::Int(n) => n.to_string(),
            Token::Float(f) => f.to_string(),
            Token::Bool(b) => b.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    pub token: Token,
    pub line: usize,
    pub column: usize,
}

pub fn tokenize(text: &str) -> Result<Vec<SpannedToken>, ParseError> {
    Lexer::new(text).run()
}

struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
}

impl Lexer {
    fn new(text: &str) -> Self {
        Self {
            chars: text.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn run(mut self) -> Result<Vec<SpannedToken>, ParseError> {
        let mut tokens = Vec::new();

        while let Some(c) = self.peek() {
            let (line, column) = (self.line, self.column);

            if c.is_whitespace() {
                self.bump();
                continue;
            }

            // comments: -- to end of line, or --[[ ... ]]
            if c == '-' && self.peek_at(1) == Some('-') {
                self.bump();
                self.bump();
                if self.peek() == Some('[') && self.peek_at(1) == Some('[') {
                    self.bump();
                    self.bump();
                    self.skip_until_long_close();
                } else {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                continue;
            }

            let token = match c {
                '{' => {
                    self.bump();
                    Token::LBrace
                }
                '}' => {
                    self.bump();
                    Token::RBrace
                }
                '[' => {
                    if self.peek_at(1) == Some('[') {
                        self.bump();
                        self.bump();
                        Token::Str(self.read_long_string(line, column)?)
                    } else {
                        self.bump();
                        Token::LBracket
                    }
                }
                ']' => {
                    self.bump();
                    Token::RBracket
                }
                '=' => {
                    self.bump();
                    Token::Equals
                }
                ',' => {
                    self.bump();
                    Token::Comma
                }
                '"' | '\'' => self.read_quoted_string(line, column)?,
                c if c == '-' || c.is_ascii_digit() => self.read_number(line, column)?,
                c if c.is_ascii_alphabetic() || c == '_' => self.read_ident(),
                other => {
                    return Err(ParseError::UnexpectedToken {
                        found: other.to_string(),
                        line,
                        column,
                    })
                }
            };

            tokens.push(SpannedToken {
                token,
                line,
                column,
            });
        }

        Ok(tokens)
    }

    fn skip_until_long_close(&mut self) {
        while self.peek().is_some() {
            if self.peek() == Some(']') && self.peek_at(1) == Some(']') {
                self.bump();
                self.bump();
                return;
            }
            self.bump();
        }
    }

    /// `[[ ... ]]` long string; embedded newlines are kept literally.
    fn read_long_string(&mut self, line: usize, column: usize) -> Result<String, ParseError> {
        let mut out = String::new();
        loop {
            if self.peek().is_none() {
                return Err(ParseError::UnterminatedString { line, column });
            }
            if self.peek() == Some(']') && self.peek_at(1) == Some(']') {
                self.bump();
                self.bump();
                return Ok(out);
            }
            out.push(self.bump().unwrap());
        }
    }

    fn read_quoted_string(&mut self, line: usize, column: usize) -> Result<Token, ParseError> {
        let quote = self.bump().unwrap();
        let mut out = String::new();

        loop {
            let c = match self.bump() {
                Some(c) => c,
                None => return Err(ParseError::UnterminatedString { line, column }),
            };

            if c == quote {
                return Ok(Token::Str(out));
            }

            if c != '\\' {
                out.push(c);
                continue;
            }

            let escaped = match self.bump() {
                Some(c) => c,
                None => return Err(ParseError::UnterminatedString { line, column }),
            };
            match escaped {
                'n' => out.push('\n'),
                't' => out.push('\t'),
                'r' => out.push('\r'),
                '\\' => out.push('\\'),
                '"' => out.push('"'),
                '\'' => out.push('\''),
                // decimal escape \ddd (up to three digits)
                d if d.is_ascii_digit() => {
                    let mut code = d.to_digit(10).unwrap();
                    for _ in 0..2 {
                        match self.peek() {
                            Some(n) if n.is_ascii_digit() => {
                                code = code * 10 + n.to_digit(10).unwrap();
                                self.bump();
                            }
                            _ => break,
                        }
                    }
                    if let Some(c) = char::from_u32(code) {
                        out.push(c);
                    }
                }
                // unknown escape: keep the character as-is
                other => out.push(other),
            }
        }
    }

    fn read_number(&mut self, line: usize, column: usize) -> Result<Token, ParseError> {
        let mut raw = String::new();
        if self.peek() == Some('-') {
            raw.push(self.bump().unwrap());
        }
        let mut is_float = false;
        while let Some(c) = self.peek() {
            match c {
                '0'..='9' => raw.push(self.bump().unwrap()),
                '.' => {
                    is_float = true;
                    raw.push(self.bump().unwrap());
                }
                'e' | 'E' => {
                    is_float = true;
                    raw.push(self.bump().unwrap());
                    if matches!(self.peek(), Some('+') | Some('-')) {
                        raw.push(self.bump().unwrap());
                    }
                }
                _ => break,
            }
        }

        if !is_float {
            if let Ok(n) = raw.parse::<i64>() {
                return Ok(Token::Int(n));
            }
        }
        raw.parse::<f64>()
            .map(Token::Float)
            .map_err(|_| ParseError::UnexpectedToken {
                found: raw,
                line,
                column,
            })
    }

    fn read_ident(&mut self) -> Token {
        let mut out = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                out.push(self.bump().unwrap());
            } else {
                break;
            }
        }
        match out.as_str() {
            "true" => Token::Bool(true),
            "false" => Token::Bool(false),
            _ => Token::Ident(out),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_basic_entry() {
        let tokens = tokenize(r#"["key"] = "value","#).unwrap();
        let kinds: Vec<_> = tokens.into_iter().map(|t| t.token).collect();
        assert_eq!(
            kinds,
            vec![
                Token::LBracket,
                Token::Str("key".into()),
                Token::RBracket,
                Token::Equals,
                Token::Str("value".into()),
                Token::Comma,
            ]
        );
    }

    #[test]
    fn test_escapes_decoded() {
        let tokens = tokenize(r#""line1\nline2 \"quoted\" \t tab \065""#).unwrap();
        assert_eq!(
            tokens[0].token,
            Token::Str("line1\nline2 \"quoted\" \t tab A".into())
        );
    }

    #[test]
    fn test_comments_skipped() {
        let tokens = tokenize(
            "-- line comment with \"string\"\n{ --[[ block\ncomment ]] }",
        )
        .unwrap();
        let kinds: Vec<_> = tokens.into_iter().map(|t| t.token).collect();
        assert_eq!(kinds, vec![Token::LBrace, Token::RBrace]);
    }

    #[test]
    fn test_long_string_keeps_newlines() {
        let tokens = tokenize("[[first\nsecond]]").unwrap();
        assert_eq!(tokens[0].token, Token::Str("first\nsecond".into()));
    }

    #[test]
    fn test_numbers() {
        let tokens = tokenize("42 -17 3.5 1e3").unwrap();
        let kinds: Vec<_> = tokens.into_iter().map(|t| t.token).collect();
        assert_eq!(
            kinds,
            vec![
                Token::Int(42),
                Token::Int(-17),
                Token::Float(3.5),
                Token::Float(1000.0),
            ]
        );
    }

    #[test]
    fn test_unterminated_string_reports_position() {
        let err = tokenize("{\n  [\"key\"] = \"broken").unwrap_err();
        assert_eq!(
            err,
            ParseError::UnterminatedString { line: 2, column: 13 }
        );
    }
}
