use super::{ParseError, RawNode};

type ParseResult<T> = Result<T, ParseError>;

/// Deepest element nesting accepted below the root.
const MAX_DEPTH: usize = 256;

/// Parse layout markup into its root element.
///
/// Accepts an optional `<?xml ...?>` prolog, comments, processing
/// instructions and CDATA sections. Whitespace-only text is dropped.
pub fn parse(source: &str) -> ParseResult<RawNode> {
    let mut cursor = Cursor::new(source);
    cursor.eat("\u{feff}");
    cursor.skip_misc()?;

    if cursor.at_end() {
        return Err(cursor.error("document has no root element"));
    }
    if !cursor.starts_with("<") || cursor.starts_with("</") {
        return Err(cursor.error("expected the root element"));
    }

    let root = cursor.parse_element()?;
    cursor.skip_misc()?;
    if !cursor.at_end() {
        return Err(cursor.error("unexpected content after the root element"));
    }
    Ok(root)
}

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == ':'
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | ':')
}

fn is_xml_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

/// The XML `Char` production.
fn is_xml_char(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}'
    )
}

/// Character cursor tracking 1-based line/column.
struct Cursor<'a> {
    input: &'a str,
    pos: usize,
    line: usize,
    column: usize,
    depth: usize,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0, line: 1, column: 1, depth: 0 }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn starts_with(&self, s: &str) -> bool {
        self.input[self.pos..].starts_with(s)
    }

    fn eat(&mut self, s: &str) -> bool {
        if !self.starts_with(s) {
            return false;
        }
        for _ in s.chars() {
            self.bump();
        }
        true
    }

    fn expect(&mut self, s: &str) -> ParseResult<()> {
        if self.eat(s) {
            return Ok(());
        }
        match self.peek() {
            Some(c) => Err(self.error(format!("expected '{s}', found '{c}'"))),
            None => Err(self.error(format!("unexpected end of input, expected '{s}'"))),
        }
    }

    /// Returns true if anything was skipped.
    fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if is_xml_whitespace(c)) {
            self.bump();
        }
        self.pos != start
    }

    fn position(&self) -> (usize, usize) {
        (self.line, self.column)
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(self.line, self.column, message)
    }

    /// Skip whitespace, comments and processing instructions between elements.
    fn skip_misc(&mut self) -> ParseResult<()> {
        loop {
            self.skip_whitespace();
            if self.starts_with("<!--") {
                self.eat("<!--");
                self.skip_until("-->", "comment")?;
            } else if self.starts_with("<?") {
                self.eat("<?");
                self.skip_until("?>", "processing instruction")?;
            } else {
                return Ok(());
            }
        }
    }

    fn skip_until(&mut self, terminator: &str, what: &str) -> ParseResult<()> {
        let (line, column) = self.position();
        while !self.at_end() {
            if self.eat(terminator) {
                return Ok(());
            }
            self.bump();
        }
        Err(ParseError::new(line, column, format!("unterminated {what}")))
    }

    fn parse_name(&mut self, what: &str) -> ParseResult<String> {
        match self.peek() {
            Some(c) if is_name_start(c) => {}
            Some(c) => return Err(self.error(format!("invalid character '{c}' at start of {what}"))),
            None => return Err(self.error(format!("unexpected end of input, expected {what}"))),
        }
        let input = self.input;
        let start = self.pos;
        while matches!(self.peek(), Some(c) if is_name_char(c)) {
            self.bump();
        }
        Ok(input[start..self.pos].to_string())
    }

    fn parse_element(&mut self) -> ParseResult<RawNode> {
        let (line, column) = self.position();
        self.expect("<")?;
        let tag = self.parse_name("tag name")?;
        let mut node = RawNode::new(tag.clone());
        node.line = line;

        loop {
            let separated = self.skip_whitespace();
            match self.peek() {
                Some('/') => {
                    self.expect("/>")?;
                    return Ok(node);
                }
                Some('>') => {
                    self.bump();
                    break;
                }
                Some(c) if separated && is_name_start(c) => self.parse_attribute(&mut node)?,
                Some(c) => return Err(self.error(format!("invalid character '{c}' in <{tag}>"))),
                None => {
                    return Err(ParseError::new(
                        line,
                        column,
                        format!("unterminated start tag <{tag}>"),
                    ))
                }
            }
        }

        self.parse_content(&mut node, line, column)?;
        Ok(node)
    }

    fn parse_attribute(&mut self, node: &mut RawNode) -> ParseResult<()> {
        let (line, column) = self.position();
        let name = self.parse_name("attribute name")?;
        self.skip_whitespace();
        match self.peek() {
            Some('=') => {
                self.bump();
            }
            Some(c) => {
                return Err(self.error(format!(
                    "invalid character '{c}' after attribute '{name}', expected '='"
                )))
            }
            None => return Err(self.error("unexpected end of input inside a start tag")),
        }
        self.skip_whitespace();
        let value = self.parse_quoted(&name)?;

        if node.attributes.contains_key(&name) {
            return Err(ParseError::new(
                line,
                column,
                format!("duplicate attribute '{name}' on <{}>", node.tag),
            ));
        }
        node.attributes.insert(name, value);
        Ok(())
    }

    fn parse_quoted(&mut self, attribute: &str) -> ParseResult<String> {
        let quote = match self.peek() {
            Some(q @ ('"' | '\'')) => q,
            _ => {
                return Err(
                    self.error(format!("expected a quoted value for attribute '{attribute}'"))
                )
            }
        };
        let (line, column) = self.position();
        self.bump();

        let mut value = String::new();
        loop {
            match self.peek() {
                None => {
                    return Err(ParseError::new(
                        line,
                        column,
                        format!("unterminated value for attribute '{attribute}'"),
                    ))
                }
                Some(c) if c == quote => {
                    self.bump();
                    return Ok(value);
                }
                Some('<') => return Err(self.error("'<' is not allowed in attribute values")),
                Some('&') => value.push(self.parse_entity()?),
                Some(c) => {
                    self.bump();
                    value.push(c);
                }
            }
        }
    }

    fn parse_entity(&mut self) -> ParseResult<char> {
        let (line, column) = self.position();
        self.bump();

        let input = self.input;
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == '#') {
            self.bump();
        }
        let name = &input[start..self.pos];
        if !self.eat(";") {
            return Err(ParseError::new(line, column, "unterminated entity reference"));
        }

        let resolved = match name {
            "lt" => Some('<'),
            "gt" => Some('>'),
            "amp" => Some('&'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            _ => {
                let code = if let Some(hex) =
                    name.strip_prefix("#x").or_else(|| name.strip_prefix("#X"))
                {
                    u32::from_str_radix(hex, 16).ok()
                } else if let Some(dec) = name.strip_prefix('#') {
                    dec.parse::<u32>().ok()
                } else {
                    None
                };
                match code.and_then(char::from_u32) {
                    Some(c) if !is_xml_char(c) => {
                        return Err(ParseError::new(
                            line,
                            column,
                            format!("character reference '&{name};' is not an allowed character"),
                        ))
                    }
                    other => other,
                }
            }
        };
        resolved.ok_or_else(|| ParseError::new(line, column, format!("unknown entity '&{name};'")))
    }

    fn parse_content(&mut self, node: &mut RawNode, line: usize, column: usize) -> ParseResult<()> {
        let mut text = String::new();
        loop {
            if self.at_end() {
                return Err(ParseError::new(
                    line,
                    column,
                    format!("unterminated element <{}>", node.tag),
                ));
            }

            if self.starts_with("</") {
                let (close_line, close_column) = self.position();
                self.eat("</");
                let closing = self.parse_name("closing tag name")?;
                self.skip_whitespace();
                self.expect(">")?;
                if closing != node.tag {
                    return Err(ParseError::new(
                        close_line,
                        close_column,
                        format!("mismatched closing tag </{closing}>, expected </{}>", node.tag),
                    ));
                }
                break;
            } else if self.starts_with("<!--") {
                self.eat("<!--");
                self.skip_until("-->", "comment")?;
            } else if self.starts_with("<![CDATA[") {
                self.read_cdata(&mut text)?;
            } else if self.starts_with("<?") {
                self.eat("<?");
                self.skip_until("?>", "processing instruction")?;
            } else if self.starts_with("<") {
                if self.depth >= MAX_DEPTH {
                    return Err(self.error("element nesting too deep"));
                }
                self.depth += 1;
                let child = self.parse_element()?;
                self.depth -= 1;
                node.children.push(child);
            } else if self.starts_with("&") {
                text.push(self.parse_entity()?);
            } else if let Some(c) = self.bump() {
                text.push(c);
            }
        }

        let trimmed = text.trim();
        if !trimmed.is_empty() {
            node.text = trimmed.to_string();
        }
        Ok(())
    }

    fn read_cdata(&mut self, text: &mut String) -> ParseResult<()> {
        let (line, column) = self.position();
        self.eat("<![CDATA[");
        let input = self.input;
        let start = self.pos;
        while !self.at_end() {
            if self.starts_with("]]>") {
                text.push_str(&input[start..self.pos]);
                self.eat("]]>");
                return Ok(());
            }
            self.bump();
        }
        Err(ParseError::new(line, column, "unterminated CDATA section"))
    }
}
