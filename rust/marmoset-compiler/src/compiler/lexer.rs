//! Hand-written lexer for Marmoset source code.
//!
//! Tokens carry their line/column so the parser and the CLI can point at
//! the offending source. Two rules need one token of lookbehind: `/` is
//! division only after `]`, `)`, an identifier, or a numeric literal
//! (otherwise it opens a regexp), and `++`/`--` bind to the identifier
//! that was just read.

use crate::compiler::tokens::{lookup_keyword, Span, Token, TokenKind};

/// Dotted names that lex as a single identifier.
const DOTTED_BUILTINS: &[&str] = &[
    "directory.glob",
    "math.abs",
    "math.random",
    "math.sqrt",
    "os.environment",
    "os.getenv",
    "os.setenv",
    "string.interpolate",
];

/// Prefixes whose dotted names are method definitions on a kind, and so
/// also lex as one identifier.
const TYPE_PREFIXES: &[&str] = &[
    "string.", "array.", "integer.", "float.", "hash.", "object.",
];

pub struct Lexer {
    source: Vec<char>,
    /// Index of the current character
    pos: usize,
    /// Index of the next character to load
    read_pos: usize,
    /// The current character, '\0' at end of input
    ch: char,
    line: usize,
    col: usize,
    /// Start offset of each line, grown only when a newline is consumed
    line_starts: Vec<usize>,
    /// Kind of the previous token, for regexp/division disambiguation
    prev_kind: TokenKind,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        let mut lexer = Self {
            source: source.chars().collect(),
            pos: 0,
            read_pos: 0,
            ch: '\0',
            line: 1,
            col: 0,
            line_starts: vec![0],
            prev_kind: TokenKind::Eof,
        };
        lexer.read_char();
        lexer
    }

    /// 1-based line of the current character.
    pub fn current_line(&self) -> usize {
        self.line
    }

    /// 1-based column of the current character.
    pub fn current_column(&self) -> usize {
        self.col
    }

    /// The text of the given 1-based source line, without its newline.
    /// Used by error reporting to show the offending line.
    pub fn line_text(&self, line: usize) -> String {
        if line == 0 || line > self.line_starts.len() {
            return String::new();
        }
        let begin = self.line_starts[line - 1];
        let end = self
            .line_starts
            .get(line)
            .copied()
            .unwrap_or(self.source.len());
        let text: String = self.source[begin..end].iter().collect();
        text.trim_end_matches('\n').to_string()
    }

    fn read_char(&mut self) {
        if self.ch == '\n' {
            self.line += 1;
            self.col = 0;
            // Record the line start exactly once, as we leave the newline.
            self.line_starts.push(self.read_pos);
        }
        self.pos = self.read_pos;
        self.ch = self.source.get(self.read_pos).copied().unwrap_or('\0');
        if self.read_pos < self.source.len() {
            self.read_pos += 1;
        }
        self.col += 1;
    }

    fn peek_char(&self) -> char {
        self.source.get(self.read_pos).copied().unwrap_or('\0')
    }

    fn span_here(&self) -> Span {
        Span::new(self.line, self.col)
    }

    pub fn next_token(&mut self) -> Token {
        let tok = self.scan_token();
        self.prev_kind = tok.kind;
        tok
    }

    fn scan_token(&mut self) -> Token {
        loop {
            self.skip_whitespace();
            if self.ch == '#' || (self.ch == '/' && self.peek_char() == '/') {
                self.skip_line_comment();
            } else if self.ch == '/' && self.peek_char() == '*' {
                self.skip_multiline_comment();
            } else {
                break;
            }
        }

        let span = self.span_here();
        let two = |l: &mut Lexer, kind| {
            let lit: String = [l.ch, l.peek_char()].iter().collect();
            l.read_char();
            l.read_char();
            Token::new(kind, lit, span)
        };
        let one = |l: &mut Lexer, kind| {
            let lit = l.ch.to_string();
            l.read_char();
            Token::new(kind, lit, span)
        };

        match self.ch {
            '&' if self.peek_char() == '&' => two(self, TokenKind::And),
            '|' if self.peek_char() == '|' => two(self, TokenKind::Or),
            '=' if self.peek_char() == '=' => two(self, TokenKind::Eq),
            '=' => one(self, TokenKind::Assign),
            ';' => one(self, TokenKind::Semicolon),
            '?' => one(self, TokenKind::Question),
            '(' => one(self, TokenKind::LParen),
            ')' => one(self, TokenKind::RParen),
            ',' => one(self, TokenKind::Comma),
            '.' if self.peek_char() == '.' => two(self, TokenKind::DotDot),
            '.' => one(self, TokenKind::Period),
            '+' if self.peek_char() == '+' => two(self, TokenKind::PlusPlus),
            '+' if self.peek_char() == '=' => two(self, TokenKind::PlusEq),
            '+' => one(self, TokenKind::Plus),
            '%' => one(self, TokenKind::Mod),
            '{' => one(self, TokenKind::LBrace),
            '}' => one(self, TokenKind::RBrace),
            '-' if self.peek_char() == '-' => two(self, TokenKind::MinusMinus),
            '-' if self.peek_char() == '=' => two(self, TokenKind::MinusEq),
            '-' => one(self, TokenKind::Minus),
            '/' if self.peek_char() == '=' => two(self, TokenKind::SlashEq),
            '/' => {
                // Division only after a value-like token; a regexp otherwise.
                if matches!(
                    self.prev_kind,
                    TokenKind::RBracket
                        | TokenKind::RParen
                        | TokenKind::Ident
                        | TokenKind::Int
                        | TokenKind::Float
                ) {
                    one(self, TokenKind::Slash)
                } else {
                    self.read_regexp(span)
                }
            }
            '*' if self.peek_char() == '*' => two(self, TokenKind::Pow),
            '*' if self.peek_char() == '=' => two(self, TokenKind::StarEq),
            '*' => one(self, TokenKind::Star),
            '<' if self.peek_char() == '=' => two(self, TokenKind::LtEq),
            '<' => one(self, TokenKind::Lt),
            '>' if self.peek_char() == '=' => two(self, TokenKind::GtEq),
            '>' => one(self, TokenKind::Gt),
            '~' if self.peek_char() == '=' => two(self, TokenKind::Contains),
            '!' if self.peek_char() == '=' => two(self, TokenKind::NotEq),
            '!' if self.peek_char() == '~' => two(self, TokenKind::NotContains),
            '!' => one(self, TokenKind::Bang),
            '"' => self.read_string(span),
            '`' => self.read_backtick(span),
            '[' => one(self, TokenKind::LBracket),
            ']' => one(self, TokenKind::RBracket),
            ':' => one(self, TokenKind::Colon),
            '\0' => Token::eof(span),
            c if c.is_ascii_digit() => self.read_decimal(span),
            c if is_identifier_start(c) => {
                let literal = self.read_identifier();
                let kind = lookup_keyword(&literal);
                Token::new(kind, literal, span)
            }
            c => one_illegal(self, c, span),
        }
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.ch, ' ' | '\t' | '\n' | '\r') {
            self.read_char();
        }
    }

    fn skip_line_comment(&mut self) {
        while self.ch != '\n' && self.ch != '\0' {
            self.read_char();
        }
    }

    /// Multi-line comments do not nest: scanning ends at the first `*/`.
    fn skip_multiline_comment(&mut self) {
        loop {
            if self.ch == '\0' {
                break;
            }
            if self.ch == '*' && self.peek_char() == '/' {
                self.read_char();
                self.read_char();
                break;
            }
            self.read_char();
        }
    }

    /// Read an identifier, including any dots.
    ///
    /// Dotted names are only admitted when they are a known qualified
    /// built-in or carry one of the kind prefixes (`string.`, `hash.`,
    /// ...). Anything else rewinds to the first dot, so `a.blah()` lexes
    /// as `a`, `.`, `blah` while `math.sqrt` stays one identifier.
    fn read_identifier(&mut self) -> String {
        let saved = (self.pos, self.read_pos, self.ch, self.line, self.col);

        let mut id = String::new();
        while is_identifier_char(self.ch) {
            id.push(self.ch);
            self.read_char();
        }

        if let Some(offset) = id.find('.') {
            let allowed = DOTTED_BUILTINS.contains(&id.as_str())
                || TYPE_PREFIXES.iter().any(|p| id.starts_with(p));
            if !allowed {
                id.truncate(offset);
                (self.pos, self.read_pos, self.ch, self.line, self.col) = saved;
                for _ in 0..offset {
                    self.read_char();
                }
            }
        }

        id
    }

    /// Read the digits of a number. A leading `0x` switches to
    /// hexadecimal, a leading `0b` to binary; the prefix is kept in the
    /// literal and decoded by the parser.
    fn read_number(&mut self) -> String {
        let accept: &str = if self.ch == '0' && self.peek_char() == 'x' {
            "0x123456789abcdefABCDEF"
        } else if self.ch == '0' && self.peek_char() == 'b' {
            "b01"
        } else {
            "0123456789"
        };

        let mut out = String::new();
        while self.ch != '\0' && accept.contains(self.ch) {
            out.push(self.ch);
            self.read_char();
        }
        out
    }

    /// Read an integer or float. `3.14` becomes one Float token, but
    /// `3.methods()` leaves the dot alone so method calls work on bare
    /// numbers.
    fn read_decimal(&mut self, span: Span) -> Token {
        let integer = self.read_number();
        if self.ch == '.' && self.peek_char().is_ascii_digit() {
            self.read_char();
            let fraction = self.read_number();
            return Token::new(TokenKind::Float, format!("{}.{}", integer, fraction), span);
        }
        Token::new(TokenKind::Int, integer, span)
    }

    /// Read a double-quoted string, decoding `\n`, `\r`, `\t`, `\"` and
    /// `\\`. An unknown escape drops the backslash and keeps the
    /// character.
    fn read_string(&mut self, span: Span) -> Token {
        let mut out = String::new();
        loop {
            self.read_char();
            match self.ch {
                '\0' => return Token::new(TokenKind::Illegal, "unterminated string", span),
                '"' => break,
                '\\' => {
                    self.read_char();
                    match self.ch {
                        '\0' => {
                            return Token::new(TokenKind::Illegal, "unterminated string", span)
                        }
                        'n' => out.push('\n'),
                        'r' => out.push('\r'),
                        't' => out.push('\t'),
                        c => out.push(c),
                    }
                }
                c => out.push(c),
            }
        }
        self.read_char();
        Token::new(TokenKind::String, out, span)
    }

    /// Read a backtick command literal, taken verbatim.
    fn read_backtick(&mut self, span: Span) -> Token {
        let mut out = String::new();
        loop {
            self.read_char();
            match self.ch {
                '\0' => return Token::new(TokenKind::Illegal, "unterminated backtick", span),
                '`' => break,
                c => out.push(c),
            }
        }
        self.read_char();
        Token::new(TokenKind::Backtick, out, span)
    }

    /// Read a `/pattern/flags` regexp. Flags come from `{i, m}` and are
    /// de-duplicated and sorted; when present the literal becomes
    /// `(?flags)pattern`. Hitting end of input yields the diagnostic
    /// literal that the parser reports as a parse error.
    fn read_regexp(&mut self, span: Span) -> Token {
        let mut pattern = String::new();
        loop {
            self.read_char();
            match self.ch {
                '\0' => {
                    return Token::new(
                        TokenKind::Regexp,
                        "unterminated regular expression",
                        span,
                    )
                }
                '/' => {
                    self.read_char();
                    let mut flags: Vec<char> = Vec::new();
                    while matches!(self.ch, 'i' | 'm') {
                        if !flags.contains(&self.ch) {
                            flags.push(self.ch);
                        }
                        self.read_char();
                    }
                    flags.sort_unstable();
                    let literal = if flags.is_empty() {
                        pattern
                    } else {
                        let flags: String = flags.into_iter().collect();
                        format!("(?{}){}", flags, pattern)
                    };
                    return Token::new(TokenKind::Regexp, literal, span);
                }
                c => pattern.push(c),
            }
        }
    }
}

fn one_illegal(l: &mut Lexer, c: char, span: Span) -> Token {
    l.read_char();
    Token::new(TokenKind::Illegal, c.to_string(), span)
}

fn is_identifier_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_' || ch == '$'
}

fn is_identifier_char(ch: char) -> bool {
    ch.is_alphanumeric() || matches!(ch, '_' | '$' | '?' | '.')
}
