//! Pratt parser for Marmoset.
//!
//! `parse_expression` dispatches on the current token kind: a postfix
//! check first (`++`/`--` bind to the identifier just read), then the
//! prefix table, then the infix climb while the next token binds tighter
//! than the caller. Errors accumulate with their line/column; callers
//! must consult `errors()` before evaluating the program.

use crate::compiler::ast::*;
use crate::compiler::lexer::Lexer;
use crate::compiler::tokens::{Precedence, Span, Token, TokenKind};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseError {
    #[error("expected next token to be {expected}, got {found} instead at line {line}, col {col}")]
    Unexpected {
        expected: String,
        found: String,
        line: usize,
        col: usize,
    },
    #[error("no prefix parse function for {kind} found at line {line}, col {col}")]
    NoPrefixParse {
        kind: String,
        line: usize,
        col: usize,
    },
    #[error("unterminated {construct} at line {line}, col {col}")]
    Unterminated {
        construct: &'static str,
        line: usize,
        col: usize,
    },
    #[error("nested ternary expressions are illegal at line {line}, col {col}")]
    NestedTernary { line: usize, col: usize },
    #[error("could not parse {literal:?} as integer at line {line}, col {col}")]
    BadIntLiteral {
        literal: String,
        line: usize,
        col: usize,
    },
    #[error("could not parse {literal:?} as float at line {line}, col {col}")]
    BadFloatLiteral {
        literal: String,
        line: usize,
        col: usize,
    },
    #[error("expected assign token to be IDENT, got {found} instead at line {line}, col {col}")]
    AssignTarget {
        found: String,
        line: usize,
        col: usize,
    },
    #[error("a switch statement should only have one default block at line {line}, col {col}")]
    DuplicateDefault { line: usize, col: usize },
    #[error("second argument to foreach must be an identifier, got {found} at line {line}, col {col}")]
    ForeachIndex {
        found: String,
        line: usize,
        col: usize,
    },
    #[error("postfix {op} requires an identifier target at line {line}, col {col}")]
    PostfixTarget {
        op: String,
        line: usize,
        col: usize,
    },
    #[error("expected case or default in switch block, got {found} at line {line}, col {col}")]
    SwitchArm {
        found: String,
        line: usize,
        col: usize,
    },
    #[error("{message} at line {line}, col {col}")]
    Lex {
        message: String,
        line: usize,
        col: usize,
    },
}

impl ParseError {
    /// Line/column the error points at.
    pub fn span(&self) -> Span {
        match self {
            ParseError::Unexpected { line, col, .. }
            | ParseError::NoPrefixParse { line, col, .. }
            | ParseError::Unterminated { line, col, .. }
            | ParseError::NestedTernary { line, col }
            | ParseError::BadIntLiteral { line, col, .. }
            | ParseError::BadFloatLiteral { line, col, .. }
            | ParseError::AssignTarget { line, col, .. }
            | ParseError::DuplicateDefault { line, col }
            | ParseError::ForeachIndex { line, col, .. }
            | ParseError::PostfixTarget { line, col, .. }
            | ParseError::SwitchArm { line, col, .. }
            | ParseError::Lex { line, col, .. } => Span::new(*line, *col),
        }
    }
}

/// Stop recording after this many errors; one broken construct tends to
/// cascade.
const MAX_PARSE_ERRORS: usize = 10;

pub struct Parser {
    lexer: Lexer,
    /// The token before `cur_token`, which `++`/`--` bind to.
    prev_token: Token,
    cur_token: Token,
    peek_token: Token,
    errors: Vec<ParseError>,
    /// Set while parsing a ternary; nested ternaries are illegal.
    in_ternary: bool,
}

impl Parser {
    pub fn new(mut lexer: Lexer) -> Self {
        let first = lexer.next_token();
        let second = lexer.next_token();
        Self {
            lexer,
            prev_token: Token::eof(Span::dummy()),
            cur_token: first,
            peek_token: second,
            errors: Vec::new(),
            in_ternary: false,
        }
    }

    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    fn next_token(&mut self) {
        self.prev_token = std::mem::replace(
            &mut self.cur_token,
            std::mem::replace(&mut self.peek_token, self.lexer.next_token()),
        );
    }

    fn cur_is(&self, kind: TokenKind) -> bool {
        self.cur_token.kind == kind
    }

    fn peek_is(&self, kind: TokenKind) -> bool {
        self.peek_token.kind == kind
    }

    /// Advance when the next token has the given kind; record an error
    /// otherwise.
    fn expect_peek(&mut self, kind: TokenKind) -> bool {
        if self.peek_is(kind) {
            self.next_token();
            return true;
        }
        self.record(ParseError::Unexpected {
            expected: kind.to_string(),
            found: self.peek_token.kind.to_string(),
            line: self.peek_token.span.line,
            col: self.peek_token.span.col,
        });
        false
    }

    fn record(&mut self, error: ParseError) {
        if self.errors.len() < MAX_PARSE_ERRORS {
            self.errors.push(error);
        }
    }

    fn at_error_limit(&self) -> bool {
        self.errors.len() >= MAX_PARSE_ERRORS
    }

    pub fn parse_program(&mut self) -> Program {
        let mut statements = Vec::new();
        while !self.cur_is(TokenKind::Eof) && !self.at_error_limit() {
            if let Some(stmt) = self.parse_statement() {
                statements.push(stmt);
            }
            self.next_token();
        }
        Program { statements }
    }

    fn parse_statement(&mut self) -> Option<Stmt> {
        match self.cur_token.kind {
            TokenKind::Let => self.parse_let_statement(),
            TokenKind::Const => self.parse_const_statement(),
            TokenKind::Return => self.parse_return_statement(),
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_let_statement(&mut self) -> Option<Stmt> {
        let token = self.cur_token.clone();
        if !self.expect_peek(TokenKind::Ident) {
            return None;
        }
        let name = self.cur_ident();
        if !self.expect_peek(TokenKind::Assign) {
            return None;
        }
        self.next_token();
        let value = self.parse_bound_expression("let statement")?;
        self.skip_semicolons();
        Some(Stmt::Let(LetStmt { token, name, value }))
    }

    fn parse_const_statement(&mut self) -> Option<Stmt> {
        let token = self.cur_token.clone();
        if !self.expect_peek(TokenKind::Ident) {
            return None;
        }
        let name = self.cur_ident();
        if !self.expect_peek(TokenKind::Assign) {
            return None;
        }
        self.next_token();
        let value = self.parse_bound_expression("const statement")?;
        self.skip_semicolons();
        Some(Stmt::Const(ConstStmt { token, name, value }))
    }

    fn parse_return_statement(&mut self) -> Option<Stmt> {
        let token = self.cur_token.clone();
        self.next_token();
        let value = self.parse_bound_expression("return statement")?;
        self.skip_semicolons();
        Some(Stmt::Return(ReturnStmt { token, value }))
    }

    /// Parse the value of a `let`/`const`/`return`; hitting end of input
    /// here means the statement never finished.
    fn parse_bound_expression(&mut self, construct: &'static str) -> Option<Expr> {
        if self.cur_is(TokenKind::Eof) {
            self.record(ParseError::Unterminated {
                construct,
                line: self.cur_token.span.line,
                col: self.cur_token.span.col,
            });
            return None;
        }
        self.parse_expression(Precedence::Lowest)
    }

    fn parse_expression_statement(&mut self) -> Option<Stmt> {
        let token = self.cur_token.clone();
        let expr = self.parse_expression(Precedence::Lowest)?;
        self.skip_semicolons();
        Some(Stmt::Expression(ExprStmt { token, expr }))
    }

    fn skip_semicolons(&mut self) {
        while self.peek_is(TokenKind::Semicolon) {
            self.next_token();
        }
    }

    fn cur_ident(&self) -> IdentExpr {
        IdentExpr {
            name: self.cur_token.literal.clone(),
            token: self.cur_token.clone(),
        }
    }

    // ── Pratt core ──

    fn parse_expression(&mut self, precedence: Precedence) -> Option<Expr> {
        if matches!(
            self.cur_token.kind,
            TokenKind::PlusPlus | TokenKind::MinusMinus
        ) {
            return self.parse_postfix_expression();
        }
        let mut left = self.prefix_parse()?;
        while !self.peek_is(TokenKind::Semicolon)
            && precedence < self.peek_token.kind.precedence()
        {
            if !has_infix(self.peek_token.kind) {
                return Some(left);
            }
            self.next_token();
            left = self.infix_parse(left)?;
        }
        Some(left)
    }

    /// The prefix dispatch table, as a total match over token kinds.
    /// Kinds that cannot begin an expression fall through to the
    /// "no prefix parse function" error.
    fn prefix_parse(&mut self) -> Option<Expr> {
        match self.cur_token.kind {
            TokenKind::Ident => Some(Expr::Ident(self.cur_ident())),
            TokenKind::Int => self.parse_integer_literal(),
            TokenKind::Float => self.parse_float_literal(),
            TokenKind::True | TokenKind::False => Some(Expr::Bool(BoolLit {
                value: self.cur_is(TokenKind::True),
                token: self.cur_token.clone(),
            })),
            TokenKind::String => Some(Expr::Str(StringLit {
                value: self.cur_token.literal.clone(),
                token: self.cur_token.clone(),
            })),
            TokenKind::Regexp => self.parse_regexp_literal(),
            TokenKind::Backtick => Some(Expr::Backtick(BacktickLit {
                command: self.cur_token.literal.clone(),
                token: self.cur_token.clone(),
            })),
            TokenKind::Bang | TokenKind::Minus => self.parse_prefix_expression(),
            TokenKind::LParen => self.parse_grouped_expression(),
            TokenKind::If => self.parse_if_expression(),
            TokenKind::For => self.parse_for_expression(),
            TokenKind::Foreach => self.parse_foreach_expression(),
            TokenKind::Fn => self.parse_function_literal(),
            TokenKind::Function => self.parse_function_definition(),
            TokenKind::LBracket => self.parse_array_literal(),
            TokenKind::LBrace => self.parse_hash_literal(),
            TokenKind::Switch => self.parse_switch_expression(),
            TokenKind::Illegal => {
                // Stray characters carry themselves as the literal; the
                // unterminated string/backtick diagnostics read as-is.
                let message = if self.cur_token.literal.chars().count() == 1 {
                    format!("illegal character {:?}", self.cur_token.literal)
                } else {
                    self.cur_token.literal.clone()
                };
                self.record(ParseError::Lex {
                    message,
                    line: self.cur_token.span.line,
                    col: self.cur_token.span.col,
                });
                None
            }
            kind => {
                self.record(ParseError::NoPrefixParse {
                    kind: kind.to_string(),
                    line: self.cur_token.span.line,
                    col: self.cur_token.span.col,
                });
                None
            }
        }
    }

    /// The infix dispatch table.
    fn infix_parse(&mut self, left: Expr) -> Option<Expr> {
        match self.cur_token.kind {
            TokenKind::Assign
            | TokenKind::PlusEq
            | TokenKind::MinusEq
            | TokenKind::StarEq
            | TokenKind::SlashEq => self.parse_assign_expression(left),
            TokenKind::Question => self.parse_ternary_expression(left),
            TokenKind::LParen => {
                let call = self.parse_call_expression(left)?;
                Some(Expr::Call(Box::new(call)))
            }
            TokenKind::LBracket => self.parse_index_expression(left),
            TokenKind::Period => self.parse_method_call_expression(left),
            _ => self.parse_infix_expression(left),
        }
    }

    fn parse_postfix_expression(&mut self) -> Option<Expr> {
        let token = self.cur_token.clone();
        if self.prev_token.kind != TokenKind::Ident {
            self.record(ParseError::PostfixTarget {
                op: token.literal.clone(),
                line: token.span.line,
                col: token.span.col,
            });
            return None;
        }
        Some(Expr::Postfix(PostfixExpr {
            target_name: self.prev_token.literal.clone(),
            op: token.kind,
            token,
        }))
    }

    // ── Literals ──

    fn parse_integer_literal(&mut self) -> Option<Expr> {
        let token = self.cur_token.clone();
        let parsed = if let Some(hex) = token.literal.strip_prefix("0x") {
            i64::from_str_radix(hex, 16)
        } else if let Some(bin) = token.literal.strip_prefix("0b") {
            i64::from_str_radix(bin, 2)
        } else {
            token.literal.parse::<i64>()
        };
        match parsed {
            Ok(value) => Some(Expr::Int(IntLit { value, token })),
            Err(_) => {
                self.record(ParseError::BadIntLiteral {
                    literal: token.literal.clone(),
                    line: token.span.line,
                    col: token.span.col,
                });
                None
            }
        }
    }

    fn parse_float_literal(&mut self) -> Option<Expr> {
        let token = self.cur_token.clone();
        match token.literal.parse::<f64>() {
            Ok(value) => Some(Expr::Float(FloatLit { value, token })),
            Err(_) => {
                self.record(ParseError::BadFloatLiteral {
                    literal: token.literal.clone(),
                    line: token.span.line,
                    col: token.span.col,
                });
                None
            }
        }
    }

    /// Unpack the lexer's `(?flags)pattern` form back into pattern and
    /// flags. The unterminated-regexp diagnostic surfaces here as a
    /// parse error.
    fn parse_regexp_literal(&mut self) -> Option<Expr> {
        let token = self.cur_token.clone();
        if token.literal == "unterminated regular expression" {
            self.record(ParseError::Lex {
                message: token.literal.clone(),
                line: token.span.line,
                col: token.span.col,
            });
            return None;
        }
        let mut pattern = token.literal.clone();
        let mut flags = String::new();
        if let Some(rest) = token.literal.strip_prefix("(?") {
            if let Some(close) = rest.find(')') {
                flags = rest[..close].to_string();
                pattern = rest[close + 1..].to_string();
            }
        }
        Some(Expr::Regexp(RegexpLit {
            pattern,
            flags,
            token,
        }))
    }

    // ── Prefix constructs ──

    fn parse_prefix_expression(&mut self) -> Option<Expr> {
        let token = self.cur_token.clone();
        let op = token.kind;
        self.next_token();
        let right = self.parse_expression(Precedence::Prefix)?;
        Some(Expr::Prefix(Box::new(PrefixExpr { token, op, right })))
    }

    fn parse_grouped_expression(&mut self) -> Option<Expr> {
        self.next_token();
        let expr = self.parse_expression(Precedence::Lowest)?;
        if !self.expect_peek(TokenKind::RParen) {
            return None;
        }
        Some(expr)
    }

    fn parse_if_expression(&mut self) -> Option<Expr> {
        let token = self.cur_token.clone();
        if !self.expect_peek(TokenKind::LParen) {
            return None;
        }
        self.next_token();
        let condition = self.parse_expression(Precedence::Lowest)?;
        if !self.expect_peek(TokenKind::RParen) {
            return None;
        }
        if !self.expect_peek(TokenKind::LBrace) {
            return None;
        }
        let consequence = self.parse_block_statement()?;
        let alternative = if self.peek_is(TokenKind::Else) {
            self.next_token();
            if !self.expect_peek(TokenKind::LBrace) {
                return None;
            }
            Some(self.parse_block_statement()?)
        } else {
            None
        };
        Some(Expr::If(Box::new(IfExpr {
            token,
            condition,
            consequence,
            alternative,
        })))
    }

    fn parse_for_expression(&mut self) -> Option<Expr> {
        let token = self.cur_token.clone();
        if !self.expect_peek(TokenKind::LParen) {
            return None;
        }
        self.next_token();
        let condition = self.parse_expression(Precedence::Lowest)?;
        if !self.expect_peek(TokenKind::RParen) {
            return None;
        }
        if !self.expect_peek(TokenKind::LBrace) {
            return None;
        }
        let body = self.parse_block_statement()?;
        Some(Expr::For(Box::new(ForExpr {
            token,
            condition,
            body,
        })))
    }

    /// `foreach v in X { .. }` or `foreach i, v in X { .. }`.
    fn parse_foreach_expression(&mut self) -> Option<Expr> {
        let token = self.cur_token.clone();
        if !self.expect_peek(TokenKind::Ident) {
            return None;
        }
        let mut value_name = self.cur_token.literal.clone();
        let mut index_name = None;
        if self.peek_is(TokenKind::Comma) {
            self.next_token();
            if !self.peek_is(TokenKind::Ident) {
                self.record(ParseError::ForeachIndex {
                    found: self.peek_token.kind.to_string(),
                    line: self.peek_token.span.line,
                    col: self.peek_token.span.col,
                });
                return None;
            }
            self.next_token();
            // With two names, the first is the index and the second the value.
            index_name = Some(value_name);
            value_name = self.cur_token.literal.clone();
        }
        if !self.expect_peek(TokenKind::In) {
            return None;
        }
        self.next_token();
        let iterable = self.parse_expression(Precedence::Lowest)?;
        if !self.expect_peek(TokenKind::LBrace) {
            return None;
        }
        let body = self.parse_block_statement()?;
        Some(Expr::Foreach(Box::new(ForeachExpr {
            token,
            index_name,
            value_name,
            iterable,
            body,
        })))
    }

    fn parse_block_statement(&mut self) -> Option<BlockStmt> {
        let token = self.cur_token.clone();
        let mut statements = Vec::new();
        self.next_token();
        while !self.cur_is(TokenKind::RBrace) {
            if self.cur_is(TokenKind::Eof) {
                self.record(ParseError::Unterminated {
                    construct: "block statement",
                    line: self.cur_token.span.line,
                    col: self.cur_token.span.col,
                });
                return None;
            }
            if self.at_error_limit() {
                return None;
            }
            if let Some(stmt) = self.parse_statement() {
                statements.push(stmt);
            }
            self.next_token();
        }
        Some(BlockStmt { token, statements })
    }

    fn parse_function_literal(&mut self) -> Option<Expr> {
        let token = self.cur_token.clone();
        if !self.expect_peek(TokenKind::LParen) {
            return None;
        }
        let (parameters, defaults) = self.parse_function_parameters()?;
        if !self.expect_peek(TokenKind::LBrace) {
            return None;
        }
        let body = self.parse_block_statement()?;
        Some(Expr::FunctionLit(Box::new(FunctionLit {
            token,
            parameters,
            defaults,
            body,
        })))
    }

    fn parse_function_definition(&mut self) -> Option<Expr> {
        if !self.expect_peek(TokenKind::Ident) {
            return None;
        }
        let token = self.cur_token.clone();
        let name = token.literal.clone();
        if !self.expect_peek(TokenKind::LParen) {
            return None;
        }
        let (parameters, defaults) = self.parse_function_parameters()?;
        if !self.expect_peek(TokenKind::LBrace) {
            return None;
        }
        let body = self.parse_block_statement()?;
        Some(Expr::FunctionDefine(Box::new(FunctionDefine {
            token,
            name,
            parameters,
            defaults,
            body,
        })))
    }

    /// Parameters with optional defaults: `name` or `name = expr`,
    /// comma-separated, up to the closing `)`.
    fn parse_function_parameters(
        &mut self,
    ) -> Option<(Vec<IdentExpr>, BTreeMap<String, Expr>)> {
        let mut parameters = Vec::new();
        let mut defaults = BTreeMap::new();

        if self.peek_is(TokenKind::RParen) {
            self.next_token();
            return Some((parameters, defaults));
        }
        self.next_token();

        while !self.cur_is(TokenKind::RParen) {
            if self.cur_is(TokenKind::Eof) {
                self.record(ParseError::Unterminated {
                    construct: "function parameters",
                    line: self.cur_token.span.line,
                    col: self.cur_token.span.col,
                });
                return None;
            }
            if !self.cur_is(TokenKind::Ident) {
                self.record(ParseError::Unexpected {
                    expected: TokenKind::Ident.to_string(),
                    found: self.cur_token.kind.to_string(),
                    line: self.cur_token.span.line,
                    col: self.cur_token.span.col,
                });
                return None;
            }
            let ident = self.cur_ident();
            let name = ident.name.clone();
            parameters.push(ident);
            self.next_token();

            if self.cur_is(TokenKind::Assign) {
                self.next_token();
                let default = self.parse_expression(Precedence::Lowest)?;
                defaults.insert(name, default);
                self.next_token();
            }
            if self.cur_is(TokenKind::Comma) {
                self.next_token();
            }
        }

        Some((parameters, defaults))
    }

    fn parse_array_literal(&mut self) -> Option<Expr> {
        let token = self.cur_token.clone();
        let elements = self.parse_expression_list(TokenKind::RBracket)?;
        Some(Expr::Array(ArrayLit { token, elements }))
    }

    fn parse_expression_list(&mut self, end: TokenKind) -> Option<Vec<Expr>> {
        let mut list = Vec::new();
        if self.peek_is(end) {
            self.next_token();
            return Some(list);
        }
        self.next_token();
        list.push(self.parse_expression(Precedence::Lowest)?);
        while self.peek_is(TokenKind::Comma) {
            self.next_token();
            self.next_token();
            list.push(self.parse_expression(Precedence::Lowest)?);
        }
        if !self.expect_peek(end) {
            return None;
        }
        Some(list)
    }

    /// `{ key : value, .. }`; no trailing comma.
    fn parse_hash_literal(&mut self) -> Option<Expr> {
        let token = self.cur_token.clone();
        let mut pairs = Vec::new();
        while !self.peek_is(TokenKind::RBrace) {
            self.next_token();
            let key = self.parse_expression(Precedence::Lowest)?;
            if !self.expect_peek(TokenKind::Colon) {
                return None;
            }
            self.next_token();
            let value = self.parse_expression(Precedence::Lowest)?;
            pairs.push((key, value));
            if !self.peek_is(TokenKind::RBrace) && !self.expect_peek(TokenKind::Comma) {
                return None;
            }
        }
        if !self.expect_peek(TokenKind::RBrace) {
            return None;
        }
        Some(Expr::Hash(HashLit { token, pairs }))
    }

    fn parse_switch_expression(&mut self) -> Option<Expr> {
        let token = self.cur_token.clone();
        if !self.expect_peek(TokenKind::LParen) {
            return None;
        }
        self.next_token();
        let value = self.parse_expression(Precedence::Lowest)?;
        if !self.expect_peek(TokenKind::RParen) {
            return None;
        }
        if !self.expect_peek(TokenKind::LBrace) {
            return None;
        }
        self.next_token();

        let mut cases = Vec::new();
        let mut default: Option<BlockStmt> = None;
        while !self.cur_is(TokenKind::RBrace) {
            if self.cur_is(TokenKind::Eof) {
                self.record(ParseError::Unterminated {
                    construct: "switch statement",
                    line: self.cur_token.span.line,
                    col: self.cur_token.span.col,
                });
                return None;
            }
            if self.at_error_limit() {
                return None;
            }

            let arm_token = self.cur_token.clone();
            let mut is_default = false;
            let mut exprs = Vec::new();
            if self.cur_is(TokenKind::Default) {
                is_default = true;
            } else if self.cur_is(TokenKind::Case) {
                self.next_token();
                // `case default` is accepted as a spelling of `default`.
                if self.cur_is(TokenKind::Default) {
                    is_default = true;
                } else {
                    exprs.push(self.parse_expression(Precedence::Lowest)?);
                    while self.peek_is(TokenKind::Comma) {
                        self.next_token();
                        self.next_token();
                        exprs.push(self.parse_expression(Precedence::Lowest)?);
                    }
                }
            } else {
                self.record(ParseError::SwitchArm {
                    found: self.cur_token.kind.to_string(),
                    line: self.cur_token.span.line,
                    col: self.cur_token.span.col,
                });
                return None;
            }

            if !self.expect_peek(TokenKind::LBrace) {
                return None;
            }
            let block = self.parse_block_statement()?;
            self.next_token();

            if is_default {
                if default.is_some() {
                    self.record(ParseError::DuplicateDefault {
                        line: arm_token.span.line,
                        col: arm_token.span.col,
                    });
                } else {
                    default = Some(block);
                }
            } else {
                cases.push(CaseArm {
                    token: arm_token,
                    exprs,
                    block,
                });
            }
        }

        Some(Expr::Switch(Box::new(SwitchExpr {
            token,
            value,
            cases,
            default,
        })))
    }

    // ── Infix constructs ──

    fn parse_infix_expression(&mut self, left: Expr) -> Option<Expr> {
        let token = self.cur_token.clone();
        let op = token.kind;
        let precedence = token.kind.precedence();
        self.next_token();
        let right = self.parse_expression(precedence)?;
        Some(Expr::Infix(Box::new(InfixExpr {
            token,
            op,
            left,
            right,
        })))
    }

    fn parse_assign_expression(&mut self, left: Expr) -> Option<Expr> {
        let token = self.cur_token.clone();
        let name = match left {
            Expr::Ident(ident) => ident,
            other => {
                self.record(ParseError::AssignTarget {
                    found: other.token().kind.to_string(),
                    line: other.token().span.line,
                    col: other.token().span.col,
                });
                IdentExpr {
                    name: other.token().literal.clone(),
                    token: other.token().clone(),
                }
            }
        };
        let op = token.kind;
        self.next_token();
        let value = self.parse_expression(Precedence::Lowest)?;
        Some(Expr::Assign(Box::new(AssignExpr {
            token,
            name,
            op,
            value,
        })))
    }

    fn parse_ternary_expression(&mut self, condition: Expr) -> Option<Expr> {
        if self.in_ternary {
            self.record(ParseError::NestedTernary {
                line: self.cur_token.span.line,
                col: self.cur_token.span.col,
            });
            return None;
        }
        self.in_ternary = true;
        let result = self.parse_ternary_inner(condition);
        self.in_ternary = false;
        result
    }

    fn parse_ternary_inner(&mut self, condition: Expr) -> Option<Expr> {
        let token = self.cur_token.clone();
        self.next_token();
        let if_true = self.parse_expression(Precedence::Lowest)?;
        if !self.expect_peek(TokenKind::Colon) {
            return None;
        }
        self.next_token();
        let if_false = self.parse_expression(Precedence::Lowest)?;
        Some(Expr::Ternary(Box::new(TernaryExpr {
            token,
            condition,
            if_true,
            if_false,
        })))
    }

    fn parse_call_expression(&mut self, callee: Expr) -> Option<CallExpr> {
        let token = self.cur_token.clone();
        let arguments = self.parse_expression_list(TokenKind::RParen)?;
        Some(CallExpr {
            token,
            callee,
            arguments,
        })
    }

    fn parse_index_expression(&mut self, target: Expr) -> Option<Expr> {
        let token = self.cur_token.clone();
        self.next_token();
        let index = self.parse_expression(Precedence::Lowest)?;
        if !self.expect_peek(TokenKind::RBracket) {
            return None;
        }
        Some(Expr::Index(Box::new(IndexExpr {
            token,
            target,
            index,
        })))
    }

    fn parse_method_call_expression(&mut self, receiver: Expr) -> Option<Expr> {
        let token = self.cur_token.clone();
        if !self.expect_peek(TokenKind::Ident) {
            return None;
        }
        let method = Expr::Ident(self.cur_ident());
        if !self.expect_peek(TokenKind::LParen) {
            return None;
        }
        let call = self.parse_call_expression(method)?;
        Some(Expr::MethodCall(Box::new(MethodCallExpr {
            token,
            receiver,
            call,
        })))
    }
}

/// Token kinds with an infix parser registered.
fn has_infix(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Plus
            | TokenKind::Minus
            | TokenKind::Star
            | TokenKind::Slash
            | TokenKind::Mod
            | TokenKind::Pow
            | TokenKind::Eq
            | TokenKind::NotEq
            | TokenKind::Lt
            | TokenKind::LtEq
            | TokenKind::Gt
            | TokenKind::GtEq
            | TokenKind::And
            | TokenKind::Or
            | TokenKind::Contains
            | TokenKind::NotContains
            | TokenKind::DotDot
            | TokenKind::Assign
            | TokenKind::PlusEq
            | TokenKind::MinusEq
            | TokenKind::StarEq
            | TokenKind::SlashEq
            | TokenKind::Question
            | TokenKind::LParen
            | TokenKind::LBracket
            | TokenKind::Period
    )
}
