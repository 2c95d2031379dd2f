//! Typed abstract syntax tree produced by the parser and walked by the
//! evaluator.
//!
//! Every node keeps the token it was parsed from, so runtime errors can
//! point back at the source. The `Display` impls give the canonical
//! pretty-print: re-parsing the printed form yields the same tree.

use crate::compiler::tokens::{Token, TokenKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A complete Marmoset program: an ordered sequence of statements.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Stmt {
    Let(LetStmt),
    Const(ConstStmt),
    Return(ReturnStmt),
    Block(BlockStmt),
    Expression(ExprStmt),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LetStmt {
    pub token: Token,
    pub name: IdentExpr,
    pub value: Expr,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstStmt {
    pub token: Token,
    pub name: IdentExpr,
    pub value: Expr,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnStmt {
    pub token: Token,
    pub value: Expr,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockStmt {
    pub token: Token,
    pub statements: Vec<Stmt>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExprStmt {
    pub token: Token,
    pub expr: Expr,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Expr {
    Ident(IdentExpr),
    Int(IntLit),
    Float(FloatLit),
    Bool(BoolLit),
    Str(StringLit),
    Regexp(RegexpLit),
    Backtick(BacktickLit),
    Prefix(Box<PrefixExpr>),
    Infix(Box<InfixExpr>),
    Postfix(PostfixExpr),
    If(Box<IfExpr>),
    Ternary(Box<TernaryExpr>),
    For(Box<ForExpr>),
    Foreach(Box<ForeachExpr>),
    FunctionLit(Box<FunctionLit>),
    FunctionDefine(Box<FunctionDefine>),
    Call(Box<CallExpr>),
    MethodCall(Box<MethodCallExpr>),
    Index(Box<IndexExpr>),
    Array(ArrayLit),
    Hash(HashLit),
    Switch(Box<SwitchExpr>),
    Assign(Box<AssignExpr>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentExpr {
    pub token: Token,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntLit {
    pub token: Token,
    pub value: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FloatLit {
    pub token: Token,
    pub value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoolLit {
    pub token: Token,
    pub value: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StringLit {
    pub token: Token,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegexpLit {
    pub token: Token,
    pub pattern: String,
    pub flags: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktickLit {
    pub token: Token,
    pub command: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrefixExpr {
    pub token: Token,
    pub op: TokenKind,
    pub right: Expr,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InfixExpr {
    pub token: Token,
    pub op: TokenKind,
    pub left: Expr,
    pub right: Expr,
}

/// `name++` / `name--`. The target is recorded explicitly from the
/// identifier the operator followed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostfixExpr {
    pub token: Token,
    pub target_name: String,
    pub op: TokenKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IfExpr {
    pub token: Token,
    pub condition: Expr,
    pub consequence: BlockStmt,
    pub alternative: Option<BlockStmt>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TernaryExpr {
    pub token: Token,
    pub condition: Expr,
    pub if_true: Expr,
    pub if_false: Expr,
}

/// `for ( cond ) { .. }`: a conditional loop, no init or step clause.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForExpr {
    pub token: Token,
    pub condition: Expr,
    pub body: BlockStmt,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForeachExpr {
    pub token: Token,
    /// Optional index/key variable: `foreach i, v in ..`
    pub index_name: Option<String>,
    pub value_name: String,
    pub iterable: Expr,
    pub body: BlockStmt,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionLit {
    pub token: Token,
    pub parameters: Vec<IdentExpr>,
    pub defaults: BTreeMap<String, Expr>,
    pub body: BlockStmt,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDefine {
    pub token: Token,
    pub name: String,
    pub parameters: Vec<IdentExpr>,
    pub defaults: BTreeMap<String, Expr>,
    pub body: BlockStmt,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallExpr {
    pub token: Token,
    pub callee: Expr,
    pub arguments: Vec<Expr>,
}

/// `receiver.method(args)`; the call half always has an identifier
/// callee naming the method.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodCallExpr {
    pub token: Token,
    pub receiver: Expr,
    pub call: CallExpr,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexExpr {
    pub token: Token,
    pub target: Expr,
    pub index: Expr,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArrayLit {
    pub token: Token,
    pub elements: Vec<Expr>,
}

/// Hash literal pairs in source order; the evaluator hashes the keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HashLit {
    pub token: Token,
    pub pairs: Vec<(Expr, Expr)>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwitchExpr {
    pub token: Token,
    pub value: Expr,
    pub cases: Vec<CaseArm>,
    pub default: Option<BlockStmt>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseArm {
    pub token: Token,
    pub exprs: Vec<Expr>,
    pub block: BlockStmt,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignExpr {
    pub token: Token,
    pub name: IdentExpr,
    /// `=`, `+=`, `-=`, `*=` or `/=`
    pub op: TokenKind,
    pub value: Expr,
}

impl Stmt {
    pub fn token(&self) -> &Token {
        match self {
            Stmt::Let(s) => &s.token,
            Stmt::Const(s) => &s.token,
            Stmt::Return(s) => &s.token,
            Stmt::Block(s) => &s.token,
            Stmt::Expression(s) => &s.token,
        }
    }
}

impl Expr {
    pub fn token(&self) -> &Token {
        match self {
            Expr::Ident(e) => &e.token,
            Expr::Int(e) => &e.token,
            Expr::Float(e) => &e.token,
            Expr::Bool(e) => &e.token,
            Expr::Str(e) => &e.token,
            Expr::Regexp(e) => &e.token,
            Expr::Backtick(e) => &e.token,
            Expr::Prefix(e) => &e.token,
            Expr::Infix(e) => &e.token,
            Expr::Postfix(e) => &e.token,
            Expr::If(e) => &e.token,
            Expr::Ternary(e) => &e.token,
            Expr::For(e) => &e.token,
            Expr::Foreach(e) => &e.token,
            Expr::FunctionLit(e) => &e.token,
            Expr::FunctionDefine(e) => &e.token,
            Expr::Call(e) => &e.token,
            Expr::MethodCall(e) => &e.token,
            Expr::Index(e) => &e.token,
            Expr::Array(e) => &e.token,
            Expr::Hash(e) => &e.token,
            Expr::Switch(e) => &e.token,
            Expr::Assign(e) => &e.token,
        }
    }
}

// ── Canonical pretty-printing ──

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_statements(f, &self.statements)
    }
}

fn write_statements(f: &mut fmt::Formatter<'_>, stmts: &[Stmt]) -> fmt::Result {
    for (i, stmt) in stmts.iter().enumerate() {
        if i > 0 {
            write!(f, " ")?;
        }
        write!(f, "{}", stmt)?;
    }
    Ok(())
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stmt::Let(s) => write!(f, "let {} = {};", s.name.name, s.value),
            Stmt::Const(s) => write!(f, "const {} = {};", s.name.name, s.value),
            Stmt::Return(s) => write!(f, "return {};", s.value),
            Stmt::Block(s) => write!(f, "{}", s),
            Stmt::Expression(s) => write!(f, "{}", s.expr),
        }
    }
}

impl fmt::Display for BlockStmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{ ")?;
        write_statements(f, &self.statements)?;
        write!(f, " }}")
    }
}

fn write_params(
    f: &mut fmt::Formatter<'_>,
    params: &[IdentExpr],
    defaults: &BTreeMap<String, Expr>,
) -> fmt::Result {
    for (i, p) in params.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        match defaults.get(&p.name) {
            Some(d) => write!(f, "{} = {}", p.name, d)?,
            None => write!(f, "{}", p.name)?,
        }
    }
    Ok(())
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Ident(e) => write!(f, "{}", e.name),
            Expr::Int(e) => write!(f, "{}", e.token.literal),
            Expr::Float(e) => write!(f, "{}", e.token.literal),
            Expr::Bool(e) => write!(f, "{}", e.value),
            Expr::Str(e) => write!(f, "\"{}\"", escape_string(&e.value)),
            Expr::Regexp(e) => write!(f, "/{}/{}", e.pattern, e.flags),
            Expr::Backtick(e) => write!(f, "`{}`", e.command),
            Expr::Prefix(e) => write!(f, "({}{})", e.op, e.right),
            Expr::Infix(e) => write!(f, "({} {} {})", e.left, e.op, e.right),
            Expr::Postfix(e) => write!(f, "({}{})", e.target_name, e.op),
            Expr::If(e) => {
                write!(f, "if ({}) {}", e.condition, e.consequence)?;
                if let Some(alt) = &e.alternative {
                    write!(f, " else {}", alt)?;
                }
                Ok(())
            }
            Expr::Ternary(e) => {
                write!(f, "({} ? {} : {})", e.condition, e.if_true, e.if_false)
            }
            Expr::For(e) => write!(f, "for ({}) {}", e.condition, e.body),
            Expr::Foreach(e) => {
                write!(f, "foreach ")?;
                if let Some(index) = &e.index_name {
                    write!(f, "{}, ", index)?;
                }
                write!(f, "{} in {} {}", e.value_name, e.iterable, e.body)
            }
            Expr::FunctionLit(e) => {
                write!(f, "fn(")?;
                write_params(f, &e.parameters, &e.defaults)?;
                write!(f, ") {}", e.body)
            }
            Expr::FunctionDefine(e) => {
                write!(f, "function {}(", e.name)?;
                write_params(f, &e.parameters, &e.defaults)?;
                write!(f, ") {}", e.body)
            }
            Expr::Call(e) => {
                write!(f, "{}(", e.callee)?;
                for (i, arg) in e.arguments.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
            Expr::MethodCall(e) => {
                write!(f, "{}.{}(", e.receiver, e.call.callee)?;
                for (i, arg) in e.call.arguments.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
            Expr::Index(e) => write!(f, "({}[{}])", e.target, e.index),
            Expr::Array(e) => {
                write!(f, "[")?;
                for (i, el) in e.elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", el)?;
                }
                write!(f, "]")
            }
            Expr::Hash(e) => {
                write!(f, "{{")?;
                for (i, (k, v)) in e.pairs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
            Expr::Switch(e) => {
                write!(f, "switch ({}) {{ ", e.value)?;
                for arm in &e.cases {
                    write!(f, "case ")?;
                    for (i, expr) in arm.exprs.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{}", expr)?;
                    }
                    write!(f, " {} ", arm.block)?;
                }
                if let Some(default) = &e.default {
                    write!(f, "default {} ", default)?;
                }
                write!(f, "}}")
            }
            Expr::Assign(e) => write!(f, "{} {} {}", e.name.name, e.op, e.value),
        }
    }
}

fn escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            c => out.push(c),
        }
    }
    out
}
