//! Declaration tree consumed by the symbol core.
//!
//! The tree is produced by the Yuni front end and only read here. Every node
//! can report its [`NodeKind`]; declaration-shaped nodes also expose their name
//! token, optional label/type tokens and child expressions. The tree is
//! serde-deserializable so that compiled modules can be loaded from JSON.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Span information for source location tracking
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn dummy() -> Self {
        Self { start: 0, end: 0 }
    }

    pub fn is_dummy(&self) -> bool {
        self.start == 0 && self.end == 0
    }
}

impl From<std::ops::Range<usize>> for Span {
    fn from(range: std::ops::Range<usize>) -> Self {
        Self {
            start: range.start,
            end: range.end,
        }
    }
}

/// Syntactic kind of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Module,
    Import,
    VariableDecl,
    FunctionDecl,
    ClassDecl,
    Parameter,
    Block,
    Let,
    Assignment,
    Return,
    If,
    While,
    For,
    ExpressionStatement,
    Integer,
    Float,
    String,
    Char,
    Boolean,
    Null,
    Identifier,
    This,
    Member,
    Call,
    List,
    Dict,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::Module => "module",
            NodeKind::Import => "import",
            NodeKind::VariableDecl => "variable declaration",
            NodeKind::FunctionDecl => "function declaration",
            NodeKind::ClassDecl => "class declaration",
            NodeKind::Parameter => "parameter",
            NodeKind::Block => "block",
            NodeKind::Let => "let statement",
            NodeKind::Assignment => "assignment",
            NodeKind::Return => "return statement",
            NodeKind::If => "if statement",
            NodeKind::While => "while statement",
            NodeKind::For => "for statement",
            NodeKind::ExpressionStatement => "expression statement",
            NodeKind::Integer => "integer literal",
            NodeKind::Float => "float literal",
            NodeKind::String => "string literal",
            NodeKind::Char => "char literal",
            NodeKind::Boolean => "boolean literal",
            NodeKind::Null => "null",
            NodeKind::Identifier => "identifier",
            NodeKind::This => "this",
            NodeKind::Member => "member access",
            NodeKind::Call => "call",
            NodeKind::List => "list literal",
            NodeKind::Dict => "dict literal",
        };
        write!(f, "{}", name)
    }
}

/// Root node representing one compilation unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub name: String,
    /// Original source text, used only to render diagnostics
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub imports: Vec<Import>,
    #[serde(default)]
    pub items: Vec<Item>,
    #[serde(default)]
    pub span: Span,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: None,
            imports: Vec::new(),
            items: Vec::new(),
            span: Span::dummy(),
        }
    }
}

/// Import statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Import {
    pub path: String,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub span: Span,
}

/// Top-level items in a module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "item", rename_all = "snake_case")]
pub enum Item {
    Variable(VariableDecl),
    Function(FunctionDecl),
    Class(ClassDecl),
}

impl Item {
    pub fn kind(&self) -> NodeKind {
        match self {
            Item::Variable(_) => NodeKind::VariableDecl,
            Item::Function(_) => NodeKind::FunctionDecl,
            Item::Class(_) => NodeKind::ClassDecl,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Item::Variable(v) => &v.name,
            Item::Function(f) => &f.name,
            Item::Class(c) => &c.name,
        }
    }
}

/// Label or type token, e.g. `public`, `int`, `list<int>`
///
/// Each entry of `descriptors` is one angle-bracket group, so `dict<str, int>`
/// carries a single group of two labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelRef {
    pub name: String,
    #[serde(default)]
    pub descriptors: Vec<Vec<LabelRef>>,
    #[serde(default)]
    pub span: Span,
}

impl LabelRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            descriptors: Vec::new(),
            span: Span::dummy(),
        }
    }

    pub fn with_group(mut self, group: Vec<LabelRef>) -> Self {
        self.descriptors.push(group);
        self
    }
}

/// Variable declaration (global, local or class field)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableDecl {
    pub name: String,
    #[serde(default)]
    pub labels: Vec<LabelRef>,
    #[serde(default)]
    pub ty: Option<LabelRef>,
    #[serde(default)]
    pub value: Option<Expression>,
    #[serde(default)]
    pub span: Span,
}

/// Kind of a function parameter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterKind {
    #[default]
    Positional,
    /// Keyword parameter with a default value
    Keyword,
    /// `*args`
    VarArgs,
    /// `**kwargs`
    KwArgs,
}

/// Function parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(default)]
    pub kind: ParameterKind,
    #[serde(default)]
    pub labels: Vec<LabelRef>,
    #[serde(default)]
    pub ty: Option<LabelRef>,
    #[serde(default)]
    pub default: Option<Expression>,
    #[serde(default)]
    pub span: Span,
}

/// Function, method or constructor declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDecl {
    pub name: String,
    #[serde(default)]
    pub labels: Vec<LabelRef>,
    #[serde(default)]
    pub params: Vec<Parameter>,
    #[serde(default)]
    pub return_type: Option<LabelRef>,
    #[serde(default)]
    pub body: Block,
    #[serde(default)]
    pub span: Span,
}

/// Reference to a base class in a class header
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseRef {
    pub name: String,
    #[serde(default)]
    pub span: Span,
}

/// Class declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDecl {
    pub name: String,
    #[serde(default)]
    pub labels: Vec<LabelRef>,
    #[serde(default)]
    pub bases: Vec<BaseRef>,
    #[serde(default)]
    pub members: Vec<Member>,
    #[serde(default)]
    pub constructors: Vec<FunctionDecl>,
    #[serde(default)]
    pub span: Span,
}

/// Class body member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "member", rename_all = "snake_case")]
pub enum Member {
    Field(VariableDecl),
    Method(FunctionDecl),
}

impl Member {
    pub fn name(&self) -> &str {
        match self {
            Member::Field(v) => &v.name,
            Member::Method(f) => &f.name,
        }
    }
}

/// Block statement
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Block {
    #[serde(default)]
    pub statements: Vec<Statement>,
    #[serde(default)]
    pub span: Span,
}

/// Statement types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "stmt", rename_all = "snake_case")]
pub enum Statement {
    Let(VariableDecl),
    Assignment(AssignStatement),
    Return(ReturnStatement),
    If(IfStatement),
    While(WhileStatement),
    For(ForStatement),
    Block(Block),
    Expression(ExpressionStatement),
}

impl Statement {
    pub fn kind(&self) -> NodeKind {
        match self {
            Statement::Let(_) => NodeKind::Let,
            Statement::Assignment(_) => NodeKind::Assignment,
            Statement::Return(_) => NodeKind::Return,
            Statement::If(_) => NodeKind::If,
            Statement::While(_) => NodeKind::While,
            Statement::For(_) => NodeKind::For,
            Statement::Block(_) => NodeKind::Block,
            Statement::Expression(_) => NodeKind::ExpressionStatement,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Statement::Let(s) => s.span,
            Statement::Assignment(s) => s.span,
            Statement::Return(s) => s.span,
            Statement::If(s) => s.span,
            Statement::While(s) => s.span,
            Statement::For(s) => s.span,
            Statement::Block(b) => b.span,
            Statement::Expression(e) => e.expr.span(),
        }
    }
}

/// Assignment statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignStatement {
    pub target: Expression,
    pub value: Expression,
    #[serde(default)]
    pub span: Span,
}

/// Return statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnStatement {
    #[serde(default)]
    pub value: Option<Expression>,
    #[serde(default)]
    pub span: Span,
}

/// If statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IfStatement {
    pub condition: Expression,
    pub then_branch: Block,
    #[serde(default)]
    pub else_branch: Option<Block>,
    #[serde(default)]
    pub span: Span,
}

/// While statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhileStatement {
    pub condition: Expression,
    pub body: Block,
    #[serde(default)]
    pub span: Span,
}

/// For-in statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForStatement {
    pub variable: String,
    pub iterable: Expression,
    pub body: Block,
    #[serde(default)]
    pub span: Span,
}

/// Expression used as a statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpressionStatement {
    pub expr: Expression,
}

/// Expression types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "expr", rename_all = "snake_case")]
pub enum Expression {
    Integer(IntegerLit),
    Float(FloatLit),
    String(StringLit),
    Char(CharLit),
    Boolean(BooleanLit),
    Null(NullLit),
    Identifier(Identifier),
    This(ThisExpr),
    Member(MemberExpr),
    Call(CallExpr),
    List(ListExpr),
    Dict(DictExpr),
}

impl Expression {
    pub fn kind(&self) -> NodeKind {
        match self {
            Expression::Integer(_) => NodeKind::Integer,
            Expression::Float(_) => NodeKind::Float,
            Expression::String(_) => NodeKind::String,
            Expression::Char(_) => NodeKind::Char,
            Expression::Boolean(_) => NodeKind::Boolean,
            Expression::Null(_) => NodeKind::Null,
            Expression::Identifier(_) => NodeKind::Identifier,
            Expression::This(_) => NodeKind::This,
            Expression::Member(_) => NodeKind::Member,
            Expression::Call(_) => NodeKind::Call,
            Expression::List(_) => NodeKind::List,
            Expression::Dict(_) => NodeKind::Dict,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Expression::Integer(e) => e.span,
            Expression::Float(e) => e.span,
            Expression::String(e) => e.span,
            Expression::Char(e) => e.span,
            Expression::Boolean(e) => e.span,
            Expression::Null(e) => e.span,
            Expression::Identifier(e) => e.span,
            Expression::This(e) => e.span,
            Expression::Member(e) => e.span,
            Expression::Call(e) => e.span,
            Expression::List(e) => e.span,
            Expression::Dict(e) => e.span,
        }
    }

    pub fn identifier(name: impl Into<String>) -> Self {
        Expression::Identifier(Identifier {
            name: name.into(),
            span: Span::dummy(),
        })
    }

    pub fn integer(value: i64) -> Self {
        Expression::Integer(IntegerLit {
            value,
            span: Span::dummy(),
        })
    }

    pub fn string(value: impl Into<String>) -> Self {
        Expression::String(StringLit {
            value: value.into(),
            span: Span::dummy(),
        })
    }

    pub fn boolean(value: bool) -> Self {
        Expression::Boolean(BooleanLit {
            value,
            span: Span::dummy(),
        })
    }

    pub fn call(callee: Expression, args: Vec<Expression>) -> Self {
        Expression::Call(CallExpr {
            callee: Box::new(callee),
            args,
            span: Span::dummy(),
        })
    }

    pub fn member(object: Expression, member: impl Into<String>) -> Self {
        Expression::Member(MemberExpr {
            object: Box::new(object),
            member: member.into(),
            span: Span::dummy(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegerLit {
    pub value: i64,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloatLit {
    pub value: f64,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StringLit {
    pub value: String,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharLit {
    pub value: char,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BooleanLit {
    pub value: bool,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NullLit {
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identifier {
    pub name: String,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThisExpr {
    #[serde(default)]
    pub span: Span,
}

/// `object.member`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberExpr {
    pub object: Box<Expression>,
    pub member: String,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallExpr {
    pub callee: Box<Expression>,
    #[serde(default)]
    pub args: Vec<Expression>,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListExpr {
    #[serde(default)]
    pub elements: Vec<Expression>,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DictEntry {
    pub key: Expression,
    pub value: Expression,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DictExpr {
    #[serde(default)]
    pub entries: Vec<DictEntry>,
    #[serde(default)]
    pub span: Span,
}
