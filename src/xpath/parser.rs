//! XPath Parser
//!
//! Recursive descent parser for XPath 1.0 expressions.
//! `.` and `..` are expanded to `self::node()` and `parent::node()` steps,
//! and `//` to `/descendant-or-self::node()/`.

use super::lexer::{Lexer, Token};

/// XPath expression AST node
#[derive(Debug, Clone)]
pub enum Expr {
    /// Root path (/)
    Root,
    /// Union of two expressions (|)
    Union(Box<Expr>, Box<Expr>),
    /// Path expression (expr/step)
    Path(Box<Expr>, Box<Step>),
    /// Filter expression with predicate
    Filter(Box<Expr>, Box<Expr>),
    /// Function call
    Function(String, Vec<Expr>),
    /// Binary operation
    Binary(Box<Expr>, BinaryOp, Box<Expr>),
    /// Unary negation
    Negate(Box<Expr>),
    /// Literal number
    Number(f64),
    /// Literal string
    String(String),
    /// Location step relative to the context node
    Step(Box<Step>),
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

/// Location step in a path
#[derive(Debug, Clone)]
pub struct Step {
    pub axis: Axis,
    pub node_test: NodeTest,
    pub predicates: Vec<Expr>,
}

impl Step {
    fn bare(axis: Axis, node_test: NodeTest) -> Self {
        Step {
            axis,
            node_test,
            predicates: Vec::new(),
        }
    }

    fn descendant_or_self() -> Self {
        Self::bare(Axis::DescendantOrSelf, NodeTest::Node)
    }
}

/// XPath axes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Child,
    Descendant,
    DescendantOrSelf,
    Parent,
    Ancestor,
    AncestorOrSelf,
    FollowingSibling,
    PrecedingSibling,
    Following,
    Preceding,
    Self_,
    Attribute,
    Namespace,
}

impl Axis {
    pub fn from_name(s: &str) -> Option<Self> {
        match s {
            "child" => Some(Axis::Child),
            "descendant" => Some(Axis::Descendant),
            "descendant-or-self" => Some(Axis::DescendantOrSelf),
            "parent" => Some(Axis::Parent),
            "ancestor" => Some(Axis::Ancestor),
            "ancestor-or-self" => Some(Axis::AncestorOrSelf),
            "following-sibling" => Some(Axis::FollowingSibling),
            "preceding-sibling" => Some(Axis::PrecedingSibling),
            "following" => Some(Axis::Following),
            "preceding" => Some(Axis::Preceding),
            "self" => Some(Axis::Self_),
            "attribute" => Some(Axis::Attribute),
            "namespace" => Some(Axis::Namespace),
            _ => None,
        }
    }

    /// Reverse axes number their nodes from the context outwards
    pub fn is_reverse(self) -> bool {
        matches!(
            self,
            Axis::Ancestor | Axis::AncestorOrSelf | Axis::Preceding | Axis::PrecedingSibling
        )
    }
}

/// Node test in a location step
#[derive(Debug, Clone, PartialEq)]
pub enum NodeTest {
    /// Matches any node of the axis' principal type (*)
    Any,
    /// Matches by local name
    Name(String),
    /// prefix:localname
    QName(String, String),
    /// prefix:*
    NamespaceWildcard(String),
    /// node() - matches any node
    Node,
    /// text() - matches text nodes
    Text,
    /// comment() - matches comments
    Comment,
    /// processing-instruction() - matches PIs
    ProcessingInstruction(Option<String>),
}

static EOF: Token = Token::Eof;

/// Deepest expression tree the parser will build. Parsing, compiling and
/// dropping all recurse on the tree, so this bounds their stack use.
const MAX_DEPTH: usize = 64;

/// XPath parser
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    /// Create a new parser
    pub fn new(input: &str) -> Result<Self, String> {
        let tokens = Lexer::new(input).tokenize()?;
        Ok(Parser { tokens, pos: 0, depth: 0 })
    }

    /// Parse a complete XPath expression
    pub fn parse(&mut self) -> Result<Expr, String> {
        if self.tokens.is_empty() {
            return Err("Empty expression".to_string());
        }
        let expr = self.parse_or_expr()?;
        match self.current() {
            Token::Eof => Ok(expr),
            token => Err(format!("Unexpected token {:?}", token)),
        }
    }

    fn current(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&EOF)
    }

    fn peek(&self) -> &Token {
        self.tokens.get(self.pos + 1).unwrap_or(&EOF)
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn expect(&mut self, expected: Token, what: &str) -> Result<(), String> {
        if *self.current() == expected {
            self.advance();
            Ok(())
        } else {
            Err(format!("Expected {}, got {:?}", what, self.current()))
        }
    }

    /// One level deeper into the expression tree
    fn descend(&mut self) -> Result<(), String> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            Err("expression nested too deeply".to_string())
        } else {
            Ok(())
        }
    }

    /// Undo `levels` calls to `descend`
    fn ascend(&mut self, levels: usize) {
        self.depth -= levels;
    }

    /// Entry point for every nested expression: parentheses, predicates and
    /// function arguments
    fn parse_or_expr(&mut self) -> Result<Expr, String> {
        self.descend()?;
        let mut left = self.parse_and_expr()?;
        let mut links = 0;

        while matches!(self.current(), Token::Or) {
            self.advance();
            links += 1;
            self.descend()?;
            let right = self.parse_and_expr()?;
            left = Expr::Binary(Box::new(left), BinaryOp::Or, Box::new(right));
        }

        self.ascend(links + 1);
        Ok(left)
    }

    fn parse_and_expr(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_equality_expr()?;
        let mut links = 0;

        while matches!(self.current(), Token::And) {
            self.advance();
            links += 1;
            self.descend()?;
            let right = self.parse_equality_expr()?;
            left = Expr::Binary(Box::new(left), BinaryOp::And, Box::new(right));
        }

        self.ascend(links);
        Ok(left)
    }

    fn parse_equality_expr(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_relational_expr()?;
        let mut links = 0;

        loop {
            let op = match self.current() {
                Token::Eq => BinaryOp::Eq,
                Token::NotEq => BinaryOp::NotEq,
                _ => break,
            };
            self.advance();
            links += 1;
            self.descend()?;
            let right = self.parse_relational_expr()?;
            left = Expr::Binary(Box::new(left), op, Box::new(right));
        }

        self.ascend(links);
        Ok(left)
    }

    fn parse_relational_expr(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_additive_expr()?;
        let mut links = 0;

        loop {
            let op = match self.current() {
                Token::Lt => BinaryOp::Lt,
                Token::LtEq => BinaryOp::LtEq,
                Token::Gt => BinaryOp::Gt,
                Token::GtEq => BinaryOp::GtEq,
                _ => break,
            };
            self.advance();
            links += 1;
            self.descend()?;
            let right = self.parse_additive_expr()?;
            left = Expr::Binary(Box::new(left), op, Box::new(right));
        }

        self.ascend(links);
        Ok(left)
    }

    fn parse_additive_expr(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_multiplicative_expr()?;
        let mut links = 0;

        loop {
            let op = match self.current() {
                Token::Plus => BinaryOp::Add,
                Token::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            links += 1;
            self.descend()?;
            let right = self.parse_multiplicative_expr()?;
            left = Expr::Binary(Box::new(left), op, Box::new(right));
        }

        self.ascend(links);
        Ok(left)
    }

    fn parse_multiplicative_expr(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_unary_expr()?;
        let mut links = 0;

        loop {
            let op = match self.current() {
                Token::Multiply => BinaryOp::Mul,
                Token::Div => BinaryOp::Div,
                Token::Mod => BinaryOp::Mod,
                _ => break,
            };
            self.advance();
            links += 1;
            self.descend()?;
            let right = self.parse_unary_expr()?;
            left = Expr::Binary(Box::new(left), op, Box::new(right));
        }

        self.ascend(links);
        Ok(left)
    }

    fn parse_unary_expr(&mut self) -> Result<Expr, String> {
        if matches!(self.current(), Token::Minus) {
            self.advance();
            self.descend()?;
            let expr = self.parse_unary_expr()?;
            self.ascend(1);
            Ok(Expr::Negate(Box::new(expr)))
        } else {
            self.parse_union_expr()
        }
    }

    fn parse_union_expr(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_path_expr()?;
        let mut links = 0;

        while matches!(self.current(), Token::Pipe) {
            self.advance();
            links += 1;
            self.descend()?;
            let right = self.parse_path_expr()?;
            left = Expr::Union(Box::new(left), Box::new(right));
        }

        self.ascend(links);
        Ok(left)
    }

    /// Whether the current token begins a location step
    fn at_step_start(&self) -> bool {
        matches!(
            self.current(),
            Token::Name(_)
                | Token::NameTest(_)
                | Token::Star
                | Token::NodeType(_)
                | Token::At
                | Token::Axis(_)
                | Token::Dot
                | Token::DoubleDot
        )
    }

    /// Whether the current token begins a filter expression
    fn at_primary_start(&self) -> bool {
        match self.current() {
            Token::Number(_) | Token::String(_) | Token::LeftParen => true,
            Token::Name(_) => matches!(self.peek(), Token::LeftParen),
            _ => false,
        }
    }

    fn parse_path_expr(&mut self) -> Result<Expr, String> {
        let base = match self.current() {
            Token::Slash => {
                self.advance();
                if !self.at_step_start() {
                    return Ok(Expr::Root);
                }
                let step = self.parse_step()?;
                Expr::Path(Box::new(Expr::Root), Box::new(step))
            }
            Token::DoubleSlash => {
                self.advance();
                let step = self.parse_step()?;
                let desc = Expr::Path(Box::new(Expr::Root), Box::new(Step::descendant_or_self()));
                Expr::Path(Box::new(desc), Box::new(step))
            }
            _ if self.at_primary_start() => self.parse_filter_expr()?,
            _ if self.at_step_start() => Expr::Step(Box::new(self.parse_step()?)),
            token => return Err(format!("Unexpected token {:?}", token)),
        };

        self.parse_relative_steps(base)
    }

    /// Parse `/step` and `//step` continuations onto `expr`
    fn parse_relative_steps(&mut self, mut expr: Expr) -> Result<Expr, String> {
        let mut links = 0;
        loop {
            match self.current() {
                Token::Slash | Token::DoubleSlash => {
                    links += 1;
                    self.descend()?;
                }
                _ => break,
            }
            match self.current() {
                Token::Slash => {
                    self.advance();
                    let step = self.parse_step()?;
                    expr = Expr::Path(Box::new(expr), Box::new(step));
                }
                Token::DoubleSlash => {
                    self.advance();
                    let step = self.parse_step()?;
                    let desc = Expr::Path(Box::new(expr), Box::new(Step::descendant_or_self()));
                    expr = Expr::Path(Box::new(desc), Box::new(step));
                }
                _ => break,
            }
        }

        self.ascend(links);
        Ok(expr)
    }

    fn parse_filter_expr(&mut self) -> Result<Expr, String> {
        let mut expr = self.parse_primary_expr()?;
        let mut links = 0;

        while matches!(self.current(), Token::LeftBracket) {
            links += 1;
            self.descend()?;
            let pred = self.parse_predicate()?;
            expr = Expr::Filter(Box::new(expr), Box::new(pred));
        }

        self.ascend(links);
        Ok(expr)
    }

    fn parse_primary_expr(&mut self) -> Result<Expr, String> {
        match self.current().clone() {
            Token::Number(n) => {
                self.advance();
                Ok(Expr::Number(n))
            }
            Token::String(s) => {
                self.advance();
                Ok(Expr::String(s))
            }
            Token::LeftParen => {
                self.advance();
                let expr = self.parse_or_expr()?;
                self.expect(Token::RightParen, ")")?;
                Ok(expr)
            }
            Token::Name(name) => {
                self.advance();
                self.expect(Token::LeftParen, "(")?;
                let args = self.parse_function_args()?;
                Ok(Expr::Function(name, args))
            }
            token => Err(format!("Unexpected token {:?}", token)),
        }
    }

    fn parse_predicate(&mut self) -> Result<Expr, String> {
        self.expect(Token::LeftBracket, "[")?;
        let pred = self.parse_or_expr()?;
        self.expect(Token::RightBracket, "]")?;
        Ok(pred)
    }

    /// Parse a location step
    fn parse_step(&mut self) -> Result<Step, String> {
        match self.current() {
            Token::Dot => {
                self.advance();
                return Ok(Step::bare(Axis::Self_, NodeTest::Node));
            }
            Token::DoubleDot => {
                self.advance();
                return Ok(Step::bare(Axis::Parent, NodeTest::Node));
            }
            _ => {}
        }

        let mut axis = Axis::Child;
        match self.current().clone() {
            Token::At => {
                axis = Axis::Attribute;
                self.advance();
            }
            Token::Axis(name) => {
                axis = Axis::from_name(&name).ok_or_else(|| format!("Unknown axis: {}", name))?;
                self.advance();
                self.expect(Token::DoubleColon, "::")?;
            }
            _ => {}
        }

        let node_test = self.parse_node_test()?;

        let mut predicates = Vec::new();
        while matches!(self.current(), Token::LeftBracket) {
            predicates.push(self.parse_predicate()?);
        }

        Ok(Step {
            axis,
            node_test,
            predicates,
        })
    }

    fn parse_node_test(&mut self) -> Result<NodeTest, String> {
        let node_test = match self.current().clone() {
            Token::Star => NodeTest::Any,
            Token::Name(name) => NodeTest::Name(name),
            Token::NameTest(qname) => {
                if let Some(prefix) = qname.strip_suffix(":*") {
                    NodeTest::NamespaceWildcard(prefix.to_string())
                } else if let Some((prefix, local)) = qname.split_once(':') {
                    NodeTest::QName(prefix.to_string(), local.to_string())
                } else {
                    NodeTest::Name(qname)
                }
            }
            Token::NodeType(name) => {
                self.advance();
                self.expect(Token::LeftParen, "(")?;
                let arg = match self.current().clone() {
                    Token::String(s) if name == "processing-instruction" => {
                        self.advance();
                        Some(s)
                    }
                    _ => None,
                };
                self.expect(Token::RightParen, ")")?;

                return match name.as_str() {
                    "node" => Ok(NodeTest::Node),
                    "text" => Ok(NodeTest::Text),
                    "comment" => Ok(NodeTest::Comment),
                    "processing-instruction" => Ok(NodeTest::ProcessingInstruction(arg)),
                    _ => Err(format!("Unknown node type: {}", name)),
                };
            }
            token => return Err(format!("Expected node test, got {:?}", token)),
        };
        self.advance();
        Ok(node_test)
    }

    fn parse_function_args(&mut self) -> Result<Vec<Expr>, String> {
        let mut args = Vec::new();

        if !matches!(self.current(), Token::RightParen) {
            args.push(self.parse_or_expr()?);

            while matches!(self.current(), Token::Comma) {
                self.advance();
                args.push(self.parse_or_expr()?);
            }
        }

        self.expect(Token::RightParen, ")")?;
        Ok(args)
    }
}

/// Parse an XPath expression string
pub fn parse(input: &str) -> Result<Expr, String> {
    Parser::new(input)?.parse()
}
