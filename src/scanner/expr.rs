use std::fmt;
use tree_sitter::Node;

/// Owned view of a Go expression, detached from the syntax tree.
///
/// Only the shapes the call-site resolver reasons about get their own
/// variant; everything else is kept as source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// `name`
    Ident(String),
    /// `operand.field`
    Selector { operand: Box<Expr>, field: String },
    /// `function(args...)`
    Call { function: Box<Expr>, args: Vec<Expr> },
    /// Any other expression (literals, composites, index expressions...)
    Other { kind: String, text: String },
}

impl Expr {
    pub(crate) fn from_node(node: Node<'_>, source: &str) -> Self {
        let text = || node.utf8_text(source.as_bytes()).unwrap_or_default().to_string();

        match node.kind() {
            "identifier" => Expr::Ident(text()),
            "selector_expression" => {
                match (
                    node.child_by_field_name("operand"),
                    node.child_by_field_name("field"),
                ) {
                    (Some(operand), Some(field)) => Expr::Selector {
                        operand: Box::new(Expr::from_node(operand, source)),
                        field: field
                            .utf8_text(source.as_bytes())
                            .unwrap_or_default()
                            .to_string(),
                    },
                    _ => Expr::other(node, text()),
                }
            }
            "call_expression" => match node.child_by_field_name("function") {
                Some(function) => Expr::Call {
                    function: Box::new(Expr::from_node(function, source)),
                    args: node
                        .child_by_field_name("arguments")
                        .map(|args| arguments(args, source))
                        .unwrap_or_default(),
                },
                None => Expr::other(node, text()),
            },
            _ => Expr::other(node, text()),
        }
    }

    fn other(node: Node<'_>, text: String) -> Self {
        Expr::Other {
            kind: node.kind().to_string(),
            text,
        }
    }

    pub fn as_ident(&self) -> Option<&str> {
        match self {
            Expr::Ident(name) => Some(name),
            _ => None,
        }
    }
}

/// Named children of an `argument_list`, comments excluded.
pub(crate) fn arguments(list: Node<'_>, source: &str) -> Vec<Expr> {
    let mut cursor = list.walk();
    list.named_children(&mut cursor)
        .filter(|n| n.kind() != "comment")
        .map(|n| Expr::from_node(n, source))
        .collect()
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Ident(name) => write!(f, "{name}"),
            Expr::Selector { operand, field } => write!(f, "{operand}.{field}"),
            Expr::Call { function, args } => {
                write!(f, "{function}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
            Expr::Other { text, .. } => write!(f, "{text}"),
        }
    }
}
