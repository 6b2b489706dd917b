use super::expr::{arguments, Expr};
use crate::errors::ScanError;
use std::fmt;
use std::path::{Path, PathBuf};
use tree_sitter::{Node, Parser, Tree};

/// An import declaration: optional local name and unquoted path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSpec {
    /// Explicit alias, `_` or `.` when present
    pub name: Option<String>,
    pub path: String,
}

impl ImportSpec {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            name: None,
            path: path.into(),
        }
    }

    pub fn aliased(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            path: path.into(),
        }
    }

    /// Final segment of the import path.
    pub fn last_segment(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

/// Renders the import as it appears inside an import block, without the
/// `import` keyword: `alias "path"` or `"path"`.
impl fmt::Display for ImportSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = &self.name {
            write!(f, "{name} ")?;
        }
        write!(f, "\"{}\"", self.path)
    }
}

/// A call expression found in a source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub callee: Expr,
    pub args: Vec<Expr>,
    /// 1-based line of the call
    pub line: usize,
}

impl Call {
    /// `(base, name)` when the callee is `base.name`.
    pub fn selector(&self) -> Option<(&Expr, &str)> {
        match &self.callee {
            Expr::Selector { operand, field } => Some((operand.as_ref(), field.as_str())),
            _ => None,
        }
    }
}

/// A parsed Go source file. Comments are kept in the tree.
pub struct GoSource {
    path: PathBuf,
    source: String,
    tree: Tree,
}

impl fmt::Debug for GoSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GoSource").field("path", &self.path).finish()
    }
}

impl GoSource {
    pub fn parse_file(path: &Path) -> Result<Self, ScanError> {
        let source = std::fs::read_to_string(path).map_err(|source| ScanError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse_str(path, source)
    }

    pub fn parse_str(path: &Path, source: String) -> Result<Self, ScanError> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_go::LANGUAGE.into())
            .map_err(|e| ScanError::Language(e.to_string()))?;

        let tree = parser
            .parse(&source, None)
            .ok_or_else(|| ScanError::Parse {
                path: path.to_path_buf(),
                line: 1,
                column: 1,
            })?;

        if let Some(node) = first_error(tree.root_node()) {
            let position = node.start_position();
            return Err(ScanError::Parse {
                path: path.to_path_buf(),
                line: position.row + 1,
                column: position.column + 1,
            });
        }

        Ok(Self {
            path: path.to_path_buf(),
            source,
            tree,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn text(&self, node: Node<'_>) -> &str {
        node.utf8_text(self.source.as_bytes()).unwrap_or_default()
    }

    /// Name declared by the `package` clause.
    pub fn package_name(&self) -> Option<String> {
        let root = self.tree.root_node();
        let mut cursor = root.walk();
        let clause = root
            .named_children(&mut cursor)
            .find(|n| n.kind() == "package_clause")?;
        let mut cursor = clause.walk();
        let name = clause
            .named_children(&mut cursor)
            .find(|n| n.kind() == "package_identifier")
            .map(|n| self.text(n).to_string());
        name
    }

    pub fn imports(&self) -> Vec<ImportSpec> {
        let mut imports = Vec::new();
        walk_preorder(self.tree.root_node(), |node| {
            if node.kind() != "import_spec" {
                return;
            }
            let Some(path) = node.child_by_field_name("path") else {
                return;
            };
            imports.push(ImportSpec {
                name: node
                    .child_by_field_name("name")
                    .map(|n| self.text(n).to_string()),
                path: self.text(path).trim_matches(|c| c == '"' || c == '`').to_string(),
            });
        });
        imports
    }

    /// Names of top-level functions (methods excluded) that are exported,
    /// take no parameters and declare no results.
    pub fn exported_functions(&self) -> Vec<String> {
        let root = self.tree.root_node();
        let mut cursor = root.walk();
        root.named_children(&mut cursor)
            .filter(|n| n.kind() == "function_declaration")
            .filter(|n| n.child_by_field_name("result").is_none())
            .filter(|n| {
                n.child_by_field_name("parameters")
                    .is_some_and(|params| declared_parameters(params) == 0)
            })
            .filter_map(|n| n.child_by_field_name("name"))
            .map(|name| self.text(name))
            .filter(|name| is_exported(name))
            .map(str::to_string)
            .collect()
    }

    /// Every call expression, in pre-order.
    pub fn calls(&self) -> Vec<Call> {
        let mut calls = Vec::new();
        walk_preorder(self.tree.root_node(), |node| {
            if node.kind() != "call_expression" {
                return;
            }
            let Some(function) = node.child_by_field_name("function") else {
                return;
            };
            calls.push(Call {
                callee: Expr::from_node(function, &self.source),
                args: node
                    .child_by_field_name("arguments")
                    .map(|args| arguments(args, &self.source))
                    .unwrap_or_default(),
                line: node.start_position().row + 1,
            });
        });
        calls
    }
}

/// Go exports identifiers starting with an upper case letter.
pub fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

fn declared_parameters(params: Node<'_>) -> usize {
    let mut cursor = params.walk();
    params
        .named_children(&mut cursor)
        .filter(|n| n.kind() != "comment")
        .count()
}

fn first_error(root: Node<'_>) -> Option<Node<'_>> {
    if !root.has_error() {
        return None;
    }
    let mut found = None;
    walk_preorder(root, |node| {
        if found.is_none() && (node.is_error() || node.is_missing()) {
            found = Some(node);
        }
    });
    found.or(Some(root))
}

/// Iterative pre-order traversal.
fn walk_preorder<'t>(root: Node<'t>, mut visit: impl FnMut(Node<'t>)) {
    let mut cursor = root.walk();
    loop {
        visit(cursor.node());
        if cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return;
            }
        }
    }
}
