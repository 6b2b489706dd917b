//! Call-site resolver: finds the route registrer passed to `goyave.Start()`
//! and turns it into an expression usable from another file.

use crate::errors::ResolveError;
use crate::scanner::{self, Expr, ImportSpec};
use std::path::Path;

/// Package name of the framework when it is imported without alias.
pub const DEFAULT_FRAMEWORK_ALIAS: &str = "goyave";
pub const START_FUNCTION: &str = "Start";

/// A zero-argument expression (`Register`, `route.Register`,
/// `route.Register()`) and the import it needs, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallReference {
    pub value: String,
    pub package: Option<ImportSpec>,
}

/// Explicit alias under which `import_path` is imported, if any.
pub fn find_import_alias<'a>(imports: &'a [ImportSpec], import_path: &str) -> Option<&'a str> {
    imports
        .iter()
        .find(|i| i.path == import_path)
        .and_then(|i| i.name.as_deref())
}

/// Import providing the package referred to as `name`.
///
/// An explicit alias wins. Otherwise the first non-aliased import whose path
/// ends with `name` is used. That fallback is a heuristic: it is wrong when a
/// package name differs from the last segment of its import path.
pub fn find_import<'a>(imports: &'a [ImportSpec], name: &str) -> Option<&'a ImportSpec> {
    imports
        .iter()
        .find(|i| i.name.as_deref() == Some(name))
        .or_else(|| {
            imports
                .iter()
                .find(|i| i.name.is_none() && i.path.ends_with(name))
        })
}

/// The import as written inside an import block, or an empty string.
pub fn import_to_string(import: Option<&ImportSpec>) -> String {
    import.map(ImportSpec::to_string).unwrap_or_default()
}

/// Re-express `arg` as a [`CallReference`]. Only identifiers, qualified
/// identifiers and calls of those without arguments are supported; copying
/// arbitrary arguments is not attempted.
pub fn argument_to_call_reference(arg: &Expr, imports: &[ImportSpec]) -> Option<CallReference> {
    match arg {
        Expr::Ident(name) => Some(CallReference {
            value: name.clone(),
            package: None,
        }),
        Expr::Selector { operand, field } => {
            let base = operand.as_ident()?;
            Some(CallReference {
                value: format!("{base}.{field}"),
                package: find_import(imports, base).cloned(),
            })
        }
        Expr::Call { function, args } if args.is_empty() => {
            if !matches!(function.as_ref(), Expr::Ident(_) | Expr::Selector { .. }) {
                return None;
            }
            let reference = argument_to_call_reference(function, imports)?;
            Some(CallReference {
                value: format!("{}()", reference.value),
                ..reference
            })
        }
        _ => None,
    }
}

/// Find `<alias>.Start(<arg>)` in the immediate source files of `directory`
/// and resolve `<arg>`. The first call found wins; other calls are reported
/// with a warning.
pub fn find_route_registrer(
    directory: &Path,
    framework_import_path: &str,
) -> Result<CallReference, ResolveError> {
    let mut calls = scanner::find_calls_matching(directory, |imports, base, name, args| {
        let alias =
            find_import_alias(imports, framework_import_path).unwrap_or(DEFAULT_FRAMEWORK_ALIAS);
        name == START_FUNCTION && args.len() == 1 && base.as_ident() == Some(alias)
    });

    let site = calls
        .next()
        .transpose()?
        .ok_or_else(|| ResolveError::NoStartCall {
            directory: directory.to_path_buf(),
        })?;

    match calls.next() {
        Some(Ok(other)) => log::warn!(
            "Several goyave.Start() calls found. Using {}:{}, ignoring {}:{}",
            site.path.display(),
            site.line,
            other.path.display(),
            other.line
        ),
        Some(Err(e)) => log::debug!("Stopped looking for other goyave.Start() calls: {e}"),
        None => {}
    }

    let arg = &site.args[0];
    let reference = argument_to_call_reference(arg, &site.imports).ok_or_else(|| {
        ResolveError::UnsupportedArgument {
            file: site.path.clone(),
            line: site.line,
            expression: arg.to_string(),
        }
    })?;

    log::debug!(
        "Route registrer {} found in {}:{}",
        reference.value,
        site.path.display(),
        site.line
    );
    Ok(reference)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ident(name: &str) -> Expr {
        Expr::Ident(name.to_string())
    }

    fn selector(base: &str, field: &str) -> Expr {
        Expr::Selector {
            operand: Box::new(ident(base)),
            field: field.to_string(),
        }
    }

    fn call(function: Expr, args: Vec<Expr>) -> Expr {
        Expr::Call {
            function: Box::new(function),
            args,
        }
    }

    fn imports() -> Vec<ImportSpec> {
        vec![
            ImportSpec::new("goyave.dev/goyave/v3"),
            ImportSpec::new("github.com/acme/api/http/route"),
            ImportSpec::aliased("r", "github.com/acme/api/http/router"),
        ]
    }

    #[test]
    fn test_find_import_prefers_alias() {
        let imports = imports();
        assert_eq!(
            find_import(&imports, "r").unwrap().path,
            "github.com/acme/api/http/router"
        );
        assert_eq!(
            find_import(&imports, "route").unwrap().path,
            "github.com/acme/api/http/route"
        );
        assert!(find_import(&imports, "router").is_none());
    }

    #[test]
    fn test_find_import_alias() {
        let imports = vec![ImportSpec::aliased("g", "goyave.dev/goyave/v4")];
        assert_eq!(find_import_alias(&imports, "goyave.dev/goyave/v4"), Some("g"));
        assert_eq!(find_import_alias(&imports, "goyave.dev/goyave/v3"), None);
    }

    #[test]
    fn test_import_to_string() {
        assert_eq!(import_to_string(None), "");
        assert_eq!(
            import_to_string(Some(&ImportSpec::aliased("r", "a/router"))),
            "r \"a/router\""
        );
    }

    #[test]
    fn test_argument_shapes() {
        let imports = imports();

        assert_eq!(
            argument_to_call_reference(&ident("register"), &imports),
            Some(CallReference {
                value: "register".into(),
                package: None
            })
        );
        assert_eq!(
            argument_to_call_reference(&selector("route", "Register"), &imports)
                .unwrap()
                .value,
            "route.Register"
        );

        let reference =
            argument_to_call_reference(&call(selector("r", "Build"), vec![]), &imports).unwrap();
        assert_eq!(reference.value, "r.Build()");
        assert_eq!(reference.package, Some(imports[2].clone()));

        assert_eq!(
            argument_to_call_reference(&call(ident("build"), vec![]), &imports)
                .unwrap()
                .value,
            "build()"
        );
    }

    #[test]
    fn test_unsupported_argument_shapes() {
        let imports = imports();
        let with_args = call(ident("buildRouter"), vec![ident("cfg")]);
        assert!(argument_to_call_reference(&with_args, &imports).is_none());

        let literal = Expr::Other {
            kind: "interpreted_string_literal".into(),
            text: "\"x\"".into(),
        };
        assert!(argument_to_call_reference(&literal, &imports).is_none());

        let nested = Expr::Selector {
            operand: Box::new(selector("a", "b")),
            field: "C".into(),
        };
        assert!(argument_to_call_reference(&nested, &imports).is_none());

        let curried = call(call(ident("build"), vec![]), vec![]);
        assert!(argument_to_call_reference(&curried, &imports).is_none());
    }
}
