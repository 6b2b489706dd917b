mod common;

use common::write;
use gyv::errors::ResolveError;
use gyv::inject::resolver::find_route_registrer;
use gyv::scanner::ImportSpec;
use indoc::indoc;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

const GOYAVE_V4: &str = "goyave.dev/goyave/v4";

fn project(main_go: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "main.go", main_go);
    dir
}

#[test]
fn test_qualified_registrer() {
    let dir = project(indoc! {r#"
        package main

        import (
            "github.com/acme/api/http/route"
            "goyave.dev/goyave/v4"
        )

        func main() {
            goyave.Start(route.Register)
        }
    "#});

    let reference = find_route_registrer(dir.path(), GOYAVE_V4).unwrap();
    assert_eq!(reference.value, "route.Register");
    assert_eq!(
        reference.package,
        Some(ImportSpec::new("github.com/acme/api/http/route"))
    );
}

#[test]
fn test_aliased_framework_and_registrer() {
    let dir = project(indoc! {r#"
        package main

        import (
            r "github.com/acme/api/http/router"
            g "goyave.dev/goyave/v4"
        )

        func main() {
            goyave.Start(ignored)
            g.Start(r.Register)
        }
    "#});

    let reference = find_route_registrer(dir.path(), GOYAVE_V4).unwrap();
    assert_eq!(reference.value, "r.Register");
    assert_eq!(
        reference.package,
        Some(ImportSpec::aliased("r", "github.com/acme/api/http/router"))
    );
}

#[test]
fn test_registrer_factory_call() {
    let dir = project(indoc! {r#"
        package main

        import (
            "github.com/acme/api/http/routes"
            "goyave.dev/goyave/v4"
        )

        func main() {
            goyave.Start(routes.Register())
        }
    "#});

    let reference = find_route_registrer(dir.path(), GOYAVE_V4).unwrap();
    assert_eq!(reference.value, "routes.Register()");
    assert_eq!(
        reference.package.map(|p| p.path),
        Some("github.com/acme/api/http/routes".to_string())
    );
}

#[test]
fn test_registrer_in_main_package() {
    let dir = project(indoc! {r#"
        package main

        import "goyave.dev/goyave/v4"

        func register(router *goyave.Router) {}

        func main() {
            goyave.Start(register)
        }
    "#});

    let reference = find_route_registrer(dir.path(), GOYAVE_V4).unwrap();
    assert_eq!(reference.value, "register");
    assert_eq!(reference.package, None);
}

#[test]
fn test_call_with_arguments_is_unsupported() {
    let dir = project(indoc! {r#"
        package main

        import "goyave.dev/goyave/v4"

        func main() {
            cfg := loadConfig()
            goyave.Start(buildRouter(cfg))
        }
    "#});

    match find_route_registrer(dir.path(), GOYAVE_V4) {
        Err(ResolveError::UnsupportedArgument {
            line, expression, ..
        }) => {
            assert_eq!(line, 7);
            assert_eq!(expression, "buildRouter(cfg)");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_other_start_methods_are_ignored() {
    let dir = project(indoc! {r#"
        package main

        import "goyave.dev/goyave/v4"

        func main() {
            server.Start(register)
            goyave.Start()
            goyave.Start(a, b)
        }
    "#});

    assert!(matches!(
        find_route_registrer(dir.path(), GOYAVE_V4),
        Err(ResolveError::NoStartCall { .. })
    ));
}

#[test]
fn test_first_file_wins() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "a.go",
        "package main\n\nimport \"goyave.dev/goyave/v4\"\n\nfunc a() { goyave.Start(first) }\n",
    );
    write(
        dir.path(),
        "b.go",
        "package main\n\nimport \"goyave.dev/goyave/v4\"\n\nfunc b() { goyave.Start(second) }\n",
    );

    assert_eq!(
        find_route_registrer(dir.path(), GOYAVE_V4).unwrap().value,
        "first"
    );
}

#[test]
fn test_subdirectories_are_not_scanned() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "cmd/server/main.go",
        "package main\n\nimport \"goyave.dev/goyave/v4\"\n\nfunc main() { goyave.Start(register) }\n",
    );

    assert!(matches!(
        find_route_registrer(dir.path(), GOYAVE_V4),
        Err(ResolveError::NoStartCall { .. })
    ));
}

#[test]
fn test_syntax_error_is_reported() {
    let dir = project("package main\n\nfunc main() {\n\tgoyave.Start(\n");

    assert!(matches!(
        find_route_registrer(dir.path(), GOYAVE_V4),
        Err(ResolveError::Scan(_))
    ));
}
