//! Line-oriented parser for the go.mod format.
//!
//! Only the directives the injector needs are kept (`module`, `go`,
//! `require`). `replace`, `exclude`, `retract`, `toolchain`, `godebug`, `tool`
//! and `ignore` are accepted and skipped, on a single line or as a block.

use super::{ModFile, ModuleVersion, Require};
use crate::errors::ManifestError;
use std::path::Path;

const IGNORED_DIRECTIVES: &[&str] = &[
    "replace",
    "exclude",
    "retract",
    "toolchain",
    "godebug",
    "tool",
    "ignore",
];

/// Parse go.mod `contents`. `path` is only used for error reporting.
pub fn parse_str(path: &Path, contents: &str) -> Result<ModFile, ManifestError> {
    let mut file = ModFile {
        path: path.to_path_buf(),
        ..ModFile::default()
    };
    let error = |line: usize, message: String| ManifestError::Parse {
        path: path.to_path_buf(),
        line,
        message,
    };

    // Directive of the currently open "verb (" block and the line it started on
    let mut block: Option<(String, usize)> = None;

    for (index, raw) in contents.lines().enumerate() {
        let line = index + 1;
        let (tokens, comment) = lex(raw).map_err(|message| error(line, message))?;
        if tokens.is_empty() {
            continue;
        }

        if let Some((verb, _)) = &block {
            if tokens == [")"] {
                block = None;
                continue;
            }
            apply(&mut file, verb, &tokens, comment).map_err(|message| error(line, message))?;
            continue;
        }

        let (verb, args) = tokens.split_first().map(|(v, a)| (v.as_str(), a)).unwrap_or_default();
        match args {
            [open] if open == "(" => block = Some((verb.to_string(), line)),
            [open, close] if open == "(" && close == ")" => {}
            _ => apply(&mut file, verb, args, comment).map_err(|message| error(line, message))?,
        }
    }

    if let Some((verb, line)) = block {
        return Err(error(line, format!("unterminated {verb} block")));
    }

    Ok(file)
}

fn apply(file: &mut ModFile, verb: &str, args: &[String], comment: Option<&str>) -> Result<(), String> {
    match verb {
        "module" => match args {
            [path] => {
                if file.module.is_some() {
                    return Err("repeated module statement".to_string());
                }
                file.module = Some(path.clone());
                Ok(())
            }
            _ => Err("usage: module module/path".to_string()),
        },
        "go" => match args {
            [version] => {
                file.go_version = Some(version.clone());
                Ok(())
            }
            _ => Err("usage: go 1.23".to_string()),
        },
        "require" => match args {
            [path, version] => {
                file.requires.push(Require {
                    module: ModuleVersion {
                        path: path.clone(),
                        version: version.clone(),
                    },
                    indirect: is_indirect(comment),
                });
                Ok(())
            }
            _ => Err("usage: require module/path v1.2.3".to_string()),
        },
        _ if IGNORED_DIRECTIVES.contains(&verb) => Ok(()),
        _ => Err(format!("unknown directive: {verb}")),
    }
}

fn is_indirect(comment: Option<&str>) -> bool {
    comment
        .map(str::trim)
        .is_some_and(|c| c == "indirect" || c.starts_with("indirect;"))
}

/// Split a line into tokens and its trailing `//` comment, if any.
///
/// Interpreted (`"..."`) and raw (`` `...` ``) strings are unquoted. `(`, `)`
/// and `=>` are separate tokens.
fn lex(line: &str) -> Result<(Vec<String>, Option<&str>), String> {
    let mut tokens = Vec::new();
    let mut chars = line.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '/' if line[start..].starts_with("//") => {
                return Ok((tokens, Some(&line[start + 2..])));
            }
            '(' | ')' => {
                tokens.push(c.to_string());
                chars.next();
            }
            '"' => {
                chars.next();
                let mut value = String::new();
                let mut closed = false;
                while let Some((_, c)) = chars.next() {
                    match c {
                        '\\' => match chars.next() {
                            Some((_, escaped)) => value.push(escaped),
                            None => break,
                        },
                        '"' => {
                            closed = true;
                            break;
                        }
                        _ => value.push(c),
                    }
                }
                if !closed {
                    return Err("unterminated quoted string".to_string());
                }
                tokens.push(value);
            }
            '`' => {
                chars.next();
                let rest = &line[start + 1..];
                let end = rest
                    .find('`')
                    .ok_or_else(|| "unterminated raw string".to_string())?;
                tokens.push(rest[..end].to_string());
                // Skip the raw string body and its closing backquote
                while chars.next_if(|&(i, _)| i <= start + 1 + end).is_some() {}
            }
            _ => {
                let rest = &line[start..];
                let end = rest
                    .find(|c: char| c.is_whitespace() || matches!(c, '(' | ')' | '"' | '`'))
                    .unwrap_or(rest.len());
                let end = rest[..end].find("//").unwrap_or(end);
                tokens.push(rest[..end].to_string());
                while chars.next_if(|&(i, _)| i < start + end).is_some() {}
            }
        }
    }

    Ok((tokens, None))
}
