//! Source scanner: single-level listing of Go files and the two queries the
//! injector needs, exported seeder candidates and the framework start call.
//!
//! Both queries are lazy. Nothing is cached: iterating again lists and parses
//! the directory again.

mod expr;
mod source;

pub use expr::Expr;
pub use source::{is_exported, Call, GoSource, ImportSpec};

use crate::errors::ScanError;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const SOURCE_EXTENSION: &str = "go";

/// Immediate `.go` files of `directory`, in lexical order.
pub fn list_source_files(directory: &Path) -> Result<Vec<PathBuf>, ScanError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(directory)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| ScanError::ReadDir {
            path: directory.to_path_buf(),
            message: e.to_string(),
        })?;
        if entry.file_type().is_file()
            && entry.path().extension().and_then(|e| e.to_str()) == Some(SOURCE_EXTENSION)
        {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Parsed files of a directory, listed on first use.
struct SourceFiles {
    directory: PathBuf,
    files: Option<std::vec::IntoIter<PathBuf>>,
    exhausted: bool,
}

impl SourceFiles {
    fn new(directory: &Path) -> Self {
        Self {
            directory: directory.to_path_buf(),
            files: None,
            exhausted: false,
        }
    }
}

impl Iterator for SourceFiles {
    type Item = Result<GoSource, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }
        if self.files.is_none() {
            match list_source_files(&self.directory) {
                Ok(files) => self.files = Some(files.into_iter()),
                Err(e) => {
                    self.exhausted = true;
                    return Some(Err(e));
                }
            }
        }

        let path = self.files.as_mut()?.next()?;
        log::debug!("Scanning {}", path.display());
        let parsed = GoSource::parse_file(&path);
        if parsed.is_err() {
            self.exhausted = true;
        }
        Some(parsed)
    }
}

/// Restartable sequence of exported `func Name()` declarations in a directory.
#[derive(Debug, Clone)]
pub struct ExportedFunctions {
    directory: PathBuf,
}

impl ExportedFunctions {
    /// Start a new scan of the directory.
    pub fn iter(&self) -> ExportedFunctionsIter {
        ExportedFunctionsIter {
            sources: SourceFiles::new(&self.directory),
            pending: VecDeque::new(),
        }
    }
}

impl<'a> IntoIterator for &'a ExportedFunctions {
    type Item = Result<String, ScanError>;
    type IntoIter = ExportedFunctionsIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub struct ExportedFunctionsIter {
    sources: SourceFiles,
    pending: VecDeque<String>,
}

impl Iterator for ExportedFunctionsIter {
    type Item = Result<String, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(name) = self.pending.pop_front() {
                return Some(Ok(name));
            }
            match self.sources.next()? {
                Ok(source) => self.pending.extend(source.exported_functions()),
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

/// Exported functions without parameters nor results, across the immediate
/// source files of `directory`.
pub fn find_exported_functions(directory: &Path) -> ExportedFunctions {
    ExportedFunctions {
        directory: directory.to_path_buf(),
    }
}

pub fn collect_exported_functions(directory: &Path) -> Result<Vec<String>, ScanError> {
    find_exported_functions(directory).iter().collect()
}

/// A call expression matched by a predicate, with enough context to resolve
/// the identifiers it uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite {
    pub path: PathBuf,
    pub line: usize,
    pub callee: Expr,
    pub args: Vec<Expr>,
    /// Imports of the file containing the call
    pub imports: Vec<ImportSpec>,
}

/// Lazy sequence of matching calls: files in listing order, calls in
/// pre-order within a file.
pub struct CallMatches<P> {
    sources: SourceFiles,
    pending: VecDeque<CallSite>,
    predicate: P,
}

impl<P> Iterator for CallMatches<P>
where
    P: FnMut(&[ImportSpec], &Expr, &str, &[Expr]) -> bool,
{
    type Item = Result<CallSite, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(site) = self.pending.pop_front() {
                return Some(Ok(site));
            }
            let source = match self.sources.next()? {
                Ok(source) => source,
                Err(e) => return Some(Err(e)),
            };

            let imports = source.imports();
            for call in source.calls() {
                let matched = call.selector().is_some_and(|(base, name)| {
                    (self.predicate)(imports.as_slice(), base, name, call.args.as_slice())
                });
                if matched {
                    self.pending.push_back(CallSite {
                        path: source.path().to_path_buf(),
                        line: call.line,
                        callee: call.callee,
                        args: call.args,
                        imports: imports.clone(),
                    });
                }
            }
        }
    }
}

/// Every call `base.name(args)` for which `predicate(imports, base, name, args)`
/// holds. Calls whose callee is not a selector are never offered.
pub fn find_calls_matching<P>(directory: &Path, predicate: P) -> CallMatches<P>
where
    P: FnMut(&[ImportSpec], &Expr, &str, &[Expr]) -> bool,
{
    CallMatches {
        sources: SourceFiles::new(directory),
        pending: VecDeque::new(),
        predicate,
    }
}

/// First matching call. Scanning stops there.
pub fn find_call_matching<P>(directory: &Path, predicate: P) -> Result<Option<CallSite>, ScanError>
where
    P: FnMut(&[ImportSpec], &Expr, &str, &[Expr]) -> bool,
{
    find_calls_matching(directory, predicate).next().transpose()
}

/// Package declared by the non-test source files of `directory`.
pub fn package_name(directory: &Path) -> Result<Option<String>, ScanError> {
    for path in list_source_files(directory)? {
        let is_test = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with("_test.go"));
        if is_test {
            continue;
        }
        if let Some(name) = GoSource::parse_file(&path)?.package_name() {
            return Ok(Some(name));
        }
    }
    Ok(None)
}
