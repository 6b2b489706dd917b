//! Custom panic hook for structured crash reports.
//!
//! A panic in gyv is a defect. The report says which pipeline state the crash
//! happened in and which project was being modified, since an interrupted run
//! may leave a `zz_gyv_codeinject-*.go` file behind.

use super::context::{get_current_context, InjectContext};
use crate::inject::injector::TEMP_FILE_PREFIX;
use std::panic::PanicHookInfo;

const VERSION: &str = env!("CARGO_PKG_VERSION");
const WIDTH: usize = 78;

/// Install the custom panic hook. Call early in `main`.
pub fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        print_crash_report(info);
    }));
}

fn print_crash_report(info: &PanicHookInfo<'_>) {
    let context = get_current_context();

    eprintln!();
    print_header();
    print_panic_details(info);
    print_context_section(&context);
    print_backtrace_section();
    print_footer(&context);
}

fn row(text: &str) {
    eprintln!("║  {:<width$}║", truncate(text, WIDTH - 2), width = WIDTH - 2);
}

fn separator(left: char, right: char) {
    eprintln!("{left}{}{right}", "═".repeat(WIDTH));
}

fn print_header() {
    let platform = std::env::consts::OS;
    let timestamp = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC");

    separator('╔', '╗');
    row("GYV CRASH REPORT");
    separator('╠', '╣');
    row(&format!("Version: {VERSION}"));
    row(&format!("Platform: {platform}"));
    row(&format!("Time: {timestamp}"));
    separator('╠', '╣');
}

fn print_panic_details(info: &PanicHookInfo<'_>) {
    row(&format!("PANIC: {}", extract_panic_message(info)));

    if let Some(location) = info.location() {
        row(&format!(
            "Location: {}:{}:{}",
            location.file(),
            location.line(),
            location.column()
        ));
    }
}

fn print_context_section(context: &InjectContext) {
    separator('╠', '╣');
    row("INJECTION CONTEXT:");

    match &context.phase {
        Some(phase) => row(&format!("  Phase: {phase}")),
        None => row("  Phase: (not set - crash occurred before injection started)"),
    }
    if let Some(project) = &context.project {
        row(&format!("  Project: {}", project.display()));
    }
    if let Some(symbol) = &context.symbol {
        row(&format!("  Symbol: {symbol}"));
    }
}

fn print_backtrace_section() {
    separator('╠', '╣');

    if std::env::var("RUST_BACKTRACE").is_ok() {
        row("STACK TRACE:");
        separator('╚', '╝');
        eprintln!();
        eprintln!("{}", std::backtrace::Backtrace::capture());
    } else {
        row("Run with RUST_BACKTRACE=1 for stack trace");
        separator('╚', '╝');
    }
}

fn print_footer(context: &InjectContext) {
    if let Some(project) = &context.project {
        eprintln!();
        eprintln!(
            "Check {} for a leftover {}*.go file and remove it.",
            project.display(),
            TEMP_FILE_PREFIX
        );
    }
}

fn extract_panic_message(info: &PanicHookInfo<'_>) -> String {
    if let Some(s) = info.payload().downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = info.payload().downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}
