//! Panic hook that prints what the engine was doing when it crashed.

use super::context::{get_current_context, get_progress, AnalysisContext};
use std::panic::PanicHookInfo;

const VERSION: &str = env!("CARGO_PKG_VERSION");
const RULE: &str = "════════════════════════════════════════════════════════════════════════════════";

pub fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        eprintln!("{}", crash_report(info, &get_current_context(), get_progress()));
    }));
}

fn crash_report(info: &PanicHookInfo<'_>, context: &AnalysisContext, progress: (usize, usize)) -> String {
    let mut lines = vec![
        RULE.to_string(),
        format!("webaudit {VERSION} crashed on {}", std::env::consts::OS),
        format!("Time: {}", chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")),
        format!("Panic: {}", panic_message(info)),
    ];
    if let Some(location) = info.location() {
        lines.push(format!(
            "Location: {}:{}:{}",
            location.file(),
            location.line(),
            location.column()
        ));
    }
    lines.extend(context_lines(context, progress));
    if std::env::var_os("RUST_BACKTRACE").is_some() {
        lines.push(std::backtrace::Backtrace::capture().to_string());
    } else {
        lines.push("Run with RUST_BACKTRACE=1 for a stack trace".to_string());
    }
    lines.push(RULE.to_string());
    lines.join("\n")
}

fn context_lines(context: &AnalysisContext, (processed, total): (usize, usize)) -> Vec<String> {
    let mut lines = Vec::new();
    match context.phase {
        Some(phase) => lines.push(format!("Phase: {phase}")),
        None => lines.push("Phase: (not set)".to_string()),
    }
    if let Some(file) = &context.current_file {
        lines.push(format!("File: {file}"));
    }
    if total > 0 {
        lines.push(format!(
            "Progress: {processed} / {total} files ({}%)",
            processed * 100 / total
        ));
    }
    lines
}

fn panic_message(info: &PanicHookInfo<'_>) -> String {
    if let Some(s) = info.payload().downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = info.payload().downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
