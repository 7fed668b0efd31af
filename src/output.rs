use owo_colors::OwoColorize;
use std::io::{self, Write};

/// Small wrapper around stdout/stderr printing to provide consistent, colored
/// user-facing messages. Colors are enabled only when output is a TTY.
fn is_tty() -> bool {
    atty::is(atty::Stream::Stdout)
}

fn stderr_is_tty() -> bool {
    atty::is(atty::Stream::Stderr)
}

pub fn print_info(msg: &str) {
    if is_tty() {
        println!("{} {}", "info:".cyan().bold(), msg);
    } else {
        println!("info: {}", msg);
    }
}

pub fn print_warn(msg: &str) {
    if stderr_is_tty() {
        eprintln!("{} {}", "warn:".yellow().bold(), msg);
    } else {
        eprintln!("warn: {}", msg);
    }
}

pub fn print_error(msg: &str) {
    if stderr_is_tty() {
        eprintln!("{} {}", "error:".red().bold(), msg);
    } else {
        eprintln!("error: {}", msg);
    }
}

pub fn print_success(msg: &str) {
    if is_tty() {
        println!("{} {}", "ok:".green().bold(), msg);
    } else {
        println!("ok: {}", msg);
    }
}

/// Print a plain user-facing line (no prefix), e.g. the measurement table.
pub fn print_user(msg: &str) {
    println!("{}", msg);
}

/// Redraw the progress line on stderr. On a TTY the line is rewritten in place;
/// otherwise every tenth percent gets its own line.
pub fn print_progress(percent: u8) {
    let mut err = io::stderr().lock();
    if stderr_is_tty() {
        let _ = write!(err, "\r{} {:>3}%", "moving".cyan().bold(), percent);
        let _ = err.flush();
    } else if percent % 10 == 0 {
        let _ = writeln!(err, "progress: {percent}%");
    }
}

/// Terminate an in-place progress line so the next message starts cleanly.
pub fn finish_progress() {
    if stderr_is_tty() {
        eprintln!();
    }
}
