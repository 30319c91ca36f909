use owo_colors::OwoColorize;

/// Colored user-facing messages for the prompt flow and final report.
/// Colors are enabled only when stdout is a TTY.
fn is_tty() -> bool {
    atty::is(atty::Stream::Stdout)
}

pub fn print_info(msg: &str) {
    if is_tty() {
        println!("{} {}", "info:".cyan().bold(), msg);
    } else {
        println!("info: {}", msg);
    }
}

pub fn print_warn(msg: &str) {
    if is_tty() {
        eprintln!("{} {}", "warn:".yellow().bold(), msg);
    } else {
        eprintln!("warn: {}", msg);
    }
}

pub fn print_error(msg: &str) {
    if is_tty() {
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

/// Section heading, e.g. "=== Source ===" before a directory summary.
pub fn print_heading(title: &str) {
    if is_tty() {
        println!("\n{}", format!("=== {title} ===").bold());
    } else {
        println!("\n=== {title} ===");
    }
}

/// Plain line with no prefix.
pub fn print_user(msg: &str) {
    println!("{}", msg);
}
