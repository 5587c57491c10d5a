use crate::output::is_quiet;
use crate::profile::Template;
use crate::ui::{theme, Icons};
use std::net::SocketAddr;

/// Decorative title line; suppressed in quiet mode
pub fn header(text: &str) {
    if is_quiet() {
        return;
    }
    let t = theme();
    println!("{} {}", Icons::ROCKET, t.paint(text, &t.header));
}

/// Section divider; suppressed in quiet mode
pub fn section(title: &str) {
    if is_quiet() {
        return;
    }
    let t = theme();
    println!();
    println!("━{}━", t.paint(title, &t.header));
}

/// Banner for the active profile
pub fn profile_banner(name: &str, template: Template) {
    if is_quiet() {
        println!("{}", name);
        return;
    }
    let t = theme();
    println!(
        "{} {} {}",
        Icons::PERSON,
        t.paint(name, &t.accent),
        t.paint(&format!("({})", template), &t.muted)
    );
}

pub fn success(message: &str) {
    let t = theme();
    println!("{} {}", Icons::CHECK, t.paint(message, &t.success));
}

pub fn error(message: &str) {
    let t = theme();
    eprintln!("{} {}", Icons::CROSS, t.paint(message, &t.error));
}

pub fn warn(message: &str) {
    let t = theme();
    eprintln!("{} {}", Icons::WARN, t.paint(message, &t.warn));
}

/// `<icon> label: value`
pub fn field(icon: &str, label: &str, value: &str) {
    let t = theme();
    println!("{} {}: {}", icon, t.paint(label, &t.label), value);
}

/// Indented `label value`
pub fn note(label: &str, value: &str) {
    let t = theme();
    println!("  {} {}", t.paint(label, &t.label), value);
}

pub fn muted(text: &str) -> String {
    let t = theme();
    t.paint(text, &t.muted)
}

pub fn server_started(addr: &SocketAddr) {
    println!("{} Server running at http://{}", Icons::GLOBE, addr);
}
