use console::style;

use crate::types::{ChatBubble, Role};

pub struct Output;

impl Output {
    pub fn new() -> Self {
        Self
    }

    pub fn success(&self, message: &str) {
        println!("{} {}", style("✓").green(), message);
    }

    pub fn error(&self, message: &str) {
        eprintln!("{} {}", style("✗").red(), message);
    }

    pub fn warning(&self, message: &str) {
        println!("{} {}", style("⚠").yellow(), message);
    }

    pub fn info(&self, message: &str) {
        println!("{} {}", style("ℹ").blue(), message);
    }

    pub fn header(&self, message: &str) {
        println!("\n{}", style(message).bold().underlined());
    }

    pub fn section(&self, message: &str) {
        println!("\n{}", style(message).bold());
        println!("{}", "─".repeat(40));
    }

    /// Aligned `label: value` row
    pub fn field(&self, label: &str, value: &str) {
        println!("  {:<22} {}", style(format!("{}:", label)).dim(), value);
    }

    pub fn bubble(&self, bubble: &ChatBubble) {
        let tag = match &bubble.role {
            Role::User => style("you").cyan().bold(),
            Role::Assistant => style("support").green().bold(),
            Role::Draft => style("draft").yellow().bold(),
            Role::Other(other) => style(other.as_str()).dim().bold(),
        };
        println!("{} {}", tag, bubble.text);
    }
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}
