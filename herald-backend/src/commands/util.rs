//! Presentation helpers shared by the dispatcher's replies and the built-in
//! commands.

/// Non-breaking space, keeps multi-word usages from wrapping in chat clients
const NBSP: char = '\u{a0}';

/// "Multiple commands found" text listing every candidate
pub fn disambiguation(names: &[&str], label: &str) -> String {
    let list = names
        .iter()
        .map(|n| format!("\"{}\"", n.replace(' ', &NBSP.to_string())))
        .collect::<Vec<_>>()
        .join(",   ");
    format!("Multiple {} found, please be more specific: {}", label, list)
}

/// How to invoke `command`: with the prefix, by mentioning the bot, or both.
/// With neither, the bare command is shown (direct messages need no prefix).
pub fn usage(command: &str, prefix: Option<&str>, bot_name: Option<&str>) -> String {
    let command = command.replace(' ', &NBSP.to_string());

    let prefix_part = prefix.map(|p| {
        let mut p = p.to_string();
        if p.chars().count() > 1 && !p.ends_with(' ') {
            p.push(' ');
        }
        format!("`{}{}`", p.replace(' ', &NBSP.to_string()), command)
    });
    let mention_part = bot_name.map(|name| {
        format!("`@{}{}{}`", name.replace(' ', &NBSP.to_string()), NBSP, command)
    });

    match (prefix_part, mention_part) {
        (Some(p), Some(m)) => format!("{} or {}", p, m),
        (Some(p), None) => p,
        (None, Some(m)) => m,
        (None, None) => format!("`{}`", command),
    }
}

/// Cut `text` to at most `max` characters for log lines
pub fn preview(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        format!("{}...", text.chars().take(max).collect::<String>())
    } else {
        text.to_string()
    }
}
