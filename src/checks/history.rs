//! Human-readable rendering of an image's layer history.

use crate::image::LayerRecord;

const SHELL_PREFIX: &str = "/bin/sh -c";
const NOP_MARKER: &str = "#(nop)";

/// Formats `docker history` records as report diagnostics.
#[derive(Debug, Clone)]
pub struct LayerHistoryFormatter {
    width: usize,
}

impl LayerHistoryFormatter {
    pub fn new(width: usize) -> Self {
        Self {
            width: width.max(20),
        }
    }

    pub fn name(&self) -> &'static str {
        "layer_history"
    }

    /// One entry per layer, newest first as supplied.
    pub fn format(&self, layers: &[LayerRecord]) -> Vec<String> {
        layers.iter().map(|layer| self.format_layer(layer)).collect()
    }

    fn format_layer(&self, layer: &LayerRecord) -> String {
        let mut lines = vec![format!(
            "{} ({})",
            layer.created_at,
            human_size(layer.size_bytes)
        )];
        for step in split_command(&layer.command) {
            lines.extend(wrap(&step, self.width));
        }
        lines.join("\n")
    }
}

/// Strip the shell wrapper and split compound commands into steps.
pub fn split_command(command: &str) -> Vec<String> {
    let mut rest = command.trim();
    if let Some(stripped) = rest.strip_prefix(SHELL_PREFIX) {
        rest = stripped.trim_start();
    }
    if let Some(stripped) = rest.strip_prefix(NOP_MARKER) {
        return vec![stripped.trim().to_string()];
    }
    rest.split("&&")
        .flat_map(|part| part.split(';'))
        .map(str::trim)
        .filter(|step| !step.is_empty())
        .map(str::to_string)
        .collect()
}

/// Greedy word wrap; words longer than `width` are split.
pub fn wrap(line: &str, width: usize) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    for word in line.split_whitespace() {
        let mut word = word;
        while word.chars().count() > width {
            if !current.is_empty() {
                out.push(std::mem::take(&mut current));
            }
            let split_at = word
                .char_indices()
                .nth(width)
                .map_or(word.len(), |(idx, _)| idx);
            out.push(word[..split_at].to_string());
            word = &word[split_at..];
        }
        if word.is_empty() {
            continue;
        }
        let needed = current.chars().count() + usize::from(!current.is_empty()) + word.chars().count();
        if !current.is_empty() && needed > width {
            out.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "kB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1000.0 && unit < UNITS.len() - 1 {
        value /= 1000.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}
