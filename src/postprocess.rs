//! Cleanup applied to the model's reply before it is written to disk.

use crate::Error;

const FENCE: &str = "```";
const PREVIEW_CHARS: usize = 500;

/// Appended when the reply has no `if __name__ == '__main__':` guard.
pub const DEFAULT_MAIN_BLOCK: &str = "\n\n# --- Main execution block ---\n\
if __name__ == '__main__':\n    app.run(debug=True)\n";

/// Details recorded in the comment header of the generated script.
#[derive(Debug, Clone, Default)]
pub struct HeaderInfo {
    pub dataset_path: String,
    pub user_prompt: String,
    pub model: String,
    pub provider: String,
}

/// Remove markdown code fences around a reply.
///
/// A reply fenced from start to end keeps everything between the outer fences. When prose
/// precedes the first fence, the first fenced block is extracted. A fence that appears after
/// the code has started (inside a `dcc.Markdown` string, say) is part of the script and is
/// left alone. A bare leading `python` line, left behind when only the backticks were stripped
/// upstream, is removed as well.
pub fn strip_code_fences(text: &str) -> String {
    let trimmed = text.trim();

    let body = match trimmed.find(FENCE) {
        Some(open) if !looks_like_dash_script(&trimmed[..open]) => {
            let after_open = &trimmed[open + FENCE.len()..];
            // Skip the info string (`python`, `py`, ...) up to the end of the line.
            let code = after_open.find('\n').map_or("", |i| &after_open[i + 1..]);
            match code.strip_suffix(FENCE) {
                Some(whole) if open == 0 => whole,
                _ => code.find(FENCE).map_or(code, |close| &code[..close]),
            }
        }
        _ => trimmed.strip_suffix(FENCE).unwrap_or(trimmed),
    };

    let body = body.trim();
    let body = match body.split_once('\n') {
        Some((first, rest)) if is_language_tag(first) => rest,
        None if is_language_tag(body) => "",
        _ => body,
    };

    body.trim_matches('`').trim().to_string()
}

fn is_language_tag(line: &str) -> bool {
    matches!(line.trim(), "python" | "py" | "python3")
}

/// Dash scripts start with `import dash`; anything else is not what was asked for.
pub fn looks_like_dash_script(code: &str) -> bool {
    code.contains("import dash")
}

/// Whether the script already has a `__main__` guard (either quote style).
pub fn has_main_block(code: &str) -> bool {
    code.lines().any(|line| {
        let line = line.trim();
        line.starts_with("if __name__")
            && (line.contains("'__main__'") || line.contains("\"__main__\""))
    })
}

/// Append the default run block if it is missing. Returns whether it was appended.
pub fn ensure_main_block(code: String) -> (String, bool) {
    if has_main_block(&code) {
        return (code, false);
    }
    let mut code = code.trim_end().to_string();
    code.push_str(DEFAULT_MAIN_BLOCK);
    (code, true)
}

/// Prepend a `#` comment header describing how the script was produced.
pub fn prepend_header(code: &str, info: &HeaderInfo) -> String {
    let mut header = String::new();
    header.push_str(&format!(
        "# Generated by {} {}\n",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    ));
    header.push_str(&format!("# Dataset: {}\n", info.dataset_path));
    if !info.model.is_empty() {
        header.push_str(&format!("# Model: {} ({})\n", info.model, info.provider));
    }
    header.push_str("# Prompt:\n");
    for line in info.user_prompt.lines() {
        if line.trim().is_empty() {
            header.push_str("#\n");
        } else {
            header.push_str(&format!("#   {}\n", line.trim_end()));
        }
    }
    header.push_str("# Review this code before running it.\n\n");

    let mut out = header;
    out.push_str(code);
    if !out.ends_with('\n') {
        out.push('\n');
    }
    out
}

/// Outcome of [`PostProcessor::process`].
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedScript {
    pub code: String,
    pub main_block_appended: bool,
}

/// Runs the full cleanup pipeline on a raw model reply.
#[derive(Debug, Clone)]
pub struct PostProcessor {
    pub add_header: bool,
    pub require_dash_import: bool,
}

impl Default for PostProcessor {
    fn default() -> Self {
        Self {
            add_header: true,
            require_dash_import: true,
        }
    }
}

impl PostProcessor {
    pub fn process(&self, raw: &str, info: &HeaderInfo) -> Result<ProcessedScript, Error> {
        let code = strip_code_fences(raw);
        if code.is_empty() {
            return Err(Error::invalid_response("the model returned no code"));
        }
        if self.require_dash_import && !looks_like_dash_script(&code) {
            let preview: String = raw.chars().take(PREVIEW_CHARS).collect();
            return Err(Error::invalid_response(format!(
                "reply does not import dash; first {PREVIEW_CHARS} chars:\n{preview}"
            )));
        }

        let (code, main_block_appended) = ensure_main_block(code);
        if main_block_appended {
            tracing::warn!("generated code was missing the __main__ block; appended a default one");
        }

        let code = if self.add_header {
            prepend_header(&code, info)
        } else {
            let mut code = code;
            code.push('\n');
            code
        };

        Ok(ProcessedScript {
            code,
            main_block_appended,
        })
    }
}
