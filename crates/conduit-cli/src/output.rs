//! Output formatting for command results.

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Serialize;

/// Format used for rendered command output on stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    /// Pretty-printed JSON, one document per invocation.
    Json,
}

/// Render `value` as JSON or through the supplied text renderer.
pub fn render<T, F>(value: &T, format: OutputFormat, text: F) -> Result<String>
where
    T: Serialize,
    F: FnOnce(&T) -> String,
{
    match format {
        OutputFormat::Text => Ok(text(value)),
        OutputFormat::Json => {
            let mut json =
                serde_json::to_string_pretty(value).context("failed to serialize output")?;
            json.push('\n');
            Ok(json)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Sample {
        weight: u32,
    }

    #[test]
    fn text_uses_renderer() {
        let rendered = render(&Sample { weight: 3 }, OutputFormat::Text, |sample| {
            format!("weight {}\n", sample.weight)
        })
        .unwrap();
        assert_eq!(rendered, "weight 3\n");
    }

    #[test]
    fn json_is_newline_terminated() {
        let rendered = render(&Sample { weight: 3 }, OutputFormat::Json, |_| String::new()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value["weight"], 3);
        assert!(rendered.ends_with('\n'));
    }
}
