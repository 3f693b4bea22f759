//! Output formatting for CLI commands.
//!
//! Provides abstraction layer for outputting results in text or JSON format.

use anyhow::Result;
use gitbom_core::{Identifier, Reference};
use serde::Serialize;
use std::io::{self, Write};

/// Output format selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Writer for command output with format abstraction.
pub struct OutputWriter {
    format: OutputFormat,
    stdout: io::Stdout,
}

impl OutputWriter {
    /// Create a new OutputWriter.
    pub fn new(json: bool) -> Self {
        Self {
            format: if json {
                OutputFormat::Json
            } else {
                OutputFormat::Text
            },
            stdout: io::stdout(),
        }
    }

    /// Write output using the configured format.
    ///
    /// The `text_fn` closure is called only in text mode to generate the
    /// human-readable output.
    pub fn write<T: Serialize>(&self, data: &T, text_fn: impl FnOnce() -> String) -> Result<()> {
        let mut out = self.stdout.lock();
        match self.format {
            OutputFormat::Json => {
                let json = serde_json::to_string_pretty(data)?;
                writeln!(out, "{}", json)?;
            }
            OutputFormat::Text => {
                let text = text_fn();
                if !text.is_empty() {
                    write!(out, "{}", text)?;
                }
            }
        }
        Ok(())
    }

    /// Write an error message to stderr.
    ///
    /// In JSON mode, writes a JSON error object with success=false.
    pub fn write_error(&self, error: &anyhow::Error, result_code: u8) {
        match self.format {
            OutputFormat::Json => {
                let error_output = ErrorOutput {
                    success: false,
                    result_code,
                    error: format!("{:#}", error),
                };
                if let Ok(json) = serde_json::to_string_pretty(&error_output) {
                    let _ = writeln!(io::stderr(), "{}", json);
                }
            }
            OutputFormat::Text => {
                let _ = writeln!(io::stderr(), "Error: {:#}", error);
            }
        }
    }
}

// ============================================================================
// Data Transfer Objects (DTOs) for JSON output
// ============================================================================

/// Error output structure.
#[derive(Debug, Serialize)]
pub struct ErrorOutput {
    pub success: bool,
    pub result_code: u8,
    pub error: String,
}

/// Output for `init` command.
#[derive(Debug, Serialize)]
pub struct InitOutput {
    pub success: bool,
    pub result_code: u8,
    pub root: String,
    pub algorithm: String,
}

/// A tree written to the store.
#[derive(Debug, Clone, Serialize)]
pub struct TreeInfo {
    pub identity: Identifier,
    pub git_ref: Identifier,
    pub references: usize,
    pub path: String,
}

/// Output for `add` command.
#[derive(Debug, Serialize)]
pub struct AddOutput {
    pub success: bool,
    pub result_code: u8,
    pub files: usize,
    pub tree: TreeInfo,
}

/// Output for `bom` command.
#[derive(Debug, Serialize)]
pub struct BomOutput {
    pub success: bool,
    pub result_code: u8,
    pub artifact: String,
    pub inputs: TreeInfo,
    pub tree: TreeInfo,
}

/// Output for `hash` command.
#[derive(Debug, Serialize)]
pub struct HashOutput {
    pub success: bool,
    pub result_code: u8,
    pub path: String,
    pub algorithm: String,
    pub hash: Identifier,
}

/// Output for `show` command.
#[derive(Debug, Serialize)]
pub struct ShowOutput {
    pub success: bool,
    pub result_code: u8,
    pub identity: Identifier,
    pub references: Vec<Reference>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_show_output_json_shape() {
        let blob = Identifier::parse("04fea06420ca60892f73becee3614f6d023a4b7f").unwrap();
        let bom = Identifier::parse(
            "588ed637c6073a58e79f4fc63a85158eafed022a2b791f7765c28a3c3d1797d6",
        )
        .unwrap();
        let output = ShowOutput {
            success: true,
            result_code: 0,
            identity: bom.clone(),
            references: vec![
                Reference::new(blob.clone(), None),
                Reference::new(blob.clone(), Some(bom.clone())),
            ],
        };

        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["identity"], bom.as_str());
        assert_eq!(json["references"][0]["blob_hash"], blob.as_str());
        assert!(json["references"][0].get("bom").is_none());
        assert_eq!(json["references"][1]["bom"], bom.as_str());
    }

    #[test]
    fn test_error_output_json_shape() {
        let output = ErrorOutput {
            success: false,
            result_code: 1,
            error: "boom".to_string(),
        };
        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["result_code"], 1);
        assert_eq!(json["error"], "boom");
    }
}
