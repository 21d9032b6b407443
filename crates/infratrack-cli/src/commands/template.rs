//! Template command implementation

use crate::cli::TemplateArgs;
use crate::output::OutputWriter;
use crate::output_types::TemplateOutput;
use anyhow::{Context, Result};
use infratrack_core::formats::template_csv;
use infratrack_core::TabularTarget;
use std::fs;

pub fn execute(args: TemplateArgs, output: &OutputWriter) -> Result<()> {
    let kind = TabularTarget::from(args.kind);
    let csv = template_csv(kind)?;

    match args.out {
        Some(path) => {
            fs::write(&path, &csv)
                .with_context(|| format!("Failed to write template to {}", path.display()))?;
            if output.is_json() {
                output.result(TemplateOutput {
                    kind,
                    path: Some(path.display().to_string()),
                    csv: None,
                })?;
            } else {
                output.success(format!("Template written to {}", path.display()));
            }
        }
        None => {
            if output.is_json() {
                output.result(TemplateOutput {
                    kind,
                    path: None,
                    csv: Some(csv),
                })?;
            } else {
                print!("{}", csv);
            }
        }
    }

    Ok(())
}
