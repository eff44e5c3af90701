use crate::{load_config, report};

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use objmap_core::Accessibility;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
pub struct GenerateCommand {
    /// Rust source file containing `objmap::request!` invocations
    input: PathBuf,

    /// Configuration file [default: objmap.toml, when present]
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the generated code to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Visibility of generated functions (`public` or `internal`)
    #[arg(long)]
    accessibility: Option<Accessibility>,
}

impl GenerateCommand {
    /// Generates the mappings and reports diagnostics. Fails the exit code
    /// when an error diagnostic was reported; the code for every plan that
    /// did resolve is still written.
    pub fn run(self) -> Result<ExitCode> {
        let mut config = load_config(self.config.as_deref())?;
        if let Some(accessibility) = self.accessibility {
            config.accessibility = accessibility;
        }

        let source = fs::read_to_string(&self.input)
            .with_context(|| format!("failed to read {}", self.input.display()))?;
        let file = syn::parse_file(&source).map_err(|err| report::syntax_error(&self.input, err))?;

        tracing::info!(input = %self.input.display(), "generating mappings");
        let generated = objmap_codegen::generate_file(&file, &config)
            .map_err(|err| report::syntax_error(&self.input, err))?;

        report::diagnostics(&self.input, &generated.diagnostics);

        let code = generated.to_source();
        match &self.output {
            Some(path) => {
                fs::write(path, code)
                    .with_context(|| format!("failed to write {}", path.display()))?;
                eprintln!(
                    "  {} {}",
                    style("✓").green().bold(),
                    style(format!("Wrote {}", path.display())).dim()
                );
            }
            None => print!("{code}"),
        }

        Ok(if generated.has_errors() {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        })
    }
}
