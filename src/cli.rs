//! Minimal CLI: schema documents → select clause, or validate select clauses.
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;

use fluree_select::select::SelectClause;
use fluree_select::{SchemaSet, build_selection, document};

/// Log filter used when neither RUST_LOG nor --log-level is given. The
/// diagnostics target is off because `select` prints diagnostics itself.
pub const DEFAULT_LOG_FILTER: &str = "fluree_select=warn,fluree_select::diagnostics=off";

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// derive FlureeQL select clauses from schema documents
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    /// log filter used when RUST_LOG is unset (e.g. debug, fluree_select=trace)
    #[arg(long, global = true, default_value = DEFAULT_LOG_FILTER)]
    pub log_level: String,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// build the select expression list for one schema
    Select(SelectOut),
    /// parse select clause JSON files and report grammar violations
    Check(CheckArgs),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct SelectOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// schema to build the selection for
    #[arg(long)]
    root: String,

    /// wrap the result as `{ VAR: [...] }` (e.g. ?s)
    #[arg(long)]
    var: Option<String>,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// single-line JSON instead of pretty printing
    #[arg(long)]
    compact: bool,
}

#[derive(clap::Parser, Debug)]
struct CheckArgs {
    #[command(flatten)]
    input_settings: InputSettings,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn load_process(&self, mut apply: impl FnMut(&PathBuf, String) -> Result<()>) -> Result<()> {
        let source_paths = resolve_file_path_patterns(&self.input)
            .context("failed to resolve input file paths")?;
        for source_path in &source_paths {
            let source = std::fs::read_to_string(source_path)
                .with_context(|| format!("failed to read source file {}", source_path.display()))?;
            apply(source_path, source)?;
        }
        Ok(())
    }

    fn load_schemas(&self) -> Result<SchemaSet> {
        let mut schemas = SchemaSet::new();
        self.load_process(|path, source| {
            let set = document::parse_document(&source)
                .with_context(|| format!("invalid schema document {}", path.display()))?;
            tracing::debug!(path = %path.display(), schemas = set.len(), "loaded schema document");
            schemas.extend(set).with_context(|| format!("while merging {}", path.display()))
        })?;
        Ok(schemas)
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> Result<()> {
        match &self.cmd {
            Command::Select(target) => {
                let schemas = target.input_settings.load_schemas()?;
                let root = schemas
                    .get(&target.root)
                    .map_err(|e| anyhow!("{e}; known schemas: {}", schemas.names().collect::<Vec<_>>().join(", ")))?;

                let selection = build_selection(&schemas, root)?;
                for d in &selection.diagnostics {
                    eprintln!("{} {}", format!("warning[{}]:", d.kind).yellow().bold(), d.message);
                }

                let value = match target.var.as_deref() {
                    None => serde_json::to_value(&selection.select)?,
                    Some(var) => serde_json::to_value(SelectClause::for_variable(var, selection.select)?)?,
                };
                let src = if target.compact {
                    serde_json::to_string(&value)?
                } else {
                    serde_json::to_string_pretty(&value)?
                };

                if let Some(out) = target.out.as_ref() {
                    if let Some(parent) = out.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(out, &src)
                        .with_context(|| format!("failed to write {}", out.display()))?;
                } else {
                    println!("{src}");
                }
                Ok(())
            }
            Command::Check(target) => {
                let mut failures = 0usize;
                target.input_settings.load_process(|path, source| {
                    match document::from_str_with_path::<SelectClause>(&source) {
                        Ok(_) => eprintln!("{} {}", "ok".green().bold(), path.display()),
                        Err(error) => {
                            failures += 1;
                            eprintln!("{} {}: {error}", "invalid".red().bold(), path.display());
                        }
                    }
                    Ok(())
                })?;
                if failures > 0 {
                    bail!("{failures} select clause file(s) failed validation");
                }
                Ok(())
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{' ))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}
