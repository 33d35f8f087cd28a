use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use walletrate_core::{rate_all, AttributeRegistry, RatedWallet, Variant, WalletDeclaration};

use crate::report;
use crate::telemetry;

#[derive(Parser, Debug)]
#[command(
    name = "walletrate",
    about = "Rate wallets against the walletrate criteria",
    version
)]
struct Cli {
    /// Log level or filter used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rate wallets and print their evaluations
    Rate(RateArgs),
    /// Rank wallets by overall score
    Scores(ScoresArgs),
    /// Check declarations without rating them
    Validate(ValidateArgs),
    /// List the attribute taxonomy
    Attributes(AttributesArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Args, Debug)]
pub(crate) struct RateArgs {
    /// Declaration files or directories of declarations
    #[arg(required = true)]
    pub(crate) paths: Vec<PathBuf>,
    /// Show one variant instead of the aggregate
    #[arg(long)]
    pub(crate) variant: Option<Variant>,
    #[arg(long, value_enum, default_value_t)]
    pub(crate) format: OutputFormat,
}

#[derive(Args, Debug)]
pub(crate) struct ScoresArgs {
    /// Declaration files or directories of declarations
    #[arg(required = true)]
    pub(crate) paths: Vec<PathBuf>,
    #[arg(long, value_enum, default_value_t)]
    pub(crate) format: OutputFormat,
}

#[derive(Args, Debug)]
pub(crate) struct ValidateArgs {
    /// Declaration files or directories of declarations
    #[arg(required = true)]
    pub(crate) paths: Vec<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct AttributesArgs {
    #[arg(long, value_enum, default_value_t)]
    pub(crate) format: OutputFormat,
}

pub(crate) fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    telemetry::init(&cli.log_level)?;

    let registry = AttributeRegistry::standard().context("attribute registry self-check failed")?;

    match cli.command {
        Command::Rate(args) => run_rate(&registry, args),
        Command::Scores(args) => run_scores(&registry, args),
        Command::Validate(args) => run_validate(args),
        Command::Attributes(args) => {
            report::print_attributes(&registry, args.format)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn run_rate(registry: &AttributeRegistry, args: RateArgs) -> Result<ExitCode> {
    let batch = rate_batch(registry, &args.paths, args.variant)?;
    report::print_ratings(registry, &batch.rated, args.variant, args.format)?;
    Ok(batch.finish())
}

fn run_scores(registry: &AttributeRegistry, args: ScoresArgs) -> Result<ExitCode> {
    let batch = rate_batch(registry, &args.paths, None)?;
    report::print_scores(registry, &batch.rated, args.format)?;
    Ok(batch.finish())
}

fn run_validate(args: ValidateArgs) -> Result<ExitCode> {
    let mut invalid = 0usize;
    let paths = expand_paths(&args.paths)?;
    for path in &paths {
        match WalletDeclaration::from_file(path) {
            Ok(declaration) => println!("ok       {} ({})", path.display(), declaration.metadata.id),
            Err(err) => {
                invalid += 1;
                println!("invalid  {}: {err}", path.display());
            }
        }
    }

    tracing::info!(files = paths.len(), invalid, "Validation finished");
    Ok(if invalid == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Wallets rated in one run. A failing file or wallet never stops the others.
struct Batch {
    rated: Vec<RatedWallet>,
    failures: Vec<String>,
}

impl Batch {
    /// Reports failures on stderr and picks the exit code.
    fn finish(self) -> ExitCode {
        for failure in &self.failures {
            eprintln!("error: {failure}");
        }
        if self.failures.is_empty() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        }
    }
}

/// Loads and rates every declaration under `paths`.
///
/// Only an unreadable directory aborts the run. Load errors, wallets
/// missing the requested variant and rating errors are collected as
/// failures next to the wallets that rated.
fn rate_batch(
    registry: &AttributeRegistry,
    paths: &[PathBuf],
    variant: Option<Variant>,
) -> Result<Batch> {
    let mut failures = Vec::new();
    let mut declarations = Vec::new();
    for path in expand_paths(paths)? {
        match WalletDeclaration::from_file(&path) {
            Ok(declaration) => match variant {
                Some(variant) if !declaration.variants.contains(&variant) => failures.push(format!(
                    "{}: does not support the {variant} variant",
                    declaration.metadata.id
                )),
                _ => declarations.push(declaration),
            },
            Err(err) => failures.push(format!("{}: {err}", path.display())),
        }
    }

    let results = rate_all(registry, &declarations);
    let mut rated = Vec::with_capacity(results.len());
    for (declaration, result) in declarations.iter().zip(results) {
        match result {
            Ok(wallet) => rated.push(wallet),
            Err(err) => failures.push(format!("{}: {err}", declaration.metadata.id)),
        }
    }

    tracing::info!(rated = rated.len(), failed = failures.len(), "Batch rated");
    Ok(Batch { rated, failures })
}

/// Files as given, directories replaced by their declaration files in name order.
fn expand_paths(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if !path.is_dir() {
            files.push(path.clone());
            continue;
        }

        let mut entries = Vec::new();
        for entry in fs::read_dir(path).with_context(|| format!("failed to read {}", path.display()))? {
            let entry_path = entry?.path();
            if is_declaration_file(&entry_path) {
                entries.push(entry_path);
            }
        }
        entries.sort();
        files.extend(entries);
    }
    Ok(files)
}

fn is_declaration_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| matches!(ext, "yaml" | "yml" | "json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_args_parse_variant() {
        let cli = Cli::try_parse_from([
            "walletrate",
            "rate",
            "rabby.yaml",
            "--variant",
            "browser",
            "--format",
            "json",
        ])
        .unwrap();
        let Command::Rate(args) = cli.command else {
            panic!("expected rate command");
        };
        assert_eq!(args.variant, Some(Variant::Browser));
        assert_eq!(args.format, OutputFormat::Json);
        assert_eq!(cli.log_level, "warn");
    }

    #[test]
    fn test_unknown_variant_rejected() {
        let result = Cli::try_parse_from(["walletrate", "rate", "x.yaml", "--variant", "tablet"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_demo_directory_expands_in_name_order() {
        let demos = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../demos");
        let files = expand_paths(&[demos]).unwrap();
        let names: Vec<String> = files
            .iter()
            .filter_map(|p| p.file_name()?.to_str().map(str::to_string))
            .collect();
        assert_eq!(names, vec!["daimo.yaml", "frame.json", "rabby.yaml"]);
    }

    fn mixed_fixtures() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/mixed")
    }

    #[test]
    fn test_failing_wallets_do_not_stop_the_batch() {
        let registry = AttributeRegistry::standard().unwrap();
        let batch = rate_batch(&registry, &[mixed_fixtures()], None).unwrap();

        let ids: Vec<&str> = batch.rated.iter().map(|w| w.metadata.id.as_str()).collect();
        assert_eq!(ids, vec!["rabby"]);

        assert_eq!(batch.failures.len(), 2);
        assert!(batch
            .failures
            .iter()
            .any(|f| f.starts_with("broken: ") && f.contains("open_source")));
        assert!(batch.failures.iter().any(|f| f.contains("garbled.yaml")));

        report::print_scores(&registry, &batch.rated, OutputFormat::Json).unwrap();
        assert_eq!(batch.finish(), ExitCode::FAILURE);
    }

    #[test]
    fn test_missing_variant_fails_only_that_wallet() {
        let registry = AttributeRegistry::standard().unwrap();
        let demos = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../demos");
        let all = rate_batch(&registry, &[demos.clone()], None).unwrap();
        let browser = rate_batch(&registry, &[demos], Some(Variant::Browser)).unwrap();

        let unsupported = all
            .rated
            .iter()
            .filter(|w| !w.variants.contains_key(&Variant::Browser))
            .count();
        assert_eq!(browser.failures.len(), all.failures.len() + unsupported);
        assert_eq!(browser.rated.len() + unsupported, all.rated.len());
        assert!(browser
            .failures
            .iter()
            .all(|f| f.contains("does not support the browser variant")));
    }

    #[test]
    fn test_clean_batch_succeeds() {
        let registry = AttributeRegistry::standard().unwrap();
        let rabby = mixed_fixtures().join("rabby.yaml");
        let batch = rate_batch(&registry, &[rabby], None).unwrap();
        assert_eq!(batch.rated.len(), 1);
        assert_eq!(batch.finish(), ExitCode::SUCCESS);
    }
}
