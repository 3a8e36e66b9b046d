use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use clindoc_core::config::{
    bundle_type_from_env_value, identifier_system_from_env_value, reference_check_from_env_value,
};
use clindoc_core::constants::{
    DEFAULT_FACILITY_IDENTIFIER_SYSTEM, DEFAULT_PERSON_IDENTIFIER_SYSTEM,
};
use clindoc_core::{
    verify_bundle, AssemblyConfig, DocumentFormat, DocumentKind, DocumentService,
    ReferenceCheck, SequentialIdentity,
};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "clindoc")]
#[command(about = "Assemble clinical document bundles from input records")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a document from an input record
    Build {
        /// Document kind (see `clindoc kinds`)
        #[arg(value_parser = parse_kind)]
        kind: DocumentKind,
        /// Input record (.json, .yaml or .yml)
        input: PathBuf,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
        /// Write to this file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
        /// Warn about dangling references instead of failing
        #[arg(long)]
        lenient: bool,
        /// Issue reproducible counter-based identities
        #[arg(long)]
        sequential_ids: bool,
    },
    /// Check a rendered bundle against the document invariants
    Check {
        /// Bundle file (.json, .yaml or .yml)
        bundle: PathBuf,
    },
    /// List supported document kinds
    Kinds,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Yaml,
}

impl From<OutputFormat> for DocumentFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Json => DocumentFormat::Json,
            OutputFormat::Yaml => DocumentFormat::Yaml,
        }
    }
}

fn parse_kind(s: &str) -> Result<DocumentKind, String> {
    s.parse().map_err(|e: clindoc_core::AssemblyError| e.to_string())
}

/// Resolve assembly configuration from environment values.
///
/// # Environment Variables
/// - `CLINDOC_REFERENCE_CHECK`: `strict` (default) or `lenient`
/// - `CLINDOC_BUNDLE_TYPE`: `collection` (default) or `document`
/// - `CLINDOC_PERSON_ID_SYSTEM`: identifier authority for patients and practitioners
/// - `CLINDOC_FACILITY_ID_SYSTEM`: identifier authority for organisations
///
/// `--lenient` overrides `CLINDOC_REFERENCE_CHECK`.
fn resolve_config(env: &dyn Fn(&str) -> Option<String>, lenient: bool) -> anyhow::Result<AssemblyConfig> {
    let reference_check = if lenient {
        ReferenceCheck::Lenient
    } else {
        reference_check_from_env_value(env("CLINDOC_REFERENCE_CHECK"))?
    };
    let bundle_type = bundle_type_from_env_value(env("CLINDOC_BUNDLE_TYPE"))?;
    let person = identifier_system_from_env_value(
        env("CLINDOC_PERSON_ID_SYSTEM"),
        DEFAULT_PERSON_IDENTIFIER_SYSTEM,
    );
    let facility = identifier_system_from_env_value(
        env("CLINDOC_FACILITY_ID_SYSTEM"),
        DEFAULT_FACILITY_IDENTIFIER_SYSTEM,
    );

    Ok(AssemblyConfig::new(
        reference_check,
        bundle_type,
        person,
        facility,
    )?)
}

fn read(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn run(
    cli: Cli,
    env: &dyn Fn(&str) -> Option<String>,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    match cli.command {
        Some(Commands::Build {
            kind,
            input,
            format,
            output,
            lenient,
            sequential_ids,
        }) => {
            let config = resolve_config(env, lenient)?;
            let service = if sequential_ids {
                DocumentService::with_identity_generator(
                    config,
                    Arc::new(SequentialIdentity::default()),
                )
            } else {
                DocumentService::new(config)
            };

            let text = read(&input)?;
            let bundle = service
                .build(kind, &text, DocumentFormat::from_path(&input))
                .with_context(|| format!("failed to build {kind} from {}", input.display()))?;
            let rendered = bundle.render(format.into())?;

            match output {
                Some(path) => {
                    std::fs::write(&path, &rendered)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    tracing::info!(
                        "wrote {kind} with {} entries to {}",
                        bundle.len(),
                        path.display()
                    );
                }
                None => writeln!(out, "{rendered}")?,
            }
        }
        Some(Commands::Check { bundle }) => {
            let text = read(&bundle)?;
            let parsed = match DocumentFormat::from_path(&bundle) {
                DocumentFormat::Json => fhir::Bundle::parse_json(&text),
                DocumentFormat::Yaml => fhir::Bundle::parse_yaml(&text),
            }
            .with_context(|| format!("failed to parse {}", bundle.display()))?;

            verify_bundle(&parsed)
                .with_context(|| format!("{} is not a valid document", bundle.display()))?;
            writeln!(out, "OK: {} entries", parsed.entry.len())?;
        }
        Some(Commands::Kinds) => {
            for kind in DocumentKind::ALL {
                writeln!(out, "{kind}\t{}", kind.title())?;
            }
        }
        None => {
            writeln!(out, "Use 'clindoc --help' for commands")?;
        }
    }

    Ok(())
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("clindoc=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let stdout = std::io::stdout();
    run(cli, &|key| std::env::var(key).ok(), &mut stdout.lock())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    const PRESCRIPTION: &str = r#"{
        "patient": {"name": "John Doe", "patient_id": "somepatientid"},
        "practitioner": {"name": "Dr. Smith"},
        "prescription_date": "2021-10-10",
        "medications": [{"medication_name": "Aspirin", "dosage_instruction": "Daily"}]
    }"#;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn run_args(args: &[&str], env: &dyn Fn(&str) -> Option<String>) -> anyhow::Result<String> {
        let cli = Cli::try_parse_from(std::iter::once("clindoc").chain(args.iter().copied()))?;
        let mut out = Vec::new();
        run(cli, env, &mut out)?;
        Ok(String::from_utf8(out)?)
    }

    #[test]
    fn build_then_check_round_trip() {
        let temp = TempDir::new().expect("tempdir");
        let input = temp.path().join("prescription.json");
        std::fs::write(&input, PRESCRIPTION).expect("write input");
        let output = temp.path().join("bundle.yaml");

        let printed = run_args(
            &[
                "build",
                "prescription",
                input.to_str().expect("utf8 path"),
                "--format",
                "yaml",
                "--output",
                output.to_str().expect("utf8 path"),
            ],
            &no_env,
        )
        .expect("build");
        assert!(printed.is_empty());

        let report = run_args(&["check", output.to_str().expect("utf8 path")], &no_env)
            .expect("check");
        assert_eq!(report.trim(), "OK: 4 entries");
    }

    #[test]
    fn sequential_ids_print_reproducible_json() {
        let temp = TempDir::new().expect("tempdir");
        let input = temp.path().join("prescription.json");
        std::fs::write(&input, PRESCRIPTION).expect("write input");
        let args = [
            "build",
            "prescription",
            input.to_str().expect("utf8 path"),
            "--sequential-ids",
        ];

        let first = run_args(&args, &no_env).expect("first");
        let second = run_args(&args, &no_env).expect("second");
        assert_eq!(first, second);

        let json: serde_json::Value = serde_json::from_str(&first).expect("json");
        assert_eq!(json["resourceType"], "Bundle");
        assert_eq!(json["entry"][0]["resource"]["resourceType"], "Composition");
        assert_eq!(json["entry"][1]["resource"]["resourceType"], "Patient");
    }

    #[test]
    fn check_rejects_broken_bundle() {
        let temp = TempDir::new().expect("tempdir");
        let input = temp.path().join("prescription.json");
        std::fs::write(&input, PRESCRIPTION).expect("write input");

        let printed = run_args(
            &["build", "prescription", input.to_str().expect("utf8 path")],
            &no_env,
        )
        .expect("build");
        let mut json: serde_json::Value = serde_json::from_str(&printed).expect("json");
        json["entry"]
            .as_array_mut()
            .expect("entries")
            .truncate(2);
        let broken = temp.path().join("broken.json");
        std::fs::write(&broken, json.to_string()).expect("write bundle");

        let err = run_args(&["check", broken.to_str().expect("utf8 path")], &no_env)
            .expect_err("should fail");
        assert!(format!("{err:#}").contains("broken reference graph"));
    }

    #[test]
    fn missing_required_block_fails_build() {
        let temp = TempDir::new().expect("tempdir");
        let input = temp.path().join("report.yaml");
        std::fs::write(&input, "report_date: '2021-10-10'\n").expect("write input");

        let err = run_args(
            &["build", "diagnostic-report", input.to_str().expect("utf8 path")],
            &no_env,
        )
        .expect_err("should fail");
        assert!(format!("{err:#}").contains("missing required field 'request'"));
    }

    #[test]
    fn config_reads_environment_and_flag_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("CLINDOC_REFERENCE_CHECK", "strict"),
            ("CLINDOC_BUNDLE_TYPE", "document"),
            ("CLINDOC_PERSON_ID_SYSTEM", "https://ids.example.org"),
        ]);
        let lookup = |key: &str| env.get(key).map(|v| v.to_string());

        let config = resolve_config(&lookup, true).expect("config");
        assert_eq!(config.reference_check(), ReferenceCheck::Lenient);
        assert_eq!(config.bundle_type(), fhir::BundleType::Document);
        assert_eq!(config.person_identifier_system(), "https://ids.example.org");
        assert_eq!(
            config.facility_identifier_system(),
            DEFAULT_FACILITY_IDENTIFIER_SYSTEM
        );

        let bad = |key: &str| (key == "CLINDOC_FACILITY_ID_SYSTEM").then(|| "not a uri".to_string());
        assert!(resolve_config(&bad, false).is_err());
    }

    #[test]
    fn kinds_lists_every_document_type() {
        let printed = run_args(&["kinds"], &no_env).expect("kinds");
        let names: Vec<_> = printed
            .lines()
            .filter_map(|l| l.split('\t').next())
            .collect();
        assert_eq!(
            names,
            vec!["diagnostic-report", "discharge-summary", "op-consult", "prescription"]
        );
    }

    #[test]
    fn unknown_kind_is_a_usage_error() {
        assert!(run_args(&["build", "letter", "x.json"], &no_env).is_err());
    }
}
