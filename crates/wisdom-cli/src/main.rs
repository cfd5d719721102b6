#![deny(unsafe_code)]

//! Wisdom Library CLI — catalogue maintenance and context assembly.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use wisdom_config::WisdomConfig;
use wisdom_core::LogCollector;
use wisdom_core::context::{assemble_context, generate_toc, scan_files};
use wisdom_core::intake::IssueVars;
use wisdom_core::manifest::fragment::parse_fragment;
use wisdom_core::manifest::{
    Consolidator, IndexTarget, IntegrationOutcome, integrate_entry, validate_fragment,
    write_fragment,
};

/// Wisdom Library — fragment consolidation and leveled context assembly.
#[derive(Parser)]
#[command(name = "wisdom", version = wisdom_core::build_info::LONG_VERSION, about, long_about = None)]
struct Cli {
    /// Path to configuration file.
    #[arg(short, long, default_value = "wisdom.toml")]
    config: PathBuf,

    /// Increase log verbosity (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuild the manifest and index from all fragments.
    Consolidate {
        /// Fragments directory (defaults to catalogue.fragments_dir).
        fragments_dir: Option<PathBuf>,
        /// Manifest output path (defaults to catalogue.manifest_path).
        manifest: Option<PathBuf>,
        /// Index output path (defaults to catalogue.index_path).
        index: Option<PathBuf>,
    },

    /// Merge a single entry file into the existing manifest.
    Integrate {
        /// JSON file holding one entry object.
        entry: PathBuf,
        #[arg(long)]
        manifest: Option<PathBuf>,
        /// Also re-render the index here.
        #[arg(long)]
        index: Option<PathBuf>,
    },

    /// Check fragment files against the entry schema.
    Validate {
        #[arg(required = true)]
        fragments: Vec<PathBuf>,
    },

    /// Write a JSON array of entries as a new fragment.
    Submit {
        entries: PathBuf,
        /// Fragment file stem.
        #[arg(long)]
        name: String,
        #[arg(long)]
        fragments_dir: Option<PathBuf>,
    },

    /// Assemble everything the library holds for a target.
    Context {
        target: String,
        /// Library root (defaults to library.root).
        #[arg(long)]
        root: Option<PathBuf>,
        /// Write to this file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Print only the table of contents.
        #[arg(long)]
        toc_only: bool,
    },

    /// Extract the agent prompt from an issue body as shell assignments.
    Intake {
        issue_body: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate and display configuration.
    Config {
        /// Show the resolved configuration.
        #[arg(long)]
        show: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = WisdomConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;

    let filter = match cli.verbose {
        0 => config.logging.level.as_str(),
        1 => "debug",
        _ => "trace",
    };
    let collector = LogCollector::new(256);
    let reader = collector.reader();
    wisdom_core::logging::init_cli_logging(filter, collector)?;

    match cli.command {
        Commands::Consolidate {
            fragments_dir,
            manifest,
            index,
        } => cmd_consolidate(&config, fragments_dir, manifest, index)?,
        Commands::Integrate {
            entry,
            manifest,
            index,
        } => cmd_integrate(&config, &entry, manifest, index)?,
        Commands::Validate { fragments } => cmd_validate(&fragments)?,
        Commands::Submit {
            entries,
            name,
            fragments_dir,
        } => cmd_submit(&config, &entries, &name, fragments_dir)?,
        Commands::Context {
            target,
            root,
            output,
            toc_only,
        } => cmd_context(&config, &target, root, output.as_deref(), toc_only)?,
        Commands::Intake { issue_body, output } => cmd_intake(&issue_body, output.as_deref())?,
        Commands::Config { show } => cmd_config(&cli.config, &config, show)?,
    }

    let warnings = reader.warning_count();
    if warnings > 0 {
        eprintln!("{warnings} warning(s) emitted; see log output above.");
    }
    Ok(())
}

fn cmd_consolidate(
    config: &WisdomConfig,
    fragments_dir: Option<PathBuf>,
    manifest: Option<PathBuf>,
    index: Option<PathBuf>,
) -> Result<()> {
    let catalogue = &config.catalogue;
    let consolidator = Consolidator::new(
        fragments_dir.unwrap_or_else(|| catalogue.fragments_dir.clone()),
        manifest.unwrap_or_else(|| catalogue.manifest_path.clone()),
        index.unwrap_or_else(|| catalogue.index_path.clone()),
    )
    .with_extension(&catalogue.fragment_extension)
    .with_index_title(&catalogue.index_title);

    let report = consolidator.run()?;
    println!(
        "Consolidated {} entries from {} fragments ({} skipped, {} invalid).",
        report.entries, report.fragments_read, report.fragments_skipped, report.invalid_entries
    );
    Ok(())
}

fn cmd_integrate(
    config: &WisdomConfig,
    entry: &Path,
    manifest: Option<PathBuf>,
    index: Option<PathBuf>,
) -> Result<()> {
    let manifest = manifest.unwrap_or_else(|| config.catalogue.manifest_path.clone());
    let index_target = index.as_deref().map(|path| IndexTarget {
        path,
        title: &config.catalogue.index_title,
    });

    match integrate_entry(&manifest, entry, index_target)? {
        IntegrationOutcome::Appended { issue, total } => {
            println!("Integrated issue #{issue}; manifest now holds {total} entries.");
        }
        IntegrationOutcome::DuplicateSkipped { issue } => {
            println!("Issue #{issue} is already catalogued; manifest unchanged.");
        }
    }
    Ok(())
}

fn cmd_validate(fragments: &[PathBuf]) -> Result<()> {
    let mut rejected = 0;
    for path in fragments {
        let report = validate_fragment(path)?;
        if report.is_submittable() {
            println!("{}: ok ({} entries)", path.display(), report.entries);
            continue;
        }
        rejected += 1;
        println!("{}: not submittable", path.display());
        for problem in &report.problems {
            println!("  - {problem}");
        }
    }

    if rejected > 0 {
        bail!("{rejected} of {} fragment(s) failed validation", fragments.len());
    }
    Ok(())
}

fn cmd_submit(
    config: &WisdomConfig,
    entries_path: &Path,
    name: &str,
    fragments_dir: Option<PathBuf>,
) -> Result<()> {
    let text = std::fs::read_to_string(entries_path)
        .with_context(|| format!("reading {}", entries_path.display()))?;
    let parsed = parse_fragment(&text)
        .with_context(|| format!("parsing {}", entries_path.display()))?;
    let Some(parsed) = parsed else {
        bail!("{} must hold a JSON array of entries", entries_path.display());
    };
    if let Some(position) = parsed.rejected.first() {
        bail!("element {position} of {} is not an object", entries_path.display());
    }

    let dir = fragments_dir.unwrap_or_else(|| config.catalogue.fragments_dir.clone());
    let path = write_fragment(&dir, name, &parsed.entries)?;
    println!("Wrote {}", path.display());
    Ok(())
}

fn cmd_context(
    config: &WisdomConfig,
    target: &str,
    root: Option<PathBuf>,
    output: Option<&Path>,
    toc_only: bool,
) -> Result<()> {
    let root = root.unwrap_or_else(|| config.library.root.clone());
    let (found, text) = render_context(&root, target, config.library.include_contents, toc_only);
    if found == 0 {
        warn!(slug = target, "No artifacts found");
    }
    emit(output, &text)
}

/// Render the context output and report how many artifacts it covers.
fn render_context(root: &Path, target: &str, include_contents: bool, toc_only: bool) -> (usize, String) {
    if toc_only {
        let files = scan_files(root, target);
        (files.len(), generate_toc(&files))
    } else {
        let doc = assemble_context(root, target, include_contents);
        (doc.files.len(), doc.render())
    }
}

fn cmd_intake(issue_body: &Path, output: Option<&Path>) -> Result<()> {
    let body = std::fs::read_to_string(issue_body)
        .with_context(|| format!("reading {}", issue_body.display()))?;
    let vars = IssueVars::from_issue_body(&body)?;
    if vars.target.is_empty() {
        warn!(path = %issue_body.display(), "Issue body names no target");
    }
    emit(output, &vars.to_shell_env())
}

fn cmd_config(config_path: &Path, config: &WisdomConfig, show: bool) -> Result<()> {
    if show {
        let toml_str = toml::to_string_pretty(config).context("serializing configuration")?;
        println!("{toml_str}");
    } else if config_path.exists() {
        println!("Configuration at '{}' is valid.", config_path.display());
    } else {
        info!(path = %config_path.display(), "Config file not found, using defaults");
        println!("No configuration at '{}'; defaults apply.", config_path.display());
    }
    Ok(())
}

/// Write to `output` atomically, or to stdout when no path is given.
fn emit(output: Option<&Path>, text: &str) -> Result<()> {
    match output {
        Some(path) => {
            wisdom_core::fsutil::write_atomic(path, text.as_bytes())
                .with_context(|| format!("writing {}", path.display()))?;
            info!(path = %path.display(), "Output written");
        }
        None => print!("{text}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;
    use wisdom_test_utils::config::TestConfigBuilder;
    use wisdom_test_utils::fixtures::{CatalogueFixture, LibraryFixture, entry_json};
    use wisdom_test_utils::tracing_setup::init_test_tracing;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_consolidate_positionals_are_optional() {
        let cli = Cli::try_parse_from(["wisdom", "consolidate"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Consolidate {
                fragments_dir: None,
                manifest: None,
                index: None
            }
        ));
    }

    #[test]
    fn test_context_flags() {
        let cli = Cli::try_parse_from([
            "wisdom",
            "-vv",
            "context",
            "skills",
            "--root",
            "lib",
            "--toc-only",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        let Commands::Context {
            target,
            root,
            toc_only,
            output,
        } = cli.command
        else {
            panic!("expected context command");
        };
        assert_eq!(target, "skills");
        assert_eq!(root, Some(PathBuf::from("lib")));
        assert!(toc_only);
        assert!(output.is_none());
    }

    #[test]
    fn test_validate_requires_a_path() {
        assert!(Cli::try_parse_from(["wisdom", "validate"]).is_err());
    }

    #[test]
    fn test_submit_requires_name() {
        assert!(Cli::try_parse_from(["wisdom", "submit", "entries.json"]).is_err());
    }

    #[test]
    fn test_context_writes_output_file() {
        init_test_tracing();
        let library = LibraryFixture::new();
        library.add("atomic", "skills", "fact.md", "hidden body");
        let config = TestConfigBuilder::new()
            .library_root(library.root())
            .include_contents(false)
            .log_level("debug")
            .build();

        let out = library.root().join("context.md");
        cmd_context(&config, "skills", None, Some(&out), false).unwrap();

        let text = std::fs::read_to_string(&out).unwrap();
        assert_eq!(
            text,
            "# Context: skills\n\n## Level 2: Atomic\n- fact.md (atomic)\n"
        );
    }

    #[test]
    fn test_empty_target_counts_no_artifacts_in_either_mode() {
        let library = LibraryFixture::new();

        let (found, text) = render_context(library.root(), "ghost", true, false);
        assert_eq!(found, 0);
        assert_eq!(text, "# Context: ghost\n\nNo artifacts found for this target.\n");

        let (found, text) = render_context(library.root(), "ghost", true, true);
        assert_eq!(found, 0);
        assert_eq!(text, "");
    }

    #[test]
    fn test_populated_target_counts_artifacts() {
        let library = LibraryFixture::new();
        library.add("analyses", "demo", "notes.md", "hello");

        let (found, text) = render_context(library.root(), "demo", false, false);
        assert_eq!(found, 1);
        assert!(text.contains("notes.md"));
    }

    #[test]
    fn test_submit_then_consolidate() {
        init_test_tracing();
        let fixture = CatalogueFixture::new();
        let config = TestConfigBuilder::new()
            .catalogue_in(fixture.root())
            .build();
        let entries = fixture.write_file(
            "entries.json",
            &serde_json::json!([entry_json(serde_json::json!(7), "a.md")]).to_string(),
        );

        cmd_submit(&config, &entries, "issue-7", None).unwrap();
        assert!(fixture.fragments_dir().join("issue-7.json").is_file());
        // Same name twice is refused
        assert!(cmd_submit(&config, &entries, "issue-7", None).is_err());

        cmd_consolidate(&config, None, None, None).unwrap();
        assert!(fixture.read_index().contains("- [a.md](a.md) — Issue #7"));
    }

    #[test]
    fn test_validate_fails_on_incomplete_fragment() {
        let fixture = CatalogueFixture::new();
        let good = fixture.write_fragment_json(
            "good.json",
            &serde_json::json!([entry_json(serde_json::json!(1), "a.md")]),
        );
        let bad = fixture.write_fragment_raw("bad.json", r#"[{"issue": 2}]"#);

        assert!(cmd_validate(std::slice::from_ref(&good)).is_ok());
        assert!(cmd_validate(&[good, bad]).is_err());
    }

    #[test]
    fn test_intake_writes_shell_assignments() {
        let fixture = CatalogueFixture::new();
        let body = fixture.write_file(
            "issue.md",
            "```yaml\nagent_prompt:\n  target: skills\n  depth: 2\n```\n",
        );
        let out = fixture.root().join("vars.env");

        cmd_intake(&body, Some(&out)).unwrap();
        let env = std::fs::read_to_string(&out).unwrap();
        assert!(env.starts_with("AGENT_TARGET='skills'\nAGENT_DEPTH='2'\n"));
    }
}
