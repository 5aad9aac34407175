use anyhow::{bail, Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use dtflat_core::logging::{self, LogFormat};
use dtflat_core::{
    DescriptorTable, FragmentOverlayApplier, MigrationConfig, MigrationOrchestrator,
    MigrationOutcome,
};
use dtflat_tree::TreeSnapshot;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TreeFormat {
    Json,
    Yaml,
}

impl TreeFormat {
    fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => Self::Yaml,
            _ => Self::Json,
        }
    }

    fn from_name(name: &str) -> Self {
        if name == "yaml" {
            Self::Yaml
        } else {
            Self::Json
        }
    }
}

fn cli() -> Command {
    Command::new("dtflat")
        .version(dtflat_core::VERSION)
        .about("Flatten legacy dwc3 glue nodes in a hardware-description tree")
        .subcommand_required(true)
        .arg(
            Arg::new("log-format")
                .long("log-format")
                .global(true)
                .default_value("text")
                .value_parser(["text", "json"])
                .help("Log line format"),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .global(true)
                .default_value("info")
                .help("Default filter when RUST_LOG is unset"),
        )
        .subcommand(
            Command::new("migrate")
                .about("Run the migration on a tree snapshot")
                .arg(input_arg())
                .arg(
                    Arg::new("output")
                        .long("output")
                        .short('o')
                        .value_parser(value_parser!(PathBuf))
                        .help("Where to write the resulting tree (default: stdout)"),
                )
                .arg(
                    Arg::new("format")
                        .long("format")
                        .value_parser(["json", "yaml"])
                        .help("Output format (default: from output extension, else json)"),
                )
                .arg(
                    Arg::new("config")
                        .long("config")
                        .short('c')
                        .value_parser(value_parser!(PathBuf))
                        .help("Engine configuration (.toml, .yaml)"),
                )
                .arg(
                    Arg::new("report")
                        .long("report")
                        .value_parser(value_parser!(PathBuf))
                        .help("Write the run outcome as JSON"),
                ),
        )
        .subcommand(
            Command::new("check")
                .about("Report whether a tree needs migrating")
                .arg(input_arg())
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
        .subcommand(
            Command::new("boards")
                .about("List built-in board descriptors")
                .arg(
                    Arg::new("symbols")
                        .long("symbols")
                        .action(ArgAction::SetTrue)
                        .help("Also list each board's symbols"),
                ),
        )
}

fn input_arg() -> Arg {
    Arg::new("input")
        .long("input")
        .short('i')
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help("Tree snapshot (.json, .yaml)")
}

fn main() -> Result<()> {
    let matches = cli().get_matches();

    let log_format = match matches.get_one::<String>("log-format").map(String::as_str) {
        Some("json") => LogFormat::Json,
        _ => LogFormat::Text,
    };
    let log_level = matches
        .get_one::<String>("log-level")
        .map_or("info", String::as_str);
    logging::init(log_format, log_level)?;

    let table = DescriptorTable::builtin().context("built-in board table is invalid")?;

    match matches.subcommand() {
        Some(("migrate", args)) => migrate(table, args),
        Some(("check", args)) => check(table, args),
        Some(("boards", args)) => {
            boards(table, args.get_flag("symbols"));
            Ok(())
        }
        _ => bail!("unknown subcommand"),
    }
}

fn migrate(table: &DescriptorTable, args: &ArgMatches) -> Result<()> {
    let input = required_path(args, "input")?;
    let snapshot = read_snapshot(input)?;
    let mut tree = snapshot
        .build()
        .with_context(|| format!("invalid tree in {}", input.display()))?;

    let config = match args.get_one::<PathBuf>("config") {
        Some(path) => MigrationConfig::load(path)?,
        None => MigrationConfig::default(),
    };

    let mut applier = FragmentOverlayApplier::new().with_limit(config.max_staged_edits);
    let mut orchestrator = MigrationOrchestrator::new(table).with_config(config);
    let outcome = orchestrator
        .run(&mut tree, &mut applier)
        .context("migration failed")?;

    match &outcome {
        MigrationOutcome::Migrated(report) => eprintln!(
            "{}: migrated {} node(s), skipped {}",
            report.board,
            report.migrated.len(),
            report.skipped.len()
        ),
        MigrationOutcome::AlreadyApplied => eprintln!("already migrated"),
        MigrationOutcome::NoDescriptor => eprintln!("no descriptor for this board"),
        MigrationOutcome::Disabled => eprintln!("migration disabled"),
    }

    if let Some(path) = args.get_one::<PathBuf>("report") {
        let json = serde_json::to_string_pretty(&outcome)?;
        std::fs::write(path, json).with_context(|| format!("cannot write {}", path.display()))?;
    }

    let output = args.get_one::<PathBuf>("output");
    let format = match (args.get_one::<String>("format"), output) {
        (Some(name), _) => TreeFormat::from_name(name),
        (None, Some(path)) => TreeFormat::from_path(path),
        (None, None) => TreeFormat::Json,
    };
    let text = match format {
        TreeFormat::Json => tree.snapshot().to_json_pretty()?,
        TreeFormat::Yaml => tree.snapshot().to_yaml()?,
    };
    match output {
        Some(path) => {
            std::fs::write(path, text).with_context(|| format!("cannot write {}", path.display()))?;
        }
        None => println!("{text}"),
    }
    Ok(())
}

fn check(table: &DescriptorTable, args: &ArgMatches) -> Result<()> {
    let input = required_path(args, "input")?;
    let tree = read_snapshot(input)?
        .build()
        .with_context(|| format!("invalid tree in {}", input.display()))?;
    let inspection = MigrationOrchestrator::new(table).inspect(&tree);

    if args.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&inspection)?);
        return Ok(());
    }

    println!("root compatible: {}", inspection.root_compatible.join(", "));
    match &inspection.board {
        Some(board) => println!("board: {board}"),
        None => println!("board: none (nothing to do)"),
    }
    println!("symbol table: {}", if inspection.has_symbols { "present" } else { "absent" });
    if inspection.legacy_nodes.is_empty() {
        println!("legacy nodes: none");
    } else {
        println!("legacy nodes:");
        for node in &inspection.legacy_nodes {
            println!("  {node}");
        }
    }
    println!("needs migration: {}", inspection.needs_migration());
    Ok(())
}

fn boards(table: &DescriptorTable, with_symbols: bool) {
    for board in table.iter() {
        println!("{}", board.identity());
        if with_symbols {
            for symbol in board.symbols() {
                println!("  {symbol}");
            }
        }
    }
}

fn required_path<'a>(args: &'a ArgMatches, name: &str) -> Result<&'a Path> {
    args.get_one::<PathBuf>(name)
        .map(PathBuf::as_path)
        .with_context(|| format!("missing --{name}"))
}

fn read_snapshot(path: &Path) -> Result<TreeSnapshot> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    let snapshot = match TreeFormat::from_path(path) {
        TreeFormat::Json => TreeSnapshot::from_json(&text),
        TreeFormat::Yaml => TreeSnapshot::from_yaml(&text),
    };
    snapshot.with_context(|| format!("cannot parse {}", path.display()))
}
