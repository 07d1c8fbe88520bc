//! Tagdex CLI - Command-line interface for tagging files and finding them by tag

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tagdex_core::{split_tag_list, BulkOutcome, TagIndex};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tagdex")]
#[command(about = "Tag files by path and find them by tag", long_about = None)]
struct Cli {
    /// Directory holding .tagdex/ (default: nearest ancestor with one)
    #[arg(long, global = true, env = "TAGDEX_HOME")]
    home: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Log each action summary to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create .tagdex/ with config.toml and an empty index
    Setup,

    /// Index every file under a directory and watch it for remake
    Init {
        /// Directory to index
        path: String,
    },

    /// Add a tag to a file, or to every file under a directory
    Add {
        /// File or directory
        path: String,
        /// Tag to add (quote tags containing spaces)
        tag: String,
    },

    /// Remove a tag from a file, or from every file under a directory
    Remove {
        /// File or directory
        path: String,
        /// Tag to remove
        tag: String,
    },

    /// Check whether a file has a tag
    Has {
        /// File to check
        path: String,
        /// Tag to look for
        tag: String,
    },

    /// List indexed files carrying all of the given tags
    Find {
        /// Tags to require; comma-separated lists are split
        tags: Vec<String>,

        /// Only search files under this path (default: the whole index)
        #[arg(short, long, default_value = "")]
        path: String,
    },

    /// Re-scan watched roots: index new files, drop records for missing ones
    Remake,

    /// Show every record in the index
    List {
        /// Print paths only
        #[arg(long)]
        paths: bool,
    },

    /// Show differences between the index and the watched roots
    Compare,

    /// Show index stats
    Status,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Setup => cmd_setup(cli.home),
        Commands::Init { path } => cmd_init(cli.home, &path, cli.json),
        Commands::Add { path, tag } => cmd_add(cli.home, &path, &tag, cli.json),
        Commands::Remove { path, tag } => cmd_remove(cli.home, &path, &tag, cli.json),
        Commands::Has { path, tag } => cmd_has(cli.home, &path, &tag, cli.json),
        Commands::Find { tags, path } => cmd_find(cli.home, &path, &tags, cli.json),
        Commands::Remake => cmd_remake(cli.home, cli.json),
        Commands::List { paths } => cmd_list(cli.home, paths, cli.json),
        Commands::Compare => cmd_compare(cli.home, cli.json),
        Commands::Status => cmd_status(cli.home, cli.json),
    };

    if let Err(e) = result {
        if cli.json {
            let error_json = serde_json::json!({ "error": e.to_string() });
            eprintln!("{}", error_json);
        } else {
            eprintln!("Error: {}", e);
        }
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_env("TAGDEX_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("Error: failed to encode JSON: {}", e),
    }
}

fn open_index(home: Option<PathBuf>) -> tagdex_core::Result<TagIndex> {
    TagIndex::open(&detect_home(home)?)
}

fn cmd_setup(home: Option<PathBuf>) -> tagdex_core::Result<()> {
    use colored::Colorize;

    let home = match home {
        Some(path) => path,
        None => std::env::current_dir()?,
    };
    TagIndex::setup(&home)?;

    println!("{} .tagdex/config.toml", "Created".green());
    println!("{} .tagdex/tags.db", "Created".green());
    Ok(())
}

fn cmd_init(home: Option<PathBuf>, path: &str, json: bool) -> tagdex_core::Result<()> {
    use colored::Colorize;

    let mut index = open_index(home)?;
    let stats = index.init(path)?;

    if json {
        print_json(&stats);
    } else {
        println!(
            "{}: {} files ({} new)",
            "Indexed".green(),
            stats.files_seen,
            stats.files_added
        );
        if stats.newly_watched {
            println!("{}: {}", "Watching".blue(), stats.root);
        }
    }
    Ok(())
}

fn print_bulk(verb: &str, tag: &str, outcome: &BulkOutcome, json: bool) {
    use colored::Colorize;

    if json {
        print_json(outcome);
        return;
    }
    println!(
        "{}: '{}' on {} of {} files",
        verb.green(),
        tag,
        outcome.changed,
        outcome.files
    );
    if outcome.unchanged > 0 {
        println!("{}: {} files", "Unchanged".yellow(), outcome.unchanged);
    }
}

fn cmd_add(home: Option<PathBuf>, path: &str, tag: &str, json: bool) -> tagdex_core::Result<()> {
    let mut index = open_index(home)?;
    let outcome = index.add_tag(path, tag)?;
    print_bulk("Added", tag, &outcome, json);
    Ok(())
}

fn cmd_remove(
    home: Option<PathBuf>,
    path: &str,
    tag: &str,
    json: bool,
) -> tagdex_core::Result<()> {
    let mut index = open_index(home)?;
    let outcome = index.remove_tag(path, tag)?;
    print_bulk("Removed", tag, &outcome, json);
    Ok(())
}

fn cmd_has(home: Option<PathBuf>, path: &str, tag: &str, json: bool) -> tagdex_core::Result<()> {
    use colored::Colorize;

    let index = open_index(home)?;
    let has = index.has_tag(path, tag)?;

    if json {
        println!(
            "{}",
            serde_json::json!({
                "path": path,
                "tag": tag,
                "indexed": has.is_some(),
                "has_tag": has.unwrap_or(false),
            })
        );
        return Ok(());
    }
    match has {
        Some(true) => println!("{}: {} has '{}'", "Yes".green(), path, tag),
        Some(false) => println!("{}: {} does not have '{}'", "No".yellow(), path, tag),
        None => println!("{}: {} is not in the index", "Not indexed".red(), path),
    }
    Ok(())
}

fn cmd_find(
    home: Option<PathBuf>,
    path: &str,
    tags: &[String],
    json: bool,
) -> tagdex_core::Result<()> {
    let index = open_index(home)?;
    let tags: Vec<String> = tags.iter().flat_map(|t| split_tag_list(t)).collect();
    let paths = index.find(path, &tags)?;

    if json {
        print_json(&paths);
    } else {
        for p in &paths {
            println!("{}", p);
        }
        println!("({} files)", paths.len());
    }
    Ok(())
}

fn cmd_remake(home: Option<PathBuf>, json: bool) -> tagdex_core::Result<()> {
    use colored::Colorize;

    let mut index = open_index(home)?;
    let stats = index.remake()?;

    if json {
        print_json(&stats);
    } else {
        println!(
            "{}: {} files under {} roots",
            "Scanned".green(),
            stats.files_discovered,
            stats.roots
        );
        println!("{}: {} records", "Added".green(), stats.records_added);
        println!("{}: {} records", "Pruned".yellow(), stats.records_pruned);
    }
    Ok(())
}

fn cmd_list(home: Option<PathBuf>, paths_only: bool, json: bool) -> tagdex_core::Result<()> {
    use colored::Colorize;

    let index = open_index(home)?;
    let records = index.list_all()?;

    if json {
        print_json(&records);
        return Ok(());
    }

    for record in &records {
        if paths_only {
            println!("{}", record.path);
        } else {
            let tags: Vec<&str> = record.tags.iter().collect();
            println!("{} [{}]", record.path, tags.join(", ").cyan());
        }
    }
    println!("({} records)", records.len());
    Ok(())
}

fn cmd_compare(home: Option<PathBuf>, json: bool) -> tagdex_core::Result<()> {
    use colored::Colorize;

    let index = open_index(home)?;
    let drift = index.compare()?;

    if json {
        print_json(&drift);
        return Ok(());
    }

    for path in &drift.missing_on_disk {
        println!("{}: {}", "Missing on disk".red(), path);
    }
    for path in &drift.unindexed {
        println!("{}: {}", "Not indexed".yellow(), path);
    }
    if drift.is_clean() {
        println!("{}: index matches watched roots", "Clean".green());
    } else {
        println!("Run 'tagdex remake' to reconcile.");
    }
    Ok(())
}

fn cmd_status(home: Option<PathBuf>, json: bool) -> tagdex_core::Result<()> {
    use colored::Colorize;

    let index = open_index(home)?;
    let status = index.status()?;

    if json {
        print_json(&status);
    } else {
        println!(
            "{}: {} ({:.1} KB)",
            "Index".blue(),
            index.layout().database.display(),
            status.database_size_bytes as f64 / 1_000.0
        );
        println!(
            "{}: {} ({} tagged)",
            "Records".blue(),
            status.records,
            status.tagged_records
        );
        println!("{}: {}", "Tags".blue(), status.distinct_tags);
        println!("{}: {}", "Watched roots".blue(), status.watched_roots);
        println!("{}: v{}", "Schema".blue(), status.schema_version);
    }
    Ok(())
}

fn detect_home(override_path: Option<PathBuf>) -> tagdex_core::Result<PathBuf> {
    if let Some(path) = override_path {
        return Ok(path);
    }

    // Walk up from current directory looking for .tagdex
    let mut current = std::env::current_dir()?;
    loop {
        if current.join(tagdex_core::config::STATE_DIR).is_dir() {
            return Ok(current);
        }
        if !current.pop() {
            // No parent, use current directory
            return Ok(std::env::current_dir()?);
        }
    }
}
