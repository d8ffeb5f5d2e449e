use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use snipkit::infra::config::Config;
use snipkit::infra::watch::SnippetWatcher;
use snipkit::{KeySequence, derive_command_name, parse_snippet, save_snippet};

#[derive(Parser)]
#[command(name = "snipkit", about = "Inspect and manage a snippet directory", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List snippets with their derived command names and hotkeys
    List {
        /// Snippet directory; defaults to the configured root
        dir: Option<PathBuf>,
    },
    /// Show the parsed record for a single snippet file
    Show { file: PathBuf },
    /// Create a snippet file
    New {
        file: PathBuf,
        #[arg(long)]
        description: Option<String>,
        /// Hotkey string such as "Ctrl+Alt+R"
        #[arg(long)]
        hotkey: Option<String>,
        /// Snippet body; an empty body leaves the file inert
        #[arg(long, default_value = "")]
        body: String,
    },
    /// Watch a snippet directory and re-list it on every change
    Watch {
        /// Snippet directory; defaults to the configured root
        dir: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    snipkit::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::List { dir } => list(dir),
        Commands::Show { file } => show(&file),
        Commands::New {
            file,
            description,
            hotkey,
            body,
        } => new(&file, description.as_deref(), hotkey.as_deref(), &body),
        Commands::Watch { dir } => watch(dir),
    }
}

fn list(dir: Option<PathBuf>) -> Result<()> {
    let config = Config::load()?;
    let root = dir.unwrap_or_else(|| config.snippet_directory());

    for path in snipkit::app::scan::walk_snippets(&root, &config.snippets.extension) {
        let record = parse_snippet(&path);
        if record.body.is_empty() {
            continue;
        }
        let name = derive_command_name(&path, record.description.as_deref());
        match &record.hotkey {
            Some(hotkey) => println!("{name}\t{hotkey}"),
            None => println!("{name}"),
        }
    }
    Ok(())
}

fn show(file: &Path) -> Result<()> {
    let record = parse_snippet(file);
    if record.is_empty() {
        println!("{}: not a snippet (fewer than 3 lines or unreadable)", file.display());
        return Ok(());
    }

    println!("command: {}", derive_command_name(file, record.description.as_deref()));
    if let Some(description) = &record.description {
        println!("description: {description}");
    }
    if let Some(hotkey) = &record.hotkey {
        println!("hotkey: {hotkey}");
    }
    print!("{}", record.body);
    Ok(())
}

fn new(
    file: &Path,
    description: Option<&str>,
    hotkey: Option<&str>,
    body: &str,
) -> Result<()> {
    let hotkey = hotkey
        .map(|raw| {
            raw.parse::<KeySequence>()
                .with_context(|| format!("invalid hotkey `{raw}`"))
        })
        .transpose()?;

    save_snippet(file, description, hotkey.as_ref(), body)?;
    println!("created {}", file.display());
    Ok(())
}

fn watch(dir: Option<PathBuf>) -> Result<()> {
    let root = match dir {
        Some(dir) => dir,
        None => Config::load()?.snippet_directory(),
    };

    let (tx, rx) = std::sync::mpsc::channel();
    let _watcher = SnippetWatcher::new(&root, move || {
        let _ = tx.send(());
    })?;

    println!("watching {}", root.display());
    list(Some(root.clone()))?;
    while rx.recv().is_ok() {
        // Bursts of events for one edit collapse into a single relisting.
        while rx.try_recv().is_ok() {}
        println!("-- changed --");
        list(Some(root.clone()))?;
    }
    Ok(())
}
