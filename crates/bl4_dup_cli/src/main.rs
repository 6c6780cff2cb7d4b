mod update;

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use bl4_dup_core::core_api::{DuplicateOptions, Engine, SaveDocument};
use bl4_dup_core::saves::{default_save_root, is_profile_save, list_character_saves};
use bl4_dup_render::{
    render_report_json, render_report_lines, render_summary_json, render_summary_text,
};
use clap::{Parser, Subcommand};
use serde_json::Value as JsonValue;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

use update::{CURRENT_VERSION, DEFAULT_UPDATE_URL, GithubContentSource, VersionCache};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    /// Log pipeline stages to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the character fields of a save.
    Info {
        #[arg(value_name = "SAVE")]
        path: PathBuf,
        /// Account key id, when the save is outside the standard layout.
        #[arg(long = "steam-id", env = "BL4_STEAM_ID")]
        steam_id: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Write a copy of a character save as a new character.
    Duplicate {
        #[arg(value_name = "SAVE")]
        path: PathBuf,
        #[arg(long, short)]
        output: PathBuf,
        #[arg(long = "steam-id", env = "BL4_STEAM_ID")]
        steam_id: Option<String>,
        #[arg(long)]
        name: Option<String>,
        /// Keep the source GUID instead of generating a new one.
        #[arg(long = "keep-guid")]
        keep_guid: bool,
        #[arg(long = "reset-playtime")]
        reset_playtime: bool,
        #[arg(long = "reset-challenges")]
        reset_challenges: bool,
        #[arg(long = "reset-uvh-challenges")]
        reset_uvh_challenges: bool,
        #[arg(long)]
        json: bool,
    },
    /// List character saves under the save root.
    List {
        #[arg(long, env = "BL4_SAVE_DIR")]
        root: Option<PathBuf>,
        #[arg(long)]
        json: bool,
    },
    /// Compare this build against the latest published version.
    UpdateCheck {
        #[arg(long, env = "BL4_DUP_UPDATE_URL", default_value = DEFAULT_UPDATE_URL)]
        url: String,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Info {
            path,
            steam_id,
            json,
        } => {
            let doc = load_or_exit(&path, steam_id.as_deref());
            let snapshot = doc.snapshot().unwrap_or_else(|e| {
                eprintln!("Error reading character fields: {e}");
                process::exit(1);
            });
            if json {
                print_json(&render_summary_json(&snapshot));
            } else {
                print!("{}", render_summary_text(&snapshot));
            }
        }
        Command::Duplicate {
            path,
            output,
            steam_id,
            name,
            keep_guid,
            reset_playtime,
            reset_challenges,
            reset_uvh_challenges,
            json,
        } => {
            if is_profile_save(&path) {
                eprintln!(
                    "{} is the account profile, not a character save",
                    path.display()
                );
                process::exit(2);
            }
            if name.as_deref().is_some_and(|n| n.trim().is_empty()) {
                eprintln!("--name cannot be empty");
                process::exit(2);
            }
            if same_file(&path, &output) {
                eprintln!("--output must differ from the source save");
                process::exit(2);
            }

            let source = load_or_exit(&path, steam_id.as_deref());
            let options = DuplicateOptions {
                char_name: name,
                randomize_guid: !keep_guid,
                reset_playtime,
                reset_challenges,
                reset_uvh_challenges,
            };
            let report = Engine::new()
                .duplicate(&source, &options, &output)
                .unwrap_or_else(|e| {
                    eprintln!("Error writing {}: {e}", output.display());
                    process::exit(1);
                });

            if json {
                print_json(&render_report_json(&report));
            } else {
                for line in render_report_lines(&report) {
                    println!("{line}");
                }
            }
        }
        Command::List { root, json } => {
            let Some(root) = root.or_else(default_save_root) else {
                eprintln!("Could not locate the Borderlands 4 save directory; pass --root");
                process::exit(1);
            };
            let saves = list_character_saves(&root).unwrap_or_else(|e| {
                eprintln!("Error reading {}: {e}", root.display());
                process::exit(1);
            });

            if json {
                let value = serde_json::to_value(&saves).unwrap_or_else(|e| {
                    eprintln!("Error rendering JSON output: {e}");
                    process::exit(1);
                });
                print_json(&value);
            } else if saves.is_empty() {
                println!("No character saves found under {}", root.display());
            } else {
                for save in &saves {
                    println!("{}\t{}", save.account_key_id, save.path.display());
                }
            }
        }
        Command::UpdateCheck { url } => {
            let mut cache = VersionCache::new(GithubContentSource::new(url));
            let status = cache.check(CURRENT_VERSION).unwrap_or_else(|e| {
                eprintln!("Error checking for updates: {e}");
                process::exit(1);
            });
            if status.update_available() {
                println!(
                    "Update available: {} -> {}",
                    status.current, status.latest
                );
            } else {
                println!("bl4-dup {} is up to date", status.current);
            }
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn load_or_exit(path: &Path, steam_id: Option<&str>) -> SaveDocument {
    Engine::new()
        .load(path, steam_id.unwrap_or(""))
        .unwrap_or_else(|e| {
            eprintln!("Error loading save file: {}", path.display());
            eprintln!("  {e}");
            process::exit(1);
        })
}

fn same_file(a: &Path, b: &Path) -> bool {
    let resolve = |p: &Path| fs::canonicalize(p).unwrap_or_else(|_| p.to_path_buf());
    resolve(a) == resolve(b)
}

fn print_json(value: &JsonValue) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(e) => {
            eprintln!("Error rendering JSON output: {e}");
            process::exit(1);
        }
    }
}
