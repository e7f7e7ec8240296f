//! keep-mcp CLI: notes and nested checklists over MCP and REST.
//!
//! Usage:
//!   keep-mcp mcp [--db path | --memory]
//!   keep-mcp rest [--host 0.0.0.0] [--port 8001]
//!   keep-mcp notes list [--query text]
//!   keep-mcp notes show <note_id>

use clap::{Args, Parser, Subcommand};
use keep_mcp::config::{Settings, DEFAULT_HOST, DEFAULT_LABEL, DEFAULT_PORT};
use keep_mcp::{KeepApi, Note, NoteId};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "keep-mcp",
    version,
    about = "Notes and nested checklists for agents, over MCP and REST"
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GlobalArgs {
    /// Allow modifying notes that lack the protective label
    #[arg(long, global = true, env = "UNSAFE_MODE")]
    unsafe_mode: bool,

    /// Protective label required on notes this server modifies
    #[arg(long, global = true, env = "KEEP_MCP_LABEL", default_value = DEFAULT_LABEL)]
    label: String,

    /// Path to SQLite database file
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Keep notes in memory only (nothing is persisted)
    #[arg(long, global = true, conflicts_with = "db")]
    memory: bool,

    /// Upper bound for a single store load or save, in milliseconds
    #[arg(long, global = true, default_value_t = 10_000)]
    store_timeout_ms: u64,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the MCP (Model Context Protocol) server on stdio
    Mcp,
    /// Start the REST API server
    Rest {
        /// Interface to bind
        #[arg(long, env = "REST_API_HOST", default_value = DEFAULT_HOST)]
        host: String,
        /// Port to listen on
        #[arg(long, env = "REST_API_PORT", default_value_t = DEFAULT_PORT)]
        port: u16,
    },
    /// Inspect stored notes
    Notes {
        #[command(subcommand)]
        action: NotesAction,
    },
}

#[derive(Subcommand)]
enum NotesAction {
    /// List active notes
    List {
        /// Only notes whose title, text or items contain this text
        #[arg(long)]
        query: Option<String>,
    },
    /// Print a note with its checklist as an indented outline
    Show {
        /// ID of the note
        note_id: String,
    },
}

impl GlobalArgs {
    fn settings(&self) -> Settings {
        Settings {
            unsafe_mode: self.unsafe_mode,
            label: self.label.clone(),
            db: self.db.clone(),
            memory: self.memory,
            store_timeout: Duration::from_millis(self.store_timeout_ms),
            ..Settings::default()
        }
    }
}

/// Logs go to stderr; stdout carries the MCP protocol.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("keep_mcp=info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn open_api(settings: &Settings) -> Result<KeepApi, String> {
    let store = settings.open_store().map_err(|e| {
        format!(
            "Failed to open database at {}: {}",
            settings.db_path().display(),
            e
        )
    })?;
    Ok(KeepApi::from_settings(store, settings))
}

fn render_note(note: &Note) -> String {
    let mut out = format!("{} [{}] {}\n", note.id, note.kind.as_str(), note.title);
    if !note.labels.is_empty() {
        let labels: Vec<&str> = note.labels.iter().map(String::as_str).collect();
        out.push_str(&format!("labels: {}\n", labels.join(", ")));
    }
    if !note.text.is_empty() {
        out.push_str(&note.text);
        out.push('\n');
    }
    for (depth, item) in note.items.outline() {
        let mark = if item.checked { 'x' } else { ' ' };
        out.push_str(&format!("{}[{}] {}\n", "  ".repeat(depth), mark, item.text));
    }
    out
}

async fn cmd_notes_list(api: &KeepApi, query: Option<&str>) -> i32 {
    let notes = match api.find_notes(query).await {
        Ok(notes) => notes,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    if notes.is_empty() {
        println!("No notes found.");
        return 0;
    }
    println!("{:<36}  {:<5}  {:>5}  {}", "ID", "TYPE", "ITEMS", "TITLE");
    println!("{}", "-".repeat(72));
    for note in notes {
        println!(
            "{:<36}  {:<5}  {:>5}  {}",
            note.id,
            note.kind.as_str(),
            note.items.len(),
            note.title
        );
    }
    0
}

async fn cmd_notes_show(api: &KeepApi, note_id: &str) -> i32 {
    match api.get_note(&NoteId::from(note_id)).await {
        Ok(note) => {
            print!("{}", render_note(&note));
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing();

    let mut settings = cli.global.settings();
    if let Commands::Rest { host, port } = &cli.command {
        settings.host = host.clone();
        settings.port = *port;
    }

    let api = match open_api(&settings) {
        Ok(api) => api,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    if settings.unsafe_mode {
        tracing::warn!("unsafe mode: notes without the '{}' label can be modified", settings.label);
    }

    let code = match cli.command {
        Commands::Mcp => keep_mcp::mcp::run_mcp_server(api).await,
        Commands::Rest { .. } => match keep_mcp::rest::serve(api, &settings.bind_addr()).await {
            Ok(()) => 0,
            Err(e) => {
                eprintln!("Error: REST server failed on {}: {}", settings.bind_addr(), e);
                1
            }
        },
        Commands::Notes { action } => match action {
            NotesAction::List { query } => cmd_notes_list(&api, query.as_deref()).await,
            NotesAction::Show { note_id } => cmd_notes_show(&api, &note_id).await,
        },
    };
    std::process::exit(code);
}
