//! Admin command-line entry point.
//!
//! # Responsibility
//! - Drive the singleton stores against a real database file and uploads
//!   directory, printing the same JSON envelopes the HTTP surface returns.
//! - Exit non-zero whenever the envelope reports failure.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use folio_core::db::open_db;
use folio_core::{
    get_singleton, init_logging_from_config, post_singleton, AboutSummary, ApiResponse,
    AttachmentLifecycle, AttachmentPolicy, DiskFileStore, FolioConfig, FormSubmission,
    IncomingFile, NotificationSettings, PersonalDetails, SingleRecordStore, SingletonKind,
    SingletonRecord, SingletonRequest, SqliteRecordBackend,
};
use log::info;
use rusqlite::Connection;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Portfolio admin store.
#[derive(Parser)]
#[command(name = "folio", version, about = "Manage portfolio profile records")]
struct Cli {
    /// SQLite database file (overrides FOLIO_DB_PATH).
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// Uploads directory (overrides FOLIO_UPLOADS_DIR).
    #[arg(long, global = true)]
    uploads: Option<PathBuf>,
    /// Log level (overrides FOLIO_LOG_LEVEL).
    #[arg(long, global = true)]
    log_level: Option<String>,
    /// Log directory (overrides FOLIO_LOG_DIR); relative paths resolve
    /// against the working directory.
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the current record (or its empty default).
    Get {
        /// personal-details | about | notification-settings
        kind: String,
    },
    /// Replace the current record with the given fields.
    ///
    /// Fields not passed are cleared.
    Set {
        kind: String,
        /// Field assignment as `key=value`; repeatable.
        #[arg(long = "field", value_parser = parse_field)]
        fields: Vec<(String, String)>,
        /// New attachment to upload.
        #[arg(long, conflicts_with = "remove_attachment")]
        file: Option<PathBuf>,
        /// Declared content type of `--file`.
        #[arg(long, requires = "file")]
        content_type: Option<String>,
        /// Clear the attachment and delete its file.
        #[arg(long)]
        remove_attachment: bool,
    },
    /// Check a file against an upload policy without storing it.
    CheckFile {
        path: PathBuf,
        #[arg(long, value_enum, default_value_t = PolicyArg::Profile)]
        policy: PolicyArg,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PolicyArg {
    Profile,
    Project,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;

    if let Err(err) = init_logging_from_config(&config) {
        eprintln!("warning: file logging disabled: {err}");
    }

    match cli.command {
        Commands::Get { kind } => {
            let kind = SingletonKind::parse(&kind)?;
            let conn = open_db(&config.db_path)
                .with_context(|| format!("opening {}", config.db_path.display()))?;
            let response = match kind {
                SingletonKind::PersonalDetails => {
                    get_singleton(&store::<PersonalDetails>(&conn, &config))
                }
                SingletonKind::About => get_singleton(&store::<AboutSummary>(&conn, &config)),
                SingletonKind::NotificationSettings => {
                    get_singleton(&store::<NotificationSettings>(&conn, &config))
                }
            };
            print_response(&response)
        }
        Commands::Set {
            kind,
            fields,
            file,
            content_type,
            remove_attachment,
        } => {
            let kind = SingletonKind::parse(&kind)?;
            let request = build_request(fields, file.as_deref(), content_type, remove_attachment)?;
            let conn = open_db(&config.db_path)
                .with_context(|| format!("opening {}", config.db_path.display()))?;
            info!("event=cli_set module=cli status=start kind={kind}");
            let response = match kind {
                SingletonKind::PersonalDetails => {
                    post_singleton(&store::<PersonalDetails>(&conn, &config), request)
                }
                SingletonKind::About => {
                    post_singleton(&store::<AboutSummary>(&conn, &config), request)
                }
                SingletonKind::NotificationSettings => {
                    post_singleton(&store::<NotificationSettings>(&conn, &config), request)
                }
            };
            print_response(&response)
        }
        Commands::CheckFile { path, policy } => {
            let policy = match policy {
                PolicyArg::Profile => config.profile_picture_policy(),
                PolicyArg::Project => config.project_media_policy(),
            };
            check_file(&path, &policy)
        }
    }
}

fn resolve_config(cli: &Cli) -> Result<FolioConfig> {
    let mut config = FolioConfig::from_env().context("reading FOLIO_* configuration")?;
    if let Some(db) = &cli.db {
        config.db_path = db.clone();
    }
    if let Some(uploads) = &cli.uploads {
        config.uploads_dir = uploads.clone();
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(log_dir) = &cli.log_dir {
        config.set_log_dir(log_dir.clone());
    }
    Ok(config)
}

fn store<'conn, R: SingletonRecord>(
    conn: &'conn Connection,
    config: &FolioConfig,
) -> SingleRecordStore<R, SqliteRecordBackend<'conn>, DiskFileStore> {
    SingleRecordStore::new(
        SqliteRecordBackend::new(conn),
        AttachmentLifecycle::new(
            DiskFileStore::new(&config.uploads_dir),
            config.profile_picture_policy(),
        ),
    )
}

fn build_request(
    fields: Vec<(String, String)>,
    file: Option<&Path>,
    content_type: Option<String>,
    remove_attachment: bool,
) -> Result<SingletonRequest> {
    let mut fields: BTreeMap<String, String> = fields.into_iter().collect();
    if remove_attachment {
        fields.insert("remove_picture".to_string(), "true".to_string());
    }

    let file = match file {
        Some(path) => Some(read_incoming(path, content_type)?),
        None => None,
    };
    Ok(SingletonRequest::Form(FormSubmission { fields, file }))
}

fn read_incoming(path: &Path, content_type: Option<String>) -> Result<IncomingFile> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .with_context(|| format!("{} has no usable file name", path.display()))?;
    let mut incoming = IncomingFile::new(name, bytes);
    incoming.content_type = content_type;
    Ok(incoming)
}

fn check_file(path: &Path, policy: &AttachmentPolicy) -> Result<ExitCode> {
    let incoming = read_incoming(path, None)?;
    match policy.check(&incoming) {
        Ok(()) => {
            println!("accepted: {} ({} bytes)", path.display(), incoming.size());
            Ok(ExitCode::SUCCESS)
        }
        Err(reason) => {
            println!("rejected: {reason}");
            Ok(ExitCode::FAILURE)
        }
    }
}

fn print_response(response: &ApiResponse) -> Result<ExitCode> {
    println!("{}", serde_json::to_string_pretty(&response.body)?);
    if response.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

fn parse_field(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got `{raw}`"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty field name in `{raw}`"));
    }
    Ok((key.to_string(), value.to_string()))
}
