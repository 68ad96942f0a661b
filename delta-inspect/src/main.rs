use std::sync::Arc;

use anyhow::{anyhow, Context};
use clap::{Arg, ArgAction, ArgMatches, Command};
use deltalake_metadata::storage::{FileStorageBackend, ObjectStoreBackend, StorageBackend};
use deltalake_metadata::{parse, DateTimeOverflowBehavior, FormatSettings, ParseContext, Snapshot};
use tracing_subscriber::EnvFilter;
use url::Url;

fn table_args() -> [Arg; 4] {
    [
        Arg::new("uri").help("Table URI").required(true),
        Arg::new("allow_missing_columns")
            .help("Accept checkpoints without add or remove columns")
            .long("allow-missing-columns")
            .action(ArgAction::SetTrue),
        Arg::new("overflow")
            .help("Handling of dates and timestamps outside 1900-01-01 ..= 2299-12-31")
            .long("date-time-overflow")
            .value_parser(["ignore", "throw", "saturate"])
            .default_value("ignore"),
        Arg::new("timezone")
            .help("Time zone of timestamp partition values written without an offset")
            .long("timezone")
            .short('z')
            .default_value("UTC"),
    ]
}

/// Resolve a table URI to a storage backend and the table root within it.
fn open_storage(uri: &str) -> anyhow::Result<(Arc<dyn StorageBackend>, String)> {
    match Url::parse(uri) {
        Ok(url) if url.scheme() == "file" => {
            let path = url
                .to_file_path()
                .map_err(|_| anyhow!("not a local path: {uri}"))?;
            Ok((
                Arc::new(FileStorageBackend::new()),
                path.to_string_lossy().into_owned(),
            ))
        }
        // single letter schemes are windows drive letters
        Ok(url) if url.scheme().len() > 1 => {
            let (store, path) = object_store::parse_url(&url)
                .with_context(|| format!("unsupported table URI {uri}"))?;
            let backend = ObjectStoreBackend::try_new(Arc::from(store))?;
            Ok((Arc::new(backend), path.to_string()))
        }
        _ => Ok((Arc::new(FileStorageBackend::new()), uri.to_string())),
    }
}

fn load(matches: &ArgMatches) -> anyhow::Result<Snapshot> {
    let uri = matches
        .get_one::<String>("uri")
        .ok_or_else(|| anyhow!("missing table URI"))?;
    let (storage, root) = open_storage(uri)?;

    let overflow: DateTimeOverflowBehavior = matches
        .get_one::<String>("overflow")
        .map(String::as_str)
        .unwrap_or("ignore")
        .parse()?;
    let time_zone: chrono_tz::Tz = matches
        .get_one::<String>("timezone")
        .map(String::as_str)
        .unwrap_or("UTC")
        .parse()
        .map_err(|e| anyhow!("invalid time zone: {e}"))?;

    let context = ParseContext::new(storage)
        .with_format_settings(FormatSettings {
            allow_missing_columns: matches.get_flag("allow_missing_columns"),
            date_time_overflow_behavior: overflow,
        })
        .with_time_zone(time_zone);
    Ok(parse(&root, &context)?)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let matches = Command::new("Delta table inspector")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Utility to help inspect Delta tables")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("schema")
                .about("print the table columns with their resolved types")
                .arg_required_else_help(true)
                .args(table_args()),
        )
        .subcommand(
            Command::new("files")
                .about("output list of active data files")
                .arg_required_else_help(true)
                .args(table_args()),
        )
        .subcommand(
            Command::new("partitions")
                .about("output partition values per data file")
                .arg_required_else_help(true)
                .args(table_args()),
        )
        .get_matches();

    match matches.subcommand() {
        Some(("schema", schema_matches)) => {
            let snapshot = load(schema_matches)?;
            for column in snapshot.schema() {
                println!("{column}");
            }
        }
        Some(("files", files_matches)) => {
            let snapshot = load(files_matches)?;
            snapshot.data_files().iter().for_each(|f| println!("{f}"));
        }
        Some(("partitions", partitions_matches)) => {
            let snapshot = load(partitions_matches)?;
            for (file, values) in snapshot.partition_columns() {
                let rendered: Vec<_> = values
                    .iter()
                    .map(|pc| format!("{}={}", pc.column.name, pc.value))
                    .collect();
                println!("{file}\t{}", rendered.join("\t"));
            }
        }
        _ => unreachable!(),
    }

    Ok(())
}
