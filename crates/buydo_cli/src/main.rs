//! CLI smoke entry point.
//!
//! Opens (and on first run seeds) a Buydo data directory, prints a summary
//! of every collection and flushes pending writes.
//!
//! Usage: `buydo_cli <data_dir> [config.json]`

use buydo_core::{init_from_config, Collaborators, CoreConfig, ReactiveStore, SqliteKvStore};
use log::info;
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut args = std::env::args().skip(1);
    let Some(data_dir) = args.next() else {
        eprintln!("usage: buydo_cli <data_dir> [config.json]");
        return ExitCode::from(2);
    };

    match run(&data_dir, args.next().as_deref()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("buydo_cli: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(data_dir: &str, config_path: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = match config_path {
        Some(path) => CoreConfig::load(path)?,
        None => CoreConfig::default(),
    };
    config.data_dir = data_dir.into();
    std::fs::create_dir_all(&config.data_dir)?;

    if let Err(err) = init_from_config(&config) {
        eprintln!("buydo_cli: logging disabled: {err}");
    }

    let kv = SqliteKvStore::open(config.db_path())?;
    let mut store = ReactiveStore::open(kv, Collaborators::default(), config);

    println!("buydo_core version={}", buydo_core::core_version());
    println!("seed={:?}", store.seed_outcome());
    for shop in store.stores() {
        println!(
            "store id={} name={} open_items={}",
            shop.id,
            shop.name,
            store.get_store_item_count(&shop.id)
        );
    }
    let (active, completed) = store.todo_counts();
    println!("todos active={active} completed={completed}");
    for note in store.notes_by_recency() {
        println!("note id={} title={} blocks={}", note.id, note.title, note.blocks.len());
    }

    let report = store.flush_pending();
    info!(
        "event=cli_flush module=cli status={} written={}",
        if report.is_clean() { "ok" } else { "error" },
        report.written.len()
    );
    if !report.is_clean() {
        return Err(format!("failed to persist {:?}", report.failed).into());
    }
    Ok(())
}
