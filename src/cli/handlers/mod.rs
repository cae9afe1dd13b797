use std::path::Path;
use std::sync::Arc;

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::config_io::{read_config, resolve_data_dir};
use crate::io::recovery::{self, RecoveryCategory, read_recovery_entries};
use crate::io::repository::{ListRepository, RepositoryError};
use crate::io::store::FileStore;
use crate::model::Item;
use crate::ops::list_ops::WriteOp;

type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Default number of entries printed by `lk recovery`
const DEFAULT_RECOVERY_LIMIT: usize = 10;

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> CmdResult {
    let json = cli.json;
    let data_dir = resolve_data_dir(cli.data_dir.as_deref());

    match cli.command {
        // No subcommand launches the TUI from main.rs
        None => Ok(()),
        Some(cmd) => match cmd {
            Commands::List => cmd_list(&data_dir, json),
            Commands::Show(args) => cmd_show(&data_dir, args, json),
            Commands::Add(args) => cmd_add(&data_dir, args, json),
            Commands::Edit(args) => cmd_edit(&data_dir, args, json),
            Commands::Delete(args) => cmd_delete(&data_dir, args, json),
            Commands::Recovery(args) => cmd_recovery(&data_dir, args, json),
        },
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Open the list repository configured for `data_dir`.
fn open_repository(data_dir: &Path) -> Result<ListRepository<FileStore>, Box<dyn std::error::Error>> {
    let config = read_config(data_dir)?;
    let store = FileStore::open(data_dir, &config.store.file)?;
    Ok(ListRepository::with_key(Arc::new(store), config.store.key))
}

/// Convert a 1-based item number from the command line to an index.
fn to_index(number: usize) -> Result<usize, String> {
    number
        .checked_sub(1)
        .ok_or_else(|| "item numbers start at 1".to_string())
}

/// Log unreadable stored text before reporting the error, so it can be
/// recovered by hand even if the list is reset later. Repeated commands
/// against the same text log it once.
fn note_decode_failure(data_dir: &Path, key: &str, err: RepositoryError) -> RepositoryError {
    if let RepositoryError::Decode(ref decode) = err {
        let already_logged = read_recovery_entries(data_dir, None)
            .into_iter()
            .find(|e| e.category == RecoveryCategory::Decode)
            .is_some_and(|e| e.body == decode.raw);
        if !already_logged {
            recovery::log_decode_failure(data_dir, key, &decode.raw, &decode.source.to_string());
        }
    }
    err
}

fn load_items(
    data_dir: &Path,
    repo: &ListRepository<FileStore>,
) -> Result<Vec<Item>, RepositoryError> {
    repo.load()
        .map_err(|e| note_decode_failure(data_dir, repo.key(), e))
}

fn modify(
    data_dir: &Path,
    repo: &ListRepository<FileStore>,
    op: &WriteOp,
) -> Result<Vec<Item>, RepositoryError> {
    repo.modify(op)
        .map_err(|e| note_decode_failure(data_dir, repo.key(), e))
}

fn item_at(items: &[Item], number: usize) -> Result<(usize, Item), String> {
    let index = to_index(number)?;
    items
        .get(index)
        .cloned()
        .map(|item| (index, item))
        .ok_or_else(|| match items.len() {
            0 => format!("no item {}: the list is empty", number),
            1 => format!("no item {}: the list has 1 item", number),
            n => format!("no item {}: the list has {} items", number, n),
        })
}

fn print_item(index: usize, item: &Item, json: bool) -> CmdResult {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&item_to_json(index, item))?
        );
    } else {
        for line in format_item_detail(index, item) {
            println!("{}", line);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

fn cmd_list(data_dir: &Path, json: bool) -> CmdResult {
    let repo = open_repository(data_dir)?;
    let items = load_items(data_dir, &repo)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&items_to_json(&items))?);
    } else if items.is_empty() {
        println!("no items");
    } else {
        for line in format_item_list(&items) {
            println!("{}", line);
        }
    }
    Ok(())
}

fn cmd_show(data_dir: &Path, args: ShowArgs, json: bool) -> CmdResult {
    let repo = open_repository(data_dir)?;
    let items = load_items(data_dir, &repo)?;
    let (index, item) = item_at(&items, args.index)?;
    print_item(index, &item, json)
}

fn cmd_recovery(data_dir: &Path, args: RecoveryArgs, json: bool) -> CmdResult {
    let limit = args.limit.unwrap_or(DEFAULT_RECOVERY_LIMIT);
    let entries = read_recovery_entries(data_dir, Some(limit));

    if json {
        let values: Vec<serde_json::Value> = entries.iter().map(|e| e.to_json()).collect();
        println!("{}", serde_json::to_string_pretty(&values)?);
        return Ok(());
    }
    if entries.is_empty() {
        println!("no recovery entries");
        return Ok(());
    }
    for (i, entry) in entries.iter().enumerate() {
        if i > 0 {
            println!();
        }
        for line in format_recovery_entry(entry) {
            println!("{}", line);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Write commands
// ---------------------------------------------------------------------------

fn cmd_add(data_dir: &Path, args: AddArgs, json: bool) -> CmdResult {
    let repo = open_repository(data_dir)?;
    let item = Item::new(args.title.unwrap_or_default())
        .with_description(args.description.unwrap_or_default());

    let items = modify(data_dir, &repo, &WriteOp::Append(item))?;
    let index = items.len() - 1;
    if json {
        return print_item(index, &items[index], true);
    }
    println!("added {}. {}", index + 1, items[index].title);
    Ok(())
}

fn cmd_edit(data_dir: &Path, args: EditArgs, json: bool) -> CmdResult {
    if args.title.is_none() && args.description.is_none() {
        return Err("nothing to change: pass --title and/or --description".into());
    }

    let repo = open_repository(data_dir)?;
    let items = load_items(data_dir, &repo)?;
    let (index, current) = item_at(&items, args.index)?;

    let mut item = current.clone();
    if let Some(title) = args.title {
        item = item.with_title(title);
    }
    if let Some(description) = args.description {
        item = item.with_description(description);
    }

    modify(
        data_dir,
        &repo,
        &WriteOp::Replace {
            index,
            expected: Some(current),
            item: item.clone(),
        },
    )?;
    if json {
        return print_item(index, &item, true);
    }
    println!("updated {}. {}", index + 1, item.title);
    Ok(())
}

fn cmd_delete(data_dir: &Path, args: DeleteArgs, json: bool) -> CmdResult {
    let repo = open_repository(data_dir)?;
    let items = load_items(data_dir, &repo)?;
    let (index, item) = item_at(&items, args.index)?;

    modify(
        data_dir,
        &repo,
        &WriteOp::Remove {
            index,
            expected: Some(item.clone()),
        },
    )?;
    recovery::log_item_deletion(data_dir, index, &item);

    if json {
        return print_item(index, &item, true);
    }
    println!("deleted {}. {}", index + 1, item.title);
    Ok(())
}
