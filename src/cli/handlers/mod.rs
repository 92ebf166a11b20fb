mod init;
pub use init::cmd_init;

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::{Local, NaiveTime};

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::config_io::{self, load_config};
use crate::io::lock::StoreLock;
use crate::io::recovery::read_recovery_entries;
use crate::io::store_io::DATA_DIR;
use crate::io::vault::FsVault;
use crate::io::watcher::{VaultEvent, VaultWatcher};
use crate::model::item::ItemRef;
use crate::ops::debounce::Debouncer;
use crate::ops::item_ops::AddRequest;
use crate::ops::service::HotlistService;

type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// How often `hl watch` checks whether the daily clear is due
const AUTO_CLEAR_CHECK: Duration = Duration::from_secs(30);

/// Watch loop tick
const TICK: Duration = Duration::from_millis(50);

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> CliResult {
    let json = cli.json;
    let root = vault_root(cli.vault.as_deref())?;

    match cli.command {
        Commands::Init(args) => cmd_init(&root, args),

        // Read commands
        Commands::List => cmd_list(&root, json),
        Commands::Recovery(args) => cmd_recovery(&root, args, json),

        // Write commands
        Commands::Add(args) => cmd_add(&root, args, json),
        Commands::Remove(args) => cmd_remove(&root, args),
        Commands::Pin(args) => cmd_pin(&root, args, true),
        Commands::Unpin(args) => cmd_pin(&root, args, false),
        Commands::Reorder(args) => cmd_reorder(&root, args),
        Commands::Waiting(args) => cmd_waiting(&root, args),
        Commands::Done(args) => cmd_done(&root, args),

        // Maintenance
        Commands::Reconcile => cmd_reconcile(&root, json),
        Commands::Clear(args) => cmd_clear(&root, args, json),
        Commands::Migrate => cmd_migrate(&root, json),
        Commands::Watch => cmd_watch(&root),
        Commands::Config(cmd) => match cmd.action {
            ConfigAction::ClearTime(args) => cmd_config_clear_time(&root, args),
        },
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn vault_root(dir: Option<&str>) -> CliResult<PathBuf> {
    match dir {
        Some(dir) => std::fs::canonicalize(dir)
            .map_err(|e| format!("cannot resolve -C path '{}': {}", dir, e).into()),
        None => Ok(std::env::current_dir()?),
    }
}

fn open_service(root: &Path) -> CliResult<HotlistService<FsVault>> {
    let data_dir = root.join(DATA_DIR);
    let config = load_config(&data_dir)?;
    Ok(HotlistService::open(
        FsVault::new(root),
        data_dir,
        config,
        &Local::now(),
    )?)
}

fn lock(root: &Path) -> CliResult<StoreLock> {
    Ok(StoreLock::acquire_default(&root.join(DATA_DIR))?)
}

/// Resolve an id prefix typed by the user.
fn resolve(service: &HotlistService<FsVault>, prefix: &str) -> CliResult<ItemRef> {
    match service.store().find_by_id_prefix(prefix) {
        Ok(id) => Ok(ItemRef::Id(id)),
        Err(0) => Err(format!("no hotlist item matches '{}'", prefix).into()),
        Err(n) => Err(format!("'{}' is ambiguous: {} items match", prefix, n).into()),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

fn cmd_list(root: &Path, json: bool) -> CliResult {
    let _lock = lock(root)?;
    let service = open_service(root)?;
    if json {
        let items: Vec<ItemJson> = service.store().iter().map(item_to_json).collect();
        return print_json(&items);
    }
    for line in format_hotlist(service.store()) {
        println!("{}", line);
    }
    Ok(())
}

fn cmd_recovery(root: &Path, args: RecoveryArgs, json: bool) -> CliResult {
    let entries = read_recovery_entries(&root.join(DATA_DIR), Some(args.limit.unwrap_or(10)));
    if json {
        let values: Vec<serde_json::Value> = entries.iter().map(|e| e.to_json()).collect();
        return print_json(&values);
    }
    if entries.is_empty() {
        println!("recovery log is empty");
        return Ok(());
    }
    for entry in &entries {
        print!("{}", entry.to_display_markdown());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Write commands
// ---------------------------------------------------------------------------

fn cmd_add(root: &Path, args: AddArgs, json: bool) -> CliResult {
    let _lock = lock(root)?;
    let mut service = open_service(root)?;
    let request = AddRequest {
        file_path: args.file,
        action_text: args.text,
        category: args.category,
        is_general_action: args.general.then_some(true),
        pinned: args.pin,
    };
    let id = service.add(request, Local::now().timestamp_millis())?;
    let Some(item) = service.store().get(id) else {
        return Err("item vanished after add".into());
    };
    if json {
        return print_json(&item_to_json(item));
    }
    println!("added {}", format_item_line(item));
    Ok(())
}

fn cmd_remove(root: &Path, args: IdArg) -> CliResult {
    let _lock = lock(root)?;
    let mut service = open_service(root)?;
    let item_ref = resolve(&service, &args.id)?;
    let item = service.remove(&item_ref)?;
    println!("removed {}: {}", item.id.short(), item.display_text);
    Ok(())
}

fn cmd_pin(root: &Path, args: IdArg, pin: bool) -> CliResult {
    let _lock = lock(root)?;
    let mut service = open_service(root)?;
    let item_ref = resolve(&service, &args.id)?;
    if pin {
        service.pin(&item_ref)?;
        println!("pinned {}", args.id);
    } else {
        service.unpin(&item_ref)?;
        println!("unpinned {}", args.id);
    }
    Ok(())
}

fn cmd_reorder(root: &Path, args: ReorderArgs) -> CliResult {
    let _lock = lock(root)?;
    let mut service = open_service(root)?;
    let dragged = resolve(&service, &args.dragged)?;
    let target = resolve(&service, &args.target)?;
    if !service.reorder_pinned(&dragged, &target)? {
        return Err("only pinned items can be reordered".into());
    }
    println!("moved {} to {}", args.dragged, args.target);
    Ok(())
}

fn cmd_waiting(root: &Path, args: IdArg) -> CliResult {
    let _lock = lock(root)?;
    let mut service = open_service(root)?;
    let item_ref = resolve(&service, &args.id)?;
    service.mark_waiting(&item_ref)?;
    println!("waiting on {}", args.id);
    Ok(())
}

fn cmd_done(root: &Path, args: IdArg) -> CliResult {
    let _lock = lock(root)?;
    let mut service = open_service(root)?;
    let item_ref = resolve(&service, &args.id)?;
    match service.mark_complete(&item_ref, &Local::now())? {
        Some(item) => println!("done {}: {}", item.id.short(), item.display_text),
        None => println!("done {}", args.id),
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Maintenance
// ---------------------------------------------------------------------------

fn cmd_reconcile(root: &Path, json: bool) -> CliResult {
    let _lock = lock(root)?;
    let mut service = open_service(root)?;
    let Some(report) = service.reconcile(&Local::now())? else {
        return Ok(());
    };
    if json {
        return print_json(&reconcile_to_json(&report));
    }
    for line in format_reconcile_summary(&report) {
        println!("{}", line);
    }
    Ok(())
}

fn cmd_clear(root: &Path, args: ClearArgs, json: bool) -> CliResult {
    let _lock = lock(root)?;
    let mut service = open_service(root)?;
    let now = Local::now();
    let outcome = if args.force {
        Some(service.force_clear(&now)?)
    } else {
        service.run_auto_clear(&now)?
    };

    let Some(outcome) = outcome else {
        if json {
            return print_json(&serde_json::json!({ "cleared": false }));
        }
        println!("nothing to clear yet (use --force to clear now)");
        return Ok(());
    };
    if json {
        return print_json(&serde_json::json!({
            "cleared": true,
            "archived": outcome.archived.len(),
            "archiveFile": outcome.archive_file,
        }));
    }
    println!(
        "archived {} item(s) to {}",
        outcome.archived.len(),
        outcome.archive_file
    );
    Ok(())
}

fn cmd_migrate(root: &Path, json: bool) -> CliResult {
    let _lock = lock(root)?;
    let mut service = open_service(root)?;
    let report = service.migrate(Local::now().timestamp_millis())?;
    if json {
        return print_json(&migration_to_json(&report));
    }
    println!(
        "migrated {} item(s) from {} file(s)",
        report.added,
        report.files_changed.len()
    );
    if report.relinked > 0 {
        println!("  {} tracked item(s) follow their cleaned lines", report.relinked);
    }
    for path in &report.skipped {
        println!("  skipped unreadable {}", path);
    }
    Ok(())
}

fn cmd_config_clear_time(root: &Path, args: ClearTimeArgs) -> CliResult {
    let value = if args.value.eq_ignore_ascii_case("off") {
        String::new()
    } else {
        NaiveTime::parse_from_str(&args.value, "%H:%M")
            .map_err(|_| format!("invalid time '{}' (expected HH:MM or off)", args.value))?
            .format("%H:%M")
            .to_string()
    };

    let data_dir = root.join(DATA_DIR);
    let mut doc = config_io::read_config_doc(&data_dir)?;
    config_io::set_auto_clear_time(&mut doc, &value);
    config_io::write_config_doc(&data_dir, &doc)?;

    if value.is_empty() {
        println!("auto-clear disabled");
    } else {
        println!("auto-clear time set to {}", value);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Watch loop
// ---------------------------------------------------------------------------

fn cmd_watch(root: &Path) -> CliResult {
    let mut service = {
        let _lock = lock(root)?;
        let mut service = open_service(root)?;
        if let Some(report) = service.migrate_once(Local::now().timestamp_millis())?
            && report.added > 0
        {
            tracing::info!(added = report.added, "migrated legacy markers");
        }
        service.reconcile(&Local::now())?;
        service.run_auto_clear(&Local::now())?;
        service
    };

    let watcher = VaultWatcher::start(root)?;
    let mut debouncer: Debouncer<()> =
        Debouncer::new(Duration::from_millis(service.config().hotlist.debounce_ms));
    let mut next_clear_check = Instant::now() + AUTO_CLEAR_CHECK;
    eprintln!("watching {} (Ctrl-C to stop)", root.display());

    loop {
        let now = Instant::now();
        for event in watcher.poll() {
            let VaultEvent::Changed(paths) = event;
            tracing::debug!(?paths, "vault changed");
            debouncer.schedule(now, ());
        }

        if debouncer.poll(now).is_some() {
            match watch_reconcile(root, &mut service) {
                Ok(true) => {}
                // another process holds the store; try again after a quiet period
                Ok(false) => debouncer.schedule(now, ()),
                Err(e) => tracing::warn!(error = %e, "reconcile failed"),
            }
        }

        if now >= next_clear_check {
            next_clear_check = now + AUTO_CLEAR_CHECK;
            if let Err(e) = watch_auto_clear(root, &mut service) {
                tracing::warn!(error = %e, "auto-clear failed");
            }
        }

        std::thread::sleep(TICK);
    }
}

/// Returns false without doing anything when the store is locked.
fn watch_reconcile(root: &Path, service: &mut HotlistService<FsVault>) -> CliResult<bool> {
    let Some(_lock) = StoreLock::try_acquire(&root.join(DATA_DIR))? else {
        tracing::debug!("store busy, deferring reconcile");
        return Ok(false);
    };
    let now = Local::now();
    service.reload(&now)?;
    if let Some(report) = service.reconcile(&now)?
        && report.changed()
    {
        for line in format_reconcile_summary(&report) {
            println!("{}", line);
        }
    }
    Ok(true)
}

fn watch_auto_clear(root: &Path, service: &mut HotlistService<FsVault>) -> CliResult {
    let _lock = lock(root)?;
    let now = Local::now();
    service.reload(&now)?;
    if let Some(outcome) = service.run_auto_clear(&now)? {
        println!(
            "archived {} item(s) to {}",
            outcome.archived.len(),
            outcome.archive_file
        );
    }
    Ok(())
}
