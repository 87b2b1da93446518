use std::fs;

use chrono::Local;

use crate::cli::core::{require_arg, CommandError, CommandResult, ShellContext};
use crate::cli::output;

use super::CommandDefinition;

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new(
            "export",
            "Write all children, history and deposits as JSON",
            "export [path]",
            cmd_export,
        ),
        CommandDefinition::new(
            "import",
            "Replace all data with an exported JSON file",
            "import <path>",
            cmd_import,
        ),
        CommandDefinition::new(
            "verify",
            "Check that balances match history",
            "verify",
            cmd_verify,
        ),
        CommandDefinition::new("backups", "List automatic backups", "backups", cmd_backups),
        CommandDefinition::new(
            "restore",
            "Restore a backup by its number in `backups`",
            "restore <number>",
            cmd_restore,
        ),
    ]
}

fn cmd_export(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    context.reconcile()?;
    let json = context.manager.export_json()?;
    match args.first() {
        Some(path) => {
            fs::write(path, json)?;
            output::success(format!("Exported to {}.", path));
        }
        None => println!("{}", json),
    }
    Ok(())
}

fn cmd_import(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let path = require_arg(args, 0, "import <path>")?;
    let raw = fs::read_to_string(path)?;
    if !context.confirm("Importing replaces all current data. Continue?")? {
        output::info("Import cancelled.");
        return Ok(());
    }
    let summary = context.manager.import_json(&raw)?;
    output::success(format!(
        "Imported {} children, {} entries and {} deposits.",
        summary.children, summary.logs, summary.investments
    ));
    if let Some(backup) = summary.backup {
        output::info(format!("Previous data saved to {}.", backup.display()));
    }
    for warning in summary.warnings {
        output::warning(warning);
    }
    Ok(())
}

fn cmd_verify(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let warnings = context.manager.verify()?;
    if warnings.is_empty() {
        output::success("All balances match their history.");
    } else {
        for warning in warnings {
            output::warning(warning);
        }
    }
    Ok(())
}

fn cmd_backups(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let backups = context.store.list_backups()?;
    if backups.is_empty() {
        output::info("No backups yet.");
        return Ok(());
    }
    output::section("Backups");
    let rows: Vec<Vec<String>> = backups
        .iter()
        .enumerate()
        .map(|(index, backup)| {
            vec![
                (index + 1).to_string(),
                backup
                    .created_at
                    .map(|at| at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
                    .unwrap_or_else(|| "unknown".into()),
                backup.note.clone().unwrap_or_default(),
            ]
        })
        .collect();
    output::table(&["#", "Created", "Note"], &rows);
    Ok(())
}

fn cmd_restore(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let index: usize = require_arg(args, 0, "restore <number>")?
        .parse()
        .ok()
        .filter(|index| *index >= 1)
        .ok_or_else(|| CommandError::InvalidArguments("backup number must be 1 or more".into()))?;
    let backups = context.store.list_backups()?;
    let backup = backups
        .get(index - 1)
        .ok_or_else(|| CommandError::InvalidArguments(format!("no backup #{}", index)))?;
    let restored = context.store.load_backup(&backup.path)?;
    if !context.confirm("Restoring replaces all current data. Continue?")? {
        output::info("Restore cancelled.");
        return Ok(());
    }
    let current = context.ledger()?;
    context
        .manager
        .store()
        .backup(&current, Some("pre-restore"))?;
    context.manager.transact(|ledger| {
        *ledger = restored;
        Ok(())
    })?;
    output::success(format!("Restored backup #{}.", index));
    Ok(())
}
