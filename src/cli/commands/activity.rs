use chrono::Local;

use crate::cli::core::{
    parse_points, require_arg, short_id, CommandError, CommandResult, ParsedArgs, ShellContext,
};
use crate::cli::output;
use crate::core::services::HistoryService;
use crate::ledger::{ActivityCategory, EntryMode};
use crate::providers::PastEntrySuggester;

use super::CommandDefinition;

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new(
            "earn",
            "Award points to a child",
            "earn <child> <points> <description...> [--category <category>]",
            cmd_earn,
        ),
        CommandDefinition::new(
            "redeem",
            "Spend points from a child's balance",
            "redeem <child> <points> <description...> [--category <category>]",
            cmd_redeem,
        ),
        CommandDefinition::new(
            "edit",
            "Change a history entry",
            "edit <entry> [--points <n>] [--description <text>] [--category <category>] [--child <child>]",
            cmd_edit,
        ),
        CommandDefinition::new("delete", "Delete a history entry", "delete <entry>", cmd_delete),
        CommandDefinition::new(
            "history",
            "Show a child's history by month",
            "history <child>",
            cmd_history,
        ),
        CommandDefinition::new(
            "suggest",
            "Suggest points for an activity from past entries",
            "suggest <child> <text...>",
            cmd_suggest,
        ),
    ]
}

fn cmd_earn(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    record(context, args, EntryMode::Earn)
}

fn cmd_redeem(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    record(context, args, EntryMode::Redeem)
}

fn record(context: &mut ShellContext, args: &[&str], mode: EntryMode) -> CommandResult {
    let usage = match mode {
        EntryMode::Earn => "earn <child> <points> <description...>",
        EntryMode::Redeem => "redeem <child> <points> <description...>",
    };
    let parsed = ParsedArgs::parse(args)?;
    let query = require_arg(&parsed.positional, 0, usage)?;
    let points = parse_points(require_arg(&parsed.positional, 1, usage)?)?;
    let description = parsed.rest(2);
    let category = parsed.option("category").map(parse_category).transpose()?;

    context.reconcile()?;
    let child = context.resolve_child(&context.ledger()?, query)?;
    let entry = context
        .manager
        .record_activity(child.id, &description, points, mode, category)?;
    output::success(format!(
        "{} {:+} points for {} ({}).",
        child.name,
        entry.points,
        entry.description,
        short_id(entry.id)
    ));
    Ok(())
}

fn cmd_edit(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args)?;
    let query = require_arg(&parsed.positional, 0, "edit <entry> [--points <n>] ...")?;
    let ledger = context.ledger()?;
    let mut entry = context.resolve_entry(&ledger, query)?;
    let mode = entry.mode();

    if let Some(points) = parsed.option("points") {
        entry.points = mode.signed(parse_points(points)?).ok_or_else(|| {
            CommandError::InvalidArguments(format!("invalid points value `{}`", points))
        })?;
    }
    if let Some(description) = parsed.option("description") {
        entry.description = description.trim().to_string();
    }
    if let Some(category) = parsed.option("category") {
        entry.category = parse_category(category)?;
    }
    if let Some(child) = parsed.option("child") {
        entry.child_id = context.resolve_child(&ledger, child)?.id;
    }

    let previous = context.manager.update_entry(entry.clone())?;
    output::success(format!(
        "Updated entry {} ({:+} -> {:+}).",
        short_id(entry.id),
        previous.points,
        entry.points
    ));
    Ok(())
}

fn cmd_delete(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let query = require_arg(args, 0, "delete <entry>")?;
    let entry = context.resolve_entry(&context.ledger()?, query)?;
    let removed = context.manager.delete_entry(entry.id)?;
    output::success(format!(
        "Deleted `{}` ({:+} points).",
        removed.description, removed.points
    ));
    Ok(())
}

fn cmd_history(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let query = require_arg(args, 0, "history <child>")?;
    context.reconcile()?;
    let ledger = context.ledger()?;
    let child = context.resolve_child(&ledger, query)?;
    let groups = HistoryService::monthly(&ledger, child.id, &Local);
    output::section(format!("{} - {} points", child.name, child.total_points));
    if groups.is_empty() {
        output::info("No history yet.");
        return Ok(());
    }
    for group in groups {
        output::info(format!("{} ({:+})", group.label(), group.net_points()));
        let rows: Vec<Vec<String>> = group
            .entries
            .iter()
            .map(|entry| {
                vec![
                    short_id(entry.id),
                    entry.timestamp.with_timezone(&Local).format("%d %b %H:%M").to_string(),
                    format!("{:+}", entry.points),
                    entry.category.to_string(),
                    entry.description.clone(),
                ]
            })
            .collect();
        output::table(&["ID", "When", "Points", "Category", "Description"], &rows);
    }
    Ok(())
}

fn cmd_suggest(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let usage = "suggest <child> <text...>";
    let query = require_arg(args, 0, usage)?;
    let text = args.get(1..).map(|rest| rest.join(" ")).unwrap_or_default();
    if text.trim().is_empty() {
        return Err(CommandError::InvalidArguments(format!("usage: {}", usage)));
    }
    let ledger = context.ledger()?;
    let child = context.resolve_child(&ledger, query)?;
    let suggester = PastEntrySuggester::new(ledger.logs.iter().cloned());
    let mode = EntryMode::Earn;
    match context.manager.suggest_entry(&suggester, child.id, &text, mode)? {
        Some(entry) => output::info(format!(
            "Try: earn {} {} \"{}\" --category {}",
            child.name,
            entry.points.unsigned_abs(),
            entry.description,
            entry.category
        )),
        None => output::info("No similar activity found."),
    }
    Ok(())
}

fn parse_category(input: &str) -> Result<ActivityCategory, CommandError> {
    input.parse().map_err(CommandError::InvalidArguments)
}
