use crate::cli::core::{require_arg, short_id, CommandError, CommandResult, ShellContext};
use crate::cli::output;
use crate::core::services::InvestmentService;
use crate::ledger::Child;

use super::CommandDefinition;

const USAGE: &str = "child <add|list|rename|avatar|remove|move> ...";

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![CommandDefinition::new(
        "child",
        "Manage child profiles",
        "child add <name> [avatar-url] | child list | child rename <child> <name> | \
         child avatar <child> <url> | child remove <child> | child move <child> <position>",
        cmd_child,
    )]
}

fn cmd_child(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let sub = require_arg(args, 0, USAGE)?.to_lowercase();
    let rest = &args[1..];
    match sub.as_str() {
        "add" => add(context, rest),
        "list" | "ls" => list(context),
        "rename" => rename(context, rest),
        "avatar" => avatar(context, rest),
        "remove" | "rm" => remove(context, rest),
        "move" => move_child(context, rest),
        other => Err(CommandError::InvalidArguments(format!(
            "unknown child subcommand `{}` (usage: {})",
            other, USAGE
        ))),
    }
}

fn add(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let name = require_arg(args, 0, "child add <name> [avatar-url]")?;
    let mut child = Child::new(name);
    if let Some(url) = args.get(1) {
        child = child.with_avatar(*url);
    }
    let id = context.manager.add_child(child)?;
    output::success(format!("Added {} ({}).", name.trim(), short_id(id)));
    Ok(())
}

fn list(context: &mut ShellContext) -> CommandResult {
    context.reconcile()?;
    let ledger = context.ledger()?;
    if ledger.children.is_empty() {
        output::info("No children yet. Use `child add <name>` to create one.");
        return Ok(());
    }
    output::section("Children");
    let rows: Vec<Vec<String>> = ledger
        .children
        .iter()
        .enumerate()
        .map(|(index, child)| {
            let level = if child.shows_level() {
                format!("Lv {}", child.level())
            } else {
                String::new()
            };
            vec![
                (index + 1).to_string(),
                short_id(child.id),
                child.name.clone(),
                child.total_points.to_string(),
                InvestmentService::locked_points(&ledger, child.id).to_string(),
                level,
            ]
        })
        .collect();
    output::table(&["#", "ID", "Name", "Points", "Invested", "Level"], &rows);
    Ok(())
}

fn rename(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let usage = "child rename <child> <name>";
    let query = require_arg(args, 0, usage)?;
    let name = require_arg(args, 1, usage)?;
    let child = context.resolve_child(&context.ledger()?, query)?;
    context.manager.rename_child(child.id, name)?;
    output::success(format!("Renamed {} to {}.", child.name, name.trim()));
    Ok(())
}

fn avatar(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let usage = "child avatar <child> <url>";
    let query = require_arg(args, 0, usage)?;
    let url = require_arg(args, 1, usage)?;
    let child = context.resolve_child(&context.ledger()?, query)?;
    context.manager.set_avatar(child.id, url)?;
    output::success(format!("Updated avatar for {}.", child.name));
    Ok(())
}

fn remove(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let query = require_arg(args, 0, "child remove <child>")?;
    let child = context.resolve_child(&context.ledger()?, query)?;
    let prompt = format!(
        "Remove {} together with all of their history and deposits?",
        child.name
    );
    if !context.confirm(&prompt)? {
        output::info("Nothing removed.");
        return Ok(());
    }
    let removal = context.manager.remove_child(child.id)?;
    output::success(format!(
        "Removed {} ({} entries, {} deposits).",
        removal.child.name, removal.logs_removed, removal.investments_removed
    ));
    Ok(())
}

fn move_child(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let usage = "child move <child> <position>";
    let query = require_arg(args, 0, usage)?;
    let position: usize = require_arg(args, 1, usage)?
        .parse()
        .ok()
        .filter(|position| *position >= 1)
        .ok_or_else(|| CommandError::InvalidArguments("position must be 1 or more".into()))?;
    let child = context.resolve_child(&context.ledger()?, query)?;
    let placed = context.manager.move_child(child.id, position - 1)?;
    output::success(format!("{} is now at position {}.", child.name, placed + 1));
    Ok(())
}
