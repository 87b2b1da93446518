use std::path::PathBuf;

use crate::cli::core::{parse_rate, require_arg, CommandError, CommandResult, ShellContext};
use crate::cli::output;
use crate::providers::FeedFileRates;

use super::CommandDefinition;

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new("banks", "Show banks and their rates", "banks", cmd_banks),
        CommandDefinition::new(
            "bank-rate",
            "Override a bank's annual rate",
            "bank-rate <bank> <rate>",
            cmd_bank_rate,
        ),
        CommandDefinition::new(
            "refresh-rates",
            "Load rates from a rate feed file",
            "refresh-rates [feed-path]",
            cmd_refresh_rates,
        ),
        CommandDefinition::new(
            "api-key",
            "Show, set or clear the stored API key",
            "api-key [show|set <key>|clear]",
            cmd_api_key,
        ),
    ]
}

fn cmd_banks(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let banks = context.manager.banks()?;
    output::section("Banks");
    let rows: Vec<Vec<String>> = banks
        .iter()
        .map(|bank| {
            vec![
                bank.id.clone(),
                bank.name.clone(),
                format!("{:.2}%", bank.rate),
                bank.description.clone(),
            ]
        })
        .collect();
    output::table(&["ID", "Name", "Rate", "About"], &rows);
    Ok(())
}

fn cmd_bank_rate(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let usage = "bank-rate <bank> <rate>";
    let bank = require_arg(args, 0, usage)?;
    let rate = parse_rate(require_arg(args, 1, usage)?)?;
    let bank = context.manager.set_bank_rate(bank, rate)?;
    output::success(format!("{} now pays {:.2}%.", bank.name, bank.rate));
    Ok(())
}

fn cmd_refresh_rates(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let path = match args.first() {
        Some(path) => PathBuf::from(path),
        None => context.config.rates_feed.clone().ok_or_else(|| {
            CommandError::InvalidArguments(
                "no rate feed configured; pass a path or set `rates_feed` in config.json".into(),
            )
        })?,
    };
    match context.manager.refresh_rates(&FeedFileRates::new(path))? {
        Some(quote) => {
            output::success(format!("Fetched {} rate(s).", quote.rates.len()));
            for source in quote.sources {
                output::info(format!("  Source: {} <{}>", source.title, source.uri));
            }
        }
        None => output::warning("Could not read the rate feed. Keeping current rates."),
    }
    Ok(())
}

fn cmd_api_key(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    match args.first().map(|arg| arg.to_lowercase()).as_deref() {
        None | Some("show") => match context.manager.api_key()? {
            Some(key) => output::info(format!("API key: {}", mask(&key))),
            None => output::info("No API key set."),
        },
        Some("set") => {
            let key = require_arg(args, 1, "api-key set <key>")?;
            context.manager.set_api_key(Some(key))?;
            output::success("API key saved.");
        }
        Some("clear") => {
            context.manager.set_api_key(None)?;
            output::success("Stored API key cleared.");
        }
        Some(other) => {
            return Err(CommandError::InvalidArguments(format!(
                "unknown api-key action `{}`",
                other
            )))
        }
    }
    Ok(())
}

fn mask(key: &str) -> String {
    let visible: String = key.chars().rev().take(4).collect::<Vec<_>>().into_iter().rev().collect();
    format!("****{}", visible)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_keeps_last_four() {
        assert_eq!(mask("abcdef123456"), "****3456");
        assert_eq!(mask("ab"), "****ab");
    }
}
