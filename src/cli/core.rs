//! Core CLI loop, dispatch, and shell context helpers.

use std::{collections::HashMap, io, path::PathBuf};

use dialoguer::{theme::ColorfulTheme, Confirm};
use strsim::levenshtein;
use uuid::Uuid;

use crate::{
    config::{Config, ConfigManager},
    core::{
        ledger_manager::LedgerManager,
        services::{ActivityService, ChildService, InvestmentService, ServiceError, SettlementKind},
    },
    errors::LedgerError,
    ledger::{ActivityLog, Child, Investment, Ledger},
    storage::JsonStore,
};

use super::commands::{self, CommandDefinition, CommandRegistry};
use super::output::{self, OutputPreferences};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliMode {
    Interactive,
    Script,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoopControl {
    Continue,
    Exit,
}

pub type CommandResult = Result<(), CommandError>;

pub struct ShellContext {
    pub mode: CliMode,
    pub registry: CommandRegistry,
    pub manager: LedgerManager,
    pub store: JsonStore,
    pub config_manager: ConfigManager,
    pub config: Config,
    pub theme: ColorfulTheme,
    pub running: bool,
}

impl ShellContext {
    pub fn new(mode: CliMode) -> Result<Self, CliError> {
        Self::from_config_manager(mode, ConfigManager::new()?)
    }

    pub fn with_base_dir(mode: CliMode, base: PathBuf) -> Result<Self, CliError> {
        Self::from_config_manager(mode, ConfigManager::with_base_dir(base)?)
    }

    fn from_config_manager(mode: CliMode, config_manager: ConfigManager) -> Result<Self, CliError> {
        let config = config_manager.load()?;
        output::set_preferences(OutputPreferences {
            high_contrast_mode: config.high_contrast,
            quiet_mode: config.quiet,
        });

        let data_dir = config_manager.data_dir(&config);
        let store = JsonStore::new(data_dir, Some(config.backup_retention))?;
        let manager = LedgerManager::new(Box::new(store.clone()));
        tracing::debug!(root = %store.root().display(), "shell context ready");

        Ok(Self {
            mode,
            registry: CommandRegistry::new(commands::all_definitions()),
            manager,
            store,
            config_manager,
            config,
            theme: ColorfulTheme::default(),
            running: true,
        })
    }

    pub(crate) fn prompt(&self) -> String {
        "starjar> ".to_string()
    }

    pub(crate) fn command_names(&self) -> Vec<&'static str> {
        self.registry.names().collect()
    }

    pub(crate) fn command(&self, name: &str) -> Option<&CommandDefinition> {
        self.registry.get(name)
    }

    pub(crate) fn dispatch(
        &mut self,
        command: &str,
        raw: &str,
        args: &[&str],
    ) -> Result<LoopControl, CommandError> {
        if let Some(definition) = self.registry.get(command) {
            let handler = definition.handler;
            match handler(self, args) {
                Ok(()) => Ok(LoopControl::Continue),
                Err(CommandError::ExitRequested) => Ok(LoopControl::Exit),
                Err(err) => Err(err),
            }
        } else {
            self.suggest_command(raw);
            Ok(LoopControl::Continue)
        }
    }

    pub(crate) fn process_line(&mut self, line: &str) -> Result<LoopControl, CommandError> {
        let tokens = match shell_words::split(line) {
            Ok(tokens) => tokens,
            Err(err) => {
                self.print_warning(&format!("Could not read that line: {}", err));
                return Ok(LoopControl::Continue);
            }
        };

        if tokens.is_empty() {
            return Ok(LoopControl::Continue);
        }

        let command = tokens[0].to_lowercase();
        let args: Vec<&str> = tokens.iter().skip(1).map(String::as_str).collect();
        self.dispatch(&command, &tokens[0], &args)
    }

    pub(crate) fn suggest_command(&self, input: &str) {
        output::warning(format!(
            "Unknown command `{}`. Type `help` to see available commands.",
            input
        ));

        let needle = input.to_lowercase();
        let mut suggestions: Vec<_> = self
            .registry
            .names()
            .map(|key| (levenshtein(key, &needle), key))
            .collect();
        suggestions.sort_by_key(|(distance, _)| *distance);

        if let Some((distance, best)) = suggestions.first() {
            if *distance <= 3 {
                output::info(format!("Suggestion: `{}`?", best));
            }
        }
    }

    pub(crate) fn confirm_exit(&self) -> Result<bool, CliError> {
        self.ask("Exit shell?", true).map_err(CliError::from)
    }

    /// Asks before a destructive action. Script mode always proceeds.
    pub(crate) fn confirm(&self, prompt: &str) -> Result<bool, CommandError> {
        self.ask(prompt, false)
    }

    fn ask(&self, prompt: &str, default: bool) -> Result<bool, CommandError> {
        if self.mode == CliMode::Script {
            return Ok(true);
        }
        Ok(Confirm::with_theme(&self.theme)
            .with_prompt(prompt)
            .default(default)
            .interact()?)
    }

    pub(crate) fn report_error(&self, err: CommandError) -> Result<(), CliError> {
        match err {
            CommandError::ExitRequested => Ok(()),
            CommandError::InvalidArguments(message) => {
                self.print_error(&message);
                output::hint("Use `help <command>` for usage details.");
                Ok(())
            }
            CommandError::Service(ServiceError::ImportRejected(message)) => {
                self.print_error(&format!("Import rejected: {}", message));
                output::hint("Nothing was changed.");
                Ok(())
            }
            other => {
                self.print_error(&other.to_string());
                Ok(())
            }
        }
    }

    pub(crate) fn print_error(&self, message: &str) {
        output::error(message);
    }

    pub(crate) fn print_warning(&self, message: &str) {
        output::warning(message);
    }

    /// Credits matured deposits and announces each payout. Run before reads.
    pub(crate) fn reconcile(&self) -> CommandResult {
        let settlements = self.manager.reconcile()?;
        if settlements.is_empty() {
            return Ok(());
        }
        let ledger = self.manager.snapshot()?;
        for settlement in settlements {
            if settlement.kind != SettlementKind::Matured {
                continue;
            }
            let name = ledger
                .child(settlement.child_id)
                .map(|child| child.name.as_str())
                .unwrap_or("unknown");
            output::success(format!(
                "Deposit {} matured: {} received {} points.",
                short_id(settlement.investment_id),
                name,
                settlement.credited
            ));
        }
        Ok(())
    }

    pub(crate) fn ledger(&self) -> Result<Ledger, CommandError> {
        Ok(self.manager.snapshot()?)
    }

    pub(crate) fn resolve_child(&self, ledger: &Ledger, query: &str) -> Result<Child, CommandError> {
        Ok(ChildService::find(ledger, query)?.clone())
    }

    pub(crate) fn resolve_entry(
        &self,
        ledger: &Ledger,
        query: &str,
    ) -> Result<ActivityLog, CommandError> {
        Ok(ActivityService::find(ledger, query)?.clone())
    }

    pub(crate) fn resolve_investment(
        &self,
        ledger: &Ledger,
        query: &str,
    ) -> Result<Investment, CommandError> {
        Ok(InvestmentService::find(ledger, query)?.clone())
    }
}

/// Positional arguments plus `--name value` options.
pub(crate) struct ParsedArgs<'a> {
    pub positional: Vec<&'a str>,
    pub options: HashMap<String, &'a str>,
}

impl<'a> ParsedArgs<'a> {
    pub fn parse(args: &[&'a str]) -> Result<Self, CommandError> {
        let mut positional = Vec::new();
        let mut options = HashMap::new();
        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            if let Some(name) = arg.strip_prefix("--") {
                let value = iter.next().ok_or_else(|| {
                    CommandError::InvalidArguments(format!("`--{}` needs a value", name))
                })?;
                options.insert(name.to_lowercase(), *value);
            } else {
                positional.push(*arg);
            }
        }
        Ok(Self {
            positional,
            options,
        })
    }

    pub fn option(&self, name: &str) -> Option<&'a str> {
        self.options.get(name).copied()
    }

    /// Positionals from `index` on, joined with spaces.
    pub fn rest(&self, index: usize) -> String {
        self.positional
            .get(index..)
            .map(|rest| rest.join(" "))
            .unwrap_or_default()
    }
}

pub(crate) fn require_arg<'a>(args: &[&'a str], index: usize, usage: &str) -> Result<&'a str, CommandError> {
    args.get(index)
        .copied()
        .ok_or_else(|| CommandError::InvalidArguments(format!("usage: {}", usage)))
}

/// Parses a point amount that has a magnitude, so `i64::MIN` is refused.
pub(crate) fn parse_points(input: &str) -> Result<i64, CommandError> {
    input
        .trim()
        .parse::<i64>()
        .ok()
        .filter(|points| points.checked_abs().is_some())
        .ok_or_else(|| CommandError::InvalidArguments(format!("invalid points value `{}`", input)))
}

pub(crate) fn parse_rate(input: &str) -> Result<f64, CommandError> {
    input
        .trim()
        .trim_end_matches('%')
        .parse::<f64>()
        .map_err(|_| CommandError::InvalidArguments(format!("invalid rate `{}`", input)))
}

pub(crate) fn short_id(id: Uuid) -> String {
    let mut short = id.simple().to_string();
    short.truncate(8);
    short
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("{0}")]
    InvalidArguments(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error(transparent)]
    Dialoguer(#[from] dialoguer::Error),
    #[error("exit requested")]
    ExitRequested,
}

impl From<LedgerError> for CommandError {
    fn from(err: LedgerError) -> Self {
        CommandError::Service(ServiceError::Ledger(err))
    }
}

/// User-facing CLI error wrapper.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error("Invalid input: {0}")]
    Input(String),
    #[error("Command failed: {0}")]
    Command(String),
}

impl From<CommandError> for CliError {
    fn from(err: CommandError) -> Self {
        CliError::Command(err.to_string())
    }
}

impl From<io::Error> for CliError {
    fn from(err: io::Error) -> Self {
        CliError::Command(err.to_string())
    }
}

impl From<rustyline::error::ReadlineError> for CliError {
    fn from(err: rustyline::error::ReadlineError) -> Self {
        CliError::Input(err.to_string())
    }
}

#[cfg(test)]
pub(crate) fn process_script(base: PathBuf, lines: &[&str]) -> Result<ShellContext, CliError> {
    let mut context = ShellContext::with_base_dir(CliMode::Script, base)?;
    for line in lines {
        match context.process_line(line) {
            Ok(LoopControl::Continue) => {}
            Ok(LoopControl::Exit) => break,
            Err(err) => context.report_error(err)?,
        }
    }
    Ok(context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::InvestmentStatus;
    use tempfile::tempdir;

    #[test]
    fn quoted_words_stay_together_and_unbalanced_lines_are_skipped() {
        let temp = tempdir().unwrap();
        let context = process_script(
            temp.path().to_path_buf(),
            &[
                "child add \"Mary Jane\"",
                "earn 'Mary Jane' 10 \"Washed the car\"",
                "earn 'Mary Jane' 5 \"Left open",
                "exit",
            ],
        )
        .unwrap();

        let ledger = context.manager.snapshot().unwrap();
        assert_eq!(ledger.children[0].name, "Mary Jane");
        assert_eq!(ledger.children[0].total_points, 10);
        assert_eq!(ledger.logs.len(), 1);
        assert_eq!(ledger.logs[0].description, "Washed the car");
    }

    #[test]
    fn parsed_args_split_options() {
        let args = ["Alice", "5", "Read", "a", "book", "--category", "behavior"];
        let parsed = ParsedArgs::parse(&args).unwrap();
        assert_eq!(parsed.positional.len(), 5);
        assert_eq!(parsed.rest(2), "Read a book");
        assert_eq!(parsed.option("category"), Some("behavior"));
        assert!(ParsedArgs::parse(&["--points"]).is_err());
    }

    #[test]
    fn parse_points_refuses_values_without_a_magnitude() {
        assert_eq!(parse_points(" 12 ").unwrap(), 12);
        assert_eq!(parse_points("-12").unwrap(), -12);
        assert!(parse_points("-9223372036854775808").is_err());
        assert!(parse_points("ten").is_err());
    }

    #[test]
    fn out_of_range_input_is_reported_not_applied() {
        let temp = tempdir().unwrap();
        let context = process_script(
            temp.path().to_path_buf(),
            &[
                "child add Alice",
                "earn Alice 9223372036854775807 \"Jackpot\"",
                "earn Alice 1 \"One more\"",
                "redeem Alice -9223372036854775808 \"Everything\"",
                "invest Alice mbank 10 4000000",
                "invest Alice mbank 10 5",
                "exit",
            ],
        )
        .unwrap();

        let ledger = context.manager.snapshot().unwrap();
        assert_eq!(ledger.children[0].total_points, i64::MAX);
        assert_eq!(ledger.logs.len(), 1);
        assert!(ledger.investments.is_empty());
        assert!(ledger.warnings().is_empty());
    }

    #[test]
    fn script_records_points_and_deposits() {
        let temp = tempdir().unwrap();
        let context = process_script(
            temp.path().to_path_buf(),
            &[
                "child add Alice",
                "earn Alice 50 \"Washed the car\"",
                "redeem Alice 80 \"Bike\"",
                "invest Alice mbank 20 3",
                "exit",
            ],
        )
        .unwrap();

        let ledger = context.manager.snapshot().unwrap();
        let alice = &ledger.children[0];
        assert_eq!(alice.total_points, 30);
        assert_eq!(ledger.logs.len(), 2);
        assert_eq!(ledger.investments[0].status, InvestmentStatus::Active);
        assert!(ledger.warnings().is_empty());
    }

    #[test]
    fn unknown_commands_do_not_stop_the_script() {
        let temp = tempdir().unwrap();
        let context = process_script(
            temp.path().to_path_buf(),
            &["chlid add Bob", "child add Bob", "exit"],
        )
        .unwrap();
        assert_eq!(context.manager.snapshot().unwrap().children.len(), 1);
        assert!(context.running);
    }
}
