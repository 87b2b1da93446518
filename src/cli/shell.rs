use std::io::{self, Lines, StdinLock};

use rustyline::{
    completion::{Completer, Pair},
    error::ReadlineError,
    highlight::Highlighter,
    hint::Hinter,
    history::DefaultHistory,
    validate::Validator,
    Cmd, Context as ReadlineContext, Editor, Helper, KeyEvent,
};

use crate::cli::core::{CliError, CliMode, LoopControl, ShellContext};
use crate::cli::output;

const SCRIPT_ENV: &str = "STARJAR_CLI_SCRIPT";

/// Commands whose first argument names a child.
const CHILD_ARGUMENT: &[&str] = &["earn", "redeem", "history", "suggest", "investments", "invest"];
const CHILD_ACTIONS: &[&str] = &["add", "list", "rename", "avatar", "remove", "move"];

pub fn run_cli() -> Result<(), CliError> {
    let mode = if std::env::var_os(SCRIPT_ENV).is_some() {
        CliMode::Script
    } else {
        CliMode::Interactive
    };

    let mut context = ShellContext::new(mode)?;
    tracing::info!(?mode, "starting shell");

    let mut input = match mode {
        CliMode::Interactive => {
            let mut editor = Editor::<ShellHelper, DefaultHistory>::new()?;
            editor.set_helper(Some(ShellHelper::from_context(&context)));
            editor.bind_sequence(KeyEvent::from('?'), Cmd::Complete);
            Input::Editor(Box::new(editor))
        }
        CliMode::Script => Input::Script(io::stdin().lines()),
    };

    while context.running {
        let Some(line) = input.next_line(&context)? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match context.process_line(line) {
            Ok(LoopControl::Continue) => {}
            Ok(LoopControl::Exit) => context.running = false,
            Err(err) => context.report_error(err)?,
        }
        input.remember(line, &context);
    }
    Ok(())
}

enum Input {
    Editor(Box<Editor<ShellHelper, DefaultHistory>>),
    Script(Lines<StdinLock<'static>>),
}

impl Input {
    /// `None` ends the session.
    fn next_line(&mut self, context: &ShellContext) -> Result<Option<String>, CliError> {
        match self {
            Input::Script(lines) => Ok(lines.next().transpose()?),
            Input::Editor(editor) => match editor.readline(&context.prompt()) {
                Ok(line) => Ok(Some(line)),
                Err(ReadlineError::Interrupted) if context.confirm_exit()? => Ok(None),
                Err(ReadlineError::Interrupted) => Ok(Some(String::new())),
                Err(ReadlineError::Eof) => {
                    output::info("Exiting shell.");
                    Ok(None)
                }
                Err(err) => Err(err.into()),
            },
        }
    }

    /// Records the line and picks up children or banks it may have changed.
    fn remember(&mut self, line: &str, context: &ShellContext) {
        let Input::Editor(editor) = self else {
            return;
        };
        editor.add_history_entry(line).ok();
        if let Some(helper) = editor.helper_mut() {
            *helper = ShellHelper::from_context(context);
        }
    }
}

/// Tab completion over command names, child names and bank ids.
#[derive(Debug)]
struct ShellHelper {
    commands: Vec<String>,
    children: Vec<String>,
    banks: Vec<String>,
}

impl ShellHelper {
    fn from_context(context: &ShellContext) -> Self {
        let mut commands: Vec<String> = context
            .command_names()
            .into_iter()
            .map(str::to_ascii_lowercase)
            .collect();
        commands.sort();
        commands.dedup();
        let children = match context.manager.snapshot() {
            Ok(ledger) => ledger.children.into_iter().map(|child| child.name).collect(),
            Err(err) => {
                tracing::debug!(%err, "completion without child names");
                Vec::new()
            }
        };
        let banks = context
            .manager
            .banks()
            .map(|banks| banks.into_iter().map(|bank| bank.id).collect())
            .unwrap_or_default();
        Self {
            commands,
            children,
            banks,
        }
    }

    /// Words that fit after `previous`, the complete words already typed.
    fn vocabulary(&self, previous: &[&str]) -> Vec<&str> {
        fn owned(words: &[String]) -> Vec<&str> {
            words.iter().map(String::as_str).collect()
        }
        match previous {
            [] => owned(&self.commands),
            [command] if CHILD_ARGUMENT.contains(command) => owned(&self.children),
            ["child"] => CHILD_ACTIONS.to_vec(),
            ["child", "rename" | "avatar" | "remove" | "rm" | "move"] => owned(&self.children),
            ["invest", _] | ["bank-rate"] => owned(&self.banks),
            _ => Vec::new(),
        }
    }
}

impl Completer for ShellHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &ReadlineContext<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let prefix = &line[..pos];
        let start = prefix
            .rfind(char::is_whitespace)
            .map(|idx| idx + 1)
            .unwrap_or(0);
        let previous: Vec<String> = shell_words::split(&prefix[..start])
            .unwrap_or_default()
            .into_iter()
            .map(|word| word.to_ascii_lowercase())
            .collect();
        let previous: Vec<&str> = previous.iter().map(String::as_str).collect();
        let needle = prefix[start..]
            .trim_start_matches(&['"', '\''][..])
            .to_lowercase();

        let candidates = self
            .vocabulary(&previous)
            .into_iter()
            .filter(|word| word.to_lowercase().starts_with(&needle))
            .map(|word| Pair {
                display: word.to_string(),
                replacement: shell_words::quote(word).into_owned(),
            })
            .collect();
        Ok((start, candidates))
    }
}

impl Hinter for ShellHelper {
    type Hint = String;
}

impl Highlighter for ShellHelper {}

impl Validator for ShellHelper {}

impl Helper for ShellHelper {}

#[cfg(test)]
mod tests {
    use super::*;

    fn helper() -> ShellHelper {
        ShellHelper {
            commands: ["earn", "child", "invest", "verify", "version"]
                .map(String::from)
                .to_vec(),
            children: ["Alice", "Mary Jane", "Ben"].map(String::from).to_vec(),
            banks: ["mbank", "cbank", "ubank"].map(String::from).to_vec(),
        }
    }

    fn complete(line: &str) -> (usize, Vec<String>) {
        let history = DefaultHistory::new();
        let ctx = ReadlineContext::new(&history);
        let (start, candidates) = helper().complete(line, line.len(), &ctx).unwrap();
        (start, candidates.into_iter().map(|c| c.replacement).collect())
    }

    #[test]
    fn first_word_completes_commands() {
        assert_eq!(complete("ve"), (0, vec!["verify".into(), "version".into()]));
    }

    #[test]
    fn child_names_follow_point_commands() {
        assert_eq!(complete("earn a"), (5, vec!["Alice".to_string()]));
        assert_eq!(complete("earn Ma").1, ["'Mary Jane'"]);
        assert_eq!(complete("child rename b").1, ["Ben"]);
        assert!(complete("earn Alice 5").1.is_empty());
    }

    #[test]
    fn child_actions_and_bank_ids_complete_in_place() {
        assert_eq!(complete("child re").1, ["rename", "remove"]);
        assert_eq!(complete("invest Alice u").1, ["ubank"]);
        assert_eq!(complete("invest Alice ").1.len(), 3);
        assert!(complete("invest Alice mbank 1").1.is_empty());
    }
}
