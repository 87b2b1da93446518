use crate::cli::core::{parse_points, require_arg, short_id, CommandError, CommandResult, ShellContext};
use crate::cli::output;
use crate::core::services::{InvestmentService, NewInvestment, SettlementKind};
use crate::ledger::{projected_interest, Investment, TERM_CHOICES};

use super::CommandDefinition;

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new(
            "invest",
            "Lock points in a fixed deposit",
            "invest <child> <bank> <amount> <months>",
            cmd_invest,
        ),
        CommandDefinition::new(
            "withdraw",
            "Withdraw a deposit early (interest is forfeited)",
            "withdraw <deposit>",
            cmd_withdraw,
        ),
        CommandDefinition::new(
            "investments",
            "List deposits, optionally for one child",
            "investments [child]",
            cmd_investments,
        ),
        CommandDefinition::new(
            "mature",
            "Credit every deposit that has reached maturity",
            "mature",
            cmd_mature,
        ),
    ]
}

fn cmd_invest(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let usage = "invest <child> <bank> <amount> <months>";
    let query = require_arg(args, 0, usage)?;
    let bank_query = require_arg(args, 1, usage)?;
    let amount = parse_points(require_arg(args, 2, usage)?)?;
    let months: u32 = require_arg(args, 3, usage)?
        .parse()
        .ok()
        .filter(|months| TERM_CHOICES.contains(months))
        .ok_or_else(|| {
            CommandError::InvalidArguments(format!("months must be one of {:?}", TERM_CHOICES))
        })?;

    context.reconcile()?;
    let child = context.resolve_child(&context.ledger()?, query)?;
    let bank = context
        .manager
        .banks()?
        .into_iter()
        .find(|bank| {
            bank.id.eq_ignore_ascii_case(bank_query) || bank.name.eq_ignore_ascii_case(bank_query)
        })
        .ok_or_else(|| CommandError::InvalidArguments(format!("unknown bank `{}`", bank_query)))?;

    let id = context.manager.create_investment(&NewInvestment {
        child_id: child.id,
        bank_id: bank.id.clone(),
        amount,
        months,
    })?;
    output::success(format!(
        "{} deposited {} points at {} for {} months ({:.2}%). Expected interest: {} ({}).",
        child.name,
        amount,
        bank.name,
        months,
        bank.rate,
        projected_interest(amount, bank.rate, months),
        short_id(id)
    ));
    Ok(())
}

fn cmd_withdraw(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let query = require_arg(args, 0, "withdraw <deposit>")?;
    let investment = context.resolve_investment(&context.ledger()?, query)?;
    if investment.is_active() && !investment.is_mature_at(context.manager.now()) {
        let prompt = format!(
            "Withdraw early and give up {} points of interest?",
            investment.projected_return
        );
        if !context.confirm(&prompt)? {
            output::info("Deposit kept.");
            return Ok(());
        }
    }
    let settlement = context.manager.withdraw_investment(investment.id)?;
    match settlement.kind {
        SettlementKind::Withdrawn => output::success(format!(
            "Withdrew {} points from deposit {}.",
            settlement.credited,
            short_id(settlement.investment_id)
        )),
        SettlementKind::Matured => output::success(format!(
            "Deposit {} had already matured and paid {} points.",
            short_id(settlement.investment_id),
            settlement.credited
        )),
    }
    Ok(())
}

fn cmd_investments(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    context.reconcile()?;
    let ledger = context.ledger()?;
    let now = context.manager.now();
    let children = match args.first() {
        Some(query) => vec![context.resolve_child(&ledger, query)?],
        None => ledger.children.clone(),
    };

    let mut rows = Vec::new();
    for child in &children {
        for investment in InvestmentService::list(&ledger, child.id) {
            rows.push(row(&child.name, investment, now));
        }
    }
    if rows.is_empty() {
        output::info("No deposits yet.");
        return Ok(());
    }
    output::section("Deposits");
    output::table(
        &[
            "ID", "Child", "Bank", "Principal", "Rate", "Interest", "Matures", "Status",
        ],
        &rows,
    );
    Ok(())
}

fn row(child: &str, investment: &Investment, now: chrono::DateTime<chrono::Utc>) -> Vec<String> {
    let status = if investment.is_active() {
        format!(
            "{:.0}% ({} days left)",
            investment.progress_at(now) * 100.0,
            investment.days_remaining(now)
        )
    } else {
        investment.status.as_str().replace('_', " ")
    };
    vec![
        short_id(investment.id),
        child.to_string(),
        investment.bank_id.clone(),
        investment.principal.to_string(),
        format!("{:.2}%", investment.rate),
        investment.projected_return.to_string(),
        investment.maturity_date.format("%Y-%m-%d").to_string(),
        status,
    ]
}

fn cmd_mature(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let settlements = context.manager.check_matured_investments()?;
    if settlements.is_empty() {
        output::info("No deposits are due.");
        return Ok(());
    }
    let total: i64 = settlements.iter().map(|s| s.credited).sum();
    output::success(format!(
        "Credited {} matured deposit(s), {} points in total.",
        settlements.len(),
        total
    ));
    Ok(())
}
