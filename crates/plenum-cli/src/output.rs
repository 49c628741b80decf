//! Output formatting utilities.
//!
//! Pretty printing for scenario replays.

use colored::Colorize;
use plenum_governance::{ActionExecutor, GovernanceEvent, Governor, Votes};
use tabled::{Table, Tabled};

use crate::scenario::{Outcome, StepReport};

/// Print success message.
pub fn print_success(msg: &str) {
    println!("{}", format!("✓ {}", msg).green());
}

/// Print error message.
pub fn print_error(msg: &str) {
    eprintln!("{}", format!("✗ {}", msg).red());
}

/// Print warning message.
pub fn print_warning(msg: &str) {
    println!("{}", format!("⚠ {}", msg).yellow());
}

/// Print info message.
pub fn print_info(msg: &str) {
    println!("{}", format!("ℹ {}", msg).blue());
}

/// Format a base-unit amount with `decimals` fractional digits.
pub fn format_amount(value: u128, decimals: u8) -> String {
    let scale = 10u128.checked_pow(decimals as u32).unwrap_or(u128::MAX);
    let whole = value / scale;
    let frac = value % scale;
    if frac == 0 || decimals == 0 {
        return whole.to_string();
    }
    let frac = format!("{:0width$}", frac, width = decimals as usize);
    format!("{}.{}", whole, frac.trim_end_matches('0'))
}

/// One-line summary of an event.
pub fn describe_event(event: &GovernanceEvent) -> String {
    match event {
        GovernanceEvent::Transfer { from, to, value } => {
            format!("Transfer {} -> {} ({})", from, to, value)
        }
        GovernanceEvent::DelegateChanged {
            delegator,
            from_delegate,
            to_delegate,
        } => format!("DelegateChanged {}: {} -> {}", delegator, from_delegate, to_delegate),
        GovernanceEvent::DelegateVotesChanged {
            delegate,
            previous_votes,
            new_votes,
        } => format!("DelegateVotesChanged {}: {} -> {}", delegate, previous_votes, new_votes),
        GovernanceEvent::ProposalCreated {
            proposal_id,
            vote_start,
            vote_end,
            ..
        } => format!(
            "ProposalCreated {} (voting {}..={})",
            proposal_id.short(),
            vote_start.saturating_add(1),
            vote_end
        ),
        GovernanceEvent::VoteCast {
            voter,
            proposal_id,
            support,
            weight,
            ..
        } => format!("VoteCast {} on {}: {} x{}", voter, proposal_id.short(), support, weight),
        GovernanceEvent::ProposalExecuted { proposal_id } => {
            format!("ProposalExecuted {}", proposal_id.short())
        }
    }
}

/// Print one step's outcome and its events.
pub fn print_step(report: &StepReport, events_json: bool) -> anyhow::Result<()> {
    let header = format!("[{:>3}] @{:<6} {:<12}", report.index, report.height, report.action);
    match &report.outcome {
        Outcome::Ok(msg) => println!("{} {}", header.bold(), msg.green()),
        Outcome::ExpectedError(msg) => {
            println!("{} {}", header.bold(), format!("rejected as expected: {}", msg).yellow())
        }
        Outcome::Unexpected(msg) => println!("{} {}", header.bold(), msg.red()),
    }

    for event in &report.events {
        if events_json {
            println!("{}", serde_json::to_string(event)?);
        } else {
            println!("      {}", describe_event(event).dimmed());
        }
    }
    Ok(())
}

/// Print the proposal summary table.
pub fn print_proposal_table<V: Votes, X: ActionExecutor>(governor: &Governor<V, X>) {
    #[derive(Tabled)]
    struct ProposalRow {
        id: String,
        description: String,
        state: String,
        #[tabled(rename = "for")]
        for_votes: String,
        against: String,
        abstain: String,
        voters: usize,
        deadline: u64,
    }

    let rows: Vec<ProposalRow> = governor
        .proposals()
        .map(|p| ProposalRow {
            id: p.id.short(),
            description: p.description.clone(),
            state: governor
                .state(p.id)
                .map(|s| s.to_string())
                .unwrap_or_else(|e| e.kind().to_string()),
            for_votes: p.tally.for_votes.to_string(),
            against: p.tally.against_votes.to_string(),
            abstain: p.tally.abstain_votes.to_string(),
            voters: p.voter_count(),
            deadline: p.vote_end,
        })
        .collect();

    if rows.is_empty() {
        print_info("No proposals");
        return;
    }
    println!("{}", Table::new(rows));
}
