use crate::infra::{invalid_data, parse_policy, read_application};
use chrono::Utc;
use clap::Args;
use collector_desk::config::AppConfig;
use collector_desk::error::AppError;
use collector_desk::remote::LendingApiClient;
use collector_desk::workflows::calculation::{
    CalculationPreview, CalculationState, DebouncedCalculator, FormOverrides,
};
use collector_desk::workflows::custody::{
    ActionGate, ActiveDashboard, CustodyMonitor, DaySnapshot, Destination, HandoverPlan,
    NavigationDecision, StatusFailurePolicy,
};
use collector_desk::workflows::desk::{
    calculation_request, CalculationRequestInput, CalculationRequestView, CollectorDeskService,
    DayStateView,
};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

const GATED_DESTINATIONS: [Destination; 5] = [
    Destination::Applications,
    Destination::Disbursements,
    Destination::Waivers,
    Destination::Visits,
    Destination::Route,
];

#[derive(Args, Debug)]
pub(crate) struct DayStateArgs {
    /// Collector whose day to inspect
    #[arg(long)]
    pub(crate) collector_id: String,
    /// Override the configured failure policy (fail_open or fail_closed)
    #[arg(long, value_parser = parse_policy)]
    pub(crate) policy: Option<StatusFailurePolicy>,
    /// Print the raw view as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct WatchArgs {
    /// Collector whose day to follow
    #[arg(long)]
    pub(crate) collector_id: String,
    /// Number of refreshes to print before leaving the dashboard
    #[arg(long, default_value_t = 3)]
    pub(crate) ticks: u32,
    /// Override the configured polling interval, in seconds
    #[arg(long)]
    pub(crate) interval_secs: Option<u64>,
}

#[derive(Args, Debug)]
pub(crate) struct BuildRequestArgs {
    /// JSON export of a loan application (bare or wrapped in `data`)
    #[arg(long)]
    pub(crate) file: PathBuf,
    /// Approved amount to use instead of the requested one
    #[arg(long)]
    pub(crate) amount: Option<f64>,
    /// Approved term in days
    #[arg(long)]
    pub(crate) term_days: Option<u32>,
    /// Approved interest rate (percent)
    #[arg(long)]
    pub(crate) rate: Option<f64>,
    /// Send the request to the calculator and print the preview
    #[arg(long)]
    pub(crate) send: bool,
    /// Print JSON instead of the text summary
    #[arg(long)]
    pub(crate) json: bool,
}

impl BuildRequestArgs {
    pub(crate) fn overrides(&self) -> FormOverrides {
        FormOverrides {
            approved_amount: self.amount,
            approved_term_days: self.term_days,
            approved_interest_rate: self.rate,
            notes: None,
        }
    }
}

#[derive(Args, Debug)]
pub(crate) struct HandoverArgs {
    /// Collector handing over cash
    #[arg(long)]
    pub(crate) collector_id: String,
    /// Cash actually being handed over
    #[arg(long)]
    pub(crate) amount: f64,
    /// Confirm a handover that differs from the expected amount
    #[arg(long)]
    pub(crate) acknowledge_variance: bool,
}

pub(crate) async fn run_day_state(args: DayStateArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let policy = args.policy.unwrap_or(config.desk.failure_policy);
    let client = LendingApiClient::new(&config.desk)?;
    let service = CollectorDeskService::new(Arc::new(client), policy);

    let view = service.day_state(&args.collector_id).await?;
    if args.json {
        print_json(&view)?;
    } else {
        render_day_state(&view, policy);
    }
    Ok(())
}

pub(crate) async fn run_watch(args: WatchArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let interval = args
        .interval_secs
        .map(Duration::from_secs)
        .unwrap_or(config.desk.poll_interval);
    let client = LendingApiClient::new(&config.desk)?;
    let monitor = Arc::new(CustodyMonitor::new(
        Arc::new(client),
        args.collector_id.as_str(),
        config.desk.failure_policy,
    ));

    let mut updates = monitor.subscribe();
    let dashboard = ActiveDashboard::enter(Arc::clone(&monitor), interval);
    println!(
        "Watching collector {} every {}s",
        args.collector_id,
        interval.as_secs()
    );

    for _ in 0..args.ticks {
        if updates.changed().await.is_err() {
            break;
        }
        let latest = updates.borrow_and_update().clone();
        if let Some(snapshot) = latest {
            render_tick(&snapshot, monitor.policy());
        }
    }

    dashboard.leave();
    Ok(())
}

pub(crate) async fn run_build_request(args: BuildRequestArgs) -> Result<(), AppError> {
    let application = read_application(&args.file)?;
    let input = CalculationRequestInput {
        application,
        overrides: args.overrides(),
    };
    let view = calculation_request(input, Utc::now())?;

    if args.json {
        print_json(&view)?;
    } else {
        render_request(&view);
    }

    if !args.send {
        return Ok(());
    }
    if !view.valid {
        println!("\nForm is incomplete; nothing sent to the calculator.");
        return Ok(());
    }

    let config = AppConfig::load()?;
    let client = LendingApiClient::new(&config.desk)?;
    let calculator = DebouncedCalculator::new(Arc::new(client), config.desk.debounce_window);
    match calculator.request(view.request.clone(), true).await {
        Some(preview) if args.json => print_json(&preview)?,
        Some(preview) => render_preview(&preview),
        None => {
            if let CalculationState::Unavailable { message } = calculator.state() {
                println!("\nPreview unavailable: {message}");
            }
        }
    }
    Ok(())
}

pub(crate) async fn run_handover(args: HandoverArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let client = LendingApiClient::new(&config.desk)?;
    let monitor = CustodyMonitor::new(
        Arc::new(client.clone()),
        args.collector_id.as_str(),
        config.desk.failure_policy,
    );

    let snapshot = monitor.refresh().await;
    let gate = ActionGate::evaluate(&snapshot, monitor.policy());
    let Some(balance) = snapshot.balance.as_ref().filter(|_| gate.can_handover()) else {
        println!("No cash balance recorded for today; handover is unavailable.");
        return Ok(());
    };

    let plan = HandoverPlan::from_balance(balance);
    let submission = plan.prepare(args.amount)?;
    println!(
        "Expected {:.2} | handing over {:.2} | variance {:+.2} ({:?})",
        plan.expected_handover(),
        submission.actual_handover,
        submission.variance,
        plan.variance_kind(args.amount)
    );
    if submission.requires_acknowledgement && !args.acknowledge_variance {
        println!("Variance must be acknowledged; rerun with --acknowledge-variance.");
        return Ok(());
    }

    match client.initiate_handover(&submission).await? {
        Some(record) => println!(
            "Handover {} submitted; awaiting cashier confirmation.",
            record.id.as_deref().unwrap_or("(unnumbered)")
        ),
        None => println!("Handover submitted; awaiting cashier confirmation."),
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    let rendered = serde_json::to_string_pretty(value).map_err(invalid_data)?;
    println!("{rendered}");
    Ok(())
}

fn render_day_state(view: &DayStateView, policy: StatusFailurePolicy) {
    let snapshot = &view.snapshot;
    println!(
        "Collector {} day state: {}",
        snapshot.collector_id,
        snapshot.day_state.as_str()
    );

    match (&snapshot.balance, &view.balance_health) {
        (Some(balance), Some(health)) => {
            println!(
                "- Opening {:.2} | collected {:.2} | disbursed {:.2} | on hand {:.2}",
                balance.opening_float,
                balance.total_collections,
                balance.total_disbursements,
                balance.current_balance
            );
            println!(
                "- Float health {:.0}% ({:?})",
                health.percentage, health.band
            );
        }
        _ => println!("- No balance row for today"),
    }
    if let Some(expected) = view.expected_handover {
        println!("- Expected handover {expected:.2}");
    }

    let summary = &view.gate;
    println!(
        "- Handover button: {} ({})",
        summary.handover_label,
        if summary.can_handover { "enabled" } else { "disabled" }
    );
    println!("- Pending floats: {}", snapshot.float.pending_count);
    for offer in &snapshot.pending_floats {
        println!("  - {:.2} from {}", offer.amount, offer.cashier_name());
    }
    match &summary.lock_reason {
        Some(reason) => println!("- Actions locked: {reason}"),
        None => println!("- Actions unlocked"),
    }
    if !snapshot.unconfirmed.is_empty() {
        println!("- Unconfirmed signals: {:?}", snapshot.unconfirmed);
    }

    let gate = ActionGate::evaluate(snapshot, policy);
    println!("Navigation:");
    for destination in GATED_DESTINATIONS {
        let outcome = match gate.navigate(destination) {
            NavigationDecision::Allow => "allowed".to_string(),
            NavigationDecision::Redirect { to, reason } => format!("redirect to {to} ({reason})"),
            NavigationDecision::Deny { reason } => format!("denied ({reason})"),
        };
        println!("  - {}: {outcome}", destination.path());
    }
}

fn render_tick(snapshot: &DaySnapshot, policy: StatusFailurePolicy) {
    let gate = ActionGate::evaluate(snapshot, policy);
    println!(
        "[{}] {} | locked: {} | disbursement locked: {} | {}",
        snapshot.refreshed_at.format("%H:%M:%S"),
        snapshot.day_state.as_str(),
        gate.actions_locked(),
        gate.disbursement_locked(),
        gate.handover_label()
    );
}

fn render_request(view: &CalculationRequestView) {
    let request = &view.request;
    println!(
        "Calculator request ({})",
        if view.valid { "ready" } else { "incomplete" }
    );
    println!(
        "- Amount {:.2} over {} days ({} month(s)), {} payments",
        request.loan_amount, view.term_days, request.term_months, request.payment_frequency
    );
    println!(
        "- Interest {}% {:?} | processing fee {}% | platform fee {:.2}",
        request.interest_rate,
        request.interest_type,
        request.processing_fee_percentage,
        request.platform_fee
    );
    println!(
        "- Deduct in advance: interest {} | processing {} | platform {}",
        request.deduct_interest_in_advance,
        request.deduct_processing_fee_in_advance,
        request.deduct_platform_fee_in_advance
    );
    if !view.unmapped_keys.is_empty() {
        println!("- Unmapped keys: {}", view.unmapped_keys.join(", "));
    }
}

fn render_preview(preview: &CalculationPreview) {
    let calculation = &preview.calculation;
    println!("\nPreview");
    println!(
        "- Interest {:.2} | processing fee {:.2} | platform fee {:.2}",
        calculation.interest_amount, calculation.processing_fee_amount, calculation.platform_fee
    );
    println!(
        "- Net proceeds {:.2} | total repayable {:.2} | {} x {:.2}",
        calculation.net_proceeds,
        calculation.total_repayable,
        calculation.num_payments,
        calculation.installment_amount
    );
    for item in &preview.schedule {
        println!(
            "  - #{} {} {:.2}",
            item.payment_number,
            item.due_date.as_deref().unwrap_or("-"),
            item.installment_amount
        );
    }
}
