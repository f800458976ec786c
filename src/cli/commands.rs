use clap::ArgMatches;
use log::info;
use std::sync::Arc;
use std::time::Instant;

use crate::config::ReportSchedule;
use crate::output::Reporter;
use crate::services::PollService;

/// Dispatch one-shot subcommands. Returns `true` when a subcommand ran and
/// the process should exit instead of entering the monitoring loop.
pub async fn handle_subcommands(
    matches: &ArgMatches,
    service: &mut PollService,
    schedule: &Arc<ReportSchedule>,
) -> Result<bool, Box<dyn std::error::Error>> {
    if matches.subcommand_matches("read").is_some() {
        info!("🔍 Executing one-shot read...");

        service.poll_once(Instant::now()).await;

        match service.latest_snapshot() {
            Some(snapshot) => println!("{}", Reporter::success_payload(snapshot)),
            None => {
                let code = service.last_error_code().unwrap_or_default();
                println!("{}", Reporter::failure_payload(code));
            }
        }

        return Ok(true);
    }

    if let Some(matches) = matches.subcommand_matches("set-frequency") {
        let target = matches.get_one::<String>("target").unwrap();
        let value = matches.get_one::<String>("value").map(|s| s.as_str());

        let effective = match target.as_str() {
            "success" => schedule.set_success_report_frequency(value),
            "failure" => schedule.set_failure_report_frequency(value),
            other => {
                return Err(format!("Unknown frequency target: {}", other).into());
            }
        };

        println!("{} report frequency: {} seconds", target, effective);
        return Ok(true);
    }

    Ok(false)
}
