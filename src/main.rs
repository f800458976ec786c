use anyhow::{Context, Result};
use clap::{Arg, Command};
use log::info;
use std::sync::Arc;
use tokio::sync::broadcast;

use powermeter_poller::config::{Config, RemoteConfigHandler, ReportSchedule};
use powermeter_poller::output::{ConsoleSink, EventSink, FileSink};
use powermeter_poller::services::PollService;
use powermeter_poller::{cli, VERSION};

fn build_cli() -> Command {
    Command::new("powermeter_poller")
        .version(VERSION)
        .about("Modbus RTU power-meter telemetry poller")
        .arg(
            Arg::new("port")
                .long("port")
                .short('p')
                .help("Serial port for the RS-485 link"),
        )
        .arg(
            Arg::new("baud")
                .long("baud")
                .short('b')
                .help("Baud rate (default 9600)"),
        )
        .arg(
            Arg::new("interval")
                .long("interval")
                .short('i')
                .help("Poll interval in seconds (default 1)"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("output-file")
                .long("output-file")
                .help("Publish reports to this file instead of stdout"),
        )
        .subcommand(Command::new("read").about("Poll the meter once and print the snapshot"))
        .subcommand(
            Command::new("set-frequency")
                .about("Adjust a report cadence")
                .arg(
                    Arg::new("target")
                        .long("target")
                        .required(true)
                        .help("Which cadence to set: success or failure"),
                )
                .arg(
                    Arg::new("value")
                        .long("value")
                        .help("New cadence in seconds; omit to read the current value"),
                ),
        )
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let matches = build_cli().get_matches();
    let config = Config::from_matches(&matches).context("Failed to load configuration")?;

    let sink: Arc<dyn EventSink> = match &config.file_output {
        Some(file_output) if file_output.enabled => {
            info!("📤 Publishing reports to file: {}", file_output.path);
            Arc::new(FileSink::new(&file_output.path))
        }
        _ => Arc::new(ConsoleSink),
    };

    let schedule = Arc::new(ReportSchedule::with_frequencies(
        config.success_report_frequency,
        config.failure_report_frequency,
    ));

    let mut service = PollService::new(config.clone(), schedule.clone(), sink.clone())
        .context("Failed to initialize poll service")?;

    if cli::handle_subcommands(&matches, &mut service, &schedule)
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?
    {
        return Ok(());
    }

    // Command channel for the external configuration collaborator. The
    // sender half stays alive for the lifetime of the loop.
    let (_command_tx, command_rx) = broadcast::channel::<String>(16);
    let remote = RemoteConfigHandler::new(
        schedule.clone(),
        sink,
        format!("{}/config", config.report_channel),
    );
    remote.start(command_rx);

    service.run().await.context("Poll loop failed")?;
    Ok(())
}
