use std::path::PathBuf;

use clap::ArgMatches;
use serde::Serialize;
use tracing::{error, info, warn};

use gopeed_shell_core::activation::{
    ActivationCoordinator, ActivationError, ActivationPayload, Bootstrap, IpcChannel,
    LaunchOutcome, Resolution,
};
use gopeed_shell_core::config::ShellConfig;
use gopeed_shell_core::engine::ProcessEngine;
use gopeed_shell_core::events;
use gopeed_shell_core::instance::{Endpoint, IpcLocator, LockClaimer};
use gopeed_shell_core::ipc::{InstanceClient, InstanceStatus, IpcError, WindowStatus};
use gopeed_shell_core::platform::NativePlatform;
use gopeed_shell_core::window::HeadlessHost;

pub const EXIT_OK: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
pub const EXIT_NOT_RUNNING: i32 = 3;

#[derive(Serialize)]
struct StatusResponse {
    running: bool,
    endpoint: String,
    #[serde(flatten)]
    instance: Option<InstanceStatus>,
    window: Option<WindowStatus>,
}

/// Run the requested command and return the process exit code.
pub fn run_command(matches: &ArgMatches) -> Result<i32, Box<dyn std::error::Error>> {
    let command = if matches.get_flag("status") {
        "status"
    } else if matches.get_flag("quit") {
        "quit"
    } else {
        "launch"
    };
    events::log_command_started(command);

    let result = load_config(matches).and_then(|config| match command {
        "status" => handle_status_command(&config),
        "quit" => handle_quit_command(&config),
        _ => handle_launch_command(matches, &config),
    });

    match &result {
        Ok(code) => events::log_command_completed(command, *code),
        Err(e) => events::log_command_failed(command, e.as_ref()),
    }

    result
}

fn load_config(matches: &ArgMatches) -> Result<ShellConfig, Box<dyn std::error::Error>> {
    let explicit = matches.get_one::<PathBuf>("config");

    ShellConfig::load_hierarchy(explicit.map(PathBuf::as_path)).map_err(|e| {
        error!(event = "cli.config.load_failed", error = %e);
        e.into()
    })
}

fn endpoint(config: &ShellConfig) -> Endpoint {
    Endpoint::new(&config.identity(), &config.runtime_dir())
}

fn handle_launch_command(
    matches: &ArgMatches,
    config: &ShellConfig,
) -> Result<i32, Box<dyn std::error::Error>> {
    let payload = ActivationPayload::from_args(
        matches
            .get_many::<String>("args")
            .into_iter()
            .flatten()
            .cloned(),
    );

    let runtime_dir = config.runtime_dir();
    let timeout = config.request_timeout();

    let coordinator = ActivationCoordinator::new(
        config.identity(),
        IpcLocator::new(&runtime_dir, timeout),
        IpcChannel::new(timeout),
        LockClaimer::new(&runtime_dir),
    )
    .with_delivery_retries(config.ipc.delivery_retries)
    .with_claim_wait(config.claim_wait());

    let outcome = match coordinator.resolve(payload)? {
        Resolution::Forwarded(report) => {
            info!(
                event = "cli.launch.forwarded",
                pid = ?report.pid,
                links = report.links_delivered,
                foreground = report.foreground,
            );
            LaunchOutcome::Forwarded
        }
        Resolution::Primary { claim, payload } => {
            let engine = ProcessEngine::from_config(&config.engine).map_err(ActivationError::from)?;
            let host = HeadlessHost::new(true);
            let window = config.window_spec();

            let bootstrap = Bootstrap {
                engine: &engine,
                host: &host,
                platform: &NativePlatform,
                engine_config: &config.engine.start_config,
                window: &window,
            };
            bootstrap.run(claim, payload)?;

            LaunchOutcome::PrimaryExited
        }
        Resolution::Unresponsive { target, error } => {
            warn!(
                event = "cli.launch.unresponsive",
                pid = ?target.as_ref().and_then(|t| t.pid),
                error = %error,
            );
            eprintln!("Gopeed is running but could not be activated: {}", error);
            LaunchOutcome::InstanceUnresponsive
        }
    };

    Ok(outcome.exit_code())
}

fn handle_status_command(config: &ShellConfig) -> Result<i32, Box<dyn std::error::Error>> {
    let endpoint = endpoint(config);

    let (code, response) = match InstanceClient::connect(&endpoint, config.request_timeout()) {
        Ok(mut client) => {
            let instance = client.ping()?;
            let window = client.window_state()?;
            (
                EXIT_OK,
                StatusResponse {
                    running: true,
                    endpoint: endpoint.to_string(),
                    instance: Some(instance),
                    window: Some(window),
                },
            )
        }
        Err(IpcError::NotRunning) => (
            EXIT_NOT_RUNNING,
            StatusResponse {
                running: false,
                endpoint: endpoint.to_string(),
                instance: None,
                window: None,
            },
        ),
        Err(e) => return Err(e.into()),
    };

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(code)
}

fn handle_quit_command(config: &ShellConfig) -> Result<i32, Box<dyn std::error::Error>> {
    let endpoint = endpoint(config);

    let mut client = match InstanceClient::connect(&endpoint, config.request_timeout()) {
        Ok(client) => client,
        Err(IpcError::NotRunning) => {
            eprintln!("Gopeed is not running.");
            return Ok(EXIT_NOT_RUNNING);
        }
        Err(e) => return Err(e.into()),
    };

    let status = client.ping()?;
    client.quit()?;

    info!(event = "cli.quit_requested", pid = status.pid);
    println!("Asked Gopeed (pid {}) to quit.", status.pid);
    Ok(EXIT_OK)
}
