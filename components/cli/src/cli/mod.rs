use balance_scanner::Service;
use clap::Parser;
use commands::{ConfigCommand, Protocol, ScanCommand};
use config::generator::generate_toml_config;
use config::Config;
use hiro_system_kit;
use ledger_sdk::try_info;
use ledger_sdk::utils::Context;
use std::path::PathBuf;
use std::process;
use tokio_util::sync::CancellationToken;

mod commands;

pub fn main() {
    let logger = hiro_system_kit::log::setup_logger();
    let _guard = hiro_system_kit::log::setup_global_logger(logger.clone());
    let ctx = Context {
        logger: Some(logger),
        tracer: false,
    };

    let opts: Protocol = match Protocol::try_parse() {
        Ok(opts) => opts,
        Err(e) => {
            println!("{}", e);
            process::exit(1);
        }
    };

    if let Err(e) = hiro_system_kit::nestable_block_on(handle_command(opts, &ctx)) {
        error!(ctx.expect_logger(), "{e}");
        std::thread::sleep(std::time::Duration::from_millis(500));
        process::exit(1);
    }
}

fn load_config(cmd: &ScanCommand) -> Result<Config, String> {
    let mut config = match cmd.config_path {
        Some(ref path) => Config::from_file_path(path)?,
        None => Config::from_env()?,
    };
    if let Some(blocks) = cmd.blocks {
        config.scan.blocks = blocks;
        config.validate()?;
    }
    Ok(config)
}

/// Cancels `token` on Ctrl-C and once the scan deadline elapses.
fn arm_cancellation(token: &CancellationToken, config: &Config, ctx: &Context) -> Result<(), String> {
    let interrupted = token.clone();
    ctrlc::set_handler(move || interrupted.cancel())
        .map_err(|e| format!("unable to install Ctrl-C handler: {e}"))?;

    let expired = token.clone();
    let deadline = config.scan.deadline();
    let moved_ctx = ctx.clone();
    tokio::spawn(async move {
        tokio::select! {
            _ = expired.cancelled() => {}
            _ = tokio::time::sleep(deadline) => {
                try_info!(moved_ctx, "Scan deadline of {:?} reached, cancelling", deadline);
                expired.cancel();
            }
        }
    });
    Ok(())
}

async fn handle_command(opts: Protocol, ctx: &Context) -> Result<(), String> {
    match opts {
        Protocol::Scan(cmd) => {
            let config = load_config(&cmd)?;
            let service = Service::new(&config, ctx)?;
            let cancel = CancellationToken::new();
            arm_cancellation(&cancel, &config, ctx)?;

            let report = service
                .scan(config.scan.blocks, &cancel)
                .await
                .map_err(|e| e.to_string())?;
            cancel.cancel();
            println!("{report}");
        }
        Protocol::Config(subcmd) => match subcmd {
            ConfigCommand::New(cmd) => {
                use std::fs::File;
                use std::io::Write;
                let config_content = generate_toml_config(&cmd.endpoint_url);
                let mut file_path = PathBuf::new();
                file_path.push("Scanner.toml");
                let mut file = File::create(&file_path)
                    .map_err(|e| format!("unable to open file {}\n{}", file_path.display(), e))?;
                file.write_all(config_content.as_bytes())
                    .map_err(|e| format!("unable to write file {}\n{}", file_path.display(), e))?;
                println!("Created file Scanner.toml");
            }
        },
    }
    Ok(())
}
