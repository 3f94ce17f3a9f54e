use clap::{Arg, ArgAction, ArgMatches, Command};
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use pushr::config::Config;
use pushr::error::SyncError;
use pushr::logging::init_tracing;
use pushr::progress::CliProgressCallback;
use pushr::strategies::StrategyMode;
use pushr::sync::SyncBuilder;

mod utils;

fn cli() -> Command {
	Command::new("pushr")
		.version(env!("CARGO_PKG_VERSION"))
		.about("Mirror a folder to a hosted git repository")
		.arg(Arg::new("folder").required(true).help("Folder to sync"))
		.arg(
			Arg::new("owner")
				.long("owner")
				.value_name("ACCOUNT")
				.help("Account owning the remote repository"),
		)
		.arg(
			Arg::new("remote-base")
				.long("remote-base")
				.value_name("URL")
				.help("Base URL of the git host"),
		)
		.arg(
			Arg::new("config")
				.short('c')
				.long("config")
				.value_name("FILE")
				.help("Config file (TOML or JSON)"),
		)
		.arg(
			Arg::new("strategy")
				.short('s')
				.long("strategy")
				.value_name("MODE")
				.help("auto or full"),
		)
		.arg(
			Arg::new("verbose")
				.short('v')
				.long("verbose")
				.action(ArgAction::SetTrue)
				.help("Log every external command"),
		)
}

fn load_config(matches: &ArgMatches) -> Result<Config, SyncError> {
	let path = matches.get_one::<String>("config").map(Path::new);
	let mut config = Config::load(path)?;

	if let Some(owner) = matches.get_one::<String>("owner") {
		config.owner = owner.clone();
	}
	if let Some(base) = matches.get_one::<String>("remote-base") {
		config.remote_base = base.clone();
	}
	if let Some(strategy) = matches.get_one::<String>("strategy") {
		config.strategy = strategy
			.parse::<StrategyMode>()
			.map_err(|message| SyncError::InvalidConfig { message })?;
	}
	config.validate()?;
	Ok(config)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
	let matches = cli().get_matches();
	init_tracing(matches.get_flag("verbose"));
	utils::setup_signal_handlers();

	let config = match load_config(&matches) {
		Ok(config) => config,
		Err(e) => {
			eprintln!("{}", e);
			return ExitCode::FAILURE;
		}
	};

	// Required by clap
	let folder = match matches.get_one::<String>("folder") {
		Some(folder) => folder,
		None => return ExitCode::FAILURE,
	};

	let result = SyncBuilder::new(folder)
		.config(config)
		.progress(Arc::new(CliProgressCallback::new()))
		.sync()
		.await;

	match result {
		Ok(report) => {
			match report.staged {
				Some(staged) => println!(
					"{} {} files in {:.1}s",
					report.outcome,
					staged,
					report.elapsed.as_secs_f64()
				),
				None => println!("{} in {:.1}s", report.outcome, report.elapsed.as_secs_f64()),
			}
			println!("{}", report.web_url);
			ExitCode::SUCCESS
		}
		Err(e) => {
			eprintln!("{}", e);
			ExitCode::FAILURE
		}
	}
}


// vim: ts=4
