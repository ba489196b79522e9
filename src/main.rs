use std::path::PathBuf;
use std::process::ExitCode;

use fileshare::config::Settings;
use fileshare::server::{self, signal::ShutdownSignal};
use fileshare::share::ShareSet;
use fileshare::{exit_status, logger, ServeError};

fn main() -> ExitCode {
    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("[ERROR] {}", ServeError::from(e));
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = logger::init(&settings.logging) {
        eprintln!("[ERROR] Failed to open log files: {e}");
        return ExitCode::FAILURE;
    }

    // Worker count from config, CPU cores otherwise
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = settings.server.workers {
        runtime_builder.worker_threads(workers.max(1));
        logger::log_info(&format!("[CONFIG] Using {workers} worker threads"));
    }
    let runtime = match runtime_builder.build() {
        Ok(runtime) => runtime,
        Err(e) => {
            logger::log_error(&format!("Failed to start runtime: {e}"));
            return ExitCode::FAILURE;
        }
    };

    // Handlers go in before anything needs tearing down
    let shutdown = {
        let _guard = runtime.enter();
        ShutdownSignal::register()
    };

    let args: Vec<PathBuf> = std::env::args_os().skip(1).map(PathBuf::from).collect();
    let share_set = match settings
        .input_paths(&args)
        .map_err(ServeError::from)
        .and_then(|inputs| ShareSet::build(&inputs).map_err(ServeError::from))
    {
        Ok(share_set) => share_set,
        Err(e) => {
            logger::log_error(&e.to_string());
            return ExitCode::FAILURE;
        }
    };

    let config = settings.into_server_config(share_set);
    let result = runtime.block_on(server::run(&config, shutdown.wait()));

    // Runs after a bind failure as well as after an interrupt
    if let Err(e) = config.share_set.teardown() {
        logger::log_error(&format!(
            "Failed to remove {}: {e}",
            config.share_set.root().display()
        ));
    }

    match &result {
        // Already reported by the listener
        Ok(()) | Err(ServeError::Bind { .. }) => {}
        Err(e) => logger::log_error(&e.to_string()),
    }
    ExitCode::from(exit_status(&result))
}
