//! auditcap connects to the socket published by the audispd af_unix
//! plugin and prints the argument fields of EXECVE records as they
//! arrive.

use getopts::Options;
use std::env;
use std::error::Error;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{atomic::AtomicBool, Arc};

use nix::unistd::Uid;

use signal_hook::consts::{SIGINT, SIGTERM};

use auditcap::config::Config;
use auditcap::logger::Logger;
use auditcap::session::{self, SessionError};

/// Outcome of a successful invocation, distinguishing the connection
/// failure that is reported with its own exit status.
enum Outcome {
    Done,
    NotConnected(SessionError),
}

fn run_app() -> Result<Outcome, Box<dyn Error>> {
    let args: Vec<String> = env::args().collect();

    let mut opts = Options::new();
    opts.optopt("c", "config", "Configuration file", "FILE");
    opts.optopt("s", "socket", "Socket path, overrides configuration", "PATH");
    opts.optflag("d", "dry-run", "Only parse configuration and exit");
    opts.optflag("h", "help", "Print short help text and exit");
    opts.optflag("v", "version", "Print version and exit");

    let matches = opts.parse(&args[1..])?;
    if matches.opt_present("h") {
        println!("{}", opts.usage(&format!("Usage: {} [options]", &args[0])));
        return Ok(Outcome::Done);
    }

    if matches.opt_present("v") {
        println!("{}", auditcap::VERSION);
        return Ok(Outcome::Done);
    }

    let mut config = match matches.opt_str("c") {
        Some(f_name) => Config::from_file(&PathBuf::from(f_name))?,
        None => Config::default(),
    };
    if let Some(socket) = matches.opt_str("s") {
        config.input.socket = socket.into();
    }
    config.validate()?;
    log::set_max_level(config.debug.log_level);

    if matches.opt_present("d") {
        println!("auditcap {}: Config ok.", auditcap::VERSION);
        return Ok(Outcome::Done);
    }

    log::info!("Started {} running version {}", &args[0], auditcap::VERSION);
    log::info!(
        "Running with EUID {} using config {}",
        Uid::effective().as_raw(),
        &config
    );

    // A first signal ends the capture loop at the next idle receive, a
    // second one terminates the process.
    let stop = Arc::new(AtomicBool::new(false));
    for sig in [SIGINT, SIGTERM] {
        signal_hook::flag::register_conditional_shutdown(sig, 1, Arc::clone(&stop))?;
        signal_hook::flag::register(sig, Arc::clone(&stop))?;
    }

    match session::run(&config, stop, io::stdout().lock()) {
        Ok(_) => Ok(Outcome::Done),
        Err(e @ SessionError::Connect(_)) => Ok(Outcome::NotConnected(e)),
        Err(e) => Err(e.into()),
    }
}

pub fn main() -> ExitCode {
    if let Err(e) = Logger::install(log::LevelFilter::Info) {
        eprintln!("can't set up logging: {}", e);
    }

    std::panic::set_hook(Box::new(move |panic_info| {
        let payload = panic_info.payload();
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            s
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s
        } else {
            "(unknown error)"
        };
        let location = match panic_info.location() {
            Some(l) => format!("{}:{},{}", l.file(), l.line(), l.column()),
            None => "(unknown)".to_string(),
        };
        log::error!("fatal error '{}' at {}", &message, &location);
    }));

    match run_app() {
        Ok(Outcome::Done) => ExitCode::SUCCESS,
        Ok(Outcome::NotConnected(e)) => {
            println!("Exception socket: {}", e);
            log::error!("{}", e);
            ExitCode::FAILURE
        }
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
