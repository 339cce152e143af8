use std::path::PathBuf;
use std::process::ExitCode;

use tracing::{error, info};

use rustfdm::logging::init_logging;
use rustfdm::{ExecResult, ExecSettings, Executive};

const USAGE: &str = "\
Usage: rustfdm [OPTIONS]

Options:
  --settings <FILE>    Executive settings (JSON)
  --root <DIR>         Root directory for aircraft, engine and systems paths
  --script <FILE>      Scenario to run
  --aircraft <NAME>    Vehicle to load when no scenario names one
  --ic <NAME>          Initial-condition document in the vehicle directory
  --end <SECONDS>      Stop once the clock passes this time
  --help               Print this message";

#[derive(Debug, Default)]
struct Options {
    settings: Option<PathBuf>,
    root: Option<PathBuf>,
    script: Option<PathBuf>,
    aircraft: Option<String>,
    ic: Option<String>,
    end_time: Option<f64>,
}

fn parse_args() -> Result<Option<Options>, String> {
    let mut opts = Options::default();
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        let mut value = || args.next().ok_or_else(|| format!("{arg} needs a value"));
        match arg.as_str() {
            "--settings" => opts.settings = Some(value()?.into()),
            "--root" => opts.root = Some(value()?.into()),
            "--script" => opts.script = Some(value()?.into()),
            "--aircraft" => opts.aircraft = Some(value()?),
            "--ic" => opts.ic = Some(value()?),
            "--end" => {
                let text = value()?;
                let t = text
                    .parse()
                    .map_err(|_| format!("--end expects seconds, got '{text}'"))?;
                opts.end_time = Some(t);
            }
            "--help" | "-h" => return Ok(None),
            other => return Err(format!("Unknown option '{other}'")),
        }
    }
    Ok(Some(opts))
}

fn run(opts: Options) -> ExecResult<()> {
    let mut settings = match &opts.settings {
        Some(path) => {
            ExecSettings::from_file(path).map_err(rustfdm::LoadError::from)?
        }
        None => ExecSettings::default(),
    };
    if let Some(root) = opts.root {
        settings.root_dir = root;
    }
    init_logging(&settings.log);

    let mut exec = Executive::new(settings)?;
    if let Some(script) = &opts.script {
        exec.load_script(script)?;
    }
    if let Some(aircraft) = &opts.aircraft {
        if !exec.loaded() {
            exec.load_model(aircraft)?;
        }
    }
    if !exec.loaded() {
        return Err(rustfdm::ExecError::NotLoaded);
    }
    if let Some(ic) = &opts.ic {
        exec.load_initial_conditions(ic)?;
    }

    exec.run_ic()?;
    info!(vehicle = %exec.aircraft_name(), dt = exec.dt(), "Starting run");

    while exec.run() {
        if opts.end_time.is_some_and(|end| exec.sim_time() > end) {
            break;
        }
    }

    exec.models().output.flush()?;
    info!(
        time = exec.sim_time(),
        frames = exec.frame(),
        "Run complete"
    );
    Ok(())
}

fn main() -> ExitCode {
    let opts = match parse_args() {
        Ok(Some(opts)) => opts,
        Ok(None) => {
            println!("{USAGE}");
            return ExitCode::SUCCESS;
        }
        Err(msg) => {
            eprintln!("{msg}\n\n{USAGE}");
            return ExitCode::from(2);
        }
    };

    match run(opts) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("rustfdm: {e}");
            ExitCode::FAILURE
        }
    }
}
