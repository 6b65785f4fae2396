//! Prints the two sides of a strict alternation, main thread first.

mod cli;

use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use parking_lot::Mutex;
use tracing::{info, warn};

use baton::config::Config;
use baton::error::{self, BatonError};
use baton::{alternate, Report, Role};
use cli::Cli;

fn main() -> ExitCode {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(cli.log_level())
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    match run(cli.config(), Arc::new(Output::new(io::stdout()))) {
        Ok(report) => {
            info!(turns = report.turns, lock_ops = report.lock_ops, "done");
            ExitCode::from(error::SUCCESS)
        }
        Err(err) => {
            eprintln!("{err:#}");
            let code = err
                .downcast_ref::<BatonError>()
                .map_or(error::FAILURE, BatonError::exit_code);
            ExitCode::from(code)
        }
    }
}

/// Line sink shared by both sides. Keeps the first write error for after the run.
struct Output<W> {
    sink: Mutex<W>,
    failure: Mutex<Option<io::Error>>,
}

impl<W: Write> Output<W> {
    fn new(sink: W) -> Self {
        Self {
            sink: Mutex::new(sink),
            failure: Mutex::new(None),
        }
    }

    fn write_line(&self, role: Role, turn: usize, line: &str) {
        if let Err(err) = writeln!(self.sink.lock(), "{line}") {
            warn!(role = role.name(), turn, %err, "failed to write output");
            let mut failure = self.failure.lock();
            if failure.is_none() {
                *failure = Some(err);
            }
        }
    }

    fn finish(&self) -> io::Result<()> {
        if let Some(err) = self.failure.lock().take() {
            return Err(err);
        }
        self.sink.lock().flush()
    }
}

fn run<W>(config: Config, output: Arc<Output<W>>) -> anyhow::Result<Report>
where
    W: Write + Send + 'static,
{
    config.validate().context("invalid configuration")?;
    let config = Arc::new(config);
    let report = alternate(
        config.turns,
        emitter(config.clone(), output.clone(), Role::Initiator),
        emitter(config.clone(), output.clone(), Role::Responder),
    )?;
    output.finish().context("writing output")?;
    Ok(report)
}

fn emitter<W>(config: Arc<Config>, output: Arc<Output<W>>, role: Role) -> impl FnMut(usize) + Send + 'static
where
    W: Write + Send + 'static,
{
    move |turn| {
        let pause = config.pause();
        if !pause.is_zero() {
            std::thread::sleep(pause);
        }
        output.write_line(role, turn, &config.line(role, turn));
    }
}
