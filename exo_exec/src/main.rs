//! Main exoskeleton executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise all modules
//!     - Attach the tick callback, which only:
//!         - Counts the heartbeat
//!         - Notifies the main loop that a tick has elapsed
//!     - Main loop:
//!         - Toggle processing
//!         - Trajectory generation, exactly once per elapsed tick
//!         - Angle publication
//!         - Archiving and status reporting
//!
//! The trajectory state is only ever touched by the main loop, the tick
//! callback only shares atomics with it.
//!
//! # Modules
//!
//! All modules (e.g. `traj_gen`) shall meet the following requirements:
//!     1. Provide a public struct implementing the `util::module::State` trait.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Report};
use log::{info, trace, warn};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::thread;
use structopt::StructOpt;

// Internal
use exo_lib::{
    angle_output::AngleOutput,
    data_store::DataStore,
    event_source::{EventSource, ScriptEventSource, StdinEventSource},
    heartbeat::Heartbeat,
    params::ExecParams,
    ticker::{TickHandoff, Ticker},
    traj_gen::{self, TrajGen},
};
use util::{
    archive::Archived,
    host,
    logger::{logger_init, parse_level, LevelFilter},
    module::State,
    session::Session,
};

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

/// Exoskeleton gait trajectory executable.
#[derive(Debug, StructOpt)]
#[structopt(name = "exo_exec")]
struct Opt {
    /// Replay toggles from this script instead of reading the console.
    #[structopt(long, parse(from_os_str))]
    script: Option<PathBuf>,

    /// Minimum log level (trace, debug or info).
    #[structopt(long, default_value = "info", parse(try_from_str = parse_level))]
    level: LevelFilter,
}

/// Summary of the run, saved into the session at shutdown.
#[derive(Serialize)]
struct ExecSummary {
    num_steps: u64,
    num_toggles: u64,
    num_missed_steps: u64,
    num_ticks: u64,
    num_tick_overruns: u64,
    traj_gen: traj_gen::StatusReport,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let opt = Opt::from_args();

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("exo_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(opt.level, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Exoskeleton Executable\n");
    info!(
        "Software root: {:?}",
        host::get_exo_sw_root().wrap_err("Failed to get the software root")?
    );
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let exec_params: ExecParams =
        util::params::load("exo_exec.toml").wrap_err("Could not load exec params")?;

    let traj_gen_params: traj_gen::Params =
        util::params::load("traj_gen.toml").wrap_err("Could not load TrajGen params")?;

    exec_params
        .validate(&traj_gen_params)
        .wrap_err("Invalid exec params")?;

    info!("Exec parameters loaded");

    // ---- INITIALISE EVENT SOURCE ----

    let mut event_source: Box<dyn EventSource> = match opt.script {
        Some(ref path) => {
            info!("Loading script from {:?}", path);
            Box::new(ScriptEventSource::new(path).wrap_err("Failed to load script")?)
        }
        None => {
            info!("No script provided, every key pressed on the console toggles the gait\n");
            Box::new(StdinEventSource::new().wrap_err("Failed to read from the console")?)
        }
    };

    // ---- INITIALISE MODULES ----

    info!("Initialising modules...");

    let mut traj_gen = TrajGen::default();
    traj_gen
        .init(traj_gen_params)
        .wrap_err("Failed to initialise TrajGen")?;
    if exec_params.archive_period_ticks > 0 {
        traj_gen
            .init_archive(&session)
            .wrap_err("Failed to initialise the TrajGen archive")?;
    }
    info!("TrajGen init complete");

    let mut ds = DataStore::new(traj_gen);
    let angle_output = AngleOutput::new(ds.traj_gen.angles());

    info!("Module initialisation complete\n");

    // ---- ATTACH TICKER ----

    let handoff = TickHandoff::new();
    let mut heartbeat =
        Heartbeat::new(exec_params.heartbeat_period_ticks).wrap_err("Invalid heartbeat")?;
    let heartbeat_indicator = heartbeat.indicator();

    let tick_period = exec_params
        .tick_period()
        .wrap_err("Invalid tick period")?;

    let ticker = {
        let handoff = handoff.clone();
        Ticker::attach(tick_period, move || {
            heartbeat.on_tick();
            handoff.notify();
        })
        .wrap_err("Failed to attach the ticker")?
    };
    info!("Ticker attached with a period of {:?}", ticker.period());

    // ---- MAIN LOOP ----

    info!("Beginning main loop\n");

    let mut last_heartbeat = heartbeat_indicator.load(Ordering::Relaxed);
    let mut last_overruns = 0;

    loop {
        // ---- TOGGLE PROCESSING ----

        while event_source.has_event() {
            if let Some(event) = event_source.consume_event() {
                ds.handle_toggle(&event);
            }
        }

        if event_source.is_exhausted() {
            info!("No more toggles will be received, stopping");
            break;
        }

        // ---- TRAJECTORY GENERATION ----

        let num_steps = ds.run_pending_steps(handoff.take(), &exec_params, |ds, angles| {
            angle_output.publish(angles);

            // ---- WRITE ARCHIVES ----

            if ds.is_archive_step {
                if let Err(e) = ds.traj_gen.write() {
                    warn!("Could not write the TrajGen archive: {}", e);
                }
            }

            // ---- STATUS ----

            if ds.is_status_step {
                let rpt = &ds.traj_gen_status_rpt;
                info!(
                    "{} phase {} cycle {} faults {} missed {} | {}",
                    if rpt.running { "RUN " } else { "STOP" },
                    rpt.phase,
                    rpt.cycle_count,
                    rpt.num_faults,
                    ds.num_missed_steps,
                    angle_output.snapshot()
                );
            }
        });

        // ---- TICK MONITORING ----

        let hb = heartbeat_indicator.load(Ordering::Relaxed);
        if hb != last_heartbeat {
            trace!("Heartbeat {}", if hb { "on" } else { "off" });
            last_heartbeat = hb;
        }

        let overruns = ticker.overruns();
        if overruns != last_overruns {
            warn!(
                "Tick overran, {} deadlines skipped ({} in total)",
                overruns - last_overruns,
                overruns
            );
            last_overruns = overruns;
        }

        // Nothing to do until the next tick
        if num_steps == 0 {
            thread::yield_now();
        }
    }

    // ---- SHUTDOWN ----

    ds.traj_gen.make_safe();

    let num_ticks = ticker.ticks();
    let num_tick_overruns = ticker.overruns();
    ticker.detach();

    let summary = ExecSummary {
        num_steps: ds.num_steps,
        num_toggles: ds.num_toggles,
        num_missed_steps: ds.num_missed_steps,
        num_ticks,
        num_tick_overruns,
        traj_gen: ds.traj_gen.report(),
    };

    info!(
        "Ran {} steps over {} ticks, {} missed steps, {} tick overruns",
        summary.num_steps, summary.num_ticks, summary.num_missed_steps, summary.num_tick_overruns
    );

    session
        .save_json("exec_summary.json", &summary)
        .wrap_err("Failed to save the execution summary")?;

    info!("End of execution");

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_level_parsed_from_args() {
        let opt = Opt::from_iter_safe(&["exo_exec"]).unwrap();
        assert_eq!(opt.level, LevelFilter::Info);
        assert!(opt.script.is_none());

        let opt = Opt::from_iter_safe(&["exo_exec", "--level", "trace"]).unwrap();
        assert_eq!(opt.level, LevelFilter::Trace);

        assert!(Opt::from_iter_safe(&["exo_exec", "--level", "warn"]).is_err());
        assert!(Opt::from_iter_safe(&["exo_exec", "--level", "loud"]).is_err());
    }
}
