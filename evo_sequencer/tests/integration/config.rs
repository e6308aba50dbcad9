//! Integration test: loading the shipped configuration and running it
//! against the simulated cell.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;

use evo_common::config::ConfigError;
use evo_common::sequencer::command::CommandSet;
use evo_common::sequencer::fault::FaultCode;
use evo_common::sequencer::state::OperatingState;
use evo_sequencer::config::{LoadError, load_config, load_config_from_str};
use evo_sequencer::cycle::CycleRunner;
use evo_sequencer::error::SetupError;
use evo_sequencer::sim::SimulatedCell;
use tempfile::NamedTempFile;

use super::harness::CONFIG;

fn shipped_config() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("config/sequencer.toml")
}

#[test]
fn shipped_config_loads() {
    let loaded = load_config(&shipped_config()).unwrap();
    assert_eq!(loaded.config.shared.service_name, "press-cell-01");
    assert_eq!(loaded.config.actuators.len(), 2);
    assert!(loaded.config.homing_required);
    assert_eq!(loaded.controller.actuator_name(1), "ejector");
}

#[test]
fn shipped_config_runs_to_auto_restart_in_simulation() {
    let loaded = load_config(&shipped_config()).unwrap();
    let auto_run = loaded.config.auto_run;
    let cell = SimulatedCell::new(loaded.config.actuators.len(), 3).with_operator(auto_run);
    let mut runner = CycleRunner::new(loaded, cell);

    let mut seen_complete = false;
    let mut restarted = false;
    for _ in 0..400 {
        let status = runner.run_once().unwrap();
        assert!(!status.state.is_faulted() || status.cycle == 1, "{status:?}");
        assert!(status.active_step.fault_code.is_none(), "{status:?}");
        if status.state == OperatingState::Complete {
            seen_complete = true;
        } else if seen_complete && status.state == OperatingState::Running {
            restarted = true;
            break;
        }
    }
    assert!(seen_complete);
    assert!(restarted);
}

#[test]
fn simulated_external_fault_parks_in_fault_step() {
    let loaded = load_config_from_str(CONFIG).unwrap();
    let cell = SimulatedCell::new(1, 2);
    let mut runner = CycleRunner::new(loaded, cell);

    runner.io_mut().inject_command(CommandSet::RESET);
    runner.run_once().unwrap();
    runner.io_mut().inject_command(CommandSet::START);
    runner.run_once().unwrap();

    runner.io_mut().set_external_fault(true);
    let status = runner.run_once().unwrap();
    assert_eq!(status.active_step.step_id.0, 21);
    assert_eq!(status.last_fault_code, Some(FaultCode::ExternalFault));
    assert!(status.outputs_deenergized());
    assert_eq!(runner.io().state(), OperatingState::Running);
}

#[test]
fn bounded_run_counts_cycles() {
    let text = CONFIG.replace("cycle_time_us = 1000000", "cycle_time_us = 100");
    let loaded = load_config_from_str(&text).unwrap();
    let mut runner = CycleRunner::new(loaded, SimulatedCell::new(1, 1).with_operator(true));
    runner.run(&AtomicBool::new(true), Some(20)).unwrap();
    assert_eq!(runner.stats().cycle_count, 20);
    assert_eq!(runner.controller().status().cycle, 20);
}

#[test]
fn tempfile_config_round_trip() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(CONFIG.as_bytes()).unwrap();
    let loaded = load_config(file.path()).unwrap();
    assert_eq!(loaded.config.cycle_time_us, 1_000_000);
    assert!(loaded.config.auto_run);
}

#[test]
fn fault_step_collision_rejected() {
    let text = CONFIG.replace("next = 30", "next = 21").replace("step = 30", "step = 21");
    assert_eq!(
        load_config_from_str(&text).unwrap_err(),
        LoadError::Setup(SetupError::FaultStepCollision {
            step: 20,
            fault_step: 21
        })
    );
}

#[test]
fn unknown_actuator_rejected() {
    let text = CONFIG.replace("advance = [\"clamp\"]", "advance = [\"gripper\"]");
    assert_eq!(
        load_config_from_str(&text).unwrap_err(),
        LoadError::Setup(SetupError::UnknownActuator {
            step: 20,
            name: "gripper".into()
        })
    );
}

#[test]
fn required_beyond_width_rejected() {
    let text = CONFIG.replace(
        "[permissives.reset]\nwidth = 1",
        "[permissives.reset]\nwidth = 1\nrequired = 0x0002",
    );
    assert!(matches!(
        load_config_from_str(&text),
        Err(LoadError::Setup(SetupError::RequiredOutsideWidth { .. }))
    ));
}

#[test]
fn zero_width_group_rejected_at_validation() {
    let text = CONFIG.replace("[permissives.reset]\nwidth = 1", "[permissives.reset]\nwidth = 0");
    assert!(matches!(
        load_config_from_str(&text),
        Err(LoadError::Config(ConfigError::ValidationError(_)))
    ));
}
