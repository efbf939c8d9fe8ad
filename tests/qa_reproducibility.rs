use incline_sim::prelude::*;
use incline_sim::report;

fn finished_report(config: SimConfig) -> String {
    let mut engine = InclineEngine::new(config).unwrap();
    engine.run_to_end(1_000_000);
    report::to_json(&engine).unwrap()
}

// H0: Identical configurations produce different outputs
// Falsification: Run the default configuration 20 times; compare bitwise
#[test]
fn h0_1_same_config_produces_identical_outputs() {
    let first_output = finished_report(SimConfig::default());

    for i in 1..20 {
        assert_eq!(
            finished_report(SimConfig::default()),
            first_output,
            "Run {} produced different output",
            i
        );
    }
}

// H0: Different rail angles produce identical outputs
#[test]
fn h0_2_different_angles_produce_different_outputs() {
    let outputs: Vec<_> = [30.0, 45.0, 60.0]
        .into_iter()
        .map(|angle| finished_report(SimConfig::builder().angle_deg(angle).build()))
        .collect();

    assert_ne!(outputs[0], outputs[1], "30° and 45° produced identical output");
    assert_ne!(outputs[1], outputs[2], "45° and 60° produced identical output");
}

// H0: Thread count affects results
#[test]
fn h0_3_thread_count_invariance() {
    use std::thread;

    let handles: Vec<_> = (0..8)
        .map(|_| thread::spawn(|| finished_report(SimConfig::default())))
        .collect();

    let mut results = Vec::new();
    for handle in handles {
        results.push(handle.join().unwrap());
    }

    for i in 1..results.len() {
        assert_eq!(results[0], results[i], "Thread {} produced different result", i);
    }
}

// H0: Frame pacing changes the trajectory
// Falsification: drive the same run with 60 Hz frames, 7 Hz frames and
// bare ticks; the sample logs must match exactly
#[test]
fn h0_4_frame_rate_invariance() {
    let direct = finished_report(SimConfig::default());

    for frame_secs in [1.0 / 60.0, 1.0 / 7.0] {
        let mut engine = InclineEngine::default();
        let mut driver = FixedStepDriver::for_engine(&engine).with_max_substeps(u32::MAX);
        engine.start();
        while engine.is_running() {
            driver.advance(&mut engine, frame_secs);
        }
        assert_eq!(
            report::to_json(&engine).unwrap(),
            direct,
            "{frame_secs} s frames diverged"
        );
    }
}

// H0: Reset leaves residue from the previous run
#[test]
fn h0_5_reset_restores_initial_trajectory() {
    let mut engine = InclineEngine::default();
    engine.run_to_end(1_000_000);
    let first = report::to_json(&engine).unwrap();

    engine.reset();
    assert!(engine.samples().is_empty());
    engine.run_to_end(1_000_000);
    assert_eq!(report::to_json(&engine).unwrap(), first);
}

// H0: Pausing mid-run changes the trajectory
#[test]
fn h0_6_pause_resume_continuity() {
    let direct = finished_report(SimConfig::default());

    let mut engine = InclineEngine::default();
    engine.start();
    for _ in 0..200 {
        engine.step();
    }
    engine.pause();
    assert_eq!(engine.step(), TickOutcome::Idle);
    engine.start();
    engine.run_to_end(1_000_000);

    assert_eq!(report::to_json(&engine).unwrap(), direct);
}

// H0: Sharing the engine across threads changes its results
#[test]
fn h0_7_shared_engine_matches_owned_engine() {
    let direct = finished_report(SimConfig::default());

    let shared = SharedEngine::from(InclineEngine::default());
    let worker = {
        let shared = shared.clone();
        std::thread::spawn(move || {
            shared.start();
            while shared.tick(0.0025) != TickOutcome::ReachedEnd {}
        })
    };
    worker.join().unwrap();

    let json = shared.with(|engine| report::to_json(engine).unwrap());
    assert_eq!(json, direct);
}
