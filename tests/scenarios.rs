// tests/scenarios.rs

//! End-to-end scheduling and memory scenarios
//!
//! Every test drives the kernel with the manually advanced clock and an
//! isolated output directory, so runs are deterministic and artifacts do
//! not collide between tests.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use sim_os::kernel::process::ProcessState;
use sim_os::{Config, Kernel, KernelError, ProcessError, SchedulerKind};

fn scratch_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("sim_os_{tag}_{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn flat_config(tag: &str) -> Config {
    Config {
        max_overall_mem: 1024,
        mem_per_frame: 1024,
        min_mem_per_proc: 256,
        max_mem_per_proc: 256,
        output_dir: scratch_dir(tag),
        ..Config::default()
    }
}

/// Advances the clock one tick at a time until `pred` holds.
///
/// Panics when the tick budget runs out; worker threads get a short pause
/// after every tick to consume it.
fn run_until(kernel: &Kernel, budget: u64, pred: impl Fn(&Kernel) -> bool) {
    for _ in 0..budget {
        if pred(kernel) {
            return;
        }
        kernel.advance_clock(1).unwrap();
        std::thread::sleep(Duration::from_millis(2));
    }
    // One last settle before giving up.
    std::thread::sleep(Duration::from_millis(50));
    assert!(pred(kernel), "tick budget of {budget} exhausted");
}

fn all_finished(kernel: &Kernel) -> bool {
    let processes = kernel.list_processes().unwrap();
    !processes.is_empty() && processes.iter().all(|p| p.state() == ProcessState::Finished)
}

#[test]
fn fcfs_single_core_runs_to_completion() {
    let mut kernel = Kernel::new();
    let config = Config {
        num_cpu: 1,
        scheduler: SchedulerKind::Fcfs,
        min_ins: 3,
        max_ins: 3,
        ..flat_config("s1")
    };
    let output_dir = config.output_dir.clone();
    kernel.initialize_manual(config).unwrap();

    kernel.create_named_process("p1").unwrap();
    kernel.create_named_process("p2").unwrap();

    run_until(&kernel, 100, all_finished);

    for name in ["p1", "p2"] {
        let process = kernel.process_view(name).unwrap();
        assert_eq!(process.current_instruction(), 3);
        assert_eq!(process.total_instructions(), 3);
        assert_eq!(process.state(), ProcessState::Finished);
        assert_eq!(process.core(), None);
        assert_eq!(process.memory_size(), Some(256), "size pinned at first admission");

        let log = fs::read_to_string(output_dir.join(format!("{name}.txt"))).unwrap();
        let lines: Vec<&str> = log.lines().collect();
        assert_eq!(lines.len(), 3, "{name}.txt should hold one line per instruction");
        for line in lines {
            assert!(line.contains("Core:0"), "single core means every line is Core:0");
            assert!(line.contains(&format!("\"Hello world from {name}!\"")));
        }
    }

    let stat = kernel.vmstat().unwrap();
    assert_eq!(stat.active_cpu_ticks + stat.idle_cpu_ticks, stat.total_cpu_ticks);
    assert!(stat.active_cpu_ticks >= 6, "six instructions executed in total");
    kernel.shutdown();
}

#[test]
fn round_robin_two_cores_finishes_everything() {
    let mut kernel = Kernel::new();
    let config = Config {
        num_cpu: 2,
        scheduler: SchedulerKind::Rr,
        quantum_cycles: 2,
        min_ins: 5,
        max_ins: 5,
        max_overall_mem: 2048,
        mem_per_frame: 2048,
        min_mem_per_proc: 256,
        max_mem_per_proc: 256,
        output_dir: scratch_dir("s2"),
        ..Config::default()
    };
    let output_dir = config.output_dir.clone();
    kernel.initialize_manual(config).unwrap();

    for name in ["p1", "p2", "p3", "p4"] {
        kernel.create_named_process(name).unwrap();
    }

    run_until(&kernel, 300, all_finished);

    for name in ["p1", "p2", "p3", "p4"] {
        let process = kernel.process_view(name).unwrap();
        assert_eq!(process.current_instruction(), 5);
        let log = fs::read_to_string(output_dir.join(format!("{name}.txt"))).unwrap();
        assert_eq!(log.lines().count(), 5);
    }
    kernel.shutdown();
}

#[test]
fn round_robin_quantum_one_still_completes() {
    let mut kernel = Kernel::new();
    let config = Config {
        num_cpu: 1,
        scheduler: SchedulerKind::Rr,
        quantum_cycles: 1,
        min_ins: 3,
        max_ins: 3,
        ..flat_config("q1")
    };
    kernel.initialize_manual(config).unwrap();

    kernel.create_named_process("p1").unwrap();
    run_until(&kernel, 100, all_finished);

    let process = kernel.process_view("p1").unwrap();
    assert_eq!(process.current_instruction(), 3);
    kernel.shutdown();
}

#[test]
fn paging_admission_blocks_until_memory_frees_up() {
    let mut kernel = Kernel::new();
    let config = Config {
        num_cpu: 3,
        scheduler: SchedulerKind::Fcfs,
        min_ins: 3,
        max_ins: 3,
        max_overall_mem: 2048,
        mem_per_frame: 512,
        min_mem_per_proc: 1024,
        max_mem_per_proc: 1024,
        output_dir: scratch_dir("s3"),
        ..Config::default()
    };
    kernel.initialize_manual(config).unwrap();

    // Two resident processes fill all four frames; the third core's
    // admission is rejected and the process requeues until pages free up.
    kernel.create_named_process("p1").unwrap();
    kernel.create_named_process("p2").unwrap();
    kernel.create_named_process("p3").unwrap();

    run_until(&kernel, 200, all_finished);

    let stat = kernel.vmstat().unwrap();
    assert_eq!(stat.pages_paged_in, 6, "three admissions of two pages each");
    assert_eq!(stat.pages_paged_out, 6, "every admission was released");
    assert_eq!(stat.memory.used, 0);
    kernel.shutdown();
}

#[test]
fn generator_creates_batch_per_tick() {
    let mut kernel = Kernel::new();
    let config = Config {
        num_cpu: 1,
        batch_process_freq: 3,
        min_ins: 1,
        max_ins: 1,
        ..flat_config("s5")
    };
    kernel.initialize_manual(config).unwrap();

    kernel.start_generator().unwrap();
    kernel.advance_clock(4).unwrap();
    // Poll without advancing: exactly four generator ticks were emitted.
    for _ in 0..100 {
        if kernel.list_processes().unwrap().len() >= 12 {
            break;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    kernel.stop_generator().unwrap();

    std::thread::sleep(Duration::from_millis(50));
    let processes = kernel.list_processes().unwrap();
    assert_eq!(processes.len(), 12, "4 ticks x batch of 3");
    assert!(processes.iter().all(|p| p.name().starts_with("process")));

    // Everything drains within a bounded number of further ticks.
    run_until(&kernel, 200, all_finished);
    kernel.shutdown();
}

#[test]
fn core_zero_writes_snapshots_in_quantum_strides() {
    let mut kernel = Kernel::new();
    let config = Config {
        num_cpu: 1,
        scheduler: SchedulerKind::Fcfs,
        quantum_cycles: 5,
        min_ins: 3,
        max_ins: 3,
        ..flat_config("s6")
    };
    let output_dir = config.output_dir.clone();
    kernel.initialize_manual(config).unwrap();

    kernel.create_named_process("p1").unwrap();
    kernel.create_named_process("p2").unwrap();
    run_until(&kernel, 100, all_finished);
    std::thread::sleep(Duration::from_millis(50));

    // One snapshot per completed slice, labels advancing by the quantum.
    for cycle in [0, 5] {
        let path = output_dir.join(format!("memory_stamp_{cycle}.txt"));
        let text = fs::read_to_string(&path)
            .unwrap_or_else(|_| panic!("missing snapshot {}", path.display()));
        assert!(text.contains(&format!("Quantum Cycle: {cycle}")));
        assert!(text.contains("Timestamp: ("));
        assert!(text.contains("----end---- = 1024"));
        assert!(text.contains("----start---- = 0"));
    }
    kernel.shutdown();
}

#[test]
fn snapshot_now_writes_current_cycle() {
    let mut kernel = Kernel::new();
    let config = flat_config("snap");
    let output_dir = config.output_dir.clone();
    kernel.initialize_manual(config).unwrap();

    kernel.snapshot_now().unwrap();
    let text = fs::read_to_string(output_dir.join("memory_stamp_0.txt")).unwrap();
    assert!(text.contains("Number of processes in memory: 0"));
    kernel.shutdown();
}

#[test]
fn duplicate_name_is_surfaced_and_harmless() {
    let mut kernel = Kernel::new();
    kernel.initialize_manual(flat_config("dup")).unwrap();

    kernel.create_named_process("p1").unwrap();
    let err = kernel.create_named_process("p1").unwrap_err();
    assert_eq!(
        err,
        KernelError::Process(ProcessError::DuplicateName("p1".to_string()))
    );
    assert_eq!(kernel.list_processes().unwrap().len(), 1);
    kernel.shutdown();
}

#[test]
fn reinitialize_resets_observable_state() {
    let mut kernel = Kernel::new();
    kernel.initialize_manual(flat_config("reinit_a")).unwrap();
    kernel.create_named_process("p1").unwrap();
    run_until(&kernel, 100, all_finished);
    assert!(kernel.vmstat().unwrap().total_cpu_ticks > 0);

    // A second initialize behaves like a fresh start.
    kernel.initialize_manual(flat_config("reinit_b")).unwrap();
    assert!(kernel.list_processes().unwrap().is_empty());
    let stat = kernel.vmstat().unwrap();
    assert_eq!(stat.total_cpu_ticks, 0);
    assert_eq!(stat.memory.used, 0);

    // Names from the previous run are free again.
    kernel.create_named_process("p1").unwrap();
    kernel.shutdown();
}

#[test]
fn operations_require_initialization() {
    let kernel = Kernel::new();
    assert_eq!(kernel.start_generator().unwrap_err(), KernelError::NotInitialized);
    assert_eq!(kernel.report().unwrap_err(), KernelError::NotInitialized);
    assert_eq!(
        kernel.create_named_process("p1").unwrap_err(),
        KernelError::NotInitialized
    );
}

#[test]
fn invalid_config_is_rejected_without_state_change() {
    let mut kernel = Kernel::new();
    let config = Config { min_ins: 5, max_ins: 1, ..flat_config("badcfg") };
    assert!(kernel.initialize_manual(config).is_err());
    assert!(!kernel.is_initialized());
}

#[test]
fn report_is_written_and_partitions_processes() {
    let mut kernel = Kernel::new();
    let config = Config { min_ins: 2, max_ins: 2, ..flat_config("report") };
    let output_dir = config.output_dir.clone();
    kernel.initialize_manual(config).unwrap();

    kernel.create_named_process("worker_a").unwrap();
    run_until(&kernel, 100, all_finished);

    let report = kernel.report().unwrap();
    assert!(report.contains("CPU Utilization:"));
    assert!(report.contains("Finished processes:"));
    assert!(report.contains("worker_a"));
    assert!(report.contains("2 / 2"));

    let on_disk = fs::read_to_string(output_dir.join("csopesy_log.txt")).unwrap();
    assert_eq!(on_disk, report);
    kernel.shutdown();
}
