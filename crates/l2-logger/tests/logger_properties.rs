//! Property-based tests for write-path ordering invariants.

use l2_aggregate::{read_log_data, BatchValidator};
use l2_common::Error;
use l2_config::LoggerInfo;
use l2_logger::{DataLogger, Record};
use proptest::prelude::*;
use serde_json::json;
use tempfile::tempdir;

const TASKS: &[&str] = &["taska", "taskb", "taskc"];

/// One step of a producer: counter increments, task choice, metric value.
#[derive(Debug, Clone)]
struct Step {
    exp_inc: i64,
    block_inc: i64,
    task: usize,
    reward: i64,
}

fn step_strategy() -> impl Strategy<Value = Step> {
    (0i64..3, 0i64..2, 0usize..TASKS.len(), -100i64..100).prop_map(
        |(exp_inc, block_inc, task, reward)| Step {
            exp_inc,
            block_inc,
            task,
            reward,
        },
    )
}

fn record(exp_num: i64, block_num: i64, task: &str, reward: i64) -> Record {
    Record::new()
        .with("exp_num", exp_num)
        .with("block_num", block_num)
        .with("worker_id", "w0")
        .with("block_type", if block_num % 2 == 0 { "train" } else { "test" })
        .with("task_name", task)
        .with("task_params", json!({"task": task}))
        .with("reward", reward)
}

/// Non-decreasing records built from `steps`, starting at `start`.
fn records(steps: &[Step], start: i64) -> Vec<Record> {
    let (mut exp_num, mut block_num) = (start, start);
    steps
        .iter()
        .map(|s| {
            exp_num += s.exp_inc;
            block_num += s.block_inc;
            record(exp_num, block_num, TASKS[s.task], s.reward)
        })
        .collect()
}

fn logger(base: &std::path::Path) -> DataLogger {
    DataLogger::new(base, "prop", LoggerInfo::new(["reward"]).unwrap(), None).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn non_decreasing_sequences_round_trip(steps in prop::collection::vec(step_strategy(), 1..30)) {
        let dir = tempdir().unwrap();
        let input = records(&steps, 0);
        let mut logger = logger(dir.path());
        for r in &input {
            prop_assert!(logger.log_record(r).is_ok());
        }
        logger.close().unwrap();

        let ds = read_log_data(logger.scenario_dir()).unwrap();
        prop_assert_eq!(ds.len(), input.len());
        for (row, r) in input.iter().enumerate() {
            for field in ["exp_num", "block_num", "task_name", "reward"] {
                let expected = r.get(field).unwrap().to_cell();
                prop_assert_eq!(ds.cell(row, field), Some(expected.as_str()));
            }
        }
        prop_assert!(BatchValidator::new(["reward"]).validate(&ds).is_ok());
    }

    #[test]
    fn ordering_violation_at_offending_call(
        steps in prop::collection::vec(step_strategy(), 1..20),
        decrease_exp in any::<bool>(),
        back in 1i64..3,
    ) {
        let dir = tempdir().unwrap();
        let input = records(&steps, 3);
        let mut logger = logger(dir.path());
        for r in &input {
            prop_assert!(logger.log_record(r).is_ok());
        }

        let last = input.last().unwrap();
        let exp_num = last.get("exp_num").unwrap().as_int().unwrap();
        let block_num = last.get("block_num").unwrap().as_int().unwrap();
        let (field, offending) = if decrease_exp {
            ("exp_num", record(exp_num - back, block_num, "taska", 0))
        } else {
            ("block_num", record(exp_num, block_num - back, "taska", 0))
        };
        match logger.log_record(&offending) {
            Err(Error::OrderingViolation { field: f, .. }) => prop_assert_eq!(f, field),
            other => prop_assert!(false, "expected OrderingViolation, got {:?}", other),
        }

        // The rejected call leaves the counters where they were.
        prop_assert!(logger.log_record(last).is_ok());
        prop_assert_eq!(logger.stats().records_written, input.len() as u64 + 1);
    }
}
