//! Batch driver integration tests
//!
//! Runs whole trial-list files through ordering, writing and checking.

use std::fmt::Write as _;
use std::path::Path;

use stimorder::commands::{check_file, order_batch, order_file, CheckOptions};
use stimorder::table::{discover_inputs, output_path};
use stimorder::{Config, RowTable};
use tempfile::TempDir;

/// A list in the layout of the experiment's stimulus files.
fn list_csv() -> String {
    let mut csv = String::from("ItemNum,Type,ExpCondition,HasQuestion,Answer,Sentence\n");
    for i in 0..12 {
        let (has_q, answer) = match i % 4 {
            0 => ("Yes", "True"),
            2 => ("Yes", "False"),
            _ => ("", ""),
        };
        writeln!(
            csv,
            "{},Filler,Filler{},{},{},Filler sentence {}.",
            100 + i,
            i % 3,
            has_q,
            answer,
            i
        )
        .unwrap();
    }
    for i in 0..12 {
        let condition = if i % 2 == 0 { "HighExp" } else { "LowExp" };
        let (has_q, answer) = match i % 4 {
            1 => ("Yes", "False"),
            2 => ("Yes", "True"),
            _ => ("", "NoQ"),
        };
        writeln!(
            csv,
            "{},Item,{},{},{},Item sentence {}.",
            i + 1,
            condition,
            has_q,
            answer,
            i
        )
        .unwrap();
    }
    csv
}

fn write_list(dir: &Path, name: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, list_csv()).unwrap();
    path
}

fn config(orders: usize) -> Config {
    Config {
        orders,
        ..Config::default()
    }
}

// =============================================================================
// Single file
// =============================================================================

mod single_file_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_order_file_writes_all_orders() {
        let temp = TempDir::new().unwrap();
        let input = write_list(temp.path(), "list1.csv");
        let config = config(3);
        let plan = config.order_plan().unwrap();

        let outcome = order_file(&input, &config, &plan, config.orders, config.seed).unwrap();
        assert_eq!(outcome.output, temp.path().join("list1_pseudorandomized.csv"));
        assert_eq!(outcome.orders, 3);
        assert_eq!(outcome.rows, 24);

        let written = RowTable::from_orders_path(&outcome.output, &config.table).unwrap();
        assert_eq!(written.len(), 72);
        assert_eq!(written.headers().last().map(String::as_str), Some("Group"));

        let groups = written.groups("Group");
        let labels: Vec<&str> = groups.iter().map(|(l, _)| l.as_str()).collect();
        assert_eq!(labels, vec!["1", "2", "3"]);

        // Same anchor row opens every order
        let anchors: Vec<String> = groups
            .iter()
            .map(|(_, rows)| rows[0].id().to_string())
            .collect();
        assert!(anchors.iter().all(|a| a == &anchors[0]));
    }

    #[test]
    fn test_written_orders_pass_check() {
        let temp = TempDir::new().unwrap();
        let input = write_list(temp.path(), "list1.csv");
        let config = config(4);
        let plan = config.order_plan().unwrap();
        let outcome = order_file(&input, &config, &plan, config.orders, 9).unwrap();

        let options = CheckOptions {
            file: outcome.output,
            group_column: None,
            skip: 0,
            json: false,
        };
        let reports = check_file(&options, &config).unwrap();
        assert_eq!(reports.len(), 4);
        for report in reports {
            assert!(report.is_clean(), "{report:?}");
            assert_eq!(report.rows, 24);
        }
    }

    #[test]
    fn test_check_reports_bad_order() {
        let temp = TempDir::new().unwrap();
        // Input order is grouped by type: 12 fillers in a row
        let input = write_list(temp.path(), "list1.csv");
        let config = config(1);

        let options = CheckOptions {
            file: input,
            group_column: None,
            skip: 0,
            json: false,
        };
        let reports = check_file(&options, &config).unwrap();
        assert_eq!(reports.len(), 1);
        assert!(reports[0]
            .violations
            .iter()
            .any(|v| v.property == "Type" && v.value == "Filler" && v.run_length == 12));
    }

    #[test]
    fn test_reruns_are_byte_identical() {
        let temp = TempDir::new().unwrap();
        let input = write_list(temp.path(), "list1.csv");
        let config = config(2);
        let plan = config.order_plan().unwrap();

        let out = order_file(&input, &config, &plan, 2, 42).unwrap().output;
        let first = std::fs::read(&out).unwrap();
        order_file(&input, &config, &plan, 2, 42).unwrap();
        let second = std::fs::read(&out).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_absent_markers_written_back_verbatim() {
        let temp = TempDir::new().unwrap();
        let input = write_list(temp.path(), "list1.csv");
        let config = config(1);
        let plan = config.order_plan().unwrap();
        let out = order_file(&input, &config, &plan, 1, 42).unwrap().output;

        let text = std::fs::read_to_string(out).unwrap();
        assert!(text.contains(",Item,HighExp,No,NoQ,Item sentence 0.,1"));
    }
}

// =============================================================================
// Batches
// =============================================================================

mod batch_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_failing_file_does_not_stop_batch() {
        let temp = TempDir::new().unwrap();
        write_list(temp.path(), "a_list.csv");
        std::fs::write(temp.path().join("b_broken.csv"), "Item,Type\n1,Filler\n").unwrap();
        write_list(temp.path(), "c_list.csv");

        let config = config(2);
        let plan = config.order_plan().unwrap();
        let files = discover_inputs(&[temp.path().to_path_buf()], &config.output_suffix).unwrap();
        assert_eq!(files.len(), 3);

        let summary = order_batch(&files, &config, &plan);

        assert_eq!(summary.succeeded.len(), 2);
        assert_eq!(summary.failed.len(), 1);
        assert!(summary.failed[0].0.ends_with("b_broken.csv"));
        assert!(summary.failed[0].1.as_config().is_some());

        assert!(output_path(&temp.path().join("a_list.csv"), &config.output_suffix).exists());
        assert!(output_path(&temp.path().join("c_list.csv"), &config.output_suffix).exists());
        assert!(!output_path(&temp.path().join("b_broken.csv"), &config.output_suffix).exists());
    }

    #[test]
    fn test_infeasible_file_reports_retry_count() {
        let temp = TempDir::new().unwrap();
        let input = write_list(temp.path(), "list1.csv");
        let config = Config {
            constraints: stimorder::validate_constraints([("Type", 1)]).unwrap(),
            retry_limit: 4,
            ..Config::default()
        };
        let plan = config.order_plan().unwrap();

        let summary = order_batch(&[input.clone()], &config, &plan);
        assert!(summary.succeeded.is_empty());

        let (file, error) = &summary.failed[0];
        assert_eq!(file, &input);
        match error {
            stimorder::Error::Pseudorandomization { context, attempts } => {
                assert!(context.contains("list1.csv"));
                assert_eq!(*attempts, 4);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!output_path(&input, &config.output_suffix).exists());
    }
}

// =============================================================================
// Order command
// =============================================================================

mod order_command_tests {
    use super::*;
    use stimorder::commands::{execute_order, OrderOptions};
    use stimorder::ConfigError;

    #[test]
    fn test_constraints_file_defines_main_set() {
        let temp = TempDir::new().unwrap();
        let input = write_list(temp.path(), "list1.csv");
        let constraints = temp.path().join("pseudorandomization_constraints.txt");
        std::fs::write(&constraints, "Constraint Type 3\n").unwrap();

        let options = OrderOptions {
            inputs: vec![input.clone()],
            constraints_file: Some(constraints.clone()),
            ..OrderOptions::default()
        };
        let summary = execute_order(options, Config::default()).unwrap();
        assert_eq!(summary.succeeded.len(), 1);

        let check_config = Config {
            constraints_file: Some(constraints),
            ..Config::default()
        };
        let check = CheckOptions {
            file: output_path(&input, &check_config.output_suffix),
            group_column: None,
            skip: 0,
            json: false,
        };
        let reports = check_file(&check, &check_config).unwrap();
        assert!(reports.iter().all(|r| r.is_clean()));
    }

    #[test]
    fn test_zero_orders_rejected_before_writing() {
        let temp = TempDir::new().unwrap();
        let input = write_list(temp.path(), "list1.csv");

        let options = OrderOptions {
            inputs: vec![input.clone()],
            orders: Some(0),
            ..OrderOptions::default()
        };
        let err = execute_order(options, Config::default()).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ConfigError>(),
            Some(&ConfigError::ZeroOrders)
        );
        assert!(!output_path(&input, "_pseudorandomized").exists());
    }
}
