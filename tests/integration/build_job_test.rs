//! Integration tests for build-job execution.
//!
//! These tests are implemented in:
//! `crates/gradebox-runtime/tests/build_job_test.rs`
//!
//! Covered scenarios:
//! - `mixed_results_yield_failed_and_passed_sequences`: One passing and one failing report
//! - `missing_results_path_aborts_without_a_report`: Missing results directory aborts the job
//! - `script_timeout_aborts_and_tears_down_once`: Hung script times out, container still removed
//! - `malformed_report_aborts_the_whole_job`: Unparseable report never yields a partial result
//! - `non_zero_script_exit_is_advisory_not_fatal`: Exit code recorded, not folded into success
//! - `create_spec_mounts_env_and_keep_alive`: Bind mounts, environment, sentinel keep-alive
//! - `sentinel_touch_is_issued_after_extraction`: Foreground process released after extraction
