//! Fan-out/join execution of independent per-sample stage instances
//!

use std::sync::mpsc::channel;

use log::error;

use crate::error::PipelineError;

/// One fan-out work item: a task label (usually a sample name) plus the action to run
pub struct FanOutTask<'a> {
    pub label: String,
    pub action: Box<dyn FnOnce() -> Result<(), PipelineError> + Send + 'a>,
}

impl<'a> FanOutTask<'a> {
    pub fn new<F>(label: &str, action: F) -> Self
    where
        F: FnOnce() -> Result<(), PipelineError> + Send + 'a,
    {
        Self {
            label: label.to_string(),
            action: Box::new(action),
        }
    }
}

/// Launch all tasks concurrently and block until every task has resolved
///
/// No task is cancelled when a sibling fails: every launched task runs to completion so that
/// partially written artifacts are never abandoned by a half-stopped worker. After the join,
/// every failure is logged with its task label and the stage fails with the first error in
/// task launch order.
///
pub fn run_fan_out(
    stage_name: &str,
    tasks: Vec<FanOutTask>,
) -> Result<(), PipelineError> {
    let worker_pool = rayon::ThreadPoolBuilder::new()
        .num_threads(tasks.len())
        .build()
        .unwrap();

    let (tx, rx) = channel();

    worker_pool.scope(move |scope| {
        for (task_index, task) in tasks.into_iter().enumerate() {
            let tx = tx.clone();
            scope.spawn(move |_| {
                let result = (task.action)();
                tx.send((task_index, task.label, result)).unwrap();
            });
        }
    });

    let mut results = rx.into_iter().collect::<Vec<_>>();
    results.sort_by_key(|(task_index, _, _)| *task_index);

    let mut failed_labels = Vec::new();
    let mut first_error = None;
    for (_, label, result) in results {
        if let Err(err) = result {
            error!("Stage {stage_name}: task '{label}' failed: {err}");
            if first_error.is_none() {
                first_error = Some(err);
            }
            failed_labels.push(label);
        }
    }

    match first_error {
        None => Ok(()),
        Some(source) => Err(PipelineError::FanOut {
            stage: stage_name.to_string(),
            failed: failed_labels,
            source: Box::new(source),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    fn count_task<'a>(label: &str, counter: &'a AtomicUsize) -> FanOutTask<'a> {
        FanOutTask::new(label, move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }

    fn fail_task<'a>(label: &str, counter: &'a AtomicUsize) -> FanOutTask<'a> {
        let owned_label = label.to_string();
        FanOutTask::new(label, move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(PipelineError::stage_execution(
                &owned_label,
                "induced task failure".to_string(),
            ))
        })
    }

    #[test]
    fn test_run_fan_out_all_success() {
        let counter = AtomicUsize::new(0);
        let tasks = vec![
            count_task("s1", &counter),
            count_task("s2", &counter),
            count_task("s3", &counter),
        ];

        assert!(run_fan_out("test", tasks).is_ok());
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_run_fan_out_reports_all_failures() {
        let counter = AtomicUsize::new(0);
        let tasks = vec![
            count_task("s1", &counter),
            fail_task("s2", &counter),
            fail_task("s3", &counter),
        ];

        let result = run_fan_out("test", tasks);

        // Siblings of a failed task are never cancelled, all tasks reach resolution
        assert_eq!(counter.load(Ordering::SeqCst), 3);

        match result {
            Err(PipelineError::FanOut { failed, source, .. }) => {
                assert_eq!(failed, vec!["s2".to_string(), "s3".to_string()]);

                // The representative cause is the first failure in task launch order
                match *source {
                    PipelineError::StageExecution { stage, .. } => assert_eq!(stage, "s2"),
                    other => panic!("unexpected fan-out source: {other}"),
                }
            }
            other => panic!("unexpected fan-out result: {other:?}"),
        }
    }
}
