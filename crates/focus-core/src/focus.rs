use crate::task::Task;

/// Picks the current focus: the incomplete task with the latest `created_at`.
///
/// When several incomplete tasks share that timestamp, the one earliest in
/// list order wins, which is the head of a stable descending sort.
pub fn select_focus(tasks: &[Task]) -> Option<&Task> {
    tasks
        .iter()
        .filter(|task| task.is_pending())
        .fold(None, |best: Option<&Task>, task| match best {
            Some(current) if current.created_at >= task.created_at => Some(current),
            _ => Some(task),
        })
}
