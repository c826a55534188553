use crate::state::CrawlState;
use crate::task::Task;

/// Receiver of the tasks an extractor emits for one response
pub trait TaskSink {
    fn emit(&mut self, state: CrawlState, task: Task);
}

impl TaskSink for Vec<(CrawlState, Task)> {
    fn emit(&mut self, state: CrawlState, task: Task) {
        self.push((state, task));
    }
}

/// Adapts a closure into a `TaskSink`
pub struct FnSink<F>(pub F);

impl<F> TaskSink for FnSink<F>
where
    F: FnMut(CrawlState, Task),
{
    fn emit(&mut self, state: CrawlState, task: Task) {
        (self.0)(state, task)
    }
}
