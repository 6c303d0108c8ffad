//! The job queue (§4.8): a FIFO of pending microtasks. `enqueue` links at
//! the tail; `pump` runs jobs until empty. A job must not throw
//! synchronously out of the pump — any error it returns is captured and
//! routed to the host error-dump hook instead of propagating.

use std::collections::VecDeque;

use crate::context::Context;
use crate::error::JsError;

/// One queued unit of work. Boxed so the queue can hold promise reaction
/// jobs, then-jobs, and finalizer jobs side by side without an enum per
/// caller (`boa_engine::builtins::promise::promise_job`'s `PromiseJob`
/// plays the same role as a closure there).
pub struct Job {
    name: &'static str,
    run: Box<dyn FnOnce(&mut Context) -> Result<(), JsError>>,
}

impl Job {
    pub fn new(name: &'static str, run: impl FnOnce(&mut Context) -> Result<(), JsError> + 'static) -> Self {
        Job { name, run: Box::new(run) }
    }
}

/// FIFO microtask queue (§4.8). Owned by [`Context`], drained by `pump`
/// between synchronous turns of the host's event loop.
#[derive(Default)]
pub struct JobQueue {
    jobs: VecDeque<Job>,
}

impl JobQueue {
    pub fn enqueue(&mut self, job: Job) {
        self.jobs.push_back(job);
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    fn pop(&mut self) -> Option<Job> {
        self.jobs.pop_front()
    }
}

impl Context {
    /// Runs queued jobs until the queue is empty, including any jobs a
    /// running job itself enqueues. A job erroring is reported through
    /// `tracing` rather than aborting the pump (spec §4.8: "must not throw
    /// synchronously out of the pump").
    pub fn run_jobs(&mut self) {
        loop {
            let Some(job) = self.jobs.pop() else { break };
            tracing::trace!(job = job.name, "running queued job");
            if let Err(err) = (job.run)(self) {
                tracing::error!(job = job.name, error = %err, "uncaught error from queued job");
            }
        }
    }

    pub fn enqueue_job(&mut self, job: Job) {
        self.jobs.enqueue(job);
    }

    pub fn pending_jobs(&self) -> usize {
        self.jobs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{JsObject, ObjectKind};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn test_context() -> Context {
        Context::new(JsObject::new(ObjectKind::Ordinary, None), 16)
    }

    #[test]
    fn jobs_run_in_fifo_order() {
        let mut ctx = test_context();
        let order = Rc::new(RefCell::new(Vec::new()));
        for i in 0..3 {
            let order = order.clone();
            ctx.enqueue_job(Job::new("test", move |_ctx| {
                order.borrow_mut().push(i);
                Ok(())
            }));
        }
        assert_eq!(ctx.pending_jobs(), 3);
        ctx.run_jobs();
        assert_eq!(ctx.pending_jobs(), 0);
        assert_eq!(*order.borrow(), vec![0, 1, 2]);
    }

    #[test]
    fn a_job_that_enqueues_another_job_is_drained_too() {
        let mut ctx = test_context();
        let ran = Rc::new(RefCell::new(false));
        let ran_inner = ran.clone();
        ctx.enqueue_job(Job::new("outer", move |ctx| {
            let ran_inner = ran_inner.clone();
            ctx.enqueue_job(Job::new("inner", move |_ctx| {
                *ran_inner.borrow_mut() = true;
                Ok(())
            }));
            Ok(())
        }));
        ctx.run_jobs();
        assert!(*ran.borrow());
    }

    #[test]
    fn an_erroring_job_does_not_stop_the_pump() {
        let mut ctx = test_context();
        let ran = Rc::new(RefCell::new(false));
        let ran_second = ran.clone();
        ctx.enqueue_job(Job::new("fails", |ctx| Err(ctx.throw(crate::error::ErrorKind::Error, "boom"))));
        ctx.enqueue_job(Job::new("second", move |_ctx| {
            *ran_second.borrow_mut() = true;
            Ok(())
        }));
        ctx.run_jobs();
        assert!(*ran.borrow());
    }
}
