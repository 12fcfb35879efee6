//! A single-threaded cooperative discrete-event engine.
//!
//! The `Scheduler` keeps the virtual clock of a simulation and a queue of pending wake-ups for
//! the simulation's processes. Each process is identified by a value of type `T` (in practice an
//! `AgentId`). A process suspends itself by asking to be woken some number of ticks in the
//! future; the driver pops due plans with [`Scheduler::next_plan_before`], resumes the process,
//! and re-queues it with the delay it returns.
//!
//! Only one process ever runs at a time and a process can only suspend between plans, so shared
//! state mutated by a process is never observed half-updated by another process.
//!
//! Plans due at the same time are handed out in the order they were added. Correctness of the
//! model never depends on that order, but it makes runs reproducible for a given seed.

use log::trace;

use crate::plan::{Plan, Queue};

pub struct Scheduler<T> {
    plan_queue: Queue<T>,
    current_time: f64,
}

impl<T> Scheduler<T> {
    #[must_use]
    pub fn new() -> Scheduler<T> {
        Scheduler {
            plan_queue: Queue::new(),
            current_time: 0.0,
        }
    }

    /// Schedule `data` to be woken at `time`
    ///
    /// # Panics
    ///
    /// Panics if `time` is NaN, infinite, or earlier than the current time.
    pub fn add_plan(&mut self, time: f64, data: T) {
        assert!(
            !time.is_nan() && !time.is_infinite() && time >= self.current_time,
            "Invalid time value"
        );
        trace!("adding plan at {time}");
        self.plan_queue.add_plan(time, data);
    }

    /// Schedule `data` to be woken `delay` ticks from now
    ///
    /// # Panics
    ///
    /// Panics if `delay` is negative or not finite.
    pub fn add_plan_after(&mut self, delay: f64, data: T) {
        self.add_plan(self.current_time + delay, data);
    }

    #[must_use]
    pub fn get_current_time(&self) -> f64 {
        self.current_time
    }

    /// The earliest pending wake time, if any process is waiting
    #[must_use]
    pub fn next_plan_time(&self) -> Option<f64> {
        self.plan_queue.next_time()
    }

    #[must_use]
    pub fn pending_plans(&self) -> usize {
        self.plan_queue.len()
    }

    /// Pop the earliest plan due strictly before `until` and move the clock to its time
    pub fn next_plan_before(&mut self, until: f64) -> Option<Plan<T>> {
        match self.plan_queue.next_time() {
            Some(time) if time < until => {
                let plan = self.plan_queue.get_next_plan()?;
                self.current_time = plan.time;
                Some(plan)
            }
            _ => None,
        }
    }

    /// Move the clock forward to `time`. Times in the past are ignored.
    pub fn advance_to(&mut self, time: f64) {
        if time > self.current_time {
            self.current_time = time;
        }
    }

    /// Drop every pending plan. The clock keeps its value.
    pub fn shutdown(&mut self) {
        trace!(
            "shutting down scheduler with {} pending plans",
            self.plan_queue.len()
        );
        self.plan_queue.clear();
    }
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    fn drain(scheduler: &mut Scheduler<u32>, until: f64) -> Vec<u32> {
        let mut fired = vec![];
        while let Some(plan) = scheduler.next_plan_before(until) {
            fired.push(plan.data);
        }
        scheduler.advance_to(until);
        fired
    }

    #[test]
    #[should_panic(expected = "Invalid time value")]
    fn negative_plan_time() {
        let mut scheduler = Scheduler::new();
        scheduler.add_plan(-1.0, 0);
    }

    #[test]
    #[should_panic(expected = "Invalid time value")]
    fn infinite_plan_time() {
        let mut scheduler = Scheduler::new();
        scheduler.add_plan(f64::INFINITY, 0);
    }

    #[test]
    #[should_panic(expected = "Invalid time value")]
    fn nan_plan_time() {
        let mut scheduler = Scheduler::new();
        scheduler.add_plan(f64::NAN, 0);
    }

    #[test]
    #[should_panic(expected = "Invalid time value")]
    fn plan_in_the_past() {
        let mut scheduler = Scheduler::new();
        scheduler.advance_to(2.0);
        scheduler.add_plan(1.0, 0);
    }

    #[test]
    fn empty_scheduler() {
        let mut scheduler = Scheduler::<u32>::new();
        assert!(drain(&mut scheduler, 1.0).is_empty());
        assert_eq!(scheduler.get_current_time(), 1.0);
    }

    #[test]
    fn plans_fire_only_before_horizon() {
        let mut scheduler = Scheduler::new();
        scheduler.add_plan(0.0, 1);
        scheduler.add_plan(1.0, 2);
        assert_eq!(drain(&mut scheduler, 1.0), vec![1]);
        assert_eq!(scheduler.get_current_time(), 1.0);
        assert_eq!(drain(&mut scheduler, 2.0), vec![2]);
    }

    #[test]
    fn clock_follows_plans() {
        let mut scheduler = Scheduler::new();
        scheduler.add_plan(3.5, 1);
        let plan = scheduler.next_plan_before(10.0).unwrap();
        assert_eq!(plan.time, 3.5);
        assert_eq!(scheduler.get_current_time(), 3.5);
    }

    #[test]
    fn relative_plans_use_current_time() {
        let mut scheduler = Scheduler::new();
        scheduler.advance_to(4.0);
        scheduler.add_plan_after(2.0, 7);
        assert_eq!(scheduler.next_plan_time(), Some(6.0));
    }

    #[test]
    fn plan_added_while_draining_at_current_time_fires() {
        let mut scheduler = Scheduler::new();
        scheduler.add_plan(0.0, 1);
        let mut fired = vec![];
        while let Some(plan) = scheduler.next_plan_before(1.0) {
            fired.push(plan.data);
            if plan.data == 1 {
                scheduler.add_plan_after(0.0, 2);
                scheduler.add_plan_after(1.0, 3);
            }
        }
        assert_eq!(fired, vec![1, 2]);
        assert_eq!(scheduler.pending_plans(), 1);
    }

    #[test]
    fn plans_at_same_time_fire_in_order() {
        let mut scheduler = Scheduler::new();
        scheduler.add_plan(1.0, 1);
        scheduler.add_plan(1.0, 2);
        assert_eq!(drain(&mut scheduler, 2.0), vec![1, 2]);
    }

    #[test]
    fn advance_never_moves_backwards() {
        let mut scheduler = Scheduler::<u32>::new();
        scheduler.advance_to(5.0);
        scheduler.advance_to(3.0);
        assert_eq!(scheduler.get_current_time(), 5.0);
    }

    #[test]
    fn shutdown_drops_pending_plans() {
        let mut scheduler = Scheduler::new();
        scheduler.add_plan(1.0, 1);
        scheduler.add_plan(2.0, 2);
        scheduler.shutdown();
        assert!(drain(&mut scheduler, 5.0).is_empty());
        assert_eq!(scheduler.get_current_time(), 5.0);
    }
}
