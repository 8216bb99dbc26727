/*! The sporadic task model and demand-/load-bound functions.

Grounded in `tasks.h`'s `Task`/`TaskSet` classes: cost, period, relative
deadline, priority point, self-suspension, and tardiness threshold, plus
the demand-bound function (with and without carry-in) and their
k-job-exact approximations.
*/

use dashu::integer::UBig;

use crate::time::{Duration, Service, TimeExt};

/// A single sporadic (or periodic, as the special case `D == T`) real-time
/// task.
///
/// Invariants (checked by [`Task::is_feasible`], not enforced at
/// construction — callers may build intermediate, momentarily
/// inconsistent task descriptions, as the original did):
/// - `cost > 0`
/// - `deadline >= cost + self_suspension`
/// - `period >= cost + self_suspension`
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Task {
    /// Worst-case execution cost, *C*.
    pub cost: Service,
    /// Minimum inter-arrival time, *T*.
    pub period: Duration,
    /// Relative deadline, *D*. Defaults to `period` via [`Task::new`].
    pub deadline: Duration,
    /// Priority point, *P*, used by priority-point-aware schedulers
    /// (e.g. GEL-PL). Defaults to `deadline`.
    pub priority_point: Duration,
    /// Maximum cumulative self-suspension time, *S*.
    pub self_suspension: Duration,
    /// Tardiness threshold, *Δ* — the maximum amount of deadline miss
    /// tolerated by "bounded-tardiness" tests. Zero for hard real-time
    /// analyses.
    pub tardiness_threshold: Duration,
}

impl Task {
    /// Construct an implicit-deadline periodic task (`deadline ==
    /// period`, `priority_point == deadline`, no self-suspension, no
    /// tardiness tolerance).
    pub fn new(cost: Service, period: Duration) -> Self {
        Task {
            cost,
            period,
            deadline: period,
            priority_point: period,
            self_suspension: Duration::zero(),
            tardiness_threshold: Duration::zero(),
        }
    }

    /// Builder: override the relative deadline (and, unless already
    /// customized, the priority point).
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        if self.priority_point == self.period {
            self.priority_point = deadline;
        }
        self
    }

    /// Builder: override the self-suspension bound.
    pub fn with_self_suspension(mut self, s: Duration) -> Self {
        self.self_suspension = s;
        self
    }

    /// Builder: override the priority point directly (e.g., for
    /// GEL-PL-style analyses where the priority point need not equal
    /// the deadline).
    pub fn with_priority_point(mut self, p: Duration) -> Self {
        self.priority_point = p;
        self
    }

    /// `D <= T`.
    pub fn has_constrained_deadline(&self) -> bool {
        self.deadline <= self.period
    }

    /// `D == T`.
    pub fn has_implicit_deadline(&self) -> bool {
        self.deadline == self.period
    }

    /// `S > 0`.
    pub fn is_self_suspending(&self) -> bool {
        self.self_suspension.is_non_zero()
    }

    /// `C > 0 && D >= C + S && T >= C + S`.
    pub fn is_feasible(&self) -> bool {
        self.cost.is_non_zero()
            && self.deadline >= self.cost + self.self_suspension
            && self.period >= self.cost + self.self_suspension
    }

    /// Utilization, *C/T*.
    pub fn utilization(&self) -> f64 {
        self.cost as f64 / self.period as f64
    }

    /// Density, *C/D*.
    pub fn density(&self) -> f64 {
        self.cost as f64 / self.deadline as f64
    }

    /// The demand-bound function, dbf(*t*) = max(0, (⌊(*t*−*D*)/*T*⌋+1)·*C*).
    ///
    /// Returns zero for any `t < deadline`.
    pub fn dbf(&self, t: Duration) -> Service {
        if t < self.deadline {
            0
        } else {
            let njobs = (t - self.deadline) / self.period + 1;
            njobs * self.cost
        }
    }

    /// The "carry-in" demand-bound variant,
    /// δ(*t*) = (⌈*t*/*T*⌉−1)·*C* + min(*C*, *t* − (⌈*t*/*T*⌉−1)·*T*).
    ///
    /// Bounds the demand of a task that may have already been
    /// partially served before the start of the analysis window
    /// (i.e., a job released strictly before time zero may still
    /// contribute).
    pub fn dbf_with_carry_in(&self, t: Duration) -> Service {
        if t.is_zero() {
            return 0;
        }
        let ceil_t_over_p = (t + self.period - 1) / self.period;
        let prior_jobs = ceil_t_over_p.saturating_sub(1);
        let elapsed = t.saturating_sub(prior_jobs * self.period);
        prior_jobs * self.cost + self.cost.min(elapsed)
    }

    /// A *k*-job exact, then-linear upper bound on demand: the first
    /// `max_jobs` jobs are accounted for exactly via [`Task::dbf`], and
    /// any further demand is upper-bounded by extending the last exact
    /// job's slope (`utilization * (t - t_k)`), matching `tasks.h`'s
    /// `approx_demand` PTAS.
    pub fn approx_dbf(&self, t: Duration, max_jobs: u64) -> Service {
        let t_k = self.deadline + self.period * max_jobs.saturating_sub(1);
        if t <= t_k {
            self.dbf(t)
        } else {
            let exact = self.dbf(t_k);
            let extra = t - t_k;
            exact + ((extra as f64) * self.utilization()).ceil() as u64
        }
    }

    /// An exact big-integer demand bound, used where the analysis
    /// horizon `t` may be large enough that `njobs * cost` risks
    /// overflowing 64 bits (see SPEC_FULL.md §4.1).
    pub fn dbf_bigint(&self, t: Duration) -> UBig {
        if t < self.deadline {
            UBig::from(0u8)
        } else {
            let njobs = UBig::from((t - self.deadline) / self.period + 1);
            njobs * UBig::from(self.cost)
        }
    }

    /// The load bound, `cost / max(1, period - deadline + cost)` style
    /// ratio used by the LOAD test family; here realized directly as
    /// `dbf(t) / t` maximized implicitly by the caller over relevant
    /// test points (see [`TaskSet::approx_load`]).
    pub fn bound_load(&self, t: Duration) -> f64 {
        if t.is_zero() {
            0.0
        } else {
            self.dbf(t) as f64 / t as f64
        }
    }
}

/// An ordered collection of [`Task`]s.
#[derive(Clone, Debug, Default)]
pub struct TaskSet {
    tasks: Vec<Task>,
}

impl TaskSet {
    pub fn new() -> Self {
        TaskSet { tasks: Vec::new() }
    }

    pub fn from_tasks(tasks: Vec<Task>) -> Self {
        TaskSet { tasks }
    }

    pub fn add_task(&mut self, t: Task) -> usize {
        self.tasks.push(t);
        self.tasks.len() - 1
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }

    pub fn has_only_implicit_deadlines(&self) -> bool {
        self.tasks.iter().all(Task::has_implicit_deadline)
    }

    pub fn has_only_constrained_deadlines(&self) -> bool {
        self.tasks.iter().all(Task::has_constrained_deadline)
    }

    pub fn has_only_feasible_tasks(&self) -> bool {
        self.tasks.iter().all(Task::is_feasible)
    }

    pub fn has_no_self_suspending_tasks(&self) -> bool {
        !self.tasks.iter().any(Task::is_self_suspending)
    }

    pub fn utilization(&self) -> f64 {
        self.tasks.iter().map(Task::utilization).sum()
    }

    pub fn density(&self) -> f64 {
        self.tasks.iter().map(Task::density).sum()
    }

    pub fn max_density(&self) -> f64 {
        self.tasks
            .iter()
            .map(Task::density)
            .fold(0.0, f64::max)
    }

    /// `true` iff utilization does not exceed the number of processors
    /// (a necessary condition for schedulability on *m* processors).
    pub fn is_not_overutilized(&self, num_processors: usize) -> bool {
        self.utilization() <= num_processors as f64 + 1e-9
    }

    /// Aggregate demand-bound function, the sum of each task's
    /// [`Task::dbf`].
    pub fn bound_demand(&self, t: Duration) -> Service {
        self.tasks.iter().map(|tsk| tsk.dbf(t)).sum()
    }

    /// ε-approximate load: the maximum, over the FBB-style test points
    /// up to a horizon determined by `epsilon`, of `bound_demand(t) /
    /// t`. Grounded in `tasks.h`'s `TaskSet::approx_load`.
    ///
    /// The search is bounded because for `t` beyond
    /// `max_deadline / epsilon`, the load ratio cannot exceed the
    /// overall utilization by more than `epsilon` (a standard FBB-style
    /// argument), so it suffices to sample deadlines and their period
    /// multiples up to that horizon.
    pub fn approx_load(&self, epsilon: f64) -> f64 {
        if self.tasks.is_empty() {
            return 0.0;
        }
        let max_deadline = self.tasks.iter().map(|t| t.deadline).max().unwrap_or(0);
        let horizon = ((max_deadline as f64) / epsilon.max(1e-6)).ceil() as u64;
        let mut points: Vec<Duration> = Vec::new();
        for t in &self.tasks {
            let mut d = t.deadline;
            while d <= horizon {
                points.push(d);
                d += t.period;
            }
        }
        points.sort_unstable();
        points.dedup();
        points
            .iter()
            .map(|&t| self.bound_load(t))
            .fold(0.0, f64::max)
    }

    fn bound_load(&self, t: Duration) -> f64 {
        if t.is_zero() {
            0.0
        } else {
            self.bound_demand(t) as f64 / t as f64
        }
    }
}

impl std::ops::Index<usize> for TaskSet {
    type Output = Task;
    fn index(&self, idx: usize) -> &Task {
        &self.tasks[idx]
    }
}

impl FromIterator<Task> for TaskSet {
    fn from_iter<I: IntoIterator<Item = Task>>(iter: I) -> Self {
        TaskSet::from_tasks(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn implicit_deadline_task_is_feasible() {
        let t = Task::new(4, 10);
        assert!(t.is_feasible());
        assert!(t.has_implicit_deadline());
        assert!(t.has_constrained_deadline());
        assert_eq!(t.utilization(), 0.4);
    }

    #[test]
    fn zero_cost_task_is_infeasible() {
        let t = Task::new(0, 10);
        assert!(!t.is_feasible());
    }

    #[test]
    fn dbf_is_zero_before_deadline_and_steps_at_deadline() {
        let t = Task::new(4, 10);
        assert_eq!(t.dbf(0), 0);
        assert_eq!(t.dbf(9), 0);
        assert_eq!(t.dbf(10), 4);
        assert_eq!(t.dbf(19), 4);
        assert_eq!(t.dbf(20), 8);
    }

    #[test]
    fn gfb_scenario_s1_density_and_bound() {
        // spec.md S1: two tasks C=4,T=10 and C=3,T=10 on m=2.
        let ts = TaskSet::from_tasks(vec![Task::new(4, 10), Task::new(3, 10)]);
        assert_eq!(ts.density(), 0.7);
        assert_eq!(ts.max_density(), 0.4);
        let m = 2;
        let bound = m as f64 - (m as f64 - 1.0) * ts.max_density();
        assert!((bound - 1.6).abs() < 1e-9);
        assert!(ts.density() <= bound);
    }

    #[test]
    fn single_core_dt_c_task_is_feasible_but_not_on_zero_cores() {
        let t = Task::new(5, 5);
        assert!(t.is_feasible());
        let ts = TaskSet::from_tasks(vec![t]);
        assert!(ts.is_not_overutilized(1));
        assert!(!ts.is_not_overutilized(0));
    }

    #[test]
    fn empty_taskset_is_trivially_schedulable_by_every_metric() {
        let ts = TaskSet::new();
        assert!(ts.is_empty());
        assert_eq!(ts.utilization(), 0.0);
        assert!(ts.is_not_overutilized(0));
    }
}
