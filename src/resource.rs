/*! Shared-resource request descriptions and the blocking-bound
accumulators that the [`crate::blocking`] and [`crate::lp_blocking`]
families populate.

Grounded directly in `sharedres_types.h`'s `RequestBound` / `TaskInfo` /
`ResourceSharingInfo` / `ResourceLocality` / `ReplicaInfo` /
`Interference` / `BlockingBounds` classes. The one structural change
from the original: `RequestBound` no longer stores a raw `const
TaskInfo*` back-pointer to its owning task. Rust's borrow checker makes
that self-referential shape painful, so a `RequestBound` instead stores
the owning task's index into the enclosing [`ResourceSharingInfo`]'s
task vector, and callers that need the owner look it up by index (see
DESIGN.md, "owner-index back-references").
*/

use std::cmp::Ordering;
use std::ops::{Add, AddAssign};

use crate::time::{Duration, Service};

/// Whether a critical section is a plain mutual-exclusion request
/// (`Write`) or, for reader/writer locks, a shared (`Read`) request.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum RequestType {
    Write,
    Read,
}

impl Default for RequestType {
    fn default() -> Self {
        RequestType::Write
    }
}

/// A bound on one task's requests for a single shared resource: it
/// issues at most `num_requests` requests per job, each held for at
/// most `request_length` time units.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct RequestBound {
    resource_id: usize,
    num_requests: u32,
    request_length: Service,
    /// Index of the owning task within the enclosing
    /// [`ResourceSharingInfo`].
    task_index: usize,
    request_type: RequestType,
    request_priority: u32,
}

impl RequestBound {
    pub fn new(
        resource_id: usize,
        num_requests: u32,
        request_length: Service,
        task_index: usize,
    ) -> Self {
        RequestBound {
            resource_id,
            num_requests,
            request_length,
            task_index,
            request_type: RequestType::Write,
            request_priority: 0,
        }
    }

    pub fn with_type(mut self, t: RequestType) -> Self {
        self.request_type = t;
        self
    }

    pub fn with_priority(mut self, p: u32) -> Self {
        self.request_priority = p;
        self
    }

    pub fn resource_id(&self) -> usize {
        self.resource_id
    }

    pub fn num_requests(&self) -> u32 {
        self.num_requests
    }

    pub fn request_length(&self) -> Service {
        self.request_length
    }

    pub fn request_type(&self) -> RequestType {
        self.request_type
    }

    pub fn request_priority(&self) -> u32 {
        self.request_priority
    }

    pub fn task_index(&self) -> usize {
        self.task_index
    }

    pub fn is_read(&self) -> bool {
        self.request_type == RequestType::Read
    }

    pub fn is_write(&self) -> bool {
        self.request_type == RequestType::Write
    }

    /// The maximum number of requests this task can issue within any
    /// interval of the given length, given the owning task's maximum
    /// number of job releases in that interval.
    pub fn max_num_requests(&self, owner: &TaskInfo, interval: Duration) -> u64 {
        owner.max_num_jobs(interval) * self.num_requests as u64
    }
}

/// A scheduling-relevant summary of one task, used by the blocking
/// analyses (as opposed to [`crate::task::Task`], which is used by the
/// schedulability tests and carries no resource-request information).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TaskInfo {
    priority: u32,
    period: Duration,
    deadline: Duration,
    response: Duration,
    cluster: usize,
    id: usize,
    cost: Service,
    requests: Vec<RequestBound>,
}

impl TaskInfo {
    /// An implicit-deadline task (`deadline == period`).
    pub fn new(
        period: Duration,
        response: Duration,
        cluster: usize,
        priority: u32,
        id: usize,
        cost: Service,
    ) -> Self {
        TaskInfo {
            priority,
            period,
            deadline: period,
            response,
            cluster,
            id,
            cost,
            requests: Vec::new(),
        }
    }

    /// An arbitrary-deadline task.
    pub fn with_deadline(
        period: Duration,
        deadline: Duration,
        response: Duration,
        cluster: usize,
        priority: u32,
        id: usize,
        cost: Service,
    ) -> Self {
        TaskInfo {
            priority,
            period,
            deadline,
            response,
            cluster,
            id,
            cost,
            requests: Vec::new(),
        }
    }

    pub fn add_request(&mut self, resource_id: usize, num: u32, length: Service) {
        let own_index = self.id;
        self.requests
            .push(RequestBound::new(resource_id, num, length, own_index));
    }

    pub fn add_request_rw(
        &mut self,
        resource_id: usize,
        num: u32,
        length: Service,
        rtype: RequestType,
        priority: u32,
    ) {
        let own_index = self.id;
        self.requests.push(
            RequestBound::new(resource_id, num, length, own_index)
                .with_type(rtype)
                .with_priority(priority),
        );
    }

    pub fn requests(&self) -> &[RequestBound] {
        &self.requests
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Smaller value means higher priority (matches the original's
    /// `UINT_MAX`-as-default-lowest-priority convention).
    pub fn priority(&self) -> u32 {
        self.priority
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    pub fn response(&self) -> Duration {
        self.response
    }

    /// A copy of this summary with a different assumed response time.
    /// Used by [`crate::lp_blocking::pedf`]'s arrival-curve/processor-
    /// demand convergence loop to re-probe the same task's LP at windows
    /// other than its own converged response time, without mutating the
    /// original (every other field, including `id`, is unchanged, so the
    /// copy still looks up the same `VarMapper`/contention-set entries).
    pub(crate) fn with_response(&self, response: Duration) -> TaskInfo {
        let mut copy = self.clone();
        copy.response = response;
        copy
    }

    pub fn cluster(&self) -> usize {
        self.cluster
    }

    pub fn cost(&self) -> Service {
        self.cost
    }

    pub fn num_arrivals(&self) -> u64 {
        self.total_num_requests() + 1
    }

    pub fn total_num_requests(&self) -> u64 {
        self.requests.iter().map(|r| r.num_requests() as u64).sum()
    }

    pub fn max_request_length(&self) -> Service {
        self.requests
            .iter()
            .map(RequestBound::request_length)
            .max()
            .unwrap_or(0)
    }

    pub fn num_requests_for(&self, resource_id: usize) -> u32 {
        self.requests
            .iter()
            .find(|r| r.resource_id() == resource_id)
            .map(RequestBound::num_requests)
            .unwrap_or(0)
    }

    pub fn request_length_for(&self, resource_id: usize) -> Service {
        self.requests
            .iter()
            .find(|r| r.resource_id() == resource_id)
            .map(RequestBound::request_length)
            .unwrap_or(0)
    }

    /// The maximum number of this task's jobs that can be released
    /// within any interval of the given length, accounting for a
    /// pending job's response time (`⌈(interval + response) /
    /// period⌉`).
    pub fn max_num_jobs(&self, interval: Duration) -> u64 {
        divide_with_ceil(interval + self.response, self.period)
    }

    /// As [`TaskInfo::max_num_jobs`], but for a task analyzed alone on
    /// its own processor under fixed-priority scheduling, where no
    /// extra response-time term applies.
    pub fn uni_fp_local_max_num_jobs(&self, interval: Duration) -> u64 {
        divide_with_ceil(interval, self.period)
    }

    /// Under EDF priorities, how many jobs of `self` (with a later
    /// deadline than `pending_job`, hence lower priority) can overlap
    /// `pending_job`'s pending interval?
    pub fn edf_max_lower_prio_jobs(&self, pending_job: &TaskInfo) -> u64 {
        if pending_job.response + self.deadline <= pending_job.deadline {
            0
        } else {
            let interval = self.deadline + pending_job.response - pending_job.deadline;
            self.max_num_jobs(interval)
        }
    }

    /// Under fixed priorities, how many jobs of `self` have lower
    /// priority than `pending_job` (either all of them, or none)?
    pub fn fp_max_lower_prio_jobs(&self, pending_job: &TaskInfo) -> u64 {
        if pending_job.priority < self.priority {
            self.max_num_jobs(pending_job.response)
        } else {
            0
        }
    }

    pub fn max_lower_prio_jobs(&self, pending_job: &TaskInfo, using_edf: bool) -> u64 {
        if using_edf {
            self.edf_max_lower_prio_jobs(pending_job)
        } else {
            self.fp_max_lower_prio_jobs(pending_job)
        }
    }

    /// Bertogna's workload bound: the maximum amount of this task's
    /// execution that can occur within an interval of the given
    /// length, accounting for the task's own slack (`deadline -
    /// response`).
    pub fn workload_bound(&self, interval: Duration) -> Service {
        let slack = self.deadline.saturating_sub(self.response);
        let numerator = interval + self.deadline;
        let numerator = numerator
            .saturating_sub(self.cost)
            .saturating_sub(slack);
        let n = numerator / self.period;
        let remainder = numerator - n * self.period;
        n * self.cost + self.cost.min(remainder)
    }
}

/// The fixed-point "ceiling division" used throughout the original
/// analysis code: `⌈a / b⌉`, computed without floating point.
fn divide_with_ceil(a: Duration, b: Duration) -> u64 {
    a / b + (a % b != 0) as u64
}

/// A whole system's worth of [`TaskInfo`] descriptions, built
/// incrementally via [`ResourceSharingInfo::add_task`] /
/// [`ResourceSharingInfo::add_request`], mirroring the original's
/// append-only builder API.
#[derive(Clone, Debug, Default)]
pub struct ResourceSharingInfo {
    tasks: Vec<TaskInfo>,
}

impl ResourceSharingInfo {
    pub fn with_capacity(num_tasks: usize) -> Self {
        ResourceSharingInfo {
            tasks: Vec::with_capacity(num_tasks),
        }
    }

    pub fn tasks(&self) -> &[TaskInfo] {
        &self.tasks
    }

    /// Append a new task (implicit deadline unless `deadline` is
    /// nonzero) and return its index.
    pub fn add_task(
        &mut self,
        period: Duration,
        response: Duration,
        cluster: usize,
        priority: u32,
        cost: Service,
        deadline: Duration,
    ) -> usize {
        let id = self.tasks.len();
        let deadline = if deadline == 0 { period } else { deadline };
        self.tasks
            .push(TaskInfo::with_deadline(period, deadline, response, cluster, priority, id, cost));
        id
    }

    /// Add a plain mutex request to the most recently added task.
    pub fn add_request(&mut self, resource_id: usize, max_num: u32, max_length: Service) {
        let last = self.tasks.last_mut().expect("add_task before add_request");
        last.add_request(resource_id, max_num, max_length);
    }

    /// Add a read/write request to the most recently added task.
    pub fn add_request_rw(
        &mut self,
        resource_id: usize,
        max_num: u32,
        max_length: Service,
        rtype: RequestType,
        priority: u32,
    ) {
        let last = self.tasks.last_mut().expect("add_task before add_request_rw");
        last.add_request_rw(resource_id, max_num, max_length, rtype, priority);
    }
}

/// Sentinel processor id meaning "this resource is not assigned to any
/// processor" (e.g., it is globally accessible or not yet placed).
/// The original used `#define NO_CPU (-1)`; here an `Option<usize>`
/// makes the absence explicit rather than relying on a negative
/// sentinel.
pub type Cpu = Option<usize>;

pub const NO_CPU: Cpu = None;

/// Maps resource ids to the (optional) processor they are local to,
/// for partitioned protocols (DPCP, MPCP's local resources, MSRP).
#[derive(Clone, Debug, Default)]
pub struct ResourceLocality {
    mapping: Vec<Cpu>,
}

impl ResourceLocality {
    pub fn new() -> Self {
        ResourceLocality::default()
    }

    pub fn assign_resource(&mut self, res_id: usize, processor: usize) {
        if self.mapping.len() <= res_id {
            self.mapping.resize(res_id + 1, NO_CPU);
        }
        self.mapping[res_id] = Some(processor);
    }

    pub fn get(&self, res_id: usize) -> Cpu {
        self.mapping.get(res_id).copied().flatten()
    }
}

impl std::ops::Index<usize> for ResourceLocality {
    type Output = Cpu;
    fn index(&self, res_id: usize) -> &Cpu {
        self.mapping.get(res_id).unwrap_or(&NO_CPU)
    }
}

/// Maps resource ids to their replication factor, for replicated
/// shared objects (k-exclusion, RNLP-style protocols).
#[derive(Clone, Debug, Default)]
pub struct ReplicaInfo {
    num_replicas: Vec<u32>,
}

impl ReplicaInfo {
    pub fn new() -> Self {
        ReplicaInfo::default()
    }

    pub fn set_replicas(&mut self, res_id: usize, replicas: u32) {
        assert!(replicas >= 1);
        if self.num_replicas.len() <= res_id {
            self.num_replicas.resize(res_id + 1, 1);
        }
        self.num_replicas[res_id] = replicas;
    }

    pub fn get(&self, res_id: usize) -> u32 {
        self.num_replicas.get(res_id).copied().unwrap_or(1)
    }
}

/// A commutative monoid pairing an interference *count* with its
/// *total length* — the unit every blocking bound is expressed in.
/// Ordered lexicographically by total length, then by count, matching
/// `Interference::operator<` in `sharedres_types.h`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Interference {
    pub count: u64,
    pub total_length: Service,
}

impl Interference {
    pub fn new(count: u64, total_length: Service) -> Self {
        Interference { count, total_length }
    }

    /// A single interfering request of the given length.
    pub fn single(length: Service) -> Self {
        Interference { count: 1, total_length: length }
    }
}

impl Add for Interference {
    type Output = Interference;
    fn add(self, rhs: Self) -> Self::Output {
        Interference {
            count: self.count + rhs.count,
            total_length: self.total_length + rhs.total_length,
        }
    }
}

impl AddAssign for Interference {
    fn add_assign(&mut self, rhs: Self) {
        self.count += rhs.count;
        self.total_length += rhs.total_length;
    }
}

impl std::iter::Sum for Interference {
    fn sum<I: Iterator<Item = Interference>>(iter: I) -> Self {
        iter.fold(Interference::default(), Add::add)
    }
}

impl PartialOrd for Interference {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Interference {
    fn cmp(&self, other: &Self) -> Ordering {
        self.total_length
            .cmp(&other.total_length)
            .then(self.count.cmp(&other.count))
    }
}

/// Per-task blocking-bound accumulators, indexed by task index into
/// the [`ResourceSharingInfo`] the analysis was run over. This is the
/// output type every function in [`crate::blocking`] and
/// [`crate::lp_blocking`] produces.
#[derive(Clone, Debug)]
pub struct BlockingBounds {
    blocking: Vec<Interference>,
    request_span: Vec<Interference>,
    arrival: Vec<Interference>,
    remote: Vec<Interference>,
    local: Vec<Interference>,
}

impl BlockingBounds {
    pub fn new(num_tasks: usize) -> Self {
        BlockingBounds {
            blocking: vec![Interference::default(); num_tasks],
            request_span: vec![Interference::default(); num_tasks],
            arrival: vec![Interference::default(); num_tasks],
            remote: vec![Interference::default(); num_tasks],
            local: vec![Interference::default(); num_tasks],
        }
    }

    pub fn for_info(info: &ResourceSharingInfo) -> Self {
        BlockingBounds::new(info.tasks().len())
    }

    pub fn size(&self) -> usize {
        self.blocking.len()
    }

    pub fn raise_request_span(&mut self, idx: usize, val: Interference) {
        self.request_span[idx] = self.request_span[idx].max(val);
    }

    pub fn max_request_span(&self, idx: usize) -> Interference {
        self.request_span[idx]
    }

    pub fn raise_blocking_length(&mut self, idx: usize, val: Interference) {
        self.blocking[idx] = self.blocking[idx].max(val);
    }

    pub fn blocking_term(&self, idx: usize) -> Service {
        self.blocking[idx].total_length
    }

    pub fn blocking_count(&self, idx: usize) -> u64 {
        self.blocking[idx].count
    }

    pub fn span_term(&self, idx: usize) -> Service {
        self.request_span[idx].total_length
    }

    pub fn span_count(&self, idx: usize) -> u64 {
        self.request_span[idx].count
    }

    pub fn raw_remote_blocking(&self, idx: usize) -> Interference {
        self.remote[idx]
    }

    pub fn remote_blocking(&self, idx: usize) -> Service {
        self.remote[idx].total_length
    }

    pub fn remote_count(&self, idx: usize) -> u64 {
        self.remote[idx].count
    }

    pub fn set_remote_blocking(&mut self, idx: usize, inf: Interference) {
        self.remote[idx] = inf;
    }

    pub fn local_blocking(&self, idx: usize) -> Service {
        self.local[idx].total_length
    }

    pub fn local_count(&self, idx: usize) -> u64 {
        self.local[idx].count
    }

    pub fn set_local_blocking(&mut self, idx: usize, inf: Interference) {
        self.local[idx] = inf;
    }

    pub fn arrival_blocking(&self, idx: usize) -> Service {
        self.arrival[idx].total_length
    }

    pub fn set_arrival_blocking(&mut self, idx: usize, inf: Interference) {
        self.arrival[idx] = inf;
    }
}

impl std::ops::Index<usize> for BlockingBounds {
    type Output = Interference;
    fn index(&self, idx: usize) -> &Interference {
        &self.blocking[idx]
    }
}

impl std::ops::IndexMut<usize> for BlockingBounds {
    fn index_mut(&mut self, idx: usize) -> &mut Interference {
        &mut self.blocking[idx]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interference_addition_sums_both_fields() {
        let a = Interference::new(2, 10);
        let b = Interference::new(3, 5);
        assert_eq!(a + b, Interference::new(5, 15));
    }

    #[test]
    fn interference_orders_by_length_then_count() {
        let short_many = Interference::new(10, 5);
        let long_one = Interference::new(1, 6);
        assert!(short_many < long_one);

        let a = Interference::new(1, 5);
        let b = Interference::new(2, 5);
        assert!(a < b);
    }

    #[test]
    fn resource_locality_defaults_to_no_cpu() {
        let mut loc = ResourceLocality::new();
        assert_eq!(loc.get(3), None);
        loc.assign_resource(3, 1);
        assert_eq!(loc.get(3), Some(1));
        assert_eq!(loc.get(0), None);
    }

    #[test]
    fn replica_info_defaults_to_one() {
        let mut rep = ReplicaInfo::new();
        assert_eq!(rep.get(5), 1);
        rep.set_replicas(5, 3);
        assert_eq!(rep.get(5), 3);
    }

    #[test]
    fn blocking_bounds_raise_only_increases() {
        let mut bb = BlockingBounds::new(2);
        bb.raise_blocking_length(0, Interference::new(1, 10));
        bb.raise_blocking_length(0, Interference::new(5, 3));
        assert_eq!(bb.blocking_term(0), 10);
        bb.raise_blocking_length(0, Interference::new(1, 20));
        assert_eq!(bb.blocking_term(0), 20);
    }

    #[test]
    fn task_info_max_num_jobs_matches_ceiling_division() {
        let t = TaskInfo::new(10, 3, 0, 0, 0, 2);
        assert_eq!(t.max_num_jobs(27), 3);
        assert_eq!(t.max_num_jobs(7), 1);
    }

    #[test]
    fn resource_sharing_info_builds_task_with_requests() {
        let mut info = ResourceSharingInfo::with_capacity(1);
        info.add_task(10, 3, 0, 0, 2, 0);
        info.add_request(0, 1, 2);
        assert_eq!(info.tasks()[0].total_num_requests(), 1);
        assert_eq!(info.tasks()[0].deadline(), 10);
    }
}
