/*! Named filtered-iterator helpers and contention-set construction.

The original analysis code (`lp_common.h`, `blocking.h`) leans on a
family of `foreach_*` C preprocessor macros to iterate over tasks and
requests matching some predicate (same cluster, lower-or-equal
priority, excluding the reference task, and so on). Rust has no
macro-based `for`-loop-with-built-in-filter idiom, so each macro here
becomes a named function returning a plain iterator; call sites read
almost identically (`tasks_except(&info, ti).map(...)` instead of
`foreach_task_except(tasks, ti, it) { ... }`).
*/

use crate::resource::{Interference, RequestBound, ResourceLocality, ResourceSharingInfo, TaskInfo};

/// All tasks other than `reference`.
pub fn tasks_except<'a>(
    tasks: &'a [TaskInfo],
    reference: &'a TaskInfo,
) -> impl Iterator<Item = &'a TaskInfo> {
    tasks.iter().filter(move |t| t.id() != reference.id())
}

/// Tasks with priority equal to or lower than `reference`'s (i.e.,
/// `priority >= reference.priority()`, since smaller values mean
/// higher priority).
pub fn lowereq_priority_tasks<'a>(
    tasks: &'a [TaskInfo],
    reference: &'a TaskInfo,
) -> impl Iterator<Item = &'a TaskInfo> {
    tasks.iter().filter(move |t| t.priority() >= reference.priority())
}

/// As [`lowereq_priority_tasks`], excluding `reference` itself.
pub fn lowereq_priority_tasks_except<'a>(
    tasks: &'a [TaskInfo],
    reference: &'a TaskInfo,
) -> impl Iterator<Item = &'a TaskInfo> {
    tasks
        .iter()
        .filter(move |t| t.priority() >= reference.priority() && t.id() != reference.id())
}

/// Tasks with strictly higher priority than `reference`.
pub fn higher_priority_tasks<'a>(
    tasks: &'a [TaskInfo],
    reference: &'a TaskInfo,
) -> impl Iterator<Item = &'a TaskInfo> {
    tasks.iter().filter(move |t| t.priority() < reference.priority())
}

/// Tasks with strictly lower priority than `reference`.
pub fn lower_priority_tasks<'a>(
    tasks: &'a [TaskInfo],
    reference: &'a TaskInfo,
) -> impl Iterator<Item = &'a TaskInfo> {
    tasks.iter().filter(move |t| t.priority() > reference.priority())
}

/// Tasks in a different cluster than `local_task`.
pub fn remote_tasks<'a>(
    tasks: &'a [TaskInfo],
    local_task: &'a TaskInfo,
) -> impl Iterator<Item = &'a TaskInfo> {
    tasks.iter().filter(move |t| t.cluster() != local_task.cluster())
}

/// Tasks in the same cluster as `local_task`.
pub fn local_tasks<'a>(
    tasks: &'a [TaskInfo],
    local_task: &'a TaskInfo,
) -> impl Iterator<Item = &'a TaskInfo> {
    tasks.iter().filter(move |t| t.cluster() == local_task.cluster())
}

/// Tasks in the same cluster as `local_task`, excluding `local_task`
/// itself.
pub fn local_tasks_except<'a>(
    tasks: &'a [TaskInfo],
    local_task: &'a TaskInfo,
) -> impl Iterator<Item = &'a TaskInfo> {
    tasks
        .iter()
        .filter(move |t| t.cluster() == local_task.cluster() && t.id() != local_task.id())
}

/// Local tasks (same cluster, excluding `local_task`) with
/// equal-or-lower priority than `local_task`.
pub fn local_lowereq_priority_tasks_except<'a>(
    tasks: &'a [TaskInfo],
    local_task: &'a TaskInfo,
) -> impl Iterator<Item = &'a TaskInfo> {
    tasks.iter().filter(move |t| {
        t.cluster() == local_task.cluster()
            && t.id() != local_task.id()
            && t.priority() >= local_task.priority()
    })
}

/// Remote tasks (different cluster) with equal-or-lower priority.
pub fn remote_lowereq_priority_tasks<'a>(
    tasks: &'a [TaskInfo],
    reference: &'a TaskInfo,
) -> impl Iterator<Item = &'a TaskInfo> {
    remote_tasks(tasks, reference).filter(move |t| t.priority() >= reference.priority())
}

/// Remote tasks (different cluster) with strictly higher priority.
pub fn remote_higher_priority_tasks<'a>(
    tasks: &'a [TaskInfo],
    reference: &'a TaskInfo,
) -> impl Iterator<Item = &'a TaskInfo> {
    remote_tasks(tasks, reference).filter(move |t| t.priority() < reference.priority())
}

/// Requests issued for resources outside `task_ti`'s own cluster.
pub fn remote_requests<'a>(
    requests: &'a [RequestBound],
    locality: &'a ResourceLocality,
    task_ti: &'a TaskInfo,
) -> impl Iterator<Item = &'a RequestBound> {
    requests
        .iter()
        .filter(move |r| locality.get(r.resource_id()) != Some(task_ti.cluster()))
}

/// Requests for resources assigned to the given cluster.
pub fn requests_in_cluster<'a>(
    requests: &'a [RequestBound],
    locality: &'a ResourceLocality,
    cluster: usize,
) -> impl Iterator<Item = &'a RequestBound> {
    requests
        .iter()
        .filter(move |r| locality.get(r.resource_id()) == Some(cluster))
}

/// Requests for a specific resource.
pub fn requests_for<'a>(
    requests: &'a [RequestBound],
    res_id: usize,
) -> impl Iterator<Item = &'a RequestBound> {
    requests.iter().filter(move |r| r.resource_id() == res_id)
}

/// The request-instance indices `0..max_num_requests` that `tx_request`
/// may issue while `task_ti`'s job (with the given response time) is
/// pending. Replaces `foreach_request_instance`.
pub fn request_instances(tx_request: &RequestBound, task_ti: &TaskInfo) -> std::ops::Range<u64> {
    0..tx_request.max_num_requests(task_ti, task_ti.response())
}

/// A set of requests competing for the same resource, viewed as
/// references into a [`ResourceSharingInfo`].
pub type ContentionSet<'a> = Vec<&'a RequestBound>;

/// `ContentionSet`s indexed by resource id.
pub type Resources<'a> = Vec<ContentionSet<'a>>;

/// A cluster is simply the set of tasks assigned to it.
pub type Cluster<'a> = Vec<&'a TaskInfo>;

/// Partition all tasks into per-cluster groups. If `num_cpus` is
/// given, the returned vector always has at least that many (possibly
/// empty) clusters, matching the original's pre-sizing behavior for
/// dedicated per-processor clusters.
pub fn split_by_cluster(info: &ResourceSharingInfo, num_cpus: Option<usize>) -> Vec<Cluster<'_>> {
    let mut clusters: Vec<Cluster> = Vec::new();
    if let Some(n) = num_cpus {
        clusters.resize_with(n, Vec::new);
    }
    for task in info.tasks() {
        let c = task.cluster();
        if clusters.len() <= c {
            clusters.resize_with(c + 1, Vec::new);
        }
        clusters[c].push(task);
    }
    clusters
}

/// Group a slice of tasks' requests by resource id.
pub fn split_by_resource<'a>(tasks: impl IntoIterator<Item = &'a TaskInfo>) -> Resources<'a> {
    let mut resources: Resources = Vec::new();
    for task in tasks {
        for req in task.requests() {
            let r = req.resource_id();
            if resources.len() <= r {
                resources.resize_with(r + 1, Vec::new);
            }
            resources[r].push(req);
        }
    }
    resources
}

/// Sort a contention set by descending request length, the standard
/// "serve the worst offenders first" ordering used when bounding
/// blocking under a cap on the number of interfering requests.
pub fn sort_by_request_length(cs: &mut ContentionSet<'_>) {
    cs.sort_by(|a, b| b.request_length().cmp(&a.request_length()));
}

/// Bound the interference a contention set can inflict within an
/// interval, subject to a cap on the total number of requests and a
/// per-source cap, excluding any request belonging to `exclude_task`
/// (if given) and any request whose priority is higher than
/// `min_priority` (lower numeric value).
///
/// Grounded in `blocking.cpp`'s `bound_blocking`: the contention set is
/// assumed pre-sorted by descending request length (see
/// [`sort_by_request_length`]) so that greedily taking requests in
/// order maximizes the bound for a fixed total request budget.
pub fn bound_blocking(
    cont: &ContentionSet<'_>,
    interval: crate::time::Duration,
    max_total_requests: u64,
    max_requests_per_source: u64,
    exclude_task: Option<usize>,
    min_priority: u32,
    owners: &[TaskInfo],
) -> Interference {
    let mut inter = Interference::default();
    let mut remaining = max_total_requests;

    for req in cont {
        if remaining == 0 {
            break;
        }
        if exclude_task == Some(req.task_index()) {
            continue;
        }
        if req.request_priority() < min_priority {
            continue;
        }
        let owner = &owners[req.task_index()];
        let num = req
            .max_num_requests(owner, interval)
            .min(max_requests_per_source)
            .min(remaining);
        inter.total_length += num * req.request_length();
        inter.count += num;
        remaining -= num;
    }

    inter
}

/// Split a slice of tasks into per-cluster groups of their requests,
/// i.e. `split_by_resource` applied to each cluster in turn. Grounded
/// in `sharedres.cpp`'s `split_by_resource(const Clusters&,
/// ClusterResources&)` overload.
pub fn split_by_cluster_resource<'a>(clusters: &[Cluster<'a>]) -> Vec<Resources<'a>> {
    clusters
        .iter()
        .map(|cluster| split_by_resource(cluster.iter().copied()))
        .collect()
}

/// Partition a contention set into its read and write requests,
/// preserving relative order (hence preserving a prior
/// [`sort_by_request_length`] pass). Grounded in `rw-blocking.h`'s
/// `split_by_type`.
pub fn split_by_type<'a>(cs: &ContentionSet<'a>) -> (ContentionSet<'a>, ContentionSet<'a>) {
    let mut reads = Vec::new();
    let mut writes = Vec::new();
    for req in cs {
        if req.is_read() {
            reads.push(*req);
        } else {
            writes.push(*req);
        }
    }
    (reads, writes)
}

/// [`split_by_type`] lifted over a `Resources` (per-resource contention
/// sets), producing the read-only and write-only `Resources` in
/// parallel.
pub fn split_resources_by_type<'a>(resources: &Resources<'a>) -> (Resources<'a>, Resources<'a>) {
    let mut reads = Vec::with_capacity(resources.len());
    let mut writes = Vec::with_capacity(resources.len());
    for cs in resources {
        let (r, w) = split_by_type(cs);
        reads.push(r);
        writes.push(w);
    }
    (reads, writes)
}

/// [`split_resources_by_type`] lifted over a `ClusterResources`.
pub fn split_cluster_resources_by_type<'a>(
    clusters: &[Resources<'a>],
) -> (Vec<Resources<'a>>, Vec<Resources<'a>>) {
    let mut reads = Vec::with_capacity(clusters.len());
    let mut writes = Vec::with_capacity(clusters.len());
    for res in clusters {
        let (r, w) = split_resources_by_type(res);
        reads.push(r);
        writes.push(w);
    }
    (reads, writes)
}

/// The priority ceiling of each resource: the highest priority (lowest
/// numeric value) of any task that accesses it. Grounded in
/// `sharedres.cpp`'s `determine_priority_ceilings`/`get_priority_ceilings`.
/// Indexed by resource id; a resource nobody accesses has ceiling
/// `u32::MAX` (lowest possible priority), matching the original's
/// `UINT_MAX` default.
pub fn priority_ceilings(info: &ResourceSharingInfo) -> Vec<u32> {
    let resources = split_by_resource(info.tasks());
    resources
        .iter()
        .map(|cs| {
            cs.iter()
                .map(|r| info.tasks()[r.task_index()].priority())
                .min()
                .unwrap_or(u32::MAX)
        })
        .collect()
}

/// A per-(remote-)cluster cap on how many blocking requests a task's
/// request instance may suffer: at most one blocking request per
/// remote processor in that cluster, per issued request. Grounded in
/// `sharedres.cpp`'s `np_fifo_limits`.
#[derive(Copy, Clone, Debug)]
pub struct ClusterLimit {
    pub max_total_requests: u64,
    pub max_requests_per_source: u64,
}

pub fn np_fifo_limits(
    tsk: &TaskInfo,
    clusters: &[Resources<'_>],
    procs_per_cluster: usize,
    issued: u64,
    dedicated_irq: Option<usize>,
) -> Vec<ClusterLimit> {
    clusters
        .iter()
        .enumerate()
        .map(|(idx, _)| {
            let mut parallelism = procs_per_cluster;
            if dedicated_irq == Some(idx) {
                parallelism -= 1;
            }
            if parallelism > 0 && tsk.cluster() == idx {
                parallelism -= 1;
            }
            ClusterLimit {
                max_total_requests: issued * parallelism as u64,
                max_requests_per_source: issued,
            }
        })
        .collect()
}

/// Sum [`bound_blocking`] across every cluster's contention set for
/// `res_id`, each capped by its own [`ClusterLimit`]. Grounded in
/// `sharedres.cpp`'s `bound_blocking_all_clusters`.
pub fn bound_blocking_all_clusters(
    clusters: &[Resources<'_>],
    limits: &[ClusterLimit],
    res_id: usize,
    interval: crate::time::Duration,
    exclude_task: usize,
    owners: &[TaskInfo],
) -> Interference {
    let mut inter = Interference::default();
    for (cluster_resources, limit) in clusters.iter().zip(limits) {
        if let Some(cs) = cluster_resources.get(res_id) {
            inter += bound_blocking(
                cs,
                interval,
                limit.max_total_requests,
                limit.max_requests_per_source,
                Some(exclude_task),
                0,
                owners,
            );
        }
    }
    inter
}

/// The FIFO-spinlock remote-blocking bound for one request to `res_id`:
/// at most one blocking request per remote processor in each other
/// cluster, for each of the task's `issued` requests in the busy
/// window. Grounded in `sharedres.cpp`'s `np_fifo_per_resource`.
pub fn np_fifo_per_resource(
    tsk: &TaskInfo,
    clusters: &[Resources<'_>],
    procs_per_cluster: usize,
    res_id: usize,
    issued: u64,
    dedicated_irq: Option<usize>,
    owners: &[TaskInfo],
) -> Interference {
    let limits = np_fifo_limits(tsk, clusters, procs_per_cluster, issued, dedicated_irq);
    bound_blocking_all_clusters(clusters, &limits, res_id, tsk.response(), tsk.id(), owners)
}

/// The maximum request span (spec.md §3 "Request span") among `tsk`'s
/// local, equal-or-lower-priority tasks: the largest
/// already-recorded [`crate::resource::BlockingBounds::max_request_span`]
/// entry in that set. Grounded in `sharedres.cpp`'s
/// `max_local_request_span`.
fn max_local_request_span(
    tsk: &TaskInfo,
    tasks: &[TaskInfo],
    bounds: &crate::resource::BlockingBounds,
) -> Interference {
    local_lowereq_priority_tasks_except(tasks, tsk)
        .map(|t| bounds.max_request_span(t.id()))
        .max()
        .unwrap_or_default()
}

/// Charge every task's arrival blocking (spec.md §4.3 "Charge arrival
/// blocking from the maximum request span of same-or-lower-priority
/// local tasks") and fold it into its total blocking term. Grounded in
/// `sharedres.cpp`'s `charge_arrival_blocking`; every closed-form
/// analysis that computes a request span (OMLP/FMLP family) calls this
/// as its final step.
pub fn charge_arrival_blocking(
    info: &ResourceSharingInfo,
    bounds: &mut crate::resource::BlockingBounds,
) {
    for tsk in info.tasks() {
        let inf = max_local_request_span(tsk, info.tasks(), bounds);
        bounds[tsk.id()] += inf;
        bounds.set_arrival_blocking(tsk.id(), inf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::ResourceSharingInfo;

    fn sample_info() -> ResourceSharingInfo {
        let mut info = ResourceSharingInfo::with_capacity(3);
        info.add_task(100, 10, 0, 0, 5, 0);
        info.add_request(1, 2, 3);
        info.add_task(100, 10, 0, 1, 5, 0);
        info.add_request(1, 1, 4);
        info.add_task(100, 10, 1, 2, 5, 0);
        info.add_request(2, 1, 1);
        info
    }

    #[test]
    fn tasks_except_skips_only_reference() {
        let info = sample_info();
        let reference = &info.tasks()[0];
        let remaining: Vec<usize> = tasks_except(info.tasks(), reference).map(|t| t.id()).collect();
        assert_eq!(remaining, vec![1, 2]);
    }

    #[test]
    fn split_by_cluster_groups_by_cluster_id() {
        let info = sample_info();
        let clusters = split_by_cluster(&info, None);
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].len(), 2);
        assert_eq!(clusters[1].len(), 1);
    }

    #[test]
    fn split_by_resource_groups_by_resource_id() {
        let info = sample_info();
        let resources = split_by_resource(info.tasks());
        assert_eq!(resources.len(), 3);
        assert_eq!(resources[1].len(), 2);
        assert_eq!(resources[2].len(), 1);
        assert!(resources[0].is_empty());
    }

    #[test]
    fn sort_by_request_length_is_descending() {
        let info = sample_info();
        let mut cs: ContentionSet = info.tasks()[0].requests().iter().chain(info.tasks()[1].requests().iter()).collect();
        sort_by_request_length(&mut cs);
        assert_eq!(cs[0].request_length(), 4);
        assert_eq!(cs[1].request_length(), 3);
    }

    #[test]
    fn bound_blocking_respects_total_request_cap() {
        let info = sample_info();
        let mut cs: ContentionSet = split_by_resource(info.tasks()).into_iter().nth(1).unwrap();
        sort_by_request_length(&mut cs);
        let bound = bound_blocking(&cs, 10, 2, 10, None, 0, info.tasks());
        assert_eq!(bound.count, 2);
        assert_eq!(bound.total_length, 4 + 3);
    }
}
