/*! Clustered OMLP / task-fair mutex spinlocks, and k-exclusion (k-OMLP).

Grounded in `native/src/blocking/clust-omlp.cpp`: resources are partitioned
by cluster, each cluster's contention is a FIFO spin queue with
`procs_per_cluster` parallel servers (minus one if the requesting task's own
core, minus one more if a core is reserved for dedicated interrupt
handling), and the blocking bound per request is
[`crate::contention::np_fifo_per_resource`]'s per-cluster cap summed across
clusters. "Task-fair mutex" is structurally the same analysis under a
different name (the original's `task_fair_mutex_bounds` is a thin alias); see
spec.md §4.3 "Partitioned OMLP / clustered OMLP / task-fair mutex".

`k-OMLP` generalizes this further to replicated resources: at most
`ceil(m / replicas(q)) - 1` concurrent blockers rather than `m - 1`, per
spec.md §4.3 "k-OMLP (clustered)".
*/

use crate::contention::{
    charge_arrival_blocking, np_fifo_limits, np_fifo_per_resource, split_by_cluster,
    split_by_cluster_resource, sort_by_request_length, ContentionSet, Resources,
};
use crate::resource::{BlockingBounds, Interference, ReplicaInfo, ResourceSharingInfo};

/// The clustered-OMLP blocking bound: `procs_per_cluster` processors share
/// each cluster's resources via a FIFO spin queue. `dedicated_irq` names a
/// cluster index with one fewer usable core (a processor dedicated to
/// interrupt handling), or `None`.
pub fn bounds(
    info: &ResourceSharingInfo,
    procs_per_cluster: usize,
    dedicated_irq: Option<usize>,
) -> BlockingBounds {
    let clusters = split_by_cluster(info, None);
    let mut resources = split_by_cluster_resource(&clusters);
    for cluster in &mut resources {
        for cs in cluster {
            sort_by_request_length(cs);
        }
    }

    let mut results = BlockingBounds::for_info(info);

    for tsk in info.tasks() {
        let mut bterm = Interference::default();

        for req in tsk.requests() {
            let mut blocking = np_fifo_per_resource(
                tsk,
                &resources,
                procs_per_cluster,
                req.resource_id(),
                req.num_requests() as u64,
                dedicated_irq,
                info.tasks(),
            );
            bterm += blocking;

            // Maximum request span: if this is already a single-issue
            // request, we already have it; otherwise recompute for
            // issued == 1.
            if req.num_requests() != 1 {
                blocking = np_fifo_per_resource(
                    tsk,
                    &resources,
                    procs_per_cluster,
                    req.resource_id(),
                    1,
                    dedicated_irq,
                    info.tasks(),
                );
            }
            blocking.total_length += req.request_length();
            blocking.count += 1;
            results.raise_request_span(tsk.id(), blocking);
        }

        results[tsk.id()] = bterm;
        results.set_remote_blocking(tsk.id(), bterm);
    }

    // The initial delay due to priority donation.
    charge_arrival_blocking(info, &mut results);

    results
}

/// Alias: task-fair mutex spinlocks are structurally identical to clustered
/// OMLP (`native/src/blocking/clust-omlp.cpp`'s `task_fair_mutex_bounds`).
pub fn task_fair_mutex_bounds(
    info: &ResourceSharingInfo,
    procs_per_cluster: usize,
    dedicated_irq: Option<usize>,
) -> BlockingBounds {
    bounds(info, procs_per_cluster, dedicated_irq)
}

/// A contention-set entry capped at `limit` uses, for the k-exclusion
/// variant's two-stage cap (cluster-level FIFO cap, then a k-exclusion
/// total cap). Grounded in `clust-omlp.cpp`'s `LimitedRequestBound`.
struct LimitedRequest<'a> {
    request: &'a crate::resource::RequestBound,
    limit: u64,
}

fn add_blocking<'a>(
    out: &mut Vec<LimitedRequest<'a>>,
    cont: &ContentionSet<'a>,
    interval: crate::time::Duration,
    max_total_requests: u64,
    max_requests_per_source: u64,
    exclude_task: usize,
    owners: &[crate::resource::TaskInfo],
) {
    let mut remaining = max_total_requests;
    for req in cont {
        if remaining == 0 {
            break;
        }
        if req.task_index() == exclude_task {
            continue;
        }
        let owner = &owners[req.task_index()];
        let num = req
            .max_num_requests(owner, interval)
            .min(max_requests_per_source)
            .min(remaining);
        remaining -= num;
        out.push(LimitedRequest { request: req, limit: num });
    }
}

fn contention_from_all_clusters<'a>(
    clusters_per_resource: &[Resources<'a>],
    limits: &[crate::contention::ClusterLimit],
    res_id: usize,
    interval: crate::time::Duration,
    exclude_task: usize,
    owners: &[crate::resource::TaskInfo],
) -> Vec<LimitedRequest<'a>> {
    let mut lcs = Vec::new();
    for (cluster_resources, limit) in clusters_per_resource.iter().zip(limits) {
        if let Some(cs) = cluster_resources.get(res_id) {
            add_blocking(
                &mut lcs,
                cs,
                interval,
                limit.max_total_requests,
                limit.max_requests_per_source,
                exclude_task,
                owners,
            );
        }
    }
    lcs
}

fn bound_limited(lcs: &[LimitedRequest<'_>], max_total_requests: u64) -> Interference {
    // assumption: `lcs` is sorted by request length, descending.
    let mut inter = Interference::default();
    let mut remaining = max_total_requests;
    for lr in lcs {
        if remaining == 0 {
            break;
        }
        let num = lr.limit.min(remaining);
        inter.total_length += num * lr.request.request_length();
        inter.count += num;
        remaining -= num;
    }
    inter
}

/// The k-exclusion (k-OMLP) clustered blocking bound: each resource `q` is
/// replicated `replicas(q)` times, so at most `ceil(m / replicas(q)) - 1`
/// concurrent blockers can delay a request rather than `m - 1`. Grounded in
/// `clust-omlp.cpp`'s `clustered_kx_omlp_bounds`.
pub fn clustered_kx_bounds(
    info: &ResourceSharingInfo,
    replicas: &ReplicaInfo,
    procs_per_cluster: usize,
    dedicated_irq: Option<usize>,
) -> BlockingBounds {
    let clusters = split_by_cluster(info, None);
    let mut resources = split_by_cluster_resource(&clusters);
    for cluster in &mut resources {
        for cs in cluster {
            sort_by_request_length(cs);
        }
    }

    let num_cpus = clusters.len() * procs_per_cluster
        - if dedicated_irq.is_some() { 1 } else { 0 };

    let mut results = BlockingBounds::for_info(info);

    for tsk in info.tasks() {
        let mut bterm = Interference::default();

        for req in tsk.requests() {
            let max_total_once = divide_with_ceil(num_cpus as u64, replicas.get(req.resource_id()) as u64) - 1;

            let limits = np_fifo_limits(
                tsk,
                &resources,
                procs_per_cluster,
                req.num_requests() as u64,
                dedicated_irq,
            );
            let mut lcs = contention_from_all_clusters(
                &resources,
                &limits,
                req.resource_id(),
                tsk.response(),
                tsk.id(),
                info.tasks(),
            );
            lcs.sort_by(|a, b| b.request.request_length().cmp(&a.request.request_length()));
            let mut blocking = bound_limited(&lcs, max_total_once * req.num_requests() as u64);
            bterm += blocking;

            if req.num_requests() != 1 {
                let limits1 = np_fifo_limits(tsk, &resources, procs_per_cluster, 1, dedicated_irq);
                let mut lcs1 = contention_from_all_clusters(
                    &resources,
                    &limits1,
                    req.resource_id(),
                    tsk.response(),
                    tsk.id(),
                    info.tasks(),
                );
                lcs1.sort_by(|a, b| b.request.request_length().cmp(&a.request.request_length()));
                blocking = bound_limited(&lcs1, max_total_once);
            }
            blocking.total_length += req.request_length();
            blocking.count += 1;
            results.raise_request_span(tsk.id(), blocking);
        }

        results[tsk.id()] = bterm;
    }

    charge_arrival_blocking(info, &mut results);
    results
}

fn divide_with_ceil(a: u64, b: u64) -> u64 {
    a / b + (a % b != 0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::ResourceSharingInfo;

    #[test]
    fn single_remote_cluster_gets_one_blocker_per_remote_core() {
        let mut info = ResourceSharingInfo::with_capacity(2);
        info.add_task(100, 10, 0, 0, 5, 0);
        info.add_request(0, 1, 3);
        info.add_task(100, 10, 1, 1, 5, 0);
        info.add_request(0, 1, 7);

        let bounds = bounds(&info, 2, None);
        // task 0 (cluster 0) can be blocked by task 1's request on its
        // one core in cluster 1.
        assert_eq!(bounds.blocking_term(0), 7);
        assert_eq!(bounds.blocking_term(1), 3);
    }

    #[test]
    fn clustered_kx_with_full_replication_matches_clustered_omlp() {
        let mut info = ResourceSharingInfo::with_capacity(2);
        info.add_task(100, 10, 0, 0, 5, 0);
        info.add_request(0, 1, 3);
        info.add_task(100, 10, 1, 1, 5, 0);
        info.add_request(0, 1, 7);

        let mut replicas = ReplicaInfo::new();
        replicas.set_replicas(0, 1);

        let kx = clustered_kx_bounds(&info, &replicas, 2, None);
        let plain = bounds(&info, 2, None);
        for i in 0..2 {
            assert_eq!(kx.blocking_term(i), plain.blocking_term(i));
        }
    }
}
