/*! MSRP: PCP/SRP for partition-local resources, task-fair mutex spin
locks for global resources. Applies only to partitioned scheduling.

Grounded in `native/src/blocking/msrp-holistic.cpp`'s
`msrp_bounds_holistic`: resources accessed from exactly one partition
are analyzed with [`pcp_blocking`] (priority-ceiling blocking, at most
one ceiling-blocking critical section per lower-or-equal-priority local
task); resources accessed from more than one partition go through
[`crate::blocking::clustered_omlp::task_fair_mutex_bounds`] with one
processor per cluster. The two results are merged by taking the larger
of the two arrival-blocking terms, per `msrp-holistic.cpp`'s merge
step.
*/

use std::collections::{HashMap, HashSet};

use crate::contention::{priority_ceilings, split_by_cluster};
use crate::resource::{BlockingBounds, Interference, ResourceSharingInfo};

/// Resources accessed from exactly one cluster throughout the whole
/// task set. Grounded in `sharedres.cpp`'s `get_local_resources`.
fn local_resources(info: &ResourceSharingInfo) -> HashSet<usize> {
    let mut locals = HashSet::new();
    let mut accessed_in: HashMap<usize, usize> = HashMap::new();

    for tsk in info.tasks() {
        for req in tsk.requests() {
            let res = req.resource_id();
            match accessed_in.get(&res) {
                None => {
                    accessed_in.insert(res, tsk.cluster());
                    locals.insert(res);
                }
                Some(&cluster) if cluster != tsk.cluster() => {
                    locals.remove(&res);
                }
                _ => {}
            }
        }
    }

    locals
}

/// Build a copy of `info` (preserving task order, hence task ids) that
/// keeps only the requests whose resource is (or is not) in `locals`.
/// Grounded in `sharedres.cpp`'s `extract_resources`.
fn extract_resources(info: &ResourceSharingInfo, locals: &HashSet<usize>, want_local: bool) -> ResourceSharingInfo {
    let mut out = ResourceSharingInfo::with_capacity(info.tasks().len());

    for tsk in info.tasks() {
        out.add_task(tsk.period(), tsk.response(), tsk.cluster(), tsk.priority(), tsk.cost(), tsk.deadline());
        for req in tsk.requests() {
            if locals.contains(&req.resource_id()) == want_local {
                out.add_request_rw(req.resource_id(), req.num_requests(), req.request_length(), req.request_type(), req.request_priority());
            }
        }
    }

    out
}

/// Priority-ceiling blocking for a set of partition-local resources:
/// a task is blocked once per lower-or-equal-priority local task whose
/// request's resource has a ceiling at or above this task's own
/// priority.
pub fn pcp_blocking(info: &ResourceSharingInfo) -> BlockingBounds {
    let prio_ceilings = priority_ceilings(info);
    let clusters = split_by_cluster(info, None);
    let mut results = BlockingBounds::for_info(info);

    for cluster in &clusters {
        for tsk in cluster {
            for other in cluster {
                if tsk.id() != other.id() && tsk.priority() <= other.priority() {
                    for req in other.requests() {
                        let res = req.resource_id();
                        if prio_ceilings[res] <= tsk.priority() {
                            results.raise_blocking_length(tsk.id(), Interference::single(req.request_length()));
                        }
                    }
                }
            }
        }
    }

    results
}

/// The MSRP blocking bound. `dedicated_irq` is forwarded to the
/// task-fair-mutex analysis of global resources (one cluster may have
/// a core reserved for interrupt handling).
pub fn bounds(info: &ResourceSharingInfo, dedicated_irq: Option<usize>) -> BlockingBounds {
    let locals = local_resources(info);
    let linfo = extract_resources(info, &locals, true);
    let ginfo = extract_resources(info, &locals, false);

    let pcp = pcp_blocking(&linfo);
    let mut results = super::clustered_omlp::task_fair_mutex_bounds(&ginfo, 1, dedicated_irq);

    for i in 0..results.size() {
        let b_pcp = pcp.blocking_term(i);
        let b_spin = results.arrival_blocking(i);

        if b_pcp > b_spin {
            let mut total = results[i];
            total.total_length += b_pcp - b_spin;
            results.set_arrival_blocking(i, Interference::single(b_pcp));
            results[i] = total;
        }
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::ResourceSharingInfo;

    #[test]
    fn local_resource_blocks_via_priority_ceiling() {
        let mut info = ResourceSharingInfo::with_capacity(2);
        info.add_task(100, 10, 0, 0, 5, 0);
        info.add_request(0, 1, 1);
        info.add_task(100, 10, 0, 1, 5, 0);
        info.add_request(0, 1, 6);

        assert!(local_resources(&info).contains(&0));

        let bounds = bounds(&info, None);
        assert_eq!(bounds.blocking_term(0), 6);
    }

    #[test]
    fn resource_accessed_from_two_clusters_is_not_local() {
        let mut info = ResourceSharingInfo::with_capacity(2);
        info.add_task(100, 10, 0, 0, 5, 0);
        info.add_request(0, 1, 3);
        info.add_task(100, 10, 1, 1, 5, 0);
        info.add_request(0, 1, 3);

        assert!(!local_resources(&info).contains(&0));
    }
}
