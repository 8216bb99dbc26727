/*! Distributed Priority Ceiling Protocol (DPCP).

Grounded in `native/src/blocking/dpcp.cpp`. Every resource is assigned
to exactly one (synchronization) processor via a
[`crate::resource::ResourceLocality`]. A task's blocking term has two
parts:

- **Remote**: for each remote synchronization processor it accesses,
  all higher-priority requests there (unconditionally, since a
  request only ever blocks once it is holding the resource) plus the
  longest lower-priority requests there, capped at one lower-priority
  blocker *per request this task issues to that processor*
  ([`bound_blocking_dpcp`] — note this deliberately does not reuse
  [`crate::contention::bound_blocking`], since DPCP treats
  higher-priority and lower-priority requests asymmetrically).
- **Local**: every other task's request to a resource local to this
  task's own processor (local PCP blocking collapses to "all other
  local requests", since the original only models global resources'
  local footprint here).
*/

use crate::contention::{priority_ceilings, sort_by_request_length, ContentionSet};
use crate::resource::{BlockingBounds, Interference, ResourceLocality, ResourceSharingInfo, TaskInfo};

/// Group every task's requests by the synchronization processor their
/// resource is local to. Requests to resources with no assigned
/// processor (`NO_CPU`, e.g. a dedicated synchronization processor
/// outside the application's own cluster numbering) are dropped.
fn split_by_locality<'a>(info: &'a ResourceSharingInfo, locality: &ResourceLocality) -> Vec<ContentionSet<'a>> {
    let mut per_cpu: Vec<ContentionSet<'a>> = Vec::new();
    for task in info.tasks() {
        if per_cpu.len() <= task.cluster() {
            per_cpu.resize_with(task.cluster() + 1, Vec::new);
        }
        for req in task.requests() {
            let cpu = match locality.get(req.resource_id()) {
                Some(cpu) => cpu,
                None => continue,
            };
            if per_cpu.len() <= cpu {
                per_cpu.resize_with(cpu + 1, Vec::new);
            }
            per_cpu[cpu].push(req);
        }
    }
    per_cpu
}

fn count_requests_to_cpu(tsk: &TaskInfo, locality: &ResourceLocality, cpu: usize) -> u32 {
    tsk.requests()
        .iter()
        .filter(|req| locality.get(req.resource_id()) == Some(cpu))
        .map(|req| req.num_requests())
        .sum()
}

/// Higher-priority requests block unconditionally (once per job
/// instance in the busy window); lower-priority requests whose
/// resource's priority ceiling is at or above this task's own priority
/// block at most once per request this task issues to that processor,
/// taken longest-first.
fn bound_blocking_dpcp(
    tsk: &TaskInfo,
    cont: &ContentionSet<'_>,
    prio_ceiling: &[u32],
    mut max_lower_prio: u32,
    owners: &[TaskInfo],
) -> Interference {
    let mut inter = Interference::default();
    let interval = tsk.response();

    for req in cont {
        if req.task_index() == tsk.id() {
            continue;
        }
        let owner = &owners[req.task_index()];
        if owner.priority() < tsk.priority() {
            let num = req.max_num_requests(owner, interval);
            inter.count += num;
            inter.total_length += num * req.request_length();
        } else if max_lower_prio > 0 && prio_ceiling[req.resource_id()] <= tsk.priority() {
            let num = req.max_num_requests(owner, interval).min(max_lower_prio as u64);
            inter.count += num;
            inter.total_length += num * req.request_length();
            max_lower_prio -= num as u32;
        }
    }

    inter
}

fn dpcp_remote_bound(
    tsk: &TaskInfo,
    locality: &ResourceLocality,
    prio_ceilings: &[u32],
    per_cpu: &[ContentionSet<'_>],
    owners: &[TaskInfo],
) -> Interference {
    let mut blocking = Interference::default();
    for (cpu, cs) in per_cpu.iter().enumerate() {
        if cpu == tsk.cluster() {
            continue;
        }
        let reqs = count_requests_to_cpu(tsk, locality, cpu);
        if reqs > 0 {
            blocking += bound_blocking_dpcp(tsk, cs, prio_ceilings, reqs, owners);
        }
    }
    blocking
}

fn dpcp_local_bound(tsk: &TaskInfo, local: &ContentionSet<'_>, owners: &[TaskInfo]) -> Interference {
    let mut blocking = Interference::default();
    let interval = tsk.response();
    for req in local {
        if req.task_index() != tsk.id() {
            let owner = &owners[req.task_index()];
            let num = req.max_num_requests(owner, interval);
            blocking.count += num;
            blocking.total_length += num * req.request_length();
        }
    }
    blocking
}

/// The DPCP blocking bound, given which processor each resource is
/// assigned to.
pub fn bounds(info: &ResourceSharingInfo, locality: &ResourceLocality) -> BlockingBounds {
    let mut per_cpu = split_by_locality(info, locality);
    for cs in &mut per_cpu {
        sort_by_request_length(cs);
    }

    let prio_ceilings = priority_ceilings(info);
    let mut results = BlockingBounds::for_info(info);

    for tsk in info.tasks() {
        let remote = dpcp_remote_bound(tsk, locality, &prio_ceilings, &per_cpu, info.tasks());
        let local = if tsk.cluster() < per_cpu.len() {
            dpcp_local_bound(tsk, &per_cpu[tsk.cluster()], info.tasks())
        } else {
            Interference::default()
        };

        results[tsk.id()] = remote + local;
        results.set_remote_blocking(tsk.id(), remote);
        results.set_local_blocking(tsk.id(), local);
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::ResourceSharingInfo;

    #[test]
    fn local_gcs_block_every_task_on_that_cpu_even_without_requests() {
        let mut info = ResourceSharingInfo::with_capacity(2);
        // task 0: local to cpu 0, issues no requests of its own.
        info.add_task(100, 10, 0, 2, 5, 0);
        // task 1: also local to cpu 0, issues one request to resource 0.
        info.add_task(100, 10, 0, 0, 5, 0);
        info.add_request(0, 1, 4);

        let mut locality = ResourceLocality::new();
        locality.assign_resource(0, 0);

        let bounds = bounds(&info, &locality);
        // task 0 shares cpu 0 with task 1's global critical section, so
        // it is blocked by it once even though it never requests the
        // resource itself.
        assert_eq!(bounds.blocking_term(0), 4);
        // task 1 never blocks on its own request.
        assert_eq!(bounds.blocking_term(1), 0);
    }

    #[test]
    fn lower_priority_request_capped_by_issued_count() {
        let mut info = ResourceSharingInfo::with_capacity(2);
        // task 0: cpu 0, priority 0 (highest), issues two requests to
        // resource 0 (local to cpu 1).
        info.add_task(100, 10, 0, 0, 5, 0);
        info.add_request(0, 2, 3);
        // task 1: cpu 1, priority 1 (lower), holds resource 0 locally.
        info.add_task(100, 10, 1, 1, 5, 0);
        info.add_request(0, 1, 6);

        let mut locality = ResourceLocality::new();
        locality.assign_resource(0, 1);

        let bounds = bounds(&info, &locality);
        // one lower-priority remote blocker of length 6, capped at the
        // two requests task 0 issues to cpu 1.
        assert_eq!(bounds.blocking_term(0), 6);
        // task 1's own resource is local, so the only other accessor
        // (task 0) contributes local blocking capped by its own max
        // request count within task 1's response time.
        assert!(bounds.blocking_term(1) > 0);
    }
}
