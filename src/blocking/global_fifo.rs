/*! Global FIFO-queue locking (OMLP/FMLP family) on `m` identical processors.

Grounded in `native/src/blocking/global-omlp.cpp`'s `global_omlp_bounds`: a
shared FIFO queue means a job can be overtaken by at most `2m - 1` other
requests in total, at most 2 per source task, tightened to exactly 1 per
source when the contention set is small enough that the queue can never
hold more than one request per source at a time (`num_sources <= m + 1`,
Lemma 15 in the RTSS'10 paper this bound is taken from). See spec.md §4.3
"Global FIFO (OMLP/FMLP)" and scenario S3.
*/

use crate::contention::{bound_blocking, split_by_resource};
use crate::resource::{BlockingBounds, Interference, ResourceSharingInfo};

/// The FMLP+/global-OMLP blocking bound on `num_procs` identical processors.
pub fn bounds(info: &ResourceSharingInfo, num_procs: usize) -> BlockingBounds {
    let mut resources = split_by_resource(info.tasks());
    for cs in &mut resources {
        crate::contention::sort_by_request_length(cs);
    }

    let mut results = BlockingBounds::for_info(info);

    for tsk in info.tasks() {
        let mut bterm = Interference::default();

        for req in tsk.requests() {
            let cs = &resources[req.resource_id()];
            let num_sources = cs.len() as u64;
            let interval = tsk.response();
            let issued = req.num_requests() as u64;

            let (total_limit, per_src_limit) = if num_sources <= num_procs as u64 + 1 {
                // FIFO case: no job is ever skipped in the priority
                // queue, since at most one job is in it at any time.
                ((num_sources.saturating_sub(1)) * issued, issued)
            } else {
                ((2 * num_procs as u64 - 1) * issued, 2 * issued)
            };

            bterm += bound_blocking(cs, interval, total_limit, per_src_limit, Some(tsk.id()), 0, info.tasks());
        }

        results[tsk.id()] = bterm;
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::ResourceSharingInfo;

    #[test]
    fn scenario_s3_single_resource_two_clusters() {
        // spec.md S3: two local tasks on different clusters, each issuing
        // one 3-time-unit request to resource 0, m=2. Expected per-task
        // blocking = 3 (one remote blocker at the FIFO head).
        let mut info = ResourceSharingInfo::with_capacity(2);
        info.add_task(100, 10, 0, 0, 5, 0);
        info.add_request(0, 1, 3);
        info.add_task(100, 10, 1, 1, 5, 0);
        info.add_request(0, 1, 3);

        let bounds = bounds(&info, 2);
        assert_eq!(bounds.blocking_term(0), 3);
        assert_eq!(bounds.blocking_term(1), 3);
    }

    #[test]
    fn empty_resource_sharing_info_has_no_blocking() {
        let info = ResourceSharingInfo::with_capacity(0);
        let bounds = bounds(&info, 4);
        assert_eq!(bounds.size(), 0);
    }
}
