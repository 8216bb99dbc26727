/*! Reader/writer FIFO spinlocks: phase-fair and task-fair variants.

Grounded in `native/src/blocking/rw-phase-fair.cpp`'s
`clustered_rw_omlp_bounds` (the original notes that phase-fair and
task-fair RW locks share this same structural analysis — see
`phase_fair_rw_bounds`, a thin alias). For each read/write request:

1. bound writer-only FIFO blocking ([`writer_fifo`], per spec.md §4.3
   "compute writer-only FIFO blocking");
2. bound reader-all blocking using the writer count as the reader-phase
   cap ([`reader_all`], per spec.md §4.3 "add reader-all blocking using
   reader-phase counts derived from writer contention").

The request span is tracked separately for the single-writer and
single-reader cases, since each is the worst case for a different kind
of request instance.
*/

use crate::contention::{
    bound_blocking, charge_arrival_blocking, split_by_cluster, split_by_cluster_resource,
    split_by_resource, split_cluster_resources_by_type, split_resources_by_type,
    sort_by_request_length, Resources,
};
use crate::resource::{BlockingBounds, Interference, RequestType, ResourceSharingInfo, TaskInfo};
use crate::time::Duration;

/// Per-resource merged read/write request counts for one task, as used to
/// drive the phase-fair/task-fair bound (one request bound per type at
/// most, per `rw-blocking.h`'s `RWCount`/`merge_rw_requests`).
struct RwCount {
    res_id: usize,
    num_reads: u64,
    num_writes: u64,
    rlength: Duration,
    wlength: Duration,
}

fn merge_rw_requests(tsk: &TaskInfo) -> Vec<RwCount> {
    let mut counts: Vec<RwCount> = Vec::new();
    for req in tsk.requests() {
        let res_id = req.resource_id();
        if counts.len() <= res_id {
            counts.resize_with(res_id + 1, || RwCount {
                res_id: 0,
                num_reads: 0,
                num_writes: 0,
                rlength: 0,
                wlength: 0,
            });
        }
        counts[res_id].res_id = res_id;
        if req.is_read() {
            counts[res_id].num_reads += req.num_requests() as u64;
            counts[res_id].rlength = req.request_length();
        } else {
            counts[res_id].num_writes += req.num_requests() as u64;
            counts[res_id].wlength = req.request_length();
        }
    }
    counts
}

/// Writer-only FIFO blocking: at most one blocking writer per remote
/// processor, capped per source by the total number of requests (reads
/// plus writes) this task can issue.
fn writer_fifo(
    tsk: &TaskInfo,
    writes: &[Resources<'_>],
    num_writes: u64,
    num_reads: u64,
    res_id: usize,
    procs_per_cluster: usize,
    dedicated_irq: Option<usize>,
    owners: &[TaskInfo],
) -> Interference {
    let per_src_wlimit = num_reads + num_writes;
    let interval = tsk.response();

    let limits: Vec<crate::contention::ClusterLimit> = writes
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
            let total = if parallelism > 0 {
                num_reads + num_writes * parallelism as u64
            } else {
                0
            };
            crate::contention::ClusterLimit {
                max_total_requests: total,
                max_requests_per_source: per_src_wlimit,
            }
        })
        .collect();

    crate::contention::bound_blocking_all_clusters(writes, &limits, res_id, interval, tsk.id(), owners)
}

/// Reader-all blocking: every reader ahead of a job in the reader phase
/// can delay it once, capped by the number of writer-induced reader
/// phases (`num_wblock + num_writes`) and by the parallelism available
/// across all but the requesting task's own processor.
fn reader_all(
    tsk: &TaskInfo,
    all_reads: &Resources<'_>,
    num_writes: u64,
    num_wblock: u64,
    num_reads: u64,
    res_id: usize,
    _procs_per_cluster: usize,
    num_procs: u64,
    owners: &[TaskInfo],
) -> Interference {
    let interval = tsk.response();
    let rlimit = (num_wblock + num_writes).min(num_reads + num_writes * (num_procs - 1));
    if res_id >= all_reads.len() {
        return Interference::default();
    }
    bound_blocking(&all_reads[res_id], interval, rlimit, rlimit, Some(tsk.id()), 0, owners)
}

/// The clustered phase-fair/task-fair RW-OMLP blocking bound.
pub fn bounds(info: &ResourceSharingInfo, procs_per_cluster: usize, dedicated_irq: Option<usize>) -> BlockingBounds {
    let clusters = split_by_cluster(info, None);
    let mut per_cluster_resources = split_by_cluster_resource(&clusters);
    for cluster in &mut per_cluster_resources {
        for cs in cluster {
            sort_by_request_length(cs);
        }
    }

    let all_task_reqs = split_by_resource(info.tasks());
    let (mut all_reads, _all_writes) = split_resources_by_type(&all_task_reqs);
    for cs in &mut all_reads {
        sort_by_request_length(cs);
    }

    let (_reads_per_cluster, writes_per_cluster) = split_cluster_resources_by_type(&per_cluster_resources);

    let num_procs = (procs_per_cluster * clusters.len()) as u64;

    let mut results = BlockingBounds::for_info(info);

    for tsk in info.tasks() {
        let counts = merge_rw_requests(tsk);
        let mut bterm = Interference::default();

        for rw in &counts {
            if rw.num_reads == 0 && rw.num_writes == 0 {
                continue;
            }

            let wblocking = writer_fifo(
                tsk,
                &writes_per_cluster,
                rw.num_writes,
                rw.num_reads,
                rw.res_id,
                procs_per_cluster,
                dedicated_irq,
                info.tasks(),
            );
            let rblocking = reader_all(
                tsk,
                &all_reads,
                rw.num_writes,
                wblocking.count,
                rw.num_reads,
                rw.res_id,
                procs_per_cluster,
                num_procs,
                info.tasks(),
            );

            let (mut wblocking_w1, mut rblocking_w1) = (Interference::default(), Interference::default());
            if rw.num_writes != 0 && (rw.num_writes != 1 || rw.num_reads != 0) {
                wblocking_w1 = writer_fifo(tsk, &writes_per_cluster, 1, 0, rw.res_id, procs_per_cluster, dedicated_irq, info.tasks());
                rblocking_w1 = reader_all(tsk, &all_reads, 1, wblocking_w1.count, 0, rw.res_id, procs_per_cluster, num_procs, info.tasks());
            } else if rw.num_writes != 0 {
                wblocking_w1 = wblocking;
                rblocking_w1 = rblocking;
            }

            let (mut wblocking_r1, mut rblocking_r1) = (Interference::default(), Interference::default());
            if rw.num_reads != 0 && (rw.num_reads != 1 || rw.num_writes != 0) {
                wblocking_r1 = writer_fifo(tsk, &writes_per_cluster, 0, 1, rw.res_id, procs_per_cluster, dedicated_irq, info.tasks());
                rblocking_r1 = reader_all(tsk, &all_reads, 0, wblocking_r1.count, 1, rw.res_id, procs_per_cluster, num_procs, info.tasks());
            } else if rw.num_reads != 0 {
                wblocking_r1 = wblocking;
                rblocking_r1 = rblocking;
            }

            if rw.num_writes != 0 {
                wblocking_w1.total_length += rw.wlength;
                wblocking_w1.count += 1;
            }
            if rw.num_reads != 0 {
                rblocking_r1.total_length += rw.rlength;
                rblocking_r1.count += 1;
            }

            let span_w1 = wblocking_w1 + rblocking_w1;
            let span_r1 = wblocking_r1 + rblocking_r1;
            bterm += wblocking + rblocking;

            results.raise_request_span(tsk.id(), span_w1);
            results.raise_request_span(tsk.id(), span_r1);
        }

        results[tsk.id()] = bterm;
    }

    charge_arrival_blocking(info, &mut results);
    results
}

/// Phase-fair and task-fair RW locks share the same analysis
/// (`rw-phase-fair.cpp`'s `phase_fair_rw_bounds` is a thin alias over
/// `clustered_rw_omlp_bounds`).
pub fn phase_fair_bounds(info: &ResourceSharingInfo, procs_per_cluster: usize, dedicated_irq: Option<usize>) -> BlockingBounds {
    bounds(info, procs_per_cluster, dedicated_irq)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::ResourceSharingInfo;

    #[test]
    fn readers_do_not_block_each_other_on_one_cluster() {
        let mut info = ResourceSharingInfo::with_capacity(2);
        info.add_task(100, 10, 0, 0, 5, 0);
        info.add_request_rw(0, 1, 2, RequestType::Read, 0);
        info.add_task(100, 10, 0, 1, 5, 0);
        info.add_request_rw(0, 1, 2, RequestType::Read, 1);

        let bounds = bounds(&info, 4, None);
        // two readers on the same resource, no writers: readers never
        // block each other under phase-fair/task-fair RW locks.
        assert_eq!(bounds.blocking_term(0), 0);
        assert_eq!(bounds.blocking_term(1), 0);
    }

    #[test]
    fn writer_blocks_reader_once() {
        let mut info = ResourceSharingInfo::with_capacity(2);
        info.add_task(100, 10, 0, 0, 5, 0);
        info.add_request_rw(0, 1, 2, RequestType::Read, 0);
        info.add_task(100, 10, 1, 1, 5, 0);
        info.add_request_rw(0, 1, 5, RequestType::Write, 1);

        let bounds = bounds(&info, 2, None);
        assert!(bounds.blocking_term(0) >= 5);
    }
}
