/*! Partitioned OMLP: one local FIFO spin queue per (processor, resource) pair.

Grounded in `native/src/blocking/part-omlp.cpp`'s `part_omlp_bounds`: this is
[`crate::blocking::clustered_omlp`] specialized to `procs_per_cluster == 1`
(spec.md §8 boundary behavior: "when `procs_per_cluster = 1`, clustered OMLP
reduces to partitioned OMLP"), kept as its own entry point because it is the
protocol spec.md §4.3 names directly and because its signature (no processor
count, no dedicated-IRQ core) is simpler than the general clustered case.
*/

use crate::resource::{BlockingBounds, ResourceSharingInfo};

/// The partitioned-OMLP blocking bound: each resource is local to exactly
/// one processor, contended for via a FIFO spin queue shared by the other
/// processors partitioned to the same cluster.
pub fn bounds(info: &ResourceSharingInfo) -> BlockingBounds {
    super::clustered_omlp::bounds(info, 1, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::ResourceSharingInfo;

    #[test]
    fn reduces_to_clustered_omlp_with_one_proc_per_cluster() {
        let mut info = ResourceSharingInfo::with_capacity(2);
        info.add_task(100, 10, 0, 0, 5, 0);
        info.add_request(0, 1, 3);
        info.add_task(100, 10, 1, 1, 5, 0);
        info.add_request(0, 1, 4);

        let part = bounds(&info);
        let clustered = super::super::clustered_omlp::bounds(&info, 1, None);

        for i in 0..info.tasks().len() {
            assert_eq!(part.blocking_term(i), clustered.blocking_term(i));
        }
    }
}
