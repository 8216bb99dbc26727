/*! FMLP+ blocking bound (spec.md §4.4.7).

Grounded in `native/src/blocking/linprog/lp_fmlp.cpp`. FMLP+'s
suspension-based FIFO queueing and [`super::partitioned`]'s shared
suspension-oblivious skeleton agree on the same worst-case bound — a
blocked job is delayed by at most one episode per lower-or-equal
priority contender per arrival, regardless of whether that contender's
own job busy-waits or suspends while queued — so this is simply the
unmodified base skeleton.
*/

use crate::lp::solver::Solver;
use crate::resource::{BlockingBounds, ResourceSharingInfo};

pub use super::partitioned::EPSILON;

pub fn bounds<S: Solver>(info: &ResourceSharingInfo, solver: &S, use_merged_lp: bool) -> BlockingBounds {
    super::partitioned::bounds(info, solver, use_merged_lp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lp::solver::brute_force::BruteForceSolver;

    #[test]
    fn agrees_with_the_shared_skeleton() {
        let mut info = ResourceSharingInfo::with_capacity(2);
        info.add_task(100, 10, 0, 0, 3, 0);
        info.add_request(0, 1, 4);
        info.add_task(100, 10, 0, 1, 3, 0);
        info.add_request(0, 1, 4);

        let solver = BruteForceSolver { num_vars: 16 };
        assert_eq!(bounds(&info, &solver, false).blocking_term(0), super::super::partitioned::bounds(&info, &solver, false).blocking_term(0));
    }
}
