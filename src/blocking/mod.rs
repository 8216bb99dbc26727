/*! Closed-form blocking bounds (spec.md §4.3).

Each protocol is one function taking a [`crate::resource::ResourceSharingInfo`]
(plus whatever protocol-specific topology it needs — a
[`crate::resource::ResourceLocality`], a processor count, …) and returning a
freshly built [`crate::resource::BlockingBounds`]. All share the skeleton
spec.md §4.3 describes: decompose contention
([`crate::contention::split_by_cluster`]/[`crate::contention::split_by_resource`]),
sort each contention set by descending request length
([`crate::contention::sort_by_request_length`]), greedily sum the longest
requests subject to a protocol-specific cap
([`crate::contention::bound_blocking`]), and finally charge arrival blocking
from the maximum local request span
([`crate::contention::charge_arrival_blocking`]).

Each submodule's doc comment names the `native/src/blocking/*.cpp` file it is
grounded on.
*/

pub mod clustered_omlp;
pub mod dpcp;
pub mod global_fifo;
pub mod global_pip;
pub mod mpcp;
pub mod msrp;
pub mod partitioned_omlp;
pub mod ppcp;
pub mod rw_omlp;
