/*! Packed-key variable numbering for blocking LPs.

Grounded in `native/include/linprog/varmapperbase.h`'s `VarMapperBase` and
`native/include/lp_common.h`'s `VarMapper`/`VarMapperSpinlocks`. The
original packs `(blocking_type, task_id, req_id, res_id)` into a single
`uint64_t` hash-map key; here the same packing is kept (so debug key
dumps read the same way) but the map is a plain `HashMap<u64, u32>`
instead of a hand-rolled open-addressing `hashmap`.
*/

use std::collections::HashMap;

/// Mirrors `lp_common.h`'s `blocking_type` enum. `Other` covers the
/// catch-all reuse the original makes for auxiliary booleans (e.g.
/// `VarMapperSpinlocks::lookup_arrival_enabled`/`lookup_max_preemptions`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockingType {
    Direct,
    Indirect,
    Preempt,
    Other,
}

impl BlockingType {
    fn bits(self) -> u64 {
        match self {
            BlockingType::Direct => 0,
            BlockingType::Indirect => 1,
            BlockingType::Preempt => 2,
            BlockingType::Other => 3,
        }
    }
}

const TASK_BITS: u32 = 30;
const REQ_BITS: u32 = 22;
const RES_BITS: u32 = 10;

const TASK_MASK: u64 = (1 << TASK_BITS) - 1;
const REQ_MASK: u64 = (1 << REQ_BITS) - 1;
const RES_MASK: u64 = (1 << RES_BITS) - 1;

fn pack(blocking_type: BlockingType, task_id: usize, req_id: usize, res_id: usize) -> u64 {
    assert!((task_id as u64) <= TASK_MASK, "task id out of range");
    assert!((req_id as u64) <= REQ_MASK, "request id out of range");
    assert!((res_id as u64) <= RES_MASK, "resource id out of range");

    (blocking_type.bits() << 62) | ((task_id as u64) << 32) | ((req_id as u64) << 10) | (res_id as u64)
}

/// Variable-numbering table shared by a single LP instance's
/// constraint-building pass. Grounded in `VarMapperBase` (insertion /
/// sealing discipline) and `VarMapper` (the blocking-specific key
/// packing and the lookup convenience methods).
#[derive(Debug, Default)]
pub struct VarMapper {
    map: HashMap<u64, u32>,
    next_var: u32,
    sealed: bool,
}

impl VarMapper {
    pub fn new() -> Self {
        VarMapper::default()
    }

    fn exists(&self, key: u64) -> bool {
        self.map.contains_key(&key)
    }

    fn insert(&mut self, key: u64) -> u32 {
        assert!(!self.sealed, "cannot allocate a new variable after seal()");
        let idx = self.next_var;
        self.next_var += 1;
        self.map.insert(key, idx);
        idx
    }

    fn var_for_key(&mut self, key: u64) -> u32 {
        if let Some(&var) = self.map.get(&key) {
            var
        } else {
            self.insert(key)
        }
    }

    /// Look up (allocating if new and not yet sealed) the variable for
    /// a request-instance-scoped blocking indicator. Grounded in
    /// `VarMapper::lookup`.
    pub fn lookup(&mut self, task_id: usize, res_id: usize, req_id: usize, blocking_type: BlockingType) -> u32 {
        let key = pack(blocking_type, task_id, req_id, res_id);
        self.var_for_key(key)
    }

    /// Look up the variable if it has already been allocated, without
    /// creating it. Used by constraint passes that must distinguish
    /// "no such blocking possible" from "blocking possible, coefficient
    /// zero".
    pub fn lookup_existing(&self, task_id: usize, res_id: usize, req_id: usize, blocking_type: BlockingType) -> Option<u32> {
        let key = pack(blocking_type, task_id, req_id, res_id);
        self.map.get(&key).copied()
    }

    /// Resource-scoped "arrival enabled" indicator, reusing
    /// `task_id = 0`, `req_id = 0`, `Preempt` per
    /// `VarMapperSpinlocks::lookup_arrival_enabled`.
    pub fn lookup_arrival_enabled(&mut self, res_id: usize) -> u32 {
        self.lookup(0, res_id, 0, BlockingType::Preempt)
    }

    /// Resource-scoped "maximum preemption count" variable, reusing
    /// `task_id = 0`, `req_id = 0`, `Other` per
    /// `VarMapperSpinlocks::lookup_max_preemptions`.
    pub fn lookup_max_preemptions(&mut self, res_id: usize) -> u32 {
        self.lookup(0, res_id, 0, BlockingType::Other)
    }

    /// Task-scoped interference variable (global suspension-aware LPs'
    /// `regular`/`co_boosting`/`stalling` interference terms). Grounded
    /// in `lp_global.h`'s `GlobalVarMapper::regular_interference` family
    /// — packed the same way as a blocking variable but with
    /// `res_id = req_id = 0` and a dedicated `BlockingType`.
    pub fn lookup_interference(&mut self, task_id: usize, kind: InterferenceKind) -> u32 {
        let blocking_type = match kind {
            InterferenceKind::Regular => BlockingType::Direct,
            InterferenceKind::CoBoosting => BlockingType::Indirect,
            InterferenceKind::Stalling => BlockingType::Preempt,
        };
        self.lookup(task_id, 0, 0, blocking_type)
    }

    pub fn seal(&mut self) {
        self.sealed = true;
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub fn num_vars(&self) -> u32 {
        self.next_var
    }
}

/// The three interference kinds a suspension-aware global LP tracks per
/// other task, per `lp_global.cpp`'s `declare_interference_variables`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterferenceKind {
    Regular,
    CoBoosting,
    Stalling,
}
