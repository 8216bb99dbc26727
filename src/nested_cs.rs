/*! Nested critical sections: the data model [`crate::lp_blocking::nested_fifo`]
builds its LP over.

Grounded in `native/include/nested_cs.h` and `native/src/blocking/nested_cs.cpp`.
A [`CriticalSection`] records only its *inner* length (excluding anything
nested inside it) and, for a nested request, the index of its immediately
enclosing critical section within the same task. From that parent chain we
derive the two relations the nested-FIFO-spinlock LP needs: "resources
already held when this section begins" ([`CriticalSection::outer_locks`])
and, across the whole task set, "resources that could transitively be
requested while holding resource *q*"
([`CriticalSectionsOfTaskset::transitive_nesting_relationship`]).
*/

use std::collections::{HashMap, HashSet};

/// Sentinel meaning "this critical section is outermost" (the original's
/// `CriticalSection::NO_PARENT == -1`).
pub const NO_PARENT: i32 = -1;

/// One critical section within a task's nested-locking profile.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CriticalSection {
    pub resource_id: usize,
    /// Length of this section alone, excluding any nested child sections.
    pub length: u64,
    /// Index, within the same [`CriticalSectionsOfTask`], of the
    /// critical section this one is nested inside; [`NO_PARENT`] if
    /// outermost.
    pub outer: i32,
}

impl CriticalSection {
    pub fn new(resource_id: usize, length: u64, outer: i32) -> Self {
        CriticalSection { resource_id, length, outer }
    }

    pub fn outermost(resource_id: usize, length: u64) -> Self {
        CriticalSection::new(resource_id, length, NO_PARENT)
    }

    pub fn is_nested(&self) -> bool {
        self.outer != NO_PARENT
    }

    pub fn is_outermost(&self) -> bool {
        self.outer == NO_PARENT
    }

    /// The set of resources already held by `task` at the moment this
    /// critical section is entered (all of its transitive parents'
    /// resource ids).
    pub fn outer_locks(&self, task: &CriticalSectionsOfTask) -> HashSet<usize> {
        let mut held = HashSet::new();
        let mut cur = self.outer;
        while cur != NO_PARENT {
            let parent = &task.cs[cur as usize];
            held.insert(parent.resource_id);
            cur = parent.outer;
        }
        held
    }

    /// Does this section (within `this_task`) share an outer lock with
    /// `already_held_by_other` — i.e. could it ever execute while the
    /// other job is inside one of those same outer sections?
    pub fn has_common_outer(&self, this_task: &CriticalSectionsOfTask, already_held_by_other: &HashSet<usize>) -> bool {
        let mut held = self.outer;
        while held != NO_PARENT {
            let parent = this_task.cs[held as usize].resource_id;
            if already_held_by_other.contains(&parent) {
                return true;
            }
            held = this_task.cs[held as usize].outer;
        }
        false
    }
}

/// One task's nested-locking profile: an ordered list of
/// [`CriticalSection`]s, parent indices referring back into this same
/// list.
#[derive(Clone, Debug, Default)]
pub struct CriticalSectionsOfTask {
    cs: Vec<CriticalSection>,
}

impl CriticalSectionsOfTask {
    pub fn new() -> Self {
        CriticalSectionsOfTask::default()
    }

    /// Append a critical section; returns its index for use as a future
    /// `outer` parent.
    pub fn add(&mut self, resource_id: usize, length: u64, outer: i32) -> usize {
        self.cs.push(CriticalSection::new(resource_id, length, outer));
        self.cs.len() - 1
    }

    pub fn cs(&self) -> &[CriticalSection] {
        &self.cs
    }

    /// Does the section at `cs_index` have any section nested directly
    /// inside it?
    pub fn has_nested_requests(&self, cs_index: usize) -> bool {
        self.cs[cs_index + 1..]
            .iter()
            .any(|c| c.outer == cs_index as i32)
    }

    /// Walk up the parent chain from `cs_index` to find its outermost
    /// ancestor (itself, if already outermost).
    pub fn get_outermost(&self, cs_index: usize) -> usize {
        let mut cur = cs_index;
        while self.cs[cur].is_nested() {
            cur = self.cs[cur].outer as usize;
        }
        cur
    }
}

/// A whole task set's nested-locking profile, one [`CriticalSectionsOfTask`]
/// per task in the same order as the corresponding
/// [`crate::resource::ResourceSharingInfo`].
#[derive(Clone, Debug, Default)]
pub struct CriticalSectionsOfTaskset {
    tasks: Vec<CriticalSectionsOfTask>,
}

impl CriticalSectionsOfTaskset {
    pub fn new() -> Self {
        CriticalSectionsOfTaskset::default()
    }

    pub fn new_task(&mut self) -> &mut CriticalSectionsOfTask {
        self.tasks.push(CriticalSectionsOfTask::new());
        self.tasks.last_mut().unwrap()
    }

    pub fn tasks(&self) -> &[CriticalSectionsOfTask] {
        &self.tasks
    }

    /// For each resource `q`, the set of resources that could
    /// transitively be requested while holding `q` (across every task in
    /// the set). Grounded in `nested_cs.cpp`'s
    /// `get_transitive_nesting_relationship` / `build_trans_nest_rel`.
    ///
    /// Assumes the nesting relation is acyclic (as the original does —
    /// nested locking protocols require a total lock order).
    pub fn transitive_nesting_relationship(&self) -> HashMap<usize, HashSet<usize>> {
        let mut directly_nested: HashMap<usize, HashSet<usize>> = HashMap::new();
        for task in &self.tasks {
            for cs in task.cs() {
                directly_nested.entry(cs.resource_id).or_default();
                if let Some(outer) = usize::try_from(cs.outer).ok() {
                    let parent_res = task.cs()[outer].resource_id;
                    directly_nested.entry(parent_res).or_default().insert(cs.resource_id);
                }
            }
        }

        let mut nested: HashMap<usize, HashSet<usize>> = HashMap::new();
        let resources: Vec<usize> = directly_nested.keys().copied().collect();
        for res in resources {
            build_transitive(&directly_nested, &mut nested, res);
        }
        nested
    }
}

fn build_transitive(
    directly_nested: &HashMap<usize, HashSet<usize>>,
    nested: &mut HashMap<usize, HashSet<usize>>,
    res: usize,
) {
    if nested.contains_key(&res) {
        return;
    }
    nested.insert(res, HashSet::new());
    let children: Vec<usize> = directly_nested.get(&res).into_iter().flatten().copied().collect();
    for child in children {
        build_transitive(directly_nested, nested, child);
        let child_transitive = nested.get(&child).cloned().unwrap_or_default();
        let entry = nested.get_mut(&res).unwrap();
        entry.insert(child);
        entry.extend(child_transitive);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outer_locks_walks_the_parent_chain() {
        let mut task = CriticalSectionsOfTask::new();
        let q = task.add(0, 2, NO_PARENT);
        let _r = task.add(1, 3, q as i32);
        let held = task.cs()[1].outer_locks(&task);
        assert_eq!(held, HashSet::from([0]));
    }

    #[test]
    fn outermost_section_has_no_outer_locks() {
        let mut task = CriticalSectionsOfTask::new();
        task.add(0, 2, NO_PARENT);
        assert!(task.cs()[0].outer_locks(&task).is_empty());
        assert!(task.cs()[0].is_outermost());
    }

    #[test]
    fn transitive_nesting_relationship_follows_chains() {
        let mut tsks = CriticalSectionsOfTaskset::new();
        {
            let t = tsks.new_task();
            let q = t.add(0, 1, NO_PARENT);
            let r = t.add(1, 1, q as i32);
            t.add(2, 1, r as i32);
        }
        let rel = tsks.transitive_nesting_relationship();
        assert_eq!(rel[&0], HashSet::from([1, 2]));
        assert_eq!(rel[&1], HashSet::from([2]));
        assert!(rel[&2].is_empty());
    }

    #[test]
    fn get_outermost_returns_root_ancestor() {
        let mut task = CriticalSectionsOfTask::new();
        let q = task.add(0, 1, NO_PARENT);
        let r = task.add(1, 1, q as i32);
        task.add(2, 1, r as i32);
        assert_eq!(task.get_outermost(2), 0);
        assert!(task.has_nested_requests(0));
        assert!(!task.has_nested_requests(2));
    }
}
