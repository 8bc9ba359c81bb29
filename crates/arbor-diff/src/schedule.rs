//! Layered topological ordering of emitted operations.

use std::collections::BTreeSet;

use tracing::debug;

use crate::emit::OpId;
use crate::error::{DiffError, DiffResult};

/// Group operations into phases.
///
/// `deps[op]` lists the operations `op` must follow. Every operation lands in
/// the phase right after its latest dependency (Kahn's algorithm, one layer
/// at a time), and keeps emission order inside its phase.
pub fn schedule(deps: &[BTreeSet<OpId>]) -> DiffResult<Vec<Vec<OpId>>> {
    let mut remaining: Vec<usize> = deps.iter().map(BTreeSet::len).collect();
    let mut dependents: Vec<Vec<OpId>> = vec![Vec::new(); deps.len()];
    for (op, set) in deps.iter().enumerate() {
        for &dep in set {
            dependents[dep].push(op);
        }
    }

    let mut layer: Vec<OpId> = (0..deps.len()).filter(|&op| remaining[op] == 0).collect();
    let mut phases = Vec::new();
    let mut scheduled = 0;
    while !layer.is_empty() {
        scheduled += layer.len();
        let mut next = Vec::new();
        for &op in &layer {
            for &dependent in &dependents[op] {
                remaining[dependent] -= 1;
                if remaining[dependent] == 0 {
                    next.push(dependent);
                }
            }
        }
        next.sort_unstable();
        phases.push(layer);
        layer = next;
    }

    if scheduled < deps.len() {
        return Err(DiffError::SchedulingCycle {
            pending: deps.len() - scheduled,
        });
    }
    debug!(operations = scheduled, phases = phases.len(), "scheduled");
    Ok(phases)
}
