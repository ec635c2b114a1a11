//! Detection of combinational feedback.
//!
//! Feedback through gates is SHDL's only state mechanism: a two-NOR latch is
//! a pair of gates on a cycle. The analyzer records which instances sit on a
//! cycle so tooling can display them, but never rejects them.

use std::collections::{HashMap, HashSet};

use shdl_common::Ident;
use shdl_ir::{BaseComponent, BitRef, InstanceId};

/// Returns the instances that can reach themselves through gate-to-gate
/// connections, in arena order.
pub fn feedback_instances(component: &BaseComponent) -> Vec<InstanceId> {
    let name_to_id: HashMap<Ident, InstanceId> = component
        .instances
        .iter()
        .map(|(id, inst)| (inst.name, id))
        .collect();

    // Edge per pin-to-pin connection: driving instance → driven instance.
    let mut edges: HashMap<InstanceId, Vec<InstanceId>> = HashMap::new();
    for conn in &component.connections {
        if let (
            BitRef::Pin { instance: src, .. },
            BitRef::Pin { instance: dst, .. },
        ) = (&conn.source, &conn.dest)
        {
            if let (Some(&s), Some(&d)) = (name_to_id.get(src), name_to_id.get(dst)) {
                edges.entry(s).or_default().push(d);
            }
        }
    }

    component
        .instances
        .iter()
        .map(|(id, _)| id)
        .filter(|&id| reaches(id, id, &edges))
        .collect()
}

/// Whether `target` is reachable from `from` by one or more edges.
fn reaches(
    from: InstanceId,
    target: InstanceId,
    edges: &HashMap<InstanceId, Vec<InstanceId>>,
) -> bool {
    let mut visited = HashSet::new();
    let mut stack: Vec<InstanceId> = edges.get(&from).cloned().unwrap_or_default();
    while let Some(node) = stack.pop() {
        if node == target {
            return true;
        }
        if visited.insert(node) {
            if let Some(next) = edges.get(&node) {
                stack.extend(next.iter().copied());
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use shdl_common::Interner;
    use shdl_ir::{BaseInstance, BitConnection, PrimitiveKind};
    use shdl_source::Span;

    #[test]
    fn cross_coupled_pair_detected() {
        let interner = Interner::new();
        let mut comp = BaseComponent::new(interner.get_or_intern("L"), vec![], vec![]);
        for name in ["p", "q", "free"] {
            comp.instances.alloc(BaseInstance {
                name: interner.get_or_intern(name),
                kind: PrimitiveKind::Or,
                span: Span::DUMMY,
            });
        }
        let pin = |inst: &str, pin: &str| BitRef::Pin {
            instance: interner.get_or_intern(inst),
            pin: interner.get_or_intern(pin),
        };
        // p.O -> q.A, q.O -> p.A: a cycle. free is not on it.
        for (s, d) in [
            (pin("p", "O"), pin("q", "A")),
            (pin("q", "O"), pin("p", "A")),
            (pin("p", "O"), pin("free", "A")),
        ] {
            comp.connections.push(BitConnection {
                source: s,
                dest: d,
                span: Span::DUMMY,
            });
        }

        let feedback = feedback_instances(&comp);
        assert_eq!(feedback.len(), 2);
    }

    #[test]
    fn acyclic_graph_has_no_feedback() {
        let interner = Interner::new();
        let mut comp = BaseComponent::new(interner.get_or_intern("C"), vec![], vec![]);
        for name in ["a", "b"] {
            comp.instances.alloc(BaseInstance {
                name: interner.get_or_intern(name),
                kind: PrimitiveKind::And,
                span: Span::DUMMY,
            });
        }
        comp.connections.push(BitConnection {
            source: BitRef::Pin {
                instance: interner.get_or_intern("a"),
                pin: interner.get_or_intern("O"),
            },
            dest: BitRef::Pin {
                instance: interner.get_or_intern("b"),
                pin: interner.get_or_intern("A"),
            },
            span: Span::DUMMY,
        });

        assert!(feedback_instances(&comp).is_empty());
    }
}
