//! Lane assignment: bucketing gates by kind into 64-wide chunks.

use std::collections::HashMap;

use shdl_ir::{BaseComponent, InstanceId, PrimitiveKind};

/// Where one gate lives in the packed state: its kind's chunk array and the
/// bit position inside the chunk.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Lane {
    /// The gate kind.
    pub kind: PrimitiveKind,
    /// Which 64-bit word of this kind.
    pub chunk: u32,
    /// Bit position within the word, 0–63.
    pub lane: u32,
}

/// Maps every instance to its `(kind, chunk, lane)` slot.
///
/// Lanes follow the Base component's instance order (which the flattener
/// makes deterministic), so identical IR always packs identically — the
/// property byte-identical emission rests on.
pub struct LaneMap {
    by_instance: HashMap<InstanceId, Lane>,
    per_kind: HashMap<PrimitiveKind, Vec<InstanceId>>,
}

impl LaneMap {
    /// Assigns lanes for a component: the i-th instance of a kind occupies
    /// lane `i % 64` of chunk `i / 64`.
    pub fn build(component: &BaseComponent) -> Self {
        let mut per_kind: HashMap<PrimitiveKind, Vec<InstanceId>> = HashMap::new();
        for (id, inst) in component.instances.iter() {
            per_kind.entry(inst.kind).or_default().push(id);
        }

        let mut by_instance = HashMap::new();
        for (&kind, ids) in &per_kind {
            for (i, &id) in ids.iter().enumerate() {
                by_instance.insert(
                    id,
                    Lane {
                        kind,
                        chunk: (i / 64) as u32,
                        lane: (i % 64) as u32,
                    },
                );
            }
        }

        Self {
            by_instance,
            per_kind,
        }
    }

    /// The lane of an instance.
    pub fn lane(&self, id: InstanceId) -> Option<Lane> {
        self.by_instance.get(&id).copied()
    }

    /// How many chunks a kind occupies.
    pub fn chunk_count(&self, kind: PrimitiveKind) -> u32 {
        match self.per_kind.get(&kind) {
            Some(ids) => ids.len().div_ceil(64) as u32,
            None => 0,
        }
    }

    /// The instances of a kind in lane order.
    pub fn instances_of(&self, kind: PrimitiveKind) -> &[InstanceId] {
        self.per_kind.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Mask of the lanes actually occupied in a chunk.
    pub fn active_mask(&self, kind: PrimitiveKind, chunk: u32) -> u64 {
        let Some(ids) = self.per_kind.get(&kind) else {
            return 0;
        };
        let start = chunk as usize * 64;
        let occupied = ids.len().saturating_sub(start).min(64);
        if occupied == 0 {
            0
        } else if occupied == 64 {
            u64::MAX
        } else {
            (1u64 << occupied) - 1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shdl_common::Interner;
    use shdl_ir::BaseInstance;
    use shdl_source::Span;

    fn component_with(kinds: &[PrimitiveKind]) -> (BaseComponent, Interner) {
        let interner = Interner::new();
        let mut comp = BaseComponent::new(interner.get_or_intern("T"), vec![], vec![]);
        for (i, &kind) in kinds.iter().enumerate() {
            comp.instances.alloc(BaseInstance {
                name: interner.get_or_intern(&format!("g{i}")),
                kind,
                span: Span::DUMMY,
            });
        }
        (comp, interner)
    }

    #[test]
    fn sequential_lanes_per_kind() {
        let (comp, _) = component_with(&[
            PrimitiveKind::And,
            PrimitiveKind::Xor,
            PrimitiveKind::And,
            PrimitiveKind::And,
        ]);
        let map = LaneMap::build(&comp);

        let and_ids = map.instances_of(PrimitiveKind::And);
        assert_eq!(and_ids.len(), 3);
        for (i, &id) in and_ids.iter().enumerate() {
            let lane = map.lane(id).unwrap();
            assert_eq!(lane.kind, PrimitiveKind::And);
            assert_eq!(lane.chunk, 0);
            assert_eq!(lane.lane, i as u32);
        }
        assert_eq!(map.chunk_count(PrimitiveKind::And), 1);
        assert_eq!(map.chunk_count(PrimitiveKind::Or), 0);
    }

    #[test]
    fn sixty_fifth_gate_starts_chunk_one() {
        let kinds = vec![PrimitiveKind::Not; 65];
        let (comp, _) = component_with(&kinds);
        let map = LaneMap::build(&comp);

        assert_eq!(map.chunk_count(PrimitiveKind::Not), 2);
        let ids = map.instances_of(PrimitiveKind::Not);
        let last = map.lane(ids[64]).unwrap();
        assert_eq!(last.chunk, 1);
        assert_eq!(last.lane, 0);
    }

    #[test]
    fn active_masks_cover_occupied_lanes() {
        let kinds = vec![PrimitiveKind::Xor; 65];
        let (comp, _) = component_with(&kinds);
        let map = LaneMap::build(&comp);

        assert_eq!(map.active_mask(PrimitiveKind::Xor, 0), u64::MAX);
        assert_eq!(map.active_mask(PrimitiveKind::Xor, 1), 1);
        assert_eq!(map.active_mask(PrimitiveKind::Xor, 2), 0);
        assert_eq!(map.active_mask(PrimitiveKind::And, 0), 0);
    }

    #[test]
    fn three_gates_mask() {
        let (comp, _) = component_with(&[PrimitiveKind::Or; 3]);
        let map = LaneMap::build(&comp);
        assert_eq!(map.active_mask(PrimitiveKind::Or, 0), 0b111);
    }
}
