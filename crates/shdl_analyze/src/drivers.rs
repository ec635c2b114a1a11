//! The driver map: sink → unique source.

use std::collections::HashMap;

use shdl_ir::BitRef;
use shdl_source::Span;

/// Maps every sink (primitive input pin or output port bit) to the source
/// that drives it, remembering where the driving connection was written.
pub struct DriverMap {
    map: HashMap<BitRef, (BitRef, Span)>,
}

impl DriverMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    /// Records `source` as the driver of `sink`.
    ///
    /// Returns the span of the previous driving connection when the sink was
    /// already driven (the multi-driver case); the first driver is kept.
    pub fn insert(&mut self, sink: BitRef, source: BitRef, span: Span) -> Option<Span> {
        match self.map.get(&sink) {
            Some(&(_, first_span)) => Some(first_span),
            None => {
                self.map.insert(sink, (source, span));
                None
            }
        }
    }

    /// The driver of a sink.
    pub fn get(&self, sink: &BitRef) -> Option<&BitRef> {
        self.map.get(sink).map(|(source, _)| source)
    }

    /// Whether any sink reads from `source`.
    pub fn reads(&self, source: &BitRef) -> bool {
        self.map.values().any(|(s, _)| s == source)
    }

    /// Number of driven sinks.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl Default for DriverMap {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shdl_common::Ident;

    fn port(raw: u32, bit: u32) -> BitRef {
        BitRef::PortBit {
            port: Ident::from_raw(raw),
            bit,
        }
    }

    #[test]
    fn first_driver_wins() {
        let mut map = DriverMap::new();
        assert!(map.insert(port(0, 1), port(1, 1), Span::DUMMY).is_none());
        assert!(map.insert(port(0, 1), port(2, 1), Span::DUMMY).is_some());
        assert_eq!(map.get(&port(0, 1)), Some(&port(1, 1)));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn reads_finds_sources() {
        let mut map = DriverMap::new();
        map.insert(port(0, 1), port(1, 1), Span::DUMMY);
        assert!(map.reads(&port(1, 1)));
        assert!(!map.reads(&port(0, 1)));
    }
}
