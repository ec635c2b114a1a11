//! Phase 3 — expander (bit-slice) expansion.
//!
//! Every connection carrying `[:k]`, `[k:]`, or `[a:b]` on either side
//! unfolds into per-bit connections. Open slice ends resolve against the
//! referenced signal's declared width; source and destination slice widths
//! must agree. Afterwards every port or constant reference carries an
//! explicit single-bit index.

use crate::flat::{FlatConnection, FlatIndex, FlatSignal};
use crate::Flattener;
use shdl_common::Ident;
use shdl_diagnostics::{codes, Diagnostic};
use shdl_parser::ast::ComponentDecl;
use shdl_ir::PrimitiveKind;
use std::collections::HashMap;

/// Width lookup for one component's scope: its ports, its constants, and the
/// ports of the components its instances refer to.
pub(crate) struct WidthEnv<'a> {
    pub decl: &'a ComponentDecl,
    /// Rendered constant name → width.
    pub constants: &'a HashMap<Ident, u32>,
    /// Rendered instance name → referenced type.
    pub instance_types: &'a HashMap<Ident, Ident>,
}

impl Flattener<'_> {
    /// The declared width of whatever a signal reference names, or `None`
    /// when the name does not resolve (left for the analyzer to report).
    pub(crate) fn width_of(&self, sig: &FlatSignal, env: &WidthEnv<'_>) -> Option<u32> {
        match sig.instance {
            Some(instance) => {
                let ty = *env.instance_types.get(&instance)?;
                if PrimitiveKind::from_name(self.interner.resolve(ty)).is_some() {
                    return Some(1);
                }
                let sub = self.registry.get(ty)?;
                sub.inputs
                    .iter()
                    .chain(&sub.outputs)
                    .find(|p| p.name == sig.name)
                    .map(|p| p.width)
            }
            None => {
                if let Some(port) = env
                    .decl
                    .inputs
                    .iter()
                    .chain(&env.decl.outputs)
                    .find(|p| p.name == sig.name)
                {
                    return Some(port.width);
                }
                env.constants.get(&sig.name).copied()
            }
        }
    }

    /// Expands slices in all connections and normalizes bare references to
    /// explicit bit 1.
    pub(crate) fn expand_slices(
        &mut self,
        connections: Vec<FlatConnection>,
        env: &WidthEnv<'_>,
    ) -> Vec<FlatConnection> {
        let mut out = Vec::new();
        for conn in connections {
            self.expand_connection(conn, env, &mut out);
        }
        out
    }

    fn expand_connection(
        &mut self,
        conn: FlatConnection,
        env: &WidthEnv<'_>,
        out: &mut Vec<FlatConnection>,
    ) {
        let src_range = self.resolve_slice(&conn.source, env);
        let dst_range = self.resolve_slice(&conn.dest, env);

        match (src_range, dst_range) {
            // A diagnostic was already emitted for an unresolvable side.
            (None, _) | (_, None) => {}
            (Some(Some((src_lo, src_hi))), Some(Some((dst_lo, dst_hi)))) => {
                let src_w = src_hi - src_lo + 1;
                let dst_w = dst_hi - dst_lo + 1;
                if src_w != dst_w {
                    self.sink.emit(
                        Diagnostic::error(
                            codes::WIDTH_MISMATCH,
                            format!(
                                "slice widths differ: source covers {src_w} bits, destination {dst_w}"
                            ),
                            conn.span,
                        )
                        .with_note("source and destination of a sliced connection must cover the same number of bits"),
                    );
                    return;
                }
                for i in 0..src_w {
                    out.push(FlatConnection {
                        source: with_bit(&conn.source, src_lo + i),
                        dest: with_bit(&conn.dest, dst_lo + i),
                        span: conn.span,
                    });
                }
            }
            (Some(Some((lo, hi))), Some(None)) | (Some(None), Some(Some((lo, hi)))) => {
                let w = hi - lo + 1;
                if w != 1 {
                    self.sink.emit(Diagnostic::error(
                        codes::WIDTH_MISMATCH,
                        format!("a {w}-bit slice cannot connect to a single bit"),
                        conn.span,
                    ));
                    return;
                }
                // Width-1 slice collapses to a plain bit.
                let (source, dest) = if matches!(conn.source.index, Some(FlatIndex::Slice { .. })) {
                    (with_bit(&conn.source, lo), self.normalize(conn.dest, env))
                } else {
                    (self.normalize(conn.source, env), with_bit(&conn.dest, lo))
                };
                out.push(FlatConnection {
                    source,
                    dest,
                    span: conn.span,
                });
            }
            (Some(None), Some(None)) => {
                let source = self.normalize(conn.source, env);
                let dest = self.normalize(conn.dest, env);
                out.push(FlatConnection {
                    source,
                    dest,
                    span: conn.span,
                });
            }
        }
    }

    /// Resolves a side's slice bounds.
    ///
    /// Returns `None` when a diagnostic was emitted, `Some(None)` for a
    /// non-slice reference, and `Some(Some((lo, hi)))` for a resolved slice.
    #[allow(clippy::option_option)]
    fn resolve_slice(
        &mut self,
        sig: &FlatSignal,
        env: &WidthEnv<'_>,
    ) -> Option<Option<(i64, i64)>> {
        let Some(FlatIndex::Slice { start, end }) = sig.index else {
            return Some(None);
        };

        let lo = start.unwrap_or(1);
        let hi = match end {
            Some(hi) => hi,
            None => match self.width_of(sig, env) {
                Some(w) => w as i64,
                None => {
                    self.sink.emit(
                        Diagnostic::error(
                            codes::INVALID_SLICE,
                            format!(
                                "cannot resolve the open end of this slice: '{}' has no known width",
                                self.interner.resolve(sig.name)
                            ),
                            sig.span,
                        )
                        .with_help("write an explicit upper bound"),
                    );
                    return None;
                }
            },
        };

        if lo < 1 || hi < lo {
            self.sink.emit(Diagnostic::error(
                codes::INVALID_SLICE,
                format!("slice [{lo}:{hi}] is empty or starts below bit 1"),
                sig.span,
            ));
            return None;
        }

        Some(Some((lo, hi)))
    }

    /// Gives a non-slice reference an explicit bit index. A bare reference
    /// to a multi-bit signal reads bit 1 and warns.
    pub(crate) fn normalize(&mut self, sig: FlatSignal, env: &WidthEnv<'_>) -> FlatSignal {
        match sig.index {
            Some(FlatIndex::Bit(n)) => {
                if n < 1 {
                    self.sink.emit(Diagnostic::error(
                        codes::INDEX_OUT_OF_RANGE,
                        format!("bit indices are 1-based; [{n}] is out of range"),
                        sig.span,
                    ));
                    return FlatSignal {
                        index: Some(FlatIndex::Bit(1)),
                        ..sig
                    };
                }
                if self.width_of(&sig, env) == Some(1) && n > 1 {
                    self.sink.emit(Diagnostic::error(
                        codes::SCALAR_SUBSCRIPT,
                        format!(
                            "'{}' is single-bit and cannot be indexed with [{n}]",
                            self.interner.resolve(sig.name)
                        ),
                        sig.span,
                    ));
                }
                sig
            }
            Some(FlatIndex::Slice { .. }) => sig,
            None => {
                if let Some(w) = self.width_of(&sig, env) {
                    if w > 1 {
                        self.sink.emit(Diagnostic::warning(
                            codes::MISSING_INDEX,
                            format!(
                                "'{}' is {w} bits wide but referenced without an index; bit 1 is assumed",
                                self.interner.resolve(sig.name)
                            ),
                            sig.span,
                        ));
                    }
                }
                FlatSignal {
                    index: Some(FlatIndex::Bit(1)),
                    ..sig
                }
            }
        }
    }
}

fn with_bit(sig: &FlatSignal, bit: i64) -> FlatSignal {
    FlatSignal {
        instance: sig.instance,
        name: sig.name,
        index: Some(FlatIndex::Bit(bit)),
        span: sig.span,
    }
}
