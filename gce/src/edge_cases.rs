//! Edge case tests for gce

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::collections::HashMap;

    use crate::{
        ConnectionGraph, EndPointRef, ExecutionContext, GcRecord, GcStore, Row, Signature, SubGc,
        Value,
    };

    #[derive(Clone, Default)]
    struct TestStore(Arc<Mutex<HashMap<Signature, Arc<GcRecord>>>>);

    impl TestStore {
        fn new() -> Self {
            Self::default()
        }
        fn insert(&self, record: Arc<GcRecord>) {
            self.0.lock().unwrap().insert(record.signature, record);
        }
    }

    impl GcStore for TestStore {
        fn get(&self, signature: Signature) -> Option<Arc<GcRecord>> {
            self.0.lock().unwrap().get(&signature).cloned()
        }
    }

    fn sig(tag: u16) -> Signature {
        let mut bytes = [0u8; 32];
        bytes[30..32].copy_from_slice(&tag.to_be_bytes());
        Signature(bytes)
    }

    fn codon(
        signature: Signature,
        num_inputs: u16,
        num_outputs: u16,
        inline: &str,
        f: impl Fn(&[Value]) -> Vec<Value> + Send + Sync + 'static,
    ) -> Arc<GcRecord> {
        Arc::new(GcRecord {
            signature,
            cgraph: ConnectionGraph::default(),
            gca: SubGc::Null,
            gcb: SubGc::Null,
            is_codon: true,
            is_conditional: false,
            control_row: None,
            num_inputs,
            num_outputs,
            inline: Some(inline.to_string()),
            imports: Vec::new(),
            num_codons: 1,
            codon_fn: Some(Arc::new(f)),
        })
    }

    fn iref(row: Row, idx: u16) -> EndPointRef {
        EndPointRef { row, idx }
    }

    /// EDGE CASE: a composed function with no declared inputs at all.
    #[test]
    fn test_edge_zero_inputs() {
        let gca = codon(sig(1), 0, 1, "1", |_| vec![Value::Int(1)]);
        let root = Arc::new(GcRecord {
            signature: sig(2),
            cgraph: ConnectionGraph {
                ad: Vec::new(),
                bd: Vec::new(),
                od: vec![iref(Row::A, 0)],
                fd: None,
                ld: None,
                wd: None,
            },
            gca: SubGc::Record(gca),
            gcb: SubGc::Null,
            is_codon: false,
            is_conditional: false,
            control_row: None,
            num_inputs: 0,
            num_outputs: 1,
            inline: None,
            imports: Vec::new(),
            num_codons: 1,
            codon_fn: None,
        });

        let store = TestStore::new();
        let mut ctx = ExecutionContext::new(Box::new(store), 8);
        ctx.write_executable(root.clone()).expect("zero-input composition should compile");
        let out = ctx.execute(root.signature, &[]).expect("execute should succeed");
        assert_eq!(out, vec![Value::Int(1)]);
    }

    /// EDGE CASE: a composed function with no declared outputs at all.
    #[test]
    fn test_edge_zero_outputs() {
        let gca = codon(sig(3), 1, 0, "discard({i0})", |_| Vec::new());
        let root = Arc::new(GcRecord {
            signature: sig(4),
            cgraph: ConnectionGraph {
                ad: vec![iref(Row::I, 0)],
                bd: Vec::new(),
                od: Vec::new(),
                fd: None,
                ld: None,
                wd: None,
            },
            gca: SubGc::Record(gca),
            gcb: SubGc::Null,
            is_codon: false,
            is_conditional: false,
            control_row: None,
            num_inputs: 1,
            num_outputs: 0,
            inline: None,
            imports: Vec::new(),
            num_codons: 1,
            codon_fn: None,
        });

        let store = TestStore::new();
        let mut ctx = ExecutionContext::new(Box::new(store), 8);
        ctx.write_executable(root.clone()).expect("zero-output composition should compile");
        let out = ctx.execute(root.signature, &[Value::Int(7)]).expect("execute should succeed");
        assert!(out.is_empty());
    }

    /// EDGE CASE: a composition with exactly one child branch (`gcb`
    /// absent), represented as `gcb_node: None` rather than a sentinel
    /// node.
    #[test]
    fn test_edge_single_child_branch() {
        let gca = codon(sig(5), 1, 1, "({i0} >> 1)", |args| vec![Value::Int(args[0].as_int() >> 1)]);
        let root = Arc::new(GcRecord {
            signature: sig(6),
            cgraph: ConnectionGraph {
                ad: vec![iref(Row::I, 0)],
                bd: Vec::new(),
                od: vec![iref(Row::A, 0)],
                fd: None,
                ld: None,
                wd: None,
            },
            gca: SubGc::Record(gca),
            gcb: SubGc::Null,
            is_codon: false,
            is_conditional: false,
            control_row: None,
            num_inputs: 1,
            num_outputs: 1,
            inline: None,
            imports: Vec::new(),
            num_codons: 1,
            codon_fn: None,
        });

        let store = TestStore::new();
        let mut ctx = ExecutionContext::new(Box::new(store), 8);
        ctx.write_executable(root.clone()).expect("single-branch composition should compile");
        let out = ctx.execute(root.signature, &[Value::Int(8)]).expect("execute should succeed");
        assert_eq!(out, vec![Value::Int(4)]);
    }

    /// EDGE CASE: a codon output that no destination consumes gets the
    /// `_` placeholder instead of a minted variable name.
    #[test]
    fn test_edge_unused_codon_output() {
        // GCA produces two outputs but only output 0 feeds anything.
        let gca = codon(sig(7), 1, 2, "split({i0})", |args| {
            let v = args[0].as_int();
            vec![Value::Int(v), Value::Int(v.wrapping_add(1))]
        });
        let root = Arc::new(GcRecord {
            signature: sig(8),
            cgraph: ConnectionGraph {
                ad: vec![iref(Row::I, 0)],
                bd: Vec::new(),
                od: vec![iref(Row::A, 0)],
                fd: None,
                ld: None,
                wd: None,
            },
            gca: SubGc::Record(gca),
            gcb: SubGc::Null,
            is_codon: false,
            is_conditional: false,
            control_row: None,
            num_inputs: 1,
            num_outputs: 1,
            inline: None,
            imports: Vec::new(),
            num_codons: 1,
            codon_fn: None,
        });

        let store = TestStore::new();
        let mut ctx = ExecutionContext::new(Box::new(store), 8);
        let report = ctx.write_executable(root.clone()).expect("composition should compile");
        let text = &report.texts[0].1;
        assert!(text.contains(", _"), "expected an unused second output named `_`: {text}");

        let out = ctx.execute(root.signature, &[Value::Int(41)]).expect("execute should succeed");
        assert_eq!(out, vec![Value::Int(41)]);
    }

    /// EDGE CASE: `line_limit` as low as 2 (the lower bound `spec.md`
    /// §4.1 allows) still compiles. With this particular two-codon
    /// composition the scheduler's own arithmetic (`a=1, b=1, a+b=2 <=
    /// limit`) never actually splits anything off — both codons stay
    /// inlined in the one root function — so this only exercises the
    /// boundary value itself; see `non_root_write_node_with_input_passthrough`
    /// below for a composition the scheduler genuinely splits.
    #[test]
    fn test_edge_minimum_line_limit() {
        let gca = codon(sig(9), 1, 1, "({i0} >> 1)", |args| vec![Value::Int(args[0].as_int() >> 1)]);
        let gcb = codon(sig(10), 1, 1, "({i0} >> 1)", |args| vec![Value::Int(args[0].as_int() >> 1)]);
        let root = Arc::new(GcRecord {
            signature: sig(11),
            cgraph: ConnectionGraph {
                ad: vec![iref(Row::I, 0)],
                bd: vec![iref(Row::A, 0)],
                od: vec![iref(Row::B, 0)],
                fd: None,
                ld: None,
                wd: None,
            },
            gca: SubGc::Record(gca),
            gcb: SubGc::Record(gcb),
            is_codon: false,
            is_conditional: false,
            control_row: None,
            num_inputs: 1,
            num_outputs: 1,
            inline: None,
            imports: Vec::new(),
            num_codons: 2,
            codon_fn: None,
        });

        let store = TestStore::new();
        let mut ctx = ExecutionContext::new(Box::new(store), 2);
        let report = ctx.write_executable(root.clone()).expect("line_limit=2 should still compile");
        assert!(report.functions_emitted >= 1);

        let out = ctx.execute(root.signature, &[Value::Int(16)]).expect("execute should succeed");
        assert_eq!(out, vec![Value::Int(4)]);
    }

    /// EDGE CASE: a tight line limit forces an *interior* node (not the
    /// overall root) to become its own emitted function, and that
    /// interior function has a real input that one of its own children
    /// takes straight through (an ordinary `Row::I` entry in its own
    /// `ad`/`bd`, not routed through any codon first). The resolver must
    /// treat that pass-through as terminal at the *function*'s own
    /// boundary, not at the graph's absolute root: `s`'s own inputs are
    /// fed to the root by a non-identity permutation (`root.ad` does not
    /// map `s`'s input `k` to the root's own input `k`), so resolving
    /// `s`'s pass-through against the wrong boundary would mint the
    /// wrong `i[k]` name (and, since `s` is only ever called with two
    /// arguments, index out of its own `args` slice) rather than merely
    /// landing on a value that happens to coincide.
    #[test]
    fn non_root_write_node_with_input_passthrough() {
        let c1 = codon(sig(60), 1, 1, "({i0} >> 1)", |args| vec![Value::Int(args[0].as_int() >> 1)]);
        let c2 = codon(sig(61), 1, 1, "({i0} + 1)", |args| vec![Value::Int(args[0].as_int().wrapping_add(1))]);

        // `s` takes two inputs and passes each straight into one of its
        // two codon children — neither child's input is produced by the
        // other child, both come directly from `s`'s own `I` row.
        let s = Arc::new(GcRecord {
            signature: sig(62),
            cgraph: ConnectionGraph {
                ad: vec![iref(Row::I, 0)],
                bd: vec![iref(Row::I, 1)],
                od: vec![iref(Row::A, 0), iref(Row::B, 0)],
                fd: None,
                ld: None,
                wd: None,
            },
            gca: SubGc::Record(c1),
            gcb: SubGc::Record(c2),
            is_codon: false,
            is_conditional: false,
            control_row: None,
            num_inputs: 2,
            num_outputs: 2,
            inline: None,
            imports: Vec::new(),
            num_codons: 2,
            codon_fn: None,
        });

        let t = codon(sig(63), 1, 1, "(~{i0})", |args| vec![Value::Int(!args[0].as_int())]);

        // Root wires its own inputs into `s` (two) and `t` (one) under a
        // deliberately non-identity permutation (`s`'s input 0 comes
        // from root input 2, `s`'s input 1 from root input 0) and
        // returns all three codon outputs. At `line_limit=2`,
        // `s.num_lines == 2` and `t.num_lines == 1`, so the scheduler's
        // `a + b > limit` branch splits `s` off as its own function
        // while the root stays a single function calling it.
        let root = Arc::new(GcRecord {
            signature: sig(64),
            cgraph: ConnectionGraph {
                ad: vec![iref(Row::I, 2), iref(Row::I, 0)],
                bd: vec![iref(Row::I, 1)],
                od: vec![iref(Row::A, 0), iref(Row::A, 1), iref(Row::B, 0)],
                fd: None,
                ld: None,
                wd: None,
            },
            gca: SubGc::Record(s),
            gcb: SubGc::Record(t),
            is_codon: false,
            is_conditional: false,
            control_row: None,
            num_inputs: 3,
            num_outputs: 3,
            inline: None,
            imports: Vec::new(),
            num_codons: 3,
            codon_fn: None,
        });

        let store = TestStore::new();
        let mut ctx = ExecutionContext::new(Box::new(store), 2);
        let report = ctx
            .write_executable(root.clone())
            .expect("composition with a non-root split should compile");
        assert_eq!(report.functions_emitted, 2, "expected both `s` and the root to be emitted as functions");

        // root input 0 = 16, input 1 = 0, input 2 = 5.
        // s is called as s(root.i2, root.i0) = s(5, 16):
        //   output 0 = c1(5)  = 5 >> 1 = 2
        //   output 1 = c2(16) = 16 + 1 = 17
        // t is called as t(root.i1) = t(0) = !0 = u64::MAX.
        let out = ctx
            .execute(root.signature, &[Value::Int(16), Value::Int(0), Value::Int(5)])
            .expect("execute should succeed");
        assert_eq!(out, vec![Value::Int(2), Value::Int(17), Value::Int(u64::MAX)]);
    }
}
