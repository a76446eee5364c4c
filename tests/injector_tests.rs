//! Injection properties: splice position, order preservation, failure
//! atomicity, non-idempotence, and the end-to-end patched-execution
//! scenario.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use minidbg::bytecode::{BinOp, CodeUnit, HookFn, Instr, InstrSeq, Opcode, Value};
use minidbg::vm::{CallStack, Vm};
use minidbg::{injector, samples, DebuggerError};
use proptest::prelude::*;

fn counting_hook() -> (Rc<Cell<u32>>, HookFn) {
    let count = Rc::new(Cell::new(0));
    let count2 = count.clone();
    let hook: HookFn = Rc::new(move |_: &CallStack| count2.set(count2.get() + 1));
    (count, hook)
}

fn capture_vm() -> (Rc<RefCell<Vec<u8>>>, Vm) {
    let buf: Rc<RefCell<Vec<u8>>> = Rc::new(RefCell::new(Vec::new()));
    let vm = Vm::with_output(buf.clone());
    (buf, vm)
}

fn printed(buf: &Rc<RefCell<Vec<u8>>>) -> String {
    String::from_utf8(buf.borrow().clone()).unwrap()
}

#[test]
fn block_lands_before_first_instruction_at_line() {
    let foo = samples::foo().unwrap();
    let original = InstrSeq::from_unit(&foo).unwrap();
    let target = original.first_at_line(2).unwrap();

    let (_count, hook) = counting_hook();
    let patched = injector::inject(&foo, hook, 2).unwrap();
    let decoded = InstrSeq::from_unit(&patched).unwrap();

    assert_eq!(decoded.len(), original.len() + injector::BLOCK_LEN);
    assert!(matches!(
        decoded.instrs()[target].op,
        Opcode::LoadConst(Value::Hook(_))
    ));
    assert_eq!(decoded.instrs()[target + 1].op, Opcode::CallFunction(0));
    assert_eq!(decoded.instrs()[target + 2].op, Opcode::Pop);

    // Everything around the block is the original, in the original order.
    assert_eq!(&decoded.instrs()[..target], &original.instrs()[..target]);
    assert_eq!(
        &decoded.instrs()[target + injector::BLOCK_LEN..],
        &original.instrs()[target..]
    );
}

#[test]
fn absent_line_fails_without_mutation() {
    let foo = samples::foo().unwrap();
    let baseline = InstrSeq::from_unit(&foo).unwrap();

    let (_count, hook) = counting_hook();
    let err = injector::inject(&foo, hook, 17).unwrap_err();
    assert!(matches!(err, DebuggerError::LineNotFound { line: 17 }));
    assert_eq!(err.to_string(), "line 17 not found in instruction sequence");
    assert_eq!(InstrSeq::from_unit(&foo).unwrap(), baseline);
}

#[test]
fn hook_fires_on_every_execution() {
    let foo = samples::foo().unwrap();
    let (count, hook) = counting_hook();
    let patched = injector::inject(&foo, hook, 2).unwrap().into_rc();

    let (_buf, mut vm) = capture_vm();
    for _ in 0..3 {
        vm.call_function(&patched, vec![Value::Int(1)]).unwrap();
    }
    assert_eq!(count.get(), 3);
}

#[test]
fn double_injection_fires_twice_per_pass() {
    let foo = samples::foo().unwrap();
    let (count, hook) = counting_hook();
    let once = injector::inject(&foo, hook.clone(), 2).unwrap();
    let twice = injector::inject(&once, hook, 2).unwrap().into_rc();

    let (_buf, mut vm) = capture_vm();
    vm.call_function(&twice, vec![Value::Int(1)]).unwrap();
    assert_eq!(count.get(), 2);
}

/// End-to-end scenario: a 3-line body patched at line 2 runs the hook with
/// no arguments before line 2's original instruction, discards its result,
/// and proceeds with lines 2 and 3 unchanged.
#[test]
fn patched_unit_behaves_like_the_original_plus_hook() {
    let foo = samples::foo().unwrap();

    let (buf, mut vm) = capture_vm();
    let unpatched_result = vm.call_function(&foo, vec![Value::Int(42)]).unwrap();
    let unpatched_output = printed(&buf);

    // The hook sees the frame paused before line 2: `a` bound, `b` not yet.
    let observed = Rc::new(RefCell::new(Vec::new()));
    let observed2 = observed.clone();
    let hook: HookFn = Rc::new(move |stack: &CallStack| {
        let frame = stack.current().expect("hook runs inside foo");
        observed2.borrow_mut().push((
            frame.current_line(),
            frame.locals().get("a").cloned(),
            frame.locals().get("b").cloned(),
        ));
    });
    let patched = injector::inject(&foo, hook, 2).unwrap().into_rc();

    let (buf, mut vm) = capture_vm();
    let patched_result = vm.call_function(&patched, vec![Value::Int(42)]).unwrap();

    assert_eq!(patched_result, unpatched_result);
    assert_eq!(patched_result, Value::Int(84));
    assert_eq!(printed(&buf), unpatched_output);
    assert_eq!(
        observed.borrow().as_slice(),
        [(2, Some(Value::Int(42)), None)]
    );
}

fn arb_opcode() -> impl Strategy<Value = Opcode> {
    prop_oneof![
        any::<i32>().prop_map(|n| Opcode::LoadConst(Value::Int(n as i64))),
        "[a-c]".prop_map(Opcode::LoadName),
        "[a-c]".prop_map(Opcode::StoreName),
        (0u8..4).prop_map(Opcode::CallFunction),
        Just(Opcode::BinaryOp(BinOp::Add)),
        Just(Opcode::Pop),
        Just(Opcode::Return),
    ]
}

fn arb_unit() -> impl Strategy<Value = CodeUnit> {
    proptest::collection::vec((arb_opcode(), 1u32..6), 1..40).prop_map(|pairs| {
        let mut seq = InstrSeq::new("g", &[]);
        for (op, line) in pairs {
            seq.push(Instr::new(op, line));
        }
        seq.to_unit().expect("generated instructions encode")
    })
}

proptest! {
    /// For any sequence and any candidate line: a present line gets exactly
    /// one block immediately before its first occurrence with every other
    /// instruction preserved in order; an absent line fails with
    /// LineNotFound and the unit is unaffected.
    #[test]
    fn inject_preserves_order_and_identity(unit in arb_unit(), line in 1u32..8) {
        let original = InstrSeq::from_unit(&unit).unwrap();
        let hook: HookFn = Rc::new(|_| {});
        let result = injector::inject(&unit, hook, line);

        match original.first_at_line(line) {
            Some(target) => {
                let decoded = InstrSeq::from_unit(&result.unwrap()).unwrap();
                prop_assert_eq!(decoded.len(), original.len() + injector::BLOCK_LEN);
                prop_assert!(matches!(
                    decoded.instrs()[target].op,
                    Opcode::LoadConst(Value::Hook(_))
                ));
                prop_assert_eq!(&decoded.instrs()[target + 1].op, &Opcode::CallFunction(0));
                prop_assert_eq!(&decoded.instrs()[target + 2].op, &Opcode::Pop);
                prop_assert!(decoded.instrs()[target..target + 3].iter().all(|i| i.line == line));
                prop_assert_eq!(&decoded.instrs()[..target], &original.instrs()[..target]);
                prop_assert_eq!(
                    &decoded.instrs()[target + injector::BLOCK_LEN..],
                    &original.instrs()[target..]
                );
            }
            None => {
                let is_line_not_found = matches!(result, Err(DebuggerError::LineNotFound { .. }));
                prop_assert!(is_line_not_found);
                prop_assert_eq!(&InstrSeq::from_unit(&unit).unwrap(), &original);
            }
        }
    }
}
