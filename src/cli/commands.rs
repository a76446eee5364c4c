//! Command implementations behind the CLI surface.

use std::rc::Rc;

use anyhow::{anyhow, Result};
use colored::Colorize;

use crate::bytecode::{HookFn, InstrSeq, Value};
use crate::cli::{DisasmArgs, InjectDemoArgs, TraceDemoArgs};
use crate::repl::{self, StdConsole};
use crate::tracer::Mdb;
use crate::vm::{CallStack, Vm};
use crate::{injector, samples, tracer};

/// The injection demonstration: call `foo(42)`, patch a stack-printing hook
/// into it, swap the patched unit in, call it again.
pub fn inject_demo(args: InjectDemoArgs) -> Result<()> {
    let mut vm = Vm::new();
    let foo = samples::foo()?;
    vm.define_global("foo", Value::Function(foo.clone()));

    println!("{}", "Calling foo(42)...".bold());
    vm.call_function(&foo, vec![Value::Int(42)])?;

    let hook: HookFn = Rc::new(|stack: &CallStack| {
        println!("Call stack:");
        for line in repl::format_stack(stack) {
            println!("{}", line);
        }
        if let Some(frame) = stack.current() {
            println!("locals: {}", repl::format_locals(frame));
        }
    });
    let patched = injector::inject(&foo, hook, args.line)?.into_rc();
    // The original unit is untouched; the swap is ours to perform.
    vm.define_global("foo", Value::Function(patched.clone()));

    println!("{}", "Calling foo(42) after hook injection ...".bold());
    vm.call_function(&patched, vec![Value::Int(42)])?;

    Ok(())
}

/// The tracing demonstration: install the interactive callback and run the
/// sample driver. Every call and line of the driver (and of `foo`, which it
/// calls) stops at the operator prompt.
pub fn trace_demo(_args: TraceDemoArgs) -> Result<()> {
    let mut vm = Vm::new();
    vm.define_global("foo", Value::Function(samples::foo()?));
    let driver = samples::trace_driver()?;

    let console = StdConsole::new()?;
    tracer::install(Rc::new(Mdb::new(Box::new(console))));

    println!("{}", "Tracing main()... (empty line resumes execution)".bold());
    let result = vm.call_function(&driver, vec![]);
    tracer::uninstall();
    result?;

    Ok(())
}

/// Print a sample unit's disassembly, as a table or as JSON.
pub fn disasm(args: DisasmArgs) -> Result<()> {
    let unit = samples::by_name(&args.sample).ok_or_else(|| {
        anyhow!(
            "unknown sample '{}' (expected one of: {})",
            args.sample,
            samples::SAMPLE_NAMES.join(", ")
        )
    })??;
    let seq = InstrSeq::from_unit(&unit)?;
    let rows = seq.disassemble();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!(
        "{} {}({})",
        "unit".bold(),
        unit.name(),
        unit.params().join(", ")
    );
    for row in rows {
        println!(
            "{:>4}  line {:<4} {:<14} {}",
            row.index, row.line, row.opcode, row.operand
        );
    }
    Ok(())
}
