//! The interactive surface shared by the injected hook and the tracer:
//! stack rendering, the operator console, and the blocking prompt loop.
//!
//! Sub-modules:
//! - [`console`] — the [`Console`] trait, terminal and scripted backends.
//! - [`eval`]    — the narrow command evaluator.

pub mod console;
pub mod eval;

pub use console::{Console, ScriptedConsole, StdConsole};
pub use eval::EvalError;

use crate::vm::{CallStack, Frame};

/// The operator prompt, one command per iteration.
pub const PROMPT: &str = ">>> ";

/// Format the call stack for display, one frame per line, outermost caller
/// first.
pub fn format_stack(stack: &CallStack) -> Vec<String> {
    stack
        .frames()
        .iter()
        .map(|frame| {
            format!(
                "  File \"<vm>\", line {}, in {}",
                frame.current_line(),
                frame.function_name()
            )
        })
        .collect()
}

/// Render the current frame's locals as a deterministic one-line dump.
pub fn format_locals(frame: &Frame) -> String {
    let mut entries: Vec<_> = frame.locals().iter().collect();
    entries.sort_by_key(|(name, _)| name.as_str());
    let body = entries
        .iter()
        .map(|(name, value)| format!("{} = {:?}", name, value))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{{{}}}", body)
}

/// Write the formatted call stack to the console.
pub fn render_stack(stack: &CallStack, console: &mut dyn Console) {
    for line in format_stack(stack) {
        console.write_line(&line);
    }
}

/// The interactive loop: read one command per iteration and evaluate it
/// against the live context, until the operator enters an empty line (or
/// input ends).
///
/// Bare expressions echo their value; assignments mutate the context in
/// place. Evaluation errors are printed and never end the session. The loop
/// blocks the host program for as long as the operator keeps typing.
pub fn run(stack: &mut CallStack, console: &mut dyn Console) {
    loop {
        let Some(line) = console.read_line(PROMPT) else {
            break;
        };
        let command = line.trim();
        if command.is_empty() {
            break;
        }
        match eval::eval_command(command, stack) {
            Ok(Some(value)) => console.write_line(&value.to_string()),
            Ok(None) => {}
            Err(e) => console.write_line(&e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::Value;

    #[test]
    fn empty_input_exits_immediately() {
        let mut stack = CallStack::new();
        let mut console = ScriptedConsole::new(["   ", "left alone"]);
        run(&mut stack, &mut console);
        assert!(console.output.is_empty());
        assert_eq!(console.remaining_input(), 1);
    }

    #[test]
    fn end_of_input_exits_without_error() {
        let mut stack = CallStack::new();
        let mut console = ScriptedConsole::new(Vec::<String>::new());
        run(&mut stack, &mut console);
        assert!(console.output.is_empty());
    }

    #[test]
    fn evaluation_error_does_not_end_the_loop() {
        let mut stack = CallStack::new();
        stack.globals_mut().insert("a".to_string(), Value::Int(41));
        let mut console = ScriptedConsole::new(["1 / 0", "a = a + 1", "a", ""]);
        run(&mut stack, &mut console);
        assert_eq!(console.output, vec!["division by zero".to_string(), "42".to_string()]);
        assert_eq!(stack.globals()["a"], Value::Int(42));
        assert_eq!(console.remaining_input(), 0);
    }

    #[test]
    fn stack_renders_outermost_first() {
        use crate::bytecode::{Instr, InstrSeq, Opcode};
        use crate::vm::frame::Frame;

        let unit = |name: &str| {
            let mut seq = InstrSeq::new(name, &[]);
            seq.push(Instr::new(Opcode::LoadConst(Value::Unit), 1))
                .push(Instr::new(Opcode::Return, 1));
            seq.to_unit().unwrap().into_rc()
        };

        let mut stack = CallStack::new();
        let outer = unit("outer");
        let inner = unit("inner");
        let mut frame = Frame::new(outer.clone(), outer.decode_instrs().unwrap());
        frame.set_current_line(7);
        stack.push(frame);
        let mut frame = Frame::new(inner.clone(), inner.decode_instrs().unwrap());
        frame.set_current_line(1);
        stack.push(frame);

        assert_eq!(
            format_stack(&stack),
            vec![
                "  File \"<vm>\", line 7, in outer".to_string(),
                "  File \"<vm>\", line 1, in inner".to_string(),
            ]
        );
    }
}
