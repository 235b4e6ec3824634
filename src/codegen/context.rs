//! The mutable half of the code generation context.
//!
//! Per the propagation-via-mutable-struct redesign, lowering state is split in two:
//! the immutable per-function scope ([`crate::symbols::FunctionScope`]) and this
//! struct — the SSA counter, current block, reachability flags, and the
//! break/continue placeholder machinery — which is the only part actually threaded
//! through recursive statement/expression lowering.

/// Number of characters reserved for a break/continue label placeholder.
pub const HOLE_WIDTH: usize = 4;
pub const BREAK_SENTINEL: u8 = 0x80;
pub const CONTINUE_SENTINEL: u8 = 0x81;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SentinelKind {
    Break,
    Continue,
}

#[derive(Clone, Copy)]
struct PendingSentinel {
    offset: usize,
    kind: SentinelKind,
}

/// Tracks break/continue placeholders written while inside one loop nesting level.
/// Restored by the enclosing loop when this one finishes, per the "nested loops
/// restore the outer loop's lists on exit" rule.
#[derive(Default, Clone)]
struct LoopFrame {
    pending: Vec<PendingSentinel>,
    /// Buffer length when this loop's body lowering began; any sentinel recorded by
    /// an *outer* frame past this point must be offset-adjusted once this loop patches.
    body_start: usize,
}

/// Snapshot of emission state taken before lowering a statement that can never run
/// (one after a block-terminating `return`/`break`/`continue`), so its effects can be
/// discarded once it has served its diagnostic purpose.
pub struct DeadCodeMark {
    buffer_len: usize,
    ssa_counter: u32,
    block_counter: u32,
    current_block: u32,
    block_isover: bool,
    terminated_bybr: bool,
    loop_stack: Vec<LoopFrame>,
}

/// Per-function emission state. One instance lives for the duration of lowering a
/// single function or method body.
pub struct EmitState {
    ssa_counter: u32,
    block_counter: u32,
    pub current_block: u32,
    pub block_isover: bool,
    pub terminated_bybr: bool,
    loop_stack: Vec<LoopFrame>,
    buffer: Vec<u8>,
}

impl EmitState {
    pub fn new() -> Self {
        Self {
            ssa_counter: 0,
            block_counter: 0,
            current_block: 0,
            block_isover: false,
            terminated_bybr: false,
            loop_stack: Vec::new(),
            buffer: Vec::new(),
        }
    }

    pub fn next_ssa(&mut self) -> u32 {
        let id = self.ssa_counter;
        self.ssa_counter += 1;
        id
    }

    pub fn new_block(&mut self) -> u32 {
        let id = self.block_counter;
        self.block_counter += 1;
        id
    }

    pub fn in_loop(&self) -> bool {
        !self.loop_stack.is_empty()
    }

    pub fn emit(&mut self, line: &str) {
        self.buffer.extend_from_slice(line.as_bytes());
        self.buffer.push(b'\n');
    }

    pub fn emit_raw(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    pub fn enter_loop(&mut self) {
        self.loop_stack.push(LoopFrame {
            pending: Vec::new(),
            body_start: self.buffer.len(),
        });
    }

    /// Writes a `br label %<sentinel>` placeholder for `break` or `continue`,
    /// recording its offset against the innermost loop frame.
    fn write_sentinel(&mut self, kind: SentinelKind) {
        let byte = match kind {
            SentinelKind::Break => BREAK_SENTINEL,
            SentinelKind::Continue => CONTINUE_SENTINEL,
        };
        self.emit_raw(b"  br label %");
        let offset = self.buffer.len();
        self.emit_raw(&vec![byte; HOLE_WIDTH]);
        self.emit_raw(b"\n");
        self.loop_stack
            .last_mut()
            .expect("break/continue only legal inside a loop")
            .pending
            .push(PendingSentinel { offset, kind });
        self.block_isover = true;
        self.terminated_bybr = true;
    }

    pub fn emit_break(&mut self) {
        self.write_sentinel(SentinelKind::Break);
    }

    pub fn emit_continue(&mut self) {
        self.write_sentinel(SentinelKind::Continue);
    }

    /// Pops the innermost loop frame and rewrites every sentinel it recorded:
    /// `break` placeholders become `exit_label`, `continue` placeholders become
    /// `continue_label`. Propagates the net length delta to any outer frame whose
    /// recorded offsets lie past this loop's body so they still point at the right
    /// byte after the splice.
    pub fn patch_loop(&mut self, exit_label: &str, continue_label: &str) {
        let frame = self.loop_stack.pop().expect("patch_loop without enter_loop");
        let mut pending = frame.pending;
        pending.sort_by_key(|p| p.offset);

        let mut delta: isize = 0;
        for p in &pending {
            let replacement = match p.kind {
                SentinelKind::Break => exit_label,
                SentinelKind::Continue => continue_label,
            };
            let offset = (p.offset as isize + delta) as usize;
            self.buffer
                .splice(offset..offset + HOLE_WIDTH, replacement.bytes());
            delta += replacement.len() as isize - HOLE_WIDTH as isize;
        }

        if delta != 0 {
            if let Some(outer) = self.loop_stack.last_mut() {
                for p in &mut outer.pending {
                    if p.offset >= frame.body_start {
                        p.offset = (p.offset as isize + delta) as usize;
                    }
                }
            }
        }
    }

    /// Snapshots everything a dead statement might mutate, so it can be lowered
    /// purely for its diagnostics without leaking into the live function body.
    pub fn begin_dead_code(&self) -> DeadCodeMark {
        DeadCodeMark {
            buffer_len: self.buffer.len(),
            ssa_counter: self.ssa_counter,
            block_counter: self.block_counter,
            current_block: self.current_block,
            block_isover: self.block_isover,
            terminated_bybr: self.terminated_bybr,
            loop_stack: self.loop_stack.clone(),
        }
    }

    /// Restores the state captured by [`Self::begin_dead_code`], discarding anything
    /// the dead statement emitted or counted.
    pub fn end_dead_code(&mut self, mark: DeadCodeMark) {
        self.buffer.truncate(mark.buffer_len);
        self.ssa_counter = mark.ssa_counter;
        self.block_counter = mark.block_counter;
        self.current_block = mark.current_block;
        self.block_isover = mark.block_isover;
        self.terminated_bybr = mark.terminated_bybr;
        self.loop_stack = mark.loop_stack;
    }

    pub fn take_buffer(self) -> Vec<u8> {
        self.buffer
    }

    pub fn buffer_str(&self) -> String {
        String::from_utf8_lossy(&self.buffer).into_owned()
    }
}

impl Default for EmitState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ssa_counter_is_monotonic() {
        let mut state = EmitState::new();
        assert_eq!(state.next_ssa(), 0);
        assert_eq!(state.next_ssa(), 1);
        assert_eq!(state.next_ssa(), 2);
    }

    #[test]
    fn test_patch_break_in_place() {
        let mut state = EmitState::new();
        state.enter_loop();
        state.emit_break();
        state.patch_loop("7", "3");
        assert_eq!(state.buffer_str(), "  br label %7\n");
    }

    #[test]
    fn test_patch_overflow_expands_hole() {
        let mut state = EmitState::new();
        state.enter_loop();
        state.emit_break();
        state.patch_loop("123456", "0");
        assert_eq!(state.buffer_str(), "  br label %123456\n");
    }

    #[test]
    fn test_nested_loop_restores_outer_frame() {
        let mut state = EmitState::new();
        state.enter_loop();
        state.emit_break(); // binds to outer loop once patched
        state.enter_loop();
        state.emit_break(); // binds to inner loop
        state.patch_loop("99999", "1"); // inner patch grows buffer, shifts outer offset
        state.patch_loop("2", "0");

        assert_eq!(
            state.buffer_str(),
            "  br label %2\n  br label %99999\n"
        );
    }
}
