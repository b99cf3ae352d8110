use crate::console::Console;
use crate::decode::Word;
use crate::error::{Fault, LoadError};
use crate::image::ObjectImage;
use crate::memory::Memory;
use crate::output::Output;
use crate::registers::RegisterFile;
use crate::symbol::{Opcode, Register, TrapVect};

/// Prompt printed by the `IN` trap unless overridden.
pub const DEFAULT_PROMPT: &str = "Input a character> ";

/// Notice printed by the `HALT` trap.
const HALT_NOTICE: &[u8] = b"HALT\n";

/// Execution state of a [`Machine`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Status {
    Running,
    /// Terminal. Reached through the `HALT` trap, a fault, or [`Machine::halt`].
    Halted,
}

type Handler<C> = fn(&mut Machine<C>, Word) -> Result<Status, Fault>;

/// Complete machine state: registers, memory and the host console.
pub struct Machine<C: Console> {
    reg: RegisterFile,
    mem: Memory,
    console: C,
    status: Status,
    /// Emit each opcode mnemonic before it is dispatched.
    trace: bool,
    prompt: String,
    /// Instructions executed to completion.
    retired: u64,
    /// Address and cause of the fault which halted the machine.
    fault: Option<(u16, Fault)>,
}

impl<C: Console> Machine<C> {
    pub fn new(console: C) -> Self {
        Machine {
            reg: RegisterFile::new(),
            mem: Memory::new(),
            console,
            status: Status::Running,
            trace: false,
            prompt: DEFAULT_PROMPT.to_string(),
            retired: 0,
            fault: None,
        }
    }

    /// Place an object image into memory. `PC` is not moved.
    pub fn load(&mut self, image: &ObjectImage) -> Result<(), LoadError> {
        self.mem.load(image)?;
        log::debug!(
            "loaded {} words at 0x{:04x}",
            image.len(),
            image.origin()
        );
        Ok(())
    }

    pub fn set_trace(&mut self, trace: bool) {
        self.trace = trace;
    }

    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.prompt = prompt.into();
    }

    pub fn set_pc(&mut self, pc: u16) {
        self.reg.set(Register::PC, pc);
    }

    pub fn registers(&self) -> &RegisterFile {
        &self.reg
    }

    pub fn registers_mut(&mut self) -> &mut RegisterFile {
        &mut self.reg
    }

    pub fn memory(&self) -> &Memory {
        &self.mem
    }

    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.mem
    }

    pub fn console(&self) -> &C {
        &self.console
    }

    pub fn into_console(self) -> C {
        self.console
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn is_running(&self) -> bool {
        self.status == Status::Running
    }

    pub fn instructions(&self) -> u64 {
        self.retired
    }

    /// Address of the instruction which faulted, with its cause.
    pub fn fault(&self) -> Option<(u16, &Fault)> {
        self.fault.as_ref().map(|(addr, fault)| (*addr, fault))
    }

    /// Stop execution before the next fetch.
    pub fn halt(&mut self) {
        self.status = Status::Halted;
    }

    /// Run until halted.
    ///
    /// Returns `Ok` when the program halts itself and the fault otherwise.
    pub fn run(&mut self) -> Result<(), Fault> {
        while self.is_running() {
            self.step()?;
        }
        Ok(())
    }

    const OP_TABLE: [Handler<C>; Opcode::COUNT] = [
        Self::br,   // 0x0
        Self::add,  // 0x1
        Self::ld,   // 0x2
        Self::st,   // 0x3
        Self::jsr,  // 0x4
        Self::and,  // 0x5
        Self::ldr,  // 0x6
        Self::str,  // 0x7
        Self::rti,  // 0x8
        Self::not,  // 0x9
        Self::ldi,  // 0xA
        Self::sti,  // 0xB
        Self::jmp,  // 0xC
        Self::res,  // 0xD
        Self::lea,  // 0xE
        Self::trap, // 0xF
    ];

    /// Fetch, decode and execute one instruction.
    ///
    /// A halted machine is left untouched.
    pub fn step(&mut self) -> Result<Status, Fault> {
        if !self.is_running() {
            return Ok(Status::Halted);
        }
        let addr = self.reg.pc();
        let word = match self.mem.read(addr, &mut self.console) {
            Ok(word) => Word(word),
            Err(fault) => return Err(self.abort(addr, fault)),
        };
        // PC incremented before instruction is performed
        self.reg.set(Register::PC, addr.wrapping_add(1));

        let opcode = match word.opcode() {
            Ok(opcode) => opcode,
            Err(fault) => return Err(self.abort(addr, fault)),
        };
        log::trace!("0x{addr:04x}: 0x{:04x} {opcode}", word.0);
        if self.trace {
            Output::Trace.print_opcode(addr, word.0, opcode);
        }

        match Self::OP_TABLE[opcode as usize](self, word) {
            Ok(status) => {
                self.retired += 1;
                if status == Status::Halted {
                    self.status = Status::Halted;
                }
                Ok(self.status)
            }
            Err(fault) => Err(self.abort(addr, fault)),
        }
    }

    fn abort(&mut self, addr: u16, fault: Fault) -> Fault {
        log::warn!("fault at 0x{addr:04x}: {fault}");
        self.status = Status::Halted;
        self.fault = Some((addr, fault.clone()));
        fault
    }

    #[inline]
    fn offset_pc(&self, offset: u16) -> u16 {
        self.reg.pc().wrapping_add(offset)
    }

    #[inline]
    fn read(&mut self, addr: u16) -> Result<u16, Fault> {
        self.mem.read(addr, &mut self.console)
    }

    /// Shared by `ADD` and `AND`.
    fn arith(&mut self, instr: Word, op: fn(u16, u16) -> u16) -> Result<Status, Fault> {
        let dr = instr.dr()?;
        let sr1 = instr.sr1()?;
        let val2 = if instr.is_imm() {
            instr.imm5()
        } else {
            self.reg.get(instr.sr2()?)
        };
        let res = op(self.reg.get(sr1), val2);
        self.reg.set(dr, res);
        self.reg.update_flags(dr);
        Ok(Status::Running)
    }

    fn add(&mut self, instr: Word) -> Result<Status, Fault> {
        self.arith(instr, u16::wrapping_add)
    }

    fn and(&mut self, instr: Word) -> Result<Status, Fault> {
        self.arith(instr, |a, b| a & b)
    }

    fn not(&mut self, instr: Word) -> Result<Status, Fault> {
        let dr = instr.dr()?;
        let sr = instr.sr1()?;
        self.reg.set(dr, !self.reg.get(sr));
        self.reg.update_flags(dr);
        Ok(Status::Running)
    }

    fn br(&mut self, instr: Word) -> Result<Status, Fault> {
        let cond = self.reg.get(Register::COND);
        if instr.nzp() & cond != 0 {
            let target = self.offset_pc(instr.pc_offset9());
            self.reg.set(Register::PC, target);
        }
        Ok(Status::Running)
    }

    fn jmp(&mut self, instr: Word) -> Result<Status, Fault> {
        let base_r = instr.base_r()?;
        self.reg.set(Register::PC, self.reg.get(base_r));
        Ok(Status::Running)
    }

    fn jsr(&mut self, instr: Word) -> Result<Status, Fault> {
        let target = if instr.is_pc_relative() {
            self.offset_pc(instr.pc_offset11())
        } else {
            // Read before R7 is overwritten, so `JSRR R7` jumps to the old value
            self.reg.get(instr.base_r()?)
        };
        self.reg.set(Register::R7, self.reg.pc());
        self.reg.set(Register::PC, target);
        Ok(Status::Running)
    }

    fn ld(&mut self, instr: Word) -> Result<Status, Fault> {
        let dr = instr.dr()?;
        let val = self.read(self.offset_pc(instr.pc_offset9()))?;
        self.reg.set(dr, val);
        self.reg.update_flags(dr);
        Ok(Status::Running)
    }

    fn ldi(&mut self, instr: Word) -> Result<Status, Fault> {
        let dr = instr.dr()?;
        let ptr = self.read(self.offset_pc(instr.pc_offset9()))?;
        let val = self.read(ptr)?;
        self.reg.set(dr, val);
        self.reg.update_flags(dr);
        Ok(Status::Running)
    }

    fn ldr(&mut self, instr: Word) -> Result<Status, Fault> {
        let dr = instr.dr()?;
        let base_r = instr.base_r()?;
        let addr = self.reg.get(base_r).wrapping_add(instr.offset6());
        let val = self.read(addr)?;
        self.reg.set(dr, val);
        self.reg.update_flags(dr);
        Ok(Status::Running)
    }

    fn lea(&mut self, instr: Word) -> Result<Status, Fault> {
        let dr = instr.dr()?;
        self.reg.set(dr, self.offset_pc(instr.pc_offset9()));
        self.reg.update_flags(dr);
        Ok(Status::Running)
    }

    fn st(&mut self, instr: Word) -> Result<Status, Fault> {
        let sr = instr.dr()?;
        self.mem
            .write(self.offset_pc(instr.pc_offset9()), self.reg.get(sr));
        Ok(Status::Running)
    }

    fn sti(&mut self, instr: Word) -> Result<Status, Fault> {
        let sr = instr.dr()?;
        let ptr = self.read(self.offset_pc(instr.pc_offset9()))?;
        self.mem.write(ptr, self.reg.get(sr));
        Ok(Status::Running)
    }

    fn str(&mut self, instr: Word) -> Result<Status, Fault> {
        let sr = instr.dr()?;
        let base_r = instr.base_r()?;
        let addr = self.reg.get(base_r).wrapping_add(instr.offset6());
        self.mem.write(addr, self.reg.get(sr));
        Ok(Status::Running)
    }

    fn rti(&mut self, _instr: Word) -> Result<Status, Fault> {
        Err(Fault::ReservedOpcode {
            opcode: Opcode::RTI,
        })
    }

    fn res(&mut self, _instr: Word) -> Result<Status, Fault> {
        Err(Fault::ReservedOpcode {
            opcode: Opcode::RES,
        })
    }

    fn trap(&mut self, instr: Word) -> Result<Status, Fault> {
        let vector = instr.trap_vect();
        let trap = TrapVect::from_code(vector).ok_or(Fault::InvalidTrap { vector })?;
        match trap {
            TrapVect::Getc => {
                let ch = self.console.read_char()?;
                self.set_r0(ch as u16);
            }
            TrapVect::Out => {
                let ch = self.reg.get(Register::R0) as u8;
                self.console.write_char(ch)?;
                self.console.flush()?;
            }
            TrapVect::Puts => {
                let start = self.reg.get(Register::R0);
                self.put_string(start, |word| [Some(word as u8), None])?;
            }
            TrapVect::In => {
                let prompt = std::mem::take(&mut self.prompt);
                let written = self.put_bytes(prompt.as_bytes());
                self.prompt = prompt;
                written?;
                self.console.flush()?;
                let ch = self.console.read_char()?;
                self.console.write_char(ch)?;
                self.console.flush()?;
                self.set_r0(ch as u16);
            }
            TrapVect::Putsp => {
                let start = self.reg.get(Register::R0);
                self.put_string(start, |word| {
                    let high = (word >> 8) as u8;
                    [Some(word as u8), (high != 0).then_some(high)]
                })?;
            }
            TrapVect::Halt => {
                self.put_bytes(HALT_NOTICE)?;
                self.console.flush()?;
                return Ok(Status::Halted);
            }
        }
        Ok(Status::Running)
    }

    fn set_r0(&mut self, val: u16) {
        self.reg.set(Register::R0, val);
        self.reg.update_flags(Register::R0);
    }

    fn put_bytes(&mut self, bytes: &[u8]) -> Result<(), Fault> {
        for &ch in bytes {
            self.console.write_char(ch)?;
        }
        Ok(())
    }

    /// Write characters unpacked from each word from `start`, until a zero word.
    ///
    /// Stops at the top of memory if no terminator is found.
    fn put_string<F>(&mut self, start: u16, unpack: F) -> Result<(), Fault>
    where
        F: Fn(u16) -> [Option<u8>; 2],
    {
        for &word in self.mem.get(start) {
            if word == 0 {
                break;
            }
            for ch in unpack(word).into_iter().flatten() {
                self.console.write_char(ch)?;
            }
        }
        self.console.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    use crate::console::BufferedConsole;
    use crate::symbol::Flag;
    use Register::*;

    const HALT: u16 = 0xF025;

    fn machine(words: &[u16]) -> Machine<BufferedConsole> {
        machine_with_input(words, "")
    }

    fn machine_with_input(words: &[u16], input: &str) -> Machine<BufferedConsole> {
        let mut m = Machine::new(BufferedConsole::with_input(input));
        m.load(&ObjectImage::new(0x3000, words.to_vec())).unwrap();
        m
    }

    fn flag(m: &Machine<BufferedConsole>) -> Flag {
        m.registers().flag().unwrap()
    }

    #[test]
    fn add_register_and_immediate() {
        let mut m = machine(&[
            0b0001_010_000_0_00_001, // ADD R2, R0, R1
            0b0001_011_010_1_11111,  // ADD R3, R2, #-1
        ]);
        m.registers_mut().set(R0, 0x7FFF);
        m.registers_mut().set(R1, 1);

        m.step().unwrap();
        assert_eq!(m.registers().get(R2), 0x8000);
        assert_eq!(flag(&m), Flag::Neg);

        m.step().unwrap();
        assert_eq!(m.registers().get(R3), 0x7FFF);
        assert_eq!(flag(&m), Flag::Pos);
    }

    #[test]
    fn add_wraps_silently() {
        let mut m = machine(&[0b0001_000_000_1_00001]); // ADD R0, R0, #1
        m.registers_mut().set(R0, 0xFFFF);
        m.step().unwrap();
        assert_eq!(m.registers().get(R0), 0);
        assert_eq!(flag(&m), Flag::Zro);
    }

    #[test]
    fn and_register_and_immediate() {
        let mut m = machine(&[
            0b0101_010_000_0_00_001, // AND R2, R0, R1
            0b0101_011_000_1_01111,  // AND R3, R0, #15
            0b0101_100_000_1_10000,  // AND R4, R0, #-16
        ]);
        m.registers_mut().set(R0, 0xF0F3);
        m.registers_mut().set(R1, 0x0FF0);

        m.step().unwrap();
        assert_eq!(m.registers().get(R2), 0x00F0);
        assert_eq!(flag(&m), Flag::Pos);
        m.step().unwrap();
        assert_eq!(m.registers().get(R3), 0x0003);
        m.step().unwrap();
        assert_eq!(m.registers().get(R4), 0xF0F0);
        assert_eq!(flag(&m), Flag::Neg);
    }

    #[test]
    fn not_complements() {
        let mut m = machine(&[0b1001_001_000_111111]); // NOT R1, R0
        m.registers_mut().set(R0, 0xFFFF);
        m.step().unwrap();
        assert_eq!(m.registers().get(R1), 0);
        assert_eq!(flag(&m), Flag::Zro);
    }

    #[test]
    fn branch_only_on_requested_flags() {
        for cond in [Flag::Pos, Flag::Zro, Flag::Neg] {
            for nzp in 0..8u16 {
                // BR<nzp> #4
                let mut m = machine(&[nzp << 9 | 4]);
                m.registers_mut().set(COND, cond.bits());
                m.step().unwrap();
                let taken = nzp & cond.bits() != 0;
                let expected = if taken { 0x3005 } else { 0x3001 };
                assert_eq!(m.registers().pc(), expected, "nzp {nzp:03b}, {cond:?}");
            }
        }
    }

    #[test]
    fn branch_backwards() {
        let mut m = machine(&[0b0000_111_111111111]); // BRnzp #-1
        m.step().unwrap();
        assert_eq!(m.registers().pc(), 0x3000);
    }

    #[test]
    fn jmp_and_ret() {
        let mut m = machine(&[0b1100_000_011_000000, 0xC1C0]); // JMP R3; RET
        m.registers_mut().set(R3, 0x3001);
        m.registers_mut().set(R7, 0x4000);
        m.step().unwrap();
        assert_eq!(m.registers().pc(), 0x3001);
        m.step().unwrap();
        assert_eq!(m.registers().pc(), 0x4000);
    }

    #[test]
    fn jsr_saves_return_address() {
        let mut m = machine(&[0b0100_1_00000001010]); // JSR #10
        m.step().unwrap();
        assert_eq!(m.registers().get(R7), 0x3001);
        assert_eq!(m.registers().pc(), 0x300B);
    }

    #[test]
    fn jsrr_saves_return_address() {
        let mut m = machine(&[0b0100_0_00_010_000000]); // JSRR R2
        m.registers_mut().set(R2, 0x5000);
        m.step().unwrap();
        assert_eq!(m.registers().get(R7), 0x3001);
        assert_eq!(m.registers().pc(), 0x5000);
    }

    #[test]
    fn jsrr_through_r7() {
        let mut m = machine(&[0b0100_0_00_111_000000]); // JSRR R7
        m.registers_mut().set(R7, 0x5000);
        m.step().unwrap();
        assert_eq!(m.registers().get(R7), 0x3001);
        assert_eq!(m.registers().pc(), 0x5000);
    }

    #[test]
    fn loads() {
        let mut m = machine(&[
            0b0010_000_000000011, // LD R0, #3
            0b1010_001_000000010, // LDI R1, #2
            0b0110_010_011_111111, // LDR R2, R3, #-1
            0b1110_100_000000001, // LEA R4, #1
            0x3006,               // pointer
            0x8000,               // data
            0x0042,               // *pointer
        ]);
        m.registers_mut().set(R3, 0x3006);

        m.step().unwrap();
        assert_eq!(m.registers().get(R0), 0x3006);
        assert_eq!(flag(&m), Flag::Pos);

        m.step().unwrap();
        assert_eq!(m.registers().get(R1), 0x0042);

        m.step().unwrap();
        assert_eq!(m.registers().get(R2), 0x8000);
        assert_eq!(flag(&m), Flag::Neg);

        m.step().unwrap();
        assert_eq!(m.registers().get(R4), 0x3005);
        assert_eq!(flag(&m), Flag::Pos);
    }

    #[test]
    fn ldi_dereferences_twice() {
        let mut m = machine(&[0b1010_101_000000001, HALT, 0x4000]); // LDI R5, #1
        m.memory_mut().write(0x4000, 0xFFFE);
        m.step().unwrap();
        assert_eq!(m.registers().get(R5), 0xFFFE);
        assert_eq!(flag(&m), Flag::Neg);
    }

    #[test]
    fn stores() {
        let mut m = machine(&[
            0b0011_000_000000011,  // ST R0, #3
            0b1011_001_000000011,  // STI R1, #3
            0b0111_010_011_000010, // STR R2, R3, #2
            HALT,
            0,      // ST target
            0x4000, // STI pointer
        ]);
        m.registers_mut().set(R0, 0xAAAA);
        m.registers_mut().set(R1, 0xBBBB);
        m.registers_mut().set(R2, 0xCCCC);
        m.registers_mut().set(R3, 0x5000);
        let cond = m.registers().get(COND);

        for _ in 0..3 {
            m.step().unwrap();
        }
        assert_eq!(m.memory().peek(0x3004), 0xAAAA);
        assert_eq!(m.memory().peek(0x4000), 0xBBBB);
        assert_eq!(m.memory().peek(0x5002), 0xCCCC);
        // Stores leave the condition code alone
        assert_eq!(m.registers().get(COND), cond);
    }

    #[test]
    fn pc_relative_addressing_wraps() {
        let mut m = Machine::new(BufferedConsole::new());
        m.set_pc(0xFFFF);
        m.memory_mut().write(0xFFFF, 0b1110_000_000000001); // LEA R0, #1
        m.step().unwrap();
        assert_eq!(m.registers().pc(), 0x0000);
        assert_eq!(m.registers().get(R0), 0x0001);
    }

    #[test]
    fn reserved_opcodes_fault_without_mutation() {
        for word in [0x8000, 0xD000] {
            let mut m = machine(&[word]);
            let before = m.registers().clone();
            let err = m.step().unwrap_err();
            assert!(matches!(err, Fault::ReservedOpcode { .. }));
            assert_eq!(m.status(), Status::Halted);
            for r in Register::GENERAL {
                assert_eq!(m.registers().get(r), before.get(r));
            }
            assert_eq!(m.registers().get(COND), before.get(COND));
            assert!(matches!(
                m.fault(),
                Some((0x3000, Fault::ReservedOpcode { .. }))
            ));
            assert_eq!(m.instructions(), 0);
        }
    }

    #[test]
    fn invalid_trap_vector_faults() {
        let mut m = machine(&[0xF026]);
        let err = m.step().unwrap_err();
        assert!(matches!(err, Fault::InvalidTrap { vector: 0x26 }));
        assert!(!m.is_running());
        assert!(m.console().output().is_empty());
    }

    #[test]
    fn halted_machine_does_not_step() {
        let mut m = machine(&[HALT, 0b0001_000_000_1_00001]);
        assert_eq!(m.step().unwrap(), Status::Halted);
        assert_eq!(m.step().unwrap(), Status::Halted);
        assert_eq!(m.registers().pc(), 0x3001);
        assert_eq!(m.registers().get(R0), 0);
        assert_eq!(m.instructions(), 1);
    }

    #[test]
    fn host_halt_stops_run() {
        let mut m = machine(&[0b0000_111_111111111]); // BRnzp #-1
        m.step().unwrap();
        m.halt();
        m.run().unwrap();
        assert_eq!(m.instructions(), 1);
    }

    #[test]
    fn trap_getc() {
        let mut m = machine_with_input(&[0xF020, HALT], "k");
        m.step().unwrap();
        assert_eq!(m.registers().get(R0), b'k' as u16);
        assert_eq!(flag(&m), Flag::Pos);
        assert!(m.console().output().is_empty());
    }

    #[test]
    fn trap_out() {
        let mut m = machine(&[0xF021]);
        m.registers_mut().set(R0, 0x1241); // high byte ignored
        m.step().unwrap();
        assert_eq!(m.console().output(), b"A");
        assert_eq!(m.console().flushes(), 1);
    }

    #[test]
    fn trap_puts_stops_at_zero_word() {
        let mut m = machine(&[0xF022, HALT, 'o' as u16, 'k' as u16, 0, 'x' as u16]);
        m.registers_mut().set(R0, 0x3002);
        m.run().unwrap();
        assert_eq!(m.console().output_string(), "okHALT\n");
    }

    #[test]
    fn trap_puts_stops_at_top_of_memory() {
        let mut m = machine(&[0xF022, HALT]);
        m.memory_mut().write(0xFFFF, '!' as u16);
        m.registers_mut().set(R0, 0xFFFF);
        m.step().unwrap();
        assert_eq!(m.console().output(), b"!");
    }

    #[test]
    fn trap_putsp_unpacks_low_then_high() {
        let mut m = machine(&[
            0xF024,
            HALT,
            u16::from_le_bytes([b'a', b'b']),
            u16::from_le_bytes([b'c', 0]),
            0,
            u16::from_le_bytes([b'x', b'y']),
        ]);
        m.registers_mut().set(R0, 0x3002);
        m.step().unwrap();
        assert_eq!(m.console().output_string(), "abc");
    }

    #[test]
    fn trap_in_prompts_and_echoes() {
        let mut m = machine_with_input(&[0xF023], "z");
        m.set_prompt("> ");
        m.step().unwrap();
        assert_eq!(m.console().output_string(), "> z");
        assert_eq!(m.registers().get(R0), b'z' as u16);
        assert_eq!(flag(&m), Flag::Pos);
    }

    #[test]
    fn trap_in_on_exhausted_input() {
        let mut m = machine(&[0xF023]);
        m.set_prompt("");
        m.step().unwrap();
        assert_eq!(m.registers().get(R0), 0);
        assert_eq!(flag(&m), Flag::Zro);
    }

    #[test]
    fn trap_halt() {
        let mut m = machine(&[HALT]);
        m.run().unwrap();
        assert_eq!(m.status(), Status::Halted);
        assert_eq!(m.console().output_string(), "HALT\n");
        assert!(m.fault().is_none());
    }

    #[test]
    fn trap_halt_follows_output_directly() {
        let mut m = machine(&[0xF021, HALT]); // OUT; HALT
        m.registers_mut().set(R0, b'x' as u16);
        m.run().unwrap();
        assert_eq!(m.console().output_string(), "xHALT\n");
    }

    /// Console whose input side always fails.
    struct BrokenConsole;

    impl Console for BrokenConsole {
        fn read_char(&mut self) -> io::Result<u8> {
            Err(io::Error::other("input closed"))
        }

        fn peek_ready(&mut self) -> io::Result<bool> {
            Err(io::Error::other("input closed"))
        }

        fn write_char(&mut self, _byte: u8) -> io::Result<()> {
            Ok(())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn console_failure_faults_without_mutation() {
        let programs: [&[u16]; 2] = [
            // GETC
            &[0xF020, HALT],
            // LDI R0, KBSR
            &[0b1010_000_000000001, HALT, crate::memory::KBSR],
        ];
        for program in programs {
            let mut m = Machine::new(BrokenConsole);
            m.load(&ObjectImage::new(0x3000, program.to_vec())).unwrap();
            m.registers_mut().set(R0, 7);
            let cond = m.registers().get(COND);

            let err = m.run().unwrap_err();
            assert!(matches!(err, Fault::Console(_)));
            assert_eq!(m.status(), Status::Halted);
            assert!(matches!(m.fault(), Some((0x3000, Fault::Console(_)))));
            assert_eq!(m.registers().get(R0), 7);
            assert_eq!(m.registers().get(COND), cond);
            assert_eq!(m.instructions(), 0);
        }
    }

    #[test]
    fn polling_keyboard_through_ldi() {
        let mut m = machine_with_input(
            &[
                0b1010_000_000000010, // LDI R0, #2 (KBSR)
                0b1010_001_000000010, // LDI R1, #2 (KBDR)
                HALT,
                crate::memory::KBSR,
                crate::memory::KBDR,
            ],
            "y",
        );
        m.run().unwrap();
        assert_eq!(m.registers().get(R0), 0x8000);
        assert_eq!(m.registers().get(R1), b'y' as u16);
    }

    #[test]
    fn trace_does_not_change_semantics() {
        let program = [0b0001_001_000_1_00101, HALT];
        let mut plain = machine(&program);
        let mut traced = machine(&program);
        traced.set_trace(true);
        plain.run().unwrap();
        traced.run().unwrap();
        assert_eq!(plain.registers(), traced.registers());
        assert_eq!(plain.console().output(), traced.console().output());
    }
}
