use std::fmt;
use std::io::{self, Write};

/// A virtual memory segment of the Hack VM.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Segment {
    Constant,
    Argument,
    Local,
    Static,
    This,
    That,
    Pointer,
    Temp,
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Segment::Constant => "constant",
            Segment::Argument => "argument",
            Segment::Local => "local",
            Segment::Static => "static",
            Segment::This => "this",
            Segment::That => "that",
            Segment::Pointer => "pointer",
            Segment::Temp => "temp",
        };
        f.write_str(name)
    }
}

/// An arithmetic-logical command of the Hack VM.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Command {
    Add,
    Sub,
    Neg,
    Eq,
    Gt,
    Lt,
    And,
    Or,
    Not,
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Command::Add => "add",
            Command::Sub => "sub",
            Command::Neg => "neg",
            Command::Eq => "eq",
            Command::Gt => "gt",
            Command::Lt => "lt",
            Command::And => "and",
            Command::Or => "or",
            Command::Not => "not",
        };
        f.write_str(name)
    }
}

/// Serializes VM commands as text, one instruction per line, onto any
/// `io::Write` sink. Owns the sink; dropping the writer closes it.
pub struct VmWriter<W: Write> {
    out: W,
}

impl<W: Write> VmWriter<W> {
    pub fn new(out: W) -> VmWriter<W> {
        VmWriter { out }
    }

    pub fn write_push(&mut self, segment: Segment, index: u16) -> io::Result<()> {
        writeln!(self.out, "push {} {}", segment, index)
    }

    pub fn write_pop(&mut self, segment: Segment, index: u16) -> io::Result<()> {
        writeln!(self.out, "pop {} {}", segment, index)
    }

    pub fn write_arithmetic(&mut self, command: Command) -> io::Result<()> {
        writeln!(self.out, "{}", command)
    }

    pub fn write_label(&mut self, label: &str) -> io::Result<()> {
        writeln!(self.out, "label {}", label)
    }

    pub fn write_goto(&mut self, label: &str) -> io::Result<()> {
        writeln!(self.out, "goto {}", label)
    }

    pub fn write_if(&mut self, label: &str) -> io::Result<()> {
        writeln!(self.out, "if-goto {}", label)
    }

    pub fn write_call(&mut self, name: &str, n_args: u16) -> io::Result<()> {
        writeln!(self.out, "call {} {}", name, n_args)
    }

    pub fn write_function(&mut self, name: &str, n_locals: u16) -> io::Result<()> {
        writeln!(self.out, "function {} {}", name, n_locals)
    }

    pub fn write_return(&mut self) -> io::Result<()> {
        writeln!(self.out, "return")
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}
