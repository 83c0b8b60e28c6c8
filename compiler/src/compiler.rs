use std::fmt;
use std::io::{self, Write};

use log::debug;

use crate::lexer::{Lexer, LexerError};
use crate::symbol_table::{Kind, SymbolTable};
use crate::token::{Keyword, Token, TokenKind};
use crate::vm_writer::{Command, Segment, VmWriter};

/// The symbols that may join two terms of an expression.
const BINARY_OPS: &str = "+-*/&|<>=";

#[derive(Debug)]
pub enum CompileError {
    UnexpectedToken { expected: String, found: Token },
    UndefinedVariable { name: String, line: u32 },
    Lexer(LexerError),
    Io(io::Error),
}

impl From<LexerError> for CompileError {
    fn from(err: LexerError) -> CompileError {
        CompileError::Lexer(err)
    }
}

impl From<io::Error> for CompileError {
    fn from(err: io::Error) -> CompileError {
        CompileError::Io(err)
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CompileError::UnexpectedToken { expected, found } => {
                write!(f, "line {}: expected {}, found {}", found.line, expected, found.kind)
            }
            CompileError::UndefinedVariable { name, line } => {
                write!(f, "line {}: variable '{}' is not defined", line, name)
            }
            CompileError::Lexer(err) => write!(f, "{}", err),
            CompileError::Io(err) => write!(f, "i/o error: {}", err),
        }
    }
}

impl std::error::Error for CompileError {}

/// Translates one Jack class into VM code.
///
/// Parsing and emission are fused: each compile method consumes the tokens
/// spanning exactly its construct, emits its VM code on the way through, and
/// leaves the cursor on the first token after the construct. There is no
/// intermediate tree.
pub struct Compiler<'a, W: Write> {
    lexer: Lexer<'a>,
    writer: VmWriter<W>,
    symbols: SymbolTable,

    // Holds Eof until compile() pulls the first token.
    current: Token,

    class_name: String,
    while_label_count: u32,
    if_label_count: u32,
}

impl<'a, W: Write> Compiler<'a, W> {
    pub fn new(source: &'a str, out: W) -> Compiler<'a, W> {
        Compiler {
            lexer: Lexer::new(source),
            writer: VmWriter::new(out),
            symbols: SymbolTable::new(),

            current: Token { kind: TokenKind::Eof, line: 1 },

            class_name: String::new(),
            while_label_count: 0,
            if_label_count: 0,
        }
    }

    /// Compiles the single class the source must contain.
    pub fn compile(mut self) -> Result<(), CompileError> {
        self.advance()?;
        self.compile_class()?;
        self.writer.flush()?;
        Ok(())
    }

    //////////////////////////////////////////////////////////////////////////
    /// Class structure
    //////////////////////////////////////////////////////////////////////////

    fn compile_class(&mut self) -> Result<(), CompileError> {
        self.expect_keyword(Keyword::Class)?;
        self.class_name = self.expect_identifier()?;
        self.expect_symbol('{')?;

        while let TokenKind::Keyword(keyword) = self.current.kind {
            match keyword {
                Keyword::Static => self.compile_class_var_dec(Kind::Static)?,
                Keyword::Field => self.compile_class_var_dec(Kind::Field)?,
                Keyword::Constructor | Keyword::Function | Keyword::Method => {
                    self.compile_subroutine(keyword)?;
                }
                _ => return Err(self.unexpected("a class member declaration")),
            }
        }
        self.expect_symbol('}')?;

        debug!("class {} symbols: {:?}", self.class_name, self.symbols);
        Ok(())
    }

    fn compile_class_var_dec(&mut self, kind: Kind) -> Result<(), CompileError> {
        self.advance()?; // 'static' | 'field'

        let ty = self.expect_type()?;
        let name = self.expect_identifier()?;
        self.symbols.define(&name, &ty, kind);

        while self.check_symbol(',') {
            self.advance()?;
            let name = self.expect_identifier()?;
            self.symbols.define(&name, &ty, kind);
        }
        self.expect_symbol(';')
    }

    fn compile_subroutine(&mut self, flavor: Keyword) -> Result<(), CompileError> {
        self.symbols.start_subroutine();
        self.while_label_count = 0;
        self.if_label_count = 0;

        self.advance()?; // 'constructor' | 'function' | 'method'

        // Return type; the grammar checks it, emission never uses it.
        if self.check_keyword(Keyword::Void) {
            self.advance()?;
        } else {
            self.expect_type()?;
        }
        let name = self.expect_identifier()?;

        if flavor == Keyword::Method {
            // The receiver occupies the first argument slot.
            let class_name = self.class_name.clone();
            self.symbols.define("this", &class_name, Kind::Argument);
        }

        self.expect_symbol('(')?;
        self.compile_parameter_list()?;
        self.expect_symbol(')')?;

        self.compile_subroutine_body(&name, flavor)
    }

    fn compile_parameter_list(&mut self) -> Result<(), CompileError> {
        if self.check_symbol(')') {
            return Ok(());
        }
        loop {
            let ty = self.expect_type()?;
            let name = self.expect_identifier()?;
            self.symbols.define(&name, &ty, Kind::Argument);

            if !self.check_symbol(',') {
                return Ok(());
            }
            self.advance()?;
        }
    }

    fn compile_subroutine_body(&mut self, name: &str, flavor: Keyword) -> Result<(), CompileError> {
        self.expect_symbol('{')?;

        while self.check_keyword(Keyword::Var) {
            self.compile_var_dec()?;
        }

        let function_name = format!("{}.{}", self.class_name, name);
        self.writer.write_function(&function_name, self.symbols.var_count(Kind::Local))?;

        match flavor {
            Keyword::Constructor => {
                // Allocate the object and aim `this` at it.
                self.writer.write_push(Segment::Constant, self.symbols.var_count(Kind::Field))?;
                self.writer.write_call("Memory.alloc", 1)?;
                self.writer.write_pop(Segment::Pointer, 0)?;
            }
            Keyword::Method => {
                // The receiver arrives as argument 0.
                self.writer.write_push(Segment::Argument, 0)?;
                self.writer.write_pop(Segment::Pointer, 0)?;
            }
            _ => {}
        }

        self.compile_statements()?;
        self.expect_symbol('}')?;

        debug!("subroutine {} symbols: {:?}", function_name, self.symbols);
        Ok(())
    }

    fn compile_var_dec(&mut self) -> Result<(), CompileError> {
        self.advance()?; // 'var'

        let ty = self.expect_type()?;
        let name = self.expect_identifier()?;
        self.symbols.define(&name, &ty, Kind::Local);

        while self.check_symbol(',') {
            self.advance()?;
            let name = self.expect_identifier()?;
            self.symbols.define(&name, &ty, Kind::Local);
        }
        self.expect_symbol(';')
    }

    //////////////////////////////////////////////////////////////////////////
    /// Statements
    //////////////////////////////////////////////////////////////////////////

    fn compile_statements(&mut self) -> Result<(), CompileError> {
        loop {
            match self.current.kind {
                TokenKind::Keyword(Keyword::Let) => self.compile_let()?,
                TokenKind::Keyword(Keyword::If) => self.compile_if()?,
                TokenKind::Keyword(Keyword::While) => self.compile_while()?,
                TokenKind::Keyword(Keyword::Do) => self.compile_do()?,
                TokenKind::Keyword(Keyword::Return) => self.compile_return()?,
                _ => return Ok(()),
            }
        }
    }

    fn compile_let(&mut self) -> Result<(), CompileError> {
        self.advance()?; // 'let'

        let line = self.current.line;
        let name = self.expect_identifier()?;
        let (segment, index) = self.variable(&name, line)?;

        if self.check_symbol('[') {
            self.writer.write_push(segment, index)?;
            self.advance()?; // '['
            self.compile_expression()?;
            self.expect_symbol(']')?;
            self.writer.write_arithmetic(Command::Add)?;

            self.expect_symbol('=')?;
            self.compile_expression()?;

            // Park the assigned value in temp 0 while the target address
            // moves into pointer 1; the rhs may itself have used pointer 1
            // for an array read.
            self.writer.write_pop(Segment::Temp, 0)?;
            self.writer.write_pop(Segment::Pointer, 1)?;
            self.writer.write_push(Segment::Temp, 0)?;
            self.writer.write_pop(Segment::That, 0)?;
        } else {
            self.expect_symbol('=')?;
            self.compile_expression()?;
            self.writer.write_pop(segment, index)?;
        }
        self.expect_symbol(';')
    }

    fn compile_if(&mut self) -> Result<(), CompileError> {
        let suffix = self.if_label_count;
        self.if_label_count += 1;

        self.advance()?; // 'if'
        self.expect_symbol('(')?;
        self.compile_expression()?;
        self.expect_symbol(')')?;

        self.writer.write_arithmetic(Command::Not)?;
        self.writer.write_if(&format!("IF_FALSE{}", suffix))?;

        self.expect_symbol('{')?;
        self.compile_statements()?;
        self.expect_symbol('}')?;

        if self.check_keyword(Keyword::Else) {
            self.advance()?; // 'else'
            self.writer.write_goto(&format!("END_IF{}", suffix))?;
            self.writer.write_label(&format!("IF_FALSE{}", suffix))?;

            self.expect_symbol('{')?;
            self.compile_statements()?;
            self.expect_symbol('}')?;
            self.writer.write_label(&format!("END_IF{}", suffix))?;
        } else {
            self.writer.write_label(&format!("IF_FALSE{}", suffix))?;
        }
        Ok(())
    }

    fn compile_while(&mut self) -> Result<(), CompileError> {
        let suffix = self.while_label_count;
        self.while_label_count += 1;

        self.advance()?; // 'while'
        self.writer.write_label(&format!("WHILE{}", suffix))?;

        self.expect_symbol('(')?;
        self.compile_expression()?;
        self.expect_symbol(')')?;

        self.writer.write_arithmetic(Command::Not)?;
        self.writer.write_if(&format!("END_WHILE{}", suffix))?;

        self.expect_symbol('{')?;
        self.compile_statements()?;
        self.expect_symbol('}')?;

        self.writer.write_goto(&format!("WHILE{}", suffix))?;
        self.writer.write_label(&format!("END_WHILE{}", suffix))?;
        Ok(())
    }

    fn compile_do(&mut self) -> Result<(), CompileError> {
        self.advance()?; // 'do'

        let name = self.expect_identifier()?;
        self.compile_subroutine_call(&name)?;

        // The call site discards the return value.
        self.writer.write_pop(Segment::Temp, 0)?;
        self.expect_symbol(';')
    }

    fn compile_return(&mut self) -> Result<(), CompileError> {
        self.advance()?; // 'return'

        if self.check_symbol(';') {
            // Void subroutines still return a word.
            self.writer.write_push(Segment::Constant, 0)?;
        } else {
            self.compile_expression()?;
        }
        self.writer.write_return()?;
        self.expect_symbol(';')
    }

    //////////////////////////////////////////////////////////////////////////
    /// Expressions
    //////////////////////////////////////////////////////////////////////////

    /// Operators apply strictly left to right; the language has no
    /// precedence levels, so `1 + 2 * 3` compiles as `(1 + 2) * 3`.
    fn compile_expression(&mut self) -> Result<(), CompileError> {
        self.compile_term()?;

        while let TokenKind::Symbol(op) = self.current.kind {
            if !BINARY_OPS.contains(op) {
                break;
            }
            self.advance()?;
            self.compile_term()?;

            match op {
                '+' => self.writer.write_arithmetic(Command::Add)?,
                '-' => self.writer.write_arithmetic(Command::Sub)?,
                '=' => self.writer.write_arithmetic(Command::Eq)?,
                '<' => self.writer.write_arithmetic(Command::Lt)?,
                '>' => self.writer.write_arithmetic(Command::Gt)?,
                '&' => self.writer.write_arithmetic(Command::And)?,
                '|' => self.writer.write_arithmetic(Command::Or)?,
                '*' => self.writer.write_call("Math.multiply", 2)?,
                '/' => self.writer.write_call("Math.divide", 2)?,
                _ => unreachable!(),
            }
        }
        Ok(())
    }

    fn compile_term(&mut self) -> Result<(), CompileError> {
        match self.current.kind.clone() {
            TokenKind::IntConst(value) => {
                self.advance()?;
                self.writer.write_push(Segment::Constant, value)?;
            }
            TokenKind::StringConst(value) => {
                self.advance()?;
                self.compile_string_const(&value)?;
            }
            TokenKind::Keyword(keyword) => self.compile_keyword_const(keyword)?,
            TokenKind::Identifier(name) => {
                let line = self.current.line;
                self.advance()?;
                self.compile_identifier_term(&name, line)?;
            }
            TokenKind::Symbol('(') => {
                self.advance()?;
                self.compile_expression()?;
                self.expect_symbol(')')?;
            }
            TokenKind::Symbol('-') => {
                self.advance()?;
                self.compile_term()?;
                self.writer.write_arithmetic(Command::Neg)?;
            }
            TokenKind::Symbol('~') => {
                self.advance()?;
                self.compile_term()?;
                self.writer.write_arithmetic(Command::Not)?;
            }
            _ => return Err(self.unexpected("a term")),
        }
        Ok(())
    }

    fn compile_string_const(&mut self, value: &str) -> Result<(), CompileError> {
        self.writer.write_push(Segment::Constant, value.len() as u16)?;
        self.writer.write_call("String.new", 1)?;

        for ch in value.chars() {
            self.writer.write_push(Segment::Constant, ch as u16)?;
            self.writer.write_call("String.appendChar", 2)?;
        }
        Ok(())
    }

    fn compile_keyword_const(&mut self, keyword: Keyword) -> Result<(), CompileError> {
        match keyword {
            Keyword::True => {
                self.advance()?;
                self.writer.write_push(Segment::Constant, 0)?;
                self.writer.write_arithmetic(Command::Not)?;
            }
            Keyword::False | Keyword::Null => {
                self.advance()?;
                self.writer.write_push(Segment::Constant, 0)?;
            }
            Keyword::This => {
                self.advance()?;
                self.writer.write_push(Segment::Pointer, 0)?;
            }
            _ => return Err(self.unexpected("a term")),
        }
        Ok(())
    }

    /// Compiles a term that starts with an identifier, which the token after
    /// the identifier disambiguates: an array read, a subroutine call, or a
    /// plain variable.
    fn compile_identifier_term(&mut self, name: &str, line: u32) -> Result<(), CompileError> {
        match self.current.kind {
            TokenKind::Symbol('[') => {
                let (segment, index) = self.variable(name, line)?;
                self.writer.write_push(segment, index)?;

                self.advance()?; // '['
                self.compile_expression()?;
                self.expect_symbol(']')?;

                self.writer.write_arithmetic(Command::Add)?;
                self.writer.write_pop(Segment::Pointer, 1)?;
                self.writer.write_push(Segment::That, 0)?;
            }
            TokenKind::Symbol('(') | TokenKind::Symbol('.') => {
                self.compile_subroutine_call(name)?;
            }
            _ => {
                let (segment, index) = self.variable(name, line)?;
                self.writer.write_push(segment, index)?;
            }
        }
        Ok(())
    }

    /// Compiles a call whose leading identifier has already been consumed.
    ///
    /// `name(...)` is a method call on the current object; `var.name(...)`
    /// for a known variable pushes the receiver and dispatches on its
    /// declared type; any other `Target.name(...)` is a plain function or
    /// constructor call.
    fn compile_subroutine_call(&mut self, identifier: &str) -> Result<(), CompileError> {
        let callee;
        let mut n_args: u16 = 0;

        if self.check_symbol('.') {
            self.advance()?; // '.'
            let subroutine = self.expect_identifier()?;

            if let Some(symbol) = self.symbols.resolve(identifier) {
                let (segment, index) = (symbol.kind.segment(), symbol.index);
                callee = format!("{}.{}", symbol.ty, subroutine);

                self.writer.write_push(segment, index)?;
                n_args += 1;
            } else {
                callee = format!("{}.{}", identifier, subroutine);
            }
        } else {
            callee = format!("{}.{}", self.class_name, identifier);
            self.writer.write_push(Segment::Pointer, 0)?;
            n_args += 1;
        }

        self.expect_symbol('(')?;
        n_args += self.compile_expression_list()?;
        self.expect_symbol(')')?;

        self.writer.write_call(&callee, n_args)?;
        Ok(())
    }

    /// Compiles a possibly empty comma-separated expression list and returns
    /// how many expressions it held.
    fn compile_expression_list(&mut self) -> Result<u16, CompileError> {
        if self.check_symbol(')') {
            return Ok(0);
        }

        let mut n_args = 1;
        self.compile_expression()?;

        while self.check_symbol(',') {
            self.advance()?;
            self.compile_expression()?;
            n_args += 1;
        }
        Ok(n_args)
    }

    //////////////////////////////////////////////////////////////////////////
    /// Helper functions
    //////////////////////////////////////////////////////////////////////////

    fn advance(&mut self) -> Result<(), CompileError> {
        self.current = self.lexer.scan_token()?;
        Ok(())
    }

    fn check_symbol(&self, symbol: char) -> bool {
        self.current.kind == TokenKind::Symbol(symbol)
    }

    fn check_keyword(&self, keyword: Keyword) -> bool {
        self.current.kind == TokenKind::Keyword(keyword)
    }

    fn expect_symbol(&mut self, symbol: char) -> Result<(), CompileError> {
        if self.check_symbol(symbol) {
            return self.advance();
        }
        Err(self.unexpected(format!("'{}'", symbol)))
    }

    fn expect_keyword(&mut self, keyword: Keyword) -> Result<(), CompileError> {
        if self.check_keyword(keyword) {
            return self.advance();
        }
        Err(self.unexpected(format!("'{}'", keyword.as_str())))
    }

    fn expect_identifier(&mut self) -> Result<String, CompileError> {
        if let TokenKind::Identifier(name) = &self.current.kind {
            let name = name.clone();
            self.advance()?;
            return Ok(name);
        }
        Err(self.unexpected("an identifier"))
    }

    /// int | char | boolean | a class name.
    fn expect_type(&mut self) -> Result<String, CompileError> {
        let ty = match &self.current.kind {
            TokenKind::Keyword(k @ (Keyword::Int | Keyword::Char | Keyword::Boolean)) => {
                k.as_str().to_owned()
            }
            TokenKind::Identifier(name) => name.clone(),
            _ => return Err(self.unexpected("a type")),
        };
        self.advance()?;
        Ok(ty)
    }

    /// Resolves a variable name to its VM storage location.
    fn variable(&self, name: &str, line: u32) -> Result<(Segment, u16), CompileError> {
        match self.symbols.resolve(name) {
            Some(symbol) => Ok((symbol.kind.segment(), symbol.index)),
            None => Err(CompileError::UndefinedVariable { name: name.to_owned(), line }),
        }
    }

    fn unexpected(&self, expected: impl Into<String>) -> CompileError {
        CompileError::UnexpectedToken {
            expected: expected.into(),
            found: self.current.clone(),
        }
    }
}
