use jackc::compiler::{CompileError, Compiler};

/// Compiles a single-class source in memory and returns the emitted lines.
pub fn compile(source: &str) -> Vec<String> {
    let mut buffer = Vec::new();
    Compiler::new(source, &mut buffer)
        .compile()
        .expect("compilation failed");
    String::from_utf8(buffer).unwrap().lines().map(str::to_owned).collect()
}

/// Compiles a source expected to be rejected and returns the error.
pub fn compile_err(source: &str) -> CompileError {
    let mut buffer = Vec::new();
    Compiler::new(source, &mut buffer)
        .compile()
        .expect_err("compilation unexpectedly succeeded")
}
