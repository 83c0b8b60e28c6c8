mod options;

use std::fs;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use log::{info, warn};

use jackc::compiler::Compiler;
use options::Options;

const SOURCE_EXTENSION: &str = "jack";
const OUTPUT_EXTENSION: &str = "vm";

/// Compiles one `.jack` file into a `.vm` file beside it, overwriting any
/// previous output.
fn compile_file(source: &Path) -> Result<(), String> {
    let text = fs::read_to_string(source)
        .map_err(|err| format!("{}: {}", source.display(), err))?;

    let output = source.with_extension(OUTPUT_EXTENSION);
    if output.exists() {
        warn!("overwriting {}", output.display());
    }
    let file = File::create(&output)
        .map_err(|err| format!("{}: {}", output.display(), err))?;

    info!("compiling {}", source.display());
    Compiler::new(&text, BufWriter::new(file))
        .compile()
        .map_err(|err| format!("{}: {}", source.display(), err))
}

/// The immediate `.jack` children of a directory, in name order so repeated
/// runs compile in the same sequence.
fn jack_files(dir: &Path) -> Result<Vec<PathBuf>, String> {
    let entries = fs::read_dir(dir).map_err(|err| format!("{}: {}", dir.display(), err))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|err| format!("{}: {}", dir.display(), err))?.path();
        if path.is_file() && path.extension().map_or(false, |ext| ext == SOURCE_EXTENSION) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn run(opts: &Options) -> Result<(), String> {
    let source = Path::new(&opts.path);

    if source.is_dir() {
        for file in jack_files(source)? {
            compile_file(&file)?;
        }
        Ok(())
    } else if source.is_file() {
        compile_file(source)
    } else {
        Err(format!("'{}' is not a valid file or directory path", opts.path))
    }
}

fn cmain() -> i32 {
    env_logger::init();
    let opts = Options::parse();

    match run(&opts) {
        Ok(()) => 0,
        Err(message) => {
            eprintln!("{}", message);
            1
        }
    }
}

fn main() {
    std::process::exit(cmain());
}
