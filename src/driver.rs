//! Driver that runs the compilation pipeline and executes its result.
//!
//! Parsing, analysis and generation run in order; generation is skipped
//! entirely when analysis reports anything, so a failed compilation never
//! leaves an artifact behind.

use std::fs;
use std::io::BufRead;
use std::path::{Path, PathBuf};

use bumpalo::Bump;
use mica_compiler::{BytecodeBackend, BytecodeModule, analyze, generate};
use mica_core::{Diagnostics, MicaError, RuntimeError};
use mica_parser::Parser;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::vm::Vm;

/// Settings for one compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    /// Where to write the JSON artifact, if anywhere.
    pub output: Option<PathBuf>,
    /// Global method without parameters that execution starts in.
    pub entry_point: String,
    /// Keep a disassembly listing in the [`Compilation`].
    pub dump_bytecode: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            output: None,
            entry_point: "main".to_string(),
            dump_bytecode: false,
        }
    }
}

/// A successfully compiled program.
#[derive(Debug, Clone)]
pub struct Compilation {
    pub module: BytecodeModule,
    /// Disassembly, when [`CompileOptions::dump_bytecode`] is set.
    pub listing: Option<String>,
}

/// Outcome of running a module.
#[derive(Debug, Clone, PartialEq)]
pub struct Execution {
    /// Everything the program wrote, including output produced before a
    /// runtime error.
    pub stdout: String,
    pub exit_code: i32,
    pub error: Option<RuntimeError>,
}

impl Execution {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Why a compilation produced no artifact.
#[derive(Debug, Error)]
pub enum CompileFailure {
    #[error("could not read '{}': {message}", path.display())]
    Io { path: PathBuf, message: String },

    #[error("could not load artifact '{}': {message}", path.display())]
    Artifact { path: PathBuf, message: String },

    #[error("{error}")]
    Pipeline { error: MicaError, program: String },
}

impl CompileFailure {
    /// The pipeline error, if the source was read.
    pub fn error(&self) -> Option<&MicaError> {
        match self {
            CompileFailure::Pipeline { error, .. } => Some(error),
            _ => None,
        }
    }

    pub fn diagnostics(&self) -> Option<&Diagnostics> {
        match self.error() {
            Some(MicaError::Semantic(diagnostics)) => Some(diagnostics),
            _ => None,
        }
    }

    /// Every message, with the offending source line underneath when known.
    pub fn render(&self) -> String {
        let CompileFailure::Pipeline { error, program } = self else {
            return self.to_string();
        };
        match error {
            MicaError::Parse(err) => err.display_with_source(program),
            MicaError::Semantic(diagnostics) => diagnostics
                .iter()
                .map(|d| d.display_with_source(program))
                .collect::<Vec<_>>()
                .join("\n"),
            other => other.to_string(),
        }
    }
}

/// The compilation driver.
#[derive(Debug, Clone, Default)]
pub struct Driver {
    options: CompileOptions,
}

impl Driver {
    pub fn new(options: CompileOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    pub fn compile_file(&self, path: &Path) -> Result<Compilation, CompileFailure> {
        let source = fs::read_to_string(path).map_err(|err| CompileFailure::Io {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        debug!(path = %path.display(), bytes = source.len(), "read source");
        self.compile_source(&source)
    }

    /// Run the pipeline
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn compile_source(&self, source: &str) -> Result<Compilation, CompileFailure> {
        let fail = |error: MicaError| CompileFailure::Pipeline {
            error,
            program: source.to_string(),
        };

        // === Parsing ===
        let arena = Bump::new();
        let program = Parser::parse(source, &arena).map_err(|err| fail(err.into()))?;
        debug!(items = program.items().len(), "parsed");

        // === Semantic Analysis ===
        let analysis = analyze(&program);
        if !analysis.is_ok() {
            debug!(
                count = analysis.diagnostics.len(),
                "analysis reported errors"
            );
            return Err(fail(analysis.diagnostics.into()));
        }

        // === Code Generation ===
        let backend = BytecodeBackend::new(self.options.entry_point.as_str());
        let output = self.options.output.as_deref();
        let module =
            generate(&program, &analysis, backend, output).map_err(|err| fail(err.into()))?;
        if let Some(path) = output {
            info!(path = %path.display(), "wrote artifact");
        }

        let listing = self.options.dump_bytecode.then(|| module.disassemble());
        Ok(Compilation { module, listing })
    }

    /// Parse and analyze without generating code.
    pub fn check_source(&self, source: &str) -> Result<(), CompileFailure> {
        let fail = |error: MicaError| CompileFailure::Pipeline {
            error,
            program: source.to_string(),
        };
        let arena = Bump::new();
        let program = Parser::parse(source, &arena).map_err(|err| fail(err.into()))?;
        let analysis = analyze(&program);
        if analysis.is_ok() {
            Ok(())
        } else {
            Err(fail(analysis.diagnostics.into()))
        }
    }

    /// Read a module previously written by [`Driver::compile_file`].
    pub fn load_artifact(&self, path: &Path) -> Result<BytecodeModule, CompileFailure> {
        let artifact = |message: String| CompileFailure::Artifact {
            path: path.to_path_buf(),
            message,
        };
        let json = fs::read_to_string(path).map_err(|err| artifact(err.to_string()))?;
        let mut module =
            BytecodeModule::from_json(&json).map_err(|err| artifact(err.to_string()))?;
        self.select_entry(&mut module);
        Ok(module)
    }

    /// Execute `module`, capturing what it writes.
    pub fn run(&self, module: &BytecodeModule, input: impl BufRead) -> Execution {
        let mut stdout = Vec::new();
        let result = Vm::new(module).run(input, &mut stdout);
        let stdout = String::from_utf8_lossy(&stdout).into_owned();
        match result {
            Ok(()) => Execution {
                stdout,
                exit_code: 0,
                error: None,
            },
            Err(err) => {
                warn!(error = %err, "execution failed");
                Execution {
                    stdout,
                    exit_code: 1,
                    error: Some(err),
                }
            }
        }
    }

    /// Point `module` at the configured entry point.
    fn select_entry(&self, module: &mut BytecodeModule) {
        let name = self.options.entry_point.as_str();
        module.entry = module
            .functions
            .iter()
            .find(|f| f.name == name && f.arity == 0 && !f.has_receiver)
            .map(|f| f.hash);
        if module.entry.is_none() {
            debug!(entry = name, "no entry point");
        }
    }
}
