//! Code generation.
//!
//! Walks a program that analyzed cleanly and drives an [`Emitter`]. The
//! generator trusts the analysis: a name, type or target it cannot resolve
//! is an internal defect reported as a [`CodeGenError`], and generation
//! stops at the first one.
//!
//! Layout decisions made here:
//! - instance methods receive their receiver in local slot 0;
//! - every local and parameter gets its own slot in declaration order;
//! - `int` operands meeting `double` ones are widened explicitly.

mod breaks;
mod expr;
mod scope;
mod stmt;

pub use breaks::BreakLabels;
pub use scope::{LocalScope, LocalVar};

use std::path::Path;

use mica_core::{CodeGenError, Span, Type};
use mica_parser::ast::{ClassMember, Expr, Item, MethodDecl, Program};
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::emit::{Emitter, Instruction, Label, MethodSink};
use crate::sema::{Analysis, Decorations};
use crate::symbols::{ClassSymbol, MethodSymbol, SymbolTable};

type Result<T> = std::result::Result<T, CodeGenError>;

/// Slot holding the receiver of an instance method.
pub const RECEIVER_SLOT: u32 = 0;

/// Generate code for an analyzed program and finalize the backend.
///
/// Refuses to run when the analysis reported anything.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn generate<E: Emitter>(
    program: &Program<'_>,
    analysis: &Analysis,
    emitter: E,
    output: Option<&Path>,
) -> Result<E::Artifact> {
    if !analysis.is_ok() {
        return Err(CodeGenError::HasDiagnostics {
            count: analysis.diagnostics.len(),
        });
    }
    let mut generator = CodeGenerator::new(&analysis.symbols, &analysis.decorations, emitter);
    generator.program(program)?;
    generator.emitter.finalize(output)
}

pub struct CodeGenerator<'a, E: Emitter> {
    symbols: &'a SymbolTable,
    decorations: &'a Decorations,
    emitter: E,
    globals: FxHashMap<String, u32>,

    // State of the method being generated.
    sink: MethodSink,
    class: Option<&'a ClassSymbol>,
    return_type: Type,
    scope: LocalScope,
    breaks: BreakLabels,
}

impl<'a, E: Emitter> CodeGenerator<'a, E> {
    pub fn new(symbols: &'a SymbolTable, decorations: &'a Decorations, emitter: E) -> Self {
        Self {
            symbols,
            decorations,
            emitter,
            globals: FxHashMap::default(),
            sink: MethodSink(0),
            class: None,
            return_type: Type::Void,
            scope: LocalScope::new(),
            breaks: BreakLabels::new(),
        }
    }

    pub fn into_emitter(self) -> E {
        self.emitter
    }

    /// Emit layouts, globals and every method body.
    pub fn program(&mut self, program: &Program<'_>) -> Result<()> {
        let symbols = self.symbols;

        for class in symbols.classes() {
            let fields: Vec<Type> = class.fields().map(|f| f.ty.clone()).collect();
            self.emitter.define_type(&class.name, &fields);
        }

        for global in symbols.globals() {
            let slot = self.emitter.declare_global(&global.name, &global.ty)?;
            self.globals.insert(global.name.clone(), slot);
        }

        for item in program.items() {
            match item {
                Item::Class(decl) => {
                    let class = symbols
                        .class(decl.name.name)
                        .ok_or_else(|| unresolved(decl.name.name, decl.name.span))?;
                    for member in decl.members {
                        if let ClassMember::Method(method) = member {
                            self.method(method, Some(class))?;
                        }
                    }
                }
                Item::Method(method) => self.method(method, None)?,
                Item::Var(_) => {}
            }
        }
        Ok(())
    }

    fn method(&mut self, decl: &MethodDecl<'_>, class: Option<&'a ClassSymbol>) -> Result<()> {
        let symbols = self.symbols;
        let name = decl.name;
        let symbol: &MethodSymbol = match class {
            Some(class) => class.method(name.name),
            None => symbols.method(name.name),
        }
        .ok_or_else(|| unresolved(name.name, name.span))?;
        debug!(
            method = %symbol.hash(),
            name = name.name,
            owner = ?symbol.owner,
            "generating method"
        );

        let params: Vec<Type> = symbol.param_types().cloned().collect();
        self.sink = self.emitter.define_method(
            class.map(|c| c.name.as_str()),
            name.name,
            &symbol.return_type,
            &params,
        );
        self.class = class;
        self.return_type = symbol.return_type.clone();
        self.scope = LocalScope::new();
        self.breaks = BreakLabels::new();
        self.line(decl.span);

        if let Some(class) = class {
            let slot = self.declare_local(&Type::class(class.name.as_str()))?;
            debug_assert_eq!(slot, RECEIVER_SLOT);
        }
        for (param, ty) in decl.params.iter().zip(params) {
            let slot = self.declare_local(&ty)?;
            self.scope.declare(param.name.name, ty, slot);
        }

        for stmt in decl.body.stmts {
            self.stmt(stmt)?;
        }
        if self.return_type == Type::Void {
            self.line(decl.body.span);
            self.emit(Instruction::ReturnVoid)?;
        }
        self.class = None;
        Ok(())
    }

    // =========================================
    // Backend helpers
    // =========================================

    fn emit(&mut self, instruction: Instruction) -> Result<()> {
        trace!(method = self.sink.0, %instruction, "emit");
        self.emitter.emit(self.sink, instruction)
    }

    fn line(&mut self, span: Span) {
        self.emitter.set_line(self.sink, span.line);
    }

    fn declare_local(&mut self, ty: &Type) -> Result<u32> {
        self.emitter.declare_local(self.sink, ty)
    }

    fn new_label(&mut self) -> Label {
        self.emitter.new_label(self.sink)
    }

    fn mark(&mut self, label: Label) {
        self.emitter.mark_label(self.sink, label);
    }

    /// The type analysis recorded for `expr`.
    fn type_of(&self, expr: &Expr<'_>) -> Result<Type> {
        self.decorations
            .get(expr.id)
            .cloned()
            .ok_or(CodeGenError::MissingType { span: expr.span })
    }

    /// Layout of a class type.
    fn class_of(&self, ty: &Type, span: Span) -> Result<&'a ClassSymbol> {
        let symbols = self.symbols;
        match ty {
            Type::Class(name) => symbols.class(name).ok_or_else(|| unresolved(name, span)),
            other => Err(CodeGenError::InvalidTarget {
                name: other.to_string(),
                span,
            }),
        }
    }
}

fn unresolved(name: &str, span: Span) -> CodeGenError {
    CodeGenError::UnresolvedSymbol {
        name: name.to_string(),
        span,
    }
}
