//! Semantic analysis.
//!
//! A single pass over the tree that builds the symbol table, checks every
//! typing and scoping rule, and records the resolved type of each
//! expression. Analysis never stops early: every violation becomes a
//! [`Diagnostic`] and the offending expression is typed `Unknown` so one
//! mistake does not cascade into many.
//!
//! Class names are registered before anything else, then the fields and
//! method signatures of every class, so a class and its members may be
//! used before their declaration. Globals and global methods are visible
//! only after they have been declared.

mod context;
mod decl;
mod expr;
mod return_checker;
mod stmt;

pub use context::{BreakContext, Breakable};
pub use return_checker::ReturnChecker;

use mica_core::{Diagnostic, DiagnosticKind, Diagnostics, Span, Type};
use mica_parser::ast::{ExprId, Item, Program};
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::symbols::{AlreadyDeclared, Builtin, OUTERMOST, Symbol, SymbolTable};

/// What a name or call resolved to during analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    /// A local variable or parameter of the enclosing method.
    Local,
    /// A field of the enclosing class, accessed through the receiver.
    Field,
    Global,
    /// A user method; `owner` is its class, `None` for global methods.
    Method { owner: Option<String> },
    Builtin(Builtin),
}

/// Facts recorded per expression: its resolved type, and for names and
/// calls, what they resolved to.
#[derive(Debug, Clone, Default)]
pub struct Decorations {
    types: FxHashMap<ExprId, Type>,
    bindings: FxHashMap<ExprId, Binding>,
}

impl Decorations {
    pub fn insert(&mut self, id: ExprId, ty: Type) {
        self.types.insert(id, ty);
    }

    pub fn get(&self, id: ExprId) -> Option<&Type> {
        self.types.get(&id)
    }

    pub fn bind(&mut self, id: ExprId, binding: Binding) {
        self.bindings.insert(id, binding);
    }

    pub fn binding(&self, id: ExprId) -> Option<&Binding> {
        self.bindings.get(&id)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// Everything analysis produces.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub diagnostics: Diagnostics,
    pub decorations: Decorations,
    /// Globals, methods and classes (with their members) after analysis.
    pub symbols: SymbolTable,
}

impl Analysis {
    /// True when the program may proceed to code generation.
    pub fn is_ok(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Analyze a parsed program.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn analyze(program: &Program<'_>) -> Analysis {
    Analyzer::new().run(program)
}

/// The class currently being analyzed. `members` is rebuilt declaration
/// by declaration as the body is checked and replaces the pre-declared
/// table once the body is done.
#[derive(Debug)]
struct ClassScope {
    name: String,
    members: SymbolTable,
    registered: bool,
}

#[derive(Debug)]
pub struct Analyzer {
    globals: SymbolTable,
    class: Option<ClassScope>,
    breakables: BreakContext,
    return_type: Type,
    diagnostics: Diagnostics,
    decorations: Decorations,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer {
    pub fn new() -> Self {
        Self {
            globals: SymbolTable::with_builtins(),
            class: None,
            breakables: BreakContext::new(),
            return_type: Type::Void,
            diagnostics: Diagnostics::new(),
            decorations: Decorations::default(),
        }
    }

    pub fn run(mut self, program: &Program<'_>) -> Analysis {
        debug!(items = program.items().len(), "analyzing program");

        for class in program.classes() {
            if let Err(err) = self.globals.insert_class(class.name.name, class.name.span) {
                self.duplicate(err, class.name.span);
            }
        }
        for class in program.classes() {
            self.declare_members(class);
        }

        for item in program.items() {
            match item {
                Item::Class(class) => self.check_class(class),
                Item::Var(var) => self.check_global(var),
                Item::Method(method) => self.check_method(method, None),
            }
        }

        debug!(
            diagnostics = self.diagnostics.len(),
            expressions = self.decorations.len(),
            "analysis finished"
        );
        Analysis {
            diagnostics: self.diagnostics,
            decorations: self.decorations,
            symbols: self.globals,
        }
    }

    // =========================================
    // Scope access
    // =========================================

    /// The table new declarations go into.
    fn scope_mut(&mut self) -> &mut SymbolTable {
        match &mut self.class {
            Some(class) => &mut class.members,
            None => &mut self.globals,
        }
    }

    /// Locals, then members of the enclosing class, then globals.
    fn lookup(&self, name: &str) -> Option<(&Symbol, Binding)> {
        let local_or = |symbol: &Symbol, outer: Binding| {
            if symbol.level() == OUTERMOST {
                outer
            } else {
                Binding::Local
            }
        };
        if let Some(class) = &self.class {
            if let Some(symbol) = class.members.lookup(name) {
                return Some((symbol, local_or(symbol, Binding::Field)));
            }
            // Members declared further down the class body.
            if class.registered
                && let Some(symbol) = self
                    .class_members(&class.name)
                    .and_then(|members| members.lookup_level(name, OUTERMOST))
            {
                return Some((symbol, Binding::Field));
            }
        }
        self.globals
            .lookup(name)
            .map(|symbol| (symbol, local_or(symbol, Binding::Global)))
    }

    /// Every field and method signature of a class.
    fn class_members(&self, class: &str) -> Option<&SymbolTable> {
        self.globals.class(class).map(|c| &c.members)
    }

    // =========================================
    // Diagnostics
    // =========================================

    fn report(&mut self, kind: DiagnosticKind, span: Span, message: impl Into<String>) {
        let diagnostic = Diagnostic::new(kind, span, message);
        trace!(kind = kind.as_str(), %span, message = %diagnostic.message, "diagnostic");
        self.diagnostics.push(diagnostic);
    }

    fn mismatch(&mut self, span: Span, message: impl Into<String>) {
        self.report(DiagnosticKind::TypeMismatch, span, message);
    }

    fn duplicate(&mut self, err: AlreadyDeclared, span: Span) {
        let message = if err.previous == Span::default() {
            format!(
                "'{}' is a builtin method and cannot be redeclared",
                err.name
            )
        } else {
            format!(
                "'{}' is already declared on line {}",
                err.name, err.previous.line
            )
        };
        self.report(DiagnosticKind::DuplicateDeclaration, span, message);
    }

    fn check_assignable(&mut self, target: &Type, source: &Type, span: Span) {
        if !mica_core::types::is_assignable(target, source) {
            self.mismatch(span, format!("cannot assign {source} to {target}"));
        }
    }
}
