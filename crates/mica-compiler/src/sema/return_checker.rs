//! Return path verification for non-void methods.
//!
//! The check is conservative: a body returns on every path only
//! if its last statement is a `return`, an `if` whose two branches both
//! return, or a block that itself satisfies the rule. Loops and switches
//! never count, even when they provably return.

use mica_parser::ast::{Block, Stmt};

pub struct ReturnChecker;

impl ReturnChecker {
    pub fn all_paths_return(body: &Block<'_>) -> bool {
        Self::ends_with_return(body.stmts)
    }

    fn ends_with_return(stmts: &[Stmt<'_>]) -> bool {
        stmts
            .iter()
            .rev()
            .find(|stmt| !matches!(stmt, Stmt::Empty(_)))
            .is_some_and(Self::returns)
    }

    fn returns(stmt: &Stmt<'_>) -> bool {
        match stmt {
            Stmt::Return(_) => true,
            Stmt::If(if_stmt) => match &if_stmt.else_branch {
                Some(else_branch) => {
                    Self::returns(&if_stmt.then_branch) && Self::returns(else_branch)
                }
                None => false,
            },
            Stmt::Block(block) => Self::ends_with_return(block.stmts),
            _ => false,
        }
    }
}
