//! Block discovery and declaration hoisting.
//!
//! A pre-order pass over the AST that splits the program into code blocks
//! (one for the script root, one per function) and gathers each block's
//! hoisted `var` and function-declaration names. Unsupported statement
//! kinds are rejected here, before any code is generated.

use rustc_hash::FxHashMap;

use super::UniqueId;
use crate::ast::*;
use crate::{Error, Result};

/// What kind of code block this is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// The script root
    Script,
    /// A function declaration or function expression body
    Function,
}

/// A unit of compilation: the script root or one function body.
#[derive(Debug)]
pub struct Block<'a> {
    /// Script root or function body
    pub kind: BlockKind,
    /// Unique entry label, e.g. `.main_1` or `.fact_2`
    pub label: String,
    /// Hoisted names, in discovery order, deduplicated
    pub declarations: Vec<String>,
    /// Ordered parameter names (empty for the script root)
    pub params: &'a [Identifier],
    /// The body statements
    pub body: &'a [Statement],
}

impl Block<'_> {
    fn declare(&mut self, name: &str) {
        if !self.declarations.iter().any(|n| n == name) {
            self.declarations.push(name.to_string());
        }
    }
}

/// The discovered blocks, in pre-order, with side tables associating each
/// function node to its block.
#[derive(Debug)]
pub struct BlockTable<'a> {
    /// The blocks in discovery order; index 0 is the script root.
    pub blocks: Vec<Block<'a>>,
    by_declaration: FxHashMap<usize, usize>,
    by_expression: FxHashMap<usize, usize>,
}

impl<'a> BlockTable<'a> {
    /// The script-root block.
    pub fn root(&self) -> &Block<'a> {
        &self.blocks[0]
    }

    /// The block compiled from the given function declaration.
    pub fn block_for_declaration(&self, node: &FunctionDeclaration) -> &Block<'a> {
        let key = node as *const FunctionDeclaration as usize;
        &self.blocks[self.by_declaration[&key]]
    }

    /// The block compiled from the given function expression.
    pub fn block_for_expression(&self, node: &FunctionExpression) -> &Block<'a> {
        let key = node as *const FunctionExpression as usize;
        &self.blocks[self.by_expression[&key]]
    }
}

/// Runs the pre-pass over a program.
pub fn discover_blocks<'a>(program: &'a Program, uid: &mut UniqueId) -> Result<BlockTable<'a>> {
    let mut discovery = Discovery {
        table: BlockTable {
            blocks: Vec::new(),
            by_declaration: FxHashMap::default(),
            by_expression: FxHashMap::default(),
        },
        uid,
    };

    discovery.table.blocks.push(Block {
        kind: BlockKind::Script,
        label: format!(".main_{}", discovery.uid.get()),
        declarations: Vec::new(),
        params: &[],
        body: &program.body,
    });
    for stmt in &program.body {
        discovery.walk_statement(stmt, 0)?;
    }

    Ok(discovery.table)
}

struct Discovery<'a, 'u> {
    table: BlockTable<'a>,
    uid: &'u mut UniqueId,
}

impl<'a> Discovery<'a, '_> {
    fn walk_statement(&mut self, stmt: &'a Statement, current: usize) -> Result<()> {
        match stmt {
            Statement::VariableDeclaration(decl) => {
                self.walk_var_declaration(decl, current)?;
            }
            Statement::FunctionDeclaration(func) => {
                self.table.blocks[current].declare(&func.id.name);
                let block = self.enter_function(Some(&func.id.name), &func.params, &func.body)?;
                let key = func as *const FunctionDeclaration as usize;
                self.table.by_declaration.insert(key, block);
            }
            Statement::Expression(stmt) => self.walk_expression(&stmt.expression, current)?,
            Statement::Block(block) => {
                for inner in &block.body {
                    self.walk_statement(inner, current)?;
                }
            }
            Statement::If(if_stmt) => {
                self.walk_expression(&if_stmt.test, current)?;
                self.walk_statement(&if_stmt.consequent, current)?;
                if let Some(alternate) = &if_stmt.alternate {
                    self.walk_statement(alternate, current)?;
                }
            }
            Statement::Switch(switch) => {
                self.walk_expression(&switch.discriminant, current)?;
                for case in &switch.cases {
                    if let Some(test) = &case.test {
                        self.walk_expression(test, current)?;
                    }
                    for inner in &case.consequent {
                        self.walk_statement(inner, current)?;
                    }
                }
            }
            Statement::While(while_stmt) => {
                self.walk_expression(&while_stmt.test, current)?;
                self.walk_statement(&while_stmt.body, current)?;
            }
            Statement::DoWhile(do_while) => {
                self.walk_statement(&do_while.body, current)?;
                self.walk_expression(&do_while.test, current)?;
            }
            Statement::For(for_stmt) => {
                match &for_stmt.init {
                    Some(ForInit::Declaration(decl)) => {
                        self.walk_var_declaration(decl, current)?;
                    }
                    Some(ForInit::Expression(expr)) => self.walk_expression(expr, current)?,
                    None => {}
                }
                if let Some(test) = &for_stmt.test {
                    self.walk_expression(test, current)?;
                }
                if let Some(update) = &for_stmt.update {
                    self.walk_expression(update, current)?;
                }
                self.walk_statement(&for_stmt.body, current)?;
            }
            Statement::Return(ret) => {
                if let Some(argument) = &ret.argument {
                    self.walk_expression(argument, current)?;
                }
            }
            Statement::Break | Statement::Continue | Statement::Debugger | Statement::Empty => {}

            Statement::ForIn(_) => return Self::unsupported("for-in statement"),
            Statement::Throw(_) => return Self::unsupported("throw statement"),
            Statement::Try(_) => return Self::unsupported("try statement"),
            Statement::Labeled(_) => return Self::unsupported("labeled statement"),
        }
        Ok(())
    }

    fn walk_var_declaration(
        &mut self,
        decl: &'a VariableDeclaration,
        current: usize,
    ) -> Result<()> {
        for declarator in &decl.declarations {
            self.table.blocks[current].declare(&declarator.id.name);
            if let Some(init) = &declarator.init {
                self.walk_expression(init, current)?;
            }
        }
        Ok(())
    }

    fn walk_expression(&mut self, expr: &'a Expression, current: usize) -> Result<()> {
        match expr {
            Expression::Function(func) => {
                let name = func.id.as_ref().map(|id| id.name.as_str());
                let block = self.enter_function(name, &func.params, &func.body)?;
                let key = func as *const FunctionExpression as usize;
                self.table.by_expression.insert(key, block);
            }
            Expression::Literal(_) | Expression::Identifier(_) | Expression::This => {}
            Expression::Array(array) => {
                for element in array.elements.iter().flatten() {
                    self.walk_expression(element, current)?;
                }
            }
            Expression::Object(object) => {
                for property in &object.properties {
                    self.walk_expression(&property.value, current)?;
                }
            }
            Expression::Binary(bin) => {
                self.walk_expression(&bin.left, current)?;
                self.walk_expression(&bin.right, current)?;
            }
            Expression::Unary(un) => self.walk_expression(&un.argument, current)?,
            Expression::Assignment(assign) => {
                self.walk_expression(&assign.left, current)?;
                self.walk_expression(&assign.right, current)?;
            }
            Expression::Call(call) => {
                self.walk_expression(&call.callee, current)?;
                for argument in &call.arguments {
                    self.walk_expression(argument, current)?;
                }
            }
            Expression::Member(member) => {
                self.walk_expression(&member.object, current)?;
                if let MemberProperty::Expression(key) = &member.property {
                    self.walk_expression(key, current)?;
                }
            }
            Expression::Conditional(cond) => {
                self.walk_expression(&cond.test, current)?;
                self.walk_expression(&cond.consequent, current)?;
                self.walk_expression(&cond.alternate, current)?;
            }
            Expression::New(new_expr) => {
                self.walk_expression(&new_expr.callee, current)?;
                for argument in &new_expr.arguments {
                    self.walk_expression(argument, current)?;
                }
            }
            Expression::Update(update) => self.walk_expression(&update.argument, current)?,
            Expression::Sequence(seq) => {
                for inner in &seq.expressions {
                    self.walk_expression(inner, current)?;
                }
            }
        }
        Ok(())
    }

    /// Creates the block for a function body and walks the body with it as
    /// the current block. Returns the new block's index.
    fn enter_function(
        &mut self,
        name: Option<&str>,
        params: &'a [Identifier],
        body: &'a [Statement],
    ) -> Result<usize> {
        let label = format!(".{}_{}", name.unwrap_or("anonymous"), self.uid.get());
        let index = self.table.blocks.len();
        self.table.blocks.push(Block {
            kind: BlockKind::Function,
            label,
            declarations: Vec::new(),
            params,
            body,
        });
        for stmt in body {
            self.walk_statement(stmt, index)?;
        }
        Ok(index)
    }

    fn unsupported(what: &str) -> Result<()> {
        Err(Error::Unsupported(what.to_string()))
    }
}
