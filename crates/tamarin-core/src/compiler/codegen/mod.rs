//! Lowering from AST blocks to symbolic instructions.
//!
//! Statements lower stack-neutrally; every expression lowering leaves
//! exactly one value on the operand stack. Structured control flow becomes
//! label references resolved by the assembler; `break`/`continue` resolve
//! against a stack of enclosing control blocks.


use super::emitter::Emitter;
use super::hoist::{BlockKind, BlockTable};
use super::opcode::Opcode;
use super::UniqueId;
use crate::ast::*;
use crate::{Error, Result};

/// An enclosing loop or switch, for `break`/`continue` target resolution.
struct ControlBlock {
    break_label: String,
    /// None for switch blocks, which `continue` skips over.
    continue_label: Option<String>,
}

/// Lowers every discovered block into one symbolic instruction buffer.
pub struct CodeGen<'a> {
    emitter: Emitter,
    table: &'a BlockTable<'a>,
    uid: UniqueId,
    control: Vec<ControlBlock>,
}

impl<'a> CodeGen<'a> {
    /// Creates a code generator over the block table. The id generator is
    /// handed on from the pre-pass so labels stay collision-free.
    pub fn new(table: &'a BlockTable<'a>, uid: UniqueId) -> Self {
        Self {
            emitter: Emitter::new(),
            table,
            uid,
            control: Vec::new(),
        }
    }

    /// Lowers all blocks in discovery order and returns the filled emitter.
    pub fn generate(mut self) -> Result<Emitter> {
        let table = self.table;
        for block in &table.blocks {
            self.lower_block(block)?;
        }
        Ok(self.emitter)
    }

    fn fresh_label(&mut self, stem: &str) -> String {
        format!(".{}_{}", stem, self.uid.get())
    }

    // ========================================================================
    // Block prologues
    // ========================================================================

    fn lower_block(&mut self, block: &super::hoist::Block<'a>) -> Result<()> {
        self.emitter.write_comment(format!("block {}", block.label));
        self.emitter.write_label(block.label.clone());

        match block.kind {
            BlockKind::Script => {
                for name in &block.declarations {
                    self.emitter.write_string(name)?;
                    self.emitter.write_op(Opcode::Var);
                }
                self.lower_script_body(block.body)?;
            }
            BlockKind::Function => {
                // On entry the operand stack holds the arguments array
                // pushed by the caller.
                for (index, param) in block.params.iter().enumerate() {
                    self.emitter.write_string(&param.name)?;
                    self.emitter.write_op(Opcode::Var);
                    self.emitter.write_op(Opcode::Top);
                    self.emitter.write_number(index as f64);
                    self.emitter.write_op(Opcode::Get);
                    self.emitter.write_string(&param.name)?;
                    self.emitter.write_op(Opcode::Out);
                    self.emitter.write_op(Opcode::Pop);
                }
                self.emitter.write_op_with(Opcode::Pop, "discard arguments");
                for name in &block.declarations {
                    self.emitter.write_string(name)?;
                    self.emitter.write_op(Opcode::Var);
                }
                for stmt in block.body {
                    self.lower_statement(stmt)?;
                }
                self.emitter.write_op(Opcode::Undef);
                self.emitter.write_op(Opcode::Ret);
            }
        }
        Ok(())
    }

    /// Lowers the script-root body. The final top-level statement, when it
    /// is an expression statement, keeps its value and returns it as the
    /// script's completion value; every other shape returns undefined.
    fn lower_script_body(&mut self, body: &'a [Statement]) -> Result<()> {
        let last = body.len().checked_sub(1);
        for (index, stmt) in body.iter().enumerate() {
            if Some(index) == last {
                if let Statement::Expression(expr_stmt) = stmt {
                    self.lower_expression(&expr_stmt.expression)?;
                    self.emitter.write_op(Opcode::Ret);
                    return Ok(());
                }
            }
            self.lower_statement(stmt)?;
        }
        self.emitter.write_op(Opcode::Undef);
        self.emitter.write_op(Opcode::Ret);
        Ok(())
    }

    // ========================================================================
    // Statements
    // ========================================================================

    fn lower_statement(&mut self, stmt: &'a Statement) -> Result<()> {
        match stmt {
            Statement::Empty | Statement::Debugger => {}
            Statement::Block(block) => {
                for inner in &block.body {
                    self.lower_statement(inner)?;
                }
            }
            Statement::Expression(expr_stmt) => {
                self.lower_expression(&expr_stmt.expression)?;
                self.emitter.write_op(Opcode::Pop);
            }
            Statement::VariableDeclaration(decl) => {
                // Declarators with initializers behave as plain assignments;
                // the names themselves were hoisted by the pre-pass.
                for declarator in &decl.declarations {
                    if let Some(init) = &declarator.init {
                        self.lower_expression(init)?;
                        self.emitter.write_string(&declarator.id.name)?;
                        self.emitter.write_op(Opcode::Out);
                        self.emitter.write_op(Opcode::Pop);
                    }
                }
            }
            Statement::If(if_stmt) => self.lower_if(if_stmt)?,
            Statement::While(while_stmt) => self.lower_while(while_stmt)?,
            Statement::DoWhile(do_while) => self.lower_do_while(do_while)?,
            Statement::For(for_stmt) => self.lower_for(for_stmt)?,
            Statement::Switch(switch) => self.lower_switch(switch)?,
            Statement::Break => {
                let target = self
                    .control
                    .last()
                    .map(|block| block.break_label.clone())
                    .ok_or_else(|| {
                        Error::Syntax("break outside of a loop or switch".to_string())
                    })?;
                self.emitter.write_reference(target);
                self.emitter.write_op(Opcode::Jump);
            }
            Statement::Continue => {
                let target = self
                    .control
                    .iter()
                    .rev()
                    .find_map(|block| block.continue_label.clone())
                    .ok_or_else(|| Error::Syntax("continue outside of a loop".to_string()))?;
                self.emitter.write_reference(target);
                self.emitter.write_op(Opcode::Jump);
            }
            Statement::FunctionDeclaration(func) => {
                let label = self.table.block_for_declaration(func).label.clone();
                self.emitter.write_op(Opcode::Null);
                self.emitter.write_number(func.params.len() as f64);
                self.emitter.write_reference(label);
                self.emitter.write_op(Opcode::Func);
                self.emitter.write_string(&func.id.name)?;
                self.emitter.write_op(Opcode::Out);
                self.emitter.write_op(Opcode::Pop);
            }
            Statement::Return(ret) => {
                match &ret.argument {
                    Some(argument) => self.lower_expression(argument)?,
                    None => self.emitter.write_op(Opcode::Undef),
                }
                self.emitter.write_op(Opcode::Ret);
            }

            // The pre-pass rejects these before codegen runs.
            Statement::ForIn(_) => return Err(Error::Unsupported("for-in statement".into())),
            Statement::Throw(_) => return Err(Error::Unsupported("throw statement".into())),
            Statement::Try(_) => return Err(Error::Unsupported("try statement".into())),
            Statement::Labeled(_) => return Err(Error::Unsupported("labeled statement".into())),
        }
        Ok(())
    }

    fn lower_if(&mut self, if_stmt: &'a IfStatement) -> Result<()> {
        self.lower_expression(&if_stmt.test)?;
        match &if_stmt.alternate {
            Some(alternate) => {
                let else_label = self.fresh_label("else");
                let end_label = self.fresh_label("endif");
                self.emitter.write_reference(else_label.clone());
                self.emitter.write_op(Opcode::JumpNot);
                self.lower_statement(&if_stmt.consequent)?;
                self.emitter.write_reference(end_label.clone());
                self.emitter.write_op(Opcode::Jump);
                self.emitter.write_label(else_label);
                self.lower_statement(alternate)?;
                self.emitter.write_label(end_label);
            }
            None => {
                let end_label = self.fresh_label("endif");
                self.emitter.write_reference(end_label.clone());
                self.emitter.write_op(Opcode::JumpNot);
                self.lower_statement(&if_stmt.consequent)?;
                self.emitter.write_label(end_label);
            }
        }
        Ok(())
    }

    fn lower_while(&mut self, while_stmt: &'a WhileStatement) -> Result<()> {
        let start_label = self.fresh_label("loop");
        let end_label = self.fresh_label("endloop");

        self.emitter.write_label(start_label.clone());
        self.lower_expression(&while_stmt.test)?;
        self.emitter.write_reference(end_label.clone());
        self.emitter.write_op(Opcode::JumpNot);

        self.control.push(ControlBlock {
            break_label: end_label.clone(),
            continue_label: Some(start_label.clone()),
        });
        self.lower_statement(&while_stmt.body)?;
        self.control.pop();

        self.emitter.write_reference(start_label);
        self.emitter.write_op(Opcode::Jump);
        self.emitter.write_label(end_label);
        Ok(())
    }

    fn lower_do_while(&mut self, do_while: &'a DoWhileStatement) -> Result<()> {
        let start_label = self.fresh_label("loop");
        let test_label = self.fresh_label("looptest");
        let end_label = self.fresh_label("endloop");

        self.emitter.write_label(start_label.clone());
        self.control.push(ControlBlock {
            break_label: end_label.clone(),
            continue_label: Some(test_label.clone()),
        });
        self.lower_statement(&do_while.body)?;
        self.control.pop();

        self.emitter.write_label(test_label);
        self.lower_expression(&do_while.test)?;
        self.emitter.write_reference(start_label);
        self.emitter.write_op(Opcode::JumpIf);
        self.emitter.write_label(end_label);
        Ok(())
    }

    fn lower_for(&mut self, for_stmt: &'a ForStatement) -> Result<()> {
        match &for_stmt.init {
            Some(ForInit::Declaration(decl)) => {
                for declarator in &decl.declarations {
                    if let Some(init) = &declarator.init {
                        self.lower_expression(init)?;
                        self.emitter.write_string(&declarator.id.name)?;
                        self.emitter.write_op(Opcode::Out);
                        self.emitter.write_op(Opcode::Pop);
                    }
                }
            }
            Some(ForInit::Expression(expr)) => {
                self.lower_expression(expr)?;
                self.emitter.write_op(Opcode::Pop);
            }
            None => {}
        }

        let start_label = self.fresh_label("loop");
        let update_label = self.fresh_label("loopupdate");
        let test_label = self.fresh_label("looptest");
        let end_label = self.fresh_label("endloop");

        // The body sits above the test; enter through the test so a false
        // initial condition skips the body entirely.
        self.emitter.write_reference(test_label.clone());
        self.emitter.write_op(Opcode::Jump);

        self.emitter.write_label(start_label.clone());
        self.control.push(ControlBlock {
            break_label: end_label.clone(),
            continue_label: Some(update_label.clone()),
        });
        self.lower_statement(&for_stmt.body)?;
        self.control.pop();

        self.emitter.write_label(update_label);
        if let Some(update) = &for_stmt.update {
            self.lower_expression(update)?;
            self.emitter.write_op(Opcode::Pop);
        }

        self.emitter.write_label(test_label);
        match &for_stmt.test {
            Some(test) => {
                self.lower_expression(test)?;
                self.emitter.write_reference(start_label);
                self.emitter.write_op(Opcode::JumpIf);
            }
            None => {
                self.emitter.write_reference(start_label);
                self.emitter.write_op(Opcode::Jump);
            }
        }
        self.emitter.write_label(end_label);
        Ok(())
    }

    fn lower_switch(&mut self, switch: &'a SwitchStatement) -> Result<()> {
        self.lower_expression(&switch.discriminant)?;

        let end_label = self.fresh_label("endswitch");
        let case_labels: Vec<String> = switch
            .cases
            .iter()
            .map(|_| self.fresh_label("case"))
            .collect();

        // Dispatch: the discriminant stays on the stack while each case
        // test compares against a duplicate of it.
        let mut default_label = None;
        for (case, label) in switch.cases.iter().zip(&case_labels) {
            match &case.test {
                Some(test) => {
                    self.emitter.write_op(Opcode::Top);
                    self.lower_expression(test)?;
                    self.emitter.write_op(Opcode::Seq);
                    self.emitter.write_reference(label.clone());
                    self.emitter.write_op(Opcode::JumpIf);
                }
                None => default_label = Some(label.clone()),
            }
        }
        let no_match = default_label.unwrap_or_else(|| end_label.clone());
        self.emitter.write_reference(no_match);
        self.emitter.write_op(Opcode::Jump);

        // Case bodies in source order; fall-through between cases is
        // intentional, so no jump separates them.
        self.control.push(ControlBlock {
            break_label: end_label.clone(),
            continue_label: None,
        });
        for (case, label) in switch.cases.iter().zip(&case_labels) {
            self.emitter.write_label(label.clone());
            for stmt in &case.consequent {
                self.lower_statement(stmt)?;
            }
        }
        self.control.pop();

        // Every exit path (fall-through, break, no match) converges here
        // with the discriminant still on the stack.
        self.emitter.write_label(end_label);
        self.emitter.write_op_with(Opcode::Pop, "discard discriminant");
        Ok(())
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    fn lower_expression(&mut self, expr: &'a Expression) -> Result<()> {
        match expr {
            Expression::Literal(lit) => self.lower_literal(lit)?,
            Expression::Identifier(id) => {
                if id.name == "undefined" {
                    self.emitter.write_op(Opcode::Undef);
                } else {
                    self.emitter.write_string(&id.name)?;
                    self.emitter.write_op(Opcode::Load);
                }
            }
            Expression::This => {
                self.emitter.write_string("this")?;
                self.emitter.write_op(Opcode::Load);
            }
            Expression::Array(array) => self.lower_array(array)?,
            Expression::Object(object) => self.lower_object(object)?,
            Expression::Unary(unary) => self.lower_unary(unary)?,
            Expression::Binary(binary) => self.lower_binary(binary)?,
            Expression::Conditional(cond) => self.lower_conditional(cond)?,
            Expression::Member(member) => {
                self.lower_expression(&member.object)?;
                self.lower_member_key(&member.property)?;
                self.emitter.write_op(Opcode::Get);
            }
            Expression::Update(update) => self.lower_update(update)?,
            Expression::Assignment(assign) => self.lower_assignment(assign)?,
            Expression::Call(call) => self.lower_call(call)?,
            Expression::New(new_expr) => {
                self.lower_expression(&new_expr.callee)?;
                self.lower_arguments(&new_expr.arguments)?;
                self.emitter.write_op(Opcode::New);
            }
            Expression::Sequence(seq) => {
                let last = seq.expressions.len() - 1;
                for (index, inner) in seq.expressions.iter().enumerate() {
                    self.lower_expression(inner)?;
                    if index != last {
                        self.emitter.write_op(Opcode::Pop);
                    }
                }
            }
            Expression::Function(func) => {
                let label = self.table.block_for_expression(func).label.clone();
                match &func.id {
                    Some(id) => self.emitter.write_string(&id.name)?,
                    None => self.emitter.write_op(Opcode::Null),
                }
                self.emitter.write_number(func.params.len() as f64);
                self.emitter.write_reference(label);
                self.emitter.write_op(Opcode::Func);
            }
        }
        Ok(())
    }

    fn lower_literal(&mut self, lit: &Literal) -> Result<()> {
        match lit {
            Literal::Number(n) => self.emitter.write_number(*n),
            Literal::String(s) => self.emitter.write_string(s)?,
            Literal::Boolean(true) => self.emitter.write_op(Opcode::True),
            Literal::Boolean(false) => self.emitter.write_op(Opcode::False),
            Literal::Null => self.emitter.write_op(Opcode::Null),
        }
        Ok(())
    }

    fn lower_array(&mut self, array: &'a ArrayExpression) -> Result<()> {
        self.emitter.write_op(Opcode::Arr);
        for (index, element) in array.elements.iter().enumerate() {
            self.emitter.write_op(Opcode::Top);
            self.emitter.write_number(index as f64);
            match element {
                Some(expr) => self.lower_expression(expr)?,
                None => self.emitter.write_op(Opcode::Null),
            }
            self.emitter.write_op(Opcode::Set);
            self.emitter.write_op(Opcode::Pop);
        }
        Ok(())
    }

    fn lower_object(&mut self, object: &'a ObjectExpression) -> Result<()> {
        self.emitter.write_op(Opcode::Obj);
        for property in &object.properties {
            self.emitter.write_op(Opcode::Top);
            match &property.key {
                PropertyKey::Identifier(id) => self.emitter.write_string(&id.name)?,
                PropertyKey::Literal(lit) => self.lower_literal(lit)?,
            }
            self.lower_expression(&property.value)?;
            self.emitter.write_op(Opcode::Set);
            self.emitter.write_op(Opcode::Pop);
        }
        Ok(())
    }

    fn lower_unary(&mut self, unary: &'a UnaryExpression) -> Result<()> {
        match unary.operator {
            UnaryOperator::Plus => {
                self.emitter.write_number(0.0);
                self.lower_expression(&unary.argument)?;
                self.emitter.write_op(Opcode::Add);
            }
            UnaryOperator::Minus => {
                self.emitter.write_number(0.0);
                self.lower_expression(&unary.argument)?;
                self.emitter.write_op(Opcode::Sub);
            }
            UnaryOperator::LogicalNot => {
                self.lower_expression(&unary.argument)?;
                self.emitter.write_op(Opcode::Not);
            }
            UnaryOperator::BitwiseNot => {
                self.lower_expression(&unary.argument)?;
                self.emitter.write_op(Opcode::BNot);
            }
            UnaryOperator::Typeof => {
                self.lower_expression(&unary.argument)?;
                self.emitter.write_op(Opcode::TypeOf);
            }
            UnaryOperator::Void => {
                self.lower_expression(&unary.argument)?;
                self.emitter.write_op(Opcode::Pop);
                self.emitter.write_op(Opcode::Undef);
            }
            UnaryOperator::Delete => match unary.argument.as_ref() {
                Expression::Member(member) => {
                    self.lower_expression(&member.object)?;
                    self.lower_member_key(&member.property)?;
                    self.emitter.write_op(Opcode::Delete);
                }
                _ => self.emitter.write_op(Opcode::True),
            },
        }
        Ok(())
    }

    fn lower_binary(&mut self, binary: &'a BinaryExpression) -> Result<()> {
        match binary.operator {
            BinaryOperator::LogicalAnd => {
                // Short-circuit: a falsy left operand is the result and
                // skips the right operand entirely.
                let end_label = self.fresh_label("and");
                self.lower_expression(&binary.left)?;
                self.emitter.write_op(Opcode::Top);
                self.emitter.write_reference(end_label.clone());
                self.emitter.write_op(Opcode::JumpNot);
                self.emitter.write_op(Opcode::Pop);
                self.lower_expression(&binary.right)?;
                self.emitter.write_label(end_label);
            }
            BinaryOperator::LogicalOr => {
                let end_label = self.fresh_label("or");
                self.lower_expression(&binary.left)?;
                self.emitter.write_op(Opcode::Top);
                self.emitter.write_reference(end_label.clone());
                self.emitter.write_op(Opcode::JumpIf);
                self.emitter.write_op(Opcode::Pop);
                self.lower_expression(&binary.right)?;
                self.emitter.write_label(end_label);
            }
            operator => {
                self.lower_expression(&binary.left)?;
                self.lower_expression(&binary.right)?;
                self.emitter.write_op(binary_opcode(operator));
            }
        }
        Ok(())
    }

    fn lower_conditional(&mut self, cond: &'a ConditionalExpression) -> Result<()> {
        let alt_label = self.fresh_label("alt");
        let end_label = self.fresh_label("endcond");
        self.lower_expression(&cond.test)?;
        self.emitter.write_reference(alt_label.clone());
        self.emitter.write_op(Opcode::JumpNot);
        self.lower_expression(&cond.consequent)?;
        self.emitter.write_reference(end_label.clone());
        self.emitter.write_op(Opcode::Jump);
        self.emitter.write_label(alt_label);
        self.lower_expression(&cond.alternate)?;
        self.emitter.write_label(end_label);
        Ok(())
    }

    fn lower_member_key(&mut self, property: &'a MemberProperty) -> Result<()> {
        match property {
            MemberProperty::Identifier(id) => self.emitter.write_string(&id.name)?,
            MemberProperty::Expression(key) => self.lower_expression(key)?,
        }
        Ok(())
    }

    fn lower_update(&mut self, update: &'a UpdateExpression) -> Result<()> {
        let (apply, inverse) = match update.operator {
            UpdateOperator::Increment => (Opcode::Add, Opcode::Sub),
            UpdateOperator::Decrement => (Opcode::Sub, Opcode::Add),
        };

        match update.argument.as_ref() {
            Expression::Identifier(id) => {
                self.emitter.write_string(&id.name)?;
                self.emitter.write_op(Opcode::Load);
                self.emitter.write_number(1.0);
                self.emitter.write_op(apply);
                self.emitter.write_string(&id.name)?;
                self.emitter.write_op(Opcode::Out);
            }
            Expression::Member(member) => {
                self.lower_expression(&member.object)?;
                self.lower_member_key(&member.property)?;
                self.emitter.write_op(Opcode::Top2);
                self.emitter.write_op(Opcode::Get);
                self.emitter.write_number(1.0);
                self.emitter.write_op(apply);
                self.emitter.write_op(Opcode::Set);
            }
            _ => {
                return Err(Error::Syntax(
                    "invalid increment/decrement target".to_string(),
                ))
            }
        }

        // A postfix update evaluates to the pre-update number; back out the
        // delta that was just written.
        if !update.prefix {
            self.emitter.write_number(1.0);
            self.emitter.write_op(inverse);
        }
        Ok(())
    }

    fn lower_assignment(&mut self, assign: &'a AssignmentExpression) -> Result<()> {
        let compound = assign.operator.binary_operator();
        match assign.left.as_ref() {
            Expression::Identifier(id) => {
                if let Some(operator) = compound {
                    self.emitter.write_string(&id.name)?;
                    self.emitter.write_op(Opcode::Load);
                    self.lower_expression(&assign.right)?;
                    self.emitter.write_op(binary_opcode(operator));
                } else {
                    self.lower_expression(&assign.right)?;
                }
                self.emitter.write_string(&id.name)?;
                self.emitter.write_op(Opcode::Out);
            }
            Expression::Member(member) => {
                self.lower_expression(&member.object)?;
                self.lower_member_key(&member.property)?;
                if let Some(operator) = compound {
                    self.emitter.write_op(Opcode::Top2);
                    self.emitter.write_op(Opcode::Get);
                    self.lower_expression(&assign.right)?;
                    self.emitter.write_op(binary_opcode(operator));
                } else {
                    self.lower_expression(&assign.right)?;
                }
                self.emitter.write_op(Opcode::Set);
            }
            _ => return Err(Error::Syntax("invalid assignment target".to_string())),
        }
        Ok(())
    }

    fn lower_call(&mut self, call: &'a CallExpression) -> Result<()> {
        match call.callee.as_ref() {
            Expression::Member(member) => {
                // Method call: the object doubles as the receiver.
                self.lower_expression(&member.object)?;
                self.emitter.write_op(Opcode::Top);
                self.lower_member_key(&member.property)?;
                self.emitter.write_op(Opcode::Get);
            }
            callee => {
                self.emitter.write_op(Opcode::Null);
                self.lower_expression(callee)?;
            }
        }
        self.lower_arguments(&call.arguments)?;
        self.emitter.write_op(Opcode::Call);
        Ok(())
    }

    /// Lowers an argument list as an array literal.
    fn lower_arguments(&mut self, arguments: &'a [Expression]) -> Result<()> {
        self.emitter.write_op(Opcode::Arr);
        for (index, argument) in arguments.iter().enumerate() {
            self.emitter.write_op(Opcode::Top);
            self.emitter.write_number(index as f64);
            self.lower_expression(argument)?;
            self.emitter.write_op(Opcode::Set);
            self.emitter.write_op(Opcode::Pop);
        }
        Ok(())
    }
}

fn binary_opcode(operator: BinaryOperator) -> Opcode {
    match operator {
        BinaryOperator::Add => Opcode::Add,
        BinaryOperator::Subtract => Opcode::Sub,
        BinaryOperator::Multiply => Opcode::Mul,
        BinaryOperator::Divide => Opcode::Div,
        BinaryOperator::Modulo => Opcode::Mod,
        BinaryOperator::Exponent => Opcode::Exp,
        BinaryOperator::Equal => Opcode::Eq,
        BinaryOperator::NotEqual => Opcode::Neq,
        BinaryOperator::StrictEqual => Opcode::Seq,
        BinaryOperator::StrictNotEqual => Opcode::Sneq,
        BinaryOperator::LessThan => Opcode::Lt,
        BinaryOperator::LessThanEqual => Opcode::Lte,
        BinaryOperator::GreaterThan => Opcode::Gt,
        BinaryOperator::GreaterThanEqual => Opcode::Gte,
        BinaryOperator::BitwiseAnd => Opcode::BAnd,
        BinaryOperator::BitwiseOr => Opcode::BOr,
        BinaryOperator::BitwiseXor => Opcode::BXor,
        BinaryOperator::LeftShift => Opcode::LShift,
        BinaryOperator::RightShift => Opcode::RShift,
        BinaryOperator::UnsignedRightShift => Opcode::URShift,
        BinaryOperator::In => Opcode::In,
        BinaryOperator::InstanceOf => Opcode::InstanceOf,
        // Lowered with jumps in lower_binary.
        BinaryOperator::LogicalAnd | BinaryOperator::LogicalOr => unreachable!(),
    }
}
