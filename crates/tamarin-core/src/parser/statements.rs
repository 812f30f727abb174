//! Statement parsing.

use super::Parser;
use crate::ast::*;
use crate::lexer::TokenKind;
use crate::Result;

impl Parser {
    pub(crate) fn parse_statement(&mut self) -> Result<Statement> {
        match self.peek_kind() {
            TokenKind::Var => {
                self.advance();
                let decl = self.parse_var_declarators()?;
                self.expect_semicolon()?;
                Ok(Statement::VariableDeclaration(decl))
            }
            TokenKind::Function => self.parse_function_declaration(),
            TokenKind::LeftBrace => Ok(Statement::Block(self.parse_block()?)),
            TokenKind::If => self.parse_if(),
            TokenKind::Switch => self.parse_switch(),
            TokenKind::While => self.parse_while(),
            TokenKind::Do => self.parse_do_while(),
            TokenKind::For => self.parse_for(),
            TokenKind::Return => self.parse_return(),
            TokenKind::Break => {
                self.advance();
                self.expect_semicolon()?;
                Ok(Statement::Break)
            }
            TokenKind::Continue => {
                self.advance();
                self.expect_semicolon()?;
                Ok(Statement::Continue)
            }
            TokenKind::Throw => {
                self.advance();
                let argument = self.parse_expression()?;
                self.expect_semicolon()?;
                Ok(Statement::Throw(ThrowStatement { argument }))
            }
            TokenKind::Try => self.parse_try(),
            TokenKind::Debugger => {
                self.advance();
                self.expect_semicolon()?;
                Ok(Statement::Debugger)
            }
            TokenKind::Semicolon => {
                self.advance();
                Ok(Statement::Empty)
            }
            // `ident:` introduces a labeled statement
            TokenKind::Identifier(_) if *self.peek_at(1) == TokenKind::Colon => {
                let name = self.parse_identifier()?;
                self.advance(); // colon
                let body = Box::new(self.parse_statement()?);
                Ok(Statement::Labeled(LabeledStatement { label: name, body }))
            }
            _ => {
                let expression = self.parse_expression()?;
                self.expect_semicolon()?;
                Ok(Statement::Expression(ExpressionStatement { expression }))
            }
        }
    }

    pub(crate) fn parse_identifier(&mut self) -> Result<Identifier> {
        match self.peek_kind().clone() {
            TokenKind::Identifier(name) => {
                self.advance();
                Ok(Identifier { name })
            }
            _ => self.unexpected("identifier position"),
        }
    }

    pub(crate) fn parse_block(&mut self) -> Result<BlockStatement> {
        self.expect(&TokenKind::LeftBrace)?;
        let mut body = Vec::new();
        while !self.check(&TokenKind::RightBrace) && !self.check(&TokenKind::Eof) {
            body.push(self.parse_statement()?);
        }
        self.expect(&TokenKind::RightBrace)?;
        Ok(BlockStatement { body })
    }

    /// Parses the declarator list after `var` (the `var` token is consumed
    /// by the caller; the terminator is not).
    fn parse_var_declarators(&mut self) -> Result<VariableDeclaration> {
        let mut declarations = Vec::new();
        loop {
            let id = self.parse_identifier()?;
            let init = if self.eat(&TokenKind::Assign) {
                Some(self.parse_assignment_expression()?)
            } else {
                None
            };
            declarations.push(VariableDeclarator { id, init });
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        Ok(VariableDeclaration { declarations })
    }

    fn parse_function_declaration(&mut self) -> Result<Statement> {
        self.expect(&TokenKind::Function)?;
        let id = self.parse_identifier()?;
        let params = self.parse_params()?;
        let body = self.parse_block()?.body;
        Ok(Statement::FunctionDeclaration(FunctionDeclaration {
            id,
            params,
            body,
        }))
    }

    pub(crate) fn parse_params(&mut self) -> Result<Vec<Identifier>> {
        self.expect(&TokenKind::LeftParen)?;
        let mut params = Vec::new();
        if !self.check(&TokenKind::RightParen) {
            loop {
                params.push(self.parse_identifier()?);
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(&TokenKind::RightParen)?;
        Ok(params)
    }

    fn parse_if(&mut self) -> Result<Statement> {
        self.expect(&TokenKind::If)?;
        self.expect(&TokenKind::LeftParen)?;
        let test = self.parse_expression()?;
        self.expect(&TokenKind::RightParen)?;
        let consequent = Box::new(self.parse_statement()?);
        let alternate = if self.eat(&TokenKind::Else) {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };
        Ok(Statement::If(IfStatement {
            test,
            consequent,
            alternate,
        }))
    }

    fn parse_switch(&mut self) -> Result<Statement> {
        self.expect(&TokenKind::Switch)?;
        self.expect(&TokenKind::LeftParen)?;
        let discriminant = self.parse_expression()?;
        self.expect(&TokenKind::RightParen)?;
        self.expect(&TokenKind::LeftBrace)?;

        let mut cases = Vec::new();
        while !self.check(&TokenKind::RightBrace) && !self.check(&TokenKind::Eof) {
            let test = if self.eat(&TokenKind::Case) {
                let test = self.parse_expression()?;
                self.expect(&TokenKind::Colon)?;
                Some(test)
            } else if self.eat(&TokenKind::Default) {
                self.expect(&TokenKind::Colon)?;
                None
            } else {
                return self.unexpected("switch body");
            };

            let mut consequent = Vec::new();
            while !matches!(
                self.peek_kind(),
                TokenKind::Case | TokenKind::Default | TokenKind::RightBrace | TokenKind::Eof
            ) {
                consequent.push(self.parse_statement()?);
            }
            cases.push(SwitchCase { test, consequent });
        }
        self.expect(&TokenKind::RightBrace)?;
        Ok(Statement::Switch(SwitchStatement { discriminant, cases }))
    }

    fn parse_while(&mut self) -> Result<Statement> {
        self.expect(&TokenKind::While)?;
        self.expect(&TokenKind::LeftParen)?;
        let test = self.parse_expression()?;
        self.expect(&TokenKind::RightParen)?;
        let body = Box::new(self.parse_statement()?);
        Ok(Statement::While(WhileStatement { test, body }))
    }

    fn parse_do_while(&mut self) -> Result<Statement> {
        self.expect(&TokenKind::Do)?;
        let body = Box::new(self.parse_statement()?);
        self.expect(&TokenKind::While)?;
        self.expect(&TokenKind::LeftParen)?;
        let test = self.parse_expression()?;
        self.expect(&TokenKind::RightParen)?;
        self.expect_semicolon()?;
        Ok(Statement::DoWhile(DoWhileStatement { body, test }))
    }

    fn parse_for(&mut self) -> Result<Statement> {
        self.expect(&TokenKind::For)?;
        self.expect(&TokenKind::LeftParen)?;

        // Initializer, or the left-hand side of a for-in.
        let init = if self.eat(&TokenKind::Semicolon) {
            None
        } else if self.eat(&TokenKind::Var) {
            let decl = self.parse_var_declarators()?;
            if self.eat(&TokenKind::In) {
                return self.finish_for_in(ForInLeft::Declaration(decl));
            }
            self.expect(&TokenKind::Semicolon)?;
            Some(ForInit::Declaration(decl))
        } else {
            let expr = self.parse_expression()?;
            if self.eat(&TokenKind::In) {
                return self.finish_for_in(ForInLeft::Expression(expr));
            }
            self.expect(&TokenKind::Semicolon)?;
            Some(ForInit::Expression(expr))
        };

        let test = if self.check(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(&TokenKind::Semicolon)?;

        let update = if self.check(&TokenKind::RightParen) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(&TokenKind::RightParen)?;

        let body = Box::new(self.parse_statement()?);
        Ok(Statement::For(ForStatement {
            init,
            test,
            update,
            body,
        }))
    }

    fn finish_for_in(&mut self, left: ForInLeft) -> Result<Statement> {
        let right = self.parse_expression()?;
        self.expect(&TokenKind::RightParen)?;
        let body = Box::new(self.parse_statement()?);
        Ok(Statement::ForIn(ForInStatement { left, right, body }))
    }

    fn parse_return(&mut self) -> Result<Statement> {
        self.expect(&TokenKind::Return)?;
        let argument = if matches!(
            self.peek_kind(),
            TokenKind::Semicolon | TokenKind::RightBrace | TokenKind::Eof
        ) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect_semicolon()?;
        Ok(Statement::Return(ReturnStatement { argument }))
    }

    fn parse_try(&mut self) -> Result<Statement> {
        self.expect(&TokenKind::Try)?;
        let block = self.parse_block()?;
        let handler = if self.eat(&TokenKind::Catch) {
            let param = if self.eat(&TokenKind::LeftParen) {
                let param = self.parse_identifier()?;
                self.expect(&TokenKind::RightParen)?;
                Some(param)
            } else {
                None
            };
            let body = self.parse_block()?;
            Some(CatchClause { param, body })
        } else {
            None
        };
        let finalizer = if self.eat(&TokenKind::Finally) {
            Some(self.parse_block()?)
        } else {
            None
        };
        Ok(Statement::Try(TryStatement {
            block,
            handler,
            finalizer,
        }))
    }
}
