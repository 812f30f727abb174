//! Expression parsing (precedence climbing).

use super::Parser;
use crate::ast::*;
use crate::lexer::TokenKind;
use crate::{Error, Result};

/// Binding power for a binary operator token, paired with the operator.
/// Higher binds tighter.
fn binary_operator(kind: &TokenKind) -> Option<(u8, BinaryOperator)> {
    let entry = match kind {
        TokenKind::OrOr => (1, BinaryOperator::LogicalOr),
        TokenKind::AndAnd => (2, BinaryOperator::LogicalAnd),
        TokenKind::BitOr => (3, BinaryOperator::BitwiseOr),
        TokenKind::BitXor => (4, BinaryOperator::BitwiseXor),
        TokenKind::BitAnd => (5, BinaryOperator::BitwiseAnd),
        TokenKind::Eq => (6, BinaryOperator::Equal),
        TokenKind::NotEq => (6, BinaryOperator::NotEqual),
        TokenKind::StrictEq => (6, BinaryOperator::StrictEqual),
        TokenKind::StrictNotEq => (6, BinaryOperator::StrictNotEqual),
        TokenKind::Lt => (7, BinaryOperator::LessThan),
        TokenKind::LtEq => (7, BinaryOperator::LessThanEqual),
        TokenKind::Gt => (7, BinaryOperator::GreaterThan),
        TokenKind::GtEq => (7, BinaryOperator::GreaterThanEqual),
        TokenKind::In => (7, BinaryOperator::In),
        TokenKind::Instanceof => (7, BinaryOperator::InstanceOf),
        TokenKind::Shl => (8, BinaryOperator::LeftShift),
        TokenKind::Shr => (8, BinaryOperator::RightShift),
        TokenKind::UShr => (8, BinaryOperator::UnsignedRightShift),
        TokenKind::Plus => (9, BinaryOperator::Add),
        TokenKind::Minus => (9, BinaryOperator::Subtract),
        TokenKind::Star => (10, BinaryOperator::Multiply),
        TokenKind::Slash => (10, BinaryOperator::Divide),
        TokenKind::Percent => (10, BinaryOperator::Modulo),
        TokenKind::StarStar => (11, BinaryOperator::Exponent),
        _ => return None,
    };
    Some(entry)
}

fn assignment_operator(kind: &TokenKind) -> Option<AssignmentOperator> {
    let op = match kind {
        TokenKind::Assign => AssignmentOperator::Assign,
        TokenKind::PlusAssign => AssignmentOperator::AddAssign,
        TokenKind::MinusAssign => AssignmentOperator::SubtractAssign,
        TokenKind::StarAssign => AssignmentOperator::MultiplyAssign,
        TokenKind::SlashAssign => AssignmentOperator::DivideAssign,
        TokenKind::PercentAssign => AssignmentOperator::ModuloAssign,
        TokenKind::StarStarAssign => AssignmentOperator::ExponentAssign,
        TokenKind::ShlAssign => AssignmentOperator::LeftShiftAssign,
        TokenKind::ShrAssign => AssignmentOperator::RightShiftAssign,
        TokenKind::UShrAssign => AssignmentOperator::UnsignedRightShiftAssign,
        TokenKind::AndAssign => AssignmentOperator::BitwiseAndAssign,
        TokenKind::OrAssign => AssignmentOperator::BitwiseOrAssign,
        TokenKind::XorAssign => AssignmentOperator::BitwiseXorAssign,
        _ => return None,
    };
    Some(op)
}

impl Parser {
    /// Full expression, including the comma operator.
    pub(crate) fn parse_expression(&mut self) -> Result<Expression> {
        let first = self.parse_assignment_expression()?;
        if !self.check(&TokenKind::Comma) {
            return Ok(first);
        }
        let mut expressions = vec![first];
        while self.eat(&TokenKind::Comma) {
            expressions.push(self.parse_assignment_expression()?);
        }
        Ok(Expression::Sequence(SequenceExpression { expressions }))
    }

    pub(crate) fn parse_assignment_expression(&mut self) -> Result<Expression> {
        let left = self.parse_conditional()?;

        if let Some(operator) = assignment_operator(self.peek_kind()) {
            if !matches!(left, Expression::Identifier(_) | Expression::Member(_)) {
                return Err(Error::Syntax(format!(
                    "invalid assignment target at offset {}",
                    self.peek().span.start
                )));
            }
            self.advance();
            let right = self.parse_assignment_expression()?;
            return Ok(Expression::Assignment(AssignmentExpression {
                operator,
                left: Box::new(left),
                right: Box::new(right),
            }));
        }

        Ok(left)
    }

    fn parse_conditional(&mut self) -> Result<Expression> {
        let test = self.parse_binary(0)?;
        if !self.eat(&TokenKind::Question) {
            return Ok(test);
        }
        let consequent = self.parse_assignment_expression()?;
        self.expect(&TokenKind::Colon)?;
        let alternate = self.parse_assignment_expression()?;
        Ok(Expression::Conditional(ConditionalExpression {
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
        }))
    }

    fn parse_binary(&mut self, min_prec: u8) -> Result<Expression> {
        let mut left = self.parse_unary()?;

        while let Some((prec, operator)) = binary_operator(self.peek_kind()) {
            if prec < min_prec {
                break;
            }
            self.advance();
            // Exponentiation is right-associative.
            let next_min = if operator == BinaryOperator::Exponent {
                prec
            } else {
                prec + 1
            };
            let right = self.parse_binary(next_min)?;
            left = Expression::Binary(BinaryExpression {
                operator,
                left: Box::new(left),
                right: Box::new(right),
            });
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expression> {
        let operator = match self.peek_kind() {
            TokenKind::Not => Some(UnaryOperator::LogicalNot),
            TokenKind::BitNot => Some(UnaryOperator::BitwiseNot),
            TokenKind::Plus => Some(UnaryOperator::Plus),
            TokenKind::Minus => Some(UnaryOperator::Minus),
            TokenKind::Typeof => Some(UnaryOperator::Typeof),
            TokenKind::Void => Some(UnaryOperator::Void),
            TokenKind::Delete => Some(UnaryOperator::Delete),
            _ => None,
        };
        if let Some(operator) = operator {
            self.advance();
            let argument = Box::new(self.parse_unary()?);
            return Ok(Expression::Unary(UnaryExpression { operator, argument }));
        }

        if matches!(self.peek_kind(), TokenKind::PlusPlus | TokenKind::MinusMinus) {
            let operator = if self.check(&TokenKind::PlusPlus) {
                UpdateOperator::Increment
            } else {
                UpdateOperator::Decrement
            };
            self.advance();
            let argument = Box::new(self.parse_unary()?);
            return Ok(Expression::Update(UpdateExpression {
                operator,
                argument,
                prefix: true,
            }));
        }

        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Expression> {
        let expr = self.parse_call_member()?;
        if matches!(self.peek_kind(), TokenKind::PlusPlus | TokenKind::MinusMinus) {
            let operator = if self.check(&TokenKind::PlusPlus) {
                UpdateOperator::Increment
            } else {
                UpdateOperator::Decrement
            };
            self.advance();
            return Ok(Expression::Update(UpdateExpression {
                operator,
                argument: Box::new(expr),
                prefix: false,
            }));
        }
        Ok(expr)
    }

    fn parse_call_member(&mut self) -> Result<Expression> {
        let mut expr = if self.check(&TokenKind::New) {
            self.parse_new()?
        } else {
            self.parse_primary()?
        };

        loop {
            match self.peek_kind() {
                TokenKind::Dot => {
                    self.advance();
                    let property = self.parse_identifier()?;
                    expr = Expression::Member(MemberExpression {
                        object: Box::new(expr),
                        property: MemberProperty::Identifier(property),
                    });
                }
                TokenKind::LeftBracket => {
                    self.advance();
                    let key = self.parse_expression()?;
                    self.expect(&TokenKind::RightBracket)?;
                    expr = Expression::Member(MemberExpression {
                        object: Box::new(expr),
                        property: MemberProperty::Expression(Box::new(key)),
                    });
                }
                TokenKind::LeftParen => {
                    let arguments = self.parse_arguments()?;
                    expr = Expression::Call(CallExpression {
                        callee: Box::new(expr),
                        arguments,
                    });
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    /// `new Callee(args)`. The callee may take member suffixes but not
    /// calls, so `new a.b.C(1)` parses as expected.
    fn parse_new(&mut self) -> Result<Expression> {
        self.expect(&TokenKind::New)?;

        let mut callee = if self.check(&TokenKind::New) {
            self.parse_new()?
        } else {
            self.parse_primary()?
        };
        loop {
            match self.peek_kind() {
                TokenKind::Dot => {
                    self.advance();
                    let property = self.parse_identifier()?;
                    callee = Expression::Member(MemberExpression {
                        object: Box::new(callee),
                        property: MemberProperty::Identifier(property),
                    });
                }
                TokenKind::LeftBracket => {
                    self.advance();
                    let key = self.parse_expression()?;
                    self.expect(&TokenKind::RightBracket)?;
                    callee = Expression::Member(MemberExpression {
                        object: Box::new(callee),
                        property: MemberProperty::Expression(Box::new(key)),
                    });
                }
                _ => break,
            }
        }

        let arguments = if self.check(&TokenKind::LeftParen) {
            self.parse_arguments()?
        } else {
            Vec::new()
        };
        Ok(Expression::New(NewExpression {
            callee: Box::new(callee),
            arguments,
        }))
    }

    fn parse_arguments(&mut self) -> Result<Vec<Expression>> {
        self.expect(&TokenKind::LeftParen)?;
        let mut arguments = Vec::new();
        if !self.check(&TokenKind::RightParen) {
            loop {
                arguments.push(self.parse_assignment_expression()?);
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(&TokenKind::RightParen)?;
        Ok(arguments)
    }

    fn parse_primary(&mut self) -> Result<Expression> {
        match self.peek_kind().clone() {
            TokenKind::Number(n) => {
                self.advance();
                Ok(Expression::Literal(Literal::Number(n)))
            }
            TokenKind::String(s) => {
                self.advance();
                Ok(Expression::Literal(Literal::String(s)))
            }
            TokenKind::True => {
                self.advance();
                Ok(Expression::Literal(Literal::Boolean(true)))
            }
            TokenKind::False => {
                self.advance();
                Ok(Expression::Literal(Literal::Boolean(false)))
            }
            TokenKind::Null => {
                self.advance();
                Ok(Expression::Literal(Literal::Null))
            }
            TokenKind::This => {
                self.advance();
                Ok(Expression::This)
            }
            TokenKind::Identifier(name) => {
                self.advance();
                Ok(Expression::Identifier(Identifier { name }))
            }
            TokenKind::Function => self.parse_function_expression(),
            TokenKind::LeftParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(&TokenKind::RightParen)?;
                Ok(expr)
            }
            TokenKind::LeftBracket => self.parse_array_literal(),
            TokenKind::LeftBrace => self.parse_object_literal(),
            _ => self.unexpected("expression position"),
        }
    }

    fn parse_function_expression(&mut self) -> Result<Expression> {
        self.expect(&TokenKind::Function)?;
        let id = if matches!(self.peek_kind(), TokenKind::Identifier(_)) {
            Some(self.parse_identifier()?)
        } else {
            None
        };
        let params = self.parse_params()?;
        let body = self.parse_block()?.body;
        Ok(Expression::Function(FunctionExpression { id, params, body }))
    }

    fn parse_array_literal(&mut self) -> Result<Expression> {
        self.expect(&TokenKind::LeftBracket)?;
        let mut elements = Vec::new();
        while !self.check(&TokenKind::RightBracket) {
            if self.check(&TokenKind::Comma) {
                // Elision produces a hole.
                elements.push(None);
                self.advance();
                continue;
            }
            elements.push(Some(self.parse_assignment_expression()?));
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RightBracket)?;
        Ok(Expression::Array(ArrayExpression { elements }))
    }

    fn parse_object_literal(&mut self) -> Result<Expression> {
        self.expect(&TokenKind::LeftBrace)?;
        let mut properties = Vec::new();
        while !self.check(&TokenKind::RightBrace) {
            let key = match self.peek_kind().clone() {
                TokenKind::Identifier(name) => {
                    self.advance();
                    PropertyKey::Identifier(Identifier { name })
                }
                TokenKind::String(s) => {
                    self.advance();
                    PropertyKey::Literal(Literal::String(s))
                }
                TokenKind::Number(n) => {
                    self.advance();
                    PropertyKey::Literal(Literal::Number(n))
                }
                _ => return self.unexpected("object literal key position"),
            };
            self.expect(&TokenKind::Colon)?;
            let value = self.parse_assignment_expression()?;
            properties.push(Property { key, value });
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RightBrace)?;
        Ok(Expression::Object(ObjectExpression { properties }))
    }
}
