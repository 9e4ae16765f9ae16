/*!
Recursive‑descent parser for Rox.

Consumes the scanner's token slice and produces the immutable tree in
[`crate::ast`].  Every name-bearing expression (`Variable`, `Assign`, `This`)
receives a fresh [`ExprId`] so later passes can key side tables by node.

### Time

| Phase / function              | Cost | Rationale                                                             |
|-------------------------------|-----:|-----------------------------------------------------------------------|
| `Parser::parse` main loop     | Θ(n) | Each token is consumed once via `advance()`.                          |
| Error recovery `synchronize()`| O(k) | Discards tokens ≤ next statement boundary ( `k ≤ n`).                 |

### Logging Policy

| Location                     | Level  | Purpose                                   |
|------------------------------|--------|-------------------------------------------|
| `Parser::new`, `parse`       | `info` | Lifecycle milestones.                     |
| `declaration`, `statement`   | `debug`| High‑level descent into grammar branches. |

--------------------------------------------------------------------------------
Grammar (EBNF)
--------------

```text
program        → declaration* EOF ;
declaration    → classDecl | funDecl | varDecl | statement ;
classDecl      → "class" IDENT ( "<" IDENT )? "{" function* "}" ;
funDecl        → "fun" function ;
function       → IDENT "(" parameters? ")" block ;
varDecl        → "var" IDENT ( "=" expression )? ";" ;
statement      → exprStmt | forStmt | ifStmt | printStmt | returnStmt
               | whileStmt | breakStmt | continueStmt | block ;
forStmt        → "for" "(" ( varDecl | exprStmt | ";" )
                 expression? ";" expression? ")" statement ;
breakStmt      → "break" ";" ;
continueStmt   → "continue" ";" ;
block          → "{" declaration* "}" ;
expression     → comma ;
comma          → assignment ( "," assignment )* ;
assignment     → ( call "." )? IDENT "=" assignment | conditional ;
conditional    → logic_or ( "?" expression ":" conditional )? ;
logic_or       → logic_and ( "or" logic_and )* ;
logic_and      → equality  ( "and" equality )* ;
equality       → comparison ( ( "!=" | "==" ) comparison )* ;
comparison     → term ( ( ">" | ">=" | "<" | "<=" ) term )* ;
term           → factor ( ( "-" | "+" ) factor )* ;
factor         → unary ( ( "/" | "*" ) unary )* ;
unary          → ( "!" | "-" ) unary | call ;
call           → primary ( "(" arguments? ")" | "." IDENT )* ;
arguments      → assignment ( "," assignment )* ;
primary        → NUMBER | STRING | "true" | "false" | "nil" | "this"
               | IDENT | "(" expression ")" ;
```
*/

use crate::ast::{Expr, ExprId, FunctionDecl, LiteralValue, Stmt};
use crate::error::{LoxError, Result};
use crate::token::{Token, TokenType};

use log::{debug, info};

const MAX_ARITY: usize = 255;

/// Top‑level parser over an immutable slice of tokens.
pub struct Parser<'a> {
    tokens: &'a [Token<'a>],
    current: usize,
    next_id: usize,
    errors: Vec<LoxError>,
}

impl<'a> Parser<'a> {
    /// Construct a new parser.  `tokens` must end with an `EOF` token.
    pub fn new(tokens: &'a [Token<'a>]) -> Self {
        info!("Parser created with {} tokens", tokens.len());

        Self {
            tokens,
            current: 0,
            next_id: 0,
            errors: Vec::new(),
        }
    }

    /// Continue node numbering from `first`, so trees parsed in separate
    /// batches never share an [`ExprId`].
    pub fn starting_at(mut self, first: ExprId) -> Self {
        self.next_id = first.0;
        self
    }

    /// The id the next name-bearing node would receive.
    pub fn next_expr_id(&self) -> ExprId {
        ExprId(self.next_id)
    }

    // ───────────────────────── public API ─────────────────────────

    /// Parse an entire program and return its statement list.  Every syntax
    /// error in the program is reported, not just the first.
    pub fn parse(&mut self) -> Result<Vec<Stmt<'a>>> {
        info!("Beginning parse phase");

        let mut statements: Vec<Stmt<'a>> = Vec::new();

        while !self.is_at_end() {
            match self.declaration() {
                Ok(stmt) => statements.push(stmt),
                Err(e) => self.errors.push(e),
            }
        }

        if self.errors.is_empty() {
            info!("Parsed {} statements", statements.len());

            Ok(statements)
        } else {
            Err(LoxError::from_batch(std::mem::take(&mut self.errors)))
        }
    }

    /// Parse a single expression that must span the whole input.
    pub fn parse_expression(&mut self) -> Result<Expr<'a>> {
        info!("Parsing standalone expression");

        let expr = self.expression()?;

        if !self.is_at_end() {
            return Err(LoxError::parse(self.peek(), "Expected end of expression"));
        }

        Ok(expr)
    }

    // ──────────────────────── declaration rules ───────────────────

    fn declaration(&mut self) -> Result<Stmt<'a>> {
        debug!("Entering declaration");

        let result = if self.matches(TokenType::CLASS) {
            self.class_declaration()
        } else if self.matches(TokenType::FUN) {
            self.function("function").map(Stmt::Function)
        } else if self.matches(TokenType::VAR) {
            self.var_declaration()
        } else {
            self.statement()
        };

        if result.is_err() {
            self.synchronize();
        }

        result
    }

    fn class_declaration(&mut self) -> Result<Stmt<'a>> {
        let name: &'a Token<'a> = self.consume(TokenType::IDENTIFIER, "Expected class name")?;

        let superclass = if self.matches(TokenType::LESS) {
            let super_name = self.consume(TokenType::IDENTIFIER, "Expected superclass name")?;

            Some(Expr::Variable {
                id: self.fresh_id(),
                name: super_name,
            })
        } else {
            None
        };

        self.consume(TokenType::LEFT_BRACE, "Expected '{' before class body")?;

        let mut methods: Vec<FunctionDecl<'a>> = Vec::new();

        while !self.check(TokenType::RIGHT_BRACE) && !self.is_at_end() {
            methods.push(self.function("method")?);
        }

        self.consume(TokenType::RIGHT_BRACE, "Expected '}' after class body")?;

        Ok(Stmt::Class {
            name,
            superclass,
            methods,
        })
    }

    fn function(&mut self, kind: &str) -> Result<FunctionDecl<'a>> {
        let name: &'a Token<'a> =
            self.consume(TokenType::IDENTIFIER, &format!("Expected {} name", kind))?;

        self.consume(
            TokenType::LEFT_PAREN,
            &format!("Expected '(' after {} name", kind),
        )?;

        let mut params: Vec<&'a Token<'a>> = Vec::new();

        if !self.check(TokenType::RIGHT_PAREN) {
            loop {
                if params.len() >= MAX_ARITY {
                    return Err(LoxError::parse(
                        self.peek(),
                        "Cannot have more than 255 parameters",
                    ));
                }

                params.push(self.consume(TokenType::IDENTIFIER, "Expected parameter name")?);

                if !self.matches(TokenType::COMMA) {
                    break;
                }
            }
        }

        self.consume(TokenType::RIGHT_PAREN, "Expected ')' after parameters")?;

        self.consume(
            TokenType::LEFT_BRACE,
            &format!("Expected '{{' before {} body", kind),
        )?;
        let body = self.block()?;

        Ok(FunctionDecl { name, params, body })
    }

    fn var_declaration(&mut self) -> Result<Stmt<'a>> {
        let name: &'a Token<'a> = self.consume(TokenType::IDENTIFIER, "Expected variable name")?;

        let initializer: Option<Expr<'a>> = if self.matches(TokenType::EQUAL) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(
            TokenType::SEMICOLON,
            "Expected ';' after variable declaration",
        )?;

        Ok(Stmt::Var { name, initializer })
    }

    // ───────────────────────── statement rules ────────────────────

    fn statement(&mut self) -> Result<Stmt<'a>> {
        debug!("Entering statement");

        if self.matches(TokenType::FOR) {
            self.for_statement()
        } else if self.matches(TokenType::IF) {
            self.if_statement()
        } else if self.matches(TokenType::WHILE) {
            self.while_statement()
        } else if self.matches(TokenType::RETURN) {
            self.return_statement()
        } else if self.matches(TokenType::BREAK) {
            let keyword = self.previous();
            self.consume(TokenType::SEMICOLON, "Expected ';' after 'break'")?;
            Ok(Stmt::Break(keyword))
        } else if self.matches(TokenType::CONTINUE) {
            let keyword = self.previous();
            self.consume(TokenType::SEMICOLON, "Expected ';' after 'continue'")?;
            Ok(Stmt::Continue(keyword))
        } else if self.matches(TokenType::LEFT_BRACE) {
            Ok(Stmt::Block(self.block()?))
        } else if self.matches(TokenType::PRINT) {
            self.print_statement()
        } else {
            self.expression_statement()
        }
    }

    fn for_statement(&mut self) -> Result<Stmt<'a>> {
        self.consume(TokenType::LEFT_PAREN, "Expected '(' after 'for'")?;

        let initializer = if self.matches(TokenType::SEMICOLON) {
            None
        } else if self.matches(TokenType::VAR) {
            Some(Box::new(self.var_declaration()?))
        } else {
            Some(Box::new(self.expression_statement()?))
        };

        let condition = if !self.check(TokenType::SEMICOLON) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(TokenType::SEMICOLON, "Expected ';' after loop condition")?;

        let increment = if !self.check(TokenType::RIGHT_PAREN) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(TokenType::RIGHT_PAREN, "Expected ')' after for clauses")?;

        let body = Box::new(self.statement()?);

        Ok(Stmt::For {
            initializer,
            condition,
            increment,
            body,
        })
    }

    fn print_statement(&mut self) -> Result<Stmt<'a>> {
        let value: Expr<'a> = self.expression()?;

        self.consume(TokenType::SEMICOLON, "Expected ';' after value")?;

        Ok(Stmt::Print(value))
    }

    fn expression_statement(&mut self) -> Result<Stmt<'a>> {
        let expr: Expr<'a> = self.expression()?;
        self.consume(TokenType::SEMICOLON, "Expected ';' after expression")?;
        Ok(Stmt::Expression(expr))
    }

    fn if_statement(&mut self) -> Result<Stmt<'a>> {
        self.consume(TokenType::LEFT_PAREN, "Expected '(' after 'if'")?;
        let condition: Expr<'a> = self.expression()?;
        self.consume(TokenType::RIGHT_PAREN, "Expected ')' after condition")?;

        let then_branch: Box<Stmt<'a>> = Box::new(self.statement()?);
        let else_branch: Option<Box<Stmt<'a>>> = if self.matches(TokenType::ELSE) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };

        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn while_statement(&mut self) -> Result<Stmt<'a>> {
        self.consume(TokenType::LEFT_PAREN, "Expected '(' after 'while'")?;
        let condition: Expr<'a> = self.expression()?;
        self.consume(TokenType::RIGHT_PAREN, "Expected ')' after condition")?;
        let body: Box<Stmt<'a>> = Box::new(self.statement()?);

        Ok(Stmt::While { condition, body })
    }

    fn return_statement(&mut self) -> Result<Stmt<'a>> {
        let keyword: &'a Token<'a> = self.previous();
        let value: Option<Expr<'a>> = if !self.check(TokenType::SEMICOLON) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(TokenType::SEMICOLON, "Expected ';' after return value")?;
        Ok(Stmt::Return { keyword, value })
    }

    /// Parses the statements of a block; the opening `{` is already consumed.
    /// Errors inside the block are recorded and parsing resumes at the next
    /// statement boundary.
    fn block(&mut self) -> Result<Vec<Stmt<'a>>> {
        let mut statements: Vec<Stmt<'a>> = Vec::new();

        while !self.check(TokenType::RIGHT_BRACE) && !self.is_at_end() {
            match self.declaration() {
                Ok(stmt) => statements.push(stmt),
                Err(e) => self.errors.push(e),
            }
        }

        self.consume(TokenType::RIGHT_BRACE, "Expected '}' after block")?;
        Ok(statements)
    }

    // ─────────────────────────── expression rules ─────────────────

    fn expression(&mut self) -> Result<Expr<'a>> {
        self.comma()
    }

    fn comma(&mut self) -> Result<Expr<'a>> {
        let mut expr: Expr<'a> = self.assignment()?;

        while self.matches(TokenType::COMMA) {
            let operator: &'a Token<'a> = self.previous();
            let right: Expr<'a> = self.assignment()?;

            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn assignment(&mut self) -> Result<Expr<'a>> {
        let expr: Expr<'a> = self.conditional()?;

        if self.matches(TokenType::EQUAL) {
            let equals: &'a Token<'a> = self.previous();
            let value: Expr<'a> = self.assignment()?;

            return match expr {
                Expr::Variable { name, .. } => Ok(Expr::Assign {
                    id: self.fresh_id(),
                    name,
                    value: Box::new(value),
                }),

                Expr::Get { object, name } => Ok(Expr::Set {
                    object,
                    name,
                    value: Box::new(value),
                }),

                _ => Err(LoxError::parse(equals, "Invalid assignment target")),
            };
        }

        Ok(expr)
    }

    fn conditional(&mut self) -> Result<Expr<'a>> {
        let condition: Expr<'a> = self.logical_or()?;

        if self.matches(TokenType::QUESTION) {
            let then_branch: Expr<'a> = self.expression()?;
            self.consume(
                TokenType::COLON,
                "Expected ':' after then branch of conditional expression",
            )?;
            let else_branch: Expr<'a> = self.conditional()?;

            return Ok(Expr::Conditional {
                condition: Box::new(condition),
                then_branch: Box::new(then_branch),
                else_branch: Box::new(else_branch),
            });
        }

        Ok(condition)
    }

    fn logical_or(&mut self) -> Result<Expr<'a>> {
        let mut expr: Expr<'a> = self.logical_and()?;

        while self.matches(TokenType::OR) {
            let operator: &'a Token<'a> = self.previous();
            let right: Expr<'a> = self.logical_and()?;

            expr = Expr::Logical {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn logical_and(&mut self) -> Result<Expr<'a>> {
        let mut expr: Expr<'a> = self.equality()?;

        while self.matches(TokenType::AND) {
            let operator: &'a Token<'a> = self.previous();
            let right: Expr<'a> = self.equality()?;

            expr = Expr::Logical {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn equality(&mut self) -> Result<Expr<'a>> {
        let mut expr: Expr<'a> = self.comparison()?;

        while self.matches(TokenType::BANG_EQUAL) || self.matches(TokenType::EQUAL_EQUAL) {
            let operator: &'a Token<'a> = self.previous();
            let right: Expr<'a> = self.comparison()?;

            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn comparison(&mut self) -> Result<Expr<'a>> {
        let mut expr = self.term()?;

        while self.matches(TokenType::GREATER)
            || self.matches(TokenType::GREATER_EQUAL)
            || self.matches(TokenType::LESS)
            || self.matches(TokenType::LESS_EQUAL)
        {
            let operator: &'a Token<'a> = self.previous();
            let right: Expr<'a> = self.term()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn term(&mut self) -> Result<Expr<'a>> {
        let mut expr: Expr<'a> = self.factor()?;

        while self.matches(TokenType::MINUS) || self.matches(TokenType::PLUS) {
            let operator: &'a Token<'a> = self.previous();
            let right: Expr<'a> = self.factor()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn factor(&mut self) -> Result<Expr<'a>> {
        let mut expr: Expr<'a> = self.unary()?;

        while self.matches(TokenType::STAR) || self.matches(TokenType::SLASH) {
            let operator: &'a Token<'a> = self.previous();
            let right: Expr<'a> = self.unary()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn unary(&mut self) -> Result<Expr<'a>> {
        if self.matches(TokenType::BANG) || self.matches(TokenType::MINUS) {
            let operator: &'a Token<'a> = self.previous();
            let right: Expr<'a> = self.unary()?;
            return Ok(Expr::Unary {
                operator,
                right: Box::new(right),
            });
        }

        self.call()
    }

    fn call(&mut self) -> Result<Expr<'a>> {
        let mut expr: Expr<'a> = self.primary()?;

        loop {
            if self.matches(TokenType::LEFT_PAREN) {
                expr = self.finish_call(expr)?;
            } else if self.matches(TokenType::DOT) {
                let name: &'a Token<'a> =
                    self.consume(TokenType::IDENTIFIER, "Expected property name after '.'")?;

                expr = Expr::Get {
                    object: Box::new(expr),
                    name,
                };
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr<'a>) -> Result<Expr<'a>> {
        let mut arguments: Vec<Expr<'a>> = Vec::new();

        if !self.check(TokenType::RIGHT_PAREN) {
            loop {
                if arguments.len() >= MAX_ARITY {
                    return Err(LoxError::parse(
                        self.peek(),
                        "Cannot have more than 255 arguments",
                    ));
                }

                // `assignment`, not `expression`: commas here separate arguments.
                arguments.push(self.assignment()?);

                if !self.matches(TokenType::COMMA) {
                    break;
                }
            }
        }

        let paren: &'a Token<'a> =
            self.consume(TokenType::RIGHT_PAREN, "Expected ')' after arguments")?;

        Ok(Expr::Call {
            callee: Box::new(callee),
            paren,
            arguments,
        })
    }

    fn primary(&mut self) -> Result<Expr<'a>> {
        if self.matches(TokenType::FALSE) {
            return Ok(Expr::Literal(LiteralValue::False));
        }
        if self.matches(TokenType::TRUE) {
            return Ok(Expr::Literal(LiteralValue::True));
        }
        if self.matches(TokenType::NIL) {
            return Ok(Expr::Literal(LiteralValue::Nil));
        }

        if let TokenType::NUMBER(n) = self.peek().token_type {
            self.advance();
            return Ok(Expr::Literal(LiteralValue::Number(n)));
        }

        if let TokenType::STRING(ref s) = self.peek().token_type {
            self.advance();
            return Ok(Expr::Literal(LiteralValue::Str(s.clone())));
        }

        if self.matches(TokenType::THIS) {
            return Ok(Expr::This {
                id: self.fresh_id(),
                keyword: self.previous(),
            });
        }

        if self.matches(TokenType::IDENTIFIER) {
            return Ok(Expr::Variable {
                id: self.fresh_id(),
                name: self.previous(),
            });
        }

        if self.matches(TokenType::LEFT_PAREN) {
            let expr: Expr<'a> = self.expression()?;

            self.consume(TokenType::RIGHT_PAREN, "Expected ')' after expression")?;

            return Ok(Expr::Grouping(Box::new(expr)));
        }

        Err(LoxError::parse(self.peek(), "Expected expression"))
    }

    // ────────────────────── utility helpers ───────────────────────

    fn fresh_id(&mut self) -> ExprId {
        let id = ExprId(self.next_id);
        self.next_id += 1;
        id
    }

    #[inline(always)]
    fn matches(&mut self, ttype: TokenType) -> bool {
        if self.check(ttype) {
            self.advance();

            return true;
        }

        false
    }

    #[inline(always)]
    fn consume(&mut self, ttype: TokenType, message: &str) -> Result<&'a Token<'a>> {
        if self.check(ttype) {
            return Ok(self.advance());
        }

        debug!("consume failed at '{}': {}", self.peek().lexeme, message);

        Err(LoxError::parse(self.peek(), message))
    }

    #[inline(always)]
    fn check(&self, ttype: TokenType) -> bool {
        if self.is_at_end() {
            return false;
        }

        self.peek().token_type == ttype
    }

    #[inline(always)]
    fn advance(&mut self) -> &'a Token<'a> {
        if !self.is_at_end() {
            self.current += 1;
        }

        self.previous()
    }

    #[inline(always)]
    fn is_at_end(&self) -> bool {
        matches!(self.peek().token_type, TokenType::EOF)
    }

    #[inline(always)]
    fn peek(&self) -> &'a Token<'a> {
        let tokens: &'a [Token<'a>] = self.tokens;
        &tokens[self.current]
    }

    #[inline(always)]
    fn previous(&self) -> &'a Token<'a> {
        let tokens: &'a [Token<'a>] = self.tokens;
        &tokens[self.current - 1]
    }

    /// Discards tokens until it thinks it is at a statement boundary.
    fn synchronize(&mut self) {
        self.advance(); // skip the token that caused the error

        while !self.is_at_end() {
            if matches!(self.previous().token_type, TokenType::SEMICOLON) {
                return;
            }

            match self.peek().token_type {
                TokenType::CLASS
                | TokenType::FUN
                | TokenType::VAR
                | TokenType::FOR
                | TokenType::IF
                | TokenType::WHILE
                | TokenType::PRINT
                | TokenType::RETURN
                | TokenType::BREAK
                | TokenType::CONTINUE => return,
                _ => {}
            }

            self.advance();
        }
    }
}
