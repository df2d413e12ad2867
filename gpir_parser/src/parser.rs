//! Recursive-descent parser producing the syntax tree in `crate::ast`.

use crate::ast::*;
use crate::error::{ParseError, ParseResult};
use crate::lexer::{tokenize, SpannedToken};
use crate::span::Span;
use crate::token::Token;

/// Parser over a pre-lexed token stream.
#[derive(Debug)]
pub struct Parser {
    tokens: Vec<SpannedToken>,
    position: usize,
}

impl Parser {
    pub fn new(source: &str) -> ParseResult<Self> {
        Ok(Self {
            tokens: tokenize(source)?,
            position: 0,
        })
    }

    // ---- cursor helpers ----

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position).map(|t| &t.token)
    }

    fn peek_second(&self) -> Option<&Token> {
        self.tokens.get(self.position + 1).map(|t| &t.token)
    }

    fn current_span(&self) -> Span {
        self.tokens
            .get(self.position)
            .map(|t| t.span)
            .unwrap_or_default()
    }

    fn advance(&mut self) -> Option<SpannedToken> {
        let token = self.tokens.get(self.position).cloned();
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    fn next_or_eof(&mut self, expected: &str) -> ParseResult<SpannedToken> {
        self.advance()
            .ok_or_else(|| ParseError::unexpected_eof(expected))
    }

    fn error_here(&self, expected: &str) -> ParseError {
        match self.tokens.get(self.position) {
            Some(t) => ParseError::unexpected_token(t.token.describe(), expected, t.span),
            None => ParseError::unexpected_eof(expected),
        }
    }

    fn expect(&mut self, token: Token, expected: &str) -> ParseResult<Span> {
        match self.peek() {
            Some(t) if *t == token => Ok(self.advance().expect("peeked").span),
            _ => Err(self.error_here(expected)),
        }
    }

    fn at_ident(&self, word: &str) -> bool {
        matches!(self.peek(), Some(Token::Ident(w)) if w == word)
    }

    fn expect_ident(&mut self, word: &str) -> ParseResult<Span> {
        if self.at_ident(word) {
            Ok(self.advance().expect("peeked").span)
        } else {
            Err(self.error_here(&format!("'{}'", word)))
        }
    }

    fn expect_any_ident(&mut self, expected: &str) -> ParseResult<(String, Span)> {
        match self.peek() {
            Some(Token::Ident(_)) => {
                let t = self.advance().expect("peeked");
                let Token::Ident(word) = t.token else {
                    unreachable!()
                };
                Ok((word, t.span))
            }
            _ => Err(self.error_here(expected)),
        }
    }

    fn expect_local(&mut self) -> ParseResult<(String, Span)> {
        match self.peek() {
            Some(Token::Local(_)) => {
                let t = self.advance().expect("peeked");
                let Token::Local(name) = t.token else {
                    unreachable!()
                };
                Ok((name, t.span))
            }
            _ => Err(self.error_here("a %value")),
        }
    }

    fn expect_global(&mut self) -> ParseResult<(String, Span)> {
        match self.peek() {
            Some(Token::Global(_)) => {
                let t = self.advance().expect("peeked");
                let Token::Global(name) = t.token else {
                    unreachable!()
                };
                Ok((name, t.span))
            }
            _ => Err(self.error_here("a @global")),
        }
    }

    fn expect_block_label(&mut self) -> ParseResult<(String, Span)> {
        match self.peek() {
            Some(Token::Block(_)) => {
                let t = self.advance().expect("peeked");
                let Token::Block(name) = t.token else {
                    unreachable!()
                };
                Ok((name, t.span))
            }
            _ => Err(self.error_here("a 'block label")),
        }
    }

    fn expect_type_name(&mut self) -> ParseResult<(String, Span)> {
        match self.peek() {
            Some(Token::TypeName(_)) => {
                let t = self.advance().expect("peeked");
                let Token::TypeName(name) = t.token else {
                    unreachable!()
                };
                Ok((name, t.span))
            }
            _ => Err(self.error_here("a $type name")),
        }
    }

    // ---- module structure ----

    /// Parse a whole module into the syntax tree.
    pub fn parse_module_ast(mut self) -> ParseResult<AstModule> {
        self.expect_ident("module")?;
        let name = match self.next_or_eof("a module name string")? {
            SpannedToken {
                token: Token::Str(name),
                ..
            } => name,
            t => {
                return Err(ParseError::unexpected_token(
                    t.token.describe(),
                    "a module name string",
                    t.span,
                ))
            }
        };
        self.expect_ident("stage")?;
        let (stage, stage_span) = self.expect_any_ident("a stage tag")?;

        let mut module = AstModule {
            name,
            stage,
            stage_span,
            enums: Vec::new(),
            structs: Vec::new(),
            aliases: Vec::new(),
            variables: Vec::new(),
            functions: Vec::new(),
        };

        while self.peek().is_some() {
            let attributes = self.parse_attribute_lines()?;
            let word = match self.peek() {
                Some(Token::Ident(word)) => word.clone(),
                _ => return Err(self.error_here("a declaration")),
            };
            match word.as_str() {
                "func" => {
                    let function = self.parse_function(attributes)?;
                    module.functions.push(function);
                }
                _ if !attributes.is_empty() => {
                    return Err(self.error_here("'func' after attributes"))
                }
                "enum" => module.enums.push(self.parse_enum()?),
                "struct" => module.structs.push(self.parse_struct()?),
                "type" => module.aliases.push(self.parse_alias()?),
                "var" => module.variables.push(self.parse_variable()?),
                _ => return Err(self.error_here("a declaration")),
            }
        }
        Ok(module)
    }

    fn parse_attribute_lines(&mut self) -> ParseResult<Vec<String>> {
        let mut attributes = Vec::new();
        while matches!(self.peek(), Some(Token::LBracket)) {
            self.expect(Token::LBracket, "'['")?;
            let (word, _) = self.expect_any_ident("an attribute name")?;
            self.expect(Token::RBracket, "']'")?;
            attributes.push(word);
        }
        Ok(attributes)
    }

    fn parse_enum(&mut self) -> ParseResult<AstEnum> {
        let span = self.expect_ident("enum")?;
        let (name, _) = self.expect_type_name()?;
        self.expect(Token::LBrace, "'{'")?;
        let mut cases = Vec::new();
        while let Some(Token::Case(_)) = self.peek() {
            let t = self.advance().expect("peeked");
            let Token::Case(case) = t.token else {
                unreachable!()
            };
            self.expect(Token::LParen, "'('")?;
            let types = self.parse_type_list_until_rparen()?;
            cases.push((case, types));
        }
        self.expect(Token::RBrace, "'}'")?;
        Ok(AstEnum { name, cases, span })
    }

    fn parse_struct(&mut self) -> ParseResult<AstStruct> {
        let span = self.expect_ident("struct")?;
        let (name, _) = self.expect_type_name()?;
        self.expect(Token::LBrace, "'{'")?;
        let mut fields = Vec::new();
        while let Some(Token::Field(_)) = self.peek() {
            let t = self.advance().expect("peeked");
            let Token::Field(field) = t.token else {
                unreachable!()
            };
            self.expect(Token::Colon, "':'")?;
            let ty = self.parse_type()?;
            fields.push((field, ty));
        }
        self.expect(Token::RBrace, "'}'")?;
        Ok(AstStruct { name, fields, span })
    }

    fn parse_alias(&mut self) -> ParseResult<AstAlias> {
        let span = self.expect_ident("type")?;
        let (name, _) = self.expect_type_name()?;
        self.expect(Token::Eq, "'='")?;
        let ty = if self.at_ident("opaque") {
            self.advance();
            None
        } else {
            Some(self.parse_type()?)
        };
        Ok(AstAlias { name, ty, span })
    }

    fn parse_variable(&mut self) -> ParseResult<AstVariable> {
        let span = self.expect_ident("var")?;
        let (name, _) = self.expect_global()?;
        self.expect(Token::Colon, "':'")?;
        let ty = self.parse_type()?;
        Ok(AstVariable { name, ty, span })
    }

    fn parse_function(&mut self, mut attributes: Vec<String>) -> ParseResult<AstFunction> {
        let is_extern = attributes.iter().any(|a| a == "extern");
        attributes.retain(|a| a != "extern");

        let span = self.expect_ident("func")?;
        let (name, _) = self.expect_global()?;
        self.expect(Token::Colon, "':'")?;
        self.expect(Token::LParen, "'('")?;
        let argument_types = self.parse_type_list_until_rparen()?;
        self.expect(Token::Arrow, "'->'")?;
        let return_type = self.parse_type()?;

        let mut blocks = Vec::new();
        if matches!(self.peek(), Some(Token::LBrace)) {
            self.advance();
            while !matches!(self.peek(), Some(Token::RBrace)) {
                blocks.push(self.parse_block()?);
            }
            self.expect(Token::RBrace, "'}'")?;
        }

        Ok(AstFunction {
            attributes,
            is_extern,
            name,
            argument_types,
            return_type,
            blocks,
            span,
        })
    }

    fn parse_block(&mut self) -> ParseResult<AstBlock> {
        let (name, span) = self.expect_block_label()?;
        self.expect(Token::LParen, "'('")?;
        let mut parameters = Vec::new();
        if !matches!(self.peek(), Some(Token::RParen)) {
            loop {
                let (parameter, _) = self.expect_local()?;
                self.expect(Token::Colon, "':'")?;
                let ty = self.parse_type()?;
                parameters.push((parameter, ty));
                if matches!(self.peek(), Some(Token::Comma)) {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect(Token::RParen, "')'")?;
        self.expect(Token::Colon, "':'")?;

        let mut instructions = Vec::new();
        loop {
            match self.peek() {
                // The next block header or the end of the function body.
                Some(Token::Block(_)) | Some(Token::RBrace) | None => break,
                _ => instructions.push(self.parse_instruction()?),
            }
        }
        Ok(AstBlock {
            name,
            parameters,
            instructions,
            span,
        })
    }

    // ---- types ----

    fn parse_type(&mut self) -> ParseResult<AstType> {
        match self.peek() {
            Some(Token::Ident(word)) if word == "bool" => {
                self.advance();
                Ok(AstType::Bool)
            }
            Some(Token::TypeName(_)) => {
                let (name, span) = self.expect_type_name()?;
                Ok(AstType::Named(name, span))
            }
            Some(Token::Star) => {
                self.advance();
                Ok(AstType::Pointer(Box::new(self.parse_type()?)))
            }
            Some(Token::LParen) => {
                self.advance();
                let elements = self.parse_type_list_until_rparen()?;
                if matches!(self.peek(), Some(Token::Arrow)) {
                    self.advance();
                    let ret = self.parse_type()?;
                    Ok(AstType::Function(elements, Box::new(ret)))
                } else {
                    Ok(AstType::Tuple(elements))
                }
            }
            _ => Err(self.error_here("a type")),
        }
    }

    /// `T, T, ...)` with the opening paren already consumed.
    fn parse_type_list_until_rparen(&mut self) -> ParseResult<Vec<AstType>> {
        let mut types = Vec::new();
        if !matches!(self.peek(), Some(Token::RParen)) {
            loop {
                types.push(self.parse_type()?);
                if matches!(self.peek(), Some(Token::Comma)) {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect(Token::RParen, "')'")?;
        Ok(types)
    }

    // ---- uses and literals ----

    fn at_use_start(&self) -> bool {
        match self.peek() {
            Some(Token::Local(_) | Token::Global(_) | Token::LParen | Token::LBrace
                | Token::Case(_)) => true,
            Some(Token::Ident(word)) => {
                matches!(word.as_str(), "true" | "false" | "zero" | "undefined" | "null")
            }
            _ => false,
        }
    }

    fn parse_use(&mut self) -> ParseResult<AstUse> {
        let span = self.current_span();
        match self.peek() {
            Some(Token::Local(_)) => {
                let (name, _) = self.expect_local()?;
                self.expect(Token::Colon, "':'")?;
                let _annotation = self.parse_type()?;
                Ok(AstUse {
                    kind: AstUseKind::Local(name),
                    span,
                })
            }
            Some(Token::Global(_)) => {
                let (name, _) = self.expect_global()?;
                self.expect(Token::Colon, "':'")?;
                let _annotation = self.parse_type()?;
                Ok(AstUse {
                    kind: AstUseKind::Global(name),
                    span,
                })
            }
            _ => {
                let literal = self.parse_literal()?;
                self.expect(Token::Colon, "':'")?;
                let ty = self.parse_type()?;
                Ok(AstUse {
                    kind: AstUseKind::Literal(literal, ty),
                    span,
                })
            }
        }
    }

    fn parse_literal(&mut self) -> ParseResult<AstLiteral> {
        match self.peek() {
            Some(Token::Ident(word)) => {
                let literal = match word.as_str() {
                    "true" => AstLiteral::Bool(true),
                    "false" => AstLiteral::Bool(false),
                    "zero" => AstLiteral::Zero,
                    "undefined" => AstLiteral::Undefined,
                    "null" => AstLiteral::Null,
                    _ => return Err(self.error_here("a literal")),
                };
                self.advance();
                Ok(literal)
            }
            Some(Token::LParen) => {
                self.advance();
                let elements = self.parse_use_list_until_rparen()?;
                Ok(AstLiteral::Tuple(elements))
            }
            Some(Token::LBrace) => {
                self.advance();
                let mut fields = Vec::new();
                if !matches!(self.peek(), Some(Token::RBrace)) {
                    loop {
                        let t = self.next_or_eof("a #field")?;
                        let Token::Field(field) = t.token else {
                            return Err(ParseError::unexpected_token(
                                t.token.describe(),
                                "a #field",
                                t.span,
                            ));
                        };
                        self.expect(Token::Eq, "'='")?;
                        let value = self.parse_use()?;
                        fields.push((field, value));
                        if matches!(self.peek(), Some(Token::Comma)) {
                            self.advance();
                        } else {
                            break;
                        }
                    }
                }
                self.expect(Token::RBrace, "'}'")?;
                Ok(AstLiteral::Struct(fields))
            }
            Some(Token::Case(_)) => {
                let t = self.advance().expect("peeked");
                let Token::Case(case) = t.token else {
                    unreachable!()
                };
                self.expect(Token::LParen, "'('")?;
                let elements = self.parse_use_list_until_rparen()?;
                Ok(AstLiteral::EnumCase(case, elements))
            }
            _ => Err(self.error_here("a literal")),
        }
    }

    /// `use, use, ...)` with the opening paren already consumed.
    fn parse_use_list_until_rparen(&mut self) -> ParseResult<Vec<AstUse>> {
        let mut uses = Vec::new();
        if !matches!(self.peek(), Some(Token::RParen)) {
            loop {
                uses.push(self.parse_use()?);
                if matches!(self.peek(), Some(Token::Comma)) {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect(Token::RParen, "')'")?;
        Ok(uses)
    }

    /// `'bb(use, ...)` argument lists of branches.
    fn parse_block_arguments(&mut self) -> ParseResult<Vec<AstUse>> {
        self.expect(Token::LParen, "'('")?;
        self.parse_use_list_until_rparen()
    }

    fn parse_key(&mut self) -> ParseResult<AstKey> {
        match self.peek() {
            Some(Token::Int(_)) => {
                let t = self.advance().expect("peeked");
                let Token::Int(index) = t.token else {
                    unreachable!()
                };
                Ok(AstKey::Index(index))
            }
            Some(Token::Field(_)) => {
                let t = self.advance().expect("peeked");
                let Token::Field(name) = t.token else {
                    unreachable!()
                };
                Ok(AstKey::Name(name))
            }
            _ => Ok(AstKey::Value(self.parse_use()?)),
        }
    }

    fn parse_keys(&mut self) -> ParseResult<Vec<AstKey>> {
        let mut keys = vec![self.parse_key()?];
        while matches!(self.peek(), Some(Token::Comma)) {
            self.advance();
            keys.push(self.parse_key()?);
        }
        Ok(keys)
    }

    // ---- instructions ----

    fn parse_instruction(&mut self) -> ParseResult<AstInstruction> {
        let span = self.current_span();
        let name = if matches!(self.peek(), Some(Token::Local(_)))
            && matches!(self.peek_second(), Some(Token::Eq))
        {
            let (name, _) = self.expect_local()?;
            self.expect(Token::Eq, "'='")?;
            Some(name)
        } else {
            None
        };

        let (opcode, opcode_span) = self.expect_any_ident("an instruction mnemonic")?;
        let kind = match opcode.as_str() {
            "and" | "or" => {
                let op = if opcode == "and" {
                    gpir::ir::BooleanOp::And
                } else {
                    gpir::ir::BooleanOp::Or
                };
                let lhs = self.parse_use()?;
                self.expect(Token::Comma, "','")?;
                let rhs = self.parse_use()?;
                AstInstructionKind::BooleanBinary { op, lhs, rhs }
            }
            "not" => AstInstructionKind::Not(self.parse_use()?),
            "literal" => {
                let literal = self.parse_literal()?;
                self.expect(Token::Colon, "':'")?;
                let ty = self.parse_type()?;
                AstInstructionKind::Literal { literal, ty }
            }
            "branch" => {
                let (target, _) = self.expect_block_label()?;
                let arguments = self.parse_block_arguments()?;
                AstInstructionKind::Branch { target, arguments }
            }
            "conditional" => {
                let condition = self.parse_use()?;
                self.expect_ident("then")?;
                let (then_target, _) = self.expect_block_label()?;
                let then_arguments = self.parse_block_arguments()?;
                self.expect_ident("else")?;
                let (else_target, _) = self.expect_block_label()?;
                let else_arguments = self.parse_block_arguments()?;
                AstInstructionKind::Conditional {
                    condition,
                    then_target,
                    then_arguments,
                    else_target,
                    else_arguments,
                }
            }
            "branchEnum" => {
                let subject = self.parse_use()?;
                let mut cases = Vec::new();
                while self.at_ident("case") {
                    self.advance();
                    let t = self.next_or_eof("a ?case")?;
                    let Token::Case(case) = t.token else {
                        return Err(ParseError::unexpected_token(
                            t.token.describe(),
                            "a ?case",
                            t.span,
                        ));
                    };
                    let (target, _) = self.expect_block_label()?;
                    cases.push((case, target));
                }
                AstInstructionKind::BranchEnum { subject, cases }
            }
            "return" => {
                let value = if self.at_use_start() {
                    Some(self.parse_use()?)
                } else {
                    None
                };
                AstInstructionKind::Return(value)
            }
            "apply" => {
                let callee_span = self.current_span();
                let callee = match self.peek() {
                    Some(Token::Local(_)) => {
                        let (name, _) = self.expect_local()?;
                        AstCallee {
                            kind: AstCalleeKind::Local(name),
                            span: callee_span,
                        }
                    }
                    Some(Token::Global(_)) => {
                        let (name, _) = self.expect_global()?;
                        AstCallee {
                            kind: AstCalleeKind::Global(name),
                            span: callee_span,
                        }
                    }
                    _ => return Err(self.error_here("a callee reference")),
                };
                self.expect(Token::LParen, "'('")?;
                let arguments = self.parse_use_list_until_rparen()?;
                self.expect(Token::Arrow, "'->'")?;
                // The printed result type is redundant with the callee.
                let _return_type = self.parse_type()?;
                AstInstructionKind::Apply { callee, arguments }
            }
            "extract" => {
                let keys = self.parse_keys()?;
                self.expect_ident("from")?;
                let from = self.parse_use()?;
                AstInstructionKind::Extract { keys, from }
            }
            "insert" => {
                let source = self.parse_use()?;
                self.expect_ident("to")?;
                let destination = self.parse_use()?;
                self.expect_ident("at")?;
                let keys = self.parse_keys()?;
                AstInstructionKind::Insert {
                    source,
                    destination,
                    keys,
                }
            }
            "load" => AstInstructionKind::Load(self.parse_use()?),
            "store" => {
                let value = self.parse_use()?;
                self.expect_ident("to")?;
                let pointer = self.parse_use()?;
                AstInstructionKind::Store { value, pointer }
            }
            "elementPointer" => {
                let pointer = self.parse_use()?;
                self.expect_ident("at")?;
                let keys = self.parse_keys()?;
                AstInstructionKind::ElementPointer { pointer, keys }
            }
            "trap" => AstInstructionKind::Trap,
            "builtin" => {
                let t = self.next_or_eof("an intrinsic opcode string")?;
                let Token::Str(intrinsic) = t.token else {
                    return Err(ParseError::unexpected_token(
                        t.token.describe(),
                        "an intrinsic opcode string",
                        t.span,
                    ));
                };
                self.expect(Token::LParen, "'('")?;
                let operands = self.parse_use_list_until_rparen()?;
                AstInstructionKind::Builtin {
                    opcode: intrinsic,
                    operands,
                }
            }
            other => {
                return Err(ParseError::unexpected_token(
                    other,
                    "an instruction mnemonic",
                    opcode_span,
                ))
            }
        };
        Ok(AstInstruction { name, kind, span })
    }
}
