//! Line-oriented, error tolerant tree builder
//!
//! The parser makes one forward pass over the lines of the buffer. Each line is first shown
//! to the [`CacheTracker`], then (if it is ordinary content) scanned into line items:
//! text, blanks, inline expressions and exec statements, and block directives.
//!
//! A line without block directives is emitted as is. A line with one is a directive line:
//! only its first directive is applied, code before it is `INV_DIR_PRE`, code after it is
//! `INV_DIR_POS`, further directives are `MULT_DIR`, and nothing of the line (newline
//! included) reaches the output.
//!
//! Arguments are delimited by a byte search for the closing marker (`$$` or `}$`) within the
//! current line, after which the token cursor resumes right behind the marker.

use crate::enna::ast::{Argument, ErrorCode, LineIndex, Node, SyntaxError};
use crate::enna::parsing::block_stack::{BlockStack, Opening};
use crate::enna::parsing::cache_region::{CacheTracker, LineRole};
use crate::enna::parsing::references::{register_references, Names};
use crate::enna::parsing::ParseResult;
use crate::enna::scanning::tokens::{DirectiveKind, Token};
use crate::enna::scanning::LineLexer;
use std::ops::Range as ByteRange;

const EXPRESSION_CLOSE: &[u8] = b"$$";
const ARGUMENT_CLOSE: &[u8] = b"}$";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Block {
    For(Argument),
    If(Argument),
    Elif(Argument),
    Else,
    End,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ItemKind {
    Text,
    Blank,
    Expression(Argument),
    Exec(Argument),
    Block(Block),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Item {
    span: ByteRange<usize>,
    kind: ItemKind,
}

impl Item {
    fn is_blank(&self) -> bool {
        self.kind == ItemKind::Blank
    }

    fn is_block(&self) -> bool {
        matches!(self.kind, ItemKind::Block(_))
    }
}

pub struct Parser<'s> {
    source: &'s [u8],
    index: LineIndex,
    stack: BlockStack,
    cache: CacheTracker,
    names: Names,
    errors: Vec<SyntaxError>,
}

impl<'s> Parser<'s> {
    pub fn new(source: &'s [u8]) -> Self {
        Self {
            source,
            index: LineIndex::new(source),
            stack: BlockStack::new(),
            cache: CacheTracker::new(),
            names: Names::default(),
            errors: Vec::new(),
        }
    }

    pub fn parse(mut self) -> ParseResult {
        for line in 1..=self.index.line_count() {
            let Some(span) = self.index.line_span(line) else {
                continue;
            };
            let end = if span.end < self.source.len() {
                span.end + 1
            } else {
                span.end
            };

            match self
                .cache
                .classify(self.source, line, span.clone(), end, &mut self.errors)
            {
                LineRole::Hidden => {}
                LineRole::Verbatim => self.stack.push_text(span.start..end),
                LineRole::Content => self.parse_line(line, span, end),
            }
        }

        self.finish()
    }

    fn finish(self) -> ParseResult {
        let Parser {
            index,
            stack,
            cache,
            names,
            mut errors,
            ..
        } = self;

        let (tree, openings) = stack.finish();
        for Opening { line, span } in openings {
            errors.push(SyntaxError::new(ErrorCode::EofOpnBlk, line, span));
        }
        let cache = cache.finish(&mut errors);

        ParseResult {
            tree,
            errors,
            line_index: index,
            cache,
            names,
        }
    }

    fn error(&mut self, code: ErrorCode, line: usize, span: ByteRange<usize>) {
        self.errors.push(SyntaxError::new(code, line, span));
    }

    fn parse_line(&mut self, line: usize, span: ByteRange<usize>, end: usize) {
        let items = self.scan_line(line, span.clone());

        let Some(first) = items.iter().position(Item::is_block) else {
            for item in items {
                self.emit(item);
            }
            self.stack.push_text(span.end..end);
            return;
        };

        if let Some(extent) = content_extent(&items[..first]) {
            self.error(ErrorCode::InvDirPre, line, extent);
        }
        let after: Vec<Item> = items[first + 1..]
            .iter()
            .filter(|item| !item.is_block())
            .cloned()
            .collect();
        if let Some(extent) = content_extent(&after) {
            self.error(ErrorCode::InvDirPos, line, extent);
        }
        for extra in items[first + 1..].iter().filter(|item| item.is_block()) {
            self.error(ErrorCode::MultDir, line, extra.span.clone());
        }

        let directive = items[first].clone();
        if let ItemKind::Block(block) = directive.kind {
            self.apply(line, directive.span, block);
        }
    }

    fn emit(&mut self, item: Item) {
        match item.kind {
            ItemKind::Text | ItemKind::Blank => self.stack.push_text(item.span),
            ItemKind::Expression(argument) => self.stack.push_node(Node::Expression { argument }),
            ItemKind::Exec(argument) => self.stack.push_node(Node::Exec { argument }),
            // Directive lines never reach emit
            ItemKind::Block(_) => {}
        }
    }

    fn apply(&mut self, line: usize, span: ByteRange<usize>, block: Block) {
        let opening = Opening {
            line,
            span: span.clone(),
        };
        let result = match block {
            Block::For(argument) => {
                self.stack.open_for(opening, argument);
                Ok(())
            }
            Block::If(argument) => {
                self.stack.open_if(opening, argument);
                Ok(())
            }
            Block::Elif(argument) => self.stack.add_elif(argument),
            Block::Else => self.stack.add_else(),
            Block::End => self.stack.close(),
        };
        if let Err(code) = result {
            self.error(code, line, span);
        }
    }

    fn scan_line(&mut self, line: usize, span: ByteRange<usize>) -> Vec<Item> {
        let mut lexer = LineLexer::new(self.source, span.clone());
        let mut items = Vec::new();
        let has_newline = span.end < self.source.len();

        while let Some((token, token_span)) = lexer.next() {
            let open = token_span.start;

            let item = if token.opens_expression() {
                let arg_start = open + EXPRESSION_CLOSE.len();
                match lexer.find(arg_start, EXPRESSION_CLOSE) {
                    Some(close) => {
                        let argument = Argument::new(line, arg_start..close);
                        let end = close + EXPRESSION_CLOSE.len();
                        self.check_argument(&argument, open..end);
                        lexer.seek(end);
                        Item {
                            span: open..end,
                            kind: ItemKind::Expression(argument),
                        }
                    }
                    None => {
                        let code = if has_newline {
                            ErrorCode::LbOpnExp
                        } else {
                            ErrorCode::EofOpnExp
                        };
                        self.error(code, line, open..span.end);
                        self.register(line, arg_start..span.end);
                        lexer.seek(span.end);
                        Item {
                            span: open..span.end,
                            kind: ItemKind::Text,
                        }
                    }
                }
            } else if token == Token::ExecOpen
                || token.directive().is_some_and(|d| d.takes_argument())
            {
                let arg_start = token_span.end;
                let (argument, end) = match lexer.find(arg_start, ARGUMENT_CLOSE) {
                    Some(close) => {
                        let argument = Argument::new(line, arg_start..close);
                        let end = close + ARGUMENT_CLOSE.len();
                        self.check_argument(&argument, open..end);
                        (argument, end)
                    }
                    None => {
                        let code = if has_newline {
                            ErrorCode::LbOpnArg
                        } else {
                            ErrorCode::EofOpnArg
                        };
                        self.error(code, line, open..span.end);
                        let argument = Argument::new(line, arg_start..span.end);
                        self.register(line, argument.span.clone());
                        (argument, span.end)
                    }
                };
                lexer.seek(end);

                let kind = match token.directive() {
                    Some(DirectiveKind::For) => ItemKind::Block(Block::For(argument)),
                    Some(DirectiveKind::If) => ItemKind::Block(Block::If(argument)),
                    Some(DirectiveKind::Elif) => ItemKind::Block(Block::Elif(argument)),
                    _ => ItemKind::Exec(argument),
                };
                Item {
                    span: open..end,
                    kind,
                }
            } else {
                let kind = match token {
                    Token::Else => ItemKind::Block(Block::Else),
                    Token::End => ItemKind::Block(Block::End),
                    Token::Whitespace => ItemKind::Blank,
                    _ => ItemKind::Text,
                };
                Item {
                    span: token_span,
                    kind,
                }
            };

            items.push(item);
        }

        items
    }

    /// `EMPTY_ARG` for blank arguments, then reference registration
    fn check_argument(&mut self, argument: &Argument, directive: ByteRange<usize>) {
        let blank = argument
            .bytes(self.source)
            .iter()
            .all(|b| *b == b' ' || *b == b'\t');
        if blank {
            self.error(ErrorCode::EmptyArg, argument.line, directive);
        }
        self.register(argument.line, argument.span.clone());
    }

    fn register(&mut self, line: usize, span: ByteRange<usize>) {
        if span.start < span.end {
            register_references(self.source, span, line, &mut self.names, &mut self.errors);
        }
    }
}

/// Range from the first to the last non-blank item
fn content_extent(items: &[Item]) -> Option<ByteRange<usize>> {
    let mut content = items.iter().filter(|item| !item.is_blank());
    let first = content.next()?;
    let last = content.last().unwrap_or(first);
    Some(first.span.start..last.span.end)
}
