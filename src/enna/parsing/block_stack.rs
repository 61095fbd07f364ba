//! Explicit stack of open blocks
//!
//! The root container is implicit and can never be closed. Each `FOR` or `IF` directive
//! pushes a frame; `$END$` pops it into a finished [`Node`] appended to the new top.
//! `ELIF`/`ELSE` only ever touch the top frame.

use crate::enna::ast::{Argument, ErrorCode, IfBranch, Node};
use std::ops::Range as ByteRange;

/// Where the frame's opening directive sits, for `EOF_OPN_BLK`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opening {
    pub line: usize,
    pub span: ByteRange<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    For {
        opening: Opening,
        argument: Argument,
        body: Vec<Node>,
    },
    If {
        opening: Opening,
        closed: Vec<IfBranch>,
        current: IfBranch,
    },
}

impl Frame {
    pub fn opening(&self) -> &Opening {
        match self {
            Frame::For { opening, .. } | Frame::If { opening, .. } => opening,
        }
    }

    fn body_mut(&mut self) -> &mut Vec<Node> {
        match self {
            Frame::For { body, .. } => body,
            Frame::If { current, .. } => &mut current.body,
        }
    }

    fn into_node(self) -> Node {
        match self {
            Frame::For { argument, body, .. } => Node::For { argument, body },
            Frame::If {
                mut closed,
                current,
                ..
            } => {
                closed.push(current);
                Node::If { branches: closed }
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct BlockStack {
    root: Vec<Node>,
    frames: Vec<Frame>,
}

impl BlockStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// The container new nodes are appended to
    pub fn current(&mut self) -> &mut Vec<Node> {
        match self.frames.last_mut() {
            Some(frame) => frame.body_mut(),
            None => &mut self.root,
        }
    }

    /// Append plain text, merging with a directly preceding text node
    pub fn push_text(&mut self, span: ByteRange<usize>) {
        if span.is_empty() {
            return;
        }
        let body = self.current();
        if let Some(Node::PlainText { span: last }) = body.last_mut() {
            if last.end == span.start {
                last.end = span.end;
                return;
            }
        }
        body.push(Node::PlainText { span });
    }

    pub fn push_node(&mut self, node: Node) {
        self.current().push(node);
    }

    pub fn open_for(&mut self, opening: Opening, argument: Argument) {
        self.frames.push(Frame::For {
            opening,
            argument,
            body: Vec::new(),
        });
    }

    pub fn open_if(&mut self, opening: Opening, condition: Argument) {
        self.frames.push(Frame::If {
            opening,
            closed: Vec::new(),
            current: IfBranch::new(Some(condition)),
        });
    }

    /// Start an `ELIF` branch, or report why it cannot be placed
    pub fn add_elif(&mut self, condition: Argument) -> Result<(), ErrorCode> {
        self.next_branch(
            IfBranch::new(Some(condition)),
            [ErrorCode::ElifRoot, ErrorCode::ElifOut, ErrorCode::ElseElif],
        )
    }

    /// Start the terminal `ELSE` branch, or report why it cannot be placed
    pub fn add_else(&mut self) -> Result<(), ErrorCode> {
        self.next_branch(
            IfBranch::new(None),
            [ErrorCode::ElseRoot, ErrorCode::ElseOut, ErrorCode::MultElse],
        )
    }

    /// `errors` is what to report at root, inside a non-IF block and after an ELSE
    fn next_branch(&mut self, branch: IfBranch, errors: [ErrorCode; 3]) -> Result<(), ErrorCode> {
        let [at_root, outside_if, after_else] = errors;
        match self.frames.last_mut() {
            None => Err(at_root),
            Some(Frame::For { .. }) => Err(outside_if),
            Some(Frame::If { current, .. }) if current.is_else() => Err(after_else),
            Some(Frame::If { closed, current, .. }) => {
                closed.push(std::mem::replace(current, branch));
                Ok(())
            }
        }
    }

    /// Close the innermost block; `CLOSE_ROOT` when nothing is open
    pub fn close(&mut self) -> Result<(), ErrorCode> {
        let frame = self.frames.pop().ok_or(ErrorCode::CloseRoot)?;
        let node = frame.into_node();
        self.current().push(node);
        Ok(())
    }

    /// Close every frame still open, returning their openings outermost first
    pub fn finish(mut self) -> (Vec<Node>, Vec<Opening>) {
        let openings = self.frames.iter().map(|f| f.opening().clone()).collect();
        while let Some(frame) = self.frames.pop() {
            let node = frame.into_node();
            self.current().push(node);
        }
        (self.root, openings)
    }
}
