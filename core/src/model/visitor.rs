use super::{Block, File, Node, Statement};

/// Depth-first walk over a parsed file.
///
/// Implementors override the hooks they care about and call the `walk_*`
/// helpers to keep descending. `leave_block` runs after a block's children,
/// which is where scope-tracking visitors pop their state.
pub trait Visitor {
    fn visit_block(&mut self, block: &Block) {
        walk_block(self, block);
    }

    fn leave_block(&mut self, _block: &Block) {}

    fn visit_statement(&mut self, _statement: &Statement) {}
}

pub fn walk_file<V: Visitor + ?Sized>(visitor: &mut V, file: &File) {
    for section in &file.sections {
        visitor.visit_block(section);
        visitor.leave_block(section);
    }
}

pub fn walk_block<V: Visitor + ?Sized>(visitor: &mut V, block: &Block) {
    if let Some(header) = &block.header {
        visitor.visit_statement(header);
    }
    for node in &block.body {
        match node {
            Node::Statement(statement) => visitor.visit_statement(statement),
            Node::Block(child) => {
                visitor.visit_block(child);
                visitor.leave_block(child);
            }
        }
    }
    for branch in &block.branches {
        visitor.visit_block(branch);
        visitor.leave_block(branch);
    }
    if let Some(end) = &block.end {
        visitor.visit_statement(end);
    }
}
