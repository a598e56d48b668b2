mod node_index;
pub use node_index::*;

mod node_arena;
pub use node_arena::*;

mod obb_node;
pub use obb_node::*;

mod obb_tree;
pub use obb_tree::*;

mod tree_build;
pub use tree_build::*;
