pub mod analysis;
pub mod checker;
pub mod config;
pub mod deep_copy;
pub mod diagnostics;
pub mod error;
pub mod fake_override;
pub mod ir;
pub mod ir_builders;
pub mod ir_expr;
pub mod ir_mutation;
pub mod ir_render;
pub mod ir_types;
pub mod ir_verify;
pub mod lexer;
pub mod light_tree;
pub mod line_index;
pub mod logging;
pub mod parse_tree;
pub mod parser;
pub mod remap;
pub mod resolve;
pub mod source_tree;
pub mod static_twin;
pub mod subtyping;
pub mod syntax_kind;
pub mod toolkit;
