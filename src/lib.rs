pub mod cli;
pub mod codegen;
pub mod config;
pub mod error;
pub mod expand;
pub mod ir;
pub mod lower;
pub mod path_de;
pub mod syntax;
