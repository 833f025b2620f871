//! A small interactive shell.
//!
//! This crate reads one line of input at a time, decides which combinator
//! governs it (pipeline, sequence, logical AND/OR, or a plain command) and
//! orchestrates child processes accordingly. Built-in commands (`cd`, `pwd`,
//! `exit`, `clear`) run in-process; everything else is resolved through PATH
//! and spawned as a child.
//!
//! The main entry point is [`Interpreter`], which owns the interpreter state
//! and drives either an interactive rustyline loop or a script file. The
//! [`classify`], [`tokenize`] and [`exec`] modules expose the line
//! classification and the five execution strategies for embedding and tests.

mod builtin;
pub mod classify;
pub mod env;
pub mod exec;
mod external;
mod interpreter;
pub mod tokenize;

pub use interpreter::Interpreter;
