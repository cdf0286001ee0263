//! Reactive safety synthesizer: realizability and controller synthesis
//! for finite-state two-player safety games over a propositional
//! (CNF/QBF) encoding, grounded on `original_source/tool`'s ten
//! components (C1–C10) and laid out the way `satgalaxy` organizes a
//! multi-backend systems crate: one module per concern, wired together
//! here and driven by [`backend::orchestrate`] from `main.rs`.

pub mod errors;
pub mod vars;
pub mod cnf;
pub mod qdimacs;
pub mod sat;
pub mod qbf;
pub mod util;
pub mod aiger;
pub mod synth;
pub mod ifm;
pub mod backend;
pub mod cli;
