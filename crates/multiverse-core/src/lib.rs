//! Multiverse Core Types and Definitions
//!
//! This crate provides the data model shared by the multiverse parser,
//! generator and CLI:
//!
//! - **Identifiers**: Efficient string-interned identifiers ([`identifier::Id`])
//! - **Templates**: Blocks and chunks cut from an annotated template ([`template`])
//! - **Decisions**: Named option lists and their values ([`decision`], [`value`])
//! - **Conditions**: Constraint expressions and their evaluation ([`condition`])
//! - **Constraints**: Validated constraints indexed by target ([`constraint`])
//! - **Flow graph**: Block ordering ([`graph`])
//! - **Universes**: Generated variants and their histories ([`history`])
//! - **ADG**: The analysis decision graph ([`adg`])

pub mod adg;
pub mod condition;
pub mod constraint;
pub mod decision;
pub mod graph;
pub mod history;
pub mod identifier;
pub mod program;
pub mod template;
pub mod value;
