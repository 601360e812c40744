//! Teams domain layer: entities, rules, validation, invite codes

pub mod entities;
pub mod invite_code;
pub mod rules;
pub mod validation;
