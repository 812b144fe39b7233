//! Field-name translation and template classification between stores.
//!
//! Stores disagree about field naming (`password` vs `Password`,
//! `api_key` vs `API Key`) and about how a secret is categorized. The
//! [`FieldMapper`] translates payload keys via an ordered rule table, and
//! the [`TemplateRecommender`] suggests an advisory [`SecretCategory`]
//! from the secret name and payload shape.

mod field_mapper;
mod template;

pub use field_mapper::{FieldMapper, MappingRule, NamingConvention};
pub use template::{SecretCategory, TemplateRecommender};
