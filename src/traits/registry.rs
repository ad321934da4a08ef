// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::{Template, TemplateRef};

/// Lookup capability mapping a template reference to its contract.
///
/// Validation and planning receive the registry as an argument, so the same
/// recipe can be checked against a production registry or a mocked one.
/// Any `Fn(&TemplateRef) -> Option<Template>` closure is a registry.
///
/// ```
/// use recipe_dag::config::{AtomicContract, Template, TemplateRef};
/// use recipe_dag::traits::TemplateRegistry;
///
/// let registry = |reference: &TemplateRef| match reference.name() {
///     "convert-epw" => Some(Template::from(AtomicContract::new("convert-epw"))),
///     _ => None,
/// };
///
/// assert!(registry.resolve(&TemplateRef::new("convert-epw")).is_some());
/// assert!(registry.resolve(&TemplateRef::new("missing")).is_none());
/// ```
pub trait TemplateRegistry: Send + Sync {
    fn resolve(&self, reference: &TemplateRef) -> Option<Template>;
}

impl<F> TemplateRegistry for F
where
    F: Fn(&TemplateRef) -> Option<Template> + Send + Sync,
{
    fn resolve(&self, reference: &TemplateRef) -> Option<Template> {
        self(reference)
    }
}
