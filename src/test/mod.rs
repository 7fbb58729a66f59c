//! Fixtures shared by the unit tests.


use std::sync::Arc;

pub use host::*;

use crate::{
    config::EngineConfig,
    engine::RuleEngine,
    facades::FacadeRegistry,
    metadata::{
        MemberFlags, MemberSignature, MethodBody, Module, ModuleBuilder, Token, TypeFlags, TypeSig,
    },
};

// Helper function to create a mod with a single `ModEntry.Entry` method
pub fn build_mod(
    name: &str,
    body: impl FnOnce(&mut ModuleBuilder) -> MethodBody,
) -> (Module, Token) {
    let mut builder = ModuleBuilder::new(name);
    let ty = builder.define_type(name, "ModEntry", Some(TypeSig::object()), TypeFlags::PUBLIC);
    let body = body(&mut builder);
    let method = builder
        .define_method(
            ty,
            "Entry",
            MemberSignature::method(TypeSig::Void, vec![]),
            MemberFlags::PUBLIC,
            Some(body),
        )
        .unwrap();
    (builder.build(), method)
}

// Helper function to create an engine over the host fixture with the builtin facades
pub fn engine(config: EngineConfig) -> RuleEngine {
    RuleEngine::new(
        config,
        Arc::new(reference_set()),
        Arc::new(FacadeRegistry::builtin()),
    )
    .unwrap()
}
