//! Host reference fixture shared by the integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use modscope::prelude::*;

const PUBLIC: MemberFlags = MemberFlags::PUBLIC;
const PUBLIC_STATIC: MemberFlags = MemberFlags::PUBLIC.union(MemberFlags::STATIC);

pub fn game(name: &str) -> TypeSig {
    TypeSig::named("Game", "Host", name)
}

pub fn framework(name: &str) -> TypeSig {
    TypeSig::named("Framework", "Host", name)
}

fn method(return_type: TypeSig, parameters: Vec<TypeSig>) -> MemberSignature {
    MemberSignature::method(return_type, parameters)
}

fn host_game() -> Result<Module> {
    let mut builder = ModuleBuilder::new("Game");
    let object = Some(TypeSig::object());

    let game_type = builder.define_type("Host", "Game", object.clone(), TypeFlags::PUBLIC);
    builder.define_field(game_type, "Version", TypeSig::string(), PUBLIC_STATIC)?;
    builder.define_method(game_type, "Exit", method(TypeSig::Void, vec![]), PUBLIC_STATIC, None)?;

    let graphics = builder.define_type("Host", "Graphics", object.clone(), TypeFlags::PUBLIC);
    builder.define_method(
        graphics,
        "DrawSprite",
        method(
            TypeSig::Void,
            vec![framework("Texture"), framework("Vector2"), framework("Color")],
        ),
        PUBLIC,
        None,
    )?;

    builder.define_type("Host", "Location", object.clone(), TypeFlags::PUBLIC);
    builder.define_type(
        "Host",
        "CollisionMask",
        Some(TypeSig::system("Enum")),
        TypeFlags::PUBLIC | TypeFlags::VALUE_TYPE,
    );
    builder.define_type("Host", "Character", object.clone(), TypeFlags::PUBLIC);

    let item = builder.define_type("Host", "Item", object.clone(), TypeFlags::PUBLIC);
    builder.define_constructor(item, vec![TypeSig::string(), TypeSig::int32()], PUBLIC, None)?;
    builder.define_method(
        item,
        "canBePlacedHere",
        method(
            TypeSig::boolean(),
            vec![game("Location"), framework("Vector2"), game("CollisionMask")],
        ),
        PUBLIC,
        None,
    )?;

    let utility = builder.define_type("Host", "Utility", object, TypeFlags::PUBLIC);
    builder.define_method(
        utility,
        "getAllCharacters",
        method(TypeSig::array_of(game("Character")), vec![TypeSig::boolean()]),
        PUBLIC_STATIC,
        None,
    )?;

    Ok(builder.build())
}

fn host_framework() -> Result<Module> {
    let mut builder = ModuleBuilder::new("Framework");
    let object = Some(TypeSig::object());
    let value_type = Some(TypeSig::system("ValueType"));
    let value_flags = TypeFlags::PUBLIC | TypeFlags::VALUE_TYPE;

    builder.define_type("Host", "Texture", object.clone(), TypeFlags::PUBLIC);
    builder.define_type("Host", "Vector2", value_type.clone(), value_flags);
    builder.define_type("Host", "SpriteSortMode", Some(TypeSig::system("Enum")), value_flags);
    builder.define_type("Host", "BlendState", object.clone(), TypeFlags::PUBLIC);

    let color = builder.define_type("Host", "Color", value_type, value_flags);
    builder.define_method(
        color,
        "get_White",
        method(framework("Color"), vec![]),
        PUBLIC_STATIC | MemberFlags::SPECIAL_NAME,
        None,
    )?;

    let sprite_batch = builder.define_type("Host", "SpriteBatch", object, TypeFlags::PUBLIC);
    builder.define_method(
        sprite_batch,
        "Begin",
        method(
            TypeSig::Void,
            vec![framework("SpriteSortMode"), framework("BlendState")],
        ),
        PUBLIC,
        None,
    )?;

    Ok(builder.build())
}

/// Returns the host reference set: the `Game` and `Framework` assemblies.
pub fn host() -> Result<ReferenceSet> {
    Ok(ReferenceSet::from_modules([host_game()?, host_framework()?]))
}

/// Returns an engine over the host with the builtin facades.
pub fn engine(config: EngineConfig) -> Result<RuleEngine> {
    RuleEngine::new(config, Arc::new(host()?), Arc::new(FacadeRegistry::builtin()))
}

/// Builds a mod whose single method `ModEntry.Run` has the given body.
pub fn mod_with_body(
    name: &str,
    body: impl FnOnce(&mut ModuleBuilder) -> MethodBody,
) -> Result<Module> {
    let mut builder = ModuleBuilder::new(name);
    let entry = builder.define_type(name, "ModEntry", Some(TypeSig::object()), TypeFlags::PUBLIC);
    let body = body(&mut builder);
    builder.define_method(
        entry,
        "Run",
        MemberSignature::method(TypeSig::Void, vec![]),
        PUBLIC_STATIC,
        Some(body),
    )?;
    Ok(builder.build())
}

/// A mod calling the removed two-argument `Graphics.DrawSprite`.
pub fn legacy_draw_mod(name: &str) -> Result<Module> {
    mod_with_body(name, |builder| {
        let draw = builder.member_ref(MemberDescriptor::method(
            game("Graphics"),
            "DrawSprite",
            method(TypeSig::Void, vec![framework("Texture"), framework("Vector2")]),
        ));
        MethodBodyBuilder::new()
            .ldnull()
            .ldnull()
            .ldnull()
            .callvirt(draw)
            .ret()
            .build()
    })
}

/// A mod reading `Game.version`, which the host renamed to `Game.Version`.
pub fn renamed_field_mod(name: &str) -> Result<Module> {
    mod_with_body(name, |builder| {
        let version = builder.member_ref(MemberDescriptor::static_field(
            game("Game"),
            "version",
            TypeSig::string(),
        ));
        MethodBodyBuilder::new().ldsfld(version).pop().ret().build()
    })
}
