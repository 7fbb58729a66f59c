//! Benchmarks for scanning mod modules.
//!
//! - A single module with a mix of compatible, rewritable and broken references
//! - A batch of modules scanned in parallel

extern crate modscope;

use std::{hint::black_box, sync::Arc};

use criterion::{criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use modscope::prelude::*;

const PUBLIC_STATIC: MemberFlags = MemberFlags::PUBLIC.union(MemberFlags::STATIC);

fn game(name: &str) -> TypeSig {
    TypeSig::named("Game", "Host", name)
}

fn framework(name: &str) -> TypeSig {
    TypeSig::named("Framework", "Host", name)
}

/// A host with `Game.Exit()`, `Game.Version` and the three-argument `Graphics.DrawSprite`.
fn host() -> ReferenceSet {
    let mut game_module = ModuleBuilder::new("Game");
    let game_type = game_module.define_type("Host", "Game", None, TypeFlags::PUBLIC);
    game_module
        .define_field(game_type, "Version", TypeSig::string(), PUBLIC_STATIC)
        .unwrap();
    game_module
        .define_method(
            game_type,
            "Exit",
            MemberSignature::method(TypeSig::Void, vec![]),
            PUBLIC_STATIC,
            None,
        )
        .unwrap();
    let graphics = game_module.define_type("Host", "Graphics", None, TypeFlags::PUBLIC);
    game_module
        .define_method(
            graphics,
            "DrawSprite",
            MemberSignature::method(
                TypeSig::Void,
                vec![framework("Texture"), framework("Vector2"), framework("Color")],
            ),
            MemberFlags::PUBLIC,
            None,
        )
        .unwrap();

    let mut framework_module = ModuleBuilder::new("Framework");
    for name in ["Texture", "Vector2"] {
        framework_module.define_type("Host", name, None, TypeFlags::PUBLIC);
    }
    let color = framework_module.define_type("Host", "Color", None, TypeFlags::PUBLIC);
    framework_module
        .define_method(
            color,
            "get_White",
            MemberSignature::method(framework("Color"), vec![]),
            PUBLIC_STATIC | MemberFlags::SPECIAL_NAME,
            None,
        )
        .unwrap();

    ReferenceSet::from_modules([game_module.build(), framework_module.build()])
}

fn graphics_facade_only() -> FacadeRegistry {
    let builtin = FacadeRegistry::builtin();
    let graphics = builtin
        .facades()
        .iter()
        .find(|facade| facade.name == "GraphicsFacade")
        .cloned()
        .unwrap();
    FacadeRegistry::builder().facade(graphics).build().unwrap()
}

/// A mod with `methods` methods, each calling compatible, legacy and broken members.
fn sample_mod(name: &str, methods: usize) -> Module {
    let mut builder = ModuleBuilder::new(name);
    let entry = builder.define_type(name, "ModEntry", None, TypeFlags::PUBLIC);
    let exit = builder.member_ref(MemberDescriptor::static_method(
        game("Game"),
        "Exit",
        MemberSignature::method(TypeSig::Void, vec![]),
    ));
    let draw = builder.member_ref(MemberDescriptor::method(
        game("Graphics"),
        "DrawSprite",
        MemberSignature::method(TypeSig::Void, vec![framework("Texture"), framework("Vector2")]),
    ));
    let version = builder.member_ref(MemberDescriptor::static_field(
        game("Game"),
        "version",
        TypeSig::string(),
    ));

    for index in 0..methods {
        let body = MethodBodyBuilder::new()
            .local(game("Graphics"))
            .ldnull()
            .ldnull()
            .ldnull()
            .callvirt(draw)
            .ldsfld(version)
            .pop()
            .call(exit)
            .ret()
            .build();
        builder
            .define_method(
                entry,
                format!("Method{index}"),
                MemberSignature::method(TypeSig::Void, vec![]),
                PUBLIC_STATIC,
                Some(body),
            )
            .unwrap();
    }
    builder.build()
}

fn bench_single_module(c: &mut Criterion) {
    let engine = RuleEngine::new(
        EngineConfig::default(),
        Arc::new(host()),
        Arc::new(graphics_facade_only()),
    )
    .unwrap();
    let module = sample_mod("Bench", 200);

    let mut group = c.benchmark_group("engine_single");
    group.throughput(Throughput::Elements(200));
    group.bench_function("process_200_methods", |b| {
        b.iter_batched(
            || module.clone(),
            |mut module| black_box(engine.process(&mut module).unwrap()),
            BatchSize::SmallInput,
        );
    });
    group.finish();
}

fn bench_parallel_batch(c: &mut Criterion) {
    let engine = RuleEngine::new(
        EngineConfig::default(),
        Arc::new(host()),
        Arc::new(graphics_facade_only()),
    )
    .unwrap();
    let modules: Vec<Module> = (0..64)
        .map(|index| sample_mod(&format!("Bench{index}"), 20))
        .collect();

    let mut group = c.benchmark_group("engine_parallel");
    group.throughput(Throughput::Elements(64));
    group.bench_function("process_all_64_modules", |b| {
        b.iter_batched(
            || modules.clone(),
            |mut modules| black_box(engine.process_all(&mut modules)),
            BatchSize::LargeInput,
        );
    });
    group.finish();
}

criterion_group!(benches, bench_single_module, bench_parallel_batch);
criterion_main!(benches);
