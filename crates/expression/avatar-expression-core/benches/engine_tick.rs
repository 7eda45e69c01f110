use avatar_expression_core::{Command, Config, Engine};
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};

fn speaking_engine(weather: &str) -> Engine {
    let mut engine = Engine::new(Config::default());
    engine.set_weather_mode(weather).unwrap();
    engine.start_speaking(Some("the quick brown fox jumps over the lazy dog"));
    engine
}

fn bench_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine_tick");
    for weather in ["none", "snow", "rain"] {
        group.bench_function(weather, |b| {
            let mut engine = speaking_engine(weather);
            b.iter(|| black_box(engine.tick().blend_shapes.len()))
        });
    }
    group.finish();
}

fn bench_weather_switch(c: &mut Criterion) {
    c.bench_function("set_weather_mode_rain", |b| {
        b.iter_batched(
            || Engine::new(Config::default()),
            |mut engine| {
                engine
                    .apply(Command::SetWeatherMode {
                        name: "rain".into(),
                    })
                    .unwrap();
                black_box(engine.particles().len())
            },
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, bench_tick, bench_weather_switch);
criterion_main!(benches);
