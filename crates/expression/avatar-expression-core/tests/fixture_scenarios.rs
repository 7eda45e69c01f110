use avatar_expression_core::{Command, Config, Emotion, Engine, WeatherMode};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct Scenario {
    #[allow(dead_code)]
    description: String,
    #[serde(default)]
    config: Option<Config>,
    steps: Vec<Step>,
}

#[derive(Debug, Deserialize)]
struct Step {
    #[serde(default)]
    commands: Vec<Command>,
    #[serde(default)]
    ticks: u32,
    #[serde(default)]
    expect: Expect,
}

#[derive(Debug, Default, Deserialize)]
struct Expect {
    emotion: Option<Emotion>,
    listening: Option<bool>,
    speaking: Option<bool>,
    blink: Option<bool>,
    active_keys: Option<Vec<String>>,
    weather: Option<WeatherMode>,
    particles: Option<usize>,
    rejected: Option<bool>,
}

fn run(name: &str) {
    let scenario: Scenario = avatar_expression_fixtures::scenarios::load(name)
        .unwrap_or_else(|e| panic!("load scenario {name}: {e:#}"));
    let mut engine = Engine::new(scenario.config.unwrap_or_default());

    for (i, step) in scenario.steps.into_iter().enumerate() {
        let mut rejected = false;
        for command in step.commands {
            rejected |= engine.apply(command).is_err();
        }
        for _ in 0..step.ticks {
            engine.tick();
        }

        let at = format!("{name} step {i} (tick {})", engine.now());
        let state = engine.state();
        let e = step.expect;
        if let Some(emotion) = e.emotion {
            assert_eq!(state.emotion, emotion, "{at}: emotion");
        }
        if let Some(listening) = e.listening {
            assert_eq!(state.presence.listening, listening, "{at}: listening");
        }
        if let Some(speaking) = e.speaking {
            assert_eq!(state.presence.speaking, speaking, "{at}: speaking");
        }
        if let Some(blink) = e.blink {
            assert_eq!(state.blink, blink, "{at}: blink");
        }
        if let Some(mut expected) = e.active_keys {
            expected.sort();
            let shapes = engine.current_blend_shapes();
            let mut active: Vec<String> = shapes.active_keys().map(str::to_string).collect();
            active.sort();
            assert_eq!(active, expected, "{at}: active keys");
        }
        if let Some(mode) = e.weather {
            assert_eq!(engine.particle_system().mode(), mode, "{at}: weather");
        }
        if let Some(count) = e.particles {
            assert_eq!(engine.particles().len(), count, "{at}: particle count");
        }
        if let Some(expected) = e.rejected {
            assert_eq!(rejected, expected, "{at}: rejected");
        }
    }
}

/// it should walk "hello" and reach 'l' halfway through
#[test]
fn scenario_hello_speech() {
    run("hello-speech");
}

#[test]
fn scenario_listening_forces_emotion() {
    run("listening-forces-emotion");
}

#[test]
fn scenario_invalid_emotion() {
    run("invalid-emotion");
}

#[test]
fn scenario_stop_speaking() {
    run("stop-speaking");
}

#[test]
fn scenario_speech_queue() {
    run("speech-queue");
}

#[test]
fn scenario_blink_pulse() {
    run("blink-pulse");
}

#[test]
fn scenario_weather_modes() {
    run("weather-modes");
}

/// it should have a runner for every scenario in the manifest
#[test]
fn every_scenario_is_covered() {
    let covered = [
        "blink-pulse",
        "hello-speech",
        "invalid-emotion",
        "listening-forces-emotion",
        "speech-queue",
        "stop-speaking",
        "weather-modes",
    ];
    assert_eq!(avatar_expression_fixtures::scenarios::keys(), covered);
}

/// it should accept partial host configs and fill the rest from defaults
#[test]
fn fixture_configs_parse() {
    let cfg: Config = avatar_expression_fixtures::configs::load("host-partial").unwrap();
    assert_eq!(cfg.tick_rate_hz, 30);
    assert_eq!(cfg.particle_counts.rain, 250);
    assert_eq!(cfg.particle_counts.snow, Config::default().particle_counts.snow);

    let cfg: Config =
        avatar_expression_fixtures::configs::load("viseme-explicit-neutral").unwrap();
    let engine = Engine::new(cfg);
    let shapes = engine.current_blend_shapes();
    assert_eq!(shapes.get("neutral"), 1.0);
    assert!(shapes.contains_key("a"));
}
