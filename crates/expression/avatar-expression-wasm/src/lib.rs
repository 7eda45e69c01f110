use js_sys::Math;
use serde::Serialize;
use serde_wasm_bindgen as swb;
use wasm_bindgen::prelude::*;

use avatar_expression_core::{Config, Engine, ExpressionError, Frame};

/// Browser-facing handle around the expression engine.
#[wasm_bindgen]
pub struct AvatarExpression {
    core: Engine,
}

fn jsvalue_is_undefined_or_null(v: &JsValue) -> bool {
    v.is_undefined() || v.is_null()
}

fn to_js<T: Serialize + ?Sized>(value: &T, what: &str) -> Result<JsValue, JsError> {
    // Plain objects rather than JS Maps for the blend-shape dictionary.
    let serializer = swb::Serializer::json_compatible();
    value
        .serialize(&serializer)
        .map_err(|e| JsError::new(&format!("{what} error: {e}")))
}

fn rejected(e: ExpressionError) -> JsError {
    JsError::new(&e.to_string())
}

/// Parse a host config. Without an explicit `particle_seed` the particles are
/// seeded from `Math.random()` so each page load looks different.
fn parse_config(config: JsValue) -> Result<Config, JsError> {
    if jsvalue_is_undefined_or_null(&config) {
        return Ok(Config {
            particle_seed: random_seed(),
            ..Config::default()
        });
    }
    let raw: serde_json::Value =
        swb::from_value(config).map_err(|e| JsError::new(&format!("config error: {e}")))?;
    let seeded = raw.get("particle_seed").is_some();
    let mut cfg: Config =
        serde_json::from_value(raw).map_err(|e| JsError::new(&format!("config error: {e}")))?;
    if !seeded {
        cfg.particle_seed = random_seed();
    }
    Ok(cfg)
}

fn random_seed() -> u64 {
    let hi = (Math::random() * u32::MAX as f64) as u64;
    let lo = (Math::random() * u32::MAX as f64) as u64;
    (hi << 32) | lo
}

#[wasm_bindgen]
impl AvatarExpression {
    /// Create a new engine. Pass a (partial) config object or undefined/null for defaults.
    /// Example:
    ///   new AvatarExpression({ particle_counts: { rain: 400 } })
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<AvatarExpression, JsError> {
        console_error_panic_hook::set_once();
        Ok(AvatarExpression {
            core: Engine::new(parse_config(config)?),
        })
    }

    /// Throws on names outside neutral/happy/sad/surprised/thinking/angry.
    #[wasm_bindgen(js_name = set_emotion)]
    pub fn set_emotion(&mut self, name: &str) -> Result<(), JsError> {
        self.core.set_emotion(name).map_err(rejected)
    }

    #[wasm_bindgen(js_name = set_listening)]
    pub fn set_listening(&mut self, active: bool) {
        self.core.set_listening(active);
    }

    #[wasm_bindgen(js_name = start_speaking)]
    pub fn start_speaking(&mut self, text: Option<String>) {
        self.core.start_speaking(text.as_deref());
    }

    #[wasm_bindgen(js_name = stop_speaking)]
    pub fn stop_speaking(&mut self) {
        self.core.stop_speaking();
    }

    #[wasm_bindgen(js_name = enqueue_speech)]
    pub fn enqueue_speech(&mut self, text: &str) {
        self.core.enqueue_speech(text);
    }

    /// Throws on unknown modes; the weather is cleared in that case.
    #[wasm_bindgen(js_name = set_weather_mode)]
    pub fn set_weather_mode(&mut self, name: &str) -> Result<(), JsError> {
        self.core.set_weather_mode(name).map_err(rejected)
    }

    #[wasm_bindgen(js_name = set_animation_enabled)]
    pub fn set_animation_enabled(&mut self, enabled: bool) {
        self.core.set_animation_enabled(enabled);
    }

    #[wasm_bindgen(js_name = set_blink_enabled)]
    pub fn set_blink_enabled(&mut self, enabled: bool) {
        self.core.set_blink_enabled(enabled);
    }

    /// Advance one tick. Returns the Frame JSON.
    #[wasm_bindgen]
    pub fn tick(&mut self) -> Result<JsValue, JsError> {
        let frame: &Frame = self.core.tick();
        to_js(frame, "frame")
    }

    /// Feed elapsed host time (seconds). Returns the last Frame JSON, or null
    /// when no whole tick elapsed.
    #[wasm_bindgen]
    pub fn update(&mut self, dt: f64) -> Result<JsValue, JsError> {
        match self.core.update(dt) {
            Some(frame) => to_js(frame, "frame"),
            None => Ok(JsValue::NULL),
        }
    }

    #[wasm_bindgen(js_name = blend_shapes)]
    pub fn blend_shapes(&self) -> Result<JsValue, JsError> {
        to_js(&self.core.current_blend_shapes(), "blend shapes")
    }

    #[wasm_bindgen]
    pub fn particles(&self) -> Result<JsValue, JsError> {
        to_js(self.core.particle_system().particles(), "particles")
    }

    #[wasm_bindgen(js_name = camera_pose)]
    pub fn camera_pose(&self) -> Result<JsValue, JsError> {
        to_js(&self.core.camera_pose(), "camera pose")
    }

    #[wasm_bindgen(js_name = lightning_intensity)]
    pub fn lightning_intensity(&self) -> f32 {
        self.core.lightning_intensity()
    }

    /// Events raised by calls made since the last tick.
    #[wasm_bindgen(js_name = drain_events)]
    pub fn drain_events(&mut self) -> Result<JsValue, JsError> {
        to_js(&self.core.drain_events(), "events")
    }

    #[wasm_bindgen(js_name = current_tick)]
    pub fn current_tick(&self) -> f64 {
        self.core.now() as f64
    }
}

/// Numeric ABI version for compatibility checks at init.
#[wasm_bindgen]
pub fn abi_version() -> u32 {
    1
}
