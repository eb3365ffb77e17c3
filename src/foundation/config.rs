use crate::foundation::core::Color;
use crate::foundation::error::{SceneryError, SceneryResult};

/// Engine-wide knobs. Everything has a default; JSON input may omit any field.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Maximum number of offscreen surfaces kept by the render cache.
    pub cache_capacity: usize,
    pub scroll: ScrollConfig,
    /// Color the root surface is cleared to before each frame. `None` clears to transparent.
    pub clear_color: Option<Color>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_capacity: 30,
            scroll: ScrollConfig::default(),
            clear_color: None,
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(s: &str) -> SceneryResult<Self> {
        let cfg: Self =
            serde_json::from_str(s).map_err(|e| SceneryError::config(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> SceneryResult<()> {
        if self.cache_capacity == 0 {
            return Err(SceneryError::config("cacheCapacity must be >= 1"));
        }
        self.scroll.validate()
    }

    /// Apply `SCENERY_CACHE_CAPACITY` / `SCENERY_SCROLL_FRICTION` when set to sane values.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(n) = std::env::var("SCENERY_CACHE_CAPACITY")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|&n| n > 0)
        {
            self.cache_capacity = n;
        }
        if let Some(f) = std::env::var("SCENERY_SCROLL_FRICTION")
            .ok()
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|f| f.is_finite() && *f > 0.0)
        {
            self.scroll.friction = f;
        }
        self
    }
}

/// Scroll physics parameters.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScrollConfig {
    /// Fraction of velocity lost per millisecond of momentum.
    pub friction: f64,
    /// Momentum stops once |velocity| (px/ms) drops below this.
    pub min_velocity: f64,
    /// Page extent for paging mode; momentum snaps to multiples of it.
    pub paging: Option<f64>,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            friction: 0.005,
            min_velocity: 0.1,
            paging: None,
        }
    }
}

impl ScrollConfig {
    pub fn validate(&self) -> SceneryResult<()> {
        if !self.friction.is_finite() || self.friction <= 0.0 {
            return Err(SceneryError::config("scroll.friction must be > 0"));
        }
        if !self.min_velocity.is_finite() || self.min_velocity < 0.0 {
            return Err(SceneryError::config("scroll.minVelocity must be >= 0"));
        }
        if let Some(page) = self.paging
            && (!page.is_finite() || page <= 0.0)
        {
            return Err(SceneryError::config("scroll.paging must be > 0"));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/config.rs"]
mod tests;
