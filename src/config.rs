use crate::error::{ParadeError, ParadeResult};

/// Tunables for the banner subsystem.
///
/// Everything here is a config-time constant, not a runtime negotiation:
/// `Default` carries the canonical values and a JSON document may override
/// individual fields.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AnimParams {
    /// Frames per sway cycle.
    pub frame_count: u32,
    /// Source sprite edge length in pixels.
    pub base_size: u32,
    /// Row (in source pixels) where the head ends and the body begins.
    pub head_split_row: u32,

    /// Entrance slide duration in milliseconds.
    pub entrance_ms: f64,
    /// Static display duration in milliseconds.
    pub display_ms: f64,
    /// Nod gesture duration in milliseconds.
    pub nod_ms: f64,
    /// Exit slide duration in milliseconds.
    pub exit_ms: f64,

    /// Head sway amplitude in radians.
    pub rotation_range: f64,
    /// Nod amplitude in radians.
    pub nod_strength: f64,
    /// Press-down travel in base-sprite pixels.
    pub press_down_strength: f64,
    /// Insertion travel in base-sprite pixels (derived quantity, see compositor).
    pub insertion_strength: f64,
    /// Extra head rotation at full press, in radians.
    pub insertion_angle: f64,
    /// Body compression at full press (fraction of body height).
    pub squash_strength: f64,

    /// Ready-sprite buffer capacity.
    pub queue_capacity: usize,
    /// Number of items in the collection; sprite indices are drawn from
    /// `[0, collection_size)`.
    pub collection_size: u32,
    /// Content-addressed image store; the sprite URL is this base followed by
    /// the index and `.png`.
    pub image_base_url: String,
}

impl Default for AnimParams {
    fn default() -> Self {
        Self {
            frame_count: 36,
            base_size: 28,
            head_split_row: 23,
            entrance_ms: 7500.0,
            display_ms: 5000.0,
            nod_ms: 800.0,
            exit_ms: 7500.0,
            rotation_range: 0.08,
            nod_strength: 0.15,
            press_down_strength: 2.0,
            insertion_strength: 1.0,
            insertion_angle: 0.12,
            squash_strength: 0.1,
            queue_capacity: 3,
            collection_size: 10_000,
            image_base_url: "https://nodemonkes.4everland.store/images/".to_string(),
        }
    }
}

impl AnimParams {
    /// Parse params from a JSON document; absent fields keep their defaults.
    pub fn from_json_str(s: &str) -> ParadeResult<Self> {
        let params: Self =
            serde_json::from_str(s).map_err(|e| ParadeError::serde(format!("anim params: {e}")))?;
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> ParadeResult<()> {
        if self.frame_count == 0 {
            return Err(ParadeError::validation("frame_count must be > 0"));
        }
        if self.base_size == 0 {
            return Err(ParadeError::validation("base_size must be > 0"));
        }
        if self.head_split_row > self.base_size {
            return Err(ParadeError::validation(
                "head_split_row must be <= base_size",
            ));
        }
        for (name, v) in [
            ("entrance_ms", self.entrance_ms),
            ("display_ms", self.display_ms),
            ("nod_ms", self.nod_ms),
            ("exit_ms", self.exit_ms),
        ] {
            if !v.is_finite() || v <= 0.0 {
                return Err(ParadeError::validation(format!(
                    "{name} must be finite and > 0"
                )));
            }
        }
        if self.queue_capacity == 0 {
            return Err(ParadeError::validation("queue_capacity must be > 0"));
        }
        if self.collection_size == 0 {
            return Err(ParadeError::validation("collection_size must be > 0"));
        }
        Ok(())
    }
}
