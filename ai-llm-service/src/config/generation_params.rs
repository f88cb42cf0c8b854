//! Per-request sampling settings.
//!
//! The chat UI exposes three sliders (max tokens, temperature, top-p). Their
//! bounds live here as [`SliderBounds`] so the server can both validate input
//! and describe the controls to the browser.

use serde::{Deserialize, Serialize};

use crate::error_handler::{
    ConfigError, Result, validate_range_f32, validate_stop_sequences,
};

/// Hard upper bound accepted for `max_new_tokens`.
pub const MAX_NEW_TOKENS_LIMIT: u32 = 4096;

/// Sampling settings for a single generate call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    /// Number of new tokens to generate.
    pub max_new_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
    /// Nucleus sampling cutoff.
    pub top_p: f32,
    /// Top-k cutoff, when the provider supports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    /// Sequences that end generation early.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stop: Vec<String>,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_new_tokens: 200,
            temperature: 0.7,
            top_p: 0.95,
            top_k: Some(50),
            stop: Vec::new(),
        }
    }
}

impl GenerationParams {
    /// Checks every field against the limits the backends accept.
    ///
    /// # Errors
    /// [`ConfigError::OutOfRange`] or [`ConfigError::InvalidStopSequence`]
    /// wrapped in [`crate::AiLlmError::Config`].
    pub fn validate(&self) -> Result<()> {
        if self.max_new_tokens == 0 || self.max_new_tokens > MAX_NEW_TOKENS_LIMIT {
            return Err(ConfigError::OutOfRange {
                field: "max_new_tokens",
                detail: "expected 1..=4096",
            }
            .into());
        }
        validate_range_f32("temperature", self.temperature, 0.0, 2.0)?;
        validate_range_f32("top_p", self.top_p, 0.0, 1.0)?;
        validate_stop_sequences(&self.stop)?;
        Ok(())
    }

    /// Returns a copy with `stop` extended by `extra`, skipping duplicates.
    pub fn with_stop<I, S>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for s in extra {
            let s = s.into();
            if !self.stop.contains(&s) {
                self.stop.push(s);
            }
        }
        self
    }
}

/// A single UI slider: inclusive range, step and initial value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Slider {
    pub minimum: f32,
    pub maximum: f32,
    pub step: f32,
    pub value: f32,
}

/// Bounds of the three sampling sliders shown next to the chat.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SliderBounds {
    pub max_tokens: Slider,
    pub temperature: Slider,
    pub top_p: Slider,
}

impl Default for SliderBounds {
    fn default() -> Self {
        Self {
            max_tokens: Slider {
                minimum: 64.0,
                maximum: 512.0,
                step: 32.0,
                value: 200.0,
            },
            temperature: Slider {
                minimum: 0.1,
                maximum: 2.0,
                step: 0.1,
                value: 0.7,
            },
            top_p: Slider {
                minimum: 0.1,
                maximum: 1.0,
                step: 0.05,
                value: 0.95,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AiLlmError;

    #[test]
    fn defaults_match_the_original_generate_call() {
        let p = GenerationParams::default();
        assert_eq!(p.max_new_tokens, 200);
        assert_eq!(p.top_k, Some(50));
        assert!((p.temperature - 0.7).abs() < f32::EPSILON);
        assert!((p.top_p - 0.95).abs() < f32::EPSILON);
        assert!(p.validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_values() {
        let zero_tokens = GenerationParams {
            max_new_tokens: 0,
            ..Default::default()
        };
        assert!(matches!(
            zero_tokens.validate(),
            Err(AiLlmError::Config(ConfigError::OutOfRange { field: "max_new_tokens", .. }))
        ));

        let hot = GenerationParams {
            temperature: 2.5,
            ..Default::default()
        };
        assert!(matches!(
            hot.validate(),
            Err(AiLlmError::Config(ConfigError::OutOfRange { field: "temperature", .. }))
        ));

        let nan = GenerationParams {
            top_p: f32::NAN,
            ..Default::default()
        };
        assert!(nan.validate().is_err());
    }

    #[test]
    fn rejects_empty_stop_sequence() {
        let p = GenerationParams::default().with_stop([""]);
        assert!(matches!(
            p.validate(),
            Err(AiLlmError::Config(ConfigError::InvalidStopSequence))
        ));
    }

    #[test]
    fn with_stop_skips_duplicates() {
        let p = GenerationParams::default()
            .with_stop(["\nUser:"])
            .with_stop(["\nUser:", "\nBot:"]);
        assert_eq!(p.stop, vec!["\nUser:".to_string(), "\nBot:".to_string()]);
    }

    #[test]
    fn slider_defaults_are_inside_their_ranges() {
        let b = SliderBounds::default();
        for s in [b.max_tokens, b.temperature, b.top_p] {
            assert!(s.minimum <= s.value && s.value <= s.maximum);
        }
    }
}
