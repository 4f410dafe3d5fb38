//! DJ effect rack.
//!
//! A fixed chain: filter -> delay -> reverb -> phaser -> chorus -> bitcrush
//! -> gate. The first five stages are rendered as glicol nodes appended to
//! the patch; bitcrush and gate have no glicol counterpart and run in the
//! `OutputStage` inside the audio callback.

use serde::Deserialize;
use std::fmt::Write;

/// Effect identifiers, in chain order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectKind {
    Filter,
    Delay,
    Reverb,
    Phaser,
    Chorus,
    Bitcrush,
    Gate,
}

impl EffectKind {
    pub const ALL: [EffectKind; 7] = [
        EffectKind::Filter,
        EffectKind::Delay,
        EffectKind::Reverb,
        EffectKind::Phaser,
        EffectKind::Chorus,
        EffectKind::Bitcrush,
        EffectKind::Gate,
    ];

    pub fn name(self) -> &'static str {
        match self {
            EffectKind::Filter => "filter",
            EffectKind::Delay => "delay",
            EffectKind::Reverb => "reverb",
            EffectKind::Phaser => "phaser",
            EffectKind::Chorus => "chorus",
            EffectKind::Bitcrush => "bitcrush",
            EffectKind::Gate => "gate",
        }
    }

    /// Whether the stage runs in the audio callback rather than in glicol
    pub fn is_output_stage(self) -> bool {
        matches!(self, EffectKind::Bitcrush | EffectKind::Gate)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    Lowpass,
    Highpass,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FilterParams {
    pub enabled: bool,
    pub kind: FilterKind,
    /// Cutoff (Hz, 20-20000)
    pub cutoff_hz: f32,
    /// Resonance (0.1-10)
    pub q: f32,
}

impl Default for FilterParams {
    fn default() -> Self {
        Self {
            enabled: true,
            kind: FilterKind::Lowpass,
            cutoff_hz: 8000.0,
            q: 1.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DelayParams {
    pub enabled: bool,
    /// Delay time (ms, 10-2000)
    pub time_ms: f32,
    /// Wet level (0-1)
    pub wet: f32,
}

impl Default for DelayParams {
    fn default() -> Self {
        Self {
            enabled: false,
            time_ms: 375.0,
            wet: 0.35,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReverbParams {
    pub enabled: bool,
    /// Plate mix (0-1)
    pub mix: f32,
}

impl Default for ReverbParams {
    fn default() -> Self {
        Self {
            enabled: true,
            mix: 0.15,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PhaserParams {
    pub enabled: bool,
    /// LFO rate (Hz, 0.05-10)
    pub rate_hz: f32,
    /// Allpass gain (0-0.95)
    pub depth: f32,
}

impl Default for PhaserParams {
    fn default() -> Self {
        Self {
            enabled: false,
            rate_hz: 0.4,
            depth: 0.6,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChorusParams {
    pub enabled: bool,
    /// LFO rate (Hz, 0.05-5)
    pub rate_hz: f32,
    /// Delay modulation depth (ms, 0-10)
    pub depth_ms: f32,
    /// Wet level (0-1)
    pub wet: f32,
}

impl Default for ChorusParams {
    fn default() -> Self {
        Self {
            enabled: false,
            rate_hz: 0.8,
            depth_ms: 4.0,
            wet: 0.5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BitcrushParams {
    pub enabled: bool,
    /// Output bit depth (1-16)
    pub bits: u8,
}

impl Default for BitcrushParams {
    fn default() -> Self {
        Self {
            enabled: false,
            bits: 6,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GateParams {
    pub enabled: bool,
    /// Envelope threshold below which output is muted (0-1)
    pub threshold: f32,
}

impl Default for GateParams {
    fn default() -> Self {
        Self {
            enabled: false,
            threshold: 0.05,
        }
    }
}

/// The full effect chain with parameter setters
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EffectRack {
    pub filter: FilterParams,
    pub delay: DelayParams,
    pub reverb: ReverbParams,
    pub phaser: PhaserParams,
    pub chorus: ChorusParams,
    pub bitcrush: BitcrushParams,
    pub gate: GateParams,
}

/// Delay centre of the chorus LFO (ms)
const CHORUS_BASE_MS: f32 = 12.0;

impl EffectRack {
    pub fn is_enabled(&self, kind: EffectKind) -> bool {
        match kind {
            EffectKind::Filter => self.filter.enabled,
            EffectKind::Delay => self.delay.enabled,
            EffectKind::Reverb => self.reverb.enabled,
            EffectKind::Phaser => self.phaser.enabled,
            EffectKind::Chorus => self.chorus.enabled,
            EffectKind::Bitcrush => self.bitcrush.enabled,
            EffectKind::Gate => self.gate.enabled,
        }
    }

    pub fn set_enabled(&mut self, kind: EffectKind, enabled: bool) {
        match kind {
            EffectKind::Filter => self.filter.enabled = enabled,
            EffectKind::Delay => self.delay.enabled = enabled,
            EffectKind::Reverb => self.reverb.enabled = enabled,
            EffectKind::Phaser => self.phaser.enabled = enabled,
            EffectKind::Chorus => self.chorus.enabled = enabled,
            EffectKind::Bitcrush => self.bitcrush.enabled = enabled,
            EffectKind::Gate => self.gate.enabled = enabled,
        }
    }

    /// Flip an effect on/off, returning the new state
    pub fn toggle(&mut self, kind: EffectKind) -> bool {
        let enabled = !self.is_enabled(kind);
        self.set_enabled(kind, enabled);
        enabled
    }

    pub fn set_filter_kind(&mut self, kind: FilterKind) {
        self.filter.kind = kind;
    }

    pub fn set_filter_cutoff(&mut self, hz: f32) {
        self.filter.cutoff_hz = hz.clamp(20.0, 20000.0);
    }

    pub fn set_filter_q(&mut self, q: f32) {
        self.filter.q = q.clamp(0.1, 10.0);
    }

    pub fn set_delay_time(&mut self, ms: f32) {
        self.delay.time_ms = ms.clamp(10.0, 2000.0);
    }

    pub fn set_delay_wet(&mut self, wet: f32) {
        self.delay.wet = wet.clamp(0.0, 1.0);
    }

    pub fn set_reverb_mix(&mut self, mix: f32) {
        self.reverb.mix = mix.clamp(0.0, 1.0);
    }

    pub fn set_phaser_rate(&mut self, hz: f32) {
        self.phaser.rate_hz = hz.clamp(0.05, 10.0);
    }

    pub fn set_phaser_depth(&mut self, depth: f32) {
        self.phaser.depth = depth.clamp(0.0, 0.95);
    }

    pub fn set_chorus_rate(&mut self, hz: f32) {
        self.chorus.rate_hz = hz.clamp(0.05, 5.0);
    }

    pub fn set_chorus_depth(&mut self, ms: f32) {
        self.chorus.depth_ms = ms.clamp(0.0, 10.0);
    }

    pub fn set_chorus_wet(&mut self, wet: f32) {
        self.chorus.wet = wet.clamp(0.0, 1.0);
    }

    pub fn set_bitcrush_bits(&mut self, bits: u8) {
        self.bitcrush.bits = bits.clamp(1, 16);
    }

    pub fn set_gate_threshold(&mut self, threshold: f32) {
        self.gate.threshold = threshold.clamp(0.0, 1.0);
    }

    /// Clamp every parameter into its documented range (used after loading config)
    pub fn sanitize(&mut self) {
        self.set_filter_cutoff(self.filter.cutoff_hz);
        self.set_filter_q(self.filter.q);
        self.set_delay_time(self.delay.time_ms);
        self.set_delay_wet(self.delay.wet);
        self.set_reverb_mix(self.reverb.mix);
        self.set_phaser_rate(self.phaser.rate_hz);
        self.set_phaser_depth(self.phaser.depth);
        self.set_chorus_rate(self.chorus.rate_hz);
        self.set_chorus_depth(self.chorus.depth_ms);
        self.set_chorus_wet(self.chorus.wet);
        self.set_bitcrush_bits(self.bitcrush.bits);
        self.set_gate_threshold(self.gate.threshold);
    }

    /// Append the glicol stages of the chain reading from `input`.
    ///
    /// Returns the reference name carrying the processed signal.
    pub fn render_chain(&self, input: &str, code: &mut String) -> String {
        let mut last = input.to_string();

        if self.filter.enabled {
            let node = match self.filter.kind {
                FilterKind::Lowpass => "lpf",
                FilterKind::Highpass => "hpf",
            };
            let _ = writeln!(
                code,
                "~fx_filter: {} >> {} {:.1} {:.2}",
                last, node, self.filter.cutoff_hz, self.filter.q
            );
            last = "~fx_filter".to_string();
        }

        if self.delay.enabled {
            let _ = writeln!(
                code,
                "~fx_delay_wet: {} >> delayms {:.1} >> mul {:.3}",
                last, self.delay.time_ms, self.delay.wet
            );
            let _ = writeln!(code, "~fx_delay: mix {} ~fx_delay_wet", last);
            last = "~fx_delay".to_string();
        }

        if self.reverb.enabled {
            let _ = writeln!(code, "~fx_reverb: {} >> plate {:.3}", last, self.reverb.mix);
            last = "~fx_reverb".to_string();
        }

        if self.phaser.enabled {
            // Allpass delay swept between 1 and 5 ms
            let _ = writeln!(
                code,
                "~phaser_lfo: sin {:.3} >> mul 2.0 >> add 3.0",
                self.phaser.rate_hz
            );
            let _ = writeln!(
                code,
                "~fx_phaser_wet: {} >> apfmsgain ~phaser_lfo {:.3}",
                last, self.phaser.depth
            );
            let _ = writeln!(code, "~fx_phaser: mix {} ~fx_phaser_wet", last);
            last = "~fx_phaser".to_string();
        }

        if self.chorus.enabled {
            let _ = writeln!(
                code,
                "~chorus_lfo: sin {:.3} >> mul {:.3} >> add {:.1}",
                self.chorus.rate_hz, self.chorus.depth_ms, CHORUS_BASE_MS
            );
            let _ = writeln!(
                code,
                "~fx_chorus_wet: {} >> delayms ~chorus_lfo >> mul {:.3}",
                last, self.chorus.wet
            );
            let _ = writeln!(code, "~fx_chorus: mix {} ~fx_chorus_wet", last);
            last = "~fx_chorus".to_string();
        }

        last
    }

    /// Settings for the callback-side stages
    pub fn output_stage(&self) -> OutputStage {
        OutputStage {
            bits: self.bitcrush.enabled.then_some(self.bitcrush.bits),
            gate_threshold: self.gate.enabled.then_some(self.gate.threshold),
            envelope: 0.0,
        }
    }
}

/// Envelope follower release per sample for the gate
const GATE_RELEASE: f32 = 0.999;

/// Per-sample stages applied in the audio callback, plus the safety limiter
#[derive(Debug, Clone, Default)]
pub struct OutputStage {
    bits: Option<u8>,
    gate_threshold: Option<f32>,
    envelope: f32,
}

impl OutputStage {
    /// Adopt new settings while keeping the gate envelope
    pub fn update_from(&mut self, other: &OutputStage) {
        self.bits = other.bits;
        self.gate_threshold = other.gate_threshold;
    }

    /// Process one stereo frame
    pub fn process(&mut self, left: f32, right: f32, limit: f32) -> (f32, f32) {
        let (mut l, mut r) = (left, right);

        if let Some(bits) = self.bits {
            let steps = 2f32.powi(bits as i32 - 1);
            l = (l * steps).round() / steps;
            r = (r * steps).round() / steps;
        }

        if let Some(threshold) = self.gate_threshold {
            let level = l.abs().max(r.abs());
            self.envelope = level.max(self.envelope * GATE_RELEASE);
            if self.envelope < threshold {
                l = 0.0;
                r = 0.0;
            }
        }

        (l.clamp(-limit, limit), r.clamp(-limit, limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setters_clamp() {
        let mut rack = EffectRack::default();
        rack.set_filter_cutoff(50_000.0);
        assert_eq!(rack.filter.cutoff_hz, 20000.0);
        rack.set_delay_wet(-1.0);
        assert_eq!(rack.delay.wet, 0.0);
        rack.set_phaser_depth(2.0);
        assert_eq!(rack.phaser.depth, 0.95);
        rack.set_bitcrush_bits(0);
        assert_eq!(rack.bitcrush.bits, 1);
    }

    #[test]
    fn test_disabled_chain_passes_input() {
        let mut rack = EffectRack::default();
        for kind in EffectKind::ALL {
            rack.set_enabled(kind, false);
        }
        let mut code = String::new();
        assert_eq!(rack.render_chain("~bus", &mut code), "~bus");
        assert!(code.is_empty());
    }

    #[test]
    fn test_chain_order() {
        let mut rack = EffectRack::default();
        for kind in EffectKind::ALL {
            rack.set_enabled(kind, true);
        }
        rack.set_filter_kind(FilterKind::Highpass);

        let mut code = String::new();
        let last = rack.render_chain("~bus", &mut code);
        assert_eq!(last, "~fx_chorus");

        let pos = |needle: &str| code.find(needle).unwrap();
        assert!(code.contains("~fx_filter: ~bus >> hpf 8000.0 1.00"));
        assert!(pos("~fx_filter:") < pos("~fx_delay:"));
        assert!(pos("~fx_delay:") < pos("~fx_reverb:"));
        assert!(pos("~fx_reverb:") < pos("~fx_phaser:"));
        assert!(pos("~fx_phaser:") < pos("~fx_chorus:"));
        assert!(code.contains("~fx_reverb: ~fx_delay >> plate"));
    }

    #[test]
    fn test_toggle() {
        let mut rack = EffectRack::default();
        assert!(!rack.is_enabled(EffectKind::Delay));
        assert!(rack.toggle(EffectKind::Delay));
        assert!(rack.is_enabled(EffectKind::Delay));
        assert!(!rack.toggle(EffectKind::Delay));
    }

    #[test]
    fn test_output_stage_limiter() {
        let mut stage = OutputStage::default();
        assert_eq!(stage.process(0.9, -0.9, 0.5), (0.5, -0.5));
        assert_eq!(stage.process(0.25, 0.1, 0.5), (0.25, 0.1));
    }

    #[test]
    fn test_bitcrush_quantizes() {
        let mut rack = EffectRack::default();
        rack.set_enabled(EffectKind::Bitcrush, true);
        rack.set_bitcrush_bits(2);
        let mut stage = rack.output_stage();
        // 2 bits -> steps of 0.5
        let (l, r) = stage.process(0.3, -0.2, 1.0);
        assert_eq!(l, 0.5);
        assert_eq!(r, 0.0);
    }

    #[test]
    fn test_gate_mutes_quiet_signal() {
        let mut rack = EffectRack::default();
        rack.set_enabled(EffectKind::Gate, true);
        rack.set_gate_threshold(0.2);
        let mut stage = rack.output_stage();
        assert_eq!(stage.process(0.05, 0.05, 1.0), (0.0, 0.0));
        assert_eq!(stage.process(0.4, 0.3, 1.0), (0.4, 0.3));
        // Envelope holds the gate open briefly after a loud sample
        assert_eq!(stage.process(0.05, 0.05, 1.0), (0.05, 0.05));
    }

    #[test]
    fn test_output_stage_kinds() {
        assert!(EffectKind::Gate.is_output_stage());
        assert!(!EffectKind::Reverb.is_output_stage());
    }
}
