//! Application state and the winit event loop handler.
//!
//! Each frame: drain input events, advance the music clock, run microphone
//! detection against the new bar position, rebuild the glicol patch when
//! needed, analyze the output, upload uniforms, and draw the current gallery
//! shader.

use crossbeam_channel::{Receiver, Sender};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::ActiveEventLoop,
    keyboard::{KeyCode, ModifiersState, PhysicalKey},
    window::{Window, WindowId},
};

use crate::audio::{render_patch, AudioBands, AudioSystem, EffectKind, EffectRack, MicInput, PatchInputs};
use crate::config::Settings;
use crate::control::{ColorAdjust, Command, CueAction, CueBank, Scene};
use crate::error::{Error, Result};
use crate::input::{
    console, BeatDetector, BeatHit, BeatRecorder, CommandDispatcher, FaceMapper, HandMapper,
    InputEvent, OscListener, PitchDetector, PitchHold,
};
use crate::music::{theory::note_name, DrumPattern, MusicEngine};
use crate::params::{audio_constants::WAVEFORM_LEN, RecordingConfig, MAX_ROOT_MIDI, MIN_ROOT_MIDI};
use crate::rendering::{RenderSystem, Uniforms};
use crate::shaders::ShaderGallery;

/// Minimum time between two patch swaps (continuous controls fire every frame)
const PATCH_INTERVAL_S: f64 = 0.05;

/// Consecutive identical pitch estimates before the key follows the voice
const PITCH_HOLD_FRAMES: u32 = 30;

/// Crossfader/color step for keyboard nudges
const NUDGE: f32 = 0.1;

/// Keyboard binding table. Relative controls step from the current
/// crossfader position and tonic.
pub fn key_command(key: KeyCode, shift: bool, crossfader: f32, root_midi: u8) -> Option<Command> {
    let cue = |slot: usize| {
        if shift {
            Command::StoreCue(slot)
        } else {
            Command::TriggerCue(slot)
        }
    };
    let command = match key {
        KeyCode::Space => Command::TogglePlay,
        KeyCode::ArrowRight => Command::NextShader,
        KeyCode::ArrowLeft => Command::PreviousShader,
        KeyCode::ArrowUp => Command::NudgeTempo(5.0),
        KeyCode::ArrowDown => Command::NudgeTempo(-5.0),
        KeyCode::KeyR => Command::RandomShader,
        KeyCode::KeyM => Command::NextMode,
        KeyCode::KeyP => Command::NextPlayback,
        KeyCode::KeyT => Command::RestartPhrase,
        KeyCode::PageUp => {
            let up = root_midi.saturating_add(12);
            return (up <= MAX_ROOT_MIDI).then_some(Command::SetRoot(up));
        }
        KeyCode::PageDown => {
            let down = root_midi.saturating_sub(12);
            return (root_midi >= MIN_ROOT_MIDI + 12).then_some(Command::SetRoot(down));
        }
        KeyCode::Digit1 => cue(0),
        KeyCode::Digit2 => cue(1),
        KeyCode::Digit3 => cue(2),
        KeyCode::Digit4 => cue(3),
        KeyCode::KeyF => Command::ToggleEffect(EffectKind::Filter),
        KeyCode::KeyD => Command::ToggleEffect(EffectKind::Delay),
        KeyCode::KeyV => Command::ToggleEffect(EffectKind::Reverb),
        KeyCode::KeyH => Command::ToggleEffect(EffectKind::Phaser),
        KeyCode::KeyC => Command::ToggleEffect(EffectKind::Chorus),
        KeyCode::KeyB => Command::ToggleEffect(EffectKind::Bitcrush),
        KeyCode::KeyG => Command::ToggleEffect(EffectKind::Gate),
        KeyCode::Digit0 => Command::AllEffectsOff,
        KeyCode::BracketLeft => Command::SetCrossfader((crossfader - NUDGE).clamp(0.0, 1.0)),
        KeyCode::BracketRight => Command::SetCrossfader((crossfader + NUDGE).clamp(0.0, 1.0)),
        KeyCode::Comma => Command::NudgeHue(-NUDGE),
        KeyCode::Period => Command::NudgeHue(NUDGE),
        KeyCode::Minus => Command::NudgeBrightness(-NUDGE),
        KeyCode::Equal => Command::NudgeBrightness(NUDGE),
        KeyCode::Semicolon => Command::NudgeSaturation(-NUDGE),
        KeyCode::Quote => Command::NudgeSaturation(NUDGE),
        KeyCode::Backspace => Command::ResetColor,
        KeyCode::KeyK => Command::RecordBeat,
        KeyCode::KeyJ => Command::ClearBeat,
        KeyCode::KeyN => Command::DefaultBeat,
        KeyCode::Slash => Command::Help,
        _ => return None,
    };
    Some(command)
}

/// Microphone capture with its detectors
struct MicChain {
    input: MicInput,
    beats: BeatDetector,
    pitch: PitchDetector,
    buffer: Vec<f32>,
    hold: PitchHold,
}

/// Main application state
pub struct App {
    settings: Settings,
    recording: Option<RecordingConfig>,

    // Window and rendering
    window: Option<Arc<Window>>,
    render_system: Option<RenderSystem>,
    gallery: ShaderGallery,
    color: ColorAdjust,

    // Sound
    audio: Option<AudioSystem>,
    music: MusicEngine,
    effects: EffectRack,
    drums: DrumPattern,
    crossfader: f32,
    patch_dirty: bool,
    last_patch_s: f64,
    bands: AudioBands,

    // Inputs
    events: Receiver<InputEvent>,
    _osc: Option<OscListener>,
    dispatcher: CommandDispatcher,
    hand: HandMapper,
    face: FaceMapper,
    mic: Option<MicChain>,
    beat_recorder: BeatRecorder,
    modifiers: ModifiersState,
    cues: CueBank,
    rng: StdRng,

    // Time tracking
    start_time: Instant,
    frame_count: usize,
    title_dirty: bool,

    /// Fatal startup error reported after the loop exits
    error: Option<Error>,
}

impl App {
    pub fn new(settings: Settings, recording: Option<RecordingConfig>) -> Self {
        let mut gallery = ShaderGallery::with_builtins();
        if let Some(dir) = &settings.render.shader_dir {
            match gallery.load_dir(dir) {
                Ok(n) => info!("Loaded {} custom shaders from {}", n, dir.display()),
                Err(e) => warn!("Custom shaders unavailable ({}): {}", dir.display(), e),
            }
        }
        if let Some(name) = &settings.render.initial_shader {
            match gallery.find(name) {
                Some(index) => {
                    gallery.select(index);
                }
                None => warn!("Unknown shader '{}', starting with {}", name, gallery.names().next().unwrap_or("none")),
            }
        }

        let (tx, events) = crossbeam_channel::unbounded();
        let osc = start_listeners(&settings, tx);
        let dispatcher = CommandDispatcher::new(gallery.names());

        let mut effects = settings.effects.clone();
        effects.sanitize();

        Self {
            music: MusicEngine::new(settings.music.clone()),
            hand: HandMapper::new(&settings.input),
            face: FaceMapper::new(&settings.input),
            rng: StdRng::seed_from_u64(settings.music.seed),
            settings,
            recording,
            window: None,
            render_system: None,
            gallery,
            color: ColorAdjust::default(),
            audio: None,
            effects,
            drums: DrumPattern::default(),
            crossfader: 0.5,
            patch_dirty: true,
            last_patch_s: f64::NEG_INFINITY,
            bands: AudioBands::default(),
            events,
            _osc: osc,
            dispatcher,
            mic: None,
            beat_recorder: BeatRecorder::new(),
            modifiers: ModifiersState::empty(),
            cues: CueBank::new(),
            start_time: Instant::now(),
            frame_count: 0,
            title_dirty: true,
            error: None,
        }
    }

    /// Error that stopped the app during startup, if any
    pub fn take_error(&mut self) -> Option<Error> {
        self.error.take()
    }

    fn initialize(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let window_attributes = Window::default_attributes()
            .with_title("vibescope")
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.settings.render.window_width,
                self.settings.render.window_height,
            ));
        let window = Arc::new(
            event_loop
                .create_window(window_attributes)
                .map_err(|e| Error::Gpu(format!("Failed to create window: {}", e)))?,
        );

        let render_system = pollster::block_on(RenderSystem::new(
            Arc::clone(&window),
            self.settings.render.vsync,
            self.recording.clone(),
        ))?;

        // Audio is optional: without it the shaders still run on silence
        let patch = self.render_patch();
        match AudioSystem::new(self.settings.audio.clone(), &patch, self.recording.as_ref()) {
            Ok(audio) => {
                audio.set_output_stage(&self.effects.output_stage());
                audio.set_playing(self.music.is_playing());
                self.audio = Some(audio);
                self.patch_dirty = false;
            }
            Err(e) => warn!("Audio disabled: {}", e),
        }

        if self.settings.mic.enabled {
            match MicInput::open() {
                Ok(input) => {
                    let sr = input.sample_rate();
                    self.mic = Some(MicChain {
                        beats: BeatDetector::new(&self.settings.mic, sr),
                        pitch: PitchDetector::new(&self.settings.mic, sr),
                        input,
                        buffer: Vec::new(),
                        hold: PitchHold::new(PITCH_HOLD_FRAMES),
                    });
                }
                Err(e) => warn!("Microphone disabled: {}", e),
            }
        }

        info!("vibescope is running ({} shaders). Press / for help, ESC to quit", self.gallery.len());

        self.window = Some(window);
        self.render_system = Some(render_system);
        self.start_time = Instant::now();
        Ok(())
    }

    fn now_s(&self) -> f64 {
        match &self.recording {
            // Fixed timestep so recorded frames are evenly spaced
            Some(config) => config.frame_time_s(self.frame_count) as f64,
            None => self.start_time.elapsed().as_secs_f64(),
        }
    }

    fn render_patch(&self) -> String {
        render_patch(&PatchInputs {
            music: &self.music,
            drums: &self.drums,
            effects: &self.effects,
            crossfader: self.crossfader,
        })
    }

    fn scene(&self) -> Scene {
        let music = self.music.settings();
        Scene {
            shader: self.gallery.current_index(),
            root_midi: music.root_midi,
            mode: music.mode,
            playback: music.playback,
            bpm: music.bpm,
            color: self.color,
        }
    }

    fn restore_scene(&mut self, scene: Scene) {
        self.gallery.select(scene.shader);
        self.music.set_root(scene.root_midi);
        self.music.set_mode(scene.mode);
        self.music.set_playback(scene.playback);
        self.music.set_bpm(scene.bpm);
        self.color = scene.color;
        self.title_dirty = true;
    }

    /// Acknowledge a discrete command from voice or gesture input
    fn speak(&self, command: &Command) {
        info!(target: "vibescope::speech", "{}", command.feedback());
    }

    /// Apply one command to the running state
    pub fn apply(&mut self, command: Command, now_s: f64) {
        debug!("Command: {:?}", command);
        match command {
            Command::Play => self.music.play(now_s),
            Command::Pause => self.music.pause(),
            Command::TogglePlay => self.music.toggle(now_s),

            Command::NextShader => {
                self.gallery.next();
            }
            Command::PreviousShader => {
                self.gallery.previous();
            }
            Command::RandomShader => {
                let len = self.gallery.len();
                if len > 1 {
                    let offset = self.rng.gen_range(1..len);
                    self.gallery.select((self.gallery.current_index() + offset) % len);
                }
            }
            Command::SelectShader(index) => {
                if !self.gallery.select(index) {
                    warn!("No shader at index {}", index);
                }
            }

            Command::SetMode(mode) => self.music.set_mode(mode),
            Command::NextMode => self.music.set_mode(self.music.settings().mode.next()),
            Command::SetRootPitch(pc) => self.music.set_root_pitch_class(pc),
            Command::SetRoot(note) => self.music.set_root(note),
            Command::SetTempo(bpm) => self.music.set_bpm(bpm),
            Command::NudgeTempo(delta) => self.music.nudge_bpm(delta),
            Command::SetPlayback(mode) => self.music.set_playback(mode),
            Command::NextPlayback => self.music.set_playback(self.music.settings().playback.next()),
            Command::RestartPhrase => self.music.restart_phrase(),

            Command::ToggleEffect(kind) => {
                let on = self.effects.toggle(kind);
                info!("{} {}", kind.name(), if on { "on" } else { "off" });
                self.effects_changed();
            }
            Command::SetEffect(kind, on) => {
                self.effects.set_enabled(kind, on);
                self.effects_changed();
            }
            Command::AllEffectsOff => {
                for kind in EffectKind::ALL {
                    self.effects.set_enabled(kind, false);
                }
                self.effects_changed();
            }
            Command::SetFilterKind(kind) => {
                self.effects.set_filter_kind(kind);
                self.effects_changed();
            }
            Command::SetFilterCutoff(hz) => {
                self.effects.set_filter_cutoff(hz);
                self.patch_dirty = true;
            }
            Command::SetReverbMix(mix) => {
                self.effects.set_reverb_mix(mix);
                self.patch_dirty = true;
            }
            Command::SetCrossfader(x) => {
                self.crossfader = x.clamp(0.0, 1.0);
                self.patch_dirty = true;
            }

            Command::SetHueShift(turns) => self.color.set_hue_shift(turns),
            Command::NudgeHue(d) => self.color.nudge_hue(d),
            Command::NudgeSaturation(d) => self.color.nudge_saturation(d),
            Command::NudgeBrightness(d) => self.color.nudge_brightness(d),
            Command::NudgeContrast(d) => self.color.nudge_contrast(d),
            Command::ResetColor => self.color.reset(),

            Command::TriggerCue(slot) => match self.cues.trigger(slot, self.scene()) {
                CueAction::Stored => info!("Cue {} saved", slot + 1),
                CueAction::Recalled(scene) => {
                    info!("Cue {} recalled", slot + 1);
                    self.restore_scene(scene);
                }
                CueAction::Ignored => warn!("No cue slot {}", slot + 1),
            },
            Command::StoreCue(slot) => {
                if self.cues.store(slot, self.scene()) {
                    info!("Cue {} saved", slot + 1);
                }
            }
            Command::ClearCues => self.cues.clear(),

            Command::RecordBeat => {
                if self.mic.is_some() {
                    self.beat_recorder.arm();
                    info!("Beatbox recording starts on the next bar");
                } else {
                    warn!("Beatbox needs the microphone (--mic)");
                }
            }
            Command::ClearBeat => {
                self.drums = DrumPattern::empty();
                self.patch_dirty = true;
            }
            Command::DefaultBeat => {
                self.drums = DrumPattern::default();
                self.patch_dirty = true;
            }

            Command::Help => info!("{}", Command::Help.feedback()),
        }

        self.title_dirty = true;
    }

    fn effects_changed(&mut self) {
        self.patch_dirty = true;
        if let Some(audio) = &self.audio {
            audio.set_output_stage(&self.effects.output_stage());
        }
    }

    /// Drain listener events
    fn poll_inputs(&mut self, now_s: f64) {
        while let Ok(event) = self.events.try_recv() {
            match event {
                InputEvent::Hand(hand) => {
                    for command in self.hand.update(&hand) {
                        if !command.is_continuous() {
                            self.speak(&command);
                        }
                        self.apply(command, now_s);
                    }
                }
                InputEvent::HandLost => self.hand.hand_lost(),
                InputEvent::Face(face) => {
                    for command in self.face.update(&face) {
                        self.apply(command, now_s);
                    }
                }
                InputEvent::Utterance(text) => {
                    let commands = self.dispatcher.dispatch(&text);
                    if commands.is_empty() {
                        info!(target: "vibescope::speech", "Sorry, I didn't catch \"{}\"", text);
                    }
                    for command in commands {
                        self.speak(&command);
                        self.apply(command, now_s);
                    }
                }
            }
        }
    }

    /// Beat and pitch detection on captured microphone audio
    fn poll_mic(&mut self, now_s: f64) {
        let Some(mic) = self.mic.as_mut() else {
            return;
        };
        mic.buffer.clear();
        mic.input.drain_into(&mut mic.buffer);
        if mic.buffer.is_empty() {
            return;
        }

        let hits = mic.beats.process(&mic.buffer);

        // Holding a note moves the key, unless a beat is being recorded
        let recording = self.beat_recorder.is_recording();
        let estimate = mic.pitch.process(&mic.buffer).filter(|_| !recording);
        let new_root = mic.hold.update(estimate.map(|e| e.midi));

        self.record_hits(&hits, now_s);
        if let Some(note) = new_root {
            info!("Sung {} ({:.0} Hz): following key", note_name(note), crate::music::midi_to_hz(note));
            self.apply(Command::SetRootPitch(note % 12), now_s);
        }
    }

    /// Place detected hits in the bar being recorded. The bar clock must
    /// already be advanced to `now_s`.
    fn record_hits(&mut self, hits: &[BeatHit], now_s: f64) {
        let phase = self.music.bar_phase(now_s);
        for hit in hits {
            self.beat_recorder.record(hit, phase);
        }
    }

    /// Advance the bar clock; bar lines also drive the beat recorder
    fn advance_clock(&mut self, now_s: f64) {
        let bars_before = self.music.bars_played();
        if self.music.tick(now_s) {
            self.patch_dirty = true;
            self.title_dirty = true;
        }
        if self.music.bars_played() != bars_before {
            if let Some(pattern) = self.beat_recorder.on_bar() {
                info!("Beatbox pattern recorded");
                self.drums = pattern;
                self.patch_dirty = true;
            } else if self.beat_recorder.is_recording() {
                info!("Recording beatbox bar...");
            }
        }
    }

    /// Swap the patch when needed
    fn update_patch(&mut self, now_s: f64) {
        let Some(audio) = &self.audio else {
            return;
        };
        audio.set_playing(self.music.is_playing());

        if self.patch_dirty && now_s - self.last_patch_s >= PATCH_INTERVAL_S {
            let code = self.render_patch();
            match audio.update_patch(&code) {
                Ok(()) => debug!("Patch updated ({} bytes)", code.len()),
                Err(e) => error!("Patch rejected: {}\n{}", e, code),
            }
            self.patch_dirty = false;
            self.last_patch_s = now_s;
        }
    }

    fn update_title(&mut self) {
        if !self.title_dirty {
            return;
        }
        self.title_dirty = false;
        let Some(window) = &self.window else {
            return;
        };
        let music = self.music.settings();
        let shader = self.gallery.current().map(|s| s.name.as_str()).unwrap_or("-");
        window.set_title(&format!(
            "vibescope - {} | {} {} | {} | {:.0} BPM{}",
            shader,
            note_name(music.root_midi),
            music.mode,
            self.music.chord().label(),
            music.bpm,
            if self.music.is_playing() { "" } else { " (paused)" }
        ));
    }

    /// Render a single frame; returns false once recording is complete
    fn render_frame(&mut self) -> bool {
        let now_s = self.now_s();

        self.poll_inputs(now_s);
        self.advance_clock(now_s);
        self.poll_mic(now_s);
        self.update_patch(now_s);
        self.update_title();

        let waveform = match self.audio.as_mut() {
            Some(audio) => {
                self.bands = audio.analyze();
                audio.waveform()
            }
            None => [0.0; WAVEFORM_LEN],
        };

        let Some(render_system) = self.render_system.as_mut() else {
            return true;
        };

        let index = self.gallery.current_index();
        if let Some(shader) = self.gallery.get(index) {
            if !render_system.is_broken(index) {
                if let Err(e) = render_system.ensure_pipeline(index, shader) {
                    warn!("{}", e);
                }
            }
        }

        let (width, height) = render_system.size();
        let mut uniforms = Uniforms {
            resolution: [width as f32, height as f32],
            time: now_s as f32,
            low: self.bands.low,
            mid: self.bands.mid,
            high: self.bands.high,
            hue_shift: self.color.hue_shift,
            saturation: self.color.saturation,
            brightness: self.color.brightness,
            contrast: self.color.contrast,
            ..Default::default()
        };
        uniforms.set_waveform(&waveform);
        render_system.update_uniforms(&uniforms);

        if let Err(e) = render_system.render(index, self.frame_count) {
            error!("Render error: {:?}", e);
        }
        self.frame_count += 1;

        if let Some(config) = &self.recording {
            if self.frame_count % config.fps as usize == 0 {
                info!("Recorded {}/{} frames", self.frame_count, config.total_frames());
            }
            if self.frame_count >= config.total_frames() {
                if let Some(audio) = &self.audio {
                    audio.finish_recording();
                }
                info!("Recording complete: {}", config.output_dir.display());
                return false;
            }
        }
        true
    }
}

/// Start OSC and console listeners; failures only disable that input
fn start_listeners(settings: &Settings, tx: Sender<InputEvent>) -> Option<OscListener> {
    if settings.input.console {
        if let Err(e) = console::spawn(tx.clone()) {
            warn!("Console input disabled: {}", e);
        }
    }
    if !settings.input.osc_enabled {
        return None;
    }
    let delay = Duration::from_millis(settings.input.osc_restart_delay_ms);
    match OscListener::spawn(settings.input.osc_port, delay, tx) {
        Ok(listener) => Some(listener),
        Err(e) => {
            warn!("OSC input disabled: {}", e);
            None
        }
    }
}

impl ApplicationHandler for App {
    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return; // Already initialized
        }
        if let Err(e) = self.initialize(event_loop) {
            error!("Startup failed: {}", e);
            self.error = Some(e);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                if let Some(render_system) = self.render_system.as_mut() {
                    render_system.resize(size.width, size.height);
                }
            }
            WindowEvent::ModifiersChanged(modifiers) => self.modifiers = modifiers.state(),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(code),
                        repeat: false,
                        ..
                    },
                ..
            } => {
                if code == KeyCode::Escape {
                    event_loop.exit();
                } else if let Some(command) = key_command(
                    code,
                    self.modifiers.shift_key(),
                    self.crossfader,
                    self.music.settings().root_midi,
                ) {
                    let now_s = self.now_s();
                    self.apply(command, now_s);
                }
            }
            WindowEvent::RedrawRequested => {
                if !self.render_frame() {
                    event_loop.exit();
                }
            }
            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(audio) = &self.audio {
            audio.finish_recording();
        }
        info!("Goodbye");
    }
}
