//! Sound engine: procedural chiptune effects via rodio.
//!
//! Fixed effects are rendered to in-memory WAV buffers at init time; the
//! merge tone is rendered per play because its pitch follows the tile value.
//! Playback is fire-and-forget (non-blocking) via rodio's Sink.
//!
//! Compile with `--no-default-features` or without "sound" feature
//! to disable audio entirely (the stub SoundEngine does nothing).

#[cfg(feature = "sound")]
mod inner {
    use std::f32::consts::TAU;
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};

    const SAMPLE_RATE: u32 = 22050;

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        sfx_slide: Arc<Vec<u8>>,
        sfx_doubler: Arc<Vec<u8>>,
        sfx_halver: Arc<Vec<u8>>,
        sfx_milestone: Arc<Vec<u8>>,
        sfx_game_over: Arc<Vec<u8>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = OutputStream::try_default().ok()?;

            Some(SoundEngine {
                _stream: stream,
                handle,
                sfx_slide: Arc::new(make_wav(&gen_slide())),
                sfx_doubler: Arc::new(make_wav(&gen_sweep(440.0, 880.0, 0.12))),
                sfx_halver: Arc::new(make_wav(&gen_sweep(660.0, 330.0, 0.12))),
                sfx_milestone: Arc::new(make_wav(&gen_milestone())),
                sfx_game_over: Arc::new(make_wav(&gen_game_over())),
            })
        }

        fn play_bytes(&self, bytes: Vec<u8>) {
            if let Ok(sink) = Sink::try_new(&self.handle) {
                if let Ok(src) = rodio::Decoder::new(Cursor::new(bytes)) {
                    sink.append(src);
                    sink.detach(); // fire-and-forget
                }
            }
        }

        fn play(&self, buf: &Arc<Vec<u8>>) {
            self.play_bytes(buf.as_ref().clone());
        }

        /// Plain merge: pitch climbs one semitone per doubling from C5.
        pub fn play_merge(&self, value: u32) {
            let steps = value.max(2).trailing_zeros().saturating_sub(1) as f32;
            let freq = 523.0 * 2f32.powf(steps / 12.0);
            self.play_bytes(make_wav(&gen_notes(&[(freq, 0.07)], 0.25)));
        }

        pub fn play_slide(&self) { self.play(&self.sfx_slide); }
        pub fn play_doubler(&self) { self.play(&self.sfx_doubler); }
        pub fn play_halver(&self) { self.play(&self.sfx_halver); }
        pub fn play_milestone(&self) { self.play(&self.sfx_milestone); }
        pub fn play_game_over(&self) { self.play(&self.sfx_game_over); }
    }

    // ════════════════════════════════════════════════════════════
    //  Waveform generators: mono f32 samples in [-1, 1]
    // ════════════════════════════════════════════════════════════

    /// Sequence of notes, each a sine plus a little octave for bite.
    fn gen_notes(notes: &[(f32, f32)], volume: f32) -> Vec<f32> {
        let mut samples = Vec::new();
        for &(freq, dur) in notes {
            let n = (SAMPLE_RATE as f32 * dur) as usize;
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32).powf(0.7);
                let wave = (t * freq * TAU).sin() * 0.75 + (t * freq * 2.0 * TAU).sin() * 0.25;
                samples.push(wave * env * volume);
            }
        }
        samples
    }

    /// Linear frequency sweep with phase accumulation (no clicks).
    fn gen_sweep(from: f32, to: f32, duration: f32) -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        let mut phase = 0.0_f32;
        (0..n)
            .map(|i| {
                let p = i as f32 / n as f32;
                let freq = from + (to - from) * p;
                phase += freq * TAU / SAMPLE_RATE as f32;
                phase.sin() * (1.0 - p) * 0.25
            })
            .collect()
    }

    /// Slide: very short filtered noise tick.
    fn gen_slide() -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * 0.03) as usize;
        let mut rng: u32 = 0x2048;
        let mut prev = 0.0_f32;
        (0..n)
            .map(|i| {
                rng = rng.wrapping_mul(1664525).wrapping_add(1013904223);
                let noise = (rng >> 8) as f32 / (1u32 << 24) as f32 * 2.0 - 1.0;
                prev = prev * 0.8 + noise * 0.2; // one-pole low-pass
                prev * (1.0 - i as f32 / n as f32) * 0.35
            })
            .collect()
    }

    /// Milestone: rising arpeggio, then a held chord.
    fn gen_milestone() -> Vec<f32> {
        let mut samples = gen_notes(&[(523.0, 0.08), (659.0, 0.08), (784.0, 0.08)], 0.3);
        let n = (SAMPLE_RATE as f32 * 0.35) as usize;
        for i in 0..n {
            let t = i as f32 / SAMPLE_RATE as f32;
            let env = 1.0 - i as f32 / n as f32;
            let chord = [1047.0_f32, 1319.0, 1568.0]
                .iter()
                .map(|f| (t * f * TAU).sin())
                .sum::<f32>()
                / 3.0;
            samples.push(chord * env * 0.3);
        }
        samples
    }

    /// Game over: slow descending minor line with a tail fade.
    fn gen_game_over() -> Vec<f32> {
        let mut samples = gen_notes(&[(392.0, 0.14), (311.0, 0.14), (262.0, 0.28)], 0.3);
        let fade = samples.len() / 3;
        let total = samples.len();
        for (k, s) in samples[total - fade..].iter_mut().enumerate() {
            *s *= 1.0 - k as f32 / fade as f32;
        }
        samples
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder: 16-bit PCM mono
    // ════════════════════════════════════════════════════════════

    fn make_wav(samples: &[f32]) -> Vec<u8> {
        const CHANNELS: u16 = 1;
        const BITS: u16 = 16;
        let block_align = CHANNELS * BITS / 8;
        let byte_rate = SAMPLE_RATE * block_align as u32;
        let data_size = samples.len() as u32 * block_align as u32;

        let mut buf = Vec::with_capacity(44 + data_size as usize);
        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&(36 + data_size).to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
        buf.extend_from_slice(&CHANNELS.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&BITS.to_le_bytes());

        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());
        for &s in samples {
            let v = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
            buf.extend_from_slice(&v.to_le_bytes());
        }
        buf
    }

}

// ════════════════════════════════════════════════════════════
//  Public API: no-ops when the sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play_merge(&self, _value: u32) {}
    pub fn play_slide(&self) {}
    pub fn play_doubler(&self) {}
    pub fn play_halver(&self) {}
    pub fn play_milestone(&self) {}
    pub fn play_game_over(&self) {}
}
