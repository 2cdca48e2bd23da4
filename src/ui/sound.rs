/// Sound engine: procedural 8-bit style sound effects via rodio.
///
/// All sounds are generated as in-memory WAV buffers at init time.
/// Playback is fire-and-forget (non-blocking) via rodio's Sink.
///
/// Compile with `--no-default-features` or without the "sound" feature
/// to disable audio entirely (the stub SoundEngine does nothing).

#[cfg(feature = "sound")]
mod inner {
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};

    const SAMPLE_RATE: u32 = 22050;
    const TAU: f32 = 2.0 * std::f32::consts::PI;

    /// Pre-generated WAV buffers for each sound effect.
    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        sfx_coin: Arc<Vec<u8>>,
        sfx_jump: Arc<Vec<u8>>,
        sfx_shot: Arc<Vec<u8>>,
        sfx_hurt: Arc<Vec<u8>>,
        sfx_heart: Arc<Vec<u8>>,
        sfx_die: Arc<Vec<u8>>,
        sfx_grow: Arc<Vec<u8>>,
        sfx_clear: Arc<Vec<u8>>,
        sfx_boss: Arc<Vec<u8>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = OutputStream::try_default().ok()?;

            let sfx_coin = Arc::new(make_wav(&gen_coin()));
            let sfx_jump = Arc::new(make_wav(&gen_jump()));
            let sfx_shot = Arc::new(make_wav(&gen_shot()));
            let sfx_hurt = Arc::new(make_wav(&gen_hurt()));
            let sfx_heart = Arc::new(make_wav(&gen_heart()));
            let sfx_die = Arc::new(make_wav(&gen_die()));
            let sfx_grow = Arc::new(make_wav(&gen_grow()));
            let sfx_clear = Arc::new(make_wav(&gen_clear()));
            let sfx_boss = Arc::new(make_wav(&gen_boss()));

            Some(SoundEngine {
                _stream: stream,
                handle,
                sfx_coin,
                sfx_jump,
                sfx_shot,
                sfx_hurt,
                sfx_heart,
                sfx_die,
                sfx_grow,
                sfx_clear,
                sfx_boss,
            })
        }

        fn play(&self, buf: &Arc<Vec<u8>>) {
            if let Ok(sink) = Sink::try_new(&self.handle) {
                let cursor = Cursor::new(buf.as_ref().clone());
                if let Ok(src) = rodio::Decoder::new(cursor) {
                    sink.append(src);
                    sink.detach(); // fire-and-forget
                }
            }
        }

        pub fn play_coin(&self) { self.play(&self.sfx_coin); }
        pub fn play_jump(&self) { self.play(&self.sfx_jump); }
        pub fn play_shot(&self) { self.play(&self.sfx_shot); }
        pub fn play_hurt(&self) { self.play(&self.sfx_hurt); }
        pub fn play_heart(&self) { self.play(&self.sfx_heart); }
        pub fn play_die(&self) { self.play(&self.sfx_die); }
        pub fn play_grow(&self) { self.play(&self.sfx_grow); }
        pub fn play_clear(&self) { self.play(&self.sfx_clear); }
        pub fn play_boss(&self) { self.play(&self.sfx_boss); }
    }

    // ══════════════════════════════════════════════════════════════
    // Waveform generators (mono f32 samples)
    // ══════════════════════════════════════════════════════════════

    /// Coin pickup: quick ascending arpeggio E6 G6 B6.
    fn gen_coin() -> Vec<f32> {
        let notes = [1319.0_f32, 1568.0, 1976.0];
        let note_dur = 0.04;
        let mut samples = Vec::new();
        for &freq in &notes {
            let n = (SAMPLE_RATE as f32 * note_dur) as usize;
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32).powf(0.5);
                let wave = (t * freq * TAU).sin() * 0.7 + (t * freq * 3.0 * TAU).sin() * 0.3;
                samples.push(wave * env * 0.25);
            }
        }
        samples
    }

    /// Jump: short rising chirp.
    fn gen_jump() -> Vec<f32> {
        let duration = 0.12;
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let freq = 250.0 + t * 400.0;
                let ti = i as f32 / SAMPLE_RATE as f32;
                let env = (1.0 - t).powf(0.7);
                (ti * freq * TAU).sin() * env * 0.22
            })
            .collect()
    }

    /// Shot: noise burst over a falling tone.
    fn gen_shot() -> Vec<f32> {
        let duration = 0.08;
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        let mut rng: u32 = 77777;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let freq = 900.0 - t * 500.0;
                let ti = i as f32 / SAMPLE_RATE as f32;
                let tone = (ti * freq * TAU).sin();
                rng = rng.wrapping_mul(1103515245).wrapping_add(12345);
                let noise = (rng as f32 / u32::MAX as f32) * 2.0 - 1.0;
                let env = (1.0 - t).powf(1.2);
                (tone * 0.5 + noise * 0.5) * env * 0.25
            })
            .collect()
    }

    /// Hurt: harsh two-tone drop.
    fn gen_hurt() -> Vec<f32> {
        let notes = [300.0_f32, 180.0];
        let note_dur = 0.07;
        let mut samples = Vec::new();
        for &freq in &notes {
            let n = (SAMPLE_RATE as f32 * note_dur) as usize;
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32) * 0.4;
                let wave = (t * freq * TAU).sin() * 0.6 + (t * freq * 2.0 * TAU).sin() * 0.4;
                samples.push(wave * env * 0.3);
            }
        }
        samples
    }

    /// Heart pickup: warm two-note rise C5 G5.
    fn gen_heart() -> Vec<f32> {
        let notes = [523.0_f32, 784.0];
        let note_dur = 0.09;
        let mut samples = Vec::new();
        for &freq in &notes {
            let n = (SAMPLE_RATE as f32 * note_dur) as usize;
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32) * 0.5;
                let wave = (t * freq * TAU).sin() * 0.8 + (t * freq * 2.0 * TAU).sin() * 0.2;
                samples.push(wave * env * 0.28);
            }
        }
        samples
    }

    /// Death: sad descending line G4 E4 C4 G3.
    fn gen_die() -> Vec<f32> {
        let notes = [392.0_f32, 330.0, 262.0, 196.0];
        let note_dur = 0.14;
        let mut samples = Vec::new();
        for &freq in &notes {
            let n = (SAMPLE_RATE as f32 * note_dur) as usize;
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32) * 0.3;
                samples.push((t * freq * TAU).sin() * env * 0.3);
            }
        }
        let fade_len = samples.len() / 4;
        let total = samples.len();
        for i in (total - fade_len)..total {
            let ratio = (total - i) as f32 / fade_len as f32;
            samples[i] *= ratio;
        }
        samples
    }

    /// Vine growth: slow upward slide.
    fn gen_grow() -> Vec<f32> {
        let duration = 0.5;
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let freq = 200.0 + t * t * 600.0;
                let ti = i as f32 / SAMPLE_RATE as f32;
                let env = (1.0 - t).powf(0.3) * t.powf(0.2);
                ((ti * freq * TAU).sin() * 0.7 + (ti * freq * 2.0 * TAU).sin() * 0.3) * env * 0.2
            })
            .collect()
    }

    /// Level clear: ascending fanfare C5 E5 G5 C6 with sustain.
    fn gen_clear() -> Vec<f32> {
        let notes = [523.0_f32, 659.0, 784.0, 1047.0];
        let note_dur = 0.1;
        let mut samples = Vec::new();
        for &freq in &notes {
            let n = (SAMPLE_RATE as f32 * note_dur) as usize;
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32) * 0.3;
                let wave = (t * freq * TAU).sin() * 0.6
                    + (t * freq * 2.0 * TAU).sin() * 0.3
                    + (t * freq * 3.0 * TAU).sin() * 0.1;
                samples.push(wave * env * 0.3);
            }
        }
        let last_freq = 1047.0_f32;
        let n = (SAMPLE_RATE as f32 * 0.25) as usize;
        for i in 0..n {
            let t = i as f32 / SAMPLE_RATE as f32;
            let env = 1.0 - (i as f32 / n as f32);
            samples.push((t * last_freq * TAU).sin() * env * 0.3);
        }
        samples
    }

    /// Boss arrival: low rumbling warning A2 E2.
    fn gen_boss() -> Vec<f32> {
        let pairs = [(110.0_f32, 0.2), (82.0, 0.3)];
        let mut samples = Vec::new();
        for &(freq, dur) in &pairs {
            let n = (SAMPLE_RATE as f32 * dur) as usize;
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32).powf(0.5);
                let wave = (t * freq * TAU).sin() * 0.6 + (t * freq * 1.5 * TAU).sin() * 0.4;
                samples.push(wave * env * 0.35);
            }
        }
        samples
    }

    // ══════════════════════════════════════════════════════════════
    // WAV encoder
    // ══════════════════════════════════════════════════════════════

    fn make_wav(samples: &[f32]) -> Vec<u8> {
        let num_channels: u16 = 1;
        let bits_per_sample: u16 = 16;
        let byte_rate = SAMPLE_RATE * (num_channels as u32) * (bits_per_sample as u32) / 8;
        let block_align = num_channels * bits_per_sample / 8;
        let data_size = samples.len() as u32 * 2;
        let file_size = 36 + data_size;

        let mut buf = Vec::with_capacity(44 + data_size as usize);

        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&file_size.to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
        buf.extend_from_slice(&num_channels.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits_per_sample.to_le_bytes());

        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());

        for &s in samples {
            let clamped = s.max(-1.0).min(1.0);
            let val = (clamped * 32767.0) as i16;
            buf.extend_from_slice(&val.to_le_bytes());
        }

        buf
    }
}

// ══════════════════════════════════════════════════════════════
// Public API (no-ops when the sound feature is off)
// ══════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> {
        Some(SoundEngine)
    }
    pub fn play_coin(&self) {}
    pub fn play_jump(&self) {}
    pub fn play_shot(&self) {}
    pub fn play_hurt(&self) {}
    pub fn play_heart(&self) {}
    pub fn play_die(&self) {}
    pub fn play_grow(&self) {}
    pub fn play_clear(&self) {}
    pub fn play_boss(&self) {}
}
