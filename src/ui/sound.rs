/// Sound engine: procedural 8-bit style effects for movement events.
///
/// All sounds are generated as in-memory WAV buffers at init time.
/// Playback is fire-and-forget (non-blocking) via rodio's Sink.
///
/// Compile with `--no-default-features` to disable audio entirely (the stub
/// SoundEngine does nothing).

use crate::sim::event::MoveEvent;

/// Which effect a movement event plays.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Cue {
    Jump,
    Land,
    Bonk,
    Fall,
    Teleport,
}

/// `HitWall` fires every tick the player pushes into a wall, so it stays silent.
pub fn cue_for(event: &MoveEvent) -> Option<Cue> {
    match event {
        MoveEvent::Jumped => Some(Cue::Jump),
        MoveEvent::Landed { .. } => Some(Cue::Land),
        MoveEvent::Bonked { .. } => Some(Cue::Bonk),
        MoveEvent::FallStart => Some(Cue::Fall),
        MoveEvent::Teleported { .. } => Some(Cue::Teleport),
        MoveEvent::HitWall { .. } => None,
    }
}

/// Play the cue for each event.
pub fn process_sound_events(sound: Option<&SoundEngine>, events: &[MoveEvent]) {
    let Some(sfx) = sound else { return };
    for cue in events.iter().filter_map(cue_for) {
        sfx.play(cue);
    }
}

#[cfg(feature = "sound")]
mod inner {
    use std::f32::consts::PI;
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};

    use super::Cue;

    const SAMPLE_RATE: u32 = 22050;

    /// Pre-generated WAV buffers for each cue.
    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        sfx_jump: Arc<Vec<u8>>,
        sfx_land: Arc<Vec<u8>>,
        sfx_bonk: Arc<Vec<u8>>,
        sfx_fall: Arc<Vec<u8>>,
        sfx_teleport: Arc<Vec<u8>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    tracing::warn!(error = %e, "no audio output, sound disabled");
                    return None;
                }
            };

            Some(SoundEngine {
                _stream: stream,
                handle,
                sfx_jump: Arc::new(make_wav(&gen_jump())),
                sfx_land: Arc::new(make_wav(&gen_land())),
                sfx_bonk: Arc::new(make_wav(&gen_bonk())),
                sfx_fall: Arc::new(make_wav(&gen_fall())),
                sfx_teleport: Arc::new(make_wav(&gen_teleport())),
            })
        }

        pub fn play(&self, cue: Cue) {
            let buf = match cue {
                Cue::Jump => &self.sfx_jump,
                Cue::Land => &self.sfx_land,
                Cue::Bonk => &self.sfx_bonk,
                Cue::Fall => &self.sfx_fall,
                Cue::Teleport => &self.sfx_teleport,
            };
            if let Ok(sink) = Sink::try_new(&self.handle) {
                let cursor = Cursor::new(buf.as_ref().clone());
                if let Ok(src) = rodio::Decoder::new(cursor) {
                    sink.append(src);
                    sink.detach(); // fire-and-forget
                }
            }
        }
    }

    // ════════════════════════════════════════════════════════════
    //  Waveform generators: mono f32 samples
    // ════════════════════════════════════════════════════════════

    fn sweep(from: f32, to: f32, duration: f32, volume: f32) -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        let mut phase = 0.0_f32;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let freq = from + (to - from) * t;
                phase += freq / SAMPLE_RATE as f32;
                let wave = (phase * 2.0 * PI).sin() * 0.7 + (phase * 6.0 * PI).sin() * 0.3;
                wave * (1.0 - t) * volume
            })
            .collect()
    }

    /// Jump: quick rising chirp
    fn gen_jump() -> Vec<f32> {
        sweep(300.0, 900.0, 0.09, 0.25)
    }

    /// Land: low thud, tone plus noise
    fn gen_land() -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * 0.07) as usize;
        let mut rng: u32 = 4242;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let ti = i as f32 / SAMPLE_RATE as f32;
                let tone = (ti * 110.0 * 2.0 * PI).sin();
                rng = rng.wrapping_mul(1103515245).wrapping_add(12345);
                let noise = (rng as f32 / u32::MAX as f32) * 2.0 - 1.0;
                (tone * 0.6 + noise * 0.4) * (1.0 - t).powf(2.0) * 0.35
            })
            .collect()
    }

    /// Bonk: short square-ish knock
    fn gen_bonk() -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * 0.06) as usize;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let ti = i as f32 / SAMPLE_RATE as f32;
                let s = (ti * 220.0 * 2.0 * PI).sin().signum();
                s * (1.0 - t) * 0.18
            })
            .collect()
    }

    /// Fall start: short descending whistle
    fn gen_fall() -> Vec<f32> {
        sweep(600.0, 200.0, 0.15, 0.2)
    }

    /// Teleport: two quick blips up an octave
    fn gen_teleport() -> Vec<f32> {
        let mut samples = sweep(880.0, 880.0, 0.05, 0.2);
        samples.extend(sweep(1760.0, 1760.0, 0.08, 0.2));
        samples
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder: wraps f32 samples into a valid WAV buffer
    // ════════════════════════════════════════════════════════════

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
        buf.extend_from_slice(&16u32.to_le_bytes()); // chunk size
        buf.extend_from_slice(&1u16.to_le_bytes());  // PCM
        buf.extend_from_slice(&num_channels.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits_per_sample.to_le_bytes());

        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());

        for &s in samples {
            let val = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
            buf.extend_from_slice(&val.to_le_bytes());
        }

        buf
    }

}

// ════════════════════════════════════════════════════════════
//  Public API: compiles to no-ops when sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play(&self, _cue: Cue) {}
}
