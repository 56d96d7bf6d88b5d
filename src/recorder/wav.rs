//! WAV finalization for finished takes

use std::path::Path;

/// Write mono PCM 16-bit samples as a WAV file
pub(super) fn write_take(
    path: &Path,
    samples: &[i16],
    sample_rate: u32,
) -> Result<(), hound::Error> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)?;
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_take_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("take.wav");
        let samples: Vec<i16> = (0..1600).map(|i| (i % 128) as i16).collect();

        write_take(&path, &samples, 16000).expect("write should succeed");

        let mut reader = hound::WavReader::open(&path).expect("open written take");
        assert_eq!(reader.spec().channels, 1);
        assert_eq!(reader.spec().sample_rate, 16000);
        let read: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(read, samples);
    }
}
