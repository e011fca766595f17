//! Text formats for I/Q sample files
//!
//! Waveform files hold one sample per line as `0xIIIIQQQQ`: two 16-bit
//! two's complement words in hex. Lines that do not start with `0x` are
//! skipped, so comments and blank lines are allowed.
//!
//! Capture files hold one sample per line as `IIIII, QQQQQ ` with each raw
//! 16-bit word printed as a zero-padded unsigned decimal.

use std::fs;
use std::path::Path;
use zedspi_bridge::SamplePair;

/// Parse the contents of a waveform file
pub fn parse_waveform(text: &str) -> Result<Vec<SamplePair>, String> {
    let mut samples = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        let Some(hex) = line.trim().strip_prefix("0x") else {
            continue;
        };
        let word = |range: std::ops::Range<usize>| {
            hex.get(range)
                .and_then(|s| u16::from_str_radix(s, 16).ok())
                .ok_or_else(|| format!("line {}: invalid sample '{}'", lineno + 1, line.trim()))
        };
        let i = word(0..4)?;
        let q = word(4..8)?;
        samples.push(SamplePair::new(i as i16, q as i16));
    }
    Ok(samples)
}

/// Format samples in the waveform file format
pub fn format_waveform(samples: &[SamplePair]) -> String {
    samples
        .iter()
        .map(|s| {
            let (i, q) = s.to_words();
            format!("0x{:04X}{:04X}\n", i, q)
        })
        .collect()
}

/// Format samples in the capture file format
pub fn format_capture(samples: &[SamplePair]) -> String {
    samples
        .iter()
        .map(|s| {
            let (i, q) = s.to_words();
            format!("{:05}, {:05} \n", i, q)
        })
        .collect()
}

/// Read a waveform file
pub fn read_waveform_file(path: &Path) -> Result<Vec<SamplePair>, Box<dyn std::error::Error>> {
    let text = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    let samples = parse_waveform(&text).map_err(|e| format!("{}: {}", path.display(), e))?;
    log::debug!("Read {} samples from {}", samples.len(), path.display());
    Ok(samples)
}

/// Write a waveform file
pub fn write_waveform_file(path: &Path, samples: &[SamplePair]) -> std::io::Result<()> {
    fs::write(path, format_waveform(samples))
}

/// Write a capture file
pub fn write_capture_file(path: &Path, samples: &[SamplePair]) -> std::io::Result<()> {
    fs::write(path, format_capture(samples))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_waveform() {
        let text = "# single tone\n0x7FFF0000\n  0x8000FFFF  \n\n0x00010002\n";
        let samples = parse_waveform(text).unwrap();
        assert_eq!(
            samples,
            [
                SamplePair::new(i16::MAX, 0),
                SamplePair::new(i16::MIN, -1),
                SamplePair::new(1, 2),
            ]
        );
    }

    #[test]
    fn test_parse_waveform_rejects_short_line() {
        let err = parse_waveform("0x7FFF0000\n0x12\n").unwrap_err();
        assert!(err.starts_with("line 2"), "{}", err);
        assert!(parse_waveform("0xZZZZ0000\n").is_err());
    }

    #[test]
    fn test_format_capture() {
        let samples = [SamplePair::new(0x0102, 0x0304), SamplePair::new(-1, 7)];
        assert_eq!(format_capture(&samples), "00258, 00772 \n65535, 00007 \n");
    }

    #[test]
    fn test_waveform_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("waveform.txt");
        let samples = [SamplePair::new(-32768, 32767), SamplePair::new(0x1234, -2)];

        write_waveform_file(&path, &samples).unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "0x80007FFF\n0x1234FFFE\n"
        );
        assert_eq!(read_waveform_file(&path).unwrap(), samples);
    }
}
