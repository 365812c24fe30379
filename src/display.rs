use std::{
    fs::{self, File, OpenOptions},
    io::{Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};

use anyhow::Context;

use crate::classifier::{Alignment, Classification, Level};

pub const WIDTH: usize = 8;
pub const HEIGHT: usize = 8;

pub const GRAPHICS_CLASS_DIR: &str = "/sys/class/graphics";
pub const FRAMEBUFFER_NAME: &str = "RPi-Sense FB";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb(pub u8, pub u8, pub u8);

pub const OFF: Rgb = Rgb(0, 0, 0);
pub const GREEN: Rgb = Rgb(0, 255, 0);
pub const RED: Rgb = Rgb(255, 0, 0);
pub const BLUE: Rgb = Rgb(0, 0, 255);
pub const AMBER: Rgb = Rgb(255, 191, 0);

impl Rgb {
    pub fn to_rgb565(self) -> u16 {
        let Rgb(r, g, b) = self;
        (u16::from(r >> 3) << 11) | (u16::from(g >> 2) << 5) | u16::from(b >> 3)
    }
}

/// Row-major 8x8 pixel grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Frame(pub [[Rgb; WIDTH]; HEIGHT]);

impl Frame {
    pub fn blank() -> Self {
        Frame([[OFF; WIDTH]; HEIGHT])
    }

    pub fn to_bytes(&self) -> [u8; WIDTH * HEIGHT * 2] {
        let mut bytes = [0u8; WIDTH * HEIGHT * 2];
        for (i, pixel) in self.0.iter().flatten().enumerate() {
            bytes[i * 2..i * 2 + 2].copy_from_slice(&pixel.to_rgb565().to_le_bytes());
        }
        bytes
    }
}

pub fn level_color(level: Level) -> Rgb {
    match level {
        Level::Low => BLUE,
        Level::Normal => GREEN,
        Level::High => RED,
    }
}

pub fn alignment_color(alignment: Alignment) -> Rgb {
    match alignment {
        Alignment::Aligned => GREEN,
        Alignment::Tilted => AMBER,
    }
}

/// Four two-column bars, left to right: temperature, humidity, pressure,
/// orientation.
pub fn render(c: &Classification) -> Frame {
    let bars = [
        level_color(c.temperature),
        level_color(c.humidity),
        level_color(c.pressure),
        alignment_color(c.orientation),
    ];

    let mut frame = Frame::blank();
    for row in frame.0.iter_mut() {
        for (x, pixel) in row.iter_mut().enumerate() {
            *pixel = bars[x / 2];
        }
    }
    frame
}

pub trait DisplayDriver {
    fn show(&mut self, frame: &Frame) -> Result<(), anyhow::Error>;

    fn clear(&mut self) -> Result<(), anyhow::Error> {
        self.show(&Frame::blank())
    }
}

/// The Sense HAT LED matrix exposed as a RGB565 framebuffer device.
#[derive(Debug)]
pub struct LedMatrix {
    fb: File,
}

impl LedMatrix {
    pub fn new() -> Result<LedMatrix, anyhow::Error> {
        let path = find_framebuffer(Path::new(GRAPHICS_CLASS_DIR))?;
        Self::open(&path)
    }

    pub fn open(path: &Path) -> Result<LedMatrix, anyhow::Error> {
        let fb = OpenOptions::new()
            .write(true)
            .open(path)
            .with_context(|| format!("Failed to open framebuffer {}", path.display()))?;
        Ok(LedMatrix { fb })
    }
}

impl DisplayDriver for LedMatrix {
    fn show(&mut self, frame: &Frame) -> Result<(), anyhow::Error> {
        self.fb
            .seek(SeekFrom::Start(0))
            .context("Failed to seek framebuffer")?;
        self.fb
            .write_all(&frame.to_bytes())
            .context("Failed to write framebuffer")?;
        self.fb.flush().context("Failed to flush framebuffer")?;
        Ok(())
    }
}

/// Looks up the `/dev/fbN` whose sysfs name matches the Sense HAT driver.
pub fn find_framebuffer(class_dir: &Path) -> Result<PathBuf, anyhow::Error> {
    let entries = fs::read_dir(class_dir)
        .with_context(|| format!("Failed to list {}", class_dir.display()))?;

    for entry in entries {
        let entry = entry.context("Failed to read graphics class entry")?;
        let file_name = entry.file_name();
        let Some(fb) = file_name.to_str().filter(|n| n.starts_with("fb")) else {
            continue;
        };

        let name = match fs::read_to_string(entry.path().join("name")) {
            Ok(name) => name,
            Err(_) => continue,
        };
        if name.trim() == FRAMEBUFFER_NAME {
            return Ok(Path::new("/dev").join(fb));
        }
    }

    Err(anyhow::anyhow!(
        "Sense HAT framebuffer '{FRAMEBUFFER_NAME}' not found under {}",
        class_dir.display()
    ))
}

#[cfg(test)]
mod tests {
    use tempfile::{NamedTempFile, TempDir};

    use super::*;

    #[test]
    fn test_rgb565() {
        assert_eq!(RED.to_rgb565(), 0xf800);
        assert_eq!(GREEN.to_rgb565(), 0x07e0);
        assert_eq!(BLUE.to_rgb565(), 0x001f);
        assert_eq!(OFF.to_rgb565(), 0);
    }

    #[test]
    fn test_render_bars() {
        let c = Classification {
            temperature: Level::High,
            humidity: Level::Normal,
            pressure: Level::Low,
            orientation: Alignment::Tilted,
        };
        let frame = render(&c);
        for row in frame.0 {
            assert_eq!(row, [RED, RED, GREEN, GREEN, BLUE, BLUE, AMBER, AMBER]);
        }
    }

    #[test]
    fn test_frame_bytes() {
        let mut frame = Frame::blank();
        frame.0[0][0] = RED;
        frame.0[7][7] = BLUE;
        let bytes = frame.to_bytes();
        assert_eq!(bytes.len(), 128);
        assert_eq!(&bytes[0..2], &[0x00, 0xf8]);
        assert_eq!(&bytes[126..128], &[0x1f, 0x00]);
        assert!(bytes[2..126].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_find_framebuffer() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("fb0")).unwrap();
        fs::create_dir_all(root.join("fb1")).unwrap();
        fs::create_dir_all(root.join("fbcon")).unwrap();
        fs::write(root.join("fb0/name"), "simple\n").unwrap();
        fs::write(root.join("fb1/name"), "RPi-Sense FB\n").unwrap();

        assert_eq!(find_framebuffer(root).unwrap(), PathBuf::from("/dev/fb1"));
    }

    #[test]
    fn test_find_framebuffer_missing() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("fb0")).unwrap();
        fs::write(dir.path().join("fb0/name"), "simple\n").unwrap();

        assert!(find_framebuffer(dir.path()).is_err());
        assert!(find_framebuffer(&dir.path().join("absent")).is_err());
    }

    #[test]
    fn test_led_matrix_writes_whole_frame() {
        let file = NamedTempFile::new().unwrap();

        let mut matrix = LedMatrix::open(file.path()).unwrap();
        let frame = render(&Classification {
            temperature: Level::Normal,
            humidity: Level::Normal,
            pressure: Level::Normal,
            orientation: Alignment::Aligned,
        });
        matrix.show(&frame).unwrap();
        matrix.show(&frame).unwrap();
        assert_eq!(fs::read(file.path()).unwrap(), frame.to_bytes());

        matrix.clear().unwrap();
        assert!(fs::read(file.path()).unwrap().iter().all(|&b| b == 0));
    }
}
