//! Minimal PNG writer: 8-bit RGBA, no interlacing, every scanline using
//! filter type 0.

use anyhow::{bail, Result};
use flate2::{write::ZlibEncoder, Compression};
use std::io::Write;

const SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

const CRC_TABLE: [u32; 256] = crc_table();

const fn crc_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut n = 0;
    while n < 256 {
        let mut c = n as u32;
        let mut k = 0;
        while k < 8 {
            c = if c & 1 != 0 {
                0xEDB8_8320 ^ (c >> 1)
            } else {
                c >> 1
            };
            k += 1;
        }
        table[n] = c;
        n += 1;
    }
    table
}

fn crc32(bytes: &[u8]) -> u32 {
    let crc = bytes.iter().fold(0xFFFF_FFFFu32, |c, b| {
        CRC_TABLE[((c ^ *b as u32) & 0xFF) as usize] ^ (c >> 8)
    });
    crc ^ 0xFFFF_FFFF
}

fn write_chunk(out: &mut Vec<u8>, kind: &[u8; 4], data: &[u8]) {
    out.extend_from_slice(&(data.len() as u32).to_be_bytes());
    let start = out.len();
    out.extend_from_slice(kind);
    out.extend_from_slice(data);
    let crc = crc32(&out[start..]);
    out.extend_from_slice(&crc.to_be_bytes());
}

pub fn encode_png(width: usize, height: usize, rgba: &[u8]) -> Result<Vec<u8>> {
    if rgba.len() != width * height * 4 {
        bail!(
            "expected {} bytes of pixel data for {width}x{height}, got {}",
            width * height * 4,
            rgba.len()
        );
    }

    let mut ihdr = Vec::with_capacity(13);
    ihdr.extend_from_slice(&(width as u32).to_be_bytes());
    ihdr.extend_from_slice(&(height as u32).to_be_bytes());
    // bit depth 8, color type 6 (RGBA), then compression, filter, interlace
    ihdr.extend_from_slice(&[8, 6, 0, 0, 0]);

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::fast());
    let stride = width * 4;
    for row in rgba.chunks_exact(stride.max(1)).take(height) {
        encoder.write_all(&[0])?;
        encoder.write_all(row)?;
    }
    let idat = encoder.finish()?;

    let mut out = Vec::with_capacity(idat.len() + 64);
    out.extend_from_slice(&SIGNATURE);
    write_chunk(&mut out, b"IHDR", &ihdr);
    write_chunk(&mut out, b"IDAT", &idat);
    write_chunk(&mut out, b"IEND", &[]);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::ZlibDecoder;
    use std::io::Read;

    fn chunk_at(png: &[u8], offset: usize) -> (&[u8], &[u8]) {
        let len = u32::from_be_bytes(png[offset..offset + 4].try_into().unwrap()) as usize;
        (
            &png[offset + 4..offset + 8],
            &png[offset + 8..offset + 8 + len],
        )
    }

    #[test]
    fn test_crc_matches_known_iend() {
        assert_eq!(crc32(b"IEND"), 0xAE42_6082);
    }

    #[test]
    fn test_png_layout() {
        let pixels = vec![255u8; 3 * 2 * 4];
        let png = encode_png(3, 2, &pixels).unwrap();
        assert_eq!(&png[..8], &SIGNATURE);

        let (kind, ihdr) = chunk_at(&png, 8);
        assert_eq!(kind, b"IHDR");
        assert_eq!(ihdr, &[0, 0, 0, 3, 0, 0, 0, 2, 8, 6, 0, 0, 0]);

        let (kind, idat) = chunk_at(&png, 8 + 12 + 13);
        assert_eq!(kind, b"IDAT");
        let mut raw = Vec::new();
        ZlibDecoder::new(idat).read_to_end(&mut raw).unwrap();
        // one filter byte per scanline
        assert_eq!(raw.len(), 2 * (1 + 3 * 4));
        assert_eq!(raw[0], 0);
        assert_eq!(raw[13], 0);

        assert_eq!(&png[png.len() - 12..], &[0, 0, 0, 0, b'I', b'E', b'N', b'D', 0xAE, 0x42, 0x60, 0x82]);
    }

    #[test]
    fn test_rejects_short_buffer() {
        assert!(encode_png(2, 2, &[0; 4]).is_err());
    }
}
