#!/usr/bin/env -S cargo +nightly -Zscript
//! Generate seed corpus files for fuzzing.
//! Run: cargo +nightly -Zscript fuzz/generate_seeds.rs
//!
//! Each seed starts with 8 control bytes that pick the region and settings.

fn main() {
    use std::fs;
    let dir = "fuzz/corpus/fuzz_region";
    fs::create_dir_all(dir).unwrap();
    let ctl = [0u8, 0, 1, 1, 1, 0, 0, 0];
    let seed = |name: &str, image: &[u8]| {
        let mut data = ctl.to_vec();
        data.extend_from_slice(image);
        fs::write(format!("{dir}/{name}"), data).unwrap();
    };

    seed("ppm_2x2.ppm", b"P6\n2 2\n255\n\xff\x00\x00\x00\xff\x00\x00\x00\xff\x80\x80\x80");
    seed("pgm_3x2.pgm", b"P5\n3 2\n255\n\x00\x40\x80\xc0\xff\x64");
    seed(
        "pam_rgba_1x1.pam",
        b"P7\nWIDTH 1\nHEIGHT 1\nDEPTH 4\nMAXVAL 255\nTUPLTYPE RGB_ALPHA\nENDHDR\n\xff\x00\x00\xff",
    );

    // Minimal BMP 1x1 24-bit
    let mut bmp = vec![0u8; 58]; // 54 header + 4 pixel (3 + 1 padding)
    bmp[0] = b'B';
    bmp[1] = b'M';
    bmp[2..6].copy_from_slice(&58u32.to_le_bytes());
    bmp[10..14].copy_from_slice(&54u32.to_le_bytes());
    bmp[14..18].copy_from_slice(&40u32.to_le_bytes());
    bmp[18..22].copy_from_slice(&1i32.to_le_bytes());
    bmp[22..26].copy_from_slice(&1i32.to_le_bytes());
    bmp[26..28].copy_from_slice(&1u16.to_le_bytes());
    bmp[28..30].copy_from_slice(&24u16.to_le_bytes());
    bmp[54] = 0xff; // blue
    seed("bmp_1x1.bmp", &bmp);

    // Farbfeld 1x1
    let mut ff = b"farbfeld".to_vec();
    ff.extend_from_slice(&1u32.to_be_bytes());
    ff.extend_from_slice(&1u32.to_be_bytes());
    ff.extend_from_slice(&[0xff, 0xff, 0, 0, 0, 0, 0xff, 0xff]);
    seed("farbfeld_1x1.ff", &ff);

    println!("Seeds written to {dir}/");
}
