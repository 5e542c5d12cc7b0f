use blocktex::{
    compress, compress_u8, decompress, decompress_u8, decompress_u16, storage_requirements,
    Flags, Format,
};
use rand::{Rng, SeedableRng};

fn rng() -> rand::rngs::StdRng {
    rand::rngs::StdRng::seed_from_u64(0xb10c7e)
}

fn random_tile(rng: &mut impl Rng) -> [[f32; 4]; 16] {
    std::array::from_fn(|_| [rng.gen(), rng.gen(), rng.gen(), rng.gen()])
}

fn gradient_tile() -> [[f32; 4]; 16] {
    std::array::from_fn(|i| {
        let t = i as f32 / 15.0;
        [0.1 + 0.8 * t, 0.9 - 0.7 * t, 0.2 + 0.3 * t, 1.0]
    })
}

fn compress_block(tile: &[[f32; 4]; 16], mask: u16, flags: Flags) -> Vec<u8> {
    let mut block = vec![0_u8; flags.format().block_size()];
    compress(tile, mask, flags, &mut block);
    block
}

fn sum_squared_error(a: &[[f32; 4]; 16], b: &[[f32; 4]; 16]) -> f32 {
    let mut error = 0.0;
    for (pa, pb) in a.iter().zip(b) {
        for c in 0..3 {
            let d = pa[c] - pb[c];
            error += d * d;
        }
    }
    error
}

#[test]
fn canonical_round_trip() {
    let mut rng = rng();

    // BC1 has no separate alpha block, so these run fully opaque;
    // punch-through alpha is covered by its own test below
    let opaque_sets = [
        Flags::BC1,
        Flags::BC1 | Flags::RANGE_FIT,
        Flags::BC1 | Flags::cluster_iterations(4),
        Flags::BC1 | Flags::SRGB,
    ];
    for flags in opaque_sets {
        for _ in 0..200 {
            let mut tile = random_tile(&mut rng);
            for px in &mut tile {
                px[3] = 1.0;
            }
            let first = compress_block(&tile, 0xffff, flags);
            let decoded = decompress(&first, flags);
            let second = compress_block(&decoded, 0xffff, flags);
            assert_eq!(first, second, "flags {flags:?}, tile {tile:?}");
        }
    }

    // random alpha exercises the interpolated and explicit alpha blocks
    let alpha_sets = [
        Flags::BC2,
        Flags::BC3,
        Flags::BC3 | Flags::WEIGHT_BY_ALPHA,
        Flags::BC4,
        Flags::BC5,
    ];
    for flags in alpha_sets {
        for _ in 0..200 {
            let tile = random_tile(&mut rng);
            let first = compress_block(&tile, 0xffff, flags);
            let decoded = decompress(&first, flags);
            let second = compress_block(&decoded, 0xffff, flags);
            assert_eq!(first, second, "flags {flags:?}, tile {tile:?}");
        }
    }
}

#[test]
fn canonical_round_trip_with_mask() {
    let mut rng = rng();
    for _ in 0..20 {
        let tile = gradient_tile();
        let mask: u16 = rng.gen();
        let first = compress_block(&tile, mask, Flags::BC1);
        let decoded = decompress(&first, Flags::BC1);
        let second = compress_block(&decoded, mask, Flags::BC1);
        assert_eq!(first, second, "mask {mask:#06x}");
    }
}

#[test]
fn canonical_round_trip_punch_through() {
    let mut tile = gradient_tile();
    for i in [2, 7, 11] {
        tile[i][3] = 0.0;
    }
    let first = compress_block(&tile, 0xffff, Flags::BC1);
    let decoded = decompress(&first, Flags::BC1);
    for i in [2, 7, 11] {
        assert_eq!(decoded[i], [0.0, 0.0, 0.0, 0.0]);
    }
    let second = compress_block(&decoded, 0xffff, Flags::BC1);
    assert_eq!(first, second);
}

#[test]
fn decoder_is_pure() {
    let mut rng = rng();
    for flags in [Flags::BC1, Flags::BC2, Flags::BC3, Flags::BC4, Flags::BC5] {
        for _ in 0..50 {
            let block: Vec<u8> = (0..flags.format().block_size())
                .map(|_| rng.gen())
                .collect();
            let a = decompress(&block, flags);
            let b = decompress(&block, flags);
            assert_eq!(a, b);
            assert_eq!(decompress_u8(&block, flags), decompress_u8(&block, flags));
        }
    }
}

#[test]
fn canonicalization_invariant() {
    let mut rng = rng();
    for _ in 0..100 {
        let mut tile = random_tile(&mut rng);
        for px in &mut tile {
            px[3] = 1.0;
        }
        let block = compress_block(&tile, 0xffff, Flags::BC1);
        let a = u16::from_le_bytes([block[0], block[1]]);
        let b = u16::from_le_bytes([block[2], block[3]]);
        if a == b {
            assert_eq!(&block[4..8], &[0, 0, 0, 0], "degenerate block must index 0");
        } else {
            assert!(a > b, "opaque BC1 endpoints out of order: {a:#06x} < {b:#06x}");
        }
    }
}

fn replicate(code: u32, bits: u32) -> f32 {
    let mut v = 0_u32;
    let mut shift = 8_i32 - bits as i32;
    while shift > -(bits as i32) {
        v |= if shift >= 0 { code << shift } else { code >> -shift };
        shift -= bits as i32;
    }
    v as f32 / 255.0
}

#[test]
fn solid_blocks_quantize_at_least_as_well_as_truncation() {
    let mut rng = rng();
    for _ in 0..200 {
        let color = [rng.gen(), rng.gen(), rng.gen(), 1.0_f32];
        let tile = [color; 16];
        let block = compress_block(&tile, 0xffff, Flags::BC1);
        let decoded = decompress(&block, Flags::BC1);
        for (c, bits) in [(0, 5_u32), (1, 6), (2, 5)] {
            let x: f32 = color[c];
            let max = ((1_u32 << bits) - 1) as f32;
            let truncated = replicate((x * max) as u32, bits);
            let snapped = decoded[0][c];
            assert!(
                (snapped - x).abs() <= (truncated - x).abs() + 1e-6,
                "channel {c}: x={x} snapped={snapped} truncated={truncated}"
            );
        }
    }
}

#[test]
fn cluster_fit_improves_monotonically() {
    let tile = gradient_tile();
    let metric = Flags::METRIC_UNIFORM;

    let error_for = |flags: Flags| {
        let block = compress_block(&tile, 0xffff, flags | metric);
        sum_squared_error(&tile, &decompress(&block, Flags::BC1))
    };

    let range_error = error_for(Flags::BC1 | Flags::RANGE_FIT);
    let mut prev = range_error;
    for iterations in 1..=15 {
        let error = error_for(Flags::BC1 | Flags::cluster_iterations(iterations));
        assert!(
            error <= prev + 1e-6,
            "iterations {iterations}: {error} > {prev}"
        );
        prev = error;
    }
    assert!(prev <= range_error + 1e-6);
}

#[test]
fn solid_block_scenario() {
    let color = [128.0 / 255.0, 64.0 / 255.0, 200.0 / 255.0, 1.0];
    let tile = [color; 16];
    let block = compress_block(&tile, 0xffff, Flags::BC1);

    // nearest RGB565 representable value of (128, 64, 200)
    let decoded = decompress_u8(&block, Flags::BC1);
    for px in decoded {
        assert_eq!(px, [132, 65, 198, 255]);
    }
    let decoded = decompress_u16(&block, Flags::BC1);
    for px in decoded {
        assert_eq!(px, [132 * 257, 65 * 257, 198 * 257, 65535]);
    }
}

#[test]
fn empty_mask_scenario() {
    let mut rng = rng();
    for flags in [Flags::BC1, Flags::BC2, Flags::BC3, Flags::BC4, Flags::BC5] {
        let tile = random_tile(&mut rng);
        let block = compress_block(&tile, 0, flags);
        assert_eq!(block.len(), flags.format().block_size());
        // must decode without panicking
        let _ = decompress(&block, flags);
    }
}

#[test]
fn two_point_scenario() {
    let mut tile = [[0.5, 0.5, 0.5, 1.0]; 16];
    tile[3] = [0.0, 0.0, 0.0, 1.0];
    tile[12] = [1.0, 1.0, 1.0, 1.0];
    let mask = (1 << 3) | (1 << 12);
    let block = compress_block(&tile, mask, Flags::BC1);

    let a = u16::from_le_bytes([block[0], block[1]]);
    let b = u16::from_le_bytes([block[2], block[3]]);
    assert_eq!(a, 0xffff);
    assert_eq!(b, 0x0000);

    let decoded = decompress(&block, Flags::BC1);
    assert_eq!(decoded[3], [0.0, 0.0, 0.0, 1.0]);
    assert_eq!(decoded[12], [1.0, 1.0, 1.0, 1.0]);
}

#[test]
fn bc2_alpha_is_explicit() {
    let mut tile = gradient_tile();
    for (i, px) in tile.iter_mut().enumerate() {
        px[3] = i as f32 / 15.0;
    }
    let block = compress_block(&tile, 0xffff, Flags::BC2);
    let decoded = decompress(&block, Flags::BC2);
    for i in 0..16 {
        // explicit 4-bit alpha snaps to the nearest k/15
        assert!((decoded[i][3] - tile[i][3]).abs() < 1e-6);
    }
}

#[test]
fn bc3_alpha_gradient() {
    let mut tile = gradient_tile();
    for (i, px) in tile.iter_mut().enumerate() {
        px[3] = 0.2 + 0.6 * i as f32 / 15.0;
    }
    let block = compress_block(&tile, 0xffff, Flags::BC3);
    let decoded = decompress(&block, Flags::BC3);
    for i in 0..16 {
        assert!((decoded[i][3] - tile[i][3]).abs() < 0.05);
    }
}

#[test]
fn bc4_bc5_channels() {
    let tile: [[f32; 4]; 16] = std::array::from_fn(|i| {
        let t = i as f32 / 15.0;
        [t, 1.0 - t, 0.25, 0.75]
    });

    // an 8-entry codebook over a full-range 16-step gradient leaves a
    // worst-case error of about 1/15 per value
    let block = compress_block(&tile, 0xffff, Flags::BC4);
    let decoded = decompress(&block, Flags::BC4);
    for i in 0..16 {
        assert!((decoded[i][0] - tile[i][0]).abs() < 0.07);
        assert_eq!(decoded[i][1], 0.0);
        assert_eq!(decoded[i][3], 1.0);
    }

    let block = compress_block(&tile, 0xffff, Flags::BC5);
    let decoded = decompress(&block, Flags::BC5);
    for i in 0..16 {
        assert!((decoded[i][0] - tile[i][0]).abs() < 0.07);
        assert!((decoded[i][1] - tile[i][1]).abs() < 0.07);
        assert_eq!(decoded[i][2], 0.0);
    }
}

#[test]
fn bc4_signed() {
    let flags = Flags::BC4 | Flags::SIGNED;
    let tile: [[f32; 4]; 16] = std::array::from_fn(|i| {
        let t = i as f32 / 15.0;
        [t * 2.0 - 1.0, 0.0, 0.0, 1.0]
    });
    let block = compress_block(&tile, 0xffff, flags);
    let decoded = decompress(&block, flags);
    for i in 0..16 {
        // the unorm codebook bound doubles in the signed domain
        assert!(
            (decoded[i][0] - tile[i][0]).abs() < 0.14,
            "{} vs {}",
            decoded[i][0],
            tile[i][0]
        );
    }
}

#[test]
fn srgb_round_trips_close() {
    let flags = Flags::BC1 | Flags::SRGB;
    let color = [0.5, 0.25, 0.75, 1.0];
    let tile = [color; 16];
    let block = compress_block(&tile, 0xffff, flags);
    let decoded = decompress(&block, flags);
    for c in 0..3 {
        assert!((decoded[0][c] - color[c]).abs() < 0.05);
    }
}

#[test]
fn u8_entry_point_matches_f32() {
    let mut bytes = [0_u8; 64];
    for (i, b) in bytes.iter_mut().enumerate() {
        *b = (i * 4) as u8;
    }
    let mut from_u8 = [0_u8; 8];
    compress_u8(&bytes, 0xffff, Flags::BC1, &mut from_u8);

    let tile: [[f32; 4]; 16] = std::array::from_fn(|i| {
        std::array::from_fn(|c| bytes[i * 4 + c] as f32 / 255.0)
    });
    let mut from_f32 = [0_u8; 8];
    compress(&tile, 0xffff, Flags::BC1, &mut from_f32);

    assert_eq!(from_u8, from_f32);
}

#[test]
fn storage_matches_format() {
    assert_eq!(storage_requirements(13, 9, Flags::BC1), 4 * 3 * 8);
    assert_eq!(storage_requirements(13, 9, Flags::BC3), 4 * 3 * 16);
    assert_eq!(Flags::BC4.format(), Format::Bc4);
}
