//! Sample buffer layout tests

use i2s_pattern_tx::sample::{LEFT_LEVEL, RIGHT_LEVEL};
use i2s_pattern_tx::{AudioError, BitDepth, SampleBuffer, SystemHeap};

#[test]
fn test_pattern_for_many_sizes() {
    for frames in [1usize, 2, 6, 60, 360, 720] {
        let mut buf = SampleBuffer::with_capacity(&SystemHeap, frames * 8).unwrap();
        buf.fill_test_pattern();

        assert_eq!(buf.frame_count(), frames);
        for (i, &slot) in buf.samples().iter().enumerate() {
            if i % 2 == 0 {
                assert_eq!(slot, 0xFFFF_FFFF, "left slot {} of {} frames", i, frames);
            } else {
                assert_eq!(slot, 0x0000_0000, "right slot {} of {} frames", i, frames);
            }
        }
    }
}

#[test]
fn test_six_frame_buffer_contents() {
    let mut buf = SampleBuffer::with_capacity(&SystemHeap, 96).unwrap();
    buf.fill_test_pattern();

    assert_eq!(buf.samples(), [LEFT_LEVEL, RIGHT_LEVEL].repeat(6).as_slice());
}

#[test]
fn test_byte_length_invariant() {
    let buf = SampleBuffer::with_capacity(&SystemHeap, 5760).unwrap();

    assert_eq!(buf.channel_count(), 2);
    assert_eq!(buf.bits_per_sample(), BitDepth::Bits32);
    assert_eq!(buf.frame_count(), 720);
    assert_eq!(
        buf.byte_len(),
        buf.frame_count() * buf.channel_count() * buf.bits_per_sample().bytes_per_sample()
    );
    assert_eq!(buf.as_bytes().len(), buf.byte_len());
}

#[test]
fn test_frames_seen_at_other_depths() {
    let buf = SampleBuffer::with_capacity(&SystemHeap, 5760).unwrap();

    assert_eq!(buf.frames_at(BitDepth::Bits32), 720);
    assert_eq!(buf.frames_at(BitDepth::Bits24), 720);
    assert_eq!(buf.frames_at(BitDepth::Bits16), 1440);
}

#[test]
fn test_fresh_buffer_is_silent() {
    let buf = SampleBuffer::with_capacity(&SystemHeap, 64).unwrap();
    assert!(buf.samples().iter().all(|&s| s == 0));
}

#[test]
fn test_bit_depth_parsing() {
    assert_eq!(BitDepth::from_bits(16), Ok(BitDepth::Bits16));
    assert_eq!(BitDepth::from_bits(24), Ok(BitDepth::Bits24));
    assert_eq!(BitDepth::from_bits(32), Ok(BitDepth::Bits32));
    assert_eq!(BitDepth::from_bits(0), Err(AudioError::UnsupportedBitDepth(0)));
    assert_eq!(BitDepth::Bits24.bits(), 24);
    assert_eq!(BitDepth::Bits16.bytes_per_frame(), 4);
    assert_eq!(BitDepth::Bits24.bytes_per_frame(), 8);
}
