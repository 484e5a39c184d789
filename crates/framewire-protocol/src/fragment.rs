//! Fragmentation arithmetic.
//!
//! Pure functions of the frame size and MTU, shared by the send path
//! (slicing a frame into packets) and the receive path (placing a
//! fragment's payload at its offset).

use crate::header::HEADER_SIZE;

/// Payload bytes a single fragment can carry at the given MTU.
pub fn payload_capacity(mtu: u16) -> usize {
    mtu as usize - HEADER_SIZE
}

/// Number of fragments needed for a frame of `frame_size` bytes.
pub fn fragment_count(frame_size: usize, mtu: u16) -> u16 {
    let capacity = payload_capacity(mtu);
    ((frame_size + capacity - 1) / capacity) as u16
}

/// Byte offset of fragment `index` within its frame.
pub fn fragment_offset(index: u16, mtu: u16) -> usize {
    index as usize * payload_capacity(mtu)
}

/// Payload size of fragment `index` of a frame of `frame_size` bytes.
pub fn fragment_size(frame_size: usize, index: u16, mtu: u16) -> usize {
    let capacity = payload_capacity(mtu);
    let remaining = frame_size - fragment_offset(index, mtu);
    remaining.min(capacity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_vector() {
        // 4200 bytes at MTU 1400 -> fragments of 1386, 1386, 1386, 42.
        assert_eq!(fragment_count(4200, 1400), 4);
        assert_eq!(fragment_size(4200, 0, 1400), 1386);
        assert_eq!(fragment_size(4200, 1, 1400), 1386);
        assert_eq!(fragment_size(4200, 2, 1400), 1386);
        assert_eq!(fragment_size(4200, 3, 1400), 42);
        assert_eq!(fragment_offset(3, 1400), 4158);
    }

    #[test]
    fn test_single_fragment_frames() {
        assert_eq!(fragment_count(1, 1400), 1);
        assert_eq!(fragment_count(1386, 1400), 1);
        assert_eq!(fragment_count(1387, 1400), 2);
        assert_eq!(fragment_size(1386, 0, 1400), 1386);
    }

    #[test]
    fn test_sizes_sum_to_frame_size() {
        for &mtu in &[576u16, 1400, 9000] {
            for frame_size in [1usize, 100, 1386, 1387, 4200, 65_537, 512 * 1024] {
                let count = fragment_count(frame_size, mtu);
                let total: usize =
                    (0..count).map(|i| fragment_size(frame_size, i, mtu)).sum();
                assert_eq!(total, frame_size, "frame_size={frame_size} mtu={mtu}");
            }
        }
    }

    #[test]
    fn test_no_fragment_exceeds_capacity() {
        for &mtu in &[576u16, 1400] {
            let capacity = payload_capacity(mtu);
            for frame_size in [1usize, capacity, capacity + 1, 10 * capacity + 7] {
                let count = fragment_count(frame_size, mtu);
                for i in 0..count {
                    assert!(fragment_size(frame_size, i, mtu) <= capacity);
                }
            }
        }
    }

    #[test]
    fn test_last_fragment_is_nonempty() {
        for frame_size in 1..=(3 * payload_capacity(1400) + 1) {
            let count = fragment_count(frame_size, 1400);
            assert!(fragment_size(frame_size, count - 1, 1400) > 0, "frame_size={frame_size}");
        }
    }

    #[test]
    fn test_offsets_are_contiguous() {
        let mtu = 1400;
        let frame_size = 5000;
        let count = fragment_count(frame_size, mtu);
        let mut expected = 0;
        for i in 0..count {
            assert_eq!(fragment_offset(i, mtu), expected);
            expected += fragment_size(frame_size, i, mtu);
        }
        assert_eq!(expected, frame_size);
    }
}
