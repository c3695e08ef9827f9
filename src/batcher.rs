/// Maximum ids per "remove tracks from playlist" call.
pub const PLAYLIST_REMOVE_LIMIT: usize = 100;

/// Maximum ids per "add tracks to playlist" call.
pub const PLAYLIST_ADD_LIMIT: usize = 100;

/// Maximum ids per "remove saved tracks" call.
pub const LIBRARY_REMOVE_LIMIT: usize = 50;

/// Split `items` into consecutive chunks of at most `max` elements.
///
/// Chunks are views into `items`; concatenating them yields `items` in order.
/// Empty input yields no chunks. A `max` of zero is treated as one.
pub fn batches<T>(items: &[T], max: usize) -> std::slice::Chunks<'_, T> {
    items.chunks(max.max(1))
}

/// Number of chunks [`batches`] will produce.
pub fn batch_count(len: usize, max: usize) -> usize {
    len.div_ceil(max.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concatenation_reproduces_input() {
        for len in [0usize, 1, 5, 99, 100, 101, 250] {
            let items: Vec<usize> = (0..len).collect();
            for size in [1usize, 3, 50, 100, 1000] {
                let chunks: Vec<&[usize]> = batches(&items, size).collect();
                assert!(chunks.iter().all(|c| !c.is_empty() && c.len() <= size));
                assert_eq!(chunks.len(), batch_count(len, size));
                assert_eq!(chunks.concat(), items);
            }
        }
    }

    #[test]
    fn test_only_last_batch_may_be_short() {
        let items: Vec<u8> = vec![0; 250];
        let lens: Vec<usize> = batches(&items, PLAYLIST_ADD_LIMIT).map(<[u8]>::len).collect();
        assert_eq!(lens, vec![100, 100, 50]);
    }

    #[test]
    fn test_empty_input_yields_no_batches() {
        let items: Vec<String> = Vec::new();
        assert_eq!(batches(&items, PLAYLIST_REMOVE_LIMIT).count(), 0);
    }

    #[test]
    fn test_zero_size_is_clamped() {
        let items = [1, 2, 3];
        assert_eq!(batches(&items, 0).count(), 3);
        assert_eq!(batch_count(3, 0), 3);
    }
}
