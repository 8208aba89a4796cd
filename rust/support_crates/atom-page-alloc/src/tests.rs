use crate::page_buffer::{self, PageBuffer, PageKind};
use crate::mmap;

#[test]
fn test_map_rounds_to_pages() {
    let page = mmap::page_size(PageKind::Regular);
    for (size, expected) in [
        (0, page),
        (1, page),
        (page, page),
        (page + 1, 2 * page),
        (3 * page + 100, 4 * page),
    ] {
        let (ptr, capacity) = mmap::map(size, PageKind::Regular).expect("map");
        assert_eq!(capacity, expected, "size {size}");
        assert!((ptr.as_ptr() as usize).is_multiple_of(page));
        unsafe { mmap::unmap(ptr, capacity, PageKind::Regular).expect("unmap") };
    }
}

#[test]
fn test_map_overflowing_size_fails() {
    assert!(mmap::map(usize::MAX, PageKind::Regular).is_err());
}

#[test]
fn test_page_sizes() {
    let regular = PageBuffer::regular_page_size();
    let large = PageBuffer::large_page_size();
    assert!(regular.is_power_of_two());
    assert!(large.is_power_of_two());
    assert!(large >= regular);
    assert_eq!(PageBuffer::page_size(PageKind::Regular), regular);
    assert_eq!(PageBuffer::page_size(PageKind::Large), large);
}

#[test]
fn test_page_buffer_allocate_regular() {
    let buffer = PageBuffer::allocate_regular(1000).expect("allocate");
    assert_eq!(buffer.len(), 1000);
    assert!(!buffer.is_empty());
    assert_eq!(buffer.capacity(), PageBuffer::regular_page_size());
    assert_eq!(buffer.kind(), PageKind::Regular);
    assert!(!buffer.uses_large_pages());
    assert_eq!(buffer.alignment(), PageBuffer::regular_page_size());
    assert!(!buffer.ptr().is_null());
}

#[test]
fn test_page_buffer_zero_size_maps_one_page() {
    let buffer = PageBuffer::allocate_regular(0).expect("allocate");
    assert!(buffer.is_empty());
    assert_eq!(buffer.capacity(), PageBuffer::regular_page_size());
    assert!((buffer.ptr() as usize).is_multiple_of(buffer.alignment()));
}

#[test]
fn test_page_buffer_large_pages() {
    if let Err(e) = page_buffer::check_and_enable_large_page_support() {
        println!("large pages unavailable: {e:?}");
        assert!(PageBuffer::allocate_large_pages(1024).is_err());
        return;
    }

    let buffer = PageBuffer::allocate_large_pages(1024).expect("allocate");
    assert!(buffer.uses_large_pages());
    assert_eq!(buffer.capacity(), PageBuffer::large_page_size());
    assert!((buffer.ptr() as usize).is_multiple_of(PageBuffer::large_page_size()));
}

#[test]
fn test_page_buffer_with_fallback() {
    let buffer = PageBuffer::allocate_with_fallback(4096).expect("allocate");
    assert_eq!(buffer.len(), 4096);
    assert!(buffer.capacity() >= buffer.alignment());
    assert_eq!(buffer.alignment(), PageBuffer::page_size(buffer.kind()));
    assert!((buffer.ptr() as usize).is_multiple_of(buffer.alignment()));
}

#[test]
fn test_page_buffer_is_zeroed() {
    let buffer = PageBuffer::allocate_regular(10_000).expect("allocate");
    assert!(buffer.iter().all(|&b| b == 0));
}

#[test]
fn test_page_buffer_write_read() {
    let mut buffer = PageBuffer::allocate_regular(64 * 1024).expect("allocate");
    let len = buffer.len();
    buffer[0] = 1;
    buffer[len / 2] = 2;
    buffer[len - 1] = 3;
    assert_eq!(buffer.as_bytes()[0], 1);
    assert_eq!(buffer.as_bytes()[len / 2], 2);
    assert_eq!(buffer.as_bytes()[len - 1], 3);
}

#[test]
fn test_page_buffer_typed_slices() {
    let mut buffer = PageBuffer::allocate_regular(256).expect("allocate");
    {
        let words = buffer.as_mut_slice::<u64>();
        assert_eq!(words.len(), 32);
        words[0] = 0x0102_0304_0506_0708;
        words[31] = u64::MAX;
    }
    let words = buffer.as_slice::<u64>();
    assert_eq!(words[0], 0x0102_0304_0506_0708);
    assert_eq!(words[31], u64::MAX);
    assert_eq!(buffer.as_slice::<u32>().len(), 64);
}

#[test]
fn test_page_buffer_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<PageBuffer>();
}

#[test]
fn test_page_buffer_debug() {
    let buffer = PageBuffer::allocate_regular(16).expect("allocate");
    let s = format!("{buffer:?}");
    assert!(s.contains("PageBuffer"));
    assert!(s.contains("capacity"));
    assert!(s.contains("Regular"));
}

#[test]
fn test_page_buffer_many_buffers() {
    let sizes = [1, 512, 4096, 8193, 1 << 20];
    let buffers: Vec<_> = sizes
        .iter()
        .map(|&size| PageBuffer::allocate_regular(size).expect("allocate"))
        .collect();
    for (buffer, &size) in buffers.iter().zip(&sizes) {
        assert_eq!(buffer.len(), size);
        assert!(buffer.capacity() >= size);
    }
    let mut starts: Vec<_> = buffers.iter().map(|b| b.ptr() as usize).collect();
    starts.sort_unstable();
    starts.dedup();
    assert_eq!(starts.len(), sizes.len());
}
