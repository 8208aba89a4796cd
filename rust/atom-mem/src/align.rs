//! Power-of-two alignment arithmetic on offsets and addresses.

/// Rounds `n` up to the next multiple of `alignment`.
///
/// Returns `n` unchanged when it is already aligned.
///
/// ```
/// use atom_mem::align::align_up;
///
/// assert_eq!(align_up(0, 8), 0);
/// assert_eq!(align_up(1, 8), 8);
/// assert_eq!(align_up(8, 8), 8);
/// assert_eq!(align_up(9, 8), 16);
/// assert_eq!(align_up(5, 1), 5);
/// ```
///
/// # Panics
///
/// Panics in debug builds if `alignment` is not a power of two, and on overflow.
/// Use [`checked_align_up`] where `n` is untrusted.
#[inline]
pub fn align_up(n: usize, alignment: usize) -> usize {
    debug_assert!(alignment.is_power_of_two());
    (n + alignment - 1) & !(alignment - 1)
}

/// Rounds `n` up to the next multiple of `alignment`, or `None` if the result
/// does not fit in `usize`.
///
/// ```
/// use atom_mem::align::checked_align_up;
///
/// assert_eq!(checked_align_up(5, 8), Some(8));
/// assert_eq!(checked_align_up(usize::MAX, 2), None);
/// assert_eq!(checked_align_up(usize::MAX, 1), Some(usize::MAX));
/// ```
#[inline]
pub fn checked_align_up(n: usize, alignment: usize) -> Option<usize> {
    debug_assert!(alignment.is_power_of_two());
    n.checked_add(alignment - 1).map(|n| n & !(alignment - 1))
}

/// Rounds `n` down to the previous multiple of `alignment`.
///
/// ```
/// use atom_mem::align::align_down;
///
/// assert_eq!(align_down(0, 8), 0);
/// assert_eq!(align_down(7, 8), 0);
/// assert_eq!(align_down(15, 8), 8);
/// assert_eq!(align_down(16, 8), 16);
/// ```
#[inline]
pub fn align_down(n: usize, alignment: usize) -> usize {
    debug_assert!(alignment.is_power_of_two());
    n & !(alignment - 1)
}

/// Returns `true` if `n` is a multiple of `alignment`.
#[inline]
pub fn is_aligned(n: usize, alignment: usize) -> bool {
    debug_assert!(alignment.is_power_of_two());
    (n & (alignment - 1)) == 0
}

/// Returns `true` if the address of `ptr` is a multiple of `alignment`.
#[inline]
pub fn is_aligned_ptr<T>(ptr: *const T, alignment: usize) -> bool {
    is_aligned(ptr as usize, alignment)
}
