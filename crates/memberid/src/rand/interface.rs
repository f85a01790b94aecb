/// A source of uniformly distributed offsets.
///
/// This abstraction lets you plug in the thread-local RNG or a scripted
/// source in tests.
///
/// # Example
/// ```
/// use memberid::RandSource;
///
/// struct Fixed;
/// impl RandSource for Fixed {
///     fn rand_below(&self, bound: u32) -> u32 {
///         7 % bound
///     }
/// }
///
/// assert_eq!(Fixed.rand_below(100), 7);
/// ```
pub trait RandSource {
    /// Returns a uniformly distributed integer in `0..bound`. `bound` is
    /// never zero.
    fn rand_below(&self, bound: u32) -> u32;
}

impl<T: RandSource + ?Sized> RandSource for &T {
    fn rand_below(&self, bound: u32) -> u32 {
        (**self).rand_below(bound)
    }
}
