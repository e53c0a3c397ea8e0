use core::hash::BuildHasher;
use core::hash::Hasher;

cfg_if::cfg_if! {
    if #[cfg(feature = "foldhash")] {
        /// The hasher builder used when none is named explicitly.
        ///
        /// With the `foldhash` feature this is `foldhash::fast::RandomState`.
        pub type DefaultHashBuilder = foldhash::fast::RandomState;
    } else if #[cfg(feature = "std")] {
        /// The hasher builder used when none is named explicitly.
        ///
        /// Without `foldhash` this falls back to the standard library's
        /// randomly keyed SipHash.
        pub type DefaultHashBuilder = std::collections::hash_map::RandomState;
    } else {
        /// The hasher builder used when none is named explicitly.
        ///
        /// Without `foldhash` or `std` there is no source of random keys, so
        /// the deterministic base-17 polynomial hash is used.
        pub type DefaultHashBuilder = BuildBase17Hasher;
    }
}

/// Multiplier applied to the running state before each byte is added.
const BASE: u64 = 17;

/// A polynomial hasher over the bytes fed to it.
///
/// For bytes `b[0..n]` the result is `Σ b[i] * 17^(n-1-i)`, computed with
/// wrapping arithmetic. The output depends only on the bytes written, so it is
/// stable across runs, processes and machines of the same endianness.
///
/// Through [`BuildHasher::hash_one`] the bytes are whatever the key's `Hash`
/// impl writes, not the key's logical elements. A `str` writes its UTF-8 bytes
/// followed by a `0xff` terminator, and integers write their native-endian
/// bytes, so `hash_one(1u32)` on a little-endian target is `17^3`.
///
/// This is a weak hash. Keys that share long suffixes and differ in a few
/// leading bytes collide readily, and it offers no protection against
/// adversarial input.
///
/// # Examples
///
/// ```rust
/// use core::hash::BuildHasher;
/// use core::hash::Hasher;
///
/// use chain_hash::Base17Hasher;
/// use chain_hash::BuildBase17Hasher;
///
/// let mut hasher = Base17Hasher::default();
/// hasher.write(&[1, 2, 3]);
/// assert_eq!(hasher.finish(), 17 * 17 + 2 * 17 + 3);
///
/// // `"ab"` hashes as the bytes `a`, `b`, `0xff`.
/// let expected = (b'a' as u64 * 17 + b'b' as u64) * 17 + 0xff;
/// assert_eq!(BuildBase17Hasher.hash_one("ab"), expected);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Base17Hasher {
    state: u64,
}

impl Hasher for Base17Hasher {
    #[inline]
    fn write(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.state = self.state.wrapping_mul(BASE).wrapping_add(byte as u64);
        }
    }

    #[inline]
    fn finish(&self) -> u64 {
        self.state
    }
}

/// Builds [`Base17Hasher`]s.
///
/// Every hasher starts from the same zero state, so equal keys always hash
/// equally, regardless of which builder instance produced the hasher.
///
/// # Examples
///
/// ```rust
/// use chain_hash::BuildBase17Hasher;
/// use chain_hash::HashMap;
///
/// let mut map: HashMap<&str, u32, BuildBase17Hasher> = HashMap::with_capacity(4);
/// map.insert("seventeen", 17);
/// assert_eq!(map.get(&"seventeen"), Some(&17));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildBase17Hasher;

impl BuildHasher for BuildBase17Hasher {
    type Hasher = Base17Hasher;

    #[inline]
    fn build_hasher(&self) -> Self::Hasher {
        Base17Hasher::default()
    }
}
