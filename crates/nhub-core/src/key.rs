//! Notifier key type

use core::fmt;

/// Identifier of a live notifier within one hub
///
/// Keys span the full 32-bit range; there is no reserved sentinel.
/// A key is what travels through the channel when a notifier is poked.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct NotifyKey(u32);

impl NotifyKey {
    /// Create a key from a raw value
    #[inline]
    pub const fn new(key: u32) -> Self {
        NotifyKey(key)
    }

    /// Get the raw u32 value
    #[inline]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// The key following this one, wrapping at `u32::MAX`
    #[inline]
    pub const fn next(self) -> Self {
        NotifyKey(self.0.wrapping_add(1))
    }
}

impl From<u32> for NotifyKey {
    #[inline]
    fn from(key: u32) -> Self {
        NotifyKey(key)
    }
}

impl From<NotifyKey> for u32 {
    #[inline]
    fn from(key: NotifyKey) -> Self {
        key.0
    }
}

impl fmt::Debug for NotifyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NotifyKey({:#x})", self.0)
    }
}

impl fmt::Display for NotifyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_basics() {
        let key = NotifyKey::new(42);
        assert_eq!(key.as_u32(), 42);
        assert_eq!(key.next().as_u32(), 43);
    }

    #[test]
    fn test_key_wraps() {
        let key = NotifyKey::new(u32::MAX);
        assert_eq!(key.next(), NotifyKey::new(0));
    }

    #[test]
    fn test_key_conversions() {
        let key: NotifyKey = 100u32.into();
        let raw: u32 = key.into();
        assert_eq!(raw, 100);
        assert_eq!(format!("{:?}", key), "NotifyKey(0x64)");
        assert_eq!(format!("{}", key), "100");
    }
}
